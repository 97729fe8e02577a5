use glam::Affine3A;

/// Identity of a bone object: the mesh that owns it and its slot in that
/// mesh's bone list.
///
/// Bones are compared by identity, never by name. Two meshes routinely carry
/// bones with the same name that must stay distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoneId {
    pub mesh: usize,
    pub bone: usize,
}

impl BoneId {
    #[inline]
    #[must_use]
    pub const fn new(mesh: usize, bone: usize) -> Self {
        Self { mesh, bone }
    }
}

/// One vertex influence of a bone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexWeight {
    pub vertex: u32,
    pub weight: f32,
}

/// A bone as declared by a mesh of the source scene.
#[derive(Debug, Clone)]
pub struct SourceBone {
    pub name: String,
    /// Mesh-space to bone-space offset (inverse bind matrix).
    pub offset: Affine3A,
    pub weights: Vec<VertexWeight>,
}

impl SourceBone {
    #[must_use]
    pub fn new(name: &str, offset: Affine3A) -> Self {
        Self {
            name: name.to_string(),
            offset,
            weights: Vec::new(),
        }
    }
}

/// Mesh data relevant to rigging: bone list and blend shape names.
#[derive(Debug, Clone, Default)]
pub struct SourceMesh {
    pub name: String,
    pub bones: Vec<SourceBone>,
    pub blend_shapes: Vec<String>,
}

impl SourceMesh {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_bones(mut self, bones: Vec<SourceBone>) -> Self {
        self.bones = bones;
        self
    }

    #[must_use]
    pub fn with_blend_shapes(mut self, names: &[&str]) -> Self {
        self.blend_shapes = names.iter().map(|s| (*s).to_string()).collect();
        self
    }
}
