use crate::import::context::ImportContext;
use crate::source::{SourceNode, SourceScene};

/// Role of a source node, decided once per import.
///
/// Precedence follows the order of the variants: a node named like a light
/// is a light even if it also carries meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceNodeKind {
    Light,
    Camera,
    /// Synthesized armature; the index points into the armature list.
    Armature(usize),
    Mesh,
    /// Shares its name with a bone of some mesh.
    Bone,
    Plain,
}

impl SourceNodeKind {
    #[inline]
    #[must_use]
    pub fn is_bone(self) -> bool {
        self == Self::Bone
    }
}

pub(crate) fn classify(scene: &SourceScene, ctx: &ImportContext, node: &SourceNode, armature: Option<usize>) -> SourceNodeKind {
    if ctx.lights.contains_key(&node.name) {
        SourceNodeKind::Light
    } else if ctx.cameras.contains_key(&node.name) {
        SourceNodeKind::Camera
    } else if let Some(index) = armature {
        SourceNodeKind::Armature(index)
    } else if node.has_meshes() {
        SourceNodeKind::Mesh
    } else if scene.has_bone_named(&node.name) {
        SourceNodeKind::Bone
    } else {
        SourceNodeKind::Plain
    }
}
