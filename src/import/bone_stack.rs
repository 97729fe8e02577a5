use rustc_hash::FxHashSet;

use crate::import::armature::Armature;
use crate::settings::ImportSettings;
use crate::source::{BoneId, SourceScene};

/// One distinct bone object on the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneStackEntry {
    pub id: BoneId,
    pub name: String,
    /// Index of the owning armature, `None` when no armature matches.
    pub armature: Option<usize>,
}

/// Deduplicated, order-preserving list of bone objects.
///
/// Order is meshes in source order, then bones in mesh order. Bones are
/// deduplicated by identity: equal names on different meshes stay separate
/// entries.
#[derive(Debug, Clone, Default)]
pub struct BoneStack {
    entries: Vec<BoneStackEntry>,
}

impl BoneStack {
    /// Stack over every mesh of the scene. The owner of a bone is the
    /// armature synthesized for the bone's mesh, else the first armature
    /// named after that mesh.
    #[must_use]
    pub fn build(scene: &SourceScene, armatures: &[Armature], settings: &ImportSettings) -> Self {
        let mut stack = Self::default();
        let mut seen = FxHashSet::default();
        for (mesh_index, mesh) in scene.meshes.iter().enumerate() {
            let armature_name = settings.armature_name(&mesh.name);
            let owner = armatures
                .iter()
                .position(|a| a.mesh == mesh_index)
                .or_else(|| armatures.iter().position(|a| a.name == armature_name));
            for (bone_index, bone) in mesh.bones.iter().enumerate() {
                let id = BoneId::new(mesh_index, bone_index);
                if seen.insert(id) {
                    stack.entries.push(BoneStackEntry {
                        id,
                        name: bone.name.clone(),
                        armature: owner,
                    });
                }
            }
        }
        stack
    }

    /// Stack over a single mesh, used while importing one armature's tracks.
    /// `None` yields an empty stack.
    #[must_use]
    pub fn for_mesh(scene: &SourceScene, mesh: Option<usize>, armature: Option<usize>) -> Self {
        let mut stack = Self::default();
        let Some(source) = mesh.and_then(|m| scene.mesh(m).map(|s| (m, s))) else {
            return stack;
        };
        let (mesh_index, mesh) = source;
        let mut seen = FxHashSet::default();
        for (bone_index, bone) in mesh.bones.iter().enumerate() {
            let id = BoneId::new(mesh_index, bone_index);
            if seen.insert(id) {
                stack.entries.push(BoneStackEntry {
                    id,
                    name: bone.name.clone(),
                    armature,
                });
            }
        }
        stack
    }

    /// First entry with this name, left on the stack.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&BoneStackEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Removes and returns the first entry with this name, so a second
    /// channel for the same bone finds nothing.
    pub fn take_by_name(&mut self, name: &str) -> Option<BoneStackEntry> {
        let index = self.entries.iter().position(|e| e.name == name)?;
        Some(self.entries.remove(index))
    }

    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[BoneStackEntry] {
        &self.entries
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
