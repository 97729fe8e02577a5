use glam::Affine3A;
use smallvec::SmallVec;

use crate::scene::{NodeHandle, SkeletonKey};

/// What an output node represents.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NodeKind {
    #[default]
    Plain,
    /// Armature node anchoring one skeleton.
    Skeleton(SkeletonKey),
    /// Mesh instance. `skeleton` is `None` for static meshes.
    Mesh {
        meshes: SmallVec<[usize; 2]>,
        skeleton: Option<SkeletonKey>,
    },
    Light,
    Camera,
}

/// A node of the imported output scene.
///
/// Only hierarchy, local transform and kind live here; skeletons and clips are
/// stored beside the tree in [`ImportedScene`](crate::import::ImportedScene).
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,
    /// Local transform relative to the parent.
    pub transform: Affine3A,
    pub kind: NodeKind,
}

impl SceneNode {
    #[must_use]
    pub fn new(name: &str, transform: Affine3A, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            transform,
            kind,
        }
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn skeleton(&self) -> Option<SkeletonKey> {
        match &self.kind {
            NodeKind::Skeleton(key) => Some(*key),
            NodeKind::Mesh { skeleton, .. } => *skeleton,
            _ => None,
        }
    }
}
