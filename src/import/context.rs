use rustc_hash::FxHashMap;
use slotmap::SecondaryMap;

use crate::import::armature::Armature;
use crate::import::classify::{SourceNodeKind, classify};
use crate::scene::{NodeHandle, SkeletonKey};
use crate::source::{BoneId, SourceNodeKey, SourceScene};

/// Lookup state of one import run.
///
/// Populated at the start of [`SceneImporter::import`](crate::import::SceneImporter::import),
/// passed by reference through every stage and dropped when the run ends.
#[derive(Debug, Default)]
pub struct ImportContext {
    /// Light name to light index.
    pub(crate) lights: FxHashMap<String, usize>,
    /// Camera name to camera index.
    pub(crate) cameras: FxHashMap<String, usize>,
    /// Preorder of the source tree after armature synthesis.
    pub(crate) nodes: Vec<SourceNodeKey>,
    pub(crate) kinds: SecondaryMap<SourceNodeKey, SourceNodeKind>,
    pub(crate) armatures: Vec<Armature>,
    /// Mesh nodes with no bones on their first mesh.
    pub(crate) static_mesh_nodes: Vec<SourceNodeKey>,
    /// Skeleton built for each armature, by armature index.
    pub(crate) armature_skeletons: Vec<Option<SkeletonKey>>,
    /// Where every bone object ended up.
    pub(crate) bone_slots: FxHashMap<BoneId, (SkeletonKey, usize)>,
    pub(crate) output: SecondaryMap<SourceNodeKey, NodeHandle>,
}

impl ImportContext {
    pub(crate) fn new(scene: &SourceScene) -> Self {
        let lights = scene
            .lights
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        let cameras = scene
            .cameras
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            lights,
            cameras,
            ..Default::default()
        }
    }

    /// Recomputes the flat node order and the per-node classification.
    /// Must run after armature synthesis.
    pub(crate) fn index_nodes(&mut self, scene: &SourceScene) {
        self.nodes = scene.preorder();
        self.kinds.clear();
        let armature_of: FxHashMap<SourceNodeKey, usize> = self
            .armatures
            .iter()
            .enumerate()
            .map(|(i, a)| (a.node, i))
            .collect();
        for &key in &self.nodes {
            if let Some(node) = scene.node(key) {
                let kind = classify(scene, self, node, armature_of.get(&key).copied());
                self.kinds.insert(key, kind);
            }
        }
    }

    #[must_use]
    pub fn kind(&self, node: SourceNodeKey) -> Option<SourceNodeKind> {
        self.kinds.get(node).copied()
    }

    /// First node in preorder carrying this name. Node names are not unique;
    /// the earliest match wins.
    #[must_use]
    pub fn node_by_name(&self, scene: &SourceScene, name: &str) -> Option<SourceNodeKey> {
        self.nodes
            .iter()
            .copied()
            .find(|&k| scene.node(k).is_some_and(|n| n.name == name))
    }
}
