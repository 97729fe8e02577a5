use glam::Affine3A;
use rustc_hash::FxHashMap;
use slotmap::{SecondaryMap, SlotMap};

use crate::animation::{AnimationClip, TrackData, TrackTarget};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::errors::{Result, RigError};
use crate::import::anim_tree::{AnimNodeKey, AnimNodeTree};
use crate::scene::{NodeHandle, NodeKind, SceneTree, Skeleton, SkeletonKey};

/// Everything one import produced. Ownership passes to the caller.
#[derive(Debug, Clone, Default)]
pub struct ImportedScene {
    pub tree: SceneTree,
    pub skeletons: SlotMap<SkeletonKey, Skeleton>,
    pub animations: Vec<AnimationClip>,
    pub anim_tree: AnimNodeTree,
    pub diagnostics: Diagnostics,
    /// Shadow node of every output node.
    pub(crate) anim_nodes: SecondaryMap<NodeHandle, AnimNodeKey>,
    blend_weights: FxHashMap<(NodeHandle, usize), f32>,
}

impl ImportedScene {
    pub(crate) fn new(
        tree: SceneTree,
        skeletons: SlotMap<SkeletonKey, Skeleton>,
        anim_tree: AnimNodeTree,
        anim_nodes: SecondaryMap<NodeHandle, AnimNodeKey>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            tree,
            skeletons,
            animations: Vec::new(),
            anim_tree,
            diagnostics,
            anim_nodes,
            blend_weights: FxHashMap::default(),
        }
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    #[must_use]
    pub fn skeleton_by_name(&self, name: &str) -> Option<(SkeletonKey, &Skeleton)> {
        self.skeletons.iter().find(|(_, s)| s.name == name)
    }

    #[must_use]
    pub fn animation(&self, name: &str) -> Option<&AnimationClip> {
        self.animations.iter().find(|a| a.name == name)
    }

    #[must_use]
    pub fn animation_index(&self, name: &str) -> Option<usize> {
        self.animations.iter().position(|a| a.name == name)
    }

    #[must_use]
    pub fn skeleton(&self, key: SkeletonKey) -> Option<&Skeleton> {
        self.skeletons.get(key)
    }

    /// Output node of a skeleton's armature.
    #[must_use]
    pub fn armature_node(&self, skeleton: SkeletonKey) -> Option<NodeHandle> {
        self.tree
            .iter()
            .find(|(_, n)| n.kind == NodeKind::Skeleton(skeleton))
            .map(|(h, _)| h)
    }

    #[must_use]
    pub fn anim_node_of(&self, node: NodeHandle) -> Option<AnimNodeKey> {
        self.anim_nodes.get(node).copied()
    }

    /// Last weight written for a blend shape by [`apply_clip`](Self::apply_clip).
    #[must_use]
    pub fn blend_shape_weight(&self, node: NodeHandle, index: usize) -> Option<f32> {
        self.blend_weights.get(&(node, index)).copied()
    }

    // ========================================================================
    // Pose writes
    // ========================================================================

    /// Sets a bone's local pose and mirrors it into the shadow tree.
    /// Globals are refreshed by [`update_world_transforms`](Self::update_world_transforms).
    pub fn set_bone_pose(&mut self, skeleton: SkeletonKey, bone: usize, pose: Affine3A) -> Result<()> {
        let skel = self
            .skeletons
            .get_mut(skeleton)
            .ok_or_else(|| RigError::MissingSkeleton(format!("{skeleton:?}")))?;
        skel.set_bone_pose(bone, pose)?;
        if let Some(anim_node) = skel.bone(bone).and_then(|b| b.anim_node()) {
            self.anim_tree.set_local_transform(anim_node, pose);
        }
        Ok(())
    }

    /// Sets a node's local transform in the output tree and the shadow tree.
    pub fn set_node_pose(&mut self, node: NodeHandle, local: Affine3A) -> Result<()> {
        let scene_node = self
            .tree
            .get_mut(node)
            .ok_or_else(|| RigError::NodeNotFound(format!("{node:?}")))?;
        scene_node.transform = local;
        if let Some(&anim_node) = self.anim_nodes.get(node) {
            self.anim_tree.set_local_transform(anim_node, local);
        }
        Ok(())
    }

    /// Samples every track of a clip at `time` (seconds), writes the results
    /// and runs one world-transform pass. Looping clips wrap `time`.
    pub fn apply_clip(&mut self, index: usize, time: f32) -> Result<()> {
        let Some(clip) = self.animations.get(index) else {
            return Err(RigError::NodeNotFound(format!("animation #{index}")));
        };
        let time = if clip.looping && clip.length > 0.0 {
            time.rem_euclid(clip.length)
        } else {
            time
        };

        let mut bone_writes = Vec::new();
        let mut node_writes = Vec::new();
        let mut weight_writes = Vec::new();
        for track in &clip.tracks {
            match (&track.data, track.target) {
                (TrackData::Transform(data), TrackTarget::Bone { skeleton, bone }) => {
                    if let Some(key) = data.sample(time) {
                        bone_writes.push((skeleton, bone, key));
                    }
                }
                (TrackData::Transform(data), TrackTarget::Node(node)) => {
                    if let Some(key) = data.sample(time) {
                        node_writes.push((node, key.to_affine()));
                    }
                }
                (TrackData::Value(data), TrackTarget::BlendShape { node, index }) => {
                    if !data.is_empty() {
                        weight_writes.push(((node, index), data.sample(time)));
                    }
                }
                _ => log::warn!("Track '{}' has no matching target, ignored", track.path),
            }
        }

        for (skeleton, bone, key) in bone_writes {
            let skel = self
                .skeletons
                .get_mut(skeleton)
                .ok_or_else(|| RigError::MissingSkeleton(format!("{skeleton:?}")))?;
            let pose = skel.apply_track_key(bone, &key)?;
            if let Some(anim_node) = skel.bone(bone).and_then(|b| b.anim_node()) {
                self.anim_tree.set_local_transform(anim_node, pose);
            }
        }
        for (node, local) in node_writes {
            self.set_node_pose(node, local)?;
        }
        self.blend_weights.extend(weight_writes);

        self.update_world_transforms();
        Ok(())
    }

    /// Scene-wide pass: skeleton global poses, then the shadow tree.
    pub fn update_world_transforms(&mut self) {
        for skeleton in self.skeletons.values_mut() {
            if skeleton.update_global_poses().is_err() && !self.diagnostics.entries().iter().any(
                |d| matches!(d, Diagnostic::CyclicParents { skeleton: s } if *s == skeleton.name),
            ) {
                self.diagnostics.push(Diagnostic::CyclicParents {
                    skeleton: skeleton.name.clone(),
                });
            }
        }
        self.anim_tree.update_world_transforms();
    }

    /// Resets every bone to its rest pose and mirrors it into the shadow tree.
    pub fn reset_poses(&mut self) {
        for skeleton in self.skeletons.values_mut() {
            skeleton.reset_poses();
            for bone in skeleton.bones() {
                if let Some(anim_node) = bone.anim_node() {
                    self.anim_tree.set_local_transform(anim_node, bone.rest());
                }
            }
        }
        self.update_world_transforms();
    }
}
