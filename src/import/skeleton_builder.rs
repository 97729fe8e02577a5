//! Skeleton Construction
//!
//! Consumes the full-scene [`BoneStack`] and builds one [`Skeleton`] per
//! armature.
//!
//! Bones of one armature are appended in preorder of the nodes they resolve
//! to, so an ancestor bone always precedes its descendants and every parent
//! index points to a lower, already-initialized bone. Bones whose parent node
//! is not a bone of the same skeleton become roots. A bone with no matching
//! node keeps an identity rest and is appended after the resolved ones.

use glam::Affine3A;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::errors::Result;
use crate::import::anim_tree::AnimNodeTree;
use crate::import::bone_stack::{BoneStack, BoneStackEntry};
use crate::import::context::ImportContext;
use crate::scene::{Skeleton, SkeletonKey};
use crate::settings::ImportSettings;
use crate::source::{SourceNodeKey, SourceScene};

pub struct SkeletonBuilder<'a> {
    settings: &'a ImportSettings,
}

impl<'a> SkeletonBuilder<'a> {
    #[must_use]
    pub fn new(settings: &'a ImportSettings) -> Self {
        Self { settings }
    }

    /// Creates the skeletons and records, for every bone object, the skeleton
    /// and bone index it landed on.
    pub fn build(
        &self,
        scene: &SourceScene,
        stack: &BoneStack,
        ctx: &mut ImportContext,
        anim_tree: &AnimNodeTree,
        skeletons: &mut SlotMap<SkeletonKey, Skeleton>,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        ctx.armature_skeletons = ctx
            .armatures
            .iter()
            .map(|armature| {
                log::debug!("Making skeleton: {}", armature.name);
                Some(skeletons.insert(Skeleton::new(&armature.name)))
            })
            .collect();

        let order: FxHashMap<SourceNodeKey, usize> =
            ctx.nodes.iter().enumerate().map(|(i, &k)| (k, i)).collect();

        // Resolve each entry to its armature, final name and bone node.
        let mut resolved: Vec<(usize, Option<SourceNodeKey>, String, &BoneStackEntry)> =
            Vec::with_capacity(stack.len());
        for entry in stack.entries() {
            let Some(armature) = entry.armature else {
                diagnostics.push(Diagnostic::UnownedBone {
                    bone: entry.name.clone(),
                    mesh: scene.meshes[entry.id.mesh].name.clone(),
                });
                continue;
            };
            let mut bone_name = entry.name.clone();
            if bone_name.is_empty() {
                bone_name.clone_from(&self.settings.placeholder_bone_name);
                diagnostics.push(Diagnostic::EmptyBoneName {
                    placeholder: bone_name.clone(),
                });
            }
            let node = self.resolve_bone_node(scene, ctx, armature, &bone_name);
            if node.is_none() {
                diagnostics.push(Diagnostic::BoneWithoutNode {
                    bone: bone_name.clone(),
                });
            }
            resolved.push((armature, node, bone_name, entry));
        }
        // Stable: equal nodes keep stack order, node-less bones go last.
        resolved.sort_by_key(|&(armature, node, _, _)| {
            let position = node.and_then(|n| order.get(&n).copied());
            (armature, position.unwrap_or(usize::MAX))
        });

        for (armature, node_key, bone_name, entry) in resolved {
            let Some(skeleton_key) = ctx.armature_skeletons[armature] else {
                continue;
            };
            let skeleton = &mut skeletons[skeleton_key];
            let node = node_key.and_then(|k| scene.node(k));

            if let Some(existing) = skeleton.find_bone(&bone_name) {
                diagnostics.push(Diagnostic::DuplicateBoneName {
                    name: bone_name,
                    skeleton: skeleton.name.clone(),
                });
                ctx.bone_slots.insert(entry.id, (skeleton_key, existing));
                continue;
            }

            let index = skeleton.add_bone(&bone_name)?;
            let rest = node.map_or(Affine3A::IDENTITY, |n| n.transform);
            skeleton.set_bone_rest(index, rest)?;
            skeleton.set_bone_pose(index, rest)?;
            if let Some(parent_name) = node
                .and_then(|n| n.parent())
                .and_then(|p| scene.node(p))
                .map(|p| p.name.as_str())
                && let Some(parent) = skeleton.find_bone(parent_name)
            {
                skeleton.set_bone_parent(index, Some(parent))?;
            }
            if let Some(anim_node) = node_key.and_then(|k| anim_tree.for_source(k)) {
                skeleton.set_bone_anim_node(index, anim_node)?;
            }
            log::debug!("Imported bone {bone_name} into {}", skeleton.name);
            ctx.bone_slots.insert(entry.id, (skeleton_key, index));
        }

        for key in ctx.armature_skeletons.iter().flatten().copied() {
            let skeleton = &mut skeletons[key];
            if skeleton.update_global_poses().is_err() {
                diagnostics.push(Diagnostic::CyclicParents {
                    skeleton: skeleton.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Node carrying the bone's name. The subtree holding the armature's mesh
    /// node is searched first, so two armatures reusing a bone name resolve to
    /// their own nodes; the whole tree is the fallback.
    fn resolve_bone_node(
        &self,
        scene: &SourceScene,
        ctx: &ImportContext,
        armature: usize,
        name: &str,
    ) -> Option<SourceNodeKey> {
        let mesh_node = ctx.armatures.get(armature)?.mesh_node;
        scene
            .find_node_in_subtree(mesh_node, name)
            .or_else(|| {
                let scope = scene.node(mesh_node)?.parent()?;
                scene.find_node_in_subtree(scope, name)
            })
            .or_else(|| ctx.node_by_name(scene, name))
    }
}
