//! Armature Synthesis
//!
//! The source formats have no armature node, so one is synthesized for every
//! node whose first mesh carries bones. The work is split in two phases:
//!
//! 1. [`ArmatureSynthesizer::plan`] walks the tree read-only and lists the
//!    armatures to create and the static mesh nodes.
//! 2. [`ArmatureSynthesizer::apply`] inserts the planned nodes. Nothing walks
//!    the tree while it is being mutated.
//!
//! A synthesized armature is a sibling of its mesh node (a child of the root
//! when the mesh node is the root itself), named `<mesh-name><suffix>`, with
//! an identity transform and no meshes.

use glam::Affine3A;
use rustc_hash::FxHashSet;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::errors::{Result, RigError};
use crate::settings::{ImportSettings, MeshBonePolicy};
use crate::source::{SourceNode, SourceNodeKey, SourceScene};

/// An armature node and the mesh it was synthesized for.
#[derive(Debug, Clone, PartialEq)]
pub struct Armature {
    pub name: String,
    /// The synthesized node.
    pub node: SourceNodeKey,
    /// The mesh-bearing node the armature was created for.
    pub mesh_node: SourceNodeKey,
    /// Index of the mesh whose bones form the skeleton.
    pub mesh: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlannedArmature {
    pub(crate) name: String,
    pub(crate) parent: SourceNodeKey,
    pub(crate) mesh_node: SourceNodeKey,
    pub(crate) mesh: usize,
}

/// Output of the read-only phase.
#[derive(Debug, Clone, Default)]
pub(crate) struct SynthesisPlan {
    pub(crate) armatures: Vec<PlannedArmature>,
    pub(crate) static_meshes: Vec<SourceNodeKey>,
}

pub struct ArmatureSynthesizer<'a> {
    settings: &'a ImportSettings,
}

impl<'a> ArmatureSynthesizer<'a> {
    #[must_use]
    pub fn new(settings: &'a ImportSettings) -> Self {
        Self { settings }
    }

    pub(crate) fn plan(&self, scene: &SourceScene, diagnostics: &mut Diagnostics) -> Result<SynthesisPlan> {
        let root = scene.root().ok_or(RigError::MissingRoot)?;
        let mut plan = SynthesisPlan::default();

        for key in scene.preorder() {
            let Some(node) = scene.node(key) else {
                continue;
            };
            if node.is_synthetic() || !node.has_meshes() {
                continue;
            }

            let mut bone_counts = Vec::with_capacity(node.meshes.len());
            for &mesh_index in &node.meshes {
                let mesh = scene.mesh(mesh_index).ok_or(RigError::MeshIndexOutOfBounds {
                    index: mesh_index,
                    count: scene.meshes.len(),
                })?;
                bone_counts.push(mesh.bones.len());
            }

            if node.meshes.len() > 1 {
                diagnostics.push(Diagnostic::MultiMeshNode {
                    node: node.name.clone(),
                    count: node.meshes.len(),
                });
            }
            let first = bone_counts[0];
            if let Some(&other) = bone_counts.iter().find(|&&c| c != first) {
                match self.settings.mesh_bone_policy {
                    MeshBonePolicy::RequireEqual => {
                        return Err(RigError::AmbiguousMeshBones {
                            node: node.name.clone(),
                            first,
                            other,
                        });
                    }
                    MeshBonePolicy::FirstMeshWins => {
                        diagnostics.push(Diagnostic::AmbiguousBoneCount {
                            node: node.name.clone(),
                            first,
                            other,
                        });
                    }
                }
            }

            if first == 0 {
                log::debug!("Static mesh node: {}", node.name);
                plan.static_meshes.push(key);
                continue;
            }

            let mesh = node.meshes[0];
            let name = self.settings.armature_name(&scene.meshes[mesh].name);
            log::debug!("Planned armature {name} for node {}", node.name);
            plan.armatures.push(PlannedArmature {
                name,
                parent: node.parent().unwrap_or(root),
                mesh_node: key,
                mesh,
            });
        }

        Ok(plan)
    }

    /// Inserts the planned nodes. An armature left over from an earlier import
    /// of the same scene is reused instead of duplicated; each node is claimed
    /// by at most one planned armature, so nodes inserted by this pass are
    /// never reused.
    pub(crate) fn apply(&self, scene: &mut SourceScene, plan: &SynthesisPlan) -> Result<Vec<Armature>> {
        let mut armatures = Vec::with_capacity(plan.armatures.len());
        let mut claimed = FxHashSet::default();
        for planned in &plan.armatures {
            let existing = scene.node(planned.parent).and_then(|parent| {
                parent.children().iter().copied().find(|&c| {
                    !claimed.contains(&c)
                        && scene
                            .node(c)
                            .is_some_and(|n| n.is_synthetic() && n.name == planned.name)
                })
            });
            let node = match existing {
                Some(node) => node,
                None => {
                    let mut armature = SourceNode::new(&planned.name, Affine3A::IDENTITY);
                    armature.synthetic = true;
                    scene.insert_child(planned.parent, armature)?
                }
            };
            claimed.insert(node);
            armatures.push(Armature {
                name: planned.name.clone(),
                node,
                mesh_node: planned.mesh_node,
                mesh: planned.mesh,
            });
        }
        Ok(armatures)
    }

    /// Runs both phases and returns the armatures plus the static mesh nodes.
    pub fn synthesize(
        &self,
        scene: &mut SourceScene,
        diagnostics: &mut Diagnostics,
    ) -> Result<(Vec<Armature>, Vec<SourceNodeKey>)> {
        let plan = self.plan(scene, diagnostics)?;
        let armatures = self.apply(scene, &plan)?;
        Ok((armatures, plan.static_meshes))
    }
}
