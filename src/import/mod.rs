//! Skeleton and Animation Import
//!
//! Converts a [`SourceScene`] into an [`ImportedScene`]: an output node tree,
//! one [`Skeleton`](crate::scene::Skeleton) per armature, the shadow
//! [`AnimNodeTree`] and resampled [`AnimationClip`](crate::animation::AnimationClip)s.
//!
//! # Pipeline
//!
//! 1. Cache light and camera names ([`ImportContext`]).
//! 2. Synthesize armature nodes ([`ArmatureSynthesizer`]), plan then apply.
//! 3. Flatten and classify the tree.
//! 4. Build the shadow tree ([`AnimNodeTree`]).
//! 5. Build the full-scene [`BoneStack`] and the skeletons ([`SkeletonBuilder`]).
//! 6. Emit the output node tree.
//! 7. Import every animation once per armature ([`AnimationTrackImporter`]).
//!
//! The run is synchronous and owns all intermediate state. Data-quality
//! problems end up in [`ImportedScene::diagnostics`]; a failing animation pass
//! is recorded there and skipped, the remaining passes still run.
//!
//! # Example
//!
//! ```rust,ignore
//! use myth_rig::import::SceneImporter;
//! use myth_rig::settings::ImportSettings;
//!
//! let settings = ImportSettings::default();
//! let imported = SceneImporter::new(&settings).import(&mut source)?;
//! for clip in &imported.animations {
//!     println!("{}: {} tracks", clip.name, clip.track_count());
//! }
//! ```

pub mod anim_tree;
pub mod animation;
pub mod armature;
pub mod bone_stack;
pub mod classify;
pub mod context;
pub mod imported;
pub mod morph;
pub mod skeleton_builder;

pub use anim_tree::{AnimNode, AnimNodeFlags, AnimNodeKey, AnimNodeTree};
pub use animation::{AnimationTrackImporter, TickRate, clip_name, has_loop_hint, resolve_tick_rate};
pub use armature::{Armature, ArmatureSynthesizer};
pub use bone_stack::{BoneStack, BoneStackEntry};
pub use classify::SourceNodeKind;
pub use context::ImportContext;
pub use imported::ImportedScene;
pub use skeleton_builder::SkeletonBuilder;

use slotmap::{SecondaryMap, SlotMap};
use smallvec::SmallVec;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::errors::{Result, RigError};
use crate::scene::{NodeKind, SceneNode, SceneTree, SkeletonKey};
use crate::settings::ImportSettings;
use crate::source::{SourceNodeKey, SourceScene};

pub struct SceneImporter<'a> {
    settings: &'a ImportSettings,
}

impl<'a> SceneImporter<'a> {
    #[must_use]
    pub fn new(settings: &'a ImportSettings) -> Self {
        Self { settings }
    }

    /// Runs the whole pipeline. The source scene gains the synthesized
    /// armature nodes; importing it again reuses them.
    pub fn import(&self, scene: &mut SourceScene) -> Result<ImportedScene> {
        self.settings.validate()?;
        if scene.root().is_none() {
            return Err(RigError::MissingRoot);
        }

        let mut diagnostics = Diagnostics::new();
        let mut ctx = ImportContext::new(scene);

        let (armatures, static_meshes) = ArmatureSynthesizer::new(self.settings).synthesize(scene, &mut diagnostics)?;
        ctx.armatures = armatures;
        ctx.static_mesh_nodes = static_meshes;
        ctx.index_nodes(scene);
        log::debug!(
            "Node count: {}, armatures: {}, static meshes: {}",
            ctx.nodes.len(),
            ctx.armatures.len(),
            ctx.static_mesh_nodes.len()
        );

        let anim_tree = AnimNodeTree::build(scene, &mut diagnostics);

        let stack = BoneStack::build(scene, &ctx.armatures, self.settings);
        log::debug!("Bone stack count: {}", stack.len());
        let mut skeletons = SlotMap::with_key();
        SkeletonBuilder::new(self.settings).build(scene, &stack, &mut ctx, &anim_tree, &mut skeletons, &mut diagnostics)?;

        let tree = self.build_output_tree(scene, &mut ctx)?;
        let anim_nodes = ctx
            .output
            .iter()
            .filter_map(|(source, &handle)| Some((handle, anim_tree.for_source(source)?)))
            .collect::<SecondaryMap<_, _>>();

        let mut imported = ImportedScene::new(tree, skeletons, anim_tree, anim_nodes, diagnostics);
        if self.settings.import_animations && !scene.animations.is_empty() {
            self.import_animations(scene, &ctx, &mut imported);
        }
        Ok(imported)
    }

    fn import_animations(&self, scene: &SourceScene, ctx: &ImportContext, out: &mut ImportedScene) {
        let mut importer = AnimationTrackImporter::new(self.settings);
        for index in 0..scene.animations.len() {
            if ctx.armatures.is_empty() {
                if let Err(err) = importer.import(scene, ctx, out, index, None) {
                    out.diagnostics.push(Diagnostic::Skipped {
                        operation: format!("animation #{index}"),
                        reason: err.to_string(),
                    });
                }
                continue;
            }
            for (armature_index, armature) in ctx.armatures.iter().enumerate() {
                if let Err(err) = importer.import(scene, ctx, out, index, Some(armature_index)) {
                    out.diagnostics.push(Diagnostic::Skipped {
                        operation: format!("animation #{index} for armature '{}'", armature.name),
                        reason: err.to_string(),
                    });
                }
            }
        }
    }

    /// One output node per source node, in preorder so parents exist first.
    fn build_output_tree(&self, scene: &SourceScene, ctx: &mut ImportContext) -> Result<SceneTree> {
        let mut tree = SceneTree::new();
        for i in 0..ctx.nodes.len() {
            let key = ctx.nodes[i];
            let Some(node) = scene.node(key) else {
                continue;
            };
            let kind = match ctx.kind(key) {
                Some(SourceNodeKind::Light) => NodeKind::Light,
                Some(SourceNodeKind::Camera) => NodeKind::Camera,
                Some(SourceNodeKind::Armature(a)) => match ctx.armature_skeletons.get(a).copied().flatten() {
                    Some(skeleton) => NodeKind::Skeleton(skeleton),
                    None => NodeKind::Plain,
                },
                Some(SourceNodeKind::Mesh) => NodeKind::Mesh {
                    meshes: SmallVec::from_slice(&node.meshes),
                    skeleton: mesh_skeleton(ctx, key),
                },
                _ => NodeKind::Plain,
            };
            let out = SceneNode::new(&node.name, node.transform, kind);
            let handle = match node.parent().and_then(|p| ctx.output.get(p).copied()) {
                Some(parent) => tree.add_child(parent, out)?,
                None => tree.set_root(out),
            };
            ctx.output.insert(key, handle);
        }
        Ok(tree)
    }
}

fn mesh_skeleton(ctx: &ImportContext, node: SourceNodeKey) -> Option<SkeletonKey> {
    let armature = ctx.armatures.iter().position(|a| a.mesh_node == node)?;
    ctx.armature_skeletons.get(armature).copied().flatten()
}
