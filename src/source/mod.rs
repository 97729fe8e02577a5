//! Source scene model
//!
//! In-memory representation of an already parsed third-party scene:
//! - [`SourceScene`]: node arena, meshes, animations and format metadata
//! - [`SourceNode`]: named node with local transform, mesh references and children
//! - [`SourceMesh`] / [`SourceBone`]: per-mesh bone lists with bind offsets and weights
//! - [`SourceAnimation`]: keyframe channels in source ticks
//!
//! Parsing bytes into this model is the job of a format loader; the import
//! pipeline only reads it (and inserts synthesized armature nodes).

pub mod animation;
pub mod mesh;
pub mod metadata;
pub mod scene;

pub use animation::{MorphChannel, MorphKey, NodeChannel, QuatKey, SourceAnimation, VectorKey};
pub use mesh::{BoneId, SourceBone, SourceMesh, VertexWeight};
pub use metadata::SceneMetadata;
pub use scene::{SourceNode, SourceScene};

use slotmap::new_key_type;

new_key_type! {
    pub struct SourceNodeKey;
}
