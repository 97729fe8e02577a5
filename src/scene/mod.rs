//! Output Scene
//!
//! What the importer hands back to the embedding scene system:
//! - [`SceneTree`]: arena of [`SceneNode`]s mirroring the source hierarchy plus
//!   the synthesized armature nodes
//! - [`Skeleton`]: one bone container per armature
//! - [`Transform`]: decomposed TRS used by keyframes and pose writes

pub mod node;
pub mod skeleton;
pub mod transform;
pub mod tree;

pub use node::{NodeKind, SceneNode};
pub use skeleton::{Bone, Skeleton};
pub use transform::Transform;
pub use tree::SceneTree;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
    pub struct SkeletonKey;
}
