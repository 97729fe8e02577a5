//! Import Settings
//!
//! This module defines the knobs of the skeleton / animation import pipeline.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use myth_rig::settings::{ImportSettings, MeshBonePolicy};
//!
//! // Defaults: 30 fps bake, animations on, first-mesh-wins bone policy
//! let settings = ImportSettings::default();
//!
//! // Strict import that refuses ambiguous multi-mesh nodes
//! let settings = ImportSettings {
//!     bake_fps: 60,
//!     mesh_bone_policy: MeshBonePolicy::RequireEqual,
//!     ..Default::default()
//! };
//! ```

use crate::errors::{Result, RigError};

/// Ticks-per-second used when neither the animation nor the scene metadata
/// provide a usable rate.
pub const DEFAULT_TICKS_PER_SECOND: f64 = 25.0;

/// Suffix appended to a mesh name to form its synthesized armature node.
pub const ARMATURE_SUFFIX: &str = "_ArmatureNode";

/// Name given to bones that arrive without one.
pub const PLACEHOLDER_BONE_NAME: &str = "untitled_bone_name";

// ---------------------------------------------------------------------------
// MeshBonePolicy
// ---------------------------------------------------------------------------

/// How to treat a node whose meshes disagree on their bone count.
///
/// The source format allows a node to reference several meshes, and only one
/// armature is synthesized per node. When the meshes carry different bone
/// sets there is no correct answer, so the behaviour is a policy decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MeshBonePolicy {
    /// The first mesh's bone set decides; a diagnostic is emitted for every
    /// disagreeing sibling mesh.
    #[default]
    FirstMeshWins,
    /// Any disagreement aborts the import with
    /// [`RigError::AmbiguousMeshBones`].
    RequireEqual,
}

// ---------------------------------------------------------------------------
// ImportSettings
// ---------------------------------------------------------------------------

/// Configuration for one import run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ImportSettings {
    /// Output sample rate of resampled transform tracks (frames per second).
    pub bake_fps: u32,
    /// Whether animations are imported at all.
    pub import_animations: bool,
    /// Tick rate used when the source provides none.
    pub fallback_ticks_per_second: f64,
    /// Suffix for synthesized armature node names.
    pub armature_suffix: String,
    /// Replacement for empty bone names.
    pub placeholder_bone_name: String,
    /// Multi-mesh bone count policy.
    pub mesh_bone_policy: MeshBonePolicy,
    /// Drop channels whose longest key array holds at most one key.
    pub skip_static_channels: bool,
    /// Take missing position/rotation/scale components from the node's local
    /// transform instead of the identity.
    pub fill_missing_from_rest: bool,
    /// Mark clips named `loop*`, `*loop`, `cycle*` or `*cycle` as looping.
    pub loop_name_hints: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            bake_fps: 30,
            import_animations: true,
            fallback_ticks_per_second: DEFAULT_TICKS_PER_SECOND,
            armature_suffix: ARMATURE_SUFFIX.to_string(),
            placeholder_bone_name: PLACEHOLDER_BONE_NAME.to_string(),
            mesh_bone_policy: MeshBonePolicy::default(),
            skip_static_channels: false,
            fill_missing_from_rest: false,
            loop_name_hints: true,
        }
    }
}

impl ImportSettings {
    /// Checks that the settings can drive an import.
    pub fn validate(&self) -> Result<()> {
        if self.bake_fps == 0 {
            return Err(RigError::InvalidSettings("bake_fps must be greater than zero".into()));
        }
        if !(self.fallback_ticks_per_second.is_finite() && self.fallback_ticks_per_second > 0.0) {
            return Err(RigError::InvalidSettings(format!(
                "fallback_ticks_per_second must be positive, got {}",
                self.fallback_ticks_per_second
            )));
        }
        if self.armature_suffix.is_empty() {
            return Err(RigError::InvalidSettings("armature_suffix must not be empty".into()));
        }
        let placeholder = &self.placeholder_bone_name;
        if placeholder.is_empty() || placeholder.contains(':') || placeholder.contains('/') {
            return Err(RigError::InvalidSettings(format!(
                "placeholder_bone_name '{placeholder}' is not a valid bone name"
            )));
        }
        Ok(())
    }

    /// Time between two resampled keys, in seconds.
    #[inline]
    #[must_use]
    pub fn frame_step(&self) -> f32 {
        1.0 / self.bake_fps.max(1) as f32
    }

    /// Name of the armature node synthesized for `mesh_name`.
    #[must_use]
    pub fn armature_name(&self, mesh_name: &str) -> String {
        format!("{mesh_name}{}", self.armature_suffix)
    }
}
