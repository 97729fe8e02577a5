//! Error Types
//!
//! This module defines the error types used throughout the import pipeline.
//!
//! # Overview
//!
//! [`RigError`] only covers *structural* failures: conditions under which a
//! sub-operation (building one skeleton, importing one animation pass) cannot
//! produce a meaningful result. Data-quality problems that the pipeline can
//! work around (empty bone names, unresolved channels, ambiguous bone counts)
//! are reported through [`Diagnostics`](crate::diagnostics::Diagnostics)
//! instead and never surface as an `Err`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use myth_rig::errors::{RigError, Result};
//!
//! fn build() -> Result<()> {
//!     Err(RigError::MissingRoot)
//! }
//! ```

use thiserror::Error;

/// The main error type for the rig import pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RigError {
    // ========================================================================
    // Source Scene Errors
    // ========================================================================
    /// The source scene has no root node.
    #[error("Source scene has no root node")]
    MissingRoot,

    /// A node handle did not resolve inside its arena.
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// A node references a mesh that does not exist.
    #[error("Mesh index out of bounds: {index} (mesh count: {count})")]
    MeshIndexOutOfBounds {
        /// The invalid index
        index: usize,
        /// Number of meshes in the scene
        count: usize,
    },

    /// Sibling meshes on one node disagree on their bone count and the
    /// strict policy is active.
    #[error("Node '{node}' carries meshes with differing bone counts ({first} vs {other})")]
    AmbiguousMeshBones {
        /// Name of the offending node
        node: String,
        /// Bone count of the first mesh
        first: usize,
        /// Bone count of the disagreeing mesh
        other: usize,
    },

    // ========================================================================
    // Skeleton Errors
    // ========================================================================
    /// Bone index outside of the skeleton.
    #[error("Bone index out of bounds: {index} (bone count: {count})")]
    BoneIndexOutOfBounds {
        /// The invalid index
        index: usize,
        /// Number of bones in the skeleton
        count: usize,
    },

    /// A bone with this name already exists in the skeleton.
    #[error("Duplicate bone name: {0}")]
    DuplicateBoneName(String),

    /// Bone names must be non-empty and must not contain `:` or `/`.
    #[error("Invalid bone name: '{0}'")]
    InvalidBoneName(String),

    /// The requested parent index is invalid for this bone.
    #[error("Invalid parent {parent} for bone {bone}")]
    InvalidParent {
        /// Bone being re-parented
        bone: usize,
        /// Requested parent
        parent: usize,
    },

    /// The bone parent graph contains a cycle.
    #[error("Skeleton '{0}' parenthood graph is cyclic")]
    CyclicHierarchy(String),

    /// A bone-targeted track needs a skeleton that was never built.
    #[error("No skeleton available for armature '{0}'")]
    MissingSkeleton(String),

    // ========================================================================
    // Animation Errors
    // ========================================================================
    /// Sampling was requested on a track without keys.
    #[error("Cannot sample an empty track")]
    EmptyTrack,

    /// The value array does not match the layout the interpolation mode needs.
    #[error("Track layout mismatch: {mode} with {times} keys needs {expected} values, got {values}")]
    TrackLayout {
        /// Interpolation mode name
        mode: &'static str,
        /// Number of key times
        times: usize,
        /// Values required by the mode
        expected: usize,
        /// Values present
        values: usize,
    },

    /// A quaternion operand of the interpolator was not unit length.
    #[error("Quaternion operand '{0}' must be normalized")]
    NonNormalizedQuaternion(&'static str),

    /// A track path could not be parsed.
    #[error("Invalid track path: '{0}'")]
    InvalidTrackPath(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Import settings failed validation.
    #[error("Invalid import settings: {0}")]
    InvalidSettings(String),
}

/// Alias for `Result<T, RigError>`.
pub type Result<T> = std::result::Result<T, RigError>;
