//! # myth_rig
//!
//! Skeleton and animation import for formats without a native armature
//! concept. Given an already-parsed [`SourceScene`](source::SourceScene) the
//! importer
//!
//! - synthesizes one armature node per skinned mesh node,
//! - deduplicates bones across meshes by identity into a bone stack,
//! - builds one [`Skeleton`](scene::Skeleton) per armature with parents
//!   always preceding children,
//! - mirrors the full node hierarchy into a shadow tree used for world
//!   placement of non-bone nodes during playback,
//! - resamples every animation channel at a fixed rate into linear transform
//!   tracks, bind-pose corrected for bones.
//!
//! Recoverable input problems are collected as [`Diagnostic`]s and forwarded
//! to the `log` facade; structural failures are [`RigError`]s.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod animation;
pub mod diagnostics;
pub mod errors;
pub mod import;
pub mod scene;
pub mod settings;
pub mod source;

pub use animation::{AnimationClip, InterpolationMode, KeyframeTrack, Track, TrackData, TrackPath, TrackTarget};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use errors::{Result, RigError};
pub use import::{ImportedScene, SceneImporter};
pub use scene::{Skeleton, Transform};
pub use settings::{ImportSettings, MeshBonePolicy};
pub use source::SourceScene;
