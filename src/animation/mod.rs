//! Animation Data
//!
//! - [`KeyframeTrack`]: generic sampler over time-stamped keys (linear, step,
//!   Catmull-Rom, cubic Bezier) with a normalized-slerp rotation specialization
//! - [`AnimationClip`]: named set of transform and value tracks produced by
//!   the importer
//! - [`TrackPath`]: `<node-path>:<bone-or-property>` addressing

pub mod clip;
pub mod path;
pub mod tracks;
pub mod values;

pub use clip::{AnimationClip, Track, TrackData, TrackTarget, TransformKey, TransformTrack};
pub use path::TrackPath;
pub use tracks::{InterpolationMode, KeyframeCursor, KeyframeTrack};
pub use values::Interpolatable;
