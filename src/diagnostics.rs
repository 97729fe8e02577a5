//! Import Diagnostics
//!
//! Real-world source files are messy. Instead of aborting, every stage of the
//! pipeline reports what it had to work around into a [`Diagnostics`] sink.
//! Each entry is forwarded to the `log` facade as it is recorded, so hosts that
//! only install a logger still see the warnings, while tests and tools can
//! inspect the structured list afterwards.

use thiserror::Error;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Input quality issue, handled with a documented fallback.
    Warning,
    /// Structural or contract failure; the affected sub-operation was skipped.
    Error,
}

/// A single recoverable issue encountered during import.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A node carries several meshes whose bone counts differ.
    #[error("node '{node}' carries meshes with differing bone counts ({first} vs {other}); first mesh wins")]
    AmbiguousBoneCount {
        node: String,
        first: usize,
        other: usize,
    },

    /// A node carries more than one mesh; only the first one drives armature synthesis.
    #[error("node '{node}' carries {count} meshes; armature generated from the first one")]
    MultiMeshNode { node: String, count: usize },

    /// A bone has no name and was renamed.
    #[error("untitled bone detected, renamed to '{placeholder}'")]
    EmptyBoneName { placeholder: String },

    /// Another bone of the same skeleton already carries this name; both
    /// resolve to the first one.
    #[error("duplicate bone name '{name}' in skeleton '{skeleton}', merged into the existing bone")]
    DuplicateBoneName { name: String, skeleton: String },

    /// No armature owns the mesh this bone belongs to.
    #[error("armature for bone '{bone}' (mesh '{mesh}') could not be resolved")]
    UnownedBone { bone: String, mesh: String },

    /// No node in the tree carries the bone's name; the bone keeps an
    /// identity rest.
    #[error("bone '{bone}' has no matching node in the scene tree, identity rest used")]
    BoneWithoutNode { bone: String },

    /// An animation channel targets neither a bone nor a node.
    #[error("animation '{animation}': channel '{channel}' matches no bone or node, dropped")]
    UnresolvedChannel { animation: String, channel: String },

    /// A morph channel could not be bound to a mesh node.
    #[error("animation '{animation}': morph channel '{channel}' could not be bound ({reason})")]
    UnresolvedMorphChannel {
        animation: String,
        channel: String,
        reason: &'static str,
    },

    /// The animation's ticks-per-second was zero; a fallback rate was used.
    #[error("animation '{animation}' has no tick rate, using {ticks_per_second} ticks/s")]
    TickRateFallback {
        animation: String,
        ticks_per_second: f64,
    },

    /// The animation's duration is NaN, infinite or negative; the clip length
    /// falls back to the last source key.
    #[error("animation '{animation}' has an unusable duration ({duration}), clip length set to {length}s")]
    InvalidDuration {
        animation: String,
        duration: f64,
        length: f32,
    },

    /// More than one animation exists; channel ids of the shadow tree come from the first.
    #[error("scene has {count} animations; anim node channel ids are taken from the first one")]
    MultipleAnimations { count: usize },

    /// No channel of the animation targets any bone of the armature's mesh.
    #[error("animation '{animation}' has no bone tracks for skeleton '{skeleton}'")]
    SkeletonWithoutBoneTracks { animation: String, skeleton: String },

    /// The bone parent graph is cyclic; declaration order was used instead.
    #[error("skeleton '{skeleton}' parenthood graph is cyclic, falling back to declaration order")]
    CyclicParents { skeleton: String },

    /// A sub-operation failed structurally and was skipped.
    #[error("{operation} skipped: {reason}")]
    Skipped {
        operation: String,
        reason: String,
    },
}

impl Diagnostic {
    /// Severity used when forwarding to the logger.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::CyclicParents { .. } | Self::Skipped { .. } => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

/// Ordered collection of diagnostics for one import.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic and forwards it to the logger.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Warning => log::warn!("{diagnostic}"),
            Severity::Error => log::error!("{diagnostic}"),
        }
        self.entries.push(diagnostic);
    }

    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates over diagnostics matching a predicate.
    pub fn matching<'a>(
        &'a self,
        predicate: impl Fn(&Diagnostic) -> bool + 'a,
    ) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.entries.iter().filter(move |d| predicate(d))
    }
}
