use crate::animation::path::TrackPath;
use crate::animation::tracks::{InterpolationMode, KeyframeTrack};
use crate::scene::{NodeHandle, SkeletonKey, Transform};

/// One resampled transform keyframe.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransformKey {
    pub time: f32,
    pub transform: Transform,
}

/// Transform keyframes sorted by time.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransformTrack {
    keys: Vec<TransformKey>,
    pub interpolation: InterpolationMode,
}

impl TransformTrack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a key, keeping keys sorted. A key at an existing time replaces it.
    pub fn insert_key(&mut self, time: f32, transform: Transform) {
        let idx = self.keys.partition_point(|k| k.time < time);
        let key = TransformKey { time, transform };
        match self.keys.get_mut(idx) {
            Some(existing) if existing.time == time => *existing = key,
            _ => self.keys.insert(idx, key),
        }
    }

    #[inline]
    #[must_use]
    pub fn keys(&self) -> &[TransformKey] {
        &self.keys
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[must_use]
    pub fn last_time(&self) -> Option<f32> {
        self.keys.last().map(|k| k.time)
    }

    /// Samples the track. Values are held before the first and after the last
    /// key; `Step` holds the left key, every other mode blends linearly.
    #[must_use]
    pub fn sample(&self, time: f32) -> Option<Transform> {
        let next = self.keys.partition_point(|k| k.time <= time);
        if next == 0 {
            return self.keys.first().map(|k| k.transform);
        }
        let prev = &self.keys[next - 1];
        let Some(next) = self.keys.get(next) else {
            return Some(prev.transform);
        };
        if self.interpolation == InterpolationMode::Step {
            return Some(prev.transform);
        }
        let dt = next.time - prev.time;
        let t = if dt > 1e-6 { ((time - prev.time) / dt).clamp(0.0, 1.0) } else { 0.0 };
        Some(prev.transform.lerp(&next.transform, t))
    }
}

/// Keyframe payload of a track.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrackData {
    Transform(TransformTrack),
    Value(KeyframeTrack<f32>),
}

/// What a track was bound to at import time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrackTarget {
    Bone { skeleton: SkeletonKey, bone: usize },
    Node(NodeHandle),
    BlendShape { node: NodeHandle, index: usize },
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Track {
    pub path: TrackPath,
    pub target: TrackTarget,
    pub data: TrackData,
}

impl Track {
    #[must_use]
    pub fn as_transform(&self) -> Option<&TransformTrack> {
        match &self.data {
            TrackData::Transform(track) => Some(track),
            TrackData::Value(_) => None,
        }
    }

    #[must_use]
    pub fn as_value(&self) -> Option<&KeyframeTrack<f32>> {
        match &self.data {
            TrackData::Value(track) => Some(track),
            TrackData::Transform(_) => None,
        }
    }
}

/// A named animation: tracks plus length in seconds.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationClip {
    pub name: String,
    pub length: f32,
    pub looping: bool,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    #[must_use]
    pub fn new(name: &str, length: f32) -> Self {
        Self {
            name: name.to_string(),
            length,
            ..Default::default()
        }
    }

    pub fn add_track(&mut self, track: Track) -> usize {
        self.tracks.push(track);
        self.tracks.len() - 1
    }

    #[must_use]
    pub fn find_track(&self, path: &TrackPath) -> Option<usize> {
        self.tracks.iter().position(|t| &t.path == path)
    }

    #[must_use]
    pub fn track(&self, path: &TrackPath) -> Option<&Track> {
        self.tracks.iter().find(|t| &t.path == path)
    }

    #[inline]
    #[must_use]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}
