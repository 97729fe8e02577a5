use glam::{Quat, Vec3};

/// Position or scale key, time in source ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorKey {
    pub time: f64,
    pub value: Vec3,
}

impl VectorKey {
    #[inline]
    #[must_use]
    pub const fn new(time: f64, value: Vec3) -> Self {
        Self { time, value }
    }
}

/// Rotation key, time in source ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuatKey {
    pub time: f64,
    pub value: Quat,
}

impl QuatKey {
    #[inline]
    #[must_use]
    pub const fn new(time: f64, value: Quat) -> Self {
        Self { time, value }
    }
}

/// Keyframes animating one node (or bone) by name.
#[derive(Debug, Clone, Default)]
pub struct NodeChannel {
    pub node_name: String,
    pub position_keys: Vec<VectorKey>,
    pub rotation_keys: Vec<QuatKey>,
    pub scaling_keys: Vec<VectorKey>,
}

impl NodeChannel {
    #[must_use]
    pub fn new(node_name: &str) -> Self {
        Self {
            node_name: node_name.to_string(),
            ..Default::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.position_keys.is_empty() && self.rotation_keys.is_empty() && self.scaling_keys.is_empty()
    }

    /// Length of the longest of the three key arrays.
    #[inline]
    #[must_use]
    pub fn max_key_count(&self) -> usize {
        self.position_keys
            .len()
            .max(self.rotation_keys.len())
            .max(self.scaling_keys.len())
    }
}

/// One key of a morph channel: parallel blend-shape indices and weights.
#[derive(Debug, Clone, Default)]
pub struct MorphKey {
    pub time: f64,
    pub values: Vec<u32>,
    pub weights: Vec<f32>,
}

/// Blend-shape weights over time. `name` has the form `<mesh-node>*<index>`.
#[derive(Debug, Clone, Default)]
pub struct MorphChannel {
    pub name: String,
    pub keys: Vec<MorphKey>,
}

/// A named animation in source ticks.
#[derive(Debug, Clone, Default)]
pub struct SourceAnimation {
    pub name: String,
    /// Zero when the format did not specify a rate.
    pub ticks_per_second: f64,
    /// Duration in ticks.
    pub duration: f64,
    pub channels: Vec<NodeChannel>,
    pub morph_channels: Vec<MorphChannel>,
}

impl SourceAnimation {
    #[must_use]
    pub fn new(name: &str, ticks_per_second: f64, duration: f64) -> Self {
        Self {
            name: name.to_string(),
            ticks_per_second,
            duration,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_channel(mut self, channel: NodeChannel) -> Self {
        self.channels.push(channel);
        self
    }

    /// Latest finite key time over all node and morph channels, in ticks.
    #[must_use]
    pub fn last_key_time(&self) -> Option<f64> {
        let node_keys = self.channels.iter().flat_map(|c| {
            c.position_keys
                .iter()
                .map(|k| k.time)
                .chain(c.rotation_keys.iter().map(|k| k.time))
                .chain(c.scaling_keys.iter().map(|k| k.time))
        });
        let morph_keys = self.morph_channels.iter().flat_map(|c| c.keys.iter().map(|k| k.time));
        node_keys
            .chain(morph_keys)
            .filter(|t| t.is_finite())
            .reduce(f64::max)
    }

    /// Index of the first channel targeting `name`.
    #[must_use]
    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channels.iter().position(|c| c.node_name == name)
    }
}
