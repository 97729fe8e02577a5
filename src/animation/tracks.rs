use crate::animation::values::Interpolatable;
use crate::errors::{Result, RigError};

/// How values are produced between two keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InterpolationMode {
    #[default]
    Linear,
    /// Hold the left key's value until the next key.
    Step,
    /// Packed layout with one phantom control point on each side:
    /// `values.len() == times.len() + 2`.
    CatmullRom,
    /// Groups of (in-tangent, value, out-tangent):
    /// `values.len() == times.len() * 3`.
    CubicSpline,
}

impl InterpolationMode {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Step => "step",
            Self::CatmullRom => "catmull-rom",
            Self::CubicSpline => "cubic-spline",
        }
    }

    /// Number of values a track with `key_count` keys must hold.
    #[must_use]
    pub const fn value_count(self, key_count: usize) -> usize {
        match self {
            Self::Linear | Self::Step => key_count,
            Self::CatmullRom => key_count + 2,
            Self::CubicSpline => key_count * 3,
        }
    }
}

const MAX_SCAN_OFFSET: usize = 3;

/// Remembers the last segment so sequential sampling is O(1).
#[derive(Debug, Clone, Default)]
pub struct KeyframeCursor {
    pub last_index: usize,
}

/// Time-stamped keys of one value type plus an interpolation mode.
///
/// Sampling is pure: the same track, time and mode always produce the same
/// value. Before the first key the first value is held, at or after the last
/// key the last value is held.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyframeTrack<T: Interpolatable> {
    pub times: Vec<f32>,
    pub values: Vec<T>,
    pub interpolation: InterpolationMode,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    #[must_use]
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: InterpolationMode) -> Self {
        Self {
            times,
            values,
            interpolation,
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Time of the last key, zero for an empty track.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Inserts a key keeping times sorted; a key at an existing time is
    /// replaced. Only meaningful for the unpacked `Linear` and `Step` layouts.
    pub fn insert_key(&mut self, time: f32, value: T) {
        debug_assert!(matches!(
            self.interpolation,
            InterpolationMode::Linear | InterpolationMode::Step
        ));
        let idx = self.times.partition_point(|&t| t < time);
        if self.times.get(idx) == Some(&time) {
            self.values[idx] = value;
        } else {
            self.times.insert(idx, time);
            self.values.insert(idx, value);
        }
    }

    /// Checks that the track can be sampled at all.
    pub fn validate_layout(&self) -> Result<()> {
        if self.times.is_empty() {
            return Err(RigError::EmptyTrack);
        }
        let expected = self.interpolation.value_count(self.times.len());
        if self.values.len() < expected {
            return Err(RigError::TrackLayout {
                mode: self.interpolation.name(),
                times: self.times.len(),
                expected,
                values: self.values.len(),
            });
        }
        Ok(())
    }

    /// Samples the track, reporting contract violations.
    pub fn try_sample(&self, time: f32) -> Result<T> {
        self.validate_layout()?;
        let next_idx = self.times.partition_point(|&t| t <= time);
        self.sample_segment(next_idx.checked_sub(1), time)
    }

    /// Samples the track. A contract violation is logged and the value type's
    /// fallback (identity for rotations) is returned.
    #[must_use]
    pub fn sample(&self, time: f32) -> T {
        self.try_sample(time).unwrap_or_else(|err| {
            log::error!("Track sample at t={time} failed: {err}");
            T::fallback()
        })
    }

    /// Sampling with cursor. `cursor` is updated to the segment found.
    pub fn try_sample_with_cursor(&self, time: f32, cursor: &mut KeyframeCursor) -> Result<T> {
        self.validate_layout()?;

        let len = self.times.len();
        if len == 1 || time < self.times[0] {
            cursor.last_index = 0;
            return self.sample_segment(None, time);
        }

        let i = cursor.last_index.min(len - 1);
        let t_curr = self.times[i];

        let found_index = if time >= t_curr {
            // Forward scan: playback or fast-forward
            let mut res = None;
            for offset in 0..=MAX_SCAN_OFFSET {
                let idx = i + offset;
                if idx >= len - 1 {
                    res = Some(len - 1);
                    break;
                }
                if time < self.times[idx + 1] {
                    res = Some(idx);
                    break;
                }
            }
            res
        } else {
            // Backward scan: reverse playback or loop reset
            let mut res = None;
            for offset in 1..=MAX_SCAN_OFFSET {
                let Some(idx) = i.checked_sub(offset) else {
                    break;
                };
                if time >= self.times[idx] {
                    res = Some(idx);
                    break;
                }
            }
            res
        };

        let index = found_index.unwrap_or_else(|| {
            // Large jump, fall back to binary search
            self.times.partition_point(|&t| t <= time).saturating_sub(1)
        });
        cursor.last_index = index;

        self.sample_segment(Some(index), time)
    }

    pub fn sample_with_cursor(&self, time: f32, cursor: &mut KeyframeCursor) -> T {
        self.try_sample_with_cursor(time, cursor).unwrap_or_else(|err| {
            log::error!("Track sample at t={time} failed: {err}");
            T::fallback()
        })
    }

    /// Key value at `index`, independent of the packed layout.
    fn value_at(&self, index: usize) -> T {
        match self.interpolation {
            InterpolationMode::Linear | InterpolationMode::Step => self.values[index],
            InterpolationMode::CatmullRom => self.values[index + 1],
            InterpolationMode::CubicSpline => self.values[index * 3 + 1],
        }
    }

    /// `index` is the last key with `times[index] <= time`, `None` before the
    /// first key.
    fn sample_segment(&self, index: Option<usize>, time: f32) -> Result<T> {
        let len = self.times.len();

        let Some(index) = index else {
            let value = self.value_at(0);
            value.validate("first")?;
            return Ok(value);
        };
        if index >= len - 1 {
            let value = self.value_at(len - 1);
            value.validate("last")?;
            return Ok(value);
        }

        let next_idx = index + 1;
        let t0 = self.times[index];
        let dt = self.times[next_idx] - t0;
        let c = if dt > 1e-6 { ((time - t0) / dt).clamp(0.0, 1.0) } else { 0.0 };

        match self.interpolation {
            InterpolationMode::Step => {
                let value = self.value_at(index);
                value.validate("step")?;
                Ok(value)
            }
            InterpolationMode::Linear => {
                let a = self.values[index];
                let b = self.values[next_idx];
                a.validate("a")?;
                b.validate("b")?;
                Ok(T::interpolate_linear(a, b, c))
            }
            InterpolationMode::CatmullRom => {
                let p = &self.values[index..index + 4];
                p[1].validate("p1")?;
                p[2].validate("p2")?;
                Ok(T::interpolate_catmull_rom(p[0], p[1], p[2], p[3], c))
            }
            InterpolationMode::CubicSpline => {
                let base = index * 3;
                let from = self.values[base + 1];
                let out_tangent = self.values[base + 2];
                let in_tangent = self.values[base + 3];
                let to = self.values[base + 4];
                from.validate("start")?;
                to.validate("end")?;
                Ok(T::interpolate_bezier(from, out_tangent, in_tangent, to, c))
            }
        }
    }
}
