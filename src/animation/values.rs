use glam::{Quat, Vec3};

use crate::errors::{Result, RigError};

/// A value that a [`KeyframeTrack`](crate::animation::KeyframeTrack) can
/// sample.
///
/// Implementations are pure functions of their inputs. Quaternions override
/// [`validate`](Interpolatable::validate) because every rotation handed to the
/// interpolator must already be normalized.
pub trait Interpolatable: Copy + Sized {
    /// Value returned when sampling cannot proceed.
    fn fallback() -> Self;

    /// Precondition check applied to every key that takes part in a sample.
    fn validate(&self, _role: &'static str) -> Result<()> {
        Ok(())
    }

    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self;

    /// Catmull-Rom segment between `p1` and `p2`.
    fn interpolate_catmull_rom(p0: Self, p1: Self, p2: Self, p3: Self, t: f32) -> Self;

    /// Bezier segment from `from` to `to`. The tangents are offsets relative to
    /// their key, so the control points are `from + out_tangent` and
    /// `to + in_tangent`.
    fn interpolate_bezier(from: Self, out_tangent: Self, in_tangent: Self, to: Self, t: f32) -> Self;
}

#[inline]
fn catmull_rom_weights(t: f32) -> [f32; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        0.5 * (-t3 + 2.0 * t2 - t),
        0.5 * (3.0 * t3 - 5.0 * t2 + 2.0),
        0.5 * (-3.0 * t3 + 4.0 * t2 + t),
        0.5 * (t3 - t2),
    ]
}

#[inline]
fn bezier_weights(t: f32) -> [f32; 4] {
    let omt = 1.0 - t;
    let omt2 = omt * omt;
    let t2 = t * t;
    [omt2 * omt, 3.0 * omt2 * t, 3.0 * omt * t2, t2 * t]
}

impl Interpolatable for f32 {
    fn fallback() -> Self {
        0.0
    }

    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start + (end - start) * t
    }

    fn interpolate_catmull_rom(p0: Self, p1: Self, p2: Self, p3: Self, t: f32) -> Self {
        let [w0, w1, w2, w3] = catmull_rom_weights(t);
        p0 * w0 + p1 * w1 + p2 * w2 + p3 * w3
    }

    fn interpolate_bezier(from: Self, out_tangent: Self, in_tangent: Self, to: Self, t: f32) -> Self {
        let [w0, w1, w2, w3] = bezier_weights(t);
        from * w0 + (from + out_tangent) * w1 + (to + in_tangent) * w2 + to * w3
    }
}

impl Interpolatable for Vec3 {
    fn fallback() -> Self {
        Vec3::ZERO
    }

    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start.lerp(end, t)
    }

    fn interpolate_catmull_rom(p0: Self, p1: Self, p2: Self, p3: Self, t: f32) -> Self {
        let [w0, w1, w2, w3] = catmull_rom_weights(t);
        p0 * w0 + p1 * w1 + p2 * w2 + p3 * w3
    }

    fn interpolate_bezier(from: Self, out_tangent: Self, in_tangent: Self, to: Self, t: f32) -> Self {
        let [w0, w1, w2, w3] = bezier_weights(t);
        from * w0 + (from + out_tangent) * w1 + (to + in_tangent) * w2 + to * w3
    }
}

/// Rotations never blend component-wise: every mode reduces to a normalized
/// slerp between the two bracketing keys.
impl Interpolatable for Quat {
    fn fallback() -> Self {
        Quat::IDENTITY
    }

    fn validate(&self, role: &'static str) -> Result<()> {
        if self.is_normalized() {
            Ok(())
        } else {
            Err(RigError::NonNormalizedQuaternion(role))
        }
    }

    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start.slerp(end, t).normalize()
    }

    fn interpolate_catmull_rom(_p0: Self, p1: Self, p2: Self, _p3: Self, t: f32) -> Self {
        p1.slerp(p2, t).normalize()
    }

    fn interpolate_bezier(from: Self, _out_tangent: Self, _in_tangent: Self, to: Self, t: f32) -> Self {
        from.slerp(to, t).normalize()
    }
}
