//! Keyframe interpolation for Trinity animation curves
//!
//! Framed channels store an ascending, possibly sparse list of frame numbers.
//! Sampling honours the real spacing between keys: vectors use a non-uniform
//! Catmull-Rom spline and rotations use SQUAD with time-weighted control
//! quaternions. Curves with fewer than four keys fall back to lerp/slerp.

use glam::{Quat, Vec3};

/// Below this, log/exp treat a rotation as no rotation at all
const LOG_EXP_EPSILON: f32 = 1e-6;

/// Floor for key spacing when weighting SQUAD control quaternions
const MIN_KEY_SPACING: f32 = 1e-6;

/// Minimum number of keys before cubic interpolation is used
pub const CUBIC_MIN_KEYS: usize = 4;

/// Types that can be interpolated between animation keys
pub trait Interpolate: Copy {
    /// Interpolate between two bracketing keys, `t` in `[0, 1]`
    fn interpolate_linear(from: Self, to: Self, t: f32) -> Self;

    /// Interpolate inside `keys[1]..keys[2]` using the outer keys as neighbours
    ///
    /// `times` holds the frame number of each key in `keys`, `time` is the
    /// query frame.
    fn interpolate_cubic(keys: [Self; 4], times: [f32; 4], time: f32) -> Self;
}

impl Interpolate for Vec3 {
    fn interpolate_linear(from: Self, to: Self, t: f32) -> Self {
        from.lerp(to, t)
    }

    fn interpolate_cubic(keys: [Self; 4], times: [f32; 4], time: f32) -> Self {
        catmull_rom_non_uniform(keys, times, time)
    }
}

impl Interpolate for Quat {
    fn interpolate_linear(from: Self, to: Self, t: f32) -> Self {
        from.slerp(to, t)
    }

    fn interpolate_cubic(keys: [Self; 4], times: [f32; 4], time: f32) -> Self {
        squad_non_uniform(keys, times, time)
    }
}

/// Find the index of the key at or before the given frame
///
/// Returns None if there are no keys. For interpolation this is the earlier
/// key of the bracketing pair (`[index]` and `[index + 1]`).
pub fn find_key_index<F: Copy + Into<f32>>(frames: &[F], frame: f32) -> Option<usize> {
    if frames.is_empty() {
        return None;
    }

    let last_index = frames.len() - 1;
    if frame >= key_frame(frames[last_index]) {
        return Some(last_index);
    }

    // Largest index where frames[index] <= frame
    let mut low = 0;
    let mut high = last_index;
    while low < high {
        let mid = (low + high).div_ceil(2);
        if key_frame(frames[mid]) <= frame {
            low = mid;
        } else {
            high = mid - 1;
        }
    }

    Some(low)
}

/// Sample a keyed curve at a continuous frame
///
/// Only the first `min(frames.len(), values.len())` keys are used. Frames
/// outside the key range clamp to the first or last value, and a frame that
/// lands exactly on a key returns that key unmodified.
pub fn sample_curve<F, V>(frames: &[F], values: &[V], frame: f32) -> Option<V>
where
    F: Copy + Into<f32>,
    V: Interpolate,
{
    sample_curve_with(frames, values, frame, |value| *value)
}

/// Sample a curve whose stored keys need decoding
///
/// Same rules as [`sample_curve`]; only the keys the interpolation touches
/// are passed to `decode`.
pub fn sample_curve_with<F, K, V>(
    frames: &[F],
    keys: &[K],
    frame: f32,
    decode: impl Fn(&K) -> V,
) -> Option<V>
where
    F: Copy + Into<f32>,
    V: Interpolate,
{
    let count = frames.len().min(keys.len());
    if count == 0 {
        return None;
    }
    let frames = &frames[..count];
    let keys = &keys[..count];

    if frame <= key_frame(frames[0]) {
        return Some(decode(&keys[0]));
    }
    if frame >= key_frame(frames[count - 1]) {
        return Some(decode(&keys[count - 1]));
    }

    let index = find_key_index(frames, frame)?;
    let k1 = key_frame(frames[index]);
    if k1 == frame {
        return Some(decode(&keys[index]));
    }
    if index + 1 >= count {
        return Some(decode(&keys[count - 1]));
    }

    let k2 = key_frame(frames[index + 1]);
    if k2 <= k1 {
        return Some(decode(&keys[index + 1]));
    }

    if count < CUBIC_MIN_KEYS {
        let t = ((frame - k1) / (k2 - k1)).clamp(0.0, 1.0);
        return Some(V::interpolate_linear(
            decode(&keys[index]),
            decode(&keys[index + 1]),
            t,
        ));
    }

    let prev = index.saturating_sub(1);
    let next = (index + 2).min(count - 1);

    Some(V::interpolate_cubic(
        [
            decode(&keys[prev]),
            decode(&keys[index]),
            decode(&keys[index + 1]),
            decode(&keys[next]),
        ],
        [key_frame(frames[prev]), k1, k2, key_frame(frames[next])],
        frame,
    ))
}

#[inline]
fn key_frame<F: Into<f32>>(frame: F) -> f32 {
    frame.into()
}

/// Catmull-Rom spline through `points[1]..points[2]` with non-uniform key spacing
///
/// Tangents are `(p_next - p_prev) * (dt_mid / dt_outer)`. A flank interval
/// with zero or negative spacing borrows the middle interval's spacing.
pub fn catmull_rom_non_uniform(points: [Vec3; 4], times: [f32; 4], time: f32) -> Vec3 {
    let [p0, p1, p2, p3] = points;
    let [t0, t1, t2, t3] = times;

    let t21 = t2 - t1;
    if t21 <= 0.0 {
        return p2;
    }

    let u = ((time - t1) / t21).clamp(0.0, 1.0);

    let mut t10 = t1 - t0;
    let mut t32 = t3 - t2;
    if t10 <= 0.0 {
        t10 = t21;
    }
    if t32 <= 0.0 {
        t32 = t21;
    }

    let m1 = (p2 - p0) * (t21 / (t10 + t21));
    let m2 = (p3 - p1) * (t21 / (t21 + t32));

    let u2 = u * u;
    let u3 = u2 * u;

    p1 * (2.0 * u3 - 3.0 * u2 + 1.0)
        + m1 * (u3 - 2.0 * u2 + u)
        + p2 * (-2.0 * u3 + 3.0 * u2)
        + m2 * (u3 - u2)
}

/// SQUAD between `keys[1]` and `keys[2]` with non-uniform key spacing
pub fn squad_non_uniform(keys: [Quat; 4], times: [f32; 4], time: f32) -> Quat {
    let [q0, q1, q2, q3] = keys;
    let [t0, t1, t2, t3] = times;

    if t2 <= t1 {
        return q2;
    }

    let u = ((time - t1) / (t2 - t1)).clamp(0.0, 1.0);

    // Whole window on the inner-left key's hemisphere
    let qa = ensure_same_hemisphere(q0, q1);
    let qb = q1;
    let qc = ensure_same_hemisphere(q2, q1);
    let qd = ensure_same_hemisphere(q3, q1);

    let dt10 = (t1 - t0).max(MIN_KEY_SPACING);
    let dt21 = (t2 - t1).max(MIN_KEY_SPACING);
    let dt32 = (t3 - t2).max(MIN_KEY_SPACING);

    let a1 = squad_control(qa, qb, qc, dt10, dt21);
    let a2 = squad_control(qb, qc, qd, dt21, dt32);

    squad(qb, qc, a1, a2, u)
}

/// Control quaternion for `q` from its neighbours, weighted by inverse key spacing
pub fn squad_control(q_prev: Quat, q: Quat, q_next: Quat, dt_prev: f32, dt_next: f32) -> Quat {
    let inverse = normalize_or_self(q).conjugate();
    let log_prev = quat_log(ensure_same_hemisphere(inverse * q_prev, Quat::IDENTITY));
    let log_next = quat_log(ensure_same_hemisphere(inverse * q_next, Quat::IDENTITY));

    let mut w_prev = 1.0 / dt_prev.max(MIN_KEY_SPACING);
    let mut w_next = 1.0 / dt_next.max(MIN_KEY_SPACING);
    let w_sum = w_prev + w_next;
    if w_sum > 0.0 {
        w_prev /= w_sum;
        w_next /= w_sum;
    } else {
        w_prev = 0.5;
        w_next = 0.5;
    }

    let tangent = (log_prev * w_prev + log_next * w_next) * -0.25;
    normalize_or_self(q * quat_exp(tangent))
}

/// Spherical quadrangle interpolation
pub fn squad(q1: Quat, q2: Quat, a1: Quat, a2: Quat, t: f32) -> Quat {
    let outer = q1.slerp(q2, t);
    let inner = a1.slerp(a2, t);
    outer.slerp(inner, 2.0 * t * (1.0 - t))
}

/// Quaternion logarithm, returned as a pure quaternion (`w = 0`)
pub fn quat_log(q: Quat) -> Quat {
    let n = normalize_or_self(q);
    let angle = n.w.clamp(-1.0, 1.0).acos();
    let sin = angle.sin();
    if sin.abs() < LOG_EXP_EPSILON {
        return Quat::from_xyzw(0.0, 0.0, 0.0, 0.0);
    }

    let scale = angle / sin;
    Quat::from_xyzw(n.x * scale, n.y * scale, n.z * scale, 0.0)
}

/// Quaternion exponential of a pure quaternion
pub fn quat_exp(q: Quat) -> Quat {
    let angle = Vec3::new(q.x, q.y, q.z).length();
    if angle < LOG_EXP_EPSILON {
        return normalize_or_self(Quat::from_xyzw(q.x, q.y, q.z, 1.0));
    }

    let scale = angle.sin() / angle;
    normalize_or_self(Quat::from_xyzw(
        q.x * scale,
        q.y * scale,
        q.z * scale,
        angle.cos(),
    ))
}

/// Flip `q` onto the same hemisphere as `reference`
#[inline]
pub fn ensure_same_hemisphere(q: Quat, reference: Quat) -> Quat {
    if q.dot(reference) < 0.0 { -q } else { q }
}

/// Normalize when the length is positive, otherwise return the input untouched
#[inline]
pub fn normalize_or_self(q: Quat) -> Quat {
    if q.length_squared() > 0.0 {
        q.normalize()
    } else {
        q
    }
}
