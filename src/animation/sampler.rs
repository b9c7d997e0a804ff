//! Keyframe track sampling.

use crate::assets::skeletal::{JointQuatTrack, JointVec3Track};
use crate::assets::{ClipInterpolation, ClipKeyframe};
use glam::{Quat, Vec3};

/// Finds the keyframes around `t` and the interpolation fraction between them.
///
/// "next" is the first key later than `t`, "previous" the key before it.
/// Times before the first key or at/after the last key clamp both indices to
/// that key with a fraction of 0. Returns `None` for an empty track.
pub fn bracket<T>(keyframes: &[ClipKeyframe<T>], t: f32) -> Option<(usize, usize, f32)> {
    let last = keyframes.len().checked_sub(1)?;
    let next = keyframes.partition_point(|kf| kf.time <= t);
    if next > last {
        return Some((last, last, 0.0));
    }
    let prev = next.saturating_sub(1);
    let span = keyframes[next].time - keyframes[prev].time;
    let fraction = if span > 0.0 { (t - keyframes[prev].time).max(0.0) / span } else { 0.0 };
    Some((prev, next, fraction))
}

pub fn sample_vec3(track: &JointVec3Track, t: f32) -> Option<Vec3> {
    let (prev, next, fraction) = bracket(&track.keyframes, t)?;
    let v0 = track.keyframes[prev].value;
    Some(match track.interpolation {
        ClipInterpolation::Step => v0,
        ClipInterpolation::Linear => v0.lerp(track.keyframes[next].value, fraction),
    })
}

pub fn sample_quat(track: &JointQuatTrack, t: f32) -> Option<Quat> {
    let (prev, next, fraction) = bracket(&track.keyframes, t)?;
    let q0 = track.keyframes[prev].value;
    Some(match track.interpolation {
        ClipInterpolation::Step => q0,
        ClipInterpolation::Linear => q0.slerp(track.keyframes[next].value, fraction),
    })
}
