//! Load-time root motion extraction.
//!
//! A locomotion clip authored with its root joint walking forward is turned
//! into an in-place clip plus a constant velocity. The movement system then
//! integrates `velocity * dt` instead of the skeleton drifting away from its
//! owner.

use super::skeletal::{JointVec3Track, SkeletalClip, SkeletonAsset};
use super::ClipKeyframe;
use glam::Vec3;
use std::sync::Arc;

/// Extracts the root joint's average velocity into `clip.velocity` and removes
/// the matching linear drift from its translation keys.
///
/// Returns `false` and leaves the clip untouched when the root joint has no
/// translation channel or the channel spans no time.
pub fn neutralize_root_motion(clip: &mut SkeletalClip, skeleton: &SkeletonAsset, root_joint: u32) -> bool {
    let Some(joint) = skeleton.joint(root_joint) else {
        log::warn!("Clip '{}': root joint {root_joint} is not part of skeleton '{}'", clip.name, skeleton.name);
        return false;
    };
    let Some(curve_index) = clip
        .channels
        .iter()
        .position(|curve| curve.joint_index == root_joint && curve.translation.is_some())
    else {
        log::warn!("Clip '{}' has no translation channel on root joint '{}'", clip.name, joint.name);
        return false;
    };

    let mut channels = clip.channels.to_vec();
    let Some(track) = channels[curve_index].translation.as_ref() else {
        return false;
    };
    let (Some(first), Some(last)) = (track.keyframes.first().copied(), track.keyframes.last().copied()) else {
        return false;
    };
    let span = clip.duration - first.time;
    if span <= f32::EPSILON {
        log::warn!("Clip '{}': root translation spans no time; skipping root motion", clip.name);
        return false;
    }

    let naive_velocity = (last.value - first.value) / span;

    let to_world = joint.rest_world * joint.inverse_bind.inverse();
    let world_first = to_world.transform_point3(first.value);
    let world_last = to_world.transform_point3(last.value);
    clip.velocity = (world_last - world_first) / span;

    let interpolation = track.interpolation;
    let neutralized: Vec<ClipKeyframe<Vec3>> = track
        .keyframes
        .iter()
        .map(|kf| ClipKeyframe { time: kf.time, value: kf.value - naive_velocity * kf.time })
        .collect();
    channels[curve_index].translation = Some(JointVec3Track {
        interpolation,
        keyframes: Arc::from(neutralized.into_boxed_slice()),
    });
    clip.channels = Arc::from(channels.into_boxed_slice());
    true
}
