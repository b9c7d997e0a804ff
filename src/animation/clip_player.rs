use super::pose::{Pose, TransformOffset};
use super::sampler::{sample_quat, sample_vec3};
use super::{advance_cursor, loop_time};
use crate::assets::skeletal::SkeletalClip;
use glam::Vec3;
use std::sync::Arc;

/// Samples every channel of `clip` at `t`.
///
/// Properties without a channel stay at their identity value; imported clips
/// carry rest-pose channels for those, so this only matters for clips built
/// by hand.
pub fn sample_clip(clip: &SkeletalClip, t: f32) -> Pose {
    clip.channels
        .iter()
        .map(|curve| {
            let mut offset = TransformOffset::IDENTITY;
            if let Some(value) = curve.translation.as_ref().and_then(|track| sample_vec3(track, t)) {
                offset.translation = value;
            }
            if let Some(value) = curve.rotation.as_ref().and_then(|track| sample_quat(track, t)) {
                offset.rotation = value;
            }
            if let Some(value) = curve.scale.as_ref().and_then(|track| sample_vec3(track, t)) {
                offset.scale = value;
            }
            (curve.joint_index, offset)
        })
        .collect()
}

/// Playback cursor over one shared clip.
#[derive(Clone, Debug)]
pub struct ClipPlayer {
    clip: Arc<SkeletalClip>,
    elapsed: f32,
}

impl ClipPlayer {
    pub fn new(clip: Arc<SkeletalClip>) -> Self {
        Self { clip, elapsed: 0.0 }
    }

    pub fn clip(&self) -> &Arc<SkeletalClip> {
        &self.clip
    }

    pub fn name(&self) -> &str {
        &self.clip.name
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn set_elapsed(&mut self, elapsed: f32) {
        self.elapsed = elapsed;
    }

    pub fn duration(&self) -> f32 {
        self.clip.duration
    }

    pub fn looped(&self) -> bool {
        self.clip.looped
    }

    pub fn velocity(&self) -> Vec3 {
        self.clip.velocity
    }

    pub fn advance(&mut self, dt: f32) {
        advance_cursor(&mut self.elapsed, self.clip.duration, self.clip.looped, dt);
    }

    pub fn pose(&self) -> Pose {
        self.pose_at(self.elapsed)
    }

    /// Pose at cursor time `t`; looping clips sample `t` wrapped into one cycle.
    pub fn pose_at(&self, t: f32) -> Pose {
        sample_clip(&self.clip, loop_time(t, self.clip.duration, self.clip.looped))
    }
}
