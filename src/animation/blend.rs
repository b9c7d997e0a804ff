use super::clip_player::sample_clip;
use super::pose::Pose;
use super::{advance_cursor, loop_time};
use crate::assets::skeletal::SkeletalClip;
use crate::assets::ClipTable;
use glam::Vec3;
use std::sync::Arc;

/// Static description of a two-clip blend.
#[derive(Clone, Debug, PartialEq)]
pub struct BlendDef {
    pub name: Arc<str>,
    pub clip_a: Arc<str>,
    pub clip_b: Arc<str>,
    /// Weight of `clip_b`, kept in `[0, 1]`.
    pub blend_factor: f32,
    pub duration: f32,
    pub looped: bool,
    /// Time-stretch both clips so their cycles line up with `duration`.
    pub fit: bool,
}

/// Playable mix of two clips with a single shared cursor.
#[derive(Clone, Debug)]
pub struct BlendPlayer {
    def: BlendDef,
    clip_a: Option<Arc<SkeletalClip>>,
    clip_b: Option<Arc<SkeletalClip>>,
    elapsed: f32,
}

impl BlendPlayer {
    /// Resolves the blend's clips by name. Missing clips are reported once
    /// here; the player then produces an empty pose.
    pub fn new(def: BlendDef, clips: &ClipTable) -> Self {
        let clip_a = clips.get(def.clip_a.as_ref()).cloned();
        let clip_b = clips.get(def.clip_b.as_ref()).cloned();
        for (missing, name) in [(clip_a.is_none(), &def.clip_a), (clip_b.is_none(), &def.clip_b)] {
            if missing {
                log::error!("Blend '{}' references unknown clip '{}'", def.name, name);
            }
        }
        Self { def, clip_a, clip_b, elapsed: 0.0 }
    }

    /// Builds a blend over two resolved clips with factor 0 and a duration
    /// equal to the longer clip.
    pub fn from_clips(
        name: impl Into<Arc<str>>,
        clip_a: Arc<SkeletalClip>,
        clip_b: Arc<SkeletalClip>,
        looped: bool,
        fit: bool,
    ) -> Self {
        let def = BlendDef {
            name: name.into(),
            clip_a: Arc::clone(&clip_a.name),
            clip_b: Arc::clone(&clip_b.name),
            blend_factor: 0.0,
            duration: clip_a.duration.max(clip_b.duration),
            looped,
            fit,
        };
        Self { def, clip_a: Some(clip_a), clip_b: Some(clip_b), elapsed: 0.0 }
    }

    pub fn def(&self) -> &BlendDef {
        &self.def
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn set_elapsed(&mut self, elapsed: f32) {
        self.elapsed = elapsed;
    }

    pub fn duration(&self) -> f32 {
        self.def.duration
    }

    pub fn set_duration(&mut self, duration: f32) {
        self.def.duration = duration.max(0.0);
    }

    pub fn looped(&self) -> bool {
        self.def.looped
    }

    pub fn blend_factor(&self) -> f32 {
        self.def.blend_factor
    }

    pub fn set_blend_factor(&mut self, factor: f32) {
        self.def.blend_factor = factor.clamp(0.0, 1.0);
    }

    pub fn advance(&mut self, dt: f32) {
        advance_cursor(&mut self.elapsed, self.def.duration, self.def.looped, dt);
    }

    pub fn pose(&self) -> Pose {
        self.pose_at(self.elapsed)
    }

    pub fn pose_at(&self, t: f32) -> Pose {
        let (Some(clip_a), Some(clip_b)) = (&self.clip_a, &self.clip_b) else {
            return Pose::default();
        };
        let t = loop_time(t, self.def.duration, self.def.looped);
        let (stretch_a, stretch_b) = self.stretch();
        let pose_a = sample_clip(clip_a, t * stretch_a);
        let pose_b = sample_clip(clip_b, t * stretch_b);
        Pose::blend(&pose_a, &pose_b, self.def.blend_factor)
    }

    /// Per-clip time scale. Identity unless `fit` is set.
    pub fn stretch(&self) -> (f32, f32) {
        match (&self.clip_a, &self.clip_b) {
            (Some(a), Some(b)) if self.def.fit && self.def.duration > 0.0 => {
                (a.duration / self.def.duration, b.duration / self.def.duration)
            }
            _ => (1.0, 1.0),
        }
    }

    /// Direction follows the blended velocity; magnitude blends the two speeds.
    pub fn velocity(&self) -> Vec3 {
        let (Some(a), Some(b)) = (&self.clip_a, &self.clip_b) else {
            return Vec3::ZERO;
        };
        let factor = self.def.blend_factor;
        let direction = a.velocity.lerp(b.velocity, factor).normalize_or_zero();
        let speed_a = a.velocity.length();
        let speed_b = b.velocity.length();
        direction * (speed_a + (speed_b - speed_a) * factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::skeletal::{JointCurve, JointVec3Track};
    use std::collections::HashMap;

    fn slide(name: &str, duration: f32, to: Vec3, velocity: Vec3) -> Arc<SkeletalClip> {
        let track = JointVec3Track::linear(&[(0.0, Vec3::ZERO), (duration, to)]).expect("track");
        let mut clip = SkeletalClip::new(name, "rig", vec![JointCurve::new(0).with_translation(track)], true);
        clip.velocity = velocity;
        Arc::new(clip)
    }

    #[test]
    fn blend_factor_is_clamped() {
        let (a, b) = (slide("a", 1.0, Vec3::X, Vec3::ZERO), slide("b", 1.0, Vec3::Y, Vec3::ZERO));
        let mut blend = BlendPlayer::from_clips("mix", a, b, true, false);
        blend.set_blend_factor(1.7);
        assert_eq!(blend.blend_factor(), 1.0);
        blend.set_blend_factor(-0.3);
        assert_eq!(blend.blend_factor(), 0.0);
    }

    #[test]
    fn fit_stretches_shorter_clip_to_blend_duration() {
        let (a, b) = (slide("a", 1.0, Vec3::X, Vec3::ZERO), slide("b", 2.0, Vec3::Y, Vec3::ZERO));
        let blend = BlendPlayer::from_clips("mix", a, b, true, true);
        assert_eq!(blend.duration(), 2.0);
        assert_eq!(blend.stretch(), (0.5, 1.0));
        // Halfway through the blend both clips are halfway through their cycle.
        let pose = blend.pose_at(1.0);
        let joint = pose.get(0).expect("joint 0");
        assert!((joint.translation - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn velocity_blends_direction_and_speed_separately() {
        let mut blend = BlendPlayer::from_clips(
            "mix",
            slide("a", 1.0, Vec3::X, Vec3::new(0.0, 0.0, 2.0)),
            slide("b", 1.0, Vec3::X, Vec3::new(4.0, 0.0, 0.0)),
            true,
            false,
        );
        blend.set_blend_factor(0.5);
        let velocity = blend.velocity();
        assert!((velocity.length() - 3.0).abs() < 1e-5);
        // Direction follows lerp((0,0,2), (4,0,0), 0.5) = (2,0,1).
        assert!((velocity.normalize() - Vec3::new(2.0, 0.0, 1.0).normalize()).length() < 1e-5);
    }

    #[test]
    fn missing_clip_yields_empty_pose() {
        let mut clips: ClipTable = HashMap::new();
        let a = slide("a", 1.0, Vec3::X, Vec3::Z);
        clips.insert(Arc::clone(&a.name), a);
        let def = BlendDef {
            name: Arc::from("broken"),
            clip_a: Arc::from("a"),
            clip_b: Arc::from("ghost"),
            blend_factor: 0.5,
            duration: 1.0,
            looped: true,
            fit: false,
        };
        let blend = BlendPlayer::new(def, &clips);
        assert!(blend.pose().is_empty());
        assert_eq!(blend.velocity(), Vec3::ZERO);
    }
}
