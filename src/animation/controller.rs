use super::blend::BlendPlayer;
use super::clip_player::ClipPlayer;
use super::pose::Pose;
use crate::assets::skeletal::SkeletalClip;
use glam::Vec3;
use std::collections::HashMap;
use std::sync::Arc;

/// Crossfade length used by [`AnimationController::select`].
pub const DEFAULT_TRANSITION_SECONDS: f32 = 0.2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerState {
    /// Nothing selected yet.
    Idle,
    Playing,
    Transitioning,
}

#[derive(Clone, Debug)]
enum Playable {
    Clip(ClipPlayer),
    Blend(BlendPlayer),
}

impl Playable {
    fn name(&self) -> &str {
        match self {
            Playable::Clip(player) => player.name(),
            Playable::Blend(player) => player.name(),
        }
    }

    fn elapsed(&self) -> f32 {
        match self {
            Playable::Clip(player) => player.elapsed(),
            Playable::Blend(player) => player.elapsed(),
        }
    }

    fn set_elapsed(&mut self, elapsed: f32) {
        match self {
            Playable::Clip(player) => player.set_elapsed(elapsed),
            Playable::Blend(player) => player.set_elapsed(elapsed),
        }
    }

    fn duration(&self) -> f32 {
        match self {
            Playable::Clip(player) => player.duration(),
            Playable::Blend(player) => player.duration(),
        }
    }

    fn advance(&mut self, dt: f32) {
        match self {
            Playable::Clip(player) => player.advance(dt),
            Playable::Blend(player) => player.advance(dt),
        }
    }

    fn pose(&self) -> Pose {
        match self {
            Playable::Clip(player) => player.pose(),
            Playable::Blend(player) => player.pose(),
        }
    }

    fn velocity(&self) -> Vec3 {
        match self {
            Playable::Clip(player) => player.velocity(),
            Playable::Blend(player) => player.velocity(),
        }
    }

    fn progress(&self) -> f32 {
        let duration = self.duration();
        if duration > 0.0 {
            self.elapsed() / duration
        } else {
            0.0
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Transition {
    next: usize,
    elapsed: f32,
    duration: f32,
    ratio: f32,
}

/// Plays one clip or blend at a time and crossfades between them.
///
/// Every name owns its own cursor, so switching back to a previously played
/// entry resumes from wherever that cursor was left unless the selection
/// repositions it.
#[derive(Clone, Debug)]
pub struct AnimationController {
    playables: Vec<Playable>,
    lookup: HashMap<Arc<str>, usize>,
    current: Option<usize>,
    transition: Option<Transition>,
    default_transition: f32,
    pose: Pose,
}

impl AnimationController {
    /// Creates a controller over a clip table. Nothing plays until the first
    /// selection.
    pub fn new(clips: impl IntoIterator<Item = Arc<SkeletalClip>>) -> Self {
        let mut clips: Vec<Arc<SkeletalClip>> = clips.into_iter().collect();
        clips.sort_by(|a, b| a.name.cmp(&b.name));
        let mut controller = Self {
            playables: Vec::with_capacity(clips.len()),
            lookup: HashMap::with_capacity(clips.len()),
            current: None,
            transition: None,
            default_transition: DEFAULT_TRANSITION_SECONDS,
            pose: Pose::default(),
        };
        for clip in clips {
            if controller.lookup.contains_key(clip.name.as_ref()) {
                log::warn!("Duplicate clip '{}' ignored", clip.name);
                continue;
            }
            controller.lookup.insert(Arc::clone(&clip.name), controller.playables.len());
            controller.playables.push(Playable::Clip(ClipPlayer::new(clip)));
        }
        controller
    }

    pub fn with_default_transition(mut self, seconds: f32) -> Self {
        self.default_transition = seconds.max(0.0);
        self
    }

    pub fn default_transition(&self) -> f32 {
        self.default_transition
    }

    /// Registers a blend of two clips under `name`. Its duration is the
    /// longer of the two clips.
    ///
    /// Returns `false` when either clip is unknown or `name` already names a
    /// clip. An existing blend with the same name is replaced.
    pub fn add_blend(&mut self, name: &str, clip_a: &str, clip_b: &str, looped: bool, fit: bool) -> bool {
        let (Some(a), Some(b)) = (self.clip(clip_a), self.clip(clip_b)) else {
            log::error!("Blend '{name}': unknown clip '{clip_a}' or '{clip_b}'");
            return false;
        };
        let blend = Playable::Blend(BlendPlayer::from_clips(name, a, b, looped, fit));
        match self.lookup.get(name).copied() {
            Some(index) => match &self.playables[index] {
                Playable::Clip(_) => {
                    log::error!("Blend '{name}' would shadow a clip of the same name");
                    false
                }
                Playable::Blend(_) => {
                    log::warn!("Blend '{name}' redefined");
                    self.playables[index] = blend;
                    true
                }
            },
            None => {
                self.lookup.insert(Arc::from(name), self.playables.len());
                self.playables.push(blend);
                true
            }
        }
    }

    /// Starts a crossfade to `name` using the default transition length.
    pub fn select(&mut self, name: &str) {
        self.select_animation(name, self.default_transition, false);
    }

    /// Starts a crossfade of `transition_duration` seconds to `name`.
    ///
    /// Selecting the current entry or the one already faded toward is a
    /// no-op. With `lockstep` the target starts at the same fraction of its
    /// cycle as the current entry; otherwise it restarts from zero. A new
    /// selection during a crossfade replaces the pending one.
    pub fn select_animation(&mut self, name: &str, transition_duration: f32, lockstep: bool) {
        let Some(&target) = self.lookup.get(name) else {
            log::error!("Invalid animation or blend: '{name}'");
            return;
        };
        if self.current == Some(target) || self.transition.map(|t| t.next) == Some(target) {
            return;
        }
        let ratio = match self.current {
            Some(current) if lockstep => self.playables[current].progress(),
            _ => 0.0,
        };
        let next = &mut self.playables[target];
        next.set_elapsed(next.duration() * ratio);
        let duration = transition_duration.max(0.0);
        self.transition = Some(Transition { next: target, elapsed: 0.0, duration, ratio: 0.0 });
        log::debug!(
            "Crossfade {} -> {name} over {:.3}s (start {:.3})",
            self.current_animation().unwrap_or("<none>"),
            transition_duration,
            ratio
        );
    }

    /// Steps playback by `dt` seconds and publishes the new pose.
    ///
    /// A crossfade whose elapsed time reaches its duration completes on this
    /// frame: the target becomes current and is the only pose sampled.
    pub fn advance(&mut self, dt: f32) -> &Pose {
        if self.current.is_none() && self.transition.is_none() {
            return &self.pose;
        }

        if let Some(mut transition) = self.transition.take() {
            transition.elapsed += dt;
            transition.ratio = if transition.duration > 0.0 {
                (transition.elapsed / transition.duration).clamp(0.0, 1.0)
            } else {
                0.0
            };
            if transition.elapsed >= transition.duration {
                self.current = Some(transition.next);
                log::debug!("Crossfade to '{}' complete", self.playables[transition.next].name());
            } else {
                self.transition = Some(transition);
            }
        }

        let current_pose = self.current.map(|index| {
            let player = &mut self.playables[index];
            player.advance(dt);
            player.pose()
        });
        let next_pose = self.transition.map(|transition| {
            let player = &mut self.playables[transition.next];
            player.advance(dt);
            (player.pose(), transition.ratio)
        });

        self.pose = match (current_pose, next_pose) {
            (Some(current), Some((next, ratio))) => Pose::blend(&current, &next, ratio),
            (Some(current), None) => current,
            // First selection fades in from nothing: show the target as is.
            (None, Some((next, _))) => next,
            (None, None) => Pose::default(),
        };
        &self.pose
    }

    /// Root velocity of the current entry, lerped toward the target during a
    /// crossfade.
    pub fn velocity(&self) -> Vec3 {
        let Some(current) = self.current else {
            return Vec3::ZERO;
        };
        let velocity = self.playables[current].velocity();
        match self.transition {
            Some(transition) => velocity.lerp(self.playables[transition.next].velocity(), transition.ratio),
            None => velocity,
        }
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn state(&self) -> ControllerState {
        if self.transition.is_some() {
            ControllerState::Transitioning
        } else if self.current.is_some() {
            ControllerState::Playing
        } else {
            ControllerState::Idle
        }
    }

    pub fn current_animation(&self) -> Option<&str> {
        self.current.map(|index| self.playables[index].name())
    }

    pub fn next_animation(&self) -> Option<&str> {
        self.transition.map(|transition| self.playables[transition.next].name())
    }

    pub fn in_transition(&self) -> bool {
        self.transition.is_some()
    }

    pub fn transition_elapsed(&self) -> f32 {
        self.transition.map_or(0.0, |t| t.elapsed)
    }

    pub fn transition_duration(&self) -> f32 {
        self.transition.map_or(0.0, |t| t.duration)
    }

    pub fn transition_ratio(&self) -> f32 {
        self.transition.map_or(0.0, |t| t.ratio)
    }

    /// Cursor of any clip or blend by name.
    pub fn elapsed_of(&self, name: &str) -> Option<f32> {
        self.lookup.get(name).map(|&index| self.playables[index].elapsed())
    }

    pub fn clip_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.playables.iter().filter(|p| matches!(p, Playable::Clip(_))).map(Playable::name)
    }

    pub fn blend_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.playables.iter().filter(|p| matches!(p, Playable::Blend(_))).map(Playable::name)
    }

    pub fn blend(&self, name: &str) -> Option<&BlendPlayer> {
        match self.playables.get(*self.lookup.get(name)?)? {
            Playable::Blend(blend) => Some(blend),
            Playable::Clip(_) => None,
        }
    }

    pub fn blend_mut(&mut self, name: &str) -> Option<&mut BlendPlayer> {
        let index = *self.lookup.get(name)?;
        match self.playables.get_mut(index)? {
            Playable::Blend(blend) => Some(blend),
            Playable::Clip(_) => None,
        }
    }

    /// Sets a blend's weight, clamped to `[0, 1]`. Returns `false` when no
    /// blend has that name.
    pub fn set_blend_factor(&mut self, name: &str, factor: f32) -> bool {
        match self.blend_mut(name) {
            Some(blend) => {
                blend.set_blend_factor(factor);
                true
            }
            None => {
                log::warn!("set_blend_factor: '{name}' is not a blend");
                false
            }
        }
    }

    fn clip(&self, name: &str) -> Option<Arc<SkeletalClip>> {
        match self.playables.get(*self.lookup.get(name)?)? {
            Playable::Clip(player) => Some(Arc::clone(player.clip())),
            Playable::Blend(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::skeletal::{JointCurve, JointVec3Track};

    fn clip(name: &str, duration: f32) -> Arc<SkeletalClip> {
        let track = JointVec3Track::linear(&[(0.0, Vec3::ZERO), (duration, Vec3::X)]).expect("track");
        Arc::new(SkeletalClip::new(name, "rig", vec![JointCurve::new(0).with_translation(track)], true))
    }

    #[test]
    fn fresh_controller_is_idle_and_publishes_nothing() {
        let mut controller = AnimationController::new([clip("idle", 1.0)]);
        assert_eq!(controller.state(), ControllerState::Idle);
        assert!(controller.advance(0.1).is_empty());
        assert_eq!(controller.velocity(), Vec3::ZERO);
    }

    #[test]
    fn blend_cannot_shadow_clip() {
        let mut controller = AnimationController::new([clip("walk", 1.0), clip("run", 0.5)]);
        assert!(!controller.add_blend("walk", "walk", "run", true, true));
        assert!(!controller.add_blend("mix", "walk", "ghost", true, true));
        assert!(controller.add_blend("mix", "walk", "run", true, true));
        assert!(controller.add_blend("mix", "run", "walk", true, false));
        assert_eq!(controller.blend_names().collect::<Vec<_>>(), vec!["mix"]);
        let blend = controller.blend("mix").expect("blend registered");
        assert_eq!(blend.duration(), 1.0);
        assert!(!blend.def().fit);
    }

    #[test]
    fn zero_length_transition_completes_on_next_advance() {
        let mut controller = AnimationController::new([clip("idle", 1.0)]);
        controller.select_animation("idle", 0.0, false);
        assert_eq!(controller.state(), ControllerState::Transitioning);
        controller.advance(0.0);
        assert_eq!(controller.state(), ControllerState::Playing);
        assert_eq!(controller.current_animation(), Some("idle"));
    }

    #[test]
    fn reselecting_pending_target_keeps_transition_clock() {
        let mut controller = AnimationController::new([clip("idle", 1.0), clip("walk", 1.0)]);
        controller.select_animation("idle", 0.0, false);
        controller.advance(0.0);
        controller.select_animation("walk", 1.0, false);
        controller.advance(0.25);
        controller.select_animation("walk", 1.0, false);
        assert!((controller.transition_elapsed() - 0.25).abs() < 1e-6);
        controller.select_animation("idle", 1.0, false);
        assert_eq!(controller.next_animation(), Some("walk"));
    }
}
