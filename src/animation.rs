//! Skeletal animation playback.
//!
//! Clip data ([`SkeletalClip`](crate::assets::skeletal::SkeletalClip)) is
//! immutable and shared; every controller owns its own playback cursors, so
//! several characters can play the same clip table independently.

mod blend;
mod clip_player;
mod controller;
mod pose;
pub mod sampler;

pub use blend::{BlendDef, BlendPlayer};
pub use clip_player::{sample_clip, ClipPlayer};
pub use controller::{AnimationController, ControllerState, DEFAULT_TRANSITION_SECONDS};
pub use pose::{Pose, TransformOffset};

/// Tolerance used when deciding that a looping cursor reached the end.
pub const LOOP_EPSILON: f32 = 1e-5;

/// Moves a playback cursor forward by `dt`.
///
/// Looping cursors that reached `duration` are wrapped before `dt` is added,
/// by as many whole periods as needed, so a cursor pushed several cycles
/// past the end by a long frame is back in range on the next call.
/// Non-looping cursors keep growing and rely on the sampler holding the last
/// keyframe.
pub(crate) fn advance_cursor(elapsed: &mut f32, duration: f32, looped: bool, dt: f32) {
    if looped && *elapsed >= duration - LOOP_EPSILON {
        if duration > LOOP_EPSILON {
            let wraps = ((*elapsed + LOOP_EPSILON) / duration).floor().max(1.0);
            *elapsed -= wraps * duration;
        } else {
            *elapsed = 0.0;
        }
    }
    *elapsed += dt;
}

/// Sample time for a cursor at `t`. Looping timelines map `t` into one
/// period, and anything within [`LOOP_EPSILON`] of the end is the start of
/// the next cycle.
pub(crate) fn loop_time(t: f32, duration: f32, looped: bool) -> f32 {
    if !looped || duration <= LOOP_EPSILON || t < duration - LOOP_EPSILON {
        return t;
    }
    let wrapped = t.rem_euclid(duration);
    if wrapped >= duration - LOOP_EPSILON {
        0.0
    } else {
        wrapped
    }
}
