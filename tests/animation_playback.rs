use gait::animation::sampler::{sample_quat, sample_vec3};
use gait::animation::{sample_clip, AnimationController, BlendPlayer, ClipPlayer, ControllerState, Pose};
use gait::assets::skeletal::{JointCurve, JointQuatTrack, JointVec3Track, SkeletalClip};
use glam::{Quat, Vec3};
use std::sync::Arc;

/// Joint 0 slides from the origin to `to` over `duration` seconds.
fn slide(name: &str, duration: f32, to: Vec3, velocity: Vec3, looped: bool) -> Arc<SkeletalClip> {
    let track = JointVec3Track::linear(&[(0.0, Vec3::ZERO), (duration, to)]).expect("track");
    let mut clip = SkeletalClip::new(name, "rig", vec![JointCurve::new(0).with_translation(track)], looped);
    clip.velocity = velocity;
    Arc::new(clip)
}

fn translation(pose: &Pose) -> Vec3 {
    pose.get(0).expect("joint 0 in pose").translation
}

fn approx(a: Vec3, b: Vec3) {
    assert!((a - b).length() < 1e-4, "expected {b:?}, got {a:?}");
}

/// Controller already playing `idle` from t = 0.
fn playing_idle(extra: Vec<Arc<SkeletalClip>>) -> AnimationController {
    let mut clips = vec![slide("idle", 2.0, Vec3::X * 2.0, Vec3::ZERO, true)];
    clips.extend(extra);
    let mut controller = AnimationController::new(clips);
    controller.select_animation("idle", 0.0, false);
    controller.advance(0.0);
    controller
}

#[test]
fn linear_tracks_interpolate_between_keys() {
    let track = JointVec3Track::linear(&[(0.0, Vec3::ZERO), (1.0, Vec3::new(2.0, 0.0, 0.0)), (3.0, Vec3::ZERO)])
        .expect("track");
    approx(sample_vec3(&track, 0.25).expect("sample"), Vec3::new(0.5, 0.0, 0.0));
    approx(sample_vec3(&track, 2.0).expect("sample"), Vec3::new(1.0, 0.0, 0.0));
    // Outside the keyed range the nearest key holds.
    approx(sample_vec3(&track, -1.0).expect("sample"), Vec3::ZERO);
    approx(sample_vec3(&track, 10.0).expect("sample"), Vec3::ZERO);
}

#[test]
fn rotation_tracks_slerp_the_short_way() {
    let start = Quat::from_rotation_y(0.1);
    // Same orientation as from_rotation_y(0.5) but in the opposite hemisphere.
    let end = -Quat::from_rotation_y(0.5);
    let track = JointQuatTrack::linear(&[(0.0, start), (1.0, end)]).expect("track");
    let mid = sample_quat(&track, 0.5).expect("sample");
    assert!(mid.dot(Quat::from_rotation_y(0.3)).abs() > 1.0 - 1e-4, "got {mid:?}");
}

#[test]
fn transition_completes_after_its_duration() {
    let mut controller = playing_idle(vec![slide("walk", 1.0, Vec3::Z, Vec3::Z, true)]);
    controller.select_animation("walk", 0.2, false);
    assert_eq!(controller.next_animation(), Some("walk"));

    controller.advance(0.1);
    assert_eq!(controller.state(), ControllerState::Transitioning);
    assert!((controller.transition_ratio() - 0.5).abs() < 1e-5);

    controller.advance(0.1);
    assert_eq!(controller.state(), ControllerState::Playing);
    assert_eq!(controller.current_animation(), Some("walk"));
    assert_eq!(controller.next_animation(), None);
    assert_eq!(controller.transition_ratio(), 0.0);
}

#[test]
fn crossfade_midpoint_blends_both_cursors() {
    let walk = slide("walk", 1.0, Vec3::Z, Vec3::Z, true);
    let mut controller = playing_idle(vec![Arc::clone(&walk)]);
    controller.select_animation("walk", 1.0, false);
    let pose = controller.advance(0.5).clone();

    let idle_at = ClipPlayer::new(slide("idle", 2.0, Vec3::X * 2.0, Vec3::ZERO, true)).pose_at(0.5);
    let walk_at = ClipPlayer::new(walk).pose_at(0.5);
    let expected = Pose::blend(&idle_at, &walk_at, 0.5);
    approx(translation(&pose), translation(&expected));
    approx(translation(&pose), Vec3::new(0.25, 0.0, 0.25));
    approx(controller.velocity(), Vec3::new(0.0, 0.0, 0.5));
}

#[test]
fn unknown_name_leaves_state_untouched() {
    let mut controller = playing_idle(vec![]);
    controller.advance(0.3);
    controller.select_animation("moonwalk", 0.2, true);
    assert_eq!(controller.state(), ControllerState::Playing);
    assert_eq!(controller.current_animation(), Some("idle"));
    assert!((controller.elapsed_of("idle").expect("idle cursor") - 0.3).abs() < 1e-6);
    assert_eq!(controller.elapsed_of("moonwalk"), None);
}

#[test]
fn lockstep_starts_target_at_matching_phase() {
    let mut controller = playing_idle(vec![slide("walk", 0.5, Vec3::Z, Vec3::Z, true)]);
    controller.advance(1.5);
    controller.select_animation("walk", 0.2, true);
    let walk_elapsed = controller.elapsed_of("walk").expect("walk cursor");
    assert!((walk_elapsed - 0.375).abs() < 1e-5, "got {walk_elapsed}");
}

#[test]
fn without_lockstep_target_restarts() {
    let mut controller = playing_idle(vec![slide("walk", 0.5, Vec3::Z, Vec3::Z, true)]);
    controller.select_animation("walk", 0.0, false);
    controller.advance(0.3);
    controller.select_animation("idle", 0.0, false);
    controller.advance(0.0);
    controller.select_animation("walk", 0.2, false);
    assert_eq!(controller.elapsed_of("walk"), Some(0.0));
}

#[test]
fn first_selection_shows_target_without_blending() {
    let mut controller = AnimationController::new([slide("walk", 1.0, Vec3::Z, Vec3::Z, true)]);
    controller.select("walk");
    assert!((controller.transition_duration() - 0.2).abs() < 1e-6);
    let pose = controller.advance(0.1).clone();
    approx(translation(&pose), Vec3::new(0.0, 0.0, 0.1));
    // No current entry yet, so no velocity.
    assert_eq!(controller.velocity(), Vec3::ZERO);
}

#[test]
fn looping_clip_wraps_and_one_shot_holds() {
    let mut controller = AnimationController::new([
        slide("loop", 1.0, Vec3::X, Vec3::ZERO, true),
        slide("once", 1.0, Vec3::Y, Vec3::ZERO, false),
    ]);
    controller.select_animation("loop", 0.0, false);
    for _ in 0..5 {
        controller.advance(0.25);
    }
    approx(translation(controller.pose()), Vec3::new(0.25, 0.0, 0.0));

    controller.select_animation("once", 0.0, false);
    for _ in 0..8 {
        controller.advance(0.25);
    }
    approx(translation(controller.pose()), Vec3::Y);
}

#[test]
fn looping_pose_repeats_every_cycle() {
    let mut player = ClipPlayer::new(slide("loop", 1.0, Vec3::X, Vec3::ZERO, true));
    for t in [0.3_f32, 1.0, 1.3, 2.7, 5.25] {
        approx(translation(&player.pose_at(t)), translation(&player.pose_at(t % 1.0)));
    }

    let mut total = 0.0_f32;
    for _ in 0..12 {
        player.advance(0.3);
        total += 0.3;
        approx(translation(&player.pose()), translation(&player.pose_at(total % 1.0)));
    }
}

#[test]
fn blend_factor_extremes_match_each_stretched_clip() {
    let a = slide("a", 1.0, Vec3::X, Vec3::ZERO, true);
    let b = slide("b", 2.0, Vec3::Y, Vec3::ZERO, true);
    let mut blend = BlendPlayer::from_clips("mix", Arc::clone(&a), Arc::clone(&b), true, true);
    let (stretch_a, stretch_b) = blend.stretch();
    let t = 0.7;

    blend.set_blend_factor(0.0);
    let expected_a = sample_clip(&a, t * stretch_a);
    approx(translation(&blend.pose_at(t)), translation(&expected_a));
    approx(translation(&expected_a), Vec3::new(0.35, 0.0, 0.0));

    blend.set_blend_factor(1.0);
    let expected_b = sample_clip(&b, t * stretch_b);
    approx(translation(&blend.pose_at(t)), translation(&expected_b));
    approx(translation(&expected_b), Vec3::new(0.0, 0.35, 0.0));
}

#[test]
fn blends_play_through_the_controller() {
    let mut controller = playing_idle(vec![
        slide("walk", 1.0, Vec3::Z, Vec3::new(0.0, 0.0, 1.0), true),
        slide("run", 0.5, Vec3::Z * 2.0, Vec3::new(0.0, 0.0, 3.0), true),
    ]);
    assert!(controller.add_blend("jog", "walk", "run", true, true));
    assert!(controller.set_blend_factor("jog", 0.5));
    assert!(!controller.set_blend_factor("walk", 0.5));

    controller.select_animation("jog", 0.0, false);
    controller.advance(0.0);
    assert_eq!(controller.current_animation(), Some("jog"));
    approx(controller.velocity(), Vec3::new(0.0, 0.0, 2.0));

    // Fit stretches run's half second cycle across the blend's one second.
    let pose = controller.advance(0.5).clone();
    approx(translation(&pose), Vec3::new(0.0, 0.0, 0.75));
}
