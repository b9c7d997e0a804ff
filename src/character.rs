//! Third-person locomotion driven by root-motion velocities.
//!
//! The controller turns movement input into animation selections and moves
//! the character by the animator's blended root velocity, so feet and ground
//! travel stay in step during crossfades.

use crate::animation::AnimationController;
use crate::config::CharacterConfig;
use crate::wrap_angle;
use glam::{Quat, Vec3};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharacterState {
    Idle,
    Walk,
    Sprint,
    Strafe,
    StrafeRun,
    Turn,
}

/// Movement intent for one frame. Axes are in `[-1, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MovementInput {
    pub forward: f32,
    pub right: f32,
    pub sprint: bool,
}

impl MovementInput {
    fn has_forward(&self) -> bool {
        self.forward != 0.0
    }

    fn has_right(&self) -> bool {
        self.right != 0.0
    }
}

/// Displacement a state step asks for once the animator has advanced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Motion {
    #[default]
    Still,
    Forward,
    Orbit,
}

pub struct CharacterController {
    config: CharacterConfig,
    state: CharacterState,
    motion: Motion,
    position: Vec3,
    facing: f32,
    view_azimuth: f32,
}

impl CharacterController {
    pub fn new(config: CharacterConfig) -> Self {
        let view_azimuth = config.view_azimuth.rem_euclid(TAU);
        Self {
            position: config.start_position,
            facing: (view_azimuth + PI).rem_euclid(TAU),
            view_azimuth,
            state: CharacterState::Idle,
            motion: Motion::Still,
            config,
        }
    }

    pub fn state(&self) -> CharacterState {
        self.state
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Heading in radians, `[0, 2π)`.
    pub fn facing(&self) -> f32 {
        self.facing
    }

    pub fn view_azimuth(&self) -> f32 {
        self.view_azimuth
    }

    pub fn set_view_azimuth(&mut self, radians: f32) {
        self.view_azimuth = radians.rem_euclid(TAU);
    }

    pub fn orbit(&mut self, delta_radians: f32) {
        self.set_view_azimuth(self.view_azimuth + delta_radians);
    }

    pub fn forward_vector(&self) -> Vec3 {
        Vec3::new(self.facing.cos(), 0.0, self.facing.sin())
    }

    /// Model rotation matching `facing` for a rig authored looking down +Z.
    pub fn facing_rotation(&self) -> Quat {
        Quat::from_rotation_y(FRAC_PI_2 - self.facing)
    }

    /// Runs one state step, advances the animator by `dt`, then moves the
    /// character by the velocity of the freshly advanced animator.
    pub fn update(&mut self, input: &MovementInput, animator: &mut AnimationController, dt: f32) -> CharacterState {
        self.motion = Motion::Still;
        let next = match self.state {
            CharacterState::Idle => self.idle(input, animator),
            CharacterState::Walk => self.walk(input, animator),
            CharacterState::Sprint => self.sprint(input, animator),
            CharacterState::Strafe => self.strafe(input, animator),
            CharacterState::StrafeRun => self.strafe_run(input, animator),
            CharacterState::Turn => self.turn(animator, dt),
        };
        if next != self.state {
            log::debug!("Character {:?} -> {:?}", self.state, next);
        }
        self.state = next;

        animator.advance(dt);
        match self.motion {
            Motion::Still => {}
            Motion::Forward => self.move_forward(input, animator, dt),
            Motion::Orbit => self.orbit_sideways(input, animator, dt),
        }
        self.facing = self.facing.rem_euclid(TAU);
        self.view_azimuth = self.view_azimuth.rem_euclid(TAU);
        self.state
    }

    fn target_facing(&self) -> f32 {
        (self.view_azimuth + PI).rem_euclid(TAU)
    }

    fn facing_error(&self) -> f32 {
        wrap_angle(self.target_facing() - self.facing)
    }

    fn idle(&mut self, input: &MovementInput, animator: &mut AnimationController) -> CharacterState {
        animator.select_animation(&self.config.clips.idle, self.config.idle_transition, false);
        let misaligned = self.facing_error().abs() > self.config.facing_tolerance;
        if input.has_forward() {
            return if misaligned { CharacterState::Turn } else { CharacterState::Walk };
        }
        if input.has_right() {
            return if misaligned { CharacterState::Turn } else { CharacterState::Strafe };
        }
        CharacterState::Idle
    }

    fn turn(&mut self, animator: &mut AnimationController, dt: f32) -> CharacterState {
        let error = self.facing_error();
        if error.abs() < self.config.facing_tolerance {
            return CharacterState::Idle;
        }
        let clip = if error >= 0.0 { &self.config.clips.turn_right } else { &self.config.clips.turn_left };
        animator.select_animation(clip, self.config.move_transition, false);
        let step = (self.config.turn_speed * dt).min(error.abs());
        self.facing += step.copysign(error);
        CharacterState::Turn
    }

    fn walk(&mut self, input: &MovementInput, animator: &mut AnimationController) -> CharacterState {
        if !input.has_forward() {
            return if input.has_right() { CharacterState::Strafe } else { CharacterState::Idle };
        }
        if input.sprint {
            return CharacterState::Sprint;
        }
        animator.select_animation(&self.config.clips.walk, self.config.move_transition, true);
        self.motion = Motion::Forward;
        CharacterState::Walk
    }

    fn sprint(&mut self, input: &MovementInput, animator: &mut AnimationController) -> CharacterState {
        if !input.has_forward() {
            return if input.has_right() { CharacterState::StrafeRun } else { CharacterState::Idle };
        }
        if !input.sprint {
            return CharacterState::Walk;
        }
        animator.select_animation(&self.config.clips.run, self.config.move_transition, true);
        self.motion = Motion::Forward;
        CharacterState::Sprint
    }

    fn strafe(&mut self, input: &MovementInput, animator: &mut AnimationController) -> CharacterState {
        if input.has_forward() {
            return CharacterState::Walk;
        }
        if !input.has_right() {
            return CharacterState::Idle;
        }
        if input.sprint {
            return CharacterState::StrafeRun;
        }
        let clip = if input.right > 0.0 { &self.config.clips.strafe_right } else { &self.config.clips.strafe_left };
        animator.select_animation(clip, self.config.move_transition, true);
        self.motion = Motion::Orbit;
        CharacterState::Strafe
    }

    fn strafe_run(&mut self, input: &MovementInput, animator: &mut AnimationController) -> CharacterState {
        if !input.has_right() {
            return CharacterState::Idle;
        }
        if !input.sprint {
            return CharacterState::Strafe;
        }
        let clip =
            if input.right > 0.0 { &self.config.clips.strafe_run_right } else { &self.config.clips.strafe_run_left };
        animator.select_animation(clip, self.config.move_transition, true);
        self.motion = Motion::Orbit;
        CharacterState::StrafeRun
    }

    fn move_forward(&mut self, input: &MovementInput, animator: &AnimationController, dt: f32) {
        self.position += self.forward_vector() * (dt * animator.velocity().z * input.forward);
        // Diagonal input leans the heading a quarter of a half turn.
        self.facing = self.target_facing() + FRAC_PI_4 * input.right;
    }

    /// Strafing circles the camera: the displacement is tangent to the orbit
    /// and the view azimuth follows it.
    fn orbit_sideways(&mut self, input: &MovementInput, animator: &AnimationController, dt: f32) {
        let tangent = Vec3::new(-self.view_azimuth.sin(), 0.0, self.view_azimuth.cos());
        let displacement = tangent * (dt * animator.velocity().x);
        if self.config.orbit_radius > 0.0 {
            self.view_azimuth += displacement.length() / self.config.orbit_radius * input.right;
        }
        self.position += displacement;
        self.facing = self.target_facing();
    }
}
