pub mod animation;
pub mod app;
pub mod assets;
pub mod character;
pub mod cli;
pub mod config;
pub mod skeleton;
pub mod time;

pub use app::{run, run_preview, run_with_overrides, PreviewReport};

/// Wraps an angle into `[-π, π]`.
pub(crate) fn wrap_angle(mut radians: f32) -> f32 {
    let two_pi = 2.0 * std::f32::consts::PI;
    while radians > std::f32::consts::PI {
        radians -= two_pi;
    }
    while radians < -std::f32::consts::PI {
        radians += two_pi;
    }
    radians
}
