use crate::animation::{AnimationController, ControllerState};
use crate::assets::AssetManager;
use crate::character::{CharacterController, CharacterState};
use crate::config::{AppConfig, AppConfigOverrides};
use crate::skeleton::SkeletonInstance;
use crate::time::Time;

mod script;

use anyhow::{anyhow, bail, Context, Result};
use glam::Vec3;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/gait.json";
const AVATAR_KEY: &str = "avatar";

/// Summary of a headless preview run.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewReport {
    pub frames: u32,
    pub simulated_seconds: f32,
    pub character_state: CharacterState,
    pub controller_state: ControllerState,
    pub current_animation: Option<String>,
    pub next_animation: Option<String>,
    pub position: Vec3,
    /// Straight-line distance from the start position.
    pub distance: f32,
    pub facing: f32,
    pub joint_count: usize,
}

pub fn run() -> Result<PreviewReport> {
    run_with_overrides(DEFAULT_CONFIG_PATH, AppConfigOverrides::default())
}

pub fn run_with_overrides(config_path: impl AsRef<Path>, overrides: AppConfigOverrides) -> Result<PreviewReport> {
    let mut config = AppConfig::load_or_default(config_path);
    if !overrides.is_empty() {
        log::info!("[config] CLI overrides applied: {}", overrides.applied_fields().join(", "));
        config.apply_overrides(&overrides);
    }
    run_preview(&config)
}

/// Loads the configured rig, then drives the character and animator for the
/// configured number of frames using the scripted input.
pub fn run_preview(config: &AppConfig) -> Result<PreviewReport> {
    let fixed_dt = config.preview.fixed_dt;
    if !fixed_dt.is_finite() || fixed_dt <= 0.0 {
        bail!("Invalid preview.fixed_dt {fixed_dt}; expected a positive number of seconds.");
    }
    let model = config
        .preview
        .model
        .as_ref()
        .ok_or_else(|| anyhow!("No model configured. Set preview.model or pass --model <file.gltf>."))?;
    let model_str = model.to_str().ok_or_else(|| anyhow!("Model path {} is not valid UTF-8", model.display()))?;

    let options = config.import.import_options();
    let mut assets = AssetManager::new();
    assets
        .retain_skeleton(AVATAR_KEY, model_str, &options)
        .with_context(|| format!("Failed to load rig {}", model.display()))?;
    let skeleton = assets.skeleton(AVATAR_KEY).ok_or_else(|| anyhow!("Skeleton '{AVATAR_KEY}' missing after load"))?;

    let mut animator = AnimationController::new(assets.clips_for(AVATAR_KEY).into_values())
        .with_default_transition(config.playback.default_transition);
    for blend in &config.blends {
        if !animator.add_blend(&blend.name, &blend.clip_a, &blend.clip_b, blend.looped, blend.fit) {
            continue;
        }
        animator.set_blend_factor(&blend.name, blend.blend_factor);
        if let (Some(duration), Some(player)) = (blend.duration, animator.blend_mut(&blend.name)) {
            player.set_duration(duration);
        }
    }
    log::info!(
        "Loaded '{}' ({} joints, clips: {}, blends: {})",
        skeleton.name,
        skeleton.joint_count(),
        animator.clip_names().collect::<Vec<_>>().join(", "),
        animator.blend_names().count()
    );

    let mut rig = SkeletonInstance::new(skeleton);
    let mut character = CharacterController::new(config.character.clone());
    let script = script::InputScript::new(&config.preview.script);
    let clock = if config.preview.realtime { Time::new() } else { Time::fixed(fixed_dt) };
    let mut time = clock.with_max_delta(config.playback.max_frame_delta);
    let pacing = Duration::from_secs_f32(fixed_dt);

    for frame in 0..config.preview.frames {
        if config.preview.realtime {
            std::thread::sleep(pacing);
        }
        let t = time.elapsed_seconds();
        time.tick();
        let dt = time.delta_seconds();
        character.orbit(script.orbit_rate_at(t) * dt);
        let input = script.input_at(t);
        let state = character.update(&input, &mut animator, dt);
        rig.set_joints(animator.pose());
        rig.update_world();
        log::trace!(
            "frame {frame}: {:?} anim={:?} pos={:?}",
            state,
            animator.current_animation(),
            character.position()
        );
    }

    let report = PreviewReport {
        frames: config.preview.frames,
        simulated_seconds: time.elapsed_seconds(),
        character_state: character.state(),
        controller_state: animator.state(),
        current_animation: animator.current_animation().map(str::to_owned),
        next_animation: animator.next_animation().map(str::to_owned),
        position: character.position(),
        distance: character.position().distance(config.character.start_position),
        facing: character.facing(),
        joint_count: rig.joint_count(),
    };
    log::info!(
        "Preview finished: {} frames, {:.2}s, state {:?}, animation {:?} (next {:?}), position {:?}, travelled {:.3}",
        report.frames,
        report.simulated_seconds,
        report.character_state,
        report.current_animation,
        report.next_animation,
        report.position,
        report.distance
    );
    assets.release_skeleton(AVATAR_KEY);
    Ok(report)
}
