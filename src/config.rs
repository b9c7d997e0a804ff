use crate::assets::skeletal::ImportOptions;
use anyhow::{Context, Result};
use glam::Vec3;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewConfig {
    /// glTF file holding the skinned rig and its clips.
    #[serde(default)]
    pub model: Option<PathBuf>,
    #[serde(default = "PreviewConfig::default_frames")]
    pub frames: u32,
    #[serde(default = "PreviewConfig::default_fixed_dt")]
    pub fixed_dt: f32,
    /// Pace frames against the wall clock instead of stepping `fixed_dt`.
    #[serde(default)]
    pub realtime: bool,
    #[serde(default = "PreviewConfig::default_script")]
    pub script: Vec<ScriptStep>,
}

/// One segment of scripted movement input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptStep {
    pub seconds: f32,
    #[serde(default)]
    pub forward: f32,
    #[serde(default)]
    pub right: f32,
    #[serde(default)]
    pub sprint: bool,
    /// Camera orbit rate in radians per second.
    #[serde(default)]
    pub orbit: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    #[serde(default = "ImportConfig::default_root_joint")]
    pub root_joint: Option<String>,
    #[serde(default = "ImportConfig::default_parallel")]
    pub parallel: bool,
    /// Clip names imported as one-shot instead of looping.
    #[serde(default)]
    pub one_shot: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "PlaybackConfig::default_transition")]
    pub default_transition: f32,
    /// Frame deltas above this are clamped before reaching the animator.
    #[serde(default = "PlaybackConfig::default_max_frame_delta")]
    pub max_frame_delta: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CharacterClips {
    #[serde(default = "CharacterClips::default_idle")]
    pub idle: String,
    #[serde(default = "CharacterClips::default_walk")]
    pub walk: String,
    #[serde(default = "CharacterClips::default_run")]
    pub run: String,
    #[serde(default = "CharacterClips::default_strafe_left")]
    pub strafe_left: String,
    #[serde(default = "CharacterClips::default_strafe_right")]
    pub strafe_right: String,
    #[serde(default = "CharacterClips::default_strafe_run_left")]
    pub strafe_run_left: String,
    #[serde(default = "CharacterClips::default_strafe_run_right")]
    pub strafe_run_right: String,
    #[serde(default = "CharacterClips::default_turn_left")]
    pub turn_left: String,
    #[serde(default = "CharacterClips::default_turn_right")]
    pub turn_right: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CharacterConfig {
    #[serde(default)]
    pub clips: CharacterClips,
    /// Radians per second.
    #[serde(default = "CharacterConfig::default_turn_speed")]
    pub turn_speed: f32,
    #[serde(default = "CharacterConfig::default_facing_tolerance")]
    pub facing_tolerance: f32,
    #[serde(default = "CharacterConfig::default_orbit_radius")]
    pub orbit_radius: f32,
    #[serde(default = "CharacterConfig::default_idle_transition")]
    pub idle_transition: f32,
    #[serde(default = "CharacterConfig::default_move_transition")]
    pub move_transition: f32,
    #[serde(default)]
    pub start_position: Vec3,
    /// Initial camera azimuth in radians; the character faces away from it.
    #[serde(default = "CharacterConfig::default_view_azimuth")]
    pub view_azimuth: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlendConfig {
    pub name: String,
    pub clip_a: String,
    pub clip_b: String,
    #[serde(default)]
    pub blend_factor: f32,
    #[serde(default = "BlendConfig::default_looped")]
    pub looped: bool,
    #[serde(default = "BlendConfig::default_fit")]
    pub fit: bool,
    #[serde(default)]
    pub duration: Option<f32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub character: CharacterConfig,
    #[serde(default)]
    pub blends: Vec<BlendConfig>,
}

#[derive(Debug, Clone, Default)]
pub struct AppConfigOverrides {
    pub model: Option<PathBuf>,
    pub root_joint: Option<String>,
    pub frames: Option<u32>,
    pub fixed_dt: Option<f32>,
}

impl PreviewConfig {
    const fn default_frames() -> u32 {
        300
    }

    fn default_fixed_dt() -> f32 {
        1.0 / 60.0
    }

    fn default_script() -> Vec<ScriptStep> {
        let step = |seconds, forward, right, sprint| ScriptStep { seconds, forward, right, sprint, orbit: 0.0 };
        vec![
            step(0.5, 0.0, 0.0, false),
            step(2.0, 1.0, 0.0, false),
            step(1.0, 1.0, 0.0, true),
            step(1.0, 0.0, 1.0, false),
            step(0.5, 0.0, 0.0, false),
        ]
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            model: None,
            frames: Self::default_frames(),
            fixed_dt: Self::default_fixed_dt(),
            realtime: false,
            script: Self::default_script(),
        }
    }
}

impl ImportConfig {
    fn default_root_joint() -> Option<String> {
        Some("Hips".to_string())
    }

    const fn default_parallel() -> bool {
        true
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            root_joint: self.root_joint.clone(),
            parallel: self.parallel,
            one_shot: self.one_shot.clone(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self { root_joint: Self::default_root_joint(), parallel: Self::default_parallel(), one_shot: Vec::new() }
    }
}

impl PlaybackConfig {
    const fn default_transition() -> f32 {
        0.2
    }

    const fn default_max_frame_delta() -> f32 {
        0.25
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self { default_transition: Self::default_transition(), max_frame_delta: Self::default_max_frame_delta() }
    }
}

impl CharacterClips {
    fn default_idle() -> String {
        "idle".to_string()
    }

    fn default_walk() -> String {
        "walk".to_string()
    }

    fn default_run() -> String {
        "run".to_string()
    }

    fn default_strafe_left() -> String {
        "strafe_left".to_string()
    }

    fn default_strafe_right() -> String {
        "strafe_right".to_string()
    }

    fn default_strafe_run_left() -> String {
        "strafe_run_left".to_string()
    }

    fn default_strafe_run_right() -> String {
        "strafe_run_right".to_string()
    }

    fn default_turn_left() -> String {
        "turn_left".to_string()
    }

    fn default_turn_right() -> String {
        "turn_right".to_string()
    }
}

impl Default for CharacterClips {
    fn default() -> Self {
        Self {
            idle: Self::default_idle(),
            walk: Self::default_walk(),
            run: Self::default_run(),
            strafe_left: Self::default_strafe_left(),
            strafe_right: Self::default_strafe_right(),
            strafe_run_left: Self::default_strafe_run_left(),
            strafe_run_right: Self::default_strafe_run_right(),
            turn_left: Self::default_turn_left(),
            turn_right: Self::default_turn_right(),
        }
    }
}

impl CharacterConfig {
    const fn default_turn_speed() -> f32 {
        10.0
    }

    const fn default_facing_tolerance() -> f32 {
        0.1
    }

    const fn default_orbit_radius() -> f32 {
        2.0
    }

    const fn default_idle_transition() -> f32 {
        0.4
    }

    const fn default_move_transition() -> f32 {
        0.2
    }

    fn default_view_azimuth() -> f32 {
        (-90.0_f32).to_radians()
    }
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            clips: CharacterClips::default(),
            turn_speed: Self::default_turn_speed(),
            facing_tolerance: Self::default_facing_tolerance(),
            orbit_radius: Self::default_orbit_radius(),
            idle_transition: Self::default_idle_transition(),
            move_transition: Self::default_move_transition(),
            start_position: Vec3::ZERO,
            view_azimuth: Self::default_view_azimuth(),
        }
    }
}

impl BlendConfig {
    const fn default_looped() -> bool {
        true
    }

    const fn default_fit() -> bool {
        true
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &AppConfigOverrides) {
        if let Some(model) = &overrides.model {
            self.preview.model = Some(model.clone());
        }
        if let Some(root_joint) = &overrides.root_joint {
            self.import.root_joint = if root_joint.is_empty() { None } else { Some(root_joint.clone()) };
        }
        if let Some(frames) = overrides.frames {
            self.preview.frames = frames;
        }
        if let Some(fixed_dt) = overrides.fixed_dt {
            self.preview.fixed_dt = fixed_dt;
        }
    }
}

impl AppConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.model.is_none() && self.root_joint.is_none() && self.frames.is_none() && self.fixed_dt.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.model.is_some() {
            fields.push("model");
        }
        if self.root_joint.is_some() {
            fields.push("root_joint");
        }
        if self.frames.is_some() {
            fields.push("frames");
        }
        if self.fixed_dt.is_some() {
            fields.push("dt");
        }
        fields
    }
}
