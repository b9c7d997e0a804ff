use crate::config::AppConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliOverrides {
    config: Option<PathBuf>,
    model: Option<PathBuf>,
    root_joint: Option<String>,
    frames: Option<u32>,
    dt: Option<f32>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            let Some(key) = flag.strip_prefix("--") else {
                bail!("Unexpected argument '{flag}'. Flags take the form --name <value>.");
            };
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "config" => overrides.config = Some(PathBuf::from(value)),
                "model" => overrides.model = Some(PathBuf::from(value)),
                "root-joint" => overrides.root_joint = Some(value),
                "frames" => {
                    overrides.frames =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid frame count '{value}'"))?);
                }
                "dt" => {
                    let dt = value.parse::<f32>().with_context(|| format!("Invalid dt '{value}'"))?;
                    if !dt.is_finite() || dt <= 0.0 {
                        bail!("Invalid dt '{value}'. Use a positive number of seconds.");
                    }
                    overrides.dt = Some(dt);
                }
                _ => bail!("Unknown flag '{flag}'. Supported flags: --config, --model, --root-joint, --frames, --dt."),
            }
        }
        Ok(overrides)
    }

    /// Config file requested with `--config`, if any.
    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config.as_ref()
    }

    pub fn into_config_overrides(self) -> AppConfigOverrides {
        AppConfigOverrides { model: self.model, root_joint: self.root_joint, frames: self.frames, fixed_dt: self.dt }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_model_frames_and_dt() {
        let args = ["gait", "--model", "rig.gltf", "--frames", "120", "--dt", "0.02"];
        let overrides = CliOverrides::parse(args).expect("parse overrides");
        let config = overrides.into_config_overrides();
        assert_eq!(config.model, Some(PathBuf::from("rig.gltf")));
        assert_eq!(config.frames, Some(120));
        assert_eq!(config.fixed_dt, Some(0.02));
        assert_eq!(config.applied_fields(), vec!["model", "frames", "dt"]);
    }

    #[test]
    fn latest_flag_wins() {
        let args = ["gait", "--frames", "10", "--frames", "20", "--root-joint", "Hips", "--root-joint", "Root"];
        let overrides = CliOverrides::parse(args).expect("parse overrides");
        assert_eq!(overrides.frames, Some(20));
        assert_eq!(overrides.root_joint.as_deref(), Some("Root"));
    }

    #[test]
    fn config_path_is_not_an_override() {
        let overrides = CliOverrides::parse(["gait", "--config", "alt.json"]).expect("parse overrides");
        assert_eq!(overrides.config_path(), Some(&PathBuf::from("alt.json")));
        assert!(overrides.into_config_overrides().is_empty());
    }

    #[test]
    fn missing_value_errors() {
        let err = CliOverrides::parse(["gait", "--frames"]).unwrap_err();
        assert!(err.to_string().contains("Expected a value"), "error should mention missing value");
    }

    #[test]
    fn rejects_unknown_flags_and_bad_dt() {
        let err = CliOverrides::parse(["gait", "--foo", "bar"]).unwrap_err();
        assert!(err.to_string().contains("Unknown flag"), "unknown flags should error");
        assert!(CliOverrides::parse(["gait", "--dt", "-1"]).is_err());
        assert!(CliOverrides::parse(["gait", "--dt", "fast"]).is_err());
    }
}
