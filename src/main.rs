use gait::app::DEFAULT_CONFIG_PATH;
use gait::cli::CliOverrides;
use gait::run_with_overrides;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = match CliOverrides::parse_from_env() {
        Ok(parsed) => parsed,
        Err(err) => {
            log::error!("[cli] {err}");
            std::process::exit(2);
        }
    };
    let config_path = cli.config_path().cloned().unwrap_or_else(|| DEFAULT_CONFIG_PATH.into());
    if let Err(err) = run_with_overrides(config_path, cli.into_config_overrides()) {
        log::error!("Preview error: {err:?}");
        std::process::exit(1);
    }
}
