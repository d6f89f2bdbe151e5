mod app;
mod results;
pub use app::App;

use anyhow::{Context, Result};
use catch_experiment::SessionConfig;
use std::path::{Path, PathBuf};

const DEFAULT_EXPERIMENT_ID: &str = "catch-the-bone";

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => SessionConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = load_config(config_path.as_deref())?;
    let experiment_id =
        std::env::var("CATCH_EXPERIMENT_ID").unwrap_or_else(|_| DEFAULT_EXPERIMENT_ID.to_string());

    let app = App::new(config, PathBuf::from("results"), experiment_id)?;
    app.run()?;

    Ok(())
}
