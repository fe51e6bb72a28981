use crate::{AppSettings, RawSettings};
use color_eyre::eyre::{Result, WrapErr};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/settings.yaml";

/// Loads `config_path`, then `.env`, then `APP__*` environment overrides.
pub fn load_app_settings(config_path: &Path) -> Result<AppSettings> {
    // Need to load from dotenv to get it to overwrite the secrets from env.
    dotenv::from_path(".env").ok();
    let config_path = config_path
        .canonicalize()
        .wrap_err_with(|| format!("Cannot find settings file {}", config_path.display()))?;

    let builder = config::Config::builder()
        .add_source(config::File::from(config_path))
        .add_source(
            config::Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        );

    let raw_settings = builder.build()?.try_deserialize::<RawSettings>()?;
    AppSettings::try_from(raw_settings)
}
