use super::models::Config;
use config::{ConfigError, Environment, File, FileFormat};
use serde_json::Value;
use std::env;
use std::path::{Path, PathBuf};

const CONFIG_ENV_VAR: &str = "HOIST_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "HOIST";
const ENV_SEPARATOR: &str = "__";

/// Token variables, later ones win
const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_TOKEN", "HOIST_TOKEN"];

/// Load configuration with priority (lowest to highest):
/// 1. Defaults (embedded in structs)
/// 2. TOML file (explicit path, `HOIST_CONFIG`, or `config.toml` next to the binary)
/// 3. Variables from a `.env` file (via dotenvy)
/// 4. System environment variables
pub fn load(explicit_path: Option<&Path>) -> Result<Config, ConfigError> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let config_path = explicit_path
        .map(Path::to_path_buf)
        .or_else(|| env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from))
        .unwrap_or_else(|| application_dir().join(DEFAULT_CONFIG_FILE));

    let mut config = load_from_sources(config_path)?;
    load_secrets(&mut config);

    Ok(config)
}

/// Directory containing the running executable, or the working directory
pub fn application_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Tokens are read from the environment so they never need to live in the file
fn load_secrets(config: &mut Config) {
    for var in TOKEN_ENV_VARS {
        if let Ok(token) = env::var(var) {
            config
                .uploaders
                .entry("github".to_string())
                .or_default()
                .insert("pat".to_string(), Value::String(token));
        }
    }
}

/// Load configuration from a specific path and the environment
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::debug!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).format(FileFormat::Toml));
    } else {
        tracing::debug!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // HOIST__HTTP__PROXY -> http.proxy
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}
