// --- File: crates/yoyaku_config/src/lib.rs ---
use config::{Config, ConfigError, Environment, File, FileFormat};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::env;
use std::path::{Path, PathBuf};
use tracing::warn;

pub mod models;
pub use models::*;


/// Marker value that is swapped for an environment variable after loading.
pub const SECRET_MARKER: &str = "secret_from_env";

const ENV_PREFIX: &str = "YOYAKU";

/// Loads the application configuration.
///
/// Sources, later ones overriding earlier ones:
/// 1. `{CONFIG_DIR}/default.toml`
/// 2. `{CONFIG_DIR}/{RUN_ENV}.toml` (`RUN_ENV` defaults to `debug`)
/// 3. `YOYAKU_*` environment variables, `__` separating nested keys
///
/// `CONFIG_DIR` defaults to `config` relative to the working directory.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let config_dir = env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    load_config_from(Path::new(&config_dir), &run_env)
}

/// Loads configuration from an explicit directory and run environment.
pub fn load_config_from(config_dir: &Path, run_env: &str) -> Result<AppConfig, ConfigError> {
    let default_path = config_dir.join("default");
    let env_path = config_dir.join(run_env);

    let builder = Config::builder()
        .add_source(File::from(default_path).required(false))
        .add_source(File::from(env_path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

    let raw_config: AppConfig = builder.build()?.try_deserialize()?;
    apply_env_overrides_from_marker(raw_config)
}

/// Parses configuration from an in-memory TOML document. No environment
/// sources are consulted.
pub fn load_config_from_toml(document: &str) -> Result<AppConfig, ConfigError> {
    let raw_config: AppConfig = Config::builder()
        .add_source(File::from_str(document, FileFormat::Toml))
        .build()?
        .try_deserialize()?;
    apply_env_overrides_from_marker(raw_config)
}

/// Recursively replaces all [`SECRET_MARKER`] string values with environment variable values.
///
/// The variable name is the upper-cased key path joined by `_`, so
/// `line.channel_secret` reads `LINE_CHANNEL_SECRET`.
fn inject_env_secrets(value: &mut Value) {
    fn walk(path: &mut Vec<String>, obj: &mut Value) {
        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    path.push(k.to_string());
                    walk(path, v);
                    path.pop();
                }
            }
            Value::String(s) if s == SECRET_MARKER => {
                let env_key = path.join("_").to_uppercase();
                match env::var(&env_key) {
                    Ok(env_val) => *obj = Value::String(env_val),
                    Err(_) => warn!("env var {} not found for {}", env_key, SECRET_MARKER),
                }
            }
            _ => {}
        }
    }

    walk(&mut Vec::new(), value);
}

/// Applies environment overrides based on [`SECRET_MARKER`] values in the serialized config.
pub fn apply_env_overrides_from_marker(config: AppConfig) -> Result<AppConfig, ConfigError> {
    let mut json = serde_json::to_value(&config)
        .map_err(|err| ConfigError::Message(format!("failed to serialize config: {err}")))?;
    inject_env_secrets(&mut json);
    serde_json::from_value(json)
        .map_err(|err| ConfigError::Message(format!("failed to rebuild config: {err}")))
}

static INIT_DOTENV: OnceCell<PathBuf> = OnceCell::new();

/// Loads the dotenv file into the process environment once.
///
/// `DOTENV_OVERRIDE` selects the file; a first command line argument starting
/// with `.env` is honoured next; `.env` is the fallback. A missing file is not
/// an error.
pub fn ensure_dotenv_loaded() -> &'static Path {
    INIT_DOTENV.get_or_init(|| {
        let dotenv_path_override = env::var("DOTENV_OVERRIDE").ok();
        let dotenv_path_arg = env::args().nth(1).filter(|s| s.starts_with(".env"));

        let dotenv_path = dotenv_path_override
            .or(dotenv_path_arg)
            .unwrap_or_else(|| ".env".to_string());

        dotenv::from_filename(&dotenv_path).ok();
        PathBuf::from(dotenv_path)
    })
}
