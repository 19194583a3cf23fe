// Configuration loading and parsing (config/server.toml).

use serde::Deserialize;
use snakedraft_core::draft::engine::DEFAULT_MAX_PLAYERS;
use snakedraft_core::draft::state::{DraftSettings, MAX_RANGE_SIZE};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

const CONFIG_DIR: &str = "config";
const DEFAULTS_DIR: &str = "defaults";
const CONFIG_FILE: &str = "server.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// server.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub draft: DraftConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

/// Settings the server starts (and resets) the draft with.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DraftConfig {
    pub min: u32,
    pub max: u32,
    pub initial_rerolls: u32,
    pub max_players: usize,
}

impl Default for DraftConfig {
    fn default() -> Self {
        let settings = DraftSettings::default();
        DraftConfig {
            min: settings.min,
            max: settings.max,
            initial_rerolls: settings.initial_rerolls,
            max_players: DEFAULT_MAX_PLAYERS,
        }
    }
}

impl DraftConfig {
    pub fn settings(&self) -> DraftSettings {
        DraftSettings {
            min: self.min,
            max: self.max,
            initial_rerolls: self.initial_rerolls,
        }
    }
}

impl Config {
    /// `host:port` for the WebSocket listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load and validate `config/server.toml` under `base_dir`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join(CONFIG_DIR).join(CONFIG_FILE);
    let text = read_file(&path)?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Initialise `config/server.toml` from `defaults/server.toml` on first run.
///
/// An existing config file is never touched. Returns the path written, if any.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join(CONFIG_DIR).join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }

    let source = base_dir.join(DEFAULTS_DIR).join(CONFIG_FILE);
    if !source.is_file() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "{} is missing and there is no {} to create it from",
                target.display(),
                source.display()
            ),
        });
    }

    let copy = |e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
    };
    std::fs::create_dir_all(base_dir.join(CONFIG_DIR)).map_err(copy)?;
    std::fs::copy(&source, &target).map_err(copy)?;

    info!("Initialized {} from defaults", target.display());
    Ok(Some(target))
}

/// Load config relative to the current working directory, copying defaults
/// first and applying the `PORT` environment override.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_file(&cwd)?;
    let mut config = load_config_from(&cwd)?;
    apply_port_override(&mut config, std::env::var("PORT").ok().as_deref());
    Ok(config)
}

/// Replace `server.port` with `raw` when it parses as a port number.
pub fn apply_port_override(config: &mut Config, raw: Option<&str>) {
    let Some(raw) = raw else {
        return;
    };
    match raw.trim().parse::<u16>() {
        Ok(port) => {
            info!("PORT override: {} -> {}", config.server.port, port);
            config.server.port = port;
        }
        Err(e) => warn!("Ignoring PORT={:?}: {}", raw, e),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let draft = &config.draft;

    if draft.min < 1 {
        return Err(ConfigError::ValidationError {
            field: "draft.min".into(),
            message: format!("must be at least 1, got {}", draft.min),
        });
    }

    if draft.max <= draft.min {
        return Err(ConfigError::ValidationError {
            field: "draft.max".into(),
            message: format!("must be greater than draft.min ({}), got {}", draft.min, draft.max),
        });
    }

    if draft.max - draft.min >= MAX_RANGE_SIZE {
        return Err(ConfigError::ValidationError {
            field: "draft.max".into(),
            message: format!(
                "range {}-{} holds more than {} numbers",
                draft.min, draft.max, MAX_RANGE_SIZE
            ),
        });
    }

    if draft.max_players == 0 {
        return Err(ConfigError::ValidationError {
            field: "draft.max_players".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.server.host.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "server.host".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Helper: returns the server crate root (works whether `cargo test` runs
    /// from the crate root or the workspace root).
    fn crate_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        if cwd.join("defaults").exists() {
            cwd
        } else if cwd.join("crates/snakedraft-server/defaults").exists() {
            cwd.join("crates/snakedraft-server")
        } else {
            panic!("Cannot locate defaults/ directory from CWD {:?}", cwd);
        }
    }

    /// Fresh scratch dir with `config/server.toml` containing `body`.
    fn scratch_with_config(name: &str, body: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config/server.toml"), body).unwrap();
        tmp
    }

    fn expect_validation_field(err: ConfigError, expected: &str) {
        match err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, expected),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn default_file_matches_built_in_defaults() {
        let root = crate_root();
        let text = fs::read_to_string(root.join("defaults/server.toml")).unwrap();
        let config: Config = toml::from_str(&text).unwrap();
        validate(&config).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.draft.min, 1);
        assert_eq!(config.draft.max, 100);
        assert_eq!(config.draft.initial_rerolls, 2);
        assert_eq!(config.draft.max_players, 10);
        assert_eq!(config.draft.settings(), DraftSettings::default());
        assert_eq!(config.bind_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let tmp = scratch_with_config("snakedraft_config_partial", "[draft]\nmax = 40\n");
        let config = load_config_from(&tmp).expect("should load partial config");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.draft.min, 1);
        assert_eq!(config.draft.max, 40);
        assert_eq!(config.draft.max_players, 10);
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_min_zero() {
        let tmp = scratch_with_config("snakedraft_config_min0", "[draft]\nmin = 0\nmax = 10\n");
        expect_validation_field(load_config_from(&tmp).unwrap_err(), "draft.min");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_max_not_above_min() {
        let tmp = scratch_with_config("snakedraft_config_max", "[draft]\nmin = 10\nmax = 10\n");
        expect_validation_field(load_config_from(&tmp).unwrap_err(), "draft.max");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_max_players() {
        let tmp = scratch_with_config("snakedraft_config_players", "[draft]\nmax_players = 0\n");
        expect_validation_field(load_config_from(&tmp).unwrap_err(), "draft.max_players");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_server_toml() {
        let tmp = std::env::temp_dir().join("snakedraft_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with("server.toml")),
            other => panic!("expected FileNotFound, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = scratch_with_config("snakedraft_config_invalid", "[server\nport = \"x\"\n");
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with("server.toml")),
            other => panic!("expected ParseError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn port_override_applies_when_numeric() {
        let mut config = Config {
            server: ServerConfig::default(),
            draft: DraftConfig::default(),
        };
        apply_port_override(&mut config, None);
        assert_eq!(config.server.port, 3000);
        apply_port_override(&mut config, Some("8080"));
        assert_eq!(config.server.port, 8080);
        apply_port_override(&mut config, Some("not-a-port"));
        assert_eq!(config.server.port, 8080);
        apply_port_override(&mut config, Some("70000"));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn rejects_oversized_range() {
        let tmp = scratch_with_config(
            "snakedraft_config_huge_range",
            "[draft]\nmin = 1\nmax = 4294967295\n",
        );
        expect_validation_field(load_config_from(&tmp).unwrap_err(), "draft.max");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_file_copies_defaults() {
        let tmp = std::env::temp_dir().join("snakedraft_config_ensure_copies");
        let _ = fs::remove_dir_all(&tmp);

        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::copy(
            crate_root().join("defaults/server.toml"),
            tmp.join("defaults/server.toml"),
        )
        .unwrap();
        assert!(!tmp.join("config").exists());

        let written = ensure_config_file(&tmp).expect("should succeed");
        assert_eq!(written, Some(tmp.join("config/server.toml")));

        let config = load_config_from(&tmp).expect("copied defaults should load");
        assert_eq!(config.server.port, 3000);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_file_keeps_existing() {
        let tmp = scratch_with_config("snakedraft_config_ensure_keeps", "# custom\n");
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::copy(
            crate_root().join("defaults/server.toml"),
            tmp.join("defaults/server.toml"),
        )
        .unwrap();

        assert_eq!(ensure_config_file(&tmp).expect("should succeed"), None);
        let content = fs::read_to_string(tmp.join("config/server.toml")).unwrap();
        assert_eq!(content, "# custom\n");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_file_without_defaults_uses_existing_config() {
        let tmp = scratch_with_config(
            "snakedraft_config_no_defaults",
            "[server]\nhost = \"0.0.0.0\"\nport = 9000\n",
        );
        assert_eq!(ensure_config_file(&tmp).expect("should succeed"), None);
        assert_eq!(load_config_from(&tmp).unwrap().server.port, 9000);
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_file_errors_when_nothing_to_copy() {
        let tmp = std::env::temp_dir().join("snakedraft_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        match ensure_config_file(&tmp).unwrap_err() {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("no "));
                assert!(message.contains("server.toml"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }
}
