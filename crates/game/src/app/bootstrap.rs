use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use factory_view::{LoopConfig, Simulation};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::sandbox::{SandboxWorld, DEFAULT_SEED};

pub(crate) const CONFIG_ENV_VAR: &str = "FACTORY_VIEW_CONFIG";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) simulation: Box<dyn Simulation>,
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config '{path}'{}: {source}", at_field(.field_path))]
    Parse {
        path: PathBuf,
        field_path: String,
        #[source]
        source: serde_json::Error,
    },
}

fn at_field(field_path: &str) -> String {
    if field_path.is_empty() || field_path == "." {
        String::new()
    } else {
        format!(" at {field_path}")
    }
}

/// Optional fields read from the config file; anything left out keeps its default.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
struct ConfigOverrides {
    window_title: Option<String>,
    window_width: Option<u32>,
    window_height: Option<u32>,
    target_tps: Option<u32>,
    side_panel_width: Option<u32>,
    bottom_panel_height: Option<u32>,
    tile_size: Option<u32>,
    max_render_fps: Option<u32>,
    metrics_log_interval_ms: Option<u64>,
    seed: Option<u64>,
}

pub(crate) fn build_app() -> Result<AppWiring, ConfigError> {
    init_tracing();
    info!("=== Factory Startup ===");

    let overrides = match std::env::var_os(CONFIG_ENV_VAR) {
        Some(raw) => load_overrides(Path::new(&raw))?,
        None => ConfigOverrides::default(),
    };
    let seed = overrides.seed.unwrap_or(DEFAULT_SEED);
    let config = apply_overrides(LoopConfig::default(), overrides);

    Ok(AppWiring {
        config,
        simulation: Box::new(SandboxWorld::generate(seed)),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn load_overrides(path: &Path) -> Result<ConfigOverrides, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let overrides = parse_overrides(path, &raw)?;
    info!(path = %path.display(), "config_loaded");
    Ok(overrides)
}

fn parse_overrides(path: &Path, raw: &str) -> Result<ConfigOverrides, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let field_path = error.path().to_string();
        ConfigError::Parse {
            path: path.to_path_buf(),
            field_path,
            source: error.into_inner(),
        }
    })
}

fn apply_overrides(mut config: LoopConfig, overrides: ConfigOverrides) -> LoopConfig {
    if let Some(title) = overrides.window_title {
        config.window_title = title;
    }
    if let Some(width) = overrides.window_width {
        config.window_width = width;
    }
    if let Some(height) = overrides.window_height {
        config.window_height = height;
    }
    if let Some(tps) = overrides.target_tps {
        config.target_tps = tps;
    }
    if let Some(width) = overrides.side_panel_width {
        config.side_panel_width = width;
    }
    if let Some(height) = overrides.bottom_panel_height {
        config.bottom_panel_height = height;
    }
    if let Some(tile_size) = overrides.tile_size {
        config.tile_size = tile_size;
    }
    if let Some(cap) = overrides.max_render_fps {
        config.max_render_fps = Some(cap);
    }
    if let Some(millis) = overrides.metrics_log_interval_ms {
        config.metrics_log_interval = Duration::from_millis(millis);
    }
    config
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn empty_object_keeps_defaults() {
        let overrides = parse_overrides(Path::new("config.json"), "{}").expect("parse");
        let config = apply_overrides(LoopConfig::default(), overrides);
        let defaults = LoopConfig::default();
        assert_eq!(config.window_title, defaults.window_title);
        assert_eq!(config.target_tps, defaults.target_tps);
        assert_eq!(config.side_panel_width, defaults.side_panel_width);
        assert_eq!(config.max_render_fps, None);
    }

    #[test]
    fn overrides_replace_only_named_fields() {
        let raw = r#"{
            "window_title": "Test Factory",
            "side_panel_width": 300,
            "metrics_log_interval_ms": 250,
            "max_render_fps": 30,
            "seed": 9
        }"#;
        let overrides = parse_overrides(Path::new("config.json"), raw).expect("parse");
        assert_eq!(overrides.seed, Some(9));

        let config = apply_overrides(LoopConfig::default(), overrides);
        assert_eq!(config.window_title, "Test Factory");
        assert_eq!(config.side_panel_width, 300);
        assert_eq!(config.bottom_panel_height, 140);
        assert_eq!(config.metrics_log_interval, Duration::from_millis(250));
        assert_eq!(config.max_render_fps, Some(30));
    }

    #[test]
    fn parse_error_names_the_field() {
        let raw = r#"{ "tile_size": "big" }"#;
        let error = parse_overrides(Path::new("config.json"), raw).expect_err("bad type");
        match &error {
            ConfigError::Parse { field_path, .. } => assert_eq!(field_path, "tile_size"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(error.to_string().contains("at tile_size"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let raw = r#"{ "tile_sise": 32 }"#;
        assert!(parse_overrides(Path::new("config.json"), raw).is_err());
    }

    #[test]
    fn config_file_is_read_from_disk() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("factory.json");
        fs::write(&path, r#"{ "target_tps": 30 }"#).expect("write config");

        let overrides = load_overrides(&path).expect("load");
        assert_eq!(overrides.target_tps, Some(30));
    }

    #[test]
    fn missing_config_file_reports_path() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("absent.json");
        let error = load_overrides(&path).expect_err("missing");
        assert!(matches!(error, ConfigError::Read { .. }));
        assert!(error.to_string().contains("absent.json"));
    }
}
