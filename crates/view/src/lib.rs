use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;

pub use app::{
    camera_top_left, hover_tile_at, load_sprite, run_app, run_app_with_metrics,
    screen_to_world_tile, tile_to_world_pixel, world_pixel_to_tile, world_to_screen, AppError,
    AssetError, CameraState, ChestData, Direction, DrillData, FurnaceData, InputAction,
    InputSnapshot, ItemKind, LoopConfig, LoopMetricsSnapshot, MapExtent, MetricsHandle,
    PanelLayout, PlacedStructure, PlayerView, ResourceDeposit, ResourceKind, Simulation, Sprite,
    StructureData, StructureKind, TileCoord, TileItem, TilePos, Viewport, ViewportConfig,
    WaterPatch, DEFAULT_TILE_SIZE_PX, PROCESSING_CYCLE_TICKS, RENDER_FPS_CAP_ENV_VAR,
};

/// Points at the directory holding `assets/`, overriding discovery.
pub const ROOT_ENV_VAR: &str = "FACTORY_VIEW_ROOT";

const ASSETS_DIR: &str = "assets";
const SPRITES_DIR: &str = "sprites";

/// Where the front-end finds its files. Sprite paths in [`LoopConfig`] are relative to
/// `assets_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
}

impl AppPaths {
    fn at(root: PathBuf) -> Self {
        let assets_dir = root.join(ASSETS_DIR);
        Self { root, assets_dir }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("{var} could not be read: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("cannot locate the running executable: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("executable path {0} has no parent directory")]
    ExeHasNoParent(PathBuf),
    #[error("{env_var}={path} has no assets/sprites/ directory")]
    InvalidEnvRoot { path: PathBuf, env_var: &'static str },
    #[error(
        "no directory above {start_dir} contains assets/sprites/; \
set {env_var} to the directory that holds assets/"
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

/// Resolves the asset root from [`ROOT_ENV_VAR`], or by searching upward from the executable.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = match env::var(ROOT_ENV_VAR) {
        Ok(value) => root_from_env_value(&value)?,
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let Some(exe_dir) = exe.parent() else {
                return Err(StartupError::ExeHasNoParent(exe));
            };
            search_upward(exe_dir)?
        }
        Err(source) => {
            return Err(StartupError::EnvVar {
                var: ROOT_ENV_VAR,
                source,
            })
        }
    };
    Ok(AppPaths::at(root))
}

fn root_from_env_value(value: &str) -> Result<PathBuf, StartupError> {
    let candidate = canonical_or_raw(Path::new(value));
    if has_sprite_assets(&candidate) {
        return Ok(candidate);
    }
    Err(StartupError::InvalidEnvRoot {
        path: candidate,
        env_var: ROOT_ENV_VAR,
    })
}

fn search_upward(start_dir: &Path) -> Result<PathBuf, StartupError> {
    match start_dir.ancestors().find(|dir| has_sprite_assets(dir)) {
        Some(root) => Ok(canonical_or_raw(root)),
        None => Err(StartupError::RootNotFound {
            start_dir: canonical_or_raw(start_dir),
            env_var: ROOT_ENV_VAR,
        }),
    }
}

fn has_sprite_assets(dir: &Path) -> bool {
    dir.join(ASSETS_DIR).join(SPRITES_DIR).is_dir()
}

fn canonical_or_raw(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
