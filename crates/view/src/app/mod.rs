mod input;
mod interaction;
mod loop_runner;
mod metrics;
mod rendering;
mod scheduler;
mod simulation;
mod tools;

pub use input::{InputAction, InputSnapshot};
pub use loop_runner::{run_app, run_app_with_metrics, AppError, LoopConfig, RENDER_FPS_CAP_ENV_VAR};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use rendering::{
    camera_top_left, hover_tile_at, load_sprite, screen_to_world_tile, tile_to_world_pixel,
    world_pixel_to_tile, world_to_screen, AssetError, CameraState, PanelLayout, Sprite,
    TileCoord, Viewport, ViewportConfig, DEFAULT_TILE_SIZE_PX,
};
pub use simulation::{
    ChestData, Direction, DrillData, FurnaceData, ItemKind, MapExtent, PlacedStructure,
    PlayerView, ResourceDeposit, ResourceKind, Simulation, StructureData, StructureKind,
    TileItem, TilePos, WaterPatch, PROCESSING_CYCLE_TICKS,
};
