mod canvas;
mod compositor;
mod renderer;
mod text;
mod transform;

pub use canvas::{hex, Canvas, PixelRect, Rgba, Sprite};
pub use compositor::StructureArt;
pub use renderer::{load_sprite, AssetError, PanelLayout, Renderer};
pub use text::{draw_text, glyph_advance, measure_text, wrap_text, GLYPH_HEIGHT, GLYPH_WIDTH};
pub use transform::{
    camera_top_left, hover_tile_at, screen_to_world_tile, tile_to_world_pixel,
    world_pixel_to_tile, world_to_screen, CameraState, TileCoord, Viewport, ViewportConfig,
    DEFAULT_TILE_SIZE_PX,
};
