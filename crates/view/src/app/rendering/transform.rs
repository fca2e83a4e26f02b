//! Conversions between screen pixels, world pixels and tiles.
//!
//! Screen space has its origin at the top-left of the game viewport. World pixels are
//! absolute, `tile * tile_size`. The camera is the world-pixel position shown at screen
//! `(0, 0)`; it is recomputed from the player tile whenever it is needed and never stored.

use crate::app::TilePos;

pub const DEFAULT_TILE_SIZE_PX: u32 = 20;

/// Size of the game viewport, excluding the side and bottom panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportConfig {
    pub viewport: Viewport,
    pub side_panel_width: u32,
    pub bottom_panel_height: u32,
    pub tile_size: u32,
}

impl ViewportConfig {
    /// Splits a window into game viewport plus panels. A window smaller than the panels
    /// yields an empty viewport rather than a negative one.
    pub fn from_window(
        window_width: u32,
        window_height: u32,
        side_panel_width: u32,
        bottom_panel_height: u32,
        tile_size: u32,
    ) -> Self {
        Self {
            viewport: Viewport {
                width: window_width.saturating_sub(side_panel_width),
                height: window_height.saturating_sub(bottom_panel_height),
            },
            side_panel_width,
            bottom_panel_height,
            tile_size: tile_size.max(1),
        }
    }

    pub fn frame_width(&self) -> u32 {
        self.viewport.width + self.side_panel_width
    }

    pub fn frame_height(&self) -> u32 {
        self.viewport.height + self.bottom_panel_height
    }

    pub fn contains_viewport_point(&self, screen_x: f32, screen_y: f32) -> bool {
        screen_x >= 0.0
            && screen_y >= 0.0
            && screen_x < self.viewport.width as f32
            && screen_y < self.viewport.height as f32
    }
}

/// Camera top-left in world pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub x: f32,
    pub y: f32,
}

impl CameraState {
    /// Whole-pixel translation the frame is drawn with. Hit-testing goes through this too, so
    /// the hovered tile is always the one drawn under the pointer.
    pub fn pixel_offset(self) -> (i32, i32) {
        (self.x.floor() as i32, self.y.floor() as i32)
    }
}

/// Tile coordinate that may lie outside the map, including on the negative side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// `None` unless both components are non-negative.
    pub fn to_tile_pos(self) -> Option<TilePos> {
        let x = u32::try_from(self.x).ok()?;
        let y = u32::try_from(self.y).ok()?;
        Some(TilePos { x, y })
    }

    pub fn matches(self, tile: TilePos) -> bool {
        self.to_tile_pos() == Some(tile)
    }
}

impl From<TilePos> for TileCoord {
    fn from(tile: TilePos) -> Self {
        Self {
            x: i32::try_from(tile.x).unwrap_or(i32::MAX),
            y: i32::try_from(tile.y).unwrap_or(i32::MAX),
        }
    }
}

pub fn world_pixel_to_tile(pixel_x: f32, pixel_y: f32, tile_size: u32) -> TileCoord {
    let size = tile_size.max(1) as f32;
    TileCoord {
        x: (pixel_x / size).floor() as i32,
        y: (pixel_y / size).floor() as i32,
    }
}

pub fn tile_to_world_pixel(tile: TileCoord, tile_size: u32) -> (f32, f32) {
    let size = tile_size as f32;
    (tile.x as f32 * size, tile.y as f32 * size)
}

/// Centers the player's tile midpoint in the viewport. Deliberately unclamped: near the map
/// edge the viewport shows area outside the map.
pub fn camera_top_left(player: TilePos, viewport: Viewport, tile_size: u32) -> CameraState {
    let (player_px, player_py) = tile_to_world_pixel(TileCoord::from(player), tile_size);
    let half_tile = tile_size as f32 / 2.0;
    CameraState {
        x: player_px - viewport.width as f32 / 2.0 + half_tile,
        y: player_py - viewport.height as f32 / 2.0 + half_tile,
    }
}

pub fn world_to_screen(pixel_x: f32, pixel_y: f32, camera: CameraState) -> (f32, f32) {
    (pixel_x - camera.x, pixel_y - camera.y)
}

/// Only meaningful for points already known to be inside the game viewport.
pub fn screen_to_world_tile(
    screen_x: f32,
    screen_y: f32,
    camera: CameraState,
    tile_size: u32,
) -> TileCoord {
    world_pixel_to_tile(screen_x + camera.x, screen_y + camera.y, tile_size)
}

/// Tile under a pointer, using the same whole-pixel camera the compositor draws with.
/// Points over the panels, outside the window, or left/above the world origin give `None`.
pub fn hover_tile_at(
    screen_x: f32,
    screen_y: f32,
    player: TilePos,
    config: &ViewportConfig,
) -> Option<TileCoord> {
    if !config.contains_viewport_point(screen_x, screen_y) {
        return None;
    }
    let (offset_x, offset_y) =
        camera_top_left(player, config.viewport, config.tile_size).pixel_offset();
    let drawn_camera = CameraState {
        x: offset_x as f32,
        y: offset_y as f32,
    };
    let tile = screen_to_world_tile(screen_x, screen_y, drawn_camera, config.tile_size);
    tile.to_tile_pos().map(|_| tile)
}
