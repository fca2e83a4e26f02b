//! Per-frame scene composition.
//!
//! Every frame re-queries the simulation and draws, in fixed order: panel backgrounds, map
//! ground, water, deposits, structures, belt items, dropped items, hover cursor, player,
//! hover overlay, then the static panels in frame pixels. Later layers always cover earlier
//! ones; there is no depth sorting.

use crate::app::tools::{
    draw_console_panel, draw_help_panel, draw_inventory_panel, draw_structure_overlay,
};
use crate::app::{
    Direction, ItemKind, PlacedStructure, PlayerView, ResourceKind, Simulation, StructureKind,
    TileItem,
};

use super::canvas::{hex, Canvas, PixelRect, Rgba, Sprite};
use super::text::{draw_text, measure_text};
use super::transform::{camera_top_left, tile_to_world_pixel, TileCoord, ViewportConfig};

const GROUND_COLOR: Rgba = hex(0x2d5016);
const PANEL_BG_COLOR: Rgba = hex(0x1a1a1a);
const WATER_COLOR: Rgba = hex(0x1e3a8a);
const DEPOSIT_HIGHLIGHT_COLOR: Rgba = [255, 255, 255, 51];
const DEPOSIT_HIGHLIGHT_INSET: i32 = 2;

const BELT_BASE_COLOR: Rgba = hex(0x4b5563);
const BELT_STRIPE_COLOR: Rgba = hex(0x6b7280);
const BELT_ARROW_COLOR: Rgba = hex(0x9ca3af);
const ARM_FRAME_COLOR: Rgba = hex(0x3b82f6);
const ARM_PLATE_COLOR: Rgba = hex(0x1e40af);
const ARM_ARROW_COLOR: Rgba = hex(0x60a5fa);
const CHEST_BODY_COLOR: Rgba = hex(0x8b4513);
const CHEST_LID_COLOR: Rgba = hex(0x654321);
const CHEST_LOCK_COLOR: Rgba = hex(0x1f2937);
const DRILL_BODY_COLOR: Rgba = hex(0x374151);
const DRILL_BIT_COLOR: Rgba = hex(0x1f2937);
const DRILL_ARROW_COLOR: Rgba = hex(0x6b7280);
const FURNACE_BODY_COLOR: Rgba = hex(0x92400e);
const FURNACE_TOP_COLOR: Rgba = hex(0x1f2937);
const FURNACE_FIRE_COLOR: Rgba = hex(0xdc2626);

const ITEM_SQUARE_SIZE: i32 = 12;
const ITEM_HIGHLIGHT_COLOR: Rgba = [255, 255, 255, 77];
const LABEL_TEXT_SCALE: i32 = 2;
const LABEL_TEXT_HEIGHT: i32 = 12;
const LABEL_PADDING: i32 = 4;
const LABEL_GAP: i32 = 2;
const LABEL_BG_COLOR: Rgba = [0, 0, 0, 179];
const LABEL_BORDER_COLOR: Rgba = [255, 255, 255, 128];
const LABEL_TEXT_COLOR: Rgba = [255, 255, 255, 230];

const CURSOR_COLOR: Rgba = [255, 255, 0, 153];
const CURSOR_THICKNESS: i32 = 2;
const PLAYER_COLOR: Rgba = hex(0xdc2626);
const FACING_MARKER_COLOR: Rgba = hex(0x000000);
const FACING_MARKER_SIZE: i32 = 4;
const FACING_MARKER_INSET: i32 = 2;

/// Images the compositor may use in place of procedural art.
#[derive(Debug, Default)]
pub struct StructureArt {
    pub furnace: Option<Sprite>,
}

pub(crate) fn resource_color(kind: ResourceKind) -> Rgba {
    match kind {
        ResourceKind::IronOre => hex(0x78716c),
        ResourceKind::Copper => hex(0xb87333),
        ResourceKind::Stone => hex(0x6b7280),
        ResourceKind::Coal => hex(0x1f2937),
    }
}

pub(crate) fn item_color(item: ItemKind) -> Rgba {
    match item {
        ItemKind::IronOre => resource_color(ResourceKind::IronOre),
        ItemKind::Copper => resource_color(ResourceKind::Copper),
        ItemKind::Stone => resource_color(ResourceKind::Stone),
        ItemKind::Coal => resource_color(ResourceKind::Coal),
        ItemKind::Furnace => FURNACE_BODY_COLOR,
        ItemKind::IronPlate => hex(0x9ca3af),
        ItemKind::Belt => BELT_BASE_COLOR,
        ItemKind::CopperPlate => hex(0xf59e0b),
        ItemKind::Arm => ARM_FRAME_COLOR,
        ItemKind::Chest => CHEST_BODY_COLOR,
        ItemKind::Drill => DRILL_BODY_COLOR,
    }
}

pub(crate) fn belt_item_label(item: &TileItem) -> String {
    format!("{} x{}", item.item.display_name(), item.quantity)
}

/// Renders one frame and returns the player view it was centered on.
pub(crate) fn compose_frame(
    canvas: &mut Canvas<'_>,
    simulation: &dyn Simulation,
    config: &ViewportConfig,
    hover: Option<TileCoord>,
    art: &StructureArt,
) -> PlayerView {
    let tile = config.tile_size as i32;
    let player = simulation.player();
    let camera = camera_top_left(player.tile, config.viewport, config.tile_size);

    let viewport_rect = PixelRect::new(
        0,
        0,
        config.viewport.width as i32,
        config.viewport.height as i32,
    );
    canvas.reset_translation();
    canvas.set_clip(None);
    canvas.clear(PANEL_BG_COLOR);
    canvas.fill_rect(viewport_rect, GROUND_COLOR);

    canvas.set_clip(Some(viewport_rect));
    let (offset_x, offset_y) = camera.pixel_offset();
    canvas.set_translation(offset_x, offset_y);

    let extent = simulation.map_extent();
    canvas.fill_rect(
        PixelRect::new(
            0,
            0,
            extent.width.saturating_mul(config.tile_size) as i32,
            extent.height.saturating_mul(config.tile_size) as i32,
        ),
        GROUND_COLOR,
    );
    for patch in simulation.water_patches() {
        let origin = tile_rect(TileCoord::from(patch.origin), tile);
        canvas.fill_rect(
            PixelRect::new(
                origin.x,
                origin.y,
                patch.width as i32 * tile,
                patch.height as i32 * tile,
            ),
            WATER_COLOR,
        );
    }
    for deposit in simulation.resources() {
        let rect = tile_rect(TileCoord::from(deposit.tile), tile);
        canvas.fill_rect(rect, resource_color(deposit.kind));
        canvas.fill_rect(
            inset(rect, DEPOSIT_HIGHLIGHT_INSET),
            DEPOSIT_HIGHLIGHT_COLOR,
        );
    }

    let structures = simulation.structures();
    for structure in &structures {
        draw_structure(canvas, structure, tile, art);
    }

    for item in simulation.belt_items() {
        let rect = tile_rect(TileCoord::from(item.tile), tile);
        draw_item_square(canvas, rect, item.item, tile);
        draw_belt_item_label(canvas, rect, &belt_item_label(&item));
    }
    for item in simulation.dropped_items() {
        let rect = tile_rect(TileCoord::from(item.tile), tile);
        draw_item_square(canvas, rect, item.item, tile);
    }

    if let Some(hovered) = hover {
        canvas.stroke_rect(tile_rect(hovered, tile), CURSOR_THICKNESS, CURSOR_COLOR);
    }

    let player_rect = tile_rect(TileCoord::from(player.tile), tile);
    canvas.fill_rect(player_rect, PLAYER_COLOR);
    canvas.fill_rect(
        facing_marker_rect(player_rect, player.facing),
        FACING_MARKER_COLOR,
    );

    draw_structure_overlay(canvas, simulation, &structures, hover, config.tile_size);

    canvas.reset_translation();
    canvas.set_clip(None);
    draw_inventory_panel(canvas, simulation, config);
    draw_console_panel(canvas, &simulation.console_messages(), config);
    draw_help_panel(canvas, config);

    player
}

fn tile_rect(tile: TileCoord, tile_size: i32) -> PixelRect {
    let (x, y) = tile_to_world_pixel(tile, tile_size as u32);
    PixelRect::new(x as i32, y as i32, tile_size, tile_size)
}

fn inset(rect: PixelRect, amount: i32) -> PixelRect {
    PixelRect::new(
        rect.x + amount,
        rect.y + amount,
        rect.width - amount * 2,
        rect.height - amount * 2,
    )
}

/// Marker square on the player's edge that matches `facing`.
pub(crate) fn facing_marker_rect(player: PixelRect, facing: Direction) -> PixelRect {
    let size = FACING_MARKER_SIZE;
    let centered_x = player.x + player.width / 2 - size / 2;
    let centered_y = player.y + player.height / 2 - size / 2;
    let (x, y) = match facing {
        Direction::North => (centered_x, player.y + FACING_MARKER_INSET),
        Direction::South => (centered_x, player.bottom() - size - FACING_MARKER_INSET),
        Direction::East => (player.right() - size - FACING_MARKER_INSET, centered_y),
        Direction::West => (player.x + FACING_MARKER_INSET, centered_y),
    };
    PixelRect::new(x, y, size, size)
}

fn draw_structure(
    canvas: &mut Canvas<'_>,
    structure: &PlacedStructure,
    tile: i32,
    art: &StructureArt,
) {
    let rect = tile_rect(TileCoord::from(structure.tile), tile);
    match structure.kind {
        StructureKind::Furnace => draw_furnace(canvas, rect, art.furnace.as_ref()),
        StructureKind::Belt => draw_belt(canvas, rect, structure.facing),
        StructureKind::Arm => draw_arm(canvas, rect, structure.facing),
        StructureKind::Chest => draw_chest(canvas, rect),
        StructureKind::Drill => draw_drill(canvas, rect, structure.facing),
    }
}

fn draw_furnace(canvas: &mut Canvas<'_>, rect: PixelRect, sprite: Option<&Sprite>) {
    if let Some(sprite) = sprite {
        canvas.draw_sprite(sprite, rect);
        return;
    }
    canvas.fill_rect(rect, FURNACE_BODY_COLOR);
    canvas.fill_rect(
        PixelRect::new(rect.x + 2, rect.y + 2, rect.width - 4, 4),
        FURNACE_TOP_COLOR,
    );
    canvas.fill_rect(
        PixelRect::new(
            rect.x + rect.width / 2 - 4,
            rect.bottom() - 8,
            8,
            4,
        ),
        FURNACE_FIRE_COLOR,
    );
}

fn draw_belt(canvas: &mut Canvas<'_>, rect: PixelRect, facing: Direction) {
    canvas.fill_rect(rect, BELT_BASE_COLOR);
    let stripe = if facing.is_vertical() {
        PixelRect::new(rect.x + rect.width / 2 - 1, rect.y, 2, rect.height)
    } else {
        PixelRect::new(rect.x, rect.y + rect.height / 2 - 1, rect.width, 2)
    };
    canvas.fill_rect(stripe, BELT_STRIPE_COLOR);
    canvas.fill_triangle(direction_arrow(rect, facing, 4), BELT_ARROW_COLOR);
}

fn draw_arm(canvas: &mut Canvas<'_>, rect: PixelRect, facing: Direction) {
    canvas.fill_rect(rect, ARM_FRAME_COLOR);
    canvas.fill_rect(inset(rect, 2), ARM_PLATE_COLOR);
    canvas.fill_triangle(direction_arrow(rect, facing, 4), ARM_ARROW_COLOR);
}

fn draw_chest(canvas: &mut Canvas<'_>, rect: PixelRect) {
    canvas.fill_rect(rect, CHEST_BODY_COLOR);
    canvas.fill_rect(
        PixelRect::new(rect.x + 2, rect.y + 2, rect.width - 4, 4),
        CHEST_LID_COLOR,
    );
    canvas.fill_rect(
        PixelRect::new(
            rect.x + rect.width / 2 - 2,
            rect.y + rect.height / 2 - 2,
            4,
            4,
        ),
        CHEST_LOCK_COLOR,
    );
}

/// Drawn at 60% size so the deposit underneath stays visible.
fn draw_drill(canvas: &mut Canvas<'_>, rect: PixelRect, facing: Direction) {
    let size = rect.width * 3 / 5;
    let offset = (rect.width - size) / 2;
    let body = PixelRect::new(rect.x + offset, rect.y + offset, size, size);
    canvas.fill_rect(body, DRILL_BODY_COLOR);
    canvas.fill_rect(inset(body, 2), DRILL_BIT_COLOR);
    canvas.fill_triangle(direction_arrow(body, facing, 0), DRILL_ARROW_COLOR);
}

/// Triangle pointing toward `facing`, tip `tip_inset` pixels inside the rect edge.
fn direction_arrow(rect: PixelRect, facing: Direction, tip_inset: i32) -> [(i32, i32); 3] {
    let cx = rect.x + rect.width / 2;
    let cy = rect.y + rect.height / 2;
    match facing {
        Direction::North => {
            let tip = rect.y + tip_inset;
            [(cx, tip), (cx - 3, tip + 4), (cx + 3, tip + 4)]
        }
        Direction::South => {
            let tip = rect.bottom() - tip_inset;
            [(cx, tip), (cx - 3, tip - 4), (cx + 3, tip - 4)]
        }
        Direction::East => {
            let tip = rect.right() - tip_inset;
            [(tip, cy), (tip - 4, cy - 3), (tip - 4, cy + 3)]
        }
        Direction::West => {
            let tip = rect.x + tip_inset;
            [(tip, cy), (tip + 4, cy - 3), (tip + 4, cy + 3)]
        }
    }
}

fn draw_item_square(canvas: &mut Canvas<'_>, tile_rect: PixelRect, item: ItemKind, tile: i32) {
    let size = ITEM_SQUARE_SIZE.min(tile);
    let offset = (tile - size) / 2;
    let square = PixelRect::new(tile_rect.x + offset, tile_rect.y + offset, size, size);
    canvas.fill_rect(square, item_color(item));
    canvas.fill_rect(inset(square, 1), ITEM_HIGHLIGHT_COLOR);
}

/// Label box sized to the measured text, centered over the tile.
pub(crate) fn belt_label_rect(tile_rect: PixelRect, label: &str) -> PixelRect {
    let text_width = measure_text(label, LABEL_TEXT_SCALE);
    let x = tile_rect.x + tile_rect.width / 2 - text_width / 2 - LABEL_PADDING;
    let y = tile_rect.y - LABEL_TEXT_HEIGHT - LABEL_PADDING - LABEL_GAP;
    PixelRect::new(
        x,
        y,
        text_width + LABEL_PADDING * 2,
        LABEL_TEXT_HEIGHT + LABEL_PADDING,
    )
}

fn draw_belt_item_label(canvas: &mut Canvas<'_>, tile_rect: PixelRect, label: &str) {
    let rect = belt_label_rect(tile_rect, label);
    canvas.fill_rect(rect, LABEL_BG_COLOR);
    canvas.stroke_rect(rect, 1, LABEL_BORDER_COLOR);
    draw_text(
        canvas,
        rect.x + LABEL_PADDING,
        rect.y + 3,
        label,
        LABEL_TEXT_SCALE,
        LABEL_TEXT_COLOR,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{
        ChestData, InputSnapshot, MapExtent, ResourceDeposit, StructureData, TilePos, WaterPatch,
    };

    struct StaticWorld {
        player: PlayerView,
        structures: Vec<PlacedStructure>,
        resources: Vec<ResourceDeposit>,
        water: Vec<WaterPatch>,
        belt_items: Vec<TileItem>,
    }

    impl StaticWorld {
        fn new(player: TilePos) -> Self {
            Self {
                player: PlayerView {
                    tile: player,
                    facing: Direction::East,
                },
                structures: Vec::new(),
                resources: Vec::new(),
                water: Vec::new(),
                belt_items: Vec::new(),
            }
        }
    }

    impl Simulation for StaticWorld {
        fn advance(&mut self, _input: &InputSnapshot) {}

        fn player(&self) -> PlayerView {
            self.player
        }

        fn map_extent(&self) -> MapExtent {
            MapExtent {
                width: 40,
                height: 40,
            }
        }

        fn water_patches(&self) -> Vec<WaterPatch> {
            self.water.clone()
        }

        fn resources(&self) -> Vec<ResourceDeposit> {
            self.resources.clone()
        }

        fn structures(&self) -> Vec<PlacedStructure> {
            self.structures.clone()
        }

        fn structure_data(&self, tile: TilePos) -> Option<StructureData> {
            self.structures
                .iter()
                .find(|structure| structure.tile == tile && structure.kind == StructureKind::Chest)
                .map(|_| StructureData::Chest(ChestData::default()))
        }

        fn belt_items(&self) -> Vec<TileItem> {
            self.belt_items.clone()
        }

        fn dropped_items(&self) -> Vec<TileItem> {
            Vec::new()
        }

        fn inventory_count(&self, _item: ItemKind) -> u32 {
            0
        }

        fn available_items(&self) -> Vec<ItemKind> {
            Vec::new()
        }

        fn selected_item(&self) -> Option<ItemKind> {
            None
        }

        fn console_messages(&self) -> Vec<String> {
            vec!["hello".to_string()]
        }
    }

    const WIDTH: u32 = 850;
    const HEIGHT: u32 = 540;

    fn config() -> ViewportConfig {
        ViewportConfig::from_window(WIDTH, HEIGHT, 250, 140, 20)
    }

    fn render(world: &StaticWorld, hover: Option<TileCoord>) -> Vec<u8> {
        let mut buffer = vec![0u8; (WIDTH * HEIGHT * 4) as usize];
        let mut canvas = Canvas::new(&mut buffer, WIDTH, HEIGHT);
        compose_frame(&mut canvas, world, &config(), hover, &StructureArt::default());
        buffer
    }

    fn pixel(buffer: &[u8], x: u32, y: u32) -> Rgba {
        let offset = ((y * WIDTH + x) * 4) as usize;
        [
            buffer[offset],
            buffer[offset + 1],
            buffer[offset + 2],
            buffer[offset + 3],
        ]
    }

    #[test]
    fn player_is_drawn_at_viewport_center() {
        let world = StaticWorld::new(TilePos::new(20, 20));
        let buffer = render(&world, None);
        // Viewport is 600x400; the player tile spans 290..310 x 190..210.
        assert_eq!(pixel(&buffer, 292, 192), PLAYER_COLOR);
        assert_eq!(pixel(&buffer, 309, 209), PLAYER_COLOR);
        assert_eq!(pixel(&buffer, 289, 192), GROUND_COLOR);
    }

    #[test]
    fn facing_marker_sits_on_the_east_edge() {
        let world = StaticWorld::new(TilePos::new(20, 20));
        let buffer = render(&world, None);
        assert_eq!(pixel(&buffer, 305, 199), FACING_MARKER_COLOR);
        assert_eq!(pixel(&buffer, 293, 199), PLAYER_COLOR);
    }

    #[test]
    fn area_outside_map_still_shows_ground_color() {
        let world = StaticWorld::new(TilePos::new(0, 0));
        let buffer = render(&world, None);
        assert_eq!(pixel(&buffer, 5, 5), GROUND_COLOR);
    }

    #[test]
    fn side_panel_is_not_covered_by_world_layers() {
        let mut world = StaticWorld::new(TilePos::new(20, 20));
        world.water.push(WaterPatch {
            origin: TilePos::new(0, 0),
            width: 40,
            height: 40,
        });
        let buffer = render(&world, None);
        assert_eq!(pixel(&buffer, 300, 100), WATER_COLOR);
        assert_eq!(pixel(&buffer, 602, 5), PANEL_BG_COLOR);
    }

    #[test]
    fn later_layers_cover_earlier_ones() {
        let mut world = StaticWorld::new(TilePos::new(20, 20));
        world.water.push(WaterPatch {
            origin: TilePos::new(20, 20),
            width: 1,
            height: 1,
        });
        world.resources.push(ResourceDeposit {
            tile: TilePos::new(21, 20),
            kind: ResourceKind::Coal,
        });
        world.structures.push(PlacedStructure {
            tile: TilePos::new(21, 20),
            kind: StructureKind::Chest,
            facing: Direction::South,
        });
        let buffer = render(&world, None);
        // Player covers water; chest covers the coal deposit.
        assert_eq!(pixel(&buffer, 292, 192), PLAYER_COLOR);
        assert_eq!(pixel(&buffer, 311, 209), CHEST_BODY_COLOR);
    }

    #[test]
    fn hover_cursor_outlines_the_tile() {
        let world = StaticWorld::new(TilePos::new(20, 20));
        let buffer = render(&world, Some(TileCoord::new(18, 20)));
        // Tile 18 spans 250..270 on screen.
        let edge = pixel(&buffer, 250, 200);
        let interior = pixel(&buffer, 260, 200);
        assert_ne!(edge, GROUND_COLOR);
        assert_eq!(interior, GROUND_COLOR);
    }

    #[test]
    fn hovered_chest_gets_an_overlay_above_it() {
        let mut world = StaticWorld::new(TilePos::new(20, 20));
        world.structures.push(PlacedStructure {
            tile: TilePos::new(20, 15),
            kind: StructureKind::Chest,
            facing: Direction::South,
        });
        let without = render(&world, None);
        let with = render(&world, Some(TileCoord::new(20, 15)));
        // Chest tile on screen: 290..310 x 90..110. Panel bottom edge is 2 px above.
        assert_eq!(pixel(&without, 300, 80), GROUND_COLOR);
        assert_ne!(pixel(&with, 300, 80), GROUND_COLOR);
    }

    #[test]
    fn belt_label_is_centered_over_tile() {
        let tile = PixelRect::new(100, 100, 20, 20);
        let label = belt_item_label(&TileItem {
            tile: TilePos::new(5, 5),
            item: ItemKind::IronPlate,
            quantity: 3,
        });
        assert_eq!(label, "Iron Plate x3");
        let rect = belt_label_rect(tile, &label);
        assert_eq!(rect.x + rect.width / 2, 110);
        assert_eq!(rect.bottom(), 100 - LABEL_GAP);
    }

    #[test]
    fn facing_marker_matches_each_edge() {
        let player = PixelRect::new(0, 0, 20, 20);
        assert_eq!(
            facing_marker_rect(player, Direction::North),
            PixelRect::new(8, 2, 4, 4)
        );
        assert_eq!(
            facing_marker_rect(player, Direction::South),
            PixelRect::new(8, 14, 4, 4)
        );
        assert_eq!(
            facing_marker_rect(player, Direction::East),
            PixelRect::new(14, 8, 4, 4)
        );
        assert_eq!(
            facing_marker_rect(player, Direction::West),
            PixelRect::new(2, 8, 4, 4)
        );
    }

    #[test]
    fn every_item_has_an_opaque_color() {
        for item in ItemKind::ALL {
            assert_eq!(item_color(item)[3], u8::MAX);
        }
    }
}
