use crate::app::rendering::{
    draw_text, glyph_advance, tile_to_world_pixel, Canvas, PixelRect, Rgba, TileCoord,
};
use crate::app::{
    ChestData, DrillData, FurnaceData, PlacedStructure, Simulation, StructureData, StructureKind,
    PROCESSING_CYCLE_TICKS,
};

const TEXT_SCALE: i32 = 2;
const LINE_HEIGHT: i32 = 12;
const PANEL_PADDING_Y: i32 = 6;
const PANEL_GAP_ABOVE_TILE: i32 = 2;
const TEXT_INSET_X: i32 = 5;
const TEXT_INSET_Y: i32 = 4;
const FURNACE_MIN_WIDTH: i32 = 80;
const DRILL_MIN_WIDTH: i32 = 80;
const CHEST_MIN_WIDTH: i32 = 100;
const PANEL_BG_COLOR: Rgba = [0, 0, 0, 153];
const PANEL_BORDER_COLOR: Rgba = [255, 255, 255, 128];
const TEXT_COLOR: Rgba = [255, 255, 255, 204];
const EMPTY_LINE: &str = "Empty";

/// Percent of the current cycle already done, or `None` when nothing is processing.
pub(crate) fn processing_percent(ticks_remaining: u32) -> Option<u32> {
    if ticks_remaining == 0 {
        return None;
    }
    let cycle = PROCESSING_CYCLE_TICKS as f64;
    let remaining = ticks_remaining.min(PROCESSING_CYCLE_TICKS) as f64;
    Some(((cycle - remaining) / cycle * 100.0).round() as u32)
}

pub(crate) fn build_overlay_lines(data: &StructureData) -> Vec<String> {
    let mut lines = match data {
        StructureData::Furnace(furnace) => furnace_lines(furnace),
        StructureData::Chest(chest) => chest_lines(chest),
        StructureData::Drill(drill) => drill_lines(drill),
    };
    if lines.is_empty() {
        lines.push(EMPTY_LINE.to_string());
    }
    lines
}

fn furnace_lines(furnace: &FurnaceData) -> Vec<String> {
    let mut lines = counted_lines(&[
        ("Coal", furnace.coal),
        ("Iron", furnace.iron_ore),
        ("IronP", furnace.iron_plate),
        ("Copper", furnace.copper),
        ("CopperP", furnace.copper_plate),
    ]);
    push_processing_line(&mut lines, furnace.processing_ticks_remaining);
    lines
}

fn chest_lines(chest: &ChestData) -> Vec<String> {
    chest
        .items
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(item, count)| format!("{}: {count}", item.display_name()))
        .collect()
}

fn drill_lines(drill: &DrillData) -> Vec<String> {
    let mut lines = counted_lines(&[("Coal", drill.coal)]);
    push_processing_line(&mut lines, drill.processing_ticks_remaining);
    lines
}

fn counted_lines(entries: &[(&str, u32)]) -> Vec<String> {
    entries
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(label, count)| format!("{label}: {count}"))
        .collect()
}

fn push_processing_line(lines: &mut Vec<String>, ticks_remaining: u32) {
    if let Some(percent) = processing_percent(ticks_remaining) {
        lines.push(format!("Processing: {percent}%"));
    }
}

fn min_panel_width(kind: StructureKind) -> i32 {
    match kind {
        StructureKind::Furnace => FURNACE_MIN_WIDTH,
        StructureKind::Drill => DRILL_MIN_WIDTH,
        StructureKind::Chest => CHEST_MIN_WIDTH,
        StructureKind::Belt | StructureKind::Arm => 0,
    }
}

/// Panel rect in world pixels: directly above the tile, centered on it horizontally.
pub(crate) fn layout_overlay(
    structure: &PlacedStructure,
    lines: &[String],
    tile_size: u32,
) -> PixelRect {
    let (tile_x, tile_y) = tile_to_world_pixel(TileCoord::from(structure.tile), tile_size);
    let (tile_x, tile_y) = (tile_x as i32, tile_y as i32);
    let longest = lines
        .iter()
        .map(|line| line.chars().count() as i32)
        .max()
        .unwrap_or(0);
    let content_width = longest * glyph_advance(TEXT_SCALE) + TEXT_INSET_X * 2;
    let width = content_width.max(min_panel_width(structure.kind));
    let line_count = lines.len() as i32;
    let height = line_count * LINE_HEIGHT + PANEL_PADDING_Y;
    let x = tile_x - (width - tile_size as i32) / 2;
    let y = tile_y - (height + PANEL_GAP_ABOVE_TILE);
    PixelRect::new(x, y, width, height)
}

/// The inspectable structure whose tile is exactly the hovered tile.
pub(crate) fn hovered_structure(
    structures: &[PlacedStructure],
    hover: Option<TileCoord>,
) -> Option<&PlacedStructure> {
    let hover = hover?;
    structures
        .iter()
        .find(|structure| structure.kind.is_inspectable() && hover.matches(structure.tile))
}

/// Draws in the canvas' current (world) coordinate space. Missing data means no panel.
pub(crate) fn draw_structure_overlay(
    canvas: &mut Canvas<'_>,
    simulation: &dyn Simulation,
    structures: &[PlacedStructure],
    hover: Option<TileCoord>,
    tile_size: u32,
) {
    let Some(structure) = hovered_structure(structures, hover) else {
        return;
    };
    let Some(data) = simulation.structure_data(structure.tile) else {
        return;
    };
    let lines = build_overlay_lines(&data);
    let panel = layout_overlay(structure, &lines, tile_size);

    canvas.fill_rect(panel, PANEL_BG_COLOR);
    canvas.stroke_rect(panel, 1, PANEL_BORDER_COLOR);
    let mut y = panel.y + TEXT_INSET_Y;
    for line in &lines {
        draw_text(canvas, panel.x + TEXT_INSET_X, y, line, TEXT_SCALE, TEXT_COLOR);
        y += LINE_HEIGHT;
    }
}
