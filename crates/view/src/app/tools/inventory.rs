use crate::app::rendering::{draw_text, Canvas, PixelRect, Rgba, ViewportConfig};
use crate::app::Simulation;

const PANEL_WIDTH: i32 = 140;
const PANEL_MARGIN_RIGHT: i32 = 150;
const PANEL_TOP: i32 = 10;
const TITLE_HEIGHT: i32 = 30;
const ROW_HEIGHT: i32 = 20;
const BOTTOM_PADDING: i32 = 20;
const MIN_HEIGHT: i32 = 60;
const TEXT_SCALE: i32 = 2;
const TEXT_INSET_X: i32 = 10;
const TITLE_INSET_Y: i32 = 9;
const HIGHLIGHT_INSET_X: i32 = 5;
const HIGHLIGHT_HEIGHT: i32 = 18;
const PANEL_BG_COLOR: Rgba = [0, 0, 0, 179];
const BORDER_COLOR: Rgba = [255, 255, 255, 255];
const TEXT_COLOR: Rgba = [255, 255, 255, 255];
const SELECTED_BG_COLOR: Rgba = [255, 255, 0, 255];
const SELECTED_TEXT_COLOR: Rgba = [0, 0, 0, 255];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InventoryRow {
    pub label: String,
    pub selected: bool,
}

/// Held items with a non-zero count, in the simulation's stable order.
pub(crate) fn inventory_rows(simulation: &dyn Simulation) -> Vec<InventoryRow> {
    let selected = simulation.selected_item();
    simulation
        .available_items()
        .into_iter()
        .filter_map(|item| {
            let count = simulation.inventory_count(item);
            (count > 0).then(|| InventoryRow {
                label: format!("{}: {count}", item.display_name()),
                selected: selected == Some(item),
            })
        })
        .collect()
}

pub(crate) fn inventory_panel_rect(config: &ViewportConfig, row_count: usize) -> PixelRect {
    let rows = i32::try_from(row_count).unwrap_or(i32::MAX / ROW_HEIGHT);
    let height = (TITLE_HEIGHT + rows * ROW_HEIGHT + BOTTOM_PADDING).max(MIN_HEIGHT);
    PixelRect::new(
        config.viewport.width as i32 - PANEL_MARGIN_RIGHT,
        PANEL_TOP,
        PANEL_WIDTH,
        height,
    )
}

pub(crate) fn draw_inventory_panel(
    canvas: &mut Canvas<'_>,
    simulation: &dyn Simulation,
    config: &ViewportConfig,
) {
    let rows = inventory_rows(simulation);
    let panel = inventory_panel_rect(config, rows.len());

    canvas.fill_rect(panel, PANEL_BG_COLOR);
    canvas.stroke_rect(panel, 2, BORDER_COLOR);
    draw_text(
        canvas,
        panel.x + TEXT_INSET_X,
        panel.y + TITLE_INSET_Y,
        "Inventory",
        TEXT_SCALE,
        TEXT_COLOR,
    );

    let mut row_y = panel.y + TITLE_HEIGHT + 4;
    for row in &rows {
        let text_color = if row.selected {
            canvas.fill_rect(
                PixelRect::new(
                    panel.x + HIGHLIGHT_INSET_X,
                    row_y - 4,
                    panel.width - HIGHLIGHT_INSET_X * 2,
                    HIGHLIGHT_HEIGHT,
                ),
                SELECTED_BG_COLOR,
            );
            SELECTED_TEXT_COLOR
        } else {
            TEXT_COLOR
        };
        draw_text(
            canvas,
            panel.x + TEXT_INSET_X,
            row_y,
            &row.label,
            TEXT_SCALE,
            text_color,
        );
        row_y += ROW_HEIGHT;
    }
}
