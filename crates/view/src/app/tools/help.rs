use crate::app::rendering::{draw_text, measure_text, Canvas, PixelRect, Rgba, ViewportConfig};

pub(crate) const HELP_BINDINGS: [(&str, &str); 13] = [
    ("W/A/S/D", "Move"),
    ("Space", "Place item / Add to container"),
    ("Delete", "Pick up placeable"),
    ("M", "Mine resources"),
    ("H", "Pick up items / Harvest furnace"),
    ("J", "Drop selected item"),
    ("F", "Craft Furnace"),
    ("B", "Craft Belt"),
    ("P", "Craft Arm"),
    ("C", "Craft Chest"),
    ("T", "Craft Drill"),
    ("[ / ]", "Cycle inventory selection"),
    ("R", "Rotate belt/arm"),
];

const COLUMN_COUNT: i32 = 3;
const PANEL_MARGIN: i32 = 10;
const TEXT_SCALE: i32 = 2;
const TITLE_INSET_X: i32 = 10;
const TITLE_INSET_Y: i32 = 8;
const ENTRIES_INSET_X: i32 = 15;
const ENTRIES_TOP: i32 = 30;
const ENTRIES_BOTTOM_MARGIN: i32 = 10;
const LINE_HEIGHT: i32 = 14;
const KEY_GAP: i32 = 4;
const PANEL_BG_COLOR: Rgba = [0, 0, 0, 204];
const BORDER_COLOR: Rgba = [255, 255, 255, 255];
const TITLE_COLOR: Rgba = [255, 255, 255, 255];
const KEY_COLOR: Rgba = [255, 255, 0, 255];
const ACTION_COLOR: Rgba = [255, 255, 255, 255];

pub(crate) fn help_panel_rect(config: &ViewportConfig) -> PixelRect {
    PixelRect::new(
        PANEL_MARGIN,
        config.viewport.height as i32 + PANEL_MARGIN,
        config.frame_width() as i32 - PANEL_MARGIN * 2,
        config.bottom_panel_height as i32 - PANEL_MARGIN * 2,
    )
}

/// Top-left of each binding's text. A column is filled top to bottom before moving right;
/// bindings past the last column are dropped.
pub(crate) fn help_entry_positions(panel: PixelRect, entry_count: usize) -> Vec<(i32, i32)> {
    let column_width = panel.width / COLUMN_COUNT;
    let start_x = panel.x + ENTRIES_INSET_X;
    let start_y = panel.y + ENTRIES_TOP;
    let column_limit = panel.bottom() - ENTRIES_BOTTOM_MARGIN;

    let mut positions = Vec::with_capacity(entry_count);
    let mut column = 0;
    let mut y = start_y;
    for _ in 0..entry_count {
        if column >= COLUMN_COUNT {
            break;
        }
        positions.push((start_x + column * column_width, y));
        y += LINE_HEIGHT;
        if y > column_limit {
            column += 1;
            y = start_y;
        }
    }
    positions
}

pub(crate) fn draw_help_panel(canvas: &mut Canvas<'_>, config: &ViewportConfig) {
    let panel = help_panel_rect(config);
    if panel.is_empty() {
        return;
    }

    canvas.fill_rect(panel, PANEL_BG_COLOR);
    canvas.stroke_rect(panel, 2, BORDER_COLOR);
    draw_text(
        canvas,
        panel.x + TITLE_INSET_X,
        panel.y + TITLE_INSET_Y,
        "Controls",
        TEXT_SCALE,
        TITLE_COLOR,
    );

    let positions = help_entry_positions(panel, HELP_BINDINGS.len());
    for ((key, action), (x, y)) in HELP_BINDINGS.iter().zip(positions) {
        draw_text(canvas, x, y, key, TEXT_SCALE, KEY_COLOR);
        let action_x = x + measure_text(key, TEXT_SCALE) + KEY_GAP;
        draw_text(
            canvas,
            action_x,
            y,
            &format!("- {action}"),
            TEXT_SCALE,
            ACTION_COLOR,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config() -> ViewportConfig {
        ViewportConfig::from_window(1280, 720, 250, 140, 20)
    }

    #[test]
    fn all_bindings_fit_in_three_columns_at_default_size() {
        let panel = help_panel_rect(&default_config());
        let positions = help_entry_positions(panel, HELP_BINDINGS.len());
        assert_eq!(positions.len(), HELP_BINDINGS.len());

        let columns: std::collections::BTreeSet<i32> = positions.iter().map(|p| p.0).collect();
        assert_eq!(columns.len(), 3);
    }

    #[test]
    fn column_wraps_back_to_the_top() {
        let panel = help_panel_rect(&default_config());
        let positions = help_entry_positions(panel, HELP_BINDINGS.len());
        let first = positions[0];
        let next_column_start = positions
            .iter()
            .find(|position| position.0 != first.0)
            .copied()
            .expect("second column");
        assert_eq!(next_column_start.1, first.1);
        assert!(next_column_start.0 > first.0);
    }

    #[test]
    fn overflow_past_third_column_is_dropped() {
        let config = ViewportConfig::from_window(1280, 720, 250, 60, 20);
        let panel = help_panel_rect(&config);
        let positions = help_entry_positions(panel, HELP_BINDINGS.len());
        assert!(positions.len() < HELP_BINDINGS.len());
        let columns: std::collections::BTreeSet<i32> = positions.iter().map(|p| p.0).collect();
        assert!(columns.len() <= 3);
    }
}
