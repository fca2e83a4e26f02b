use crate::app::rendering::{
    draw_text, glyph_advance, wrap_text, Canvas, PixelRect, Rgba, ViewportConfig,
};

const PANEL_MARGIN: i32 = 10;
const TEXT_SCALE: i32 = 2;
const TEXT_INSET_X: i32 = 10;
const TITLE_INSET_Y: i32 = 9;
const MESSAGES_TOP: i32 = 34;
const BOTTOM_PADDING: i32 = 8;
const LINE_HEIGHT: i32 = 14;
const PANEL_BG_COLOR: Rgba = [0, 0, 0, 204];
const CONSOLE_COLOR: Rgba = [0, 255, 0, 255];

pub(crate) fn console_panel_rect(config: &ViewportConfig) -> PixelRect {
    PixelRect::new(
        config.viewport.width as i32 + PANEL_MARGIN,
        PANEL_MARGIN,
        config.side_panel_width as i32 - PANEL_MARGIN * 2,
        config.viewport.height as i32 - PANEL_MARGIN * 2,
    )
}

/// Characters per wrapped line for a panel of the given width.
pub(crate) fn console_columns(panel: PixelRect) -> usize {
    let usable = panel.width - TEXT_INSET_X * 2;
    (usable / glyph_advance(TEXT_SCALE)).max(1) as usize
}

pub(crate) fn console_rows(panel: PixelRect) -> usize {
    let usable = panel.height - MESSAGES_TOP - BOTTOM_PADDING;
    (usable / LINE_HEIGHT).max(0) as usize
}

/// Wraps every message and keeps the newest wrapped lines that fit, oldest first.
pub(crate) fn visible_console_lines(
    messages: &[String],
    columns: usize,
    rows: usize,
) -> Vec<String> {
    if rows == 0 {
        return Vec::new();
    }
    let mut tail: Vec<String> = Vec::with_capacity(rows);
    for message in messages.iter().rev() {
        let wrapped = wrap_text(message, columns);
        for line in wrapped.into_iter().rev() {
            if tail.len() == rows {
                tail.reverse();
                return tail;
            }
            tail.push(line);
        }
    }
    tail.reverse();
    tail
}

pub(crate) fn draw_console_panel(
    canvas: &mut Canvas<'_>,
    messages: &[String],
    config: &ViewportConfig,
) {
    let panel = console_panel_rect(config);
    if panel.is_empty() {
        return;
    }

    canvas.fill_rect(panel, PANEL_BG_COLOR);
    canvas.stroke_rect(panel, 2, CONSOLE_COLOR);
    draw_text(
        canvas,
        panel.x + TEXT_INSET_X,
        panel.y + TITLE_INSET_Y,
        "Console",
        TEXT_SCALE,
        CONSOLE_COLOR,
    );

    let lines = visible_console_lines(messages, console_columns(panel), console_rows(panel));
    let mut y = panel.y + MESSAGES_TOP;
    for line in &lines {
        draw_text(
            canvas,
            panel.x + TEXT_INSET_X,
            y,
            line,
            TEXT_SCALE,
            CONSOLE_COLOR,
        );
        y += LINE_HEIGHT;
    }
}
