use super::canvas::{Canvas, PixelRect, Rgba};

pub const GLYPH_WIDTH: i32 = 3;
pub const GLYPH_HEIGHT: i32 = 5;

const FALLBACK_CHAR: char = '?';

/// 3x5 bitmap font for printable ASCII, indexed from `' '`. Each entry packs five 3-bit rows,
/// top row in the highest bits.
const GLYPHS: [u16; 95] = [
    0x0000, 0x2482, 0x5A00, 0x5F7D, 0x7DDF, 0x52A5, 0x2AAB, 0x2400, //
    0x1491, 0x4494, 0x0AA8, 0x05D0, 0x0014, 0x01C0, 0x0002, 0x12A4, //
    0x7B6F, 0x2C97, 0x73E7, 0x73CF, 0x5BC9, 0x79CF, 0x79EF, 0x7292, //
    0x7BEF, 0x7BCF, 0x0410, 0x0414, 0x1511, 0x0E38, 0x4454, 0x72C2, //
    0x7BE7, 0x2BED, 0x6BAE, 0x7927, 0x6B6E, 0x79A7, 0x79A4, 0x796F, //
    0x5BED, 0x7497, 0x726F, 0x5BAD, 0x4927, 0x5FED, 0x5FFD, 0x7B6F, //
    0x6BA4, 0x7B79, 0x6BAD, 0x79CF, 0x7492, 0x5B6F, 0x5B6A, 0x5BFD, //
    0x5AAD, 0x5A92, 0x72A7, 0x6926, 0x4889, 0x324B, 0x2A00, 0x0007, //
    0x4400, 0x0E7F, 0x49AE, 0x0F27, 0x13EF, 0x0FA7, 0x39A4, 0x0F79, //
    0x49AD, 0x2092, 0x106A, 0x4BAD, 0x4927, 0x0DED, 0x0D6D, 0x0F6F, //
    0x0D74, 0x0F79, 0x0D64, 0x0F8F, 0x2E93, 0x0B6F, 0x0B6A, 0x0B7A, //
    0x0A95, 0x0B79, 0x0E57, 0x3593, 0x2492, 0x64D6, 0x0780,
];

pub const fn glyph_advance(scale: i32) -> i32 {
    (GLYPH_WIDTH + 1) * scale
}

pub fn measure_text(text: &str, scale: i32) -> i32 {
    text.chars().count() as i32 * glyph_advance(scale)
}

fn glyph_bits(ch: char) -> u16 {
    let lookup = |c: char| {
        let code = c as u32;
        (32..=126)
            .contains(&code)
            .then(|| GLYPHS[(code - 32) as usize])
    };
    lookup(ch)
        .or_else(|| lookup(FALLBACK_CHAR))
        .unwrap_or(0)
}

/// Draws `text` with its top-left at `(x, y)` in the canvas' current coordinate space.
pub fn draw_text(canvas: &mut Canvas<'_>, x: i32, y: i32, text: &str, scale: i32, color: Rgba) {
    let scale = scale.max(1);
    let mut pen_x = x;
    for ch in text.chars() {
        let bits = glyph_bits(ch);
        for row in 0..GLYPH_HEIGHT {
            let row_bits = (bits >> ((GLYPH_HEIGHT - 1 - row) * GLYPH_WIDTH)) & 0b111;
            for col in 0..GLYPH_WIDTH {
                if row_bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                canvas.fill_rect(
                    PixelRect::new(pen_x + col * scale, y + row * scale, scale, scale),
                    color,
                );
            }
        }
        pen_x += glyph_advance(scale);
    }
}

/// Greedy word wrap at `max_chars` columns. Words longer than a line are split.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        loop {
            let separator = usize::from(current_len > 0);
            if current_len + separator + word.len() <= max_chars {
                if separator == 1 {
                    current.push(' ');
                }
                current.extend(word.iter());
                current_len += separator + word.len();
                break;
            }
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
                continue;
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
    }

    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba = [255, 255, 255, 255];
    const BLACK: Rgba = [0, 0, 0, 255];

    #[test]
    fn every_printable_ascii_glyph_except_space_has_pixels() {
        for code in 33u8..=126u8 {
            assert_ne!(glyph_bits(char::from(code)), 0, "blank glyph for {code}");
        }
        assert_eq!(glyph_bits(' '), 0);
    }

    #[test]
    fn non_ascii_characters_draw_the_fallback_glyph() {
        assert_eq!(glyph_bits('é'), glyph_bits(FALLBACK_CHAR));
    }

    #[test]
    fn measure_text_counts_characters() {
        assert_eq!(measure_text("", 2), 0);
        assert_eq!(measure_text("Coal: 5", 2), 7 * 8);
    }

    #[test]
    fn draw_text_scales_glyph_cells() {
        let mut buffer = vec![0u8; 16 * 16 * 4];
        for chunk in buffer.chunks_exact_mut(4) {
            chunk.copy_from_slice(&BLACK);
        }
        let mut canvas = Canvas::new(&mut buffer, 16, 16);
        // '|' is a single centered column.
        draw_text(&mut canvas, 0, 0, "|", 2, WHITE);
        assert_eq!(canvas.pixel(2, 0), Some(WHITE));
        assert_eq!(canvas.pixel(3, 9), Some(WHITE));
        assert_eq!(canvas.pixel(0, 0), Some(BLACK));
        assert_eq!(canvas.pixel(4, 0), Some(BLACK));
    }

    #[test]
    fn text_drawn_off_canvas_is_safe() {
        let mut buffer = vec![0u8; 4 * 4 * 4];
        let mut canvas = Canvas::new(&mut buffer, 4, 4);
        draw_text(&mut canvas, -50, -50, "offscreen", 3, WHITE);
        draw_text(&mut canvas, 3, 3, "edge", 3, WHITE);
    }

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        assert_eq!(
            wrap_text("Picked up 3 Iron Ore!", 10),
            vec!["Picked up", "3 Iron", "Ore!"]
        );
    }

    #[test]
    fn wrap_splits_words_longer_than_a_line() {
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn wrap_of_empty_text_is_one_empty_line() {
        assert_eq!(wrap_text("", 10), vec![String::new()]);
    }
}
