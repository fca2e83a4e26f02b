//! Software rasterizer over an RGBA8 frame.
//!
//! All coordinates are integer pixels. A translation maps drawing coordinates onto the frame
//! (the camera offset while drawing the world) and an optional clip rectangle, in frame
//! pixels, bounds every write.

pub type Rgba = [u8; 4];

/// `0xRRGGBB` as an opaque color.
pub const fn hex(rgb: u32) -> Rgba {
    [(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8, u8::MAX]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    fn intersect(&self, other: &PixelRect) -> PixelRect {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        PixelRect::new(left, top, right - left, bottom - top)
    }
}

/// Decoded RGBA8 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) rgba: Vec<u8>,
}

impl Sprite {
    /// `None` when the pixel buffer does not match the dimensions.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        (rgba.len() == expected && width > 0 && height > 0).then_some(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
    offset_x: i32,
    offset_y: i32,
    clip: PixelRect,
}

impl<'a> Canvas<'a> {
    /// Frames shorter than `width * height * 4` are clipped to the rows they hold.
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        let full = full_rect(width, height);
        Self {
            frame,
            width,
            height,
            offset_x: 0,
            offset_y: 0,
            clip: full,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set_translation(&mut self, offset_x: i32, offset_y: i32) {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
    }

    pub fn reset_translation(&mut self) {
        self.set_translation(0, 0);
    }

    pub fn set_clip(&mut self, clip: Option<PixelRect>) {
        let full = full_rect(self.width, self.height);
        self.clip = match clip {
            Some(rect) => rect.intersect(&full),
            None => full,
        };
    }

    pub fn clear(&mut self, color: Rgba) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    pub fn fill_rect(&mut self, rect: PixelRect, color: Rgba) {
        let Some(area) = self.visible_area(rect) else {
            return;
        };
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                self.blend_frame_pixel(x, y, color);
            }
        }
    }

    /// Outline drawn inside `rect`, `thickness` pixels wide.
    pub fn stroke_rect(&mut self, rect: PixelRect, thickness: i32, color: Rgba) {
        if rect.is_empty() || thickness <= 0 {
            return;
        }
        let t = thickness.min(rect.width).min(rect.height);
        self.fill_rect(PixelRect::new(rect.x, rect.y, rect.width, t), color);
        self.fill_rect(
            PixelRect::new(rect.x, rect.bottom() - t, rect.width, t),
            color,
        );
        let inner_height = rect.height - 2 * t;
        if inner_height > 0 {
            self.fill_rect(PixelRect::new(rect.x, rect.y + t, t, inner_height), color);
            self.fill_rect(
                PixelRect::new(rect.right() - t, rect.y + t, t, inner_height),
                color,
            );
        }
    }

    /// Fills pixels whose centers lie inside the triangle, either winding.
    pub fn fill_triangle(&mut self, points: [(i32, i32); 3], color: Rgba) {
        let min_x = points.iter().map(|p| p.0).min().unwrap_or(0);
        let max_x = points.iter().map(|p| p.0).max().unwrap_or(0);
        let min_y = points.iter().map(|p| p.1).min().unwrap_or(0);
        let max_y = points.iter().map(|p| p.1).max().unwrap_or(0);
        let bounds = PixelRect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1);
        let Some(area) = self.visible_area(bounds) else {
            return;
        };

        let to_f = |(x, y): (i32, i32)| (x as f32, y as f32);
        let (a, b, c) = (to_f(points[0]), to_f(points[1]), to_f(points[2]));
        let area2 = edge(a, b, c);
        if area2 == 0.0 {
            return;
        }

        for fy in area.y..area.bottom() {
            for fx in area.x..area.right() {
                let p = (
                    (fx + self.offset_x) as f32 + 0.5,
                    (fy + self.offset_y) as f32 + 0.5,
                );
                let w0 = edge(b, c, p);
                let w1 = edge(c, a, p);
                let w2 = edge(a, b, p);
                let inside = if area2 > 0.0 {
                    w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0
                } else {
                    w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0
                };
                if inside {
                    self.blend_frame_pixel(fx, fy, color);
                }
            }
        }
    }

    /// Nearest-neighbour scaled copy of `sprite` into `dest`. Fully transparent texels are
    /// skipped, partially transparent ones are blended.
    pub fn draw_sprite(&mut self, sprite: &Sprite, dest: PixelRect) {
        if dest.is_empty() || sprite.width == 0 || sprite.height == 0 {
            return;
        }
        let Some(area) = self.visible_area(dest) else {
            return;
        };
        let dest_left = dest.x - self.offset_x;
        let dest_top = dest.y - self.offset_y;
        let sprite_width = sprite.width as usize;

        for fy in area.y..area.bottom() {
            let dy = (fy - dest_top) as i64;
            let src_y = (dy * sprite.height as i64 / dest.height as i64)
                .clamp(0, sprite.height as i64 - 1) as usize;
            for fx in area.x..area.right() {
                let dx = (fx - dest_left) as i64;
                let src_x = (dx * sprite.width as i64 / dest.width as i64)
                    .clamp(0, sprite.width as i64 - 1) as usize;
                let offset = (src_y * sprite_width + src_x) * 4;
                let Some(texel) = sprite.rgba.get(offset..offset + 4) else {
                    continue;
                };
                let color = [texel[0], texel[1], texel[2], texel[3]];
                if color[3] == 0 {
                    continue;
                }
                self.blend_frame_pixel(fx, fy, color);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn pixel(&self, x: i32, y: i32) -> Option<Rgba> {
        let offset = self.frame_offset(x, y)?;
        let bytes = &self.frame[offset..offset + 4];
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Translates `rect` into frame pixels and clips it.
    fn visible_area(&self, rect: PixelRect) -> Option<PixelRect> {
        if rect.is_empty() {
            return None;
        }
        let translated = PixelRect::new(
            rect.x - self.offset_x,
            rect.y - self.offset_y,
            rect.width,
            rect.height,
        );
        let area = translated.intersect(&self.clip);
        (!area.is_empty()).then_some(area)
    }

    fn frame_offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let pixel = (y as usize)
            .checked_mul(self.width as usize)?
            .checked_add(x as usize)?;
        let offset = pixel.checked_mul(4)?;
        (offset.checked_add(4)? <= self.frame.len()).then_some(offset)
    }

    fn blend_frame_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        let Some(offset) = self.frame_offset(x, y) else {
            return;
        };
        let dst = &mut self.frame[offset..offset + 4];
        if color[3] == u8::MAX {
            dst.copy_from_slice(&color);
            return;
        }
        let alpha = color[3] as u32;
        let inverse = 255 - alpha;
        for channel in 0..3 {
            let blended =
                (color[channel] as u32 * alpha + dst[channel] as u32 * inverse + 127) / 255;
            dst[channel] = blended as u8;
        }
        dst[3] = u8::MAX;
    }
}

fn full_rect(width: u32, height: u32) -> PixelRect {
    PixelRect::new(
        0,
        0,
        i32::try_from(width).unwrap_or(i32::MAX),
        i32::try_from(height).unwrap_or(i32::MAX),
    )
}

fn edge(a: (f32, f32), b: (f32, f32), p: (f32, f32)) -> f32 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = [255, 0, 0, 255];
    const BLACK: Rgba = [0, 0, 0, 255];

    fn frame(width: u32, height: u32) -> Vec<u8> {
        let mut buffer = vec![0u8; (width * height * 4) as usize];
        for chunk in buffer.chunks_exact_mut(4) {
            chunk.copy_from_slice(&BLACK);
        }
        buffer
    }

    #[test]
    fn fill_rect_is_clipped_to_frame() {
        let mut buffer = frame(8, 8);
        let mut canvas = Canvas::new(&mut buffer, 8, 8);
        canvas.fill_rect(PixelRect::new(-4, 6, 20, 20), RED);
        assert_eq!(canvas.pixel(0, 6), Some(RED));
        assert_eq!(canvas.pixel(7, 7), Some(RED));
        assert_eq!(canvas.pixel(0, 5), Some(BLACK));
    }

    #[test]
    fn translation_shifts_drawing() {
        let mut buffer = frame(8, 8);
        let mut canvas = Canvas::new(&mut buffer, 8, 8);
        canvas.set_translation(10, 10);
        canvas.fill_rect(PixelRect::new(12, 13, 1, 1), RED);
        assert_eq!(canvas.pixel(2, 3), Some(RED));
        canvas.reset_translation();
        canvas.fill_rect(PixelRect::new(0, 0, 1, 1), RED);
        assert_eq!(canvas.pixel(0, 0), Some(RED));
    }

    #[test]
    fn clip_rect_limits_writes() {
        let mut buffer = frame(8, 8);
        let mut canvas = Canvas::new(&mut buffer, 8, 8);
        canvas.set_clip(Some(PixelRect::new(0, 0, 4, 4)));
        canvas.fill_rect(PixelRect::new(0, 0, 8, 8), RED);
        assert_eq!(canvas.pixel(3, 3), Some(RED));
        assert_eq!(canvas.pixel(4, 3), Some(BLACK));
        assert_eq!(canvas.pixel(3, 4), Some(BLACK));
    }

    #[test]
    fn half_alpha_blends_toward_source() {
        let mut buffer = frame(2, 2);
        let mut canvas = Canvas::new(&mut buffer, 2, 2);
        canvas.fill_rect(PixelRect::new(0, 0, 1, 1), [255, 255, 255, 128]);
        assert_eq!(canvas.pixel(0, 0), Some([128, 128, 128, 255]));
    }

    #[test]
    fn stroke_rect_leaves_interior_untouched() {
        let mut buffer = frame(10, 10);
        let mut canvas = Canvas::new(&mut buffer, 10, 10);
        canvas.stroke_rect(PixelRect::new(1, 1, 8, 8), 2, RED);
        assert_eq!(canvas.pixel(1, 1), Some(RED));
        assert_eq!(canvas.pixel(2, 5), Some(RED));
        assert_eq!(canvas.pixel(8, 8), Some(RED));
        assert_eq!(canvas.pixel(4, 4), Some(BLACK));
        assert_eq!(canvas.pixel(0, 0), Some(BLACK));
    }

    #[test]
    fn triangle_covers_its_interior_only() {
        let mut buffer = frame(10, 10);
        let mut canvas = Canvas::new(&mut buffer, 10, 10);
        canvas.fill_triangle([(0, 0), (9, 0), (0, 9)], RED);
        assert_eq!(canvas.pixel(1, 1), Some(RED));
        assert_eq!(canvas.pixel(8, 8), Some(BLACK));
    }

    #[test]
    fn sprite_is_scaled_with_nearest_neighbour() {
        let rgba = vec![
            255, 0, 0, 255, 0, 255, 0, 255, //
            0, 0, 255, 255, 0, 0, 0, 0,
        ];
        let sprite = Sprite::from_rgba(2, 2, rgba).expect("sprite");
        let mut buffer = frame(4, 4);
        let mut canvas = Canvas::new(&mut buffer, 4, 4);
        canvas.draw_sprite(&sprite, PixelRect::new(0, 0, 4, 4));
        assert_eq!(canvas.pixel(1, 1), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(2, 0), Some([0, 255, 0, 255]));
        assert_eq!(canvas.pixel(0, 3), Some([0, 0, 255, 255]));
        assert_eq!(canvas.pixel(3, 3), Some(BLACK));
    }

    #[test]
    fn sprite_rejects_mismatched_buffer() {
        assert!(Sprite::from_rgba(2, 2, vec![0; 15]).is_none());
        assert!(Sprite::from_rgba(0, 0, Vec::new()).is_none());
    }
}
