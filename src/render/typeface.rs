//! Caption fonts. A system TrueType font is used when one of the candidate
//! paths loads; otherwise captions are drawn with a small built-in 5x7
//! bitmap face.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};
use std::fmt::{self, Debug};
use std::fs;
use tracing::{debug, info};

/// Glyph cell of the bitmap face, in font units
const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const GLYPH_ADVANCE: u32 = GLYPH_WIDTH + 1;

pub enum Typeface {
    TrueType { font: Font<'static>, scale: Scale },
    Bitmap { scale: u32 },
}

impl Debug for Typeface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Typeface::TrueType { scale, .. } => write!(f, "TrueType {{ size: {} }}", scale.y),
            Typeface::Bitmap { scale } => write!(f, "Bitmap {{ scale: {scale} }}"),
        }
    }
}

impl Typeface {
    /// Load the first candidate that parses as a font, falling back to the
    /// bitmap face
    pub fn discover<S: AsRef<str>>(paths: &[S], size: f32) -> Self {
        let size = if size.is_finite() && size >= 1.0 { size } else { 24.0 };

        for path in paths.iter().map(AsRef::as_ref) {
            match fs::read(path).ok().and_then(Font::try_from_vec) {
                Some(font) => {
                    info!("using caption font {path}");
                    return Typeface::TrueType {
                        font,
                        scale: Scale::uniform(size),
                    };
                }
                None => debug!("no usable font at {path}"),
            }
        }

        info!("no system font found; using built-in glyphs");
        Self::bitmap(size)
    }

    /// The built-in face, scaled to roughly `size` pixels tall
    pub fn bitmap(size: f32) -> Self {
        let scale = (size / (GLYPH_HEIGHT + 1) as f32).round().max(1.0) as u32;
        Typeface::Bitmap { scale }
    }

    /// `(width, height)` of `text` in pixels
    pub fn measure(&self, text: &str) -> (u32, u32) {
        match self {
            Typeface::TrueType { font, scale } => {
                let (w, h) = text_size(*scale, font, text);
                (w.max(0) as u32, h.max(0) as u32)
            }
            Typeface::Bitmap { scale } => {
                let chars = text.chars().count() as u32;
                let width = (chars * GLYPH_ADVANCE).saturating_sub(1) * scale;
                (width, GLYPH_HEIGHT * scale)
            }
        }
    }

    /// Draw `text` with its top-left corner at `(x, y)`. Pixels outside the
    /// canvas are dropped.
    pub fn draw(&self, canvas: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, text: &str) {
        match self {
            Typeface::TrueType { font, scale } => {
                draw_text_mut(canvas, color, x, y, *scale, font, text);
            }
            Typeface::Bitmap { scale } => {
                let scale = *scale as i32;
                let mut pen_x = x;
                for c in text.chars() {
                    draw_glyph(canvas, pen_x, y, scale, color, glyph(c));
                    pen_x += GLYPH_ADVANCE as i32 * scale;
                }
            }
        }
    }
}

fn draw_glyph(canvas: &mut RgbImage, x: i32, y: i32, scale: i32, color: Rgb<u8>, rows: [u8; 7]) {
    let (width, height) = (canvas.width() as i32, canvas.height() as i32);

    for (row, bits) in rows.iter().enumerate() {
        for col in 0..GLYPH_WIDTH as i32 {
            if bits & (1 << (GLYPH_WIDTH as i32 - 1 - col)) == 0 {
                continue;
            }
            let left = x + col * scale;
            let top = y + row as i32 * scale;
            for py in top.max(0)..(top + scale).min(height) {
                for px in left.max(0)..(left + scale).min(width) {
                    canvas.put_pixel(px as u32, py as u32, color);
                }
            }
        }
    }
}

/// Row bitmaps of the built-in face, high bit on the left. Lowercase letters
/// reuse the uppercase shapes; anything unknown is blank.
fn glyph(c: char) -> [u8; 7] {
    match c.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        '*' => [0x00, 0x04, 0x15, 0x0E, 0x15, 0x04, 0x00],
        '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
        '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
        ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
        '+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
        '=' => [0x00, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00],
        '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
        '✓' => [0x00, 0x01, 0x02, 0x12, 0x14, 0x08, 0x00],
        _ => [0x00; 7],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fonts_fall_back() {
        let face = Typeface::discover(&["/nonexistent/a.ttf", "/nonexistent/b.ttf"], 24.0);
        assert!(matches!(face, Typeface::Bitmap { scale: 3 }));
    }

    #[test]
    fn test_non_font_file_is_skipped() {
        // Cargo.toml exists but is not a font
        let manifest = concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml");
        let face = Typeface::discover(&[manifest], 16.0);
        assert!(matches!(face, Typeface::Bitmap { scale: 2 }));
    }

    #[test]
    fn test_bitmap_measure() {
        let face = Typeface::bitmap(24.0);
        assert_eq!(face.measure(""), (0, 21));
        assert_eq!(face.measure("A"), (15, 21));
        assert_eq!(face.measure("AB"), (33, 21));
        // lowercase and unknown characters still advance
        assert_eq!(face.measure("ab"), face.measure("AB"));
        assert_eq!(face.measure("é"), (15, 21));
    }

    #[test]
    fn test_bitmap_scale_floor() {
        assert!(matches!(Typeface::bitmap(2.0), Typeface::Bitmap { scale: 1 }));
        assert!(matches!(
            Typeface::discover::<&str>(&[], f32::NAN),
            Typeface::Bitmap { scale: 3 }
        ));
    }

    #[test]
    fn test_bitmap_draw_clips() {
        let face = Typeface::bitmap(8.0);
        let mut canvas = RgbImage::new(4, 4);
        let white = Rgb([255, 255, 255]);

        // partly and fully off canvas
        face.draw(&mut canvas, -3, -3, white, "HELLO");
        face.draw(&mut canvas, 100, 100, white, "HELLO");
        assert!(canvas.pixels().any(|p| *p == white));
    }

    #[test]
    fn test_bitmap_draw_pixels() {
        let face = Typeface::bitmap(8.0);
        let mut canvas = RgbImage::new(10, 10);
        let white = Rgb([255, 255, 255]);
        face.draw(&mut canvas, 0, 0, white, "-");

        // '-' is a single full row at row 3
        for x in 0..5 {
            assert_eq!(*canvas.get_pixel(x, 3), white);
            assert_eq!(*canvas.get_pixel(x, 2), Rgb([0, 0, 0]));
        }
        assert_eq!(*canvas.get_pixel(5, 3), Rgb([0, 0, 0]));
    }
}
