//! Draws the placeholder try-on result: a gradient backdrop, a stick-figure
//! wearing a "garment", and a few status captions.

use anyhow::Result;
use base64::{engine::general_purpose, Engine as _};
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_ellipse_mut, draw_filled_rect_mut, draw_hollow_ellipse_mut, draw_hollow_rect_mut,
    draw_line_segment_mut,
};
use imageproc::rect::Rect;
use std::io::Cursor;

pub mod typeface;

pub use typeface::Typeface;

const SKY: Rgb<u8> = Rgb([135, 206, 235]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const SKIN: Rgb<u8> = Rgb([255, 220, 177]);
const SHIRT: Rgb<u8> = Rgb([70, 130, 180]);
const PANTS: Rgb<u8> = Rgb([25, 25, 112]);

const TITLE: &str = "VIRTUAL TRY-ON RESULT";
const TITLE_Y: i32 = 20;
const LINE_SPACING: i32 = 25;
const ARM_WIDTH: i32 = 8;

/// Render the placeholder at `(width, height)`. `generated_at` is printed in
/// the first status line.
pub fn placeholder(
    (width, height): (u32, u32),
    typeface: &Typeface,
    generated_at: &str,
) -> RgbImage {
    let (width, height) = (width.max(1), height.max(1));
    let mut canvas = gradient(width, height, SKY, WHITE);

    draw_figure(&mut canvas);

    // Title with a drop shadow
    let title_x = centered_x(width, typeface.measure(TITLE).0);
    typeface.draw(&mut canvas, title_x + 2, TITLE_Y + 2, BLACK, TITLE);
    typeface.draw(&mut canvas, title_x, TITLE_Y, WHITE, TITLE);

    let lines = [
        format!("Generated at {generated_at}"),
        format!("Size: {width}x{height}"),
        "✓ Person: Processed".to_string(),
        "✓ Garment: Applied".to_string(),
        "Status: SUCCESS".to_string(),
    ];

    let mut y = height as i32 - 150;
    for line in &lines {
        let x = centered_x(width, typeface.measure(line).0);
        typeface.draw(&mut canvas, x + 1, y + 1, BLACK, line);
        typeface.draw(&mut canvas, x, y, WHITE, line);
        y += LINE_SPACING;
    }

    // 3px border
    for inset in 0..3 {
        let (w, h) = (width as i32 - 2 * inset, height as i32 - 2 * inset);
        outline(&mut canvas, inset, inset, w, h);
    }

    canvas
}

/// PNG-encode `image` and return it as standard base64
pub fn encode_png_base64(image: RgbImage) -> Result<String> {
    let mut data: Vec<u8> = Vec::new();
    DynamicImage::ImageRgb8(image).write_to(&mut Cursor::new(&mut data), ImageOutputFormat::Png)?;
    Ok(general_purpose::STANDARD.encode(data))
}

/// Vertical blend from `top` to `bottom`
fn gradient(width: u32, height: u32, top: Rgb<u8>, bottom: Rgb<u8>) -> RgbImage {
    let mut canvas = RgbImage::new(width, height);
    for (y, row) in canvas.enumerate_rows_mut() {
        let alpha = y as f32 / height as f32;
        let mix = |a: u8, b: u8| (a as f32 * (1.0 - alpha) + b as f32 * alpha) as u8;
        let color = Rgb([
            mix(top[0], bottom[0]),
            mix(top[1], bottom[1]),
            mix(top[2], bottom[2]),
        ]);
        for (_, _, pixel) in row {
            *pixel = color;
        }
    }
    canvas
}

/// The figure: head, shirt, pants and two arms, laid out relative to the
/// canvas so it scales with the person image
fn draw_figure(canvas: &mut RgbImage) {
    let (width, height) = (canvas.width() as i32, canvas.height() as i32);

    let body_width = width / 3;
    let body_height = height / 2;
    let body_x = (width - body_width) / 2;
    let top = height / 4;

    let head = body_width / 3;
    let head_x = body_x + (body_width - head) / 2;
    if head >= 2 {
        let center = (head_x + head / 2, top + head / 2);
        let radius = head / 2;
        draw_filled_ellipse_mut(canvas, center, radius, radius, SKIN);
        draw_hollow_ellipse_mut(canvas, center, radius, radius, BLACK);
        draw_hollow_ellipse_mut(canvas, center, radius - 1, radius - 1, BLACK);
    }

    let torso_y = top + head;
    let torso_height = body_height - head;
    let shirt_height = torso_height / 2;
    let pants_y = torso_y + shirt_height;
    let pants_height = torso_height - shirt_height;

    filled_box(canvas, body_x, torso_y, body_width, shirt_height, SHIRT);
    filled_box(canvas, body_x, pants_y, body_width, pants_height, PANTS);

    let arm_y = torso_y + 20;
    stroke(canvas, (body_x, arm_y), (body_x - 30, arm_y + 60), SKIN);
    stroke(
        canvas,
        (body_x + body_width, arm_y),
        (body_x + body_width + 30, arm_y + 60),
        SKIN,
    );
}

/// A filled box with a 2px black outline. Corners are inclusive, so the box
/// spans `w + 1` by `h + 1` pixels.
fn filled_box(canvas: &mut RgbImage, x: i32, y: i32, w: i32, h: i32, fill: Rgb<u8>) {
    if let Some(rect) = rect(x, y, w + 1, h + 1) {
        draw_filled_rect_mut(canvas, rect, fill);
    }
    outline(canvas, x, y, w + 1, h + 1);
    outline(canvas, x + 1, y + 1, w - 1, h - 1);
}

fn outline(canvas: &mut RgbImage, x: i32, y: i32, w: i32, h: i32) {
    if let Some(rect) = rect(x, y, w, h) {
        draw_hollow_rect_mut(canvas, rect, BLACK);
    }
}

fn rect(x: i32, y: i32, w: i32, h: i32) -> Option<Rect> {
    (w > 0 && h > 0).then(|| Rect::at(x, y).of_size(w as u32, h as u32))
}

/// A line `ARM_WIDTH` pixels thick, built from parallel segments
fn stroke(canvas: &mut RgbImage, from: (i32, i32), to: (i32, i32), color: Rgb<u8>) {
    for offset in -(ARM_WIDTH / 2)..(ARM_WIDTH / 2) {
        let dx = offset as f32;
        draw_line_segment_mut(
            canvas,
            (from.0 as f32 + dx, from.1 as f32),
            (to.0 as f32 + dx, to.1 as f32),
            color,
        );
    }
}

fn centered_x(width: u32, text_width: u32) -> i32 {
    (width as i32 - text_width as i32) / 2
}
