//! Rasterize a scene onto the photo it annotates.
//!
//! Export flattens the overlay into the photo raster; the stored photo is
//! never modified. Coordinates in a snapshot are display-space, so they
//! are scaled back up to photo pixels through the snapshot's photo scale.

use image::{Rgba, RgbaImage};

use crate::scene::{SceneObject, SceneSnapshot, ARROW_SEGMENTS};

/// Segments used to approximate a circle outline.
const CIRCLE_STEPS: u32 = 64;

/// Draw every object in `snapshot` onto a copy of `photo`.
///
/// Labels are not rasterized: that needs a font rasterizer the stack does
/// not carry, and they still round-trip through snapshots for on-screen
/// editing. Out-of-bounds geometry is clipped pixel by pixel.
pub fn flatten(photo: &RgbaImage, snapshot: &SceneSnapshot) -> RgbaImage {
    let mut out = photo.clone();
    let factor = if snapshot.photo_scale > 0.0 {
        1.0 / snapshot.photo_scale
    } else {
        1.0
    };

    for object in &snapshot.objects {
        match object {
            SceneObject::Rect {
                left,
                top,
                width,
                height,
                stroke,
                stroke_width,
            } => {
                let (x, y, w, h) = (left * factor, top * factor, width * factor, height * factor);
                let color = parse_color(stroke);
                let t = stroke_width * factor;
                draw_line(&mut out, x, y, x + w, y, t, color);
                draw_line(&mut out, x + w, y, x + w, y + h, t, color);
                draw_line(&mut out, x + w, y + h, x, y + h, t, color);
                draw_line(&mut out, x, y + h, x, y, t, color);
            }
            SceneObject::Circle {
                left,
                top,
                radius,
                stroke,
                stroke_width,
            } => {
                let r = radius * factor;
                // left/top anchor the bounding box, so the center sits one
                // radius in.
                let cx = left * factor + r;
                let cy = top * factor + r;
                let color = parse_color(stroke);
                let t = stroke_width * factor;
                let mut prev = (cx + r, cy);
                for i in 1..=CIRCLE_STEPS {
                    let angle = i as f64 / CIRCLE_STEPS as f64 * std::f64::consts::TAU;
                    let next = (cx + r * angle.cos(), cy + r * angle.sin());
                    draw_line(&mut out, prev.0, prev.1, next.0, next.1, t, color);
                    prev = next;
                }
            }
            SceneObject::Arrow {
                left,
                top,
                stroke,
                stroke_width,
            } => {
                let color = parse_color(stroke);
                let t = stroke_width * factor;
                for [x1, y1, x2, y2] in ARROW_SEGMENTS {
                    draw_line(
                        &mut out,
                        (left + x1) * factor,
                        (top + y1) * factor,
                        (left + x2) * factor,
                        (top + y2) * factor,
                        t,
                        color,
                    );
                }
            }
            SceneObject::Path {
                points,
                stroke,
                stroke_width,
            } => {
                let color = parse_color(stroke);
                let t = stroke_width * factor;
                for pair in points.windows(2) {
                    draw_line(
                        &mut out,
                        pair[0][0] * factor,
                        pair[0][1] * factor,
                        pair[1][0] * factor,
                        pair[1][1] * factor,
                        t,
                        color,
                    );
                }
                // A tap with no movement still leaves a dot.
                if points.len() == 1 {
                    draw_line(
                        &mut out,
                        points[0][0] * factor,
                        points[0][1] * factor,
                        points[0][0] * factor,
                        points[0][1] * factor,
                        t,
                        color,
                    );
                }
            }
            SceneObject::Label { .. } => {}
        }
    }
    out
}

fn parse_color(color: &str) -> Rgba<u8> {
    let hex = color.trim_start_matches('#');
    if hex.len() >= 6 {
        let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
        let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
        let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
        Rgba([r, g, b, 255])
    } else {
        Rgba([0, 0, 0, 255])
    }
}

/// Stamp a thick line segment, clipping every pixel to the image bounds.
/// Zero-length segments degenerate to a single stamp.
fn draw_line(img: &mut RgbaImage, x0: f64, y0: f64, x1: f64, y1: f64, thickness: f64, color: Rgba<u8>) {
    let dx = x1 - x0;
    let dy = y1 - y0;
    let len = (dx * dx + dy * dy).sqrt();
    let steps = (len * 2.0) as i64;
    let half_t = ((thickness / 2.0).max(0.5)) as i64;
    let (w, h) = (img.width() as i64, img.height() as i64);

    for i in 0..=steps {
        let t = i as f64 / steps.max(1) as f64;
        let cx = (x0 + dx * t) as i64;
        let cy = (y0 + dy * t) as i64;
        for oy in -half_t..=half_t {
            for ox in -half_t..=half_t {
                let px = cx + ox;
                let py = cy + oy;
                if px >= 0 && px < w && py >= 0 && py < h {
                    img.put_pixel(px as u32, py as u32, color);
                }
            }
        }
    }
}
