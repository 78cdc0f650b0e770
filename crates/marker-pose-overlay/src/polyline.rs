use serde::{Deserialize, Serialize};

use crate::Rgba8ViewMut;

/// Stroke settings for overlay drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: [u8; 4],
    /// Stroke diameter in pixels.
    pub width: u32,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            color: [255, 0, 0, 255],
            width: 2,
        }
    }
}

/// Draw a closed polygon over the buffer.
///
/// Consecutive points are connected and the last point is joined back to the
/// first. Points may lie outside the buffer; only the visible pixels of each
/// segment are written.
pub fn draw_closed_polyline(img: &mut Rgba8ViewMut<'_>, pts: &[[i32; 2]], stroke: &Stroke) {
    match pts.len() {
        0 => {}
        1 => draw_segment(img, pts[0], pts[0], stroke),
        2 => draw_segment(img, pts[0], pts[1], stroke),
        n => {
            for i in 0..n {
                draw_segment(img, pts[i], pts[(i + 1) % n], stroke);
            }
        }
    }
}

/// Paint every pixel whose center lies within `width / 2` of the segment.
fn draw_segment(img: &mut Rgba8ViewMut<'_>, a: [i32; 2], b: [i32; 2], stroke: &Stroke) {
    let half = stroke.width.max(1) as f64 / 2.0;
    let (ax, ay) = (a[0] as f64, a[1] as f64);
    let (bx, by) = (b[0] as f64, b[1] as f64);

    let x0 = ((ax.min(bx) - half).floor() as i32).max(0);
    let y0 = ((ay.min(by) - half).floor() as i32).max(0);
    let x1 = ((ax.max(bx) + half).ceil() as i32).min(img.width as i32 - 1);
    let y1 = ((ay.max(by) + half).ceil() as i32).min(img.height as i32 - 1);
    if x1 < x0 || y1 < y0 {
        return;
    }

    let dx = bx - ax;
    let dy = by - ay;
    let len_sq = dx * dx + dy * dy;

    for y in y0..=y1 {
        for x in x0..=x1 {
            let t = if len_sq > 0.0 {
                (((x as f64 - ax) * dx + (y as f64 - ay) * dy) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let px = ax + t * dx;
            let py = ay + t * dy;
            let d_sq = (x as f64 - px).powi(2) + (y as f64 - py).powi(2);
            if d_sq <= half * half {
                img.put_pixel(x, y, stroke.color);
            }
        }
    }
}
