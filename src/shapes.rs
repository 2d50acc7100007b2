// Shape rasterization: the one "paint shape with color C" primitive.
// Strokes, previews and erasures all go through `Mark::paint`; erasing is
// painting with the background color.

use image::{Rgb, RgbImage};
use imageproc::drawing::{BresenhamLineIter, draw_filled_circle_mut};

use crate::types::{BACKGROUND, Px};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// Thick straight segment with round ends.
    Segment { from: Px, to: Px },
    /// Axis-aligned rectangle outline spanned by two opposite corners.
    Rectangle { corner: Px, opposite: Px },
    /// Circle outline.
    Circle { center: Px, radius: i32 },
    /// Filled disc (the eraser footprint).
    Disc { center: Px, radius: i32 },
}

impl Shape {
    /// Circle centered on `center` passing through `edge`; radius is truncated.
    pub fn circle_through(center: Px, edge: Px) -> Shape {
        let dx = (edge.x - center.x) as f64;
        let dy = (edge.y - center.y) as f64;
        Shape::Circle { center, radius: (dx * dx + dy * dy).sqrt() as i32 }
    }
}

/// A shape together with the color it is painted in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mark {
    pub shape: Shape,
    pub color: Rgb<u8>,
}

impl Mark {
    pub fn new(shape: Shape, color: Rgb<u8>) -> Self {
        Self { shape, color }
    }

    pub fn erase(center: Px, radius: i32) -> Self {
        Self { shape: Shape::Disc { center, radius }, color: BACKGROUND }
    }

    /// Rasterize into `canvas`. Anything outside the image is clipped.
    /// Lines and outlines are exactly `thickness` pixels across.
    pub fn paint(&self, canvas: &mut RgbImage, thickness: u32) {
        let thickness = thickness.max(1);
        match self.shape {
            Shape::Segment { from, to } => {
                let brush = brush_offsets(thickness);
                thick_segment(canvas, from, to, &brush, self.color);
            }
            Shape::Rectangle { corner, opposite } => {
                let (lo, hi) = spread(thickness);
                let (x0, x1) = (corner.x.min(opposite.x), corner.x.max(opposite.x));
                let (y0, y1) = (corner.y.min(opposite.y), corner.y.max(opposite.y));
                // four bands; the corners are square
                band(canvas, (x0 + lo, x1 + hi), (y0 + lo, y0 + hi), self.color);
                band(canvas, (x0 + lo, x1 + hi), (y1 + lo, y1 + hi), self.color);
                band(canvas, (x0 + lo, x0 + hi), (y0 + lo, y1 + hi), self.color);
                band(canvas, (x1 + lo, x1 + hi), (y0 + lo, y1 + hi), self.color);
            }
            Shape::Circle { center, radius } => ring(canvas, center, radius, thickness, self.color),
            Shape::Disc { center, radius } => disc(canvas, center, radius, self.color),
        }
    }
}

#[inline]
fn put(canvas: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x < canvas.width() && y < canvas.height() {
        canvas.put_pixel(x, y, color);
    }
}

/// Offsets `lo..=hi` around a center line that cover `thickness` pixels.
/// Even widths lean one pixel towards +x/+y.
fn spread(thickness: u32) -> (i32, i32) {
    let t = thickness as i32;
    (-((t - 1) / 2), t / 2)
}

/// Round brush exactly `thickness` pixels wide in both directions.
fn brush_offsets(thickness: u32) -> Vec<(i32, i32)> {
    let (lo, hi) = spread(thickness);
    let mid = (lo + hi) as f64 / 2.0;
    let r2 = (thickness as f64 / 2.0).powi(2);
    let mut offsets = Vec::new();
    for dy in lo..=hi {
        for dx in lo..=hi {
            let (fx, fy) = (dx as f64 - mid, dy as f64 - mid);
            if fx * fx + fy * fy <= r2 {
                offsets.push((dx, dy));
            }
        }
    }
    offsets
}

fn dab(canvas: &mut RgbImage, at: Px, brush: &[(i32, i32)], color: Rgb<u8>) {
    for (dx, dy) in brush {
        put(canvas, at.x + dx, at.y + dy, color);
    }
}

/// Inclusive rectangle fill, clipped.
fn band(canvas: &mut RgbImage, (x0, x1): (i32, i32), (y0, y1): (i32, i32), color: Rgb<u8>) {
    for y in y0..=y1 {
        for x in x0..=x1 {
            put(canvas, x, y, color);
        }
    }
}

fn disc(canvas: &mut RgbImage, c: Px, radius: i32, color: Rgb<u8>) {
    if radius <= 0 {
        put(canvas, c.x, c.y, color);
    } else {
        draw_filled_circle_mut(canvas, (c.x, c.y), radius, color);
    }
}

/// Walk the Bresenham line and dab the brush at every step.
fn thick_segment(canvas: &mut RgbImage, from: Px, to: Px, brush: &[(i32, i32)], color: Rgb<u8>) {
    dab(canvas, from, brush, color);
    if from != to {
        let line = BresenhamLineIter::new((from.x as f32, from.y as f32), (to.x as f32, to.y as f32));
        for (x, y) in line {
            dab(canvas, Px::new(x, y), brush, color);
        }
    }
    dab(canvas, to, brush, color);
}

/// Annulus `thickness` pixels wide around the circle of `radius`:
/// radial offsets in (-t/2, t/2].
fn ring(canvas: &mut RgbImage, c: Px, radius: i32, thickness: u32, color: Rgb<u8>) {
    let half = thickness as f64 / 2.0;
    let reach = radius + half.ceil() as i32;
    for y in (c.y - reach)..=(c.y + reach) {
        for x in (c.x - reach)..=(c.x + reach) {
            let dx = (x - c.x) as f64;
            let dy = (y - c.y) as f64;
            let off = (dx * dx + dy * dy).sqrt() - radius as f64;
            if off > -half && off <= half {
                put(canvas, x, y, color);
            }
        }
    }
}
