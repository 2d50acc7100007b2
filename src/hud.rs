// Everything drawn on top of the composed frame that is not part of the drawing:
// the selection palette, the active tool/color, the hand overlay, the cursor
// marker and a status line. Plus the debug views cycled with V.

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut,
};
use imageproc::rect::Rect;

use crate::compose::inverse_mask;
use crate::draw::{draw_crosshair, draw_text, text_width};
use crate::engine::{Session, ToolState};
use crate::regions::{
    COLOR_STRIP_WIDTH, COLORS, TOOL_STRIP_HEIGHT, color_zone, in_color_strip, in_tool_strip,
    tool_zone,
};
use crate::types::{Detection, Landmark, Px, Sample, Selection, Tool};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const PANEL: Rgb<u8> = Rgb([40, 40, 40]);
const PANEL_ACTIVE: Rgb<u8> = Rgb([70, 70, 150]);
const OUTLINE: Rgb<u8> = Rgb([0, 255, 0]);
/// Palette share in a blended palette pixel; the rest is live video.
const PALETTE_ALPHA: f32 = 0.7;

/// What the window shows under the HUD.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum View {
    /// Live frame with strokes.
    #[default]
    Composed,
    /// The canvas mask alone.
    Canvas,
    /// The cut-out used by the compositor (white = video shows through).
    InverseMask,
}

impl View {
    pub fn next(self) -> Self {
        match self {
            View::Composed => View::Canvas,
            View::Canvas => View::InverseMask,
            View::InverseMask => View::Composed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            View::Composed => "live",
            View::Canvas => "canvas",
            View::InverseMask => "inverse",
        }
    }
}

/// Per-run HUD state.
pub struct Hud {
    source: &'static str,
    pub view: View,
    pub show_overlay: bool,
    fps: f32,
}

impl Hud {
    pub fn new(source: &'static str) -> Self {
        Self { source, view: View::default(), show_overlay: true, fps: 0.0 }
    }

    pub fn set_fps(&mut self, fps: f32) {
        self.fps = fps;
    }

    /// Build the final window image for this frame.
    pub fn render(
        &self,
        composed: RgbImage,
        session: &Session,
        detection: &Detection,
        sample: Option<Sample>,
    ) -> RgbImage {
        let canvas = session.canvas();
        let selection = session.selection();
        let mut out = match self.view {
            View::Composed => composed,
            View::Canvas => canvas.clone(),
            View::InverseMask => DynamicImage::ImageLuma8(inverse_mask(canvas)).to_rgb8(),
        };

        draw_palette(&mut out, selection);
        if self.show_overlay {
            draw_hand(&mut out, detection);
        }
        if let ToolState::Shape { anchor: Some(anchor), .. } = session.state() {
            draw_filled_circle_mut(&mut out, (anchor.x, anchor.y), 3, WHITE);
        }
        if let Some(sample) = sample {
            draw_cursor(&mut out, sample, selection.color);
        }

        let fingers = match sample {
            Some(s) if s.extended => "UP",
            Some(_) => "DOWN",
            None => "-",
        };
        let status = format!(
            "{} | Fingers: {} | View: {} | FPS: {:.1}",
            self.source,
            fingers,
            self.view.label(),
            self.fps
        );
        let y = out.height() as i32 - 16;
        draw_text(&mut out, 8, y, &status, 1, WHITE);
        out
    }
}

/* ------------------------------- palette ------------------------------- */

fn blend(under: Rgb<u8>, over: Rgb<u8>, alpha: f32) -> Rgb<u8> {
    let mix = |a: u8, b: u8| (a as f32 * (1.0 - alpha) + b as f32 * alpha).round() as u8;
    Rgb([mix(under[0], over[0]), mix(under[1], over[1]), mix(under[2], over[2])])
}

/// Blend `color` over the rectangle [x0,x1) x [y0,y1), clipped to the image.
fn fill(img: &mut RgbImage, (x0, x1): (i32, i32), (y0, y1): (i32, i32), color: Rgb<u8>, alpha: f32) {
    let (w, h) = (img.width() as i32, img.height() as i32);
    for y in y0.max(0)..y1.min(h) {
        for x in x0.max(0)..x1.min(w) {
            let p = img.get_pixel_mut(x as u32, y as u32);
            *p = blend(*p, color, alpha);
        }
    }
}

fn zone_label(tool: Tool) -> &'static str {
    match tool {
        Tool::Draw => "DRAW",
        Tool::Line => "LINE",
        Tool::Rectangle => "RECT",
        Tool::Circle => "CIRC",
        Tool::Erase => "ERASE",
    }
}

/// Tool header, color strip, active tool label and color swatch.
pub fn draw_palette(img: &mut RgbImage, selection: Selection) {
    for tool in Tool::ALL {
        let (x0, x1) = tool_zone(tool);
        let panel = if selection.tool == Some(tool) { PANEL_ACTIVE } else { PANEL };
        fill(img, (x0, x1), (0, TOOL_STRIP_HEIGHT), panel, PALETTE_ALPHA);
        let label = zone_label(tool);
        let lx = x0 + (x1 - x0 - text_width(label, 1)) / 2;
        draw_text(img, lx, TOOL_STRIP_HEIGHT / 2 - 4, label, 1, WHITE);
    }

    for (i, color) in COLORS.into_iter().enumerate() {
        let (y0, y1) = color_zone(i);
        fill(img, (0, COLOR_STRIP_WIDTH), (y0, y1), color, PALETTE_ALPHA);
        if color == selection.color {
            let rect = Rect::at(1, y0 + 1).of_size((COLOR_STRIP_WIDTH - 2) as u32, (y1 - y0 - 2) as u32);
            draw_hollow_rect_mut(img, rect, WHITE);
        }
    }

    // solid swatch of the current color next to the header
    fill(img, (55, 95), (0, 40), selection.color, 1.0);

    let label = selection.tool.map(Tool::label).unwrap_or("Select Tool");
    draw_text(img, 420, 16, label, 2, selection.color);
}

/* ------------------------------ overlays ------------------------------ */

fn landmark_color(name: Landmark) -> Rgb<u8> {
    match name {
        Landmark::Wrist => Rgb([255, 255, 255]),
        Landmark::MiddlePip => Rgb([255, 160, 0]),
        _ => Rgb([255, 0, 0]),
    }
}

fn as_f32(p: Px) -> (f32, f32) {
    (p.x as f32, p.y as f32)
}

/// Hand outline (closed polygon) and landmark dots.
pub fn draw_hand(img: &mut RgbImage, detection: &Detection) {
    if let Some(outline) = &detection.outline {
        for (a, b) in outline.iter().zip(outline.iter().cycle().skip(1)) {
            draw_line_segment_mut(img, as_f32(*a), as_f32(*b), OUTLINE);
        }
    }
    for (name, at) in detection.landmarks.iter() {
        draw_filled_circle_mut(img, (at.x, at.y), 4, landmark_color(name));
    }
}

/// Ring when the pen is down, crosshair when it is up, plus a white halo
/// while the cursor sits in a selection strip.
pub fn draw_cursor(img: &mut RgbImage, sample: Sample, color: Rgb<u8>) {
    let Sample { cursor, extended } = sample;
    if extended {
        draw_hollow_circle_mut(img, (cursor.x, cursor.y), 8, color);
    } else {
        draw_crosshair(img, cursor.x, cursor.y, 10, color);
    }
    if in_tool_strip(cursor) || in_color_strip(cursor) {
        draw_hollow_circle_mut(img, (cursor.x, cursor.y), 14, WHITE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrushSettings;
    use crate::engine::GapPolicy;
    use crate::regions::{AQUA_BLUE, BRIGHT_RED, YELLOW};
    use crate::types::{LandmarkSet, px};

    fn session() -> Session {
        Session::new(640, 480, BrushSettings::default(), GapPolicy::Bridge)
    }

    fn frame() -> RgbImage {
        RgbImage::new(640, 480)
    }

    #[test]
    fn views_cycle_back_to_composed() {
        let v = View::default();
        assert_eq!(v, View::Composed);
        assert_eq!(v.next().next().next(), View::Composed);
        assert_eq!(v.next().label(), "canvas");
    }

    #[test]
    fn palette_shows_colors_and_current_swatch() {
        let mut img = frame();
        let selection = Selection { tool: Some(Tool::Line), color: AQUA_BLUE };
        draw_palette(&mut img, selection);

        assert_eq!(*img.get_pixel(70, 20), AQUA_BLUE, "swatch is solid");
        // yellow zone blended over black video at 70%
        assert_eq!(*img.get_pixel(25, 70), blend(Rgb([0, 0, 0]), YELLOW, PALETTE_ALPHA));
        // the active tool zone is tinted differently from the rest
        assert_ne!(img.get_pixel(205, 45), img.get_pixel(155, 45));
        // video below the strips is untouched
        assert_eq!(*img.get_pixel(320, 300), Rgb([0, 0, 0]));
    }

    #[test]
    fn inverse_view_is_white_where_nothing_is_drawn() {
        let mut hud = Hud::new("mouse");
        hud.view = View::InverseMask;
        let mut s = session();
        s.pick_tool(Tool::Draw);
        let dot = Some(Sample::new(px(600, 300), true));
        s.step(dot, &mut frame());
        s.step(dot, &mut frame());
        assert_eq!(*s.canvas().get_pixel(600, 300), BRIGHT_RED);

        let out = hud.render(frame(), &s, &Detection::none(), None);
        assert_eq!(*out.get_pixel(600, 300), Rgb([0, 0, 0]));
        assert_eq!(*out.get_pixel(610, 300), WHITE);
    }

    #[test]
    fn overlay_can_be_hidden() {
        let mut landmarks = LandmarkSet::new();
        landmarks.insert(Landmark::Wrist, px(500, 400));
        let detection = Detection { landmarks, outline: Some(vec![px(450, 300), px(550, 300), px(550, 420)]) };

        let mut hud = Hud::new("contour");
        let shown = hud.render(frame(), &session(), &detection, None);
        assert_eq!(*shown.get_pixel(500, 400), WHITE);
        assert_eq!(*shown.get_pixel(500, 300), OUTLINE);

        hud.show_overlay = false;
        let hidden = hud.render(frame(), &session(), &detection, None);
        assert_eq!(*hidden.get_pixel(500, 400), Rgb([0, 0, 0]));
        assert_eq!(*hidden.get_pixel(500, 300), Rgb([0, 0, 0]));
    }

    #[test]
    fn cursor_ring_follows_posture() {
        let mut img = frame();
        draw_cursor(&mut img, Sample::new(px(300, 300), true), BRIGHT_RED);
        assert_eq!(*img.get_pixel(308, 300), BRIGHT_RED);
        assert_eq!(*img.get_pixel(300, 300), Rgb([0, 0, 0]));

        let mut img = frame();
        draw_cursor(&mut img, Sample::new(px(300, 300), false), BRIGHT_RED);
        assert_eq!(*img.get_pixel(300, 300), BRIGHT_RED);
        assert_eq!(*img.get_pixel(300, 286), Rgb([0, 0, 0]), "no halo outside the strips");

        let mut img = frame();
        draw_cursor(&mut img, Sample::new(px(300, 20), false), BRIGHT_RED);
        assert_eq!(*img.get_pixel(314, 20), WHITE);
    }

    #[test]
    fn pending_anchor_is_marked() {
        let hud = Hud::new("mouse");
        let mut s = session();
        s.pick_tool(Tool::Rectangle);
        s.step(Some(Sample::new(px(300, 300), true)), &mut frame());
        s.step(Some(Sample::new(px(400, 400), true)), &mut frame());

        let out = hud.render(frame(), &s, &Detection::none(), None);
        assert_eq!(*out.get_pixel(300, 300), WHITE);
    }
}
