// Tool/shape state machine.
// `Session` is the per-run context: selection, the active tool's state and the
// canvas mask. The main loop owns it and hands it one sample per frame.

use clap::ValueEnum;
use image::{Rgb, RgbImage};
use tracing::info;

use crate::config::BrushSettings;
use crate::regions::{classify_color, classify_tool, in_color_strip, in_tool_strip};
use crate::shapes::{Mark, Shape};
use crate::types::{Px, Sample, Selection, Tool};

/// What a frame without a detected hand does to an unfinished stroke.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum GapPolicy {
    /// Ignore the frame; the stroke continues when the hand comes back.
    #[default]
    Bridge,
    /// Treat the frame as the finger being lowered at its last known point.
    Break,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    Line,
    Rectangle,
    Circle,
}

impl ShapeKind {
    fn span(self, anchor: Px, current: Px) -> Shape {
        match self {
            ShapeKind::Line => Shape::Segment { from: anchor, to: current },
            ShapeKind::Rectangle => Shape::Rectangle { corner: anchor, opposite: current },
            ShapeKind::Circle => Shape::circle_through(anchor, current),
        }
    }
}

/// State carried by the active tool between frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolState {
    /// No tool picked yet.
    Idle,
    /// Freehand: last committed point of the current stroke.
    Draw { trail: Option<Px> },
    /// Anchored shape; `last` is the most recent extended cursor.
    Shape { kind: ShapeKind, anchor: Option<Px>, last: Option<Px> },
    Erase,
}

/// What one frame asks to be painted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Action {
    /// Drawn on the display frame only.
    pub preview: Option<Mark>,
    /// Written into the canvas mask.
    pub commit: Option<Mark>,
}

impl ToolState {
    /// Fresh state for a tool.
    pub fn for_tool(tool: Option<Tool>) -> Self {
        let shape = |kind| ToolState::Shape { kind, anchor: None, last: None };
        match tool {
            None => ToolState::Idle,
            Some(Tool::Draw) => ToolState::Draw { trail: None },
            Some(Tool::Line) => shape(ShapeKind::Line),
            Some(Tool::Rectangle) => shape(ShapeKind::Rectangle),
            Some(Tool::Circle) => shape(ShapeKind::Circle),
            Some(Tool::Erase) => ToolState::Erase,
        }
    }

    pub fn is_previewing(&self) -> bool {
        matches!(self, ToolState::Shape { anchor: Some(_), .. })
    }

    /// Advance by one sample.
    pub fn handle(&mut self, sample: Sample, color: Rgb<u8>, erase_radius: i32) -> Action {
        let Sample { cursor, extended } = sample;
        let mut action = Action::default();
        match self {
            ToolState::Idle => {}
            ToolState::Draw { trail } => {
                if extended {
                    if let Some(prev) = *trail {
                        action.commit = Some(Mark::new(Shape::Segment { from: prev, to: cursor }, color));
                    }
                    *trail = Some(cursor);
                } else {
                    // lifting the finger ends the stroke
                    *trail = None;
                }
            }
            ToolState::Shape { kind, anchor, last } => {
                if extended {
                    let start = *anchor.get_or_insert(cursor);
                    *last = Some(cursor);
                    action.preview = Some(Mark::new(kind.span(start, cursor), color));
                } else if let Some(start) = anchor.take() {
                    *last = None;
                    action.commit = Some(Mark::new(kind.span(start, cursor), color));
                }
            }
            ToolState::Erase => {
                if extended {
                    let dab = Mark::erase(cursor, erase_radius);
                    action.preview = Some(dab);
                    action.commit = Some(dab);
                }
            }
        }
        action
    }

    /// The hand vanished mid-gesture and the gap policy says that ends it.
    pub fn interrupt(&mut self, color: Rgb<u8>) -> Action {
        let mut action = Action::default();
        match self {
            ToolState::Draw { trail } => *trail = None,
            ToolState::Shape { kind, anchor, last } => {
                if let (Some(start), Some(end)) = (anchor.take(), last.take()) {
                    action.commit = Some(Mark::new(kind.span(start, end), color));
                }
            }
            ToolState::Idle | ToolState::Erase => {}
        }
        action
    }
}

/// Everything that survives from one frame to the next.
pub struct Session {
    selection: Selection,
    state: ToolState,
    canvas: RgbImage,
    brush: BrushSettings,
    gap: GapPolicy,
}

impl Session {
    /// Blank canvas of the frame size.
    pub fn new(width: u32, height: u32, brush: BrushSettings, gap: GapPolicy) -> Self {
        Self {
            selection: Selection::default(),
            state: ToolState::Idle,
            canvas: RgbImage::new(width, height),
            brush,
            gap,
        }
    }

    pub fn canvas(&self) -> &RgbImage {
        &self.canvas
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn state(&self) -> &ToolState {
        &self.state
    }

    pub fn brush(&self) -> BrushSettings {
        self.brush
    }

    /// Switch tools. Any pending shape of the previous tool is dropped.
    pub fn pick_tool(&mut self, tool: Tool) {
        if self.selection.tool == Some(tool) {
            return;
        }
        if self.state.is_previewing() {
            info!(from = ?self.selection.tool, to = %tool, "tool changed mid-shape, pending shape discarded");
        } else {
            info!(tool = %tool, "tool selected");
        }
        self.selection.tool = Some(tool);
        self.state = ToolState::for_tool(Some(tool));
    }

    /// Switch colors. Unlike a tool change this keeps the gesture going.
    pub fn pick_color(&mut self, color: Rgb<u8>) {
        if self.selection.color != color {
            info!(color = ?color.0, "color selected");
            self.selection.color = color;
        }
    }

    /// One frame. `sample` is None when no hand was found.
    /// Previews land on `display`, commits on the canvas.
    pub fn step(&mut self, sample: Option<Sample>, display: &mut RgbImage) -> Action {
        let action = match sample {
            Some(sample) => {
                self.select(sample.cursor);
                self.state.handle(sample, self.selection.color, self.brush.erase_radius)
            }
            None => match self.gap {
                GapPolicy::Bridge => Action::default(),
                GapPolicy::Break => self.state.interrupt(self.selection.color),
            },
        };
        if let Some(mark) = action.preview {
            mark.paint(display, self.brush.thickness);
        }
        if let Some(mark) = action.commit {
            mark.paint(&mut self.canvas, self.brush.thickness);
        }
        action
    }

    fn select(&mut self, cursor: Px) {
        if in_color_strip(cursor) {
            self.pick_color(classify_color(cursor.y));
        }
        if in_tool_strip(cursor) {
            self.pick_tool(classify_tool(cursor.x));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions::{BRIGHT_RED, GRASS_GREEN};
    use crate::types::{BACKGROUND, px};

    const W: u32 = 640;
    const H: u32 = 480;

    fn session(gap: GapPolicy) -> Session {
        Session::new(W, H, BrushSettings::default(), gap)
    }

    fn ext(x: i32, y: i32) -> Option<Sample> {
        Some(Sample::new(px(x, y), true))
    }

    fn rest(x: i32, y: i32) -> Option<Sample> {
        Some(Sample::new(px(x, y), false))
    }

    fn feed(s: &mut Session, samples: &[Option<Sample>]) -> RgbImage {
        let mut display = RgbImage::new(W, H);
        for sample in samples {
            display = RgbImage::new(W, H);
            s.step(*sample, &mut display);
        }
        display
    }

    fn painted(img: &RgbImage) -> Vec<(u32, u32)> {
        img.enumerate_pixels()
            .filter(|(_, _, p)| p.0 != [0, 0, 0])
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    fn is_blank(img: &RgbImage) -> bool {
        painted(img).is_empty()
    }

    #[test]
    fn draw_stroke_commits_one_segment() {
        let mut s = session(GapPolicy::Bridge);
        // pick Draw from the header and red from the side strip, finger lowered
        feed(&mut s, &[rest(170, 20), rest(20, 200)]);
        assert_eq!(s.selection().tool, Some(Tool::Draw));
        assert_eq!(s.selection().color, BRIGHT_RED);
        assert!(is_blank(s.canvas()));

        feed(&mut s, &[ext(100, 150), ext(120, 150)]);

        for x in 100..=120 {
            assert_eq!(*s.canvas().get_pixel(x, 150), BRIGHT_RED);
        }
        // exactly the brush thickness (4) across
        let rows: Vec<u32> = (0..H).filter(|y| s.canvas().get_pixel(110, *y).0 != [0, 0, 0]).collect();
        assert_eq!(rows, vec![149, 150, 151, 152]);
        for (x, y) in painted(s.canvas()) {
            assert!((99..=122).contains(&x) && (149..=152).contains(&y), "stray pixel at {x},{y}");
            assert_eq!(*s.canvas().get_pixel(x, y), BRIGHT_RED);
        }
    }

    #[test]
    fn lifting_the_finger_splits_strokes() {
        let mut s = session(GapPolicy::Bridge);
        s.pick_tool(Tool::Draw);
        feed(&mut s, &[ext(100, 300), rest(100, 300), ext(300, 300)]);
        assert!(is_blank(s.canvas()));
        assert_eq!(*s.state(), ToolState::Draw { trail: Some(px(300, 300)) });
    }

    #[test]
    fn rectangle_previews_then_commits() {
        let mut s = session(GapPolicy::Bridge);
        s.pick_tool(Tool::Rectangle);

        let display = feed(&mut s, &[ext(100, 100), ext(150, 150), ext(200, 200)]);
        assert!(is_blank(s.canvas()), "nothing is committed while the finger is up");
        assert_eq!(*display.get_pixel(100, 150), BRIGHT_RED);
        assert_eq!(*display.get_pixel(200, 150), BRIGHT_RED);
        assert!(s.state().is_previewing());

        let display = feed(&mut s, &[rest(200, 200)]);
        assert!(is_blank(&display), "no preview after the commit frame");
        let canvas = s.canvas();
        assert_eq!(*canvas.get_pixel(100, 150), BRIGHT_RED);
        assert_eq!(*canvas.get_pixel(200, 150), BRIGHT_RED);
        assert_eq!(*canvas.get_pixel(150, 100), BRIGHT_RED);
        assert_eq!(*canvas.get_pixel(150, 200), BRIGHT_RED);
        assert_eq!(*canvas.get_pixel(150, 150), BACKGROUND);
        assert!(!s.state().is_previewing());
    }

    #[test]
    fn circle_radius_is_anchor_distance() {
        let mut s = session(GapPolicy::Bridge);
        s.pick_tool(Tool::Circle);
        feed(&mut s, &[ext(300, 300), ext(330, 340), rest(330, 340)]);
        assert_eq!(*s.canvas().get_pixel(350, 300), BRIGHT_RED);
        assert_eq!(*s.canvas().get_pixel(300, 250), BRIGHT_RED);
        assert_eq!(*s.canvas().get_pixel(300, 300), BACKGROUND);
    }

    #[test]
    fn erase_clears_a_disc() {
        let mut s = session(GapPolicy::Bridge);
        for y in 200..300 {
            for x in 200..300 {
                s.canvas.put_pixel(x, y, BRIGHT_RED);
            }
        }
        s.pick_tool(Tool::Erase);
        let mut display = RgbImage::from_pixel(W, H, Rgb([255, 255, 255]));
        s.step(ext(250, 250), &mut display);

        let r = BrushSettings::default().erase_radius as f64;
        for y in 200..300u32 {
            for x in 200..300u32 {
                let d = ((x as f64 - 250.0).powi(2) + (y as f64 - 250.0).powi(2)).sqrt();
                let p = *s.canvas().get_pixel(x, y);
                if d <= r - 1.0 {
                    assert_eq!(p, BACKGROUND, "{x},{y} should be erased");
                } else if d > r + 1.0 {
                    assert_eq!(p, BRIGHT_RED, "{x},{y} should survive");
                }
            }
        }
        // the eraser footprint also shows on the live frame
        assert_eq!(*display.get_pixel(250, 250), BACKGROUND);
    }

    #[test]
    fn no_hand_no_change() {
        for gap in [GapPolicy::Bridge, GapPolicy::Break] {
            let mut s = session(gap);
            s.pick_tool(Tool::Draw);
            let action = s.step(None, &mut RgbImage::new(W, H));
            assert_eq!(action, Action::default());
            assert!(is_blank(s.canvas()));
        }
    }

    #[test]
    fn no_tool_no_paint() {
        let mut s = session(GapPolicy::Bridge);
        let display = feed(&mut s, &[ext(300, 300), ext(320, 320), rest(320, 320)]);
        assert!(is_blank(s.canvas()));
        assert!(is_blank(&display));
        assert_eq!(*s.state(), ToolState::Idle);
    }

    #[test]
    fn bridge_gap_keeps_the_stroke_connected() {
        let mut s = session(GapPolicy::Bridge);
        s.pick_tool(Tool::Draw);
        feed(&mut s, &[ext(100, 300), None, ext(140, 300)]);
        assert_eq!(*s.canvas().get_pixel(120, 300), BRIGHT_RED);
    }

    #[test]
    fn break_gap_splits_the_stroke() {
        let mut s = session(GapPolicy::Break);
        s.pick_tool(Tool::Draw);
        feed(&mut s, &[ext(100, 300), None, ext(140, 300)]);
        assert!(is_blank(s.canvas()));
    }

    #[test]
    fn break_gap_commits_a_pending_shape() {
        let mut s = session(GapPolicy::Break);
        s.pick_tool(Tool::Line);
        feed(&mut s, &[ext(100, 300), ext(200, 300), None]);
        assert_eq!(*s.canvas().get_pixel(150, 300), BRIGHT_RED);
        assert!(!s.state().is_previewing());

        let mut bridged = session(GapPolicy::Bridge);
        bridged.pick_tool(Tool::Line);
        feed(&mut bridged, &[ext(100, 300), ext(200, 300), None]);
        assert!(is_blank(bridged.canvas()));
        assert!(bridged.state().is_previewing());
    }

    #[test]
    fn tool_change_discards_pending_shape() {
        let mut s = session(GapPolicy::Bridge);
        s.pick_tool(Tool::Line);
        feed(&mut s, &[ext(100, 100), ext(150, 150)]);
        assert!(s.state().is_previewing());

        // finger still up, slides into the Circle zone
        feed(&mut s, &[ext(320, 20)]);
        assert_eq!(s.selection().tool, Some(Tool::Circle));
        assert_eq!(
            *s.state(),
            ToolState::Shape { kind: ShapeKind::Circle, anchor: Some(px(320, 20)), last: Some(px(320, 20)) }
        );

        feed(&mut s, &[rest(320, 20)]);
        assert_eq!(*s.canvas().get_pixel(125, 125), BACKGROUND, "the line was never committed");
    }

    #[test]
    fn color_change_keeps_pending_shape() {
        let mut s = session(GapPolicy::Bridge);
        s.pick_tool(Tool::Rectangle);
        feed(&mut s, &[ext(100, 100), ext(20, 120)]);
        assert_eq!(s.selection().color, GRASS_GREEN);
        assert!(s.state().is_previewing());

        feed(&mut s, &[rest(20, 120)]);
        assert_eq!(*s.canvas().get_pixel(100, 110), GRASS_GREEN);
    }

    #[test]
    fn reselecting_the_same_tool_keeps_state() {
        let mut s = session(GapPolicy::Bridge);
        s.pick_tool(Tool::Line);
        feed(&mut s, &[ext(100, 100)]);
        s.pick_tool(Tool::Line);
        assert!(s.state().is_previewing());
    }
}
