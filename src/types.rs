// Core types shared by the extractor, the classifiers and the tool engine.

use std::collections::BTreeMap;
use std::fmt;

use image::Rgb;
use imageproc::point::Point;

/// Integer pixel coordinate inside the frame (x right, y down).
pub type Px = Point<i32>;

/// Shorthand constructor, keeps call sites readable.
#[inline]
pub fn px(x: i32, y: i32) -> Px {
    Point::new(x, y)
}

/// Canvas background; painting with it erases.
pub const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);

/// The drawing tools, in the order they appear in the header strip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tool {
    Draw,
    Line,
    Rectangle,
    Circle,
    Erase,
}

impl Tool {
    pub const ALL: [Tool; 5] = [Tool::Draw, Tool::Line, Tool::Rectangle, Tool::Circle, Tool::Erase];

    pub fn label(self) -> &'static str {
        match self {
            Tool::Draw => "Draw",
            Tool::Line => "Line",
            Tool::Rectangle => "Rectangle",
            Tool::Circle => "Circle",
            Tool::Erase => "Erase",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Named hand points. The contour heuristic only ever fills the wrist and the
/// four finger tips; `MiddlePip` comes from the trained model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Landmark {
    Wrist,
    IndexTip,
    MiddlePip,
    MiddleTip,
    RingTip,
    PinkyTip,
}

impl Landmark {
    /// Tip slots in the order finger candidates are assigned to them.
    pub const TIPS: [Landmark; 4] = [
        Landmark::IndexTip,
        Landmark::MiddleTip,
        Landmark::RingTip,
        Landmark::PinkyTip,
    ];
}

/// Landmarks found in the current frame. Possibly empty, possibly partial.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LandmarkSet {
    points: BTreeMap<Landmark, Px>,
}

impl LandmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: Landmark, at: Px) {
        self.points.insert(name, at);
    }

    pub fn get(&self, name: Landmark) -> Option<Px> {
        self.points.get(&name).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Landmark, Px)> + '_ {
        self.points.iter().map(|(k, v)| (*k, *v))
    }

    /// The drawing cursor is the index finger tip.
    pub fn cursor(&self) -> Option<Px> {
        self.get(Landmark::IndexTip)
    }
}

/// Ordered boundary polygon of the detected hand.
pub type HandOutline = Vec<Px>;

/// What a landmark source reports for one frame.
#[derive(Clone, Debug, Default)]
pub struct Detection {
    pub landmarks: LandmarkSet,
    pub outline: Option<HandOutline>,
}

impl Detection {
    /// "No hand" this frame.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_hand(&self) -> bool {
        !self.landmarks.is_empty()
    }
}

/// One cursor reading fed to the tool engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    pub cursor: Px,
    pub extended: bool,
}

impl Sample {
    pub fn new(cursor: Px, extended: bool) -> Self {
        Self { cursor, extended }
    }
}

/// Current tool and color. `tool == None` until the user picks one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub tool: Option<Tool>,
    pub color: Rgb<u8>,
}

impl Default for Selection {
    fn default() -> Self {
        Self { tool: None, color: crate::regions::BRIGHT_RED }
    }
}
