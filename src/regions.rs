// Fixed screen-space selection strips.
// Header strip (top): picks the tool by x. Side strip (left): picks the color by y.
// The geometry matches the palette drawn by the HUD, so it must not drift.

use image::Rgb;

use crate::types::{Px, Tool};

pub const YELLOW: Rgb<u8> = Rgb([255, 222, 89]);
pub const GRASS_GREEN: Rgb<u8> = Rgb([126, 217, 87]);
pub const AQUA_BLUE: Rgb<u8> = Rgb([0, 194, 203]);
pub const BRIGHT_RED: Rgb<u8> = Rgb([255, 22, 22]);
pub const MAGENTA: Rgb<u8> = Rgb([203, 108, 230]);

/// Tool strip: rows [0, TOOL_STRIP_HEIGHT), columns (TOOL_STRIP_LEFT, TOOL_STRIP_RIGHT).
pub const TOOL_STRIP_HEIGHT: i32 = 50;
pub const TOOL_STRIP_LEFT: i32 = 150;
pub const TOOL_STRIP_RIGHT: i32 = 400;

/// Color strip: columns [0, COLOR_STRIP_WIDTH), rows (COLOR_STRIP_TOP, COLOR_STRIP_BOTTOM).
pub const COLOR_STRIP_WIDTH: i32 = 50;
pub const COLOR_STRIP_TOP: i32 = 60;
pub const COLOR_STRIP_BOTTOM: i32 = 260;

/// Upper bounds (exclusive) of the first four tool bins; the rest is Erase.
const TOOL_BINS: [(i32, Tool); 4] = [
    (200, Tool::Draw),
    (250, Tool::Line),
    (300, Tool::Rectangle),
    (350, Tool::Circle),
];

/// Upper bounds (exclusive) of the first four color bins; the rest is Magenta.
const COLOR_BINS: [(i32, Rgb<u8>); 4] = [
    (100, YELLOW),
    (140, GRASS_GREEN),
    (180, AQUA_BLUE),
    (220, BRIGHT_RED),
];

/// Palette order, top to bottom.
pub const COLORS: [Rgb<u8>; 5] = [YELLOW, GRASS_GREEN, AQUA_BLUE, BRIGHT_RED, MAGENTA];

/// Tool under column `x`. Only meaningful inside the tool strip.
pub fn classify_tool(x: i32) -> Tool {
    TOOL_BINS
        .iter()
        .find(|(limit, _)| x < *limit)
        .map(|(_, tool)| *tool)
        .unwrap_or(Tool::Erase)
}

/// Color under row `y`. Only meaningful inside the color strip.
pub fn classify_color(y: i32) -> Rgb<u8> {
    COLOR_BINS
        .iter()
        .find(|(limit, _)| y < *limit)
        .map(|(_, color)| *color)
        .unwrap_or(MAGENTA)
}

pub fn in_tool_strip(p: Px) -> bool {
    p.y < TOOL_STRIP_HEIGHT && p.x > TOOL_STRIP_LEFT && p.x < TOOL_STRIP_RIGHT
}

pub fn in_color_strip(p: Px) -> bool {
    p.x < COLOR_STRIP_WIDTH && p.y > COLOR_STRIP_TOP && p.y < COLOR_STRIP_BOTTOM
}

/// Column span `[start, end)` of a tool's zone inside the strip (for drawing the palette).
pub fn tool_zone(tool: Tool) -> (i32, i32) {
    let mut start = TOOL_STRIP_LEFT;
    for (limit, t) in TOOL_BINS {
        if t == tool {
            return (start, limit);
        }
        start = limit;
    }
    (start, TOOL_STRIP_RIGHT)
}

/// Row span `[start, end)` of the n-th color zone (for drawing the palette).
/// Zone 0 starts at row 0; whether a point selects is `in_color_strip`'s call.
pub fn color_zone(index: usize) -> (i32, i32) {
    let start = if index == 0 { 0 } else { COLOR_BINS[index - 1].0 };
    let end = COLOR_BINS.get(index).map(|(limit, _)| *limit).unwrap_or(COLOR_STRIP_BOTTOM);
    (start, end)
}
