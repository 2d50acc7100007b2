// Landmark extraction without a trained model.
// Pipeline: RGB -> HSV skin band -> open/close -> external contours -> hand-sized
// largest contour -> hull + convexity defects -> wrist and finger tips.
// Also home of the `LandmarkSource` seam the rest of the app is written against.

use std::collections::HashMap;

use geo::Area;
use geo_types::{LineString, Polygon};
use image::{GrayImage, Luma, RgbImage};
use imageproc::contours::{BorderType, find_contours};
use imageproc::distance_transform::Norm;
use imageproc::geometry::convex_hull;
use imageproc::morphology::{close, open};
use tracing::debug;

use crate::config::{ExtractorSettings, SkinBand};
use crate::error::Result;
use crate::posture::FingerRule;
use crate::types::{Detection, HandOutline, Landmark, LandmarkSet, Px};

/// Anything that can turn a frame into hand landmarks.
/// The tool engine and the posture classifier only ever see this interface.
pub trait LandmarkSource {
    /// Landmarks for this frame. `Ok(Detection::none())` means "no hand".
    fn extract(&mut self, frame: &RgbImage) -> Result<Detection>;

    /// Posture rule that matches the landmarks this source produces.
    fn finger_rule(&self) -> FingerRule;

    fn name(&self) -> &'static str;
}

/// Skin segmentation + contour geometry.
#[derive(Debug, Clone, Default)]
pub struct ContourLandmarks {
    pub settings: ExtractorSettings,
}

impl ContourLandmarks {
    pub fn new(settings: ExtractorSettings) -> Self {
        Self { settings }
    }
}

impl LandmarkSource for ContourLandmarks {
    fn extract(&mut self, frame: &RgbImage) -> Result<Detection> {
        let raw = skin_mask(frame, &self.settings.skin);
        if raw.pixels().all(|p| p.0[0] == 0) {
            return Ok(Detection::none());
        }
        Ok(landmarks_from_mask(&denoise(&raw), &self.settings))
    }

    fn finger_rule(&self) -> FingerRule {
        FingerRule::TipAboveWrist
    }

    fn name(&self) -> &'static str {
        "contour"
    }
}

/* ---------------------------- segmentation ---------------------------- */

/// RGB -> HSV in the 8-bit OpenCV convention (H halved into 0..180).
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let v = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = v - min;

    let s = if v > 0.0 { 255.0 * delta / v } else { 0.0 };
    let mut h = if delta == 0.0 {
        0.0
    } else if v == rf {
        60.0 * (gf - bf) / delta
    } else if v == gf {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    if h < 0.0 {
        h += 360.0;
    }

    [(h / 2.0).round().min(179.0) as u8, s.round() as u8, v as u8]
}

/// 255 where the pixel falls inside the skin band, 0 elsewhere.
pub fn skin_mask(frame: &RgbImage, band: &SkinBand) -> GrayImage {
    let mut mask = GrayImage::new(frame.width(), frame.height());
    for (x, y, p) in frame.enumerate_pixels() {
        if band.contains(rgb_to_hsv(p.0)) {
            mask.put_pixel(x, y, Luma([255]));
        }
    }
    mask
}

/// 3x3 opening (drops speckles) then closing (fills pinholes).
/// Without it the contour jitters and the posture flips from frame to frame.
pub fn denoise(mask: &GrayImage) -> GrayImage {
    close(&open(mask, Norm::LInf, 1), Norm::LInf, 1)
}

/* ------------------------------ contours ------------------------------ */

/// Area enclosed by a closed contour (px²).
pub fn contour_area(points: &[Px]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let ring: LineString<f64> = points.iter().map(|p| (p.x as f64, p.y as f64)).collect::<Vec<_>>().into();
    Polygon::new(ring, vec![]).unsigned_area()
}

/// Largest top-level contour whose area lies strictly inside the hand-size range.
pub fn hand_outline(mask: &GrayImage, settings: &ExtractorSettings) -> Option<HandOutline> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| {
            let area = contour_area(&c.points);
            (c.points, area)
        })
        .filter(|(_, area)| *area > settings.min_area && *area < settings.max_area)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(points, _)| points)
}

/// A dip of the contour below one hull edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Defect {
    pub start: Px,
    pub end: Px,
    /// Contour point furthest from the hull edge.
    pub far: Px,
    pub depth: f64,
}

impl Defect {
    /// Interior angle at `far` in degrees (law of cosines). None when degenerate.
    pub fn angle(&self) -> Option<f64> {
        let a = dist(self.start, self.end);
        let b = dist(self.far, self.start);
        let c = dist(self.end, self.far);
        if b == 0.0 || c == 0.0 {
            return None;
        }
        let cos = ((b * b + c * c - a * a) / (2.0 * b * c)).clamp(-1.0, 1.0);
        Some(cos.acos().to_degrees())
    }
}

#[inline]
fn dist(p: Px, q: Px) -> f64 {
    let dx = (p.x - q.x) as f64;
    let dy = (p.y - q.y) as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Distance from `p` to the infinite line through `a` and `b`.
fn line_distance(p: Px, a: Px, b: Px) -> f64 {
    let len = dist(a, b);
    if len == 0.0 {
        return dist(p, a);
    }
    let cross = (b.x - a.x) as f64 * (p.y - a.y) as f64 - (b.y - a.y) as f64 * (p.x - a.x) as f64;
    cross.abs() / len
}

/// Convexity defects in contour order: one per hull edge that has contour
/// points strictly below it.
pub fn convexity_defects(contour: &[Px]) -> Vec<Defect> {
    let n = contour.len();
    if n < 3 {
        return Vec::new();
    }

    // hull vertices back to contour positions (first visit wins)
    let mut position: HashMap<(i32, i32), usize> = HashMap::with_capacity(n);
    for (i, p) in contour.iter().enumerate() {
        position.entry((p.x, p.y)).or_insert(i);
    }
    let mut hull: Vec<usize> = convex_hull(contour)
        .iter()
        .filter_map(|p| position.get(&(p.x, p.y)).copied())
        .collect();
    hull.sort_unstable();
    hull.dedup();
    if hull.len() < 3 {
        return Vec::new();
    }

    let mut defects = Vec::new();
    for k in 0..hull.len() {
        let s = hull[k];
        let e = hull[(k + 1) % hull.len()];
        let (start, end) = (contour[s], contour[e]);
        let span = (e + n - s) % n;

        let mut deepest: Option<(usize, f64)> = None;
        for step in 1..span {
            let i = (s + step) % n;
            let d = line_distance(contour[i], start, end);
            if deepest.is_none_or(|(_, best)| d > best) {
                deepest = Some((i, d));
            }
        }
        if let Some((f, depth)) = deepest {
            if depth > 0.0 {
                defects.push(Defect { start, end, far: contour[f], depth });
            }
        }
    }
    defects
}

/* ------------------------------ landmarks ----------------------------- */

/// Wrist and finger tips from a hand outline.
pub fn landmarks_from_outline(outline: &[Px], settings: &ExtractorSettings) -> LandmarkSet {
    let mut set = LandmarkSet::new();
    let Some(&first) = outline.first() else {
        return set;
    };

    // extreme points; ties keep the first one met along the contour
    let (mut top, mut bottom) = (first, first);
    for &p in outline {
        if p.y < top.y {
            top = p;
        }
        if p.y > bottom.y {
            bottom = p;
        }
    }
    // the hand enters from below, so its lowest point is the wrist
    set.insert(Landmark::Wrist, bottom);

    let tips = convexity_defects(outline)
        .into_iter()
        .filter(|d| d.depth >= settings.min_defect_depth)
        .filter(|d| d.angle().is_some_and(|a| a <= settings.max_valley_angle))
        .map(|d| d.end);
    for (slot, tip) in Landmark::TIPS.iter().zip(tips) {
        set.insert(*slot, tip);
    }

    // closed fist: still give the user a cursor
    if set.get(Landmark::IndexTip).is_none() {
        set.insert(Landmark::IndexTip, top);
    }
    set
}

/// Geometry stage on an already segmented, denoised binary mask.
pub fn landmarks_from_mask(mask: &GrayImage, settings: &ExtractorSettings) -> Detection {
    let Some(outline) = hand_outline(mask, settings) else {
        return Detection::none();
    };
    let landmarks = landmarks_from_outline(&outline, settings);
    debug!(points = outline.len(), landmarks = landmarks.len(), "hand contour");
    Detection { landmarks, outline: Some(outline) }
}
