// Finger-state classifier: is the pen "down" (finger extended) this frame?

use clap::ValueEnum;

use crate::types::{Landmark, LandmarkSet, Sample, px};

/// Which pair of landmarks decides the posture.
/// The contour heuristic only knows the wrist and the tips, the trained model
/// also knows the finger joints, so each source asks for the rule it can feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FingerRule {
    /// Index tip is above the wrist.
    TipAboveWrist,
    /// Middle tip is above its own PIP joint.
    TipAbovePip,
}

/// Missing landmarks always mean "not extended".
pub fn is_extended(landmarks: &LandmarkSet, rule: FingerRule) -> bool {
    let (tip, reference) = match rule {
        FingerRule::TipAboveWrist => (Landmark::IndexTip, Landmark::Wrist),
        FingerRule::TipAbovePip => (Landmark::MiddleTip, Landmark::MiddlePip),
    };
    match (landmarks.get(tip), landmarks.get(reference)) {
        // smaller y is higher on screen
        (Some(t), Some(r)) => t.y < r.y,
        _ => false,
    }
}

/// Cursor + posture for the engine. No index tip means no sample at all.
pub fn sample(landmarks: &LandmarkSet, rule: FingerRule) -> Option<Sample> {
    landmarks
        .cursor()
        .map(|cursor| Sample::new(cursor, is_extended(landmarks, rule)))
}

/// Mouse input mode: the pointer is the fingertip, a held button is "extended".
pub fn mouse_sample(pos: Option<(i32, i32)>, button_down: bool) -> Option<Sample> {
    pos.map(|(x, y)| Sample::new(px(x, y), button_down))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(points: &[(Landmark, i32, i32)]) -> LandmarkSet {
        let mut s = LandmarkSet::new();
        for (name, x, y) in points {
            s.insert(*name, px(*x, *y));
        }
        s
    }

    #[test]
    fn tip_above_wrist() {
        let up = set(&[(Landmark::Wrist, 300, 400), (Landmark::IndexTip, 310, 200)]);
        let down = set(&[(Landmark::Wrist, 300, 400), (Landmark::IndexTip, 310, 420)]);
        let level = set(&[(Landmark::Wrist, 300, 400), (Landmark::IndexTip, 310, 400)]);
        assert!(is_extended(&up, FingerRule::TipAboveWrist));
        assert!(!is_extended(&down, FingerRule::TipAboveWrist));
        assert!(!is_extended(&level, FingerRule::TipAboveWrist));
    }

    #[test]
    fn tip_above_pip() {
        let up = set(&[(Landmark::MiddlePip, 300, 250), (Landmark::MiddleTip, 300, 200)]);
        let curled = set(&[(Landmark::MiddlePip, 300, 250), (Landmark::MiddleTip, 300, 260)]);
        assert!(is_extended(&up, FingerRule::TipAbovePip));
        assert!(!is_extended(&curled, FingerRule::TipAbovePip));
    }

    #[test]
    fn missing_landmarks_are_retracted() {
        assert!(!is_extended(&LandmarkSet::new(), FingerRule::TipAboveWrist));
        let tip_only = set(&[(Landmark::IndexTip, 10, 10)]);
        assert!(!is_extended(&tip_only, FingerRule::TipAboveWrist));
        // the wrist rule's landmarks do not satisfy the joint rule
        let contour_style = set(&[(Landmark::Wrist, 300, 400), (Landmark::IndexTip, 310, 200)]);
        assert!(!is_extended(&contour_style, FingerRule::TipAbovePip));
    }

    #[test]
    fn sample_needs_a_cursor() {
        let wrist_only = set(&[(Landmark::Wrist, 300, 400)]);
        assert_eq!(sample(&wrist_only, FingerRule::TipAboveWrist), None);

        let up = set(&[(Landmark::Wrist, 300, 400), (Landmark::IndexTip, 310, 200)]);
        assert_eq!(sample(&up, FingerRule::TipAboveWrist), Some(Sample::new(px(310, 200), true)));
        // tip without its rule's landmarks still moves the cursor, pen up
        assert_eq!(sample(&up, FingerRule::TipAbovePip), Some(Sample::new(px(310, 200), false)));
    }

    #[test]
    fn mouse_button_is_the_finger() {
        assert_eq!(mouse_sample(Some((12, 34)), true), Some(Sample::new(px(12, 34), true)));
        assert_eq!(mouse_sample(Some((12, 34)), false), Some(Sample::new(px(12, 34), false)));
        assert_eq!(mouse_sample(None, true), None);
    }
}
