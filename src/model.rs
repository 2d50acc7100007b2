//! Landmark source backed by an external trained hand model.
//!
//! The model runs in a child process (any language, e.g. a MediaPipe script).
//! Protocol, one request/response per frame:
//!
//! 1. On start the child prints a single `READY` line.
//! 2. Request: three little-endian `u32` (width, height, channels = 3)
//!    followed by `width * height * 3` bytes of RGB pixels.
//! 3. Response: one JSON line
//!    `{"hands":[{"handedness":"Right","score":0.9,"landmarks":[{"x":..,"y":..,"z":..}, ...]}]}`
//!    with 21 landmarks per hand in normalized image coordinates, or
//!    `{"hands":[],"error":"..."}`.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use image::RgbImage;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::ModelSettings;
use crate::error::{Error, Result};
use crate::posture::FingerRule;
use crate::types::{Detection, Landmark, LandmarkSet, Px};
use crate::vision::LandmarkSource;

/// Positions inside the 21-point hand model that we care about.
const WRIST: usize = 0;
const INDEX_FINGER_TIP: usize = 8;
const MIDDLE_FINGER_PIP: usize = 10;
const MIDDLE_FINGER_TIP: usize = 12;
const RING_FINGER_TIP: usize = 16;
const PINKY_TIP: usize = 20;
const POINTS_PER_HAND: usize = 21;

const PICKED: [(usize, Landmark); 6] = [
    (WRIST, Landmark::Wrist),
    (INDEX_FINGER_TIP, Landmark::IndexTip),
    (MIDDLE_FINGER_PIP, Landmark::MiddlePip),
    (MIDDLE_FINGER_TIP, Landmark::MiddleTip),
    (RING_FINGER_TIP, Landmark::RingTip),
    (PINKY_TIP, Landmark::PinkyTip),
];

#[derive(Deserialize, Debug)]
struct LandmarkJson {
    x: f32,
    y: f32,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    #[serde(default)]
    handedness: String,
    score: f32,
    landmarks: Vec<LandmarkJson>,
}

#[derive(Deserialize, Debug)]
struct DetectionJson {
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

/// Send one frame.
pub fn write_request<W: Write>(out: &mut W, frame: &RgbImage) -> Result<()> {
    out.write_all(&frame.width().to_le_bytes())?;
    out.write_all(&frame.height().to_le_bytes())?;
    out.write_all(&3u32.to_le_bytes())?;
    out.write_all(frame.as_raw())?;
    out.flush()?;
    Ok(())
}

/// Decode one response line into pixel landmarks of the first confident hand.
/// A model-side error is reported as "no hand", malformed JSON as an error.
pub fn parse_response(line: &str, width: u32, height: u32, min_confidence: f32) -> Result<LandmarkSet> {
    let result: DetectionJson = serde_json::from_str(line.trim())?;
    if let Some(error) = result.error {
        warn!("landmark model reported: {error}");
        return Ok(LandmarkSet::new());
    }

    for hand in result.hands {
        if hand.score < min_confidence {
            continue;
        }
        if hand.landmarks.len() != POINTS_PER_HAND {
            warn!("expected {POINTS_PER_HAND} landmarks, got {}", hand.landmarks.len());
            continue;
        }
        let mut set = LandmarkSet::new();
        for (index, name) in PICKED {
            let lm = &hand.landmarks[index];
            set.insert(name, to_pixel(lm.x, lm.y, width, height));
        }
        debug!(handedness = %hand.handedness, score = hand.score, "model hand");
        return Ok(set);
    }
    Ok(LandmarkSet::new())
}

fn to_pixel(x: f32, y: f32, width: u32, height: u32) -> Px {
    Px::new((x * width as f32) as i32, (y * height as f32) as i32)
}

/// Child process speaking the protocol above.
pub struct ModelLandmarks {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    min_confidence: f32,
}

impl ModelLandmarks {
    /// Spawn the model and wait for its READY line.
    pub fn spawn(settings: &ModelSettings) -> Result<Self> {
        let (program, args) = settings
            .command
            .split_first()
            .ok_or_else(|| Error::Config("empty model command".into()))?;

        info!(command = ?settings.command, "starting landmark model");
        let mut process = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::Model(format!("spawn {program}: {e}")))?;

        let stdin = process.stdin.take().ok_or_else(|| Error::Model("no stdin pipe".into()))?;
        let stdout = process.stdout.take().ok_or_else(|| Error::Model("no stdout pipe".into()))?;
        let mut stdout = BufReader::new(stdout);

        let mut ready = String::new();
        stdout.read_line(&mut ready)?;
        if ready.trim() != "READY" {
            let _ = process.kill();
            return Err(Error::Model(format!("expected READY, got {:?}", ready.trim())));
        }
        info!("landmark model ready");

        Ok(Self { process, stdin, stdout, min_confidence: settings.min_confidence })
    }
}

impl LandmarkSource for ModelLandmarks {
    fn extract(&mut self, frame: &RgbImage) -> Result<Detection> {
        write_request(&mut self.stdin, frame)?;

        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(Error::Model("model closed its output".into()));
        }
        let landmarks = parse_response(&line, frame.width(), frame.height(), self.min_confidence)?;
        Ok(Detection { landmarks, outline: None })
    }

    fn finger_rule(&self) -> FingerRule {
        FingerRule::TipAbovePip
    }

    fn name(&self) -> &'static str {
        "model"
    }
}

impl Drop for ModelLandmarks {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand_json(score: f32, count: usize) -> String {
        let points: Vec<String> = (0..count)
            .map(|i| format!(r#"{{"x":{},"y":{},"z":0.0}}"#, i as f32 / 32.0, 1.0 - i as f32 / 32.0))
            .collect();
        format!(r#"{{"handedness":"Right","score":{score},"landmarks":[{}]}}"#, points.join(","))
    }

    #[test]
    fn picks_named_points_in_pixels() {
        let line = format!(r#"{{"hands":[{}]}}"#, hand_json(0.9, 21));
        let set = parse_response(&line, 400, 400, 0.5).unwrap();
        assert_eq!(set.len(), 6);
        assert_eq!(set.get(Landmark::Wrist), Some(Px::new(0, 400)));
        assert_eq!(set.get(Landmark::IndexTip), Some(Px::new(100, 300)));
        assert_eq!(set.get(Landmark::MiddlePip), Some(Px::new(125, 275)));
        assert_eq!(set.get(Landmark::MiddleTip), Some(Px::new(150, 250)));
        assert_eq!(set.cursor(), set.get(Landmark::IndexTip));
    }

    #[test]
    fn skips_weak_and_malformed_hands() {
        let line = format!(r#"{{"hands":[{},{},{}]}}"#, hand_json(0.2, 21), hand_json(0.9, 5), hand_json(0.8, 21));
        let set = parse_response(&line, 400, 400, 0.5).unwrap();
        assert_eq!(set.len(), 6, "falls through to the third hand");

        let none = format!(r#"{{"hands":[{}]}}"#, hand_json(0.2, 21));
        assert!(parse_response(&none, 400, 400, 0.5).unwrap().is_empty());
    }

    #[test]
    fn model_error_is_no_hand() {
        let set = parse_response(r#"{"hands":[],"error":"camera busy"}"#, 640, 480, 0.5).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(matches!(parse_response("not json", 640, 480, 0.5), Err(Error::ModelOutput(_))));
    }

    #[test]
    fn request_header_then_pixels() {
        let frame = RgbImage::from_pixel(2, 1, image::Rgb([1, 2, 3]));
        let mut buf = Vec::new();
        write_request(&mut buf, &frame).unwrap();
        assert_eq!(&buf[0..4], &2u32.to_le_bytes());
        assert_eq!(&buf[4..8], &1u32.to_le_bytes());
        assert_eq!(&buf[8..12], &3u32.to_le_bytes());
        assert_eq!(&buf[12..], &[1, 2, 3, 1, 2, 3]);
    }
}
