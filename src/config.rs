// Command line configuration.
// `Cli` is what clap parses; `Config` is the validated, plain-data view the rest
// of the app reads. Every sub-setting has a Default so tests never touch clap.

use clap::{Parser, ValueEnum};

use crate::engine::GapPolicy;
use crate::error::{Error, Result};
use crate::posture::FingerRule;

/// Where the cursor and posture come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum InputMode {
    /// Skin segmentation + contour geometry on the camera frame
    Contour,
    /// External trained landmark model over a subprocess pipe
    Model,
    /// Mouse pointer is the cursor, left button held is "extended"
    Mouse,
}

/// Inclusive HSV band (OpenCV 8-bit convention: H 0..180, S and V 0..255).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkinBand {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl Default for SkinBand {
    fn default() -> Self {
        Self { lower: [0, 30, 60], upper: [20, 255, 255] }
    }
}

impl SkinBand {
    #[inline]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| hsv[i] >= self.lower[i] && hsv[i] <= self.upper[i])
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtractorSettings {
    pub skin: SkinBand,
    /// Contours must enclose strictly more than this many px².
    pub min_area: f64,
    /// ...and strictly less than this many.
    pub max_area: f64,
    /// Shallower defects are boundary noise, not finger valleys.
    pub min_defect_depth: f64,
    /// Largest interior angle (degrees) still counted as a valley between fingers.
    pub max_valley_angle: f64,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            skin: SkinBand::default(),
            min_area: 5_000.0,
            max_area: 50_000.0,
            min_defect_depth: 8.0,
            max_valley_angle: 90.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BrushSettings {
    /// Stroke width of Draw/Line/Rectangle/Circle.
    pub thickness: u32,
    /// Radius of the eraser disc.
    pub erase_radius: i32,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self { thickness: 4, erase_radius: 30 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureSettings {
    pub camera: u32,
    pub width: u32,
    pub height: u32,
    /// Flip frames horizontally so moving right moves the cursor right.
    pub mirror: bool,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self { camera: 0, width: 640, height: 480, mirror: true }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ModelSettings {
    /// Program followed by its arguments.
    pub command: Vec<String>,
    pub min_confidence: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub capture: CaptureSettings,
    pub input: InputMode,
    pub model: Option<ModelSettings>,
    /// Overrides the rule the landmark source asks for.
    pub finger_rule: Option<FingerRule>,
    pub gap: GapPolicy,
    pub brush: BrushSettings,
    pub extractor: ExtractorSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capture: CaptureSettings::default(),
            input: InputMode::Contour,
            model: None,
            finger_rule: None,
            gap: GapPolicy::default(),
            brush: BrushSettings::default(),
            extractor: ExtractorSettings::default(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "gesture-brush", version, about = "Paint on a live camera feed with hand gestures")]
pub struct Cli {
    /// Camera index (0 = default webcam)
    #[arg(long, default_value_t = 0)]
    pub camera: u32,

    /// Capture width in pixels
    #[arg(long, default_value_t = 640)]
    pub width: u32,

    /// Capture height in pixels
    #[arg(long, default_value_t = 480)]
    pub height: u32,

    /// Do not mirror the camera image
    #[arg(long)]
    pub no_mirror: bool,

    /// Cursor source
    #[arg(long, value_enum, default_value = "contour")]
    pub input: InputMode,

    /// Landmark model command line, e.g. "python3 hand_detect.py" (required for --input model)
    #[arg(long)]
    pub model_cmd: Option<String>,

    /// Minimum hand score accepted from the landmark model
    #[arg(long, default_value_t = 0.5)]
    pub min_confidence: f32,

    /// Force a finger-state rule instead of the one the source asks for
    #[arg(long, value_enum)]
    pub finger_rule: Option<FingerRule>,

    /// What a frame without a hand does to an unfinished stroke
    #[arg(long, value_enum, default_value = "bridge")]
    pub gap: GapPolicy,

    /// Brush thickness in pixels
    #[arg(long, default_value_t = 4)]
    pub thickness: u32,

    /// Eraser radius in pixels
    #[arg(long, default_value_t = 30)]
    pub erase_radius: i32,

    /// Lower HSV skin bound as "h,s,v"
    #[arg(long, value_parser = parse_triple, default_value = "0,30,60")]
    pub skin_lower: [u8; 3],

    /// Upper HSV skin bound as "h,s,v"
    #[arg(long, value_parser = parse_triple, default_value = "20,255,255")]
    pub skin_upper: [u8; 3],

    /// Smallest contour area accepted as a hand (px²)
    #[arg(long, default_value_t = 5_000.0)]
    pub min_area: f64,

    /// Largest contour area accepted as a hand (px²)
    #[arg(long, default_value_t = 50_000.0)]
    pub max_area: f64,

    /// Minimum convexity defect depth (px)
    #[arg(long, default_value_t = 8.0)]
    pub min_defect_depth: f64,

    /// Largest valley angle between two fingers (degrees)
    #[arg(long, default_value_t = 90.0)]
    pub max_valley_angle: f64,
}

fn parse_triple(s: &str) -> std::result::Result<[u8; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected three comma separated values, got {s:?}"));
    }
    let mut out = [0u8; 3];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part.parse().map_err(|e| format!("{part:?}: {e}"))?;
    }
    Ok(out)
}

impl Cli {
    /// Validate and flatten into a `Config`.
    pub fn into_config(self) -> Result<Config> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Config("capture size must be non-zero".into()));
        }
        if self.thickness == 0 {
            return Err(Error::Config("--thickness must be at least 1".into()));
        }
        if self.erase_radius <= 0 {
            return Err(Error::Config("--erase-radius must be positive".into()));
        }
        if self.min_area >= self.max_area {
            return Err(Error::Config(format!(
                "--min-area ({}) must be below --max-area ({})",
                self.min_area, self.max_area
            )));
        }
        if !(0.0..=180.0).contains(&self.max_valley_angle) {
            return Err(Error::Config("--max-valley-angle must lie in 0..=180".into()));
        }
        if (0..3).any(|i| self.skin_lower[i] > self.skin_upper[i]) {
            return Err(Error::Config("--skin-lower must not exceed --skin-upper".into()));
        }

        let model = match self.model_cmd {
            Some(cmd) => {
                let command: Vec<String> = cmd.split_whitespace().map(String::from).collect();
                if command.is_empty() {
                    return Err(Error::Config("--model-cmd is empty".into()));
                }
                Some(ModelSettings {
                    command,
                    min_confidence: self.min_confidence.clamp(0.0, 1.0),
                })
            }
            None => None,
        };
        if self.input == InputMode::Model && model.is_none() {
            return Err(Error::Config("--input model needs --model-cmd".into()));
        }

        Ok(Config {
            capture: CaptureSettings {
                camera: self.camera,
                width: self.width,
                height: self.height,
                mirror: !self.no_mirror,
            },
            input: self.input,
            model,
            finger_rule: self.finger_rule,
            gap: self.gap,
            brush: BrushSettings {
                thickness: self.thickness,
                erase_radius: self.erase_radius,
            },
            extractor: ExtractorSettings {
                skin: SkinBand { lower: self.skin_lower, upper: self.skin_upper },
                min_area: self.min_area,
                max_area: self.max_area,
                min_defect_depth: self.min_defect_depth,
                max_valley_angle: self.max_valley_angle,
            },
        })
    }
}
