// What you SEE:
// • Live (mirrored) camera is the base image, with the tool header on top and
//   the color strip on the left.
// • Raise the index finger to draw; lower it to move without drawing.
//   Hover a header zone to pick a tool, a side zone to pick a color.
// • V cycles the view (live / canvas / inverse mask), O toggles the hand overlay.
// • ESC quits.

mod camera;
mod compose;
mod config;
mod draw;
mod engine;
mod error;
mod hud;
mod model;
mod posture;
mod regions;
mod shapes;
mod types;
mod vision;

use std::time::{Duration, Instant};

use clap::Parser;
use image::imageops;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use camera::CameraCapture;
use config::{Cli, InputMode};
use draw::Drawer;
use engine::Session;
use error::Error;
use hud::Hud;
use model::ModelLandmarks;
use posture::mouse_sample;
use types::Detection;
use vision::{ContourLandmarks, LandmarkSource};

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Cli::parse().into_config()?;
    info!(?config, "starting");

    /* --- Camera + window setup ---
       Visual: window opens with live camera feed. */
    let cap = config.capture;
    let mut cam = CameraCapture::new(cap.camera, cap.width, cap.height)?;
    let (w, h) = cam.resolution();
    let mut drawer = Drawer::new("Gesture Brush", w as usize, h as usize)?;

    /* --- Landmark source ---
       Mouse mode has none: the pointer stands in for the fingertip. */
    let mut source: Option<Box<dyn LandmarkSource>> = match config.input {
        InputMode::Contour => Some(Box::new(ContourLandmarks::new(config.extractor))),
        InputMode::Model => {
            let settings = config
                .model
                .as_ref()
                .ok_or_else(|| Error::Config("--input model needs --model-cmd".into()))?;
            Some(Box::new(ModelLandmarks::spawn(settings)?))
        }
        InputMode::Mouse => None,
    };
    let source_name = source.as_ref().map(|s| s.name()).unwrap_or("mouse");
    let rule = source
        .as_ref()
        .map(|s| config.finger_rule.unwrap_or_else(|| s.finger_rule()));
    info!(source = source_name, ?rule, gap = ?config.gap, "input ready");

    let mut session = Session::new(w, h, config.brush, config.gap);
    info!(brush = ?session.brush(), "canvas {w}x{h}");
    let mut hud = Hud::new(source_name);

    /* --- FPS --- */
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        /* 1) Grab a fresh live frame; mirror it like a selfie view. */
        let mut frame = cam.next_frame()?;
        if cap.mirror {
            imageops::flip_horizontal_in_place(&mut frame);
        }

        /* 2) Inputs */
        if drawer.v_pressed_once() {
            hud.view = hud.view.next();
            info!(view = hud.view.label(), "view changed");
        }
        if drawer.o_pressed_once() {
            hud.show_overlay = !hud.show_overlay;
        }

        /* 3) Landmarks -> cursor + posture.
           A failing source costs one frame, not the session. */
        let (detection, sample) = match (source.as_mut(), rule) {
            (Some(src), Some(rule)) => {
                let detection = src.extract(&frame).unwrap_or_else(|e| {
                    warn!("landmark extraction failed: {e}");
                    Detection::none()
                });
                debug!(hand = detection.is_hand(), points = detection.landmarks.len(), "detection");
                let sample = posture::sample(&detection.landmarks, rule);
                (detection, sample)
            }
            _ => (Detection::none(), mouse_sample(drawer.mouse_pos(), drawer.left_mouse_down())),
        };

        /* 4) Tool engine: previews go on the frame, commits on the canvas. */
        let action = session.step(sample, &mut frame);
        if action.commit.is_some() {
            debug!(?action, "committed");
        }

        /* 5) Cut the strokes into the frame, then HUD on top. */
        let composed = compose::composite(&frame, session.canvas())?;
        let screen = hud.render(composed, &session, &detection, sample);

        /* 6) Present to the window. */
        drawer.present(&screen)?;

        /* 7) FPS counter (log + HUD once per second) */
        frames_this_second += 1;
        let now = Instant::now();
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            let fps = frames_this_second as f32 / secs;
            info!("FPS: {:.1}", fps);
            hud.set_fps(fps);
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    Ok(())
}
