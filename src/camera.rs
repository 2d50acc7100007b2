// Opens the camera and hands out RGB frames of a fixed, verified size.
// Visual expectation: when main.rs calls `next_frame()`, you get an RgbImage
// exactly `width x height`, ready for landmark extraction and compositing.

use crate::error::{Error, Result};

// Bring in nokhwa types for camera control.
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};

use image::RgbImage;
use tracing::info;

// A small wrapper around nokhwa::Camera so our main loop stays clean.
pub struct CameraCapture {
    cam: Camera,
    width: u32,
    height: u32,
}

impl CameraCapture {
    /// Open camera `index` at exactly `width x height`.
    /// A camera that settles on another resolution is a configuration error:
    /// the selection strips and the canvas are laid out for the requested size.
    pub fn new(index: u32, width: u32, height: u32) -> Result<Self> {
        // 1) Choose the device (0 = default webcam)
        let idx = CameraIndex::Index(index);

        let fmt = CameraFormat::new(
            Resolution::new(width, height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            30,                // target FPS
        );

        // 2) Ask for RGB frames, closest to our request.
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        // 3) Create the camera (this might fail if no device exists).
        let mut cam = Camera::new(idx, req)
            .map_err(|e| Error::CameraInit(format!("Create camera: {e}")))?;

        // 4) Start streaming frames from the camera.
        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("Open stream: {e}")))?;

        // 5) The stream might have picked something else; refuse to run on it.
        let actual = cam.resolution();
        Error::check_shape((actual.width(), actual.height()), (width, height))?;
        info!(index, width, height, "camera streaming");

        Ok(Self { cam, width, height })
    }

    /// Grab one frame (blocks until the camera has one) as RGB.
    pub fn next_frame(&mut self) -> Result<RgbImage> {
        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::CameraFrame(format!("Fetch frame: {e}")))?;

        // Decode to RGB; handles MJPEG/YUYV and friends.
        let decoded = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("Decode RGB: {e}")))?;

        // Rebuild through raw bytes so we are not tied to nokhwa's `image` version.
        let (w, h) = decoded.dimensions();
        Error::check_shape((w, h), (self.width, self.height))?;
        RgbImage::from_raw(w, h, decoded.into_raw())
            .ok_or_else(|| Error::CameraFrame("Decoded buffer too short".into()))
    }

    /// Report the resolution the camera is delivering.
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
