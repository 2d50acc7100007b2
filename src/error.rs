// One error type for the whole app.
// Every variant states *where* things went wrong; per-frame detection problems
// never reach here, they degrade to "no hand" inside the main loop.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Window init error: {0}")]
    WindowInit(String), // Creating the window failed

    #[error("Window update error: {0}")]
    WindowUpdate(String), // Updating the window buffer failed

    #[error("Camera init error: {0}")]
    CameraInit(String), // Opening/starting the camera failed

    #[error("Camera frame error: {0}")]
    CameraFrame(String), // Grabbing/decoding a frame failed

    #[error("Frame is {got_w}x{got_h}, expected {want_w}x{want_h}")]
    FrameShape {
        got_w: u32,
        got_h: u32,
        want_w: u32,
        want_h: u32,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Landmark model error: {0}")]
    Model(String),

    #[error("Landmark model sent malformed output: {0}")]
    ModelOutput(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shape check shared by the camera and the compositor.
    pub fn check_shape(got: (u32, u32), want: (u32, u32)) -> Result<()> {
        if got == want {
            return Ok(());
        }
        Err(Error::FrameShape {
            got_w: got.0,
            got_h: got.1,
            want_w: want.0,
            want_h: want.1,
        })
    }
}
