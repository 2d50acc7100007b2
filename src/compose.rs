// Canvas compositor: punch the strokes' shape out of the live frame, then fill
// the hole with the stroke colors. Unlike alpha blending this never dims a
// stroke against the video.

use image::{GrayImage, Luma, RgbImage, imageops};

use crate::error::{Error, Result};

/// Mask luma above this counts as "drawn".
pub const DRAWN_THRESHOLD: u8 = 50;

/// 0 where the mask is drawn, 255 where it is background.
pub fn inverse_mask(mask: &RgbImage) -> GrayImage {
    let mut inv = imageops::grayscale(mask);
    for p in inv.pixels_mut() {
        *p = if p.0[0] > DRAWN_THRESHOLD { Luma([0]) } else { Luma([255]) };
    }
    inv
}

/// `(frame AND inverse) OR mask`, as a new image. Neither input is touched.
pub fn composite(frame: &RgbImage, mask: &RgbImage) -> Result<RgbImage> {
    Error::check_shape(mask.dimensions(), frame.dimensions())?;

    let inv = inverse_mask(mask);
    let mut out = frame.clone();
    for ((px, hole), stroke) in out.pixels_mut().zip(inv.pixels()).zip(mask.pixels()) {
        let keep = hole.0[0];
        for c in 0..3 {
            px.0[c] = (px.0[c] & keep) | stroke.0[c];
        }
    }
    Ok(out)
}
