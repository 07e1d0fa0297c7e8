//! Camera frame normalization.
//!
//! Upstream recorders disagree on image layout: live cameras deliver `u8` frames as
//! `(H, W, C)`, while dataset loaders often store `f32` frames in `[0, 1]` as `(C, H, W)`.
//! [`normalize_image`] folds both into the `u8` `(H, W, C)` layout the model consumes.

use ndarray::{Array3, ArrayD, Ix3};
use serde::{Deserialize, Serialize};

use crate::error::TransformError;

/// Number of colour channels in a canonical frame.
pub const IMAGE_CHANNELS: usize = 3;

/// A camera frame as delivered by the robot or a replay source.
///
/// Deserialization tries `U8` first, so float frames must be written with float
/// literals (`0.0`, not `0`); an all-integer payload is read as bytes and never scaled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawImage {
    /// Integer pixels already in `[0, 255]`.
    U8(ArrayD<u8>),
    /// Floating point pixels expected in `[0, 1]`.
    F32(ArrayD<f32>),
}

impl RawImage {
    pub fn shape(&self) -> &[usize] {
        match self {
            RawImage::U8(pixels) => pixels.shape(),
            RawImage::F32(pixels) => pixels.shape(),
        }
    }
}

impl From<Array3<u8>> for RawImage {
    fn from(pixels: Array3<u8>) -> Self {
        RawImage::U8(pixels.into_dyn())
    }
}

impl From<Array3<f32>> for RawImage {
    fn from(pixels: Array3<f32>) -> Self {
        RawImage::F32(pixels.into_dyn())
    }
}

/// Converts a frame to `u8` `(H, W, C)`.
///
/// Float pixels are scaled by 255 and truncated without clamping, so values outside
/// `[0, 1]` wrap around modulo 256. A leading axis of size 3 is taken to be the channel
/// axis and moved last; a channel-last image that is exactly 3 pixels tall is therefore
/// misread as channel-first. No resizing happens here.
pub fn normalize_image(image: &RawImage) -> Result<Array3<u8>, TransformError> {
    let shape = image.shape().to_vec();
    let pixels = match image {
        RawImage::U8(pixels) => pixels.clone(),
        RawImage::F32(pixels) => pixels.mapv(float_to_byte),
    };
    let pixels = pixels.into_dimensionality::<Ix3>().map_err(|_| {
        TransformError::shape(format!("expected a rank-3 image, got shape {shape:?}"))
    })?;

    if pixels.shape()[0] == IMAGE_CHANNELS {
        return Ok(pixels
            .permuted_axes([1, 2, 0])
            .as_standard_layout()
            .into_owned());
    }
    Ok(pixels)
}

fn float_to_byte(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    // Wraps instead of saturating.
    (255.0 * value).trunc() as i64 as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, IxDyn};

    #[test]
    fn u8_channel_last_passes_through() {
        let pixels = Array::from_shape_fn((4, 5, 3), |(h, w, c)| (h * 15 + w * 3 + c) as u8);
        let out = normalize_image(&RawImage::from(pixels.clone())).unwrap();
        assert_eq!(out, pixels);
    }

    #[test]
    fn float_pixels_are_scaled_to_bytes() {
        let pixels = Array3::<f32>::from_shape_vec(
            (2, 2, 3),
            vec![0.0, 0.5, 1.0, 0.25, 0.75, 0.1, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
        )
        .unwrap();
        let out = normalize_image(&RawImage::from(pixels)).unwrap();
        assert_eq!(out.shape(), &[2, 2, 3]);
        assert_eq!(out[[0, 0, 0]], 0);
        assert_eq!(out[[0, 0, 1]], 127);
        assert_eq!(out[[0, 0, 2]], 255);
        assert_eq!(out[[0, 1, 0]], 63);
        assert_eq!(out[[1, 1, 2]], 255);
    }

    #[test]
    fn channel_first_float_is_moved_to_channel_last() {
        let pixels = Array::from_shape_fn((3, 4, 6), |(c, _, _)| c as f32 / 2.0);
        let out = normalize_image(&RawImage::from(pixels)).unwrap();
        assert_eq!(out.shape(), &[4, 6, 3]);
        assert_eq!(out[[2, 5, 0]], 0);
        assert_eq!(out[[2, 5, 1]], 127);
        assert_eq!(out[[2, 5, 2]], 255);
    }

    #[test]
    fn out_of_range_floats_wrap() {
        let pixels = Array3::from_shape_vec((1, 1, 3), vec![2.0, -0.5, f32::NAN]).unwrap();
        let out = normalize_image(&RawImage::from(pixels)).unwrap();
        // 510 -> 254, -127 -> 129
        assert_eq!(out.as_slice().unwrap(), &[254, 129, 0]);
    }

    #[test]
    fn integer_literals_deserialize_as_bytes() {
        let ints: RawImage =
            serde_json::from_str(r#"{"v":1,"dim":[1,1,3],"data":[0,1,0]}"#).unwrap();
        assert!(matches!(ints, RawImage::U8(_)));
        assert_eq!(normalize_image(&ints).unwrap().as_slice().unwrap(), &[0, 1, 0]);

        let floats: RawImage =
            serde_json::from_str(r#"{"v":1,"dim":[1,1,3],"data":[0.0,1.0,0.0]}"#).unwrap();
        assert!(matches!(floats, RawImage::F32(_)));
        assert_eq!(normalize_image(&floats).unwrap().as_slice().unwrap(), &[0, 255, 0]);
    }

    #[test]
    fn three_pixel_tall_image_is_treated_as_channel_first() {
        let pixels = Array3::<u8>::zeros((3, 8, 3));
        let out = normalize_image(&RawImage::from(pixels)).unwrap();
        assert_eq!(out.shape(), &[8, 3, 3]);
    }

    #[test]
    fn non_rank_three_image_is_a_shape_error() {
        let pixels = ArrayD::<u8>::zeros(IxDyn(&[4, 4]));
        let err = normalize_image(&RawImage::U8(pixels)).unwrap_err();
        assert!(matches!(err, TransformError::Shape(_)));
    }
}
