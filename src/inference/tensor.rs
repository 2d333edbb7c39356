//! Fixed-size classifier input: 224×224 RGB, HWC order, values in [0, 1].

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

use super::InferenceError;

pub const INPUT_SIZE: u32 = 224;
pub const CHANNELS: usize = 3;
const TENSOR_LEN: usize = (INPUT_SIZE * INPUT_SIZE) as usize * CHANNELS;

#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    data: Vec<f32>,
}

impl ImageTensor {
    /// Wrap a pre-normalized buffer, checking its length and value range.
    pub fn new(data: Vec<f32>) -> Result<Self, InferenceError> {
        if data.len() != TENSOR_LEN {
            return Err(InferenceError::InvalidTensor(format!(
                "expected {} values ({}x{}x{}), got {}",
                TENSOR_LEN,
                INPUT_SIZE,
                INPUT_SIZE,
                CHANNELS,
                data.len()
            )));
        }
        if let Some(i) = data.iter().position(|v| !(0.0..=1.0).contains(v)) {
            return Err(InferenceError::InvalidTensor(format!(
                "value {} at index {} is outside [0, 1]",
                data[i], i
            )));
        }
        Ok(Self { data })
    }

    /// Resize (bilinear) to the model input size and scale to [0, 1].
    pub fn from_image(img: &DynamicImage) -> Self {
        let rgb = img
            .resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Triangle)
            .to_rgb8();
        let data = rgb.as_raw().iter().map(|&v| f32::from(v) / 255.0).collect();
        Self { data }
    }

    /// Decode uploaded image bytes (any format `image` understands).
    pub fn decode(bytes: &[u8]) -> Result<Self, InferenceError> {
        let img = image::load_from_memory(bytes)?;
        Ok(Self::from_image(&img))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    fn pixel(&self, x: u32, y: u32) -> [f32; 3] {
        let i = (y * INPUT_SIZE + x) as usize * CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(INPUT_SIZE, INPUT_SIZE, |x, y| {
            let [r, g, b] = self.pixel(x, y);
            Rgb([to_u8(r), to_u8(g), to_u8(b)])
        })
    }

    /// Lossless re-encode for backends that take an image file.
    pub fn to_png(&self) -> Result<Vec<u8>, InferenceError> {
        let mut buf = Cursor::new(Vec::new());
        self.to_rgb_image().write_to(&mut buf, ImageFormat::Png)?;
        Ok(buf.into_inner())
    }

    #[cfg(test)]
    pub(crate) fn blank() -> Self {
        Self {
            data: vec![0.0; TENSOR_LEN],
        }
    }
}

fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}
