//! Model input tensor construction.
//!
//! The species model consumes raw pixel intensities: each channel value is
//! the 0..=255 integer converted to `f32`, with no scaling and no mean
//! subtraction. Images are resized straight to a square, so the aspect ratio
//! is not preserved.

use crate::config::DEFAULT_INPUT_SIZE;
use crate::error::ClassifierError;
use image::imageops::FilterType;
use image::DynamicImage;

/// Number of colour channels in the tensor (R, G, B).
pub const CHANNELS: usize = 3;

/// Input tensor of logical shape `[1, size, size, 3]`, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    data: Vec<f32>,
    size: u32,
}

impl ImageTensor {
    /// Build a tensor at the default 224x224 resolution.
    pub fn from_image(image: &DynamicImage) -> Result<Self, ClassifierError> {
        Self::from_image_with_size(image, DEFAULT_INPUT_SIZE)
    }

    pub fn from_image_with_size(
        image: &DynamicImage,
        target_size: u32,
    ) -> Result<Self, ClassifierError> {
        if target_size == 0 {
            return Err(ClassifierError::InvalidInput(
                "target size must be non-zero".to_string(),
            ));
        }
        if image.width() == 0 || image.height() == 0 {
            return Err(ClassifierError::InvalidInput(format!(
                "image has no pixels ({}x{})",
                image.width(),
                image.height()
            )));
        }

        // Alpha is dropped here.
        let rgb = if image.width() == target_size && image.height() == target_size {
            image.to_rgb8()
        } else {
            image
                .resize_exact(target_size, target_size, FilterType::Triangle)
                .to_rgb8()
        };

        let side = target_size as usize;
        let mut data = Vec::with_capacity(side * side * CHANNELS);
        for pixel in rgb.pixels() {
            data.push(pixel[0] as f32);
            data.push(pixel[1] as f32);
            data.push(pixel[2] as f32);
        }

        Ok(Self {
            data,
            size: target_size,
        })
    }

    /// Side length of the square input.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn shape(&self) -> [usize; 4] {
        let side = self.size as usize;
        [1, side, side, CHANNELS]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// The `[r, g, b]` values stored for pixel `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 3]> {
        if x >= self.size || y >= self.size {
            return None;
        }
        let offset = (y as usize * self.size as usize + x as usize) * CHANNELS;
        Some([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ])
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    #[test]
    fn test_shape_and_length() {
        let image = DynamicImage::ImageRgb8(gradient(640, 480));
        let tensor = ImageTensor::from_image(&image).unwrap();

        assert_eq!(tensor.shape(), [1, 224, 224, 3]);
        assert_eq!(tensor.as_slice().len(), 224 * 224 * 3);
    }

    #[test]
    fn test_identity_on_target_size() {
        let source = gradient(224, 224);
        let tensor = ImageTensor::from_image(&DynamicImage::ImageRgb8(source.clone())).unwrap();

        for (x, y, pixel) in source.enumerate_pixels() {
            let expected = [pixel[0] as f32, pixel[1] as f32, pixel[2] as f32];
            assert_eq!(tensor.pixel(x, y), Some(expected), "pixel ({x}, {y})");
        }
    }

    #[test]
    fn test_values_are_raw_pixels() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 80, Rgb([255, 0, 128])));
        let tensor = ImageTensor::from_image(&image).unwrap();

        assert!(tensor.as_slice().iter().all(|v| (0.0..=255.0).contains(v)));
        assert_eq!(tensor.pixel(0, 0), Some([255.0, 0.0, 128.0]));
        assert_eq!(tensor.pixel(223, 223), Some([255.0, 0.0, 128.0]));
    }

    #[test]
    fn test_alpha_is_ignored() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            224,
            224,
            Rgba([10, 20, 30, 0]),
        ));
        let tensor = ImageTensor::from_image(&image).unwrap();

        assert_eq!(tensor.pixel(100, 100), Some([10.0, 20.0, 30.0]));
    }

    #[test]
    fn test_custom_size() {
        let image = DynamicImage::ImageRgb8(gradient(32, 16));
        let tensor = ImageTensor::from_image_with_size(&image, 8).unwrap();

        assert_eq!(tensor.shape(), [1, 8, 8, 3]);
        assert_eq!(tensor.pixel(8, 0), None);
    }

    #[test]
    fn test_invalid_sizes() {
        let image = DynamicImage::ImageRgb8(gradient(4, 4));
        assert!(matches!(
            ImageTensor::from_image_with_size(&image, 0),
            Err(ClassifierError::InvalidInput(_))
        ));

        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(matches!(
            ImageTensor::from_image(&empty),
            Err(ClassifierError::InvalidInput(_))
        ));
    }
}
