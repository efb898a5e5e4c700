//! Image preparation for classifier input

use crate::config::{CropMode, Normalization, VisionConfig};
use crate::error::VisionError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};

pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Fit an image to `size` (width, height) using `mode`.
pub fn fit_to_input(image: &RgbImage, size: (u32, u32), mode: CropMode) -> RgbImage {
    let (target_w, target_h) = size;
    let (width, height) = image.dimensions();

    match mode {
        CropMode::CenterCrop => {
            // Largest centred region with the target aspect ratio
            let target_aspect = target_w as f64 / target_h as f64;
            let (crop_w, crop_h) = if width as f64 / height as f64 > target_aspect {
                (((height as f64 * target_aspect).round() as u32).clamp(1, width), height)
            } else {
                (width, ((width as f64 / target_aspect).round() as u32).clamp(1, height))
            };
            let x = (width - crop_w) / 2;
            let y = (height - crop_h) / 2;
            let cropped = imageops::crop_imm(image, x, y, crop_w, crop_h).to_image();
            imageops::resize(&cropped, target_w, target_h, FilterType::Triangle)
        }
        CropMode::ScaleFit => {
            let scale = f64::min(
                target_w as f64 / width as f64,
                target_h as f64 / height as f64,
            );
            let scaled_w = ((width as f64 * scale).round() as u32).clamp(1, target_w);
            let scaled_h = ((height as f64 * scale).round() as u32).clamp(1, target_h);
            let scaled = imageops::resize(image, scaled_w, scaled_h, FilterType::Triangle);

            let mut canvas = RgbImage::from_pixel(target_w, target_h, Rgb([0, 0, 0]));
            let x = (target_w - scaled_w) / 2;
            let y = (target_h - scaled_h) / 2;
            imageops::overlay(&mut canvas, &scaled, x as i64, y as i64);
            canvas
        }
        CropMode::ScaleFill => imageops::resize(image, target_w, target_h, FilterType::Triangle),
    }
}

/// Convert an RGB image into a planar CHW `f32` tensor.
pub fn to_chw_tensor(image: &RgbImage, normalization: Normalization) -> Vec<f32> {
    let (width, height) = image.dimensions();
    let plane = (width as usize) * (height as usize);
    let mut tensor = vec![0.0f32; plane * 3];

    for (x, y, pixel) in image.enumerate_pixels() {
        let offset = (y as usize) * (width as usize) + x as usize;
        for channel in 0..3 {
            let value = pixel[channel] as f32 / 255.0;
            tensor[channel * plane + offset] = match normalization {
                Normalization::Unit => value,
                Normalization::ImageNet => (value - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel],
            };
        }
    }

    tensor
}

/// Produce the model input tensor `[3, H, W]` for `image`.
pub fn prepare_input(image: &DynamicImage, config: &VisionConfig) -> Result<Vec<f32>, VisionError> {
    let rgb = image.to_rgb8();
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(VisionError::Processing("Image has zero width or height".to_string()));
    }

    let fitted = fit_to_input(&rgb, config.input_size, config.crop_mode);
    Ok(to_chw_tensor(&fitted, config.normalization))
}
