//! Image preprocessing for ONNX model inference.
//!
//! Both model families consume RGB NCHW f32 tensors but normalize
//! differently:
//! - SigLIP: pixels scaled to [-1, 1] via (pixel/255 - 0.5) / 0.5
//! - MobileNet (ImageNet): per-channel mean/std normalization

use image::DynamicImage;
use ndarray::Array4;

/// Number of color channels (RGB).
const CHANNELS: usize = 3;

/// SigLIP normalization (single value for all channels).
pub const SIGLIP_MEAN: [f32; 3] = [0.5, 0.5, 0.5];
pub const SIGLIP_STD: [f32; 3] = [0.5, 0.5, 0.5];

/// ImageNet normalization used by the MobileNetV2 classifier.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Preprocess an image into a `[1, 3, size, size]` NCHW tensor.
///
/// Resizes to `image_size × image_size`, converts to RGB, and applies
/// per-channel `(pixel/255 - mean) / std` normalization.
pub fn preprocess(
    image: &DynamicImage,
    image_size: u32,
    mean: [f32; 3],
    std: [f32; 3],
) -> Array4<f32> {
    let resized = image.resize_exact(
        image_size,
        image_size,
        image::imageops::FilterType::Lanczos3,
    );
    let rgb = resized.to_rgb8();

    let size = image_size as usize;
    let mut tensor = Array4::<f32>::zeros((1, CHANNELS, size, size));

    // Access raw RGB bytes and the tensor slice directly to avoid
    // per-pixel bounds checking from get_pixel() and 4D indexing.
    let raw = rgb.as_raw();
    let tensor_data = tensor.as_slice_mut().unwrap();
    for (i, pixel) in raw.chunks_exact(3).enumerate() {
        let y = i / size;
        let x = i % size;
        for (c, &val) in pixel.iter().enumerate() {
            // NCHW layout: offset = c * size * size + y * size + x
            let idx = c * size * size + y * size + x;
            tensor_data[idx] = (val as f32 / 255.0 - mean[c]) / std[c];
        }
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    #[test]
    fn test_preprocess_shape_224() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(640, 480));
        let tensor = preprocess(&img, 224, SIGLIP_MEAN, SIGLIP_STD);
        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
    }

    #[test]
    fn test_preprocess_shape_384() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(640, 480));
        let tensor = preprocess(&img, 384, SIGLIP_MEAN, SIGLIP_STD);
        assert_eq!(tensor.shape(), &[1, 3, 384, 384]);
    }

    #[test]
    fn test_siglip_normalization_range() {
        // White image (255, 255, 255) -> (255/255 - 0.5) / 0.5 = 1.0
        let img =
            DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, image::Rgb([255, 255, 255])));
        let tensor = preprocess(&img, 224, SIGLIP_MEAN, SIGLIP_STD);
        let max_val = tensor.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        assert!((max_val - 1.0).abs() < 0.01);

        // Black image (0, 0, 0) -> (0/255 - 0.5) / 0.5 = -1.0
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, image::Rgb([0, 0, 0])));
        let tensor = preprocess(&img, 224, SIGLIP_MEAN, SIGLIP_STD);
        let min_val = tensor.iter().cloned().fold(f32::INFINITY, f32::min);
        assert!((min_val - (-1.0)).abs() < 0.01);
    }

    #[test]
    fn test_imagenet_normalization_differs_per_channel() {
        let img =
            DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, image::Rgb([128, 128, 128])));
        let tensor = preprocess(&img, 224, IMAGENET_MEAN, IMAGENET_STD);
        let r = tensor[[0, 0, 0, 0]];
        let g = tensor[[0, 1, 0, 0]];
        let b = tensor[[0, 2, 0, 0]];
        assert!(r != g && g != b, "channel means/stds differ: {r} {g} {b}");
    }
}
