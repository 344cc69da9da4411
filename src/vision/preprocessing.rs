use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::{self, separable_filter_equal};
use imageproc::morphology::{grayscale_dilate, Mask};

use crate::models::ResolvedRoi;

/// Ink value in a conditioned (binary) image
pub const INK: u8 = 255;

/// Cut the resolved rectangle out of the frame
pub fn crop(img: &DynamicImage, roi: &ResolvedRoi) -> DynamicImage {
    img.crop_imm(roi.x1, roi.y1, roi.width(), roi.height())
}

/// Convert image to grayscale using BT.601 luma weights
/// (0.299/0.587/0.114 in 2^14 fixed point, round-half-up).
///
/// Not `DynamicImage::to_luma8`, which uses BT.709.
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    if let DynamicImage::ImageLuma8(gray) = img {
        return gray.clone();
    }

    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut gray = GrayImage::new(width, height);
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let luma = (r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868 + 8192) >> 14;
        gray.put_pixel(x, y, Luma([luma as u8]));
    }
    gray
}

/// Edge-preserving smoothing over a `diameter` x `diameter` window
pub fn bilateral_filter(
    img: &GrayImage,
    diameter: u32,
    sigma_color: f32,
    sigma_space: f32,
) -> GrayImage {
    filter::bilateral_filter(img, diameter, sigma_color, sigma_space)
}

/// Local-mean binarization with inverted polarity.
///
/// The threshold of each pixel is the Gaussian-weighted mean of its
/// `block_size` x `block_size` neighbourhood minus `offset`. Pixels at or below
/// it (darker than their surroundings) become [`INK`], everything else 0.
/// The mean pads by edge continuity.
pub fn adaptive_threshold_inv(img: &GrayImage, block_size: u32, offset: f64) -> GrayImage {
    let (width, height) = img.dimensions();
    let sigma = 0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let kernel = gaussian_kernel(block_size, sigma);
    let local_mean = separable_filter_equal(img, &kernel);
    let delta = offset.floor() as i32;

    let mut output = GrayImage::new(width, height);
    for (x, y, pixel) in img.enumerate_pixels() {
        let mean = local_mean.get_pixel(x, y)[0] as i32;
        let value = if pixel[0] as i32 - mean <= -delta { INK } else { 0 };
        output.put_pixel(x, y, Luma([value]));
    }
    output
}

/// One pass of binary dilation with a 2x2 square.
///
/// The element is anchored at its bottom-right cell, so each output pixel is
/// the maximum of itself and its left, upper and upper-left neighbours.
pub fn dilate_2x2(img: &GrayImage) -> GrayImage {
    let element = GrayImage::from_pixel(2, 2, Luma([INK]));
    grayscale_dilate(img, &Mask::from_image(&element, 1, 1))
}

/// True if any pixel of a conditioned image is ink
pub fn has_ink(img: &GrayImage) -> bool {
    img.pixels().any(|p| p[0] != 0)
}

/// Invert a binary image back to dark glyphs on a light background
pub fn invert(img: &GrayImage) -> GrayImage {
    let mut inverted = img.clone();
    image::imageops::invert(&mut inverted);
    inverted
}

/// Normalized 1-D Gaussian of exactly `size` taps
fn gaussian_kernel(size: u32, sigma: f32) -> Vec<f32> {
    let half = (size as f32 - 1.0) / 2.0;
    let coeff = -0.5 / (sigma * sigma);
    let kernel: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - half;
            (d * d * coeff).exp()
        })
        .collect();
    let total: f32 = kernel.iter().sum();
    kernel.into_iter().map(|k| k / total).collect()
}
