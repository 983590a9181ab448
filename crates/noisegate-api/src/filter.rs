use std::io::Cursor;

use image::{imageops, DynamicImage, ImageFormat, RgbImage};

/// Blur radii above this are clamped; the filter never runs unbounded.
pub const MAX_STRENGTH: f32 = 5.0;

/// Apply the denoising blur. The image is normalized to 3-channel RGB
/// first (alpha dropped). A clamped strength of zero is the identity:
/// the RGB conversion is returned pixel-for-pixel unchanged.
pub fn denoise(image: &DynamicImage, strength: f32) -> RgbImage {
    let rgb = image.to_rgb8();
    let sigma = clamp_strength(strength);
    if sigma <= 0.0 {
        return rgb;
    }
    imageops::blur(&rgb, sigma)
}

/// Clamp to `[0.0, MAX_STRENGTH]`; non-finite input counts as zero.
pub fn clamp_strength(strength: f32) -> f32 {
    if !strength.is_finite() {
        return 0.0;
    }
    strength.clamp(0.0, MAX_STRENGTH)
}

pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba, RgbaImage};

    fn gradient() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(16, 16, |x, y| {
            Rgb([(x * 16) as u8, (y * 16) as u8, ((x + y) * 8) as u8])
        }))
    }

    #[test]
    fn zero_strength_is_identity() {
        let img = gradient();
        let out = denoise(&img, 0.0);
        assert_eq!(out.as_raw(), img.to_rgb8().as_raw());
    }

    #[test]
    fn negative_strength_clamps_to_identity() {
        let img = gradient();
        assert_eq!(denoise(&img, -3.0).as_raw(), denoise(&img, 0.0).as_raw());
    }

    #[test]
    fn oversized_strength_clamps_to_max() {
        let img = gradient();
        assert_eq!(denoise(&img, 10.0).as_raw(), denoise(&img, 5.0).as_raw());
    }

    #[test]
    fn positive_strength_changes_pixels() {
        let img = gradient();
        assert_ne!(denoise(&img, 2.0).as_raw(), img.to_rgb8().as_raw());
    }

    #[test]
    fn alpha_is_dropped_before_filtering() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 128])));
        let out = denoise(&rgba, 0.0);
        assert_eq!(out.dimensions(), (4, 4));
        assert_eq!(out.get_pixel(0, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn png_round_trip() {
        let out = denoise(&gradient(), 1.0);
        let png = encode_png(&out).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(decoded.as_raw(), out.as_raw());
    }
}
