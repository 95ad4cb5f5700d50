use crate::error::{Result, TrackerError};
use image::{DynamicImage, Rgb, Rgb32FImage, RgbImage};
use std::path::Path;

/// A validated three-channel colour frame, stored as normalised `[0, 1]` floats.
#[derive(Debug, Clone)]
pub struct Frame {
    pub pixels: Rgb32FImage,
}

impl Frame {
    /// Load a frame from disk and validate its colour layout.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let img = image::open(path)?;
        Self::from_dynamic_image(&img)
    }

    /// Accepts any three-channel colour image; grey, grey+alpha and RGBA inputs are rejected.
    pub fn from_dynamic_image(img: &DynamicImage) -> Result<Self> {
        let colour = img.color();
        if colour.channel_count() != 3 || colour.has_alpha() {
            return Err(TrackerError::InvalidInput(format!(
                "expected a 3-channel colour frame, got {:?}",
                colour
            )));
        }
        Self::from_rgb32f(img.to_rgb32f())
    }

    pub fn from_rgb8(img: &RgbImage) -> Result<Self> {
        Self::from_rgb32f(DynamicImage::ImageRgb8(img.clone()).to_rgb32f())
    }

    fn from_rgb32f(pixels: Rgb32FImage) -> Result<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(TrackerError::InvalidInput("frame has zero extent".to_string()));
        }
        Ok(Self { pixels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Synthetic scene: a filled square of `colour` on a solid `background`.
    pub fn with_square(
        width: u32,
        height: u32,
        top_left: (u32, u32),
        side: u32,
        colour: [u8; 3],
        background: [u8; 3],
    ) -> Result<Self> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            let inside = x >= top_left.0 && x < top_left.0 + side && y >= top_left.1 && y < top_left.1 + side;
            if inside {
                Rgb(colour)
            } else {
                Rgb(background)
            }
        });
        Self::from_rgb8(&img)
    }

    /// Converts back to 8-bit RGB for annotation and saving.
    pub fn to_rgb8(&self) -> RgbImage {
        DynamicImage::ImageRgb32F(self.pixels.clone()).to_rgb8()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, RgbaImage};

    #[test]
    fn rejects_single_channel_frames() {
        let grey = DynamicImage::ImageLuma8(GrayImage::new(8, 8));
        assert!(matches!(
            Frame::from_dynamic_image(&grey),
            Err(TrackerError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_alpha_frames() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::new(8, 8));
        assert!(Frame::from_dynamic_image(&rgba).is_err());
    }

    #[test]
    fn rejects_empty_frames() {
        assert!(matches!(
            Frame::from_rgb8(&RgbImage::new(0, 0)),
            Err(TrackerError::InvalidInput(_))
        ));
        assert!(matches!(
            Frame::from_rgb8(&RgbImage::new(12, 0)),
            Err(TrackerError::InvalidInput(_))
        ));
        assert!(Frame::with_square(0, 10, (0, 0), 3, [255, 0, 0], [0, 0, 0]).is_err());
    }

    #[test]
    fn normalises_rgb_frames() {
        let frame = Frame::with_square(10, 10, (2, 2), 3, [255, 0, 0], [0, 0, 0]).unwrap();
        assert_eq!(frame.pixels.get_pixel(3, 3).0, [1.0, 0.0, 0.0]);
        assert_eq!(frame.pixels.get_pixel(0, 0).0, [0.0, 0.0, 0.0]);
        assert_eq!(frame.to_rgb8().get_pixel(2, 4).0, [255, 0, 0]);
    }
}
