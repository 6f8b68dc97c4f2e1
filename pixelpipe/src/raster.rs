//! Output and input image types of the pipeline.
//!
//! Decoding produces values of any type implementing [`Raster`],
//! and encoding consumes any [`SampleSource`].
//! [`SampleBuffer`] implements both.
//! With the `image` feature, so does [`image::DynamicImage`].

use std::borrow::Cow;

/// An image type which can be built from 8-bit display samples.
pub trait Raster: Sized {
    /// Build a raster from row-major display samples,
    /// with `channels` interleaved samples per pixel (1 or 3).
    ///
    /// Returns `None` if the samples do not fit the given dimensions.
    fn from_display_samples(
        width: u32,
        height: u32,
        channels: u16,
        samples: Vec<u8>,
    ) -> Option<Self>;
}

/// An image which can be written into pixel data.
pub trait SampleSource {
    /// The number of columns.
    fn width(&self) -> u32;

    /// The number of rows.
    fn height(&self) -> u32;

    /// The number of interleaved samples per pixel.
    fn channels(&self) -> u16;

    /// The number of bits of each sample.
    fn bit_depth(&self) -> u16;

    /// The row-major samples of the image,
    /// `width * height * channels` in total.
    fn sample_data(&self) -> Cow<'_, [u16]>;
}

/// A plain buffer of unsigned samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBuffer {
    width: u32,
    height: u32,
    channels: u16,
    bit_depth: u16,
    samples: Vec<u16>,
}

impl SampleBuffer {
    /// Create a sample buffer.
    ///
    /// Returns `None` if `channels` is not 1 or 3,
    /// if `bit_depth` is not 8 or 16,
    /// if the number of samples does not match the dimensions,
    /// or if a sample does not fit in the bit depth.
    pub fn new(
        width: u32,
        height: u32,
        channels: u16,
        bit_depth: u16,
        samples: Vec<u16>,
    ) -> Option<Self> {
        if channels != 1 && channels != 3 {
            return None;
        }
        if bit_depth != 8 && bit_depth != 16 {
            return None;
        }
        let len = width as usize * height as usize * channels as usize;
        if samples.len() != len {
            return None;
        }
        if bit_depth == 8 && samples.iter().any(|&s| s > 0xFF) {
            return None;
        }
        Some(SampleBuffer {
            width,
            height,
            channels,
            bit_depth,
            samples,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn channels(&self) -> u16 {
        self.channels
    }

    #[inline]
    pub fn bit_depth(&self) -> u16 {
        self.bit_depth
    }

    /// The row-major, pixel-interleaved samples.
    #[inline]
    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    /// The samples of the pixel at the given position.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u16]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let channels = self.channels as usize;
        let start = (y as usize * self.width as usize + x as usize) * channels;
        self.samples.get(start..start + channels)
    }

    pub fn into_samples(self) -> Vec<u16> {
        self.samples
    }
}

impl Raster for SampleBuffer {
    fn from_display_samples(
        width: u32,
        height: u32,
        channels: u16,
        samples: Vec<u8>,
    ) -> Option<Self> {
        SampleBuffer::new(
            width,
            height,
            channels,
            8,
            samples.into_iter().map(u16::from).collect(),
        )
    }
}

impl SampleSource for SampleBuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn bit_depth(&self) -> u16 {
        self.bit_depth
    }

    fn sample_data(&self) -> Cow<'_, [u16]> {
        Cow::Borrowed(&self.samples)
    }
}

#[cfg(feature = "image")]
mod dynamic_image {
    use std::borrow::Cow;

    use image::{ColorType, DynamicImage, GenericImageView, ImageBuffer, Luma, Rgb};

    use super::{Raster, SampleSource};

    impl Raster for DynamicImage {
        fn from_display_samples(
            width: u32,
            height: u32,
            channels: u16,
            samples: Vec<u8>,
        ) -> Option<Self> {
            match channels {
                1 => ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(width, height, samples)
                    .map(DynamicImage::ImageLuma8),
                3 => ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(width, height, samples)
                    .map(DynamicImage::ImageRgb8),
                _ => None,
            }
        }
    }

    /// Alpha channels are dropped.
    /// Floating point images report a bit depth of 32,
    /// which the encoder rejects.
    impl SampleSource for DynamicImage {
        fn width(&self) -> u32 {
            GenericImageView::width(self)
        }

        fn height(&self) -> u32 {
            GenericImageView::height(self)
        }

        fn channels(&self) -> u16 {
            match self.color() {
                ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16 => 1,
                ColorType::Rgb8
                | ColorType::Rgba8
                | ColorType::Rgb16
                | ColorType::Rgba16
                | ColorType::Rgb32F
                | ColorType::Rgba32F => 3,
                _ => 0,
            }
        }

        fn bit_depth(&self) -> u16 {
            match self.color() {
                ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => 8,
                ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16 => 16,
                ColorType::Rgb32F | ColorType::Rgba32F => 32,
                _ => 0,
            }
        }

        fn sample_data(&self) -> Cow<'_, [u16]> {
            let samples: Vec<u16> = match (self.channels(), self.bit_depth()) {
                (1, 8) => self.to_luma8().into_raw().into_iter().map(u16::from).collect(),
                (1, 16) => self.to_luma16().into_raw(),
                (3, 8) => self.to_rgb8().into_raw().into_iter().map(u16::from).collect(),
                (3, 16) => self.to_rgb16().into_raw(),
                _ => Vec::new(),
            };
            Cow::Owned(samples)
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_buffer_validation() {
        assert!(SampleBuffer::new(2, 2, 1, 8, vec![0; 4]).is_some());
        assert!(SampleBuffer::new(2, 2, 1, 8, vec![0; 5]).is_none());
        assert!(SampleBuffer::new(2, 2, 2, 8, vec![0; 8]).is_none());
        assert!(SampleBuffer::new(2, 2, 1, 12, vec![0; 4]).is_none());
        assert!(SampleBuffer::new(1, 1, 1, 8, vec![256]).is_none());
        assert!(SampleBuffer::new(1, 1, 1, 16, vec![256]).is_some());
    }

    #[test]
    fn pixel_access() {
        let buffer = SampleBuffer::new(2, 2, 3, 8, (0..12).collect()).unwrap();
        assert_eq!(buffer.pixel(1, 0), Some(&[3, 4, 5][..]));
        assert_eq!(buffer.pixel(0, 1), Some(&[6, 7, 8][..]));
        assert_eq!(buffer.pixel(2, 0), None);
    }

    #[test]
    fn raster_from_display_samples() {
        let raster = SampleBuffer::from_display_samples(3, 1, 1, vec![1, 2, 255]).unwrap();
        assert_eq!(raster.samples(), &[1, 2, 255]);
        assert_eq!(raster.bit_depth(), 8);
        assert!(SampleBuffer::from_display_samples(3, 2, 1, vec![1, 2, 255]).is_none());
    }
}
