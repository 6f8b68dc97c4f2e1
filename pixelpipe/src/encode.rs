//! Top-level encoding: from sample sources to native pixel data.

use snafu::ensure;
use tracing::debug;

use crate::attribute::{self, BitsAllocated, PhotometricInterpretation, PixelRepresentation};
use crate::container::PixelContainer;
use crate::raster::SampleSource;
use crate::registry;
use crate::{
    EncapsulatedTargetSnafu, GeometryMismatchSnafu, InvalidArgumentSnafu, Result,
    UnsupportedPhotometricInterpretationSnafu,
};

/// Rec. 601 luma coefficients
const LUMA_R: f64 = 0.299;
const LUMA_G: f64 = 0.587;
const LUMA_B: f64 = 0.114;

/// Write a single frame into the object's pixel data.
///
/// See [`encode_frames`].
pub fn encode<C, S>(obj: &mut C, source: &S) -> Result<()>
where
    C: ?Sized + PixelContainer,
    S: SampleSource,
{
    encode_sources(obj, &[source as &dyn SampleSource])
}

/// Write the given frames into the object's pixel data,
/// replacing any previous pixel data.
///
/// The target layout is defined by the object's attributes:
/// bits allocated, pixel representation, rows, columns,
/// number of frames and photometric interpretation.
/// Each source sample is scaled linearly
/// from the full range of the source bit depth
/// to the full range of the target sample type.
/// Color sources written to a `MONOCHROME2` object are converted to luma,
/// and grayscale sources written to an `RGB` object are replicated.
///
/// The resulting pixel data is native,
/// in big endian if the object's transfer syntax is _Explicit VR Big Endian_,
/// and of length `rows * columns * frames * samples per pixel * bytes per sample`.
pub fn encode_frames<C, S>(obj: &mut C, sources: &[S]) -> Result<()>
where
    C: ?Sized + PixelContainer,
    S: SampleSource,
{
    let sources: Vec<&dyn SampleSource> =
        sources.iter().map(|s| s as &dyn SampleSource).collect();
    encode_sources(obj, &sources)
}

fn encode_sources<C>(obj: &mut C, sources: &[&dyn SampleSource]) -> Result<()>
where
    C: ?Sized + PixelContainer,
{
    attribute::validate_declared(obj)?;
    let bits = attribute::bits_allocated(obj)?;
    let representation = attribute::pixel_representation(obj)?;

    ensure!(
        !sources.is_empty(),
        InvalidArgumentSnafu {
            reason: "no frames to encode",
        }
    );
    for source in sources {
        check_source(*source)?;
    }

    let rows = attribute::rows(obj)?;
    let cols = attribute::cols(obj)?;
    let number_of_frames = attribute::number_of_frames(obj)?;

    for (i, source) in sources.iter().enumerate() {
        ensure!(
            source.width() == cols as u32 && source.height() == rows as u32,
            GeometryMismatchSnafu {
                details: format!(
                    "frame #{} is {}x{}, object is {}x{}",
                    i,
                    source.width(),
                    source.height(),
                    cols,
                    rows
                ),
            }
        );
    }
    ensure!(
        sources.len() == number_of_frames as usize,
        GeometryMismatchSnafu {
            details: format!(
                "{} frame(s) given, object has {}",
                sources.len(),
                number_of_frames
            ),
        }
    );

    let channels = target_channels(obj, sources[0].channels())?;
    if let Some(samples_per_pixel) = obj.samples_per_pixel() {
        ensure!(
            samples_per_pixel == channels,
            GeometryMismatchSnafu {
                details: format!(
                    "SamplesPerPixel is {}, photometric interpretation requires {}",
                    samples_per_pixel, channels
                ),
            }
        );
    }

    let ts = registry::normalize_uid(obj.transfer_syntax_uid());
    ensure!(
        !obj.is_compressed(),
        EncapsulatedTargetSnafu { ts_uid: ts }
    );
    let big_endian = registry::is_big_endian(ts);

    debug!(
        "Encoding {} frame(s) of {}x{}, {} channel(s), {} bits {:?}",
        sources.len(),
        cols,
        rows,
        channels,
        bits.bits(),
        representation
    );

    let expected_len = rows as usize
        * cols as usize
        * sources.len()
        * channels as usize
        * bits.bytes();
    let mut buffer = Vec::with_capacity(expected_len);
    let mut write = |value: i32| match (bits, big_endian) {
        (BitsAllocated::Eight, _) => buffer.push(value as u8),
        (BitsAllocated::Sixteen, false) => buffer.extend_from_slice(&(value as u16).to_le_bytes()),
        (BitsAllocated::Sixteen, true) => buffer.extend_from_slice(&(value as u16).to_be_bytes()),
    };

    for source in sources {
        let scale = Scale::new(source.bit_depth(), bits, representation);
        let source_channels = source.channels();
        let samples = source.sample_data();
        for pixel in samples.chunks_exact(source_channels as usize) {
            match (source_channels, channels) {
                (1, 3) => {
                    let value = scale.apply(pixel[0] as f64);
                    write(value);
                    write(value);
                    write(value);
                }
                (3, 1) => {
                    let luma = LUMA_R * pixel[0] as f64
                        + LUMA_G * pixel[1] as f64
                        + LUMA_B * pixel[2] as f64;
                    write(scale.apply(luma));
                }
                _ => {
                    for &sample in pixel {
                        write(scale.apply(sample as f64));
                    }
                }
            }
        }
    }
    debug_assert_eq!(buffer.len(), expected_len);

    obj.set_pixel_data(buffer);
    Ok(())
}

/// Check that the source describes a consistent image.
fn check_source(source: &dyn SampleSource) -> Result<()> {
    let (width, height) = (source.width(), source.height());
    ensure!(
        width > 0 && height > 0,
        InvalidArgumentSnafu {
            reason: format!("invalid image dimensions {}x{}", width, height),
        }
    );
    let channels = source.channels();
    ensure!(
        channels == 1 || channels == 3,
        InvalidArgumentSnafu {
            reason: format!("unsupported number of channels {}", channels),
        }
    );
    let bit_depth = source.bit_depth();
    ensure!(
        bit_depth == 8 || bit_depth == 16,
        InvalidArgumentSnafu {
            reason: format!("unsupported sample bit depth {}", bit_depth),
        }
    );
    let samples = source.sample_data();
    let expected = width as usize * height as usize * channels as usize;
    ensure!(
        samples.len() == expected,
        InvalidArgumentSnafu {
            reason: format!("expected {} samples, found {}", expected, samples.len()),
        }
    );
    let max = ((1u32 << bit_depth) - 1) as u16;
    if let Some(sample) = samples.iter().find(|&&s| s > max) {
        return InvalidArgumentSnafu {
            reason: format!("sample value {} exceeds {} bits", sample, bit_depth),
        }
        .fail();
    }
    Ok(())
}

/// Determine the number of samples per pixel to write.
fn target_channels<C>(obj: &C, source_channels: u16) -> Result<u16>
where
    C: ?Sized + PixelContainer,
{
    match obj.photometric_interpretation() {
        None => Ok(source_channels),
        Some(pi) => match PhotometricInterpretation::parse(pi) {
            Some(PhotometricInterpretation::Monochrome2) => Ok(1),
            Some(PhotometricInterpretation::Rgb) => Ok(3),
            _ => UnsupportedPhotometricInterpretationSnafu {
                pi: pi.trim_end().to_string(),
            }
            .fail(),
        },
    }
}

/// Linear mapping from the full range of the source samples
/// to the full range of the target sample type.
struct Scale {
    factor: f64,
    offset: f64,
}

impl Scale {
    fn new(source_bits: u16, bits: BitsAllocated, representation: PixelRepresentation) -> Self {
        let source_max = ((1u32 << source_bits) - 1) as f64;
        let (min, max) = crate::transform::sample_range(bits, representation);
        Scale {
            factor: (max - min) / source_max,
            offset: min,
        }
    }

    fn apply(&self, value: f64) -> i32 {
        (self.offset + value * self.factor).round() as i32
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;
    use crate::{Error, InMemContainer, SampleBuffer};

    struct NotAnImage;

    impl SampleSource for NotAnImage {
        fn width(&self) -> u32 {
            2
        }
        fn height(&self) -> u32 {
            2
        }
        fn channels(&self) -> u16 {
            1
        }
        fn bit_depth(&self) -> u16 {
            8
        }
        fn sample_data(&self) -> Cow<'_, [u16]> {
            Cow::Owned(vec![42])
        }
    }

    /// An 8-bit source with a sample out of its range.
    struct Overflowing;

    impl SampleSource for Overflowing {
        fn width(&self) -> u32 {
            2
        }
        fn height(&self) -> u32 {
            1
        }
        fn channels(&self) -> u16 {
            1
        }
        fn bit_depth(&self) -> u16 {
            8
        }
        fn sample_data(&self) -> Cow<'_, [u16]> {
            Cow::Owned(vec![255, 300])
        }
    }

    fn target(bits: u16, representation: u16, pi: &str) -> InMemContainer {
        InMemContainer::new()
            .with_rows(1)
            .with_cols(2)
            .with_bits_allocated(bits)
            .with_pixel_representation(representation)
            .with_photometric_interpretation(pi)
    }

    #[test]
    fn eight_to_sixteen_bits_unsigned() {
        let mut obj = target(16, 0, "MONOCHROME2");
        let raster = SampleBuffer::new(2, 1, 1, 8, vec![0, 255]).unwrap();
        encode(&mut obj, &raster).unwrap();
        assert_eq!(obj.pixel_data_bytes(), Some(&[0, 0, 0xFF, 0xFF][..]));
    }

    #[test]
    fn eight_to_sixteen_bits_signed() {
        let mut obj = target(16, 1, "MONOCHROME2");
        let raster = SampleBuffer::new(2, 1, 1, 8, vec![0, 255]).unwrap();
        encode(&mut obj, &raster).unwrap();
        // -32768 and 32767
        assert_eq!(obj.pixel_data_bytes(), Some(&[0x00, 0x80, 0xFF, 0x7F][..]));
    }

    #[test]
    fn sixteen_to_eight_bits() {
        let mut obj = target(8, 0, "MONOCHROME2");
        let raster = SampleBuffer::new(2, 1, 1, 16, vec![257, 65535]).unwrap();
        encode(&mut obj, &raster).unwrap();
        assert_eq!(obj.pixel_data_bytes(), Some(&[1, 255][..]));
    }

    #[test]
    fn big_endian_target() {
        let mut obj = target(16, 0, "MONOCHROME2").with_transfer_syntax("1.2.840.10008.1.2.2");
        let raster = SampleBuffer::new(2, 1, 1, 16, vec![0x0102, 0x0304]).unwrap();
        encode(&mut obj, &raster).unwrap();
        assert_eq!(obj.pixel_data_bytes(), Some(&[1, 2, 3, 4][..]));
    }

    #[test]
    fn rgb_to_gray_and_back() {
        let mut obj = target(8, 0, "MONOCHROME2");
        let raster = SampleBuffer::new(2, 1, 3, 8, vec![255, 255, 255, 255, 0, 0]).unwrap();
        encode(&mut obj, &raster).unwrap();
        assert_eq!(obj.pixel_data_bytes(), Some(&[255, 76][..]));

        let mut obj = target(8, 0, "RGB");
        let raster = SampleBuffer::new(2, 1, 1, 8, vec![7, 9]).unwrap();
        encode(&mut obj, &raster).unwrap();
        assert_eq!(obj.pixel_data_bytes(), Some(&[7, 7, 7, 9, 9, 9][..]));
    }

    #[test]
    fn channels_follow_source_without_photometric_interpretation() {
        let mut obj = InMemContainer::new()
            .with_rows(1)
            .with_cols(1)
            .with_bits_allocated(8);
        let raster = SampleBuffer::new(1, 1, 3, 8, vec![1, 2, 3]).unwrap();
        encode(&mut obj, &raster).unwrap();
        assert_eq!(obj.pixel_data_bytes(), Some(&[1, 2, 3][..]));
    }

    #[test]
    fn multiple_frames() {
        let mut obj = target(8, 0, "MONOCHROME2").with_number_of_frames(2);
        let frames = [
            SampleBuffer::new(2, 1, 1, 8, vec![1, 2]).unwrap(),
            SampleBuffer::new(2, 1, 1, 8, vec![3, 4]).unwrap(),
        ];
        encode_frames(&mut obj, &frames).unwrap();
        assert_eq!(obj.pixel_data_bytes(), Some(&[1, 2, 3, 4][..]));

        assert!(matches!(
            encode(&mut obj, &frames[0]),
            Err(Error::GeometryMismatch { .. })
        ));
    }

    #[test]
    fn not_an_image() {
        let mut obj = target(8, 0, "MONOCHROME2");
        assert!(matches!(
            encode(&mut obj, &NotAnImage),
            Err(Error::InvalidArgument { .. })
        ));
        let none: [SampleBuffer; 0] = [];
        assert!(matches!(
            encode_frames(&mut obj, &none),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn samples_beyond_bit_depth() {
        let mut obj = target(16, 0, "MONOCHROME2");
        assert!(matches!(
            encode(&mut obj, &Overflowing),
            Err(Error::InvalidArgument { reason, .. }) if reason.contains("300")
        ));
        assert!(obj.pixel_data.is_none());
    }

    #[test]
    fn wrong_dimensions() {
        let mut obj = target(8, 0, "MONOCHROME2");
        let raster = SampleBuffer::new(1, 2, 1, 8, vec![1, 2]).unwrap();
        assert!(matches!(
            encode(&mut obj, &raster),
            Err(Error::GeometryMismatch { .. })
        ));
    }

    #[test]
    fn invalid_target() {
        let raster = SampleBuffer::new(2, 1, 1, 8, vec![1, 2]).unwrap();

        let mut obj = target(42, 0, "MONOCHROME2");
        assert!(matches!(
            encode(&mut obj, &raster),
            Err(Error::InvalidBitDepth { value: 42, .. })
        ));

        let mut obj = target(8, 42, "MONOCHROME2");
        assert!(matches!(
            encode(&mut obj, &raster),
            Err(Error::InvalidPixelRepresentation { value: 42, .. })
        ));

        let mut obj = target(8, 0, "PALETTE COLOR");
        assert!(matches!(
            encode(&mut obj, &raster),
            Err(Error::UnsupportedPhotometricInterpretation { .. })
        ));

        let mut obj = target(8, 0, "MONOCHROME2").with_transfer_syntax("1.2.840.10008.1.2.5");
        assert!(matches!(
            encode(&mut obj, &raster),
            Err(Error::EncapsulatedTarget { .. })
        ));
    }
}
