//! JPEG 2000 decoding.

use jpeg2k::Image;
use snafu::{ensure, ResultExt};
use tracing::warn;

use super::{decode_error, DecodeResult};
use crate::attribute::ImageDescription;
use crate::frame::RawFrame;

// Check jpeg2k backend conflicts
#[cfg(all(feature = "openjp2", feature = "openjpeg-sys"))]
compile_error!(
    "feature \"openjp2\" and feature \"openjpeg-sys\" cannot be enabled at the same time"
);

/// Decode a single JPEG 2000 code stream into a frame.
///
/// Each component is written as one sample of the pixel,
/// truncated to the number of bytes per sample.
pub(crate) fn decode_frame(
    data: &[u8],
    description: &ImageDescription,
    frame: u32,
) -> DecodeResult<RawFrame> {
    let image = Image::from_bytes(data)
        .map_err(|e| Box::new(e) as Box<_>)
        .with_whatever_context(|_| format!("JPEG 2000 decoding failure on frame {}", frame))?;

    ensure!(
        image.width() == description.cols as u32 && image.height() == description.rows as u32,
        decode_error::FrameGeometrySnafu {
            frame,
            details: format!(
                "decoded {}x{}, expected {}x{}",
                image.width(),
                image.height(),
                description.cols,
                description.rows
            ),
        }
    );

    let samples_per_pixel = description.samples_per_pixel as usize;
    let bytes_per_sample = description.bits_allocated.bytes();
    let pixels = description.pixels_per_frame();

    // Note: `get_pixels` is not used
    // because it narrows the data down to 8 bits per sample
    let components = image.components();
    ensure!(
        components.len() >= samples_per_pixel,
        decode_error::FrameGeometrySnafu {
            frame,
            details: format!(
                "decoded {} components, expected {}",
                components.len(),
                samples_per_pixel
            ),
        }
    );
    if components.len() > samples_per_pixel {
        warn!(
            "JPEG 2000 image has more components than expected ({} > {})",
            components.len(),
            samples_per_pixel
        );
    }

    let mut out = vec![0; pixels * samples_per_pixel * bytes_per_sample];
    for (component_i, component) in components.iter().take(samples_per_pixel).enumerate() {
        let data = component.data();
        ensure!(
            data.len() >= pixels,
            decode_error::FrameGeometrySnafu {
                frame,
                details: format!(
                    "component {} has {} samples, expected {}",
                    component_i,
                    data.len(),
                    pixels
                ),
            }
        );
        for (i, sample) in data.iter().take(pixels).enumerate() {
            let offset = (i * samples_per_pixel + component_i) * bytes_per_sample;
            out[offset..offset + bytes_per_sample]
                .copy_from_slice(&sample.to_le_bytes()[..bytes_per_sample]);
        }
    }

    Ok(RawFrame {
        rows: description.rows,
        columns: description.cols,
        samples_per_pixel: description.samples_per_pixel,
        bits: description.bits_allocated,
        data: out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{BitsAllocated, PhotometricInterpretation, PixelRepresentation};
    use crate::codec::DecodeError;

    fn monochrome(bits_allocated: BitsAllocated) -> ImageDescription {
        ImageDescription {
            rows: 4,
            cols: 4,
            number_of_frames: 1,
            samples_per_pixel: 1,
            planar_configuration: 0,
            bits_allocated,
            pixel_representation: PixelRepresentation::Unsigned,
            photometric_interpretation: PhotometricInterpretation::Monochrome2,
        }
    }

    /// A 4x4 grayscale code stream holding a single empty packet,
    /// so that every sample is `2^(precision - 1)`.
    fn constant_stream(precision: u8) -> Vec<u8> {
        let mut out = vec![
            0xFF, 0x4F, // SOC
            0xFF, 0x51, 0x00, 0x29, 0x00, 0x00, // SIZ
        ];
        for value in [4_u32, 4, 0, 0, 4, 4, 0, 0] {
            out.extend_from_slice(&value.to_be_bytes());
        }
        out.extend_from_slice(&[0x00, 0x01, precision - 1, 0x01, 0x01]);
        out.extend_from_slice(&[
            0xFF, 0x52, 0x00, 0x0C, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x04, 0x04, 0x00,
            0x01, // COD
            0xFF, 0x5C, 0x00, 0x04, 0x40, precision << 3, // QCD
            0xFF, 0x90, 0x00, 0x0A, 0x00, 0x00, 0x00, 0x00, 0x00, 0x0F, 0x00,
            0x01, // SOT
            0xFF, 0x93, 0x00, // SOD, empty packet
            0xFF, 0xD9, // EOC
        ]);
        out
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let description = monochrome(BitsAllocated::Eight);
        assert!(decode_frame(&[0xFF, 0x4F, 0x00, 0x00, 0x12], &description, 0).is_err());
    }

    #[test]
    fn eight_bit_samples() {
        let frame = decode_frame(&constant_stream(8), &monochrome(BitsAllocated::Eight), 0).unwrap();
        assert_eq!(frame.data, vec![128; 16]);
    }

    #[test]
    fn sixteen_bit_samples_are_little_endian() {
        let frame =
            decode_frame(&constant_stream(16), &monochrome(BitsAllocated::Sixteen), 0).unwrap();
        assert_eq!(frame.data.len(), 32);
        assert_eq!(&frame.data[..2], &[0x00, 0x80]);
        assert!(frame.samples().all(|s| s == 0x8000));
    }

    #[test]
    fn missing_components() {
        let mut description = monochrome(BitsAllocated::Eight);
        description.samples_per_pixel = 3;
        description.photometric_interpretation = PhotometricInterpretation::Rgb;
        assert!(matches!(
            decode_frame(&constant_stream(8), &description, 2),
            Err(DecodeError::FrameGeometry { frame: 2, .. })
        ));
    }
}
