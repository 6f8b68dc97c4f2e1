//! Native (uncompressed) pixel data.

use std::ops::Range;

use snafu::ensure;

use super::{decode_error, DecodeResult};
use crate::attribute::{BitsAllocated, ImageDescription};
use crate::frame::RawFrame;

/// Split native pixel data into frames.
///
/// 16-bit samples are swapped if `big_endian` is set,
/// and color-by-plane samples (planar configuration 1)
/// are converted to pixel-interleaved samples.
/// Bytes past the last frame are ignored.
pub(crate) fn decode(
    data: &[u8],
    description: &ImageDescription,
    big_endian: bool,
    frames: Range<u32>,
) -> DecodeResult<Vec<RawFrame>> {
    let frame_size = description.frame_size();
    let expected = frame_size * description.number_of_frames as usize;
    ensure!(
        data.len() >= expected,
        decode_error::PixelDataTooShortSnafu {
            expected,
            found: data.len(),
        }
    );

    super::decode_each(frames, |frame| {
        let start = frame as usize * frame_size;
        let bytes = &data[start..start + frame_size];
        Ok(decode_frame(bytes, description, big_endian))
    })
}

fn decode_frame(bytes: &[u8], description: &ImageDescription, big_endian: bool) -> RawFrame {
    let bytes_per_sample = description.bits_allocated.bytes();
    let samples_per_pixel = description.samples_per_pixel as usize;

    let mut data = if samples_per_pixel > 1 && description.planar_configuration == 1 {
        interleave(bytes, samples_per_pixel, bytes_per_sample)
    } else {
        bytes.to_vec()
    };

    if big_endian && description.bits_allocated == BitsAllocated::Sixteen {
        for sample in data.chunks_exact_mut(2) {
            sample.swap(0, 1);
        }
    }

    RawFrame {
        rows: description.rows,
        columns: description.cols,
        samples_per_pixel: description.samples_per_pixel,
        bits: description.bits_allocated,
        data,
    }
}

/// Rearrange color-by-plane samples (`RRR...GGG...BBB...`)
/// into pixel-interleaved samples (`RGBRGB...`).
fn interleave(planar: &[u8], samples_per_pixel: usize, bytes_per_sample: usize) -> Vec<u8> {
    let plane_len = planar.len() / samples_per_pixel;
    let pixels = plane_len / bytes_per_sample;
    let mut out = vec![0; planar.len()];
    for pixel in 0..pixels {
        for sample in 0..samples_per_pixel {
            let src = sample * plane_len + pixel * bytes_per_sample;
            let dst = (pixel * samples_per_pixel + sample) * bytes_per_sample;
            out[dst..dst + bytes_per_sample].copy_from_slice(&planar[src..src + bytes_per_sample]);
        }
    }
    out
}
