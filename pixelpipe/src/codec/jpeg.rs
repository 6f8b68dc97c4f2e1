//! JPEG baseline decoding.

use std::borrow::Cow;
use std::io::Cursor;
use std::ops::Range;

use jpeg_decoder::{Decoder, ImageInfo, PixelFormat};
use snafu::{ensure, OptionExt, ResultExt};
use tracing::warn;

use super::{decode_each, decode_error, frame_fragment, DecodeResult};
use crate::attribute::{BitsAllocated, ImageDescription};
use crate::frame::RawFrame;

/// Decode the given frames of JPEG encapsulated pixel data.
///
/// Frames are first mapped to their fragments.
/// When that is not possible,
/// the fragments are concatenated
/// and read as a sequence of consecutive JPEG streams.
pub(crate) fn decode(
    offset_table: &[u32],
    fragments: &[Cow<'_, [u8]>],
    description: &ImageDescription,
    frames: Range<u32>,
) -> DecodeResult<Vec<RawFrame>> {
    let mapped: DecodeResult<Vec<_>> = frames
        .clone()
        .map(|frame| frame_fragment(offset_table, fragments, description, frame))
        .collect();

    match mapped {
        Ok(frame_data) => {
            let first = frames.start;
            decode_each(frames, |frame| {
                decode_stream(&frame_data[(frame - first) as usize], description, frame)
            })
        }
        Err(e) => {
            warn!(
                "Could not map {} fragments to {} frames ({}), decoding JPEG streams in sequence",
                fragments.len(),
                description.number_of_frames,
                e
            );
            decode_sequential(&fragments.concat(), description, frames)
        }
    }
}

/// Decode one frame from its JPEG stream.
fn decode_stream(data: &[u8], description: &ImageDescription, frame: u32) -> DecodeResult<RawFrame> {
    let mut decoder = Decoder::new(Cursor::new(data));
    let pixels = decoder
        .decode()
        .map_err(|e| Box::new(e) as Box<_>)
        .with_whatever_context(|_| format!("JPEG decoding failure on frame {}", frame))?;
    let info = decoder
        .info()
        .whatever_context("JPEG decoder did not provide image information")?;
    to_raw_frame(pixels, info, description, frame)
}

/// Decode consecutive JPEG streams from a single buffer,
/// keeping the frames in range.
fn decode_sequential(
    data: &[u8],
    description: &ImageDescription,
    frames: Range<u32>,
) -> DecodeResult<Vec<RawFrame>> {
    let data_len = data.len() as u64;
    let mut cursor = Cursor::new(data);
    let mut out = Vec::with_capacity(frames.len());

    let mut frame = 0;
    while frame < frames.end {
        let mut decoder = Decoder::new(&mut cursor);
        let pixels = decoder
            .decode()
            .map_err(|e| Box::new(e) as Box<_>)
            .with_whatever_context(|_| format!("JPEG decoding failure on frame {}", frame))?;
        let info = decoder
            .info()
            .whatever_context("JPEG decoder did not provide image information")?;
        if frames.contains(&frame) {
            out.push(to_raw_frame(pixels, info, description, frame)?);
        }
        frame += 1;

        if next_even(cursor.position()) >= next_even(data_len) {
            break;
        }
        // stop if there aren't enough bytes to continue
        if cursor.position() + 2 >= data_len {
            break;
        }

        // fragments have an even length,
        // which may or may not have been padded after the EOI marker
        let position = cursor.position();
        if position % 2 > 0 {
            let next = data.get(position as usize + 1..position as usize + 3);
            if next == Some(&[0xFF, 0xD8][..]) {
                cursor.set_position(position + 1);
            }
        }
    }

    ensure!(
        out.len() == frames.len(),
        decode_error::MissingFragmentSnafu { frame }
    );
    Ok(out)
}

/// Convert the decoder output into a raw frame,
/// checking it against the image description.
fn to_raw_frame(
    pixels: Vec<u8>,
    info: ImageInfo,
    description: &ImageDescription,
    frame: u32,
) -> DecodeResult<RawFrame> {
    ensure!(
        info.width == description.cols && info.height == description.rows,
        decode_error::FrameGeometrySnafu {
            frame,
            details: format!(
                "decoded {}x{}, expected {}x{}",
                info.width, info.height, description.cols, description.rows
            ),
        }
    );

    let (samples_per_pixel, sixteen_bit) = match info.pixel_format {
        PixelFormat::L8 => (1, false),
        PixelFormat::L16 => (1, true),
        PixelFormat::RGB24 => (3, false),
        PixelFormat::CMYK32 => {
            return decode_error::FrameGeometrySnafu {
                frame,
                details: "CMYK JPEG images are not supported".to_string(),
            }
            .fail()
        }
    };
    ensure!(
        samples_per_pixel == description.samples_per_pixel,
        decode_error::FrameGeometrySnafu {
            frame,
            details: format!(
                "decoded {} components, expected {}",
                samples_per_pixel, description.samples_per_pixel
            ),
        }
    );

    let data = match (description.bits_allocated, sixteen_bit) {
        (BitsAllocated::Eight, false) => pixels,
        (BitsAllocated::Sixteen, false) => pixels
            .into_iter()
            .flat_map(|sample| [sample, 0])
            .collect(),
        (BitsAllocated::Sixteen, true) => {
            // the decoder writes 16-bit samples in big endian
            let mut pixels = pixels;
            for sample in pixels.chunks_exact_mut(2) {
                sample.swap(0, 1);
            }
            pixels
        }
        (BitsAllocated::Eight, true) => {
            return decode_error::FrameGeometrySnafu {
                frame,
                details: "16-bit JPEG image in 8-bit pixel data".to_string(),
            }
            .fail()
        }
    };

    RawFrame::new(
        description.rows,
        description.cols,
        description.samples_per_pixel,
        description.bits_allocated,
        data,
    )
    .context(decode_error::FrameGeometrySnafu {
        frame,
        details: "decoded sample count does not match the image size",
    })
}

fn next_even(l: u64) -> u64 {
    (l + 1) & !1
}
