//! RLE Lossless decoding.
//!
//! See <https://dicom.nema.org/medical/dicom/current/output/chtml/part05/chapter_G.html>

use byteorder::{ByteOrder, LittleEndian};
use snafu::{ensure_whatever, OptionExt};

use super::{decode_error, DecodeResult};
use crate::attribute::ImageDescription;
use crate::frame::RawFrame;

/// The size of the RLE header: the number of segments and 15 segment offsets.
const HEADER_LEN: usize = 64;
const MAX_SEGMENTS: usize = 15;

/// Decode one RLE Lossless frame.
///
/// The frame holds one segment per sample byte plane,
/// ordered by sample and then from the most significant byte.
/// For 16-bit RGB, segments are ordered like this:
///
/// ```none
///  Segment: 0     | 1     | 2     | 3     | 4     | 5
///           R MSB | R LSB | G MSB | G LSB | B MSB | B LSB
/// ```
///
/// The output is pixel-interleaved and little endian:
///
/// ```none
///  Pixel 1                             | ... Pixel N
///  LSB R MSB R LSB G MSB G LSB B MSB B | ...
/// ```
pub(crate) fn decode_frame(
    fragment: &[u8],
    description: &ImageDescription,
    frame: u32,
) -> DecodeResult<RawFrame> {
    let bytes_per_sample = description.bits_allocated.bytes();
    let samples_per_pixel = description.samples_per_pixel as usize;
    let pixels = description.pixels_per_frame();

    let offsets = read_header(fragment)?;
    let expected_segments = samples_per_pixel * bytes_per_sample;
    snafu::ensure!(
        offsets.len() == expected_segments,
        decode_error::FrameGeometrySnafu {
            frame,
            details: format!(
                "expected {} RLE segments, found {}",
                expected_segments,
                offsets.len()
            ),
        }
    );

    let stride = samples_per_pixel * bytes_per_sample;
    let mut data = vec![0; pixels * stride];

    for (segment_index, &start) in offsets.iter().enumerate() {
        let end = offsets
            .get(segment_index + 1)
            .copied()
            .unwrap_or(fragment.len());
        ensure_whatever!(
            start <= end && end <= fragment.len(),
            "Invalid offsets for RLE segment #{} in frame #{}",
            segment_index,
            frame
        );
        let segment = unpack_bits(&fragment[start..end], pixels)?;

        let sample = segment_index / bytes_per_sample;
        // segments go from the most significant byte
        let byte = bytes_per_sample - 1 - segment_index % bytes_per_sample;
        let base = sample * bytes_per_sample + byte;
        for (pixel, value) in segment.into_iter().enumerate() {
            data[pixel * stride + base] = value;
        }
    }

    Ok(RawFrame {
        rows: description.rows,
        columns: description.cols,
        samples_per_pixel: description.samples_per_pixel,
        bits: description.bits_allocated,
        data,
    })
}

/// Read the RLE header and return the segment offsets.
fn read_header(fragment: &[u8]) -> DecodeResult<Vec<usize>> {
    ensure_whatever!(
        fragment.len() >= HEADER_LEN,
        "RLE fragment is too short for a header ({} bytes)",
        fragment.len()
    );
    let segments = LittleEndian::read_u32(&fragment[0..4]) as usize;
    ensure_whatever!(
        (1..=MAX_SEGMENTS).contains(&segments),
        "Invalid number of RLE segments {}",
        segments
    );
    let mut offsets = vec![0; segments];
    LittleEndian::read_u32_into(&fragment[4..4 * (segments + 1)], &mut offsets);
    Ok(offsets.into_iter().map(|o| o as usize).collect())
}

/// Decode a PackBits segment into exactly `len` bytes.
fn unpack_bits(segment: &[u8], len: usize) -> DecodeResult<Vec<u8>> {
    let mut out = Vec::with_capacity(len);
    let mut i = 0;
    while i < segment.len() && out.len() < len {
        let header = segment[i] as i8;
        i += 1;
        match header {
            0..=127 => {
                let n = header as usize + 1;
                let literal = segment
                    .get(i..i + n)
                    .whatever_context("Truncated RLE literal run")?;
                out.extend_from_slice(literal);
                i += n;
            }
            -127..=-1 => {
                let value = *segment
                    .get(i)
                    .whatever_context("Truncated RLE replicate run")?;
                out.resize(out.len() + (1 - header as isize) as usize, value);
                i += 1;
            }
            // -128 is a no-op
            _ => {}
        }
    }
    ensure_whatever!(
        out.len() >= len,
        "RLE segment decoded into {} bytes, expected {}",
        out.len(),
        len
    );
    out.truncate(len);
    Ok(out)
}
