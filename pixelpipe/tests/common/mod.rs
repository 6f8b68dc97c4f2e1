//! Fixture builders shared by the integration tests.
#![allow(dead_code)]

use dicom_pixelpipe::registry;
use dicom_pixelpipe::InMemContainer;

/// Compress a byte plane with the PackBits scheme used by RLE Lossless.
pub fn pack_bits(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let mut run = 1;
        while i + run < data.len() && run < 128 && data[i + run] == data[i] {
            run += 1;
        }
        if run >= 2 {
            out.push((1 - run as i32) as i8 as u8);
            out.push(data[i]);
            i += run;
            continue;
        }

        let start = i;
        let mut end = i + 1;
        while end < data.len()
            && end - start < 128
            && !(end + 1 < data.len() && data[end] == data[end + 1])
        {
            end += 1;
        }
        out.push((end - start - 1) as u8);
        out.extend_from_slice(&data[start..end]);
        i = end;
    }
    if out.len() % 2 == 1 {
        out.push(0);
    }
    out
}

/// Encode one frame of little endian, pixel-interleaved samples
/// into an RLE Lossless fragment.
pub fn rle_frame(frame: &[u8], samples_per_pixel: usize, bytes_per_sample: usize) -> Vec<u8> {
    let stride = samples_per_pixel * bytes_per_sample;
    let pixels = frame.len() / stride;

    let mut segments = Vec::new();
    for sample in 0..samples_per_pixel {
        // most significant byte first
        for byte in (0..bytes_per_sample).rev() {
            let plane: Vec<u8> = (0..pixels)
                .map(|p| frame[p * stride + sample * bytes_per_sample + byte])
                .collect();
            segments.push(pack_bits(&plane));
        }
    }

    let mut header = vec![0_u8; 64];
    header[0..4].copy_from_slice(&(segments.len() as u32).to_le_bytes());
    let mut offset = 64_u32;
    for (i, segment) in segments.iter().enumerate() {
        let at = 4 + i * 4;
        header[at..at + 4].copy_from_slice(&offset.to_le_bytes());
        offset += segment.len() as u32;
    }

    let mut out = header;
    for segment in segments {
        out.extend(segment);
    }
    out
}

/// Encode an 8-bit grayscale image as a baseline JPEG stream.
pub fn jpeg_luma(samples: &[u8], width: u16, height: u16) -> Vec<u8> {
    let mut out = Vec::new();
    let encoder = jpeg_encoder::Encoder::new(&mut out, 100);
    encoder
        .encode(samples, width, height, jpeg_encoder::ColorType::Luma)
        .unwrap();
    out
}

/// A multi-frame, 8-bit RLE Lossless monochrome object
/// where every sample of frame `i` holds the value `values[i]`.
pub fn rle_multiframe(rows: u16, cols: u16, values: &[u8]) -> InMemContainer {
    let pixels = rows as usize * cols as usize;
    let fragments = values
        .iter()
        .map(|&v| rle_frame(&vec![v; pixels], 1, 1))
        .collect();
    InMemContainer::new()
        .with_transfer_syntax(registry::RLE_LOSSLESS)
        .with_rows(rows)
        .with_cols(cols)
        .with_bits_allocated(8)
        .with_pixel_representation(0)
        .with_samples_per_pixel(1)
        .with_photometric_interpretation("MONOCHROME2")
        .with_number_of_frames(values.len() as u32)
        .with_encapsulated_pixel_data(vec![], fragments)
}

/// A single frame, 256x256, 16-bit monochrome object
/// with the stored window `[1095, 84]`,
/// holding values from 1000 to 1199.
///
/// The samples are signed if `pixel_representation` is 1.
pub fn mr_like(pixel_representation: u16) -> InMemContainer {
    let data: Vec<u8> = (0..256_u32 * 256)
        .flat_map(|i| {
            let (x, y) = (i % 256, i / 256);
            let value = 1000 + ((x + y) % 200) as u16;
            value.to_le_bytes()
        })
        .collect();
    InMemContainer::monochrome(256, 256, 16, pixel_representation, data).with_window(1095., 84.)
}

/// A single-tile, lossless JPEG 2000 code stream without wavelet levels
/// where each component only has an empty packet.
///
/// Every sample of an unsigned component of precision `p`
/// decodes to the DC level shift `2^(p - 1)`.
pub fn j2k_constant(width: u32, height: u32, precisions: &[u8]) -> Vec<u8> {
    let components = precisions.len() as u16;
    let max_precision = precisions.iter().copied().max().unwrap_or(8);

    let mut out = vec![0xFF, 0x4F];

    // SIZ
    out.extend_from_slice(&[0xFF, 0x51]);
    out.extend_from_slice(&(38 + 3 * components).to_be_bytes());
    out.extend_from_slice(&0_u16.to_be_bytes());
    for value in [width, height, 0, 0, width, height, 0, 0] {
        out.extend_from_slice(&value.to_be_bytes());
    }
    out.extend_from_slice(&components.to_be_bytes());
    for &precision in precisions {
        out.extend_from_slice(&[precision - 1, 1, 1]);
    }

    // COD: LRCP, one layer, no color transform,
    // no decomposition, 64x64 code blocks, reversible 5/3
    out.extend_from_slice(&[0xFF, 0x52, 0x00, 0x0C, 0x00, 0x00, 0x00, 0x01, 0x00]);
    out.extend_from_slice(&[0x00, 0x04, 0x04, 0x00, 0x01]);

    // QCD: no quantization, 2 guard bits
    out.extend_from_slice(&[0xFF, 0x5C, 0x00, 0x04, 0x40, max_precision << 3]);

    // SOT, SOD and one empty packet per component
    let tile_len = 12 + 2 + components as u32;
    out.extend_from_slice(&[0xFF, 0x90, 0x00, 0x0A, 0x00, 0x00]);
    out.extend_from_slice(&tile_len.to_be_bytes());
    out.extend_from_slice(&[0x00, 0x01]);
    out.extend_from_slice(&[0xFF, 0x93]);
    out.extend(std::iter::repeat(0x00).take(components as usize));

    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

/// A multi-frame, 8-bit JPEG 2000 monochrome object,
/// one constant 4x4 frame per given precision.
pub fn j2k_multiframe(precisions: &[u8]) -> InMemContainer {
    let fragments = precisions
        .iter()
        .map(|&p| j2k_constant(4, 4, &[p]))
        .collect();
    InMemContainer::new()
        .with_transfer_syntax(registry::JPEG_2000_IMAGE_COMPRESSION_LOSSLESS_ONLY)
        .with_rows(4)
        .with_cols(4)
        .with_bits_allocated(8)
        .with_pixel_representation(0)
        .with_samples_per_pixel(1)
        .with_photometric_interpretation("MONOCHROME2")
        .with_number_of_frames(precisions.len() as u32)
        .with_encapsulated_pixel_data(vec![], fragments)
}
