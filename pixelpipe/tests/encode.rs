//! Integration tests for writing rasters back into containers.

mod common;

use dicom_pixelpipe::{
    encode, encode_frames, registry, DecodeOptions, Error, InMemContainer, PixelDecoder,
    SampleBuffer,
};
use rstest::rstest;

fn target(rows: u16, cols: u16, bits: u16, representation: u16) -> InMemContainer {
    InMemContainer::new()
        .with_rows(rows)
        .with_cols(cols)
        .with_bits_allocated(bits)
        .with_pixel_representation(representation)
        .with_samples_per_pixel(1)
        .with_photometric_interpretation("MONOCHROME2")
}

#[rstest]
#[case(0)]
#[case(1)]
fn native_round_trip_length(#[case] pixel_representation: u16) {
    let source = common::mr_like(pixel_representation);
    let original_len = source.pixel_data_bytes().map(<[u8]>::len);

    let raster: SampleBuffer = source
        .decode_single(&DecodeOptions::new().level_default())
        .unwrap()
        .raster()
        .unwrap();

    let mut obj = target(256, 256, 16, pixel_representation);
    encode(&mut obj, &raster).unwrap();
    assert_eq!(obj.pixel_data_bytes().map(<[u8]>::len), original_len);
    assert_eq!(original_len, Some(256 * 256 * 2));
}

#[test]
fn eight_bit_round_trip_is_lossless() {
    let samples: Vec<u16> = (0..=255).collect();
    let raster = SampleBuffer::new(16, 16, 1, 8, samples.clone()).unwrap();

    let mut obj = target(16, 16, 8, 0);
    encode(&mut obj, &raster).unwrap();
    let decoded: SampleBuffer = obj
        .decode_single(&DecodeOptions::new())
        .unwrap()
        .raster()
        .unwrap();
    assert_eq!(decoded.samples(), &samples[..]);
}

#[test]
fn multiframe_round_trip() {
    let frames: Vec<SampleBuffer> = (0..3_u16)
        .map(|f| SampleBuffer::new(2, 2, 3, 8, vec![f * 50; 12]).unwrap())
        .collect();
    let mut obj = InMemContainer::new()
        .with_rows(2)
        .with_cols(2)
        .with_bits_allocated(8)
        .with_samples_per_pixel(3)
        .with_photometric_interpretation("RGB")
        .with_number_of_frames(3);
    encode_frames(&mut obj, &frames).unwrap();
    assert_eq!(obj.pixel_data_bytes().map(<[u8]>::len), Some(2 * 2 * 3 * 3));

    let decoded: Vec<SampleBuffer> = obj.decode_all(&DecodeOptions::new()).unwrap();
    assert_eq!(decoded, frames);
}

#[test]
fn big_endian_round_trip() {
    let raster = SampleBuffer::new(2, 1, 1, 16, vec![0, 65535]).unwrap();
    let mut obj =
        target(1, 2, 16, 0).with_transfer_syntax(registry::EXPLICIT_VR_BIG_ENDIAN);
    encode(&mut obj, &raster).unwrap();
    assert_eq!(obj.pixel_data_bytes(), Some(&[0, 0, 0xFF, 0xFF][..]));

    let decoded: SampleBuffer = obj
        .decode_single(&DecodeOptions::new().remap())
        .unwrap()
        .raster()
        .unwrap();
    assert_eq!(decoded.samples(), &[0, 255]);
}

#[rstest]
#[case(24, 0)]
#[case(0, 0)]
#[case(8, 3)]
fn invalid_target(#[case] bits: u16, #[case] representation: u16) {
    let raster = SampleBuffer::new(2, 1, 1, 8, vec![1, 2]).unwrap();
    let mut obj = target(1, 2, bits, representation);
    let result = encode(&mut obj, &raster);
    if bits != 8 && bits != 16 {
        assert!(matches!(result, Err(Error::InvalidBitDepth { .. })));
    } else {
        assert!(matches!(result, Err(Error::InvalidPixelRepresentation { .. })));
    }
    assert!(obj.pixel_data.is_none());
}

#[test]
fn compressed_target_is_rejected() {
    let raster = SampleBuffer::new(2, 1, 1, 8, vec![1, 2]).unwrap();
    let mut obj = target(1, 2, 8, 0).with_transfer_syntax(registry::RLE_LOSSLESS);
    assert!(matches!(
        encode(&mut obj, &raster),
        Err(Error::EncapsulatedTarget { .. })
    ));
}

#[test]
fn missing_dimensions() {
    let raster = SampleBuffer::new(2, 1, 1, 8, vec![1, 2]).unwrap();
    let mut obj = InMemContainer::new()
        .with_bits_allocated(8)
        .with_photometric_interpretation("MONOCHROME2");
    assert!(matches!(
        encode(&mut obj, &raster),
        Err(Error::MissingAttribute { .. })
    ));
}

#[test]
fn palette_target_is_unsupported() {
    let raster = SampleBuffer::new(2, 1, 1, 8, vec![1, 2]).unwrap();
    let mut obj = target(1, 2, 8, 0).with_photometric_interpretation("PALETTE COLOR");
    assert!(matches!(
        encode(&mut obj, &raster),
        Err(Error::UnsupportedPhotometricInterpretation { .. })
    ));
}
