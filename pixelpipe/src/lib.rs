//! This crate contains the DICOM pixel data pipeline,
//! responsible for decoding the pixel data of a DICOM object
//! (native or compressed) into display rasters,
//! and for encoding rasters back into native pixel data.
//!
//! The DICOM object itself is reached through the [`PixelContainer`] trait,
//! and the output image type through the [`Raster`] trait.
//! Enable the `object` feature to use [`dicom_object`] objects as containers,
//! and the `image` feature to produce [`image::DynamicImage`] rasters.
//!
//! The following pixel data encodings are supported,
//! depending on the Cargo features enabled:
//!
//! - native (uncompressed) pixel data, little or big endian;
//! - JPEG baseline (`jpeg` feature);
//! - RLE lossless (`rle` feature);
//! - JPEG 2000, including multi-frame objects
//!   (`openjp2` or `openjpeg-sys` feature).
//!
//! # Examples
//!
//! ```
//! # use dicom_pixelpipe::{InMemContainer, PixelDecoder, DecodeOptions, Decoded, SampleBuffer};
//! let obj = InMemContainer::monochrome(2, 2, 8, 0, vec![0, 64, 128, 255]);
//! let options = DecodeOptions::new().remap();
//! match obj.decode_single::<SampleBuffer>(&options)? {
//!     Decoded::Raster(raster) => assert_eq!(raster.samples(), &[0, 64, 128, 255]),
//!     other => panic!("unexpected outcome {:?}", other),
//! }
//! # Ok::<(), dicom_pixelpipe::Error>(())
//! ```
//!
//! Writing a raster back into a container:
//!
//! ```
//! # use dicom_pixelpipe::{encode, InMemContainer, PixelContainer, SampleBuffer};
//! let raster = SampleBuffer::new(2, 1, 1, 8, vec![10, 20]).unwrap();
//! let mut obj = InMemContainer::new()
//!     .with_rows(1)
//!     .with_cols(2)
//!     .with_bits_allocated(16)
//!     .with_pixel_representation(0)
//!     .with_photometric_interpretation("MONOCHROME2");
//! encode(&mut obj, &raster)?;
//! assert_eq!(obj.pixel_data_bytes().map(|b| b.len()), Some(4));
//! # Ok::<(), dicom_pixelpipe::Error>(())
//! ```

use snafu::{Backtrace, Snafu};

pub mod attribute;
pub mod codec;
pub mod container;
mod decode;
mod encode;
pub mod frame;
pub mod lut;
pub mod palette;
pub mod raster;
pub mod registry;
mod transform;

#[cfg(feature = "object")]
mod object;

pub use attribute::{BitsAllocated, PhotometricInterpretation, PixelRepresentation};
pub use codec::Codec;
pub use container::{InMemContainer, PixelContainer, PixelData};
pub use decode::{
    decode_all, decode_frame, decode_single, DecodeOptions, Decoded, PixelDecoder,
};
pub use encode::{encode, encode_frames};
pub use frame::RawFrame;
pub use lut::{CreateLutError, Lut};
pub use palette::{LutDescriptor, PaletteLut, PaletteLutChannel};
pub use raster::{Raster, SampleBuffer, SampleSource};
pub use transform::{transform, Rescale, ValueTransform, VoiOption, WindowLevel};

/// An error which may occur while decoding or encoding pixel data.
///
/// Note that a compressed pixel data stream
/// which fails to decompress is _not_ reported as an error,
/// but as [`Decoded::DecodeFailure`]
/// (or as an empty sequence of rasters, when decoding all frames).
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Invalid BitsAllocated {}, must be 8 or 16", value))]
    InvalidBitDepth { value: u16, backtrace: Backtrace },

    #[snafu(display("Invalid PixelRepresentation {}, must be 0 or 1", value))]
    InvalidPixelRepresentation { value: u16, backtrace: Backtrace },

    #[snafu(display("Invalid argument: {}", reason))]
    InvalidArgument {
        reason: String,
        backtrace: Backtrace,
    },

    #[snafu(display("Missing required attribute `{}`", name))]
    MissingAttribute {
        name: &'static str,
        backtrace: Backtrace,
    },

    #[snafu(display("Semantically invalid value `{}` for attribute `{}`", value, name))]
    InvalidValue {
        name: &'static str,
        value: String,
        backtrace: Backtrace,
    },

    #[snafu(display("Unsupported PhotometricInterpretation `{}`", pi))]
    UnsupportedPhotometricInterpretation { pi: String, backtrace: Backtrace },

    #[snafu(display(
        "Pixel data is too short: expected {} bytes, found {}",
        expected,
        found
    ))]
    PixelDataTooShort {
        expected: usize,
        found: usize,
        backtrace: Backtrace,
    },

    #[snafu(display("Frame #{} is out of range, the object has {} frame(s)", frame, number_of_frames))]
    FrameOutOfRange {
        frame: u32,
        number_of_frames: u32,
        backtrace: Backtrace,
    },

    #[snafu(display("Image geometry mismatch: {}", details))]
    GeometryMismatch {
        details: String,
        backtrace: Backtrace,
    },

    #[snafu(display(
        "Cannot write native pixel data to an object with encapsulated transfer syntax {}",
        ts_uid
    ))]
    EncapsulatedTarget { ts_uid: String, backtrace: Backtrace },

    #[snafu(display("Could not build raster for frame #{}", frame))]
    CreateRaster { frame: u32, backtrace: Backtrace },

    #[snafu(display("Could not create value lookup table"))]
    CreateLut {
        source: CreateLutError,
        backtrace: Backtrace,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
