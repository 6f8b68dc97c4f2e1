//! Frame decoders for each supported pixel data encoding.
//!
//! [`Codec`] is a closed set of decoders.
//! Each codec turns the stored pixel data of a container
//! into a sequence of [`RawFrame`]s,
//! one per requested frame and in frame order.

use std::borrow::Cow;
use std::ops::Range;

#[cfg(feature = "rayon")]
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use snafu::{ensure, OptionExt, Snafu};

use crate::attribute::ImageDescription;
use crate::container::PixelData;
use crate::frame::RawFrame;
use crate::registry;

#[cfg(feature = "jpeg")]
mod jpeg;
#[cfg(any(feature = "openjp2", feature = "openjpeg-sys"))]
mod jpeg2k;
mod native;
#[cfg(feature = "rle")]
mod rle;

/// The possible error conditions when decoding pixel data.
///
/// Apart from [`PixelDataTooShort`](DecodeError::PixelDataTooShort),
/// these errors are not propagated to the caller of the pipeline:
/// they turn into a decode failure outcome.
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)), module)]
pub enum DecodeError {
    /// A custom error occurred when decoding,
    /// reported as a dynamic error value with a message.
    #[snafu(whatever, display("{}", message))]
    Custom {
        /// The error message.
        message: String,
        /// The underlying error cause, if any.
        #[snafu(source(from(Box<dyn std::error::Error + Send + Sync + 'static>, Some)))]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },

    /// The codec was not compiled in.
    #[snafu(display("Support for {} is not enabled", codec))]
    CodecDisabled { codec: &'static str },

    /// Compressed pixel data was found in a flat pixel data element.
    NotEncapsulated,

    /// Encapsulated pixel data was found where native data was expected.
    UnexpectedEncapsulation,

    /// The requested frame range is outside the object's frame range.
    FrameRangeOutOfBounds,

    /// No fragments could be associated to the frame.
    #[snafu(display("Missing pixel data fragments for frame #{}", frame))]
    MissingFragment { frame: u32 },

    /// The decoded frame does not have the declared image geometry.
    #[snafu(display("Frame #{} does not match the image attributes: {}", frame, details))]
    FrameGeometry { frame: u32, details: String },

    /// Native pixel data is shorter than the image attributes require.
    #[snafu(display("Pixel data is too short: expected {} bytes, found {}", expected, found))]
    PixelDataTooShort { expected: usize, found: usize },
}

pub type DecodeResult<T, E = DecodeError> = Result<T, E>;

/// A pixel data decoder.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Codec {
    /// Native (uncompressed) pixel data
    Native,
    /// JPEG baseline and extended (DCT-based) compression
    BaselineDct,
    /// RLE Lossless compression
    RunLength,
    /// JPEG 2000 (wavelet-based) compression, single or multi-frame
    WaveletMultiframe,
}

impl Codec {
    /// Select the codec for the given transfer syntax UID.
    ///
    /// Unrecognized transfer syntaxes are assumed to be native.
    /// Known encapsulated transfer syntaxes without a decoder
    /// yield `None`.
    pub fn from_transfer_syntax(uid: &str) -> Option<Codec> {
        match registry::get(uid) {
            Some(entry) => entry.codec,
            None => Some(Codec::Native),
        }
    }

    /// A short description of the codec.
    pub fn name(self) -> &'static str {
        match self {
            Codec::Native => "native pixel data",
            Codec::BaselineDct => "JPEG baseline",
            Codec::RunLength => "RLE lossless",
            Codec::WaveletMultiframe => "JPEG 2000",
        }
    }

    /// Whether the decoder for this codec was compiled in.
    pub fn is_enabled(self) -> bool {
        match self {
            Codec::Native => true,
            Codec::BaselineDct => cfg!(feature = "jpeg"),
            Codec::RunLength => cfg!(feature = "rle"),
            Codec::WaveletMultiframe => cfg!(any(feature = "openjp2", feature = "openjpeg-sys")),
        }
    }

    /// Decode the given frames of the pixel data.
    ///
    /// `big_endian` only concerns native pixel data.
    /// The returned frames follow the order of `frames`.
    pub fn decode(
        self,
        data: &PixelData<'_>,
        description: &ImageDescription,
        big_endian: bool,
        frames: Range<u32>,
    ) -> DecodeResult<Vec<RawFrame>> {
        ensure!(
            frames.start < frames.end && frames.end <= description.number_of_frames,
            decode_error::FrameRangeOutOfBoundsSnafu
        );

        match (self, data) {
            (Codec::Native, PixelData::Native(bytes)) => {
                native::decode(bytes, description, big_endian, frames)
            }
            (Codec::Native, PixelData::Encapsulated { .. }) => {
                decode_error::UnexpectedEncapsulationSnafu.fail()
            }
            (_, PixelData::Native(_)) => decode_error::NotEncapsulatedSnafu.fail(),
            (
                codec,
                PixelData::Encapsulated {
                    offset_table,
                    fragments,
                },
            ) => codec.decode_encapsulated(offset_table, fragments, description, frames),
        }
    }

    #[allow(unused_variables)]
    fn decode_encapsulated(
        self,
        offset_table: &[u32],
        fragments: &[Cow<'_, [u8]>],
        description: &ImageDescription,
        frames: Range<u32>,
    ) -> DecodeResult<Vec<RawFrame>> {
        match self {
            #[cfg(feature = "jpeg")]
            Codec::BaselineDct => jpeg::decode(offset_table, fragments, description, frames),
            #[cfg(feature = "rle")]
            Codec::RunLength => decode_each(frames, |frame| {
                let data = frame_fragment(offset_table, fragments, description, frame)?;
                rle::decode_frame(&data, description, frame)
            }),
            #[cfg(any(feature = "openjp2", feature = "openjpeg-sys"))]
            Codec::WaveletMultiframe => decode_each(frames, |frame| {
                let data = frame_fragment(offset_table, fragments, description, frame)?;
                jpeg2k::decode_frame(&data, description, frame)
            }),
            codec => decode_error::CodecDisabledSnafu {
                codec: codec.name(),
            }
            .fail(),
        }
    }
}

/// Decode each frame in the range independently,
/// in parallel if the `rayon` feature is enabled.
///
/// The output always follows the order of the range,
/// and the first error found is returned.
pub(crate) fn decode_each<F>(frames: Range<u32>, f: F) -> DecodeResult<Vec<RawFrame>>
where
    F: Fn(u32) -> DecodeResult<RawFrame> + Send + Sync,
{
    #[cfg(feature = "rayon")]
    let iter = frames.into_par_iter();
    #[cfg(not(feature = "rayon"))]
    let iter = frames.into_iter();

    iter.map(f).collect()
}

/// Gather the bytes of the given frame from the pixel data fragments.
///
/// - If there is one fragment per frame, the fragment is used as is.
/// - If there is a single frame, all fragments are concatenated.
/// - Otherwise, the basic offset table groups the fragments into frames,
///   with offsets counting the 8-byte item header of each fragment.
pub(crate) fn frame_fragment<'a>(
    offset_table: &[u32],
    fragments: &'a [Cow<'a, [u8]>],
    description: &ImageDescription,
    frame: u32,
) -> DecodeResult<Cow<'a, [u8]>> {
    let number_of_frames = description.number_of_frames as usize;
    let frame_index = frame as usize;

    if fragments.len() == number_of_frames {
        return fragments
            .get(frame_index)
            .map(|fragment| Cow::Borrowed(&**fragment))
            .context(decode_error::MissingFragmentSnafu { frame });
    }

    if number_of_frames == 1 {
        ensure!(
            !fragments.is_empty(),
            decode_error::MissingFragmentSnafu { frame }
        );
        return Ok(Cow::Owned(fragments.concat()));
    }

    ensure!(
        offset_table.len() >= number_of_frames,
        decode_error::MissingFragmentSnafu { frame }
    );
    let start = offset_table[frame_index] as usize;
    let end = offset_table.get(frame_index + 1).map(|&o| o as usize);

    let mut offset = 0;
    let mut data = Vec::new();
    for fragment in fragments {
        if offset >= start && end.map_or(true, |end| offset < end) {
            data.extend_from_slice(fragment);
        }
        offset += fragment.len() + 8;
    }

    ensure!(
        !data.is_empty(),
        decode_error::MissingFragmentSnafu { frame }
    );
    Ok(Cow::Owned(data))
}
