//! Top-level decoding: from a pixel container to display rasters.

use snafu::{ensure, OptionExt, ResultExt};
use tracing::{debug, warn};

use crate::attribute::{self, ImageDescription, PhotometricInterpretation};
use crate::codec::{Codec, DecodeError};
use crate::container::PixelContainer;
use crate::frame::RawFrame;
use crate::lut::Lut;
use crate::raster::Raster;
use crate::registry;
use crate::transform::{ValueTransform, VoiOption, WindowLevel};
use crate::{
    CreateLutSnafu, CreateRasterSnafu, FrameOutOfRangeSnafu, MissingAttributeSnafu,
    PixelDataTooShortSnafu, Result, UnsupportedPhotometricInterpretationSnafu,
};

/// The outcome of decoding a single frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<R> {
    /// The requested frame, as a raster
    Raster(R),
    /// The object has no pixel data
    NoData,
    /// The pixel data could not be decompressed
    DecodeFailure,
}

impl<R> Decoded<R> {
    /// Obtain the raster, if decoding succeeded.
    pub fn raster(self) -> Option<R> {
        match self {
            Decoded::Raster(raster) => Some(raster),
            _ => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Decoded::NoData)
    }

    pub fn is_decode_failure(&self) -> bool {
        matches!(self, Decoded::DecodeFailure)
    }
}

/// Options for decoding pixel data into rasters.
///
/// ```
/// # use dicom_pixelpipe::{DecodeOptions, VoiOption, WindowLevel};
/// let options = DecodeOptions::new().level(1095., 84.);
/// assert_eq!(options.voi, VoiOption::Custom(WindowLevel::new(1095., 84.)));
/// ```
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct DecodeOptions {
    /// the window applied to monochrome and RGB samples
    pub voi: VoiOption,
}

impl DecodeOptions {
    /// Options which leave stored values untransformed.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_voi(mut self, voi: VoiOption) -> Self {
        self.voi = voi;
        self
    }

    /// Apply the window stored in the object.
    pub fn level_default(self) -> Self {
        self.with_voi(VoiOption::Default)
    }

    /// Apply the given window center and width.
    pub fn level(self, center: f64, width: f64) -> Self {
        self.with_voi(VoiOption::Custom(WindowLevel::new(center, width)))
    }

    /// Map the full range of the sample type onto the 8-bit range.
    pub fn remap(self) -> Self {
        self.with_voi(VoiOption::Remap)
    }
}

/// Decoding methods for every pixel container.
pub trait PixelDecoder: PixelContainer {
    /// Decode the first frame of the object into a raster.
    /// See [`decode_single`].
    fn decode_single<R: Raster>(&self, options: &DecodeOptions) -> Result<Decoded<R>> {
        decode_single(self, options)
    }

    /// Decode the frame at the given index into a raster.
    /// See [`decode_frame`].
    fn decode_frame<R: Raster>(&self, frame: u32, options: &DecodeOptions) -> Result<Decoded<R>> {
        decode_frame(self, frame, options)
    }

    /// Decode all frames of the object into rasters.
    /// See [`decode_all`].
    fn decode_all<R: Raster>(&self, options: &DecodeOptions) -> Result<Vec<R>> {
        decode_all(self, options)
    }
}

impl<T: ?Sized + PixelContainer> PixelDecoder for T {}

/// Decode the first frame of the object into a raster.
///
/// Declared _Bits Allocated_ and _Pixel Representation_ values
/// are validated first, even when there is no pixel data.
/// An object without pixel data yields [`Decoded::NoData`],
/// and compressed pixel data which cannot be decompressed
/// yields [`Decoded::DecodeFailure`].
pub fn decode_single<R, C>(obj: &C, options: &DecodeOptions) -> Result<Decoded<R>>
where
    R: Raster,
    C: ?Sized + PixelContainer,
{
    decode_frame(obj, 0, options)
}

/// Decode the frame at the given 0-based index into a raster.
///
/// Only that frame is decompressed.
/// Outcomes are the same as in [`decode_single`],
/// and an index beyond the object's _Number of Frames_
/// is an error.
pub fn decode_frame<R, C>(obj: &C, frame: u32, options: &DecodeOptions) -> Result<Decoded<R>>
where
    R: Raster,
    C: ?Sized + PixelContainer,
{
    match decode_frames(obj, Some(frame))? {
        Outcome::NoData => Ok(Decoded::NoData),
        Outcome::DecodeFailure => Ok(Decoded::DecodeFailure),
        Outcome::Frames(frames, first, description) => {
            let mut rasters = build_rasters(obj, frames, first, &description, options)?;
            Ok(match rasters.pop() {
                Some(raster) => Decoded::Raster(raster),
                None => Decoded::DecodeFailure,
            })
        }
    }
}

/// Decode all frames of the object into rasters, in frame order.
///
/// Both an object without pixel data
/// and compressed pixel data which cannot be decompressed
/// yield an empty vector.
/// Otherwise, there is one raster per frame.
pub fn decode_all<R, C>(obj: &C, options: &DecodeOptions) -> Result<Vec<R>>
where
    R: Raster,
    C: ?Sized + PixelContainer,
{
    match decode_frames(obj, None)? {
        Outcome::NoData | Outcome::DecodeFailure => Ok(Vec::new()),
        Outcome::Frames(frames, first, description) => {
            build_rasters(obj, frames, first, &description, options)
        }
    }
}

enum Outcome {
    /// decoded frames, starting at the given frame index
    Frames(Vec<RawFrame>, u32, ImageDescription),
    NoData,
    DecodeFailure,
}

/// Decode the selected frame, or all frames if none is selected.
fn decode_frames<C>(obj: &C, selected: Option<u32>) -> Result<Outcome>
where
    C: ?Sized + PixelContainer,
{
    attribute::validate_declared(obj)?;

    let data = match obj.pixel_data() {
        Some(data) => data,
        None => return Ok(Outcome::NoData),
    };

    let description = ImageDescription::from_container(obj)?;
    let ts = registry::normalize_uid(obj.transfer_syntax_uid());

    let codec = if obj.is_compressed() {
        match Codec::from_transfer_syntax(ts) {
            Some(codec) if codec != Codec::Native => codec,
            _ => {
                warn!("No pixel data decoder for compressed transfer syntax {}", ts);
                return Ok(Outcome::DecodeFailure);
            }
        }
    } else {
        Codec::Native
    };

    // decoders of these codecs convert YBR samples to RGB
    if description.photometric_interpretation.is_ybr()
        && !matches!(codec, Codec::BaselineDct | Codec::WaveletMultiframe)
    {
        return UnsupportedPhotometricInterpretationSnafu {
            pi: description.photometric_interpretation.to_string(),
        }
        .fail();
    }

    let frames = match selected {
        Some(frame) => {
            ensure!(
                frame < description.number_of_frames,
                FrameOutOfRangeSnafu {
                    frame,
                    number_of_frames: description.number_of_frames,
                }
            );
            frame..frame + 1
        }
        None => 0..description.number_of_frames,
    };
    debug!(
        "Decoding {} of {} frame(s) with {} codec (transfer syntax {})",
        frames.len(),
        description.number_of_frames,
        codec.name(),
        ts
    );

    let first = frames.start;
    match codec.decode(&data, &description, registry::is_big_endian(ts), frames) {
        Ok(frames) => Ok(Outcome::Frames(frames, first, description)),
        Err(DecodeError::PixelDataTooShort { expected, found }) => {
            PixelDataTooShortSnafu { expected, found }.fail()
        }
        Err(e) => {
            warn!(
                "Could not decode pixel data: {}",
                snafu::Report::from_error(e)
            );
            Ok(Outcome::DecodeFailure)
        }
    }
}

/// Display sample conversion for all frames of an object.
enum SampleMapping {
    /// windowed monochrome or RGB samples
    Values(Lut<u8>),
    /// palette indices resolved to RGB
    Palette(Vec<[u8; 3]>),
}

fn build_rasters<R, C>(
    obj: &C,
    frames: Vec<RawFrame>,
    first: u32,
    description: &ImageDescription,
    options: &DecodeOptions,
) -> Result<Vec<R>>
where
    R: Raster,
    C: ?Sized + PixelContainer,
{
    let bits = description.bits_allocated;
    let representation = description.pixel_representation;

    let (mapping, channels) = match description.photometric_interpretation {
        PhotometricInterpretation::PaletteColor => {
            let palette = obj.palette_lut().context(MissingAttributeSnafu {
                name: "PaletteColorLookupTable",
            })?;
            (SampleMapping::Palette(palette.to_table(bits)), 3)
        }
        pi => {
            let monochrome = pi == PhotometricInterpretation::Monochrome2;
            let params = ValueTransform::resolve(obj, options.voi, bits, representation, monochrome);
            debug!("Value transform: {:?}", params);
            let lut = Lut::new_transform(bits, representation, &params).context(CreateLutSnafu)?;
            (SampleMapping::Values(lut), if monochrome { 1 } else { 3 })
        }
    };

    frames
        .into_iter()
        .enumerate()
        .map(|(i, frame)| {
            let samples: Vec<u8> = match &mapping {
                SampleMapping::Values(lut) => lut.map_iter(frame.samples()).collect(),
                SampleMapping::Palette(table) => frame
                    .samples()
                    .flat_map(|index| table[index as usize])
                    .collect(),
            };
            R::from_display_samples(
                description.cols as u32,
                description.rows as u32,
                channels,
                samples,
            )
            .context(CreateRasterSnafu {
                frame: first + i as u32,
            })
        })
        .collect()
}
