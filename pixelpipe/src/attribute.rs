//! Utility module for fetching and validating
//! the key image attributes of a pixel data container.
//!
//! The validation performed here runs before any decoding or encoding:
//! invalid _Bits Allocated_ or _Pixel Representation_ values
//! are always reported as hard errors.

use std::convert::TryFrom;
use std::fmt;

use snafu::{ensure, OptionExt};

use crate::container::PixelContainer;
use crate::{
    InvalidBitDepthSnafu, InvalidPixelRepresentationSnafu, InvalidValueSnafu,
    MissingAttributeSnafu, Result, UnsupportedPhotometricInterpretationSnafu,
};

/// An interpreted representation of the DICOM _Bits Allocated_ attribute.
///
/// Only 8 and 16 bits per sample are supported.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub enum BitsAllocated {
    /// 8 bits per sample
    Eight,
    /// 16 bits per sample
    Sixteen,
}

impl BitsAllocated {
    /// The number of bits per sample.
    #[inline]
    pub fn bits(self) -> u16 {
        match self {
            BitsAllocated::Eight => 8,
            BitsAllocated::Sixteen => 16,
        }
    }

    /// The number of bytes per sample.
    #[inline]
    pub fn bytes(self) -> usize {
        match self {
            BitsAllocated::Eight => 1,
            BitsAllocated::Sixteen => 2,
        }
    }
}

impl TryFrom<u16> for BitsAllocated {
    type Error = crate::Error;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            8 => Ok(BitsAllocated::Eight),
            16 => Ok(BitsAllocated::Sixteen),
            _ => InvalidBitDepthSnafu { value }.fail(),
        }
    }
}

/// An interpreted representation of the DICOM _Pixel Representation_ attribute.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub enum PixelRepresentation {
    /// unsigned pixel data sample values
    Unsigned,
    /// signed pixel data sample values
    Signed,
}

impl PixelRepresentation {
    #[inline]
    pub fn is_signed(self) -> bool {
        self == PixelRepresentation::Signed
    }
}

impl TryFrom<u16> for PixelRepresentation {
    type Error = crate::Error;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            0 => Ok(PixelRepresentation::Unsigned),
            1 => Ok(PixelRepresentation::Signed),
            _ => InvalidPixelRepresentationSnafu { value }.fail(),
        }
    }
}

/// A supported DICOM _Photometric Interpretation_.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub enum PhotometricInterpretation {
    /// `MONOCHROME2`: single channel grayscale,
    /// where the minimum sample value is black
    Monochrome2,
    /// `RGB`: three channel color
    Rgb,
    /// `PALETTE COLOR`: single channel index into a color lookup table
    PaletteColor,
    /// `YBR_FULL`
    YbrFull,
    /// `YBR_FULL_422`
    YbrFull422,
    /// `YBR_ICT`
    YbrIct,
    /// `YBR_RCT`
    YbrRct,
}

impl PhotometricInterpretation {
    /// Interpret a photometric interpretation code string.
    /// Trailing padding is ignored,
    /// and `PALETTE_COLOR` is accepted as an alias of `PALETTE COLOR`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim_end_matches(|c| c == ' ' || c == '\0') {
            "MONOCHROME2" => Some(Self::Monochrome2),
            "RGB" => Some(Self::Rgb),
            "PALETTE COLOR" | "PALETTE_COLOR" => Some(Self::PaletteColor),
            "YBR_FULL" => Some(Self::YbrFull),
            "YBR_FULL_422" => Some(Self::YbrFull422),
            "YBR_ICT" => Some(Self::YbrIct),
            "YBR_RCT" => Some(Self::YbrRct),
            _ => None,
        }
    }

    /// The standard code string of this photometric interpretation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monochrome2 => "MONOCHROME2",
            Self::Rgb => "RGB",
            Self::PaletteColor => "PALETTE COLOR",
            Self::YbrFull => "YBR_FULL",
            Self::YbrFull422 => "YBR_FULL_422",
            Self::YbrIct => "YBR_ICT",
            Self::YbrRct => "YBR_RCT",
        }
    }

    /// The number of samples per pixel that this interpretation implies.
    pub fn samples_per_pixel(self) -> u16 {
        match self {
            Self::Monochrome2 | Self::PaletteColor => 1,
            _ => 3,
        }
    }

    /// Whether the samples are in one of the YCbCr color spaces,
    /// which decoders of compressed pixel data convert to RGB.
    pub fn is_ybr(self) -> bool {
        matches!(
            self,
            Self::YbrFull | Self::YbrFull422 | Self::YbrIct | Self::YbrRct
        )
    }
}

impl fmt::Display for PhotometricInterpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check that the given _Bits Allocated_ and _Pixel Representation_
/// are supported by the pipeline.
///
/// Bits allocated is checked first,
/// so an object with both attributes invalid
/// fails with [`InvalidBitDepth`](crate::Error::InvalidBitDepth).
pub fn validate(
    bits_allocated: u16,
    pixel_representation: u16,
) -> Result<(BitsAllocated, PixelRepresentation)> {
    let bits = BitsAllocated::try_from(bits_allocated)?;
    let representation = PixelRepresentation::try_from(pixel_representation)?;
    Ok((bits, representation))
}

/// Check the bits allocated and pixel representation
/// declared by the container, if any.
///
/// Absent attributes are not an error here;
/// they are only required once there is pixel data to process.
pub fn validate_declared<C>(obj: &C) -> Result<()>
where
    C: ?Sized + PixelContainer,
{
    if let Some(bits_allocated) = obj.bits_allocated() {
        BitsAllocated::try_from(bits_allocated)?;
    }
    if let Some(pixel_representation) = obj.pixel_representation() {
        PixelRepresentation::try_from(pixel_representation)?;
    }
    Ok(())
}

/// Get the Rows from the container
pub fn rows<C: ?Sized + PixelContainer>(obj: &C) -> Result<u16> {
    let rows = obj.rows().context(MissingAttributeSnafu { name: "Rows" })?;
    ensure!(
        rows > 0,
        InvalidValueSnafu {
            name: "Rows",
            value: rows.to_string(),
        }
    );
    Ok(rows)
}

/// Get the Columns from the container
pub fn cols<C: ?Sized + PixelContainer>(obj: &C) -> Result<u16> {
    let cols = obj.cols().context(MissingAttributeSnafu { name: "Columns" })?;
    ensure!(
        cols > 0,
        InvalidValueSnafu {
            name: "Columns",
            value: cols.to_string(),
        }
    );
    Ok(cols)
}

/// Get the BitsAllocated from the container
pub fn bits_allocated<C: ?Sized + PixelContainer>(obj: &C) -> Result<BitsAllocated> {
    let value = obj.bits_allocated().context(MissingAttributeSnafu {
        name: "BitsAllocated",
    })?;
    BitsAllocated::try_from(value)
}

/// Get the PixelRepresentation from the container,
/// which is unsigned if not declared
pub fn pixel_representation<C: ?Sized + PixelContainer>(obj: &C) -> Result<PixelRepresentation> {
    obj.pixel_representation()
        .map_or(Ok(PixelRepresentation::Unsigned), PixelRepresentation::try_from)
}

/// Get the NumberOfFrames from the container,
/// returning 1 if it is not present
pub fn number_of_frames<C: ?Sized + PixelContainer>(obj: &C) -> Result<u32> {
    let frames = obj.number_of_frames().unwrap_or(1);
    ensure!(
        frames > 0,
        InvalidValueSnafu {
            name: "NumberOfFrames",
            value: frames.to_string(),
        }
    );
    Ok(frames)
}

/// Get the PhotometricInterpretation from the container.
///
/// If it is not present,
/// it is inferred from the samples per pixel
/// (1 for `MONOCHROME2` and 3 for `RGB`).
pub fn photometric_interpretation<C: ?Sized + PixelContainer>(
    obj: &C,
) -> Result<PhotometricInterpretation> {
    match obj.photometric_interpretation() {
        Some(pi) => PhotometricInterpretation::parse(pi).with_context(|| {
            UnsupportedPhotometricInterpretationSnafu {
                pi: pi.trim_end().to_string(),
            }
        }),
        None => match obj.samples_per_pixel() {
            None | Some(1) => Ok(PhotometricInterpretation::Monochrome2),
            Some(3) => Ok(PhotometricInterpretation::Rgb),
            Some(spp) => InvalidValueSnafu {
                name: "SamplesPerPixel",
                value: spp.to_string(),
            }
            .fail(),
        },
    }
}

/// The full set of image attributes needed to interpret pixel data.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDescription {
    pub rows: u16,
    pub cols: u16,
    pub number_of_frames: u32,
    pub samples_per_pixel: u16,
    /// 0 for pixel-interleaved color samples, 1 for color-by-plane
    pub planar_configuration: u16,
    pub bits_allocated: BitsAllocated,
    pub pixel_representation: PixelRepresentation,
    pub photometric_interpretation: PhotometricInterpretation,
}

impl ImageDescription {
    /// Gather and validate the image attributes of the given container.
    pub fn from_container<C: ?Sized + PixelContainer>(obj: &C) -> Result<Self> {
        let bits_allocated = bits_allocated(obj)?;
        let pixel_representation = pixel_representation(obj)?;
        let photometric_interpretation = photometric_interpretation(obj)?;
        let samples_per_pixel = photometric_interpretation.samples_per_pixel();
        if let Some(declared) = obj.samples_per_pixel() {
            ensure!(
                declared == samples_per_pixel,
                InvalidValueSnafu {
                    name: "SamplesPerPixel",
                    value: declared.to_string(),
                }
            );
        }

        Ok(ImageDescription {
            rows: rows(obj)?,
            cols: cols(obj)?,
            number_of_frames: number_of_frames(obj)?,
            samples_per_pixel,
            planar_configuration: obj.planar_configuration().unwrap_or(0),
            bits_allocated,
            pixel_representation,
            photometric_interpretation,
        })
    }

    /// The number of pixels in a single frame.
    #[inline]
    pub fn pixels_per_frame(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// The number of bytes of a single native frame.
    #[inline]
    pub fn frame_size(&self) -> usize {
        self.pixels_per_frame() * self.samples_per_pixel as usize * self.bits_allocated.bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, InMemContainer};
    use rstest::rstest;

    #[rstest(bits, case(0), case(1), case(12), case(32), case(42))]
    fn unsupported_bits_allocated(bits: u16) {
        assert!(matches!(
            validate(bits, 0),
            Err(Error::InvalidBitDepth { value, .. }) if value == bits
        ));
    }

    #[rstest(repr, case(2), case(42), case(u16::MAX))]
    fn unsupported_pixel_representation(repr: u16) {
        assert!(matches!(
            validate(16, repr),
            Err(Error::InvalidPixelRepresentation { value, .. }) if value == repr
        ));
    }

    #[test]
    fn bit_depth_is_checked_first() {
        assert!(matches!(
            validate(42, 42),
            Err(Error::InvalidBitDepth { .. })
        ));
    }

    #[test]
    fn supported_combinations() {
        assert_eq!(
            validate(8, 0).unwrap(),
            (BitsAllocated::Eight, PixelRepresentation::Unsigned)
        );
        assert_eq!(
            validate(16, 1).unwrap(),
            (BitsAllocated::Sixteen, PixelRepresentation::Signed)
        );
    }

    #[test]
    fn photometric_interpretation_aliases() {
        assert_eq!(
            PhotometricInterpretation::parse("PALETTE COLOR "),
            Some(PhotometricInterpretation::PaletteColor)
        );
        assert_eq!(
            PhotometricInterpretation::parse("PALETTE_COLOR"),
            Some(PhotometricInterpretation::PaletteColor)
        );
        assert_eq!(
            PhotometricInterpretation::parse("MONOCHROME2\0"),
            Some(PhotometricInterpretation::Monochrome2)
        );
        assert_eq!(PhotometricInterpretation::parse("HSV"), None);
    }

    #[test]
    fn description_infers_photometric_interpretation() {
        let obj = InMemContainer::new()
            .with_rows(4)
            .with_cols(3)
            .with_bits_allocated(16)
            .with_samples_per_pixel(3);
        let description = ImageDescription::from_container(&obj).unwrap();
        assert_eq!(
            description.photometric_interpretation,
            PhotometricInterpretation::Rgb
        );
        assert_eq!(description.number_of_frames, 1);
        assert_eq!(description.frame_size(), 4 * 3 * 3 * 2);
    }

    #[test]
    fn description_rejects_unknown_photometric_interpretation() {
        let obj = InMemContainer::monochrome(2, 2, 8, 0, vec![0; 4])
            .with_photometric_interpretation("MONOCHROME1");
        assert!(matches!(
            ImageDescription::from_container(&obj),
            Err(Error::UnsupportedPhotometricInterpretation { pi, .. }) if pi == "MONOCHROME1"
        ));
    }

    #[test]
    fn description_requires_rows() {
        let obj = InMemContainer::new()
            .with_cols(3)
            .with_bits_allocated(8)
            .with_photometric_interpretation("MONOCHROME2");
        assert!(matches!(
            ImageDescription::from_container(&obj),
            Err(Error::MissingAttribute { name: "Rows", .. })
        ));
    }
}
