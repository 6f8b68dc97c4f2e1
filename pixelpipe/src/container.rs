//! The interface between the pipeline and a DICOM object.
//!
//! The pipeline never parses DICOM data sets by itself.
//! Instead, it reaches the attributes it needs
//! through the [`PixelContainer`] trait.
//! [`InMemContainer`] is a self-contained implementation
//! for callers which already hold the attributes in memory.

use std::borrow::Cow;

use crate::palette::PaletteLut;
use crate::registry;

/// The raw _Pixel Data_ of a container, as stored.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData<'a> {
    /// native (uncompressed) pixel data,
    /// in the byte order of the transfer syntax
    Native(Cow<'a, [u8]>),
    /// encapsulated pixel data
    Encapsulated {
        /// the basic offset table, possibly empty
        offset_table: Cow<'a, [u32]>,
        /// the pixel data fragments, in order
        fragments: Vec<Cow<'a, [u8]>>,
    },
}

impl<'a> PixelData<'a> {
    /// Obtain a borrowed view of this pixel data.
    pub fn reborrow(&self) -> PixelData<'_> {
        match self {
            PixelData::Native(data) => PixelData::Native(Cow::Borrowed(data)),
            PixelData::Encapsulated {
                offset_table,
                fragments,
            } => PixelData::Encapsulated {
                offset_table: Cow::Borrowed(offset_table),
                fragments: fragments.iter().map(|f| Cow::Borrowed(&**f)).collect(),
            },
        }
    }

    /// Whether the pixel data is encapsulated in fragments.
    pub fn is_encapsulated(&self) -> bool {
        matches!(self, PixelData::Encapsulated { .. })
    }

    /// Convert into pixel data which owns its bytes.
    pub fn into_owned(self) -> PixelData<'static> {
        match self {
            PixelData::Native(data) => PixelData::Native(Cow::Owned(data.into_owned())),
            PixelData::Encapsulated {
                offset_table,
                fragments,
            } => PixelData::Encapsulated {
                offset_table: Cow::Owned(offset_table.into_owned()),
                fragments: fragments
                    .into_iter()
                    .map(|f| Cow::Owned(f.into_owned()))
                    .collect(),
            },
        }
    }
}

/// A DICOM object holding pixel data,
/// as seen by the decoding and encoding pipeline.
///
/// Attribute getters return `None` when the attribute is absent
/// or cannot be interpreted as the expected type.
/// Validation of the values themselves
/// happens in the pipeline.
pub trait PixelContainer {
    /// Return the object's transfer syntax UID.
    fn transfer_syntax_uid(&self) -> &str;

    /// Whether the pixel data is stored in a compressed (encapsulated) form.
    ///
    /// The default implementation consults the transfer syntax registry:
    /// unrecognized transfer syntaxes are not compressed.
    fn is_compressed(&self) -> bool {
        registry::is_encapsulated(self.transfer_syntax_uid())
    }

    /// Return the _Bits Allocated_, as declared.
    fn bits_allocated(&self) -> Option<u16>;

    /// Return the _Pixel Representation_, as declared.
    fn pixel_representation(&self) -> Option<u16>;

    /// Return the _Rows_.
    fn rows(&self) -> Option<u16>;

    /// Return the _Columns_.
    fn cols(&self) -> Option<u16>;

    /// Return the _Number Of Frames_.
    fn number_of_frames(&self) -> Option<u32>;

    /// Return the _Samples Per Pixel_.
    fn samples_per_pixel(&self) -> Option<u16>;

    /// Return the _Planar Configuration_.
    fn planar_configuration(&self) -> Option<u16>;

    /// Return the _Photometric Interpretation_ code string.
    fn photometric_interpretation(&self) -> Option<&str>;

    /// Return the palette color lookup table, if present and well formed.
    fn palette_lut(&self) -> Option<PaletteLut>;

    /// Return the first stored _Window Center_.
    fn window_center(&self) -> Option<f64>;

    /// Return the first stored _Window Width_.
    fn window_width(&self) -> Option<f64>;

    /// Return the _Rescale Slope_.
    fn rescale_slope(&self) -> Option<f64>;

    /// Return the _Rescale Intercept_.
    fn rescale_intercept(&self) -> Option<f64>;

    /// Return the raw pixel data, or `None` if the object has no pixel data.
    fn pixel_data(&self) -> Option<PixelData<'_>>;

    /// Replace the pixel data with the given native pixel data bytes.
    fn set_pixel_data(&mut self, data: Vec<u8>);
}

impl<T: ?Sized + PixelContainer> PixelContainer for &mut T {
    fn transfer_syntax_uid(&self) -> &str {
        (**self).transfer_syntax_uid()
    }
    fn is_compressed(&self) -> bool {
        (**self).is_compressed()
    }
    fn bits_allocated(&self) -> Option<u16> {
        (**self).bits_allocated()
    }
    fn pixel_representation(&self) -> Option<u16> {
        (**self).pixel_representation()
    }
    fn rows(&self) -> Option<u16> {
        (**self).rows()
    }
    fn cols(&self) -> Option<u16> {
        (**self).cols()
    }
    fn number_of_frames(&self) -> Option<u32> {
        (**self).number_of_frames()
    }
    fn samples_per_pixel(&self) -> Option<u16> {
        (**self).samples_per_pixel()
    }
    fn planar_configuration(&self) -> Option<u16> {
        (**self).planar_configuration()
    }
    fn photometric_interpretation(&self) -> Option<&str> {
        (**self).photometric_interpretation()
    }
    fn palette_lut(&self) -> Option<PaletteLut> {
        (**self).palette_lut()
    }
    fn window_center(&self) -> Option<f64> {
        (**self).window_center()
    }
    fn window_width(&self) -> Option<f64> {
        (**self).window_width()
    }
    fn rescale_slope(&self) -> Option<f64> {
        (**self).rescale_slope()
    }
    fn rescale_intercept(&self) -> Option<f64> {
        (**self).rescale_intercept()
    }
    fn pixel_data(&self) -> Option<PixelData<'_>> {
        (**self).pixel_data()
    }
    fn set_pixel_data(&mut self, data: Vec<u8>) {
        (**self).set_pixel_data(data)
    }
}

/// An owned, in-memory pixel data container.
///
/// All attributes are public and optional,
/// so that incomplete or invalid objects can be described as well.
/// The builder-style `with_*` methods are the easiest way to fill it in.
///
/// ```
/// # use dicom_pixelpipe::{InMemContainer, PixelContainer};
/// let obj = InMemContainer::new()
///     .with_transfer_syntax("1.2.840.10008.1.2.5")
///     .with_rows(64)
///     .with_cols(64)
///     .with_bits_allocated(8)
///     .with_photometric_interpretation("MONOCHROME2")
///     .with_encapsulated_pixel_data(vec![], vec![vec![0; 64]]);
/// assert!(obj.is_compressed());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct InMemContainer {
    pub transfer_syntax: String,
    /// overrides the registry's compression knowledge when set
    pub compressed: Option<bool>,
    pub bits_allocated: Option<u16>,
    pub pixel_representation: Option<u16>,
    pub rows: Option<u16>,
    pub cols: Option<u16>,
    pub number_of_frames: Option<u32>,
    pub samples_per_pixel: Option<u16>,
    pub planar_configuration: Option<u16>,
    pub photometric_interpretation: Option<String>,
    pub palette: Option<PaletteLut>,
    pub window_center: Option<f64>,
    pub window_width: Option<f64>,
    pub rescale_slope: Option<f64>,
    pub rescale_intercept: Option<f64>,
    pub pixel_data: Option<PixelData<'static>>,
}

impl Default for InMemContainer {
    fn default() -> Self {
        InMemContainer {
            transfer_syntax: registry::EXPLICIT_VR_LITTLE_ENDIAN.to_string(),
            compressed: None,
            bits_allocated: None,
            pixel_representation: None,
            rows: None,
            cols: None,
            number_of_frames: None,
            samples_per_pixel: None,
            planar_configuration: None,
            photometric_interpretation: None,
            palette: None,
            window_center: None,
            window_width: None,
            rescale_slope: None,
            rescale_intercept: None,
            pixel_data: None,
        }
    }
}

impl InMemContainer {
    /// Create an empty container
    /// with the _Explicit VR Little Endian_ transfer syntax.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a single frame `MONOCHROME2` container
    /// with the given native pixel data.
    pub fn monochrome(
        rows: u16,
        cols: u16,
        bits_allocated: u16,
        pixel_representation: u16,
        data: Vec<u8>,
    ) -> Self {
        Self::new()
            .with_rows(rows)
            .with_cols(cols)
            .with_bits_allocated(bits_allocated)
            .with_pixel_representation(pixel_representation)
            .with_samples_per_pixel(1)
            .with_photometric_interpretation("MONOCHROME2")
            .with_native_pixel_data(data)
    }

    pub fn with_transfer_syntax(mut self, uid: impl Into<String>) -> Self {
        self.transfer_syntax = uid.into();
        self
    }

    pub fn with_compressed(mut self, compressed: bool) -> Self {
        self.compressed = Some(compressed);
        self
    }

    pub fn with_bits_allocated(mut self, bits_allocated: u16) -> Self {
        self.bits_allocated = Some(bits_allocated);
        self
    }

    pub fn with_pixel_representation(mut self, pixel_representation: u16) -> Self {
        self.pixel_representation = Some(pixel_representation);
        self
    }

    pub fn with_rows(mut self, rows: u16) -> Self {
        self.rows = Some(rows);
        self
    }

    pub fn with_cols(mut self, cols: u16) -> Self {
        self.cols = Some(cols);
        self
    }

    pub fn with_number_of_frames(mut self, frames: u32) -> Self {
        self.number_of_frames = Some(frames);
        self
    }

    pub fn with_samples_per_pixel(mut self, samples_per_pixel: u16) -> Self {
        self.samples_per_pixel = Some(samples_per_pixel);
        self
    }

    pub fn with_planar_configuration(mut self, planar_configuration: u16) -> Self {
        self.planar_configuration = Some(planar_configuration);
        self
    }

    pub fn with_photometric_interpretation(mut self, pi: impl Into<String>) -> Self {
        self.photometric_interpretation = Some(pi.into());
        self
    }

    pub fn with_palette(mut self, palette: PaletteLut) -> Self {
        self.palette = Some(palette);
        self
    }

    /// Set the stored window center and width.
    pub fn with_window(mut self, center: f64, width: f64) -> Self {
        self.window_center = Some(center);
        self.window_width = Some(width);
        self
    }

    /// Set the modality rescale slope and intercept.
    pub fn with_rescale(mut self, slope: f64, intercept: f64) -> Self {
        self.rescale_slope = Some(slope);
        self.rescale_intercept = Some(intercept);
        self
    }

    pub fn with_native_pixel_data(mut self, data: Vec<u8>) -> Self {
        self.pixel_data = Some(PixelData::Native(Cow::Owned(data)));
        self
    }

    pub fn with_encapsulated_pixel_data(
        mut self,
        offset_table: Vec<u32>,
        fragments: Vec<Vec<u8>>,
    ) -> Self {
        self.pixel_data = Some(PixelData::Encapsulated {
            offset_table: Cow::Owned(offset_table),
            fragments: fragments.into_iter().map(Cow::Owned).collect(),
        });
        self
    }

    /// Obtain the native pixel data bytes,
    /// if the container holds native pixel data.
    pub fn pixel_data_bytes(&self) -> Option<&[u8]> {
        match &self.pixel_data {
            Some(PixelData::Native(data)) => Some(data),
            _ => None,
        }
    }
}

impl PixelContainer for InMemContainer {
    fn transfer_syntax_uid(&self) -> &str {
        &self.transfer_syntax
    }

    fn is_compressed(&self) -> bool {
        self.compressed
            .unwrap_or_else(|| registry::is_encapsulated(&self.transfer_syntax))
    }

    fn bits_allocated(&self) -> Option<u16> {
        self.bits_allocated
    }

    fn pixel_representation(&self) -> Option<u16> {
        self.pixel_representation
    }

    fn rows(&self) -> Option<u16> {
        self.rows
    }

    fn cols(&self) -> Option<u16> {
        self.cols
    }

    fn number_of_frames(&self) -> Option<u32> {
        self.number_of_frames
    }

    fn samples_per_pixel(&self) -> Option<u16> {
        self.samples_per_pixel
    }

    fn planar_configuration(&self) -> Option<u16> {
        self.planar_configuration
    }

    fn photometric_interpretation(&self) -> Option<&str> {
        self.photometric_interpretation.as_deref()
    }

    fn palette_lut(&self) -> Option<PaletteLut> {
        self.palette.clone()
    }

    fn window_center(&self) -> Option<f64> {
        self.window_center
    }

    fn window_width(&self) -> Option<f64> {
        self.window_width
    }

    fn rescale_slope(&self) -> Option<f64> {
        self.rescale_slope
    }

    fn rescale_intercept(&self) -> Option<f64> {
        self.rescale_intercept
    }

    fn pixel_data(&self) -> Option<PixelData<'_>> {
        self.pixel_data.as_ref().map(PixelData::reborrow)
    }

    fn set_pixel_data(&mut self, data: Vec<u8>) {
        self.pixel_data = Some(PixelData::Native(Cow::Owned(data)));
    }
}
