//! Private module for pixel sample value transformation functions.

use tracing::warn;

use crate::attribute::{BitsAllocated, PixelRepresentation};
use crate::container::PixelContainer;

/// Description of a modality rescale function,
/// defined by a _rescale slope_ and _rescale intercept_.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rescale {
    /// the rescale slope
    pub slope: f64,
    /// the rescale intercept
    pub intercept: f64,
}

impl Rescale {
    /// Create a new rescale function.
    #[inline]
    pub fn new(slope: f64, intercept: f64) -> Self {
        Rescale { slope, intercept }
    }

    /// Apply the rescale function to a value.
    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        self.slope * value + self.intercept
    }

    /// Whether this function leaves values unchanged.
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.slope == 1. && self.intercept == 0.
    }
}

impl Default for Rescale {
    fn default() -> Self {
        Rescale::new(1., 0.)
    }
}

/// The parameters of a single window level,
/// comprising the window center and the window width.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WindowLevel {
    /// The _Window Width_.
    ///
    /// Windows of width 0 or lower are not applied.
    pub width: f64,
    /// The _Window Center_.
    pub center: f64,
}

impl WindowLevel {
    #[inline]
    pub fn new(center: f64, width: f64) -> Self {
        WindowLevel { width, center }
    }

    /// The window which covers the range from `min` to `max`.
    pub fn from_range(min: f64, max: f64) -> Self {
        let width = max - min;
        WindowLevel {
            width,
            center: min + width / 2.,
        }
    }
}

/// Which window to apply to monochrome and RGB samples when decoding.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub enum VoiOption {
    /// No windowing: stored values are clamped to the 8-bit range.
    #[default]
    Identity,
    /// Apply the window stored in the object.
    Default,
    /// Apply the given window.
    Custom(WindowLevel),
    /// Map the full range of the sample type onto the 8-bit range.
    Remap,
}

/// The fully resolved parameters of the value transform.
///
/// With no window, stored values are clamped to `[0, 255]`.
/// With a window of positive width,
/// `x` (rescaled if a rescale is present)
/// maps to `(x - (center - width / 2)) * 255 / width`,
/// clamped to `[0, 255]` and rounded half away from zero.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct ValueTransform {
    pub rescale: Option<Rescale>,
    pub window: Option<WindowLevel>,
}

impl ValueTransform {
    /// The identity transform.
    pub const IDENTITY: ValueTransform = ValueTransform {
        rescale: None,
        window: None,
    };

    /// A transform applying only the given window.
    pub fn window(window: WindowLevel) -> Self {
        ValueTransform {
            rescale: None,
            window: Some(window),
        }
    }

    /// A transform applying a modality rescale and then a window.
    pub fn rescale_and_window(rescale: Rescale, window: WindowLevel) -> Self {
        ValueTransform {
            rescale: Some(rescale),
            window: Some(window),
        }
    }

    /// The window which maps the full range of the sample type,
    /// after the optional rescale, onto the 8-bit range.
    pub fn remap_window(
        bits: BitsAllocated,
        representation: PixelRepresentation,
        rescale: Option<Rescale>,
    ) -> WindowLevel {
        let (min, max) = sample_range(bits, representation);
        let (min, max) = match rescale {
            Some(rescale) => {
                let (a, b) = (rescale.apply(min), rescale.apply(max));
                (a.min(b), a.max(b))
            }
            None => (min, max),
        };
        WindowLevel::from_range(min, max)
    }

    /// Resolve the transform requested by `voi` for the given container.
    ///
    /// The modality rescale is only considered for monochrome samples
    /// and only when windowing is requested.
    /// If the container has no stored window,
    /// [`VoiOption::Default`] resolves to the identity transform.
    pub fn resolve<C>(
        obj: &C,
        voi: VoiOption,
        bits: BitsAllocated,
        representation: PixelRepresentation,
        monochrome: bool,
    ) -> Self
    where
        C: ?Sized + PixelContainer,
    {
        let rescale = if monochrome {
            let rescale = Rescale::new(
                obj.rescale_slope().unwrap_or(1.),
                obj.rescale_intercept().unwrap_or(0.),
            );
            Some(rescale).filter(|r| !r.is_identity())
        } else {
            None
        };

        match voi {
            VoiOption::Identity => ValueTransform::IDENTITY,
            VoiOption::Custom(window) => ValueTransform {
                rescale,
                window: Some(window),
            },
            VoiOption::Remap => ValueTransform {
                rescale,
                window: Some(Self::remap_window(bits, representation, rescale)),
            },
            VoiOption::Default => match (obj.window_center(), obj.window_width()) {
                (Some(center), Some(width)) => ValueTransform {
                    rescale,
                    window: Some(WindowLevel::new(center, width)),
                },
                _ => {
                    warn!("No window level stored in the object, leaving values untransformed");
                    ValueTransform::IDENTITY
                }
            },
        }
    }

    /// Apply the transform to an interpreted sample value.
    pub fn apply(&self, value: f64) -> u8 {
        match self.window {
            Some(window) if window.width > 0. => {
                let x = match self.rescale {
                    Some(rescale) => rescale.apply(value),
                    None => value,
                };
                let y = (x - (window.center - window.width / 2.)) * 255. / window.width;
                y.clamp(0., 255.).round() as u8
            }
            _ => value.clamp(0., 255.).round() as u8,
        }
    }
}

/// The full range of sample values at the given bit depth and representation.
pub(crate) fn sample_range(bits: BitsAllocated, representation: PixelRepresentation) -> (f64, f64) {
    let n = bits.bits() as i32;
    if representation.is_signed() {
        (-(2f64.powi(n - 1)), 2f64.powi(n - 1) - 1.)
    } else {
        (0., 2f64.powi(n) - 1.)
    }
}

/// Interpret a stored sample at the given bit depth and representation,
/// extending the sign of signed samples.
#[inline]
pub(crate) fn interpret(raw: u16, bits: BitsAllocated, representation: PixelRepresentation) -> f64 {
    match (bits, representation) {
        (BitsAllocated::Eight, PixelRepresentation::Unsigned) => (raw & 0xFF) as f64,
        (BitsAllocated::Eight, PixelRepresentation::Signed) => (raw as u8) as i8 as f64,
        (BitsAllocated::Sixteen, PixelRepresentation::Unsigned) => raw as f64,
        (BitsAllocated::Sixteen, PixelRepresentation::Signed) => raw as i16 as f64,
    }
}

/// Transform a stored sample value into an 8-bit display value.
///
/// The raw sample is interpreted at the given bit depth and representation,
/// then mapped through the resolved transform parameters.
///
/// ```
/// # use dicom_pixelpipe::{
/// #     transform, BitsAllocated, PixelRepresentation, ValueTransform, WindowLevel,
/// # };
/// let params = ValueTransform::window(WindowLevel::new(40., 80.));
/// let bits = BitsAllocated::Sixteen;
/// let repr = PixelRepresentation::Signed;
/// assert_eq!(transform(0, bits, repr, &params), 0);
/// assert_eq!(transform(40, bits, repr, &params), 128);
/// assert_eq!(transform(80, bits, repr, &params), 255);
/// assert_eq!(transform(-50_i16 as u16, bits, repr, &params), 0);
/// ```
pub fn transform(
    raw: u16,
    bits: BitsAllocated,
    representation: PixelRepresentation,
    params: &ValueTransform,
) -> u8 {
    params.apply(interpret(raw, bits, representation))
}
