//! Look-up table (LUT) implementation.
//!
//! This module contains the [`Lut`] data type,
//! designed to turn pixel data stored sample values
//! into displayable values
//! without evaluating the value transform for every sample.

use num_traits::NumCast;
#[cfg(feature = "rayon")]
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use snafu::{OptionExt, Snafu};

use crate::attribute::{BitsAllocated, PixelRepresentation};
use crate::transform::ValueTransform;

/// The LUT could not be created:
/// entry #{index} was mapped to {y_value},
/// which could not be cast to the target type.
#[derive(Debug, PartialEq, Snafu)]
pub struct CreateLutError {
    index: usize,
    y_value: f64,
}

impl CreateLutError {
    /// Get the original index in the LUT.
    pub fn index(&self) -> usize {
        self.index
    }
    /// Get the value which could not be converted to the target type.
    pub fn y_value(&self) -> f64 {
        self.y_value
    }
}

/// A look up table for pixel data sample value transformations.
///
/// # Example
///
/// ```
/// # use dicom_pixelpipe::{
/// #     BitsAllocated, CreateLutError, Lut, PixelRepresentation,
/// #     ValueTransform, WindowLevel,
/// # };
/// let lut = Lut::new_transform(
///     BitsAllocated::Eight,
///     PixelRepresentation::Unsigned,
///     &ValueTransform::window(WindowLevel::new(64., 128.)),
/// )?;
///
/// assert_eq!(lut.get(0_u16), 0);
/// assert_eq!(lut.get(64_u16), 128);
/// assert_eq!(lut.get(200_u16), 255);
/// # Result::<(), CreateLutError>::Ok(())
/// ```
#[derive(Debug)]
pub struct Lut<T> {
    /// the table which maps an index to a transformed value,
    /// of size 2 to the power of the number of bits per sample
    table: Vec<T>,
    /// whether the input sample values are signed (Pixel Representation = 1)
    signed: bool,
}

impl<T: 'static> Lut<T>
where
    T: NumCast,
    T: Copy,
    T: Send + Sync,
{
    /// Create a new LUT with the given characteristics
    /// and populate it with the outputs of the provided function.
    /// The function may be called concurrently.
    ///
    /// - `bits`:
    ///   the number of bits used to represent the sample values
    /// - `signed`:
    ///   whether the input sample values are expected to be signed
    ///   (_Pixel Representation_ = 1)
    /// - `f`: the mapping function
    ///
    /// # Panics
    ///
    /// Panics if `bits` is 0 or larger than 16.
    pub fn new_with_fn(
        bits: u16,
        signed: bool,
        f: impl Fn(f64) -> f64 + Sync,
    ) -> Result<Self, CreateLutError> {
        assert!(bits != 0 && bits <= 16);
        let size = 1_usize << bits;
        debug_assert!(size.is_power_of_two());

        #[cfg(feature = "rayon")]
        let iter = (0..size).into_par_iter();
        #[cfg(not(feature = "rayon"))]
        let iter = (0..size).into_iter();

        let table: Result<Vec<_>, _> = iter
            .map(|i| {
                // account for signedness to determine input pixel value
                let x = if signed && i >= size / 2 {
                    i as f64 - size as f64
                } else {
                    i as f64
                };
                let value = f(x);
                T::from(value).context(CreateLutSnafu {
                    index: i,
                    y_value: value,
                })
            })
            .collect();
        Ok(Self {
            table: table?,
            signed,
        })
    }

    /// Apply the transformation to a single pixel sample value.
    ///
    /// Signed sample values are accepted as well,
    /// with the bits reinterpreted as their unsigned counterpart.
    ///
    /// # Panics
    ///
    /// Panics if an unsigned `sample_value` is larger than the table.
    pub fn get<I: 'static>(&self, sample_value: I) -> T
    where
        I: Copy,
        I: Into<u32>,
    {
        let val = sample_value.into();
        let index = if self.signed {
            // adjust for signedness by masking out the extra sign bits
            let mask = self.table.len() - 1;
            val as usize & mask
        } else {
            val as usize
        };
        assert!(index < self.table.len());

        self.table[index]
    }

    /// Adapts an iterator of pixel data sample values
    /// to an iterator of transformed values.
    pub fn map_iter<'a, I: 'static>(
        &'a self,
        iter: impl IntoIterator<Item = I> + 'a,
    ) -> impl Iterator<Item = T> + 'a
    where
        I: Copy,
        I: Into<u32>,
    {
        iter.into_iter().map(move |i| self.get(i))
    }

    /// The number of entries in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Lut<u8> {
    /// Create a LUT tabulating the value transform
    /// for every sample value at the given bit depth and representation.
    ///
    /// Each entry equals [`transform`](crate::transform) of its index.
    pub fn new_transform(
        bits: BitsAllocated,
        representation: PixelRepresentation,
        params: &ValueTransform,
    ) -> Result<Self, CreateLutError> {
        Self::new_with_fn(bits.bits(), representation.is_signed(), |x| {
            params.apply(x) as f64
        })
    }
}
