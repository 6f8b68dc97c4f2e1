//! Decoded frames of stored sample values.

use byteorder::{ByteOrder, LittleEndian};

use crate::attribute::BitsAllocated;

/// A single frame of decoded pixel data,
/// before any value transformation.
///
/// Samples are stored row by row,
/// with the samples of each pixel interleaved,
/// using 1 or 2 bytes per sample in little endian.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    pub rows: u16,
    pub columns: u16,
    pub samples_per_pixel: u16,
    pub bits: BitsAllocated,
    pub data: Vec<u8>,
}

impl RawFrame {
    /// Create a raw frame,
    /// checking that the data has exactly the expected length.
    pub fn new(
        rows: u16,
        columns: u16,
        samples_per_pixel: u16,
        bits: BitsAllocated,
        data: Vec<u8>,
    ) -> Option<Self> {
        let frame = RawFrame {
            rows,
            columns,
            samples_per_pixel,
            bits,
            data,
        };
        if frame.data.len() == frame.expected_len() {
            Some(frame)
        } else {
            None
        }
    }

    /// The number of bytes that this frame's geometry requires.
    #[inline]
    pub fn expected_len(&self) -> usize {
        self.sample_count() * self.bits.bytes()
    }

    /// The total number of samples in the frame.
    #[inline]
    pub fn sample_count(&self) -> usize {
        self.rows as usize * self.columns as usize * self.samples_per_pixel as usize
    }

    /// Fetch the raw sample value at the given sample index.
    ///
    /// Signed samples are returned with their bits as stored.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    #[inline]
    pub fn sample(&self, index: usize) -> u16 {
        match self.bits {
            BitsAllocated::Eight => self.data[index] as u16,
            BitsAllocated::Sixteen => LittleEndian::read_u16(&self.data[index * 2..index * 2 + 2]),
        }
    }

    /// Iterate over all raw sample values in storage order.
    pub fn samples(&self) -> impl Iterator<Item = u16> + '_ {
        let bytes = self.bits.bytes();
        self.data.chunks_exact(bytes).map(move |chunk| match bytes {
            1 => chunk[0] as u16,
            _ => LittleEndian::read_u16(chunk),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_length_is_checked() {
        assert!(RawFrame::new(2, 2, 1, BitsAllocated::Eight, vec![0; 4]).is_some());
        assert!(RawFrame::new(2, 2, 1, BitsAllocated::Sixteen, vec![0; 4]).is_none());
        assert!(RawFrame::new(2, 2, 3, BitsAllocated::Sixteen, vec![0; 24]).is_some());
    }

    #[test]
    fn samples_are_little_endian() {
        let frame =
            RawFrame::new(1, 2, 1, BitsAllocated::Sixteen, vec![0x01, 0x02, 0xFF, 0xFF]).unwrap();
        assert_eq!(frame.sample(0), 0x0201);
        assert_eq!(frame.sample(1), 0xFFFF);
        assert_eq!(frame.samples().collect::<Vec<_>>(), vec![0x0201, 0xFFFF]);
    }
}
