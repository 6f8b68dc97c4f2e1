//! Palette color lookup tables,
//! which turn the stored index of a `PALETTE COLOR` image into RGB.

use byteorder::{ByteOrder, LittleEndian};

use crate::attribute::BitsAllocated;

/// The descriptor of a single palette color lookup table channel.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub struct LutDescriptor {
    /// the number of entries in the table
    entries: u32,
    /// the first stored value mapped by the table
    pub first_mapped: u16,
    /// the number of bits per table entry
    pub bits: u16,
}

impl LutDescriptor {
    /// Create a descriptor from its three stored values.
    /// An entry count of zero means that there are 2^16 entries.
    ///
    /// Returns `None` if `bits` is not 8 or 16.
    pub fn new(entries: u16, first_mapped: u16, bits: u16) -> Option<Self> {
        if bits != 8 && bits != 16 {
            return None;
        }
        Some(LutDescriptor {
            entries: if entries == 0 { 65_536 } else { entries as u32 },
            first_mapped,
            bits,
        })
    }

    /// Create a descriptor from the value of a _LUT Descriptor_ attribute.
    pub fn from_values(values: &[u16]) -> Option<Self> {
        match values {
            [entries, first_mapped, bits, ..] => Self::new(*entries, *first_mapped, *bits),
            _ => None,
        }
    }

    /// The number of entries in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// One channel of a palette color lookup table.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteLutChannel {
    descriptor: LutDescriptor,
    data: Vec<u16>,
}

impl PaletteLutChannel {
    /// Create a channel from its descriptor and entries.
    ///
    /// Returns `None` if the number of entries
    /// does not match the descriptor.
    pub fn new(descriptor: LutDescriptor, mut data: Vec<u16>) -> Option<Self> {
        if data.len() != descriptor.len() {
            return None;
        }
        if descriptor.bits < 16 {
            let mask = (1 << descriptor.bits) - 1;
            for entry in data.iter_mut() {
                *entry &= mask;
            }
        }
        Some(PaletteLutChannel { descriptor, data })
    }

    /// Create a channel from the little endian bytes of a _LUT Data_ attribute.
    ///
    /// 8-bit tables may hold one entry per byte
    /// or one entry per 16-bit word.
    pub fn from_bytes(descriptor: LutDescriptor, bytes: &[u8]) -> Option<Self> {
        let entries = descriptor.len();
        let data = if bytes.len() == entries * 2 {
            let mut data = vec![0; entries];
            LittleEndian::read_u16_into(bytes, &mut data);
            data
        } else if bytes.len() == entries && descriptor.bits == 8 {
            bytes.iter().map(|&b| u16::from(b)).collect()
        } else {
            return None;
        };
        Self::new(descriptor, data)
    }

    #[inline]
    pub fn descriptor(&self) -> LutDescriptor {
        self.descriptor
    }

    /// Look up a stored value, normalized to 8 bits.
    ///
    /// Values outside of the table's input range
    /// map to its first or last entry.
    pub fn lookup(&self, index: u16) -> u8 {
        let offset = (index.saturating_sub(self.descriptor.first_mapped) as usize)
            .min(self.data.len() - 1);
        let max = ((1u32 << self.descriptor.bits) - 1) as f64;
        let value = self.data[offset] as f64;
        (value * 255. / max).round() as u8
    }
}

/// A palette color lookup table with red, green and blue channels.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteLut {
    pub red: PaletteLutChannel,
    pub green: PaletteLutChannel,
    pub blue: PaletteLutChannel,
}

impl PaletteLut {
    pub fn new(red: PaletteLutChannel, green: PaletteLutChannel, blue: PaletteLutChannel) -> Self {
        PaletteLut { red, green, blue }
    }

    /// Look up the 8-bit RGB color of a stored index.
    pub fn lookup(&self, index: u16) -> [u8; 3] {
        [
            self.red.lookup(index),
            self.green.lookup(index),
            self.blue.lookup(index),
        ]
    }

    /// Tabulate the color of every possible stored index
    /// at the given bit depth.
    pub fn to_table(&self, bits: BitsAllocated) -> Vec<[u8; 3]> {
        let size = 1usize << bits.bits();
        (0..size).map(|i| self.lookup(i as u16)).collect()
    }
}
