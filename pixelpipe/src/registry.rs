//! The table of transfer syntaxes known to the pipeline.
//!
//! Each entry tells whether pixel data in that transfer syntax
//! is encapsulated, its byte order,
//! and which [`Codec`] (if any) decodes it.
//! Encapsulated transfer syntaxes without a codec are still listed,
//! so that their pixel data is recognized as compressed
//! and reported as a decode failure rather than read as native data.

use crate::codec::Codec;

/// Implicit VR Little Endian: Default Transfer Syntax for DICOM
pub const IMPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2";
/// Explicit VR Little Endian
pub const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";
/// Explicit VR Big Endian
pub const EXPLICIT_VR_BIG_ENDIAN: &str = "1.2.840.10008.1.2.2";
/// Deflated Explicit VR Little Endian
pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1.99";
/// JPEG Baseline (Process 1)
pub const JPEG_BASELINE: &str = "1.2.840.10008.1.2.4.50";
/// JPEG Extended (Process 2 & 4)
pub const JPEG_EXTENDED: &str = "1.2.840.10008.1.2.4.51";
/// JPEG Lossless, Non-Hierarchical (Process 14)
pub const JPEG_LOSSLESS_NON_HIERARCHICAL: &str = "1.2.840.10008.1.2.4.57";
/// RLE Lossless
pub const RLE_LOSSLESS: &str = "1.2.840.10008.1.2.5";
/// JPEG 2000 Image Compression (Lossless Only)
pub const JPEG_2000_IMAGE_COMPRESSION_LOSSLESS_ONLY: &str = "1.2.840.10008.1.2.4.90";
/// JPEG 2000 Image Compression
pub const JPEG_2000_IMAGE_COMPRESSION: &str = "1.2.840.10008.1.2.4.91";

/// A known transfer syntax.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TransferSyntaxEntry {
    /// the transfer syntax UID
    pub uid: &'static str,
    /// the name of the transfer syntax
    pub name: &'static str,
    /// whether pixel data is encapsulated in fragments
    pub encapsulated: bool,
    /// whether native pixel data is in big endian
    pub big_endian: bool,
    /// the codec able to decode the pixel data, if any
    pub codec: Option<Codec>,
}

const fn native(uid: &'static str, name: &'static str, big_endian: bool) -> TransferSyntaxEntry {
    TransferSyntaxEntry {
        uid,
        name,
        encapsulated: false,
        big_endian,
        codec: Some(Codec::Native),
    }
}

const fn encapsulated(
    uid: &'static str,
    name: &'static str,
    codec: Option<Codec>,
) -> TransferSyntaxEntry {
    TransferSyntaxEntry {
        uid,
        name,
        encapsulated: true,
        big_endian: false,
        codec,
    }
}

static ENTRIES: &[TransferSyntaxEntry] = &[
    native(IMPLICIT_VR_LITTLE_ENDIAN, "Implicit VR Little Endian", false),
    native(EXPLICIT_VR_LITTLE_ENDIAN, "Explicit VR Little Endian", false),
    native(EXPLICIT_VR_BIG_ENDIAN, "Explicit VR Big Endian", true),
    native(
        DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN,
        "Deflated Explicit VR Little Endian",
        false,
    ),
    encapsulated(
        JPEG_BASELINE,
        "JPEG Baseline (Process 1)",
        Some(Codec::BaselineDct),
    ),
    encapsulated(
        JPEG_EXTENDED,
        "JPEG Extended (Process 2 & 4)",
        Some(Codec::BaselineDct),
    ),
    encapsulated(RLE_LOSSLESS, "RLE Lossless", Some(Codec::RunLength)),
    encapsulated(
        JPEG_2000_IMAGE_COMPRESSION_LOSSLESS_ONLY,
        "JPEG 2000 Image Compression (Lossless Only)",
        Some(Codec::WaveletMultiframe),
    ),
    encapsulated(
        JPEG_2000_IMAGE_COMPRESSION,
        "JPEG 2000 Image Compression",
        Some(Codec::WaveletMultiframe),
    ),
    encapsulated(
        "1.2.840.10008.1.2.4.92",
        "JPEG 2000 Part 2 Multi-component Image Compression (Lossless Only)",
        Some(Codec::WaveletMultiframe),
    ),
    encapsulated(
        "1.2.840.10008.1.2.4.93",
        "JPEG 2000 Part 2 Multi-component Image Compression",
        Some(Codec::WaveletMultiframe),
    ),
    // -- encapsulated, no decoder available --
    encapsulated(
        "1.2.840.10008.1.2.1.98",
        "Encapsulated Uncompressed Explicit VR Little Endian",
        None,
    ),
    encapsulated(
        JPEG_LOSSLESS_NON_HIERARCHICAL,
        "JPEG Lossless, Non-Hierarchical (Process 14)",
        None,
    ),
    encapsulated(
        "1.2.840.10008.1.2.4.70",
        "JPEG Lossless, Non-Hierarchical, First-Order Prediction",
        None,
    ),
    encapsulated(
        "1.2.840.10008.1.2.4.80",
        "JPEG-LS Lossless Image Compression",
        None,
    ),
    encapsulated(
        "1.2.840.10008.1.2.4.81",
        "JPEG-LS Lossy (Near-Lossless) Image Compression",
        None,
    ),
    encapsulated(
        "1.2.840.10008.1.2.4.201",
        "High-Throughput JPEG 2000 Image Compression (Lossless Only)",
        None,
    ),
    encapsulated(
        "1.2.840.10008.1.2.4.202",
        "High-Throughput JPEG 2000 with RPCL Options Image Compression (Lossless Only)",
        None,
    ),
    encapsulated(
        "1.2.840.10008.1.2.4.203",
        "High-Throughput JPEG 2000 Image Compression",
        None,
    ),
    encapsulated("1.2.840.10008.1.2.4.110", "JPEG XL Lossless", None),
    encapsulated("1.2.840.10008.1.2.4.111", "JPEG XL Recompression", None),
    encapsulated("1.2.840.10008.1.2.4.112", "JPEG XL", None),
    encapsulated(
        "1.2.840.10008.1.2.4.100",
        "MPEG2 Main Profile / Main Level",
        None,
    ),
    encapsulated(
        "1.2.840.10008.1.2.4.101",
        "MPEG2 Main Profile / High Level",
        None,
    ),
    encapsulated(
        "1.2.840.10008.1.2.4.102",
        "MPEG-4 AVC/H.264 High Profile / Level 4.1",
        None,
    ),
    encapsulated(
        "1.2.840.10008.1.2.4.103",
        "MPEG-4 AVC/H.264 BD-Compatible High Profile / Level 4.1",
        None,
    ),
    encapsulated(
        "1.2.840.10008.1.2.4.104",
        "MPEG-4 AVC/H.264 High Profile / Level 4.2 For 2D Video",
        None,
    ),
    encapsulated(
        "1.2.840.10008.1.2.4.105",
        "MPEG-4 AVC/H.264 High Profile / Level 4.2 For 3D Video",
        None,
    ),
    encapsulated(
        "1.2.840.10008.1.2.4.106",
        "MPEG-4 AVC/H.264 Stereo High Profile / Level 4.2",
        None,
    ),
    encapsulated(
        "1.2.840.10008.1.2.4.107",
        "HEVC/H.265 Main Profile / Level 5.1",
        None,
    ),
    encapsulated(
        "1.2.840.10008.1.2.4.108",
        "HEVC/H.265 Main 10 Profile / Level 5.1",
        None,
    ),
];

/// Normalize a transfer syntax UID,
/// removing trailing padding characters.
pub fn normalize_uid(uid: &str) -> &str {
    uid.trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
}

/// Look up a transfer syntax by its UID.
pub fn get(uid: &str) -> Option<&'static TransferSyntaxEntry> {
    let uid = normalize_uid(uid);
    ENTRIES.iter().find(|entry| entry.uid == uid)
}

/// Iterate over all known transfer syntaxes.
pub fn entries() -> impl Iterator<Item = &'static TransferSyntaxEntry> {
    ENTRIES.iter()
}

/// Whether pixel data in the given transfer syntax is encapsulated.
///
/// Unrecognized transfer syntaxes are treated as native.
pub fn is_encapsulated(uid: &str) -> bool {
    get(uid).map(|entry| entry.encapsulated).unwrap_or(false)
}

/// Whether native pixel data in the given transfer syntax is big endian.
pub fn is_big_endian(uid: &str) -> bool {
    get(uid).map(|entry| entry.big_endian).unwrap_or(false)
}
