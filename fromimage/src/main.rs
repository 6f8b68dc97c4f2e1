//! A CLI tool for overriding a DICOM file's image with another one.
//!
//! This command line tool takes a base DICOM file
//! and replaces the attributes of the _Image Pixel_ module
//! (Rows, Columns, Pixel Data, ...)
//! with those of an image file.
//! Samples are scaled to the full range of the chosen bit depth.
//! The _Presentation LUT Shape_ attribute is set to `IDENTITY`.
//! Other attributes are copied as is.
//!
//! The new DICOM object is saved to a new file,
//! with the same SOP instance UID and SOP class UID as the base file,
//! encoded in Explicit VR Little Endian.
use std::path::PathBuf;

use clap::Parser;
use dicom_core::{value::PrimitiveValue, DataElement, VR};
use dicom_dictionary_std::tags;
use dicom_object::{open_file, FileMetaTableBuilder};
use dicom_pixelpipe::{encode, registry, SampleSource};
use snafu::{Report, ResultExt, Whatever};
use tracing::{error, info, Level};

/// Convert and replace a DICOM file's image with another image
#[derive(Debug, Parser)]
struct App {
    /// Path to the base DICOM file to read
    dcm_file: PathBuf,
    /// Path to the image file to replace the DICOM file
    img_file: PathBuf,
    /// Path to the output image
    /// (default is to replace input extension with `.new.dcm`)
    #[arg(short = 'o', long = "out")]
    output: Option<PathBuf>,
    /// Bits allocated per sample in the new pixel data
    /// (default is the bit depth of the image)
    #[arg(long = "bits", value_parser = ["8", "16"])]
    bits: Option<String>,
    /// Write signed samples (Pixel Representation = 1)
    #[arg(long = "signed")]
    signed: bool,
    /// Print more information about the image and the output file
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() {
    let App {
        dcm_file,
        img_file,
        output,
        bits,
        signed,
        verbose,
    } = App::parse();

    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
            .finish(),
    )
    .whatever_context("Could not set up global logging subscriber")
    .unwrap_or_else(|e: Whatever| {
        eprintln!("[ERROR] {}", Report::from_error(e));
    });

    let output = output.unwrap_or_else(|| {
        let mut path = dcm_file.clone();
        path.set_extension("new.dcm");
        path
    });

    let obj = open_file(&dcm_file).unwrap_or_else(|e| {
        error!("{}", Report::from_error(e));
        std::process::exit(-1);
    });

    let img = image::open(&img_file).unwrap_or_else(|e| {
        error!("{}", Report::from_error(e));
        std::process::exit(-1);
    });

    let (pi, spp) = match img.channels() {
        1 => ("MONOCHROME2", 1_u16),
        _ => ("RGB", 3),
    };
    let bits_allocated: u16 = match bits.as_deref() {
        Some("8") => 8,
        Some(_) => 16,
        None if img.bit_depth() == 8 => 8,
        None => 16,
    };

    if verbose {
        info!(
            "{}x{} {:?} image, writing {}-bit {} samples",
            img.width(),
            img.height(),
            img.color(),
            bits_allocated,
            if signed { "signed" } else { "unsigned" }
        );
    }

    let class_uid = obj.meta().media_storage_sop_class_uid.clone();
    let instance_uid = obj.meta().media_storage_sop_instance_uid.clone();

    let mut obj = obj.into_inner();

    // override attributes at DICOM object
    obj.put(DataElement::new(
        tags::PHOTOMETRIC_INTERPRETATION,
        VR::CS,
        PrimitiveValue::from(pi),
    ));
    obj.put(DataElement::new(
        tags::PRESENTATION_LUT_SHAPE,
        VR::CS,
        PrimitiveValue::from("IDENTITY"),
    ));
    obj.put(DataElement::new(
        tags::SAMPLES_PER_PIXEL,
        VR::US,
        PrimitiveValue::from(spp),
    ));
    if spp > 1 {
        obj.put(DataElement::new(
            tags::PLANAR_CONFIGURATION,
            VR::US,
            PrimitiveValue::from(0_u16),
        ));
    } else {
        obj.remove_element(tags::PLANAR_CONFIGURATION);
    }
    obj.put(DataElement::new(
        tags::COLUMNS,
        VR::US,
        PrimitiveValue::from(img.width() as u16),
    ));
    obj.put(DataElement::new(
        tags::ROWS,
        VR::US,
        PrimitiveValue::from(img.height() as u16),
    ));
    obj.put(DataElement::new(
        tags::BITS_ALLOCATED,
        VR::US,
        PrimitiveValue::from(bits_allocated),
    ));
    obj.put(DataElement::new(
        tags::BITS_STORED,
        VR::US,
        PrimitiveValue::from(bits_allocated),
    ));
    obj.put(DataElement::new(
        tags::HIGH_BIT,
        VR::US,
        PrimitiveValue::from(bits_allocated - 1),
    ));
    obj.put(DataElement::new(
        tags::PIXEL_REPRESENTATION,
        VR::US,
        PrimitiveValue::from(u16::from(signed)),
    ));

    for tag in [
        tags::NUMBER_OF_FRAMES,
        tags::PIXEL_ASPECT_RATIO,
        tags::SMALLEST_IMAGE_PIXEL_VALUE,
        tags::LARGEST_IMAGE_PIXEL_VALUE,
        tags::PIXEL_PADDING_RANGE_LIMIT,
        tags::WINDOW_CENTER,
        tags::WINDOW_WIDTH,
        tags::RESCALE_SLOPE,
        tags::RESCALE_INTERCEPT,
        tags::RED_PALETTE_COLOR_LOOKUP_TABLE_DATA,
        tags::RED_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR,
        tags::GREEN_PALETTE_COLOR_LOOKUP_TABLE_DATA,
        tags::GREEN_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR,
        tags::BLUE_PALETTE_COLOR_LOOKUP_TABLE_DATA,
        tags::BLUE_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR,
        tags::ICC_PROFILE,
        tags::COLOR_SPACE,
        tags::PIXEL_DATA_PROVIDER_URL,
        tags::EXTENDED_OFFSET_TABLE,
        tags::EXTENDED_OFFSET_TABLE_LENGTHS,
    ] {
        obj.remove_element(tag);
    }

    let mut obj = obj
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax(registry::EXPLICIT_VR_LITTLE_ENDIAN)
                .media_storage_sop_class_uid(class_uid)
                .media_storage_sop_instance_uid(instance_uid),
        )
        .unwrap_or_else(|e| {
            error!("{}", Report::from_error(e));
            std::process::exit(-3);
        });

    encode(&mut obj, &img).unwrap_or_else(|e| {
        error!("{}", Report::from_error(e));
        std::process::exit(-2);
    });

    obj.write_to_file(&output).unwrap_or_else(|e| {
        error!("{}", Report::from_error(e));
        std::process::exit(-4);
    });

    if verbose {
        info!("DICOM file saved to {}", output.display());
    }
}
