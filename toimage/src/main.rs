//! A CLI tool for converting a DICOM image file
//! into one or more general purpose image files (e.g. PNG).
use std::path::{Path, PathBuf};

use clap::Parser;
use dicom_object::open_file;
use dicom_pixelpipe::{DecodeOptions, Decoded, PixelContainer, PixelDecoder};
use image::DynamicImage;
use snafu::{Report, ResultExt, Whatever};
use tracing::{error, info, Level};

/// Convert a DICOM file into an image
#[derive(Debug, Parser)]
struct App {
    /// Path to the DICOM file to convert
    file: PathBuf,

    /// Path to the output image
    /// (default is to replace input extension with `.png`)
    #[arg(short = 'o', long = "out")]
    output: Option<PathBuf>,

    /// Frame number (0-indexed)
    #[arg(short = 'F', long = "frame", default_value = "0", conflicts_with = "all")]
    frame_number: u32,

    /// Convert all frames,
    /// appending the frame number to each output file name
    #[arg(long = "all")]
    all: bool,

    /// Apply the given window center and width
    #[arg(
        long = "level",
        num_args = 2,
        value_names = ["CENTER", "WIDTH"],
        allow_negative_numbers = true,
        conflicts_with_all = ["level_default", "remap"]
    )]
    level: Option<Vec<f64>>,

    /// Apply the window stored in the file
    #[arg(long = "level-default", conflicts_with = "remap")]
    level_default: bool,

    /// Map the full range of sample values to the output range
    #[arg(long = "remap")]
    remap: bool,

    /// Print more information about the image and the output file
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

impl App {
    fn decode_options(&self) -> DecodeOptions {
        let options = DecodeOptions::new();
        match self.level.as_deref() {
            Some([center, width]) => options.level(*center, *width),
            _ if self.level_default => options.level_default(),
            _ if self.remap => options.remap(),
            _ => options,
        }
    }
}

/// The path of the output file for the given frame.
fn frame_path(output: &Path, frame: usize) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match output.extension() {
        Some(ext) => format!("{}-{}.{}", stem, frame, ext.to_string_lossy()),
        None => format!("{}-{}", stem, frame),
    };
    output.with_file_name(file_name)
}

fn save(image: &DynamicImage, path: &Path, verbose: bool) {
    image.save(path).unwrap_or_else(|e| {
        error!("{}", Report::from_error(e));
        std::process::exit(-4);
    });
    if verbose {
        info!("Image saved to {}", path.display());
    }
}

fn main() {
    let app = App::parse();
    let options = app.decode_options();
    let App {
        file,
        output,
        frame_number,
        all,
        verbose,
        ..
    } = app;

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
        let mut path = file.clone();
        path.set_extension("png");
        path
    });

    let obj = open_file(&file).unwrap_or_else(|e| {
        error!("{}", Report::from_error(e));
        std::process::exit(-1);
    });

    if verbose {
        info!(
            "{}x{} image, {} frame(s), transfer syntax {}",
            obj.cols().unwrap_or_default(),
            obj.rows().unwrap_or_default(),
            obj.number_of_frames().unwrap_or(1),
            obj.transfer_syntax_uid()
        );
    }

    if all {
        let images: Vec<DynamicImage> = obj.decode_all(&options).unwrap_or_else(|e| {
            error!("{}", Report::from_error(e));
            std::process::exit(-2);
        });
        if images.is_empty() {
            error!("No image could be obtained from {}", file.display());
            std::process::exit(-3);
        }
        for (i, image) in images.iter().enumerate() {
            save(image, &frame_path(&output, i), verbose);
        }
        return;
    }

    let decoded: Decoded<DynamicImage> =
        obj.decode_frame(frame_number, &options).unwrap_or_else(|e| {
            error!("{}", Report::from_error(e));
            std::process::exit(-2);
        });
    let image = match decoded {
        Decoded::Raster(image) => image,
        Decoded::NoData => {
            error!("{} has no pixel data", file.display());
            std::process::exit(-3);
        }
        Decoded::DecodeFailure => {
            error!(
                "Could not decode frame #{} of {}",
                frame_number,
                file.display()
            );
            std::process::exit(-3);
        }
    };

    save(&image, &output, verbose);
}

#[cfg(test)]
mod tests {
    use super::{frame_path, App};
    use clap::{CommandFactory, Parser};
    use dicom_pixelpipe::{VoiOption, WindowLevel};
    use std::path::Path;

    #[test]
    fn verify_cli() {
        App::command().debug_assert();
    }

    #[test]
    fn window_options() {
        let app = App::parse_from(["dicom-toimage", "a.dcm", "--level", "-40", "400"]);
        assert_eq!(
            app.decode_options().voi,
            VoiOption::Custom(WindowLevel::new(-40., 400.))
        );

        let app = App::parse_from(["dicom-toimage", "a.dcm", "--remap"]);
        assert_eq!(app.decode_options().voi, VoiOption::Remap);

        let app = App::parse_from(["dicom-toimage", "a.dcm"]);
        assert_eq!(app.decode_options().voi, VoiOption::Identity);

        assert!(App::try_parse_from(["dicom-toimage", "a.dcm", "--remap", "--level-default"]).is_err());
    }

    #[test]
    fn numbered_frame_paths() {
        assert_eq!(
            frame_path(Path::new("out/image.png"), 3),
            Path::new("out/image-3.png")
        );
        assert_eq!(frame_path(Path::new("image"), 0), Path::new("image-0"));
    }
}
