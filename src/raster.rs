//! Image stitching
//!
//! Decodes each input on its own, so one unreadable file only drops that
//! file, then lays the rest side by side (or stacked) on a white canvas and
//! encodes the result as JPEG.

use std::path::{Path, PathBuf};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImage, GenericImageView, Rgb, RgbImage};
use log::{debug, warn};

use crate::error::{Error, Result};

/// File name used for the stitched image when none is given
pub const DEFAULT_IMAGE_OUTPUT: &str = "merged_image.jpg";

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Which way images are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeDirection {
    /// Left to right, aligned to the top edge
    #[default]
    Horizontal,
    /// Top to bottom, aligned to the left edge
    Vertical,
}

/// A named image byte stream (PNG, JPEG or BMP)
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ImageInput {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// What happened to one input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { name: String, width: u32, height: u32 },
    Failed { name: String, reason: String },
}

impl LoadOutcome {
    pub fn name(&self) -> &str {
        match self {
            LoadOutcome::Loaded { name, .. } | LoadOutcome::Failed { name, .. } => name,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded { .. })
    }
}

/// Options for stitching images
#[derive(Debug, Clone, Copy)]
pub struct ImageMergeOptions {
    pub direction: MergeDirection,
    /// JPEG quality, 1-100
    pub quality: u8,
}

impl Default for ImageMergeOptions {
    fn default() -> Self {
        Self {
            direction: MergeDirection::Horizontal,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Result of stitching images
#[derive(Debug, Clone)]
pub struct ImageMergeOutcome {
    /// JPEG-encoded canvas
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// One outcome per input, in input order
    pub report: Vec<LoadOutcome>,
}

/// Canvas size for images of the given `(width, height)` sizes
pub fn canvas_size(sizes: &[(u32, u32)], direction: MergeDirection) -> (u32, u32) {
    match direction {
        MergeDirection::Horizontal => (
            sizes.iter().map(|&(w, _)| w).sum(),
            sizes.iter().map(|&(_, h)| h).max().unwrap_or(0),
        ),
        MergeDirection::Vertical => (
            sizes.iter().map(|&(w, _)| w).max().unwrap_or(0),
            sizes.iter().map(|&(_, h)| h).sum(),
        ),
    }
}

/// Paste `images` onto one white RGB canvas
pub fn stitch(images: &[DynamicImage], direction: MergeDirection) -> Result<RgbImage> {
    if images.is_empty() {
        return Err(Error::NoImages);
    }

    let sizes: Vec<(u32, u32)> = images.iter().map(|img| img.dimensions()).collect();
    let (width, height) = canvas_size(&sizes, direction);
    let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);

    let mut offset = 0;
    for image in images {
        let rgb = image.to_rgb8();
        match direction {
            MergeDirection::Horizontal => {
                canvas.copy_from(&rgb, offset, 0)?;
                offset += rgb.width();
            }
            MergeDirection::Vertical => {
                canvas.copy_from(&rgb, 0, offset)?;
                offset += rgb.height();
            }
        }
    }

    Ok(canvas)
}

/// Decode every input, stitch the readable ones and encode as JPEG
///
/// Unreadable inputs are reported and skipped. Fails with
/// [`Error::NoImages`] when nothing could be decoded.
pub fn merge_images(inputs: &[ImageInput], options: &ImageMergeOptions) -> Result<ImageMergeOutcome> {
    let decoded = inputs
        .iter()
        .map(|input| {
            let image = image::load_from_memory(&input.bytes).map_err(|e| e.to_string());
            (input.name.clone(), image)
        })
        .collect();

    stitch_decoded(decoded, options)
}

/// Read, stitch and write image files
///
/// Files that can't be read count as unreadable inputs, like files that
/// can't be decoded.
pub fn merge_image_files(
    paths: &[PathBuf],
    output: &Path,
    options: &ImageMergeOptions,
) -> Result<ImageMergeOutcome> {
    let decoded = paths
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let image = std::fs::read(path)
                .map_err(|e| e.to_string())
                .and_then(|bytes| image::load_from_memory(&bytes).map_err(|e| e.to_string()));
            (name, image)
        })
        .collect();

    let outcome = stitch_decoded(decoded, options)?;
    std::fs::write(output, &outcome.bytes)?;

    Ok(outcome)
}

fn stitch_decoded(
    decoded: Vec<(String, std::result::Result<DynamicImage, String>)>,
    options: &ImageMergeOptions,
) -> Result<ImageMergeOutcome> {
    let mut images = Vec::new();
    let mut report = Vec::new();

    for (name, result) in decoded {
        match result {
            Ok(image) => {
                let (width, height) = image.dimensions();
                debug!("{}: {}x{}", name, width, height);
                report.push(LoadOutcome::Loaded { name, width, height });
                images.push(image);
            }
            Err(reason) => {
                warn!("skipping {}: {}", name, reason);
                report.push(LoadOutcome::Failed { name, reason });
            }
        }
    }

    let canvas = stitch(&images, options.direction)?;
    let (width, height) = canvas.dimensions();

    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, options.quality.clamp(1, 100));
    DynamicImage::ImageRgb8(canvas).write_with_encoder(encoder)?;

    Ok(ImageMergeOutcome {
        bytes,
        width,
        height,
        report,
    })
}
