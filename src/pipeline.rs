use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use image::{DynamicImage, ImageError};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use crate::background_remover::{BackgroundRemover, RemovalReport};
use crate::error::{Error, Result};
use crate::export::{encode_png, thumbnail, PngCompression};
use crate::transparency_mask::TransparencyMask;

pub const DEFAULT_THUMBNAIL_SIZE: u32 = 512;

/// When to run background removal on a source image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalMode {
    /// Only for sources that carry no alpha channel of their own (e.g. JPEG)
    #[default]
    Auto,
    Always,
    /// Pass the image through with an opaque alpha channel added if missing
    Never,
}

impl RemovalMode {
    pub fn applies_to(&self, image: &DynamicImage) -> bool {
        match self {
            RemovalMode::Auto => !image.color().has_alpha(),
            RemovalMode::Always => true,
            RemovalMode::Never => false,
        }
    }
}

impl FromStr for RemovalMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(RemovalMode::Auto),
            "always" => Ok(RemovalMode::Always),
            "never" => Ok(RemovalMode::Never),
            other => Err(format!("unknown mode '{other}', expected auto, always or never")),
        }
    }
}

/// Where one logo is read from and written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoJob {
    pub input: PathBuf,
    /// Full-size transparent PNG
    pub output: PathBuf,
    /// Optional bounded-size PNG
    pub thumbnail: Option<PathBuf>,
    /// Optional grayscale preview of the erased region
    pub mask: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub mode: RemovalMode,
    pub thumbnail_size: u32,
    pub compression: PngCompression,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            mode: RemovalMode::Auto,
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            compression: PngCompression::Best,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogoOutcome {
    pub width: u32,
    pub height: u32,
    /// `None` when removal was skipped for this source
    pub report: Option<RemovalReport>,
    pub thumbnail_dimensions: Option<(u32, u32)>,
}

pub fn load_image(path: &Path) -> Result<DynamicImage> {
    if !path.is_file() {
        return Err(Error::Missing { path: path.to_path_buf() });
    }
    image::open(path).map_err(|source| Error::Input {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode, clean and export one logo.
///
/// Every output is encoded in memory and staged in a temporary file beside
/// its destination. Destinations are only replaced once every output has
/// been staged, so a failed write leaves files from earlier runs intact.
pub fn process_logo(job: &LogoJob, remover: &BackgroundRemover, options: &ExportOptions) -> Result<LogoOutcome> {
    let source = load_image(&job.input)?;
    let (width, height) = (source.width(), source.height());
    info!(input = %job.input.display(), width, height, "Processing logo");

    let (rgba, report) = if options.mode.applies_to(&source) {
        let (rgba, report) = remover.remove_background_dynamic(&source);
        (rgba, Some(report))
    } else {
        debug!(mode = ?options.mode, "Skipping background removal");
        (source.to_rgba8(), None)
    };
    drop(source);

    let mut outputs: Vec<(PathBuf, Vec<u8>)> = Vec::new();
    let mut thumbnail_dimensions = None;

    if let Some(thumbnail_path) = &job.thumbnail {
        let small = thumbnail(&rgba, options.thumbnail_size)?;
        thumbnail_dimensions = Some(small.dimensions());
        let bytes = encode(&DynamicImage::ImageRgba8(small), thumbnail_path, options.compression)?;
        outputs.push((thumbnail_path.clone(), bytes));
    }

    if let Some(mask_path) = &job.mask {
        let mask = TransparencyMask::from_alpha(&rgba);
        debug!(transparent = mask.count_transparent(), "Rendering mask preview");
        let bytes = encode(&DynamicImage::ImageLuma8(mask.to_luma()), mask_path, options.compression)?;
        outputs.push((mask_path.clone(), bytes));
    }

    let bytes = encode(&DynamicImage::ImageRgba8(rgba), &job.output, options.compression)?;
    outputs.insert(0, (job.output.clone(), bytes));

    write_outputs(&outputs)?;

    if let Some(report) = &report {
        info!(
            output = %job.output.display(),
            removed = report.removed(),
            ratio = %format!("{:.1}%", report.removed_ratio() * 100.0),
            "Background removed"
        );
    }

    Ok(LogoOutcome {
        width,
        height,
        report,
        thumbnail_dimensions,
    })
}

fn encode(image: &DynamicImage, path: &Path, compression: PngCompression) -> Result<Vec<u8>> {
    encode_png(image, compression).map_err(|source| Error::Encoding {
        path: path.to_path_buf(),
        source,
    })
}

fn write_outputs(outputs: &[(PathBuf, Vec<u8>)]) -> Result<()> {
    // Stage every file beside its destination first; an unpersisted
    // NamedTempFile removes itself on drop, so a failed write leaves
    // existing outputs untouched.
    let mut staged = Vec::with_capacity(outputs.len());
    for (path, bytes) in outputs {
        let file = stage(path, bytes).map_err(|source| Error::Encoding {
            path: path.clone(),
            source: ImageError::IoError(source),
        })?;
        staged.push((file, path));
    }

    for (file, path) in staged {
        file.persist(path).map_err(|e| Error::Encoding {
            path: path.clone(),
            source: ImageError::IoError(e.error),
        })?;
        debug!(path = %path.display(), "Wrote output");
    }
    Ok(())
}

fn stage(path: &Path, bytes: &[u8]) -> io::Result<NamedTempFile> {
    let dir = match path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)?;
            parent
        }
        None => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    Ok(file)
}
