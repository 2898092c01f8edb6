use std::path::PathBuf;
use image::ImageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Input image not found: {}", .path.display())]
    Missing { path: PathBuf },

    #[error("Failed to decode {}: {source}", .path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: ImageError,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Encoding {
        path: PathBuf,
        #[source]
        source: ImageError,
    },

    #[error("Resize error: {0}")]
    Resize(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// True for failures attributable to the source image rather than the output.
    pub fn is_input(&self) -> bool {
        matches!(self, Error::Missing { .. } | Error::Input { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
