mod background_remover;
mod config;
mod edge_zone;
mod transparency_mask;
pub mod error;
pub mod export;
pub mod pipeline;

pub use crate::background_remover::{average_brightness, distance_from_white, BackgroundRemover, RemovalReport};
pub use crate::config::RemovalConfig;
pub use crate::edge_zone::{EdgeZone, Thresholds, ZoneBounds};
pub use crate::error::{Error, Result};
pub use crate::transparency_mask::TransparencyMask;
