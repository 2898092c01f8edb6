use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use whiteout::export::PngCompression;
use whiteout::pipeline::{RemovalMode, DEFAULT_THUMBNAIL_SIZE};
use whiteout::RemovalConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Config {
    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,
    /// Input settings
    #[serde(default)]
    pub input: InputConfig,
    /// Background removal thresholds
    #[serde(default)]
    pub removal: RemovalConfig,
    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
    /// Batch processing settings
    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct InputConfig {
    /// Input image file path or directory path
    pub input: PathBuf,
    /// When to run background removal
    pub mode: RemovalMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct OutputConfig {
    /// Full-size output file, or output folder in batch mode
    pub output: Option<PathBuf>,
    /// Bounded-size output file (single file mode)
    pub thumbnail: Option<PathBuf>,
    /// Write thumbnails into `<output>/thumbnails` in batch mode
    pub thumbnails: bool,
    /// Largest side of the thumbnail, in pixels
    pub thumbnail_size: u32,
    /// PNG compression level
    pub compression: PngCompression,
    /// Save a grayscale preview of the erased region next to each output
    pub save_mask: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct BatchConfig {
    /// File patterns to include in batch processing
    pub include_patterns: Vec<String>,
    /// File patterns to exclude from batch processing
    pub exclude_patterns: Vec<String>,
    /// Number of parallel workers, 0 for one per core
    pub workers: usize,
    /// Continue batch processing even if some files fail
    pub continue_on_error: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            input: PathBuf::from("logo.jpg"),
            mode: RemovalMode::Auto,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            output: None,
            thumbnail: None,
            thumbnails: true,
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            compression: PngCompression::Best,
            save_mask: false,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            include_patterns: vec![
                "*.png".to_string(),
                "*.jpg".to_string(),
                "*.jpeg".to_string(),
                "*.bmp".to_string(),
                "*.tiff".to_string(),
                "*.webp".to_string(),
            ],
            exclude_patterns: vec![],
            workers: 0,
            continue_on_error: false,
        }
    }
}

impl Config {

    pub fn load(config_path: &Path) -> anyhow::Result<Config> {
        let config_str = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
        let config: Config = match config_path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&config_str)
                .with_context(|| format!("Invalid JSON config {}", config_path.display()))?,
            Some("toml") => toml::from_str(&config_str)
                .with_context(|| format!("Invalid TOML config {}", config_path.display()))?,
            _ => bail!("Unsupported config file format. Use .json or .toml"),
        };
        Ok(config)
    }

    pub fn to_string_for(&self, config_path: &Path) -> anyhow::Result<String> {
        let config_str = match config_path.extension().and_then(|s| s.to_str()) {
            Some("toml") => toml::to_string_pretty(self)?,
            _ => serde_json::to_string_pretty(self)?, // Default to JSON
        };
        Ok(config_str)
    }

    pub fn save_default(config_path: &Path) -> anyhow::Result<()> {
        let config_str = Config::default().to_string_for(config_path)?;
        fs::write(config_path, config_str)
            .with_context(|| format!("Failed to write config file {}", config_path.display()))?;
        println!("Generated default configuration file: {}", config_path.display());
        Ok(())
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let text = Config::default().to_string_for(Path::new("whiteout.toml")).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.removal, RemovalConfig::default());
        assert_eq!(parsed.output.thumbnail_size, DEFAULT_THUMBNAIL_SIZE);
        assert_eq!(parsed.batch.include_patterns.len(), 6);
    }

    #[test]
    fn default_config_round_trips_through_json() {
        let text = Config::default().to_string_for(Path::new("whiteout.json")).unwrap();
        let parsed: Config = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.removal, RemovalConfig::default());
        assert_eq!(parsed.input.mode, RemovalMode::Auto);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [input]
            input = "brand-kit/logo.jpg"
            mode = "always"

            [removal]
            white_threshold = 230
            "#,
        )
        .unwrap();
        assert_eq!(parsed.input.mode, RemovalMode::Always);
        assert_eq!(parsed.removal.white_threshold, 230);
        assert_eq!(parsed.removal.max_distance, 60.0);
        assert_eq!(parsed.output.compression, PngCompression::Best);
    }
}
