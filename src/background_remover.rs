use image::{DynamicImage, RgbaImage};
use rayon::prelude::*;
use tracing::debug;
use crate::config::RemovalConfig;
use crate::edge_zone::{EdgeZone, ZoneBounds};
use crate::error::Result;
use crate::transparency_mask::TransparencyMask;

const CHANNELS: usize = 4;
const ALPHA: usize = 3;

/// Pixel counts produced by one run of [`BackgroundRemover::remove_background`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovalReport {
    pub total_pixels: usize,
    /// Pixels erased by colour classification
    pub background_pixels: usize,
    /// Pixels erased by the neighbour-majority cleanup
    pub halo_pixels: usize,
}

impl RemovalReport {
    pub fn removed(&self) -> usize {
        self.background_pixels + self.halo_pixels
    }

    pub fn removed_ratio(&self) -> f64 {
        if self.total_pixels == 0 {
            0.0
        } else {
            self.removed() as f64 / self.total_pixels as f64
        }
    }
}

/// Erases near-white backdrops by writing zero alpha. Colour channels are never modified.
#[derive(Debug, Clone, Default)]
pub struct BackgroundRemover {
    config: RemovalConfig,
}

impl BackgroundRemover {

    pub fn new(config: RemovalConfig) -> Result<Self> {
        config.validate()?;
        Ok(BackgroundRemover { config })
    }

    /// Run both passes over `image` in place.
    pub fn remove_background(&self, image: &mut RgbaImage) -> RemovalReport {
        let (width, height) = image.dimensions();
        let background_pixels = self.classify_pixels(image);
        let halo_pixels = self.cleanup_halo(image);

        let report = RemovalReport {
            total_pixels: width as usize * height as usize,
            background_pixels,
            halo_pixels,
        };
        debug!(
            width,
            height,
            background = report.background_pixels,
            halo = report.halo_pixels,
            "Background removal complete"
        );
        report
    }

    /// Convert to RGBA (sources without alpha become fully opaque) and remove the background.
    pub fn remove_background_dynamic(&self, image: &DynamicImage) -> (RgbaImage, RemovalReport) {
        let mut rgba = image.to_rgba8();
        let report = self.remove_background(&mut rgba);
        (rgba, report)
    }

    /// Whether a pixel of colour `rgb` located in `zone` belongs to the backdrop.
    pub fn is_background(&self, rgb: [u8; 3], zone: EdgeZone) -> bool {
        let thresholds = self.config.thresholds(zone);
        let [r, g, b] = rgb;

        let distance = distance_from_white(rgb);
        let is_light = r > thresholds.white_threshold
            && g > thresholds.white_threshold
            && b > thresholds.white_threshold;
        let is_near_white = distance < thresholds.max_distance;

        // Vignetted backdrops drift slightly off-white but stay neutral
        let color_variance = r.abs_diff(g).max(g.abs_diff(b)).max(r.abs_diff(b));
        let gray_floor = f64::from(thresholds.white_threshold) - f64::from(self.config.gray_brightness_slack);
        let is_light_gray = color_variance < self.config.color_variance_limit
            && average_brightness(rgb) > gray_floor
            && is_near_white;

        (is_light && is_near_white) || is_light_gray
    }

    /// First pass: erase every pixel whose own colour and position mark it as backdrop.
    ///
    /// Returns the number of pixels that went from visible to transparent.
    pub fn classify_pixels(&self, image: &mut RgbaImage) -> usize {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return 0;
        }
        let bounds = ZoneBounds::new(width, height, self.config.edge_fraction);
        let row_len = width as usize * CHANNELS;
        let buffer: &mut [u8] = &mut **image;

        buffer
            .par_chunks_mut(row_len)
            .enumerate()
            .map(|(y, row)| {
                let mut erased = 0usize;
                for (x, pixel) in row.chunks_exact_mut(CHANNELS).enumerate() {
                    if pixel[ALPHA] == 0 {
                        continue;
                    }
                    let zone = bounds.zone(x as u32, y as u32);
                    if self.is_background([pixel[0], pixel[1], pixel[2]], zone) {
                        pixel[ALPHA] = 0;
                        erased += 1;
                    }
                }
                erased
            })
            .sum()
    }

    /// Second pass: erase light pixels mostly surrounded by transparency.
    ///
    /// Decisions are taken against a snapshot of the alpha channel so the
    /// result does not depend on visiting order. The outermost ring of pixels
    /// is never touched.
    pub fn cleanup_halo(&self, image: &mut RgbaImage) -> usize {
        let (width, height) = image.dimensions();
        if width < 3 || height < 3 {
            return 0;
        }
        let mask = TransparencyMask::from_alpha(image);
        let mask = &mask;
        let threshold = self.config.neighbor_cleanup_threshold;
        let floor = f64::from(self.config.cleanup_brightness_floor);
        let source: &RgbaImage = image;

        let halo: Vec<(u32, u32)> = (1..height - 1)
            .into_par_iter()
            .flat_map_iter(|y| {
                (1..width - 1)
                    .filter(move |&x| {
                        if mask.get(x, y) {
                            return false;
                        }
                        let [r, g, b, _] = source.get_pixel(x, y).0;
                        average_brightness([r, g, b]) > floor
                            && mask.transparent_neighbours(x, y) >= threshold
                    })
                    .map(move |x| (x, y))
            })
            .collect();

        for &(x, y) in &halo {
            image.get_pixel_mut(x, y).0[ALPHA] = 0;
        }
        halo.len()
    }
}

/// Euclidean distance in RGB space from pure white.
#[inline]
pub fn distance_from_white([r, g, b]: [u8; 3]) -> f64 {
    let dr = f64::from(255 - r);
    let dg = f64::from(255 - g);
    let db = f64::from(255 - b);
    (dr * dr + dg * dg + db * db).sqrt()
}

#[inline]
pub fn average_brightness([r, g, b]: [u8; 3]) -> f64 {
    (f64::from(r) + f64::from(g) + f64::from(b)) / 3.0
}
