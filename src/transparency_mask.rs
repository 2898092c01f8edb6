use bit_vec::BitVec;
use image::{GrayImage, Luma, RgbaImage};

/// One bit per pixel, set where the pixel is fully transparent.
///
/// Built from an RGBA image as a frozen snapshot so that neighbourhood
/// queries never observe writes made while the snapshot is in use.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransparencyMask {
    width: u32,
    height: u32,
    buffer: BitVec,
}

const NEIGHBOURS: [(i32, i32); 8] = [(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)];

impl TransparencyMask {
    #[inline]
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            buffer: BitVec::from_elem(width as usize * height as usize, false),
        }
    }

    #[must_use]
    pub fn from_alpha(image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            buffer: image.pixels().map(|pixel| pixel.0[3] == 0).collect(),
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> bool {
        debug_assert!(x < self.width && y < self.height, "Pixel out of bounds");
        self.buffer.get(self.index(x, y)).unwrap_or(false)
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, transparent: bool) {
        debug_assert!(x < self.width && y < self.height, "Pixel out of bounds");
        let index = self.index(x, y);
        self.buffer.set(index, transparent);
    }

    /// Number of transparent pixels among the 8 surrounding `(x, y)`.
    ///
    /// Neighbours falling outside the image are not counted.
    #[must_use]
    pub fn transparent_neighbours(&self, x: u32, y: u32) -> u8 {
        let (x, y) = (x as i32, y as i32);
        NEIGHBOURS
            .iter()
            .map(|(dx, dy)| (x + dx, y + dy))
            .filter(|&(nx, ny)| {
                nx >= 0 && ny >= 0 && (nx as u32) < self.width && (ny as u32) < self.height
            })
            .filter(|&(nx, ny)| self.get(nx as u32, ny as u32))
            .count() as u8
    }

    #[must_use]
    pub fn count_transparent(&self) -> usize {
        self.buffer.iter().filter(|&bit| bit).count()
    }

    /// Render as a grayscale preview: opaque pixels white, transparent black.
    #[must_use]
    pub fn to_luma(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            if self.get(x, y) { Luma([0u8]) } else { Luma([255u8]) }
        })
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}
