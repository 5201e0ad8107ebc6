//! Shared types for the rinkaku contour-to-mask pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` (8-bit single channel) so downstream crates can
/// reference persisted raster data without depending on `image` directly.
pub use image::GrayImage;

/// A decoded scan slice: 16-bit single-channel intensity grid.
///
/// Clinical per-slice containers typically carry unsigned integer pixel
/// depths above 8 bits, so the in-memory representation is `u16`; scaling
/// down to 8 bits happens only at the persistence boundary.
pub type SliceImage = image::ImageBuffer<image::Luma<u16>, Vec<u16>>;

/// A 2D vertex in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An ordered sequence of vertices forming a boundary annotation.
///
/// The polygon is implicitly closed: the last vertex connects back to the
/// first. Vertex order defines the polygon and is preserved exactly as
/// parsed — no deduplication, no reordering. An empty contour is valid and
/// means "no boundary present".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contour(Vec<Point>);

impl Contour {
    /// Create a new contour from a vector of vertices.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the contour has no vertices.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of vertices in the contour.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all vertices.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the contour and returns the underlying vertex vector.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an existing slice image.
    #[must_use]
    pub fn of(image: &SliceImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }
}

/// A binary raster marking the pixels enclosed by a contour.
///
/// Row-major `height × width` boolean grid. A mask always has the same
/// dimensions as the slice image it was rasterized against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl Mask {
    /// Create an all-`false` mask of the given dimensions.
    #[must_use]
    pub fn all_false(dimensions: Dimensions) -> Self {
        Self {
            width: dimensions.width,
            height: dimensions.height,
            data: vec![false; dimensions.width as usize * dimensions.height as usize],
        }
    }

    /// Dimensions of the mask.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }

    /// Value at `(x, y)`. Out-of-bounds coordinates read as `false`.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.data
            .get(y as usize * self.width as usize + x as usize)
            .copied()
            .unwrap_or(false)
    }

    /// Set the value at `(x, y)`. Out-of-bounds coordinates are ignored.
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = y as usize * self.width as usize + x as usize;
        if let Some(cell) = self.data.get_mut(index) {
            *cell = value;
        }
    }

    /// Number of `true` pixels.
    #[must_use]
    pub fn true_count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Iterate over the coordinates of all `true` pixels in row-major order.
    pub fn true_pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let width = self.width as usize;
        self.data
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v)
            .map(move |(i, _)| ((i % width) as u32, (i / width) as u32))
    }

    /// Render the mask as an 8-bit grayscale image: `true` → 255, `false` → 0.
    #[must_use]
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            image::Luma([if self.get(x, y) { 255 } else { 0 }])
        })
    }
}
