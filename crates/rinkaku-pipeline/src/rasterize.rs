//! Polygon rasterization: convert a contour into a binary mask.
//!
//! Each pixel is tested at its center `(x + 0.5, y + 0.5)` with the
//! even-odd (ray-casting) rule. The boundary is inclusive: a pixel whose
//! center lies exactly on a polygon edge counts as inside, so the mask is
//! a superset-safe rasterization of the annotated region.
//!
//! Rasterization is deterministic and side-effect-free: the same contour
//! and dimensions always produce the identical grid. Degenerate contours
//! (fewer than 3 vertices) produce an all-`false` mask of the requested
//! size — never an error.

use geo::{BoundingRect, Coord, LineString, Rect};

use crate::types::{Contour, Dimensions, Mask, Point};

/// Absolute tolerance for the center-on-edge test.
///
/// Pixel centers sit at half-integer coordinates and annotation vertices
/// carry limited decimal precision, so collinearity shows up as a cross
/// product within rounding noise of zero.
const EDGE_EPSILON: f64 = 1e-9;

/// Rasterize a contour into a mask of the given dimensions.
///
/// Pixels whose center falls inside the implicitly closed polygon under
/// the even-odd rule (or exactly on one of its edges) are set to `true`.
/// Contours with fewer than 3 vertices yield an all-`false` mask.
#[must_use = "returns the rasterized mask"]
pub fn contour_to_mask(contour: &Contour, dimensions: Dimensions) -> Mask {
    let mut mask = Mask::all_false(dimensions);
    let points = contour.points();
    if points.len() < 3 {
        return mask;
    }

    let ring: LineString<f64> = points.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    let Some(bounds) = ring.bounding_rect() else {
        return mask;
    };

    // Only pixels whose center can fall inside the bounding box need the
    // full polygon test; everything outside stays false.
    let (x_range, y_range) = candidate_ranges(&bounds, dimensions);
    for y in y_range {
        let center_y = f64::from(y) + 0.5;
        for x in x_range.clone() {
            let center_x = f64::from(x) + 0.5;
            if point_in_polygon(Point::new(center_x, center_y), points) {
                mask.set(x, y, true);
            }
        }
    }

    mask
}

/// Pixel index ranges whose centers lie within the polygon bounding box,
/// clipped to the raster.
fn candidate_ranges(
    bounds: &Rect<f64>,
    dimensions: Dimensions,
) -> (std::ops::Range<u32>, std::ops::Range<u32>) {
    (
        center_span(bounds.min().x, bounds.max().x, dimensions.width),
        center_span(bounds.min().y, bounds.max().y, dimensions.height),
    )
}

/// Indices of pixels along one axis whose center `i + 0.5` lies in
/// `[min, max]`, clipped to `0..size`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn center_span(min: f64, max: f64, size: u32) -> std::ops::Range<u32> {
    let first = (min - 0.5).ceil().max(0.0) as i64;
    let last = (max - 0.5).floor().min(f64::from(size) - 1.0) as i64;
    if last < first {
        return 0..0;
    }
    (first as u32)..(last as u32 + 1)
}

/// Even-odd point-in-polygon test with an inclusive boundary.
///
/// The polygon is implicitly closed. A point exactly on an edge (within
/// [`EDGE_EPSILON`]) is inside regardless of the crossing count.
fn point_in_polygon(p: Point, vertices: &[Point]) -> bool {
    let mut inside = false;
    let mut j = vertices.len() - 1;

    for i in 0..vertices.len() {
        let a = vertices[i];
        let b = vertices[j];

        if on_segment(p, a, b) {
            return true;
        }

        // Edge crosses the horizontal ray through p; the half-open vertex
        // rule ((a.y > p.y) != (b.y > p.y)) counts each crossing once.
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }

        j = i;
    }

    inside
}

/// Whether `p` lies on the closed segment `a`-`b`.
fn on_segment(p: Point, a: Point, b: Point) -> bool {
    let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
    if cross.abs() > EDGE_EPSILON {
        return false;
    }
    let dot = (p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y);
    let length_squared = (b.x - a.x).powi(2) + (b.y - a.y).powi(2);
    (0.0..=length_squared).contains(&dot)
}
