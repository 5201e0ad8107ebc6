//! rinkaku-pipeline: Pure contour-to-mask conversion (sans-IO).
//!
//! Converts hand-drawn boundary annotations into binary segmentation
//! masks aligned with their source slice images:
//! annotation text -> vertices -> rasterized mask -> quality verdict.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! strings and pixel buffers and returns structured data. Filesystem
//! enumeration, image decoding, and persistence live in `rinkaku-batch`.

pub mod annotation;
pub mod matching;
pub mod quality;
pub mod rasterize;
pub mod types;

pub use annotation::{AnnotationError, parse_contour};
pub use matching::{MatchError, image_file_name, outer_file_name, slice_index};
pub use quality::{QualityGateKind, QualityPredicate, QualityVerdict};
pub use rasterize::contour_to_mask;
pub use types::{Contour, Dimensions, GrayImage, Mask, Point, SliceImage};

/// Masks and verdict produced for one annotated slice.
#[derive(Debug, Clone)]
pub struct SliceResult {
    /// Mask rasterized from the inner boundary.
    pub inner_mask: Mask,
    /// Mask rasterized from the outer boundary, when one was supplied and
    /// the slice was accepted. Never gated.
    pub outer_mask: Option<Mask>,
    /// The gate's verdict on the inner mask.
    pub verdict: QualityVerdict,
}

/// Convert one slice's parsed contours into masks and gate them.
///
/// The inner contour is rasterized at the image's exact dimensions and
/// screened by `gate`; it alone decides acceptance. On acceptance the
/// outer contour (if any) is rasterized unconditionally. On rejection no
/// outer mask is produced — nothing from a rejected slice is persisted.
#[must_use = "returns the slice masks and verdict"]
pub fn process_slice(
    image: &SliceImage,
    inner: &Contour,
    outer: Option<&Contour>,
    gate: &dyn QualityPredicate,
) -> SliceResult {
    let dimensions = Dimensions::of(image);

    // 1. Rasterize the inner boundary against the image's exact size.
    let inner_mask = rasterize::contour_to_mask(inner, dimensions);

    // 2. Gate the inner mask.
    let verdict = gate.evaluate(&inner_mask, image);

    // 3. Rasterize the outer boundary only for accepted slices.
    let outer_mask = if verdict.accepted {
        outer.map(|contour| rasterize::contour_to_mask(contour, dimensions))
    } else {
        None
    };

    SliceResult {
        inner_mask,
        outer_mask,
        verdict,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// 8x8 image, bright 100-intensity square over (2,2)-(6,6), dark
    /// elsewhere.
    fn bright_square_image() -> SliceImage {
        SliceImage::from_fn(8, 8, |x, y| {
            image::Luma([if (2..6).contains(&x) && (2..6).contains(&y) {
                100
            } else {
                1
            }])
        })
    }

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Contour {
        Contour::new(vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ])
    }

    #[test]
    fn accepted_slice_carries_inner_and_outer_masks() {
        let image = bright_square_image();
        let inner = square(2.0, 2.0, 6.0, 6.0);
        let outer = square(1.0, 1.0, 7.0, 7.0);

        let result = process_slice(&image, &inner, Some(&outer), &QualityGateKind::default());

        assert!(result.verdict.accepted);
        assert_eq!(result.inner_mask.dimensions(), Dimensions::of(&image));
        assert_eq!(result.inner_mask.true_count(), 16);
        assert_eq!(result.outer_mask.unwrap().true_count(), 36);
    }

    #[test]
    fn rejected_slice_produces_no_outer_mask() {
        let image = bright_square_image();
        // Inner boundary drawn over the dark corner: median 1/100.
        let inner = square(0.0, 0.0, 2.0, 2.0);
        let outer = square(1.0, 1.0, 7.0, 7.0);

        let result = process_slice(&image, &inner, Some(&outer), &QualityGateKind::default());

        assert!(!result.verdict.accepted);
        assert!(result.outer_mask.is_none());
    }

    #[test]
    fn absent_outer_contour_is_not_an_error() {
        let image = bright_square_image();
        let inner = square(2.0, 2.0, 6.0, 6.0);

        let result = process_slice(&image, &inner, None, &QualityGateKind::default());

        assert!(result.verdict.accepted);
        assert!(result.outer_mask.is_none());
    }

    #[test]
    fn degenerate_inner_contour_is_rejected_not_a_fault() {
        let image = bright_square_image();
        let inner = Contour::default();

        let result = process_slice(&image, &inner, None, &QualityGateKind::default());

        assert!(!result.verdict.accepted);
        assert_eq!(result.inner_mask.true_count(), 0);
    }
}
