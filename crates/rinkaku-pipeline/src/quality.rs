//! Quality gating: statistical accept/reject of a candidate mask.
//!
//! A hand-drawn boundary occasionally slips off the structure it is meant
//! to trace; the gate screens each inner mask against its source image
//! before anything is persisted. Rejected slices are recorded for manual
//! review rather than silently dropped.
//!
//! # Strategy pattern
//!
//! The gate is a pluggable predicate: [`QualityPredicate`] is the trait,
//! [`QualityGateKind`] the runtime selector. The caller chooses the gate
//! explicitly; nothing defaults deep inside the pipeline.

use serde::{Deserialize, Serialize};

use crate::types::{Mask, SliceImage};

/// Default normalized-median threshold for [`QualityGateKind::MedianIntensity`].
pub const DEFAULT_INTENSITY_THRESHOLD: f64 = 0.1;

/// Outcome of gating one (mask, image) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityVerdict {
    /// Whether the pair passed the gate.
    pub accepted: bool,
    /// The measured statistic, when one could be computed. `None` for
    /// degenerate inputs (empty selection, all-zero image).
    pub statistic: Option<f64>,
}

impl QualityVerdict {
    /// Rejection with no measurable statistic.
    #[must_use]
    pub const fn degenerate_rejection() -> Self {
        Self {
            accepted: false,
            statistic: None,
        }
    }
}

/// Trait for mask quality predicates.
///
/// Input: a candidate mask and the slice image it was rasterized against.
/// Output: an accept/reject verdict with the measured statistic.
pub trait QualityPredicate {
    /// Evaluate the (mask, image) pair.
    fn evaluate(&self, mask: &Mask, image: &SliceImage) -> QualityVerdict;
}

/// Selects which quality gate to apply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum QualityGateKind {
    /// Accept every pair unconditionally (no statistic measured).
    AlwaysAccept,

    /// Accept iff the median intensity of the image pixels selected by
    /// the mask, normalized by the image's global maximum, strictly
    /// exceeds `threshold`.
    MedianIntensity {
        /// Normalized-median acceptance threshold in `(0, 1)`.
        threshold: f64,
    },
}

impl Default for QualityGateKind {
    fn default() -> Self {
        Self::MedianIntensity {
            threshold: DEFAULT_INTENSITY_THRESHOLD,
        }
    }
}

impl QualityPredicate for QualityGateKind {
    fn evaluate(&self, mask: &Mask, image: &SliceImage) -> QualityVerdict {
        match *self {
            Self::AlwaysAccept => QualityVerdict {
                accepted: true,
                statistic: None,
            },
            Self::MedianIntensity { threshold } => median_intensity_verdict(mask, image, threshold),
        }
    }
}

/// Normalized-median intensity check.
///
/// A mask selecting zero pixels, or an image whose global maximum is zero,
/// yields a defined rejection instead of an undefined statistic.
fn median_intensity_verdict(mask: &Mask, image: &SliceImage, threshold: f64) -> QualityVerdict {
    let selected: Vec<u16> = mask
        .true_pixels()
        .filter(|&(x, y)| x < image.width() && y < image.height())
        .map(|(x, y)| image.get_pixel(x, y).0[0])
        .collect();

    let max = image.pixels().map(|p| p.0[0]).max().unwrap_or(0);
    if selected.is_empty() || max == 0 {
        return QualityVerdict::degenerate_rejection();
    }

    let statistic = median(selected) / f64::from(max);
    QualityVerdict {
        accepted: statistic > threshold,
        statistic: Some(statistic),
    }
}

/// Median of a non-empty sample; an even-sized sample averages the two
/// middle values.
fn median(mut values: Vec<u16>) -> f64 {
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        f64::from(values[mid])
    } else {
        f64::midpoint(f64::from(values[mid - 1]), f64::from(values[mid]))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::types::Dimensions;

    use super::*;

    /// 4x4 image: left half intensity `low`, right half `high`.
    fn split_image(low: u16, high: u16) -> SliceImage {
        SliceImage::from_fn(4, 4, |x, _| {
            image::Luma([if x < 2 { low } else { high }])
        })
    }

    /// Mask selecting the left half of a 4x4 grid.
    fn left_half_mask() -> Mask {
        let mut mask = Mask::all_false(Dimensions {
            width: 4,
            height: 4,
        });
        for y in 0..4 {
            for x in 0..2 {
                mask.set(x, y, true);
            }
        }
        mask
    }

    #[test]
    fn default_gate_is_median_intensity_at_0_1() {
        assert_eq!(
            QualityGateKind::default(),
            QualityGateKind::MedianIntensity { threshold: 0.1 },
        );
    }

    #[test]
    fn bright_selection_is_accepted() {
        // Selected median 800, max 1000: statistic 0.8.
        let gate = QualityGateKind::default();
        let verdict = gate.evaluate(&left_half_mask(), &split_image(800, 1000));
        assert!(verdict.accepted);
        let stat = verdict.statistic.unwrap();
        assert!((stat - 0.8).abs() < 1e-12);
    }

    #[test]
    fn dark_selection_is_rejected() {
        // Selected median 50, max 1000: statistic 0.05 < 0.1.
        let gate = QualityGateKind::default();
        let verdict = gate.evaluate(&left_half_mask(), &split_image(50, 1000));
        assert!(!verdict.accepted);
        assert!(verdict.statistic.unwrap() < 0.1);
    }

    #[test]
    fn threshold_is_strict() {
        // Statistic exactly at the threshold does not pass.
        let gate = QualityGateKind::MedianIntensity { threshold: 0.05 };
        let verdict = gate.evaluate(&left_half_mask(), &split_image(50, 1000));
        assert!(!verdict.accepted);
    }

    #[test]
    fn raising_the_threshold_never_turns_a_rejection_into_an_acceptance() {
        let image = split_image(400, 1000);
        let mask = left_half_mask();

        let mut previous_accepted = true;
        for threshold in [0.1, 0.3, 0.39, 0.41, 0.7, 0.99] {
            let verdict =
                QualityGateKind::MedianIntensity { threshold }.evaluate(&mask, &image);
            assert!(
                previous_accepted || !verdict.accepted,
                "verdict flipped back to accepted at threshold {threshold}",
            );
            previous_accepted = verdict.accepted;
        }
    }

    #[test]
    fn empty_mask_rejects_without_fault() {
        let mask = Mask::all_false(Dimensions {
            width: 4,
            height: 4,
        });
        let verdict = QualityGateKind::default().evaluate(&mask, &split_image(800, 1000));
        assert_eq!(verdict, QualityVerdict::degenerate_rejection());
    }

    #[test]
    fn all_zero_image_rejects_without_fault() {
        let verdict = QualityGateKind::default().evaluate(&left_half_mask(), &split_image(0, 0));
        assert_eq!(verdict, QualityVerdict::degenerate_rejection());
    }

    #[test]
    fn always_accept_passes_empty_masks_too() {
        let mask = Mask::all_false(Dimensions {
            width: 4,
            height: 4,
        });
        let verdict = QualityGateKind::AlwaysAccept.evaluate(&mask, &split_image(0, 0));
        assert!(verdict.accepted);
        assert_eq!(verdict.statistic, None);
    }

    #[test]
    fn even_sized_selection_averages_the_middle_values() {
        // 2x1 mask over pixels 100 and 300: median 200, max 400.
        let image = SliceImage::from_fn(3, 1, |x, _| image::Luma([[100, 300, 400][x as usize]]));
        let mut mask = Mask::all_false(Dimensions {
            width: 3,
            height: 1,
        });
        mask.set(0, 0, true);
        mask.set(1, 0, true);

        let verdict = QualityGateKind::default().evaluate(&mask, &image);
        let stat = verdict.statistic.unwrap();
        assert!((stat - 0.5).abs() < 1e-12);
    }
}
