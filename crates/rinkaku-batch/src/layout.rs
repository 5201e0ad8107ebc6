//! On-disk dataset and output layout contracts.
//!
//! Input layout (per the annotation tooling's conventions):
//!
//! ```text
//! <root>/<images_dir>/<image_set_id>/<index>.<ext>
//! <root>/<contours_dir>/<annotation_set_id>/i-contours/<name>-icontour-<...>.txt
//! <root>/<contours_dir>/<annotation_set_id>/o-contours/<name>-ocontour-<...>.txt
//! <root>/<link_file>
//! ```
//!
//! Output layout: three parallel directories with identical
//! `<image_set_id>-<index>.png` names denoting a matched triple, so
//! downstream consumers can iterate images and masks in lockstep.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Sub-directory of an annotation set holding inner boundaries.
pub const INNER_CONTOUR_DIR: &str = "i-contours";

/// Sub-directory of an annotation set holding outer boundaries.
pub const OUTER_CONTOUR_DIR: &str = "o-contours";

/// Where a source dataset lives and how its image files are named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetLayout {
    /// Absolute path to the dataset root.
    pub root: PathBuf,
    /// Images directory, relative to `root`.
    pub images_dir: String,
    /// Contours directory, relative to `root`.
    pub contours_dir: String,
    /// Extension of per-slice image files (no leading dot).
    pub image_extension: String,
}

impl DatasetLayout {
    /// Directory holding one study's image slices.
    #[must_use]
    pub fn study_image_dir(&self, image_set_id: &str) -> PathBuf {
        self.root.join(&self.images_dir).join(image_set_id)
    }

    /// Path of one slice image within a study.
    #[must_use]
    pub fn slice_image_path(&self, image_set_id: &str, index: u32) -> PathBuf {
        self.study_image_dir(image_set_id)
            .join(rinkaku_pipeline::image_file_name(index, &self.image_extension))
    }

    /// Directory holding one study's inner-boundary annotations.
    #[must_use]
    pub fn inner_contour_dir(&self, annotation_set_id: &str) -> PathBuf {
        self.root
            .join(&self.contours_dir)
            .join(annotation_set_id)
            .join(INNER_CONTOUR_DIR)
    }

    /// Directory holding one study's outer-boundary annotations.
    #[must_use]
    pub fn outer_contour_dir(&self, annotation_set_id: &str) -> PathBuf {
        self.root
            .join(&self.contours_dir)
            .join(annotation_set_id)
            .join(OUTER_CONTOUR_DIR)
    }
}

/// The three parallel output directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDirs {
    /// 8-bit grayscale slice images.
    pub images: PathBuf,
    /// Inner-boundary masks.
    pub inner_masks: PathBuf,
    /// Outer-boundary masks (sparse — only slices with an outer contour).
    pub outer_masks: PathBuf,
}

impl OutputDirs {
    /// Conventional layout under a single output root.
    #[must_use]
    pub fn under(root: &Path) -> Self {
        Self {
            images: root.join("images"),
            inner_masks: root.join("i-masks"),
            outer_masks: root.join("o-masks"),
        }
    }

    /// Create all three directories. Creating a directory that already
    /// exists is not an error.
    ///
    /// # Errors
    ///
    /// Propagates the underlying [`io::Error`] on any other failure.
    pub fn create(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.images)?;
        std::fs::create_dir_all(&self.inner_masks)?;
        std::fs::create_dir_all(&self.outer_masks)
    }
}

/// Canonical output stem for one slice: `<image_set_id>-<index>`.
///
/// The same stem names the image, the inner mask, and (when present) the
/// outer mask across the three output directories.
#[must_use]
pub fn slice_stem(image_set_id: &str, index: u32) -> String {
    format!("{image_set_id}-{index}")
}
