//! Link table loading.
//!
//! The link table is a CSV file with one row per study, binding a study's
//! image-set directory to its annotation-set directory:
//!
//! ```csv
//! image_set_id,annotation_set_id
//! SCD0000101,SC-HF-I-1
//! SCD0000201,SC-HF-I-2
//! ```
//!
//! Rows are consumed read-only, in file order.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// One study: a linked image-set / annotation-set pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyLink {
    /// Sub-directory of the images root holding this study's slices.
    pub image_set_id: String,
    /// Sub-directory of the contours root holding this study's annotations.
    pub annotation_set_id: String,
}

/// Errors raised while loading the link table.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The link file could not be read or parsed as CSV.
    #[error("failed to read link table '{path}': {source}")]
    Read {
        /// Path to the link file.
        path: String,
        /// Underlying CSV/IO error.
        source: csv::Error,
    },
}

/// Load the link table from a CSV file, preserving row order.
///
/// # Errors
///
/// Returns [`LinkError::Read`] if the file cannot be opened or a row does
/// not match the expected `image_set_id,annotation_set_id` header.
pub fn read_link_table(path: &Path) -> Result<Vec<StudyLink>, LinkError> {
    let wrap = |source: csv::Error| LinkError::Read {
        path: path.display().to_string(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(wrap)?;
    reader
        .deserialize()
        .map(|row| row.map_err(wrap))
        .collect()
}
