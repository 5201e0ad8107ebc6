//! Slice-name matching rules.
//!
//! Three independently numbered file sets — image slices, inner-boundary
//! annotations, outer-boundary annotations — are cross-referenced purely
//! through names. An inner annotation is named
//! `<series>-<sequence>-<index>-icontour-<suffix>.txt`; the slice index is
//! the third `-`-delimited field. The matching image file is named
//! `<index>.<ext>` with leading zeros dropped, and the outer annotation
//! differs from the inner one only in the `icontour` → `ocontour` token.
//!
//! This module holds the pure naming rules; filesystem lookups (does the
//! derived file actually exist?) live with the orchestrator.

/// Token marking an inner-boundary annotation filename.
pub const INNER_MARKER: &str = "icontour";

/// Token marking an outer-boundary annotation filename.
pub const OUTER_MARKER: &str = "ocontour";

/// Errors raised when an annotation filename does not follow the
/// `prefix-sequence-index-...` naming scheme.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// The filename has fewer than three `-`-delimited fields.
    #[error("annotation filename '{name}' has no slice-index field")]
    MissingIndexField {
        /// The offending filename.
        name: String,
    },

    /// The third field is not an unsigned integer.
    #[error("annotation filename '{name}' has non-numeric slice index '{field}'")]
    InvalidIndex {
        /// The offending filename.
        name: String,
        /// The field that failed to parse.
        field: String,
    },
}

/// Extract the embedded slice index from an annotation filename.
///
/// The index is the third `-`-delimited field, parsed as an unsigned
/// integer; leading zeros are dropped by the parse
/// (`IM-0001-0023-icontour-manual.txt` → `23`).
///
/// # Errors
///
/// Returns [`MatchError::MissingIndexField`] if the name has fewer than
/// three `-`-delimited fields, or [`MatchError::InvalidIndex`] if the
/// third field is not an unsigned integer.
pub fn slice_index(file_name: &str) -> Result<u32, MatchError> {
    let field = file_name
        .split('-')
        .nth(2)
        .ok_or_else(|| MatchError::MissingIndexField {
            name: file_name.to_owned(),
        })?;

    field.parse().map_err(|_| MatchError::InvalidIndex {
        name: file_name.to_owned(),
        field: field.to_owned(),
    })
}

/// Derive the image filename for a slice index: `<index>.<extension>`.
///
/// The index is rendered without padding, matching the image-set naming
/// scheme (slice 23 → `23.dcm`, not `0023.dcm`).
#[must_use]
pub fn image_file_name(index: u32, extension: &str) -> String {
    format!("{index}.{extension}")
}

/// Derive the outer-boundary filename for an inner annotation by
/// substituting the first `icontour` token with `ocontour`.
///
/// Returns `None` if the name carries no inner marker — such a file
/// cannot have an outer counterpart derived for it.
#[must_use]
pub fn outer_file_name(inner_name: &str) -> Option<String> {
    inner_name
        .contains(INNER_MARKER)
        .then(|| inner_name.replacen(INNER_MARKER, OUTER_MARKER, 1))
}
