//! Per-study pipeline: match, decode, parse, rasterize, gate, emit.
//!
//! A study is one linked image-set / annotation-set pair. Every
//! inner-boundary annotation found for the study drives one slice through
//! the pipeline. Slice-scoped failures never fail the study: a missing
//! image is a counted skip, a malformed annotation or filename is a
//! warn-logged skip, and a quality rejection is recorded for manual
//! review. Only a missing annotation directory fails the study itself.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use rinkaku_pipeline::{
    Contour, MatchError, QualityPredicate, matching, parse_contour, process_slice,
};

use crate::decode::{DecodeError, SliceDecoder};
use crate::layout::{DatasetLayout, OutputDirs, slice_stem};
use crate::link::StudyLink;
use crate::output::write_slice;

/// Outcome of matching one inner annotation filename against the
/// filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SliceMatch {
    /// The slice index parsed and the derived image file exists.
    Matched {
        /// Slice index embedded in the annotation filename.
        index: u32,
        /// Path of the matching image file.
        image_path: PathBuf,
        /// Path of the matching outer annotation, when one exists.
        outer_path: Option<PathBuf>,
    },

    /// The filename parsed but no image file exists for its index.
    ImageMissing {
        /// Slice index embedded in the annotation filename.
        index: u32,
    },

    /// The filename does not follow the annotation naming scheme.
    PatternMismatch(MatchError),
}

/// Match one inner annotation filename to its image and outer-annotation
/// files.
///
/// Missing files are data conditions, not errors: an absent image yields
/// [`SliceMatch::ImageMissing`], an absent outer annotation yields a
/// `Matched` with no `outer_path`.
#[must_use]
pub fn match_slice(layout: &DatasetLayout, link: &StudyLink, inner_name: &str) -> SliceMatch {
    let index = match matching::slice_index(inner_name) {
        Ok(index) => index,
        Err(err) => return SliceMatch::PatternMismatch(err),
    };

    let image_path = layout.slice_image_path(&link.image_set_id, index);
    if !image_path.is_file() {
        return SliceMatch::ImageMissing { index };
    }

    let outer_path = matching::outer_file_name(inner_name)
        .map(|name| layout.outer_contour_dir(&link.annotation_set_id).join(name))
        .filter(|path| path.is_file());

    SliceMatch::Matched {
        index,
        image_path,
        outer_path,
    }
}

/// Per-study conversion report.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StudyReport {
    /// The study's image-set identifier.
    pub image_set_id: String,
    /// Slices emitted as image + mask files.
    pub emitted: usize,
    /// Slices skipped (missing image, malformed annotation or filename,
    /// decode or write failure).
    pub skipped: usize,
    /// Inner annotation paths whose masks failed the quality gate.
    pub rejected: Vec<PathBuf>,
}

/// Errors that fail a whole study.
#[derive(Debug, thiserror::Error)]
pub enum StudyError {
    /// The study's inner annotation directory cannot be enumerated.
    #[error("cannot enumerate annotation directory '{path}': {source}")]
    AnnotationDirUnreadable {
        /// The directory that failed to enumerate.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

/// Read and parse one annotation file.
///
/// # Errors
///
/// Returns a human-readable message for IO and parse failures; the caller
/// logs it and skips the slice (or the outer boundary).
pub fn read_contour(path: &Path) -> Result<Contour, String> {
    let text =
        std::fs::read_to_string(path).map_err(|err| format!("{}: {err}", path.display()))?;
    parse_contour(&text).map_err(|err| format!("{}: {err}", path.display()))
}

/// Run the full pipeline for one study.
///
/// Enumerates the study's inner annotations (sorted by name for
/// deterministic reports), drives each through match → decode → parse →
/// rasterize → gate → emit, and aggregates the study report.
///
/// # Errors
///
/// Returns [`StudyError::AnnotationDirUnreadable`] when the inner
/// annotation directory is missing or unreadable. All slice-scoped
/// failures are converted into skips or rejection records instead.
pub fn process_study(
    layout: &DatasetLayout,
    link: &StudyLink,
    decoder: &dyn SliceDecoder,
    gate: &(dyn QualityPredicate + Sync),
    out: &OutputDirs,
) -> Result<StudyReport, StudyError> {
    let inner_dir = layout.inner_contour_dir(&link.annotation_set_id);
    let mut inner_names = list_file_names(&inner_dir)?;
    inner_names.sort_unstable();

    let mut report = StudyReport {
        image_set_id: link.image_set_id.clone(),
        ..StudyReport::default()
    };

    for inner_name in &inner_names {
        let inner_path = inner_dir.join(inner_name);
        let (index, image_path, outer_path) = match match_slice(layout, link, inner_name) {
            SliceMatch::Matched {
                index,
                image_path,
                outer_path,
            } => (index, image_path, outer_path),
            SliceMatch::ImageMissing { index } => {
                debug!(study = %link.image_set_id, index, "no image for annotated slice");
                report.skipped += 1;
                continue;
            }
            SliceMatch::PatternMismatch(err) => {
                warn!(study = %link.image_set_id, %err, "skipping unrecognized annotation name");
                report.skipped += 1;
                continue;
            }
        };

        let image = match decoder.decode(&image_path) {
            Ok(image) => image,
            Err(DecodeError::NotFound(_)) => {
                // The file disappeared between matching and decoding.
                report.skipped += 1;
                continue;
            }
            Err(err) => {
                warn!(study = %link.image_set_id, index, %err, "skipping undecodable slice");
                report.skipped += 1;
                continue;
            }
        };

        let inner = match read_contour(&inner_path) {
            Ok(contour) => contour,
            Err(err) => {
                warn!(study = %link.image_set_id, index, %err, "skipping malformed inner annotation");
                report.skipped += 1;
                continue;
            }
        };

        // A malformed outer boundary degrades to "no outer boundary";
        // the inner mask still decides the slice.
        let outer = outer_path.as_deref().and_then(|path| match read_contour(path) {
            Ok(contour) => Some(contour),
            Err(err) => {
                warn!(study = %link.image_set_id, index, %err, "ignoring malformed outer annotation");
                None
            }
        });

        let result = process_slice(&image, &inner, outer.as_ref(), gate);
        if !result.verdict.accepted {
            debug!(
                study = %link.image_set_id,
                index,
                statistic = ?result.verdict.statistic,
                "mask failed quality gate",
            );
            report.rejected.push(inner_path);
            continue;
        }

        let stem = slice_stem(&link.image_set_id, index);
        match write_slice(
            out,
            &stem,
            &image,
            &result.inner_mask,
            result.outer_mask.as_ref(),
        ) {
            Ok(()) => report.emitted += 1,
            Err(err) => {
                warn!(study = %link.image_set_id, index, %err, "failed to persist slice");
                report.skipped += 1;
            }
        }
    }

    info!(
        study = %link.image_set_id,
        emitted = report.emitted,
        skipped = report.skipped,
        rejected = report.rejected.len(),
        "study converted",
    );
    Ok(report)
}

/// File names (not paths) of a directory's entries.
fn list_file_names(dir: &Path) -> Result<Vec<String>, StudyError> {
    let entries = std::fs::read_dir(dir).map_err(|source| StudyError::AnnotationDirUnreadable {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| StudyError::AnnotationDirUnreadable {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_ok_and(|kind| kind.is_file()) {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}
