//! Whole-batch orchestration over the link table.
//!
//! Studies are fully independent, so the batch fans them out over the
//! rayon worker pool and aggregates per-study reports afterwards — no
//! shared mutable state in the compute path. A [`CancelToken`] provides
//! coarse-grained cancellation: studies that have not started when the
//! token trips are skipped, in-flight studies run to completion, and
//! per-slice writes stay all-or-nothing throughout.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use rinkaku_pipeline::QualityGateKind;

use crate::decode::SliceDecoder;
use crate::layout::{DatasetLayout, OutputDirs};
use crate::link::{LinkError, read_link_table};
use crate::study::{StudyReport, process_study};

/// Configuration for one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Source dataset layout.
    pub layout: DatasetLayout,
    /// Link table path (absolute, or relative to the current directory).
    pub link_file: PathBuf,
    /// Output directories.
    pub output: OutputDirs,
    /// Quality gate applied to every inner mask.
    pub gate: QualityGateKind,
}

/// Cooperative cancellation flag, checked between studies.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a fresh, untripped token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the token: studies not yet started will be skipped.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether the token has been tripped.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A study that failed as a whole (its annotation directory was missing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedStudy {
    /// The study's image-set identifier.
    pub image_set_id: String,
    /// Human-readable failure description.
    pub reason: String,
}

/// Aggregated result of one batch run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunReport {
    /// Per-study reports, in link-table order.
    pub studies: Vec<StudyReport>,
    /// Studies that failed entirely; the run continued without them.
    pub failed_studies: Vec<FailedStudy>,
    /// Studies skipped because the run was cancelled first.
    pub cancelled: usize,
}

impl RunReport {
    /// Total slices emitted across all studies.
    #[must_use]
    pub fn emitted(&self) -> usize {
        self.studies.iter().map(|s| s.emitted).sum()
    }

    /// Total slices skipped across all studies.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.studies.iter().map(|s| s.skipped).sum()
    }

    /// All rejected annotation paths across all studies, in study order.
    #[must_use]
    pub fn rejected_paths(&self) -> Vec<&PathBuf> {
        self.studies.iter().flat_map(|s| s.rejected.iter()).collect()
    }
}

/// Errors that abort a run before any study is processed.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The link table could not be loaded.
    #[error(transparent)]
    Link(#[from] LinkError),

    /// The output directories could not be created.
    #[error("failed to create output directories: {0}")]
    CreateOutput(#[from] std::io::Error),
}

/// Run the conversion batch described by `config`.
///
/// Loads the link table, creates the output directories, processes every
/// study (in parallel), and aggregates the per-study reports. Slice- and
/// study-scoped failures are recorded in the report; they never abort
/// the batch.
///
/// # Errors
///
/// Returns [`RunError`] only for pre-flight failures: an unreadable link
/// table or uncreatable output directories.
pub fn run(
    config: &RunConfig,
    decoder: &dyn SliceDecoder,
    cancel: &CancelToken,
) -> Result<RunReport, RunError> {
    let links = read_link_table(&config.link_file)?;
    config.output.create()?;
    info!(studies = links.len(), "starting conversion batch");

    let outcomes: Vec<Option<Result<StudyReport, (String, String)>>> = links
        .par_iter()
        .map(|link| {
            if cancel.is_cancelled() {
                return None;
            }
            Some(
                process_study(&config.layout, link, decoder, &config.gate, &config.output)
                    .map_err(|err| (link.image_set_id.clone(), err.to_string())),
            )
        })
        .collect();

    let mut report = RunReport::default();
    for outcome in outcomes {
        match outcome {
            Some(Ok(study)) => report.studies.push(study),
            Some(Err((image_set_id, reason))) => {
                warn!(study = %image_set_id, %reason, "study failed; continuing batch");
                report.failed_studies.push(FailedStudy {
                    image_set_id,
                    reason,
                });
            }
            None => report.cancelled += 1,
        }
    }

    info!(
        emitted = report.emitted(),
        skipped = report.skipped(),
        rejected = report.rejected_paths().len(),
        failed_studies = report.failed_studies.len(),
        cancelled = report.cancelled,
        "conversion batch finished",
    );
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_is_shared_across_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn report_totals_sum_over_studies() {
        let report = RunReport {
            studies: vec![
                StudyReport {
                    image_set_id: "SCD01".into(),
                    emitted: 3,
                    skipped: 1,
                    rejected: vec![PathBuf::from("a.txt")],
                },
                StudyReport {
                    image_set_id: "SCD02".into(),
                    emitted: 2,
                    skipped: 0,
                    rejected: vec![PathBuf::from("b.txt"), PathBuf::from("c.txt")],
                },
            ],
            ..RunReport::default()
        };

        assert_eq!(report.emitted(), 5);
        assert_eq!(report.skipped(), 1);
        assert_eq!(
            report.rejected_paths(),
            vec![
                &PathBuf::from("a.txt"),
                &PathBuf::from("b.txt"),
                &PathBuf::from("c.txt"),
            ]
        );
    }

    #[test]
    fn run_report_serializes_for_the_json_dump() {
        let report = RunReport {
            studies: vec![StudyReport {
                image_set_id: "SCD01".into(),
                emitted: 1,
                skipped: 0,
                rejected: Vec::new(),
            }],
            failed_studies: vec![FailedStudy {
                image_set_id: "SCD02".into(),
                reason: "missing directory".into(),
            }],
            cancelled: 0,
        };

        let json = serde_json::to_string(&report).unwrap();
        let back: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
