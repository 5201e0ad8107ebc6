//! rinkaku-batch: dataset enumeration, orchestration, and persistence.
//!
//! Wraps the pure `rinkaku-pipeline` core with everything that touches
//! the filesystem: the CSV link table, slice-image decoding, per-study
//! processing, parallel batch runs with cooperative cancellation, output
//! persistence, and the paired training feed over the emitted layout.
//!
//! The batch never hard-fails on partial data: missing images, malformed
//! annotations, and quality rejections become counts and records in the
//! final [`run::RunReport`], which is the single user-visible failure
//! surface.

pub mod decode;
pub mod feed;
pub mod layout;
pub mod link;
pub mod output;
pub mod run;
pub mod study;

pub use decode::{DecodeError, RasterSliceDecoder, SliceDecoder};
pub use feed::{FeedConfig, FeedError, PairedFeed};
pub use layout::{DatasetLayout, OutputDirs, slice_stem};
pub use link::{LinkError, StudyLink, read_link_table};
pub use output::{OutputError, scale_to_8bit, write_slice};
pub use run::{CancelToken, RunConfig, RunError, RunReport, run};
pub use study::{SliceMatch, StudyError, StudyReport, match_slice, process_study};
