//! Paired, synchronized batch feed over the output layout.
//!
//! Training consumers need images and masks delivered in lockstep:
//! shuffling must apply the same permutation to both directories. The
//! feed pairs files by identical name across the two directories, applies
//! a seeded shuffle, and yields fixed-size batches forever — each time
//! the pair list is exhausted it reshuffles and continues (an "epoch"),
//! so a batch may straddle an epoch boundary. [`PairedFeed::reset`]
//! restarts the sequence from the seed for reproducible runs.

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use rinkaku_pipeline::GrayImage;

/// Feed configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Number of pairs per batch.
    pub batch_size: usize,
    /// Whether to shuffle pair order each epoch.
    pub shuffle: bool,
    /// RNG seed for the shuffle.
    pub seed: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            batch_size: 8,
            shuffle: true,
            seed: 123,
        }
    }
}

/// Errors raised while opening or reading the feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// A directory could not be enumerated.
    #[error("cannot enumerate '{path}': {source}")]
    ListDir {
        /// The directory that failed to enumerate.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// No file name appears in both directories.
    #[error("no image/mask pairs shared between '{images}' and '{masks}'")]
    NoPairs {
        /// Images directory.
        images: PathBuf,
        /// Masks directory.
        masks: PathBuf,
    },

    /// The batch size is zero.
    #[error("batch size must be at least 1")]
    ZeroBatchSize,

    /// A paired file failed to load.
    #[error("failed to load '{path}': {source}")]
    Load {
        /// The file that failed to load.
        path: PathBuf,
        /// Underlying decode error.
        source: image::ImageError,
    },
}

/// One batch: images and masks at matching positions.
pub type Batch = (Vec<GrayImage>, Vec<GrayImage>);

/// Infinite, restartable iterator of synchronized (image, mask) batches.
#[derive(Debug)]
pub struct PairedFeed {
    pairs: Vec<(PathBuf, PathBuf)>,
    order: Vec<usize>,
    cursor: usize,
    rng: StdRng,
    config: FeedConfig,
}

impl PairedFeed {
    /// Open a feed over parallel image and mask directories.
    ///
    /// Files are paired by identical file name; names present in only one
    /// directory are ignored. The initial order is sorted by name, then
    /// shuffled when [`FeedConfig::shuffle`] is set.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::ZeroBatchSize`] for a zero batch size,
    /// [`FeedError::ListDir`] if a directory cannot be enumerated, and
    /// [`FeedError::NoPairs`] if the directories share no file names.
    pub fn open(images_dir: &Path, masks_dir: &Path, config: FeedConfig) -> Result<Self, FeedError> {
        if config.batch_size == 0 {
            return Err(FeedError::ZeroBatchSize);
        }

        let mask_names = file_names(masks_dir)?;
        let mut pairs: Vec<(PathBuf, PathBuf)> = file_names(images_dir)?
            .into_iter()
            .filter(|name| mask_names.contains(name))
            .map(|name| (images_dir.join(&name), masks_dir.join(&name)))
            .collect();
        pairs.sort_unstable();

        if pairs.is_empty() {
            return Err(FeedError::NoPairs {
                images: images_dir.to_path_buf(),
                masks: masks_dir.to_path_buf(),
            });
        }

        let mut feed = Self {
            order: (0..pairs.len()).collect(),
            pairs,
            cursor: 0,
            rng: StdRng::seed_from_u64(config.seed),
            config,
        };
        feed.reshuffle();
        Ok(feed)
    }

    /// Number of pairs in one epoch.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    /// Restart the sequence from the seed.
    pub fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.config.seed);
        self.cursor = 0;
        self.order.sort_unstable();
        self.reshuffle();
    }

    /// Produce the next batch, wrapping (with a reshuffle) at epoch
    /// boundaries. Never exhausts.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Load`] if a paired file cannot be decoded.
    pub fn next_batch(&mut self) -> Result<Batch, FeedError> {
        let mut images = Vec::with_capacity(self.config.batch_size);
        let mut masks = Vec::with_capacity(self.config.batch_size);

        for _ in 0..self.config.batch_size {
            if self.cursor == self.order.len() {
                self.cursor = 0;
                self.reshuffle();
            }
            let (image_path, mask_path) = &self.pairs[self.order[self.cursor]];
            images.push(load_gray(image_path)?);
            masks.push(load_gray(mask_path)?);
            self.cursor += 1;
        }

        Ok((images, masks))
    }

    fn reshuffle(&mut self) {
        if self.config.shuffle {
            self.order.shuffle(&mut self.rng);
        }
    }
}

fn load_gray(path: &Path) -> Result<GrayImage, FeedError> {
    image::open(path)
        .map(|img| img.to_luma8())
        .map_err(|source| FeedError::Load {
            path: path.to_path_buf(),
            source,
        })
}

fn file_names(dir: &Path) -> Result<Vec<String>, FeedError> {
    let entries = std::fs::read_dir(dir).map_err(|source| FeedError::ListDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| FeedError::ListDir {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_ok_and(|kind| kind.is_file()) {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}
