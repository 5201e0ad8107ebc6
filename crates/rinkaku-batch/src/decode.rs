//! Slice image decoding seam.
//!
//! The per-slice container format is a collaborator concern: the pipeline
//! only needs "path in, 16-bit intensity grid out, with file-not-found
//! distinguished from corruption". [`SliceDecoder`] is that seam; the
//! shipped [`RasterSliceDecoder`] handles any format the `image` crate can
//! decode, and a proprietary-container decoder can be dropped in without
//! touching the orchestration.

use std::io;
use std::path::{Path, PathBuf};

use rinkaku_pipeline::SliceImage;

/// Errors raised while decoding one slice image.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The expected image file does not exist. This is a legitimate
    /// partial-data condition — the orchestrator skips the slice.
    #[error("slice image not found: {0}")]
    NotFound(PathBuf),

    /// The file exists but could not be read.
    #[error("failed to read slice image '{path}': {source}")]
    Read {
        /// Path of the unreadable file.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },

    /// The file contents could not be decoded as an image.
    #[error("failed to decode slice image '{path}': {source}")]
    Decode {
        /// Path of the undecodable file.
        path: PathBuf,
        /// Underlying decode error.
        source: image::ImageError,
    },
}

/// Trait for slice image decoders.
///
/// `Sync` so a single decoder can be shared across the study worker pool.
pub trait SliceDecoder: Sync {
    /// Decode the slice at `path` into a 16-bit intensity grid.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::NotFound`] when the file is absent, and
    /// [`DecodeError::Read`] / [`DecodeError::Decode`] for IO and format
    /// failures.
    fn decode(&self, path: &Path) -> Result<SliceImage, DecodeError>;
}

/// Decoder for standard raster formats (PNG, JPEG, BMP).
///
/// 8-bit sources are widened to the full 16-bit range by the `image`
/// crate's luma conversion.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterSliceDecoder;

impl SliceDecoder for RasterSliceDecoder {
    fn decode(&self, path: &Path) -> Result<SliceImage, DecodeError> {
        let bytes = std::fs::read(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                DecodeError::NotFound(path.to_path_buf())
            } else {
                DecodeError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let decoded = image::load_from_memory(&bytes).map_err(|source| DecodeError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(decoded.to_luma16())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("rinkaku-decode-{}-{name}", std::process::id()))
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = RasterSliceDecoder
            .decode(Path::new("/nonexistent/23.png"))
            .unwrap_err();
        assert!(matches!(err, DecodeError::NotFound(_)));
    }

    #[test]
    fn corrupt_file_is_a_decode_error() {
        let path = temp_path("corrupt.png");
        std::fs::write(&path, [0xFF, 0xFE, 0x00, 0x01]).unwrap();
        let err = RasterSliceDecoder.decode(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, DecodeError::Decode { .. }));
    }

    #[test]
    fn sixteen_bit_png_round_trips_intensities() {
        let path = temp_path("gradient.png");
        let source = SliceImage::from_fn(4, 2, |x, y| image::Luma([(x + 4 * y) as u16 * 1000]));
        source.save(&path).unwrap();

        let decoded = RasterSliceDecoder.decode(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(decoded.dimensions(), (4, 2));
        assert_eq!(decoded.get_pixel(3, 1).0[0], 7000);
    }
}
