//! Output persistence: 8-bit grayscale images and masks.
//!
//! Each accepted slice becomes up to three PNG files sharing one stem:
//! the intensity image (scaled to 8 bits by its global maximum), the
//! inner mask, and optionally the outer mask, written as {0, 255}.
//!
//! Writes for one slice are all-or-nothing: if any file fails, the
//! slice's already-written files are removed before the error is
//! returned, so a partially-converted output tree never contains a
//! dangling image without its mask.

use std::path::{Path, PathBuf};

use rinkaku_pipeline::{GrayImage, Mask, SliceImage};

use crate::layout::OutputDirs;

/// Errors raised while persisting one slice.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// A PNG encode/write failed.
    #[error("failed to write '{path}': {source}")]
    Write {
        /// Destination path of the failed write.
        path: PathBuf,
        /// Underlying encode/IO error.
        source: image::ImageError,
    },
}

/// Scale a 16-bit intensity grid into the 8-bit output range.
///
/// Intensities are mapped linearly from `[0, max]` to `[0, 255]`, where
/// `max` is the image's global maximum. An all-zero image stays all-zero.
#[must_use]
pub fn scale_to_8bit(image: &SliceImage) -> GrayImage {
    let max = image.pixels().map(|p| p.0[0]).max().unwrap_or(0);
    if max == 0 {
        return GrayImage::new(image.width(), image.height());
    }

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let value = u32::from(image.get_pixel(x, y).0[0]);
        let scaled = (value * 255 + u32::from(max) / 2) / u32::from(max);
        image::Luma([u8::try_from(scaled).unwrap_or(u8::MAX)])
    })
}

/// Persist one accepted slice under its canonical stem.
///
/// Writes `<stem>.png` into the images directory, the inner-masks
/// directory, and — when an outer mask is present — the outer-masks
/// directory.
///
/// # Errors
///
/// Returns [`OutputError::Write`] on the first failed write, after
/// removing any files already written for this slice.
pub fn write_slice(
    dirs: &OutputDirs,
    stem: &str,
    image: &SliceImage,
    inner_mask: &Mask,
    outer_mask: Option<&Mask>,
) -> Result<(), OutputError> {
    let file_name = format!("{stem}.png");
    let mut written: Vec<PathBuf> = Vec::with_capacity(3);

    let result = (|| {
        write_png(&scale_to_8bit(image), &dirs.images, &file_name, &mut written)?;
        write_png(
            &inner_mask.to_gray_image(),
            &dirs.inner_masks,
            &file_name,
            &mut written,
        )?;
        if let Some(mask) = outer_mask {
            write_png(&mask.to_gray_image(), &dirs.outer_masks, &file_name, &mut written)?;
        }
        Ok(())
    })();

    if result.is_err() {
        for path in &written {
            std::fs::remove_file(path).ok();
        }
    }
    result
}

fn write_png(
    gray: &GrayImage,
    dir: &Path,
    file_name: &str,
    written: &mut Vec<PathBuf>,
) -> Result<(), OutputError> {
    let path = dir.join(file_name);
    match gray.save(&path) {
        Ok(()) => {
            written.push(path);
            Ok(())
        }
        Err(source) => Err(OutputError::Write { path, source }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rinkaku_pipeline::Dimensions;

    use super::*;

    fn temp_dirs(name: &str) -> (PathBuf, OutputDirs) {
        let root = std::env::temp_dir().join(format!("rinkaku-output-{}-{name}", std::process::id()));
        let dirs = OutputDirs::under(&root);
        dirs.create().unwrap();
        (root, dirs)
    }

    fn small_mask(set: &[(u32, u32)]) -> Mask {
        let mut mask = Mask::all_false(Dimensions {
            width: 2,
            height: 2,
        });
        for &(x, y) in set {
            mask.set(x, y, true);
        }
        mask
    }

    #[test]
    fn scaling_maps_global_max_to_255() {
        let image = SliceImage::from_fn(2, 1, |x, _| image::Luma([if x == 0 { 500 } else { 1000 }]));
        let scaled = scale_to_8bit(&image);
        assert_eq!(scaled.get_pixel(0, 0).0[0], 128);
        assert_eq!(scaled.get_pixel(1, 0).0[0], 255);
    }

    #[test]
    fn all_zero_image_scales_to_all_zero() {
        let image = SliceImage::new(3, 3);
        let scaled = scale_to_8bit(&image);
        assert!(scaled.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn accepted_slice_writes_matching_names_across_dirs() {
        let (root, dirs) = temp_dirs("triple");
        let image = SliceImage::from_fn(2, 2, |_, _| image::Luma([100]));

        write_slice(
            &dirs,
            "SCD01-23",
            &image,
            &small_mask(&[(0, 0)]),
            Some(&small_mask(&[(0, 0), (1, 1)])),
        )
        .unwrap();

        assert!(dirs.images.join("SCD01-23.png").is_file());
        assert!(dirs.inner_masks.join("SCD01-23.png").is_file());
        assert!(dirs.outer_masks.join("SCD01-23.png").is_file());
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn slice_without_outer_mask_writes_only_two_files() {
        let (root, dirs) = temp_dirs("pair");
        let image = SliceImage::from_fn(2, 2, |_, _| image::Luma([100]));

        write_slice(&dirs, "SCD01-24", &image, &small_mask(&[(1, 0)]), None).unwrap();

        assert!(dirs.images.join("SCD01-24.png").is_file());
        assert!(dirs.inner_masks.join("SCD01-24.png").is_file());
        assert!(!dirs.outer_masks.join("SCD01-24.png").exists());
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn failed_write_removes_the_partial_slice() {
        let (root, dirs) = temp_dirs("atomic");
        // Sabotage the inner-masks directory so the second write fails.
        std::fs::remove_dir_all(&dirs.inner_masks).unwrap();
        let image = SliceImage::from_fn(2, 2, |_, _| image::Luma([100]));

        let err = write_slice(&dirs, "SCD01-25", &image, &small_mask(&[(0, 1)]), None);

        assert!(err.is_err());
        assert!(!dirs.images.join("SCD01-25.png").exists());
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn mask_pixels_persist_as_0_and_255() {
        let (root, dirs) = temp_dirs("values");
        let image = SliceImage::from_fn(2, 2, |_, _| image::Luma([7]));

        write_slice(&dirs, "SCD01-26", &image, &small_mask(&[(1, 1)]), None).unwrap();

        let mask_png = image::open(dirs.inner_masks.join("SCD01-26.png"))
            .unwrap()
            .to_luma8();
        assert_eq!(mask_png.get_pixel(1, 1).0[0], 255);
        assert_eq!(mask_png.get_pixel(0, 0).0[0], 0);
        std::fs::remove_dir_all(&root).ok();
    }
}
