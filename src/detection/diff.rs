use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::error::{DetectionError, Result};
use crate::video::Frame;

/// Linear scale applied to both frames before comparing them
pub const SCALE: f64 = 0.5;

/// Per-pixel intensity change that still counts as sensor noise
pub const NOISE_CUTOFF: u8 = 5;

/// Change score between two consecutive frames
pub type DiffScore = u64;

/// Count the pixels that changed between `prev` and `curr`.
///
/// Both frames are shrunk to half size, differenced per channel, converted
/// to intensity, and every pixel brighter than [`NOISE_CUTOFF`] is counted.
/// The result lies in `0..=downsampled_width * downsampled_height`.
pub fn score(prev: &Frame, curr: &Frame) -> Result<DiffScore> {
    if prev.dimensions() != curr.dimensions() {
        return Err(DetectionError::DimensionMismatch {
            left_width: prev.width(),
            left_height: prev.height(),
            right_width: curr.width(),
            right_height: curr.height(),
        }.into());
    }

    let small_prev = downsample(prev.as_image());
    let small_curr = downsample(curr.as_image());

    let changed = small_prev
        .as_raw()
        .chunks_exact(3)
        .zip(small_curr.as_raw().chunks_exact(3))
        .filter(|(a, b)| {
            let delta = [
                a[0].abs_diff(b[0]),
                a[1].abs_diff(b[1]),
                a[2].abs_diff(b[2]),
            ];
            luma(delta) > NOISE_CUTOFF
        })
        .count();

    Ok(changed as DiffScore)
}

/// Dimensions after downsampling, never below 1x1
pub fn downsampled_size(width: u32, height: u32) -> (u32, u32) {
    let scale = |v: u32| ((v as f64 * SCALE).round() as u32).max(1);
    (scale(width), scale(height))
}

fn downsample(image: &RgbImage) -> RgbImage {
    let (width, height) = downsampled_size(image.width(), image.height());
    imageops::resize(image, width, height, FilterType::Triangle)
}

// ITU-R BT.601 weights, rounded
fn luma(rgb: [u8; 3]) -> u8 {
    ((rgb[0] as u32 * 299 + rgb[1] as u32 * 587 + rgb[2] as u32 * 114 + 500) / 1000) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_frames_score_zero() {
        let frame = Frame::new_filled(64, 48, [120, 80, 200]);
        assert_eq!(score(&frame, &frame.clone()).unwrap(), 0);

        let black = Frame::new_black(7, 5);
        assert_eq!(score(&black, &black).unwrap(), 0);
    }

    #[test]
    fn test_full_flash_counts_every_downsampled_pixel() {
        let dark = Frame::new_black(64, 48);
        let bright = Frame::new_filled(64, 48, [255, 255, 255]);
        assert_eq!(score(&dark, &bright).unwrap(), 32 * 24);
        assert_eq!(score(&bright, &dark).unwrap(), 32 * 24);
    }

    #[test]
    fn test_changes_at_noise_floor_are_ignored() {
        let a = Frame::new_filled(32, 32, [100, 100, 100]);
        let b = Frame::new_filled(32, 32, [105, 105, 105]);
        assert_eq!(score(&a, &b).unwrap(), 0);

        let c = Frame::new_filled(32, 32, [106, 106, 106]);
        assert_eq!(score(&a, &c).unwrap(), 16 * 16);
    }

    #[test]
    fn test_partial_change_is_bounded() {
        let dark = Frame::new_black(40, 40);
        let mut half = dark.as_image().clone();
        for y in 0..40 {
            for x in 0..20 {
                half.put_pixel(x, y, image::Rgb([255, 255, 255]));
            }
        }
        let half = Frame::new(half);

        let s = score(&dark, &half).unwrap();
        let (w, h) = downsampled_size(40, 40);
        assert!(s >= 10 * 20, "score {} too small", s);
        assert!(s <= (w * h) as u64);
    }

    #[test]
    fn test_mismatched_frames_error() {
        let a = Frame::new_black(10, 10);
        let b = Frame::new_black(12, 10);
        assert!(score(&a, &b).is_err());
    }

    #[test]
    fn test_downsampled_size() {
        assert_eq!(downsampled_size(1920, 1080), (960, 540));
        assert_eq!(downsampled_size(1, 1), (1, 1));
        assert_eq!(downsampled_size(5, 3), (3, 2));
    }

    #[test]
    fn test_luma_weights() {
        assert_eq!(luma([0, 0, 0]), 0);
        assert_eq!(luma([255, 255, 255]), 255);
        assert_eq!(luma([255, 0, 0]), 76);
        assert_eq!(luma([0, 255, 0]), 150);
        assert_eq!(luma([0, 0, 255]), 29);
    }
}
