//! Plate crop rectification and enhancement ahead of character recognition.
//!
//! Every step falls back to its input on degenerate geometry, so
//! [`PlateNormalizer::normalize`] never fails.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::contours::{BorderType, Contour, find_contours};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use imageproc::geometry::{contour_area, min_area_rect};
use imageproc::morphology::{Mask, grayscale_open};

use super::clahe::clahe;
use crate::config::NormalizerConfig;
use crate::geometry::{Point2, order_quad_points};

/// Crops smaller than this on either side are enhanced without rectification.
const MIN_CROP_SIDE: u32 = 10;

#[derive(Debug, Clone, Default)]
pub struct PlateNormalizer {
    config: NormalizerConfig,
}

impl PlateNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Rectify (when a plate boundary is found) and enhance a plate crop.
    pub fn normalize(&self, crop: &RgbImage) -> RgbImage {
        let (width, height) = crop.dimensions();
        if width == 0 || height == 0 {
            return crop.clone();
        }
        match self.rectify(crop) {
            Some(rectified) => self.enhance(&rectified),
            None => self.enhance(crop),
        }
    }

    /// Perspective-correct the crop onto the minimum-area rectangle around
    /// its largest external edge contour.
    ///
    /// `None` when no contour covers enough of the crop or the warp is
    /// degenerate.
    pub fn rectify(&self, crop: &RgbImage) -> Option<RgbImage> {
        let (width, height) = crop.dimensions();
        if width < MIN_CROP_SIDE || height < MIN_CROP_SIDE {
            return None;
        }
        let gray = imageops::grayscale(crop);
        let blurred = gaussian_blur_f32(&gray, self.config.blur_sigma);
        let edges = canny(&blurred, self.config.canny_low, self.config.canny_high);

        let (area, contour) = largest_outer_contour(&edges)?;
        let crop_area = width as f64 * height as f64;
        if area < self.config.min_contour_fraction as f64 * crop_area {
            tracing::trace!(area, crop_area, "largest contour too small, skipping rectification");
            return None;
        }

        let rect = min_area_rect(&contour.points);
        let corners = order_quad_points(rect.map(|p| Point2::new(p.x as f32, p.y as f32)));
        let (out_w, out_h) = canonical_size(&corners, &self.config);
        warp_to_rectangle(crop, &corners, out_w, out_h)
    }

    /// Local contrast equalization, light speckle removal and upscaling of
    /// short crops to the configured minimum height.
    pub fn enhance(&self, image: &RgbImage) -> RgbImage {
        let gray = imageops::grayscale(image);
        let equalized = clahe(&gray, self.config.clahe_clip_limit, self.config.clahe_tiles);
        let opened = open_2x2(&equalized);

        let (width, height) = opened.dimensions();
        let target = self.config.target_height;
        let resized = if height > 0 && height < target {
            let scale = target as f32 / height as f32;
            let new_width = ((width as f32 * scale).round() as u32).max(1);
            imageops::resize(&opened, new_width, target, FilterType::CatmullRom)
        } else {
            opened
        };

        DynamicImage::ImageLuma8(resized).to_rgb8()
    }
}

/// Outer contour with the largest enclosed area, and that area.
fn largest_outer_contour(edges: &GrayImage) -> Option<(f64, Contour<i32>)> {
    find_contours::<i32>(edges)
        .into_iter()
        .filter(|c| c.parent.is_none() && matches!(c.border_type, BorderType::Outer))
        .filter(|c| c.points.len() >= 3)
        .map(|c| (contour_area(&c.points), c))
        .max_by(|a, b| a.0.total_cmp(&b.0))
}

/// Output size from the ordered corners' side lengths, clamped.
fn canonical_size(corners: &[Point2; 4], config: &NormalizerConfig) -> (u32, u32) {
    let [tl, tr, br, bl] = corners;
    let width = br.distance(bl).max(tr.distance(tl)) as u32;
    let height = tr.distance(br).max(tl.distance(bl)) as u32;
    (
        width.clamp(config.min_width, config.max_width),
        height.clamp(config.min_height, config.max_height),
    )
}

fn warp_to_rectangle(
    crop: &RgbImage,
    corners: &[Point2; 4],
    width: u32,
    height: u32,
) -> Option<RgbImage> {
    let from = corners.map(|p| (p.x, p.y));
    let (w, h) = ((width - 1) as f32, (height - 1) as f32);
    let to = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];

    let projection = Projection::from_control_points(from, to)?;
    let mut out = RgbImage::new(width, height);
    warp_into(crop, &projection, Interpolation::Bilinear, Rgb([0, 0, 0]), &mut out);
    Some(out)
}

/// Grayscale opening with a 2x2 square element.
fn open_2x2(image: &GrayImage) -> GrayImage {
    let element = GrayImage::from_pixel(2, 2, Luma([255]));
    grayscale_open(image, &Mask::from_image(&element, 1, 1))
}
