use image::{GenericImageView, ImageBuffer, Pixel};
use serde::{Deserialize, Serialize};

use super::BBox;

/// Integer pixel region, guaranteed non-empty and inside its source image
/// when produced by [`clamp_to_image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn to_bbox(&self) -> BBox {
        BBox::from_tlwh(
            self.x as f32,
            self.y as f32,
            self.width as f32,
            self.height as f32,
        )
    }
}

/// Clamp a box to a `width` x `height` image.
///
/// Coordinates are truncated toward zero before clamping. Returns `None`
/// when nothing usable is left, including boxes fully outside the image.
pub fn clamp_to_image(bbox: &BBox, width: u32, height: u32) -> Option<PixelRect> {
    if width == 0 || height == 0 {
        return None;
    }
    let clamp = |v: f32, max: u32| -> i64 {
        if v.is_nan() {
            return 0;
        }
        (v as i64).clamp(0, max as i64)
    };

    let x1 = clamp(bbox.x1, width);
    let x2 = clamp(bbox.x2, width);
    let y1 = clamp(bbox.y1, height);
    let y2 = clamp(bbox.y2, height);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    Some(PixelRect {
        x: x1 as u32,
        y: y1 as u32,
        width: (x2 - x1) as u32,
        height: (y2 - y1) as u32,
    })
}

/// Crop `bbox` out of `image`, clamped to its bounds.
///
/// `None` means "no usable crop this frame", never an error.
pub fn safe_crop<I>(
    image: &I,
    bbox: &BBox,
) -> Option<ImageBuffer<I::Pixel, Vec<<I::Pixel as Pixel>::Subpixel>>>
where
    I: GenericImageView + 'static,
{
    let (width, height) = image.dimensions();
    let region = clamp_to_image(bbox, width, height)?;
    Some(
        image
            .view(region.x, region.y, region.width, region.height)
            .to_image(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn frame(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 0]))
    }

    #[test]
    fn test_crop_inside() {
        let img = frame(64, 48);
        let crop = safe_crop(&img, &BBox::new(10.0, 5.0, 30.0, 25.0)).unwrap();
        assert_eq!(crop.dimensions(), (20, 20));
        assert_eq!(crop.get_pixel(0, 0), &Rgb([10, 5, 0]));
    }

    #[test]
    fn test_crop_is_clamped_to_bounds() {
        let img = frame(64, 48);
        let cases = [
            BBox::new(-20.0, -20.0, 10.0, 10.0),
            BBox::new(50.0, 40.0, 500.0, 500.0),
            BBox::new(-1.0, -1.0, 65.0, 49.0),
        ];
        for bbox in cases {
            let region = clamp_to_image(&bbox, 64, 48).unwrap();
            assert!(region.x + region.width <= 64);
            assert!(region.y + region.height <= 48);
            let crop = safe_crop(&img, &bbox).unwrap();
            assert_eq!(crop.dimensions(), (region.width, region.height));
        }
    }

    #[test]
    fn test_crop_outside_is_none() {
        let img = frame(64, 48);
        assert!(safe_crop(&img, &BBox::new(100.0, 10.0, 120.0, 20.0)).is_none());
        assert!(safe_crop(&img, &BBox::new(64.0, 10.0, 80.0, 20.0)).is_none());
        assert!(safe_crop(&img, &BBox::new(-30.0, -30.0, -1.0, -1.0)).is_none());
        assert!(safe_crop(&img, &BBox::new(10.0, 10.0, 10.0, 20.0)).is_none());
        assert!(safe_crop(&img, &BBox::new(20.0, 10.0, 10.0, 20.0)).is_none());
    }
}
