//! Contrast Limited Adaptive Histogram Equalization on 8-bit grayscale.
//!
//! Per-tile clipped histograms are turned into lookup tables, and every
//! pixel is mapped through a bilinear blend of the four nearest tile LUTs.

use image::{GrayImage, Luma};

const BINS: usize = 256;

/// Apply CLAHE with `tiles` x `tiles` regions and the given clip limit
/// (relative to a uniform histogram, as in OpenCV).
pub fn clahe(image: &GrayImage, clip_limit: f32, tiles: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let tile_w = width.div_ceil(tiles.clamp(1, width));
    let tile_h = height.div_ceil(tiles.clamp(1, height));
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);
            luts.push(tile_lut(image, x0, y0, x1, y1, clip_limit));
        }
    }

    let lut_at = |tx: u32, ty: u32| &luts[(ty * tiles_x + tx) as usize];

    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        let (ty0, ty1, ay) = neighbours(y, tile_h, tiles_y);
        for x in 0..width {
            let (tx0, tx1, ax) = neighbours(x, tile_w, tiles_x);
            let v = image.get_pixel(x, y)[0] as usize;

            let top = lut_at(tx0, ty0)[v] * (1.0 - ax) + lut_at(tx1, ty0)[v] * ax;
            let bottom = lut_at(tx0, ty1)[v] * (1.0 - ax) + lut_at(tx1, ty1)[v] * ax;
            let mapped = top * (1.0 - ay) + bottom * ay;

            out.put_pixel(x, y, Luma([mapped.round().clamp(0.0, 255.0) as u8]));
        }
    }
    out
}

/// Lower/upper tile index and blend weight for a pixel coordinate.
fn neighbours(pos: u32, tile: u32, count: u32) -> (u32, u32, f32) {
    let f = (pos as f32 + 0.5) / tile as f32 - 0.5;
    let last = count.saturating_sub(1);
    if f <= 0.0 {
        return (0, 0, 0.0);
    }
    let lower = (f.floor() as u32).min(last);
    let upper = (lower + 1).min(last);
    let weight = if upper == lower { 0.0 } else { f - lower as f32 };
    (lower, upper, weight.clamp(0.0, 1.0))
}

fn tile_lut(image: &GrayImage, x0: u32, y0: u32, x1: u32, y1: u32, clip_limit: f32) -> [f32; BINS] {
    let mut hist = [0u32; BINS];
    for y in y0..y1 {
        for x in x0..x1 {
            hist[image.get_pixel(x, y)[0] as usize] += 1;
        }
    }
    let pixels = ((x1 - x0) * (y1 - y0)).max(1);

    if clip_limit > 0.0 {
        let limit = ((clip_limit * pixels as f32 / BINS as f32) as u32).max(1);
        let mut excess = 0u32;
        for count in hist.iter_mut() {
            if *count > limit {
                excess += *count - limit;
                *count = limit;
            }
        }
        let share = excess / BINS as u32;
        let remainder = (excess % BINS as u32) as usize;
        for (i, count) in hist.iter_mut().enumerate() {
            *count += share + u32::from(i < remainder);
        }
    }

    let mut lut = [0f32; BINS];
    let mut cdf = 0u32;
    let scale = 255.0 / pixels as f32;
    for (i, count) in hist.iter().enumerate() {
        cdf += count;
        lut[i] = cdf as f32 * scale;
    }
    lut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stretches_low_contrast() {
        let img = GrayImage::from_fn(64, 32, |x, _| Luma([100 + (x % 20) as u8]));
        let out = clahe(&img, 3.0, 8);
        let (min, max) = out
            .pixels()
            .fold((255u8, 0u8), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
        assert!(max - min > 19);
        assert_eq!(out.dimensions(), img.dimensions());
    }

    #[test]
    fn test_uniform_image_stays_uniform() {
        let img = GrayImage::from_pixel(40, 20, Luma([90]));
        let out = clahe(&img, 3.0, 8);
        let first = out.get_pixel(0, 0)[0];
        assert!(out.pixels().all(|p| p[0] == first));
    }

    #[test]
    fn test_tiny_image() {
        let img = GrayImage::from_pixel(3, 2, Luma([10]));
        let out = clahe(&img, 3.0, 8);
        assert_eq!(out.dimensions(), (3, 2));
    }
}
