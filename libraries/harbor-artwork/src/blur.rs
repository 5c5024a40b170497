//! Backdrop blur pipeline
//!
//! Blur cost grows with both image area and radius, so the cover is first
//! scaled to a small fixed width and only then blurred. Several box blur
//! passes approximate a Gaussian at a fraction of the cost.
//!
//! Every cover ends up at the same width, so a fixed radius softens tiny and
//! huge covers alike.

use crate::types::ArtworkConfig;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Downscale + repeated box blur
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlurPipeline {
    /// Width of the output image in pixels
    pub target_width: u32,
    /// Box blur radius
    pub radius: u32,
    /// Number of box blur passes
    pub passes: u32,
}

impl Default for BlurPipeline {
    fn default() -> Self {
        Self {
            target_width: 100,
            radius: 8,
            passes: 6,
        }
    }
}

impl From<&ArtworkConfig> for BlurPipeline {
    fn from(config: &ArtworkConfig) -> Self {
        Self {
            target_width: config.backdrop_width.max(1),
            radius: config.blur_radius,
            passes: config.blur_passes,
        }
    }
}

impl BlurPipeline {
    /// Derive a backdrop from `source`
    ///
    /// `None` in, `None` out: a track without artwork is not an error.
    /// Images with a zero dimension also yield `None`.
    pub fn process(&self, source: Option<&RgbaImage>) -> Option<RgbaImage> {
        let source = source?;
        if source.width() == 0 || source.height() == 0 {
            return None;
        }

        let mut blurred = self.rescale(source);
        for _ in 0..self.passes {
            blurred = box_blur(&blurred, self.radius);
        }
        Some(blurred)
    }

    /// Scale to `target_width`, keeping the aspect ratio
    ///
    /// Narrow covers are stretched up; height is at least one pixel.
    fn rescale(&self, source: &RgbaImage) -> RgbaImage {
        let (width, height) = source.dimensions();
        if width == self.target_width {
            return source.clone();
        }

        let scaled_height =
            (u64::from(height) * u64::from(self.target_width) / u64::from(width)).max(1);
        imageops::resize(
            source,
            self.target_width,
            scaled_height as u32,
            FilterType::Triangle,
        )
    }
}

/// One box blur pass
///
/// Every output pixel is the channel-wise integer average (alpha included) of
/// the `(2r+1)²` window around it, with coordinates clamped to the image edge.
/// The window sum is computed separably (row sums, then column sums of those)
/// and divided once, which gives exactly the same result as the direct
/// nested-loop average.
pub fn box_blur(source: &RgbaImage, radius: u32) -> RgbaImage {
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 || radius == 0 {
        return source.clone();
    }

    let r = i64::from(radius);
    let side = 2 * radius + 1;
    let count = side * side;
    let clamp = |v: i64, len: u32| v.clamp(0, i64::from(len) - 1) as u32;

    // Horizontal window sums, one [r, g, b, a] per pixel.
    let mut row_sums = vec![[0u32; 4]; (width as usize) * (height as usize)];
    for y in 0..height {
        for x in 0..width {
            let mut acc = [0u32; 4];
            for dx in -r..=r {
                let Rgba(px) = *source.get_pixel(clamp(i64::from(x) + dx, width), y);
                for (sum, channel) in acc.iter_mut().zip(px) {
                    *sum += u32::from(channel);
                }
            }
            row_sums[(y * width + x) as usize] = acc;
        }
    }

    let mut output = RgbaImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let mut acc = [0u32; 4];
            for dy in -r..=r {
                let ny = clamp(i64::from(y) + dy, height);
                let row = row_sums[(ny * width + x) as usize];
                for (sum, partial) in acc.iter_mut().zip(row) {
                    *sum += partial;
                }
            }
            output.put_pixel(x, y, Rgba(acc.map(|sum| (sum / count) as u8)));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Direct nested-loop box blur, for comparison
    fn naive_box_blur(source: &RgbaImage, radius: u32) -> RgbaImage {
        let (w, h) = source.dimensions();
        let r = radius as i64;
        let mut out = RgbaImage::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let mut acc = [0u32; 4];
                let mut count = 0;
                for dy in -r..=r {
                    for dx in -r..=r {
                        let nx = (x as i64 + dx).clamp(0, w as i64 - 1) as u32;
                        let ny = (y as i64 + dy).clamp(0, h as i64 - 1) as u32;
                        let px = source.get_pixel(nx, ny).0;
                        for c in 0..4 {
                            acc[c] += px[c] as u32;
                        }
                        count += 1;
                    }
                }
                out.put_pixel(x, y, Rgba(acc.map(|s| (s / count) as u8)));
            }
        }
        out
    }

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            Rgba([
                (x * 7 % 256) as u8,
                (y * 13 % 256) as u8,
                ((x + y) * 3 % 256) as u8,
                (255 - (x * y) % 256) as u8,
            ])
        })
    }

    #[test]
    fn separable_blur_matches_nested_loop() {
        let img = gradient(23, 17);
        for radius in [1, 3, 8] {
            assert_eq!(box_blur(&img, radius), naive_box_blur(&img, radius));
        }
    }

    #[test]
    fn uniform_image_is_unchanged() {
        let img = RgbaImage::from_pixel(30, 20, Rgba([10, 20, 30, 40]));
        assert_eq!(box_blur(&img, 8), img);
    }

    #[test]
    fn zero_radius_is_identity() {
        let img = gradient(9, 9);
        assert_eq!(box_blur(&img, 0), img);
    }

    #[test]
    fn absent_artwork_yields_nothing() {
        assert!(BlurPipeline::default().process(None).is_none());
    }

    #[test]
    fn single_transparent_pixel_is_handled() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0]));
        let out = BlurPipeline::default().process(Some(&img)).unwrap();
        assert_eq!(out.dimensions(), (100, 100));
        assert!(out.pixels().all(|p| p == &Rgba([0, 0, 0, 0])));
    }

    #[test]
    fn narrow_cover_is_stretched_to_target_width() {
        let img = gradient(20, 10);
        let out = BlurPipeline::default().process(Some(&img)).unwrap();
        assert_eq!(out.dimensions(), (100, 50));
    }

    #[test]
    fn empty_image_yields_nothing() {
        let img = RgbaImage::new(0, 0);
        assert!(BlurPipeline::default().process(Some(&img)).is_none());
    }

    #[test]
    fn wide_image_is_downscaled_preserving_aspect() {
        let img = gradient(400, 200);
        let out = BlurPipeline::default().process(Some(&img)).unwrap();
        assert_eq!(out.dimensions(), (100, 50));
    }

    #[test]
    fn very_wide_image_keeps_at_least_one_row() {
        let img = gradient(1000, 2);
        let out = BlurPipeline::default().process(Some(&img)).unwrap();
        assert_eq!(out.dimensions(), (100, 1));
    }

    #[test]
    fn pipeline_is_deterministic() {
        let img = gradient(321, 123);
        let pipeline = BlurPipeline::default();
        assert_eq!(pipeline.process(Some(&img)), pipeline.process(Some(&img)));
    }

    #[test]
    fn blur_softens_hard_edges() {
        let img = RgbaImage::from_fn(40, 40, |x, _| {
            if x < 20 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let out = BlurPipeline::default().process(Some(&img)).unwrap();
        let edge = out.get_pixel(20, 20).0[0];
        assert!(edge > 0 && edge < 255, "edge value {edge} should be mid-grey");
    }

    #[test]
    fn pipeline_follows_config() {
        let config = ArtworkConfig {
            backdrop_width: 50,
            blur_radius: 2,
            blur_passes: 1,
            ..ArtworkConfig::default()
        };
        let pipeline = BlurPipeline::from(&config);
        assert_eq!(pipeline.target_width, 50);
        let out = pipeline.process(Some(&gradient(200, 100))).unwrap();
        assert_eq!(out.dimensions(), (50, 25));
    }
}
