use analyst_core::{DashPattern, Rgb};
use image::{Rgb as Pixel, RgbImage};

/// Pixel rectangle `(left, top, right, bottom)`, inclusive.
pub type Rect = (i64, i64, i64, i64);

/// Minimal raster surface for scatter plots.
pub struct Canvas {
    image: RgbImage,
    clip: Option<Rect>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, Pixel([255, 255, 255])),
            clip: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Restrict drawing to `rect` until cleared.
    pub fn set_clip(&mut self, rect: Option<Rect>) {
        self.clip = rect;
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    pub fn put(&mut self, x: i64, y: i64, color: Rgb) {
        if let Some((left, top, right, bottom)) = self.clip {
            if x < left || x > right || y < top || y > bottom {
                return;
            }
        }
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return;
        }
        self.image.put_pixel(x as u32, y as u32, Pixel([color.0, color.1, color.2]));
    }

    /// Bresenham line with a square brush of `thickness` pixels.
    pub fn line(
        &mut self,
        from: (i64, i64),
        to: (i64, i64),
        color: Rgb,
        dash: DashPattern,
        thickness: u32,
    ) {
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let sx = if x < to.0 { 1 } else { -1 };
        let sy = if y < to.1 { 1 } else { -1 };
        let mut err = dx + dy;
        let half = (thickness.max(1) as i64 - 1) / 2;
        let scale = thickness.max(1) as u64;
        let mut step: u64 = 0;

        loop {
            let on = match dash {
                DashPattern::Solid => true,
                DashPattern::Dashed => step % (16 * scale) < 10 * scale,
                DashPattern::Dotted => step % (6 * scale) < 2 * scale,
            };
            if on {
                for ox in -half..=half {
                    for oy in -half..=half {
                        self.put(x + ox, y + oy, color);
                    }
                }
            }

            if x == to.0 && y == to.1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
            step += 1;
        }
    }

    pub fn disc(&mut self, cx: i64, cy: i64, radius: i64, color: Rgb) {
        for y in -radius..=radius {
            for x in -radius..=radius {
                if x * x + y * y <= radius * radius {
                    self.put(cx + x, cy + y, color);
                }
            }
        }
    }
}
