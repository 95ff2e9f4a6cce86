//! Visualization renderer: chart data to a size-bounded `data:` URI.

pub mod canvas;

use analyst_core::{
    AnalystError, ChartData, ChartRenderer, DashPattern, ImageFormat, ImagePayload, Result, Rgb,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use tracing::debug;

use crate::config::RenderConfig;
use canvas::Canvas;

/// Scale factors tried in order until the payload fits.
const RESOLUTION_LADDER: &[f64] = &[1.0, 0.8, 0.6, 0.5, 0.4, 0.3];

const TICKS: usize = 5;
const AXIS_COLOR: Rgb = Rgb::BLACK;
const GRID_COLOR: Rgb = Rgb(228, 228, 228);

/// Scatter plot with an optional least-squares line.
#[derive(Debug, Clone, Copy)]
pub struct ScatterRenderer {
    width: u32,
    height: u32,
}

impl Default for ScatterRenderer {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl ScatterRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(config.width, config.height)
    }

    /// Resolutions tried from largest to smallest.
    pub fn ladder(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        RESOLUTION_LADDER.iter().map(move |scale| {
            (
                ((self.width as f64 * scale).round() as u32).max(80),
                ((self.height as f64 * scale).round() as u32).max(60),
            )
        })
    }

    pub fn draw(&self, chart: &ChartData, width: u32, height: u32) -> RgbImage {
        let mut canvas = Canvas::new(width, height);
        let frame = Frame::new(chart, width, height);
        let (left, top, right, bottom) = frame.plot;

        for i in 0..=TICKS {
            let t = i as f64 / TICKS as f64;
            let px = left + ((right - left) as f64 * t).round() as i64;
            let py = bottom - ((bottom - top) as f64 * t).round() as i64;

            canvas.line((px, top), (px, bottom), GRID_COLOR, DashPattern::Solid, 1);
            canvas.line((left, py), (right, py), GRID_COLOR, DashPattern::Solid, 1);
            canvas.line((px, bottom), (px, bottom + frame.tick), AXIS_COLOR, DashPattern::Solid, 1);
            canvas.line((left - frame.tick, py), (left, py), AXIS_COLOR, DashPattern::Solid, 1);
        }
        canvas.line((left, bottom), (right, bottom), AXIS_COLOR, DashPattern::Solid, 2);
        canvas.line((left, top), (left, bottom), AXIS_COLOR, DashPattern::Solid, 2);

        canvas.set_clip(Some(frame.plot));
        for &(x, y) in &chart.points {
            let (px, py) = frame.to_pixel(x, y);
            canvas.disc(px, py, frame.radius, Rgb::STEEL_BLUE);
        }

        if let (Some(fit), Some(style)) = (chart.fit, chart.spec.regression) {
            let start = frame.to_pixel(frame.x_range.0, fit.at(frame.x_range.0));
            let end = frame.to_pixel(frame.x_range.1, fit.at(frame.x_range.1));
            canvas.line(start, end, style.color, style.dash, frame.line_width);
        }
        canvas.set_clip(None);

        canvas.into_image()
    }

    fn encode(image: &RgbImage, format: ImageFormat) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let (width, height) = image.dimensions();

        let result = match format {
            ImageFormat::Png => PngEncoder::new_with_quality(
                &mut bytes,
                CompressionType::Best,
                FilterType::Adaptive,
            )
            .write_image(image.as_raw(), width, height, ExtendedColorType::Rgb8),
            ImageFormat::Webp => WebPEncoder::new_lossless(&mut bytes).write_image(
                image.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            ),
        };
        result.map_err(|e| AnalystError::Internal(format!("image encoding failed: {}", e)))?;

        Ok(bytes)
    }
}

impl ChartRenderer for ScatterRenderer {
    fn render(&self, chart: &ChartData, max_chars: usize) -> Result<ImagePayload> {
        let format = chart.spec.format;
        let mut smallest = usize::MAX;

        for (width, height) in self.ladder() {
            let image = self.draw(chart, width, height);
            let bytes = Self::encode(&image, format)?;
            let payload = ImagePayload {
                format,
                width,
                height,
                data_uri: format!("data:{};base64,{}", format.mime_type(), STANDARD.encode(&bytes)),
            };

            if payload.fits_within(max_chars) {
                debug!(width, height, chars = payload.encoded_len(), "Rendered chart");
                return Ok(payload);
            }

            debug!(
                width,
                height,
                chars = payload.encoded_len(),
                limit = max_chars,
                "Chart over size ceiling, trying a smaller resolution"
            );
            smallest = smallest.min(payload.encoded_len());
        }

        Err(AnalystError::SizeExceeded {
            limit: max_chars,
            actual: smallest,
        })
    }
}

/// Data-to-pixel mapping for one rendering.
struct Frame {
    plot: canvas::Rect,
    x_range: (f64, f64),
    y_range: (f64, f64),
    radius: i64,
    tick: i64,
    line_width: u32,
}

impl Frame {
    fn new(chart: &ChartData, width: u32, height: u32) -> Self {
        let scale = (width as f64 / 800.0).min(height as f64 / 600.0);
        let margin_left = (width as f64 * 0.09).round().max(16.0) as i64;
        let margin_bottom = (height as f64 * 0.09).round().max(14.0) as i64;
        let margin_other = (width.min(height) as f64 * 0.04).round().max(6.0) as i64;

        let plot = (
            margin_left,
            margin_other,
            width as i64 - 1 - margin_other,
            height as i64 - 1 - margin_bottom,
        );

        Self {
            plot,
            x_range: padded_range(chart.points.iter().map(|p| p.0)),
            y_range: padded_range(chart.points.iter().map(|p| p.1)),
            radius: (3.0 * scale).round().max(1.0) as i64,
            tick: (5.0 * scale).round().max(2.0) as i64,
            line_width: (2.0 * scale).round().max(1.0) as u32,
        }
    }

    fn to_pixel(&self, x: f64, y: f64) -> (i64, i64) {
        let (left, top, right, bottom) = self.plot;
        let fx = (x - self.x_range.0) / (self.x_range.1 - self.x_range.0);
        let fy = (y - self.y_range.0) / (self.y_range.1 - self.y_range.0);
        let px = left as f64 + fx * (right - left) as f64;
        let py = bottom as f64 - fy * (bottom - top) as f64;
        // Clamp far-off values so integer conversion stays meaningful.
        let limit = 1e6;
        (px.clamp(-limit, limit).round() as i64, py.clamp(-limit, limit).round() as i64)
    }
}

/// Min/max widened by 5% on each side; a degenerate range becomes `v ± 1`.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if (max - min).abs() < f64::EPSILON {
        return (min - 1.0, max + 1.0);
    }
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ladder() {
        let sizes: Vec<(u32, u32)> = ScatterRenderer::default().ladder().collect();
        assert_eq!(
            sizes,
            vec![(800, 600), (640, 480), (480, 360), (400, 300), (320, 240), (240, 180)]
        );
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range([0.0, 10.0].into_iter()), (-0.5, 10.5));
        assert_eq!(padded_range([3.0, 3.0].into_iter()), (2.0, 4.0));
        assert_eq!(padded_range(std::iter::empty()), (0.0, 1.0));
    }
}
