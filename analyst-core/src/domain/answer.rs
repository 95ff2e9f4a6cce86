use serde::{Deserialize, Serialize};
use std::fmt;

use super::question::{ChartSpec, Question};

/// Default ceiling on an image data URI, in characters.
pub const DEFAULT_MAX_IMAGE_CHARS: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Webp,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// A rendered chart wrapped in a `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub data_uri: String,
}

impl ImagePayload {
    pub fn encoded_len(&self) -> usize {
        self.data_uri.len()
    }

    pub fn fits_within(&self, max_chars: usize) -> bool {
        self.encoded_len() < max_chars
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Answer {
    Text(String),
    Number(f64),
    Image(ImagePayload),
}

impl Answer {
    pub fn as_image(&self) -> Option<&ImagePayload> {
        match self {
            Answer::Image(payload) => Some(payload),
            _ => None,
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Text(text) => f.write_str(text),
            Answer::Number(n) => write!(f, "{}", n),
            Answer::Image(payload) => f.write_str(&payload.data_uri),
        }
    }
}

/// Least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LineFit {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Points and fit computed for a chart question, waiting to be rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub spec: ChartSpec,
    pub points: Vec<(f64, f64)>,
    pub fit: Option<LineFit>,
}

/// What the analysis engine produced for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Computed {
    Ready { answer: Answer },
    Chart { data: ChartData },
}

/// One answer per question, in question order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub entries: Vec<(Question, Answer)>,
}

impl AnalysisResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, question: Question, answer: Answer) {
        self.entries.push((question, answer));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn answers(&self) -> impl Iterator<Item = &Answer> {
        self.entries.iter().map(|(_, a)| a)
    }
}
