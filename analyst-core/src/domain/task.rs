use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use super::ids::TaskId;
use super::question::Question;

/// A data-analysis job as uploaded by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl Task {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(),
            text: text.into(),
            received_at: Utc::now(),
        }
    }

    /// The first `max_chars` characters of the task text.
    pub fn preview(&self, max_chars: usize) -> String {
        self.text.chars().take(max_chars).collect()
    }
}

/// Where the data for a task comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SourceRef {
    /// A page or file to download.
    Url(Url),
    /// A dataset registered in the catalog under this name.
    Dataset(String),
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceRef::Url(url) => write!(f, "{}", url),
            SourceRef::Dataset(name) => write!(f, "dataset:{}", name),
        }
    }
}

/// JSON container the client expects the answers in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseShape {
    /// Ordered array, one element per question.
    #[default]
    Array,
    /// Object keyed by the verbatim question text.
    Object,
}

/// How scalar answers are written into the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnswerEncoding {
    /// Numbers stay JSON numbers.
    #[default]
    Native,
    /// Every answer is a JSON string.
    Strings,
}

/// Output of the task interpreter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPlan {
    pub source: SourceRef,
    pub questions: Vec<Question>,
    pub shape: ResponseShape,
    pub encoding: AnswerEncoding,
}

impl TaskPlan {
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// True when at least one question asks for a chart.
    pub fn needs_rendering(&self) -> bool {
        self.questions.iter().any(|q| q.kind.is_chart())
    }
}
