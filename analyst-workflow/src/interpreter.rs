//! Task interpreter: raw task text to a [`TaskPlan`].

pub mod filters;
pub mod questions;

use analyst_core::{
    AnalystError, AnswerEncoding, Question, ResponseShape, Result, SourceRef, TaskPlan,
};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;
use url::Url;

pub use questions::{QuestionLayout, RawQuestion};

fn uri_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\b[A-Za-z][A-Za-z0-9+.-]*://[^\s<>"'`]+"#).expect("valid uri regex")
    })
}

fn trim_uri(candidate: &str) -> &str {
    candidate.trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':' | ')' | ']' | '}' | '!' | '?'))
}

#[derive(Debug, Clone, Default)]
pub struct TaskInterpreter {
    /// Catalog names, lowercased.
    known_datasets: Vec<String>,
}

impl TaskInterpreter {
    pub fn new<I, S>(known_datasets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut known_datasets: Vec<String> = known_datasets
            .into_iter()
            .map(|name| name.as_ref().trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
        // Longest first so "court judgments 2022" beats "court judgments".
        known_datasets.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        Self { known_datasets }
    }

    /// Questions are read and classified before the source is resolved, so a
    /// malformed task is a parse error even when it also names no source.
    pub fn interpret(&self, text: &str) -> Result<TaskPlan> {
        let (raw_questions, layout) = questions::extract_questions(text)
            .ok_or_else(|| AnalystError::parse("no questions found in task"))?;

        let mut questions: Vec<Question> = Vec::with_capacity(raw_questions.len());
        for (index, raw) in raw_questions.into_iter().enumerate() {
            let previous = questions.last().map(|q| &q.kind);
            let kind = questions::classify(&raw, previous)?;
            debug!(index, kind = kind.name(), question = %raw.text, "Classified question");

            let mut question = Question::new(index, raw.text, kind);
            if let Some(hint) = raw.hint {
                question = question.with_hint(hint);
            }
            questions.push(question);
        }

        let source = self.resolve_source(text)?;

        Ok(TaskPlan {
            source,
            questions,
            shape: response_shape(text, layout),
            encoding: answer_encoding(text),
        })
    }

    /// A catalog name mentioned in the text wins over any URL.
    pub fn extract_source(&self, text: &str) -> Option<SourceRef> {
        self.resolve_source(text).ok()
    }

    /// Like [`extract_source`](Self::extract_source), but says why nothing usable
    /// was found: no source at all, or only URIs with a scheme that cannot be fetched.
    pub fn resolve_source(&self, text: &str) -> Result<SourceRef> {
        let lowered = text.to_lowercase();
        if let Some(name) = self.known_datasets.iter().find(|name| lowered.contains(name.as_str())) {
            return Ok(SourceRef::Dataset(name.clone()));
        }

        let mut unsupported: Option<&str> = None;
        for candidate in uri_regex().find_iter(text).map(|m| trim_uri(m.as_str())) {
            match Url::parse(candidate) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {
                    return Ok(SourceRef::Url(url));
                }
                _ => {
                    unsupported.get_or_insert(candidate);
                }
            }
        }

        Err(match unsupported {
            Some(uri) => AnalystError::source_unavailable(
                uri,
                "unsupported scheme, only http(s) URLs and registered datasets can be fetched",
            ),
            None => AnalystError::source_unavailable(
                "task",
                "no registered dataset or http(s) URL found in task",
            ),
        })
    }
}

fn response_shape(text: &str, layout: QuestionLayout) -> ResponseShape {
    let lowered = text.to_lowercase();
    if lowered.contains("json object") {
        ResponseShape::Object
    } else if lowered.contains("json array") {
        ResponseShape::Array
    } else {
        match layout {
            QuestionLayout::JsonObject => ResponseShape::Object,
            QuestionLayout::NumberedList => ResponseShape::Array,
        }
    }
}

fn answer_encoding(text: &str) -> AnswerEncoding {
    if text.to_lowercase().contains("of strings") {
        AnswerEncoding::Strings
    } else {
        AnswerEncoding::Native
    }
}
