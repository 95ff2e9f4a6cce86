//! Response assembler: answers to the JSON body returned to the caller.

use analyst_core::{
    AnalysisResult, AnalystError, Answer, AnswerEncoding, QuestionKind, ResponseShape, Result,
    Task, TaskPlan, DEFAULT_MAX_IMAGE_CHARS,
};
use serde_json::{json, Map, Number, Value};

/// Largest integer an f64 holds exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Clone, Copy)]
pub struct ResponseAssembler {
    default_max_chars: usize,
    preview_chars: usize,
}

impl Default for ResponseAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IMAGE_CHARS, 100)
    }
}

impl ResponseAssembler {
    pub fn new(default_max_chars: usize, preview_chars: usize) -> Self {
        Self {
            default_max_chars,
            preview_chars,
        }
    }

    /// Array in question order, or object keyed by question text.
    pub fn assemble(&self, plan: &TaskPlan, result: &AnalysisResult) -> Result<Value> {
        if result.len() != plan.question_count() {
            return Err(AnalystError::Internal(format!(
                "expected {} answers, got {}",
                plan.question_count(),
                result.len()
            )));
        }

        for (question, answer) in &result.entries {
            if let Some(payload) = answer.as_image() {
                let limit = match &question.kind {
                    QuestionKind::Chart(spec) => spec.max_chars.unwrap_or(self.default_max_chars),
                    _ => self.default_max_chars,
                };
                if !payload.fits_within(limit) {
                    return Err(AnalystError::SizeExceeded {
                        limit,
                        actual: payload.encoded_len(),
                    });
                }
            }
        }

        match plan.shape {
            ResponseShape::Array => result
                .answers()
                .map(|answer| encode_answer(answer, plan.encoding))
                .collect::<Result<Vec<Value>>>()
                .map(Value::Array),
            ResponseShape::Object => {
                let mut object = Map::new();
                for (question, answer) in &result.entries {
                    object.insert(question.text.clone(), encode_answer(answer, plan.encoding)?);
                }
                Ok(Value::Object(object))
            }
        }
    }

    /// Echo response for tasks the interpreter could not understand.
    pub fn fallback(&self, task: &Task) -> Value {
        json!([
            "I received your request!",
            format!("Task: {}...", task.preview(self.preview_chars)),
        ])
    }
}

fn encode_answer(answer: &Answer, encoding: AnswerEncoding) -> Result<Value> {
    match (answer, encoding) {
        (Answer::Text(text), _) => Ok(Value::String(text.clone())),
        (Answer::Image(payload), _) => Ok(Value::String(payload.data_uri.clone())),
        (Answer::Number(n), AnswerEncoding::Strings) => {
            finite(*n).map(|_| Value::String(answer.to_string()))
        }
        (Answer::Number(n), AnswerEncoding::Native) => {
            let n = finite(*n)?;
            if n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER {
                Ok(Value::Number(Number::from(n as i64)))
            } else {
                Number::from_f64(n)
                    .map(Value::Number)
                    .ok_or_else(|| AnalystError::computation("answer is not a finite number"))
            }
        }
    }
}

fn finite(n: f64) -> Result<f64> {
    if n.is_finite() {
        Ok(n)
    } else {
        Err(AnalystError::computation("answer is not a finite number"))
    }
}
