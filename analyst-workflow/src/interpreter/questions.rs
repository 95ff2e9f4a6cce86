//! Question extraction and classification.
//!
//! Classification runs an ordered list of phrase patterns over the lowercased
//! question; the first pattern that matches decides the [`QuestionKind`].

use analyst_core::{
    AnalystError, Aggregation, ChartSpec, ColumnRef, ColumnRole, DashPattern, Direction,
    ImageFormat, LineStyle, Measure, QuestionKind, Result, Rgb,
};
use regex::Regex;
use serde_json::{Deserializer, Map, Value};
use std::sync::OnceLock;

use super::filters::parse_filters;

/// A question as written in the task, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RawQuestion {
    pub text: String,
    pub hint: Option<String>,
}

/// Where the questions came from, which decides the default response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionLayout {
    JsonObject,
    NumberedList,
}

macro_rules! lazy_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect(concat!("valid ", stringify!($name))))
        }
    };
}

lazy_regex!(numbered_regex, r"^\s*(\d{1,3})[.)]\s+(\S.*)$");
lazy_regex!(
    question_cue_regex,
    r"\b(?:answer|respond\s+to)\s+(?:the\s+|these\s+)?following\b|\bfollowing\s+questions?\b"
);
lazy_regex!(
    chart_regex,
    r"\b(?:scatter\s*plot|scatterplot|plot|plotted|chart|graph|draw|visuali[sz]e)\b"
);
lazy_regex!(
    axes_of_regex,
    r"(?:scatter\s*plot|scatterplot|plot|chart|graph)\s+of\s+(?:the\s+)?(.+?)\s+(?:and|vs\.?|versus|against)\s+(?:the\s+)?(.+?)(?:\s+(?:along|with|as|using|from|in|for|through|on)\b|[.,;:]|$)"
);
lazy_regex!(
    axes_verb_regex,
    r"\b(?:plot|draw|graph|chart)\s+(?:the\s+)?(.+?)\s+(?:and|vs\.?|versus|against)\s+(?:the\s+)?(.+?)(?:\s+(?:along|with|as|using|from|in|for|through|on)\b|[.,;:]|$)"
);
lazy_regex!(
    inherit_regex,
    r"\b(?:above|previous|preceding|prior|last)\s+(?:question|answer|result)"
);
lazy_regex!(
    color_regex,
    r"\b(red|blue|green|black|orange|purple|gray|grey)\b"
);
lazy_regex!(
    ceiling_regex,
    r"(?:under|below|less than|within|at most)\s+([\d,]+)\s*(?:bytes|characters|chars)\b"
);
lazy_regex!(
    correlation_regex,
    r"correlation(?:\s+coefficient)?\s+between\s+(?:the\s+)?(.+?)\s+and\s+(?:the\s+)?(.+?)(?:\s+(?:for|in|where|among|across|from|of)\b.*)?\s*\??$"
);
lazy_regex!(
    regression_regex,
    r"regression\s+slope\s+of\s+(?:the\s+)?(.+?)\s+(?:by|on|against|versus|vs\.?)\s+(?:the\s+)?(.+?)(?:\s+(?:for|in|where|among|across|from)\b.*)?\s*\??$"
);
lazy_regex!(
    count_regex,
    r"^\s*(?:how\s+many\b|count\b|(?:what\s+is\s+)?the\s+number\s+of\b)"
);
lazy_regex!(
    extreme_time_regex,
    r"\b(earliest|first|oldest|latest|most\s+recent|newest)\s+([a-z]+)"
);
lazy_regex!(
    extreme_value_regex,
    r"^\s*(?:which|what)\s+(?:is\s+the\s+)?([a-z][a-z ]*?)\s+(?:has|had|have|with|having)\s+the\s+(highest|largest|greatest|biggest|most|lowest|smallest|least|fewest)\s+(.+?)\s*\??$"
);
lazy_regex!(
    most_frequent_regex,
    r"^\s*(?:which|what)\s+(?:is\s+the\s+)?(.+?)\s+\w+\s+the\s+most\b"
);
lazy_regex!(
    aggregate_regex,
    r"\b(average|mean|median|total|sum|maximum|minimum)\b\s+(?:of\s+)?(?:the\s+)?(.+?)(?:\s+(?:of|for|in|where|among|across|from|before|after|since|over|under|per)\b.*)?\s*\??$"
);

/// Questions embedded as the keys of a JSON object; string values become hints.
///
/// Every balanced object in the text is parsed. The last one whose values are
/// all strings holds the questions; sample rows before it are skipped.
pub fn questions_from_json(text: &str) -> Option<Vec<RawQuestion>> {
    let mut objects: Vec<Map<String, Value>> = Vec::new();
    let mut offset = 0;

    while let Some(found) = text[offset..].find('{') {
        let start = offset + found;
        let mut stream = Deserializer::from_str(&text[start..]).into_iter::<Map<String, Value>>();
        match stream.next() {
            Some(Ok(object)) => {
                offset = start + stream.byte_offset().max(1);
                objects.push(object);
            }
            _ => offset = start + 1,
        }
    }

    let chosen = match objects
        .iter()
        .rposition(|object| !object.is_empty() && object.values().all(Value::is_string))
    {
        Some(index) => objects.swap_remove(index),
        None => objects.pop()?,
    };

    let questions: Vec<RawQuestion> = chosen
        .into_iter()
        .filter(|(key, _)| !key.trim().is_empty())
        .map(|(key, value)| RawQuestion {
            text: key,
            hint: value.as_str().map(str::to_string),
        })
        .collect();

    (!questions.is_empty()).then_some(questions)
}

/// Numbered questions (`1.` or `1)`); indented lines continue the previous question.
///
/// Numbered lines form runs broken by unnumbered text. The run right after an
/// "answer the following" cue is the question list; without a cue, the last run.
pub fn questions_from_list(text: &str) -> Option<Vec<RawQuestion>> {
    let mut runs: Vec<Vec<RawQuestion>> = Vec::new();
    let mut cued_run: Option<usize> = None;
    let mut cue_pending = false;
    let mut in_run = false;
    let mut continuing = false;

    for line in text.lines() {
        if let Some(body) = numbered_regex().captures(line).and_then(|caps| caps.get(2)) {
            if !in_run {
                if cue_pending {
                    cued_run = Some(runs.len());
                    cue_pending = false;
                }
                runs.push(Vec::new());
            }
            if let Some(run) = runs.last_mut() {
                run.push(RawQuestion {
                    text: body.as_str().trim().to_string(),
                    hint: None,
                });
            }
            in_run = true;
            continuing = true;
            continue;
        }

        if line.trim().is_empty() {
            continuing = false;
            continue;
        }

        let indented = line.starts_with(' ') || line.starts_with('\t');
        match runs.last_mut().and_then(|run| run.last_mut()) {
            Some(last) if continuing && indented => {
                last.text.push(' ');
                last.text.push_str(line.trim());
            }
            _ => {
                in_run = false;
                continuing = false;
                if question_cue_regex().is_match(&line.to_lowercase()) {
                    cue_pending = true;
                }
            }
        }
    }

    let index = cued_run.unwrap_or_else(|| runs.len().saturating_sub(1));
    let questions = runs.into_iter().nth(index)?;
    (!questions.is_empty()).then_some(questions)
}

pub fn extract_questions(text: &str) -> Option<(Vec<RawQuestion>, QuestionLayout)> {
    questions_from_json(text)
        .map(|q| (q, QuestionLayout::JsonObject))
        .or_else(|| questions_from_list(text).map(|q| (q, QuestionLayout::NumberedList)))
}

/// Classify one question. `previous` is the kind of the question before it,
/// used by charts that refer back to "the above question".
pub fn classify(question: &RawQuestion, previous: Option<&QuestionKind>) -> Result<QuestionKind> {
    let text = question.text.to_lowercase();
    let text = text.trim();

    if chart_regex().is_match(text) {
        return classify_chart(text, question.hint.as_deref(), previous);
    }

    if let Some(caps) = correlation_regex().captures(text) {
        return Ok(QuestionKind::Correlation {
            x: parse_measure(&caps[1]),
            y: parse_measure(&caps[2]),
            filters: parse_filters(text),
        });
    }

    if let Some(caps) = regression_regex().captures(text) {
        return Ok(QuestionKind::RegressionSlope {
            x: parse_measure(&caps[2]),
            y: parse_measure(&caps[1]),
            filters: parse_filters(text),
        });
    }

    if count_regex().is_match(text) {
        return Ok(QuestionKind::Count {
            filters: parse_filters(text),
        });
    }

    if let Some(caps) = extreme_time_regex().captures(text) {
        let direction = match &caps[1] {
            "earliest" | "first" | "oldest" => Direction::Ascending,
            _ => Direction::Descending,
        };
        return Ok(QuestionKind::Extreme {
            order_by: ColumnRef::role(ColumnRole::Year),
            direction,
            select: ColumnRef::named_or(&caps[2], ColumnRole::Label),
            filters: parse_filters(text),
        });
    }

    if let Some(caps) = extreme_value_regex().captures(text) {
        let direction = match &caps[2] {
            "lowest" | "smallest" | "least" | "fewest" => Direction::Ascending,
            _ => Direction::Descending,
        };
        return Ok(QuestionKind::Extreme {
            order_by: column_for(&caps[3]),
            direction,
            select: ColumnRef::named_or(caps[1].trim(), ColumnRole::Label),
            filters: parse_filters(text),
        });
    }

    if let Some(caps) = most_frequent_regex().captures(text) {
        return Ok(QuestionKind::MostFrequent {
            group: ColumnRef::named(caps[1].trim()),
            filters: parse_filters(text),
        });
    }

    if let Some(caps) = aggregate_regex().captures(text) {
        let function = match &caps[1] {
            "average" | "mean" => Aggregation::Mean,
            "median" => Aggregation::Median,
            "total" | "sum" => Aggregation::Sum,
            "maximum" => Aggregation::Max,
            _ => Aggregation::Min,
        };
        return Ok(QuestionKind::Aggregate {
            function,
            measure: parse_measure(&caps[2]),
            filters: parse_filters(text),
        });
    }

    Err(AnalystError::parse(format!(
        "unrecognized question: {}",
        question.text
    )))
}

fn classify_chart(
    text: &str,
    hint: Option<&str>,
    previous: Option<&QuestionKind>,
) -> Result<QuestionKind> {
    let (x, y, filters) = if inherit_regex().is_match(text) {
        let (x, y, filters) = previous.and_then(QuestionKind::axes).ok_or_else(|| {
            AnalystError::parse("chart refers to a previous question without axes")
        })?;
        (x.clone(), y.clone(), filters.to_vec())
    } else {
        let caps = axes_of_regex()
            .captures(text)
            .or_else(|| axes_verb_regex().captures(text))
            .ok_or_else(|| AnalystError::parse(format!("chart axes not found in: {}", text)))?;
        (
            parse_measure(&caps[1]),
            parse_measure(&caps[2]),
            parse_filters(text),
        )
    };

    let regression = wants_regression(text).then(|| LineStyle {
        color: color_regex()
            .captures(text)
            .and_then(|caps| Rgb::from_name(&caps[1]))
            .unwrap_or(Rgb::RED),
        dash: if text.contains("dotted") {
            DashPattern::Dotted
        } else if text.contains("dashed") {
            DashPattern::Dashed
        } else {
            DashPattern::Solid
        },
    });

    let hint = hint.map(str::to_lowercase).unwrap_or_default();
    let format = if text.contains("webp") || hint.contains("image/webp") {
        ImageFormat::Webp
    } else {
        ImageFormat::Png
    };

    let max_chars = ceiling_regex()
        .captures(text)
        .and_then(|caps| caps[1].replace(',', "").parse::<usize>().ok());

    Ok(QuestionKind::Chart(ChartSpec {
        x,
        y,
        filters,
        regression,
        format,
        max_chars,
    }))
}

fn wants_regression(text: &str) -> bool {
    text.contains("regression")
        || text.contains("trend line")
        || text.contains("trendline")
        || text.contains("line of best fit")
        || text.contains("best-fit line")
}

/// A column, or `a - b` for the span between two columns.
pub fn parse_measure(phrase: &str) -> Measure {
    let phrase = phrase.trim().trim_end_matches('?').trim();
    match phrase.split_once(" - ") {
        Some((from, to)) => Measure::span(column_for(from), column_for(to)),
        None => Measure::column(column_for(phrase)),
    }
}

fn column_for(phrase: &str) -> ColumnRef {
    let phrase = phrase.trim();
    let phrase = phrase.strip_prefix("the ").unwrap_or(phrase).trim();
    let has_token = |words: &[&str]| {
        phrase
            .split(|c: char| !c.is_alphanumeric())
            .any(|token| words.contains(&token))
    };
    if has_token(&["year", "years"]) {
        ColumnRef::named_or(phrase, ColumnRole::Year)
    } else if has_token(&["date", "dates", "when"]) {
        ColumnRef::named_or(phrase, ColumnRole::Date)
    } else {
        ColumnRef::named(phrase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw(text: &str) -> RawQuestion {
        RawQuestion {
            text: text.to_string(),
            hint: None,
        }
    }

    #[test]
    fn test_numbered_list_with_continuation() {
        let text = "Answer these:\n\n1. How many films?\n2. Draw a plot of rank and peak\n   under 100,000 bytes.\n\nThanks";
        let questions = questions_from_list(text).unwrap();

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].text, "How many films?");
        assert_eq!(questions[1].text, "Draw a plot of rank and peak under 100,000 bytes.");
    }

    #[test]
    fn test_json_object_questions_keep_order() {
        let text = r#"Answer in JSON: {"b question": "...", "a question": "data:image/webp:base64,..."}"#;
        let questions = questions_from_json(text).unwrap();

        assert_eq!(questions[0].text, "b question");
        assert_eq!(questions[1].text, "a question");
        assert_eq!(questions[1].hint.as_deref(), Some("data:image/webp:base64,..."));
    }

    #[test]
    fn test_measure_span() {
        assert_eq!(
            parse_measure("date_of_registration - decision_date"),
            Measure::span(
                ColumnRef::named_or("date_of_registration", ColumnRole::Date),
                ColumnRef::named_or("decision_date", ColumnRole::Date)
            )
        );
        assert_eq!(
            parse_measure("year"),
            Measure::column(ColumnRef::named_or("year", ColumnRole::Year))
        );
    }

    #[test]
    fn test_date_phrases_carry_date_role() {
        assert_eq!(
            parse_measure("when the case was filed"),
            Measure::column(ColumnRef::named_or("when the case was filed", ColumnRole::Date))
        );
        assert_eq!(
            parse_measure("the filing date"),
            Measure::column(ColumnRef::named_or("filing date", ColumnRole::Date))
        );
        assert_eq!(parse_measure("peak"), Measure::column(ColumnRef::named("peak")));
    }

    #[test]
    fn test_sample_row_before_question_object() {
        let text = "Sample row:\n```json\n{\"court_code\": \"33~10\", \"year\": 2019}\n```\n\n\
                    Answer as JSON:\n```json\n{\"Which court?\": \"...\", \"How many cases?\": \"...\"}\n```";
        let (questions, layout) = extract_questions(text).unwrap();

        assert_eq!(layout, QuestionLayout::JsonObject);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].text, "Which court?");
        assert_eq!(questions[1].text, "How many cases?");
    }

    #[test]
    fn test_numbered_steps_before_cued_questions() {
        let text = "Follow these steps:\n1. Download the data\n2. Clean it\n\n\
                    Answer the following questions:\n1. How many films?\n2. What is the median peak?\n\n\
                    Notes:\n1. Be concise";
        let questions = questions_from_list(text).unwrap();

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].text, "How many films?");
        assert_eq!(questions[1].text, "What is the median peak?");
    }

    #[test]
    fn test_last_run_without_cue() {
        let text = "Steps:\n1. Scrape the table\n2. Tidy columns\nThen:\n1. How many films?";
        let questions = questions_from_list(text).unwrap();

        assert_eq!(questions, vec![raw("How many films?")]);
    }

    #[test]
    fn test_unknown_question_is_parse_error() {
        let err = classify(&raw("Tell me a joke"), None).unwrap_err();
        assert!(err.is_recoverable());
    }
}
