use chrono::{Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use super::question::{ColumnRef, ColumnRole};
use crate::error::{AnalystError, Result};

/// Share of non-empty cells that must parse for a column to get a typed kind.
const TYPE_INFERENCE_THRESHOLD: f64 = 0.9;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d-%m-%Y",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%b %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

const AMOUNT_KEYWORDS: &[&str] = &[
    "gross", "revenue", "amount", "sales", "box", "earnings", "income", "price", "cost",
];

const LABEL_KEYWORDS: &[&str] = &["title", "name", "film", "movie", "label"];

/// Tokens ignored when matching question phrases against headers.
const STOP_WORDS: &[&str] = &["the", "of", "a", "an", "in", "by", "and"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Number,
    Date,
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Calendar year of a date, or the integral part of a number.
    pub fn year(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.trunc()),
            Value::Date(d) => Some(d.year() as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Number(n) => write!(f, "{}", n),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// In-memory table produced by data acquisition. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub name: String,
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Build a dataset from string cells, inferring a type for every column.
    ///
    /// Rows shorter than the header are padded with nulls; longer rows are truncated.
    pub fn from_raw(
        name: impl Into<String>,
        headers: Vec<String>,
        raw_rows: Vec<Vec<String>>,
    ) -> Result<Self> {
        if headers.is_empty() {
            return Err(AnalystError::Serialization(
                "table has no header row".to_string(),
            ));
        }

        let width = headers.len();
        let headers: Vec<String> = headers
            .into_iter()
            .enumerate()
            .map(|(i, h)| {
                let h = h.trim().to_string();
                if h.is_empty() {
                    format!("column_{}", i + 1)
                } else {
                    h
                }
            })
            .collect();

        let raw_rows: Vec<Vec<String>> = raw_rows
            .into_iter()
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();

        let kinds: Vec<ColumnType> = (0..width)
            .map(|col| infer_column_type(raw_rows.iter().map(|row| row[col].as_str())))
            .collect();

        let rows = raw_rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&kinds)
                    .map(|(cell, kind)| parse_cell(cell, *kind))
                    .collect()
            })
            .collect();

        let columns = headers
            .into_iter()
            .zip(kinds)
            .map(|(name, kind)| Column { name, kind })
            .collect();

        Ok(Self {
            name: name.into(),
            columns,
            rows,
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn value(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Locate a column: by name first, then by role.
    pub fn resolve(&self, column: &ColumnRef) -> Option<usize> {
        column
            .name
            .as_deref()
            .and_then(|name| self.find_by_name(name))
            .or_else(|| column.role.and_then(|role| self.find_by_role(role)))
    }

    /// Case- and punctuation-insensitive lookup of a header mentioned in free text.
    pub fn find_by_name(&self, phrase: &str) -> Option<usize> {
        let wanted = normalize(phrase);
        if wanted.is_empty() {
            return None;
        }

        let headers: Vec<String> = self.columns.iter().map(|c| normalize(&c.name)).collect();
        if let Some(idx) = headers.iter().position(|h| *h == wanted) {
            return Some(idx);
        }

        let phrase_tokens = tokens(&wanted);

        // Header fully mentioned by the phrase ("high court" -> "court"); prefer the most specific.
        let contained = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| {
                let header_tokens = tokens(h);
                !header_tokens.is_empty() && header_tokens.iter().all(|t| phrase_tokens.contains(t))
            })
            .max_by_key(|(idx, h)| (tokens(h).len(), std::cmp::Reverse(*idx)))
            .map(|(idx, _)| idx);
        if contained.is_some() {
            return contained;
        }

        // Phrase is an abbreviation of a longer header ("peak" -> "peak_position").
        headers
            .iter()
            .enumerate()
            .filter(|(_, h)| {
                let header_tokens = tokens(h);
                !phrase_tokens.is_empty() && phrase_tokens.iter().all(|t| header_tokens.contains(t))
            })
            .min_by_key(|(idx, h)| (tokens(h).len(), *idx))
            .map(|(idx, _)| idx)
    }

    pub fn find_by_role(&self, role: ColumnRole) -> Option<usize> {
        let typed = |kind: ColumnType| {
            self.columns
                .iter()
                .enumerate()
                .filter(move |(_, c)| c.kind == kind)
        };

        match role {
            ColumnRole::Amount => typed(ColumnType::Number)
                .find(|(_, c)| {
                    let name = normalize(&c.name);
                    AMOUNT_KEYWORDS.iter().any(|k| name.contains(k))
                })
                .map(|(i, _)| i),
            ColumnRole::Year => typed(ColumnType::Number)
                .find(|(_, c)| tokens(&normalize(&c.name)).iter().any(|t| t == "year"))
                .or_else(|| typed(ColumnType::Date).next())
                .map(|(i, _)| i),
            ColumnRole::Date => typed(ColumnType::Date).next().map(|(i, _)| i),
            ColumnRole::Label => typed(ColumnType::Text)
                .find(|(_, c)| {
                    let header_tokens = tokens(&normalize(&c.name));
                    LABEL_KEYWORDS.iter().any(|k| header_tokens.iter().any(|t| t == k))
                })
                .or_else(|| typed(ColumnType::Text).next())
                .map(|(i, _)| i),
        }
    }
}

/// Lowercase, collapse punctuation and whitespace to single underscores.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_sep = false;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

fn tokens(normalized: &str) -> Vec<String> {
    normalized
        .split('_')
        .filter(|t| !t.is_empty() && !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

fn footnote_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[[^\]]*\]").expect("valid footnote regex"))
}

fn number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([^\d+\-.]{0,3}?)\s*([+-]?(?:\d[\d,]*(?:\.\d+)?|\.\d+))\s*([A-Za-z%]{0,3})$")
            .expect("valid number regex")
    })
}

/// Parse a loosely formatted number such as `$2,923,706,026`, `24RK` or `12.5%`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = footnote_regex().replace_all(raw, "");
    let cleaned = cleaned.trim().replace('\u{2212}', "-");
    if cleaned.is_empty() {
        return None;
    }
    let caps = number_regex().captures(&cleaned)?;
    let digits = caps.get(2)?.as_str().replace(',', "");
    digits.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = footnote_regex().replace_all(raw, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(cleaned, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(cleaned, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn infer_column_type<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut total = 0usize;
    let mut dates = 0usize;
    let mut numbers = 0usize;

    for cell in cells.filter(|c| !c.trim().is_empty()) {
        total += 1;
        if parse_date(cell).is_some() {
            dates += 1;
        } else if parse_number(cell).is_some() {
            numbers += 1;
        }
    }

    if total == 0 {
        return ColumnType::Text;
    }

    let share = |n: usize| n as f64 / total as f64;
    if share(dates) >= TYPE_INFERENCE_THRESHOLD {
        ColumnType::Date
    } else if share(numbers) >= TYPE_INFERENCE_THRESHOLD {
        ColumnType::Number
    } else {
        ColumnType::Text
    }
}

fn parse_cell(raw: &str, kind: ColumnType) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    match kind {
        ColumnType::Number => parse_number(trimmed).map(Value::Number).unwrap_or(Value::Null),
        ColumnType::Date => parse_date(trimmed).map(Value::Date).unwrap_or(Value::Null),
        ColumnType::Text => Value::Text(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("$2,923,706,026", Some(2_923_706_026.0) ; "currency with separators")]
    #[test_case("T$2,257,844,554", Some(2_257_844_554.0) ; "footnote marker prefix")]
    #[test_case("24RK", Some(24.0) ; "alphabetic suffix")]
    #[test_case("1[a]", Some(1.0) ; "bracketed footnote")]
    #[test_case("\u{2212}3.5", Some(-3.5) ; "unicode minus")]
    #[test_case("33_10", None ; "court code")]
    #[test_case("Avatar", None ; "plain text")]
    #[test_case("", None ; "empty")]
    fn test_parse_number(raw: &str, expected: Option<f64>) {
        assert_eq!(parse_number(raw), expected);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2019, 3, 14).unwrap();
        assert_eq!(parse_date("2019-03-14"), Some(expected));
        assert_eq!(parse_date("14-03-2019"), Some(expected));
        assert_eq!(parse_date("14/03/2019"), Some(expected));
        assert_eq!(parse_date("2019-03-14T10:30:00"), Some(expected));
        assert_eq!(parse_date("2019"), None);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Worldwide gross"), "worldwide_gross");
        assert_eq!(normalize("  # of days -- delay "), "of_days_delay");
        assert_eq!(normalize("date_of_registration"), "date_of_registration");
    }
}
