//! Turning fetched documents into header + row tables.

use analyst_core::{AnalystError, Dataset, Result};
use regex::Regex;
use serde_json::Value as JsonValue;
use std::sync::OnceLock;

/// Raw table: header cells and string rows.
pub type RawTable = (Vec<String>, Vec<Vec<String>>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Csv,
    Json,
}

impl ContentKind {
    /// Decide from the `Content-Type` header, then the path extension, then the body.
    pub fn detect(content_type: Option<&str>, location: &str, body: &str) -> Self {
        if let Some(content_type) = content_type.map(str::to_lowercase) {
            if content_type.contains("json") {
                return ContentKind::Json;
            }
            if content_type.contains("csv") {
                return ContentKind::Csv;
            }
            if content_type.contains("html") {
                return ContentKind::Html;
            }
        }

        let path = location
            .split(['?', '#'])
            .next()
            .unwrap_or(location)
            .to_lowercase();
        if path.ends_with(".json") {
            return ContentKind::Json;
        }
        if path.ends_with(".csv") {
            return ContentKind::Csv;
        }
        if path.ends_with(".html") || path.ends_with(".htm") {
            return ContentKind::Html;
        }

        match body.trim_start().chars().next() {
            Some('[') | Some('{') => ContentKind::Json,
            Some('<') => ContentKind::Html,
            _ => ContentKind::Csv,
        }
    }
}

pub fn parse_dataset(name: &str, kind: ContentKind, body: &str) -> Result<Dataset> {
    let (headers, rows) = match kind {
        ContentKind::Html => parse_html_table(body)
            .ok_or_else(|| AnalystError::Serialization("no data table found in HTML document".to_string()))?,
        ContentKind::Csv => parse_csv(body)?,
        ContentKind::Json => parse_json(body)?,
    };
    Dataset::from_raw(name, headers, rows)
}

// ===== HTML =====

macro_rules! html_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect(concat!("valid ", stringify!($name))))
        }
    };
}

html_regex!(table_regex, r"(?is)<table\b([^>]*)>(.*?)</table>");
html_regex!(row_regex, r"(?is)<tr\b[^>]*>(.*?)</tr>");
html_regex!(cell_regex, r"(?is)<(th|td)\b([^>]*)>(.*?)</t[hd]>");
html_regex!(span_attr_regex, r#"(?i)\b(colspan|rowspan)\s*=\s*["']?(\d+)"#);
html_regex!(
    noise_regex,
    r#"(?is)<sup\b.*?</sup>|<style\b.*?</style>|<script\b.*?</script>|<span[^>]*display:\s*none[^>]*>.*?</span>"#
);
html_regex!(break_regex, r"(?i)<br\s*/?>");
html_regex!(tag_regex, r"(?s)<[^>]+>");
html_regex!(entity_regex, r"&(#x[0-9a-fA-F]+|#\d+|[a-zA-Z]+);");
html_regex!(whitespace_regex, r"\s+");

struct HtmlCell {
    header: bool,
    text: String,
    colspan: usize,
    rowspan: usize,
}

/// First table with a header row (all `th`) followed by at least one data row.
/// Tables classed `wikitable` are tried before the rest.
pub fn parse_html_table(html: &str) -> Option<RawTable> {
    let tables: Vec<(bool, &str)> = table_regex()
        .captures_iter(html)
        .filter_map(|caps| {
            let attrs = caps.get(1)?.as_str();
            let body = caps.get(2)?.as_str();
            Some((attrs.contains("wikitable"), body))
        })
        .collect();

    tables
        .iter()
        .filter(|(wiki, _)| *wiki)
        .chain(tables.iter().filter(|(wiki, _)| !*wiki))
        .find_map(|(_, body)| table_from_rows(body))
}

fn table_from_rows(table: &str) -> Option<RawTable> {
    let rows: Vec<Vec<HtmlCell>> = row_regex()
        .captures_iter(table)
        .filter_map(|caps| caps.get(1).map(|m| parse_cells(m.as_str())))
        .filter(|cells| !cells.is_empty())
        .collect();

    let header_at = rows.iter().position(|cells| cells.iter().all(|c| c.header))?;
    let headers = expand_row(&rows[header_at], &mut Vec::new());

    let mut pending: Vec<Option<(usize, String)>> = Vec::new();
    let data: Vec<Vec<String>> = rows[header_at + 1..]
        .iter()
        .filter(|cells| cells.iter().any(|c| !c.header) || cells.len() > 1)
        .map(|cells| expand_row(cells, &mut pending))
        .filter(|row| row.len() > 1)
        .collect();

    (!data.is_empty() && headers.len() > 1).then_some((headers, data))
}

/// Lay out a row honoring colspan and rowspan carried from earlier rows.
fn expand_row(cells: &[HtmlCell], pending: &mut Vec<Option<(usize, String)>>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut cells = cells.iter();

    loop {
        let col = out.len();
        if let Some(Some((remaining, text))) = pending.get_mut(col) {
            out.push(text.clone());
            *remaining -= 1;
            if *remaining == 0 {
                pending[col] = None;
            }
            continue;
        }

        let Some(cell) = cells.next() else { break };
        for _ in 0..cell.colspan {
            let col = out.len();
            if cell.rowspan > 1 {
                if pending.len() <= col {
                    pending.resize(col + 1, None);
                }
                pending[col] = Some((cell.rowspan - 1, cell.text.clone()));
            }
            out.push(cell.text.clone());
        }
    }

    out
}

fn parse_cells(row: &str) -> Vec<HtmlCell> {
    cell_regex()
        .captures_iter(row)
        .map(|caps| {
            let attrs = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            let mut colspan = 1;
            let mut rowspan = 1;
            for span in span_attr_regex().captures_iter(attrs) {
                let n = span[2].parse::<usize>().unwrap_or(1).clamp(1, 64);
                if span[1].eq_ignore_ascii_case("colspan") {
                    colspan = n;
                } else {
                    rowspan = n;
                }
            }
            HtmlCell {
                header: caps[1].eq_ignore_ascii_case("th"),
                text: clean_cell(caps.get(3).map(|m| m.as_str()).unwrap_or_default()),
                colspan,
                rowspan,
            }
        })
        .collect()
}

/// Strip footnotes, hidden sort keys and markup, then decode entities.
pub fn clean_cell(raw: &str) -> String {
    let text = noise_regex().replace_all(raw, "");
    let text = break_regex().replace_all(&text, " ");
    let text = tag_regex().replace_all(&text, "");
    let text = decode_entities(&text);
    whitespace_regex().replace_all(&text, " ").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    entity_regex()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    "ndash" => Some('–'),
                    "mdash" => Some('—'),
                    "minus" => Some('\u{2212}'),
                    _ => None,
                }
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

// ===== CSV =====

/// Header row plus records; ragged rows are kept and blank rows dropped.
pub fn parse_csv(text: &str) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.trim_start_matches('\u{feff}').as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AnalystError::Serialization(format!("malformed CSV: {}", e)))?;
        if record.iter().any(|cell| !cell.trim().is_empty()) {
            records.push(record.iter().map(str::to_string).collect::<Vec<String>>());
        }
    }

    let mut records = records.into_iter();
    let headers = records
        .next()
        .ok_or_else(|| AnalystError::Serialization("CSV document has no header row".to_string()))?;
    Ok((headers, records.collect()))
}

// ===== JSON =====

/// An array of records, `{"columns": [...], "rows"|"data": [[...]]}`, or
/// an object wrapping a record array under `data`/`rows`/`records`.
pub fn parse_json(text: &str) -> Result<RawTable> {
    let value: JsonValue = serde_json::from_str(text)?;
    table_from_json(&value)
        .ok_or_else(|| AnalystError::Serialization("JSON document is not a table of records".to_string()))
}

fn table_from_json(value: &JsonValue) -> Option<RawTable> {
    match value {
        JsonValue::Array(records) => records_table(records),
        JsonValue::Object(map) => {
            if let Some(JsonValue::Array(columns)) = map.get("columns") {
                let headers: Vec<String> = columns.iter().map(json_cell).collect();
                let rows = ["rows", "data"]
                    .iter()
                    .find_map(|key| map.get(*key).and_then(JsonValue::as_array))?;
                let rows = rows
                    .iter()
                    .filter_map(JsonValue::as_array)
                    .map(|row| row.iter().map(json_cell).collect())
                    .collect();
                return Some((headers, rows));
            }
            ["data", "rows", "records", "results"]
                .iter()
                .find_map(|key| map.get(*key))
                .and_then(table_from_json)
        }
        _ => None,
    }
}

fn records_table(records: &[JsonValue]) -> Option<RawTable> {
    let mut headers: Vec<String> = Vec::new();
    for record in records {
        for key in record.as_object()?.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }
    if headers.is_empty() {
        return None;
    }

    let rows = records
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|record| {
            headers
                .iter()
                .map(|h| record.get(h).map(json_cell).unwrap_or_default())
                .collect()
        })
        .collect();
    Some((headers, rows))
}

fn json_cell(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
