use serde::{Deserialize, Serialize};
use std::fmt;

use super::answer::ImageFormat;

/// One natural-language question and its classified intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub index: usize,
    /// Verbatim text; used as the response key for object-shaped tasks.
    pub text: String,
    /// Placeholder value given next to the question in object-shaped tasks.
    pub hint: Option<String>,
    pub kind: QuestionKind,
}

impl Question {
    pub fn new(index: usize, text: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            index,
            text: text.into(),
            hint: None,
            kind,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Semantic role used to locate a column when the question does not name it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Monetary amount (gross, revenue, sales).
    Amount,
    /// Calendar year, or the year of a date column.
    Year,
    /// Human-readable row label (title, name).
    Label,
    /// Any date column.
    Date,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnRole::Amount => "amount",
            ColumnRole::Year => "year",
            ColumnRole::Label => "label",
            ColumnRole::Date => "date",
        };
        f.write_str(name)
    }
}

/// Reference to a dataset column: a name taken from the question, a role, or both.
///
/// Resolution tries the name first and falls back to the role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub name: Option<String>,
    pub role: Option<ColumnRole>,
}

impl ColumnRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            role: None,
        }
    }

    pub fn role(role: ColumnRole) -> Self {
        Self {
            name: None,
            role: Some(role),
        }
    }

    pub fn named_or(name: impl Into<String>, role: ColumnRole) -> Self {
        Self {
            name: Some(name.into()),
            role: Some(role),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, &self.role) {
            (Some(name), Some(role)) => write!(f, "'{}' (or {} column)", name, role),
            (Some(name), None) => write!(f, "'{}'", name),
            (None, Some(role)) => write!(f, "{} column", role),
            (None, None) => f.write_str("<unspecified column>"),
        }
    }
}

/// Per-row numeric quantity fed to statistics and charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Measure {
    Column { column: ColumnRef },
    /// `to - from`; measured in days when both columns hold dates.
    Span { from: ColumnRef, to: ColumnRef },
}

impl Measure {
    pub fn column(column: ColumnRef) -> Self {
        Measure::Column { column }
    }

    pub fn span(from: ColumnRef, to: ColumnRef) -> Self {
        Measure::Span { from, to }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measure::Column { column } => write!(f, "{}", column),
            Measure::Span { from, to } => write!(f, "{} - {}", from, to),
        }
    }
}

/// Row predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum Predicate {
    Less(f64),
    AtMost(f64),
    Greater(f64),
    AtLeast(f64),
    /// Inclusive on both ends.
    Between(f64, f64),
    Equals(String),
}

impl Predicate {
    pub fn matches_number(&self, value: f64) -> bool {
        match self {
            Predicate::Less(bound) => value < *bound,
            Predicate::AtMost(bound) => value <= *bound,
            Predicate::Greater(bound) => value > *bound,
            Predicate::AtLeast(bound) => value >= *bound,
            Predicate::Between(low, high) => value >= *low && value <= *high,
            Predicate::Equals(expected) => expected
                .trim()
                .parse::<f64>()
                .map(|e| (e - value).abs() < f64::EPSILON * value.abs().max(1.0))
                .unwrap_or(false),
        }
    }

    pub fn matches_text(&self, value: &str) -> bool {
        match self {
            Predicate::Equals(expected) => expected.trim().eq_ignore_ascii_case(value.trim()),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: ColumnRef,
    pub predicate: Predicate,
}

impl Filter {
    pub fn new(column: ColumnRef, predicate: Predicate) -> Self {
        Self { column, predicate }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Mean,
    Median,
    Sum,
    Min,
    Max,
}

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const RED: Rgb = Rgb(220, 30, 30);
    pub const STEEL_BLUE: Rgb = Rgb(70, 130, 180);

    pub fn from_name(name: &str) -> Option<Rgb> {
        let rgb = match name.to_ascii_lowercase().as_str() {
            "red" => Rgb::RED,
            "blue" => Rgb(30, 80, 220),
            "green" => Rgb(30, 150, 60),
            "black" => Rgb::BLACK,
            "orange" => Rgb(240, 140, 20),
            "purple" => Rgb(130, 50, 170),
            "gray" | "grey" => Rgb(120, 120, 120),
            _ => return None,
        };
        Some(rgb)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DashPattern {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: Rgb,
    pub dash: DashPattern,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: Rgb::RED,
            dash: DashPattern::Solid,
        }
    }
}

/// Scatter plot request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub x: Measure,
    pub y: Measure,
    pub filters: Vec<Filter>,
    /// Overlay a least-squares line in this style.
    pub regression: Option<LineStyle>,
    pub format: ImageFormat,
    /// Ceiling on the data URI length; the configured default applies when unset.
    pub max_chars: Option<usize>,
}

/// Catalog of question types the engine can answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionKind {
    /// Number of rows matching every filter.
    Count { filters: Vec<Filter> },
    /// `select` of the first row after ordering matching rows by `order_by`.
    Extreme {
        order_by: ColumnRef,
        direction: Direction,
        select: ColumnRef,
        filters: Vec<Filter>,
    },
    /// Most common value of `group` among matching rows.
    MostFrequent { group: ColumnRef, filters: Vec<Filter> },
    Aggregate {
        function: Aggregation,
        measure: Measure,
        filters: Vec<Filter>,
    },
    /// Pearson correlation coefficient.
    Correlation {
        x: Measure,
        y: Measure,
        filters: Vec<Filter>,
    },
    /// Least-squares slope of `y` on `x`.
    RegressionSlope {
        x: Measure,
        y: Measure,
        filters: Vec<Filter>,
    },
    Chart(ChartSpec),
}

impl QuestionKind {
    pub fn is_chart(&self) -> bool {
        matches!(self, QuestionKind::Chart(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            QuestionKind::Count { .. } => "count",
            QuestionKind::Extreme { .. } => "extreme",
            QuestionKind::MostFrequent { .. } => "most_frequent",
            QuestionKind::Aggregate { .. } => "aggregate",
            QuestionKind::Correlation { .. } => "correlation",
            QuestionKind::RegressionSlope { .. } => "regression_slope",
            QuestionKind::Chart(_) => "chart",
        }
    }

    /// Axes and filters a follow-up chart can reuse ("from the above question").
    pub fn axes(&self) -> Option<(&Measure, &Measure, &[Filter])> {
        match self {
            QuestionKind::Correlation { x, y, filters }
            | QuestionKind::RegressionSlope { x, y, filters } => Some((x, y, filters)),
            QuestionKind::Chart(spec) => Some((&spec.x, &spec.y, &spec.filters)),
            _ => None,
        }
    }
}
