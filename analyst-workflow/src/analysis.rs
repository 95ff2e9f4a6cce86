//! Analysis engine: answers classified questions against a dataset.

use analyst_core::{
    AnalystError, Answer, ChartData, ChartSpec, ColumnRef, ColumnRole, ColumnType, Computed,
    Dataset, Direction, Filter, Measure, Question, QuestionKind, Result, Value,
};
use analyst_metrics::{round_answer, MetricAggregator, StatisticalAnalyzer};
use chrono::Datelike;
use tracing::debug;

/// How to read one numeric quantity from a row.
#[derive(Debug, Clone, Copy)]
enum Accessor {
    Number(usize),
    /// Year of a date column.
    Year(usize),
    /// Days since the common era, for plotting raw dates.
    Ordinal(usize),
    /// `to - from` in days.
    DaysBetween { from: usize, to: usize },
    /// `to - from` for numeric columns.
    Difference { from: usize, to: usize },
}

impl Accessor {
    fn read(&self, dataset: &Dataset, row: usize) -> Option<f64> {
        let cell = |col: usize| dataset.value(row, col);
        match *self {
            Accessor::Number(col) => cell(col)?.as_number(),
            Accessor::Year(col) => cell(col)?.year(),
            Accessor::Ordinal(col) => cell(col)?.as_date().map(|d| d.num_days_from_ce() as f64),
            Accessor::DaysBetween { from, to } => {
                let from = cell(from)?.as_date()?;
                let to = cell(to)?.as_date()?;
                Some((to - from).num_days() as f64)
            }
            Accessor::Difference { from, to } => Some(cell(to)?.as_number()? - cell(from)?.as_number()?),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisEngine;

impl AnalysisEngine {
    pub fn new() -> Self {
        Self
    }

    /// Answer one question. Chart questions yield data for the renderer.
    pub fn compute(&self, dataset: &Dataset, question: &Question) -> Result<Computed> {
        debug!(index = question.index, kind = question.kind.name(), "Computing answer");

        let ready = |answer: Answer| -> Result<Computed> { Ok(Computed::Ready { answer }) };

        match &question.kind {
            QuestionKind::Count { filters } => {
                let rows = matching_rows(dataset, filters)?;
                ready(Answer::Number(rows.len() as f64))
            }
            QuestionKind::Extreme {
                order_by,
                direction,
                select,
                filters,
            } => ready(extreme(dataset, order_by, *direction, select, filters)?),
            QuestionKind::MostFrequent { group, filters } => {
                ready(most_frequent(dataset, group, filters)?)
            }
            QuestionKind::Aggregate {
                function,
                measure,
                filters,
            } => {
                let rows = matching_rows(dataset, filters)?;
                let accessor = accessor(dataset, measure)?;
                let values: Vec<f64> = rows
                    .iter()
                    .filter_map(|&row| accessor.read(dataset, row))
                    .collect();
                let value = MetricAggregator::aggregate(*function, &values).ok_or_else(|| {
                    AnalystError::computation(format!("no values of {} to aggregate", measure))
                })?;
                ready(Answer::Number(round_answer(value)))
            }
            QuestionKind::Correlation { x, y, filters } => {
                let (xs, ys) = paired(dataset, x, y, filters)?;
                let r = StatisticalAnalyzer::pearson_correlation(&xs, &ys).ok_or_else(|| {
                    AnalystError::computation(format!(
                        "correlation between {} and {} is undefined for {} rows",
                        x,
                        y,
                        xs.len()
                    ))
                })?;
                ready(Answer::Number(round_answer(r)))
            }
            QuestionKind::RegressionSlope { x, y, filters } => {
                let (xs, ys) = paired(dataset, x, y, filters)?;
                let fit = StatisticalAnalyzer::linear_regression(&xs, &ys).ok_or_else(|| {
                    AnalystError::computation(format!(
                        "regression of {} on {} is undefined for {} rows",
                        y,
                        x,
                        xs.len()
                    ))
                })?;
                ready(Answer::Number(round_answer(fit.slope)))
            }
            QuestionKind::Chart(spec) => Ok(Computed::Chart {
                data: chart_data(dataset, spec)?,
            }),
        }
    }
}

fn chart_data(dataset: &Dataset, spec: &ChartSpec) -> Result<ChartData> {
    let (xs, ys) = paired(dataset, &spec.x, &spec.y, &spec.filters)?;
    if xs.is_empty() {
        return Err(AnalystError::computation(format!(
            "no rows to plot for {} against {}",
            spec.x, spec.y
        )));
    }

    // A vertical cloud has no least-squares line; plot the points alone.
    let fit = spec
        .regression
        .and_then(|_| StatisticalAnalyzer::linear_regression(&xs, &ys))
        .map(|r| r.line());

    Ok(ChartData {
        spec: spec.clone(),
        points: xs.into_iter().zip(ys).collect(),
        fit,
    })
}

fn resolve(dataset: &Dataset, column: &ColumnRef) -> Result<usize> {
    dataset
        .resolve(column)
        .ok_or_else(|| AnalystError::computation(format!("column {} not found in dataset", column)))
}

fn accessor(dataset: &Dataset, measure: &Measure) -> Result<Accessor> {
    match measure {
        Measure::Column { column } => {
            let idx = resolve(dataset, column)?;
            match dataset.column(idx).map(|c| c.kind) {
                Some(ColumnType::Number) => Ok(Accessor::Number(idx)),
                Some(ColumnType::Date) if column.role == Some(ColumnRole::Year) => {
                    Ok(Accessor::Year(idx))
                }
                Some(ColumnType::Date) => Ok(Accessor::Ordinal(idx)),
                _ => Err(AnalystError::computation(format!(
                    "column {} is not numeric",
                    column
                ))),
            }
        }
        Measure::Span { from, to } => {
            let from_idx = resolve(dataset, from)?;
            let to_idx = resolve(dataset, to)?;
            let kinds = (
                dataset.column(from_idx).map(|c| c.kind),
                dataset.column(to_idx).map(|c| c.kind),
            );
            match kinds {
                (Some(ColumnType::Date), Some(ColumnType::Date)) => Ok(Accessor::DaysBetween {
                    from: from_idx,
                    to: to_idx,
                }),
                (Some(ColumnType::Number), Some(ColumnType::Number)) => Ok(Accessor::Difference {
                    from: from_idx,
                    to: to_idx,
                }),
                _ => Err(AnalystError::computation(format!(
                    "cannot take the span between {} and {}",
                    from, to
                ))),
            }
        }
    }
}

/// Indices of rows satisfying every filter.
fn matching_rows(dataset: &Dataset, filters: &[Filter]) -> Result<Vec<usize>> {
    let resolved: Vec<(usize, &Filter)> = filters
        .iter()
        .map(|f| resolve(dataset, &f.column).map(|idx| (idx, f)))
        .collect::<Result<_>>()?;

    Ok((0..dataset.len())
        .filter(|&row| {
            resolved.iter().all(|(col, filter)| {
                dataset
                    .value(row, *col)
                    .is_some_and(|value| filter_matches(filter, value))
            })
        })
        .collect())
}

fn filter_matches(filter: &Filter, value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Number(n) => filter.predicate.matches_number(*n),
        // Numeric bounds on a date compare its year.
        Value::Date(_) => value
            .year()
            .is_some_and(|year| filter.predicate.matches_number(year)),
        Value::Text(text) => filter.predicate.matches_text(text),
    }
}

fn paired(
    dataset: &Dataset,
    x: &Measure,
    y: &Measure,
    filters: &[Filter],
) -> Result<(Vec<f64>, Vec<f64>)> {
    let rows = matching_rows(dataset, filters)?;
    let x_acc = accessor(dataset, x)?;
    let y_acc = accessor(dataset, y)?;

    Ok(rows
        .iter()
        .filter_map(|&row| Some((x_acc.read(dataset, row)?, y_acc.read(dataset, row)?)))
        .unzip())
}

/// Sort key for ordering rows; dates order by day.
fn order_key(dataset: &Dataset, idx: usize, row: usize) -> Option<f64> {
    let value = dataset.value(row, idx)?;
    match value {
        Value::Number(n) => Some(*n),
        Value::Date(d) => Some(d.num_days_from_ce() as f64),
        _ => None,
    }
}

fn extreme(
    dataset: &Dataset,
    order_by: &ColumnRef,
    direction: Direction,
    select: &ColumnRef,
    filters: &[Filter],
) -> Result<Answer> {
    let rows = matching_rows(dataset, filters)?;
    let order_idx = resolve(dataset, order_by)?;
    let select_idx = resolve(dataset, select)?;

    let mut best: Option<(f64, usize)> = None;
    for row in rows {
        let Some(key) = order_key(dataset, order_idx, row) else {
            continue;
        };
        if dataset.value(row, select_idx).map_or(true, Value::is_null) {
            continue;
        }
        // Strict comparison keeps the first row among ties.
        let better = match (best, direction) {
            (None, _) => true,
            (Some((current, _)), Direction::Ascending) => key < current,
            (Some((current, _)), Direction::Descending) => key > current,
        };
        if better {
            best = Some((key, row));
        }
    }

    let (_, row) = best.ok_or_else(|| {
        AnalystError::computation(format!("no rows match when ordering by {}", order_by))
    })?;
    dataset
        .value(row, select_idx)
        .map(value_answer)
        .ok_or_else(|| AnalystError::Internal("selected row out of range".to_string()))
}

fn most_frequent(dataset: &Dataset, group: &ColumnRef, filters: &[Filter]) -> Result<Answer> {
    let rows = matching_rows(dataset, filters)?;
    let idx = resolve(dataset, group)?;

    let values: Vec<&Value> = rows
        .iter()
        .filter_map(|&row| dataset.value(row, idx))
        .filter(|v| !v.is_null())
        .collect();
    let labels: Vec<String> = values.iter().map(|v| v.to_string()).collect();

    let mode = MetricAggregator::mode(&labels).ok_or_else(|| {
        AnalystError::computation(format!("no values of {} among matching rows", group))
    })?;

    let representative = labels
        .iter()
        .position(|label| *label == mode.value)
        .map(|i| values[i]);
    Ok(representative
        .map(value_answer)
        .unwrap_or(Answer::Text(mode.value)))
}

/// Cell values are reported as stored, without rounding.
fn value_answer(value: &Value) -> Answer {
    match value {
        Value::Number(n) => Answer::Number(*n),
        other => Answer::Text(other.to_string()),
    }
}
