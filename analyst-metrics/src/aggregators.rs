use analyst_core::Aggregation;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub value: String,
    pub count: usize,
}

pub struct MetricAggregator;

impl MetricAggregator {
    /// Apply an aggregation function. Returns `None` for an empty sample.
    pub fn aggregate(function: Aggregation, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }

        let result = match function {
            Aggregation::Sum => values.iter().sum(),
            Aggregation::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Aggregation::Min => values.iter().cloned().fold(f64::INFINITY, f64::min),
            Aggregation::Max => values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            Aggregation::Median => Self::median(values),
        };

        Some(result).filter(|v| v.is_finite())
    }

    /// Midpoint of the sorted sample; averages the two middle values for even sizes.
    pub fn median(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        }
    }

    /// Value counts ordered by descending count; ties keep first-seen order.
    pub fn frequencies<I, S>(values: I) -> Vec<FrequencyEntry>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, usize> = HashMap::new();

        for value in values {
            let value = value.as_ref();
            match counts.get_mut(value) {
                Some(count) => *count += 1,
                None => {
                    order.push(value.to_string());
                    counts.insert(value.to_string(), 1);
                }
            }
        }

        let mut entries: Vec<FrequencyEntry> = order
            .into_iter()
            .map(|value| {
                let count = counts[&value];
                FrequencyEntry { value, count }
            })
            .collect();

        // Stable sort keeps first-seen order among equal counts.
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        entries
    }

    /// Most common value, if any.
    pub fn mode<I, S>(values: I) -> Option<FrequencyEntry>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::frequencies(values).into_iter().next()
    }
}
