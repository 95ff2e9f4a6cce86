use analyst_core::{ColumnRef, ColumnRole, Filter, Predicate};
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

fn money_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:(over|more than|greater than|above|exceeding|at least|under|less than|below|at most)\s+)?\$\s*(\d[\d,]*(?:\.\d+)?)\s*(bn|billion|mn|million|m|k|thousand|b)?\b",
        )
        .expect("valid money regex")
    })
}

fn year_range_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?:from|between)\s+((?:1[89]|20)\d{2})\s*(?:-|–|to|and|until|through)\s*((?:1[89]|20)\d{2})\b",
        )
        .expect("valid year range regex")
    })
}

fn year_bound_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(before|prior to|after|since|until|through|in|during)\s+((?:1[89]|20)\d{2})\b")
            .expect("valid year bound regex")
    })
}

fn equality_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([a-z_][a-z0-9_]*)\s*==?\s*([a-z0-9_.\-]+)").expect("valid equality regex")
    })
}

/// Row filters stated in a question: money amounts, year bounds and ranges,
/// and `column=value` equalities.
pub fn parse_filters(question: &str) -> Vec<Filter> {
    let text = question.to_lowercase();
    let mut filters = Vec::new();

    for caps in money_regex().captures_iter(&text) {
        let Some(amount) = caps
            .get(2)
            .and_then(|m| m.as_str().replace(',', "").parse::<f64>().ok())
        else {
            continue;
        };
        let amount = amount * unit_multiplier(caps.get(3).map(|m| m.as_str()));
        let predicate = match caps.get(1).map(|m| m.as_str()) {
            Some("over" | "more than" | "greater than" | "above" | "exceeding") => {
                Predicate::Greater(amount)
            }
            Some("under" | "less than" | "below") => Predicate::Less(amount),
            Some("at most") => Predicate::AtMost(amount),
            // "$2 bn movies" reads as "at least $2 bn".
            _ => Predicate::AtLeast(amount),
        };
        filters.push(Filter::new(ColumnRef::role(ColumnRole::Amount), predicate));
    }

    let mut ranges: Vec<Range<usize>> = Vec::new();
    for caps in year_range_regex().captures_iter(&text) {
        let (Some(from), Some(to)) = (year_at(&caps, 1), year_at(&caps, 2)) else {
            continue;
        };
        if let Some(m) = caps.get(0) {
            ranges.push(m.range());
        }
        filters.push(Filter::new(
            ColumnRef::role(ColumnRole::Year),
            Predicate::Between(from.min(to), from.max(to)),
        ));
    }

    for caps in year_bound_regex().captures_iter(&text) {
        let Some(m) = caps.get(0) else { continue };
        if ranges.iter().any(|r| r.start < m.end() && m.start() < r.end) {
            continue;
        }
        let Some(year) = year_at(&caps, 2) else { continue };
        let predicate = match caps.get(1).map(|m| m.as_str()) {
            Some("before" | "prior to") => Predicate::Less(year),
            Some("after") => Predicate::Greater(year),
            Some("since") => Predicate::AtLeast(year),
            Some("until" | "through") => Predicate::AtMost(year),
            _ => Predicate::Between(year, year),
        };
        filters.push(Filter::new(ColumnRef::role(ColumnRole::Year), predicate));
    }

    for caps in equality_regex().captures_iter(&text) {
        let (Some(column), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let value = value.as_str().trim_end_matches(['.', '-']);
        if value.is_empty() {
            continue;
        }
        filters.push(Filter::new(
            ColumnRef::named(column.as_str()),
            Predicate::Equals(value.to_string()),
        ));
    }

    filters
}

fn unit_multiplier(unit: Option<&str>) -> f64 {
    match unit {
        Some("bn" | "billion" | "b") => 1e9,
        Some("mn" | "million" | "m") => 1e6,
        Some("k" | "thousand") => 1e3,
        _ => 1.0,
    }
}

fn year_at(caps: &regex::Captures<'_>, group: usize) -> Option<f64> {
    caps.get(group).and_then(|m| m.as_str().parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn predicates(question: &str) -> Vec<(Option<ColumnRole>, Predicate)> {
        parse_filters(question)
            .into_iter()
            .map(|f| (f.column.role, f.predicate))
            .collect()
    }

    #[test]
    fn test_money_without_qualifier_is_lower_bound() {
        assert_eq!(
            predicates("How many $2 bn movies were released before 2020?"),
            vec![
                (Some(ColumnRole::Amount), Predicate::AtLeast(2e9)),
                (Some(ColumnRole::Year), Predicate::Less(2020.0)),
            ]
        );
    }

    #[test]
    fn test_money_with_qualifier() {
        assert_eq!(
            predicates("Which is the earliest film that grossed over $1.5 bn?"),
            vec![(Some(ColumnRole::Amount), Predicate::Greater(1.5e9))]
        );
        assert_eq!(
            predicates("films under $500 million"),
            vec![(Some(ColumnRole::Amount), Predicate::Less(5e8))]
        );
    }

    #[test]
    fn test_year_range_suppresses_bounds() {
        assert_eq!(
            predicates("Which high court disposed the most cases from 2019 - 2022?"),
            vec![(Some(ColumnRole::Year), Predicate::Between(2019.0, 2022.0))]
        );
        assert_eq!(
            predicates("cases between 2022 and 2019"),
            vec![(Some(ColumnRole::Year), Predicate::Between(2019.0, 2022.0))]
        );
    }

    #[test]
    fn test_single_year() {
        assert_eq!(
            predicates("how many films were released in 2019"),
            vec![(Some(ColumnRole::Year), Predicate::Between(2019.0, 2019.0))]
        );
    }

    #[test]
    fn test_equality() {
        let filters = parse_filters("regression slope by year in the court=33_10?");
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].column, ColumnRef::named("court"));
        assert_eq!(filters[0].predicate, Predicate::Equals("33_10".to_string()));
    }

    #[test]
    fn test_no_filters() {
        assert!(parse_filters("What's the correlation between the Rank and Peak?").is_empty());
        assert!(parse_filters("Return an image under 100,000 bytes").is_empty());
    }
}
