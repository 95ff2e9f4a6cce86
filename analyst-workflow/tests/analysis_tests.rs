mod common;

use analyst_core::{
    Aggregation, AnalystError, Answer, ChartSpec, ColumnRef, ColumnRole, Computed, Direction,
    Filter, ImageFormat, LineStyle, Measure, Predicate, Question, QuestionKind,
};
use analyst_workflow::AnalysisEngine;
use approx::assert_relative_eq;
use common::*;
use pretty_assertions::assert_eq;

fn answer(dataset: &analyst_core::Dataset, kind: QuestionKind) -> Answer {
    let question = Question::new(0, "q", kind);
    match AnalysisEngine::new().compute(dataset, &question).unwrap() {
        Computed::Ready { answer } => answer,
        Computed::Chart { .. } => panic!("expected a ready answer"),
    }
}

fn column(name: &str) -> Measure {
    Measure::column(ColumnRef::named(name))
}

// ===== Films =====

#[test]
fn test_count_two_billion_before_2020() {
    let films = films_dataset();
    let kind = QuestionKind::Count {
        filters: vec![
            Filter::new(ColumnRef::role(ColumnRole::Amount), Predicate::AtLeast(2e9)),
            Filter::new(ColumnRef::role(ColumnRole::Year), Predicate::Less(2020.0)),
        ],
    };

    assert_eq!(answer(&films, kind), Answer::Number(5.0));
}

#[test]
fn test_earliest_film_over_threshold() {
    let films = films_dataset();
    let kind = QuestionKind::Extreme {
        order_by: ColumnRef::role(ColumnRole::Year),
        direction: Direction::Ascending,
        select: ColumnRef::named_or("film", ColumnRole::Label),
        filters: vec![Filter::new(
            ColumnRef::role(ColumnRole::Amount),
            Predicate::Greater(1.5e9),
        )],
    };

    assert_eq!(answer(&films, kind), Answer::Text("Titanic".to_string()));
}

#[test]
fn test_latest_film_tie_keeps_first_row() {
    let films = films_dataset();
    let kind = QuestionKind::Extreme {
        order_by: ColumnRef::role(ColumnRole::Year),
        direction: Direction::Descending,
        select: ColumnRef::role(ColumnRole::Label),
        filters: vec![Filter::new(
            ColumnRef::role(ColumnRole::Year),
            Predicate::Between(2015.0, 2015.0),
        )],
    };

    assert_eq!(
        answer(&films, kind),
        Answer::Text("Star Wars: The Force Awakens".to_string())
    );
}

#[test]
fn test_rank_peak_correlation() {
    let films = films_dataset();
    let kind = QuestionKind::Correlation {
        x: column("rank"),
        y: column("peak"),
        filters: vec![],
    };

    assert_eq!(answer(&films, kind), Answer::Number(0.845726));
}

#[test]
fn test_aggregate_mean_gross_before_2010() {
    let films = films_dataset();
    let kind = QuestionKind::Aggregate {
        function: Aggregation::Mean,
        measure: Measure::column(ColumnRef::named("worldwide gross")),
        filters: vec![Filter::new(
            ColumnRef::role(ColumnRole::Year),
            Predicate::Less(2010.0),
        )],
    };

    // Avatar and Titanic: (2,923,706,026 + 2,257,844,554) / 2
    assert_eq!(answer(&films, kind), Answer::Number(2_590_780_000.0));
}

#[test]
fn test_chart_data_with_fit() {
    let films = films_dataset();
    let spec = ChartSpec {
        x: column("rank"),
        y: column("peak"),
        filters: vec![],
        regression: Some(LineStyle::default()),
        format: ImageFormat::Png,
        max_chars: None,
    };
    let question = Question::new(3, "chart", QuestionKind::Chart(spec));

    let Computed::Chart { data } = AnalysisEngine::new().compute(&films, &question).unwrap() else {
        panic!("expected chart data");
    };
    assert_eq!(data.points.len(), 10);
    assert_eq!(data.points[0], (1.0, 1.0));

    let fit = data.fit.expect("fit requested");
    assert_relative_eq!(fit.slope, 0.7878787878787878, epsilon = 1e-9);
}

#[test]
fn test_unknown_column_is_computation_error() {
    let films = films_dataset();
    let question = Question::new(
        0,
        "q",
        QuestionKind::Correlation {
            x: column("budget"),
            y: column("peak"),
            filters: vec![],
        },
    );

    let err = AnalysisEngine::new().compute(&films, &question).unwrap_err();
    assert!(matches!(err, AnalystError::Computation(_)));
    assert!(!err.is_recoverable());
}

#[test]
fn test_text_column_is_not_numeric() {
    let films = films_dataset();
    let question = Question::new(
        0,
        "q",
        QuestionKind::Aggregate {
            function: Aggregation::Sum,
            measure: column("title"),
            filters: vec![],
        },
    );

    assert!(matches!(
        AnalysisEngine::new().compute(&films, &question),
        Err(AnalystError::Computation(_))
    ));
}

// ===== Court =====

#[test]
fn test_court_with_most_cases() {
    let court = court_dataset();
    let kind = QuestionKind::MostFrequent {
        group: ColumnRef::named("high court"),
        filters: vec![Filter::new(
            ColumnRef::role(ColumnRole::Year),
            Predicate::Between(2019.0, 2022.0),
        )],
    };

    assert_eq!(answer(&court, kind), Answer::Text("33_10".to_string()));
}

#[test]
fn test_delay_regression_slope() {
    let court = court_dataset();
    let kind = QuestionKind::RegressionSlope {
        x: Measure::column(ColumnRef::named_or("year", ColumnRole::Year)),
        y: Measure::span(
            ColumnRef::named("date_of_registration"),
            ColumnRef::named("decision_date"),
        ),
        filters: vec![Filter::new(
            ColumnRef::named("court"),
            Predicate::Equals("33_10".to_string()),
        )],
    };

    assert_eq!(answer(&court, kind), Answer::Number(21.1765));
}

#[test]
fn test_zero_variance_is_computation_error() {
    let court = court_dataset();
    let question = Question::new(
        0,
        "q",
        QuestionKind::Correlation {
            x: column("year"),
            y: Measure::span(
                ColumnRef::named("date_of_registration"),
                ColumnRef::named("decision_date"),
            ),
            filters: vec![Filter::new(
                ColumnRef::role(ColumnRole::Year),
                Predicate::Between(2023.0, 2023.0),
            )],
        },
    );

    assert!(matches!(
        AnalysisEngine::new().compute(&court, &question),
        Err(AnalystError::Computation(_))
    ));
}

#[test]
fn test_answers_are_deterministic() {
    let court = court_dataset();
    let kind = QuestionKind::Correlation {
        x: column("year"),
        y: Measure::span(
            ColumnRef::named("date_of_registration"),
            ColumnRef::named("decision_date"),
        ),
        filters: vec![],
    };

    assert_eq!(answer(&court, kind.clone()), answer(&court_dataset(), kind));
}
