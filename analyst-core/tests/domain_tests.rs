use analyst_core::domain::*;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rstest::*;

fn strings(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

#[fixture]
fn films() -> Dataset {
    Dataset::from_raw(
        "films",
        strings(&["Rank", "Peak", "Title", "Worldwide gross", "Year"]),
        vec![
            strings(&["1", "1", "Avatar", "$2,923,706,026", "2009"]),
            strings(&["2", "1", "Avengers: Endgame", "$2,797,501,328", "2019"]),
            strings(&["3", "1", "Titanic", "T$2,257,844,554", "1997"]),
            strings(&["4", "4", "1917", "$384,900,000[b]", "2019"]),
        ],
    )
    .unwrap()
}

#[fixture]
fn judgments() -> Dataset {
    Dataset::from_raw(
        "judgments",
        strings(&["court", "date_of_registration", "decision_date", "year"]),
        vec![
            strings(&["33_10", "2019-01-10", "2019-03-01", "2019"]),
            strings(&["27_1", "14-02-2020", "2020-06-30", "2020"]),
            strings(&["33_10", "", "2021-01-05", "2021"]),
        ],
    )
    .unwrap()
}

// ===== Type Inference Tests =====

#[rstest]
fn test_column_types_inferred(films: Dataset) {
    let kinds: Vec<ColumnType> = films.columns().iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ColumnType::Number,
            ColumnType::Number,
            ColumnType::Text,
            ColumnType::Number,
            ColumnType::Number,
        ]
    );
}

#[rstest]
fn test_numeric_title_stays_text(films: Dataset) {
    assert_eq!(films.value(3, 2), Some(&Value::Text("1917".to_string())));
}

#[rstest]
fn test_currency_values_parsed(films: Dataset) {
    assert_eq!(films.value(2, 3), Some(&Value::Number(2_257_844_554.0)));
    assert_eq!(films.value(3, 3), Some(&Value::Number(384_900_000.0)));
}

#[rstest]
fn test_date_columns_and_codes(judgments: Dataset) {
    let kinds: Vec<ColumnType> = judgments.columns().iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![ColumnType::Text, ColumnType::Date, ColumnType::Date, ColumnType::Number]
    );
    assert_eq!(
        judgments.value(1, 1),
        Some(&Value::Date(NaiveDate::from_ymd_opt(2020, 2, 14).unwrap()))
    );
    assert!(judgments.value(2, 1).unwrap().is_null());
}

#[test]
fn test_short_rows_are_padded_and_blank_rows_dropped() {
    let dataset = Dataset::from_raw(
        "t",
        strings(&["a", "b"]),
        vec![strings(&["1"]), strings(&["", ""]), strings(&["2", "3", "extra"])],
    )
    .unwrap();

    assert_eq!(dataset.len(), 2);
    assert!(dataset.value(0, 1).unwrap().is_null());
    assert_eq!(dataset.rows()[1].len(), 2);
}

#[test]
fn test_empty_header_rejected() {
    assert!(Dataset::from_raw("t", vec![], vec![]).is_err());
}

#[test]
fn test_blank_headers_named_by_position() {
    let dataset = Dataset::from_raw("t", strings(&["x", " "]), vec![strings(&["1", "2"])]).unwrap();
    assert_eq!(dataset.columns()[1].name, "column_2");
}

// ===== Column Resolution Tests =====

#[rstest]
#[case("Rank", Some(0))]
#[case("peak", Some(1))]
#[case("worldwide gross", Some(3))]
#[case("gross", Some(3))]
#[case("budget", None)]
fn test_find_by_name(films: Dataset, #[case] phrase: &str, #[case] expected: Option<usize>) {
    assert_eq!(films.find_by_name(phrase), expected);
}

#[rstest]
fn test_phrase_containing_header(judgments: Dataset) {
    assert_eq!(judgments.find_by_name("high court"), Some(0));
    assert_eq!(judgments.find_by_name("the date_of_registration"), Some(1));
}

#[rstest]
fn test_find_by_role(films: Dataset) {
    assert_eq!(films.find_by_role(ColumnRole::Amount), Some(3));
    assert_eq!(films.find_by_role(ColumnRole::Year), Some(4));
    assert_eq!(films.find_by_role(ColumnRole::Label), Some(2));
    assert_eq!(films.find_by_role(ColumnRole::Date), None);
}

#[rstest]
fn test_resolve_falls_back_to_role(films: Dataset) {
    let column = ColumnRef::named_or("film", ColumnRole::Label);
    assert_eq!(films.resolve(&column), Some(2));

    let missing = ColumnRef::named("film");
    assert_eq!(films.resolve(&missing), None);
}

#[test]
fn test_year_role_uses_date_column_when_no_year() {
    let dataset = Dataset::from_raw(
        "t",
        strings(&["decided", "count"]),
        vec![strings(&["2020-01-01", "3"])],
    )
    .unwrap();

    assert_eq!(dataset.find_by_role(ColumnRole::Year), Some(0));
    assert_eq!(dataset.value(0, 0).unwrap().year(), Some(2020.0));
}

// ===== Predicate Tests =====

#[test]
fn test_numeric_predicates() {
    assert!(Predicate::Less(2020.0).matches_number(2019.0));
    assert!(!Predicate::Less(2020.0).matches_number(2020.0));
    assert!(Predicate::AtLeast(2e9).matches_number(2e9));
    assert!(Predicate::Between(2019.0, 2022.0).matches_number(2022.0));
    assert!(!Predicate::Between(2019.0, 2022.0).matches_number(2023.0));
    assert!(Predicate::Equals("7".to_string()).matches_number(7.0));
}

#[test]
fn test_text_predicates() {
    assert!(Predicate::Equals("33_10".to_string()).matches_text("33_10"));
    assert!(Predicate::Equals("Madras".to_string()).matches_text(" madras "));
    assert!(!Predicate::Greater(1.0).matches_text("2"));
}

// ===== Task Tests =====

#[test]
fn test_task_preview_counts_characters() {
    let task = Task::new("héllo wörld");
    assert_eq!(task.preview(5), "héllo");
}

#[test]
fn test_image_payload_ceiling_is_strict() {
    let payload = ImagePayload {
        format: ImageFormat::Png,
        width: 1,
        height: 1,
        data_uri: "x".repeat(10),
    };
    assert!(payload.fits_within(11));
    assert!(!payload.fits_within(10));
}
