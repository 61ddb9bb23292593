use polars::prelude::*;
use racelog_core::reconcile::{
    canonicalize_identifier, group_summaries, race_records, year_lookup, SchemaError, RACE_ID,
};
use racelog_core::{GroupSummary, YearEntry};
use racelog_parser::{RawTime, Relation};

#[test]
fn year_lookup_accepts_every_identifier_alias() {
    for alias in ["id", "hlaupID", "HLAUP_ID", "race_id"] {
        let df = df!(alias => [74i64, 808], "year" => [2019i64, 2023]).expect("frame");
        let entries = year_lookup(&df).unwrap_or_else(|err| panic!("{alias}: {err}"));
        assert_eq!(
            entries,
            vec![
                YearEntry {
                    race_id: 74,
                    year: Some(2019)
                },
                YearEntry {
                    race_id: 808,
                    year: Some(2023)
                },
            ]
        );
    }
}

#[test]
fn missing_identifier_is_a_schema_error() {
    let df = df!("race" => [74i64], "year" => [2019i64]).expect("frame");
    let err = year_lookup(&df).expect_err("should not guess a join key");
    match err {
        SchemaError::MissingIdentifier { relation, accepted } => {
            assert_eq!(relation, Relation::YearLookup);
            assert!(accepted.contains(&"hlaupid".to_string()));
            assert!(accepted.contains(&"id".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn conflicting_aliases_are_ambiguous() {
    let df = df!(
        "id" => [1i64],
        "hlaupID" => [2i64],
        "year" => [2020i64]
    )
    .expect("frame");
    let err = year_lookup(&df).expect_err("two aliases should conflict");
    assert!(matches!(
        err,
        SchemaError::AmbiguousColumn {
            column: RACE_ID,
            ..
        }
    ));
}

#[test]
fn canonical_name_wins_over_aliases() {
    let df = df!(
        "race_id" => [1i64],
        "id" => [2i64],
        "year" => [2020i64]
    )
    .expect("frame");
    let entries = year_lookup(&df).expect("canonical column should be chosen");
    assert_eq!(entries[0].race_id, 1);
}

#[test]
fn identifiers_are_coerced_to_int64() {
    let df = df!("hlaup_id" => ["74", " 808 "], "Time" => ["45:30", "43:10"]).expect("frame");
    let canonical = canonicalize_identifier(&df, Relation::RaceRecords).expect("canonicalize");

    assert!(canonical.column("hlaup_id").is_err(), "source column should be dropped");
    let ids = canonical.column(RACE_ID).expect("race_id column");
    assert_eq!(ids.dtype(), &DataType::Int64);
    let values: Vec<Option<i64>> = ids.i64().expect("i64").into_iter().collect();
    assert_eq!(values, vec![Some(74), Some(808)]);

    let floats = df!("hlaup_id" => [74.0f64, 808.0]).expect("frame");
    let canonical = canonicalize_identifier(&floats, Relation::RaceRecords).expect("canonicalize");
    assert_eq!(canonical.column(RACE_ID).expect("race_id").dtype(), &DataType::Int64);
}

#[test]
fn non_integer_identifier_is_rejected() {
    let df = df!("hlaup_id" => ["74", "abc"]).expect("frame");
    let err = race_records(&df).expect_err("non-numeric id");
    assert!(matches!(
        err,
        SchemaError::InvalidIdentifier { row: 1, ref value, .. } if value == "abc"
    ));

    let fractional = df!("hlaup_id" => [74.5f64]).expect("frame");
    assert!(matches!(
        race_records(&fractional),
        Err(SchemaError::InvalidIdentifier { row: 0, .. })
    ));
}

#[test]
fn race_records_require_unique_non_null_ids() {
    let nulls = df!("hlaup_id" => [Some(1i64), None]).expect("frame");
    assert!(matches!(
        race_records(&nulls),
        Err(SchemaError::NullIdentifier { row: 1, .. })
    ));

    let duplicates = df!("hlaup_id" => [1i64, 2, 1]).expect("frame");
    assert!(matches!(
        race_records(&duplicates),
        Err(SchemaError::DuplicateIdentifier { id: 1, .. })
    ));
}

#[test]
fn optional_race_columns_may_be_absent() {
    let df = df!("hlaup_id" => [7i64]).expect("frame");
    let records = race_records(&df).expect("reconcile");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].race_id, 7);
    assert!(records[0].raw_time.is_none());
    assert!(records[0].laps.is_none());
    assert!(records[0].rank.is_none());
    assert!(records[0].name.is_none());
}

#[test]
fn race_fields_are_read_softly() {
    let df = df!(
        "hlaup_id" => [1i64, 2],
        "tími" => [Some(2730.0f64), None],
        "Laps" => [None, Some(27i64)],
        "Rank" => ["3", "DNF"],
        "Nafn" => ["A", "B"]
    )
    .expect("frame");
    let records = race_records(&df).expect("reconcile");

    assert_eq!(records[0].raw_time, Some(RawTime::Seconds(2730.0)));
    assert_eq!(records[0].rank, Some(3));
    assert_eq!(records[0].name.as_deref(), Some("A"));
    assert_eq!(records[1].laps, Some(27));
    assert_eq!(records[1].rank, None, "non-numeric rank is missing, not an error");
}

#[test]
fn group_summaries_need_label_and_members() {
    let missing = df!("Length" => ["10KM"], "Count" => [1i64]).expect("frame");
    assert!(matches!(
        group_summaries(&missing),
        Err(SchemaError::MissingColumn {
            relation: Relation::GroupSummary,
            column: "member_ids"
        })
    ));

    let duplicate = df!("Length" => ["10KM", "10KM"], "IDs" => ["1", "2"]).expect("frame");
    assert!(matches!(
        group_summaries(&duplicate),
        Err(SchemaError::DuplicateLabel { ref label, .. }) if label == "10KM"
    ));
}

#[test]
fn group_summaries_keep_member_lists_verbatim() {
    let df = df!(
        "Length" => [Some("10KM"), None, Some("Backyard")],
        "Count" => [Some(2i64), None, None],
        "IDs" => [Some("74, 808"), Some("1"), None]
    )
    .expect("frame");
    let summaries = group_summaries(&df).expect("reconcile");

    assert_eq!(
        summaries,
        vec![
            GroupSummary::new("10KM", "74, 808").with_count(2),
            GroupSummary::new("Backyard", ""),
        ]
    );
}

#[test]
fn numeric_text_in_a_time_column_is_seconds() {
    let df = df!(
        "hlaup_id" => [74i64, 75, 76],
        "Time" => ["00:45:30", " 2730 ", "2730.5x"]
    )
    .expect("frame");
    let records = race_records(&df).expect("reconcile");

    assert_eq!(records[0].raw_time, Some(RawTime::Text("00:45:30".to_string())));
    assert_eq!(records[1].raw_time, Some(RawTime::Seconds(2730.0)));
    assert_eq!(records[2].raw_time, Some(RawTime::Text("2730.5x".to_string())));
}
