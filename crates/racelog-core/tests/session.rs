use std::fs;
use std::path::{Path, PathBuf};

use racelog_core::source::LoadError;
use racelog_core::{
    DisplayValue, DistanceBand, PipelineConfig, PipelineError, PlotValue, SchemaError,
    SeriesOrder, Session,
};
use tempfile::TempDir;

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../racelog-parser/tests/data")
}

fn load_fixtures() -> Session {
    Session::load_csv_dir(&fixture_dir(), &PipelineConfig::default()).expect("fixtures load")
}

/// Copies the fixture snapshot into a temp dir, replacing one file.
fn snapshot_with(file: &str, content: &str) -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    for name in ["races.csv", "race_summary.csv", "race_years.csv"] {
        fs::copy(fixture_dir().join(name), dir.path().join(name)).expect("copy fixture");
    }
    fs::write(dir.path().join(file), content).expect("write override");
    dir
}

fn race_ids<T>(rows: &[T], id: impl Fn(&T) -> i64) -> Vec<i64> {
    rows.iter().map(id).collect()
}

#[test]
fn loads_and_derives_the_fixture_snapshot() {
    let session = load_fixtures();
    let table = session.derived();

    assert_eq!(table.len(), 9);
    assert!(table.rejected_groups().is_empty());

    let race = table.get(74).expect("race 74");
    assert_eq!(race.time_seconds, Some(2730.0));
    assert_eq!(race.distance_m, Some(10_000.0));
    assert!((race.speed_m_s.expect("speed") - 3.663).abs() < 1e-3);
    assert_eq!(race.year, Some(2019));
    assert_eq!(race.name.as_deref(), Some("Jón Jónsson"));

    let half = table.get(120).expect("race 120");
    assert_eq!(half.distance_m, Some(21_100.0));
    assert!((half.time_seconds.expect("time") - 5892.4).abs() < 1e-9);

    let unfinished = table.get(512).expect("race 512");
    assert_eq!(unfinished.rank, None, "DNF is not a numeric rank");
    assert_eq!(unfinished.time_seconds, Some(11_564.0));

    let empty = table.get(901).expect("race 901");
    assert_eq!(empty.group.as_deref(), Some("Unknown"));
    assert_eq!(empty.year, None);
    assert!(!empty.is_chartable());
}

#[test]
fn series_orders_chronologically_or_most_recent_first() {
    let session = load_fixtures();

    let ascending = session
        .series_for_group("10KM", SeriesOrder::Ascending, None)
        .expect("series");
    assert_eq!(race_ids(&ascending, |p| p.race_id), vec![74, 455, 808, 1002]);
    assert_eq!(
        ascending.iter().map(|p| p.sequence).collect::<Vec<_>>(),
        vec![1, 2, 3, 4]
    );
    assert_eq!(ascending[0].value, PlotValue::Time { seconds: 2730.0 });
    assert_eq!(ascending[0].year, Some(2019));

    let descending = session
        .series_for_group("10KM", SeriesOrder::Descending, None)
        .expect("series");
    assert_eq!(race_ids(&descending, |p| p.race_id), vec![1002, 808, 455, 74]);
    assert_eq!(descending[0].sequence, 1);
}

#[test]
fn series_limit_keeps_the_most_recent_races() {
    let session = load_fixtures();

    let ascending = session
        .series_for_group("10KM", SeriesOrder::Ascending, Some(2))
        .expect("series");
    assert_eq!(race_ids(&ascending, |p| p.race_id), vec![808, 1002]);

    let descending = session
        .series_for_group("10KM", SeriesOrder::Descending, Some(2))
        .expect("series");
    assert_eq!(race_ids(&descending, |p| p.race_id), vec![1002, 808]);

    let oversized = session
        .series_for_group("10KM", SeriesOrder::Ascending, Some(50))
        .expect("series");
    assert_eq!(oversized.len(), 4);

    assert!(session
        .series_for_group("10KM", SeriesOrder::Ascending, Some(0))
        .expect("series")
        .is_empty());
}

#[test]
fn lap_groups_plot_laps() {
    let session = load_fixtures();
    let series = session
        .series_for_group("Backyard", SeriesOrder::Ascending, None)
        .expect("series");
    let values: Vec<PlotValue> = series.iter().map(|p| p.value).collect();
    assert_eq!(
        values,
        vec![PlotValue::Laps { laps: 27 }, PlotValue::Laps { laps: 31 }]
    );

    let table = session.table_for_group("Backyard").expect("table");
    assert_eq!(race_ids(&table, |r| r.race_id), vec![640, 301]);
    assert_eq!(table[0].display, Some(DisplayValue::Laps(31)));
    assert_eq!(table[0].distance_m, None);
    assert_eq!(table[0].speed_m_s, None);
}

#[test]
fn table_lists_most_recent_first_with_formatted_times() {
    let session = load_fixtures();
    let rows = session.table_for_group("10KM").expect("table");

    assert_eq!(race_ids(&rows, |r| r.race_id), vec![1002, 808, 455, 74]);
    assert_eq!(rows[0].display, Some(DisplayValue::Time("42:58.50".to_string())));
    assert_eq!(rows[3].display, Some(DisplayValue::Time("45:30".to_string())));

    let half = session.table_for_group("21.1KM").expect("table");
    assert_eq!(
        half[0].display,
        Some(DisplayValue::Time("1:38:12.40".to_string()))
    );
}

#[test]
fn unplottable_rows_stay_listable() {
    let session = load_fixtures();
    assert!(session
        .series_for_group("Unknown", SeriesOrder::Ascending, None)
        .expect("series")
        .is_empty());

    let rows = session.table_for_group("Unknown").expect("table");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].race_id, 901);
    assert_eq!(rows[0].display, None);
}

#[test]
fn series_is_a_subset_of_the_table() {
    let session = load_fixtures();
    for label in session.group_labels() {
        let table = session.table_for_group(&label).expect("table");
        let listed: Vec<i64> = race_ids(&table, |r| r.race_id);
        for order in [SeriesOrder::Ascending, SeriesOrder::Descending] {
            let series = session.series_for_group(&label, order, None).expect("series");
            for point in &series {
                assert!(listed.contains(&point.race_id), "{label}: {}", point.race_id);
            }
        }
    }
}

#[test]
fn unknown_group_yields_empty_views() {
    let session = load_fixtures();
    assert!(session.resolve_group("Marathon").expect("resolve").is_empty());
    assert!(session
        .series_for_group("Marathon", SeriesOrder::Ascending, None)
        .expect("series")
        .is_empty());
    assert!(session.table_for_group("Marathon").expect("table").is_empty());
}

#[test]
fn top_n_returns_the_most_recent_races_ascending() {
    let session = load_fixtures();

    let top = session.top_n_by_id(5);
    assert_eq!(race_ids(&top, |p| p.race_id), vec![512, 640, 808, 901, 1002]);
    assert_eq!(top[0].sequence, 1);

    assert_eq!(session.top_n_by_id(100).len(), 9);
    assert!(session.top_n_by_id(0).is_empty());
}

#[test]
fn rank_history_skips_unranked_races() {
    let session = load_fixtures();
    let ranks = session.rank_history();

    assert_eq!(
        race_ids(&ranks, |p| p.race_id),
        vec![74, 120, 301, 455, 640, 808, 1002]
    );
    assert_eq!(ranks[2].rank, Some(1));
    assert_eq!(ranks.last().map(|p| p.sequence), Some(7));
}

#[test]
fn group_shares_sum_to_one() {
    let session = load_fixtures();
    let shares = session.group_shares();

    assert_eq!(shares.len(), 5);
    assert_eq!(shares[0].label, "10KM");
    assert_eq!(shares[0].count, 4);
    let ten_k = shares[0].share.expect("share");
    assert!((ten_k - 4.0 / 9.0).abs() < 1e-12);

    let total: f64 = shares.iter().filter_map(|s| s.share).sum();
    assert!((total - 1.0).abs() < 1e-12);
}

#[test]
fn band_filter_uses_label_distance() {
    let session = load_fixtures();
    assert_eq!(session.groups_in_band(DistanceBand::Middle), vec!["10KM"]);
    assert_eq!(
        session.groups_in_band(DistanceBand::Long),
        vec!["21.1KM", "42.2KM"]
    );
    assert!(session.groups_in_band(DistanceBand::Ultra).is_empty());
    assert_eq!(session.groups_in_band(DistanceBand::All).len(), 5);
}

#[test]
fn sessions_are_independent_and_repeatable() {
    let first = load_fixtures();
    let second = first.clone();
    let _ = first.table_for_group("10KM");
    assert_eq!(first.derived(), second.derived());
    assert_eq!(load_fixtures().derived(), first.derived());
}

#[test]
fn schema_errors_fail_the_load() {
    let dir = snapshot_with("race_years.csv", "race,year\n74,2019\n");
    let err = Session::load_csv_dir(dir.path(), &PipelineConfig::default())
        .expect_err("years without an identifier");
    assert!(matches!(
        err,
        PipelineError::Schema(SchemaError::MissingIdentifier { .. })
    ));
}

#[test]
fn corrupt_group_does_not_abort_the_session() {
    let summary = "Length,Count,IDs\n10KM,2,\"74, 80x8\"\nBackyard,2,\"301, 640\"\n";
    let dir = snapshot_with("race_summary.csv", summary);
    let session = Session::load_csv_dir(dir.path(), &PipelineConfig::default()).expect("load");

    assert_eq!(session.derived().rejected_groups().len(), 1);
    assert!(session.table_for_group("10KM").is_err());
    assert_eq!(session.table_for_group("Backyard").expect("table").len(), 2);
    assert_eq!(session.derived().get(74).expect("74").distance_m, None);
}

#[test]
fn custom_delimiter_and_file_names() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::copy(fixture_dir().join("races.csv"), dir.path().join("runs.csv")).expect("copy");
    fs::copy(fixture_dir().join("race_years.csv"), dir.path().join("years.csv")).expect("copy");
    fs::write(
        dir.path().join("groups.csv"),
        "lengd,fjöldi,ids\n10KM,2,74;808\n",
    )
    .expect("write");

    let config = PipelineConfig::from_toml_str(
        r#"
member_delimiter = ";"

[files]
races = "runs.csv"
summary = "groups.csv"
years = "years.csv"
"#,
    )
    .expect("config");

    let session = Session::load_csv_dir(dir.path(), &config).expect("load");
    let rows = session.table_for_group("10KM").expect("table");
    assert_eq!(race_ids(&rows, |r| r.race_id), vec![808, 74]);
}

#[test]
fn shared_race_only_appears_in_its_first_group() {
    let summary = "Length,Count,IDs\n10KM,1,74\n5KM,2,\"74, 455\"\n";
    let dir = snapshot_with("race_summary.csv", summary);
    let session = Session::load_csv_dir(dir.path(), &PipelineConfig::default()).expect("load");

    let ten_k = session.table_for_group("10KM").expect("table");
    assert_eq!(race_ids(&ten_k, |r| r.race_id), vec![74]);
    assert_eq!(ten_k[0].distance_m, Some(10_000.0));

    let five_k = session.table_for_group("5KM").expect("table");
    assert_eq!(race_ids(&five_k, |r| r.race_id), vec![455]);
    assert_eq!(five_k[0].distance_m, Some(5_000.0));

    let series = session
        .series_for_group("5KM", SeriesOrder::Ascending, None)
        .expect("series");
    assert_eq!(race_ids(&series, |p| p.race_id), vec![455]);
}

#[test]
fn mixed_time_column_keeps_numeric_seconds() {
    let races = "hlaup_id,Time\n74,00:45:30\n455,2465\n";
    let dir = snapshot_with("races.csv", races);
    let session = Session::load_csv_dir(dir.path(), &PipelineConfig::default()).expect("load");

    assert_eq!(session.derived().get(74).expect("74").time_seconds, Some(2730.0));
    let numeric = session.derived().get(455).expect("455");
    assert_eq!(numeric.time_seconds, Some(2465.0));
    assert_eq!(numeric.speed_m_s, Some(10_000.0 / 2465.0));

    let rows = session.table_for_group("10KM").expect("table");
    assert_eq!(
        rows.iter().find(|r| r.race_id == 455).and_then(|r| r.display.clone()),
        Some(DisplayValue::Time("41:05".to_string()))
    );
}

#[test]
fn missing_snapshot_file_is_a_load_error() {
    let err = Session::load_csv_dir(Path::new("/nonexistent/racelog"), &PipelineConfig::default())
        .expect_err("missing directory");
    assert!(matches!(err, PipelineError::Load(LoadError::Io { .. })));
}

#[test]
fn empty_delimiter_is_rejected() {
    let err = PipelineConfig::from_toml_str("member_delimiter = \"\"").expect_err("empty");
    assert!(err.to_string().contains("member_delimiter"));
}
