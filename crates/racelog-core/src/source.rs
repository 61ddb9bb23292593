use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::DataFrame;
use racelog_parser::{parse_csv_relation, ParserError, Relation};
use thiserror::Error;
use tracing::info;

use crate::config::CsvFiles;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parser(#[from] ParserError),
    #[cfg(feature = "runtime")]
    #[error("database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("table name '{0}' is not a plain identifier")]
    InvalidTableName(String),
}

/// The three raw relations of one session, before reconciliation.
#[derive(Debug, Clone)]
pub struct SourceSnapshot {
    pub races: DataFrame,
    pub summary: DataFrame,
    pub years: DataFrame,
}

/// Reads the three relations from CSV files in `dir`.
pub fn load_csv_dir(dir: &Path, files: &CsvFiles) -> Result<SourceSnapshot, LoadError> {
    let snapshot = SourceSnapshot {
        races: load_csv(dir, Relation::RaceRecords, &files.races)?,
        summary: load_csv(dir, Relation::GroupSummary, &files.summary)?,
        years: load_csv(dir, Relation::YearLookup, &files.years)?,
    };
    info!(
        dir = %dir.display(),
        races = snapshot.races.height(),
        groups = snapshot.summary.height(),
        years = snapshot.years.height(),
        "Loaded CSV snapshot"
    );
    Ok(snapshot)
}

fn load_csv(dir: &Path, relation: Relation, file: &str) -> Result<DataFrame, LoadError> {
    let path = dir.join(file);
    let content = fs::read_to_string(&path).map_err(|source| LoadError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(parse_csv_relation(relation, &content)?)
}
