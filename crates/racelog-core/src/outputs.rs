use std::fs::File;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use thiserror::Error;
use tracing::info;

use crate::derive::DerivedTable;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),
    #[error("failed to create {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DerivedTable {
    /// Materializes the derived table as a DataFrame, one row per race.
    pub fn to_dataframe(&self) -> Result<DataFrame, PolarsError> {
        let rows = self.rows();

        let race_ids: Vec<i64> = rows.iter().map(|row| row.race_id).collect();
        let raw_times: Vec<Option<String>> = rows
            .iter()
            .map(|row| row.raw_time.as_ref().map(|time| time.to_string()))
            .collect();
        let laps: Vec<Option<i64>> = rows.iter().map(|row| row.laps).collect();
        let ranks: Vec<Option<i64>> = rows.iter().map(|row| row.rank).collect();
        let names: Vec<Option<String>> = rows.iter().map(|row| row.name.clone()).collect();
        let groups: Vec<Option<String>> = rows.iter().map(|row| row.group.clone()).collect();
        let times: Vec<Option<f64>> = rows.iter().map(|row| row.time_seconds).collect();
        let distances: Vec<Option<f64>> = rows.iter().map(|row| row.distance_m).collect();
        let speeds: Vec<Option<f64>> = rows.iter().map(|row| row.speed_m_s).collect();
        let years: Vec<Option<i32>> = rows.iter().map(|row| row.year).collect();

        DataFrame::new(vec![
            Series::new("race_id".into(), race_ids).into(),
            Series::new("raw_time".into(), raw_times).into(),
            Series::new("laps".into(), laps).into(),
            Series::new("rank".into(), ranks).into(),
            Series::new("name".into(), names).into(),
            Series::new("group".into(), groups).into(),
            Series::new("time_seconds".into(), times).into(),
            Series::new("distance_m".into(), distances).into(),
            Series::new("speed_m_s".into(), speeds).into(),
            Series::new("year".into(), years).into(),
        ])
    }
}

/// Writes the derived table to a parquet file and returns the row count.
pub fn write_parquet(table: &DerivedTable, path: &Path) -> Result<usize, OutputError> {
    let mut df = table.to_dataframe()?;
    let file = File::create(path).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ParquetWriter::new(file).finish(&mut df)?;
    info!(path = %path.display(), rows = df.height(), "Wrote derived table");
    Ok(df.height())
}
