use polars::prelude::DataFrame;
use racelog_parser::{frame_from_cells, Cell, Relation};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::info;

use crate::config::TableNames;
use crate::source::{LoadError, SourceSnapshot};

/// Opens a single-connection pool; the snapshot is read once per session.
pub async fn connect(database_url: &str) -> Result<SqlitePool, LoadError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn load_snapshot(
    pool: &SqlitePool,
    tables: &TableNames,
) -> Result<SourceSnapshot, LoadError> {
    let snapshot = SourceSnapshot {
        races: load_table(pool, Relation::RaceRecords, &tables.races).await?,
        summary: load_table(pool, Relation::GroupSummary, &tables.summary).await?,
        years: load_table(pool, Relation::YearLookup, &tables.years).await?,
    };
    info!(
        races = snapshot.races.height(),
        groups = snapshot.summary.height(),
        years = snapshot.years.height(),
        "Loaded SQLite snapshot"
    );
    Ok(snapshot)
}

async fn load_table(
    pool: &SqlitePool,
    relation: Relation,
    table: &str,
) -> Result<DataFrame, LoadError> {
    if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(LoadError::InvalidTableName(table.to_string()));
    }

    let names: Vec<String> =
        sqlx::query_scalar::<_, String>("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
            .bind(table)
            .fetch_all(pool)
            .await?;

    let sql = format!(r#"SELECT * FROM "{table}""#);
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    let mut columns: Vec<Vec<Cell>> = vec![Vec::with_capacity(rows.len()); names.len()];
    for row in &rows {
        for (idx, column) in columns.iter_mut().enumerate() {
            column.push(sqlite_cell(row, idx)?);
        }
    }

    Ok(frame_from_cells(relation, &names, columns)?)
}

/// SQLite is dynamically typed, so each value is decoded by its own storage
/// class rather than the declared column type.
fn sqlite_cell(row: &SqliteRow, idx: usize) -> Result<Cell, sqlx::Error> {
    if let Ok(value) = row.try_get::<Option<i64>, _>(idx) {
        return Ok(value.map_or(Cell::Null, Cell::Int));
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(idx) {
        return Ok(value.map_or(Cell::Null, Cell::Float));
    }
    let value: Option<String> = row.try_get(idx)?;
    Ok(value.map_or(Cell::Null, Cell::Text))
}
