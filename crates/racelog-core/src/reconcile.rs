//! Resolves the loosely-named source columns to a fixed schema once, at load
//! time, and coerces every join key to `i64`.

use std::collections::HashSet;

use polars::prelude::*;
use racelog_parser::{cells_from_column, Cell, RawTime, Relation};
use thiserror::Error;
use tracing::debug;

use crate::source::SourceSnapshot;
use crate::types::{GroupSummary, RaceRecord, YearEntry};

pub const RACE_ID: &str = "race_id";

const RACE_ID_ALIASES: &[&str] = &["hlaup_id", "hlaupa_id"];
const YEAR_ID_ALIASES: &[&str] = &["hlaupid", "hlaup_id", "id"];
const TIME_COLUMNS: &[&str] = &["raw_time", "time", "tími"];
const LAPS_COLUMNS: &[&str] = &["laps", "hringir"];
const RANK_COLUMNS: &[&str] = &["rank", "sæti"];
const NAME_COLUMNS: &[&str] = &["name", "nafn"];
const LABEL_COLUMNS: &[&str] = &["length_label", "length", "lengd"];
const COUNT_COLUMNS: &[&str] = &["count", "fjöldi"];
const MEMBER_COLUMNS: &[&str] = &["member_ids", "ids"];
const YEAR_COLUMNS: &[&str] = &["year", "ár"];

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),
    #[error("{relation} has no identifier column (accepted: {accepted:?})")]
    MissingIdentifier {
        relation: Relation,
        accepted: Vec<String>,
    },
    #[error("{relation} column '{column}' matched more than one source column: {candidates:?}")]
    AmbiguousColumn {
        relation: Relation,
        column: &'static str,
        candidates: Vec<String>,
    },
    #[error("{relation} is missing required column '{column}'")]
    MissingColumn {
        relation: Relation,
        column: &'static str,
    },
    #[error("{relation} identifier at row {row} is not an integer: '{value}'")]
    InvalidIdentifier {
        relation: Relation,
        row: usize,
        value: String,
    },
    #[error("{relation} identifier at row {row} is null")]
    NullIdentifier { relation: Relation, row: usize },
    #[error("{relation} identifier {id} appears more than once")]
    DuplicateIdentifier { relation: Relation, id: i64 },
    #[error("{relation} group label '{label}' appears more than once")]
    DuplicateLabel { relation: Relation, label: String },
}

/// The three source relations with their columns resolved to named fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledSnapshot {
    pub races: Vec<RaceRecord>,
    pub summaries: Vec<GroupSummary>,
    pub years: Vec<YearEntry>,
}

pub fn reconcile(snapshot: &SourceSnapshot) -> Result<ReconciledSnapshot, SchemaError> {
    let reconciled = ReconciledSnapshot {
        races: race_records(&snapshot.races)?,
        summaries: group_summaries(&snapshot.summary)?,
        years: year_lookup(&snapshot.years)?,
    };
    debug!(
        races = reconciled.races.len(),
        groups = reconciled.summaries.len(),
        years = reconciled.years.len(),
        "Reconciled source snapshot"
    );
    Ok(reconciled)
}

/// Renames the relation's identifier column to `race_id` and casts it to
/// `Int64`. Fails when no accepted alias is present, when aliases conflict,
/// or when any identifier is not an integer.
pub fn canonicalize_identifier(
    df: &DataFrame,
    relation: Relation,
) -> Result<DataFrame, SchemaError> {
    let aliases = identifier_aliases(relation);
    let source = locate_column(df, relation, RACE_ID, RACE_ID, aliases)?.ok_or_else(|| {
        SchemaError::MissingIdentifier {
            relation,
            accepted: std::iter::once(RACE_ID)
                .chain(aliases.iter().copied())
                .map(str::to_string)
                .collect(),
        }
    })?;

    let cells = cells_from_column(df.column(&source)?)?;
    let mut ids: Vec<Option<i64>> = Vec::with_capacity(cells.len());
    for (row, cell) in cells.iter().enumerate() {
        ids.push(identifier_from_cell(relation, row, cell)?);
    }

    let mut canonical = df.drop(&source)?;
    canonical.with_column(Series::new(RACE_ID.into(), ids))?;
    Ok(canonical)
}

pub fn race_records(df: &DataFrame) -> Result<Vec<RaceRecord>, SchemaError> {
    let relation = Relation::RaceRecords;
    let canonical = canonicalize_identifier(df, relation)?;
    let ids = canonical.column(RACE_ID)?.i64()?;

    let times = optional_cells(&canonical, relation, "raw_time", TIME_COLUMNS)?;
    let laps = optional_cells(&canonical, relation, "laps", LAPS_COLUMNS)?;
    let ranks = optional_cells(&canonical, relation, "rank", RANK_COLUMNS)?;
    let names = optional_cells(&canonical, relation, "name", NAME_COLUMNS)?;

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(canonical.height());
    for row in 0..canonical.height() {
        let race_id = ids
            .get(row)
            .ok_or(SchemaError::NullIdentifier { relation, row })?;
        if !seen.insert(race_id) {
            return Err(SchemaError::DuplicateIdentifier {
                relation,
                id: race_id,
            });
        }

        records.push(RaceRecord {
            race_id,
            raw_time: times.as_ref().and_then(|cells| raw_time(&cells[row])),
            laps: laps.as_ref().and_then(|cells| soft_integer(&cells[row])),
            rank: ranks.as_ref().and_then(|cells| soft_integer(&cells[row])),
            name: names.as_ref().and_then(|cells| cells[row].to_text()),
        });
    }

    Ok(records)
}

pub fn group_summaries(df: &DataFrame) -> Result<Vec<GroupSummary>, SchemaError> {
    let relation = Relation::GroupSummary;
    let labels = required_cells(df, relation, "length_label", LABEL_COLUMNS)?;
    let members = required_cells(df, relation, "member_ids", MEMBER_COLUMNS)?;
    let counts = optional_cells(df, relation, "count", COUNT_COLUMNS)?;

    let mut seen = HashSet::new();
    let mut summaries = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let Some(label) = labels[row].to_text() else {
            debug!(row, "Skipping group summary row without a label");
            continue;
        };
        if !seen.insert(label.clone()) {
            return Err(SchemaError::DuplicateLabel { relation, label });
        }

        summaries.push(GroupSummary {
            length_label: label,
            count: counts.as_ref().and_then(|cells| soft_integer(&cells[row])),
            member_ids: members[row].to_text().unwrap_or_default(),
        });
    }

    Ok(summaries)
}

pub fn year_lookup(df: &DataFrame) -> Result<Vec<YearEntry>, SchemaError> {
    let relation = Relation::YearLookup;
    let canonical = canonicalize_identifier(df, relation)?;
    let ids = canonical.column(RACE_ID)?.i64()?;
    let years = required_cells(&canonical, relation, "year", YEAR_COLUMNS)?;

    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(canonical.height());
    for row in 0..canonical.height() {
        let Some(race_id) = ids.get(row) else {
            debug!(row, "Skipping year lookup row without an identifier");
            continue;
        };
        if !seen.insert(race_id) {
            return Err(SchemaError::DuplicateIdentifier {
                relation,
                id: race_id,
            });
        }
        let year = soft_integer(&years[row]).and_then(|year| i32::try_from(year).ok());
        entries.push(YearEntry { race_id, year });
    }

    Ok(entries)
}

fn identifier_aliases(relation: Relation) -> &'static [&'static str] {
    match relation {
        Relation::RaceRecords => RACE_ID_ALIASES,
        Relation::YearLookup => YEAR_ID_ALIASES,
        Relation::GroupSummary => &[],
    }
}

/// Finds the source column for `column`. Names compare case-insensitively.
/// An exact canonical match wins; otherwise exactly one alias may match.
fn locate_column(
    df: &DataFrame,
    relation: Relation,
    column: &'static str,
    canonical: &str,
    aliases: &[&str],
) -> Result<Option<String>, SchemaError> {
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.as_str().to_string())
        .collect();

    if let Some(exact) = names
        .iter()
        .find(|name| name.to_lowercase() == canonical.to_lowercase())
    {
        return Ok(Some(exact.clone()));
    }

    let mut candidates: Vec<String> = names
        .into_iter()
        .filter(|name| {
            let lowered = name.to_lowercase();
            aliases.iter().any(|alias| alias.to_lowercase() == lowered)
        })
        .collect();

    match candidates.len() {
        0 => Ok(None),
        1 => Ok(candidates.pop()),
        _ => Err(SchemaError::AmbiguousColumn {
            relation,
            column,
            candidates,
        }),
    }
}

fn optional_cells(
    df: &DataFrame,
    relation: Relation,
    column: &'static str,
    aliases: &[&str],
) -> Result<Option<Vec<Cell>>, SchemaError> {
    match locate_column(df, relation, column, column, aliases)? {
        Some(source) => Ok(Some(cells_from_column(df.column(&source)?)?)),
        None => {
            debug!(%relation, column, "Optional column absent");
            Ok(None)
        }
    }
}

fn required_cells(
    df: &DataFrame,
    relation: Relation,
    column: &'static str,
    aliases: &[&str],
) -> Result<Vec<Cell>, SchemaError> {
    optional_cells(df, relation, column, aliases)?
        .ok_or(SchemaError::MissingColumn { relation, column })
}

fn identifier_from_cell(
    relation: Relation,
    row: usize,
    cell: &Cell,
) -> Result<Option<i64>, SchemaError> {
    let invalid = |value: String| SchemaError::InvalidIdentifier {
        relation,
        row,
        value,
    };

    match cell {
        Cell::Null => Ok(None),
        Cell::Int(value) => Ok(Some(*value)),
        Cell::Float(value) => integral(*value)
            .map(Some)
            .ok_or_else(|| invalid(value.to_string())),
        Cell::Text(text) => text
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| invalid(text.clone())),
    }
}

fn integral(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64)
        .then_some(value as i64)
}

/// Integer fields outside the join key are soft: anything unparseable is
/// treated as missing.
fn soft_integer(cell: &Cell) -> Option<i64> {
    match cell {
        Cell::Null => None,
        Cell::Int(value) => Some(*value),
        Cell::Float(value) => integral(*value),
        Cell::Text(text) => text.trim().parse().ok(),
    }
}

/// A time column mixing clock text and plain numbers is widened to text, so
/// numeric text is read back as seconds.
fn raw_time(cell: &Cell) -> Option<RawTime> {
    match cell {
        Cell::Null => None,
        Cell::Int(value) => Some(RawTime::Seconds(*value as f64)),
        Cell::Float(value) => Some(RawTime::Seconds(*value)),
        Cell::Text(text) => match text.trim().parse::<f64>() {
            Ok(seconds) if seconds.is_finite() => Some(RawTime::Seconds(seconds)),
            _ => Some(RawTime::Text(text.clone())),
        },
    }
}
