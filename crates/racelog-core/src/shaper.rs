//! Read-only projections of the derived table for charts and listings.
//! Every function returns a fresh sequence; the derived table is never
//! modified.

use std::fmt;

use racelog_parser::format_seconds;
use serde::Serialize;

use crate::derive::DerivedTable;
use crate::groups::{resolve_group, GroupParseError, GroupTable};
use crate::types::DerivedRaceRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesOrder {
    /// Chronological, oldest race first.
    #[default]
    Ascending,
    /// Most recent race first.
    Descending,
}

/// The plotted quantity of a series point: time when the race has one,
/// otherwise laps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PlotValue {
    Time { seconds: f64 },
    Laps { laps: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// 1-based position in the requested order.
    pub sequence: usize,
    pub race_id: i64,
    pub value: PlotValue,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum DisplayValue {
    Time(String),
    Laps(i64),
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Time(time) => f.write_str(time),
            DisplayValue::Laps(laps) => write!(f, "{laps} laps"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub race_id: i64,
    pub year: Option<i32>,
    pub name: Option<String>,
    pub rank: Option<i64>,
    pub display: Option<DisplayValue>,
    pub time_seconds: Option<f64>,
    pub laps: Option<i64>,
    pub distance_m: Option<f64>,
    pub speed_m_s: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankPoint {
    /// 1-based position, ascending by race id.
    pub sequence: usize,
    pub race_id: i64,
    pub rank: Option<i64>,
    pub year: Option<i32>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupShare {
    pub label: String,
    pub count: i64,
    /// Fraction of all counted races; absent when nothing is counted.
    pub share: Option<f64>,
}

/// Chartable rows of one group ordered by race id. With `limit`, only the
/// `limit` most recent chartable rows are kept before ordering.
pub fn series_for_group(
    table: &DerivedTable,
    groups: &GroupTable,
    label: &str,
    order: SeriesOrder,
    limit: Option<usize>,
) -> Result<Vec<SeriesPoint>, GroupParseError> {
    let mut rows: Vec<&DerivedRaceRecord> = group_rows(table, groups, label)?
        .into_iter()
        .filter(|row| row.is_chartable())
        .collect();

    if let Some(limit) = limit {
        let skip = rows.len().saturating_sub(limit);
        rows.drain(..skip);
    }
    if order == SeriesOrder::Descending {
        rows.reverse();
    }

    Ok(rows
        .into_iter()
        .enumerate()
        .filter_map(|(idx, row)| {
            let value = match (row.time_seconds, row.laps) {
                (Some(seconds), _) => PlotValue::Time { seconds },
                (None, Some(laps)) => PlotValue::Laps { laps },
                (None, None) => return None,
            };
            Some(SeriesPoint {
                sequence: idx + 1,
                race_id: row.race_id,
                value,
                year: row.year,
            })
        })
        .collect())
}

/// Every member row of one group, most recent first, with time rendered for
/// display and laps substituted where there is no time.
pub fn table_for_group(
    table: &DerivedTable,
    groups: &GroupTable,
    label: &str,
) -> Result<Vec<TableRow>, GroupParseError> {
    Ok(group_rows(table, groups, label)?
        .into_iter()
        .rev()
        .map(|row| TableRow {
            race_id: row.race_id,
            year: row.year,
            name: row.name.clone(),
            rank: row.rank,
            display: display_value(row),
            time_seconds: row.time_seconds,
            laps: row.laps,
            distance_m: row.distance_m,
            speed_m_s: row.speed_m_s,
        })
        .collect())
}

/// The `n` most recent races across all groups, ascending by race id.
pub fn top_n_by_id(table: &DerivedTable, n: usize) -> Vec<RankPoint> {
    let rows = table.rows();
    let start = rows.len().saturating_sub(n);
    rank_points(&rows[start..])
}

/// Every race with a numeric rank, ascending by race id.
pub fn rank_history(table: &DerivedTable) -> Vec<RankPoint> {
    rank_points(table.rows().iter().filter(|row| row.rank.is_some()))
}

/// Informational race counts per group with each group's share of the total.
pub fn group_shares(groups: &GroupTable) -> Vec<GroupShare> {
    let total: i64 = groups
        .summaries()
        .iter()
        .filter_map(|summary| summary.count)
        .filter(|count| *count > 0)
        .sum();

    groups
        .summaries()
        .iter()
        .map(|summary| {
            let count = summary.count.unwrap_or(0).max(0);
            GroupShare {
                label: summary.length_label.clone(),
                count,
                share: (total > 0).then(|| count as f64 / total as f64),
            }
        })
        .collect()
}

fn group_rows<'a>(
    table: &'a DerivedTable,
    groups: &GroupTable,
    label: &str,
) -> Result<Vec<&'a DerivedRaceRecord>, GroupParseError> {
    let members = resolve_group(label, groups)?;
    // A race listed by several groups belongs to the first one only.
    Ok(table
        .rows()
        .iter()
        .filter(|row| members.contains(&row.race_id) && row.group.as_deref() == Some(label))
        .collect())
}

fn display_value(row: &DerivedRaceRecord) -> Option<DisplayValue> {
    format_seconds(row.time_seconds)
        .map(DisplayValue::Time)
        .or(row.laps.map(DisplayValue::Laps))
}

fn rank_points<'a>(rows: impl IntoIterator<Item = &'a DerivedRaceRecord>) -> Vec<RankPoint> {
    rows.into_iter()
        .enumerate()
        .map(|(idx, row)| RankPoint {
            sequence: idx + 1,
            race_id: row.race_id,
            rank: row.rank,
            year: row.year,
            name: row.name.clone(),
        })
        .collect()
}
