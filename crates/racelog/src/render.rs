use std::fmt::Display;

use anyhow::Result;
use comfy_table::Table;
use racelog_core::{GroupShare, PlotValue, RankPoint, SeriesPoint, TableRow};
use serde::Serialize;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn shares_table(shares: &[GroupShare]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Group", "Races", "Share"]);
    for share in shares {
        table.add_row(vec![
            share.label.clone(),
            share.count.to_string(),
            cell(share.share.map(|share| format!("{:.1}%", share * 100.0))),
        ]);
    }
    table
}

pub fn series_table(points: &[SeriesPoint]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "Race", "Year", "Value"]);
    for point in points {
        let value = match point.value {
            PlotValue::Time { seconds } => format!("{seconds:.2} s"),
            PlotValue::Laps { laps } => format!("{laps} laps"),
        };
        table.add_row(vec![
            point.sequence.to_string(),
            point.race_id.to_string(),
            cell(point.year),
            value,
        ]);
    }
    table
}

pub fn listing_table(rows: &[TableRow]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Race", "Year", "Name", "Rank", "Result", "Speed (m/s)"]);
    for row in rows {
        table.add_row(vec![
            row.race_id.to_string(),
            cell(row.year),
            cell(row.name.as_deref()),
            cell(row.rank),
            cell(row.display.as_ref()),
            cell(row.speed_m_s.map(|speed| format!("{speed:.3}"))),
        ]);
    }
    table
}

pub fn rank_table(points: &[RankPoint]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "Race", "Year", "Rank", "Name"]);
    for point in points {
        table.add_row(vec![
            point.sequence.to_string(),
            point.race_id.to_string(),
            cell(point.year),
            cell(point.rank),
            cell(point.name.as_deref()),
        ]);
    }
    table
}

fn cell<T: Display>(value: Option<T>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}
