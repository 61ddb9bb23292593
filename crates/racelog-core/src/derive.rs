use std::collections::{HashMap, HashSet};

use racelog_parser::parse_time;
use tracing::{debug, warn};

use crate::groups::{distance_from_label, GroupParseError, GroupTable};
use crate::types::{DerivedRaceRecord, RaceRecord, YearEntry};

/// The session's joined and derived race table, ascending by `race_id`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DerivedTable {
    rows: Vec<DerivedRaceRecord>,
    rejected_groups: Vec<GroupParseError>,
}

impl DerivedTable {
    pub fn rows(&self) -> &[DerivedRaceRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, race_id: i64) -> Option<&DerivedRaceRecord> {
        self.rows
            .binary_search_by_key(&race_id, |row| row.race_id)
            .ok()
            .map(|idx| &self.rows[idx])
    }

    /// Groups whose member list could not be parsed; their races carry no
    /// group or distance.
    pub fn rejected_groups(&self) -> &[GroupParseError] {
        &self.rejected_groups
    }
}

#[derive(Debug)]
struct Membership<'a> {
    label: &'a str,
    distance_m: Option<f64>,
}

/// Joins years, attaches group distances, parses times, and computes speed.
///
/// A race listed by more than one group keeps the first group in summary
/// order. Member ids with no matching race are ignored.
pub fn derive(records: &[RaceRecord], years: &[YearEntry], groups: &GroupTable) -> DerivedTable {
    let year_by_id: HashMap<i64, Option<i32>> = years
        .iter()
        .map(|entry| (entry.race_id, entry.year))
        .collect();
    let known_ids: HashSet<i64> = records.iter().map(|record| record.race_id).collect();

    let mut membership: HashMap<i64, Membership<'_>> = HashMap::new();
    let mut rejected_groups = Vec::new();

    for summary in groups.summaries() {
        let members = match groups.members_of(summary) {
            Ok(members) => members,
            Err(err) => {
                warn!(label = %summary.length_label, error = %err, "Rejecting group with corrupt member list");
                rejected_groups.push(err);
                continue;
            }
        };

        let distance_m = distance_from_label(&summary.length_label);
        let mut dangling = 0usize;
        for race_id in members {
            if !known_ids.contains(&race_id) {
                dangling += 1;
                continue;
            }
            match membership.get(&race_id) {
                Some(existing) if existing.label != summary.length_label => {
                    warn!(
                        race_id,
                        kept = existing.label,
                        ignored = %summary.length_label,
                        "Race listed by more than one group"
                    );
                }
                Some(_) => {}
                None => {
                    membership.insert(
                        race_id,
                        Membership {
                            label: &summary.length_label,
                            distance_m,
                        },
                    );
                }
            }
        }

        if dangling > 0 {
            warn!(label = %summary.length_label, dangling, "Group lists races missing from the race table");
        }
    }

    let mut rows: Vec<DerivedRaceRecord> = records
        .iter()
        .map(|record| {
            let member = membership.get(&record.race_id);
            let distance_m = member.and_then(|m| m.distance_m);
            let time_seconds = record.raw_time.as_ref().and_then(parse_time);

            DerivedRaceRecord {
                race_id: record.race_id,
                raw_time: record.raw_time.clone(),
                laps: record.laps,
                rank: record.rank,
                name: record.name.clone(),
                group: member.map(|m| m.label.to_string()),
                time_seconds,
                distance_m,
                speed_m_s: speed(distance_m, time_seconds),
                year: year_by_id.get(&record.race_id).copied().flatten(),
            }
        })
        .collect();
    rows.sort_by_key(|row| row.race_id);

    debug!(
        rows = rows.len(),
        grouped = membership.len(),
        rejected = rejected_groups.len(),
        "Derived race table"
    );

    DerivedTable {
        rows,
        rejected_groups,
    }
}

/// Meters per second, only for a positive finite distance over a positive
/// finite time.
pub fn speed(distance_m: Option<f64>, time_seconds: Option<f64>) -> Option<f64> {
    match (distance_m, time_seconds) {
        (Some(distance), Some(time))
            if distance.is_finite() && distance > 0.0 && time.is_finite() && time > 0.0 =>
        {
            Some(distance / time)
        }
        _ => None,
    }
}
