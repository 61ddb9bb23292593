use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::GroupSummary;

pub const DEFAULT_MEMBER_DELIMITER: &str = ",";

const METERS_PER_KILOMETER: f64 = 1000.0;
const SHORT_CEILING_M: f64 = 10_000.0;
// Labels round the half marathon down to 21 km and the marathon up to 42.2 km.
const LONG_FLOOR_M: f64 = 21_000.0;
const ULTRA_FLOOR_M: f64 = 42_500.0;

/// A group summary row whose member list contains a token that is not a race id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("group '{label}' member list has non-numeric token '{token}' at position {position}")]
pub struct GroupParseError {
    pub label: String,
    pub token: String,
    pub position: usize,
}

/// Group summaries plus the delimiter their member lists are encoded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTable {
    summaries: Vec<GroupSummary>,
    delimiter: String,
}

impl GroupTable {
    pub fn new(summaries: Vec<GroupSummary>, delimiter: impl Into<String>) -> Self {
        Self {
            summaries,
            delimiter: delimiter.into(),
        }
    }

    pub fn summaries(&self) -> &[GroupSummary] {
        &self.summaries
    }

    pub fn get(&self, label: &str) -> Option<&GroupSummary> {
        self.summaries
            .iter()
            .find(|summary| summary.length_label == label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.summaries
            .iter()
            .map(|summary| summary.length_label.as_str())
    }

    /// Member ids of one summary row, in declared order.
    pub fn members_of(&self, summary: &GroupSummary) -> Result<Vec<i64>, GroupParseError> {
        parse_member_ids(&summary.length_label, &summary.member_ids, &self.delimiter)
    }
}

/// Resolves a group label to its member race ids. A label with no summary
/// row resolves to the empty set, the same as a group with no members.
pub fn resolve_group(label: &str, groups: &GroupTable) -> Result<BTreeSet<i64>, GroupParseError> {
    match groups.get(label) {
        Some(summary) => Ok(groups.members_of(summary)?.into_iter().collect()),
        None => Ok(BTreeSet::new()),
    }
}

/// Splits a delimited id list. Tokens are trimmed, so `"74, 808"` parses with
/// a `,` delimiter. A blank list has no members; a blank token inside a
/// non-blank list is malformed.
pub fn parse_member_ids(
    label: &str,
    member_ids: &str,
    delimiter: &str,
) -> Result<Vec<i64>, GroupParseError> {
    if member_ids.trim().is_empty() {
        return Ok(Vec::new());
    }

    member_ids
        .split(delimiter)
        .enumerate()
        .map(|(position, token)| {
            token.trim().parse::<i64>().map_err(|_| GroupParseError {
                label: label.to_string(),
                token: token.trim().to_string(),
                position,
            })
        })
        .collect()
}

/// Distance in meters from a label's leading numeric token, read as
/// kilometers. Category labels such as `Backyard` have no distance.
pub fn distance_from_label(label: &str) -> Option<f64> {
    let trimmed = label.trim_start();
    let mut end = 0;
    let mut seen_point = false;
    for (idx, ch) in trimmed.char_indices() {
        if ch.is_ascii_digit() {
            end = idx + 1;
        } else if ch == '.' && !seen_point && end == idx && idx > 0 {
            seen_point = true;
        } else {
            break;
        }
    }

    let kilometers: f64 = trimmed[..end].parse().ok()?;
    let meters = kilometers * METERS_PER_KILOMETER;
    (meters.is_finite() && meters > 0.0).then_some(meters)
}

/// Closed set of distance ranges a caller may narrow group listings to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceBand {
    #[default]
    All,
    Short,
    Middle,
    Long,
    Ultra,
}

impl DistanceBand {
    pub const ALL_BANDS: [DistanceBand; 5] = [
        DistanceBand::All,
        DistanceBand::Short,
        DistanceBand::Middle,
        DistanceBand::Long,
        DistanceBand::Ultra,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceBand::All => "all",
            DistanceBand::Short => "short",
            DistanceBand::Middle => "middle",
            DistanceBand::Long => "long",
            DistanceBand::Ultra => "ultra",
        }
    }

    /// `All` admits everything, including category groups without a
    /// distance; every other band requires one.
    pub fn contains(&self, distance_m: Option<f64>) -> bool {
        let Some(distance) = distance_m else {
            return matches!(self, DistanceBand::All);
        };
        match self {
            DistanceBand::All => true,
            DistanceBand::Short => distance < SHORT_CEILING_M,
            DistanceBand::Middle => (SHORT_CEILING_M..LONG_FLOOR_M).contains(&distance),
            DistanceBand::Long => (LONG_FLOOR_M..ULTRA_FLOOR_M).contains(&distance),
            DistanceBand::Ultra => distance >= ULTRA_FLOOR_M,
        }
    }
}

impl fmt::Display for DistanceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown distance band '{0}' (expected one of: all, short, middle, long, ultra)")]
pub struct UnknownBand(pub String);

impl FromStr for DistanceBand {
    type Err = UnknownBand;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lowered = value.trim().to_ascii_lowercase();
        DistanceBand::ALL_BANDS
            .into_iter()
            .find(|band| band.as_str() == lowered)
            .ok_or_else(|| UnknownBand(value.trim().to_string()))
    }
}

/// Labels of groups whose distance falls in `band`, in summary order.
pub fn groups_in_band(groups: &GroupTable, band: DistanceBand) -> Vec<String> {
    groups
        .labels()
        .filter(|label| band.contains(distance_from_label(label)))
        .map(str::to_string)
        .collect()
}
