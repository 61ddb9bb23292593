use std::fmt;

use serde::{Deserialize, Serialize};

/// The three logical tables a race snapshot is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    RaceRecords,
    GroupSummary,
    YearLookup,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::RaceRecords => "race_records",
            Relation::GroupSummary => "group_summary",
            Relation::YearLookup => "year_lookup",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single loosely-typed value as it arrives from a backing store.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Infers the narrowest cell for a textual field. Blank and `nan`/`null`
    /// markers become [`Cell::Null`].
    pub fn infer(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("nan")
            || trimmed.eq_ignore_ascii_case("null")
        {
            return Cell::Null;
        }
        if let Ok(parsed) = trimmed.parse::<i64>() {
            return Cell::Int(parsed);
        }
        match trimmed.parse::<f64>() {
            Ok(parsed) if parsed.is_finite() => Cell::Float(parsed),
            _ => Cell::Text(trimmed.to_string()),
        }
    }

    pub fn to_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Int(value) => Some(value.to_string()),
            Cell::Float(value) => Some(value.to_string()),
            Cell::Text(value) => Some(value.clone()),
        }
    }
}
