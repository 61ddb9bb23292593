use racelog_parser::RawTime;
use serde::Serialize;

/// One completed race for the tracked athlete.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceRecord {
    pub race_id: i64,
    pub raw_time: Option<RawTime>,
    pub laps: Option<i64>,
    pub rank: Option<i64>,
    pub name: Option<String>,
}

impl RaceRecord {
    pub fn new(race_id: i64) -> Self {
        Self {
            race_id,
            raw_time: None,
            laps: None,
            rank: None,
            name: None,
        }
    }

    pub fn with_time(mut self, raw_time: impl Into<RawTime>) -> Self {
        self.raw_time = Some(raw_time.into());
        self
    }

    pub fn with_laps(mut self, laps: i64) -> Self {
        self.laps = Some(laps);
        self
    }

    pub fn with_rank(mut self, rank: i64) -> Self {
        self.rank = Some(rank);
        self
    }
}

/// One distance/category grouping. `member_ids` is kept in its delimited
/// source form and only parsed when the group is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub length_label: String,
    pub count: Option<i64>,
    pub member_ids: String,
}

impl GroupSummary {
    pub fn new(length_label: impl Into<String>, member_ids: impl Into<String>) -> Self {
        Self {
            length_label: length_label.into(),
            count: None,
            member_ids: member_ids.into(),
        }
    }

    pub fn with_count(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearEntry {
    pub race_id: i64,
    pub year: Option<i32>,
}

/// A race record annotated with its group, canonical time, distance, speed
/// and year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedRaceRecord {
    pub race_id: i64,
    pub raw_time: Option<RawTime>,
    pub laps: Option<i64>,
    pub rank: Option<i64>,
    pub name: Option<String>,
    pub group: Option<String>,
    pub time_seconds: Option<f64>,
    pub distance_m: Option<f64>,
    pub speed_m_s: Option<f64>,
    pub year: Option<i32>,
}

impl DerivedRaceRecord {
    /// Whether the record has anything to plot.
    pub fn is_chartable(&self) -> bool {
        self.time_seconds.is_some() || self.laps.is_some()
    }
}
