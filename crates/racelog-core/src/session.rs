use std::collections::BTreeSet;
use std::path::Path;

use tracing::info;

use crate::config::PipelineConfig;
use crate::derive::{derive, DerivedTable};
use crate::error::Result;
use crate::groups::{self, DistanceBand, GroupParseError, GroupTable};
use crate::reconcile::reconcile;
use crate::shaper::{self, GroupShare, RankPoint, SeriesOrder, SeriesPoint, TableRow};
use crate::source::{self, SourceSnapshot};

/// Everything one session queries: the group table and the derived race
/// table, built once from a static snapshot. Queries borrow the session and
/// return new sequences, so a session can be cloned per consumer.
#[derive(Debug, Clone)]
pub struct Session {
    groups: GroupTable,
    derived: DerivedTable,
}

impl Session {
    /// Reconciles and derives a snapshot. Schema problems fail here, before
    /// any query runs.
    pub fn from_snapshot(snapshot: &SourceSnapshot, config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        let reconciled = reconcile(snapshot)?;
        let groups = GroupTable::new(reconciled.summaries, config.member_delimiter.clone());
        let derived = derive(&reconciled.races, &reconciled.years, &groups);

        info!(
            races = derived.len(),
            groups = groups.summaries().len(),
            rejected_groups = derived.rejected_groups().len(),
            "Session loaded"
        );

        Ok(Self { groups, derived })
    }

    pub fn load_csv_dir(dir: &Path, config: &PipelineConfig) -> Result<Self> {
        let snapshot = source::load_csv_dir(dir, &config.files)?;
        Self::from_snapshot(&snapshot, config)
    }

    #[cfg(feature = "runtime")]
    pub async fn load_sqlite(database_url: &str, config: &PipelineConfig) -> Result<Self> {
        let pool = crate::db::connect(database_url).await?;
        let snapshot = crate::db::load_snapshot(&pool, &config.tables).await?;
        pool.close().await;
        Self::from_snapshot(&snapshot, config)
    }

    pub fn derived(&self) -> &DerivedTable {
        &self.derived
    }

    pub fn groups(&self) -> &GroupTable {
        &self.groups
    }

    pub fn group_labels(&self) -> Vec<String> {
        self.groups.labels().map(str::to_string).collect()
    }

    pub fn resolve_group(&self, label: &str) -> std::result::Result<BTreeSet<i64>, GroupParseError> {
        groups::resolve_group(label, &self.groups)
    }

    pub fn groups_in_band(&self, band: DistanceBand) -> Vec<String> {
        groups::groups_in_band(&self.groups, band)
    }

    pub fn series_for_group(
        &self,
        label: &str,
        order: SeriesOrder,
        limit: Option<usize>,
    ) -> std::result::Result<Vec<SeriesPoint>, GroupParseError> {
        shaper::series_for_group(&self.derived, &self.groups, label, order, limit)
    }

    pub fn table_for_group(
        &self,
        label: &str,
    ) -> std::result::Result<Vec<TableRow>, GroupParseError> {
        shaper::table_for_group(&self.derived, &self.groups, label)
    }

    pub fn top_n_by_id(&self, n: usize) -> Vec<RankPoint> {
        shaper::top_n_by_id(&self.derived, n)
    }

    pub fn rank_history(&self) -> Vec<RankPoint> {
        shaper::rank_history(&self.derived)
    }

    pub fn group_shares(&self) -> Vec<GroupShare> {
        shaper::group_shares(&self.groups)
    }
}
