pub mod config;
#[cfg(feature = "runtime")]
pub mod db;
pub mod derive;
pub mod error;
pub mod groups;
pub mod outputs;
pub mod reconcile;
pub mod session;
pub mod shaper;
pub mod source;
pub mod types;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use groups::{DistanceBand, GroupParseError, GroupTable};
pub use reconcile::SchemaError;
pub use session::Session;
pub use shaper::{DisplayValue, GroupShare, PlotValue, RankPoint, SeriesOrder, SeriesPoint, TableRow};
pub use types::{DerivedRaceRecord, GroupSummary, RaceRecord, YearEntry};
