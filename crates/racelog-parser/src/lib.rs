pub mod errors;
pub mod model;
mod table;
pub mod time;

pub use errors::ParserError;
pub use model::{Cell, Relation};
pub use table::{cells_from_column, frame_from_cells, parse_csv_relation};
pub use time::{format_seconds, parse_time, parse_time_text, RawTime};
