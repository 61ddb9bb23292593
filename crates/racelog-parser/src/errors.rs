use polars::prelude::PolarsError;
use thiserror::Error;

use crate::model::Relation;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("{relation} CSV error: {source}")]
    Csv {
        relation: Relation,
        #[source]
        source: csv::Error,
    },

    #[error("{relation} file did not contain a header row")]
    MissingHeader { relation: Relation },

    #[error("{relation} header repeats column '{column}'")]
    DuplicateColumn { relation: Relation, column: String },

    #[error("{relation} row {line_index} has {found} fields, expected {expected}")]
    RaggedRow {
        relation: Relation,
        line_index: usize,
        expected: usize,
        found: usize,
    },

    #[error("{relation} dataframe could not be assembled: {source}")]
    Frame {
        relation: Relation,
        #[source]
        source: PolarsError,
    },
}
