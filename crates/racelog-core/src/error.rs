use thiserror::Error;

use crate::config::ConfigError;
use crate::groups::GroupParseError;
use crate::outputs::OutputError;
use crate::reconcile::SchemaError;
use crate::source::LoadError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Snapshot load failed: {0}")]
    Load(#[from] LoadError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Group parse error: {0}")]
    GroupParse(#[from] GroupParseError),

    #[error("Output failed: {0}")]
    Output(#[from] OutputError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
