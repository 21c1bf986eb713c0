//! Error types for Solscope Core

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CoreError {
    #[error("Parse error: {0}")]
    Parse(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
