use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid license expression: {0}")]
    Syntax(#[source] spdx::ParseError),

    #[error("Empty license expression")]
    EmptyExpression,

    #[error("Unknown license '{license}' in expression '{expr}'")]
    UnknownLicense { expr: String, license: String },

    #[error("Invalid license mapping {path}:{line}: {message}")]
    MappingSyntax {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
