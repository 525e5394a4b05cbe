use std::path::PathBuf;

use thiserror::Error;

use crate::patch::RegionKind;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed ebuild: no {0} found")]
    MissingRegion(RegionKind),

    #[error("Malformed ebuild: {kind} found more than once (lines {lines:?})")]
    DuplicateRegion { kind: RegionKind, lines: Vec<usize> },

    #[error("Malformed ebuild: {kind} starting at line {line} is never closed")]
    UnterminatedRegion { kind: RegionKind, line: usize },

    #[error("Malformed ebuild: {0}")]
    MalformedRegion(String),

    #[error("Malformed ebuild: no 'inherit cargo' line to place GIT_CRATES before")]
    MissingAnchor,

    #[error("{0} already exists, use --force to overwrite")]
    OutputExists(PathBuf),

    #[error(transparent)]
    License(#[from] crate2ebuild_license::Error),

    #[error(transparent)]
    Meta(#[from] crate2ebuild_meta::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write {0}: {1}")]
    Persist(PathBuf, #[source] tempfile::PersistError),
}

pub type Result<T> = std::result::Result<T, Error>;
