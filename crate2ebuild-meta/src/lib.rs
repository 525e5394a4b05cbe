//! crate2ebuild-meta: Cargo metadata for ebuild generation
//!
//! This crate provides:
//! - The package and dependency crate model
//! - `Cargo.toml` and `Cargo.lock` reading
//! - Crate archive download into a distfiles cache
//! - SHA-256 verification of downloaded archives
//! - Extraction of the license declared by each dependency crate

pub mod checksum;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod metadata;

pub use error::{Error, Result};
pub use fetch::{CrateFetcher, DeclaredLicense};
pub use manifest::{read_cargo_lock, read_cargo_toml};
pub use metadata::{Crate, FileCrate, GitCrate, PackageMetadata};
