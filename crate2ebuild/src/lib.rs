//! crate2ebuild: Gentoo ebuilds for Rust packages
//!
//! This crate provides:
//! - Fresh ebuild generation from Cargo metadata
//! - In-place update of the generated parts of an existing ebuild
//! - Escaping of metadata values for bash double-quoted strings

pub mod ebuild;
pub mod error;
pub mod escape;
pub mod patch;
pub mod template;

pub use ebuild::{get_ebuild, update_ebuild, EbuildOptions};
pub use error::{Error, Result};
pub use patch::{patch_ebuild, RegionKind};
pub use template::EbuildTemplate;
