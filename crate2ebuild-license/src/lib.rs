//! crate2ebuild-license: SPDX license handling for generated ebuilds
//!
//! This crate provides:
//! - Conversion of the legacy Cargo `A/B` notation to SPDX `A OR B`
//! - SPDX expression parsing (via the `spdx` crate) with optional strict validation
//! - Boolean simplification of license trees
//! - Rendering into the ebuild `LICENSE` dialect via a license mapping
//! - Aggregation of dependency licenses into the crate license addendum

pub mod aggregate;
pub mod dialect;
pub mod error;
pub mod expr;
pub mod mapping;
pub mod parser;

pub use aggregate::{render_addendum, CrateLicenses};
pub use dialect::to_standard_dialect;
pub use error::{Error, Result};
pub use expr::LicenseExpr;
pub use mapping::{render_ebuild, LicenseMapping};
pub use parser::parse;
