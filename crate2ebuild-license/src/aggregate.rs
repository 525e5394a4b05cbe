//! Dependency license aggregation
//!
//! Combines the licenses of all dependency crates into the expression
//! that goes into the `LICENSE+=` addendum of an ebuild.

use std::collections::BTreeSet;

use tracing::debug;

use crate::{mapping::render_ebuild, LicenseExpr, LicenseMapping, Result};

/// Simplified conjunction of dependency licenses, in ebuild license names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrateLicenses {
    expr: Option<LicenseExpr>,
}

impl CrateLicenses {
    /// Combine dependency licenses.
    ///
    /// `licenses` are SPDX strings already converted from the legacy
    /// `A/B` notation. Any of them textually equal to `primary` is dropped
    /// before parsing; the rest are parsed strictly against `mapping`,
    /// translated to ebuild names, joined with AND and simplified.
    pub fn aggregate<I, S>(
        mapping: &LicenseMapping,
        primary: Option<&str>,
        licenses: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: BTreeSet<String> = licenses
            .into_iter()
            .map(|l| l.as_ref().trim().to_string())
            .collect();
        if let Some(primary) = primary {
            unique.remove(primary.trim());
        }

        let terms = unique
            .iter()
            .map(|license| -> Result<LicenseExpr> {
                Ok(mapping.to_ebuild(mapping.parse(license, true)?))
            })
            .collect::<Result<Vec<_>>>()?;
        debug!("Aggregating {} distinct crate licenses", terms.len());

        let expr = if terms.is_empty() {
            None
        } else {
            Some(LicenseExpr::And(terms).simplify())
        };
        Ok(Self { expr })
    }

    pub fn expr(&self) -> Option<&LicenseExpr> {
        self.expr.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.expr.is_none()
    }

    /// Text between the quotes of `LICENSE+="…"`.
    pub fn render(&self) -> String {
        render_addendum(self.expr())
    }
}

/// Render the crate license addendum value.
///
/// Nothing renders as an empty string and a single term as ` TERM`. A
/// top-level AND puts every operand on its own tab-indented line with a
/// trailing newline before the closing quote.
pub fn render_addendum(expr: Option<&LicenseExpr>) -> String {
    match expr {
        None => String::new(),
        Some(LicenseExpr::And(children)) => {
            let mut out = String::from("\n");
            for child in children {
                out.push('\t');
                out.push_str(&render_ebuild(child));
                out.push('\n');
            }
            out
        }
        Some(expr) => format!(" {}", render_ebuild(expr)),
    }
}
