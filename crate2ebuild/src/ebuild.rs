//! Ebuild generation and update
//!
//! Ties together crate fetching, license aggregation and the two ways
//! of producing ebuild text: a fresh file from the template, or an
//! update of the generated regions of an existing one.

use std::path::Path;

use chrono::{Datelike, Utc};
use crate2ebuild_license::{CrateLicenses, LicenseMapping};
use crate2ebuild_meta::{metadata::sorted_file_crates, Crate, CrateFetcher, PackageMetadata};
use tracing::info;

use crate::{patch::patch_ebuild, template::EbuildTemplate, Result};

/// Settings shared by generation and update.
#[derive(Debug, Clone)]
pub struct EbuildOptions {
    /// Whether to compute the dependent crate license addendum
    pub crate_license: bool,
    pub mapping: LicenseMapping,
}

impl Default for EbuildOptions {
    fn default() -> Self {
        Self {
            crate_license: true,
            mapping: LicenseMapping::builtin(),
        }
    }
}

/// Fetch and verify every registry crate and compute the rendered
/// `LICENSE+=` value, or `None` when crate licenses are disabled.
fn crate_licenses(
    meta: &PackageMetadata,
    crates: &[Crate],
    distdir: &Path,
    options: &EbuildOptions,
) -> Result<Option<String>> {
    let fetcher = CrateFetcher::new(distdir)?;
    if !options.crate_license {
        for krate in sorted_file_crates(crates) {
            fetcher.fetch(krate)?;
        }
        return Ok(None);
    }

    let licenses = fetcher.collect_licenses(crates)?;
    let aggregated =
        CrateLicenses::aggregate(&options.mapping, meta.license.as_deref(), &licenses)?;
    info!(
        "Collected licenses of {} crates",
        crates.iter().filter(|c| c.as_file().is_some()).count()
    );
    Ok(Some(aggregated.render()))
}

/// Generate a new ebuild.
pub fn get_ebuild(
    meta: &PackageMetadata,
    crates: &[Crate],
    distdir: &Path,
    options: &EbuildOptions,
) -> Result<String> {
    let license = match &meta.license {
        Some(license) => options.mapping.render(&options.mapping.parse(license, true)?),
        None => String::new(),
    };
    let crate_licenses = crate_licenses(meta, crates, distdir, options)?;

    let template = EbuildTemplate {
        year: Utc::now().year(),
        meta,
        crates,
        license,
        crate_licenses,
    };
    Ok(template.render())
}

/// Update the generated parts of an existing ebuild.
///
/// See [`patch_ebuild`] for which parts are touched.
pub fn update_ebuild(
    existing: &str,
    meta: &PackageMetadata,
    crates: &[Crate],
    distdir: &Path,
    options: &EbuildOptions,
) -> Result<String> {
    let crate_licenses = crate_licenses(meta, crates, distdir, options)?;
    patch_ebuild(existing, crates, crate_licenses.as_deref())
}
