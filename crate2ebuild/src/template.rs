//! Fresh ebuild rendering

use crate2ebuild_meta::{
    metadata::{sorted_file_crates, sorted_git_crates},
    Crate, PackageMetadata,
};

use crate::escape::{bash_dquote_escape, collapse_whitespace, url_dquote_escape};

pub(crate) const EAPI: &str = "8";
pub(crate) const KEYWORDS: &str = "~amd64";
pub(crate) const CRATE_LICENSE_COMMENT: &str = "# Dependent crate licenses";

/// `CRATES` assignment listing every registry crate, without a trailing
/// newline. An empty list renders as `CRATES=""`.
pub fn crates_assignment(crates: &[Crate]) -> String {
    let file_crates = sorted_file_crates(crates);
    if file_crates.is_empty() {
        return "CRATES=\"\"".to_string();
    }

    let mut out = String::from("CRATES=\"\n");
    for krate in file_crates {
        out.push_str(&format!("\t{}@{}\n", krate.name, krate.version));
    }
    out.push('"');
    out
}

/// `GIT_CRATES` associative array, without a trailing newline. `None`
/// when there are no git crates.
pub fn git_crates_block(crates: &[Crate]) -> Option<String> {
    let git_crates = sorted_git_crates(crates);
    if git_crates.is_empty() {
        return None;
    }

    let mut out = String::from("declare -A GIT_CRATES=(\n");
    for krate in git_crates {
        out.push_str(&format!("\t[{}]='{}'\n", krate.name, krate.git_crates_value()));
    }
    out.push(')');
    Some(out)
}

/// Inputs of a freshly generated ebuild.
pub struct EbuildTemplate<'a> {
    pub year: i32,
    pub meta: &'a PackageMetadata,
    pub crates: &'a [Crate],
    /// Rendered value of `LICENSE=`
    pub license: String,
    /// Rendered value of `LICENSE+=`; `None` leaves the addendum out
    pub crate_licenses: Option<String>,
}

impl EbuildTemplate<'_> {
    pub fn render(&self) -> String {
        let mut out = format!(
            "# Copyright {} Gentoo Authors\n\
             # Distributed under the terms of the GNU General Public License v2\n\
             \n\
             # Autogenerated by crate2ebuild {}\n\
             \n\
             EAPI={}\n\
             \n\
             {}\n\
             \n",
            self.year,
            env!("CARGO_PKG_VERSION"),
            EAPI,
            crates_assignment(self.crates),
        );

        if let Some(block) = git_crates_block(self.crates) {
            out.push_str(&block);
            out.push_str("\n\n");
        }

        let description = self
            .meta
            .description
            .as_deref()
            .map(|d| bash_dquote_escape(&collapse_whitespace(d)))
            .unwrap_or_default();
        let homepage = self
            .meta
            .homepage
            .as_deref()
            .map(url_dquote_escape)
            .unwrap_or_default();

        out.push_str(&format!(
            "inherit cargo\n\
             \n\
             DESCRIPTION=\"{}\"\n\
             HOMEPAGE=\"{}\"\n\
             SRC_URI=\"\n\
             \t${{CARGO_CRATE_URIS}}\n\
             \"\n\
             \n\
             LICENSE=\"{}\"\n",
            description, homepage, self.license,
        ));

        if let Some(crate_licenses) = &self.crate_licenses {
            out.push_str(CRATE_LICENSE_COMMENT);
            out.push('\n');
            out.push_str(&format!("LICENSE+=\"{}\"\n", crate_licenses));
        }

        out.push_str(&format!("SLOT=\"0\"\nKEYWORDS=\"{}\"\n", KEYWORDS));
        out
    }
}
