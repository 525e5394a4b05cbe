//! SPDX to ebuild license mapping
//!
//! Gentoo keeps the table in `metadata/license-mapping.conf`:
//!
//! ```text
//! [spdx-to-ebuild]
//! BSD-3-Clause = BSD
//! Zlib = ZLIB
//! ```
//!
//! A built-in table covering the licenses common on crates.io is used
//! when no repository copy is available.

use std::{collections::HashMap, fs, path::Path};

use tracing::debug;

use crate::{parser, Error, LicenseExpr, Result};

const SPDX_SECTION: &str = "spdx-to-ebuild";

const BUILTIN: &[(&str, &str)] = &[
    ("0BSD", "0BSD"),
    ("AGPL-3.0", "AGPL-3"),
    ("AGPL-3.0-only", "AGPL-3"),
    ("AGPL-3.0-or-later", "AGPL-3+"),
    ("Apache-2.0", "Apache-2.0"),
    ("Apache-2.0 WITH LLVM-exception", "Apache-2.0-with-LLVM-exceptions"),
    ("Artistic-2.0", "Artistic-2"),
    ("BSD-1-Clause", "BSD-1"),
    ("BSD-2-Clause", "BSD-2"),
    ("BSD-3-Clause", "BSD"),
    ("BSD-4-Clause", "BSD-4"),
    ("BSL-1.0", "Boost-1.0"),
    ("CC-BY-4.0", "CC-BY-4.0"),
    ("CC0-1.0", "CC0-1.0"),
    ("CDLA-Permissive-2.0", "CDLA-Permissive-2.0"),
    ("GPL-2.0", "GPL-2"),
    ("GPL-2.0+", "GPL-2+"),
    ("GPL-2.0-only", "GPL-2"),
    ("GPL-2.0-or-later", "GPL-2+"),
    ("GPL-3.0", "GPL-3"),
    ("GPL-3.0+", "GPL-3+"),
    ("GPL-3.0-only", "GPL-3"),
    ("GPL-3.0-or-later", "GPL-3+"),
    ("ISC", "ISC"),
    ("LGPL-2.0", "LGPL-2"),
    ("LGPL-2.1", "LGPL-2.1"),
    ("LGPL-2.1+", "LGPL-2.1+"),
    ("LGPL-2.1-only", "LGPL-2.1"),
    ("LGPL-2.1-or-later", "LGPL-2.1+"),
    ("LGPL-3.0", "LGPL-3"),
    ("LGPL-3.0-only", "LGPL-3"),
    ("LGPL-3.0-or-later", "LGPL-3+"),
    ("MIT", "MIT"),
    ("MIT-0", "MIT-0"),
    ("MPL-2.0", "MPL-2.0"),
    ("NCSA", "UoI-NCSA"),
    ("OpenSSL", "openssl"),
    ("Unicode-3.0", "Unicode-3.0"),
    ("Unicode-DFS-2016", "Unicode-DFS-2016"),
    ("Unlicense", "Unlicense"),
    ("WTFPL", "WTFPL-2"),
    ("Zlib", "ZLIB"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    spdx: String,
    ebuild: String,
}

/// Case-insensitive table from SPDX identifiers to ebuild license names.
#[derive(Debug, Clone)]
pub struct LicenseMapping {
    entries: HashMap<String, Entry>,
}

fn normalize_key(key: &str) -> String {
    key.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl Default for LicenseMapping {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LicenseMapping {
    /// An empty mapping; useful only together with [`LicenseMapping::insert`].
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// The built-in table.
    pub fn builtin() -> Self {
        let mut mapping = Self::empty();
        for (spdx, ebuild) in BUILTIN {
            mapping.insert(spdx, ebuild);
        }
        mapping
    }

    pub fn insert(&mut self, spdx: &str, ebuild: &str) {
        let spdx = spdx.split_whitespace().collect::<Vec<_>>().join(" ");
        self.entries.insert(
            normalize_key(&spdx),
            Entry {
                spdx,
                ebuild: ebuild.to_string(),
            },
        );
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    /// Load a `license-mapping.conf` file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mapping = Self::from_conf(&content, path)?;
        debug!("Loaded {} license mappings from {}", mapping.len(), path.display());
        Ok(mapping)
    }

    /// Parse `license-mapping.conf` content. `path` is only used in errors.
    pub fn from_conf(content: &str, path: &Path) -> Result<Self> {
        let mut mapping = Self::empty();
        let mut in_section = false;

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(section) = line.strip_prefix('[') {
                let Some(section) = section.strip_suffix(']') else {
                    return Err(Error::MappingSyntax {
                        path: path.to_path_buf(),
                        line: index + 1,
                        message: format!("unterminated section header '{}'", line),
                    });
                };
                in_section = section.trim() == SPDX_SECTION;
                continue;
            }

            if !in_section {
                continue;
            }

            match line.split_once('=') {
                Some((spdx, ebuild)) if !spdx.trim().is_empty() && !ebuild.trim().is_empty() => {
                    mapping.insert(spdx.trim(), ebuild.trim());
                }
                _ => {
                    return Err(Error::MappingSyntax {
                        path: path.to_path_buf(),
                        line: index + 1,
                        message: format!("expected 'SPDX = ebuild', got '{}'", line),
                    });
                }
            }
        }

        Ok(mapping)
    }

    /// Canonical SPDX spelling of a license, if known.
    pub fn canonical(&self, license: &str) -> Option<&str> {
        self.entries
            .get(&normalize_key(license))
            .map(|e| e.spdx.as_str())
    }

    /// Ebuild name of a license, if known.
    pub fn ebuild_name(&self, license: &str) -> Option<&str> {
        self.entries
            .get(&normalize_key(license))
            .map(|e| e.ebuild.as_str())
    }

    /// Parse an SPDX expression and canonicalize its licenses.
    ///
    /// In strict mode every license must be present in the mapping;
    /// otherwise SPDX licenses missing from it are kept as written.
    pub fn parse(&self, input: &str, strict: bool) -> Result<LicenseExpr> {
        parser::parse(input)?.try_map_licenses(&mut |license: String| {
            match self.canonical(&license) {
                Some(canonical) => Ok(canonical.to_string()),
                None if strict => Err(Error::UnknownLicense {
                    expr: input.to_string(),
                    license,
                }),
                None => Ok(license),
            }
        })
    }

    /// Replace every license in `expr` by its ebuild name.
    ///
    /// SPDX aliases of one ebuild license (`GPL-2.0`, `GPL-2.0-only`)
    /// become identical atoms, so simplifying afterwards merges them.
    pub fn to_ebuild(&self, expr: LicenseExpr) -> LicenseExpr {
        expr.map_licenses(&mut |license: String| match self.ebuild_name(&license) {
            Some(name) => name.to_string(),
            None => license,
        })
    }

    /// Render a tree in the ebuild `LICENSE` syntax, mapping every license.
    pub fn render(&self, expr: &LicenseExpr) -> String {
        render_ebuild(&self.to_ebuild(expr.clone()))
    }
}

/// Render a tree whose licenses already are ebuild names.
///
/// `MIT` stays `MIT`, `A OR B` becomes `|| ( A B )`, `A AND B` becomes
/// `A B` and an AND group inside an OR becomes `( A B )`.
pub fn render_ebuild(expr: &LicenseExpr) -> String {
    render_inner(expr, false)
}

fn render_inner(expr: &LicenseExpr, in_or: bool) -> String {
    match expr {
        LicenseExpr::License(id) => id.clone(),
        LicenseExpr::Or(children) => {
            let inner: Vec<String> = children.iter().map(|c| render_inner(c, true)).collect();
            format!("|| ( {} )", inner.join(" "))
        }
        LicenseExpr::And(children) => {
            let inner: Vec<String> = children.iter().map(|c| render_inner(c, false)).collect();
            if in_or {
                format!("( {} )", inner.join(" "))
            } else {
                inner.join(" ")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::to_standard_dialect;

    #[test]
    fn test_render_single() {
        let mapping = LicenseMapping::builtin();
        let expr = mapping.parse("MIT", true).unwrap();
        assert_eq!(mapping.render(&expr), "MIT");
    }

    #[test]
    fn test_render_or_chain() {
        let mapping = LicenseMapping::builtin();
        let expr = mapping.parse("Apache-2.0 OR MIT OR Zlib", true).unwrap();
        assert_eq!(mapping.render(&expr), "|| ( Apache-2.0 MIT ZLIB )");
    }

    #[test]
    fn test_render_mixed_nesting() {
        let mapping = LicenseMapping::builtin();
        let expr = mapping
            .parse("(BSD-3-Clause OR MIT) AND Unicode-DFS-2016", true)
            .unwrap();
        assert_eq!(mapping.render(&expr), "|| ( BSD MIT ) Unicode-DFS-2016");

        let expr = mapping
            .parse("MIT OR (Apache-2.0 AND (ISC OR Zlib))", true)
            .unwrap();
        assert_eq!(
            mapping.render(&expr),
            "|| ( MIT ( Apache-2.0 || ( ISC ZLIB ) ) )"
        );
    }

    #[test]
    fn test_legacy_dialect_renders_as_or() {
        let mapping = LicenseMapping::builtin();
        for legacy in ["MIT/Apache-2.0", "Unlicense/MIT", "MIT/Apache-2.0/Zlib"] {
            let rendered = mapping
                .render(&mapping.parse(&to_standard_dialect(legacy), true).unwrap());
            assert!(rendered.starts_with("|| ( "), "{}", rendered);
            assert!(!rendered.contains('/'), "{}", rendered);
        }
    }

    #[test]
    fn test_case_insensitive_canonicalization() {
        let mapping = LicenseMapping::builtin();
        assert_eq!(
            mapping.parse("MIT or Apache-2.0", true).unwrap(),
            LicenseExpr::Or(vec![
                LicenseExpr::license("MIT"),
                LicenseExpr::license("Apache-2.0")
            ])
        );
        assert_eq!(
            mapping.render(&mapping.parse("Apache-2.0 WITH LLVM-exception", true).unwrap()),
            "Apache-2.0-with-LLVM-exceptions"
        );
    }

    #[test]
    fn test_strict_rejects_unmapped() {
        let mapping = LicenseMapping::builtin();
        assert!(matches!(
            mapping.parse("MIT OR Beerware", true),
            Err(Error::UnknownLicense { license, .. }) if license == "Beerware"
        ));

        let expr = mapping.parse("MIT OR Beerware", false).unwrap();
        assert_eq!(mapping.render(&expr), "|| ( MIT Beerware )");
    }

    #[test]
    fn test_to_ebuild_merges_aliases() {
        let mapping = LicenseMapping::builtin();
        let expr = mapping.parse("GPL-2.0 AND GPL-2.0-only AND MIT", true).unwrap();
        assert_eq!(
            mapping.to_ebuild(expr).simplify(),
            LicenseExpr::And(vec![LicenseExpr::license("GPL-2"), LicenseExpr::license("MIT")])
        );
    }

    #[test]
    fn test_load_conf() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "# comment\n[other]\nMIT = nope\n\n[spdx-to-ebuild]\nMIT = MIT\nBSD-3-Clause = BSD\n; note\nApache-2.0  WITH  LLVM-exception = Apache-2.0-with-LLVM-exceptions"
        )
        .unwrap();
        file.flush().unwrap();

        let mapping = LicenseMapping::load(file.path()).unwrap();
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.ebuild_name("bsd-3-clause"), Some("BSD"));
        assert_eq!(
            mapping.canonical("Apache-2.0 WITH LLVM-exception"),
            Some("Apache-2.0 WITH LLVM-exception")
        );
        assert!(mapping.canonical("Zlib").is_none());
    }

    #[test]
    fn test_load_conf_syntax_error() {
        let result = LicenseMapping::from_conf("[spdx-to-ebuild]\nMIT\n", Path::new("x.conf"));
        assert!(matches!(result, Err(Error::MappingSyntax { line: 2, .. })));
    }
}
