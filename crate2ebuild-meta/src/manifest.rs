//! `Cargo.toml` and `Cargo.lock` reading
//!
//! Only the fields needed to generate an ebuild are extracted. The lock
//! file must use format version 3 or 4.

use std::{fs, path::Path};

use crate2ebuild_license::to_standard_dialect;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::{Crate, Error, FileCrate, GitCrate, PackageMetadata, Result};

const SUPPORTED_LOCK_VERSIONS: &[i64] = &[3, 4];

#[derive(Debug, Deserialize)]
struct CargoLock {
    version: Option<i64>,
    #[serde(default)]
    package: Vec<LockPackage>,
}

#[derive(Debug, Deserialize)]
struct LockPackage {
    name: String,
    version: String,
    source: Option<String>,
    checksum: Option<String>,
}

/// Read a string field of a manifest table.
///
/// Workspace-inherited values (`field.workspace = true`) are rejected,
/// since the workspace root is not consulted.
pub(crate) fn string_field(table: &toml::Table, key: &str, what: &str) -> Result<Option<String>> {
    match table.get(key) {
        None => Ok(None),
        Some(toml::Value::String(s)) => Ok(Some(s.clone())),
        Some(toml::Value::Table(t)) if t.contains_key("workspace") => Err(Error::Schema(format!(
            "{}: workspace-inherited '{}' is not supported",
            what, key
        ))),
        Some(other) => Err(Error::Schema(format!(
            "{}: '{}' must be a string, got {}",
            what,
            key,
            other.type_str()
        ))),
    }
}

/// Extract the `[package]` table of a manifest.
pub(crate) fn package_table(content: &str, what: &str) -> Result<toml::Table> {
    let mut manifest: toml::Table = toml::from_str(content)?;
    match manifest.remove("package") {
        Some(toml::Value::Table(package)) => Ok(package),
        Some(_) => Err(Error::Schema(format!("{}: [package] must be a table", what))),
        None => Err(Error::Schema(format!("{}: no [package] section", what))),
    }
}

/// Parse `Cargo.toml` content.
pub fn parse_cargo_toml(content: &str) -> Result<PackageMetadata> {
    let package = package_table(content, "Cargo.toml")?;

    let name = string_field(&package, "name", "Cargo.toml")?
        .ok_or_else(|| Error::Schema("Cargo.toml: package has no name".to_string()))?;
    // Cargo treats a missing version as 0.0.0
    let version = string_field(&package, "version", "Cargo.toml")?
        .unwrap_or_else(|| "0.0.0".to_string());

    Ok(PackageMetadata {
        license: string_field(&package, "license", "Cargo.toml")?
            .map(|l| to_standard_dialect(&l)),
        description: string_field(&package, "description", "Cargo.toml")?,
        homepage: string_field(&package, "homepage", "Cargo.toml")?,
        name,
        version,
    })
}

/// Read `Cargo.toml` from a file.
pub fn read_cargo_toml<P: AsRef<Path>>(path: P) -> Result<PackageMetadata> {
    let content = fs::read_to_string(path)?;
    parse_cargo_toml(&content)
}

fn is_commit_hash(commit: &str) -> bool {
    commit.len() == 40 && commit.chars().all(|c| c.is_ascii_hexdigit())
}

fn parse_git_source(pkg: &LockPackage, source: &str) -> Result<GitCrate> {
    let mut url = Url::parse(source)?;
    let commit = url
        .fragment()
        .filter(|c| is_commit_hash(c))
        .map(str::to_string)
        .ok_or_else(|| {
            Error::Schema(format!(
                "Cargo.lock: git source of {} {} does not pin a commit: {}",
                pkg.name, pkg.version, source
            ))
        })?;
    url.set_query(None);
    url.set_fragment(None);

    Ok(GitCrate::new(&pkg.name, &pkg.version, url.as_str(), commit))
}

/// Parse `Cargo.lock` content into the dependency list of `package_name`.
///
/// The package itself and packages without a source (workspace members
/// and path dependencies) are skipped.
pub fn parse_cargo_lock(content: &str, package_name: &str) -> Result<Vec<Crate>> {
    let lock: CargoLock = toml::from_str(content)?;
    match lock.version {
        Some(v) if SUPPORTED_LOCK_VERSIONS.contains(&v) => {}
        Some(v) => return Err(Error::UnsupportedLockVersion(v.to_string())),
        None => return Err(Error::UnsupportedLockVersion("unversioned (v1/v2)".to_string())),
    }

    let mut crates = Vec::new();
    for pkg in &lock.package {
        if pkg.name == package_name {
            continue;
        }
        let Some(source) = pkg.source.as_deref() else {
            debug!("Skipping local package {} {}", pkg.name, pkg.version);
            continue;
        };

        if let Some(git) = source.strip_prefix("git+") {
            crates.push(Crate::Git(parse_git_source(pkg, git)?));
        } else if source.starts_with("registry+") || source.starts_with("sparse+") {
            crates.push(Crate::File(FileCrate::new(
                &pkg.name,
                &pkg.version,
                pkg.checksum.clone().unwrap_or_default(),
            )));
        } else {
            return Err(Error::Schema(format!(
                "Cargo.lock: unsupported source for {} {}: {}",
                pkg.name, pkg.version, source
            )));
        }
    }

    debug!("Found {} dependency crates in Cargo.lock", crates.len());
    Ok(crates)
}

/// Read `Cargo.lock` from a file.
pub fn read_cargo_lock<P: AsRef<Path>>(path: P, package_name: &str) -> Result<Vec<Crate>> {
    let content = fs::read_to_string(path)?;
    parse_cargo_lock(&content, package_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCK: &str = r#"
version = 3

[[package]]
name = "app"
version = "1.2.3"
dependencies = ["bar", "foo", "test"]

[[package]]
name = "bar"
version = "2"
source = "registry+https://github.com/rust-lang/crates.io-index"
checksum = "4e9b5fc7a1c4ed0e7a8b62d8ab2fc0a4d6e48c4b3a43f7ce2c27c70ad1c1c5f9"

[[package]]
name = "foo"
version = "1"
source = "registry+https://github.com/rust-lang/crates.io-index"

[[package]]
name = "helper"
version = "0.1.0"

[[package]]
name = "test"
version = "0.1"
source = "git+https://github.com/projg2/pycargoebuild?branch=main#5ace474ad2e92da836de60afd9014cbae7bdd481"
"#;

    #[test]
    fn test_parse_cargo_toml() {
        let meta = parse_cargo_toml(
            r#"
[package]
name = "foo"
version = "1.2.3"
license = "MIT/Apache-2.0"
description = "Test package"
homepage = "https://example.com"
"#,
        )
        .unwrap();
        assert_eq!(meta.name, "foo");
        assert_eq!(meta.version, "1.2.3");
        assert_eq!(meta.license.as_deref(), Some("MIT OR Apache-2.0"));
        assert_eq!(meta.description.as_deref(), Some("Test package"));
        assert_eq!(meta.homepage.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_parse_cargo_toml_minimal() {
        let meta = parse_cargo_toml("[package]\nname = \"foo\"\n").unwrap();
        assert_eq!(meta, PackageMetadata::new("foo", "0.0.0"));
    }

    #[test]
    fn test_parse_cargo_toml_errors() {
        assert!(matches!(
            parse_cargo_toml("[workspace]\nmembers = []\n"),
            Err(Error::Schema(_))
        ));
        assert!(matches!(
            parse_cargo_toml("[package]\nname = \"foo\"\nversion.workspace = true\n"),
            Err(Error::Schema(_))
        ));
        assert!(matches!(
            parse_cargo_toml("[package]\nname = 5\n"),
            Err(Error::Schema(_))
        ));
        assert!(matches!(parse_cargo_toml("[package"), Err(Error::Toml(_))));
    }

    #[test]
    fn test_parse_cargo_lock() {
        let crates = parse_cargo_lock(LOCK, "app").unwrap();
        assert_eq!(
            crates,
            vec![
                Crate::File(FileCrate::new(
                    "bar",
                    "2",
                    "4e9b5fc7a1c4ed0e7a8b62d8ab2fc0a4d6e48c4b3a43f7ce2c27c70ad1c1c5f9"
                )),
                Crate::File(FileCrate::new("foo", "1", "")),
                Crate::Git(GitCrate::new(
                    "test",
                    "0.1",
                    "https://github.com/projg2/pycargoebuild",
                    "5ace474ad2e92da836de60afd9014cbae7bdd481"
                )),
            ]
        );
    }

    #[test]
    fn test_lock_version_4() {
        let lock = LOCK.replace("version = 3", "version = 4");
        assert_eq!(parse_cargo_lock(&lock, "app").unwrap().len(), 3);
    }

    #[test]
    fn test_unsupported_lock_versions() {
        let lock = LOCK.replace("version = 3", "version = 2");
        assert!(matches!(
            parse_cargo_lock(&lock, "app"),
            Err(Error::UnsupportedLockVersion(v)) if v == "2"
        ));

        let lock = LOCK.replace("version = 3\n", "");
        assert!(matches!(
            parse_cargo_lock(&lock, "app"),
            Err(Error::UnsupportedLockVersion(_))
        ));
    }

    #[test]
    fn test_git_source_without_commit() {
        let lock = LOCK.replace(
            "?branch=main#5ace474ad2e92da836de60afd9014cbae7bdd481",
            "?branch=main",
        );
        assert!(matches!(parse_cargo_lock(&lock, "app"), Err(Error::Schema(_))));
    }
}
