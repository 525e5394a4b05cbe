//! Package and dependency crate model

const CRATES_IO_DOWNLOAD: &str = "https://crates.io/api/v1/crates";

/// Identity of the package the ebuild is generated for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    /// SPDX expression, already converted from the legacy `A/B` notation
    pub license: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
}

impl PackageMetadata {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    /// Default ebuild file name, `{name}-{version}.ebuild`
    pub fn ebuild_filename(&self) -> String {
        format!("{}-{}.ebuild", self.name, self.version)
    }
}

/// A dependency fetched as a `.crate` archive from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCrate {
    pub name: String,
    pub version: String,
    /// Hex SHA-256 of the archive; empty when unknown
    pub checksum: String,
}

impl FileCrate {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        checksum: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            checksum: checksum.into(),
        }
    }

    /// Archive name in the distfiles cache
    pub fn filename(&self) -> String {
        format!("{}-{}.crate", self.name, self.version)
    }

    pub fn download_url(&self) -> String {
        format!(
            "{}/{}/{}/download",
            CRATES_IO_DOWNLOAD, self.name, self.version
        )
    }

    /// Path of the crate's own manifest inside the archive
    pub fn manifest_path(&self) -> String {
        format!("{}-{}/Cargo.toml", self.name, self.version)
    }
}

/// A dependency pinned to a commit of a git repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCrate {
    pub name: String,
    pub version: String,
    pub repository: String,
    /// Full 40 character commit hash
    pub commit: String,
}

impl GitCrate {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        repository: impl Into<String>,
        commit: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            repository: repository.into(),
            commit: commit.into(),
        }
    }

    /// Repository name, the last URL path segment without `.git`
    pub fn repo_name(&self) -> &str {
        let trimmed = self.repository.trim_end_matches('/');
        let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
        last.strip_suffix(".git").unwrap_or(last)
    }

    /// Value of the `GIT_CRATES` entry: `repo;commit;name-%commit%`
    pub fn git_crates_value(&self) -> String {
        format!(
            "{};{};{}-%commit%",
            self.repository,
            self.commit,
            self.repo_name()
        )
    }
}

/// A resolved dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Crate {
    File(FileCrate),
    Git(GitCrate),
}

impl Crate {
    pub fn name(&self) -> &str {
        match self {
            Crate::File(c) => &c.name,
            Crate::Git(c) => &c.name,
        }
    }

    pub fn version(&self) -> &str {
        match self {
            Crate::File(c) => &c.version,
            Crate::Git(c) => &c.version,
        }
    }

    /// `CRATES` entry, `name@version`
    pub fn crates_entry(&self) -> String {
        format!("{}@{}", self.name(), self.version())
    }

    pub fn as_file(&self) -> Option<&FileCrate> {
        match self {
            Crate::File(c) => Some(c),
            Crate::Git(_) => None,
        }
    }

    pub fn as_git(&self) -> Option<&GitCrate> {
        match self {
            Crate::Git(c) => Some(c),
            Crate::File(_) => None,
        }
    }
}

impl From<FileCrate> for Crate {
    fn from(c: FileCrate) -> Self {
        Crate::File(c)
    }
}

impl From<GitCrate> for Crate {
    fn from(c: GitCrate) -> Self {
        Crate::Git(c)
    }
}

/// Registry crates sorted by name, then version.
pub fn sorted_file_crates(crates: &[Crate]) -> Vec<&FileCrate> {
    let mut out: Vec<&FileCrate> = crates.iter().filter_map(Crate::as_file).collect();
    out.sort_by(|a, b| (&a.name, &a.version).cmp(&(&b.name, &b.version)));
    out
}

/// Git crates sorted by name, then version.
pub fn sorted_git_crates(crates: &[Crate]) -> Vec<&GitCrate> {
    let mut out: Vec<&GitCrate> = crates.iter().filter_map(Crate::as_git).collect();
    out.sort_by(|a, b| (&a.name, &a.version).cmp(&(&b.name, &b.version)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_crate_paths() {
        let c = FileCrate::new("foo", "1.2.3", "");
        assert_eq!(c.filename(), "foo-1.2.3.crate");
        assert_eq!(c.manifest_path(), "foo-1.2.3/Cargo.toml");
        assert_eq!(
            c.download_url(),
            "https://crates.io/api/v1/crates/foo/1.2.3/download"
        );
    }

    #[test]
    fn test_git_crate_value() {
        let c = GitCrate::new(
            "test",
            "0.1",
            "https://github.com/projg2/pycargoebuild",
            "5ace474ad2e92da836de60afd9014cbae7bdd481",
        );
        assert_eq!(c.repo_name(), "pycargoebuild");
        assert_eq!(
            c.git_crates_value(),
            "https://github.com/projg2/pycargoebuild;5ace474ad2e92da836de60afd9014cbae7bdd481;pycargoebuild-%commit%"
        );

        let c = GitCrate::new("x", "1", "https://example.com/a/repo.git/", "0");
        assert_eq!(c.repo_name(), "repo");
    }

    #[test]
    fn test_sorted_crates() {
        let crates: Vec<Crate> = vec![
            FileCrate::new("foo", "1", "").into(),
            GitCrate::new("zed", "1", "https://example.com/zed", "0").into(),
            FileCrate::new("bar", "2", "").into(),
            FileCrate::new("bar", "10", "").into(),
        ];
        let names: Vec<String> = sorted_file_crates(&crates)
            .iter()
            .map(|c| format!("{}@{}", c.name, c.version))
            .collect();
        assert_eq!(names, vec!["bar@10", "bar@2", "foo@1"]);
        assert_eq!(sorted_git_crates(&crates).len(), 1);
        assert_eq!(crates[1].crates_entry(), "zed@1");
    }
}
