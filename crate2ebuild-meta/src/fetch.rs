//! Crate archive fetching
//!
//! Registry crates are downloaded into a flat distfiles directory as
//! `{name}-{version}.crate`. An archive already present there is trusted
//! as is; fresh downloads are verified against the lock file checksum
//! before they are moved into place.

use std::{
    fs::{self, File},
    io::{self, Read},
    path::{Path, PathBuf},
};

use crate2ebuild_license::to_standard_dialect;
use flate2::read::GzDecoder;
use reqwest::blocking::Client;
use tar::Archive;
use tracing::{debug, info, warn};

use crate::{
    checksum::verify_sha256,
    manifest::{package_table, string_field},
    metadata::sorted_file_crates,
    Crate, Error, FileCrate, Result,
};

/// License information found in a dependency's own `Cargo.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredLicense {
    /// SPDX expression from `license`, converted from the legacy notation
    Spdx(String),
    /// Only `license-file` is set; the license cannot be determined
    FileOnly(String),
}

/// Downloads and inspects registry crates.
pub struct CrateFetcher {
    distdir: PathBuf,
    client: Client,
}

impl CrateFetcher {
    pub fn new<P: Into<PathBuf>>(distdir: P) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("crate2ebuild/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            distdir: distdir.into(),
            client,
        })
    }

    pub fn archive_path(&self, krate: &FileCrate) -> PathBuf {
        self.distdir.join(krate.filename())
    }

    /// Make sure the archive of `krate` is in the distfiles directory.
    pub fn fetch(&self, krate: &FileCrate) -> Result<PathBuf> {
        let path = self.archive_path(krate);
        if path.exists() {
            debug!("Using cached {}", path.display());
            return Ok(path);
        }

        fs::create_dir_all(&self.distdir)?;
        let url = krate.download_url();
        info!("Fetching {}", url);

        let response = self.client.get(&url).send()?;
        if !response.status().is_success() {
            return Err(Error::Download {
                url,
                status: response.status().to_string(),
            });
        }

        self.store(krate, response)
    }

    /// Write a downloaded archive into the cache.
    ///
    /// The data goes to `{filename}.part` first and is renamed into place
    /// only once it has been written and verified. On any error the
    /// partial file is removed.
    pub fn store<R: Read>(&self, krate: &FileCrate, mut body: R) -> Result<PathBuf> {
        let path = self.archive_path(krate);
        let temp_path = self.distdir.join(format!("{}.part", krate.filename()));

        let written = write_part(&temp_path, krate, &mut body);
        if let Err(err) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(err);
        }

        fs::rename(&temp_path, &path)?;
        Ok(path)
    }

    /// Fetch `krate` and read the license it declares.
    pub fn declared_license(&self, krate: &FileCrate) -> Result<DeclaredLicense> {
        let path = self.fetch(krate)?;
        read_declared_license(&path, krate)
    }

    /// Licenses of all registry crates in `crates`, in crate order.
    ///
    /// Git crates are not fetched and contribute no license. Crates that
    /// only ship a license file are skipped with a warning.
    pub fn collect_licenses(&self, crates: &[Crate]) -> Result<Vec<String>> {
        let mut licenses = Vec::new();
        for krate in sorted_file_crates(crates) {
            match self.declared_license(krate)? {
                DeclaredLicense::Spdx(license) => {
                    debug!("{} {}: {}", krate.name, krate.version, license);
                    licenses.push(license);
                }
                DeclaredLicense::FileOnly(file) => {
                    warn!(
                        "Crate {} {} has only license-file = \"{}\", its license must be added manually",
                        krate.name, krate.version, file
                    );
                }
            }
        }
        Ok(licenses)
    }
}

fn write_part<R: Read>(temp_path: &Path, krate: &FileCrate, body: &mut R) -> Result<()> {
    let mut file = File::create(temp_path)?;
    io::copy(body, &mut file)?;
    file.sync_all()?;

    if krate.checksum.is_empty() {
        warn!("No checksum known for {}, skipping verification", krate.filename());
        Ok(())
    } else {
        verify_sha256(temp_path, &krate.checksum)
    }
}

/// Read the license declared in the `Cargo.toml` packed in a crate archive.
pub fn read_declared_license(archive_path: &Path, krate: &FileCrate) -> Result<DeclaredLicense> {
    let wanted = krate.manifest_path();
    let file = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(file));

    for entry in archive.entries()? {
        let mut entry = entry?;
        if entry.path()?.to_string_lossy() != wanted {
            continue;
        }

        let mut content = String::new();
        entry.read_to_string(&mut content)?;
        let package = package_table(&content, &wanted)?;

        if let Some(license) = string_field(&package, "license", &wanted)? {
            return Ok(DeclaredLicense::Spdx(to_standard_dialect(&license)));
        }
        return match string_field(&package, "license-file", &wanted)? {
            Some(file) => Ok(DeclaredLicense::FileOnly(file)),
            None => Err(Error::MissingLicense(format!(
                "{} {}",
                krate.name, krate.version
            ))),
        };
    }

    Err(Error::ArchiveEntryNotFound(wanted, archive_path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use tempfile::TempDir;

    fn make_crate(dir: &Path, name: &str, version: &str, cargo_toml: &str) {
        let path = dir.join(format!("{}-{}.crate", name, version));
        let file = File::create(path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));

        let mut header = tar::Header::new_gnu();
        header.set_size(cargo_toml.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(
                &mut header,
                format!("{}-{}/Cargo.toml", name, version),
                cargo_toml.as_bytes(),
            )
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();
    }

    fn crate_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        make_crate(
            dir.path(),
            "foo",
            "1",
            "[package]\nname = \"foo\"\nversion = \"1\"\nlicense = \"(BSD-3-Clause OR MIT) AND Unicode-DFS-2016\"\n",
        );
        make_crate(
            dir.path(),
            "bar",
            "2",
            "[package]\nname = \"bar\"\nversion = \"2\"\nlicense = \"CC0-1.0/Unlicense\"\n",
        );
        make_crate(
            dir.path(),
            "baz",
            "3",
            "[package]\nname = \"baz\"\nversion = \"3\"\nlicense-file = \"COPYING\"\n",
        );
        make_crate(
            dir.path(),
            "qux",
            "4",
            "[package]\nname = \"qux\"\nversion = \"4\"\n",
        );
        dir
    }

    #[test]
    fn test_declared_license() {
        let dir = crate_dir();
        let fetcher = CrateFetcher::new(dir.path()).unwrap();

        assert_eq!(
            fetcher
                .declared_license(&FileCrate::new("bar", "2", ""))
                .unwrap(),
            DeclaredLicense::Spdx("CC0-1.0 OR Unlicense".to_string())
        );
        assert_eq!(
            fetcher
                .declared_license(&FileCrate::new("baz", "3", ""))
                .unwrap(),
            DeclaredLicense::FileOnly("COPYING".to_string())
        );
        assert!(matches!(
            fetcher.declared_license(&FileCrate::new("qux", "4", "")),
            Err(Error::MissingLicense(_))
        ));
    }

    #[test]
    fn test_cached_archive_is_trusted() {
        let dir = crate_dir();
        let fetcher = CrateFetcher::new(dir.path()).unwrap();
        let krate = FileCrate::new("foo", "1", "deadbeef");
        assert_eq!(fetcher.fetch(&krate).unwrap(), dir.path().join("foo-1.crate"));
    }

    struct FailingReader {
        sent: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
            }
            self.sent = true;
            buf[..5].copy_from_slice(b"hello");
            Ok(5)
        }
    }

    #[test]
    fn test_store_verifies_and_renames() {
        let dir = TempDir::new().unwrap();
        let fetcher = CrateFetcher::new(dir.path()).unwrap();
        let krate = FileCrate::new(
            "hello",
            "1",
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9",
        );
        let path = fetcher.store(&krate, &b"hello world"[..]).unwrap();
        assert_eq!(path, dir.path().join("hello-1.crate"));
        assert_eq!(fs::read(&path).unwrap(), b"hello world");
        assert!(!dir.path().join("hello-1.crate.part").exists());
    }

    #[test]
    fn test_store_removes_partial_file_on_mismatch() {
        let dir = TempDir::new().unwrap();
        let fetcher = CrateFetcher::new(dir.path()).unwrap();
        let krate = FileCrate::new("hello", "1", "0".repeat(64));
        assert!(matches!(
            fetcher.store(&krate, &b"hello world"[..]),
            Err(Error::ChecksumMismatch { .. })
        ));
        assert!(!dir.path().join("hello-1.crate").exists());
        assert!(!dir.path().join("hello-1.crate.part").exists());
    }

    #[test]
    fn test_store_removes_partial_file_on_read_error() {
        let dir = TempDir::new().unwrap();
        let fetcher = CrateFetcher::new(dir.path()).unwrap();
        let krate = FileCrate::new("hello", "1", "");
        assert!(matches!(
            fetcher.store(&krate, FailingReader { sent: false }),
            Err(Error::Io(_))
        ));
        assert!(!dir.path().join("hello-1.crate").exists());
        assert!(!dir.path().join("hello-1.crate.part").exists());
    }

    #[test]
    fn test_collect_licenses_skips_git_and_license_file() {
        let dir = crate_dir();
        let fetcher = CrateFetcher::new(dir.path()).unwrap();
        let crates: Vec<Crate> = vec![
            FileCrate::new("foo", "1", "").into(),
            FileCrate::new("baz", "3", "").into(),
            crate::GitCrate::new(
                "test",
                "0.1",
                "https://github.com/projg2/pycargoebuild",
                "5ace474ad2e92da836de60afd9014cbae7bdd481",
            )
            .into(),
            FileCrate::new("bar", "2", "").into(),
        ];
        assert_eq!(
            fetcher.collect_licenses(&crates).unwrap(),
            vec![
                "CC0-1.0 OR Unlicense".to_string(),
                "(BSD-3-Clause OR MIT) AND Unicode-DFS-2016".to_string(),
            ]
        );
    }

    #[test]
    fn test_archive_without_manifest() {
        let dir = crate_dir();
        let krate = FileCrate::new("other", "9", "");
        assert!(matches!(
            read_declared_license(&dir.path().join("foo-1.crate"), &krate),
            Err(Error::ArchiveEntryNotFound(..))
        ));
    }
}
