//! crate2ebuild CLI
//!
//! Generates an ebuild for the Rust package in a directory, or updates the
//! generated parts of an existing one.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use clap::Parser;
use colored::Colorize;
use crate2ebuild::{get_ebuild, update_ebuild, EbuildOptions, Error, Result};
use crate2ebuild_license::LicenseMapping;
use crate2ebuild_meta::{read_cargo_lock, read_cargo_toml};
use tempfile::NamedTempFile;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

static CHECK_MARK: LazyLock<colored::ColoredString> = LazyLock::new(|| "✔".bright_green().bold());

const DEFAULT_LICENSE_MAPPING: &str = "/var/db/repos/gentoo/metadata/license-mapping.conf";

#[derive(Parser)]
#[command(name = "crate2ebuild")]
#[command(about = "Generate or update a Gentoo ebuild for a Rust package", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory containing Cargo.toml and Cargo.lock
    #[arg(default_value = ".")]
    directory: PathBuf,

    /// Directory to store downloaded crate archives in
    #[arg(short, long, env = "DISTDIR", default_value = "/var/cache/distfiles")]
    distdir: PathBuf,

    /// Existing ebuild to update instead of generating a new one
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (default: the input ebuild, or {name}-{version}.ebuild)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite the output file if it exists
    #[arg(short, long)]
    force: bool,

    /// Do not compute the dependent crate license addendum
    #[arg(short = 'L', long)]
    no_license: bool,

    /// Path to Gentoo's license-mapping.conf
    #[arg(short = 'l', long, env = "LICENSE_MAPPING")]
    license_mapping: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn setup_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Failed to set tracing subscriber");
    }
}

fn load_license_mapping(path: Option<&Path>) -> Result<LicenseMapping> {
    match path {
        Some(path) => Ok(LicenseMapping::load(path)?),
        None if Path::new(DEFAULT_LICENSE_MAPPING).exists() => {
            Ok(LicenseMapping::load(DEFAULT_LICENSE_MAPPING)?)
        }
        None => {
            warn!(
                "{} not found, using the built-in license mapping",
                DEFAULT_LICENSE_MAPPING
            );
            Ok(LicenseMapping::builtin())
        }
    }
}

/// Write `content` to `path` through a temporary file in the same directory.
fn write_atomically(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    file.persist(path)
        .map_err(|e| Error::Persist(path.to_path_buf(), e))?;
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let options = EbuildOptions {
        crate_license: !cli.no_license,
        mapping: load_license_mapping(cli.license_mapping.as_deref())?,
    };

    let meta = read_cargo_toml(cli.directory.join("Cargo.toml"))?;
    let crates = read_cargo_lock(cli.directory.join("Cargo.lock"), &meta.name)?;
    info!(
        "{} {}: {} dependency crates",
        meta.name,
        meta.version,
        crates.len()
    );

    let (output, ebuild) = match &cli.input {
        Some(input) => {
            let existing = fs::read_to_string(input)?;
            let ebuild = update_ebuild(&existing, &meta, &crates, &cli.distdir, &options)?;
            (cli.output.unwrap_or_else(|| input.clone()), ebuild)
        }
        None => {
            let output = cli
                .output
                .unwrap_or_else(|| PathBuf::from(meta.ebuild_filename()));
            if output.exists() && !cli.force {
                return Err(Error::OutputExists(output));
            }
            let ebuild = get_ebuild(&meta, &crates, &cli.distdir, &options)?;
            (output, ebuild)
        }
    };

    write_atomically(&output, &ebuild)?;
    println!("{} {}", *CHECK_MARK, output.display());
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    if let Err(err) = run(cli) {
        error!("{}", err);
        std::process::exit(1);
    }
}
