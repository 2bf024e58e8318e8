//! Staging and archiving.
//!
//! Copies the compiled app into the staging directory, writes the launcher
//! and guide next to it, and zips the whole staging tree into the download
//! archive.
//!
//! Archive entries are relative to the staging directory and always use `/`
//! separators, so the zip unpacks the same way wherever it is extracted.

use crate::capability::CapabilityReport;
use crate::config::BuildConfig;
use crate::templates;
use anyhow::{Context, Result};
use colored::*;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::FileOptions;

pub const COMPRESSION_LEVEL: i64 = 6;

#[derive(Debug, Clone)]
pub struct PackageReport {
    pub archive: PathBuf,
    /// Size of the compiled app before compression.
    pub app_bytes: u64,
    pub archive_bytes: u64,
    pub sha256: String,
}

/// Total size of every regular file under `dir`, counting link targets.
pub fn dir_size(dir: &Path) -> Result<u64> {
    let mut total = 0;
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry?;
        if entry.file_type().is_file() {
            total += entry.metadata()?.len();
        }
    }
    Ok(total)
}

/// Copy the tree at `src` to `dst`, which must not exist yet.
///
/// Symlinks are resolved: the copy holds the contents of their targets.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    if dst.exists() {
        anyhow::bail!("Destination already exists: {}", dst.display());
    }
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(src)?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
        } else {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
        }
    }
    Ok(())
}

/// Write the launcher and guide into `staging`.
pub fn write_documents(staging: &Path, config: &BuildConfig, report: &CapabilityReport) -> Result<()> {
    let launcher = staging.join(templates::launcher_file_name(&config.app));
    fs::write(&launcher, templates::render_launcher(report, &config.app))
        .with_context(|| format!("Failed to write {}", launcher.display()))?;
    println!("   {} Launcher: {}", "+".green(), launcher.display());

    let guide = staging.join(templates::guide_file_name(&config.app));
    fs::write(&guide, templates::render_guide(report, &config.app))
        .with_context(|| format!("Failed to write {}", guide.display()))?;
    println!("   {} Guide: {}", "+".green(), guide.display());
    Ok(())
}

/// Zip every file under `staging` into `archive`.
pub fn create_archive(staging: &Path, archive: &Path) -> Result<()> {
    let file = File::create(archive)
        .with_context(|| format!("Failed to create {}", archive.display()))?;
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::<()>::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL));

    for entry in WalkDir::new(staging).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = archive_name(entry.path().strip_prefix(staging)?);
        zip.start_file(name, options)?;
        let mut f = File::open(entry.path())?;
        io::copy(&mut f, &mut zip)?;
    }

    zip.finish()?;
    Ok(())
}

/// Forward-slash entry name for a path relative to the staging root.
fn archive_name(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open {} for hashing", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Stage the compiled app with its documents and build the archive.
pub fn package(
    app_dir: &Path,
    config: &BuildConfig,
    report: &CapabilityReport,
) -> Result<PackageReport> {
    println!("{} Creating download package...", "📦".blue());

    let app_bytes = dir_size(app_dir)?;
    println!("   {} App size: {}", "📊".cyan(), crate::ui::format_mb(app_bytes));

    let staged = config.staged_app_dir();
    copy_tree(app_dir, &staged)?;
    println!("   {} App copied to {}", "+".green(), staged.display());

    write_documents(&config.staging_dir, config, report)?;

    println!("{} Creating archive: {}", "💾".blue(), config.archive_path.display());
    create_archive(&config.staging_dir, &config.archive_path)?;

    let archive_bytes = fs::metadata(&config.archive_path)?.len();
    let sha256 = sha256_file(&config.archive_path)?;
    println!(
        "{} Package ready: {} ({})",
        "✓".green(),
        config.archive_path.display(),
        crate::ui::format_mb(archive_bytes)
    );

    Ok(PackageReport {
        archive: config.archive_path.clone(),
        app_bytes,
        archive_bytes,
        sha256,
    })
}
