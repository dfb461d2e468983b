//! Generation driver: index discovery, per-unit generation, and output.
//!
//! The driver owns everything around the engine that touches the file system:
//!
//! - finding `mockc.json` index files under the requested patterns
//! - planning each index into output units
//! - generating units independently on scoped threads
//! - writing each unit atomically, only after the whole unit succeeded
//! - comparing against disk by content hash for `--check`
//!
//! Destinations are resolved against the directory of the index file they
//! came from. A unit never observes another unit's aliases, mocks, or errors.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;

use tempfile::NamedTempFile;
use walkdir::WalkDir;

use mockc_core::error::{MockcError, MockcResult};
use mockc_core::index::{ModuleIndex, SourceIndex, INDEX_FILE_NAME};
use mockc_core::output::{ContentHash, UnitReport, UnitStatus};
use mockc_core::unit::{plan_units, synthesize_unit, OutputUnit};
use mockc_go::render_unit;

/// Regeneration command recorded in generator-mode output.
pub const GENERATOR_COMMAND: &str = "mockc";

// ============================================================================
// Options
// ============================================================================

/// What to do with rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Write files whose content changed.
    #[default]
    Write,
    /// Render only; include the content in the report.
    DryRun,
    /// Compare with the files on disk; report stale ones.
    Check,
}

/// Options shared by every unit of a run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub mode: OutputMode,
    /// Command written into the `//go:generate` line.
    pub regenerate: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            mode: OutputMode::Write,
            regenerate: GENERATOR_COMMAND.to_string(),
        }
    }
}

// ============================================================================
// Discovery
// ============================================================================

/// Find index files under `patterns`, in sorted order.
///
/// A pattern may name an index file directly or a directory to search.
/// Hidden directories are skipped. No patterns means the current directory.
pub fn discover_indexes(patterns: &[PathBuf]) -> MockcResult<Vec<PathBuf>> {
    let default = [PathBuf::from(".")];
    let patterns = if patterns.is_empty() {
        &default[..]
    } else {
        patterns
    };

    let mut found = Vec::new();
    for pattern in patterns {
        if pattern.is_file() {
            found.push(pattern.clone());
            continue;
        }
        if !pattern.is_dir() {
            return Err(MockcError::invalid_args(format!(
                "pattern {} matches no directory or index file",
                pattern.display()
            )));
        }
        for entry in WalkDir::new(pattern)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
        {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(pattern.as_path()).to_path_buf();
                MockcError::io(path, io::Error::other(e))
            })?;
            if entry.file_type().is_file() && entry.file_name() == INDEX_FILE_NAME {
                found.push(entry.into_path());
            }
        }
    }

    found.sort();
    found.dedup();
    tracing::debug!(count = found.len(), "discovered index files");
    Ok(found)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

// ============================================================================
// Generation
// ============================================================================

/// Generate every unit of every index under `patterns`.
pub fn generate_patterns(
    patterns: &[PathBuf],
    options: &GenerateOptions,
) -> MockcResult<Vec<UnitReport>> {
    let mut reports = Vec::new();
    for path in discover_indexes(patterns)? {
        reports.extend(generate_index_file(&path, options));
    }
    Ok(reports)
}

/// Load, plan, and generate one index file.
///
/// A load or planning failure becomes a single failed report whose
/// destination is the index file itself.
pub fn generate_index_file(path: &Path, options: &GenerateOptions) -> Vec<UnitReport> {
    let planned = ModuleIndex::load(path).and_then(|index| {
        let units = plan_units(&index)?;
        Ok((index, units))
    });
    match planned {
        Ok((index, units)) => {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            generate_units(&index, dir, &units, options)
        }
        Err(err) => {
            tracing::warn!(index = %path.display(), error = %err, "cannot plan index");
            vec![UnitReport::failure(path.display().to_string(), Vec::new(), &err)]
        }
    }
}

/// Generate `units` in parallel, one scoped thread per unit.
///
/// Reports come back in unit order regardless of completion order.
pub fn generate_units<I>(
    index: &I,
    dir: &Path,
    units: &[OutputUnit],
    options: &GenerateOptions,
) -> Vec<UnitReport>
where
    I: SourceIndex + Sync + ?Sized,
{
    thread::scope(|s| {
        let handles: Vec<_> = units
            .iter()
            .map(|unit| s.spawn(move || generate_unit(index, dir, unit, options)))
            .collect();
        handles
            .into_iter()
            .zip(units)
            .map(|(handle, unit)| {
                let destination = dir.join(&unit.destination);
                let result = handle.join().unwrap_or_else(|_| {
                    Err(MockcError::internal(format!(
                        "generation of {} panicked",
                        destination.display()
                    )))
                });
                result.unwrap_or_else(|err| {
                    UnitReport::failure(destination.display().to_string(), unit.mock_names(), &err)
                })
            })
            .collect()
    })
}

/// Generate one unit end to end.
pub fn generate_unit<I>(
    index: &I,
    dir: &Path,
    unit: &OutputUnit,
    options: &GenerateOptions,
) -> MockcResult<UnitReport>
where
    I: SourceIndex + ?Sized,
{
    let destination = dir.join(&unit.destination);
    let synthesized = synthesize_unit(index, unit)?;
    let content = render_unit(&synthesized, &options.regenerate);
    let hash = ContentHash::compute(content.as_bytes());
    let on_disk = existing_hash(&destination)?;
    let display = destination.display().to_string();

    let status = match options.mode {
        OutputMode::DryRun => {
            let mut report =
                UnitReport::success(display, UnitStatus::Rendered, unit.mock_names(), hash);
            report.content = Some(content);
            return Ok(report);
        }
        OutputMode::Check => {
            if on_disk.as_ref() != Some(&hash) {
                return Err(MockcError::StaleOutput { path: destination });
            }
            UnitStatus::UpToDate
        }
        OutputMode::Write => {
            if on_disk.as_ref() == Some(&hash) {
                UnitStatus::Unchanged
            } else {
                atomic_write(&destination, content.as_bytes())?;
                tracing::info!("generated: {}", destination.display());
                UnitStatus::Written
            }
        }
    };

    Ok(UnitReport::success(display, status, unit.mock_names(), hash))
}

fn existing_hash(path: &Path) -> MockcResult<Option<ContentHash>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(ContentHash::compute(&bytes))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(MockcError::io(path, e)),
    }
}

/// Write `content` to `path` via a temporary file in the same directory.
///
/// Readers see either the old file or the complete new one.
pub fn atomic_write(path: &Path, content: &[u8]) -> MockcResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| MockcError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| MockcError::io(dir, e))?;
    tmp.write_all(content).map_err(|e| MockcError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| MockcError::io(path, e.error))?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
