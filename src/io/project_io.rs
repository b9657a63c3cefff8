use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tempfile::NamedTempFile;

use crate::model::project::ProjectFile;
use crate::parse::{ParseOptions, parse_outline};

/// Error type for reading a project file
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl LoadError {
    pub fn path(&self) -> &Path {
        match self {
            LoadError::Read { path, .. } => path,
        }
    }
}

/// A failed atomic replace. The original file is unchanged.
#[derive(Debug, thiserror::Error)]
#[error("could not write {path}: {source}")]
pub struct WriteError {
    pub path: PathBuf,
    pub source: std::io::Error,
}

/// Read and parse a project file.
pub fn load_project_file(path: &Path, options: &ParseOptions) -> Result<ProjectFile, LoadError> {
    let text = fs::read_to_string(path).map_err(|e| LoadError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Local>::from);
    Ok(parse_project_file(path, text, modified, options))
}

/// Parse already-read text as the project file at `path`.
pub fn parse_project_file(
    path: &Path,
    text: String,
    modified: Option<DateTime<Local>>,
    options: &ParseOptions,
) -> ProjectFile {
    let outline = parse_outline(&text, options);
    for error in &outline.errors {
        log::debug!("{}: {}", path.display(), error);
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_string();

    ProjectFile {
        path: path.to_path_buf(),
        extension,
        modified,
        text,
        indent_unit: outline.indent_unit,
        root: outline.root,
        errors: outline.errors,
    }
}

/// Replace the contents of `path` atomically.
pub fn save_project_text(path: &Path, content: &str) -> Result<(), WriteError> {
    atomic_write(path, content.as_bytes()).map_err(|e| {
        log::warn!("write to {} failed, original kept: {}", path.display(), e);
        WriteError {
            path: path.to_path_buf(),
            source: e,
        }
    })?;
    log::debug!("wrote {} ({} bytes)", path.display(), content.len());
    Ok(())
}

/// Create a new project file. Fails with `AlreadyExists` instead of
/// replacing a file that is already at `path`, even one created a moment ago.
pub fn create_project_text(path: &Path, content: &str) -> Result<(), WriteError> {
    atomic_create(path, content.as_bytes()).map_err(|e| WriteError {
        path: path.to_path_buf(),
        source: e,
    })?;
    log::debug!("created {} ({} bytes)", path.display(), content.len());
    Ok(())
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    atomic_write_with(path, |file| file.write_all(content))
}

/// Like `atomic_write`, but never replaces an existing file.
pub fn atomic_create(path: &Path, content: &[u8]) -> io::Result<()> {
    let tmp = filled_temp(path, |file| file.write_all(content))?;
    tmp.persist_noclobber(path).map_err(|e| e.error)?;
    Ok(())
}

/// Fill a temp file next to `path`, then rename it over `path`.
/// If `fill` fails the temp file is removed and `path` is untouched.
fn atomic_write_with<F>(path: &Path, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let tmp = filled_temp(path, fill)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn filled_temp<F>(path: &Path, fill: F) -> io::Result<NamedTempFile>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    fill(tmp.as_file_mut())?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}
