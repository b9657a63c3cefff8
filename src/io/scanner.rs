use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::model::config::Config;
use crate::model::query::{QueryError, Scope};

/// What the scanner looks for and what it skips
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Project file extension, without the dot (matched case-insensitively)
    pub extension: String,
    /// Directory names never descended into
    pub ignore: Vec<String>,
}

impl From<&Config> for ScanOptions {
    fn from(config: &Config) -> Self {
        ScanOptions {
            extension: config.extension.trim_start_matches('.').to_string(),
            ignore: config.ignore.clone(),
        }
    }
}

/// A candidate project file found by a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// Directory levels between the scan root and the file (0 = in the root)
    pub depth: usize,
}

/// A per-entry problem. The scan carries on past it.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("symlink loop at {path}")]
    Loop { path: PathBuf },
}

impl ScanError {
    pub fn path(&self) -> &Path {
        match self {
            ScanError::Io { path, .. } | ScanError::Loop { path } => path,
        }
    }
}

impl From<walkdir::Error> for ScanError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        if err.loop_ancestor().is_some() {
            return ScanError::Loop { path };
        }
        let source = err
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
        ScanError::Io { path, source }
    }
}

/// Lazy walk over the project files under a root.
///
/// Entries come out depth-first in file-name order. Symlinks are followed,
/// but every real path is visited at most once.
pub struct Scan {
    walker: walkdir::IntoIter,
    options: ScanOptions,
    visited: HashSet<PathBuf>,
}

/// Walk `root` looking for project files at most `max_depth` directory levels down.
pub fn scan(root: &Path, max_depth: usize, options: &ScanOptions) -> Scan {
    let walker = WalkDir::new(root)
        .follow_links(true)
        .max_depth(max_depth.saturating_add(1))
        .sort_by_file_name()
        .into_iter();
    Scan {
        walker,
        options: options.clone(),
        visited: HashSet::new(),
    }
}

impl Scan {
    fn is_skipped_dir(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        name.starts_with('.') || self.options.ignore.iter().any(|i| *i == name)
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.options.extension))
    }

    /// Record the real path; false if it was seen before in this scan.
    fn first_visit(&mut self, path: &Path) -> bool {
        let real = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.visited.insert(real)
    }
}

impl Iterator for Scan {
    type Item = Result<ScannedFile, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let err = ScanError::from(err);
                    log::warn!("skipping: {}", err);
                    return Some(Err(err));
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                let skip = (entry.depth() > 0 && self.is_skipped_dir(&entry))
                    || !self.first_visit(entry.path());
                if skip {
                    log::debug!("not descending into {}", entry.path().display());
                    self.walker.skip_current_dir();
                }
                continue;
            }

            if !file_type.is_file() || !self.has_extension(entry.path()) {
                continue;
            }
            if !self.first_visit(entry.path()) {
                log::debug!("already visited {}", entry.path().display());
                continue;
            }

            return Some(Ok(ScannedFile {
                path: entry.path().to_path_buf(),
                depth: entry.depth().saturating_sub(1),
            }));
        }
    }
}

/// Files of a scope, plus whatever went wrong while finding them
#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<ScannedFile>,
    pub errors: Vec<ScanError>,
}

impl Discovery {
    /// Order files so the one that should serve as "the" project file comes
    /// first: shallowest, then first found.
    pub fn shallowest_first(&mut self) {
        self.files.sort_by_key(|f| f.depth);
    }

    pub fn primary(&self) -> Option<&ScannedFile> {
        self.files.iter().min_by_key(|f| f.depth)
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/// Resolve a scope to its candidate files.
pub fn discover(scope: &Scope, options: &ScanOptions) -> Result<Discovery, QueryError> {
    scope.validate()?;
    let mut discovery = Discovery::default();
    match scope {
        Scope::File(path) => discovery.files.push(ScannedFile {
            path: path.clone(),
            depth: 0,
        }),
        Scope::Files(paths) => {
            discovery
                .files
                .extend(paths.iter().map(|p| ScannedFile {
                    path: p.clone(),
                    depth: 0,
                }));
        }
        Scope::Directory { root, depth } => {
            for item in scan(root, *depth, options) {
                match item {
                    Ok(file) => discovery.files.push(file),
                    Err(err) => discovery.errors.push(err),
                }
            }
            log::debug!(
                "found {} project file(s) under {}",
                discovery.files.len(),
                root.display()
            );
        }
    }
    Ok(discovery)
}
