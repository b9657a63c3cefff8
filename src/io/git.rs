use std::fs;
use std::path::{Path, PathBuf};

/// The project file belonging to a git repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitScope {
    pub repo_root: PathBuf,
    pub repo_name: String,
    pub file: PathBuf,
}

/// Walk up from `start` looking for a `.git` directory (or worktree file).
pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(".git").exists() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Resolve the repository's canonical project file.
///
/// Prefers `<repo-name>.<extension>` in the repository root, then the first
/// file with the extension there (by name). None outside a repository or when
/// the root has no project file.
pub fn resolve_git_scope(start: &Path, extension: &str) -> Option<GitScope> {
    let repo_root = find_repo_root(start)?;
    let repo_name = repo_root.file_name()?.to_string_lossy().into_owned();

    let named = repo_root.join(format!("{}.{}", repo_name, extension));
    let file = if named.is_file() {
        named
    } else {
        first_with_extension(&repo_root, extension)?
    };

    log::debug!("git scope: {} -> {}", repo_root.display(), file.display());
    Some(GitScope {
        repo_root,
        repo_name,
        file,
    })
}

fn first_with_extension(dir: &Path, extension: &str) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}
