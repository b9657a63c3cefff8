use std::path::Path;

use crate::io::project_io::{LoadError, load_project_file};
use crate::model::action::Action;
use crate::model::project::{Project, ProjectEntry, ProjectFile};
use crate::model::query::{MatchQuery, Scope};
use crate::ops::tag_match;
use crate::parse::{ParseError, ParseOptions};

/// One action found by a query, with where it lives
#[derive(Debug, Clone)]
pub struct ActionMatch<'a> {
    pub file: &'a ProjectFile,
    pub project: &'a Project,
    /// Titles from the file root to the owning project (empty for the root)
    pub project_path: Vec<&'a str>,
    pub action: &'a Action,
}

/// Parsed project files, kept in the order they were discovered
#[derive(Debug, Default)]
pub struct ActionIndex {
    files: Vec<ProjectFile>,
    failures: Vec<LoadError>,
}

impl ActionIndex {
    /// Read and parse every path. A file that cannot be read is recorded
    /// and skipped; the rest are still indexed.
    pub fn build<I, P>(paths: I, options: &ParseOptions) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut index = ActionIndex::default();
        for path in paths {
            let path = path.as_ref();
            if index.files.iter().any(|f| f.path.as_path() == path) {
                continue;
            }
            match load_project_file(path, options) {
                Ok(file) => {
                    if !file.errors.is_empty() {
                        log::info!(
                            "{}: {} parse problem(s)",
                            path.display(),
                            file.errors.len()
                        );
                    }
                    index.files.push(file);
                }
                Err(e) => {
                    log::warn!("{}", e);
                    index.failures.push(e);
                }
            }
        }
        index
    }

    /// Index already-parsed files, in the given order.
    pub fn from_files(files: Vec<ProjectFile>) -> Self {
        ActionIndex {
            files,
            failures: Vec::new(),
        }
    }

    /// Files in discovery order
    pub fn files(&self) -> &[ProjectFile] {
        &self.files
    }

    /// Files that could not be read
    pub fn failures(&self) -> &[LoadError] {
        &self.failures
    }

    /// Every parse problem, tagged with its file
    pub fn parse_errors(&self) -> Vec<(&Path, &ParseError)> {
        self.files
            .iter()
            .flat_map(|f| f.errors.iter().map(move |e| (f.path.as_path(), e)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Actions matching a tag query, ordered by file path, then by line
    /// offset within the file.
    pub fn query(&self, query: &MatchQuery) -> Vec<ActionMatch<'_>> {
        self.select(Some(&query.scope), |action| tag_match::matches(action, query))
    }

    /// Actions in `scope` (or everywhere) accepted by `keep`, in query order.
    pub fn select<F>(&self, scope: Option<&Scope>, keep: F) -> Vec<ActionMatch<'_>>
    where
        F: Fn(&Action) -> bool,
    {
        let mut results = Vec::new();
        for file in self.files_by_path() {
            if scope.is_some_and(|s| !s.contains(&file.path)) {
                continue;
            }
            let mut found = Vec::new();
            for entry in file.root.preorder() {
                for action in entry.project.actions.iter().filter(|a| keep(*a)) {
                    found.push(ActionMatch {
                        file,
                        project: entry.project,
                        project_path: entry.path.clone(),
                        action,
                    });
                }
            }
            // Source order, even when a parent's actions follow a subproject
            found.sort_by_key(|m| m.action.line);
            results.extend(found);
        }
        results
    }

    /// Every file's projects in pre-order, files ordered by path
    pub fn projects(&self) -> Vec<(&ProjectFile, Vec<ProjectEntry<'_>>)> {
        self.files_by_path()
            .into_iter()
            .map(|file| {
                let entries = file
                    .root
                    .preorder()
                    .into_iter()
                    .filter(|e| !e.project.is_root())
                    .collect();
                (file, entries)
            })
            .collect()
    }

    fn files_by_path(&self) -> Vec<&ProjectFile> {
        let mut files: Vec<&ProjectFile> = self.files.iter().collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }
}
