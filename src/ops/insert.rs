use std::fs;
use std::path::{Path, PathBuf};

use crate::io::project_io::{LoadError, WriteError, load_project_file, save_project_text};
use crate::model::config::{Config, Position, TieBreak};
use crate::model::project::{Project, ProjectFile};
use crate::ops::index::ActionIndex;
use crate::parse::ParseOptions;

/// Error type for adding an action
#[derive(Debug, thiserror::Error)]
pub enum InsertError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("'{target}' matches more than one project in {path}: {}", .candidates.join(", "))]
    AmbiguousTarget {
        path: PathBuf,
        target: String,
        candidates: Vec<String>,
    },
    #[error("action text is empty")]
    EmptyAction,
    #[error("no project file to add to")]
    NoFile,
}

/// Exactly where new text will be spliced into a file.
///
/// Computed fresh for every mutation and never cached: line offsets are only
/// valid for the file content they were resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionTarget {
    pub path: PathBuf,
    /// Titles from the file root to the project receiving the action,
    /// including any that will be created
    pub project_path: Vec<String>,
    /// The new lines go before this line offset
    pub line: usize,
    /// Indentation the file uses for one level
    pub indent_unit: String,
    /// Depth of the deepest project that already exists (0 = file root)
    pub depth: usize,
    /// Missing project titles, outermost first, created under that project
    pub create: Vec<String>,
}

impl InsertionTarget {
    /// Indentation level of the action line itself
    pub fn action_level(&self) -> usize {
        self.depth + self.create.len()
    }
}

/// An action to add, with optional note lines under it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewAction {
    pub text: String,
    pub notes: Vec<String>,
}

impl NewAction {
    pub fn new(text: impl Into<String>) -> Self {
        NewAction {
            text: text.into(),
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertOptions {
    pub parse: ParseOptions,
    pub tie_break: TieBreak,
}

impl From<&Config> for InsertOptions {
    fn from(config: &Config) -> Self {
        InsertOptions {
            parse: ParseOptions::from(config),
            tie_break: config.tie_break,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolve
// ---------------------------------------------------------------------------

/// Resolve where an action for `project_path` goes in `file`.
///
/// An existing project matches when its title path ends with `project_path`
/// (case-insensitive). If none does, the longest leading part of the path
/// that exists is the parent and the rest is created at its end.
/// An empty path targets the file root.
pub fn resolve(
    file: &ProjectFile,
    project_path: &[String],
    position: Position,
    opts: &InsertOptions,
) -> Result<InsertionTarget, InsertError> {
    let wanted = clean_path(project_path);
    let candidates = matching_projects(file, &wanted);
    let target = match pick(&candidates, &wanted, opts.tie_break)? {
        Some(found) => existing_target(found, position),
        None => created_target(file, &wanted),
    };
    log::debug!(
        "insert into {} at line {} ({})",
        target.path.display(),
        target.line,
        target.project_path.join(" > ")
    );
    Ok(target)
}

/// Resolve across every indexed file. Matches are ranked as if all files were
/// one outline in scan order; with no match anywhere, the missing projects are
/// created in the first file.
pub fn resolve_in_index(
    index: &ActionIndex,
    project_path: &[String],
    position: Position,
    opts: &InsertOptions,
) -> Result<InsertionTarget, InsertError> {
    let first = index.files().first().ok_or(InsertError::NoFile)?;
    let wanted = clean_path(project_path);
    if wanted.is_empty() {
        return resolve(first, &wanted, position, opts);
    }

    let candidates: Vec<Candidate<'_>> = index
        .files()
        .iter()
        .flat_map(|file| matching_projects(file, &wanted))
        .collect();
    let target = match pick(&candidates, &wanted, opts.tie_break)? {
        Some(found) => existing_target(found, position),
        None => created_target(first, &wanted),
    };
    Ok(target)
}

struct Candidate<'a> {
    file: &'a ProjectFile,
    project: &'a Project,
    path: Vec<String>,
}

fn clean_path(project_path: &[String]) -> Vec<String> {
    project_path
        .iter()
        .map(|t| t.trim().trim_end_matches(':').trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn same_title(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn matching_projects<'a>(file: &'a ProjectFile, wanted: &[String]) -> Vec<Candidate<'a>> {
    if wanted.is_empty() {
        return vec![Candidate {
            file,
            project: &file.root,
            path: Vec::new(),
        }];
    }
    file.root
        .preorder()
        .into_iter()
        .filter(|entry| {
            entry.path.len() >= wanted.len()
                && entry.path[entry.path.len() - wanted.len()..]
                    .iter()
                    .zip(wanted)
                    .all(|(have, want)| same_title(have, want))
        })
        .map(|entry| Candidate {
            file,
            project: entry.project,
            path: entry.path.iter().map(|t| t.to_string()).collect(),
        })
        .collect()
}

/// Pick the project to insert into: shallowest, then first in order.
/// More than one candidate is an error under the strict policy.
fn pick<'c, 'a>(
    candidates: &'c [Candidate<'a>],
    wanted: &[String],
    tie_break: TieBreak,
) -> Result<Option<&'c Candidate<'a>>, InsertError> {
    if candidates.len() > 1 {
        if tie_break == TieBreak::Strict {
            return Err(InsertError::AmbiguousTarget {
                path: candidates[0].file.path.clone(),
                target: wanted.join(" > "),
                candidates: candidates.iter().map(|c| c.path.join(" > ")).collect(),
            });
        }
        log::info!(
            "'{}' matches {} projects, using the shallowest",
            wanted.join(" > "),
            candidates.len()
        );
    }
    Ok(candidates.iter().min_by_key(|c| c.project.depth))
}

fn existing_target(found: &Candidate<'_>, position: Position) -> InsertionTarget {
    let project = found.project;
    let line = match position {
        Position::Start => project.line.map_or(0, |l| l + 1),
        Position::End => project.span.end(),
    };
    InsertionTarget {
        path: found.file.path.clone(),
        project_path: found.path.clone(),
        line,
        indent_unit: found.file.indent_unit.clone(),
        depth: project.depth,
        create: Vec::new(),
    }
}

/// Walk down from the root as far as the path exists, then plan the rest.
fn created_target(file: &ProjectFile, wanted: &[String]) -> InsertionTarget {
    let mut parent = &file.root;
    let mut found = Vec::new();
    for title in wanted {
        match parent.children.iter().find(|c| same_title(&c.title, title)) {
            Some(child) => {
                found.push(child.title.clone());
                parent = child;
            }
            None => break,
        }
    }
    let create = wanted[found.len()..].to_vec();
    let mut project_path = found;
    project_path.extend(create.iter().cloned());

    InsertionTarget {
        path: file.path.clone(),
        project_path,
        line: parent.span.end(),
        indent_unit: file.indent_unit.clone(),
        depth: parent.depth,
        create,
    }
}

// ---------------------------------------------------------------------------
// Splice + atomic replace
// ---------------------------------------------------------------------------

/// Splice the action (and any projects it needs) into the target file and
/// replace the file atomically. Returns the file re-parsed from disk.
///
/// On a write error the original file is left exactly as it was.
pub fn apply(
    target: &InsertionTarget,
    action: &NewAction,
    opts: &InsertOptions,
) -> Result<ProjectFile, InsertError> {
    let new_lines = render(target, action, &opts.parse.action_prefix)?;
    let text = fs::read_to_string(&target.path).map_err(|e| LoadError::Read {
        path: target.path.clone(),
        source: e,
    })?;

    let updated = splice(&text, target.line, &new_lines);
    save_project_text(&target.path, &updated)?;
    log::info!(
        "added to {} under {}",
        target.path.display(),
        if target.project_path.is_empty() {
            "(top level)".to_string()
        } else {
            target.project_path.join(" > ")
        }
    );
    Ok(load_project_file(&target.path, &opts.parse)?)
}

/// Resolve against the file's current content and apply in one go.
pub fn add_action(
    path: &Path,
    project_path: &[String],
    position: Position,
    action: &NewAction,
    opts: &InsertOptions,
) -> Result<ProjectFile, InsertError> {
    if action_body(&action.text, &opts.parse.action_prefix).is_empty() {
        return Err(InsertError::EmptyAction);
    }
    let file = load_project_file(path, &opts.parse)?;
    let target = resolve(&file, project_path, position, opts)?;
    apply(&target, action, opts)
}

/// Action text without surrounding whitespace or a repeated action marker
fn action_body<'t>(text: &'t str, action_prefix: &str) -> &'t str {
    let text = text.trim();
    let bare = action_prefix.trim();
    match text.strip_prefix(action_prefix) {
        Some(rest) => rest.trim(),
        None if !bare.is_empty() && text == bare => "",
        None => text,
    }
}

fn render(
    target: &InsertionTarget,
    action: &NewAction,
    action_prefix: &str,
) -> Result<Vec<String>, InsertError> {
    let mut text_lines = action.text.lines().map(str::trim).filter(|l| !l.is_empty());
    let first = text_lines.next().unwrap_or("");
    let body = action_body(first, action_prefix);
    if body.is_empty() {
        return Err(InsertError::EmptyAction);
    }

    let unit = target.indent_unit.as_str();
    let mut lines = Vec::new();
    for (i, title) in target.create.iter().enumerate() {
        lines.push(format!("{}{}:", unit.repeat(target.depth + i), title));
    }
    let level = target.action_level();
    lines.push(format!("{}{}{}", unit.repeat(level), action_prefix, body));

    let note_indent = unit.repeat(level + 1);
    let notes = text_lines.chain(
        action
            .notes
            .iter()
            .flat_map(|n| n.lines())
            .map(str::trim)
            .filter(|l| !l.is_empty()),
    );
    for note in notes {
        lines.push(format!("{}{}", note_indent, note));
    }
    Ok(lines)
}

/// Insert `new_lines` before line `at`, keeping the file's line endings and
/// whether it ended with a newline.
fn splice(text: &str, at: usize, new_lines: &[String]) -> String {
    let eol = if text.contains("\r\n") { "\r\n" } else { "\n" };
    let mut lines: Vec<&str> = text.lines().collect();
    let at = at.min(lines.len());
    lines.splice(at..at, new_lines.iter().map(String::as_str));

    let mut out = lines.join(eol);
    if text.is_empty() || text.ends_with('\n') {
        out.push_str(eol);
    }
    out
}
