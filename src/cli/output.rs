use std::ops::Range;
use std::path::Path;

use crossterm::style::{Stylize, style};
use serde::Serialize;

use crate::io::project_io::LoadError;
use crate::io::scanner::ScanError;
use crate::model::action::{Action, Tag};
use crate::model::project::ProjectEntry;
use crate::ops::index::ActionMatch;
use crate::ops::search::{MatchField, SearchHit};
use crate::parse::{ParseError, strip_tags};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ActionJson {
    pub file: String,
    pub project: Vec<String>,
    /// 1-based line number
    pub line: usize,
    pub text: String,
    /// Text with the tags removed
    pub title: String,
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// A parse problem, or a file that could not be found or read
#[derive(Serialize)]
pub struct ProblemJson {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
}

#[derive(Serialize)]
pub struct ActionListJson {
    pub actions: Vec<ActionJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub problems: Vec<ProblemJson>,
}

#[derive(Serialize)]
pub struct ProjectJson {
    pub path: Vec<String>,
    pub line: Option<usize>,
    pub actions: usize,
}

#[derive(Serialize)]
pub struct ProjectFileJson {
    pub file: String,
    pub projects: Vec<ProjectJson>,
}

#[derive(Serialize)]
pub struct AddedJson {
    pub file: String,
    pub project: Vec<String>,
    pub line: usize,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn action_to_json(found: &ActionMatch<'_>) -> ActionJson {
    let action = found.action;
    ActionJson {
        file: found.file.path.display().to_string(),
        project: found.project_path.iter().map(|t| t.to_string()).collect(),
        line: action.line + 1,
        text: action.text.clone(),
        title: strip_tags(&action.text),
        tags: action.tags.clone(),
        notes: action.notes.clone(),
    }
}

pub fn problem_to_json(path: &Path, error: &ParseError) -> ProblemJson {
    ProblemJson {
        file: path.display().to_string(),
        line: Some(error.line + 1),
        message: error.kind.to_string(),
    }
}

pub fn scan_error_to_json(error: &ScanError) -> ProblemJson {
    ProblemJson {
        file: error.path().display().to_string(),
        line: None,
        message: error.to_string(),
    }
}

pub fn load_error_to_json(error: &LoadError) -> ProblemJson {
    ProblemJson {
        file: error.path().display().to_string(),
        line: None,
        message: error.to_string(),
    }
}

pub fn project_to_json(entry: &ProjectEntry<'_>) -> ProjectJson {
    ProjectJson {
        path: entry.path.iter().map(|t| t.to_string()).collect(),
        line: entry.project.line.map(|l| l + 1),
        actions: entry.project.actions.len(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Terminal styling, or plain text when color is off
#[derive(Debug, Clone, Copy)]
pub struct Style {
    pub color: bool,
}

impl Style {
    fn header(&self, text: &str) -> String {
        if self.color {
            style(text).bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn project(&self, text: &str) -> String {
        if self.color {
            style(text).blue().to_string()
        } else {
            text.to_string()
        }
    }

    fn tag(&self, text: &str) -> String {
        if self.color {
            style(text).cyan().to_string()
        } else {
            text.to_string()
        }
    }

    fn hit(&self, text: &str) -> String {
        if self.color {
            style(text).yellow().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.color {
            style(text).dark_grey().to_string()
        } else {
            text.to_string()
        }
    }
}

/// Color every `@tag` word in an action's text
fn format_action_text(text: &str, style: Style) -> String {
    text.split(' ')
        .map(|word| {
            if word.len() > 1 && word.starts_with('@') {
                style.tag(word)
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Highlight byte ranges of `text`
fn format_highlighted(text: &str, spans: &[Range<usize>], style: Style) -> String {
    let mut out = String::new();
    let mut last = 0;
    for span in spans {
        if span.start < last || span.end > text.len() {
            continue;
        }
        out.push_str(&text[last..span.start]);
        out.push_str(&style.hit(&text[span.clone()]));
        last = span.end;
    }
    out.push_str(&text[last..]);
    out
}

fn format_file_header(name: &str, style: Style) -> String {
    style.header(&format!("== {} ==", name))
}

fn format_project_path(path: &[&str], style: Style) -> String {
    if path.is_empty() {
        style.dim("(top level)")
    } else {
        style.project(&path.join(" > "))
    }
}

fn format_action_line(found: &ActionMatch<'_>, text: String, style: Style) -> String {
    let done = if found.action.has_tag("done") {
        style.dim(" ✓")
    } else {
        String::new()
    };
    format!(
        "  [{}] {}{}",
        format_project_path(&found.project_path, style),
        text,
        done
    )
}

/// Matches grouped under a header per file, in result order
pub fn format_action_list(matches: &[ActionMatch<'_>], style: Style) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Option<&Path> = None;
    for found in matches {
        if current != Some(found.file.path.as_path()) {
            if current.is_some() {
                lines.push(String::new());
            }
            lines.push(format_file_header(&found.file.display_name(), style));
            current = Some(found.file.path.as_path());
        }
        let text = format_action_text(&found.action.text, style);
        lines.push(format_action_line(found, text, style));
    }
    lines
}

/// Search hits, with the matched parts highlighted
pub fn format_search_hits(hits: &[SearchHit<'_>], style: Style) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Option<&Path> = None;
    for hit in hits {
        let found = &hit.found;
        if current != Some(found.file.path.as_path()) {
            if current.is_some() {
                lines.push(String::new());
            }
            lines.push(format_file_header(&found.file.display_name(), style));
            current = Some(found.file.path.as_path());
        }
        let action: &Action = found.action;
        match hit.field {
            MatchField::Text => {
                let text = format_highlighted(&action.text, &hit.spans, style);
                lines.push(format_action_line(found, text, style));
            }
            MatchField::Note(i) => {
                let text = format_action_text(&action.text, style);
                lines.push(format_action_line(found, text, style));
                if let Some(note) = action.notes.get(i) {
                    lines.push(format!("      {}", format_highlighted(note, &hit.spans, style)));
                }
            }
        }
    }
    lines
}

/// A file's project tree, indented by depth, with action counts
pub fn format_project_tree(name: &str, entries: &[ProjectEntry<'_>], style: Style) -> Vec<String> {
    let mut lines = vec![format_file_header(name, style)];
    for entry in entries {
        let project = entry.project;
        let indent = "  ".repeat(project.depth);
        let count = project.actions.len();
        let count_str = if count == 0 {
            String::new()
        } else {
            style.dim(&format!(" ({})", count))
        };
        lines.push(format!("{}{}{}", indent, style.project(&project.title), count_str));
    }
    lines
}

pub fn format_added(file: &Path, project_path: &[String], text: &str, style: Style) -> String {
    let path: Vec<&str> = project_path.iter().map(String::as_str).collect();
    format!(
        "Added to {} [{}]: {}",
        file.display(),
        format_project_path(&path, style),
        format_action_text(text, style)
    )
}
