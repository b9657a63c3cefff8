use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::Serialize;

use super::action::{Action, Tag};
use crate::parse::outline_parser::ParseError;
use crate::parse::span::SourceSpan;

/// A named node of the outline. The file root is an untitled project at depth 0.
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    /// Title without the trailing colon (empty for the file root)
    pub title: String,
    /// 0 for the file root, 1 for top-level projects, and so on
    pub depth: usize,
    /// Tags written after the title's colon
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    /// Note lines directly under the project
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    /// Actions directly under this project, in file order
    pub actions: Vec<Action>,
    /// Sub-projects, in file order
    pub children: Vec<Project>,

    // --- Source tracking ---
    /// Line offset of the title line (None for the file root)
    #[serde(skip)]
    pub line: Option<usize>,
    /// Lines covered by the title and everything under it, trailing blanks excluded
    #[serde(skip)]
    pub span: SourceSpan,
}

/// A project together with its title path from the file root
#[derive(Debug, Clone)]
pub struct ProjectEntry<'a> {
    pub path: Vec<&'a str>,
    pub project: &'a Project,
}

impl Project {
    /// The untitled root node of a file
    pub fn root() -> Self {
        Project::new(String::new(), 0, None)
    }

    pub fn new(title: String, depth: usize, line: Option<usize>) -> Self {
        let start = line.unwrap_or(0);
        let end = line.map_or(0, |l| l + 1);
        Project {
            title,
            depth,
            tags: Vec::new(),
            notes: Vec::new(),
            actions: Vec::new(),
            children: Vec::new(),
            line,
            span: SourceSpan::new(start, end),
        }
    }

    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    /// Every project in depth-first pre-order, starting with `self`.
    pub fn preorder(&self) -> Vec<ProjectEntry<'_>> {
        let mut out = Vec::new();
        collect_preorder(self, &mut Vec::new(), &mut out);
        out
    }

    /// Total number of actions in this project and all sub-projects
    pub fn action_count(&self) -> usize {
        self.actions.len()
            + self
                .children
                .iter()
                .map(Project::action_count)
                .sum::<usize>()
    }
}

fn collect_preorder<'a>(
    project: &'a Project,
    path: &mut Vec<&'a str>,
    out: &mut Vec<ProjectEntry<'a>>,
) {
    if !project.is_root() {
        path.push(&project.title);
    }
    out.push(ProjectEntry {
        path: path.clone(),
        project,
    });
    for child in &project.children {
        collect_preorder(child, path, out);
    }
    if !project.is_root() {
        path.pop();
    }
}

/// Structural equality: line offsets and spans are ignored.
impl PartialEq for Project {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title
            && self.depth == other.depth
            && self.tags == other.tags
            && self.notes == other.notes
            && self.actions == other.actions
            && self.children == other.children
    }
}

impl Eq for Project {}

/// A parsed project file on disk
#[derive(Debug, Clone)]
pub struct ProjectFile {
    /// Absolute path of the file
    pub path: PathBuf,
    /// File extension (without the dot)
    pub extension: String,
    /// Last modification time, when the filesystem reports one
    pub modified: Option<DateTime<Local>>,
    /// Raw file contents at parse time
    pub text: String,
    /// Indentation written for one level (`"\t"` unless the file uses spaces)
    pub indent_unit: String,
    /// Root of the outline tree
    pub root: Project,
    /// Non-fatal problems found while parsing
    pub errors: Vec<ParseError>,
}

impl ProjectFile {
    /// File name for display, falling back to the full path
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}
