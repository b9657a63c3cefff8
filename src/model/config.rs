use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where a new action goes inside its project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// Directly after the project's title line
    Start,
    /// After everything already in the project
    #[default]
    End,
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "start" | "top" => Ok(Position::Start),
            "end" | "bottom" => Ok(Position::End),
            _ => Err(format!("invalid position '{}' (expected start or end)", s)),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Start => write!(f, "start"),
            Position::End => write!(f, "end"),
        }
    }
}

/// How to pick a project when an insertion path matches more than one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    /// Shallowest match, then first in file order
    #[default]
    Shallowest,
    /// Refuse to insert
    Strict,
}

/// Settings threaded through every engine entry point.
///
/// Loaded from `$XDG_CONFIG_HOME/na/config.toml`; every field is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Project file extension, without the dot
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Tag that marks a next action
    #[serde(default = "default_tag")]
    pub tag: String,
    /// Directory levels below the starting directory to search (0 = that directory only)
    #[serde(default)]
    pub depth: usize,
    #[serde(default)]
    pub position: Position,
    /// Project that `add` files actions under when none is given
    #[serde(default = "default_inbox")]
    pub inbox: String,
    /// Spaces per indentation level, for files whose own indentation does not set it
    #[serde(default = "default_indent_width")]
    pub indent_width: usize,
    /// Marker that starts an action line
    #[serde(default = "default_action_prefix")]
    pub action_prefix: String,
    /// Directory names never descended into (hidden directories are always skipped)
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
    #[serde(default)]
    pub tie_break: TieBreak,
    /// Pipe long output through `$PAGER`
    #[serde(default = "default_true")]
    pub pager: bool,
    #[serde(default = "default_true")]
    pub color: bool,
    /// Use the repository's project file when inside a git work tree
    #[serde(default = "default_true")]
    pub git_scope: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            extension: default_extension(),
            tag: default_tag(),
            depth: 0,
            position: Position::End,
            inbox: default_inbox(),
            indent_width: default_indent_width(),
            action_prefix: default_action_prefix(),
            ignore: default_ignore(),
            tie_break: TieBreak::Shallowest,
            pager: true,
            color: true,
            git_scope: true,
        }
    }
}

fn default_extension() -> String {
    "taskpaper".to_string()
}

fn default_tag() -> String {
    "na".to_string()
}

fn default_inbox() -> String {
    "Inbox".to_string()
}

fn default_indent_width() -> usize {
    4
}

fn default_action_prefix() -> String {
    "- ".to_string()
}

fn default_ignore() -> Vec<String> {
    ["node_modules", "target", "vendor"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}
