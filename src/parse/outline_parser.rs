use crate::model::action::Action;
use crate::model::config::Config;
use crate::model::project::Project;
use crate::parse::tag_parser::{TagScan, parse_tags};

/// Kind of non-fatal problem found while parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("malformed indentation")]
    MalformedIndentation,
    #[error("action outside of any project")]
    OrphanedAction,
    #[error("malformed tag `{0}`")]
    MalformedTag(String),
}

/// A problem on one line. The line is still kept in the tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {}: {kind}", .line + 1)]
pub struct ParseError {
    /// 0-indexed line offset
    pub line: usize,
    pub kind: ParseErrorKind,
}

/// Outline conventions used by the parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Spaces per indentation level when the file's first indented line
    /// does not start with spaces (a tab is always one level)
    pub indent_width: usize,
    /// Marker that starts an action line
    pub action_prefix: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            indent_width: 4,
            action_prefix: "- ".to_string(),
        }
    }
}

impl From<&Config> for ParseOptions {
    fn from(config: &Config) -> Self {
        ParseOptions {
            indent_width: config.indent_width.max(1),
            action_prefix: config.action_prefix.clone(),
        }
    }
}

/// Result of parsing one file's text
#[derive(Debug, Clone)]
pub struct ParsedOutline {
    pub root: Project,
    pub errors: Vec<ParseError>,
    /// Indentation the file uses for one level
    pub indent_unit: String,
}

/// What a single non-blank line is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind<'a> {
    Project { title: &'a str, tags: &'a str },
    Action { body: &'a str },
    Note { text: &'a str },
}

/// Parse outline text into a project tree.
///
/// Single pass over the lines with a stack of open projects. A line at
/// indentation level `n` closes every open project deeper than `n`; a project
/// line then opens a child of whatever is left on top.
pub fn parse_outline(source: &str, options: &ParseOptions) -> ParsedOutline {
    let indent_unit = detect_indent_unit(source);
    let mut builder = OutlineBuilder::new(options, space_width(&indent_unit, options));
    for (idx, line) in source.lines().enumerate() {
        builder.feed(idx, line);
    }
    builder.finish(indent_unit)
}

struct OutlineBuilder<'o> {
    options: &'o ParseOptions,
    /// Spaces per level for this file
    indent_width: usize,
    root: Project,
    /// Open projects, outermost first. The root is kept separately and never closed.
    open: Vec<Project>,
    errors: Vec<ParseError>,
    /// Indentation level of the last action, while it is still the most recent item
    last_action_level: Option<usize>,
}

impl<'o> OutlineBuilder<'o> {
    fn new(options: &'o ParseOptions, indent_width: usize) -> Self {
        OutlineBuilder {
            options,
            indent_width,
            root: Project::root(),
            open: Vec::new(),
            errors: Vec::new(),
            last_action_level: None,
        }
    }

    fn top_depth(&self) -> usize {
        self.open.last().map_or(0, |p| p.depth)
    }

    fn top_mut(&mut self) -> &mut Project {
        match self.open.last_mut() {
            Some(project) => project,
            None => &mut self.root,
        }
    }

    /// Pop: attach the innermost open project to its parent.
    fn close_one(&mut self) {
        if let Some(done) = self.open.pop() {
            self.top_mut().children.push(done);
        }
    }

    fn close_deeper_than(&mut self, level: usize) {
        while self.top_depth() > level {
            self.close_one();
        }
    }

    fn error(&mut self, line: usize, kind: ParseErrorKind) {
        self.errors.push(ParseError { line, kind });
    }

    fn record_tags(&mut self, line: usize, scan: &TagScan) {
        for token in &scan.malformed {
            self.error(line, ParseErrorKind::MalformedTag(token.clone()));
        }
    }

    /// Every open project (and the root) now covers `line`.
    fn extend_spans(&mut self, line: usize) {
        self.root.span.extend_to(line + 1);
        for project in &mut self.open {
            project.span.extend_to(line + 1);
        }
    }

    fn feed(&mut self, idx: usize, line: &str) {
        if line.trim().is_empty() {
            return;
        }

        let (level, aligned) = measure_indent(line, self.indent_width);
        if !aligned {
            self.error(idx, ParseErrorKind::MalformedIndentation);
        }
        let content = line.trim();

        match classify(content, &self.options.action_prefix) {
            LineKind::Project { title, tags } => {
                self.close_deeper_than(level);
                if aligned && self.top_depth() < level {
                    self.error(idx, ParseErrorKind::MalformedIndentation);
                }
                let scan = parse_tags(tags);
                self.record_tags(idx, &scan);

                let depth = self.top_depth() + 1;
                let mut project = Project::new(title.to_string(), depth, Some(idx));
                project.tags = scan.tags;
                self.open.push(project);
                self.last_action_level = None;
            }
            LineKind::Action { body } => {
                self.close_deeper_than(level);
                if level == 0 && self.open.is_empty() {
                    self.error(idx, ParseErrorKind::OrphanedAction);
                } else if aligned && self.top_depth() < level {
                    // One level under a preceding action is a nested action, kept flat
                    let nested = self.last_action_level.is_some_and(|l| level == l + 1);
                    if !nested {
                        self.error(idx, ParseErrorKind::MalformedIndentation);
                    }
                }
                let scan = parse_tags(body);
                self.record_tags(idx, &scan);

                let action = Action {
                    text: body.to_string(),
                    tags: scan.tags,
                    notes: Vec::new(),
                    line: idx,
                    level,
                };
                self.top_mut().actions.push(action);
                self.last_action_level = Some(level);
            }
            LineKind::Note { text } => {
                self.close_deeper_than(level);
                let under_action = self.last_action_level.is_some_and(|l| level > l);
                let top = self.top_mut();
                let attached = match top.actions.last_mut() {
                    Some(action) if under_action => {
                        action.notes.push(text.to_string());
                        true
                    }
                    _ => {
                        top.notes.push(text.to_string());
                        false
                    }
                };
                if !attached {
                    self.last_action_level = None;
                }
            }
        }

        self.extend_spans(idx);
    }

    fn finish(mut self, indent_unit: String) -> ParsedOutline {
        while !self.open.is_empty() {
            self.close_one();
        }
        ParsedOutline {
            root: self.root,
            errors: self.errors,
            indent_unit,
        }
    }
}

fn classify<'a>(content: &'a str, action_prefix: &str) -> LineKind<'a> {
    if let Some(body) = content.strip_prefix(action_prefix) {
        return LineKind::Action { body: body.trim() };
    }
    let bare_prefix = action_prefix.trim_end();
    if !bare_prefix.is_empty() && content == bare_prefix {
        return LineKind::Action { body: "" };
    }
    if let Some((title, tags)) = split_project_line(content) {
        return LineKind::Project { title, tags };
    }
    LineKind::Note { text: content }
}

/// Split `Title:` or `Title: @tag @other(x)` into title and tag text.
fn split_project_line(content: &str) -> Option<(&str, &str)> {
    let mut search_end = content.len();
    while let Some(colon) = content[..search_end].rfind(':') {
        let tail = content[colon + 1..].trim();
        if tail.split_whitespace().all(|word| word.starts_with('@')) {
            let title = content[..colon].trim_end();
            if title.is_empty() {
                return None;
            }
            return Some((title, tail));
        }
        search_end = colon;
    }
    None
}

/// Indentation level of a line and whether its spaces align to the width.
/// Tabs count one level each; spaces count `width` per level, and a partial
/// level rounds up.
pub fn measure_indent(line: &str, width: usize) -> (usize, bool) {
    let width = width.max(1);
    let mut tabs = 0usize;
    let mut spaces = 0usize;
    for c in line.chars() {
        match c {
            '\t' => tabs += 1,
            ' ' => spaces += 1,
            _ => break,
        }
    }
    (tabs + spaces.div_ceil(width), spaces % width == 0)
}

/// The first indented line decides whether the file indents with tabs or
/// spaces, and for spaces how many make one level.
fn detect_indent_unit(source: &str) -> String {
    for line in source.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with('\t') {
            return "\t".to_string();
        }
        if line.starts_with(' ') {
            let run = line.chars().take_while(|c| *c == ' ').count();
            return " ".repeat(run);
        }
    }
    "\t".to_string()
}

/// Spaces per level: the file's own unit when it indents with spaces,
/// otherwise the configured width (for stray space-indented lines).
fn space_width(indent_unit: &str, options: &ParseOptions) -> usize {
    if indent_unit.starts_with(' ') {
        indent_unit.len()
    } else {
        options.indent_width.max(1)
    }
}
