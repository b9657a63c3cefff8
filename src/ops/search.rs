use std::ops::Range;

use regex::Regex;

use crate::model::action::Action;
use crate::model::query::Scope;
use crate::ops::index::{ActionIndex, ActionMatch};
use crate::ops::tag_match::DONE_TAG;

/// Which part of an action matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchField {
    Text,
    /// One of the action's note lines (by index)
    Note(usize),
}

/// An action whose text or notes matched a pattern
#[derive(Debug, Clone)]
pub struct SearchHit<'a> {
    pub found: ActionMatch<'a>,
    pub field: MatchField,
    /// Byte ranges of the matches within that field
    pub spans: Vec<Range<usize>>,
}

/// Collect all non-overlapping match byte-ranges for a regex in the given text.
fn find_matches(re: &Regex, text: &str) -> Vec<Range<usize>> {
    re.find_iter(text).map(|m| m.start()..m.end()).collect()
}

/// First field of `action` that matches, text before notes
fn search_action(re: &Regex, action: &Action) -> Option<(MatchField, Vec<Range<usize>>)> {
    let spans = find_matches(re, &action.text);
    if !spans.is_empty() {
        return Some((MatchField::Text, spans));
    }
    action.notes.iter().enumerate().find_map(|(i, note)| {
        let spans = find_matches(re, note);
        (!spans.is_empty()).then_some((MatchField::Note(i), spans))
    })
}

/// Search action text (and notes) across the index, in query order.
///
/// Finished actions are skipped unless `include_done` is set.
pub fn search_actions<'a>(
    index: &'a ActionIndex,
    re: &Regex,
    scope: Option<&Scope>,
    include_done: bool,
) -> Vec<SearchHit<'a>> {
    index
        .select(scope, |action| {
            (include_done || !action.has_tag(DONE_TAG)) && search_action(re, action).is_some()
        })
        .into_iter()
        .filter_map(|found| {
            let (field, spans) = search_action(re, found.action)?;
            Some(SearchHit { found, field, spans })
        })
        .collect()
}

/// Case-insensitive regex for a user-supplied search pattern
pub fn build_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    regex::RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
}
