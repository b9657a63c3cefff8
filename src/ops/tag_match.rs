use std::cmp::Ordering;

use crate::model::action::Action;
use crate::model::query::{Comparison, MatchQuery, TagExpr, TagPredicate};

/// Tag that marks a finished action
pub const DONE_TAG: &str = "done";

/// Does `action` satisfy `query`?
///
/// Finished actions (`@done`) never match unless the query asks for them,
/// either through `include_done` or by querying the `done` tag itself.
pub fn matches(action: &Action, query: &MatchQuery) -> bool {
    let wants_done = query.include_done || query.tag.key.eq_ignore_ascii_case(DONE_TAG);
    if !wants_done && action.has_tag(DONE_TAG) {
        return false;
    }
    matches_tag(action, &query.tag)
}

/// Does any tag on `action` satisfy `expr`? Keys compare case-insensitively.
pub fn matches_tag(action: &Action, expr: &TagExpr) -> bool {
    action
        .tags
        .iter()
        .filter(|tag| tag.has_key(&expr.key))
        .any(|tag| match &expr.predicate {
            None => true,
            Some(predicate) => compare(tag.value.as_deref().unwrap_or(""), predicate),
        })
}

/// Compare a tag value against a predicate.
///
/// Equality and ordering are numeric when both sides look like numbers and
/// lexical (case-insensitive) otherwise. Containment, prefix and suffix checks
/// are always lexical.
pub fn compare(actual: &str, predicate: &TagPredicate) -> bool {
    let expected = predicate.value.as_str();
    match predicate.comparison {
        Comparison::Contains => actual.to_lowercase().contains(&expected.to_lowercase()),
        Comparison::StartsWith => actual.to_lowercase().starts_with(&expected.to_lowercase()),
        Comparison::EndsWith => actual.to_lowercase().ends_with(&expected.to_lowercase()),
        Comparison::Equals => order(actual, expected) == Ordering::Equal,
        Comparison::NotEquals => order(actual, expected) != Ordering::Equal,
        Comparison::Less => order(actual, expected) == Ordering::Less,
        Comparison::LessOrEqual => order(actual, expected) != Ordering::Greater,
        Comparison::Greater => order(actual, expected) == Ordering::Greater,
        Comparison::GreaterOrEqual => order(actual, expected) != Ordering::Less,
    }
}

fn order(a: &str, b: &str) -> Ordering {
    if let (Some(x), Some(y)) = (parse_number(a), parse_number(b))
        && let Some(ord) = x.partial_cmp(&y)
    {
        return ord;
    }
    a.trim().to_lowercase().cmp(&b.trim().to_lowercase())
}

/// Parse plain decimal numbers only: optional sign, digits, at most one dot.
fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    let looks_numeric = digits.chars().any(|c| c.is_ascii_digit())
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.matches('.').count() <= 1;
    if !looks_numeric {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::action::Tag;
    use crate::model::query::Scope;
    use std::path::PathBuf;

    fn action(tags: Vec<Tag>) -> Action {
        Action {
            text: String::new(),
            tags,
            notes: Vec::new(),
            line: 0,
            level: 1,
        }
    }

    fn query(expr: &str) -> MatchQuery {
        MatchQuery::new(
            expr.parse().unwrap(),
            Scope::File(PathBuf::from("/tmp/x.taskpaper")),
        )
    }

    #[test]
    fn test_key_only_matches_any_value() {
        let a = action(vec![Tag::new("NA", None)]);
        assert!(matches(&a, &query("na")));
        let b = action(vec![Tag::new("na", Some("whatever".into()))]);
        assert!(matches(&b, &query("na")));
    }

    #[test]
    fn test_missing_key_never_matches() {
        let a = action(vec![Tag::new("waiting", None)]);
        assert!(!matches(&a, &query("na")));
        assert!(!matches(&a, &query("na!=x")));
        assert!(!matches(&action(Vec::new()), &query("na")));
    }

    #[test]
    fn test_numeric_comparison() {
        let a = action(vec![Tag::new("priority", Some("10".into()))]);
        assert!(matches(&a, &query("priority>9")));
        assert!(matches(&a, &query("priority>=10")));
        assert!(matches(&a, &query("priority=10.0")));
        assert!(!matches(&a, &query("priority<9")));
        // Lexically "10" < "9"; numerically it is not
        assert!(!matches(&a, &query("priority<=9")));
    }

    #[test]
    fn test_lexical_fallback() {
        let a = action(vec![Tag::new("due", Some("2025-03-01".into()))]);
        assert!(matches(&a, &query("due<2025-04-01")));
        assert!(matches(&a, &query("due>2025-02-28")));
        assert!(matches(&a, &query("due^=2025")));
        assert!(matches(&a, &query("due$=-01")));
        assert!(matches(&a, &query("due*=03")));

        let b = action(vec![Tag::new("context", Some("Home".into()))]);
        assert!(matches(&b, &query("context=home")));
        assert!(matches(&b, &query("context!=office")));
        // Mixed numeric/text compares lexically
        assert!(matches(&b, &query("context>3")));
    }

    #[test]
    fn test_value_predicate_on_bare_tag() {
        let a = action(vec![Tag::new("flag", None)]);
        assert!(matches(&a, &query("flag=")));
        assert!(!matches(&a, &query("flag=x")));
    }

    #[test]
    fn test_done_actions_hidden_by_default() {
        let a = action(vec![Tag::new("na", None), Tag::new("done", Some("2025-01-01".into()))]);
        assert!(!matches(&a, &query("na")));

        let mut q = query("na");
        q.include_done = true;
        assert!(matches(&a, &q));

        assert!(matches(&a, &query("done")));
    }

    #[test]
    fn test_matching_is_deterministic() {
        let a = action(vec![Tag::new("priority", Some("3".into()))]);
        let q = query("priority>=3");
        let first = matches(&a, &q);
        let second = matches(&a, &q);
        assert_eq!(first, second);
        assert_eq!(a.tags, vec![Tag::new("priority", Some("3".into()))]);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("3"), Some(3.0));
        assert_eq!(parse_number("-2.5"), Some(-2.5));
        assert_eq!(parse_number("nan"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("1.2.3"), None);
        assert_eq!(parse_number("."), None);
        assert_eq!(parse_number(""), None);
    }
}
