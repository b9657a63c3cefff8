use serde::{Deserialize, Serialize};
use std::fmt;

/// An inline `@key` or `@key(value)` annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag key as written (compare with `has_key`, which ignores case)
    pub key: String,
    /// Value inside the parentheses, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: Option<String>) -> Self {
        Tag {
            key: key.into(),
            value,
        }
    }

    /// Case-insensitive key comparison
    pub fn has_key(&self, key: &str) -> bool {
        self.key.to_lowercase() == key.to_lowercase()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "@{}({})", self.key, value),
            None => write!(f, "@{}", self.key),
        }
    }
}

/// A single action line inside a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Line body after the indentation and action prefix, tags included
    pub text: String,
    /// Tags extracted from the body, in order of appearance
    pub tags: Vec<Tag>,
    /// Note lines attached below the action (trimmed)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,

    // --- Source tracking ---
    /// 0-indexed line offset in the file at parse time
    pub line: usize,
    /// Indentation level of the line as written
    #[serde(skip)]
    pub level: usize,
}

impl Action {
    /// First tag with the given key (case-insensitive)
    pub fn tag(&self, key: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.has_key(key))
    }

    pub fn has_tag(&self, key: &str) -> bool {
        self.tag(key).is_some()
    }
}

/// Structural equality: source offsets are not part of an action's shape.
impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.tags == other.tags && self.notes == other.notes
    }
}

impl Eq for Action {}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(text: &str, tags: Vec<Tag>, line: usize) -> Action {
        Action {
            text: text.to_string(),
            tags,
            notes: Vec::new(),
            line,
            level: 1,
        }
    }

    #[test]
    fn test_tag_display() {
        assert_eq!(Tag::new("na", None).to_string(), "@na");
        assert_eq!(
            Tag::new("due", Some("2025-01-02".into())).to_string(),
            "@due(2025-01-02)"
        );
    }

    #[test]
    fn test_tag_lookup_ignores_case() {
        let a = action("ship it @NA", vec![Tag::new("NA", None)], 3);
        assert!(a.has_tag("na"));
        assert!(a.has_tag("Na"));
        assert!(!a.has_tag("done"));
    }

    #[test]
    fn test_structural_eq_ignores_offsets() {
        let a = action("ship it", Vec::new(), 1);
        let b = action("ship it", Vec::new(), 9);
        assert_eq!(a, b);
    }
}
