use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

/// Comparison applied between a tag's value and a query value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// `=` or `==`
    Equals,
    /// `!=`
    NotEquals,
    /// `*=`
    Contains,
    /// `^=`
    StartsWith,
    /// `$=`
    EndsWith,
    /// `<`
    Less,
    /// `<=`
    LessOrEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEqual,
}

impl Comparison {
    /// Operator text as written in a query
    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Equals => "=",
            Comparison::NotEquals => "!=",
            Comparison::Contains => "*=",
            Comparison::StartsWith => "^=",
            Comparison::EndsWith => "$=",
            Comparison::Less => "<",
            Comparison::LessOrEqual => "<=",
            Comparison::Greater => ">",
            Comparison::GreaterOrEqual => ">=",
        }
    }

    /// Match the longest operator at the start of `s`.
    /// Returns the comparison and the operator's byte length.
    fn from_prefix(s: &str) -> Option<(Comparison, usize)> {
        const OPERATORS: [(&str, Comparison); 10] = [
            ("==", Comparison::Equals),
            ("!=", Comparison::NotEquals),
            ("*=", Comparison::Contains),
            ("^=", Comparison::StartsWith),
            ("$=", Comparison::EndsWith),
            ("<=", Comparison::LessOrEqual),
            (">=", Comparison::GreaterOrEqual),
            ("=", Comparison::Equals),
            ("<", Comparison::Less),
            (">", Comparison::Greater),
        ];
        OPERATORS
            .iter()
            .find(|(op, _)| s.starts_with(op))
            .map(|(op, cmp)| (*cmp, op.len()))
    }
}

/// A value predicate on a tag: `<comparison> <value>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagPredicate {
    pub comparison: Comparison,
    pub value: String,
}

impl TagPredicate {
    pub fn new(comparison: Comparison, value: impl Into<String>) -> Self {
        TagPredicate {
            comparison,
            value: value.into(),
        }
    }
}

/// Error type for query construction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("empty tag name in query `{0}`")]
    EmptyKey(String),
    #[error("unknown operator in query `{0}`")]
    UnknownOperator(String),
    #[error("scope contains no files")]
    EmptyScope,
}

/// A tag key with an optional value predicate, e.g. `priority>=3`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagExpr {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicate: Option<TagPredicate>,
}

impl TagExpr {
    /// A presence-only expression
    pub fn key(key: impl Into<String>) -> Self {
        TagExpr {
            key: key.into(),
            predicate: None,
        }
    }
}

impl FromStr for TagExpr {
    type Err = QueryError;

    /// Parse `key`, `@key`, or `key<op>value` where op is one of
    /// `= == != *= ^= $= < <= > >=`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let expr = s.trim();
        let expr = expr.strip_prefix('@').unwrap_or(expr);

        let Some(op_start) = expr.find(['=', '!', '<', '>', '*', '^', '$']) else {
            if expr.is_empty() {
                return Err(QueryError::EmptyKey(s.to_string()));
            }
            return Ok(TagExpr::key(expr));
        };

        let key = expr[..op_start].trim();
        if key.is_empty() {
            return Err(QueryError::EmptyKey(s.to_string()));
        }
        let (comparison, op_len) = Comparison::from_prefix(&expr[op_start..])
            .ok_or_else(|| QueryError::UnknownOperator(s.to_string()))?;
        let value = expr[op_start + op_len..].trim();

        Ok(TagExpr {
            key: key.to_string(),
            predicate: Some(TagPredicate::new(comparison, value)),
        })
    }
}

impl fmt::Display for TagExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.predicate {
            Some(p) => write!(f, "@{}{}{}", self.key, p.comparison.symbol(), p.value),
            None => write!(f, "@{}", self.key),
        }
    }
}

/// The set of files a query or scan operates over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// A single project file
    File(PathBuf),
    /// Every project file under `root`, at most `depth` directory levels down
    Directory { root: PathBuf, depth: usize },
    /// An explicit list of files
    Files(Vec<PathBuf>),
}

impl Scope {
    /// Reject scopes that can never contain a file.
    pub fn validate(&self) -> Result<(), QueryError> {
        match self {
            Scope::Files(files) if files.is_empty() => Err(QueryError::EmptyScope),
            _ => Ok(()),
        }
    }

    /// Whether `path` falls inside this scope
    pub fn contains(&self, path: &Path) -> bool {
        match self {
            Scope::File(file) => file == path,
            Scope::Files(files) => files.iter().any(|f| f == path),
            Scope::Directory { root, depth } => match path.strip_prefix(root) {
                // Components below root, minus the file name itself
                Ok(rel) => rel.components().count().saturating_sub(1) <= *depth,
                Err(_) => false,
            },
        }
    }
}

/// A tag query over a scope
#[derive(Debug, Clone)]
pub struct MatchQuery {
    pub tag: TagExpr,
    pub scope: Scope,
    /// Include actions tagged `@done`
    pub include_done: bool,
}

impl MatchQuery {
    pub fn new(tag: TagExpr, scope: Scope) -> Self {
        MatchQuery {
            tag,
            scope,
            include_done: false,
        }
    }
}
