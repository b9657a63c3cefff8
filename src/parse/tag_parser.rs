use crate::model::action::Tag;

/// Tags found in a piece of text, plus any tokens that were not well-formed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagScan {
    pub tags: Vec<Tag>,
    /// Raw text of malformed tag tokens, in order
    pub malformed: Vec<String>,
}

/// Extract `@key` and `@key(value)` tokens from `text`.
///
/// A tag must start the text or follow whitespace, so `me@example.com` is not
/// a tag. A lone `@` is ordinary text. `@key(value` without a closing paren and
/// `@(value)` without a key are malformed: they still produce a tag (key only,
/// no value) and their raw text is reported in `malformed`.
pub fn parse_tags(text: &str) -> TagScan {
    let mut scan = TagScan::default();
    let mut cursor = 0;

    while let Some(rel) = text[cursor..].find('@') {
        let at = cursor + rel;
        cursor = at + 1;
        if !starts_token(text, at) {
            continue;
        }

        let rest = &text[at + 1..];
        let key_len = rest.find(|c: char| !is_key_char(c)).unwrap_or(rest.len());
        let key = &rest[..key_len];
        let after_key = &rest[key_len..];

        if let Some(inner) = after_key.strip_prefix('(') {
            match inner.find(')') {
                Some(close) => {
                    let token_end = at + 1 + key_len + 1 + close + 1;
                    if key.is_empty() {
                        scan.malformed.push(text[at..token_end].to_string());
                        scan.tags.push(Tag::new("", None));
                    } else {
                        let value = inner[..close].trim().to_string();
                        scan.tags.push(Tag::new(key, Some(value)));
                    }
                    cursor = token_end;
                }
                None => {
                    let token = text[at..].split_whitespace().next().unwrap_or("@");
                    scan.malformed.push(token.to_string());
                    scan.tags.push(Tag::new(key, None));
                    cursor = at + 1 + key_len + 1;
                }
            }
        } else if !key.is_empty() {
            scan.tags.push(Tag::new(key, None));
            cursor = at + 1 + key_len;
        }
    }

    scan
}

/// Remove every well-formed tag token from `text`, collapsing leftover spaces.
pub fn strip_tags(text: &str) -> String {
    text.split_whitespace()
        .filter(|word| {
            let scan = parse_tags(word);
            !(word.starts_with('@') && scan.malformed.is_empty() && scan.tags.len() == 1)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn starts_token(text: &str, at: usize) -> bool {
    text[..at].chars().next_back().is_none_or(char::is_whitespace)
}
