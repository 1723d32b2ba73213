//! Message parser - text extraction and command invocation parsing

use crate::domain::entities::Content;

/// A parsed command invocation: prefix stripped, name lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub name: String,
    pub args: Vec<String>,
}

/// Extract plain text from the content union, in fixed precedence order:
/// plain body, extended text, then media captions. Empty string when no
/// text-bearing field is present.
pub fn extract_text(content: &Content) -> String {
    match content {
        Content::Text(t) => t.clone(),
        Content::ExtendedText(t) => t.clone(),
        Content::Image { caption }
        | Content::Video { caption }
        | Content::Document { caption } => caption.clone().unwrap_or_default(),
        Content::Other => String::new(),
    }
}

/// Parse a command invocation out of `text`. Returns `None` unless the
/// trimmed text starts with `prefix` and carries a non-empty body after
/// it. Arguments are split on runs of whitespace.
pub fn parse_invocation(text: &str, prefix: &str) -> Option<Invocation> {
    let text = text.trim();
    let body = text.strip_prefix(prefix)?.trim();
    if body.is_empty() {
        return None;
    }

    let mut tokens = body.split_whitespace();
    let name = tokens.next()?.to_lowercase();
    let args = tokens.map(str::to_string).collect();

    Some(Invocation { name, args })
}
