//! The `[FILEPASS_REVISIONS]` directive in page content.
//!
//! ```text
//! [FILEPASS_REVISIONS make_url="https://hook.make.com/abc"]Thanks, we got your notes![/FILEPASS_REVISIONS]
//! [FILEPASS_REVISIONS make_url="https://hook.make.com/abc" /]
//! ```
//!
//! Attribute names are case-insensitive and values may be double-quoted,
//! single-quoted or bare. Positional (unnamed) attributes are ignored.

use std::collections::HashMap;

pub const TAG: &str = "FILEPASS_REVISIONS";

/// Attribute naming the webhook the directive posts to.
pub const MAKE_URL_ATTR: &str = "make_url";

/// One directive occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directive {
    pub attributes: HashMap<String, String>,
    pub content: String,
}

impl Directive {
    pub fn make_url(&self) -> Option<&str> {
        self.attributes.get(MAKE_URL_ATTR).map(String::as_str)
    }
}

/// Page content split into literal text and directives, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Directive(Directive),
}

fn parse_attributes(text: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    let mut rest = text.trim_start();

    while !rest.is_empty() {
        let name_end = rest.find(|c: char| c == '=' || c.is_whitespace()).unwrap_or(rest.len());
        let (name, after_name) = rest.split_at(name_end);
        let after_name = after_name.trim_start();

        let Some(value_text) = after_name.strip_prefix('=') else {
            // Positional value; skip it
            rest = after_name;
            if name.is_empty() {
                break;
            }
            continue;
        };
        let value_text = value_text.trim_start();

        let (value, remaining) = match value_text.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let inner = &value_text[1..];
                match inner.find(quote) {
                    Some(end) => (&inner[..end], &inner[end + 1..]),
                    None => (inner, ""),
                }
            }
            _ => {
                let end = value_text.find(char::is_whitespace).unwrap_or(value_text.len());
                value_text.split_at(end)
            }
        };

        if !name.is_empty() {
            attributes.insert(name.to_ascii_lowercase(), value.to_string());
        }
        rest = remaining.trim_start();
    }

    attributes
}

/// Split `content` around every `[FILEPASS_REVISIONS]` directive.
///
/// Text that merely looks like a directive (an unterminated opening tag, or a
/// longer tag name sharing the prefix) is left as text.
pub fn parse(content: &str) -> Vec<Segment<'_>> {
    let open = format!("[{TAG}");
    let close = format!("[/{TAG}]");
    let mut segments = Vec::new();
    let mut cursor = 0;
    let mut search_from = 0;

    while let Some(found) = content[search_from..].find(&open) {
        let start = search_from + found;
        let after_name = start + open.len();

        let boundary_ok = content[after_name..]
            .chars()
            .next()
            .is_some_and(|c| c == ']' || c == '/' || c.is_whitespace());
        let Some(tag_end) = content[after_name..].find(']').map(|i| after_name + i) else {
            break;
        };
        if !boundary_ok {
            search_from = after_name;
            continue;
        }

        let raw_attributes = &content[after_name..tag_end];
        let self_closing = raw_attributes.trim_end().ends_with('/');
        let raw_attributes = raw_attributes.trim_end().trim_end_matches('/');

        let (inner, end) = match content[tag_end + 1..].find(&close) {
            Some(i) if !self_closing => {
                let inner_start = tag_end + 1;
                (&content[inner_start..inner_start + i], inner_start + i + close.len())
            }
            _ => ("", tag_end + 1),
        };

        if start > cursor {
            segments.push(Segment::Text(&content[cursor..start]));
        }
        segments.push(Segment::Directive(Directive {
            attributes: parse_attributes(raw_attributes),
            content: inner.to_string(),
        }));

        cursor = end;
        search_from = end;
    }

    if cursor < content.len() {
        segments.push(Segment::Text(&content[cursor..]));
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directive<'a>(segment: &'a Segment<'a>) -> &'a Directive {
        match segment {
            Segment::Directive(d) => d,
            Segment::Text(t) => panic!("expected directive, got text {t:?}"),
        }
    }

    #[test]
    fn test_plain_content_is_one_text_segment() {
        assert_eq!(parse("<h1>Hello</h1>"), vec![Segment::Text("<h1>Hello</h1>")]);
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_enclosing_directive() {
        let segments = parse(r#"<h1>Done</h1>[FILEPASS_REVISIONS make_url="https://hook.make.com/abc"]Thanks![/FILEPASS_REVISIONS]<footer/>"#);

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], Segment::Text("<h1>Done</h1>"));
        let d = directive(&segments[1]);
        assert_eq!(d.make_url(), Some("https://hook.make.com/abc"));
        assert_eq!(d.content, "Thanks!");
        assert_eq!(segments[2], Segment::Text("<footer/>"));
    }

    #[test]
    fn test_self_closing_and_unclosed_directives() {
        let segments = parse(r#"[FILEPASS_REVISIONS make_url='https://a.example/x' /] after"#);
        assert_eq!(directive(&segments[0]).make_url(), Some("https://a.example/x"));
        assert_eq!(directive(&segments[0]).content, "");
        assert_eq!(segments[1], Segment::Text(" after"));

        let segments = parse("[FILEPASS_REVISIONS] trailing text");
        assert_eq!(directive(&segments[0]).make_url(), None);
        assert_eq!(segments[1], Segment::Text(" trailing text"));
    }

    #[test]
    fn test_attribute_forms() {
        let attributes = parse_attributes(r#" MAKE_URL=https://hook.make.com/bare  title="Two words" positional note='single' "#);
        assert_eq!(attributes.get("make_url").map(String::as_str), Some("https://hook.make.com/bare"));
        assert_eq!(attributes.get("title").map(String::as_str), Some("Two words"));
        assert_eq!(attributes.get("note").map(String::as_str), Some("single"));
        assert!(!attributes.contains_key("positional"));
    }

    #[test]
    fn test_lookalike_tags_are_text() {
        let content = "[FILEPASS_REVISIONSX make_url=x] and [FILEPASS_REVISIONS";
        assert_eq!(parse(content), vec![Segment::Text(content)]);
    }

    #[test]
    fn test_multiple_directives() {
        let segments = parse("[FILEPASS_REVISIONS make_url=a]one[/FILEPASS_REVISIONS]|[FILEPASS_REVISIONS make_url=b]two[/FILEPASS_REVISIONS]");
        assert_eq!(segments.len(), 3);
        assert_eq!(directive(&segments[0]).content, "one");
        assert_eq!(segments[1], Segment::Text("|"));
        assert_eq!(directive(&segments[2]).make_url(), Some("b"));
    }
}
