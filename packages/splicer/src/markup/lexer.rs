//! Lenient tokenizer for the markup found inside text leaves.
//!
//! Recognises open tags with attributes, close tags, comments,
//! declarations and processing instructions. Anything that does not look
//! like a tag is text, so malformed input degrades to text instead of
//! failing.

use regex::Regex;
use std::sync::LazyLock;

/// Tags, comments, declarations and processing instructions.
///
/// Capture groups: 1 = close tag name, 2 = open tag name,
/// 3 = raw attribute list, 4 = self-closing slash.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static MARKUP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<!--.*?-->|<![^>]*>|<\?.*?>|</\s*([A-Za-z][^\s/>]*)\s*>|<([A-Za-z][^\s/>]*)((?:\s+[^\s=/>]+(?:\s*=\s*(?:'[^']*'|"[^"]*"|[^\s'">]+))?)*)\s*(/?)>"#,
    )
    .expect("valid regex")
});

/// A single `name=value` pair inside an open tag.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ATTRIBUTE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s=/>]+)(?:\s*=\s*(?:'([^']*)'|"([^"]*)"|([^\s'">]+)))?"#)
        .expect("valid regex")
});

/// Elements whose body is raw text rather than prose.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// An attribute as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub name: &'a str,
    /// `None` for bare attributes such as `<input disabled>`.
    pub value: Option<&'a str>,
}

/// An open tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag<'a> {
    pub name: &'a str,
    pub attributes: Vec<Attribute<'a>>,
    pub self_closing: bool,
}

/// One lexical unit of a markup string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    StartTag(Tag<'a>),
    EndTag(&'a str),
    Text(&'a str),
    /// Comments, declarations, processing instructions and raw-text
    /// element bodies. Never treated as prose.
    Raw(&'a str),
}

impl Tag<'_> {
    /// Check the tag name case-insensitively.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Split a markup string into tokens.
///
/// Concatenating the source spans of the returned tokens reproduces the
/// input exactly.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(caps) = MARKUP_PATTERN.captures_at(input, pos) {
        let Some(whole) = caps.get(0) else { break };

        if whole.start() > pos {
            tokens.push(Token::Text(&input[pos..whole.start()]));
        }
        pos = whole.end();

        if let Some(name) = caps.get(1) {
            tokens.push(Token::EndTag(name.as_str()));
        } else if let Some(name) = caps.get(2) {
            let name = name.as_str();
            let attributes = caps
                .get(3)
                .map(|m| parse_attributes(m.as_str()))
                .unwrap_or_default();
            let self_closing = caps.get(4).is_some_and(|m| !m.as_str().is_empty());

            tokens.push(Token::StartTag(Tag {
                name,
                attributes,
                self_closing,
            }));

            if !self_closing && is_raw_text_element(name) {
                let body_len = find_raw_text_end(&input[pos..], name);
                if body_len > 0 {
                    tokens.push(Token::Raw(&input[pos..pos + body_len]));
                }
                pos += body_len;
            }
        } else {
            tokens.push(Token::Raw(whole.as_str()));
        }
    }

    if pos < input.len() {
        tokens.push(Token::Text(&input[pos..]));
    }

    tokens
}

fn parse_attributes(raw: &str) -> Vec<Attribute<'_>> {
    ATTRIBUTE_PATTERN
        .captures_iter(raw)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str());
            Some(Attribute { name, value })
        })
        .collect()
}

fn is_raw_text_element(name: &str) -> bool {
    RAW_TEXT_ELEMENTS
        .iter()
        .any(|raw| raw.eq_ignore_ascii_case(name))
}

/// Length of a raw-text body, up to (not including) its close tag.
/// Without a close tag the body runs to the end of the input.
fn find_raw_text_end(rest: &str, name: &str) -> usize {
    // ASCII lowercasing keeps byte offsets intact.
    let haystack = rest.to_ascii_lowercase();
    let needle = format!("</{}", name.to_ascii_lowercase());
    haystack.find(&needle).unwrap_or(rest.len())
}
