//! Prose extraction from, and reinsertion into, a single markup string.

use tracing::trace;

use super::lexer::{tokenize, Attribute, Tag, Token};
use crate::error::{Result, SplicerError};
use crate::placeholder::PlaceholderAllocator;

/// Tag name of the inline annotation marker.
///
/// Marker tags found in the input are dropped on extraction (their
/// contents are kept), so annotating already-annotated text never nests
/// markers.
pub const MARKER_TAG: &str = "ner";

/// Output of extracting one markup string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// The markup with every prose run replaced by its placeholder.
    pub skeleton: String,
    /// Placeholders in the order they appear in the skeleton.
    pub placeholders: Vec<String>,
    /// Original prose runs, index-aligned with `placeholders`.
    pub fragments: Vec<String>,
}

/// Replace every prose run of `input` with a fresh placeholder.
///
/// Whitespace-only runs stay in place and produce no fragment. Open tags
/// are rebuilt with normalised attribute quoting; marker tags are
/// dropped. Text adjacent across a dropped marker is one run.
///
/// Fails only if `input` already contains a placeholder prefix of this
/// session, which would make reinsertion ambiguous.
pub fn extract(input: &str, allocator: &mut PlaceholderAllocator) -> Result<Extraction> {
    if input.contains(&allocator.token_prefix()) {
        return Err(SplicerError::PlaceholderCollision {
            session_key: allocator.session_key().to_string(),
        });
    }

    let mut out = Extraction::default();
    let mut pending = String::new();

    for token in tokenize(input) {
        match token {
            Token::Text(text) => pending.push_str(text),
            Token::StartTag(tag) if tag.is(MARKER_TAG) => {}
            Token::EndTag(name) if name.eq_ignore_ascii_case(MARKER_TAG) => {}
            Token::StartTag(tag) => {
                flush_prose(&mut pending, &mut out, allocator);
                write_start_tag(&mut out.skeleton, &tag);
            }
            Token::EndTag(name) => {
                flush_prose(&mut pending, &mut out, allocator);
                out.skeleton.push_str("</");
                out.skeleton.push_str(name);
                out.skeleton.push('>');
            }
            Token::Raw(raw) => {
                flush_prose(&mut pending, &mut out, allocator);
                out.skeleton.push_str(raw);
            }
        }
    }
    flush_prose(&mut pending, &mut out, allocator);

    trace!(fragments = out.fragments.len(), "extracted markup");
    Ok(out)
}

/// Substitute each placeholder of `skeleton` with its replacement.
///
/// Placeholders are located left to right starting after the previous
/// substitution, so replacement text is never searched again.
pub fn reinsert(skeleton: &str, placeholders: &[String], replacements: &[String]) -> Result<String> {
    if placeholders.len() != replacements.len() {
        return Err(SplicerError::AnnotationCountMismatch {
            expected: placeholders.len(),
            actual: replacements.len(),
        });
    }

    let mut result = String::with_capacity(skeleton.len());
    let mut cursor = 0;

    for (placeholder, replacement) in placeholders.iter().zip(replacements) {
        let offset = skeleton[cursor..].find(placeholder.as_str()).ok_or_else(|| {
            SplicerError::MissingPlaceholder {
                placeholder: placeholder.clone(),
            }
        })?;
        result.push_str(&skeleton[cursor..cursor + offset]);
        result.push_str(replacement);
        cursor += offset + placeholder.len();
    }
    result.push_str(&skeleton[cursor..]);

    Ok(result)
}

fn flush_prose(pending: &mut String, out: &mut Extraction, allocator: &mut PlaceholderAllocator) {
    if pending.is_empty() {
        return;
    }
    if pending.chars().all(char::is_whitespace) {
        out.skeleton.push_str(pending);
        pending.clear();
        return;
    }

    let placeholder = allocator.next_token();
    out.skeleton.push_str(&placeholder);
    out.placeholders.push(placeholder);
    out.fragments.push(std::mem::take(pending));
}

fn write_start_tag(skeleton: &mut String, tag: &Tag<'_>) {
    skeleton.push('<');
    skeleton.push_str(tag.name);
    for attribute in &tag.attributes {
        if let Some(rendered) = render_attribute(attribute) {
            skeleton.push(' ');
            skeleton.push_str(&rendered);
        }
    }
    if tag.self_closing {
        skeleton.push('/');
    }
    skeleton.push('>');
}

/// Render `name=value`, quoting non-numeric values. Attributes without a
/// value are dropped.
fn render_attribute(attribute: &Attribute<'_>) -> Option<String> {
    let value = attribute.value.filter(|v| !v.is_empty())?;

    if is_numeric(value) {
        return Some(format!("{}={}", attribute.name, value));
    }

    if value.contains('\'') {
        Some(format!(
            "{}=\"{}\"",
            attribute.name,
            value.replace('"', "&quot;")
        ))
    } else {
        Some(format!("{}='{}'", attribute.name, value))
    }
}

fn is_numeric(value: &str) -> bool {
    value.parse::<f64>().is_ok()
}
