//! Rendering of recogniser output back into annotated prose.

use annotext_splicer::MARKER_TAG;
use tracing::warn;

use super::client::{NerDoc, NerEntity};

/// Rebuild the text of `doc`, wrapping every entity labelled `label` in a
/// marker element.
///
/// An entity becomes `<ner type='LABEL'>ENTITY TEXT</ner> ` in place of
/// its first token; its remaining tokens are dropped. Everything outside
/// entities keeps its original spacing. Out-of-range or overlapping spans
/// are ignored.
pub fn render_entities(doc: &NerDoc, label: &str) -> String {
    let mut pieces: Vec<String> = doc
        .tokens
        .iter()
        .map(|t| format!("{}{}", t.text, t.ws))
        .collect();
    let mut covered = vec![false; pieces.len()];

    for entity in doc.ents.iter().filter(|e| e.label == label) {
        if entity.start >= entity.end || entity.end > pieces.len() {
            warn!(
                start = entity.start,
                end = entity.end,
                tokens = pieces.len(),
                "ignoring out-of-range entity span"
            );
            continue;
        }
        if covered[entity.start..entity.end].iter().any(|&c| c) {
            continue;
        }

        pieces[entity.start] = format!(
            "<{MARKER_TAG} type='{label}'>{}</{MARKER_TAG}> ",
            entity_text(doc, entity)
        );
        for piece in &mut pieces[entity.start + 1..entity.end] {
            piece.clear();
        }
        for flag in &mut covered[entity.start..entity.end] {
            *flag = true;
        }
    }

    pieces.concat()
}

/// Text of the span, with inner spacing but without the last token's
/// trailing whitespace.
fn entity_text(doc: &NerDoc, entity: &NerEntity) -> String {
    let tokens = &doc.tokens[entity.start..entity.end];
    let mut text = String::new();
    for (i, token) in tokens.iter().enumerate() {
        text.push_str(&token.text);
        if i + 1 < tokens.len() {
            text.push_str(&token.ws);
        }
    }
    text
}
