#![allow(dead_code)]

use annotext_pipeline::config::NerConfig;
use serde_json::{json, Value};
use wiremock::{Request, Respond, ResponseTemplate};

/// Fake NER service: splits each text on single spaces and labels every
/// word listed in `entities` as ORG.
pub struct FakeNer {
    pub entities: Vec<&'static str>,
}

impl FakeNer {
    pub fn new(entities: &[&'static str]) -> Self {
        Self {
            entities: entities.to_vec(),
        }
    }
}

impl Respond for FakeNer {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = match serde_json::from_slice(&request.body) {
            Ok(body) => body,
            Err(_) => return ResponseTemplate::new(400).set_body_json(json!({"error": "bad json"})),
        };
        let texts = body["texts"].as_array().cloned().unwrap_or_default();

        let docs: Vec<Value> = texts
            .iter()
            .map(|text| ner_doc(text.as_str().unwrap_or_default(), &self.entities))
            .collect();

        ResponseTemplate::new(200).set_body_json(json!({ "docs": docs }))
    }
}

/// Build one response document the way the fake service tokenises.
pub fn ner_doc(text: &str, entities: &[&str]) -> Value {
    let words: Vec<&str> = text.split(' ').collect();
    let last = words.len() - 1;

    let tokens: Vec<Value> = words
        .iter()
        .enumerate()
        .map(|(i, w)| json!({"text": w, "ws": if i == last { "" } else { " " }}))
        .collect();

    let ents: Vec<Value> = words
        .iter()
        .enumerate()
        .filter(|(_, w)| entities.contains(w))
        .map(|(i, _)| json!({"start": i, "end": i + 1, "label": "ORG"}))
        .collect();

    json!({"tokens": tokens, "ents": ents})
}

/// NER config pointed at a mock server, with no retry delay to speak of.
pub fn ner_config(uri: &str) -> NerConfig {
    NerConfig::builder(uri)
        .batch_size(8)
        .timeout_secs(5)
        .max_retries(1)
        .build()
}

/// A filing as stored in the source index.
pub fn sample_filing() -> Value {
    json!({
        "cik": 320193,
        "sma_data_json": {
            "form": "8-K",
            "mmmsss": "<p>Acme internal</p>",
            "body": "<div class=note><p>Acme reported results.</p> <p>Shares rose.</p></div>"
        }
    })
}
