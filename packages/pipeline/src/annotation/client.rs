use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::NerConfig;
use crate::error::{PipelineError, Result};

/// User agent string identifying this pipeline.
const USER_AGENT: &str = concat!("annotext-pipeline/", env!("CARGO_PKG_VERSION"));

/// Base delay for exponential backoff (milliseconds).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// A token as produced by the recogniser, with the whitespace that
/// followed it in the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NerToken {
    pub text: String,
    #[serde(default)]
    pub ws: String,
}

/// An entity span over token indices, `end` exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NerEntity {
    pub start: usize,
    pub end: usize,
    pub label: String,
}

/// Recogniser output for one input text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NerDoc {
    pub tokens: Vec<NerToken>,
    #[serde(default)]
    pub ents: Vec<NerEntity>,
}

impl NerDoc {
    /// Build a document from tokens written as `(text, trailing_ws)`.
    pub fn from_tokens<'a>(tokens: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            tokens: tokens
                .into_iter()
                .map(|(text, ws)| NerToken {
                    text: text.to_string(),
                    ws: ws.to_string(),
                })
                .collect(),
            ents: Vec::new(),
        }
    }

    /// Add an entity span.
    pub fn with_entity(mut self, start: usize, end: usize, label: impl Into<String>) -> Self {
        self.ents.push(NerEntity {
            start,
            end,
            label: label.into(),
        });
        self
    }
}

/// Trait for named-entity recognisers, enabling mocking in tests.
///
/// Implementations must return exactly one [`NerDoc`] per input text, in
/// input order.
#[async_trait]
pub trait NerClient: Send + Sync {
    async fn recognize(&self, texts: &[String]) -> Result<Vec<NerDoc>>;
}

/// Client for an HTTP NER service.
///
/// Posts `{"texts": [...]}` to `<api_url>/ner` and expects
/// `{"docs": [{"tokens": [...], "ents": [...]}]}` back.
pub struct HttpNerClient {
    http: reqwest::Client,
    endpoint: String,
    max_retries: u32,
}

#[derive(Serialize)]
struct NerRequest<'a> {
    texts: &'a [String],
}

#[derive(Deserialize)]
struct NerResponse {
    docs: Vec<NerDoc>,
}

#[derive(Deserialize)]
struct NerErrorResponse {
    error: Option<String>,
}

impl HttpNerClient {
    pub fn new(config: &NerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            endpoint: format!("{}/ner", config.api_url.trim_end_matches('/')),
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl NerClient for HttpNerClient {
    async fn recognize(&self, texts: &[String]) -> Result<Vec<NerDoc>> {
        let body = NerRequest { texts };
        let max_attempts = self.max_retries.saturating_add(1);
        let mut last_error: Option<PipelineError> = None;

        for attempt in 0..max_attempts {
            if attempt > 0 {
                // Exponential backoff: 500ms, 1000ms, 2000ms, ...
                let delay = RETRY_BASE_DELAY_MS * (1 << (attempt - 1).min(6));
                debug!(attempt, delay_ms = delay, "retrying NER request");
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            let resp = match self.http.post(&self.endpoint).json(&body).send().await {
                Ok(r) => r,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    warn!(attempt = attempt + 1, max_attempts, error = %e, "NER request failed, will retry");
                    last_error = Some(PipelineError::Http(e));
                    continue;
                }
                Err(e) => return Err(PipelineError::Http(e)),
            };

            let status = resp.status().as_u16();

            if status >= 500 {
                let body_text = resp.text().await.unwrap_or_default();
                warn!(attempt = attempt + 1, max_attempts, status, "NER server error, will retry");
                last_error = Some(PipelineError::NerApiError {
                    status,
                    message: body_text,
                });
                continue;
            }

            // Client errors won't succeed on retry
            if status != 200 {
                let body_text = resp.text().await.unwrap_or_default();
                let message = serde_json::from_str::<NerErrorResponse>(&body_text)
                    .ok()
                    .and_then(|r| r.error)
                    .unwrap_or(body_text);
                return Err(PipelineError::NerApiError { status, message });
            }

            let parsed: NerResponse = resp
                .json()
                .await
                .map_err(|e| PipelineError::NerResponseParse(e.to_string()))?;

            if parsed.docs.len() != texts.len() {
                return Err(PipelineError::AnnotationLengthMismatch {
                    expected: texts.len(),
                    actual: parsed.docs.len(),
                });
            }

            return Ok(parsed.docs);
        }

        Err(last_error.unwrap_or_else(|| {
            PipelineError::NerResponseParse("no attempts were made".to_string())
        }))
    }
}

/// Test utilities for the NER client.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Mock recogniser. Splits on single spaces and tags every token found
    /// in `entities` (runs of consecutive matches become one span).
    pub struct MockNerClient {
        entities: Vec<String>,
        label: String,
        calls: Mutex<Vec<usize>>,
    }

    impl MockNerClient {
        pub fn new(label: impl Into<String>, entities: &[&str]) -> Self {
            Self {
                entities: entities.iter().map(|e| e.to_string()).collect(),
                label: label.into(),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Batch sizes of every call so far.
        pub fn calls(&self) -> Vec<usize> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }

        fn tag(&self, text: &str) -> NerDoc {
            let words: Vec<&str> = text.split(' ').collect();
            let last = words.len().saturating_sub(1);
            let mut doc = NerDoc::from_tokens(
                words
                    .iter()
                    .enumerate()
                    .map(|(i, w)| (*w, if i == last { "" } else { " " })),
            );

            let mut i = 0;
            while i < words.len() {
                if self.entities.iter().any(|e| e == words[i]) {
                    let start = i;
                    while i < words.len() && self.entities.iter().any(|e| e == words[i]) {
                        i += 1;
                    }
                    doc = doc.with_entity(start, i, self.label.clone());
                } else {
                    i += 1;
                }
            }
            doc
        }
    }

    #[async_trait]
    impl NerClient for MockNerClient {
        async fn recognize(&self, texts: &[String]) -> Result<Vec<NerDoc>> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(texts.len());
            }
            Ok(texts.iter().map(|t| self.tag(t)).collect())
        }
    }
}
