use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use super::{DocumentStore, PageEntry, StoredDocument};
use crate::config::{Credentials, StoreConfig};
use crate::error::{PipelineError, Result};

/// Elasticsearch-backed store.
///
/// Reads pages from the source index with `from`/`size` in `_doc` order
/// and writes annotated documents into the destination index under the
/// same id.
pub struct ElasticStore {
    http: reqwest::Client,
    base_url: Url,
    source_index: String,
    dest_index: String,
    credentials: Option<Credentials>,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Deserialize)]
struct HitsEnvelope {
    hits: Vec<Hit>,
}

#[derive(Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source", default)]
    source: Value,
}

impl ElasticStore {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: Url::parse(&config.url)?,
            source_index: config.source_index.clone(),
            dest_index: config.dest_index.clone(),
            credentials: config.credentials.clone(),
        })
    }

    /// Build `<base>/<segment>/<segment>...`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| PipelineError::Config(format!("invalid store URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some(c) => request.basic_auth(&c.username, Some(&c.password)),
            None => request,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(PipelineError::StoreApiError {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl DocumentStore for ElasticStore {
    async fn fetch_page(&self, offset: usize, size: usize) -> Result<Vec<PageEntry>> {
        let url = self.endpoint(&[self.source_index.as_str(), "_search"])?;
        let body = json!({
            "from": offset,
            "size": size,
            "sort": ["_doc"],
            "query": {"match_all": {}}
        });

        debug!(index = %self.source_index, offset, size, "fetching page");
        let response = self.authorize(self.http.post(url).json(&body)).send().await?;
        let response = Self::check(response).await?;

        let parsed: SearchResponse = response.json().await.map_err(|e| PipelineError::Store {
            operation: "search".into(),
            message: e.to_string(),
        })?;

        Ok(parsed
            .hits
            .hits
            .into_iter()
            .map(|hit| {
                Ok(StoredDocument {
                    id: hit.id,
                    source: hit.source,
                })
            })
            .collect())
    }

    async fn write(&self, id: &str, source: &Value) -> Result<()> {
        if id.is_empty() {
            return Err(PipelineError::MissingDocumentId(id.to_string()));
        }
        let url = self.endpoint(&[self.dest_index.as_str(), "_doc", id])?;

        debug!(index = %self.dest_index, id, "writing document");
        let response = self.authorize(self.http.put(url).json(source)).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(url: &str) -> ElasticStore {
        ElasticStore::new(&StoreConfig::new(url, "filings", "filing_enr")).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let s = store("http://localhost:9200");
        let url = s.endpoint(&["filing_enr", "_doc", "abc"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/filing_enr/_doc/abc");
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_encodes_ids() {
        let s = store("http://proxy.local/es/");
        let url = s.endpoint(&["filing_enr", "_doc", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "http://proxy.local/es/filing_enr/_doc/a%2Fb%20c");
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let result = ElasticStore::new(&StoreConfig::new("not a url", "a", "b"));
        assert!(matches!(result, Err(PipelineError::Url(_))));
    }
}
