mod common;

use annotext_pipeline::annotation::{Annotator, EntityAnnotator, HttpNerClient, NerClient};
use annotext_pipeline::PipelineError;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{ner_config, ner_doc, FakeNer};

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_recognize_posts_texts_and_parses_docs() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ner"))
        .and(body_json(json!({"texts": ["Acme rose"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "docs": [ner_doc("Acme rose", &["Acme"])]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpNerClient::new(&ner_config(&server.uri())).unwrap();
    let docs = client.recognize(&texts(&["Acme rose"])).await.unwrap();

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].tokens.len(), 2);
    assert_eq!(docs[0].ents.len(), 1);
    assert_eq!(docs[0].ents[0].label, "ORG");
}

#[tokio::test]
async fn test_recognize_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ner"))
        .respond_with(ResponseTemplate::new(503).set_body_string("warming up"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ner"))
        .respond_with(FakeNer::new(&[]))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpNerClient::new(&ner_config(&server.uri())).unwrap();
    let docs = client.recognize(&texts(&["plain text"])).await.unwrap();
    assert_eq!(docs.len(), 1);
}

#[tokio::test]
async fn test_recognize_gives_up_after_max_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ner"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(2)
        .mount(&server)
        .await;

    let client = HttpNerClient::new(&ner_config(&server.uri())).unwrap();
    let err = client.recognize(&texts(&["x"])).await.unwrap_err();
    assert!(matches!(err, PipelineError::NerApiError { status: 500, .. }));
}

#[tokio::test]
async fn test_recognize_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ner"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"error": "text too long"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpNerClient::new(&ner_config(&server.uri())).unwrap();
    let err = client.recognize(&texts(&["x"])).await.unwrap_err();

    match err {
        PipelineError::NerApiError { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "text too long");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_recognize_rejects_wrong_doc_count() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ner"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "docs": [ner_doc("one", &[])]
        })))
        .mount(&server)
        .await;

    let client = HttpNerClient::new(&ner_config(&server.uri())).unwrap();
    let err = client.recognize(&texts(&["one", "two"])).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::AnnotationLengthMismatch {
            expected: 2,
            actual: 1
        }
    ));
}

#[tokio::test]
async fn test_entity_annotator_over_http_batches_and_renders() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ner"))
        .respond_with(FakeNer::new(&["Acme", "Globex"]))
        .expect(2)
        .mount(&server)
        .await;

    let config = ner_config(&server.uri());
    let client = HttpNerClient::new(&config).unwrap();
    let annotator = EntityAnnotator::with_label(client, "ORG", 2);

    let out = annotator
        .annotate(&texts(&["Acme rose", "nothing here", "Globex fell"]))
        .await
        .unwrap();

    assert_eq!(
        out,
        vec![
            "<ner type='ORG'>Acme</ner> rose",
            "nothing here",
            "<ner type='ORG'>Globex</ner> fell",
        ]
    );
}

#[tokio::test]
async fn test_recognize_with_maximum_retry_count() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ner"))
        .respond_with(FakeNer::new(&["Acme"]))
        .expect(1)
        .mount(&server)
        .await;

    let config = annotext_pipeline::NerConfig::builder(server.uri())
        .max_retries(u32::MAX)
        .build();
    let client = HttpNerClient::new(&config).unwrap();

    let docs = client.recognize(&texts(&["Acme rose"])).await.unwrap();
    assert_eq!(docs[0].ents.len(), 1);
}
