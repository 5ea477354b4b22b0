//! HTTP-level tests for the service clients, against a local mock server.

use httpmock::prelude::*;
use serde_json::json;

use corrag::clients::{
    CompletionClient, CompletionError, EmbeddingClient, EmbeddingError, IndexError,
    OpenAiCompletionClient, OpenAiEmbeddingClient, PineconeIndexClient, VectorIndexClient,
};
use corrag::types::new_metadata_filter;

#[tokio::test]
async fn completion_client_round_trip() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer test-key")
                .json_body_partial(r#"{"model": "test-model", "temperature": 0}"#);
            then.status(200).json_body(json!({
                "choices": [
                    {"message": {"role": "assistant", "content": "grounded answer"}}
                ]
            }));
        })
        .await;

    let client = OpenAiCompletionClient::new(
        format!("{}/v1", server.base_url()),
        "test-key",
        "test-model",
    );
    let reply = client
        .complete("system instruction", "user prompt")
        .await
        .expect("completion should succeed");

    assert_eq!(reply, "grounded answer");
    mock.assert_async().await;
}

#[tokio::test]
async fn completion_client_surfaces_service_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(500).body("upstream exploded");
        })
        .await;

    let client = OpenAiCompletionClient::new(
        format!("{}/v1", server.base_url()),
        "test-key",
        "test-model",
    );
    let error = client
        .complete("system", "user")
        .await
        .expect_err("should fail");

    match error {
        CompletionError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn completion_client_rejects_empty_choices() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(json!({"choices": []}));
        })
        .await;

    let client = OpenAiCompletionClient::new(
        format!("{}/v1", server.base_url()),
        "test-key",
        "test-model",
    );
    let error = client
        .complete("system", "user")
        .await
        .expect_err("should fail");

    assert!(matches!(error, CompletionError::MalformedResponse));
}

#[tokio::test]
async fn embedding_client_round_trip() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/embeddings")
                .header("authorization", "Bearer test-key")
                .json_body_partial(r#"{"model": "embed-model", "input": "What is coupling?"}"#);
            then.status(200).json_body(json!({
                "data": [{"embedding": [0.25, -0.5, 0.75]}]
            }));
        })
        .await;

    let client = OpenAiEmbeddingClient::new(
        format!("{}/v1", server.base_url()),
        "test-key",
        "embed-model",
    );
    let vector = client
        .embed("What is coupling?")
        .await
        .expect("embedding should succeed");

    assert_eq!(vector, vec![0.25, -0.5, 0.75]);
    mock.assert_async().await;
}

#[tokio::test]
async fn embedding_client_rejects_empty_data() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/embeddings");
            then.status(200).json_body(json!({"data": []}));
        })
        .await;

    let client = OpenAiEmbeddingClient::new(
        format!("{}/v1", server.base_url()),
        "test-key",
        "embed-model",
    );
    let error = client.embed("text").await.expect_err("should fail");

    assert!(matches!(error, EmbeddingError::MalformedResponse));
}

#[tokio::test]
async fn index_client_round_trip_with_filter() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/query")
                .header("api-key", "index-key")
                .json_body_partial(
                    r#"{
                        "namespace": "SE_Software_Engineering",
                        "topK": 3,
                        "includeMetadata": true,
                        "filter": {"source": "software_design.pdf"}
                    }"#,
                );
            then.status(200).json_body(json!({
                "matches": [
                    {
                        "metadata": {"text": "Coupling is a measure.", "source": "software_design.pdf"},
                        "score": 0.91
                    },
                    {
                        "metadata": {"text": "Cohesion is related.", "source": "software_design.pdf"},
                        "score": 0.84
                    }
                ]
            }));
        })
        .await;

    let client = PineconeIndexClient::new(server.base_url(), "index-key");
    let mut filter = new_metadata_filter();
    filter.insert("source".to_string(), json!("software_design.pdf"));
    let matches = client
        .search(&[0.1, 0.2, 0.3], "SE_Software_Engineering", &filter, 3)
        .await
        .expect("search should succeed");

    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].metadata["text"], "Coupling is a measure.");
    assert_eq!(matches[0].score, 0.91);
    mock.assert_async().await;
}

#[tokio::test]
async fn index_client_accepts_empty_match_list() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/query");
            then.status(200).json_body(json!({"matches": []}));
        })
        .await;

    let client = PineconeIndexClient::new(server.base_url(), "index-key");
    let matches = client
        .search(&[0.1], "ns", &new_metadata_filter(), 3)
        .await
        .expect("an empty result set is not an error");

    assert!(matches.is_empty());
}

#[tokio::test]
async fn index_client_surfaces_service_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/query");
            then.status(503).body("index unavailable");
        })
        .await;

    let client = PineconeIndexClient::new(server.base_url(), "index-key");
    let error = client
        .search(&[0.1], "ns", &new_metadata_filter(), 3)
        .await
        .expect_err("should fail");

    match error {
        IndexError::Status { status, .. } => assert_eq!(status, 503),
        other => panic!("unexpected error: {other:?}"),
    }
}
