//! End-to-end pipeline scenarios over mocked Qdrant and Ollama endpoints.

use std::sync::Arc;

use httpmock::{Method::POST, MockServer};
use ragtag::{
    chat, config, embedding,
    index::VectorIndexService,
    metrics::PipelineMetrics,
    query::{ModelTier, QueryCategory, QueryEngine},
};
use serde_json::json;
use tokio::sync::{Mutex, OnceCell};

static INIT: OnceCell<()> = OnceCell::const_new();
static MOCK_SERVER: OnceCell<&'static MockServer> = OnceCell::const_new();
// Tests share one mock server and one process-wide config; serialize them so
// per-test mocks never observe another scenario's traffic.
static TEST_LOCK: Mutex<()> = Mutex::const_new(());

fn set_env(key: &str, value: &str) {
    // SAFETY: Tests establish deterministic configuration before anything reads it.
    unsafe { std::env::set_var(key, value) }
}

async fn harness() -> &'static MockServer {
    INIT.get_or_init(|| async {
        let server = Box::leak(Box::new(MockServer::start_async().await));
        let base_url = server.base_url();

        set_env("QDRANT_URL", &base_url);
        set_env("OLLAMA_URL", &base_url);
        set_env("QDRANT_COLLECTION_NAME", "docs");
        set_env("EMBEDDING_PROVIDER", "hash");
        set_env("EMBEDDING_DIMENSION", "8");
        set_env("TOP_K", "4");

        config::init_config();
        MOCK_SERVER.set(server).ok();
    })
    .await;

    MOCK_SERVER.get().expect("mock server initialized")
}

fn engine() -> QueryEngine {
    QueryEngine::new(
        embedding::get_embedding_client(),
        Arc::new(VectorIndexService::new().expect("index client")),
        chat::get_chat_client(),
        Arc::new(PipelineMetrics::new()),
    )
}

#[tokio::test]
async fn filtered_query_grounds_answer_on_matching_fragment() {
    let server = harness().await;
    let _guard = TEST_LOCK.lock().await;

    let mut query_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/collections/docs/points/query");
            then.status(200).json_body(json!({
                "status": "ok",
                "time": 0.0,
                "result": [
                    {
                        "id": "p1",
                        "score": 0.91,
                        "payload": {
                            "text": "Las políticas exigen copias de seguridad semanales.",
                            "source": "docs/politicas/resumen.pdf",
                            "chunk_index": 0,
                            "ext": ".pdf",
                            "folder": "politicas",
                            "date": "2024-03-01"
                        }
                    },
                    {
                        "id": "p2",
                        "score": 0.84,
                        "payload": {
                            "text": "Acta de la reunión de junio.",
                            "source": "docs/actas/junio.docx",
                            "chunk_index": 3,
                            "ext": ".docx",
                            "folder": "actas",
                            "date": "2024-06-01"
                        }
                    }
                ]
            }));
        })
        .await;

    // A second fragment block in the prompt would be a filtering bug.
    let mut stray_fragment_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/chat")
                .body_contains("[FRAGMENTO 2");
            then.status(500).body("unexpected second fragment");
        })
        .await;

    let mut chat_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/chat")
                .body_contains("[FRAGMENTO 1 | docs/politicas/resumen.pdf | chunk 0]");
            then.status(200).json_body(json!({
                "message": { "role": "assistant", "content": "Tus políticas exigen copias semanales." },
                "done": true
            }));
        })
        .await;

    let answer = engine()
        .answer("[type:pdf][fecha>=2024-01-01] resume mis politicas")
        .await
        .expect("grounded answer");

    query_mock.assert();
    stray_fragment_mock.assert_hits(0);
    chat_mock.assert();

    assert_eq!(answer.tier, ModelTier::Balanced);
    assert_eq!(answer.model, "llama3.1:8b");
    assert_eq!(answer.text, "Tus políticas exigen copias semanales.");
    assert_eq!(answer.sources, vec!["docs/politicas/resumen.pdf".to_string()]);

    query_mock.delete_async().await;
    stray_fragment_mock.delete_async().await;
    chat_mock.delete_async().await;
}

#[tokio::test]
async fn small_talk_bypasses_retrieval() {
    let server = harness().await;
    let _guard = TEST_LOCK.lock().await;

    let mut query_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/collections/docs/points/query");
            then.status(200).json_body(json!({
                "status": "ok",
                "time": 0.0,
                "result": []
            }));
        })
        .await;

    let mut chat_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/chat")
                .body_contains("hola que tal")
                .json_body_partial(r#"{"model": "llama3.1:8b"}"#);
            then.status(200).json_body(json!({
                "message": { "role": "assistant", "content": "Hola, todo bien." },
                "done": true
            }));
        })
        .await;

    let answer = engine()
        .smart_answer("hola que tal")
        .await
        .expect("small talk answer");

    query_mock.assert_hits(0);
    chat_mock.assert();

    assert_eq!(answer.category, QueryCategory::SmallTalk);
    assert_eq!(answer.model, "llama3.1:8b");
    assert!(answer.sources.is_empty());

    query_mock.delete_async().await;
    chat_mock.delete_async().await;
}

#[tokio::test]
async fn empty_index_yields_no_context_answer() {
    let server = harness().await;
    let _guard = TEST_LOCK.lock().await;

    let mut query_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/collections/docs/points/query");
            then.status(200).json_body(json!({
                "status": "ok",
                "time": 0.0,
                "result": []
            }));
        })
        .await;

    let mut chat_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/chat")
                .body_contains("No se encontró contexto relevante");
            then.status(200).json_body(json!({
                "message": { "role": "assistant", "content": "No tengo contexto, pero en general..." },
                "done": true
            }));
        })
        .await;

    let answer = engine()
        .answer("cuales son mis pendientes")
        .await
        .expect("no-context answer");

    query_mock.assert();
    chat_mock.assert();

    assert!(answer.sources.is_empty());
    assert_eq!(answer.text, "No tengo contexto, pero en general...");

    query_mock.delete_async().await;
    chat_mock.delete_async().await;
}
