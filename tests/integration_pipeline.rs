#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// End-to-end document Q&A over real PDF files
// The embedding and completion services are wiremock servers

use lopdf::content::{Content, Operation};
use lopdf::{Object, Stream, dictionary};
use ragchat::config::Config;
use ragchat::documents::LoadPolicy;
use ragchat::rag::{DocumentQa, PipelineError, QueryStage, QueryState};
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EMBED_PATH: &str = "/v1beta/models/embedding-001:batchEmbedContents";
const CHAT_PATH: &str = "/openai/v1/chat/completions";

fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init()
        .ok();
}

/// Write a minimal PDF with one text line per page
fn write_pdf(path: &Path, pages: &[&str]) {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 11.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("content should encode"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).expect("should save test pdf");
}

fn documents_dir() -> TempDir {
    let dir = TempDir::new().expect("should create TempDir successfully");
    write_pdf(
        &dir.path().join("a_fruit.pdf"),
        &["Bananas are yellow and grow in bunches."],
    );
    write_pdf(
        &dir.path().join("b_geography.pdf"),
        &["The capital of France is Paris."],
    );
    fs::write(dir.path().join("c_broken.pdf"), "this is not a pdf").expect("should write file");
    fs::write(dir.path().join("notes.txt"), "The capital of Spain is Madrid.")
        .expect("should write file");
    dir
}

fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.embedding.google.base_url = server.uri();
    config.embedding.google.api_key = Some("google-test-key".to_string());
    config.completion.base_url = format!("{}/openai/v1", server.uri());
    config.completion.api_key = Some("gsk_test".to_string());
    config.retrieval.top_k = 1;
    config
}

async fn mount_embeddings(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(EMBED_PATH))
        .and(header("x-goog-api-key", "google-test-key"))
        .and(body_partial_json(json!({
            "requests": [{"taskType": "RETRIEVAL_DOCUMENT"}, {"taskType": "RETRIEVAL_DOCUMENT"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [{"values": [1.0, 0.0]}, {"values": [0.0, 1.0]}]
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(EMBED_PATH))
        .and(body_partial_json(json!({
            "requests": [{"taskType": "RETRIEVAL_QUERY"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [{"values": [0.1, 0.9]}]
        })))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn answers_question_from_pdf_context() {
    init_test_tracing();
    let server = MockServer::start().await;
    mount_embeddings(&server).await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("Authorization", "Bearer gsk_test"))
        .and(body_string_contains("The capital of France is Paris."))
        .and(body_string_contains("Question: What is the capital of France?"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "The capital of France is Paris."}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = documents_dir();
    let config = config_for(&server);
    let dir_path = dir.path().to_path_buf();

    let (report, result, states) = tokio::task::spawn_blocking(move || {
        let qa = DocumentQa::from_config(&config).expect("should wire up clients");
        let report = qa.build_index(&dir_path).expect("should build index");
        let mut states = Vec::new();
        let result = qa
            .ask("What is the capital of France?", |s| states.push(s))
            .expect("should answer");
        (report, result, states)
    })
    .await
    .expect("task should not panic");

    assert_eq!(report.documents, 2);
    assert_eq!(report.pages, 2);
    assert_eq!(report.chunks, 2);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].path.ends_with("c_broken.pdf"));

    assert!(result.answer.contains("Paris"));
    assert_eq!(result.sources.len(), 1);
    assert!(result.sources[0].chunk.source.ends_with("b_geography.pdf"));
    assert_eq!(result.sources[0].chunk.page_number, 1);
    assert_eq!(states.last(), Some(&QueryState::Done));
}

#[tokio::test(flavor = "multi_thread")]
async fn embedding_outage_is_reported_with_stage() {
    let server = MockServer::start().await;
    mount_embeddings(&server).await;

    let dir = documents_dir();
    let config = config_for(&server);
    let dir_path = dir.path().to_path_buf();

    let qa = tokio::task::spawn_blocking(move || {
        let qa = DocumentQa::from_config(&config).expect("should wire up clients");
        qa.build_index(&dir_path).expect("should build index");
        qa
    })
    .await
    .expect("task should not panic");

    // every later request gets a 404
    server.reset().await;

    let (err, still_ready) = tokio::task::spawn_blocking(move || {
        let err = qa
            .ask("What is the capital of France?", |_| {})
            .expect_err("embedding should fail");
        (err, qa.is_ready())
    })
    .await
    .expect("task should not panic");

    assert_eq!(err.stage, QueryStage::Embedding);
    assert!(err.to_string().contains("HTTP 404"));
    assert!(still_ready);
}

#[test]
fn fail_fast_policy_rejects_directory() {
    let dir = documents_dir();
    let mut config = Config::default();
    config.embedding.google.api_key = Some("unused".to_string());
    config.completion.api_key = Some("unused".to_string());
    config.retrieval.load_policy = LoadPolicy::FailFast;

    let qa = DocumentQa::from_config(&config).expect("should wire up clients");
    let result = qa.build_index(dir.path());

    assert!(matches!(result, Err(PipelineError::Load(_))));
    assert!(!qa.is_ready());
}

#[test]
fn empty_directory_has_nothing_to_index() {
    let dir = TempDir::new().expect("should create TempDir successfully");
    let mut config = Config::default();
    config.embedding.google.api_key = Some("unused".to_string());
    config.completion.api_key = Some("unused".to_string());

    let qa = DocumentQa::from_config(&config).expect("should wire up clients");
    let result = qa.build_index(dir.path());

    assert!(matches!(result, Err(PipelineError::NothingToIndex(_))));
}
