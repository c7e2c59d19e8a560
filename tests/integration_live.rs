#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Integration tests against the hosted services
// Run with: cargo test --test integration_live -- --ignored
// Needs GROQ_API_KEY and GOOGLE_API_KEY in the environment or a .env file

use ragchat::chat::{ChatCompletion, ChatSession, GroqClient, QaBot, TravelBuddy};
use ragchat::config::Config;
use ragchat::embeddings::{Embedder, GoogleEmbedder};
use std::sync::Arc;
use tracing::info;

fn live_config() -> Config {
    dotenvy::dotenv().ok();
    Config::default()
}

fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init()
        .ok();
}

#[test]
#[ignore = "calls the Google Generative Language API"]
fn real_google_embeddings() {
    init_test_tracing();
    let embedder = GoogleEmbedder::new(&live_config()).expect("GOOGLE_API_KEY should be set");

    let texts = vec![
        "The capital of France is Paris.".to_string(),
        "Bananas are yellow.".to_string(),
    ];
    let vectors = embedder
        .embed_documents(&texts)
        .expect("document embedding should succeed");
    let query = embedder
        .embed_query("What is the capital of France?")
        .expect("query embedding should succeed");

    assert_eq!(vectors.len(), 2);
    assert_eq!(vectors[0].len(), query.len());
    info!("Embedding dimension: {}", query.len());
}

#[test]
#[ignore = "calls the Groq chat completion API"]
fn real_groq_conversation() {
    init_test_tracing();
    let config = live_config();
    let client: Arc<dyn ChatCompletion> =
        Arc::new(GroqClient::new(&config).expect("GROQ_API_KEY should be set"));

    let bot = QaBot::new(Arc::clone(&client), &config.completion);
    let mut session = ChatSession::new();
    bot.ask(&mut session, "My name is Ada. Reply with just OK.")
        .expect("first turn should succeed");
    let answer = bot
        .ask(&mut session, "What is my name? Reply with one word.")
        .expect("second turn should succeed");
    assert!(answer.to_lowercase().contains("ada"));
    assert_eq!(session.turns().len(), 2);

    let buddy = TravelBuddy::new(client, &config.completion);
    let mut travel = buddy.start_session();
    let reply = buddy
        .reply(&mut travel, "Name one museum in Paris.")
        .expect("travel reply should succeed");
    assert!(!reply.trim().is_empty());
}
