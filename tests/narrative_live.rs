#![cfg(feature = "live_narrative")]

//! Talks to a real OpenAI-compatible endpoint. Gated twice: the
//! `live_narrative` feature at compile time, RUN_NARRATIVE_TESTS at run
//! time, so plain `cargo test` never touches the network.

use anyhow::Result;
use reqcover::config::Config;
use reqcover::narrative::{create_generator, GenerationOptions, PromptMessage, PromptRole};

#[tokio::test]
async fn live_endpoint_answers_a_trivial_prompt() -> Result<()> {
    dotenvy::dotenv().ok();
    reqcover::init_tracing();

    if std::env::var("RUN_NARRATIVE_TESTS").is_err() {
        eprintln!("Skipping live narrative test - set RUN_NARRATIVE_TESTS=1 to run");
        return Ok(());
    }

    let config = Config::load()?;
    let generator = create_generator(&config)?;

    let messages = vec![PromptMessage {
        role: PromptRole::User,
        content: "Give me a one-word answer. The word should be 'test'.".to_string(),
    }];
    let opts = GenerationOptions {
        max_tokens: 16,
        temperature: 0.0,
    };
    let response = generator.generate(&messages, &opts).await?;

    assert!(response.to_lowercase().contains("test"));
    println!("Response: {response}");

    Ok(())
}
