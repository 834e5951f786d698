//! Context Management Example
//!
//! Demonstrates multi-turn history, a windowed template, and switching
//! between independently-persisted sessions.

use react_orchestrator::persistence::InMemoryPersistence;
use react_orchestrator::{Client, MemoryStrategy, QueryOptions};
use std::num::NonZeroUsize;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = Client::with_openai(
        "http://localhost:11434/v1",
        "not-needed",
        "qwen3:8b",
        Arc::new(InMemoryPersistence::new()),
        NonZeroUsize::new(10).unwrap(),
    );

    client
        .memory()
        .create("alice", Some("You are a concise assistant".to_string()))
        .await?;
    client.memory().switch_to("alice").await?;

    let mut scope = client.scope();
    let first = scope.ask("My name is Alice.", QueryOptions::default()).await?;
    println!("Assistant: {first}");

    // Ask again with only the last 2 turns of history in context.
    let windowed = QueryOptions {
        window: 2,
        ..QueryOptions::default()
    };
    let second = scope.ask("What's my name?", windowed).await?;
    println!("Assistant: {second}");

    // A templated prompt that injects formatted history explicitly.
    let templated = QueryOptions {
        template: Some("Conversation so far:\n{{history}}\n\nReply to: {{it}}".to_string()),
        ..QueryOptions::default()
    };
    let third = scope.ask("Summarize what we've discussed.", templated).await?;
    println!("Assistant: {third}");

    // A stateless, one-off question that touches neither read nor write.
    let stateless = QueryOptions {
        strategy: MemoryStrategy::Stateless,
        ..QueryOptions::default()
    };
    let aside = scope.ask("In one word, what is 9 times 9?", stateless).await?;
    println!("Assistant (stateless): {aside}");

    // Switch to an independent session; "alice"'s history is untouched.
    client.memory().create("bob", None).await?;
    client.memory().switch_to("bob").await?;
    let bob_reply = scope.ask("Do you know my name?", QueryOptions::default()).await?;
    println!("Assistant (new session): {bob_reply}");

    client.close().await;
    Ok(())
}
