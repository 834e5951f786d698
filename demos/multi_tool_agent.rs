//! Multi-Tool Agent Example
//!
//! Demonstrates a scope with several unrelated tools registered at once,
//! and the streaming Re-Act loop printing deltas as they arrive.

use futures::future::FutureExt;
use react_orchestrator::persistence::InMemoryPersistence;
use react_orchestrator::{Client, ConsumerSink, QueryOptions, tool};
use serde_json::{Value, json};
use std::io::Write as _;
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
        .create("agent", Some("You are a helpful research assistant.".to_string()))
        .await?;
    client.memory().switch_to("agent").await?;

    let mut scope = client.scope();

    scope.register_tool(
        tool("word_count", "Count the words in a piece of text")
            .param("text", "string")
            .build(|args: String| async move {
                let v: Value = serde_json::from_str(&args)?;
                let text = v["text"].as_str().unwrap_or_default();
                Ok(json!({"words": text.split_whitespace().count()}).to_string())
            }),
    )?;

    scope.register_tool(
        tool("current_year", "Returns a fixed reference year for this demo")
            .build(|_args: String| async move { Ok(json!({"year": 2026}).to_string()) }),
    )?;

    let sink: ConsumerSink = Arc::new(|chunk: String| {
        async move {
            print!("{chunk}");
            std::io::stdout().flush().ok();
            Ok(())
        }
        .boxed()
    });

    scope
        .ask_streaming(
            "How many words are in the sentence 'the quick brown fox jumps', \
             and what year is it according to your tools?",
            QueryOptions::default(),
            sink,
        )
        .await?;
    println!();

    client.close().await;
    Ok(())
}
