//! Simple query example
//!
//! Demonstrates a single-turn, streaming query against a local server.

use futures::future::FutureExt;
use react_orchestrator::persistence::InMemoryPersistence;
use react_orchestrator::{Client, ConsumerSink, QueryOptions};
use std::io::Write;
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
        .create("default", Some("You are a helpful assistant".to_string()))
        .await?;
    client.memory().switch_to("default").await?;

    println!("Sending query to model...\n");
    print!("Response: ");

    let sink: ConsumerSink = Arc::new(|chunk: String| {
        async move {
            print!("{chunk}");
            std::io::stdout().flush().ok();
            Ok(())
        }
        .boxed()
    });

    let mut scope = client.scope();
    scope
        .ask_streaming(
            "What's the capital of France? Please be brief.",
            QueryOptions::default(),
            sink,
        )
        .await?;

    println!("\n\nQuery complete!");
    client.close().await;
    Ok(())
}
