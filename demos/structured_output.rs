//! Structured Output Example
//!
//! Demonstrates `ask_structured`'s self-correcting retry loop: if the model's
//! first response isn't valid JSON for the target type, the scope re-prompts
//! with a correction message at low temperature before giving up.

use react_orchestrator::persistence::InMemoryPersistence;
use react_orchestrator::{Client, QueryOptions};
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct Recipe {
    name: String,
    ingredients: Vec<String>,
    minutes: u32,
}

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
        .create(
            "recipes",
            Some(
                "Respond with ONLY a JSON object matching \
                 {\"name\": string, \"ingredients\": [string], \"minutes\": integer}. \
                 No prose, no markdown fences."
                    .to_string(),
            ),
        )
        .await?;
    client.memory().switch_to("recipes").await?;

    let mut scope = client.scope();
    let recipe: Recipe = scope
        .ask_structured(
            "Give me a quick recipe for scrambled eggs.",
            QueryOptions::default(),
            3,
        )
        .await?;

    println!("{} ({} min)", recipe.name, recipe.minutes);
    for ingredient in &recipe.ingredients {
        println!("- {ingredient}");
    }

    client.close().await;
    Ok(())
}
