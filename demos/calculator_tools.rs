//! Calculator with Tools Example
//!
//! Demonstrates the Re-Act loop driving tool calls automatically: the scope
//! dispatches each tool call and continues the conversation with the model
//! until it produces a final answer.

use react_orchestrator::persistence::InMemoryPersistence;
use react_orchestrator::{Client, QueryOptions, tool};
use serde_json::{Value, json};
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
        .create(
            "calc",
            Some(
                "You are a helpful calculator assistant. Use the provided tools \
                 to perform calculations. Always show your work."
                    .to_string(),
            ),
        )
        .await?;
    client.memory().switch_to("calc").await?;

    let mut scope = client.scope();

    scope.register_tool(
        tool("add", "Add two numbers")
            .param("a", "number")
            .param("b", "number")
            .build(|args: String| async move {
                let v: Value = serde_json::from_str(&args)?;
                let (a, b) = (v["a"].as_f64().unwrap_or(0.0), v["b"].as_f64().unwrap_or(0.0));
                Ok(json!({"result": a + b}).to_string())
            }),
    )?;

    scope.register_tool(
        tool("multiply", "Multiply two numbers")
            .param("a", "number")
            .param("b", "number")
            .build(|args: String| async move {
                let v: Value = serde_json::from_str(&args)?;
                let (a, b) = (v["a"].as_f64().unwrap_or(0.0), v["b"].as_f64().unwrap_or(0.0));
                Ok(json!({"result": a * b}).to_string())
            }),
    )?;

    scope.register_tool(
        tool("divide", "Divide two numbers")
            .param("a", "number")
            .param("b", "number")
            .build(|args: String| async move {
                let v: Value = serde_json::from_str(&args)?;
                let (a, b) = (v["a"].as_f64().unwrap_or(0.0), v["b"].as_f64().unwrap_or(0.0));
                if b == 0.0 {
                    return Ok(json!({"error": "Cannot divide by zero"}).to_string());
                }
                Ok(json!({"result": a / b}).to_string())
            }),
    )?;

    let queries = [
        "What is 25 plus 17?",
        "Calculate 144 divided by 12",
        "What's 7 times 8, then add 5?",
    ];

    println!("{}", "=".repeat(70));
    println!("CALCULATOR TOOLS EXAMPLE");
    println!("{}", "=".repeat(70));

    for query in queries {
        println!("\nUser: {query}");
        println!("{}", "-".repeat(50));

        let answer = scope.ask(query, QueryOptions::default()).await?;
        println!("Assistant: {answer}");
    }

    client.close().await;
    Ok(())
}
