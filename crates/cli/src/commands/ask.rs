//! `aria ask`: one reasoning call against the live context.

use aria_reasoning::ReasoningInput;
use std::path::Path;

use super::load_config;
use crate::runtime::Runtime;

pub async fn run(
    config_path: Option<&Path>,
    query: String,
    consensus: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let runtime = Runtime::build(config);

    runtime.sensors.start_collection().await;
    let snapshot = runtime.sensors.get_current_data();
    let context = runtime.context.update_context(Some(&snapshot), None, None);
    runtime.sensors.stop_collection();

    let input = ReasoningInput::new(query, context).with_sensor(snapshot);
    let response = if consensus {
        runtime.reasoning.get_consensus(&input).await
    } else {
        runtime.reasoning.process_query(&input).await
    };

    println!("{}", response.content);
    println!();
    if !response.reasoning.is_empty() {
        println!("Reasoning:  {}", response.reasoning);
    }
    if !response.actions.is_empty() {
        println!("Actions:");
        for action in &response.actions {
            println!("  - {action}");
        }
    }
    println!("Confidence: {:.2}", response.confidence);
    println!("Model:      {}", response.model);

    if response.is_error() {
        return Err("no backend produced an answer".into());
    }
    Ok(())
}
