//! `aria select`: show the backend a query would be routed to.

use aria_core::{Clock, SystemClock};
use aria_reasoning::{QueryTraits, ReasoningInput, build_from_config};
use std::path::Path;
use std::sync::Arc;

use super::load_config;

pub fn run(config_path: Option<&Path>, query: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let engine = build_from_config(&config, clock.clone());

    let context = aria_core::Context::bare(config.user.preferences(), clock.now());
    let input = ReasoningInput::new(query, context);
    let traits = QueryTraits::detect(&input);
    let table = engine.score(&input);

    println!("Query traits: {traits:?}");
    println!();
    print!("{table}");
    println!();
    match table.winner() {
        Some(winner) => println!("Selected: {winner}"),
        None => println!("No backend registered"),
    }

    Ok(())
}
