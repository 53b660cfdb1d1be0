//! `aria status`: show configuration and backend summary.

use std::path::Path;

use super::load_config;

pub fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;

    println!("ARIA Status");
    println!("===========");
    println!("  Config dir:        {}", aria_config::AppConfig::config_dir().display());
    println!("  Preferred backend: {}", config.user.preferred_backend);
    println!(
        "  Permissions:       voice={} camera={} location={}",
        config.user.voice_enabled, config.user.camera_enabled, config.user.location_enabled
    );
    println!(
        "  Context:           history={} insights={} monitor every {}s",
        config.context.history_limit,
        config.context.insight_limit,
        config.context.monitor_interval_secs
    );
    println!(
        "  Autonomy:          analysis every {}s, daily summary at {:02}:00",
        config.autonomy.analysis_interval_secs, config.autonomy.daily_summary_hour
    );

    println!("\n  Backends:");
    for backend in &config.backends {
        let key = if config.api_key_for(backend).is_some() {
            "key set"
        } else {
            "no key"
        };
        let caps = &backend.capabilities;
        println!(
            "    {:<10} {:<28} reasoning={} code={} vision={} realtime={} window={} ({key})",
            backend.id,
            backend.model,
            caps.reasoning,
            caps.code_generation,
            caps.vision,
            caps.real_time_data,
            caps.context_window,
        );
    }

    let config_file = aria_config::AppConfig::config_dir().join("config.toml");
    if config_path.is_none() && !config_file.exists() {
        println!("\n  No config file found, defaults in use. `aria config` prints a template.");
    }

    Ok(())
}
