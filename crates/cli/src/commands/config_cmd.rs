//! `aria config`: print the default configuration.

use aria_config::AppConfig;

pub fn run() {
    println!("# Default ARIA configuration");
    println!("# Save as {}", AppConfig::config_dir().join("config.toml").display());
    println!();
    print!("{}", AppConfig::default_toml());
}
