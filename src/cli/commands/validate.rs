//! Validate configuration command.

use anyhow::Result;
use std::path::Path;

use predict_config::load_config;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    match config_path {
        Some(path) => println!("Validating configuration: {:?}", path),
        None => println!("Validating defaults and PREDICT__* environment overrides"),
    }

    match load_config(config_path) {
        Ok(config) => {
            println!("Configuration is valid!");
            println!();
            println!("App: {}", config.app.name);
            println!("Environment: {}", config.app.environment);
            println!("Log level: {}", config.logging.level);
            println!("Symbol: {}", config.pipeline.download.symbol);
            println!("Lookback: {} days", config.pipeline.download.lookback_days);
            println!(
                "Split: {} train years / {} test years",
                config.pipeline.download.train_years, config.pipeline.download.test_years
            );
            println!("Initial capital: {}", config.pipeline.backtest.initial_capital);
            println!(
                "Confidence threshold: {}",
                config.pipeline.backtest.confidence_threshold
            );
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
