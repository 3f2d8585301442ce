//! Run command implementation.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use predict_config::load_config;
use predict_core::{DataSource, Interval};
use predict_data::{CsvSource, SyntheticSource};
use predict_pipeline::Pipeline;

use crate::cli::RunArgs;

pub async fn run(args: RunArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path).context("Failed to load configuration")?;

    // CLI arguments override the config file
    if let Some(symbol) = &args.symbol {
        config.pipeline.download.symbol = symbol.clone();
    }
    if let Some(interval) = &args.interval {
        config.pipeline.data.interval = parse_interval(interval)?;
    }
    if let Some(days) = args.lookback_days {
        config.pipeline.download.lookback_days = days;
    }
    if let Some(capital) = args.capital {
        config.pipeline.backtest.initial_capital =
            Decimal::try_from(capital).unwrap_or(config.pipeline.backtest.initial_capital);
    }
    if args.sequential {
        config.pipeline.models.parallel = false;
    }

    let source: Arc<dyn DataSource> = if let Some(data_path) = &args.data {
        info!("Loading data from {:?}", data_path);
        Arc::new(CsvSource::new(data_path).context("Failed to open data file")?)
    } else {
        info!(seed = args.seed, "No data file given, generating a synthetic series");
        let mut synthetic = SyntheticSource::new(args.seed);
        if let Some(bars) = args.bars {
            synthetic = synthetic.with_bar_count(bars);
        }
        Arc::new(synthetic)
    };

    let pipeline = Pipeline::new(source, config.pipeline.clone());

    let download = pipeline.run_download().await?;
    info!(
        total = download.total_records,
        train = download.train_records,
        test = download.test_records,
        "data ready"
    );

    let features = pipeline.run_feature_engineering().await?;
    info!(
        features = features.total_features,
        train_samples = features.train_samples,
        "features ready"
    );

    let outcomes = pipeline.run_training().await?;
    for outcome in &outcomes {
        if outcome.success {
            info!(
                model = %outcome.model_name,
                secs = outcome.training_secs,
                "model trained"
            );
        }
    }

    let report = pipeline.run_backtest().await?;

    // Output results
    match args.output.as_str() {
        "json" => {
            let json = report.to_json()?;
            println!("{}", json);
        }
        _ => {
            println!("{}", report.summary());
        }
    }

    // Save if requested
    if let Some(save_path) = &args.save {
        let json = report.to_json()?;
        std::fs::write(save_path, json)?;
        info!("Results saved to {:?}", save_path);
    }

    if let Some(model_name) = &args.equity_csv {
        let csv = report
            .equity_to_csv(model_name)
            .with_context(|| format!("No backtest results for model '{}'", model_name))?;
        let path = format!("{}_equity.csv", model_name);
        std::fs::write(&path, csv)?;
        info!("Equity curve saved to {}", path);
    }

    Ok(())
}

fn parse_interval(value: &str) -> Result<Interval> {
    match value {
        "1h" => Ok(Interval::Hourly),
        "1d" => Ok(Interval::Daily),
        other => anyhow::bail!("Unknown interval '{}'. Use 1h or 1d", other),
    }
}
