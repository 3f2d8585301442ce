//! List model families command.

use anyhow::Result;

use predict_models::{default_adapters, ModelsConfig};

pub async fn run() -> Result<()> {
    let adapters = default_adapters(&ModelsConfig::default());

    println!("Available Model Families");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    for adapter in &adapters {
        println!("  {}", adapter.name());
        println!("  ───────────────────────────────────────────────────────");
        println!("  {}", describe(adapter.name()));
        println!();
    }

    println!("All families are trained on every run; use --sequential to");
    println!("train them one at a time.");

    Ok(())
}

fn describe(name: &str) -> &'static str {
    match name {
        "tree_ensemble" => "Bagged decision trees with per-tree feature subsampling.",
        "gradient_boosted" => "Boosted regression stumps fit to residuals.",
        "sequence_model" => "Recurrent encoder over a trailing window with a trained readout.",
        _ => "Unknown model family.",
    }
}
