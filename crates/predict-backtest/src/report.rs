//! Backtest report generation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::metrics::ModelBacktest;

/// All per-model results from one backtest stage run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub results: HashMap<String, ModelBacktest>,
}

impl BacktestReport {
    pub fn new(results: HashMap<String, ModelBacktest>) -> Self {
        Self { results }
    }

    /// The model with the highest total return.
    pub fn best_model(&self) -> Option<&ModelBacktest> {
        self.results
            .values()
            .max_by(|a, b| a.total_return_pct.cmp(&b.total_return_pct))
    }

    /// Generate a text summary, models in name order.
    pub fn summary(&self) -> String {
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str("                     BACKTEST REPORT                        \n");
        s.push_str("═══════════════════════════════════════════════════════════\n\n");

        let mut names: Vec<&String> = self.results.keys().collect();
        names.sort();

        for name in names {
            let r = &self.results[name];
            s.push_str(&format!("MODEL: {name}\n"));
            s.push_str("───────────────────────────────────────────────────────────\n");
            s.push_str(&format!("  Accuracy:            {:.2}%\n", r.accuracy * 100.0));
            s.push_str(&format!("  Total Return:        {:.2}%\n", r.total_return_pct));
            s.push_str(&format!(
                "  Buy & Hold Return:   {:.2}%\n",
                r.buy_hold_return_pct
            ));
            s.push_str(&format!("  Sharpe Ratio:        {:.2}\n", r.sharpe_ratio));
            s.push_str(&format!("  Max Drawdown:        {:.2}%\n", r.max_drawdown_pct));
            s.push_str(&format!("  Win Rate:            {:.2}%\n", r.win_rate_pct));
            s.push_str(&format!("  Final Equity:        ${:.2}\n", r.final_equity));
            s.push_str(&format!(
                "  Confusion:           TP {} / FP {} / TN {} / FN {}\n",
                r.confusion.true_positive,
                r.confusion.false_positive,
                r.confusion.true_negative,
                r.confusion.false_negative
            ));
            s.push('\n');
        }

        if let Some(best) = self.best_model() {
            s.push_str(&format!(
                "BEST MODEL: {} ({:.2}% total return)\n",
                best.model_name, best.total_return_pct
            ));
        }
        s.push_str("═══════════════════════════════════════════════════════════\n");

        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export one model's equity curve as CSV.
    pub fn equity_to_csv(&self, model_name: &str) -> Option<String> {
        let result = self.results.get(model_name)?;
        let mut csv = String::from("timestamp,equity\n");
        for (ts, equity) in &result.equity_curve {
            csv.push_str(&format!("{ts},{equity}\n"));
        }
        Some(csv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn result(name: &str, total_return: rust_decimal::Decimal) -> ModelBacktest {
        let mut r = ModelBacktest::compute(
            name,
            &[true, false],
            &[true, false],
            &[true, false],
            &[0.01, -0.01],
            &[0, 86_400_000],
            dec!(10_000),
            365.0,
        );
        r.total_return_pct = total_return;
        r
    }

    #[test]
    fn test_summary_lists_all_models() {
        let mut results = HashMap::new();
        results.insert("alpha".to_string(), result("alpha", dec!(5)));
        results.insert("beta".to_string(), result("beta", dec!(12)));

        let report = BacktestReport::new(results);
        let summary = report.summary();

        assert!(summary.contains("MODEL: alpha"));
        assert!(summary.contains("MODEL: beta"));
        assert!(summary.contains("BEST MODEL: beta"));
    }

    #[test]
    fn test_equity_csv() {
        let mut results = HashMap::new();
        results.insert("alpha".to_string(), result("alpha", dec!(5)));
        let report = BacktestReport::new(results);

        let csv = report.equity_to_csv("alpha").expect("model exists");
        assert!(csv.starts_with("timestamp,equity\n"));
        assert!(report.equity_to_csv("missing").is_none());
    }
}
