//! Recurrent sequence adapter: a fixed LSTM encoder with a trained readout.
//!
//! The LSTM weights are seeded once and never updated; only the logistic
//! readout over the final hidden state is trained, by full-batch gradient
//! descent. That keeps fitting deterministic and cheap while still giving the
//! ensemble one model that sees feature windows instead of single rows.

use ndarray::{Array1, Array2};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use predict_core::{ModelAdapter, TrainError};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scaler::StandardScaler;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Rows per input window.
    pub sequence_length: usize,
    pub hidden_size: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    pub seed: u64,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            sequence_length: 30,
            hidden_size: 16,
            epochs: 200,
            learning_rate: 0.1,
            seed: 42,
        }
    }
}

/// One LSTM step. Weights are drawn uniformly in `+-1/sqrt(hidden)`, forget
/// bias starts at one.
#[derive(Debug, Clone)]
struct LstmCell {
    w_ii: Array2<f64>,
    w_hi: Array2<f64>,
    b_i: Array1<f64>,
    w_if: Array2<f64>,
    w_hf: Array2<f64>,
    b_f: Array1<f64>,
    w_ig: Array2<f64>,
    w_hg: Array2<f64>,
    b_g: Array1<f64>,
    w_io: Array2<f64>,
    w_ho: Array2<f64>,
    b_o: Array1<f64>,
    hidden_size: usize,
}

impl LstmCell {
    fn new(input_size: usize, hidden_size: usize, rng: &mut ChaCha8Rng) -> Self {
        let limit = (1.0 / hidden_size as f64).sqrt();
        let dist = Uniform::new(-limit, limit);
        let mut mat =
            |rows: usize, cols: usize| Array2::random_using((rows, cols), dist, rng);

        let w_ii = mat(hidden_size, input_size);
        let w_hi = mat(hidden_size, hidden_size);
        let w_if = mat(hidden_size, input_size);
        let w_hf = mat(hidden_size, hidden_size);
        let w_ig = mat(hidden_size, input_size);
        let w_hg = mat(hidden_size, hidden_size);
        let w_io = mat(hidden_size, input_size);
        let w_ho = mat(hidden_size, hidden_size);

        Self {
            w_ii,
            w_hi,
            b_i: Array1::zeros(hidden_size),
            w_if,
            w_hf,
            b_f: Array1::from_elem(hidden_size, 1.0),
            w_ig,
            w_hg,
            b_g: Array1::zeros(hidden_size),
            w_io,
            w_ho,
            b_o: Array1::zeros(hidden_size),
            hidden_size,
        }
    }

    fn forward(
        &self,
        x: &Array1<f64>,
        h_prev: &Array1<f64>,
        c_prev: &Array1<f64>,
    ) -> (Array1<f64>, Array1<f64>) {
        let i_gate = sigmoid(&(self.w_ii.dot(x) + self.w_hi.dot(h_prev) + &self.b_i));
        let f_gate = sigmoid(&(self.w_if.dot(x) + self.w_hf.dot(h_prev) + &self.b_f));
        let g = tanh(&(self.w_ig.dot(x) + self.w_hg.dot(h_prev) + &self.b_g));
        let o_gate = sigmoid(&(self.w_io.dot(x) + self.w_ho.dot(h_prev) + &self.b_o));

        let c_next = &f_gate * c_prev + &i_gate * &g;
        let h_next = &o_gate * &tanh(&c_next);
        (h_next, c_next)
    }

    /// Final hidden state after running the whole window.
    fn encode(&self, window: &[Vec<f64>]) -> Array1<f64> {
        let mut h = Array1::zeros(self.hidden_size);
        let mut c = Array1::zeros(self.hidden_size);
        for row in window {
            let x = Array1::from_vec(row.clone());
            let (h_next, c_next) = self.forward(&x, &h, &c);
            h = h_next;
            c = c_next;
        }
        h
    }
}

fn sigmoid(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}

fn tanh(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(|v| v.tanh())
}

/// Sequence model over sliding feature windows.
#[derive(Debug, Clone)]
pub struct SequenceModel {
    config: SequenceConfig,
    scaler: StandardScaler,
    cell: Option<LstmCell>,
    readout_weights: Array1<f64>,
    readout_bias: f64,
    /// Train positive rate, used for rows without a full window.
    prior: f64,
}

impl SequenceModel {
    pub fn new(config: SequenceConfig) -> Self {
        Self {
            config,
            scaler: StandardScaler::default(),
            cell: None,
            readout_weights: Array1::zeros(0),
            readout_bias: 0.0,
            prior: 0.5,
        }
    }

    fn confidence_one(&self, cell: &LstmCell, scaled: &[Vec<f64>], idx: usize) -> f64 {
        let len = self.config.sequence_length;
        if idx + 1 < len {
            return self.prior;
        }
        let hidden = cell.encode(&scaled[idx + 1 - len..=idx]);
        let z = self.readout_weights.dot(&hidden) + self.readout_bias;
        1.0 / (1.0 + (-z).exp())
    }

    fn confidences(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        let Some(cell) = &self.cell else {
            return vec![self.prior; rows.len()];
        };
        let scaled = self.scaler.transform(rows);
        (0..rows.len())
            .map(|i| self.confidence_one(cell, &scaled, i))
            .collect()
    }
}

impl ModelAdapter for SequenceModel {
    fn name(&self) -> &str {
        "sequence_model"
    }

    fn fit(&mut self, rows: &[Vec<f64>], labels: &[bool]) -> Result<(), TrainError> {
        if rows.is_empty() || rows.len() != labels.len() {
            return Err(TrainError::Model(format!(
                "sequence_model: {} rows and {} labels",
                rows.len(),
                labels.len()
            )));
        }
        let len = self.config.sequence_length;
        if rows.len() <= len {
            return Err(TrainError::Model(format!(
                "sequence_model: {} rows is too few for windows of {len}",
                rows.len()
            )));
        }

        self.scaler = StandardScaler::fit(rows);
        let scaled = self.scaler.transform(rows);

        let positives = labels.iter().filter(|&&l| l).count();
        self.prior = positives as f64 / labels.len() as f64;

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let cell = LstmCell::new(rows[0].len(), self.config.hidden_size, &mut rng);

        // Encode every full window once, then train the logistic readout.
        let encoded: Vec<(Array1<f64>, f64)> = (len - 1..rows.len())
            .map(|i| {
                let hidden = cell.encode(&scaled[i + 1 - len..=i]);
                let target = if labels[i] { 1.0 } else { 0.0 };
                (hidden, target)
            })
            .collect();

        let n = encoded.len() as f64;
        let mut weights = Array1::zeros(self.config.hidden_size);
        let mut bias = 0.0;

        for _ in 0..self.config.epochs {
            let mut grad_w = Array1::<f64>::zeros(self.config.hidden_size);
            let mut grad_b = 0.0;

            for (hidden, target) in &encoded {
                let z: f64 = weights.dot(hidden) + bias;
                let p = 1.0 / (1.0 + (-z).exp());
                let err = p - target;
                grad_w = grad_w + hidden * err;
                grad_b += err;
            }

            weights = weights - &(grad_w * (self.config.learning_rate / n));
            bias -= self.config.learning_rate * grad_b / n;
        }

        self.cell = Some(cell);
        self.readout_weights = weights;
        self.readout_bias = bias;

        debug!(
            windows = encoded.len(),
            hidden = self.config.hidden_size,
            "fitted sequence model"
        );
        Ok(())
    }

    fn predict(&self, rows: &[Vec<f64>]) -> Vec<bool> {
        self.confidences(rows).iter().map(|&c| c >= 0.5).collect()
    }

    fn predict_confidence(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        self.confidences(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regime_data(n: usize) -> (Vec<Vec<f64>>, Vec<bool>) {
        // Two alternating regimes, each long enough to fill a window.
        let rows: Vec<Vec<f64>> = (0..n)
            .map(|i| {
                let regime = if (i / 40) % 2 == 0 { 1.0 } else { -1.0 };
                vec![regime, regime * 0.5 + (i as f64 * 0.3).sin() * 0.1]
            })
            .collect();
        let labels: Vec<bool> = (0..n).map(|i| (i / 40) % 2 == 0).collect();
        (rows, labels)
    }

    #[test]
    fn test_learns_regimes() {
        let (rows, labels) = regime_data(240);
        let mut model = SequenceModel::new(SequenceConfig {
            sequence_length: 10,
            ..Default::default()
        });
        model.fit(&rows, &labels).expect("fit");

        let predictions = model.predict(&rows);
        // Skip rows without full windows and regime boundaries.
        let correct = predictions
            .iter()
            .zip(&labels)
            .skip(20)
            .filter(|(p, l)| p == l)
            .count();
        assert!(correct as f64 / (rows.len() - 20) as f64 > 0.7);
    }

    #[test]
    fn test_short_lookback_rows_get_prior() {
        let (rows, labels) = regime_data(200);
        let mut model = SequenceModel::new(SequenceConfig {
            sequence_length: 30,
            ..Default::default()
        });
        model.fit(&rows, &labels).expect("fit");

        let confidences = model.predict_confidence(&rows[..5].to_vec());
        for c in confidences {
            assert!((c - model.prior).abs() < 1e-10);
        }
    }

    #[test]
    fn test_too_few_rows_is_error() {
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let labels = vec![true; 10];
        let mut model = SequenceModel::new(SequenceConfig::default());
        assert!(model.fit(&rows, &labels).is_err());
    }

    #[test]
    fn test_seed_determinism() {
        let (rows, labels) = regime_data(160);
        let config = SequenceConfig {
            sequence_length: 10,
            epochs: 50,
            ..Default::default()
        };
        let mut a = SequenceModel::new(config.clone());
        let mut b = SequenceModel::new(config);
        a.fit(&rows, &labels).expect("fit");
        b.fit(&rows, &labels).expect("fit");

        assert_eq!(a.predict_confidence(&rows), b.predict_confidence(&rows));
    }
}
