//! Runs every model adapter over the train partition, isolating failures.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use predict_core::{FitOutcome, ModelAdapter, TrainError};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Training output: the adapters that fitted successfully plus one outcome
/// record per adapter, in registration order.
pub struct TrainedModels {
    pub models: Vec<Box<dyn ModelAdapter>>,
    pub outcomes: Vec<FitOutcome>,
}

impl std::fmt::Debug for TrainedModels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.models.iter().map(|m| m.name()).collect();
        f.debug_struct("TrainedModels")
            .field("models", &names)
            .field("outcomes", &self.outcomes)
            .finish()
    }
}

/// Fits a set of adapters on shared train data.
///
/// One adapter failing, by error or by panic, never takes down the run;
/// the stage only errors when every adapter fails.
#[derive(Debug, Clone)]
pub struct TrainingOrchestrator {
    parallel: bool,
}

impl TrainingOrchestrator {
    pub fn new(parallel: bool) -> Self {
        Self { parallel }
    }

    pub async fn train(
        &self,
        adapters: Vec<Box<dyn ModelAdapter>>,
        rows: Arc<Vec<Vec<f64>>>,
        labels: Arc<Vec<bool>>,
    ) -> Result<TrainedModels, TrainError> {
        if adapters.is_empty() {
            return Err(TrainError::AllModelsFailed);
        }

        let results = if self.parallel {
            self.train_parallel(adapters, rows, labels).await
        } else {
            self.train_sequential(adapters, rows, labels)
        };

        let mut models = Vec::new();
        let mut outcomes = Vec::new();
        for (adapter, outcome) in results {
            if outcome.success {
                info!(model = %outcome.model_name, secs = outcome.training_secs, "model trained");
                if let Some(adapter) = adapter {
                    models.push(adapter);
                }
            } else {
                warn!(
                    model = %outcome.model_name,
                    error = outcome.error.as_deref().unwrap_or("unknown"),
                    "model failed to train"
                );
            }
            outcomes.push(outcome);
        }

        if models.is_empty() {
            error!("no model trained successfully");
            return Err(TrainError::AllModelsFailed);
        }
        Ok(TrainedModels { models, outcomes })
    }

    async fn train_parallel(
        &self,
        adapters: Vec<Box<dyn ModelAdapter>>,
        rows: Arc<Vec<Vec<f64>>>,
        labels: Arc<Vec<bool>>,
    ) -> Vec<(Option<Box<dyn ModelAdapter>>, FitOutcome)> {
        let mut set = JoinSet::new();
        let names: Vec<String> = adapters.iter().map(|a| a.name().to_string()).collect();

        for (idx, mut adapter) in adapters.into_iter().enumerate() {
            let rows = Arc::clone(&rows);
            let labels = Arc::clone(&labels);
            // Panics are caught inside the task so the adapter index survives.
            set.spawn_blocking(move || {
                let started = Instant::now();
                let result = catch_unwind(AssertUnwindSafe(|| {
                    adapter.fit(&rows, &labels).map(|()| adapter)
                }));
                (idx, result, started.elapsed().as_secs_f64())
            });
        }

        let mut slots: Vec<Option<(Option<Box<dyn ModelAdapter>>, FitOutcome)>> =
            names.iter().map(|_| None).collect();

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, Ok(Ok(adapter)), secs)) => {
                    slots[idx] = Some((Some(adapter), FitOutcome::success(&names[idx], secs)));
                }
                Ok((idx, Ok(Err(err)), secs)) => {
                    slots[idx] =
                        Some((None, FitOutcome::failure(&names[idx], secs, err.to_string())));
                }
                Ok((idx, Err(_), secs)) => {
                    slots[idx] = Some((
                        None,
                        FitOutcome::failure(&names[idx], secs, "training panicked".to_string()),
                    ));
                }
                Err(join_err) => {
                    warn!(error = %join_err, "training task aborted");
                }
            }
        }

        fill_aborted_slots(slots, &names)
    }

    fn train_sequential(
        &self,
        adapters: Vec<Box<dyn ModelAdapter>>,
        rows: Arc<Vec<Vec<f64>>>,
        labels: Arc<Vec<bool>>,
    ) -> Vec<(Option<Box<dyn ModelAdapter>>, FitOutcome)> {
        adapters
            .into_iter()
            .map(|mut adapter| {
                let name = adapter.name().to_string();
                let started = Instant::now();
                let result = catch_unwind(AssertUnwindSafe(|| {
                    adapter.fit(&rows, &labels).map(|()| adapter)
                }));
                let secs = started.elapsed().as_secs_f64();

                match result {
                    Ok(Ok(adapter)) => (Some(adapter), FitOutcome::success(&name, secs)),
                    Ok(Err(err)) => (None, FitOutcome::failure(&name, secs, err.to_string())),
                    Err(_) => (
                        None,
                        FitOutcome::failure(&name, secs, "training panicked".to_string()),
                    ),
                }
            })
            .collect()
    }
}

/// A `JoinError` carries no adapter index, so an aborted task leaves its
/// slot empty. Every adapter still gets an outcome record; the mapping is
/// never partial.
fn fill_aborted_slots(
    slots: Vec<Option<(Option<Box<dyn ModelAdapter>>, FitOutcome)>>,
    names: &[String],
) -> Vec<(Option<Box<dyn ModelAdapter>>, FitOutcome)> {
    slots
        .into_iter()
        .enumerate()
        .map(|(idx, slot)| {
            slot.unwrap_or_else(|| {
                (
                    None,
                    FitOutcome::failure(&names[idx], 0.0, "training task aborted".to_string()),
                )
            })
        })
        .collect()
}
