//! The four-stage pipeline and its state machine.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::info;

use predict_backtest::{BacktestConfig, BacktestEngine, BacktestReport, ModelBacktest};
use predict_core::{
    DataSource, FeatureMatrix, FitOutcome, MarketDataset, PipelineError, PipelineResult, Stage,
};
use predict_data::{download, DataConfig, DownloadRequest, DownloadSummary};
use predict_features::{FeatureConfig, FeatureEngineer, FeatureSummary};
use predict_models::{default_adapters, ModelsConfig, TrainedModels, TrainingOrchestrator};

/// All per-stage settings in one place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub download: DownloadRequest,
    pub data: DataConfig,
    pub features: FeatureConfig,
    pub models: ModelsConfig,
    pub backtest: BacktestConfig,
}

/// Current position of the pipeline, plus any stage in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineStatus {
    pub stage: Stage,
    pub running: Option<Stage>,
}

#[derive(Default)]
struct StageState {
    stage: Stage,
    dataset: Option<Arc<MarketDataset>>,
    matrix: Option<Arc<FeatureMatrix>>,
    trained: Option<Arc<TrainedModels>>,
    results: Option<Arc<HashMap<String, ModelBacktest>>>,
}

/// Four-stage prediction pipeline: download, feature engineering, training,
/// backtest.
///
/// Each operation checks its prerequisite, rejects concurrent invocations
/// with `StageConflict`, and commits its artifact and stage marker together
/// under the state lock. Re-running an earlier stage moves the marker back
/// and drops every downstream artifact, so stale models can never be scored
/// against fresh data.
pub struct Pipeline {
    source: Arc<dyn DataSource>,
    config: PipelineConfig,
    state: Mutex<StageState>,
    /// Stage currently executing, if any. Held only for bookkeeping; the
    /// state lock itself is never held across an await.
    running: Mutex<Option<Stage>>,
}

/// Clears the in-flight marker on drop, so a failed stage releases it too.
struct RunGuard<'a> {
    slot: &'a Mutex<Option<Stage>>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        *lock(self.slot) = None;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Pipeline {
    pub fn new(source: Arc<dyn DataSource>, config: PipelineConfig) -> Self {
        Self {
            source,
            config,
            state: Mutex::new(StageState::default()),
            running: Mutex::new(None),
        }
    }

    pub fn status(&self) -> PipelineStatus {
        PipelineStatus {
            stage: lock(&self.state).stage,
            running: *lock(&self.running),
        }
    }

    /// Stage 1: fetch, validate and split historical data.
    pub async fn run_download(&self) -> PipelineResult<DownloadSummary> {
        let _guard = self.begin(Stage::DataReady)?;

        let (dataset, summary) =
            download(self.source.as_ref(), &self.config.data, &self.config.download).await?;

        let mut state = self.commit_lock(Stage::DataReady)?;
        state.dataset = Some(Arc::new(dataset));
        state.matrix = None;
        state.trained = None;
        state.results = None;
        state.stage = Stage::DataReady;
        info!(stage = %state.stage, "stage committed");
        Ok(summary)
    }

    /// Stage 2: turn the dataset into a labeled feature matrix.
    pub async fn run_feature_engineering(&self) -> PipelineResult<FeatureSummary> {
        let _guard = self.begin(Stage::FeaturesReady)?;

        let dataset = {
            let state = lock(&self.state);
            self.require(&state, Stage::FeaturesReady)?;
            state.dataset.clone().ok_or(PipelineError::PrerequisiteNotMet {
                expected: Stage::DataReady,
                actual: state.stage,
            })?
        };

        let engineer = FeatureEngineer::new(self.config.features.clone());
        let (matrix, summary) = engineer.engineer(&dataset)?;

        let mut state = self.commit_lock(Stage::FeaturesReady)?;
        state.matrix = Some(Arc::new(matrix));
        state.trained = None;
        state.results = None;
        state.stage = Stage::FeaturesReady;
        info!(stage = %state.stage, "stage committed");
        Ok(summary)
    }

    /// Stage 3: fit all model adapters on the train partition.
    pub async fn run_training(&self) -> PipelineResult<Vec<FitOutcome>> {
        let _guard = self.begin(Stage::ModelsReady)?;

        let matrix = {
            let state = lock(&self.state);
            self.require(&state, Stage::ModelsReady)?;
            state.matrix.clone().ok_or(PipelineError::PrerequisiteNotMet {
                expected: Stage::FeaturesReady,
                actual: state.stage,
            })?
        };

        let adapters = default_adapters(&self.config.models);
        let rows = Arc::new(matrix.train_rows().to_vec());
        let labels = Arc::new(matrix.train_labels().to_vec());
        let orchestrator = TrainingOrchestrator::new(self.config.models.parallel);
        let trained = orchestrator.train(adapters, rows, labels).await?;
        let outcomes = trained.outcomes.clone();

        let mut state = self.commit_lock(Stage::ModelsReady)?;
        state.trained = Some(Arc::new(trained));
        state.results = None;
        state.stage = Stage::ModelsReady;
        info!(stage = %state.stage, "stage committed");
        Ok(outcomes)
    }

    /// Stage 4: score every trained model over the test partition.
    pub async fn run_backtest(&self) -> PipelineResult<BacktestReport> {
        let _guard = self.begin(Stage::BacktestReady)?;

        let (matrix, trained) = {
            let state = lock(&self.state);
            self.require(&state, Stage::BacktestReady)?;
            let missing = || PipelineError::PrerequisiteNotMet {
                expected: Stage::ModelsReady,
                actual: state.stage,
            };
            (
                state.matrix.clone().ok_or_else(missing)?,
                state.trained.clone().ok_or_else(missing)?,
            )
        };

        let engine = BacktestEngine::new(self.config.backtest.clone());
        let results = engine.run(&trained.models, &matrix, self.config.data.interval)?;

        let mut state = self.commit_lock(Stage::BacktestReady)?;
        state.results = Some(Arc::new(results.clone()));
        state.stage = Stage::BacktestReady;
        info!(stage = %state.stage, "stage committed");
        Ok(BacktestReport::new(results))
    }

    /// Run all four stages in order.
    pub async fn run_all(&self) -> PipelineResult<BacktestReport> {
        self.run_download().await?;
        self.run_feature_engineering().await?;
        self.run_training().await?;
        self.run_backtest().await
    }

    /// Results of the last committed backtest, if any.
    pub fn latest_results(&self) -> Option<Arc<HashMap<String, ModelBacktest>>> {
        lock(&self.state).results.clone()
    }

    /// Claim the in-flight slot or report which stage holds it.
    fn begin(&self, target: Stage) -> PipelineResult<RunGuard<'_>> {
        let mut slot = lock(&self.running);
        if let Some(running) = *slot {
            return Err(PipelineError::StageConflict { running });
        }
        *slot = Some(target);
        info!(stage = %target, "stage started");
        Ok(RunGuard {
            slot: &self.running,
        })
    }

    fn require(&self, state: &StageState, target: Stage) -> PipelineResult<()> {
        if let Some(expected) = target.prerequisite() {
            if state.stage < expected {
                return Err(PipelineError::PrerequisiteNotMet {
                    expected,
                    actual: state.stage,
                });
            }
        }
        Ok(())
    }

    /// Re-acquire the state lock for commit and re-verify the prerequisite
    /// before the stage marker moves.
    fn commit_lock(&self, target: Stage) -> PipelineResult<MutexGuard<'_, StageState>> {
        let state = lock(&self.state);
        self.require(&state, target)?;
        Ok(state)
    }
}
