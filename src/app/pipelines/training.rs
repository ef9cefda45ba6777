use crate::config::toml_config::{layout, ModelConfig};
use crate::core::records::{read_records, write_records};
use crate::domain::model::TimelineEntry;
use crate::domain::ports::{Counted, Pipeline, Storage};
use crate::model::dataset::{build_training_set, split, TrainingExample};
use crate::model::CareerModel;
use crate::utils::error::{PipelineError, Result};
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub player_id: u32,
    pub player_name: String,
    pub split: String,
    pub actual: f64,
    pub predicted: f64,
}

pub struct TrainingOutcome {
    pub model: CareerModel,
    pub predictions: Vec<Prediction>,
}

impl Counted for TrainingOutcome {
    fn count(&self) -> usize {
        self.predictions.len()
    }
}

/// Fits the career-outcome model on the early-career feature table.
pub struct TrainingPipeline<St> {
    storage: St,
    config: ModelConfig,
}

impl<St: Storage> TrainingPipeline<St> {
    pub fn new(storage: St, config: ModelConfig) -> Self {
        Self { storage, config }
    }
}

#[async_trait]
impl<St: Storage> Pipeline for TrainingPipeline<St> {
    type Extracted = Vec<TrainingExample>;
    type Transformed = TrainingOutcome;

    fn name(&self) -> &str {
        "career-model"
    }

    async fn extract(&self) -> Result<Vec<TrainingExample>> {
        if !self.storage.exists(layout::EARLY_CAREER_STATS).await {
            return Err(PipelineError::DataNotFoundError {
                message: format!(
                    "{} not found. Run run_pipeline first.",
                    self.storage.full_path(layout::EARLY_CAREER_STATS)
                ),
            });
        }
        let table = self.storage.read_file(layout::EARLY_CAREER_STATS).await?;
        let timeline: Vec<TimelineEntry> =
            read_records(&self.storage, layout::PLAYER_TIMELINE, "download_data").await?;

        build_training_set(
            &table,
            &timeline,
            &self.config.feature_names(),
            self.config.target,
        )
    }

    async fn transform(&self, examples: Vec<TrainingExample>) -> Result<TrainingOutcome> {
        let (train, test) = split(examples, self.config.test_fraction, self.config.seed);
        tracing::info!(
            "🎯 Target {}: {} training / {} test players",
            self.config.target.as_str(),
            train.len(),
            test.len()
        );

        let model = CareerModel::train(&train, &test, self.config.feature_names(), &self.config)?;
        for (label, metrics) in [("train", &model.train_metrics), ("test", &model.test_metrics)] {
            if let Some(m) = metrics {
                tracing::info!(
                    "📈 {} (n={}): RMSE {:.3}, MAE {:.3}, R² {:.3}",
                    label,
                    m.n,
                    m.rmse,
                    m.mae,
                    m.r2
                );
            }
        }

        let predictions = train
            .iter()
            .map(|e| ("train", e))
            .chain(test.iter().map(|e| ("test", e)))
            .map(|(label, e)| Prediction {
                player_id: e.player_id,
                player_name: e.player_name.clone(),
                split: label.to_string(),
                actual: e.target,
                predicted: model.predict(e),
            })
            .collect();

        Ok(TrainingOutcome { model, predictions })
    }

    async fn load(&self, outcome: TrainingOutcome) -> Result<String> {
        let json = serde_json::to_vec_pretty(&outcome.model)?;
        self.storage.write_file(layout::MODEL, &json).await?;
        write_records(&self.storage, layout::PREDICTIONS, &outcome.predictions).await?;
        Ok(self.storage.full_path(layout::MODEL))
    }
}
