pub mod dataset;
pub mod metrics;
pub mod ridge;

pub use dataset::{build_training_set, split, TrainingExample};
pub use metrics::Metrics;
pub use ridge::RidgeRegression;

use crate::config::toml_config::ModelConfig;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};

/// Persisted career-outcome model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerModel {
    pub target: String,
    pub feature_names: Vec<String>,
    #[serde(flatten)]
    pub regression: RidgeRegression,
    pub train_metrics: Option<Metrics>,
    pub test_metrics: Option<Metrics>,
}

impl CareerModel {
    pub fn train(
        train: &[TrainingExample],
        test: &[TrainingExample],
        feature_names: Vec<String>,
        config: &ModelConfig,
    ) -> Result<Self> {
        let (x, y) = matrix(train);
        let regression = RidgeRegression::fit(&x, &y, config.alpha)?;
        let train_metrics = Metrics::evaluate(&y, &regression.predict(&x));

        let (test_x, test_y) = matrix(test);
        let test_metrics = Metrics::evaluate(&test_y, &regression.predict(&test_x));

        Ok(Self {
            target: config.target.as_str().to_string(),
            feature_names,
            regression,
            train_metrics,
            test_metrics,
        })
    }

    pub fn predict(&self, example: &TrainingExample) -> f64 {
        self.regression.predict_one(&example.features)
    }
}

fn matrix(examples: &[TrainingExample]) -> (Vec<Vec<f64>>, Vec<f64>) {
    examples
        .iter()
        .map(|e| (e.features.clone(), e.target))
        .unzip()
}
