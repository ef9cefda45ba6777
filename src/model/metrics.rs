use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub n: usize,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

impl Metrics {
    pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Option<Self> {
        if actual.is_empty() || actual.len() != predicted.len() {
            return None;
        }
        let n = actual.len() as f64;
        let residuals: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();

        let sse: f64 = residuals.iter().map(|r| r * r).sum();
        let mean = actual.iter().sum::<f64>() / n;
        let sst: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

        Some(Self {
            n: actual.len(),
            rmse: (sse / n).sqrt(),
            mae: residuals.iter().map(|r| r.abs()).sum::<f64>() / n,
            // 目標值無變異時 R² 定為 0
            r2: if sst > 0.0 { 1.0 - sse / sst } else { 0.0 },
        })
    }
}
