use crate::utils::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

const PIVOT_EPSILON: f64 = 1e-12;

/// Ridge regression on standardized features with an unpenalized intercept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeRegression {
    pub alpha: f64,
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl RidgeRegression {
    /// 以閉式解 (XᵀX + αI)β = Xᵀy 求係數
    pub fn fit(x: &[Vec<f64>], y: &[f64], alpha: f64) -> Result<Self> {
        if x.is_empty() || x.len() != y.len() {
            return Err(PipelineError::ModelError {
                message: format!("{} feature rows for {} targets", x.len(), y.len()),
            });
        }
        let n_features = x[0].len();
        if x.iter().any(|row| row.len() != n_features) {
            return Err(PipelineError::ModelError {
                message: "Feature rows have different lengths".to_string(),
            });
        }

        let n = x.len() as f64;
        let means: Vec<f64> = (0..n_features)
            .map(|j| x.iter().map(|row| row[j]).sum::<f64>() / n)
            .collect();
        let scales: Vec<f64> = (0..n_features)
            .map(|j| {
                let variance = x.iter().map(|row| (row[j] - means[j]).powi(2)).sum::<f64>() / n;
                let std = variance.sqrt();
                if std > 0.0 {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        let y_mean = y.iter().sum::<f64>() / n;
        let standardized: Vec<Vec<f64>> = x
            .iter()
            .map(|row| standardize(row, &means, &scales))
            .collect();

        let mut gram = vec![vec![0.0; n_features]; n_features];
        let mut rhs = vec![0.0; n_features];
        for (row, target) in standardized.iter().zip(y) {
            let centered = target - y_mean;
            for i in 0..n_features {
                rhs[i] += row[i] * centered;
                for j in 0..n_features {
                    gram[i][j] += row[i] * row[j];
                }
            }
        }
        for (i, row) in gram.iter_mut().enumerate() {
            row[i] += alpha;
        }

        let coefficients = solve(gram, rhs)?;
        Ok(Self {
            alpha,
            means,
            scales,
            coefficients,
            intercept: y_mean,
        })
    }

    pub fn predict_one(&self, features: &[f64]) -> f64 {
        standardize(features, &self.means, &self.scales)
            .iter()
            .zip(&self.coefficients)
            .map(|(x, b)| x * b)
            .sum::<f64>()
            + self.intercept
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Vec<f64> {
        x.iter().map(|row| self.predict_one(row)).collect()
    }

    /// Coefficients mapped back to the raw feature scale.
    pub fn raw_coefficients(&self) -> Vec<f64> {
        self.coefficients
            .iter()
            .zip(&self.scales)
            .map(|(b, s)| b / s)
            .collect()
    }
}

fn standardize(row: &[f64], means: &[f64], scales: &[f64]) -> Vec<f64> {
    row.iter()
        .zip(means.iter().zip(scales))
        .map(|(x, (m, s))| (x - m) / s)
        .collect()
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < PIVOT_EPSILON {
            return Err(PipelineError::ModelError {
                message: "Singular system; increase model.alpha".to_string(),
            });
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * solution[k]).sum();
        solution[row] = (b[row] - tail) / a[row][row];
    }
    Ok(solution)
}
