//! Per-column zero-mean / unit-variance normalization.

use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Column-wise standard scaler fitted on a training matrix.
///
/// Columns with zero variance scale by 1.0 so constant features pass
/// through centered instead of dividing by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    std_devs: Vec<f64>,
}

impl StandardScaler {
    /// Fit on a non-empty matrix of equal-length rows.
    pub fn fit(rows: &[FeatureVector]) -> Self {
        let dim = rows.first().map(|r| r.dim()).unwrap_or(0);
        let mut means = Vec::with_capacity(dim);
        let mut std_devs = Vec::with_capacity(dim);

        for col in 0..dim {
            let column: Vec<f64> = rows.iter().map(|r| r.as_slice()[col]).collect();
            let mean = column.iter().copied().mean();
            let sd = column.iter().copied().population_std_dev();
            means.push(if mean.is_finite() { mean } else { 0.0 });
            std_devs.push(if sd.is_finite() && sd > 0.0 { sd } else { 1.0 });
        }

        Self { means, std_devs }
    }

    pub fn dim(&self) -> usize {
        self.means.len()
    }

    /// Apply the fitted transform to one vector.
    pub fn transform(&self, vector: &FeatureVector) -> Vec<f64> {
        vector
            .as_slice()
            .iter()
            .zip(self.means.iter().zip(self.std_devs.iter()))
            .map(|(v, (mean, sd))| (v - mean) / sd)
            .collect()
    }

    /// Transform a whole matrix.
    pub fn transform_all(&self, rows: &[FeatureVector]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FEATURE_DIM;

    fn vector_of(values: &[f64]) -> FeatureVector {
        FeatureVector::from_values(values.to_vec())
    }

    #[test]
    fn test_transform_centers_and_scales() {
        let rows = vec![vector_of(&[1.0]), vector_of(&[3.0])];
        let scaler = StandardScaler::fit(&rows);

        let scaled = scaler.transform(&rows[0]);
        // mean 2, population sd 1
        assert!((scaled[0] - (-1.0)).abs() < 1e-9);
        let scaled = scaler.transform(&rows[1]);
        assert!((scaled[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_column_guard() {
        let rows = vec![vector_of(&[5.0]), vector_of(&[5.0]), vector_of(&[5.0])];
        let scaler = StandardScaler::fit(&rows);

        let scaled = scaler.transform(&rows[0]);
        assert_eq!(scaled[0], 0.0);
        assert!(scaled.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_dim_matches_input() {
        let rows = vec![vector_of(&[1.0, 2.0, 3.0])];
        let scaler = StandardScaler::fit(&rows);
        assert_eq!(scaler.dim(), FEATURE_DIM);
    }
}
