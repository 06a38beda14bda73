//! Delay prediction with ordinary least squares.
//!
//! Features are standardised with training statistics before fitting, so the
//! absolute coefficients double as feature importances.
use nalgebra::{DMatrix, DVector};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::anomaly::median;
use crate::constants::{DEFAULT_TEST_FRACTION, MIN_TRAINING_ROWS};
use crate::dataset::Shipment;
use crate::numbers::{floor_f64_to_usize, round_to, usize_to_f64};

/// Predictor inputs, in column order.
pub const PREDICTOR_FEATURES: [&str; 4] = ["distance_km", "cost", "sku_count", "traffic_index"];
const WIDTH: usize = PREDICTOR_FEATURES.len();

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("insufficient data for training: only {rows} samples available")]
    InsufficientData { rows: usize },
    #[error("feature matrix is singular")]
    Singular,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ModelMetrics {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    pub r2: f64,
}

/// Fitted linear model over standardised features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayModel {
    intercept: f64,
    coefficients: [f64; WIDTH],
    means: [f64; WIDTH],
    scales: [f64; WIDTH],
    medians: [f64; WIDTH],
}

fn features(shipment: &Shipment) -> [f64; WIDTH] {
    [
        shipment.distance_km,
        shipment.cost,
        f64::from(shipment.sku_count),
        shipment.traffic_index,
    ]
}

impl DelayModel {
    fn standardise(&self, raw: [f64; WIDTH]) -> [f64; WIDTH] {
        let mut out = [0.0; WIDTH];
        for (j, value) in raw.into_iter().enumerate() {
            let value = if value.is_finite() { value } else { self.medians[j] };
            out[j] = (value - self.means[j]) / self.scales[j];
        }
        out
    }

    /// Predicted delay in minutes for one shipment.
    #[must_use]
    pub fn predict_one(&self, shipment: &Shipment) -> f64 {
        let x = self.standardise(features(shipment));
        self.intercept
            + x.iter()
                .zip(self.coefficients)
                .map(|(xi, b)| xi * b)
                .sum::<f64>()
    }

    #[must_use]
    pub fn predict(&self, shipments: &[Shipment]) -> Vec<f64> {
        shipments.iter().map(|s| self.predict_one(s)).collect()
    }

    /// Normalised absolute coefficients, most important first.
    #[must_use]
    pub fn feature_importance(&self) -> Vec<(&'static str, f64)> {
        let total: f64 = self.coefficients.iter().map(|b| b.abs()).sum();
        let mut out: Vec<(&'static str, f64)> = PREDICTOR_FEATURES
            .iter()
            .zip(self.coefficients)
            .map(|(name, b)| {
                let share = if total > f64::EPSILON { b.abs() / total } else { 0.0 };
                (*name, share)
            })
            .collect();
        out.sort_by(|a, b| b.1.total_cmp(&a.1));
        out
    }
}

/// Result of a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    pub model: DelayModel,
    pub metrics: ModelMetrics,
    pub train_rows: usize,
    pub test_rows: usize,
}

fn column_stats(rows: &[[f64; WIDTH]]) -> ([f64; WIDTH], [f64; WIDTH], [f64; WIDTH]) {
    let mut means = [0.0; WIDTH];
    let mut scales = [1.0; WIDTH];
    let mut medians = [0.0; WIDTH];
    for j in 0..WIDTH {
        let column: Vec<f64> = rows.iter().map(|r| r[j]).collect();
        medians[j] = median(&column).unwrap_or(0.0);
        let filled: Vec<f64> = column
            .iter()
            .map(|v| if v.is_finite() { *v } else { medians[j] })
            .collect();
        let n = usize_to_f64(filled.len());
        means[j] = filled.iter().sum::<f64>() / n;
        let var = filled.iter().map(|v| (v - means[j]).powi(2)).sum::<f64>() / n;
        if var.sqrt() > f64::EPSILON {
            scales[j] = var.sqrt();
        }
    }
    (means, scales, medians)
}

/// Solve `a * x = b` through an LU decomposition with partial pivoting.
fn solve(a: DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>, ModelError> {
    a.lu()
        .solve(b)
        .filter(|x| x.iter().all(|v| v.is_finite()))
        .ok_or(ModelError::Singular)
}

/// Fit on the given rows. A tiny ridge term keeps constant columns solvable.
fn fit(rows: &[[f64; WIDTH]], targets: &[f64]) -> Result<DelayModel, ModelError> {
    const RIDGE: f64 = 1e-8;
    let (means, scales, medians) = column_stats(rows);
    let mut model = DelayModel {
        intercept: 0.0,
        coefficients: [0.0; WIDTH],
        means,
        scales,
        medians,
    };
    let design: Vec<f64> = rows
        .iter()
        .flat_map(|raw| std::iter::once(1.0).chain(model.standardise(*raw)))
        .collect();
    let x = DMatrix::from_row_slice(rows.len(), WIDTH + 1, &design);
    let y = DVector::from_column_slice(targets);
    let mut xtx = x.transpose() * &x;
    for i in 1..=WIDTH {
        xtx[(i, i)] += RIDGE;
    }
    let xty = x.transpose() * y;
    let beta = solve(xtx, &xty)?;
    model.intercept = beta[0];
    for (coef, value) in model.coefficients.iter_mut().zip(beta.iter().skip(1)) {
        *coef = *value;
    }
    Ok(model)
}

/// MAE, MSE, RMSE and R² (rounded for display).
#[must_use]
pub fn evaluate_model(actual: &[f64], predicted: &[f64]) -> ModelMetrics {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return ModelMetrics::default();
    }
    let count = usize_to_f64(n);
    let mean = actual[..n].iter().sum::<f64>() / count;
    let (mut abs_err, mut sq_err, mut ss_tot) = (0.0, 0.0, 0.0);
    for (y, p) in actual.iter().zip(predicted).take(n) {
        abs_err += (y - p).abs();
        sq_err += (y - p).powi(2);
        ss_tot += (y - mean).powi(2);
    }
    let mse = sq_err / count;
    let r2 = if ss_tot > f64::EPSILON {
        1.0 - sq_err / ss_tot
    } else {
        0.0
    };
    ModelMetrics {
        mae: round_to(abs_err / count, 2),
        mse: round_to(mse, 2),
        rmse: round_to(mse.sqrt(), 2),
        r2: round_to(r2, 4),
    }
}

/// Train on a seeded shuffle of `shipments`, holding out `DEFAULT_TEST_FRACTION`.
///
/// # Errors
///
/// Returns `InsufficientData` below `MIN_TRAINING_ROWS` usable rows and
/// `Singular` if the normal equations cannot be solved.
pub fn train_delay_model(shipments: &[Shipment], seed: u64) -> Result<TrainedModel, ModelError> {
    let usable: Vec<(&Shipment, f64)> = shipments
        .iter()
        .map(|s| (s, s.delay_minutes()))
        .filter(|(_, y)| y.is_finite())
        .collect();
    if usable.len() < MIN_TRAINING_ROWS {
        return Err(ModelError::InsufficientData { rows: usable.len() });
    }

    let mut order: Vec<usize> = (0..usable.len()).collect();
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    order.shuffle(&mut rng);
    let test_rows =
        floor_f64_to_usize(usize_to_f64(usable.len()) * DEFAULT_TEST_FRACTION).max(1);
    let (test_idx, train_idx) = order.split_at(test_rows);

    let train_x: Vec<[f64; WIDTH]> = train_idx.iter().map(|i| features(usable[*i].0)).collect();
    let train_y: Vec<f64> = train_idx.iter().map(|i| usable[*i].1).collect();
    let model = fit(&train_x, &train_y)?;

    let test_y: Vec<f64> = test_idx.iter().map(|i| usable[*i].1).collect();
    let test_pred: Vec<f64> = test_idx
        .iter()
        .map(|i| model.predict_one(usable[*i].0))
        .collect();
    let metrics = evaluate_model(&test_y, &test_pred);
    log::info!(
        "trained delay model on {} samples (MAE {:.2} min, RMSE {:.2} min, R² {:.3})",
        train_idx.len(),
        metrics.mae,
        metrics.rmse,
        metrics.r2
    );

    Ok(TrainedModel {
        model,
        metrics,
        train_rows: train_idx.len(),
        test_rows,
    })
}
