//! Rolling-origin (expanding-window, forward-chaining) cross-validation
//! (spec.md §4.8): an n-adaptive window, a λ grid-search for the GAM, then a
//! final evaluation of both models at λ*.

use crate::error::{EngineError, EngineResult};

use super::gam;
use super::linear;
use super::stats;

#[derive(Debug, Clone, Copy)]
pub struct WindowConfig {
    pub test_size: usize,
    pub min_train: usize,
}

/// Adaptive fold sizing by series length (spec.md §4.8 "Rolling-origin").
pub fn window_config(n: usize) -> WindowConfig {
    if n <= 10 {
        WindowConfig { test_size: 1, min_train: 3 }
    } else if n <= 20 {
        WindowConfig { test_size: 2, min_train: 5 }
    } else {
        WindowConfig { test_size: 3, min_train: 7 }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FoldSummary {
    pub mae_mean: f64,
    pub mae_std: f64,
    pub rmse_mean: f64,
    pub rmse_std: f64,
    pub smape_mean: f64,
    pub smape_std: f64,
}

#[derive(Debug, Clone)]
pub struct CvResult {
    pub selected_lambda: f64,
    pub fold_count: usize,
    pub linear: FoldSummary,
    pub gam: FoldSummary,
}

struct Fold {
    train_end: usize,
    test_indices: Vec<usize>,
}

fn folds(n: usize, config: WindowConfig) -> Vec<Fold> {
    let mut result = Vec::new();
    let mut train_end = config.min_train;
    while train_end + config.test_size <= n {
        result.push(Fold { train_end, test_indices: (train_end..train_end + config.test_size).collect() });
        train_end += config.test_size;
    }
    result
}

fn lambda_grid() -> Vec<f64> {
    let (start, end, steps) = (-3.0_f64, 3.0_f64, 20usize);
    let step = (end - start) / (steps as f64 - 1.0);
    (0..steps).map(|i| 10f64.powf(start + step * i as f64)).collect()
}

/// Runs both CV phases over `y_percent`. Returns `EngineError::Insufficient`
/// when the series is too short for even one fold under its adaptive
/// window (spec.md §4.8 "require n ≥ min-train + test; else error").
pub fn run(y_percent: &[f64]) -> EngineResult<CvResult> {
    let n = y_percent.len();
    let config = window_config(n);
    if n < config.min_train + config.test_size {
        return Err(EngineError::Insufficient(format!(
            "rolling-origin CV needs at least {} periods (min-train {} + test {}), got {n}",
            config.min_train + config.test_size,
            config.min_train,
            config.test_size
        )));
    }
    let fold_plan = folds(n, config);
    if fold_plan.is_empty() {
        return Err(EngineError::Insufficient("rolling-origin CV produced no folds".into()));
    }

    let grid = lambda_grid();
    let mut best_lambda = grid[0];
    let mut best_mae = f64::INFINITY;
    for &lambda in &grid {
        let mut fold_maes = Vec::new();
        for fold in &fold_plan {
            let train = &y_percent[..fold.train_end];
            let actual: Vec<f64> = fold.test_indices.iter().map(|&i| y_percent[i]).collect();
            let predicted = gam::predict_at(train, lambda, &fold.test_indices);
            fold_maes.push(stats::mae(&actual, &predicted));
        }
        let mean_mae = stats::mean(&fold_maes);
        if mean_mae < best_mae {
            best_mae = mean_mae;
            best_lambda = lambda;
        }
    }

    let mut linear_maes = Vec::new();
    let mut linear_rmses = Vec::new();
    let mut linear_smapes = Vec::new();
    let mut gam_maes = Vec::new();
    let mut gam_rmses = Vec::new();
    let mut gam_smapes = Vec::new();

    for fold in &fold_plan {
        let train = &y_percent[..fold.train_end];
        let actual: Vec<f64> = fold.test_indices.iter().map(|&i| y_percent[i]).collect();

        let linear_pred = linear::predict_at(train, &fold.test_indices);
        linear_maes.push(stats::mae(&actual, &linear_pred));
        linear_rmses.push(stats::rmse(&actual, &linear_pred));
        linear_smapes.push(stats::smape(&actual, &linear_pred));

        let gam_pred = gam::predict_at(train, best_lambda, &fold.test_indices);
        gam_maes.push(stats::mae(&actual, &gam_pred));
        gam_rmses.push(stats::rmse(&actual, &gam_pred));
        gam_smapes.push(stats::smape(&actual, &gam_pred));
    }

    Ok(CvResult {
        selected_lambda: best_lambda,
        fold_count: fold_plan.len(),
        linear: summarize(&linear_maes, &linear_rmses, &linear_smapes),
        gam: summarize(&gam_maes, &gam_rmses, &gam_smapes),
    })
}

fn summarize(maes: &[f64], rmses: &[f64], smapes: &[f64]) -> FoldSummary {
    FoldSummary {
        mae_mean: stats::mean(maes),
        mae_std: stats::variance(maes).sqrt(),
        rmse_mean: stats::mean(rmses),
        rmse_std: stats::variance(rmses).sqrt(),
        smape_mean: stats::mean(smapes),
        smape_std: stats::variance(smapes).sqrt(),
    }
}
