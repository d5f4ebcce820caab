//! Model 2 — logit-link GAM (spec.md §4.8): a truncated-power spline basis
//! ridge-fit on `logit(clip(y/100, ε, 1-ε))`, with an n-adaptive basis size
//! and smoothing order, back-transformed through `expit`.

use ndarray::{Array1, Array2};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, Normal};

use crate::error::{EngineError, EngineResult};

use super::diagnostics::{self, ResidualDiagnostics};
use super::linalg;
use super::stats;

const LOGIT_EPS: f64 = 1e-6;

/// `(n_splines, spline_order)` for `n` observations, guaranteeing
/// `n_splines > spline_order` (spec.md §4.8 "ensure splines > order").
pub fn adaptive_config(n: usize) -> (usize, usize) {
    let (mut n_splines, order) = if n <= 6 {
        (3usize.max(n.saturating_sub(1).min(5)), 2)
    } else if n <= 10 {
        (n.min(6), 2)
    } else {
        (n.min(10), 3)
    };
    if n_splines <= order {
        n_splines = order + 1;
    }
    (n_splines, order)
}

#[derive(Debug, Clone)]
pub struct GamForecast {
    pub period_index: usize,
    pub point: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

#[derive(Debug, Clone)]
pub struct GamFit {
    pub n_splines: usize,
    pub spline_order: usize,
    pub lambda: f64,
    pub edof: f64,
    pub pseudo_r_squared: f64,
    pub aic: f64,
    pub gcv: f64,
    pub smooth_term_p_value: f64,
    pub diagnostics: ResidualDiagnostics,
    pub forecast: GamForecast,
    /// Fitted values back-transformed to percent, clipped to [0, 100].
    pub fitted: Vec<f64>,
}

pub fn fit(y_percent: &[f64], lambda: f64) -> EngineResult<GamFit> {
    let n = y_percent.len();
    if n < 3 {
        return Err(EngineError::Insufficient(format!("GAM trend needs at least 3 periods, got {n}")));
    }
    let t: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let (n_splines, order) = adaptive_config(n);
    let unpenalized = order + 1;

    let y_logit: Vec<f64> = y_percent.iter().map(|&y| stats::logit_percent(y, LOGIT_EPS)).collect();
    let design = design_matrix(&t, n_splines, order);
    let y_arr = Array1::from(y_logit.clone());
    let beta = linalg::ridge_fit(&design, &y_arr, lambda, unpenalized);
    let fitted_logit = design.dot(&beta);
    let fitted: Vec<f64> = fitted_logit.iter().map(|&v| (stats::expit(v) * 100.0).clamp(0.0, 100.0)).collect();
    let residuals: Vec<f64> = y_logit.iter().zip(fitted_logit.iter()).map(|(y, f)| y - f).collect();

    let inverse = linalg::ridge_penalized_inverse(&design, lambda, unpenalized);
    let xtx = design.t().dot(&design);
    let edof = (inverse.dot(&xtx)).diag().iter().sum::<f64>().clamp(1.0, n as f64 - 1.0);

    let sse: f64 = residuals.iter().map(|e| e * e).sum();
    let y_mean = stats::mean(&y_logit);
    let sse_null: f64 = y_logit.iter().map(|y| (y - y_mean).powi(2)).sum();
    let pseudo_r_squared = if sse_null == 0.0 { 0.0 } else { (1.0 - sse / sse_null).max(0.0) };

    let n_f = n as f64;
    let aic = n_f * (sse / n_f).max(1e-12).ln() + 2.0 * edof;
    let gcv = (n_f * sse) / (n_f - edof).max(1.0).powi(2);

    let df1 = (edof - 1.0).max(1.0);
    let df2 = (n_f - edof).max(1.0);
    let smooth_term_p_value = if sse <= 0.0 || sse_null <= sse {
        0.0
    } else {
        let f_stat = ((sse_null - sse) / df1) / (sse / df2);
        match FisherSnedecor::new(df1, df2) {
            Ok(dist) => (1.0 - dist.cdf(f_stat)).clamp(0.0, 1.0),
            Err(_) => 1.0,
        }
    };

    let diagnostics = diagnostics::compute(&t, &residuals);
    let mse = sse / df2;
    let forecast = forecast_next(&t, n_splines, order, &beta, &inverse, mse)?;

    Ok(GamFit { n_splines, spline_order: order, lambda, edof, pseudo_r_squared, aic, gcv, smooth_term_p_value, diagnostics, forecast, fitted })
}

/// Fits on `train_y_percent` (indexed `0..train_len`) at `lambda` and
/// predicts the percent value at each absolute period index in
/// `future_indices`. Mirrors `linear::predict_at` for the rolling-origin CV
/// loop's multi-step-ahead folds.
pub(super) fn predict_at(train_y_percent: &[f64], lambda: f64, future_indices: &[usize]) -> Vec<f64> {
    let train_t: Vec<f64> = (0..train_y_percent.len()).map(|i| i as f64).collect();
    let (n_splines, order) = adaptive_config(train_y_percent.len());
    let unpenalized = order + 1;
    let y_logit: Vec<f64> = train_y_percent.iter().map(|&y| stats::logit_percent(y, LOGIT_EPS)).collect();
    let design = design_matrix(&train_t, n_splines, order);
    let beta = linalg::ridge_fit(&design, &Array1::from(y_logit), lambda, unpenalized);
    future_indices
        .iter()
        .map(|&idx| {
            let row = design_row(&train_t, idx as f64, n_splines, order);
            (stats::expit(row.dot(&beta)) * 100.0).clamp(0.0, 100.0)
        })
        .collect()
}

fn forecast_next(t: &[f64], n_splines: usize, order: usize, beta: &Array1<f64>, inverse: &Array2<f64>, mse: f64) -> EngineResult<GamForecast> {
    let n = t.len();
    let t_next = n as f64;
    let row = design_row(t, t_next, n_splines, order);
    let point_logit = row.dot(beta);
    let variance = mse * (1.0 + row.dot(&inverse.dot(&row)));
    let se = variance.max(0.0).sqrt();
    let normal = Normal::new(0.0, 1.0).map_err(|e| EngineError::Domain(e.to_string()))?;
    let z = normal.inverse_cdf(0.975);
    let clamp_pct = |v: f64| (stats::expit(v) * 100.0).clamp(0.0, 100.0);
    Ok(GamForecast { period_index: n, point: clamp_pct(point_logit), ci_lower: clamp_pct(point_logit - z * se), ci_upper: clamp_pct(point_logit + z * se) })
}

/// Truncated-power spline basis: an intercept, polynomial terms up to
/// `order`, and `n_splines - order - 1` truncated-power knots evenly spaced
/// over the observed range of `t`.
fn design_matrix(t: &[f64], n_splines: usize, order: usize) -> Array2<f64> {
    let n = t.len();
    let poly_cols = order + 1;
    let knots = interior_knots(t, n_splines.saturating_sub(poly_cols));
    let mut design = Array2::zeros((n, poly_cols + knots.len()));
    for (row, &ti) in t.iter().enumerate() {
        let basis = design_row(t, ti, n_splines, order);
        design.row_mut(row).assign(&basis);
    }
    design
}

fn design_row(t: &[f64], value: f64, n_splines: usize, order: usize) -> Array1<f64> {
    let poly_cols = order + 1;
    let knots = interior_knots(t, n_splines.saturating_sub(poly_cols));
    let mut row = Array1::zeros(poly_cols + knots.len());
    for p in 0..poly_cols {
        row[p] = value.powi(p as i32);
    }
    for (idx, knot) in knots.iter().enumerate() {
        let d = value - knot;
        row[poly_cols + idx] = if d > 0.0 { d.powi(order as i32) } else { 0.0 };
    }
    row
}

fn interior_knots(t: &[f64], count: usize) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    let t_min = t.iter().cloned().fold(f64::INFINITY, f64::min);
    let t_max = t.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    (1..=count).map(|k| t_min + (t_max - t_min) * (k as f64) / (count as f64 + 1.0)).collect()
}
