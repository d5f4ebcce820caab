//! Model 1 — OLS linear trend (spec.md §4.8): `p_si(t) ~ β₀ + β₁·t`, its
//! significance tests, residual diagnostics, a logit-scale slope, and a
//! one-period-ahead forecast with a 95% prediction band.

use ndarray::{Array1, Array2};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, Normal, StudentsT};

use crate::error::{EngineError, EngineResult};

use super::diagnostics::{self, ResidualDiagnostics};
use super::linalg;
use super::stats;

const LOGIT_EPS: f64 = 1e-6;

#[derive(Debug, Clone, Copy)]
pub struct LogitSlope {
    pub percent_change_per_period: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Forecast {
    pub period_index: usize,
    pub point: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

#[derive(Debug, Clone)]
pub struct LinearFit {
    pub intercept: f64,
    pub slope: f64,
    pub r_squared: f64,
    pub r_ci_lower: f64,
    pub r_ci_upper: f64,
    pub slope_p_value: f64,
    pub f_statistic: f64,
    pub f_p_value: f64,
    pub mae: f64,
    pub rmse: f64,
    pub smape: f64,
    pub aic: f64,
    pub bic: f64,
    pub diagnostics: ResidualDiagnostics,
    pub logit_slope: LogitSlope,
    pub forecast: Forecast,
    pub fitted: Vec<f64>,
}

/// Fits the model over `y_percent`, one value per period, implicitly
/// indexed `t = 0, 1, ..., n-1`. Callers already enforce the ≥3-period
/// guard rail (spec.md §4.8 "Guard rails").
pub fn fit(y_percent: &[f64]) -> EngineResult<LinearFit> {
    let n = y_percent.len();
    if n < 3 {
        return Err(EngineError::Insufficient(format!("linear trend needs at least 3 periods, got {n}")));
    }
    let t: Vec<f64> = (0..n).map(|i| i as f64).collect();

    let (intercept, slope) = simple_ols(&t, y_percent);
    let fitted: Vec<f64> = t.iter().map(|&ti| intercept + slope * ti).collect();
    let residuals: Vec<f64> = y_percent.iter().zip(&fitted).map(|(y, f)| y - f).collect();

    let y_mean = stats::mean(y_percent);
    let sse: f64 = residuals.iter().map(|e| e * e).sum();
    let sst: f64 = y_percent.iter().map(|y| (y - y_mean).powi(2)).sum();
    let r_squared = if sst == 0.0 { 0.0 } else { 1.0 - sse / sst };
    let (r_ci_lower, r_ci_upper) = fisher_r_ci(slope.signum() * r_squared.max(0.0).sqrt(), n);

    let df_resid = (n - 2) as f64;
    let mse = sse / df_resid;
    let t_xx: f64 = t.iter().map(|ti| (ti - stats::mean(&t)).powi(2)).sum();
    let se_slope = (mse / t_xx).sqrt();
    let t_stat = slope / se_slope;
    let t_dist = StudentsT::new(0.0, 1.0, df_resid).map_err(|e| EngineError::Domain(e.to_string()))?;
    let slope_p_value = 2.0 * (1.0 - t_dist.cdf(t_stat.abs()));

    let f_statistic = if r_squared >= 1.0 { f64::INFINITY } else { (r_squared / (1.0 - r_squared)) * df_resid };
    let f_dist = FisherSnedecor::new(1.0, df_resid).map_err(|e| EngineError::Domain(e.to_string()))?;
    let f_p_value = 1.0 - f_dist.cdf(f_statistic);

    let mae = stats::mae(y_percent, &fitted);
    let rmse = stats::rmse(y_percent, &fitted);
    let smape = stats::smape(y_percent, &fitted);

    let k = 3.0; // intercept, slope, residual variance
    let n_f = n as f64;
    let aic = n_f * (sse / n_f).ln() + 2.0 * k;
    let bic = n_f * (sse / n_f).ln() + k * n_f.ln();

    let diagnostics = diagnostics::compute(&t, &residuals);

    let logit_y: Vec<f64> = y_percent.iter().map(|&y| stats::logit_percent(y, LOGIT_EPS)).collect();
    let (logit_intercept, logit_slope_raw) = simple_ols(&t, &logit_y);
    let logit_fitted: Vec<f64> = t.iter().map(|&ti| logit_intercept + logit_slope_raw * ti).collect();
    let logit_sse: f64 = logit_y.iter().zip(&logit_fitted).map(|(y, f)| (y - f).powi(2)).sum();
    let logit_mse = logit_sse / df_resid;
    let se_logit_slope = (logit_mse / t_xx).sqrt();
    let normal = Normal::new(0.0, 1.0).map_err(|e| EngineError::Domain(e.to_string()))?;
    let z = normal.inverse_cdf(0.975);
    let logit_slope = LogitSlope {
        percent_change_per_period: (logit_slope_raw.exp() - 1.0) * 100.0,
        ci_lower: ((logit_slope_raw - z * se_logit_slope).exp() - 1.0) * 100.0,
        ci_upper: ((logit_slope_raw + z * se_logit_slope).exp() - 1.0) * 100.0,
    };

    let forecast = forecast_next(&t, intercept, slope, mse, t_xx, df_resid)?;

    Ok(LinearFit {
        intercept,
        slope,
        r_squared,
        r_ci_lower,
        r_ci_upper,
        slope_p_value,
        f_statistic,
        f_p_value,
        mae,
        rmse,
        smape,
        aic,
        bic,
        diagnostics,
        logit_slope,
        forecast,
        fitted,
    })
}

fn forecast_next(t: &[f64], intercept: f64, slope: f64, mse: f64, t_xx: f64, df_resid: f64) -> EngineResult<Forecast> {
    let n = t.len();
    let t_next = n as f64;
    let t_mean = stats::mean(t);
    let point = intercept + slope * t_next;
    let se_pred = (mse * (1.0 + 1.0 / n as f64 + (t_next - t_mean).powi(2) / t_xx)).sqrt();
    let t_dist = StudentsT::new(0.0, 1.0, df_resid).map_err(|e| EngineError::Domain(e.to_string()))?;
    let t_crit = t_dist.inverse_cdf(0.975);
    Ok(Forecast { period_index: n, point, ci_lower: point - t_crit * se_pred, ci_upper: point + t_crit * se_pred })
}

fn fisher_r_ci(r: f64, n: usize) -> (f64, f64) {
    if n <= 3 {
        return (r, r);
    }
    let r = r.clamp(-0.999999, 0.999999);
    let z = r.atanh();
    let se = 1.0 / ((n - 3) as f64).sqrt();
    let normal = match Normal::new(0.0, 1.0) {
        Ok(d) => d,
        Err(_) => return (r, r),
    };
    let crit = normal.inverse_cdf(0.975);
    ((z - crit * se).tanh(), (z + crit * se).tanh())
}

fn simple_ols(x: &[f64], y: &[f64]) -> (f64, f64) {
    let x_mean = stats::mean(x);
    let y_mean = stats::mean(y);
    let sxy: f64 = x.iter().zip(y).map(|(xi, yi)| (xi - x_mean) * (yi - y_mean)).sum();
    let sxx: f64 = x.iter().map(|xi| (xi - x_mean).powi(2)).sum();
    let slope = if sxx == 0.0 { 0.0 } else { sxy / sxx };
    (y_mean - slope * x_mean, slope)
}

/// Fits the linear model on `train_y_percent` (indexed `0..train_len`) and
/// predicts the percent value at each absolute period index in
/// `future_indices`. Used by the rolling-origin CV loop, which needs
/// multi-step-ahead predictions rather than the single next-period
/// forecast `fit` produces.
pub(super) fn predict_at(train_y_percent: &[f64], future_indices: &[usize]) -> Vec<f64> {
    let t: Vec<f64> = (0..train_y_percent.len()).map(|i| i as f64).collect();
    let (intercept, slope) = simple_ols(&t, train_y_percent);
    future_indices.iter().map(|&idx| intercept + slope * idx as f64).collect()
}

/// Auxiliary-regression R², used by the Breusch-Pagan/White diagnostics:
/// fits `y` on the given regressor columns plus an intercept and returns
/// the fraction of variance explained.
pub(super) fn auxiliary_r_squared(y: &[f64], regressors: &[Vec<f64>]) -> f64 {
    let n = y.len();
    let k = regressors.len();
    let mut design = Array2::<f64>::zeros((n, k + 1));
    for row in 0..n {
        design[[row, 0]] = 1.0;
        for (col, reg) in regressors.iter().enumerate() {
            design[[row, col + 1]] = reg[row];
        }
    }
    let y_arr = Array1::from(y.to_vec());
    let beta = linalg::ols_fit(&design, &y_arr);
    let fitted = design.dot(&beta);
    let y_mean = stats::mean(y);
    let sse: f64 = y_arr.iter().zip(fitted.iter()).map(|(a, f)| (a - f).powi(2)).sum();
    let sst: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    if sst == 0.0 { 0.0 } else { 1.0 - sse / sst }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_recovers_an_exact_linear_series() {
        let y = [10.0, 20.0, 30.0, 40.0, 50.0];
        let result = fit(&y).unwrap();
        assert!((result.slope - 10.0).abs() < 1e-6);
        assert!((result.intercept - 10.0).abs() < 1e-6);
        assert!((result.r_squared - 1.0).abs() < 1e-6);
        assert!((result.forecast.point - 60.0).abs() < 1e-6);
    }

    #[test]
    fn fit_rejects_fewer_than_three_periods() {
        assert!(fit(&[10.0, 20.0]).is_err());
    }

    #[test]
    fn declining_resistance_trend_produces_a_negative_slope() {
        let y = [40.0, 35.0, 33.0, 28.0, 25.0, 20.0];
        let result = fit(&y).unwrap();
        assert!(result.slope < 0.0);
        assert!(result.logit_slope.percent_change_per_period < 0.0);
    }
}
