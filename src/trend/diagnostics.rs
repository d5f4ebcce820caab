//! Residual diagnostics shared by the linear and GAM models (spec.md §4.8):
//! Jarque-Bera, Shapiro-Wilk (n ≤ 50), Breusch-Pagan, White, Durbin-Watson,
//! Ljung-Box at `lag = min(10, n/5)`, plus the ACF itself.

use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

use super::linear::auxiliary_r_squared;
use super::stats;

const SHAPIRO_WILK_MAX_N: usize = 50;

#[derive(Debug, Clone)]
pub struct ResidualDiagnostics {
    pub jarque_bera_p: f64,
    pub shapiro_wilk_p: Option<f64>,
    pub breusch_pagan_p: f64,
    pub white_p: f64,
    pub durbin_watson: f64,
    pub ljung_box_p: f64,
    pub acf: Vec<f64>,
}

/// `regressor` is the model's fitted predictor (the period index `t` for
/// linear, the spline design's first column for GAM) used by the
/// heteroskedasticity auxiliary regressions.
pub fn compute(regressor: &[f64], residuals: &[f64]) -> ResidualDiagnostics {
    let n = residuals.len();
    ResidualDiagnostics {
        jarque_bera_p: jarque_bera_p(residuals),
        shapiro_wilk_p: if n <= SHAPIRO_WILK_MAX_N { Some(shapiro_wilk_p(residuals)) } else { None },
        breusch_pagan_p: breusch_pagan_p(regressor, residuals),
        white_p: white_p(regressor, residuals),
        durbin_watson: durbin_watson(residuals),
        ljung_box_p: ljung_box_p(residuals, ljung_box_lag(n)),
        acf: (1..=ljung_box_lag(n)).map(|lag| stats::autocorrelation(residuals, lag)).collect(),
    }
}

fn ljung_box_lag(n: usize) -> usize {
    (10.min(n / 5)).max(1)
}

fn jarque_bera_p(residuals: &[f64]) -> f64 {
    let n = residuals.len() as f64;
    let s = stats::skewness(residuals);
    let k = stats::kurtosis(residuals);
    let jb = (n / 6.0) * (s.powi(2) + (k - 3.0).powi(2) / 4.0);
    chi_squared_sf(jb, 2.0)
}

/// Royston's (1995) normal approximation of the Shapiro-Wilk p-value.
/// Uses Blom-approximated normal order-statistic scores rather than the
/// exact Royston a-coefficients, since no corpus crate supplies either —
/// accurate enough to flag gross non-normality, not a certified p-value.
fn shapiro_wilk_p(residuals: &[f64]) -> f64 {
    let n = residuals.len();
    if n < 3 {
        return 1.0;
    }
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let normal = Normal::new(0.0, 1.0).unwrap();
    let m: Vec<f64> = (1..=n).map(|i| normal.inverse_cdf((i as f64 - 0.375) / (n as f64 + 0.25))).collect();
    let m_ss: f64 = m.iter().map(|v| v * v).sum();
    let denom = m_ss.sqrt();
    let weights: Vec<f64> = m.iter().map(|v| v / denom).collect();

    let mean = stats::mean(&sorted);
    let numerator: f64 = weights.iter().zip(&sorted).map(|(w, x)| w * x).sum::<f64>().powi(2);
    let denominator: f64 = sorted.iter().map(|x| (x - mean).powi(2)).sum();
    if denominator == 0.0 {
        return 1.0;
    }
    let w = (numerator / denominator).clamp(0.0, 1.0);

    let n_f = n as f64;
    let ln_n = n_f.ln();
    let y = (1.0 - w).max(1e-12).ln();
    let (mu, sigma) = if n >= 12 {
        (-1.5861 - 0.31082 * ln_n - 0.083751 * ln_n.powi(2) + 0.0038915 * ln_n.powi(3), (-0.4803 - 0.082676 * ln_n + 0.0030302 * ln_n.powi(2)).exp())
    } else {
        (-2.273 + 0.459 * n_f, 1.0 + (-0.2302 * n_f).exp())
    };
    let z = (y - mu) / sigma;
    chi_squared_sf(z.max(0.0).powi(2), 1.0).min(1.0)
}

fn breusch_pagan_p(regressor: &[f64], residuals: &[f64]) -> f64 {
    let squared: Vec<f64> = residuals.iter().map(|e| e * e).collect();
    let r2 = auxiliary_r_squared(&squared, &[regressor.to_vec()]);
    let lm = residuals.len() as f64 * r2;
    chi_squared_sf(lm, 1.0)
}

fn white_p(regressor: &[f64], residuals: &[f64]) -> f64 {
    let squared: Vec<f64> = residuals.iter().map(|e| e * e).collect();
    let regressor_sq: Vec<f64> = regressor.iter().map(|x| x * x).collect();
    let r2 = auxiliary_r_squared(&squared, &[regressor.to_vec(), regressor_sq]);
    let lm = residuals.len() as f64 * r2;
    chi_squared_sf(lm, 2.0)
}

fn durbin_watson(residuals: &[f64]) -> f64 {
    let numerator: f64 = residuals.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
    let denominator: f64 = residuals.iter().map(|e| e * e).sum();
    if denominator == 0.0 { 2.0 } else { numerator / denominator }
}

fn ljung_box_p(residuals: &[f64], lag: usize) -> f64 {
    let n = residuals.len() as f64;
    let q: f64 = (1..=lag)
        .map(|k| {
            let rho = stats::autocorrelation(residuals, k);
            rho * rho / (n - k as f64)
        })
        .sum::<f64>()
        * n
        * (n + 2.0);
    chi_squared_sf(q, lag as f64)
}

fn chi_squared_sf(x: f64, df: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    match ChiSquared::new(df) {
        Ok(dist) => (1.0 - dist.cdf(x)).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durbin_watson_of_alternating_residuals_is_near_four() {
        let residuals = [1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
        assert!(durbin_watson(&residuals) > 3.0);
    }

    #[test]
    fn jarque_bera_p_is_high_for_symmetric_residuals() {
        let residuals = [-2.0, -1.0, 0.0, 1.0, 2.0];
        assert!(jarque_bera_p(&residuals) > 0.1);
    }

    #[test]
    fn compute_reports_shapiro_wilk_only_at_or_under_fifty_observations() {
        let residuals: Vec<f64> = (0..51).map(|i| i as f64 * 0.1).collect();
        let regressor: Vec<f64> = (0..51).map(|i| i as f64).collect();
        let diagnostics = compute(&regressor, &residuals);
        assert!(diagnostics.shapiro_wilk_p.is_none());
    }
}
