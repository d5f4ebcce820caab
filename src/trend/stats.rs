//! Small numeric helpers shared by `linear` and `gam`: moments,
//! autocorrelation, and SMAPE with the zero-guard spec.md §9 calls out.

pub fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

pub fn variance(xs: &[f64]) -> f64 {
    let m = mean(xs);
    xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64
}

pub fn skewness(xs: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let m = mean(xs);
    let sd = variance(xs).sqrt();
    if sd == 0.0 {
        return 0.0;
    }
    xs.iter().map(|x| ((x - m) / sd).powi(3)).sum::<f64>() / n
}

pub fn kurtosis(xs: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let m = mean(xs);
    let sd = variance(xs).sqrt();
    if sd == 0.0 {
        return 3.0;
    }
    xs.iter().map(|x| ((x - m) / sd).powi(4)).sum::<f64>() / n
}

/// Autocorrelation of `xs` at `lag`, normalized by the series variance
/// (population, not sample-corrected — matches the Ljung-Box convention).
pub fn autocorrelation(xs: &[f64], lag: usize) -> f64 {
    let n = xs.len();
    if lag >= n {
        return 0.0;
    }
    let m = mean(xs);
    let denom: f64 = xs.iter().map(|x| (x - m).powi(2)).sum();
    if denom == 0.0 {
        return 0.0;
    }
    let numer: f64 = (0..n - lag).map(|i| (xs[i] - m) * (xs[i + lag] - m)).sum();
    numer / denom
}

/// Symmetric mean absolute percentage error, as a percent. 0/0 maps to 0
/// (spec.md §9 "SMAPE denominator guards zero").
pub fn smape(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len() as f64;
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| {
            let denom = a.abs() + p.abs();
            if denom == 0.0 { 0.0 } else { 2.0 * (a - p).abs() / denom }
        })
        .sum();
    (sum / n) * 100.0
}

pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    actual.iter().zip(predicted).map(|(a, p)| (a - p).abs()).sum::<f64>() / actual.len() as f64
}

pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    (actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)).sum::<f64>() / actual.len() as f64).sqrt()
}

/// `clip(y/100, eps, 1-eps)` then the logit transform, the input
/// preprocessing both trend models share (spec.md §4.8).
pub fn logit_percent(y_percent: f64, eps: f64) -> f64 {
    let p = (y_percent / 100.0).clamp(eps, 1.0 - eps);
    (p / (1.0 - p)).ln()
}

pub fn expit(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smape_maps_zero_over_zero_to_zero() {
        assert_eq!(smape(&[0.0], &[0.0]), 0.0);
    }

    #[test]
    fn expit_and_logit_are_inverses_at_fifty_percent() {
        let logit = logit_percent(50.0, 1e-6);
        assert!((logit - 0.0).abs() < 1e-9);
        assert!((expit(logit) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn autocorrelation_at_lag_zero_is_one_for_nonconstant_series() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((autocorrelation(&xs, 0) - 1.0).abs() < 1e-9);
    }
}
