//! Confidence intervals for a proportion p = x/n (spec.md §4.7): Clopper-
//! Pearson exact for n ≤ 30, Agresti-Coull otherwise. Never raises — n = 0 is
//! a degenerate case returned as a zero-width interval at 0% (spec.md §7
//! "Numeric degenerate cases").

use statrs::distribution::{Beta, ContinuousCDF, Normal};

/// A lower/upper bound pair, expressed as a fraction in [0, 1]. Callers
/// format as a percentage with two decimals (spec.md §4.7).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

const CLOPPER_PEARSON_MAX_N: usize = 30;

/// 95% confidence interval for x successes out of n trials.
pub fn proportion_ci(x: usize, n: usize) -> ConfidenceInterval {
    if n == 0 {
        return ConfidenceInterval { lower: 0.0, upper: 0.0 };
    }
    if n <= CLOPPER_PEARSON_MAX_N {
        clopper_pearson(x, n, 0.05)
    } else {
        agresti_coull(x, n, 0.05)
    }
}

fn clopper_pearson(x: usize, n: usize, alpha: f64) -> ConfidenceInterval {
    let (x, n) = (x as f64, n as f64);
    let lower = if x == 0.0 {
        0.0
    } else {
        Beta::new(x, n - x + 1.0).expect("x in [1, n] keeps both Beta shape parameters positive").inverse_cdf(alpha / 2.0)
    };
    let upper = if x == n {
        1.0
    } else {
        Beta::new(x + 1.0, n - x).expect("x in [0, n) keeps both Beta shape parameters positive").inverse_cdf(1.0 - alpha / 2.0)
    };
    ConfidenceInterval { lower, upper }
}

fn agresti_coull(x: usize, n: usize, alpha: f64) -> ConfidenceInterval {
    let (x, n) = (x as f64, n as f64);
    let z = Normal::new(0.0, 1.0).expect("standard normal").inverse_cdf(1.0 - alpha / 2.0);
    let n_tilde = n + z * z;
    let p_tilde = (x + z * z / 2.0) / n_tilde;
    let margin = z * (p_tilde * (1.0 - p_tilde) / n_tilde).sqrt();
    ConfidenceInterval { lower: (p_tilde - margin).max(0.0), upper: (p_tilde + margin).min(1.0) }
}
