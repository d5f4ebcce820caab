//! Period-over-period comparison (spec.md §4.7): 2x2 table, Fisher's exact
//! when any expected cell frequency < 5, χ² of independence otherwise.

use statrs::distribution::{ChiSquared, ContinuousCDF, Discrete, Hypergeometric};

/// Arrow direction spec.md §4.7 reports alongside the p-value, empty
/// ("none") when the move is not significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrow {
    Up,
    Down,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodComparison {
    pub p_value: f64,
    pub arrow: Arrow,
}

/// `original_source` additionally floors both periods at n ≥ 10 before
/// running any test at all (see DESIGN.md); below that, no comparison is
/// meaningful and `compare_periods` returns `None` rather than a forced
/// arrow.
const MIN_PERIOD_N: usize = 10;

/// Compares (x_current/n_current) against (x_prior/n_prior). Returns `None`
/// when either period has fewer than 10 observations.
pub fn compare_periods(x_current: usize, n_current: usize, x_prior: usize, n_prior: usize) -> Option<PeriodComparison> {
    if n_current < MIN_PERIOD_N || n_prior < MIN_PERIOD_N {
        return None;
    }
    let table = [[x_current as u64, (n_current - x_current) as u64], [x_prior as u64, (n_prior - x_prior) as u64]];
    let p_value = if expected_frequencies(table).iter().flatten().any(|&e| e < 5.0) { fisher_exact_p(table) } else { chi_squared_p(table) };

    let p_cur = x_current as f64 / n_current as f64;
    let p_pri = x_prior as f64 / n_prior as f64;
    let arrow = if p_value < 0.05 {
        if p_cur > p_pri {
            Arrow::Up
        } else if p_cur < p_pri {
            Arrow::Down
        } else {
            Arrow::None
        }
    } else {
        Arrow::None
    };

    Some(PeriodComparison { p_value, arrow })
}

fn expected_frequencies(table: [[u64; 2]; 2]) -> [[f64; 2]; 2] {
    let n = (table[0][0] + table[0][1] + table[1][0] + table[1][1]) as f64;
    let r1 = (table[0][0] + table[0][1]) as f64;
    let r2 = (table[1][0] + table[1][1]) as f64;
    let c1 = (table[0][0] + table[1][0]) as f64;
    let c2 = (table[0][1] + table[1][1]) as f64;
    [[r1 * c1 / n, r1 * c2 / n], [r2 * c1 / n, r2 * c2 / n]]
}

/// Two-sided Fisher's exact test via direct enumeration of the hypergeometric
/// distribution over the table's fixed margins.
fn fisher_exact_p(table: [[u64; 2]; 2]) -> f64 {
    let a = table[0][0];
    let r1 = table[0][0] + table[0][1];
    let r2 = table[1][0] + table[1][1];
    let c1 = table[0][0] + table[1][0];
    let n = r1 + r2;

    let dist = Hypergeometric::new(n, c1, r1).expect("non-negative margins derived from non-negative counts");
    let observed = dist.pmf(a);
    let k_min = c1.saturating_sub(r2);
    let k_max = r1.min(c1);
    (k_min..=k_max).map(|k| dist.pmf(k)).filter(|&p| p <= observed * (1.0 + 1e-7)).sum()
}

fn chi_squared_p(table: [[u64; 2]; 2]) -> f64 {
    let expected = expected_frequencies(table);
    let stat = (0..2)
        .flat_map(|i| (0..2).map(move |j| (i, j)))
        .map(|(i, j)| {
            let observed = table[i][j] as f64;
            let e = expected[i][j];
            (observed - e).powi(2) / e
        })
        .sum();
    let dist = ChiSquared::new(1.0).expect("df=1 for a 2x2 table");
    1.0 - dist.cdf(stat)
}
