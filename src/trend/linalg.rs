//! Tiny linear-algebra kernel shared by the OLS diagnostics and the GAM
//! ridge fit: Gauss-Jordan elimination with partial pivoting over
//! `ndarray`. No BLAS backend is wired in, so this stays self-contained
//! rather than reaching for `ndarray-linalg`.

use ndarray::{Array1, Array2};

/// Solves the ridge normal equations `(XᵀX + λD)β = Xᵀy` for `β`, where `D`
/// is the identity except its first `unpenalized` diagonal entries (the
/// intercept and any other terms `ridge` should leave unshrunk) are zeroed.
pub fn ridge_fit(design: &Array2<f64>, y: &Array1<f64>, ridge: f64, unpenalized: usize) -> Array1<f64> {
    let xt = design.t();
    let mut xtx = xt.dot(design);
    let xty = xt.dot(y);
    for (i, row) in xtx.outer_iter_mut().enumerate() {
        let mut row = row;
        if i >= unpenalized {
            row[i] += ridge;
        }
    }
    solve(xtx, xty)
}

pub fn ols_fit(design: &Array2<f64>, y: &Array1<f64>) -> Array1<f64> {
    ridge_fit(design, y, 0.0, design.ncols())
}

/// Inverse of `(XᵀX + λD)`, the matrix the GAM's effective-degrees-of-
/// freedom and prediction-interval computations both need explicitly
/// (rather than just a single right-hand-side solve).
pub fn ridge_penalized_inverse(design: &Array2<f64>, ridge: f64, unpenalized: usize) -> Array2<f64> {
    let xtx = design.t().dot(design);
    let mut penalized = xtx;
    for i in unpenalized..penalized.nrows() {
        penalized[[i, i]] += ridge;
    }
    invert(penalized)
}

fn invert(a: Array2<f64>) -> Array2<f64> {
    let n = a.nrows();
    let mut augmented = Array2::<f64>::zeros((n, 2 * n));
    augmented.slice_mut(ndarray::s![.., ..n]).assign(&a);
    for i in 0..n {
        augmented[[i, n + i]] = 1.0;
    }
    for col in 0..n {
        let pivot_row = (col..n).max_by(|&r1, &r2| augmented[[r1, col]].abs().partial_cmp(&augmented[[r2, col]].abs()).unwrap()).unwrap();
        if augmented[[pivot_row, col]].abs() < 1e-12 {
            return Array2::zeros((n, n));
        }
        if pivot_row != col {
            for k in 0..2 * n {
                augmented.swap([col, k], [pivot_row, k]);
            }
        }
        let pivot = augmented[[col, col]];
        for k in 0..2 * n {
            augmented[[col, k]] /= pivot;
        }
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = augmented[[row, col]];
            if factor == 0.0 {
                continue;
            }
            for k in 0..2 * n {
                augmented[[row, k]] -= factor * augmented[[col, k]];
            }
        }
    }
    augmented.slice(ndarray::s![.., n..]).to_owned()
}

/// Solves `a x = b` via Gauss-Jordan elimination with partial pivoting.
/// `a` is consumed; singular systems fall back to a zero vector rather than
/// panicking (a degenerate design matrix should never reach here given the
/// guard rails upstream, but this keeps the kernel total).
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Array1<f64> {
    let n = a.nrows();
    for col in 0..n {
        let pivot_row = (col..n).max_by(|&r1, &r2| a[[r1, col]].abs().partial_cmp(&a[[r2, col]].abs()).unwrap()).unwrap();
        if a[[pivot_row, col]].abs() < 1e-12 {
            return Array1::zeros(n);
        }
        if pivot_row != col {
            for k in 0..n {
                a.swap([col, k], [pivot_row, k]);
            }
            b.swap(col, pivot_row);
        }
        let pivot = a[[col, col]];
        for k in 0..n {
            a[[col, k]] /= pivot;
        }
        b[col] /= pivot;
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[[row, col]];
            if factor == 0.0 {
                continue;
            }
            for k in 0..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }
    b
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn ols_fit_recovers_an_exact_linear_relationship() {
        let design = array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0], [1.0, 3.0]];
        let y = array![1.0, 3.0, 5.0, 7.0];
        let beta = ols_fit(&design, &y);
        assert!((beta[0] - 1.0).abs() < 1e-8);
        assert!((beta[1] - 2.0).abs() < 1e-8);
    }

    #[test]
    fn ridge_shrinks_the_penalized_coefficients_toward_zero() {
        let design = array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0], [1.0, 3.0]];
        let y = array![1.0, 3.0, 5.0, 7.0];
        let unridged = ols_fit(&design, &y);
        let ridged = ridge_fit(&design, &y, 10.0, 1);
        assert!(ridged[1].abs() < unridged[1].abs());
    }

    #[test]
    fn ridge_penalized_inverse_matches_a_manual_ols_solve() {
        let design = array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0], [1.0, 3.0]];
        let y = array![1.0, 3.0, 5.0, 7.0];
        let inverse = ridge_penalized_inverse(&design, 0.0, 2);
        let beta = inverse.dot(&design.t().dot(&y));
        assert!((beta[0] - 1.0).abs() < 1e-6);
        assert!((beta[1] - 2.0).abs() < 1e-6);
    }
}
