use ndarray::{Array1, Array2};

use crate::errors::AppError;

/// Solve `(XᵀX + diag(penalties)) β = Xᵀy` for β.
///
/// The penalised normal matrix is symmetric positive definite as long as
/// every penalty is positive, so a Cholesky factorisation is used.
pub fn solve_ridge(
    x: &Array2<f64>,
    y: &Array1<f64>,
    penalties: &Array1<f64>,
) -> Result<Array1<f64>, AppError> {
    let p = x.ncols();
    if penalties.len() != p || y.len() != x.nrows() {
        return Err(AppError::Model(format!(
            "Dimension mismatch: X is {}x{}, y has {}, penalties has {}",
            x.nrows(),
            p,
            y.len(),
            penalties.len()
        )));
    }

    let mut a = x.t().dot(x);
    for j in 0..p {
        a[[j, j]] += penalties[j];
    }
    let b = x.t().dot(y);

    let l = cholesky(&a)?;

    // Forward substitution: L z = b
    let mut z = Array1::<f64>::zeros(p);
    for i in 0..p {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * z[k];
        }
        z[i] = sum / l[[i, i]];
    }

    // Back substitution: Lᵀ β = z
    let mut beta = Array1::<f64>::zeros(p);
    for i in (0..p).rev() {
        let mut sum = z[i];
        for k in (i + 1)..p {
            sum -= l[[k, i]] * beta[k];
        }
        beta[i] = sum / l[[i, i]];
    }

    Ok(beta)
}

fn cholesky(a: &Array2<f64>) -> Result<Array2<f64>, AppError> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return Err(AppError::Model(format!(
                        "Normal matrix is not positive definite at column {}",
                        i
                    )));
                }
                l[[i, i]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }
    Ok(l)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_recovers_exact_linear_fit() {
        // y = 2 + 3x
        let x = array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0], [1.0, 3.0]];
        let y = array![2.0, 5.0, 8.0, 11.0];
        let penalties = array![1e-10, 1e-10];

        let beta = solve_ridge(&x, &y, &penalties).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-6);
        assert!((beta[1] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_penalty_shrinks_towards_zero() {
        let x = array![[1.0], [1.0], [1.0]];
        let y = array![3.0, 3.0, 3.0];

        let loose = solve_ridge(&x, &y, &array![1e-8]).unwrap();
        let tight = solve_ridge(&x, &y, &array![3.0]).unwrap();
        assert!((loose[0] - 3.0).abs() < 1e-6);
        // (3 * 3) / (3 + 3)
        assert!((tight[0] - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_collinear_columns_are_solvable_with_penalty() {
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0]];
        let y = array![1.0, 2.0, 3.0];
        let beta = solve_ridge(&x, &y, &array![0.01, 0.01]).unwrap();
        assert!((beta[0] - beta[1]).abs() < 1e-9);
    }

    #[test]
    fn test_dimension_mismatch() {
        let x = array![[1.0, 0.0], [1.0, 1.0]];
        let y = array![1.0, 2.0];
        assert!(solve_ridge(&x, &y, &array![1.0]).is_err());
    }
}
