// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Dense linear algebra helpers on top of nalgebra decompositions

use super::constants::SINGULAR_TOLERANCE;
use crate::error::{GeometryError, Result};
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use tracing::trace;

fn ensure_square(matrix: &DMatrix<f64>) -> Result<()> {
    if matrix.nrows() != matrix.ncols() {
        return Err(GeometryError::ShapeMismatch(format!(
            "expected a square matrix, got {}x{}",
            matrix.nrows(),
            matrix.ncols()
        )));
    }
    Ok(())
}

/// Determinant via LU decomposition with partial pivoting
pub fn determinant(matrix: &DMatrix<f64>) -> Result<f64> {
    ensure_square(matrix)?;
    Ok(matrix.clone().lu().determinant())
}

/// Matrix inverse; fails with `SingularTransform` when |det| < `SINGULAR_TOLERANCE`
pub fn invert(matrix: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    ensure_square(matrix)?;
    let lu = matrix.clone().lu();
    let det = lu.determinant();
    if det.abs() < SINGULAR_TOLERANCE {
        return Err(GeometryError::SingularTransform { determinant: det });
    }
    lu.try_inverse()
        .ok_or(GeometryError::SingularTransform { determinant: det })
}

/// Solve `A x = b`
pub fn solve(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    ensure_square(a)?;
    if a.nrows() != b.len() {
        return Err(GeometryError::ShapeMismatch(format!(
            "system of order {} with right-hand side of length {}",
            a.nrows(),
            b.len()
        )));
    }
    a.clone()
        .lu()
        .solve(b)
        .ok_or_else(|| GeometryError::NumericalFailure("singular linear system".into()))
}

/// Check symmetry within an absolute tolerance
pub fn is_symmetric(matrix: &DMatrix<f64>, tolerance: f64) -> bool {
    if matrix.nrows() != matrix.ncols() {
        return false;
    }
    let n = matrix.nrows();
    (0..n).all(|i| (i + 1..n).all(|j| (matrix[(i, j)] - matrix[(j, i)]).abs() <= tolerance))
}

/// Eigen-decomposition of a symmetric matrix, eigenvalues ascending
#[derive(Debug, Clone)]
pub struct SymmetricEigenpairs {
    /// Eigenvalues in ascending order
    pub values: Vec<f64>,
    /// Unit eigenvectors as columns, in the same order as `values`
    pub vectors: DMatrix<f64>,
}

impl SymmetricEigenpairs {
    /// Column `i` as an owned vector
    pub fn vector(&self, i: usize) -> DVector<f64> {
        self.vectors.column(i).into_owned()
    }
}

/// Symmetric eigen-solve with an explicit iteration budget
///
/// Fails with `NumericalFailure` when the implicit QR iteration does not
/// converge within `max_iterations` sweeps. A budget of zero is rejected,
/// since nalgebra reads it as unbounded.
pub fn symmetric_eigen(matrix: &DMatrix<f64>, max_iterations: usize) -> Result<SymmetricEigenpairs> {
    if max_iterations == 0 {
        return Err(GeometryError::invalid_input("eigen-solve needs an iteration budget > 0"));
    }
    ensure_square(matrix)?;
    if !is_symmetric(matrix, 1e-9 * matrix.amax().max(1.0)) {
        return Err(GeometryError::invalid_input("eigen-solve requires a symmetric matrix"));
    }
    let n = matrix.nrows();
    if n == 0 {
        return Ok(SymmetricEigenpairs {
            values: Vec::new(),
            vectors: DMatrix::zeros(0, 0),
        });
    }

    let eigen = SymmetricEigen::try_new(matrix.clone(), f64::EPSILON, max_iterations).ok_or_else(
        || {
            GeometryError::NumericalFailure(format!(
                "symmetric eigen-solve of order {} did not converge in {} iterations",
                n, max_iterations
            ))
        },
    )?;

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));

    let values = order.iter().map(|&i| eigen.eigenvalues[i]).collect();
    let mut vectors = DMatrix::zeros(n, n);
    for (target, &source) in order.iter().enumerate() {
        vectors.set_column(target, &eigen.eigenvectors.column(source));
    }
    trace!(order = n, "symmetric eigen-solve converged");

    Ok(SymmetricEigenpairs { values, vectors })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinant_and_inverse() {
        let m = DMatrix::from_row_slice(2, 2, &[4.0, 7.0, 2.0, 6.0]);
        assert!((determinant(&m).unwrap() - 10.0).abs() < 1e-12);

        let inv = invert(&m).unwrap();
        let identity = &m * &inv;
        assert!((identity - DMatrix::identity(2, 2)).amax() < 1e-12);
    }

    #[test]
    fn test_singular_inverse_fails() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        assert!(matches!(
            invert(&m),
            Err(GeometryError::SingularTransform { .. })
        ));
    }

    #[test]
    fn test_solve() {
        let a = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 3.0]);
        let b = DVector::from_vec(vec![3.0, 5.0]);
        let x = solve(&a, &b).unwrap();
        assert!((x[0] - 0.8).abs() < 1e-12);
        assert!((x[1] - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric_eigen_sorted() {
        let m = DMatrix::from_row_slice(3, 3, &[2.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 5.0]);
        let pairs = symmetric_eigen(&m, 100).unwrap();
        assert_eq!(pairs.values.len(), 3);
        assert!((pairs.values[0] + 1.0).abs() < 1e-12);
        assert!((pairs.values[2] - 5.0).abs() < 1e-12);
        assert!((pairs.vector(0)[1].abs() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_iteration_budget_rejected() {
        let m = DMatrix::<f64>::identity(3, 3);
        assert!(matches!(symmetric_eigen(&m, 0), Err(GeometryError::InvalidInput(_))));
        assert!(symmetric_eigen(&m, 1).is_ok());
    }

    #[test]
    fn test_non_symmetric_rejected() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 0.0, 1.0]);
        assert!(matches!(
            symmetric_eigen(&m, 100),
            Err(GeometryError::InvalidInput(_))
        ));
    }
}
