use crate::traits::{FloatScalar, MatrixMut, MatrixRef};

/// Cholesky decomposition in place: A = L * L^T.
///
/// Reads only the lower triangle. On return the lower triangle of `a`
/// (including diagonal) contains L; the upper triangle is left unchanged.
///
/// Unchecked: a non-positive pivot produces NaN (or Inf) in L rather than an
/// error. Callers that regularize the matrix (`M + alpha^2 I`) rely on this
/// being the fast path.
#[inline]
pub fn cholesky_in_place<T: FloatScalar>(a: &mut impl MatrixMut<T>) {
    let n = a.nrows();
    assert_eq!(n, a.ncols(), "Cholesky decomposition requires a square matrix");

    for j in 0..n {
        for k in 0..j {
            let ljk = *a.get(j, k);
            let (col_j, col_k) = a.col_pair_mut(j, k, j);
            for (x, l) in col_j.iter_mut().zip(col_k.iter()) {
                *x = *x - ljk * *l;
            }
        }

        let ljj = a.get(j, j).sqrt();
        *a.get_mut(j, j) = ljj;

        let inv_ljj = T::one() / ljj;
        for x in a.col_as_mut_slice(j, j + 1).iter_mut() {
            *x = *x * inv_ljj;
        }
    }
}

/// Solve L*x = b by forward substitution, where L is lower triangular.
#[inline]
pub fn forward_substitute<T: FloatScalar>(l: &impl MatrixRef<T>, b: &[T], x: &mut [T]) {
    let n = l.nrows();
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum = sum - *l.get(i, j) * x[j];
        }
        x[i] = sum / *l.get(i, i);
    }
}

/// Solve L^T * x = b by back substitution, where L is lower triangular.
#[inline]
pub fn back_substitute_lt<T: FloatScalar>(l: &impl MatrixRef<T>, b: &[T], x: &mut [T]) {
    let n = l.nrows();
    for i in (0..n).rev() {
        let mut sum = b[i];
        for j in (i + 1)..n {
            sum = sum - *l.get(j, i) * x[j];
        }
        x[i] = sum / *l.get(i, i);
    }
}

/// Solve `L L^T x = b` given the factor from [`cholesky_in_place`].
pub fn cholesky_solve<T: FloatScalar>(l: &impl MatrixRef<T>, b: &[T], x: &mut [T]) {
    let mut y = vec![T::zero(); l.nrows()];
    forward_substitute(l, b, &mut y);
    back_substitute_lt(l, &y, x);
}
