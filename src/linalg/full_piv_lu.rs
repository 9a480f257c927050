use crate::linalg::LinalgError;
use crate::traits::{FloatScalar, MatrixMut, MatrixRef};

/// LU decomposition with full (row and column) pivoting, in place.
///
/// Factors `P A Q = L U`. On return `a` holds L (unit diagonal, implicit)
/// below the diagonal and U on and above it. `row_perm[k]` is the original row
/// now at position `k`, `col_perm[k]` the original column now at position `k`.
///
/// At every step the largest remaining element becomes the pivot, which makes
/// the rank test reliable: the matrix is declared singular when a pivot falls
/// to `n * epsilon * |first pivot|` or below. On `Err` the contents of `a` are
/// partially eliminated and must not be used.
pub fn full_piv_lu_in_place<T: FloatScalar>(
    a: &mut impl MatrixMut<T>,
    row_perm: &mut [usize],
    col_perm: &mut [usize],
) -> Result<(), LinalgError> {
    let n = a.nrows();
    assert_eq!(n, a.ncols(), "LU decomposition requires a square matrix");
    assert_eq!(n, row_perm.len(), "row permutation length must match matrix size");
    assert_eq!(n, col_perm.len(), "column permutation length must match matrix size");

    for i in 0..n {
        row_perm[i] = i;
        col_perm[i] = i;
    }

    let threshold = T::epsilon() * T::from(n).unwrap_or_else(T::one);
    let mut max_pivot = T::zero();

    for k in 0..n {
        // Largest magnitude in the trailing (n-k) x (n-k) block
        let (mut pr, mut pc) = (k, k);
        let mut best = T::zero();
        for j in k..n {
            for (off, v) in a.col_as_slice(j, k).iter().enumerate() {
                let v = v.abs();
                if v > best {
                    best = v;
                    pr = k + off;
                    pc = j;
                }
            }
        }

        if k == 0 {
            max_pivot = best;
        }
        // NaN pivots fail the comparison and land here too
        if !(best > threshold * max_pivot) {
            return Err(LinalgError::Singular);
        }

        if pr != k {
            row_perm.swap(k, pr);
            for j in 0..n {
                let tmp = *a.get(k, j);
                *a.get_mut(k, j) = *a.get(pr, j);
                *a.get_mut(pr, j) = tmp;
            }
        }
        if pc != k {
            col_perm.swap(k, pc);
            let (ck, cp) = a.col_pair_mut(k, pc, 0);
            ck.swap_with_slice(cp);
        }

        let inv_pivot = T::one() / *a.get(k, k);
        for x in a.col_as_mut_slice(k, k + 1).iter_mut() {
            *x = *x * inv_pivot;
        }
        for j in (k + 1)..n {
            let a_kj = *a.get(k, j);
            let (lk, cj) = a.col_pair_mut(k, j, k + 1);
            for (c, l) in cj.iter_mut().zip(lk.iter()) {
                *c = *c - a_kj * *l;
            }
        }
    }

    Ok(())
}

/// Solve `Ax = b` from a full-pivot factorization.
///
/// `b` and `x` are separate slices of length n.
pub fn full_piv_lu_solve<T: FloatScalar>(
    lu: &impl MatrixRef<T>,
    row_perm: &[usize],
    col_perm: &[usize],
    b: &[T],
    x: &mut [T],
) {
    let n = lu.nrows();
    let mut z = vec![T::zero(); n];

    // L y = P b
    for i in 0..n {
        let mut sum = b[row_perm[i]];
        for j in 0..i {
            sum = sum - *lu.get(i, j) * z[j];
        }
        z[i] = sum;
    }

    // U z = y
    for i in (0..n).rev() {
        let mut sum = z[i];
        for j in (i + 1)..n {
            sum = sum - *lu.get(i, j) * z[j];
        }
        z[i] = sum / *lu.get(i, i);
    }

    // x = Q z
    for k in 0..n {
        x[col_perm[k]] = z[k];
    }
}
