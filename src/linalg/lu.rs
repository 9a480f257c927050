use crate::traits::{FloatScalar, MatrixMut, MatrixRef};

/// Perform LU decomposition with partial pivoting, in place.
///
/// On return, `a` contains both L and U packed together:
/// - Upper triangle (including diagonal): U
/// - Lower triangle (excluding diagonal): L (diagonal of L is implicitly 1)
///
/// `perm` is filled with the row permutation indices.
/// Returns `true` if the number of row swaps was even.
///
/// No singularity check: a zero pivot propagates Inf/NaN into the factors.
pub fn lu_in_place<T: FloatScalar>(a: &mut impl MatrixMut<T>, perm: &mut [usize]) -> bool {
    let n = a.nrows();
    assert_eq!(n, a.ncols(), "LU decomposition requires a square matrix");
    assert_eq!(n, perm.len(), "permutation slice length must match matrix size");

    for (i, p) in perm.iter_mut().enumerate() {
        *p = i;
    }

    let mut even = true;

    for col in 0..n {
        // Partial pivoting: find row with largest magnitude in this column
        let mut max_row = col;
        let mut max_val = a.get(col, col).abs();
        for row in (col + 1)..n {
            let val = a.get(row, col).abs();
            if val > max_val {
                max_val = val;
                max_row = row;
            }
        }

        if max_row != col {
            perm.swap(col, max_row);
            for j in 0..n {
                let tmp = *a.get(col, j);
                *a.get_mut(col, j) = *a.get(max_row, j);
                *a.get_mut(max_row, j) = tmp;
            }
            even = !even;
        }

        // dgetf2-style elimination on contiguous column slices:
        // scale the sub-column by 1/pivot, then rank-1 update of trailing columns.
        let inv_pivot = T::one() / *a.get(col, col);
        for x in a.col_as_mut_slice(col, col + 1).iter_mut() {
            *x = *x * inv_pivot;
        }

        for j in (col + 1)..n {
            let a_col_j = *a.get(col, j);
            let (left, right) = a.col_pair_mut(col, j, col + 1);
            for (r, l) in right.iter_mut().zip(left.iter()) {
                *r = *r - a_col_j * *l;
            }
        }
    }

    even
}

/// Solve Ax = b given the packed LU decomposition and permutation.
///
/// `lu` is the packed L/U matrix from `lu_in_place`.
/// `perm` is the row permutation from `lu_in_place`.
/// `b` (input) and `x` (output) are separate slices of length n.
pub fn lu_solve<T: FloatScalar>(lu: &impl MatrixRef<T>, perm: &[usize], b: &[T], x: &mut [T]) {
    let n = lu.nrows();

    // Apply permutation and forward substitution (solve Ly = Pb)
    for i in 0..n {
        let mut sum = b[perm[i]];
        for j in 0..i {
            sum = sum - *lu.get(i, j) * x[j];
        }
        x[i] = sum;
    }

    // Back substitution (solve Ux = y)
    for i in (0..n).rev() {
        let mut sum = x[i];
        for j in (i + 1)..n {
            sum = sum - *lu.get(i, j) * x[j];
        }
        x[i] = sum / *lu.get(i, i);
    }
}

/// Write `A^-1` column by column into `inv` from a packed LU factorization.
///
/// `inv` must already be `n x n`.
pub(crate) fn lu_inverse(lu: &impl MatrixRef<f64>, perm: &[usize], inv: &mut impl MatrixMut<f64>) {
    let n = lu.nrows();
    let mut e = vec![0.0; n];
    for col in 0..n {
        e.fill(0.0);
        e[col] = 1.0;
        lu_solve(lu, perm, &e, inv.col_as_mut_slice(col, 0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NativeMatrix;

    #[test]
    fn solve_3x3() {
        let mut a = NativeMatrix::from_rows(3, 3, &[2.0, 1.0, -1.0, -3.0, -1.0, 2.0, -2.0, 1.0, 2.0]);
        let mut perm = [0; 3];
        lu_in_place(&mut a, &mut perm);
        let mut x = [0.0; 3];
        lu_solve(&a, &perm, &[8.0, -11.0, -3.0], &mut x);
        assert!((x[0] - 2.0).abs() < 1e-12);
        assert!((x[1] - 3.0).abs() < 1e-12);
        assert!((x[2] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pivoting_swaps_rows() {
        let mut a = NativeMatrix::from_rows(2, 2, &[0.0, 1.0, 1.0, 0.0]);
        let mut perm = [0; 2];
        let even = lu_in_place(&mut a, &mut perm);
        assert!(!even);
        assert_eq!(perm, [1, 0]);
        assert_eq!(a.as_slice(), &[1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn inverse_2x2() {
        let mut a = NativeMatrix::from_rows(2, 2, &[4.0, 7.0, 2.0, 6.0]);
        let mut perm = [0; 2];
        lu_in_place(&mut a, &mut perm);
        let mut inv = NativeMatrix::new(2, 2);
        lu_inverse(&a, &perm, &mut inv);
        let expected = [0.6, -0.7, -0.2, 0.4];
        for (got, want) in inv.to_row_major().iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn singular_is_unchecked() {
        let mut a = NativeMatrix::new(2, 2);
        let mut perm = [0; 2];
        lu_in_place(&mut a, &mut perm);
        let mut x = [0.0; 2];
        lu_solve(&a, &perm, &[1.0, 1.0], &mut x);
        assert!(x.iter().any(|v| !v.is_finite()));
    }
}
