use crate::traits::{FloatScalar, MatrixMut, MatrixRef};

/// QR decomposition in place using Householder reflections.
///
/// On return, `a` contains the packed QR factorization:
/// - Upper triangle (including diagonal): R
/// - Lower triangle (excluding diagonal): Householder vectors (scaled)
///
/// `tau` is filled with the Householder scalar factors (length `min(M, N)`).
/// Works on any rectangular shape. A column that is already zero below the
/// diagonal gets `tau = 0` (identity reflection), leaving a zero on the
/// diagonal of R.
pub fn qr_in_place<T: FloatScalar>(a: &mut impl MatrixMut<T>, tau: &mut [T]) {
    let m = a.nrows();
    let n = a.ncols();
    let k = m.min(n);
    assert_eq!(tau.len(), k, "tau length must equal min(M, N)");

    for col in 0..k {
        let norm_sq = a
            .col_as_slice(col, col)
            .iter()
            .fold(T::zero(), |acc, &v| acc + v * v);

        if norm_sq == T::zero() {
            tau[col] = T::zero();
            continue;
        }

        // sigma = sign(a[col,col]) * ||x|| keeps v0 = a + sigma free of cancellation
        let norm = norm_sq.sqrt();
        let a_col_col = *a.get(col, col);
        let sigma = if a_col_col < T::zero() { -norm } else { norm };

        let v0 = a_col_col + sigma;
        let tau_val = v0 / sigma;
        tau[col] = tau_val;

        // Store v[1..] = x[1..] / v0 below the diagonal; v[0] = 1 is implicit
        for x in a.col_as_mut_slice(col, col + 1).iter_mut() {
            *x = *x / v0;
        }

        // A[col:m, j] -= tau * v * (v^T A[col:m, j])
        for j in (col + 1)..n {
            let (v, aj) = a.col_pair_mut(col, j, col + 1);
            let mut dot = T::zero();
            for (vi, ai) in v.iter().zip(aj.iter()) {
                dot = dot + *vi * *ai;
            }
            let head = *a.get(col, j);
            let dot = (head + dot) * tau_val;
            *a.get_mut(col, j) = head - dot;
            let (v, aj) = a.col_pair_mut(col, j, col + 1);
            for (ai, vi) in aj.iter_mut().zip(v.iter()) {
                *ai = *ai - dot * *vi;
            }
        }

        *a.get_mut(col, col) = -sigma;
    }
}

/// Least-squares solve of `Ax = b` from a packed Householder QR.
///
/// `b` has length M, `x` has length N. With `k = min(M, N)` the first `k`
/// unknowns come from back substitution on the leading `k x k` block of R and
/// the remaining `N - k` unknowns are set to zero. For `M >= N` this is the
/// ordinary least-squares solution. No rank check.
pub fn qr_solve<T: FloatScalar>(qr: &impl MatrixRef<T>, tau: &[T], b: &[T], x: &mut [T]) {
    let m = qr.nrows();
    let n = qr.ncols();
    let k = m.min(n);

    // Q^T b
    let mut qtb = b.to_vec();
    for col in 0..k {
        let v = qr.col_as_slice(col, col + 1);
        let mut dot = qtb[col];
        for (vi, bi) in v.iter().zip(&qtb[col + 1..]) {
            dot = dot + *vi * *bi;
        }
        let dot = dot * tau[col];
        qtb[col] = qtb[col] - dot;
        for (bi, vi) in qtb[col + 1..].iter_mut().zip(v.iter()) {
            *bi = *bi - dot * *vi;
        }
    }

    for xi in x[k..].iter_mut() {
        *xi = T::zero();
    }
    for i in (0..k).rev() {
        let mut sum = qtb[i];
        for j in (i + 1)..k {
            sum = sum - *qr.get(i, j) * x[j];
        }
        x[i] = sum / *qr.get(i, i);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NativeMatrix;

    #[test]
    fn least_squares_line_fit() {
        // y = c0 + c1*x through (0,1), (1,2), (2,4)
        let mut a = NativeMatrix::from_rows(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let mut tau = [0.0; 2];
        qr_in_place(&mut a, &mut tau);
        let mut x = [0.0; 2];
        qr_solve(&a, &tau, &[1.0, 2.0, 4.0], &mut x);
        assert!((x[0] - 5.0 / 6.0).abs() < 1e-12);
        assert!((x[1] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn r_diagonal_magnitudes() {
        let mut a = NativeMatrix::from_rows(2, 2, &[3.0, 1.0, 4.0, 2.0]);
        let mut tau = [0.0; 2];
        qr_in_place(&mut a, &mut tau);
        // |r00| = column norm
        assert!((a[(0, 0)].abs() - 5.0).abs() < 1e-12);
        // |det| = |r00 * r11| = 2
        assert!(((a[(0, 0)] * a[(1, 1)]).abs() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn zero_column_gets_identity_reflection() {
        let mut a = NativeMatrix::from_rows(2, 2, &[0.0, 1.0, 0.0, 1.0]);
        let mut tau = [1.0; 2];
        qr_in_place(&mut a, &mut tau);
        assert_eq!(tau[0], 0.0);
        assert_eq!(a[(0, 0)], 0.0);
    }

    #[test]
    fn underdetermined_basic_solution() {
        // x0 + x1 = 2 has the basic solution x = [2, 0]
        let mut a = NativeMatrix::from_rows(1, 2, &[1.0, 1.0]);
        let mut tau = [0.0; 1];
        qr_in_place(&mut a, &mut tau);
        let mut x = [9.0; 2];
        qr_solve(&a, &tau, &[2.0], &mut x);
        assert!((x[0] - 2.0).abs() < 1e-12);
        assert_eq!(x[1], 0.0);
    }
}
