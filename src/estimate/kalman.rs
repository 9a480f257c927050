use crate::kernels::{self, Operand};
use crate::linalg::lu::{lu_in_place, lu_inverse};
use crate::{MatrixError, NativeMatrix};

fn incompatible(op: &'static str, lhs: &NativeMatrix, rhs: &NativeMatrix) -> MatrixError {
    MatrixError::Incompatible {
        op,
        lhs: lhs.shape(),
        rhs: rhs.shape(),
    }
}

/// Full symmetric matrix mirrored from the upper triangle of `p`.
fn symmetric_from_upper(p: &NativeMatrix) -> NativeMatrix {
    NativeMatrix::from_fn(p.nrows(), p.ncols(), |i, j| {
        if i <= j {
            p[(i, j)]
        } else {
            p[(j, i)]
        }
    })
}

/// Diagonal of `q`: its entries if `q` is a column, its diagonal if square.
fn noise_diagonal(q: &NativeMatrix, i: usize) -> f64 {
    if q.ncols() == 1 {
        q[(i, 0)]
    } else {
        q[(i, i)]
    }
}

/// Predicted covariance `dst = F P Fᵀ + diag(Q)`.
///
/// - `f` — `n x n` state transition
/// - `p` — `n x n` covariance; only the upper triangle is read
/// - `q` — process noise, either an `n x 1` vector of variances or an `n x n`
///   matrix whose diagonal is used
///
/// `dst` is resized to `n x n`. A shape mismatch leaves `dst` untouched.
///
/// ```
/// use numeris_native::estimate::predict_error_covariance;
/// use numeris_native::NativeMatrix;
///
/// let f = NativeMatrix::from_rows(2, 2, &[1.0, 0.1, 0.0, 1.0]);
/// let p = NativeMatrix::eye(2);
/// let q = NativeMatrix::from_column(&[0.01, 0.01]);
/// let mut next = NativeMatrix::new(0, 0);
/// predict_error_covariance(&mut next, &f, &p, &q).unwrap();
/// assert!((next[(0, 0)] - 1.02).abs() < 1e-12);
/// assert!((next[(0, 1)] - 0.1).abs() < 1e-12);
/// ```
pub fn predict_error_covariance(
    dst: &mut NativeMatrix,
    f: &NativeMatrix,
    p: &NativeMatrix,
    q: &NativeMatrix,
) -> Result<(), MatrixError> {
    const OP: &str = "predict_error_covariance";
    f.expect_square(OP)?;
    p.expect_square(OP)?;
    let n = f.nrows();
    if p.nrows() != n {
        return Err(incompatible(OP, f, p));
    }
    let q_ok = q.nrows() == n && (q.ncols() == 1 || q.ncols() == n);
    if !q_ok {
        return Err(incompatible(OP, f, q));
    }

    let p = symmetric_from_upper(p);
    let mut fp = vec![0.0; n * n];
    kernels::gemm(1.0, f.operand(), p.operand(), 0.0, &mut fp, n);

    dst.resize(n, n);
    kernels::gemm(1.0, Operand::new(&fp, n, n), f.operand().t(), 0.0, dst.as_mut_slice(), n);
    for i in 0..n {
        dst[(i, i)] += noise_diagonal(q, i);
    }
    Ok(())
}

/// Kalman gain `dst = P Hᵀ (H P Hᵀ + diag(R))⁻¹`.
///
/// - `p` — `n x n` covariance; only the upper triangle is read
/// - `h` — `m x n` measurement Jacobian
/// - `r` — `m x 1` measurement variances
///
/// The innovation covariance is inverted by partial-pivot LU without a
/// singularity check. `dst` is resized to `n x m`.
pub fn compute_kalman_gain(
    dst: &mut NativeMatrix,
    p: &NativeMatrix,
    h: &NativeMatrix,
    r: &NativeMatrix,
) -> Result<(), MatrixError> {
    const OP: &str = "compute_kalman_gain";
    p.expect_square(OP)?;
    let n = p.nrows();
    let m = h.nrows();
    if h.ncols() != n {
        return Err(incompatible(OP, h, p));
    }
    if r.ncols() != 1 || r.nrows() != m {
        return Err(incompatible(OP, h, r));
    }

    let p = symmetric_from_upper(p);
    let mut pht = vec![0.0; n * m];
    kernels::gemm(1.0, p.operand(), h.operand().t(), 0.0, &mut pht, n);
    let pht = Operand::new(&pht, n, m);

    // S = H P Hᵀ + diag(R)
    let mut s = NativeMatrix::new(m, m);
    kernels::gemm(1.0, h.operand(), pht, 0.0, s.as_mut_slice(), m);
    for i in 0..m {
        s[(i, i)] += r[(i, 0)];
    }

    let mut perm = vec![0; m];
    lu_in_place(&mut s, &mut perm);
    let mut s_inv = NativeMatrix::new(m, m);
    lu_inverse(&s, &perm, &mut s_inv);

    dst.resize(n, m);
    kernels::gemm(1.0, pht, s_inv.operand(), 0.0, dst.as_mut_slice(), n);
    Ok(())
}

/// Corrected state `dst = x + K r`.
///
/// - `x` — `n x 1` state
/// - `k` — `n x m` gain
/// - `r` — `m x 1` innovation
///
/// `dst` is resized to `n x 1`.
pub fn update_state(
    dst: &mut NativeMatrix,
    x: &NativeMatrix,
    k: &NativeMatrix,
    r: &NativeMatrix,
) -> Result<(), MatrixError> {
    const OP: &str = "update_state";
    if x.ncols() != 1 || k.nrows() != x.nrows() {
        return Err(incompatible(OP, x, k));
    }
    if r.ncols() != 1 || r.nrows() != k.ncols() {
        return Err(incompatible(OP, k, r));
    }

    let n = x.nrows();
    dst.set_from(x);
    kernels::gemm(1.0, k.operand(), r.operand(), 1.0, dst.as_mut_slice(), n);
    Ok(())
}

/// Corrected covariance `dst = (I - K H) P`.
///
/// - `k` — `n x m` gain
/// - `h` — `m x n` measurement Jacobian
/// - `p` — `n x n` covariance; only the upper triangle is read
///
/// `dst` is resized to `n x n`.
pub fn update_error_covariance(
    dst: &mut NativeMatrix,
    k: &NativeMatrix,
    h: &NativeMatrix,
    p: &NativeMatrix,
) -> Result<(), MatrixError> {
    const OP: &str = "update_error_covariance";
    p.expect_square(OP)?;
    let n = p.nrows();
    if k.ncols() != h.nrows() {
        return Err(incompatible(OP, k, h));
    }
    if k.nrows() != n || h.ncols() != n {
        return Err(incompatible(OP, k, p));
    }

    let p = symmetric_from_upper(p);
    let mut ikh = NativeMatrix::eye(n);
    kernels::gemm(-1.0, k.operand(), h.operand(), 1.0, ikh.as_mut_slice(), n);

    dst.resize(n, n);
    kernels::gemm(1.0, ikh.operand(), p.operand(), 0.0, dst.as_mut_slice(), n);
    Ok(())
}
