//! Column-major dense kernels shared by the operation library.
//!
//! Every routine works on flat column-major slices. Element `(row, col)` of an
//! operand with leading dimension `ld` lives at `col * ld + row`, so columns are
//! contiguous and inner loops run as dot products or AXPY updates over them.

/// Dot product of two equal-length slices.
#[inline]
pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let mut sum = 0.0;
    for i in 0..a.len() {
        sum += a[i] * b[i];
    }
    sum
}

/// AXPY: `y += alpha * x`.
#[inline]
pub(crate) fn axpy(y: &mut [f64], alpha: f64, x: &[f64]) {
    debug_assert_eq!(y.len(), x.len());
    for i in 0..y.len() {
        y[i] += alpha * x[i];
    }
}

/// A column-major source operand, read either as stored or transposed.
#[derive(Clone, Copy)]
pub(crate) struct Operand<'a> {
    data: &'a [f64],
    /// Stored row count, which is also the leading dimension.
    rows: usize,
    cols: usize,
    trans: bool,
}

impl<'a> Operand<'a> {
    #[inline]
    pub(crate) fn new(data: &'a [f64], rows: usize, cols: usize) -> Self {
        debug_assert!(data.len() >= rows * cols);
        Self {
            data,
            rows,
            cols,
            trans: false,
        }
    }

    #[inline]
    pub(crate) fn t(self) -> Self {
        Self {
            trans: !self.trans,
            ..self
        }
    }

    #[inline]
    pub(crate) fn op_rows(&self) -> usize {
        if self.trans {
            self.cols
        } else {
            self.rows
        }
    }

    #[inline]
    pub(crate) fn op_cols(&self) -> usize {
        if self.trans {
            self.rows
        } else {
            self.cols
        }
    }

    /// Stored column `j`.
    #[inline]
    fn col(&self, j: usize) -> &'a [f64] {
        &self.data[j * self.rows..(j + 1) * self.rows]
    }

    /// Stored element `(i, j)`.
    #[inline]
    fn at(&self, i: usize, j: usize) -> f64 {
        self.data[j * self.rows + i]
    }
}

/// General matrix multiply: `C = beta * C + alpha * op(A) * op(B)`.
///
/// `C` is `op(A).rows x op(B).cols` with leading dimension `ldc`, starting at
/// `c[0]`. Passing a sub-slice and the parent's row count as `ldc` targets a
/// block of a larger matrix. `beta == 0` overwrites `C` without reading it.
pub(crate) fn gemm(alpha: f64, a: Operand<'_>, b: Operand<'_>, beta: f64, c: &mut [f64], ldc: usize) {
    let m = a.op_rows();
    let k = a.op_cols();
    let n = b.op_cols();
    debug_assert_eq!(k, b.op_rows());
    debug_assert!(n == 0 || c.len() >= (n - 1) * ldc + m);

    for j in 0..n {
        let cj = &mut c[j * ldc..j * ldc + m];
        if beta == 0.0 {
            cj.fill(0.0);
        } else if beta != 1.0 {
            for x in cj.iter_mut() {
                *x *= beta;
            }
        }
    }
    if k == 0 {
        return;
    }

    match (a.trans, b.trans) {
        // C[:, j] += (alpha * B[l, j]) * A[:, l]
        (false, false) => {
            for j in 0..n {
                let cj = &mut c[j * ldc..j * ldc + m];
                for l in 0..k {
                    axpy(cj, alpha * b.at(l, j), a.col(l));
                }
            }
        }
        // C[i, j] += alpha * A[:, i] . B[:, j]
        (true, false) => {
            for j in 0..n {
                let bj = b.col(j);
                for i in 0..m {
                    c[j * ldc + i] += alpha * dot(a.col(i), bj);
                }
            }
        }
        // C[:, j] += (alpha * B[j, l]) * A[:, l]
        (false, true) => {
            for j in 0..n {
                let cj = &mut c[j * ldc..j * ldc + m];
                for l in 0..k {
                    axpy(cj, alpha * b.at(j, l), a.col(l));
                }
            }
        }
        (true, true) => {
            for j in 0..n {
                for i in 0..m {
                    let ai = a.col(i);
                    let mut sum = 0.0;
                    for l in 0..k {
                        sum += ai[l] * b.at(j, l);
                    }
                    c[j * ldc + i] += alpha * sum;
                }
            }
        }
    }
}

/// Quadratic form `C = beta * C + A^T * B * A` for `A` (m x n) and `B` (m x m).
///
/// `C` is `n x n` with leading dimension `ldc`.
pub(crate) fn quad(a: Operand<'_>, b: Operand<'_>, beta: f64, c: &mut [f64], ldc: usize) {
    let m = a.op_rows();
    let n = a.op_cols();
    let mut ba = vec![0.0; m * n];
    gemm(1.0, b, a, 0.0, &mut ba, m);
    gemm(1.0, a.t(), Operand::new(&ba, m, n), beta, c, ldc);
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2x3, column-major: [[1, 2, 3], [4, 5, 6]]
    const A: [f64; 6] = [1.0, 4.0, 2.0, 5.0, 3.0, 6.0];

    #[test]
    fn gemm_nn() {
        // A * A^T stored as explicit 3x2
        let at = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut c = [0.0; 4];
        gemm(1.0, Operand::new(&A, 2, 3), Operand::new(&at, 3, 2), 0.0, &mut c, 2);
        assert_eq!(c, [14.0, 32.0, 32.0, 77.0]);
    }

    #[test]
    fn gemm_transposes_agree() {
        let a = Operand::new(&A, 2, 3);
        let mut nt = [0.0; 4];
        gemm(1.0, a, a.t(), 0.0, &mut nt, 2);
        let mut tn = [0.0; 9];
        gemm(1.0, a.t(), a, 0.0, &mut tn, 3);
        let mut tt = [0.0; 4];
        // (A^T)^T * A^T
        gemm(1.0, a.t().t(), a.t(), 0.0, &mut tt, 2);
        assert_eq!(nt, [14.0, 32.0, 32.0, 77.0]);
        assert_eq!(tt, nt);
        assert_eq!(tn, [17.0, 22.0, 27.0, 22.0, 29.0, 36.0, 27.0, 36.0, 45.0]);
    }

    #[test]
    fn gemm_tt_path() {
        let b = [1.0, 3.0, 2.0, 4.0]; // [[1, 2], [3, 4]]
        let mut c = [0.0; 6];
        gemm(1.0, Operand::new(&A, 2, 3).t(), Operand::new(&b, 2, 2).t(), 0.0, &mut c, 3);
        // A^T * B^T = (B * A)^T ; B*A = [[9, 12, 15], [19, 26, 33]]
        assert_eq!(c, [9.0, 12.0, 15.0, 19.0, 26.0, 33.0]);
    }

    #[test]
    fn gemm_accumulates_into_block() {
        // 3x3 destination, write a 2x2 block at (1, 1)
        let id = [1.0, 0.0, 0.0, 1.0];
        let x = [1.0, 2.0, 3.0, 4.0];
        let mut c = [1.0; 9];
        gemm(2.0, Operand::new(&id, 2, 2), Operand::new(&x, 2, 2), 1.0, &mut c[4..], 3);
        assert_eq!(c, [1.0, 1.0, 1.0, 1.0, 3.0, 5.0, 1.0, 7.0, 9.0]);
    }

    #[test]
    fn beta_zero_ignores_nan_destination() {
        let id = [1.0, 0.0, 0.0, 1.0];
        let mut c = [f64::NAN; 4];
        gemm(1.0, Operand::new(&id, 2, 2), Operand::new(&id, 2, 2), 0.0, &mut c, 2);
        assert_eq!(c, id);
    }

    #[test]
    fn quad_with_identity_is_gram() {
        let a = [1.0, 3.0, 5.0, 2.0, 4.0, 6.0]; // 3x2 [[1, 2], [3, 4], [5, 6]]
        let id = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        let mut c = [0.0; 4];
        quad(Operand::new(&a, 3, 2), Operand::new(&id, 3, 3), 0.0, &mut c, 2);
        assert_eq!(c, [35.0, 44.0, 44.0, 56.0]);
    }
}
