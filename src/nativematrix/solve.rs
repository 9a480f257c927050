use log::debug;

use super::{MatrixError, NativeMatrix, NAN_SENTINEL};
use crate::kernels::{self, Operand};
use crate::linalg::{
    cholesky::{cholesky_in_place, cholesky_solve},
    full_piv_lu::{full_piv_lu_in_place, full_piv_lu_solve},
    lu::{lu_in_place, lu_inverse, lu_solve},
    qr::{qr_in_place, qr_solve},
};

// ── Factorization-based solves ──────────────────────────────────────
//
// `invert`, `solve`, `solve_robust`, `solve_damped` and
// `project_on_nullspace` are unchecked: singular or ill-conditioned input
// produces Inf/NaN without an error. `solve_check` is the guarded path.

impl NativeMatrix {
    /// `b` must be a single column with `A.rows` rows.
    fn check_rhs(op: &'static str, a: &NativeMatrix, b: &NativeMatrix) -> Result<(), MatrixError> {
        if b.ncols != 1 || b.nrows != a.nrows {
            return Err(MatrixError::Incompatible {
                op,
                lhs: a.shape(),
                rhs: b.shape(),
            });
        }
        Ok(())
    }

    /// `self = A^-1` via partial-pivot LU. No invertibility check.
    ///
    /// ```
    /// use numeris_native::NativeMatrix;
    /// let a = NativeMatrix::from_rows(2, 2, &[4.0, 7.0, 2.0, 6.0]);
    /// let mut inv = NativeMatrix::new(0, 0);
    /// inv.invert(&a).unwrap();
    /// assert!((inv[(0, 0)] - 0.6).abs() < 1e-12);
    /// ```
    pub fn invert(&mut self, a: &NativeMatrix) -> Result<(), MatrixError> {
        a.expect_square("invert")?;
        let n = a.nrows;
        let mut lu = a.clone();
        let mut perm = vec![0; n];
        lu_in_place(&mut lu, &mut perm);
        self.resize(n, n);
        lu_inverse(&lu, &perm, self);
        Ok(())
    }

    /// `self = A^-1 b` via partial-pivot LU. `A` square, `b` a column.
    pub fn solve(&mut self, a: &NativeMatrix, b: &NativeMatrix) -> Result<(), MatrixError> {
        a.expect_square("solve")?;
        Self::check_rhs("solve", a, b)?;
        let n = a.nrows;
        let mut lu = a.clone();
        let mut perm = vec![0; n];
        lu_in_place(&mut lu, &mut perm);
        self.resize(n, 1);
        lu_solve(&lu, &perm, b.as_slice(), self.as_mut_slice());
        Ok(())
    }

    /// `self = A^-1 b` via full-pivot LU, with an explicit singularity test.
    ///
    /// On singular input `self` is resized to `n x 1`, filled with NaN, and
    /// `Err(MatrixError::Linalg(LinalgError::Singular))` is returned.
    ///
    /// ```
    /// use numeris_native::{MatrixError, NativeMatrix};
    /// use numeris_native::linalg::LinalgError;
    ///
    /// let a = NativeMatrix::new(2, 2);
    /// let b = NativeMatrix::from_column(&[1.0, 1.0]);
    /// let mut x = NativeMatrix::new(0, 0);
    /// assert_eq!(x.solve_check(&a, &b), Err(MatrixError::Linalg(LinalgError::Singular)));
    /// assert!(x.as_slice().iter().all(|v| v.is_nan()));
    /// ```
    pub fn solve_check(&mut self, a: &NativeMatrix, b: &NativeMatrix) -> Result<(), MatrixError> {
        a.expect_square("solve_check")?;
        Self::check_rhs("solve_check", a, b)?;
        let n = a.nrows;
        let mut lu = a.clone();
        let mut row_perm = vec![0; n];
        let mut col_perm = vec![0; n];
        let factored = full_piv_lu_in_place(&mut lu, &mut row_perm, &mut col_perm);
        self.resize(n, 1);
        if let Err(e) = factored {
            debug!("solve_check: {n}x{n} system is singular");
            self.fill(NAN_SENTINEL);
            return Err(e.into());
        }
        full_piv_lu_solve(&lu, &row_perm, &col_perm, b.as_slice(), self.as_mut_slice());
        Ok(())
    }

    /// Least-squares `self = argmin |A x - b|` via Householder QR, any shape.
    ///
    /// `self` becomes `A.cols x 1`. For wide systems the basic solution (the
    /// trailing `A.cols - A.rows` unknowns set to zero) is returned.
    pub fn solve_robust(&mut self, a: &NativeMatrix, b: &NativeMatrix) -> Result<(), MatrixError> {
        Self::check_rhs("solve_robust", a, b)?;
        let mut qr = a.clone();
        let mut tau = vec![0.0; a.nrows.min(a.ncols)];
        qr_in_place(&mut qr, &mut tau);
        self.resize(a.ncols, 1);
        qr_solve(&qr, &tau, b.as_slice(), self.as_mut_slice());
        Ok(())
    }

    /// Damped least squares: `self = A^T (A A^T + alpha^2 I)^-1 b`.
    ///
    /// The regularized `A.rows x A.rows` system is factored by Cholesky.
    /// `self` becomes `A.cols x 1`.
    pub fn solve_damped(&mut self, a: &NativeMatrix, b: &NativeMatrix, alpha: f64) -> Result<(), MatrixError> {
        Self::check_rhs("solve_damped", a, b)?;
        let m = a.nrows;
        let mut outer = NativeMatrix::new(m, m);
        kernels::gemm(1.0, a.operand(), a.operand().t(), 0.0, outer.as_mut_slice(), m);
        add_to_diagonal(&mut outer, alpha * alpha);
        cholesky_in_place(&mut outer);

        let mut y = vec![0.0; m];
        cholesky_solve(&outer, b.as_slice(), &mut y);

        self.resize(a.ncols, 1);
        kernels::gemm(1.0, a.operand().t(), Operand::new(&y, m, 1), 0.0, self.as_mut_slice(), a.ncols);
        Ok(())
    }

    /// `self = A (I - (B^T B + alpha^2 I)^-1 B^T B)`: `A` projected onto the
    /// approximate nullspace of `B`. Requires `A.cols == B.cols`.
    ///
    /// Allocates its scratch on every call; see
    /// [`NullspaceProjector`](crate::NullspaceProjector) for the reusing form.
    pub fn project_on_nullspace(&mut self, a: &NativeMatrix, b: &NativeMatrix, alpha: f64) -> Result<(), MatrixError> {
        if a.ncols != b.ncols {
            return Err(MatrixError::Incompatible {
                op: "project_on_nullspace",
                lhs: a.shape(),
                rhs: b.shape(),
            });
        }
        let n = b.ncols;
        let mut scratch = NullspaceScratch::new(n);
        scratch.build(b, alpha);
        self.resize(a.nrows, n);
        scratch.apply(a, self);
        Ok(())
    }
}

/// `m[i, i] += value` for every diagonal element.
pub(crate) fn add_to_diagonal(m: &mut NativeMatrix, value: f64) {
    for i in 0..m.nrows.min(m.ncols) {
        m[(i, i)] += value;
    }
}

/// `dof x dof` workspace for nullspace projection.
#[derive(Debug, Clone)]
pub(crate) struct NullspaceScratch {
    btb: NativeMatrix,
    factor: NativeMatrix,
    projector: NativeMatrix,
}

impl NullspaceScratch {
    pub(crate) fn new(dof: usize) -> Self {
        Self {
            btb: NativeMatrix::new(dof, dof),
            factor: NativeMatrix::new(dof, dof),
            projector: NativeMatrix::new(dof, dof),
        }
    }

    /// Form `P = I - (B^T B + alpha^2 I)^-1 B^T B`. `B.cols` must equal `dof`.
    pub(crate) fn build(&mut self, b: &NativeMatrix, alpha: f64) {
        let n = self.btb.nrows;
        kernels::gemm(1.0, b.operand().t(), b.operand(), 0.0, self.btb.as_mut_slice(), n);

        self.factor.as_mut_slice().copy_from_slice(self.btb.as_slice());
        add_to_diagonal(&mut self.factor, alpha * alpha);
        cholesky_in_place(&mut self.factor);

        for j in 0..n {
            let rhs = &self.btb.as_slice()[j * n..(j + 1) * n];
            let col = &mut self.projector.as_mut_slice()[j * n..(j + 1) * n];
            cholesky_solve(&self.factor, rhs, col);
            for x in col.iter_mut() {
                *x = -*x;
            }
            col[j] += 1.0;
        }
    }

    /// `x = A P`. `x` must already be `A.rows x dof`.
    pub(crate) fn apply(&self, a: &NativeMatrix, x: &mut NativeMatrix) {
        let ld = x.nrows;
        kernels::gemm(1.0, a.operand(), self.projector.operand(), 0.0, x.as_mut_slice(), ld);
    }
}
