use super::{MatrixError, NativeMatrix, Shape};
use crate::kernels::{self, Operand};

impl NativeMatrix {
    #[inline]
    pub(crate) fn operand(&self) -> Operand<'_> {
        Operand::new(self.as_slice(), self.nrows, self.ncols)
    }

    /// Run `C = beta * C + alpha * op(A) * op(B)` over the whole of `self`.
    fn gemm_into(&mut self, alpha: f64, a: Operand<'_>, b: Operand<'_>, beta: f64) {
        let ld = self.nrows;
        kernels::gemm(alpha, a, b, beta, self.as_mut_slice(), ld);
    }

    /// Shape of `op(A) * op(B)`, or the contract violation.
    fn product_shape(op: &'static str, a: Operand<'_>, b: Operand<'_>) -> Result<Shape, MatrixError> {
        if a.op_cols() != b.op_rows() {
            return Err(MatrixError::Incompatible {
                op,
                lhs: (a.op_rows(), a.op_cols()),
                rhs: (b.op_rows(), b.op_cols()),
            });
        }
        Ok((a.op_rows(), b.op_cols()))
    }

    fn product(&mut self, op: &'static str, alpha: f64, a: Operand<'_>, b: Operand<'_>) -> Result<(), MatrixError> {
        let shape = Self::product_shape(op, a, b)?;
        self.resize_to(shape);
        self.gemm_into(alpha, a, b, 0.0);
        Ok(())
    }

    fn product_add(&mut self, op: &'static str, alpha: f64, a: Operand<'_>, b: Operand<'_>) -> Result<(), MatrixError> {
        let shape = Self::product_shape(op, a, b)?;
        self.expect_shape(shape)?;
        self.gemm_into(alpha, a, b, 1.0);
        Ok(())
    }

    /// Shape of `A^T B A`, requiring `B` square and `A.rows == B.cols`.
    pub(crate) fn quad_shape(op: &'static str, a: &NativeMatrix, b: &NativeMatrix) -> Result<Shape, MatrixError> {
        b.expect_square(op)?;
        if a.nrows != b.ncols {
            return Err(MatrixError::Incompatible {
                op,
                lhs: a.shape(),
                rhs: b.shape(),
            });
        }
        Ok((a.ncols, a.ncols))
    }

    fn same_shape(op: &'static str, a: &NativeMatrix, b: &NativeMatrix) -> Result<(), MatrixError> {
        if a.shape() != b.shape() {
            return Err(MatrixError::Incompatible {
                op,
                lhs: a.shape(),
                rhs: b.shape(),
            });
        }
        Ok(())
    }
}

// ── Element-wise ────────────────────────────────────────────────────

impl NativeMatrix {
    /// `self = A + B`, resizing to their common shape.
    pub fn add(&mut self, a: &NativeMatrix, b: &NativeMatrix) -> Result<(), MatrixError> {
        Self::same_shape("add", a, b)?;
        self.resize_to(a.shape());
        for ((c, x), y) in self.as_mut_slice().iter_mut().zip(a.as_slice()).zip(b.as_slice()) {
            *c = x + y;
        }
        Ok(())
    }

    /// `self = A - B`, resizing to their common shape.
    pub fn subtract(&mut self, a: &NativeMatrix, b: &NativeMatrix) -> Result<(), MatrixError> {
        Self::same_shape("subtract", a, b)?;
        self.resize_to(a.shape());
        for ((c, x), y) in self.as_mut_slice().iter_mut().zip(a.as_slice()).zip(b.as_slice()) {
            *c = x - y;
        }
        Ok(())
    }

    /// `self += A`. Shapes must already match.
    pub fn add_equals(&mut self, a: &NativeMatrix) -> Result<(), MatrixError> {
        self.expect_shape(a.shape())?;
        kernels::axpy(self.as_mut_slice(), 1.0, a.as_slice());
        Ok(())
    }

    /// `self -= A`. Shapes must already match.
    pub fn subtract_equals(&mut self, a: &NativeMatrix) -> Result<(), MatrixError> {
        self.expect_shape(a.shape())?;
        kernels::axpy(self.as_mut_slice(), -1.0, a.as_slice());
        Ok(())
    }

    /// `self += alpha * A`. Shapes must already match.
    pub fn add_equals_scaled(&mut self, alpha: f64, a: &NativeMatrix) -> Result<(), MatrixError> {
        self.expect_shape(a.shape())?;
        kernels::axpy(self.as_mut_slice(), alpha, a.as_slice());
        Ok(())
    }

    /// `self = alpha * A`, resizing to `A`'s shape.
    pub fn set_scaled(&mut self, alpha: f64, a: &NativeMatrix) {
        self.resize_to(a.shape());
        for (c, x) in self.as_mut_slice().iter_mut().zip(a.as_slice()) {
            *c = alpha * x;
        }
    }

    /// `self *= alpha`.
    pub fn scale(&mut self, alpha: f64) {
        for x in self.as_mut_slice().iter_mut() {
            *x *= alpha;
        }
    }

    /// `self = A^T`, resizing to `A.cols x A.rows`.
    ///
    /// ```
    /// use numeris_native::NativeMatrix;
    /// let a = NativeMatrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    /// let mut t = NativeMatrix::new(0, 0);
    /// t.transpose(&a);
    /// assert_eq!(t.shape(), (3, 2));
    /// assert_eq!(t[(2, 1)], 6.0);
    /// ```
    pub fn transpose(&mut self, a: &NativeMatrix) {
        let (m, n) = a.shape();
        self.resize(n, m);
        let src = a.as_slice();
        let dst = self.as_mut_slice();
        for j in 0..n {
            for i in 0..m {
                dst[i * n + j] = src[j * m + i];
            }
        }
    }
}

// ── Products ────────────────────────────────────────────────────────

impl NativeMatrix {
    /// `self = A * B`, resizing to `A.rows x B.cols`.
    ///
    /// ```
    /// use numeris_native::NativeMatrix;
    /// let a = NativeMatrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
    /// let b = NativeMatrix::from_column(&[1.0, 1.0]);
    /// let mut c = NativeMatrix::new(0, 0);
    /// c.mult(&a, &b).unwrap();
    /// assert_eq!(c.as_slice(), &[3.0, 7.0]);
    /// ```
    pub fn mult(&mut self, a: &NativeMatrix, b: &NativeMatrix) -> Result<(), MatrixError> {
        self.product("mult", 1.0, a.operand(), b.operand())
    }

    /// `self = alpha * A * B`.
    pub fn mult_scaled(&mut self, alpha: f64, a: &NativeMatrix, b: &NativeMatrix) -> Result<(), MatrixError> {
        self.product("mult", alpha, a.operand(), b.operand())
    }

    /// `self = A^T * B`, requiring `A.rows == B.rows`.
    pub fn mult_trans_a(&mut self, a: &NativeMatrix, b: &NativeMatrix) -> Result<(), MatrixError> {
        self.product("mult_trans_a", 1.0, a.operand().t(), b.operand())
    }

    pub fn mult_trans_a_scaled(&mut self, alpha: f64, a: &NativeMatrix, b: &NativeMatrix) -> Result<(), MatrixError> {
        self.product("mult_trans_a", alpha, a.operand().t(), b.operand())
    }

    /// `self = A * B^T`, requiring `A.cols == B.cols`.
    pub fn mult_trans_b(&mut self, a: &NativeMatrix, b: &NativeMatrix) -> Result<(), MatrixError> {
        self.product("mult_trans_b", 1.0, a.operand(), b.operand().t())
    }

    pub fn mult_trans_b_scaled(&mut self, alpha: f64, a: &NativeMatrix, b: &NativeMatrix) -> Result<(), MatrixError> {
        self.product("mult_trans_b", alpha, a.operand(), b.operand().t())
    }

    /// `self += A * B`. `self` must already be `A.rows x B.cols`.
    pub fn mult_add(&mut self, a: &NativeMatrix, b: &NativeMatrix) -> Result<(), MatrixError> {
        self.product_add("mult_add", 1.0, a.operand(), b.operand())
    }

    pub fn mult_add_scaled(&mut self, alpha: f64, a: &NativeMatrix, b: &NativeMatrix) -> Result<(), MatrixError> {
        self.product_add("mult_add", alpha, a.operand(), b.operand())
    }

    /// `self += A^T * B`.
    pub fn mult_add_trans_a(&mut self, a: &NativeMatrix, b: &NativeMatrix) -> Result<(), MatrixError> {
        self.product_add("mult_add_trans_a", 1.0, a.operand().t(), b.operand())
    }

    pub fn mult_add_trans_a_scaled(
        &mut self,
        alpha: f64,
        a: &NativeMatrix,
        b: &NativeMatrix,
    ) -> Result<(), MatrixError> {
        self.product_add("mult_add_trans_a", alpha, a.operand().t(), b.operand())
    }

    /// `self += A * B^T`.
    pub fn mult_add_trans_b(&mut self, a: &NativeMatrix, b: &NativeMatrix) -> Result<(), MatrixError> {
        self.product_add("mult_add_trans_b", 1.0, a.operand(), b.operand().t())
    }

    pub fn mult_add_trans_b_scaled(
        &mut self,
        alpha: f64,
        a: &NativeMatrix,
        b: &NativeMatrix,
    ) -> Result<(), MatrixError> {
        self.product_add("mult_add_trans_b", alpha, a.operand(), b.operand().t())
    }

    /// Quadratic form `self = A^T * B * A`, resizing to `A.cols x A.cols`.
    ///
    /// Requires `B` square with `A.rows == B.cols`. Used to push a symmetric
    /// matrix through a Jacobian.
    pub fn mult_quad(&mut self, a: &NativeMatrix, b: &NativeMatrix) -> Result<(), MatrixError> {
        let shape = Self::quad_shape("mult_quad", a, b)?;
        self.resize_to(shape);
        let ld = self.nrows;
        kernels::quad(a.operand(), b.operand(), 0.0, self.as_mut_slice(), ld);
        Ok(())
    }

    /// `self += A^T * B * A`. `self` must already be `A.cols x A.cols`.
    pub fn mult_add_quad(&mut self, a: &NativeMatrix, b: &NativeMatrix) -> Result<(), MatrixError> {
        let shape = Self::quad_shape("mult_add_quad", a, b)?;
        self.expect_shape(shape)?;
        let ld = self.nrows;
        kernels::quad(a.operand(), b.operand(), 1.0, self.as_mut_slice(), ld);
        Ok(())
    }
}
