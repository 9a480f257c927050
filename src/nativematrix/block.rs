use super::{MatrixError, NativeMatrix, Shape};
use crate::kernels::{self, Operand};

/// Rectangular sub-region: `rows x cols` elements starting at `(row, col)`.
///
/// ```
/// use numeris_native::{Block, NativeMatrix};
///
/// let src = NativeMatrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
/// let mut dst = NativeMatrix::new(3, 3);
/// dst.insert(&src, Block::new(0, 1, 2, 1), 1, 1).unwrap();
/// assert_eq!(dst[(1, 1)], 2.0);
/// assert_eq!(dst[(2, 1)], 4.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Block {
    pub row: usize,
    pub col: usize,
    pub rows: usize,
    pub cols: usize,
}

impl Block {
    pub const fn new(row: usize, col: usize, rows: usize, cols: usize) -> Self {
        Self { row, col, rows, cols }
    }

    /// Block spanning rows `y0..y1` and columns `x0..x1` (exclusive ends).
    ///
    /// Returns `None` if either range is reversed.
    pub fn spanning(y0: usize, y1: usize, x0: usize, x1: usize) -> Option<Self> {
        Some(Self::new(y0, x0, y1.checked_sub(y0)?, x1.checked_sub(x0)?))
    }

    /// The whole of `m`.
    pub fn of(m: &NativeMatrix) -> Self {
        Self::new(0, 0, m.nrows(), m.ncols())
    }

    /// Same extent, anchored at `(row, col)`.
    pub const fn at(self, row: usize, col: usize) -> Self {
        Self { row, col, ..self }
    }

    #[inline]
    pub const fn shape(&self) -> Shape {
        (self.rows, self.cols)
    }

    /// `true` if the block lies inside a `shape` matrix.
    pub fn fits(&self, shape: Shape) -> bool {
        let end_row = self.row.checked_add(self.rows);
        let end_col = self.col.checked_add(self.cols);
        matches!((end_row, end_col), (Some(r), Some(c)) if r <= shape.0 && c <= shape.1)
    }

    pub(crate) fn check(self, shape: Shape) -> Result<(), MatrixError> {
        if self.fits(shape) {
            Ok(())
        } else {
            Err(MatrixError::BlockOutOfBounds { block: self, shape })
        }
    }
}

// ── Block primitives ────────────────────────────────────────────────

impl NativeMatrix {
    /// Visit every element of `dst` (already validated) as `f(i, j, &mut x)`
    /// with `(i, j)` relative to the block origin.
    fn for_each_in_block(&mut self, dst: Block, mut f: impl FnMut(usize, usize, &mut f64)) {
        let ld = self.nrows;
        let data = self.as_mut_slice();
        for j in 0..dst.cols {
            let start = (dst.col + j) * ld + dst.row;
            for (i, x) in data[start..start + dst.rows].iter_mut().enumerate() {
                f(i, j, x);
            }
        }
    }

    /// Column-major slice starting at the block origin, plus leading dimension.
    fn block_target(&mut self, dst: Block) -> (&mut [f64], usize) {
        let ld = self.nrows;
        let offset = dst.col * ld + dst.row;
        (&mut self.as_mut_slice()[offset..], ld)
    }

    /// Validate a copy of `src` (inside a `src_shape` source) to `(dst_row, dst_col)`.
    fn check_transfer(&self, src: Block, src_shape: Shape, dst_row: usize, dst_col: usize) -> Result<Block, MatrixError> {
        src.check(src_shape)?;
        let dst = src.at(dst_row, dst_col);
        dst.check(self.shape())?;
        Ok(dst)
    }

    fn combine_block(
        &mut self,
        a: &NativeMatrix,
        src: Block,
        dst_row: usize,
        dst_col: usize,
        f: impl Fn(&mut f64, f64),
    ) -> Result<(), MatrixError> {
        let dst = self.check_transfer(src, a.shape(), dst_row, dst_col)?;
        let s = a.as_slice();
        let lda = a.nrows;
        self.for_each_in_block(dst, |i, j, x| f(x, s[(src.col + j) * lda + src.row + i]));
        Ok(())
    }
}

// ── Block copy & accumulate ─────────────────────────────────────────

impl NativeMatrix {
    /// Copy block `src` of `a` into `self` at `(dst_row, dst_col)`.
    pub fn insert(&mut self, a: &NativeMatrix, src: Block, dst_row: usize, dst_col: usize) -> Result<(), MatrixError> {
        self.combine_block(a, src, dst_row, dst_col, |x, v| *x = v)
    }

    /// Copy `alpha *` block `src` of `a` into `self` at `(dst_row, dst_col)`.
    pub fn insert_scaled(
        &mut self,
        a: &NativeMatrix,
        src: Block,
        dst_row: usize,
        dst_col: usize,
        alpha: f64,
    ) -> Result<(), MatrixError> {
        self.combine_block(a, src, dst_row, dst_col, |x, v| *x = alpha * v)
    }

    /// `self[dst] += alpha * a[src]`, where `dst` is `src` moved to `(dst_row, dst_col)`.
    pub fn add_block(
        &mut self,
        a: &NativeMatrix,
        src: Block,
        dst_row: usize,
        dst_col: usize,
        alpha: f64,
    ) -> Result<(), MatrixError> {
        self.combine_block(a, src, dst_row, dst_col, |x, v| *x += alpha * v)
    }

    /// `self[dst] -= a[src]`.
    pub fn subtract_block(&mut self, a: &NativeMatrix, src: Block, dst_row: usize, dst_col: usize) -> Result<(), MatrixError> {
        self.combine_block(a, src, dst_row, dst_col, |x, v| *x -= v)
    }

    /// Copy block `src` of a `rows x cols` row-major buffer into `self`.
    pub fn insert_row_major(
        &mut self,
        buf: &[f64],
        rows: usize,
        cols: usize,
        src: Block,
        dst_row: usize,
        dst_col: usize,
    ) -> Result<(), MatrixError> {
        self.insert_row_major_scaled(buf, rows, cols, src, dst_row, dst_col, 1.0)
    }

    /// Copy `alpha *` block `src` of a `rows x cols` row-major buffer into `self`.
    #[allow(clippy::too_many_arguments)]
    pub fn insert_row_major_scaled(
        &mut self,
        buf: &[f64],
        rows: usize,
        cols: usize,
        src: Block,
        dst_row: usize,
        dst_col: usize,
        alpha: f64,
    ) -> Result<(), MatrixError> {
        if buf.len() < rows * cols {
            return Err(MatrixError::BufferLength {
                len: buf.len(),
                shape: (rows, cols),
            });
        }
        let dst = self.check_transfer(src, (rows, cols), dst_row, dst_col)?;
        self.for_each_in_block(dst, |i, j, x| *x = alpha * buf[(src.row + i) * cols + src.col + j]);
        Ok(())
    }

    /// Copy block `src` of `self` into a `rows x cols` row-major buffer at `(dst_row, dst_col)`.
    #[allow(clippy::too_many_arguments)]
    pub fn extract(
        &self,
        src: Block,
        buf: &mut [f64],
        rows: usize,
        cols: usize,
        dst_row: usize,
        dst_col: usize,
    ) -> Result<(), MatrixError> {
        if buf.len() < rows * cols {
            return Err(MatrixError::BufferLength {
                len: buf.len(),
                shape: (rows, cols),
            });
        }
        src.check(self.shape())?;
        src.at(dst_row, dst_col).check((rows, cols))?;
        let data = self.as_slice();
        for i in 0..src.rows {
            for j in 0..src.cols {
                buf[(dst_row + i) * cols + dst_col + j] = data[(src.col + j) * self.nrows + src.row + i];
            }
        }
        Ok(())
    }

    /// Write a 3x3 row-major array at `(row, col)`.
    pub fn insert_3x3(&mut self, row: usize, col: usize, m: &[[f64; 3]; 3]) -> Result<(), MatrixError> {
        self.insert_3x3_scaled(row, col, m, 1.0)
    }

    /// Write `alpha *` a 3x3 row-major array at `(row, col)`.
    pub fn insert_3x3_scaled(&mut self, row: usize, col: usize, m: &[[f64; 3]; 3], alpha: f64) -> Result<(), MatrixError> {
        let dst = Block::new(row, col, 3, 3);
        dst.check(self.shape())?;
        self.for_each_in_block(dst, |i, j, x| *x = alpha * m[i][j]);
        Ok(())
    }

    /// Write `[x, y, z]` as a 1x3 row at `(row, col)`.
    pub fn insert_tuple_row(&mut self, row: usize, col: usize, tuple: [f64; 3]) -> Result<(), MatrixError> {
        let dst = Block::new(row, col, 1, 3);
        dst.check(self.shape())?;
        self.for_each_in_block(dst, |_, j, x| *x = tuple[j]);
        Ok(())
    }

    /// Set every element of `block` to `value`.
    pub fn fill_block(&mut self, block: Block, value: f64) -> Result<(), MatrixError> {
        block.check(self.shape())?;
        self.for_each_in_block(block, |_, _, x| *x = value);
        Ok(())
    }

    /// Set `len` diagonal elements starting at `(row, col)` to `value`.
    pub fn fill_diagonal(&mut self, row: usize, col: usize, len: usize, value: f64) -> Result<(), MatrixError> {
        let block = Block::new(row, col, len, len);
        block.check(self.shape())?;
        self.for_each_in_block(block, |i, j, x| {
            if i == j {
                *x = value;
            }
        });
        Ok(())
    }

    /// `self[block] *= alpha`.
    pub fn scale_block(&mut self, block: Block, alpha: f64) -> Result<(), MatrixError> {
        block.check(self.shape())?;
        self.for_each_in_block(block, |_, _, x| *x *= alpha);
        Ok(())
    }
}

// ── Block products ──────────────────────────────────────────────────

impl NativeMatrix {
    fn product_block(
        &mut self,
        op: &'static str,
        alpha: f64,
        a: Operand<'_>,
        b: Operand<'_>,
        row: usize,
        col: usize,
    ) -> Result<(), MatrixError> {
        if a.op_cols() != b.op_rows() {
            return Err(MatrixError::Incompatible {
                op,
                lhs: (a.op_rows(), a.op_cols()),
                rhs: (b.op_rows(), b.op_cols()),
            });
        }
        let dst = Block::new(row, col, a.op_rows(), b.op_cols());
        dst.check(self.shape())?;
        if dst.rows == 0 || dst.cols == 0 {
            return Ok(());
        }
        let (c, ld) = self.block_target(dst);
        kernels::gemm(alpha, a, b, 1.0, c, ld);
        Ok(())
    }

    fn quad_block(&mut self, op: &'static str, a: &NativeMatrix, b: &NativeMatrix, row: usize, col: usize, beta: f64) -> Result<(), MatrixError> {
        let (n, _) = Self::quad_shape(op, a, b)?;
        let dst = Block::new(row, col, n, n);
        dst.check(self.shape())?;
        if n == 0 {
            return Ok(());
        }
        let (c, ld) = self.block_target(dst);
        kernels::quad(a.operand(), b.operand(), beta, c, ld);
        Ok(())
    }

    /// `self[row.., col..] += A * B` over an `A.rows x B.cols` block.
    pub fn mult_add_block(&mut self, a: &NativeMatrix, b: &NativeMatrix, row: usize, col: usize) -> Result<(), MatrixError> {
        self.product_block("mult_add_block", 1.0, a.operand(), b.operand(), row, col)
    }

    pub fn mult_add_block_scaled(
        &mut self,
        alpha: f64,
        a: &NativeMatrix,
        b: &NativeMatrix,
        row: usize,
        col: usize,
    ) -> Result<(), MatrixError> {
        self.product_block("mult_add_block", alpha, a.operand(), b.operand(), row, col)
    }

    /// `self[row.., col..] += A^T * B` over an `A.cols x B.cols` block.
    pub fn mult_add_block_trans_a(&mut self, a: &NativeMatrix, b: &NativeMatrix, row: usize, col: usize) -> Result<(), MatrixError> {
        self.product_block("mult_add_block_trans_a", 1.0, a.operand().t(), b.operand(), row, col)
    }

    pub fn mult_add_block_trans_a_scaled(
        &mut self,
        alpha: f64,
        a: &NativeMatrix,
        b: &NativeMatrix,
        row: usize,
        col: usize,
    ) -> Result<(), MatrixError> {
        self.product_block("mult_add_block_trans_a", alpha, a.operand().t(), b.operand(), row, col)
    }

    /// `self[row.., col..] = A^T * B * A` over an `A.cols x A.cols` block.
    pub fn mult_quad_block(&mut self, a: &NativeMatrix, b: &NativeMatrix, row: usize, col: usize) -> Result<(), MatrixError> {
        self.quad_block("mult_quad_block", a, b, row, col, 0.0)
    }

    /// `self[row.., col..] += A^T * B * A`.
    pub fn mult_add_quad_block(&mut self, a: &NativeMatrix, b: &NativeMatrix, row: usize, col: usize) -> Result<(), MatrixError> {
        self.quad_block("mult_add_quad_block", a, b, row, col, 1.0)
    }
}

// ── Row / column gather ─────────────────────────────────────────────

impl NativeMatrix {
    /// Copy rows `src_rows` of `source`, in the given order, into consecutive
    /// rows of `self` starting at `dst_row`.
    ///
    /// Every index is validated before anything is written.
    pub fn extract_rows(&mut self, source: &NativeMatrix, src_rows: &[usize], dst_row: usize) -> Result<(), MatrixError> {
        for &r in src_rows {
            Block::new(r, 0, 1, source.ncols).check(source.shape())?;
        }
        Block::new(dst_row, 0, src_rows.len(), source.ncols).check(self.shape())?;
        for (k, &r) in src_rows.iter().enumerate() {
            self.insert(source, Block::new(r, 0, 1, source.ncols), dst_row + k, 0)?;
        }
        Ok(())
    }

    /// Copy columns `src_cols` of `source`, in the given order, into consecutive
    /// columns of `self` starting at `dst_col`.
    pub fn extract_columns(&mut self, source: &NativeMatrix, src_cols: &[usize], dst_col: usize) -> Result<(), MatrixError> {
        for &c in src_cols {
            Block::new(0, c, source.nrows, 1).check(source.shape())?;
        }
        Block::new(0, dst_col, source.nrows, src_cols.len()).check(self.shape())?;
        for (k, &c) in src_cols.iter().enumerate() {
            self.insert(source, Block::new(0, c, source.nrows, 1), 0, dst_col + k)?;
        }
        Ok(())
    }
}
