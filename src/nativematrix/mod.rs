mod block;
mod ops;
mod rows;
mod solve;
mod storage;
mod util;

pub use block::Block;
pub(crate) use solve::NullspaceScratch;

use core::ops::{Index, IndexMut};

use thiserror::Error;

use crate::linalg::LinalgError;
use crate::traits::{MatrixMut, MatrixRef};
use storage::Storage;

/// Value returned by [`NativeMatrix::get`] for out-of-bounds reads.
pub const NAN_SENTINEL: f64 = f64::NAN;

/// `(rows, cols)` pair.
pub type Shape = (usize, usize);

/// Contract violations and numerical failures reported by matrix operations.
///
/// Every operation validates its inputs before touching the destination, so an
/// `Err` always leaves the destination exactly as it was.
///
/// ```
/// use numeris_native::{MatrixError, NativeMatrix};
///
/// let a = NativeMatrix::new(2, 3);
/// let b = NativeMatrix::new(2, 3);
/// let mut c = NativeMatrix::new(0, 0);
/// assert!(matches!(c.mult(&a, &b), Err(MatrixError::Incompatible { .. })));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MatrixError {
    /// Operand shapes do not satisfy the operation's dimension contract.
    #[error("incompatible operands for {op}: {lhs:?} and {rhs:?}")]
    Incompatible {
        op: &'static str,
        lhs: Shape,
        rhs: Shape,
    },
    /// Operation requires a square operand.
    #[error("{op} requires a square matrix, got {shape:?}")]
    NotSquare { op: &'static str, shape: Shape },
    /// Accumulating destination does not have the result's shape.
    #[error("destination is {got:?}, expected {expected:?}")]
    ShapeMismatch { expected: Shape, got: Shape },
    /// Element or row/column index outside the active view.
    #[error("index ({row}, {col}) out of bounds for {shape:?} matrix")]
    IndexOutOfBounds { row: usize, col: usize, shape: Shape },
    /// Sub-region does not fit inside the matrix.
    #[error("block {block:?} out of bounds for {shape:?} matrix")]
    BlockOutOfBounds { block: Block, shape: Shape },
    /// External buffer is too short for the requested shape.
    #[error("buffer of length {len} cannot hold a {shape:?} matrix")]
    BufferLength { len: usize, shape: Shape },
    /// Reinterpretation needs more elements than storage holds.
    #[error("{requested} elements exceed storage capacity {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },
    /// `rows * cols` does not fit in `usize`.
    #[error("{nrows}x{ncols} element count overflows usize")]
    SizeOverflow { nrows: usize, ncols: usize },
    /// Failure reported by a factorization kernel.
    #[error(transparent)]
    Linalg(#[from] LinalgError),
}

/// Outcome of [`NativeMatrix::resize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resize {
    /// Shape was already the requested one.
    Unchanged,
    /// Shape fit in existing capacity; only the view moved.
    Reinterpreted,
    /// Storage was replaced; previous contents are gone.
    Reallocated,
}

/// Dense `f64` matrix: owned column-major storage plus a `(rows, cols)` view.
///
/// The view covers the first `rows * cols` elements of storage. Shrinking the
/// view never releases storage, so repeated resize/reuse cycles in a hot loop
/// stop allocating once the largest shape has been seen.
///
/// # Examples
///
/// ```
/// use numeris_native::NativeMatrix;
///
/// let a = NativeMatrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
/// assert_eq!(a[(0, 1)], 2.0);
/// assert_eq!(a.nrows(), 2);
/// assert!(a.get(5, 5).is_nan());
///
/// let mut b = NativeMatrix::eye(3);
/// b.resize(2, 2);
/// assert_eq!(b.capacity(), 9);
/// ```
#[derive(Debug, Clone, Default)]
pub struct NativeMatrix {
    storage: Storage,
    nrows: usize,
    ncols: usize,
}

/// `nrows * ncols`, or [`MatrixError::SizeOverflow`].
pub(crate) fn element_count(nrows: usize, ncols: usize) -> Result<usize, MatrixError> {
    nrows
        .checked_mul(ncols)
        .ok_or(MatrixError::SizeOverflow { nrows, ncols })
}

fn checked_len(nrows: usize, ncols: usize) -> usize {
    match element_count(nrows, ncols) {
        Ok(len) => len,
        Err(e) => panic!("{e}"),
    }
}

// ── Constructors ────────────────────────────────────────────────────

impl NativeMatrix {
    /// Create a zero-filled `nrows x ncols` matrix with exactly that capacity.
    ///
    /// # Panics
    /// If `nrows * ncols` overflows `usize`.
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            storage: Storage::zeroed(checked_len(nrows, ncols)),
            nrows,
            ncols,
        }
    }

    /// Create an `n x n` identity matrix.
    ///
    /// ```
    /// use numeris_native::NativeMatrix;
    /// let id = NativeMatrix::eye(3);
    /// assert_eq!(id[(1, 1)], 1.0);
    /// assert_eq!(id[(0, 2)], 0.0);
    /// ```
    pub fn eye(n: usize) -> Self {
        let mut m = Self::new(n, n);
        for i in 0..n {
            m[(i, i)] = 1.0;
        }
        m
    }

    /// Create a matrix from a row-major slice.
    ///
    /// Panics if `data.len() != nrows * ncols`.
    pub fn from_rows(nrows: usize, ncols: usize, data: &[f64]) -> Self {
        assert_eq!(data.len(), nrows * ncols, "slice length must equal nrows * ncols");
        Self::from_fn(nrows, ncols, |i, j| data[i * ncols + j])
    }

    /// Create a single-column matrix.
    ///
    /// ```
    /// use numeris_native::NativeMatrix;
    /// let v = NativeMatrix::from_column(&[1.0, 2.0, 3.0]);
    /// assert_eq!(v.shape(), (3, 1));
    /// ```
    pub fn from_column(data: &[f64]) -> Self {
        Self::from_fn(data.len(), 1, |i, _| data[i])
    }

    /// Create a matrix by evaluating `f(row, col)` for every element.
    pub fn from_fn(nrows: usize, ncols: usize, f: impl Fn(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(nrows * ncols);
        for j in 0..ncols {
            for i in 0..nrows {
                data.push(f(i, j));
            }
        }
        Self {
            storage: Storage::from_vec(data),
            nrows,
            ncols,
        }
    }
}

// ── Shape & storage ─────────────────────────────────────────────────

impl NativeMatrix {
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        (self.nrows, self.ncols)
    }

    /// Number of elements in the active view.
    #[inline]
    pub fn len(&self) -> usize {
        self.nrows * self.ncols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements held by storage. Always `>= len()`.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.nrows == self.ncols
    }

    /// Active elements in column-major order.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        self.storage.prefix(self.len())
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        let len = self.len();
        self.storage.prefix_mut(len)
    }

    /// Change the view to `nrows x ncols`.
    ///
    /// Within capacity only the view is re-anchored and the bytes are left as
    /// they were, so the old layout no longer matches the new shape. Beyond
    /// capacity storage is reallocated to exactly the new size and zeroed.
    ///
    /// # Panics
    /// If `nrows * ncols` overflows `usize`; the matrix is left unchanged.
    ///
    /// ```
    /// use numeris_native::{NativeMatrix, Resize};
    /// let mut m = NativeMatrix::new(3, 3);
    /// assert_eq!(m.resize(3, 3), Resize::Unchanged);
    /// assert_eq!(m.resize(2, 4), Resize::Reinterpreted);
    /// assert_eq!(m.resize(4, 4), Resize::Reallocated);
    /// ```
    pub fn resize(&mut self, nrows: usize, ncols: usize) -> Resize {
        if self.shape() == (nrows, ncols) {
            return Resize::Unchanged;
        }
        let len = checked_len(nrows, ncols);
        let kind = if len > self.storage.capacity() {
            self.storage.reallocate(len);
            Resize::Reallocated
        } else {
            Resize::Reinterpreted
        };
        self.nrows = nrows;
        self.ncols = ncols;
        kind
    }

    /// Reinterpret the view as `nrows x ncols` without touching storage.
    ///
    /// Fails if the new shape needs more elements than the current capacity.
    pub fn reshape(&mut self, nrows: usize, ncols: usize) -> Result<(), MatrixError> {
        let requested = element_count(nrows, ncols)?;
        if requested > self.storage.capacity() {
            return Err(MatrixError::CapacityExceeded {
                requested,
                capacity: self.storage.capacity(),
            });
        }
        self.nrows = nrows;
        self.ncols = ncols;
        Ok(())
    }

    /// Grow capacity to at least `len` elements, keeping the active data.
    pub fn reserve(&mut self, len: usize) {
        self.storage.grow_preserving(len);
    }

    /// Resize to `shape` unless that would be a no-op.
    #[inline]
    pub(crate) fn resize_to(&mut self, shape: Shape) {
        self.resize(shape.0, shape.1);
    }

    /// Ok if the current shape equals `expected`.
    pub(crate) fn expect_shape(&self, expected: Shape) -> Result<(), MatrixError> {
        if self.shape() == expected {
            Ok(())
        } else {
            Err(MatrixError::ShapeMismatch {
                expected,
                got: self.shape(),
            })
        }
    }

    /// Ok if the matrix is square.
    pub(crate) fn expect_square(&self, op: &'static str) -> Result<(), MatrixError> {
        if self.is_square() {
            Ok(())
        } else {
            Err(MatrixError::NotSquare {
                op,
                shape: self.shape(),
            })
        }
    }
}

// ── Element access ──────────────────────────────────────────────────

impl NativeMatrix {
    #[inline]
    fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.nrows && col < self.ncols
    }

    fn out_of_bounds(&self, row: usize, col: usize) -> MatrixError {
        MatrixError::IndexOutOfBounds {
            row,
            col,
            shape: self.shape(),
        }
    }

    /// Element `(row, col)`, or [`NAN_SENTINEL`] when out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        if self.in_bounds(row, col) {
            self.as_slice()[col * self.nrows + row]
        } else {
            NAN_SENTINEL
        }
    }

    /// Set element `(row, col)`. Out-of-bounds writes fail without mutating.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<(), MatrixError> {
        if !self.in_bounds(row, col) {
            return Err(self.out_of_bounds(row, col));
        }
        self[(row, col)] = value;
        Ok(())
    }

    /// `self[(row, col)] += value`, with the same bounds rule as [`set`](Self::set).
    pub fn add_at(&mut self, row: usize, col: usize, value: f64) -> Result<(), MatrixError> {
        if !self.in_bounds(row, col) {
            return Err(self.out_of_bounds(row, col));
        }
        self[(row, col)] += value;
        Ok(())
    }

    /// Resize to `nrows x ncols` and copy from a row-major buffer.
    ///
    /// ```
    /// use numeris_native::NativeMatrix;
    /// let mut m = NativeMatrix::new(0, 0);
    /// m.copy_from_row_major(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
    /// assert_eq!(m[(1, 0)], 4.0);
    /// ```
    pub fn copy_from_row_major(
        &mut self,
        buf: &[f64],
        nrows: usize,
        ncols: usize,
    ) -> Result<(), MatrixError> {
        if buf.len() < nrows * ncols {
            return Err(MatrixError::BufferLength {
                len: buf.len(),
                shape: (nrows, ncols),
            });
        }
        self.resize(nrows, ncols);
        let data = self.as_mut_slice();
        for j in 0..ncols {
            for i in 0..nrows {
                data[j * nrows + i] = buf[i * ncols + j];
            }
        }
        Ok(())
    }

    /// Copy into a row-major buffer. `(nrows, ncols)` must equal the current shape.
    pub fn copy_to_row_major(
        &self,
        buf: &mut [f64],
        nrows: usize,
        ncols: usize,
    ) -> Result<(), MatrixError> {
        self.expect_shape((nrows, ncols))?;
        if buf.len() < nrows * ncols {
            return Err(MatrixError::BufferLength {
                len: buf.len(),
                shape: (nrows, ncols),
            });
        }
        let data = self.as_slice();
        for i in 0..nrows {
            for j in 0..ncols {
                buf[i * ncols + j] = data[j * nrows + i];
            }
        }
        Ok(())
    }

    /// Row-major copy of the active view.
    pub fn to_row_major(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.len()];
        let data = self.as_slice();
        for i in 0..self.nrows {
            for j in 0..self.ncols {
                out[i * self.ncols + j] = data[j * self.nrows + i];
            }
        }
        out
    }

    /// Copy `other` into `self`, resizing to its shape.
    pub fn set_from(&mut self, other: &NativeMatrix) {
        self.resize_to(other.shape());
        self.as_mut_slice().copy_from_slice(other.as_slice());
    }
}

// ── MatrixRef / MatrixMut ───────────────────────────────────────────

impl MatrixRef<f64> for NativeMatrix {
    #[inline]
    fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> &f64 {
        &self[(row, col)]
    }

    #[inline]
    fn col_as_slice(&self, col: usize, row_start: usize) -> &[f64] {
        let n = self.nrows;
        &self.as_slice()[col * n + row_start..col * n + n]
    }
}

impl MatrixMut<f64> for NativeMatrix {
    #[inline]
    fn get_mut(&mut self, row: usize, col: usize) -> &mut f64 {
        &mut self[(row, col)]
    }

    #[inline]
    fn col_as_mut_slice(&mut self, col: usize, row_start: usize) -> &mut [f64] {
        let n = self.nrows;
        &mut self.as_mut_slice()[col * n + row_start..col * n + n]
    }

    fn col_pair_mut(
        &mut self,
        col_a: usize,
        col_b: usize,
        row_start: usize,
    ) -> (&mut [f64], &mut [f64]) {
        assert_ne!(col_a, col_b, "column pair must be two distinct columns");
        let n = self.nrows;
        let data = self.as_mut_slice();
        let (lo_col, hi_col) = if col_a < col_b { (col_a, col_b) } else { (col_b, col_a) };
        let (lo, hi) = data.split_at_mut(hi_col * n);
        let lo = &mut lo[lo_col * n + row_start..lo_col * n + n];
        let hi = &mut hi[row_start..n];
        if col_a < col_b {
            (lo, hi)
        } else {
            (hi, lo)
        }
    }
}

// ── Index ───────────────────────────────────────────────────────────

impl Index<(usize, usize)> for NativeMatrix {
    type Output = f64;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        assert!(
            self.in_bounds(row, col),
            "index ({row}, {col}) out of bounds for {}x{} matrix",
            self.nrows,
            self.ncols
        );
        &self.as_slice()[col * self.nrows + row]
    }
}

impl IndexMut<(usize, usize)> for NativeMatrix {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        assert!(
            self.in_bounds(row, col),
            "index ({row}, {col}) out of bounds for {}x{} matrix",
            self.nrows,
            self.ncols
        );
        let n = self.nrows;
        &mut self.as_mut_slice()[col * n + row]
    }
}

/// Equality compares shape and active elements; spare capacity is ignored.
impl PartialEq for NativeMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.as_slice() == other.as_slice()
    }
}
