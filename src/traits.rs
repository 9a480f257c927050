use core::fmt::Debug;
use num_traits::Float;

/// Trait for floating-point matrix elements.
///
/// Required by the factorization kernels (`sqrt`, `abs`, `epsilon`).
/// Blanket-implemented for `f32` and `f64`.
pub trait FloatScalar: Float + Debug {}

impl<T: Float + Debug> FloatScalar for T {}

/// Read-only access to a column-major matrix-like type.
///
/// This trait allows the factorization kernels in [`crate::linalg`] to operate
/// on any dense column-major container, including scratch buffers.
pub trait MatrixRef<T> {
    fn nrows(&self) -> usize;
    fn ncols(&self) -> usize;
    fn get(&self, row: usize, col: usize) -> &T;

    /// Contiguous slice `[row_start..nrows]` of column `col`.
    fn col_as_slice(&self, col: usize, row_start: usize) -> &[T];
}

/// Mutable access to a column-major matrix-like type.
///
/// Extends `MatrixRef` with mutable element access, enabling
/// in-place algorithms (Cholesky, LU, QR) to work generically.
pub trait MatrixMut<T>: MatrixRef<T> {
    fn get_mut(&mut self, row: usize, col: usize) -> &mut T;

    /// Mutable contiguous slice `[row_start..nrows]` of column `col`.
    fn col_as_mut_slice(&mut self, col: usize, row_start: usize) -> &mut [T];

    /// Mutable sub-column slices of two different columns at once.
    ///
    /// Returns `(m[row_start.., col_a], m[row_start.., col_b])`.
    /// Panics if `col_a == col_b`.
    fn col_pair_mut(&mut self, col_a: usize, col_b: usize, row_start: usize)
        -> (&mut [T], &mut [T]);
}
