//! # numeris-native
//!
//! Dense `f64` matrix kernel for real-time estimation and control loops.
//! Matrices own column-major storage that is reused across resizes, every
//! operation writes into a caller-provided destination, and the whole API is
//! also exported over a C ABI.
//!
//! ## Quick start
//!
//! ```
//! use numeris_native::NativeMatrix;
//!
//! // Solve a linear system Ax = b
//! let a = NativeMatrix::from_rows(3, 3, &[
//!     2.0, 1.0, -1.0,
//!     -3.0, -1.0, 2.0,
//!     -2.0, 1.0, 2.0,
//! ]);
//! let b = NativeMatrix::from_column(&[8.0, -11.0, -3.0]);
//! let mut x = NativeMatrix::new(0, 0);
//! x.solve_check(&a, &b).unwrap(); // x = [2, 3, -1]
//! assert!((x[(1, 0)] - 3.0).abs() < 1e-12);
//! ```
//!
//! ## Modules
//!
//! - [`nativematrix`] — [`NativeMatrix`]: owned storage plus a `(rows, cols)`
//!   view. Element access, row-major buffer transfer, structural edits,
//!   reductions, element-wise arithmetic, the `mult` family, quadratic forms,
//!   [`Block`] operations and factorization-based solves. All operations
//!   validate before mutating and report [`MatrixError`].
//!
//! - [`linalg`] — In-place LU (partial and full pivoting), Cholesky and
//!   Householder QR as free functions on `&mut impl MatrixMut<T>`.
//!
//! - [`estimate`] — Kalman filter steps: covariance prediction, gain,
//!   state and covariance update.
//!
//! - [`nullspace`] — [`NullspaceProjector`], damped nullspace projection with
//!   reusable scratch.
//!
//! - [`capi`] — `extern "C"` boundary over opaque handles.
//!
//! - [`traits`] — [`MatrixRef`] / [`MatrixMut`] column access used by the
//!   factorization kernels.
//!
//! ## Cargo features
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `capi`  | yes     | `extern "C"` entry points (`nm_*`) for the `cdylib` target |
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`] facade: `trace` for storage
//! reallocation, `debug` for singular `solve_check` systems and rejected C
//! calls. No logger is installed by the library.

pub mod estimate;
mod kernels;
pub mod linalg;
pub mod nativematrix;
pub mod nullspace;
pub mod traits;

#[cfg(feature = "capi")]
pub mod capi;

pub use nativematrix::{Block, MatrixError, NativeMatrix, Resize, Shape, NAN_SENTINEL};
pub use nullspace::NullspaceProjector;
pub use traits::{FloatScalar, MatrixMut, MatrixRef};
