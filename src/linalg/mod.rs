//! Dense factorization kernels.
//!
//! Free functions operate in place on `&mut impl MatrixMut<T>`, so they work on
//! any column-major container. The unchecked kernels ([`lu_in_place`],
//! [`cholesky_in_place`], [`qr_in_place`]) never test for singularity: a
//! degenerate input yields Inf/NaN in the factors and in every solve built on
//! them. [`full_piv_lu_in_place`] is the guarded path and the only kernel that
//! reports [`LinalgError::Singular`].

pub(crate) mod cholesky;
pub(crate) mod full_piv_lu;
pub(crate) mod lu;
pub(crate) mod qr;

pub use cholesky::{back_substitute_lt, cholesky_in_place, cholesky_solve, forward_substitute};
pub use full_piv_lu::{full_piv_lu_in_place, full_piv_lu_solve};
pub use lu::{lu_in_place, lu_solve};
pub use qr::{qr_in_place, qr_solve};

use thiserror::Error;

/// Errors from linear algebra kernels.
///
/// ```
/// use numeris_native::NativeMatrix;
/// use numeris_native::linalg::{full_piv_lu_in_place, LinalgError};
///
/// let mut singular = NativeMatrix::from_rows(2, 2, &[1.0, 2.0, 2.0, 4.0]);
/// let (mut rp, mut cp) = ([0; 2], [0; 2]);
/// assert_eq!(
///     full_piv_lu_in_place(&mut singular, &mut rp, &mut cp),
///     Err(LinalgError::Singular)
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LinalgError {
    /// Matrix is singular or numerically rank-deficient.
    #[error("matrix is singular")]
    Singular,
}
