//! Kalman filter steps on dynamically sized matrices.
//!
//! Free functions, destination first. Covariances are read through their
//! upper triangle only, so callers may keep just that half up to date.
//! Each function validates every operand shape before touching `dst`, then
//! resizes `dst` to the result shape.
//!
//! # One predict/update cycle
//!
//! ```
//! use numeris_native::estimate::{
//!     compute_kalman_gain, predict_error_covariance, update_error_covariance, update_state,
//! };
//! use numeris_native::NativeMatrix;
//!
//! // 2-state constant-velocity, 1 measurement (position only)
//! let dt = 0.1;
//! let f = NativeMatrix::from_rows(2, 2, &[1.0, dt, 0.0, 1.0]);
//! let h = NativeMatrix::from_rows(1, 2, &[1.0, 0.0]);
//! let q = NativeMatrix::from_column(&[0.01, 0.01]);
//! let r = NativeMatrix::from_column(&[0.5]);
//!
//! let x = NativeMatrix::from_column(&[0.1, 1.0]); // already propagated
//! let p = NativeMatrix::eye(2);
//!
//! let mut p_pred = NativeMatrix::new(0, 0);
//! predict_error_covariance(&mut p_pred, &f, &p, &q).unwrap();
//!
//! let mut k = NativeMatrix::new(0, 0);
//! compute_kalman_gain(&mut k, &p_pred, &h, &r).unwrap();
//!
//! let innovation = NativeMatrix::from_column(&[0.12 - x[(0, 0)]]);
//! let mut x_next = NativeMatrix::new(0, 0);
//! update_state(&mut x_next, &x, &k, &innovation).unwrap();
//!
//! let mut p_next = NativeMatrix::new(0, 0);
//! update_error_covariance(&mut p_next, &k, &h, &p_pred).unwrap();
//!
//! assert!(x_next[(0, 0)] > 0.1 && x_next[(0, 0)] < 0.12);
//! assert!(p_next[(0, 0)] < p_pred[(0, 0)]);
//! ```

mod kalman;

#[cfg(test)]
mod tests;

pub use kalman::{compute_kalman_gain, predict_error_covariance, update_error_covariance, update_state};
