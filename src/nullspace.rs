//! Nullspace projection with reusable scratch.
//!
//! [`NativeMatrix::project_on_nullspace`] allocates its `dof x dof` workspace
//! on every call. [`NullspaceProjector`] owns that workspace so a control loop
//! projecting against a fixed number of degrees of freedom allocates once.

use log::trace;

use crate::nativematrix::NullspaceScratch;
use crate::{MatrixError, NativeMatrix};

/// Projects matrices onto the approximate nullspace of a constraint matrix.
///
/// `project` computes `x = A (I - (BᵀB + α²I)⁻¹ BᵀB)`, where `B` is the
/// constraint matrix and `α` the damping. With `α = 0` and full-column-rank
/// `B` the result is zero; rank-deficient `B` needs `α > 0`.
///
/// ```
/// use numeris_native::{NativeMatrix, NullspaceProjector};
///
/// let mut projector = NullspaceProjector::new(2);
/// let b = NativeMatrix::from_rows(1, 2, &[1.0, 0.0]);
/// let a = NativeMatrix::from_rows(1, 2, &[3.0, 4.0]);
/// let mut x = NativeMatrix::new(0, 0);
/// projector.project(&a, &b, &mut x, 1e-6).unwrap();
/// assert!(x[(0, 0)].abs() < 1e-9);
/// assert!((x[(0, 1)] - 4.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct NullspaceProjector {
    dof: usize,
    scratch: NullspaceScratch,
}

impl NullspaceProjector {
    /// Create a projector for constraint matrices with `dof` columns.
    pub fn new(dof: usize) -> Self {
        trace!("nullspace projector: {dof}x{dof} scratch");
        Self {
            dof,
            scratch: NullspaceScratch::new(dof),
        }
    }

    #[inline]
    pub fn dof(&self) -> usize {
        self.dof
    }

    /// `x = A (I - (BᵀB + α²I)⁻¹ BᵀB)`.
    ///
    /// Requires `B.cols == dof` and `A.cols == dof`. `x` is resized to
    /// `A.rows x dof`; on error it is left untouched.
    pub fn project(
        &mut self,
        a: &NativeMatrix,
        b: &NativeMatrix,
        x: &mut NativeMatrix,
        alpha: f64,
    ) -> Result<(), MatrixError> {
        if b.ncols() != self.dof {
            return Err(MatrixError::Incompatible {
                op: "nullspace_project",
                lhs: (self.dof, self.dof),
                rhs: b.shape(),
            });
        }
        if a.ncols() != self.dof {
            return Err(MatrixError::Incompatible {
                op: "nullspace_project",
                lhs: a.shape(),
                rhs: b.shape(),
            });
        }

        self.scratch.build(b, alpha);
        x.resize(a.nrows(), self.dof);
        self.scratch.apply(a, x);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_constraint_projects_to_zero() {
        let mut projector = NullspaceProjector::new(3);
        let a = NativeMatrix::from_rows(2, 3, &[1.0, -2.0, 3.0, 0.5, 5.0, -6.0]);
        let mut x = NativeMatrix::new(0, 0);
        projector.project(&a, &NativeMatrix::eye(3), &mut x, 0.0).unwrap();
        assert_eq!(x.shape(), (2, 3));
        assert!(x.is_approx(&NativeMatrix::new(2, 3), 1e-12));
    }

    #[test]
    fn matches_one_shot_projection() {
        let b = NativeMatrix::from_rows(2, 3, &[1.0, 1.0, 0.0, 0.0, 1.0, 1.0]);
        let a = NativeMatrix::from_rows(1, 3, &[1.0, 2.0, 3.0]);
        let mut projector = NullspaceProjector::new(3);
        let mut x = NativeMatrix::new(0, 0);
        projector.project(&a, &b, &mut x, 1e-3).unwrap();

        let mut expected = NativeMatrix::new(0, 0);
        expected.project_on_nullspace(&a, &b, 1e-3).unwrap();
        assert!(x.is_approx(&expected, 1e-12));
    }

    #[test]
    fn result_is_orthogonal_to_constraints() {
        // nullspace of B is spanned by [1, -1, 1]
        let b = NativeMatrix::from_rows(2, 3, &[1.0, 1.0, 0.0, 0.0, 1.0, 1.0]);
        let a = NativeMatrix::from_rows(1, 3, &[1.0, 2.0, 3.0]);
        let mut projector = NullspaceProjector::new(3);
        let mut x = NativeMatrix::new(0, 0);
        projector.project(&a, &b, &mut x, 1e-3).unwrap();

        // a · n / |n|² * n = (1 - 2 + 3) / 3 * [1, -1, 1], biased by O(α²)
        let k = 2.0 / 3.0;
        assert!(x.is_approx(&NativeMatrix::from_rows(1, 3, &[k, -k, k]), 1e-5));
    }

    #[test]
    fn scratch_is_reused_across_calls() {
        let mut projector = NullspaceProjector::new(2);
        let a = NativeMatrix::from_rows(1, 2, &[3.0, 4.0]);
        let mut x = NativeMatrix::new(0, 0);
        projector.project(&a, &NativeMatrix::eye(2), &mut x, 0.0).unwrap();
        assert!(x.is_approx(&NativeMatrix::new(1, 2), 1e-12));

        let b = NativeMatrix::from_rows(1, 2, &[0.0, 1.0]);
        projector.project(&a, &b, &mut x, 1e-6).unwrap();
        assert!(x.is_approx(&NativeMatrix::from_rows(1, 2, &[3.0, 0.0]), 1e-9));
    }

    #[test]
    fn rejects_wrong_dof() {
        let mut projector = NullspaceProjector::new(2);
        let mut x = NativeMatrix::eye(2);
        assert!(projector
            .project(&NativeMatrix::new(1, 2), &NativeMatrix::eye(3), &mut x, 0.0)
            .is_err());
        assert!(projector
            .project(&NativeMatrix::new(1, 3), &NativeMatrix::eye(2), &mut x, 0.0)
            .is_err());
        assert_eq!(x, NativeMatrix::eye(2));
        assert_eq!(projector.dof(), 2);
    }
}
