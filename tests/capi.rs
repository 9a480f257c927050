#![cfg(feature = "capi")]

use std::ptr;

use numeris_native::capi::*;
use numeris_native::NativeMatrix;

/// Owned handle that releases itself.
struct Handle(*mut NativeMatrix);

impl Handle {
    fn from_rows(rows: usize, cols: usize, data: &[f64]) -> Self {
        let h = Handle(nm_create(0, 0));
        assert!(unsafe { nm_set_from_buffer(h.0, data.as_ptr(), rows, cols) });
        h
    }

    fn to_rows(&self) -> Vec<f64> {
        unsafe {
            let (rows, cols) = (nm_rows(self.0), nm_cols(self.0));
            let mut out = vec![0.0; rows * cols];
            assert!(nm_get_to_buffer(self.0, out.as_mut_ptr(), rows, cols));
            out
        }
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        unsafe { nm_destroy(self.0) }
    }
}

#[test]
fn create_and_query() {
    let h = Handle(nm_create(2, 3));
    assert!(!h.0.is_null());
    unsafe {
        assert_eq!(nm_rows(h.0), 2);
        assert_eq!(nm_cols(h.0), 3);
        assert_eq!(nm_size(h.0), 6);
        assert_eq!(nm_capacity(h.0), 6);
        assert_eq!(nm_sum(h.0), 0.0);

        assert!(nm_resize(h.0, 1, 2));
        assert_eq!(nm_capacity(h.0), 6);
        assert!(nm_set(h.0, 0, 1, 4.0));
        assert!(!nm_set(h.0, 1, 1, 4.0));
        assert_eq!(nm_get(h.0, 0, 1), 4.0);
        assert!(nm_get(h.0, 5, 5).is_nan());
        assert_eq!(nm_max(h.0), 4.0);
        assert_eq!(nm_min(h.0), 0.0);
        assert_eq!(nm_prod(h.0), 0.0);
        assert!(!nm_contains_nan(h.0));
    }
}

#[test]
fn grow_rows_overflow_is_reported() {
    let h = Handle(nm_create(5, 0));
    unsafe {
        assert!(!nm_grow_rows(h.0, usize::MAX));
        assert_eq!(nm_rows(h.0), 5);
        assert_eq!(nm_cols(h.0), 0);

        assert!(nm_grow_rows(h.0, 2));
        assert_eq!(nm_rows(h.0), 7);
    }

    let m = Handle::from_rows(1, 2, &[1.0, 2.0]);
    unsafe {
        assert!(!nm_grow_rows(m.0, usize::MAX / 2));
        assert!(!nm_reshape(m.0, usize::MAX, 2));
    }
    assert_eq!(m.to_rows(), vec![1.0, 2.0]);
}

#[test]
fn null_handles_are_rejected() {
    let null = ptr::null_mut::<NativeMatrix>();
    let h = Handle(nm_create(2, 2));
    unsafe {
        assert_eq!(nm_rows(null), 0);
        assert!(nm_sum(null).is_nan());
        assert!(nm_get(null, 0, 0).is_nan());
        assert!(!nm_zero(null));
        assert!(!nm_mult(h.0, null, h.0));
        assert!(!nm_mult(null, h.0, h.0));
        assert!(!nm_set_from_buffer(h.0, ptr::null(), 2, 2));
        assert!(!nm_is_approx(h.0, null, 1.0));
        nm_destroy(null);
        nm_nullspace_destroy(ptr::null_mut());
    }
}

#[test]
fn buffers_are_row_major() {
    let h = Handle::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    unsafe {
        assert_eq!(nm_get(h.0, 0, 2), 3.0);
        assert_eq!(nm_get(h.0, 1, 0), 4.0);

        let mut wrong = [0.0; 6];
        assert!(!nm_get_to_buffer(h.0, wrong.as_mut_ptr(), 3, 2));
        assert_eq!(wrong, [0.0; 6]);
    }
    assert_eq!(h.to_rows(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
}

#[test]
fn mult_rejects_mismatch_without_mutating() {
    let a = Handle::from_rows(2, 3, &[1.0; 6]);
    let b = Handle::from_rows(2, 3, &[1.0; 6]);
    let c = Handle::from_rows(1, 1, &[7.0]);
    assert!(!unsafe { nm_mult(c.0, a.0, b.0) });
    assert_eq!(c.to_rows(), vec![7.0]);
}

#[test]
fn aliased_destination_matches_unaliased() {
    let data = [1.0, 2.0, 3.0, 4.0];
    let a = Handle::from_rows(2, 2, &data);
    let b = Handle::from_rows(2, 2, &[0.5, -1.0, 2.0, 0.0]);

    let expected = Handle(nm_create(0, 0));
    assert!(unsafe { nm_mult(expected.0, a.0, b.0) });

    let aliased = Handle::from_rows(2, 2, &data);
    assert!(unsafe { nm_mult(aliased.0, aliased.0, b.0) });
    assert_eq!(aliased.to_rows(), expected.to_rows());

    let squared = Handle::from_rows(2, 2, &data);
    assert!(unsafe { nm_mult(squared.0, squared.0, squared.0) });
    assert_eq!(squared.to_rows(), vec![7.0, 10.0, 15.0, 22.0]);

    let t = Handle::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert!(unsafe { nm_transpose(t.0, t.0) });
    assert_eq!(t.to_rows(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
}

#[test]
fn block_operations() {
    let dst = Handle(nm_create(3, 3));
    let src = Handle::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
    unsafe {
        assert!(nm_insert(dst.0, src.0, 0, 2, 1, 2, 1, 0));
        assert!(!nm_insert(dst.0, src.0, 2, 0, 0, 1, 0, 0));
        assert!(!nm_insert(dst.0, src.0, 0, 2, 0, 2, 2, 2));
        assert!(nm_add_block(dst.0, src.0, 0, 1, 0, 0, 1, 2, 10.0));
        assert!(nm_fill_diagonal(dst.0, 2, 2, 1, -1.0));
    }
    assert_eq!(dst.to_rows(), vec![0.0, 10.0, 20.0, 2.0, 0.0, 0.0, 4.0, 0.0, -1.0]);

    let mut buf = [0.0; 4];
    unsafe {
        assert!(nm_extract(dst.0, 0, 1, 1, 3, buf.as_mut_ptr(), 2, 2, 1, 0));
    }
    assert_eq!(buf, [0.0, 0.0, 10.0, 20.0]);

    let m = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
    let big = Handle(nm_create(4, 4));
    unsafe {
        assert!(nm_insert_3x3(big.0, 1, 1, m.as_ptr()));
        assert!(!nm_insert_3x3(big.0, 2, 2, m.as_ptr()));
        assert_eq!(nm_get(big.0, 3, 3), 9.0);
        assert!(nm_insert_tuple_row(big.0, 0, 0, 1.0, 2.0, 3.0));
        assert_eq!(nm_get(big.0, 0, 2), 3.0);
    }
}

#[test]
fn solve_check_reports_singular() {
    let a = Handle(nm_create(2, 2));
    let b = Handle::from_rows(2, 1, &[1.0, 1.0]);
    let x = Handle(nm_create(0, 0));
    unsafe {
        assert!(!nm_solve_check(x.0, a.0, b.0));
        assert_eq!(nm_rows(x.0), 2);
        assert!(nm_contains_nan(x.0));

        assert!(nm_set_from_buffer(a.0, [2.0, 0.0, 0.0, 4.0].as_ptr(), 2, 2));
        assert!(nm_solve_check(x.0, a.0, b.0));
    }
    assert_eq!(x.to_rows(), vec![0.5, 0.25]);
}

#[test]
fn kalman_cycle() {
    let f = Handle::from_rows(1, 1, &[1.0]);
    let h = Handle::from_rows(1, 1, &[1.0]);
    let p = Handle::from_rows(1, 1, &[1.0]);
    let q = Handle::from_rows(1, 1, &[1.0]);
    let r = Handle::from_rows(1, 1, &[2.0]);
    let k = Handle(nm_create(0, 0));
    let x = Handle::from_rows(1, 1, &[0.0]);
    let innovation = Handle::from_rows(1, 1, &[4.0]);
    unsafe {
        assert!(nm_predict_error_covariance(p.0, f.0, p.0, q.0));
        assert_eq!(nm_get(p.0, 0, 0), 2.0);
        assert!(nm_compute_kalman_gain(k.0, p.0, h.0, r.0));
        assert_eq!(nm_get(k.0, 0, 0), 0.5);
        assert!(nm_update_state(x.0, x.0, k.0, innovation.0));
        assert_eq!(nm_get(x.0, 0, 0), 2.0);
        assert!(nm_update_error_covariance(p.0, k.0, h.0, p.0));
        assert_eq!(nm_get(p.0, 0, 0), 1.0);
    }
}

#[test]
fn nullspace_projector_handle() {
    let projector = nm_nullspace_create(3);
    assert!(!projector.is_null());
    let a = Handle::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let id = Handle::from_rows(3, 3, &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
    let x = Handle(nm_create(0, 0));
    unsafe {
        assert!(nm_nullspace_project(projector, a.0, id.0, x.0, 0.0));
        assert_eq!(nm_rows(x.0), 2);
        assert!(nm_sum(x.0).abs() < 1e-12);

        let wrong = Handle(nm_create(2, 2));
        assert!(!nm_nullspace_project(projector, a.0, wrong.0, x.0, 0.0));
        assert!(!nm_nullspace_project(ptr::null_mut(), a.0, id.0, x.0, 0.0));
        nm_nullspace_destroy(projector);
    }
}
