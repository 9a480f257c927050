use super::*;
use crate::{MatrixError, NativeMatrix};

fn approx_eq(a: f64, b: f64, tol: f64) {
    assert!(
        (a - b).abs() < tol,
        "expected {} ≈ {} (diff = {}, tol = {})",
        a,
        b,
        (a - b).abs(),
        tol
    );
}

fn assert_matrix_approx(actual: &NativeMatrix, expected: &NativeMatrix, tol: f64) {
    assert_eq!(actual.shape(), expected.shape());
    for i in 0..expected.nrows() {
        for j in 0..expected.ncols() {
            approx_eq(actual[(i, j)], expected[(i, j)], tol);
        }
    }
}

fn f3() -> NativeMatrix {
    NativeMatrix::from_rows(3, 3, &[1.0, 0.1, 0.005, 0.0, 1.0, 0.1, 0.2, -0.3, 0.9])
}

fn p3() -> NativeMatrix {
    NativeMatrix::from_rows(3, 3, &[2.0, 0.3, -0.1, 0.3, 1.5, 0.2, -0.1, 0.2, 1.0])
}

/// Copy of `p` with the strict lower triangle overwritten.
fn with_junk_lower(p: &NativeMatrix) -> NativeMatrix {
    let mut out = p.clone();
    for j in 0..p.ncols() {
        for i in j + 1..p.nrows() {
            out[(i, j)] = 1.0e6;
        }
    }
    out
}

// ── predict_error_covariance ────────────────────────────────────────

#[test]
fn predict_matches_dense_product() {
    let f = f3();
    let p = p3();
    let q = NativeMatrix::from_column(&[0.01, 0.02, 0.03]);

    let mut fp = NativeMatrix::new(0, 0);
    fp.mult(&f, &p).unwrap();
    let mut expected = NativeMatrix::new(0, 0);
    expected.mult_trans_b(&fp, &f).unwrap();
    for i in 0..3 {
        expected[(i, i)] += q[(i, 0)];
    }

    let mut actual = NativeMatrix::new(0, 0);
    predict_error_covariance(&mut actual, &f, &p, &q).unwrap();
    assert_matrix_approx(&actual, &expected, 1e-12);
}

#[test]
fn predict_uses_only_noise_diagonal() {
    let f = f3();
    let p = p3();
    let q_vec = NativeMatrix::from_column(&[0.01, 0.02, 0.03]);
    let q_mat = NativeMatrix::from_rows(3, 3, &[0.01, 5.0, 5.0, 5.0, 0.02, 5.0, 5.0, 5.0, 0.03]);

    let mut a = NativeMatrix::new(0, 0);
    predict_error_covariance(&mut a, &f, &p, &q_vec).unwrap();
    let mut b = NativeMatrix::new(0, 0);
    predict_error_covariance(&mut b, &f, &p, &q_mat).unwrap();
    assert_eq!(a, b);
}

#[test]
fn predict_reads_upper_triangle() {
    let f = f3();
    let q = NativeMatrix::from_column(&[0.0, 0.0, 0.0]);
    let mut a = NativeMatrix::new(0, 0);
    predict_error_covariance(&mut a, &f, &p3(), &q).unwrap();
    let mut b = NativeMatrix::new(0, 0);
    predict_error_covariance(&mut b, &f, &with_junk_lower(&p3()), &q).unwrap();
    assert_eq!(a, b);
}

#[test]
fn predict_rejects_bad_shapes() {
    let mut dst = NativeMatrix::eye(2);
    let q = NativeMatrix::from_column(&[0.1, 0.1, 0.1]);
    assert!(matches!(
        predict_error_covariance(&mut dst, &NativeMatrix::new(3, 2), &p3(), &q),
        Err(MatrixError::NotSquare { .. })
    ));
    assert!(predict_error_covariance(&mut dst, &f3(), &NativeMatrix::eye(2), &q).is_err());
    assert!(predict_error_covariance(&mut dst, &f3(), &p3(), &NativeMatrix::new(3, 2)).is_err());
    assert!(predict_error_covariance(&mut dst, &f3(), &p3(), &NativeMatrix::new(2, 1)).is_err());
    assert_eq!(dst, NativeMatrix::eye(2));
}

// ── compute_kalman_gain ─────────────────────────────────────────────

#[test]
fn gain_scalar() {
    let p = NativeMatrix::from_rows(1, 1, &[2.0]);
    let h = NativeMatrix::from_rows(1, 1, &[1.0]);
    let r = NativeMatrix::from_column(&[2.0]);
    let mut k = NativeMatrix::new(0, 0);
    compute_kalman_gain(&mut k, &p, &h, &r).unwrap();
    assert_eq!(k.shape(), (1, 1));
    approx_eq(k[(0, 0)], 0.5, 1e-15);
}

#[test]
fn gain_matches_dense_formula() {
    let p = p3();
    let h = NativeMatrix::from_rows(2, 3, &[1.0, 0.0, 0.5, 0.0, 1.0, -0.2]);
    let r = NativeMatrix::from_column(&[0.4, 0.7]);

    let mut pht = NativeMatrix::new(0, 0);
    pht.mult_trans_b(&p, &h).unwrap();
    let mut s = NativeMatrix::new(0, 0);
    s.mult(&h, &pht).unwrap();
    s[(0, 0)] += 0.4;
    s[(1, 1)] += 0.7;
    let mut s_inv = NativeMatrix::new(0, 0);
    s_inv.invert(&s).unwrap();
    let mut expected = NativeMatrix::new(0, 0);
    expected.mult(&pht, &s_inv).unwrap();

    let mut k = NativeMatrix::new(0, 0);
    compute_kalman_gain(&mut k, &with_junk_lower(&p), &h, &r).unwrap();
    assert_eq!(k.shape(), (3, 2));
    assert_matrix_approx(&k, &expected, 1e-12);
}

#[test]
fn gain_rejects_bad_shapes() {
    let h = NativeMatrix::from_rows(1, 3, &[1.0, 0.0, 0.0]);
    let mut k = NativeMatrix::from_column(&[9.0]);
    assert!(compute_kalman_gain(&mut k, &p3(), &h, &NativeMatrix::new(2, 1)).is_err());
    assert!(compute_kalman_gain(&mut k, &p3(), &h, &NativeMatrix::new(1, 2)).is_err());
    assert!(compute_kalman_gain(&mut k, &NativeMatrix::eye(2), &h, &NativeMatrix::new(1, 1)).is_err());
    assert_eq!(k, NativeMatrix::from_column(&[9.0]));
}

// ── update_state ────────────────────────────────────────────────────

#[test]
fn update_state_with_zero_gain_is_exact() {
    let x = NativeMatrix::from_column(&[0.1, -2.5, 1.0e-17]);
    let k = NativeMatrix::new(3, 2);
    let r = NativeMatrix::from_column(&[3.0, -4.0]);
    let mut next = NativeMatrix::new(0, 0);
    update_state(&mut next, &x, &k, &r).unwrap();
    assert_eq!(next, x);
}

#[test]
fn update_state_adds_correction() {
    let x = NativeMatrix::from_column(&[1.0, 2.0]);
    let k = NativeMatrix::from_rows(2, 2, &[0.5, 0.0, 0.25, 1.0]);
    let r = NativeMatrix::from_column(&[2.0, -1.0]);
    let mut next = NativeMatrix::new(5, 5);
    update_state(&mut next, &x, &k, &r).unwrap();
    assert_eq!(next.shape(), (2, 1));
    approx_eq(next[(0, 0)], 2.0, 1e-15);
    approx_eq(next[(1, 0)], 1.5, 1e-15);
}

#[test]
fn update_state_rejects_bad_shapes() {
    let x = NativeMatrix::from_column(&[1.0, 2.0]);
    let mut next = NativeMatrix::eye(1);
    assert!(update_state(&mut next, &x, &NativeMatrix::new(3, 1), &NativeMatrix::new(1, 1)).is_err());
    assert!(update_state(&mut next, &x, &NativeMatrix::new(2, 2), &NativeMatrix::new(3, 1)).is_err());
    assert!(update_state(&mut next, &NativeMatrix::new(2, 2), &NativeMatrix::new(2, 1), &NativeMatrix::new(1, 1)).is_err());
    assert_eq!(next, NativeMatrix::eye(1));
}

// ── update_error_covariance ─────────────────────────────────────────

#[test]
fn update_covariance_matches_dense_formula() {
    let p = p3();
    let k = NativeMatrix::from_rows(3, 2, &[0.3, 0.1, -0.2, 0.4, 0.05, 0.0]);
    let h = NativeMatrix::from_rows(2, 3, &[1.0, 0.0, 0.5, 0.0, 1.0, -0.2]);

    let mut ikh = NativeMatrix::eye(3);
    ikh.mult_add_scaled(-1.0, &k, &h).unwrap();
    let mut expected = NativeMatrix::new(0, 0);
    expected.mult(&ikh, &p).unwrap();

    let mut actual = NativeMatrix::new(0, 0);
    update_error_covariance(&mut actual, &k, &h, &with_junk_lower(&p)).unwrap();
    assert_matrix_approx(&actual, &expected, 1e-12);
}

#[test]
fn update_covariance_rejects_bad_shapes() {
    let k = NativeMatrix::new(3, 2);
    let mut dst = NativeMatrix::new(0, 0);
    assert!(update_error_covariance(&mut dst, &k, &NativeMatrix::new(1, 3), &p3()).is_err());
    assert!(update_error_covariance(&mut dst, &k, &NativeMatrix::new(2, 2), &p3()).is_err());
    assert!(update_error_covariance(&mut dst, &k, &NativeMatrix::new(2, 3), &NativeMatrix::eye(2)).is_err());
    assert_eq!(dst.shape(), (0, 0));
}

// ── Full cycle ──────────────────────────────────────────────────────

#[test]
fn filter_converges_on_constant_position() {
    let f = NativeMatrix::eye(1);
    let h = NativeMatrix::eye(1);
    let q = NativeMatrix::from_column(&[1e-6]);
    let r = NativeMatrix::from_column(&[0.1]);

    let mut x = NativeMatrix::from_column(&[0.0]);
    let mut p = NativeMatrix::from_rows(1, 1, &[10.0]);
    let mut p_pred = NativeMatrix::new(0, 0);
    let mut k = NativeMatrix::new(0, 0);
    let mut next = NativeMatrix::new(0, 0);

    for _ in 0..50 {
        predict_error_covariance(&mut p_pred, &f, &p, &q).unwrap();
        compute_kalman_gain(&mut k, &p_pred, &h, &r).unwrap();
        let innovation = NativeMatrix::from_column(&[3.0 - x[(0, 0)]]);
        update_state(&mut next, &x, &k, &innovation).unwrap();
        x.set_from(&next);
        update_error_covariance(&mut p, &k, &h, &p_pred).unwrap();
    }

    approx_eq(x[(0, 0)], 3.0, 1e-2);
    assert!(p[(0, 0)] < 0.01);
}
