//! C ABI over [`NativeMatrix`] and [`NullspaceProjector`].
//!
//! Matrices cross the boundary as opaque `*mut NativeMatrix` handles created
//! by [`nm_create`] and released by [`nm_destroy`]. Operations return `true`
//! on success and `false` on any rejection (null handle, shape mismatch,
//! out-of-bounds block, singular `solve_check`). Rejections are logged at
//! `debug` level; no panic unwinds into the caller.
//!
//! External buffers are row-major regardless of internal storage order.
//! Block ranges use exclusive ends: `src_y0..src_y1` rows, `src_x0..src_x1`
//! columns.
//!
//! A source handle may be the destination handle itself (`nm_mult(h, h, b)`);
//! such a source is copied before the destination is written.
//!
//! # Safety
//!
//! Every handle must be null or a live pointer from [`nm_create`] /
//! [`nm_nullspace_create`]. Buffers must hold at least the stated number of
//! elements. No handle may be used from another thread during a call.

use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::slice;

use log::debug;
use thiserror::Error;

use crate::estimate;
use crate::{Block, MatrixError, NativeMatrix, NullspaceProjector, NAN_SENTINEL};

#[derive(Debug, Error)]
enum CallError {
    #[error("null handle or buffer")]
    Null,
    #[error("reversed block range")]
    ReversedRange,
    #[error("{0}x{1} buffer size overflows usize")]
    Overflow(usize, usize),
    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

// ── Guards ──────────────────────────────────────────────────────────

/// Run `f`, mapping rejections and panics to `fallback`.
fn guarded<R>(op: &'static str, fallback: R, f: impl FnOnce() -> Result<R, CallError>) -> R {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => value,
        Ok(Err(e)) => {
            debug!("{op}: {e}");
            fallback
        }
        Err(_) => {
            debug!("{op}: panicked");
            fallback
        }
    }
}

fn status(op: &'static str, f: impl FnOnce() -> Result<(), CallError>) -> bool {
    guarded(op, false, || f().map(|()| true))
}

unsafe fn handle<'a>(ptr: *const NativeMatrix) -> Result<&'a NativeMatrix, CallError> {
    ptr.as_ref().ok_or(CallError::Null)
}

unsafe fn target<'a>(ptr: *mut NativeMatrix) -> Result<&'a mut NativeMatrix, CallError> {
    ptr.as_mut().ok_or(CallError::Null)
}

/// Borrow `ptr`, or copy it if it is the destination `dst`.
unsafe fn source<'a>(ptr: *const NativeMatrix, dst: *const NativeMatrix) -> Result<Cow<'a, NativeMatrix>, CallError> {
    let m = handle(ptr)?;
    if ptr == dst {
        Ok(Cow::Owned(m.clone()))
    } else {
        Ok(Cow::Borrowed(m))
    }
}

fn buffer_len(rows: usize, cols: usize) -> Result<usize, CallError> {
    rows.checked_mul(cols).ok_or(CallError::Overflow(rows, cols))
}

unsafe fn buffer<'a>(ptr: *const f64, len: usize) -> Result<&'a [f64], CallError> {
    if ptr.is_null() {
        return Err(CallError::Null);
    }
    Ok(slice::from_raw_parts(ptr, len))
}

unsafe fn buffer_mut<'a>(ptr: *mut f64, len: usize) -> Result<&'a mut [f64], CallError> {
    if ptr.is_null() {
        return Err(CallError::Null);
    }
    Ok(slice::from_raw_parts_mut(ptr, len))
}

fn span(y0: usize, y1: usize, x0: usize, x1: usize) -> Result<Block, CallError> {
    Block::spanning(y0, y1, x0, x1).ok_or(CallError::ReversedRange)
}

// ── Lifecycle ───────────────────────────────────────────────────────

/// New zero-filled `rows x cols` matrix. Null if `rows * cols` overflows.
#[no_mangle]
pub extern "C" fn nm_create(rows: usize, cols: usize) -> *mut NativeMatrix {
    guarded("nm_create", ptr::null_mut(), || {
        buffer_len(rows, cols)?;
        Ok(Box::into_raw(Box::new(NativeMatrix::new(rows, cols))))
    })
}

/// Release a matrix. Null is ignored.
///
/// # Safety
/// `h` must be null or a handle from [`nm_create`] not yet destroyed.
#[no_mangle]
pub unsafe extern "C" fn nm_destroy(h: *mut NativeMatrix) {
    if !h.is_null() {
        drop(Box::from_raw(h));
    }
}

// ── Shape & storage ─────────────────────────────────────────────────

macro_rules! shape_query {
    ($name:ident => $method:ident) => {
        /// # Safety
        /// `h` must be null or a live handle. Null yields 0.
        #[no_mangle]
        pub unsafe extern "C" fn $name(h: *const NativeMatrix) -> usize {
            guarded(stringify!($name), 0, || Ok(handle(h)?.$method()))
        }
    };
}

shape_query!(nm_rows => nrows);
shape_query!(nm_cols => ncols);
shape_query!(nm_size => len);
shape_query!(nm_capacity => capacity);

/// Resize the view, reallocating only beyond capacity.
///
/// # Safety
/// `h` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn nm_resize(h: *mut NativeMatrix, rows: usize, cols: usize) -> bool {
    status("nm_resize", || {
        buffer_len(rows, cols)?;
        target(h)?.resize(rows, cols);
        Ok(())
    })
}

/// Reinterpret the view; fails beyond capacity.
///
/// # Safety
/// `h` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn nm_reshape(h: *mut NativeMatrix, rows: usize, cols: usize) -> bool {
    status("nm_reshape", || {
        buffer_len(rows, cols)?;
        Ok(target(h)?.reshape(rows, cols)?)
    })
}

/// # Safety
/// `h` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn nm_reserve(h: *mut NativeMatrix, len: usize) -> bool {
    status("nm_reserve", || {
        target(h)?.reserve(len);
        Ok(())
    })
}

/// # Safety
/// `h` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn nm_grow_rows(h: *mut NativeMatrix, n: usize) -> bool {
    status("nm_grow_rows", || {
        Ok(target(h)?.grow_rows(n)?)
    })
}

/// # Safety
/// `h` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn nm_remove_row(h: *mut NativeMatrix, index: usize) -> bool {
    status("nm_remove_row", || Ok(target(h)?.remove_row(index)?))
}

/// # Safety
/// `h` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn nm_remove_column(h: *mut NativeMatrix, index: usize) -> bool {
    status("nm_remove_column", || Ok(target(h)?.remove_column(index)?))
}

// ── Elements & buffers ──────────────────────────────────────────────

/// Element `(row, col)`; NaN when out of bounds or `h` is null.
///
/// # Safety
/// `h` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn nm_get(h: *const NativeMatrix, row: usize, col: usize) -> f64 {
    guarded("nm_get", NAN_SENTINEL, || Ok(handle(h)?.get(row, col)))
}

/// # Safety
/// `h` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn nm_set(h: *mut NativeMatrix, row: usize, col: usize, value: f64) -> bool {
    status("nm_set", || Ok(target(h)?.set(row, col, value)?))
}

/// # Safety
/// `h` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn nm_add_at(h: *mut NativeMatrix, row: usize, col: usize, value: f64) -> bool {
    status("nm_add_at", || Ok(target(h)?.add_at(row, col, value)?))
}

/// Resize to `rows x cols` and copy from a row-major buffer of that size.
///
/// # Safety
/// `h` must be null or a live handle; `buf` must hold `rows * cols` doubles.
#[no_mangle]
pub unsafe extern "C" fn nm_set_from_buffer(h: *mut NativeMatrix, buf: *const f64, rows: usize, cols: usize) -> bool {
    status("nm_set_from_buffer", || {
        let buf = buffer(buf, buffer_len(rows, cols)?)?;
        Ok(target(h)?.copy_from_row_major(buf, rows, cols)?)
    })
}

/// Copy into a row-major buffer. `rows x cols` must equal the current shape.
///
/// # Safety
/// `h` must be null or a live handle; `buf` must hold `rows * cols` doubles.
#[no_mangle]
pub unsafe extern "C" fn nm_get_to_buffer(h: *const NativeMatrix, buf: *mut f64, rows: usize, cols: usize) -> bool {
    status("nm_get_to_buffer", || {
        let buf = buffer_mut(buf, buffer_len(rows, cols)?)?;
        Ok(handle(h)?.copy_to_row_major(buf, rows, cols)?)
    })
}

/// `dst = src`, resizing `dst`.
///
/// # Safety
/// Both handles must be null or live.
#[no_mangle]
pub unsafe extern "C" fn nm_copy(dst: *mut NativeMatrix, src: *const NativeMatrix) -> bool {
    status("nm_copy", || {
        let src = source(src, dst)?;
        target(dst)?.set_from(&src);
        Ok(())
    })
}

/// # Safety
/// `h` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn nm_zero(h: *mut NativeMatrix) -> bool {
    status("nm_zero", || {
        target(h)?.zero();
        Ok(())
    })
}

/// # Safety
/// `h` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn nm_fill(h: *mut NativeMatrix, value: f64) -> bool {
    status("nm_fill", || {
        target(h)?.fill(value);
        Ok(())
    })
}

// ── Queries ─────────────────────────────────────────────────────────

macro_rules! reduction {
    ($name:ident => $method:ident) => {
        /// # Safety
        /// `h` must be null or a live handle. Null yields NaN.
        #[no_mangle]
        pub unsafe extern "C" fn $name(h: *const NativeMatrix) -> f64 {
            guarded(stringify!($name), NAN_SENTINEL, || Ok(handle(h)?.$method()))
        }
    };
}

reduction!(nm_min => min);
reduction!(nm_max => max);
reduction!(nm_sum => sum);
reduction!(nm_prod => prod);

/// # Safety
/// `h` must be null or a live handle. Null yields `false`.
#[no_mangle]
pub unsafe extern "C" fn nm_contains_nan(h: *const NativeMatrix) -> bool {
    guarded("nm_contains_nan", false, || Ok(handle(h)?.contains_nan()))
}

/// # Safety
/// Both handles must be null or live. Null yields `false`.
#[no_mangle]
pub unsafe extern "C" fn nm_is_approx(a: *const NativeMatrix, b: *const NativeMatrix, precision: f64) -> bool {
    guarded("nm_is_approx", false, || Ok(handle(a)?.is_approx(handle(b)?, precision)))
}

// ── Element-wise ────────────────────────────────────────────────────

macro_rules! binary_op {
    ($name:ident => $method:ident) => {
        /// # Safety
        /// All handles must be null or live.
        #[no_mangle]
        pub unsafe extern "C" fn $name(dst: *mut NativeMatrix, a: *const NativeMatrix, b: *const NativeMatrix) -> bool {
            status(stringify!($name), || {
                let a = source(a, dst)?;
                let b = source(b, dst)?;
                Ok(target(dst)?.$method(&a, &b)?)
            })
        }
    };
}

macro_rules! scaled_binary_op {
    ($name:ident => $method:ident) => {
        /// # Safety
        /// All handles must be null or live.
        #[no_mangle]
        pub unsafe extern "C" fn $name(
            dst: *mut NativeMatrix,
            alpha: f64,
            a: *const NativeMatrix,
            b: *const NativeMatrix,
        ) -> bool {
            status(stringify!($name), || {
                let a = source(a, dst)?;
                let b = source(b, dst)?;
                Ok(target(dst)?.$method(alpha, &a, &b)?)
            })
        }
    };
}

macro_rules! unary_op {
    ($name:ident => $method:ident) => {
        /// # Safety
        /// Both handles must be null or live.
        #[no_mangle]
        pub unsafe extern "C" fn $name(dst: *mut NativeMatrix, a: *const NativeMatrix) -> bool {
            status(stringify!($name), || {
                let a = source(a, dst)?;
                Ok(target(dst)?.$method(&a)?)
            })
        }
    };
}

binary_op!(nm_add => add);
binary_op!(nm_subtract => subtract);
unary_op!(nm_add_equals => add_equals);
unary_op!(nm_subtract_equals => subtract_equals);

/// `dst += alpha * a`.
///
/// # Safety
/// Both handles must be null or live.
#[no_mangle]
pub unsafe extern "C" fn nm_add_equals_scaled(dst: *mut NativeMatrix, alpha: f64, a: *const NativeMatrix) -> bool {
    status("nm_add_equals_scaled", || {
        let a = source(a, dst)?;
        Ok(target(dst)?.add_equals_scaled(alpha, &a)?)
    })
}

/// `dst = alpha * a`.
///
/// # Safety
/// Both handles must be null or live.
#[no_mangle]
pub unsafe extern "C" fn nm_set_scaled(dst: *mut NativeMatrix, alpha: f64, a: *const NativeMatrix) -> bool {
    status("nm_set_scaled", || {
        let a = source(a, dst)?;
        target(dst)?.set_scaled(alpha, &a);
        Ok(())
    })
}

/// `h *= alpha` in place.
///
/// # Safety
/// `h` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn nm_scale(h: *mut NativeMatrix, alpha: f64) -> bool {
    status("nm_scale", || {
        target(h)?.scale(alpha);
        Ok(())
    })
}

/// `dst = aᵀ`.
///
/// # Safety
/// Both handles must be null or live.
#[no_mangle]
pub unsafe extern "C" fn nm_transpose(dst: *mut NativeMatrix, a: *const NativeMatrix) -> bool {
    status("nm_transpose", || {
        let a = source(a, dst)?;
        target(dst)?.transpose(&a);
        Ok(())
    })
}

// ── Products ────────────────────────────────────────────────────────

binary_op!(nm_mult => mult);
binary_op!(nm_mult_trans_a => mult_trans_a);
binary_op!(nm_mult_trans_b => mult_trans_b);
binary_op!(nm_mult_add => mult_add);
binary_op!(nm_mult_add_trans_a => mult_add_trans_a);
binary_op!(nm_mult_add_trans_b => mult_add_trans_b);
binary_op!(nm_mult_quad => mult_quad);
binary_op!(nm_mult_add_quad => mult_add_quad);

scaled_binary_op!(nm_mult_scaled => mult_scaled);
scaled_binary_op!(nm_mult_trans_a_scaled => mult_trans_a_scaled);
scaled_binary_op!(nm_mult_trans_b_scaled => mult_trans_b_scaled);
scaled_binary_op!(nm_mult_add_scaled => mult_add_scaled);
scaled_binary_op!(nm_mult_add_trans_a_scaled => mult_add_trans_a_scaled);
scaled_binary_op!(nm_mult_add_trans_b_scaled => mult_add_trans_b_scaled);

macro_rules! block_product {
    ($name:ident => $method:ident) => {
        /// # Safety
        /// All handles must be null or live.
        #[no_mangle]
        pub unsafe extern "C" fn $name(
            dst: *mut NativeMatrix,
            a: *const NativeMatrix,
            b: *const NativeMatrix,
            row: usize,
            col: usize,
        ) -> bool {
            status(stringify!($name), || {
                let a = source(a, dst)?;
                let b = source(b, dst)?;
                Ok(target(dst)?.$method(&a, &b, row, col)?)
            })
        }
    };
}

macro_rules! scaled_block_product {
    ($name:ident => $method:ident) => {
        /// # Safety
        /// All handles must be null or live.
        #[no_mangle]
        pub unsafe extern "C" fn $name(
            dst: *mut NativeMatrix,
            alpha: f64,
            a: *const NativeMatrix,
            b: *const NativeMatrix,
            row: usize,
            col: usize,
        ) -> bool {
            status(stringify!($name), || {
                let a = source(a, dst)?;
                let b = source(b, dst)?;
                Ok(target(dst)?.$method(alpha, &a, &b, row, col)?)
            })
        }
    };
}

block_product!(nm_mult_add_block => mult_add_block);
block_product!(nm_mult_add_block_trans_a => mult_add_block_trans_a);
block_product!(nm_mult_quad_block => mult_quad_block);
block_product!(nm_mult_add_quad_block => mult_add_quad_block);
scaled_block_product!(nm_mult_add_block_scaled => mult_add_block_scaled);
scaled_block_product!(nm_mult_add_block_trans_a_scaled => mult_add_block_trans_a_scaled);

// ── Blocks ──────────────────────────────────────────────────────────

/// `dst[dst_row.., dst_col..] += alpha * a[src_row.., src_col..]` over `rows x cols`.
///
/// # Safety
/// Both handles must be null or live.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn nm_add_block(
    dst: *mut NativeMatrix,
    a: *const NativeMatrix,
    dst_row: usize,
    dst_col: usize,
    src_row: usize,
    src_col: usize,
    rows: usize,
    cols: usize,
    alpha: f64,
) -> bool {
    status("nm_add_block", || {
        let a = source(a, dst)?;
        let src = Block::new(src_row, src_col, rows, cols);
        Ok(target(dst)?.add_block(&a, src, dst_row, dst_col, alpha)?)
    })
}

/// # Safety
/// Both handles must be null or live.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn nm_subtract_block(
    dst: *mut NativeMatrix,
    a: *const NativeMatrix,
    dst_row: usize,
    dst_col: usize,
    src_row: usize,
    src_col: usize,
    rows: usize,
    cols: usize,
) -> bool {
    status("nm_subtract_block", || {
        let a = source(a, dst)?;
        let src = Block::new(src_row, src_col, rows, cols);
        Ok(target(dst)?.subtract_block(&a, src, dst_row, dst_col)?)
    })
}

/// Copy `alpha * src[src_y0..src_y1, src_x0..src_x1]` to `dst` at `(dst_y0, dst_x0)`.
///
/// # Safety
/// Both handles must be null or live.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn nm_insert_scaled(
    dst: *mut NativeMatrix,
    src: *const NativeMatrix,
    src_y0: usize,
    src_y1: usize,
    src_x0: usize,
    src_x1: usize,
    dst_y0: usize,
    dst_x0: usize,
    alpha: f64,
) -> bool {
    status("nm_insert_scaled", || {
        let src_block = span(src_y0, src_y1, src_x0, src_x1)?;
        let src = source(src, dst)?;
        Ok(target(dst)?.insert_scaled(&src, src_block, dst_y0, dst_x0, alpha)?)
    })
}

/// # Safety
/// Both handles must be null or live.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn nm_insert(
    dst: *mut NativeMatrix,
    src: *const NativeMatrix,
    src_y0: usize,
    src_y1: usize,
    src_x0: usize,
    src_x1: usize,
    dst_y0: usize,
    dst_x0: usize,
) -> bool {
    nm_insert_scaled(dst, src, src_y0, src_y1, src_x0, src_x1, dst_y0, dst_x0, 1.0)
}

/// Copy `alpha *` a block of a `rows x cols` row-major buffer into `dst`.
///
/// # Safety
/// `dst` must be null or live; `buf` must hold `rows * cols` doubles.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn nm_insert_buffer_scaled(
    dst: *mut NativeMatrix,
    buf: *const f64,
    rows: usize,
    cols: usize,
    src_y0: usize,
    src_y1: usize,
    src_x0: usize,
    src_x1: usize,
    dst_y0: usize,
    dst_x0: usize,
    alpha: f64,
) -> bool {
    status("nm_insert_buffer_scaled", || {
        let src_block = span(src_y0, src_y1, src_x0, src_x1)?;
        let buf = buffer(buf, buffer_len(rows, cols)?)?;
        Ok(target(dst)?.insert_row_major_scaled(buf, rows, cols, src_block, dst_y0, dst_x0, alpha)?)
    })
}

/// # Safety
/// `dst` must be null or live; `buf` must hold `rows * cols` doubles.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn nm_insert_buffer(
    dst: *mut NativeMatrix,
    buf: *const f64,
    rows: usize,
    cols: usize,
    src_y0: usize,
    src_y1: usize,
    src_x0: usize,
    src_x1: usize,
    dst_y0: usize,
    dst_x0: usize,
) -> bool {
    nm_insert_buffer_scaled(dst, buf, rows, cols, src_y0, src_y1, src_x0, src_x1, dst_y0, dst_x0, 1.0)
}

/// Copy `h[src_y0..src_y1, src_x0..src_x1]` into a `rows x cols` row-major
/// buffer at `(dst_y0, dst_x0)`.
///
/// # Safety
/// `h` must be null or live; `buf` must hold `rows * cols` doubles.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn nm_extract(
    h: *const NativeMatrix,
    src_y0: usize,
    src_y1: usize,
    src_x0: usize,
    src_x1: usize,
    buf: *mut f64,
    rows: usize,
    cols: usize,
    dst_y0: usize,
    dst_x0: usize,
) -> bool {
    status("nm_extract", || {
        let src_block = span(src_y0, src_y1, src_x0, src_x1)?;
        let buf = buffer_mut(buf, buffer_len(rows, cols)?)?;
        Ok(handle(h)?.extract(src_block, buf, rows, cols, dst_y0, dst_x0)?)
    })
}

/// Write `alpha *` a 3x3 row-major array of 9 doubles at `(row, col)`.
///
/// # Safety
/// `h` must be null or live; `m` must point to 9 doubles.
#[no_mangle]
pub unsafe extern "C" fn nm_insert_3x3_scaled(h: *mut NativeMatrix, row: usize, col: usize, m: *const f64, alpha: f64) -> bool {
    status("nm_insert_3x3_scaled", || {
        let m = buffer(m, 9)?;
        let m = [[m[0], m[1], m[2]], [m[3], m[4], m[5]], [m[6], m[7], m[8]]];
        Ok(target(h)?.insert_3x3_scaled(row, col, &m, alpha)?)
    })
}

/// # Safety
/// `h` must be null or live; `m` must point to 9 doubles.
#[no_mangle]
pub unsafe extern "C" fn nm_insert_3x3(h: *mut NativeMatrix, row: usize, col: usize, m: *const f64) -> bool {
    nm_insert_3x3_scaled(h, row, col, m, 1.0)
}

/// # Safety
/// `h` must be null or live.
#[no_mangle]
pub unsafe extern "C" fn nm_insert_tuple_row(h: *mut NativeMatrix, row: usize, col: usize, x: f64, y: f64, z: f64) -> bool {
    status("nm_insert_tuple_row", || Ok(target(h)?.insert_tuple_row(row, col, [x, y, z])?))
}

/// # Safety
/// `h` must be null or live.
#[no_mangle]
pub unsafe extern "C" fn nm_fill_block(
    h: *mut NativeMatrix,
    row: usize,
    col: usize,
    rows: usize,
    cols: usize,
    value: f64,
) -> bool {
    status("nm_fill_block", || Ok(target(h)?.fill_block(Block::new(row, col, rows, cols), value)?))
}

/// # Safety
/// `h` must be null or live.
#[no_mangle]
pub unsafe extern "C" fn nm_fill_diagonal(h: *mut NativeMatrix, row: usize, col: usize, len: usize, value: f64) -> bool {
    status("nm_fill_diagonal", || Ok(target(h)?.fill_diagonal(row, col, len, value)?))
}

/// # Safety
/// `h` must be null or live.
#[no_mangle]
pub unsafe extern "C" fn nm_scale_block(
    h: *mut NativeMatrix,
    row: usize,
    col: usize,
    rows: usize,
    cols: usize,
    alpha: f64,
) -> bool {
    status("nm_scale_block", || Ok(target(h)?.scale_block(Block::new(row, col, rows, cols), alpha)?))
}

/// Gather rows `indices[..count]` of `src` into `dst` starting at `dst_row`.
///
/// # Safety
/// Both handles must be null or live; `indices` must hold `count` entries.
#[no_mangle]
pub unsafe extern "C" fn nm_extract_rows(
    dst: *mut NativeMatrix,
    src: *const NativeMatrix,
    indices: *const usize,
    count: usize,
    dst_row: usize,
) -> bool {
    status("nm_extract_rows", || {
        if indices.is_null() {
            return Err(CallError::Null);
        }
        let indices = slice::from_raw_parts(indices, count);
        let src = source(src, dst)?;
        Ok(target(dst)?.extract_rows(&src, indices, dst_row)?)
    })
}

/// Gather columns `indices[..count]` of `src` into `dst` starting at `dst_col`.
///
/// # Safety
/// Both handles must be null or live; `indices` must hold `count` entries.
#[no_mangle]
pub unsafe extern "C" fn nm_extract_columns(
    dst: *mut NativeMatrix,
    src: *const NativeMatrix,
    indices: *const usize,
    count: usize,
    dst_col: usize,
) -> bool {
    status("nm_extract_columns", || {
        if indices.is_null() {
            return Err(CallError::Null);
        }
        let indices = slice::from_raw_parts(indices, count);
        let src = source(src, dst)?;
        Ok(target(dst)?.extract_columns(&src, indices, dst_col)?)
    })
}

// ── Solves ──────────────────────────────────────────────────────────

unary_op!(nm_invert => invert);
binary_op!(nm_solve => solve);
binary_op!(nm_solve_check => solve_check);
binary_op!(nm_solve_robust => solve_robust);

/// `dst = aᵀ (a aᵀ + alpha² I)⁻¹ b`.
///
/// # Safety
/// All handles must be null or live.
#[no_mangle]
pub unsafe extern "C" fn nm_solve_damped(
    dst: *mut NativeMatrix,
    a: *const NativeMatrix,
    b: *const NativeMatrix,
    alpha: f64,
) -> bool {
    status("nm_solve_damped", || {
        let a = source(a, dst)?;
        let b = source(b, dst)?;
        Ok(target(dst)?.solve_damped(&a, &b, alpha)?)
    })
}

/// `dst = a (I - (bᵀb + alpha² I)⁻¹ bᵀb)`.
///
/// # Safety
/// All handles must be null or live.
#[no_mangle]
pub unsafe extern "C" fn nm_project_on_nullspace(
    dst: *mut NativeMatrix,
    a: *const NativeMatrix,
    b: *const NativeMatrix,
    alpha: f64,
) -> bool {
    status("nm_project_on_nullspace", || {
        let a = source(a, dst)?;
        let b = source(b, dst)?;
        Ok(target(dst)?.project_on_nullspace(&a, &b, alpha)?)
    })
}

// ── Kalman filter ───────────────────────────────────────────────────

macro_rules! kalman_step {
    ($name:ident => $func:path) => {
        /// # Safety
        /// All handles must be null or live.
        #[no_mangle]
        pub unsafe extern "C" fn $name(
            dst: *mut NativeMatrix,
            a: *const NativeMatrix,
            b: *const NativeMatrix,
            c: *const NativeMatrix,
        ) -> bool {
            status(stringify!($name), || {
                let a = source(a, dst)?;
                let b = source(b, dst)?;
                let c = source(c, dst)?;
                Ok($func(target(dst)?, &a, &b, &c)?)
            })
        }
    };
}

kalman_step!(nm_predict_error_covariance => estimate::predict_error_covariance);
kalman_step!(nm_compute_kalman_gain => estimate::compute_kalman_gain);
kalman_step!(nm_update_state => estimate::update_state);
kalman_step!(nm_update_error_covariance => estimate::update_error_covariance);

// ── Nullspace projector ─────────────────────────────────────────────

/// New projector for `dof` degrees of freedom. Null if `dof * dof` overflows.
#[no_mangle]
pub extern "C" fn nm_nullspace_create(dof: usize) -> *mut NullspaceProjector {
    guarded("nm_nullspace_create", ptr::null_mut(), || {
        buffer_len(dof, dof)?;
        Ok(Box::into_raw(Box::new(NullspaceProjector::new(dof))))
    })
}

/// Release a projector. Null is ignored.
///
/// # Safety
/// `p` must be null or a handle from [`nm_nullspace_create`] not yet destroyed.
#[no_mangle]
pub unsafe extern "C" fn nm_nullspace_destroy(p: *mut NullspaceProjector) {
    if !p.is_null() {
        drop(Box::from_raw(p));
    }
}

/// `x = a (I - (bᵀb + alpha² I)⁻¹ bᵀb)` using the projector's scratch.
///
/// # Safety
/// `p` and all matrix handles must be null or live.
#[no_mangle]
pub unsafe extern "C" fn nm_nullspace_project(
    p: *mut NullspaceProjector,
    a: *const NativeMatrix,
    b: *const NativeMatrix,
    x: *mut NativeMatrix,
    alpha: f64,
) -> bool {
    status("nm_nullspace_project", || {
        let projector = p.as_mut().ok_or(CallError::Null)?;
        let a = source(a, x)?;
        let b = source(b, x)?;
        Ok(projector.project(&a, &b, target(x)?, alpha)?)
    })
}
