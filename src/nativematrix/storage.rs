use log::trace;

/// Owned, always-initialized `f64` buffer backing a [`NativeMatrix`](super::NativeMatrix).
///
/// The buffer length is the *capacity*: every element is initialized, and the
/// active view only ever covers a prefix of it. Capacity never shrinks.
#[derive(Debug, Clone, Default)]
pub(crate) struct Storage {
    data: Vec<f64>,
}

impl Storage {
    /// Zero-filled storage of exactly `len` elements.
    pub(crate) fn zeroed(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    /// Take ownership of an existing buffer; its length becomes the capacity.
    pub(crate) fn from_vec(data: Vec<f64>) -> Self {
        Self { data }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Replace the buffer with fresh zeroed storage of exactly `len` elements.
    /// Previous contents are discarded.
    pub(crate) fn reallocate(&mut self, len: usize) {
        trace!("reallocating storage: {} -> {} elements", self.data.len(), len);
        self.data = vec![0.0; len];
    }

    /// Grow to at least `len` elements, keeping existing contents.
    pub(crate) fn grow_preserving(&mut self, len: usize) {
        if len > self.data.len() {
            trace!("growing storage: {} -> {} elements", self.data.len(), len);
            self.data.resize(len, 0.0);
        }
    }

    /// The first `len` elements.
    #[inline]
    pub(crate) fn prefix(&self, len: usize) -> &[f64] {
        &self.data[..len]
    }

    #[inline]
    pub(crate) fn prefix_mut(&mut self, len: usize) -> &mut [f64] {
        &mut self.data[..len]
    }
}
