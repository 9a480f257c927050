use super::{element_count, MatrixError, NativeMatrix};

// ── Structural edits ────────────────────────────────────────────────
//
// Columns are contiguous; each edit is a sequence of `copy_within` moves.

impl NativeMatrix {
    /// Append `n` zero-filled rows, keeping every existing element in place.
    ///
    /// Storage grows only if the new shape does not fit; it never shrinks.
    /// A row count or element count that overflows `usize` is rejected with
    /// the matrix unchanged.
    ///
    /// ```
    /// use numeris_native::NativeMatrix;
    /// let mut m = NativeMatrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
    /// m.grow_rows(1).unwrap();
    /// assert_eq!(m.to_row_major(), vec![1.0, 2.0, 3.0, 4.0, 0.0, 0.0]);
    /// ```
    pub fn grow_rows(&mut self, n: usize) -> Result<(), MatrixError> {
        if n == 0 {
            return Ok(());
        }
        let old_rows = self.nrows;
        let cols = self.ncols;
        let new_rows = old_rows.checked_add(n).ok_or(MatrixError::SizeOverflow {
            nrows: old_rows,
            ncols: cols,
        })?;
        let len = element_count(new_rows, cols)?;
        self.storage.grow_preserving(len);

        let data = self.storage.prefix_mut(len);
        // Last column first: each destination lies at or after its source and
        // past every source still to be moved.
        for j in (0..cols).rev() {
            data.copy_within(j * old_rows..(j + 1) * old_rows, j * new_rows);
            data[j * new_rows + old_rows..(j + 1) * new_rows].fill(0.0);
        }
        self.nrows = new_rows;
        Ok(())
    }

    /// Delete row `index`, shifting later rows up.
    pub fn remove_row(&mut self, index: usize) -> Result<(), MatrixError> {
        if index >= self.nrows {
            return Err(MatrixError::IndexOutOfBounds {
                row: index,
                col: 0,
                shape: self.shape(),
            });
        }
        if self.nrows == 1 {
            self.nrows = 0;
            return Ok(());
        }

        let rows = self.nrows;
        let cols = self.ncols;
        let new_rows = rows - 1;
        let data = self.as_mut_slice();
        // First column first: destinations only ever move toward the front.
        for j in 0..cols {
            let src = j * rows;
            let dst = j * new_rows;
            data.copy_within(src..src + index, dst);
            data.copy_within(src + index + 1..src + rows, dst + index);
        }
        self.nrows = new_rows;
        Ok(())
    }

    /// Delete column `index`, shifting later columns left.
    pub fn remove_column(&mut self, index: usize) -> Result<(), MatrixError> {
        if index >= self.ncols {
            return Err(MatrixError::IndexOutOfBounds {
                row: 0,
                col: index,
                shape: self.shape(),
            });
        }
        if self.ncols == 1 {
            self.ncols = 0;
            return Ok(());
        }

        let rows = self.nrows;
        let cols = self.ncols;
        self.as_mut_slice()
            .copy_within((index + 1) * rows..cols * rows, index * rows);
        self.ncols = cols - 1;
        Ok(())
    }
}
