use core::fmt::{self, Write as _};

use super::NativeMatrix;

// ── Reductions & predicates ─────────────────────────────────────────

impl NativeMatrix {
    /// Smallest element, ignoring NaN. NaN for an empty matrix.
    ///
    /// ```
    /// use numeris_native::NativeMatrix;
    /// let m = NativeMatrix::from_rows(2, 2, &[3.0, -1.0, 4.0, 1.5]);
    /// assert_eq!(m.min(), -1.0);
    /// assert_eq!(m.max(), 4.0);
    /// assert_eq!(m.sum(), 7.5);
    /// assert_eq!(m.prod(), -18.0);
    /// ```
    pub fn min(&self) -> f64 {
        if self.is_empty() {
            return f64::NAN;
        }
        self.as_slice().iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Largest element, ignoring NaN. NaN for an empty matrix.
    pub fn max(&self) -> f64 {
        if self.is_empty() {
            return f64::NAN;
        }
        self.as_slice().iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Sum of all elements (0 for an empty matrix).
    pub fn sum(&self) -> f64 {
        self.as_slice().iter().sum()
    }

    /// Product of all elements (1 for an empty matrix).
    pub fn prod(&self) -> f64 {
        self.as_slice().iter().product()
    }

    /// Set every active element to zero.
    pub fn zero(&mut self) {
        self.fill(0.0);
    }

    /// Set every active element to `value`.
    pub fn fill(&mut self, value: f64) {
        self.as_mut_slice().fill(value);
    }

    pub fn contains_nan(&self) -> bool {
        self.as_slice().iter().any(|x| x.is_nan())
    }

    /// Same shape and every `|a_ij - b_ij| <= precision`.
    pub fn is_approx(&self, other: &NativeMatrix, precision: f64) -> bool {
        self.shape() == other.shape()
            && self
                .as_slice()
                .iter()
                .zip(other.as_slice())
                .all(|(a, b)| (a - b).abs() <= precision)
    }
}

// ── Display ─────────────────────────────────────────────────────────

impl fmt::Display for NativeMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.nrows;
        let n = self.ncols;

        // Measure column widths
        let mut widths = vec![0; n];
        for j in 0..n {
            for i in 0..m {
                let w = WriteCounting::count(|wc| write!(wc, "{}", self[(i, j)]));
                widths[j] = widths[j].max(w);
            }
        }

        for i in 0..m {
            write!(f, "│")?;
            for j in 0..n {
                if j > 0 {
                    write!(f, "  ")?;
                }
                write!(f, "{:>width$}", self[(i, j)], width = widths[j])?;
            }
            write!(f, "│")?;
            if i + 1 < m {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

struct WriteCounting {
    count: usize,
}

impl WriteCounting {
    fn count(f: impl FnOnce(&mut Self) -> fmt::Result) -> usize {
        let mut wc = WriteCounting { count: 0 };
        // Counting never fails.
        f(&mut wc).ok();
        wc.count
    }
}

impl fmt::Write for WriteCounting {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.count += s.chars().count();
        Ok(())
    }
}
