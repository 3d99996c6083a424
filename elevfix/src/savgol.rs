//! Savitzky-Golay smoothing over non-uniformly spaced samples.
//!
//! Each output value is the least squares polynomial of the window
//! around it, evaluated at the sample's own position. Since spacing
//! varies, the fit is solved per window instead of being folded into a
//! fixed convolution kernel. On a uniform grid this is the classic
//! filter.
//!
//! # Boundaries
//!
//! The window is never truncated. Near either end it is shifted
//! inward so it still spans `window` samples: sample `i` uses
//! `[start, start + window)` with
//! `start = clamp(i - window / 2, 0, len - window)`. The rule is the
//! same at both ends, so filtering a reversed track gives the reversed
//! result.

use crate::{ElevfixError, Result, C};
use itertools::Itertools;
use nalgebra::{DMatrix, DVector};
use std::cmp::Ordering;

/// Singular values below this are treated as zero. Offsets are
/// normalized to `[-1, 1]` before fitting.
const SVD_EPS: C = 1e-12;

/// A validated smoothing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavitzkyGolay {
    window: usize,
    degree: usize,
}

impl SavitzkyGolay {
    /// Returns a filter fitting polynomials of `degree` over `window`
    /// samples.
    pub fn new(window: usize, degree: usize) -> Result<Self> {
        if window == 0 {
            return Err(ElevfixError::InvalidWindow {
                window,
                reason: "must be positive",
            });
        }
        if window % 2 == 0 {
            return Err(ElevfixError::InvalidWindow {
                window,
                reason: "must be odd",
            });
        }
        if degree >= window {
            return Err(ElevfixError::InvalidDegree { degree, window });
        }
        Ok(Self { window, degree })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Smooths `values` sampled at non-decreasing `positions`.
    ///
    /// The output has the same length as the input.
    pub fn apply(&self, positions: &[C], values: &[C]) -> Result<Vec<C>> {
        let len = positions.len();
        if values.len() != len {
            return Err(ElevfixError::Config(format!(
                "{len} positions but {} values",
                values.len()
            )));
        }
        if self.window > len {
            return Err(ElevfixError::InvalidWindow {
                window: self.window,
                reason: "larger than the number of samples",
            });
        }
        if positions
            .iter()
            .tuple_windows()
            .any(|(a, b)| a.partial_cmp(b).map_or(true, Ordering::is_gt))
        {
            return Err(ElevfixError::Config(
                "positions must be non-decreasing".to_string(),
            ));
        }

        let half = self.window / 2;
        (0..len)
            .map(|i| {
                let start = i.saturating_sub(half).min(len - self.window);
                let span = start..start + self.window;
                self.fit_at(&positions[span.clone()], &values[span], positions[i])
            })
            .collect()
    }

    /// Value at `origin` of the least squares polynomial through
    /// `(xs, ys)`.
    fn fit_at(&self, xs: &[C], ys: &[C], origin: C) -> Result<C> {
        let offsets: Vec<C> = xs.iter().map(|x| x - origin).collect();
        // Scaling leaves the value at offset 0 unchanged and keeps the
        // Vandermonde matrix well conditioned for metre-scale offsets.
        let scale = match offsets.iter().fold(0.0, |max: C, o| max.max(o.abs())) {
            s if s > 0.0 => s,
            _ => 1.0,
        };

        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let vandermonde = DMatrix::from_fn(xs.len(), self.degree + 1, |row, col| {
            (offsets[row] / scale).powi(col as i32)
        });
        let rhs = DVector::from_column_slice(ys);
        let coeffs = vandermonde
            .svd(true, true)
            .solve(&rhs, SVD_EPS)
            .map_err(ElevfixError::LeastSquares)?;
        Ok(coeffs[0])
    }
}

/// Smooths `values` at `positions` with a `window` wide, `degree`
/// polynomial Savitzky-Golay filter.
pub fn savgol(positions: &[C], values: &[C], window: usize, degree: usize) -> Result<Vec<C>> {
    SavitzkyGolay::new(window, degree)?.apply(positions, values)
}
