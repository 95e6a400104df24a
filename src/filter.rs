//! Smoothing filters applied to finished centerlines.

use geo_types::Coord;
use nalgebra::{DMatrix, DVector};
use serde::Deserialize;


/// A transformation applied to a centerline after extraction.
pub trait CurveFilter {
    fn apply(&self, points: &[Coord<f64>]) -> Vec<Coord<f64>>;
}

impl<F> CurveFilter for F
where
    F: Fn(&[Coord<f64>]) -> Vec<Coord<f64>>,
{
    fn apply(&self, points: &[Coord<f64>]) -> Vec<Coord<f64>> {
        self(points)
    }
}

/// Savitzky-Golay smoothing of the x and y coordinates.
///
/// Each sample is replaced by the value of a least-squares polynomial of
/// degree `polyorder` fitted over a centered window of `window_length`
/// samples. The first and last half-windows are evaluated on the polynomial
/// fitted to the first and last full window.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SavitzkyGolay {
    pub window_length: usize,
    pub polyorder: usize,
}

impl Default for SavitzkyGolay {
    fn default() -> Self {
        Self {
            window_length: 11,
            polyorder: 3,
        }
    }
}

impl SavitzkyGolay {
    pub fn new(window_length: usize, polyorder: usize) -> Self {
        Self {
            window_length,
            polyorder,
        }
    }

    /// Window actually used for `n` samples, if any fits.
    fn window_for(&self, n: usize) -> Option<usize> {
        let mut window = self.window_length.min(n);
        if window % 2 == 0 {
            window = window.saturating_sub(1);
        }
        (window > self.polyorder).then_some(window)
    }

    /// Least-squares projection onto polynomial coefficients for a centered
    /// window, shape `(polyorder + 1) x window`.
    fn projection(&self, window: usize) -> Option<DMatrix<f64>> {
        let half = (window / 2) as f64;
        let vander = DMatrix::from_fn(window, self.polyorder + 1, |r, c| {
            (r as f64 - half).powi(c as i32)
        });
        let normal = vander.transpose() * &vander;
        normal
            .try_inverse()
            .map(|inverse| inverse * vander.transpose())
    }

    fn filter_axis(&self, values: &[f64], window: usize, projection: &DMatrix<f64>) -> Vec<f64> {
        let n = values.len();
        let half = window / 2;
        let eval = |coeffs: &DVector<f64>, t: f64| -> f64 {
            coeffs
                .iter()
                .enumerate()
                .map(|(k, c)| c * t.powi(k as i32))
                .sum()
        };

        let mut out = vec![0.0; n];
        for i in half..n - half {
            let segment = &values[i - half..=i + half];
            out[i] = projection
                .row(0)
                .iter()
                .zip(segment)
                .map(|(w, v)| w * v)
                .sum();
        }

        let head = projection * DVector::from_column_slice(&values[..window]);
        for (i, value) in out.iter_mut().enumerate().take(half) {
            *value = eval(&head, i as f64 - half as f64);
        }
        let start = n - window;
        let tail = projection * DVector::from_column_slice(&values[start..]);
        for (i, value) in out.iter_mut().enumerate().skip(n - half) {
            *value = eval(&tail, (i - start) as f64 - half as f64);
        }
        out
    }
}

impl CurveFilter for SavitzkyGolay {
    fn apply(&self, points: &[Coord<f64>]) -> Vec<Coord<f64>> {
        let Some(window) = self.window_for(points.len()) else {
            return points.to_vec();
        };
        let Some(projection) = self.projection(window) else {
            return points.to_vec();
        };

        let xs: Vec<f64> = points.iter().map(|c| c.x).collect();
        let ys: Vec<f64> = points.iter().map(|c| c.y).collect();
        let xs = self.filter_axis(&xs, window, &projection);
        let ys = self.filter_axis(&ys, window, &projection);
        xs.into_iter()
            .zip(ys)
            .map(|(x, y)| Coord { x, y })
            .collect()
    }
}
