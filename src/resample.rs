//! Point-count handling for inner and outer boundary curves.
//!
//! The two halves of a waveguide boundary rarely carry the same number of
//! vertices. Before they can be averaged into a centerline both are thinned
//! by a stride ([`undersample`]) and the shorter one is brought up to the
//! length of the longer one ([`equalize`]).

use geo_types::Coord;
use itertools::Itertools;
use ndarray::Array1;
use ndarray_interp::interp1d::{Interp1DBuilder, Linear};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::error::Result;


/// How the shorter boundary curve is padded to the length of the longer one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum ResampleStrategy {
    /// Sample the shorter curve at the normalized arc-length positions of the
    /// longer curve.
    ArcLength,
    /// Add uniformly random x positions and interpolate y over x. Seeded so
    /// that repeated runs agree.
    RandomPadding { seed: u64 },
}

impl Default for ResampleStrategy {
    fn default() -> Self {
        ResampleStrategy::ArcLength
    }
}

/// Keeps every `stride`-th point and always the final one.
pub fn undersample(points: &[Coord<f64>], stride: usize) -> Vec<Coord<f64>> {
    let stride = stride.max(1);
    let mut kept: Vec<Coord<f64>> = points.iter().step_by(stride).copied().collect();
    if let Some(last) = points.last() {
        if (points.len() - 1) % stride != 0 {
            kept.push(*last);
        }
    }
    kept
}

/// Brings two curves to the same point count.
///
/// The longer curve is returned unchanged; the shorter one is resampled
/// according to `strategy`. The returned tuple keeps the argument order.
pub fn equalize(
    a: &[Coord<f64>],
    b: &[Coord<f64>],
    strategy: &ResampleStrategy,
) -> Result<(Vec<Coord<f64>>, Vec<Coord<f64>>)> {
    if a.len() == b.len() {
        return Ok((a.to_vec(), b.to_vec()));
    }
    let a_longer = a.len() > b.len();
    let (long, short) = if a_longer { (a, b) } else { (b, a) };

    let resampled = match strategy {
        ResampleStrategy::ArcLength => resample_at_fractions(short, &arc_fractions(long))?,
        ResampleStrategy::RandomPadding { seed } => pad_randomly(short, long.len(), *seed)?,
    };

    if a_longer {
        Ok((long.to_vec(), resampled))
    } else {
        Ok((resampled, long.to_vec()))
    }
}

/// Cumulative arc length of every point.
fn cumulative_length(points: &[Coord<f64>]) -> Vec<f64> {
    let mut travelled = 0.0;
    std::iter::once(0.0)
        .chain(points.iter().tuple_windows().map(|(p, q)| {
            let d = *q - *p;
            travelled += d.x.hypot(d.y);
            travelled
        }))
        .collect()
}

/// Arc-length position of every point, normalized to [0, 1].
fn arc_fractions(points: &[Coord<f64>]) -> Vec<f64> {
    let s = cumulative_length(points);
    let total = s.last().copied().unwrap_or(0.0);
    if total == 0.0 {
        let n = points.len().max(2) - 1;
        return (0..points.len()).map(|i| i as f64 / n as f64).collect();
    }
    s.iter().map(|si| si / total).collect()
}

/// Samples `points` at the given normalized arc-length positions.
fn resample_at_fractions(points: &[Coord<f64>], fractions: &[f64]) -> Result<Vec<Coord<f64>>> {
    // interpolation needs strictly increasing abscissae
    let mut s = Vec::with_capacity(points.len());
    let mut xs = Vec::with_capacity(points.len());
    let mut ys = Vec::with_capacity(points.len());
    for (si, p) in cumulative_length(points).into_iter().zip(points) {
        if s.last().is_some_and(|last| si <= *last) {
            continue;
        }
        s.push(si);
        xs.push(p.x);
        ys.push(p.y);
    }

    if s.len() < 2 {
        let only = points.first().copied().unwrap_or(Coord { x: 0.0, y: 0.0 });
        return Ok(vec![only; fractions.len()]);
    }

    let total = s[s.len() - 1];
    let query: Array1<f64> = fractions
        .iter()
        .map(|f| (f * total).clamp(0.0, total))
        .collect();
    let s = Array1::from(s);

    let x = interp_linear(&s, Array1::from(xs), &query)?;
    let y = interp_linear(&s, Array1::from(ys), &query)?;
    Ok(x.iter()
        .zip(y.iter())
        .map(|(x, y)| Coord { x: *x, y: *y })
        .collect())
}

/// Pads `points` to `target` points with random x positions inside its own x
/// range and interpolates y at every x, sorted by x.
fn pad_randomly(points: &[Coord<f64>], target: usize, seed: u64) -> Result<Vec<Coord<f64>>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let (first_x, last_x) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (first.x, last.x),
        _ => return Ok(Vec::new()),
    };
    let (lo, hi) = (first_x.min(last_x), first_x.max(last_x));

    let mut query: Vec<f64> = points.iter().map(|p| p.x).collect();
    query.extend((points.len()..target).map(|_| rng.random_range(lo..=hi)));
    query.sort_by(|a, b| a.total_cmp(b));

    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x));
    sorted.dedup_by(|b, a| a.x == b.x);

    if sorted.len() < 2 {
        let y = sorted.first().map_or(0.0, |c| c.y);
        return Ok(query.into_iter().map(|x| Coord { x, y }).collect());
    }

    let xp = Array1::from_iter(sorted.iter().map(|c| c.x));
    let yp = Array1::from_iter(sorted.iter().map(|c| c.y));
    let query = Array1::from(query);
    let y = interp_linear(&xp, yp, &query)?;
    Ok(query
        .iter()
        .zip(y.iter())
        .map(|(x, y)| Coord { x: *x, y: *y })
        .collect())
}

/// Piecewise linear interpolation of `values` over strictly increasing `x`.
fn interp_linear(x: &Array1<f64>, values: Array1<f64>, query: &Array1<f64>) -> Result<Array1<f64>> {
    let lo = x[0];
    let hi = x[x.len() - 1];
    let query = query.mapv(|q| q.clamp(lo, hi));
    let interpolator = Interp1DBuilder::new(values)
        .x(x.clone())
        .strategy(Linear::new())
        .build()?;
    Ok(interpolator.interp_array(&query)?)
}
