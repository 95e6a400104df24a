//! Centerline extraction for a waveguide region bounded by two ports.
//!
//! The boundary ring of a tube-like polygon walks along one side of the
//! waveguide and comes back along the other. Cutting the ring in two at the
//! right place gives an "outer" and an "inner" curve that both run from one
//! port to the other; their pointwise average is the centerline.
//!
//! Finding the right cut is heuristic. The ring is first cut at its midpoint;
//! if the halves do not look like the two sides of a waveguide the ring is
//! rotated one vertex at a time, and the cut point is moved by a growing
//! deviation, within the bounds given by [`SplitSearch`]. When nothing
//! validates, the plain midpoint split is used and the result is flagged as
//! degraded.

use std::ops::RangeInclusive;

use geo::Simplify;
use geo_types::{Coord, Polygon};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::component::Port;
use crate::error::{PathError, Result};
use crate::resample::{equalize, undersample};
use crate::settings::Settings;


/// Bounds of the search for a valid inner/outer split.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SplitSearch {
    /// Largest one-vertex rotation tried per split point; every rotation of
    /// the ring when unset.
    pub max_rotation: Option<usize>,
    /// Largest shift of the split point away from the ring midpoint.
    pub max_deviation: usize,
}

impl Default for SplitSearch {
    fn default() -> Self {
        Self {
            max_rotation: None,
            max_deviation: 8,
        }
    }
}

impl SplitSearch {
    /// Split point shifts in the order they are tried: 0, +1, -1, +2, -2, ...
    pub fn deviations(&self) -> impl Iterator<Item = isize> {
        std::iter::once(0).chain((1..=self.max_deviation as isize).flat_map(|d| [d, -d]))
    }

    /// Rotations tried for a ring of `len` points, the unrotated ring first.
    pub fn rotations(&self, len: usize) -> RangeInclusive<usize> {
        let last = len.saturating_sub(1);
        0..=self.max_rotation.map_or(last, |max| max.min(last))
    }
}

/// Result of the split search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitOutcome {
    /// The ring rolled by `rotation` vertices and cut at midpoint + `deviation`
    /// validated.
    Found { rotation: usize, deviation: isize },
    /// Nothing validated; the unrotated midpoint split was used.
    Exhausted,
}

/// A centerline and how its boundary split was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Centerline {
    pub points: Vec<Coord<f64>>,
    pub split: SplitOutcome,
}

impl Centerline {
    pub fn is_degraded(&self) -> bool {
        self.split == SplitOutcome::Exhausted
    }
}

/// Rolls the ring by `rotation` and cuts it at `split`.
///
/// Returns the first part in ring order and the second part reversed, so
/// both run in the same direction for a tube-like boundary.
fn split_ring(
    points: &[Coord<f64>],
    rotation: usize,
    split: usize,
) -> (Vec<Coord<f64>>, Vec<Coord<f64>>) {
    let n = points.len();
    let mut rolled = points.to_vec();
    rolled.rotate_right(rotation % n);
    let mut inner = rolled.split_off(split);
    inner.reverse();
    (rolled, inner)
}

/// Whether two curves look like the two sides of one waveguide.
///
/// Both curve pairs must share a coordinate (x or y) at their start and at
/// their end, the outer curve must start near one port and end near the other.
fn is_valid_split(
    outer: &[Coord<f64>],
    inner: &[Coord<f64>],
    ports: &[&Port],
    settings: &Settings,
) -> bool {
    let (Some(o0), Some(o1), Some(i0), Some(i1)) =
        (outer.first(), outer.last(), inner.first(), inner.last())
    else {
        return false;
    };

    let tol = settings.coincidence_tolerance;
    let same = |a: f64, b: f64| (a - b).abs() <= tol;
    let start_x = same(o0.x, i0.x);
    let start_y = same(o0.y, i0.y);
    let end_x = same(o1.x, i1.x);
    let end_y = same(o1.y, i1.y);
    if !((start_x || start_y) && (end_x || end_y)) {
        return false;
    }

    let near = |port: &Port, c: &Coord<f64>| port.distance_sq(c) < settings.port_proximity;
    ports.iter().enumerate().any(|(i, start_port)| {
        near(*start_port, o0)
            && ports
                .iter()
                .enumerate()
                .any(|(j, end_port)| j != i && near(*end_port, o1))
    })
}

/// Searches rotations and split points for a valid inner/outer split.
pub fn find_split(points: &[Coord<f64>], ports: &[&Port], settings: &Settings) -> SplitOutcome {
    let n = points.len();
    let mid = (n / 2) as isize;

    for deviation in settings.search.deviations() {
        let split = mid + deviation;
        if split < 1 || split >= n as isize {
            continue;
        }
        for rotation in settings.search.rotations(n) {
            let (outer, inner) = split_ring(points, rotation, split as usize);
            if is_valid_split(&outer, &inner, ports, settings) {
                debug!(rotation, deviation, "inner/outer split found");
                return SplitOutcome::Found {
                    rotation,
                    deviation,
                };
            }
        }
        debug!(deviation, "no valid split at this deviation");
    }
    SplitOutcome::Exhausted
}

/// Extracts the centerline of a polygon holding exactly two ports.
///
/// The result is not smoothed; filters are applied by the caller.
pub fn extract_centerline(
    polygon: &Polygon<f64>,
    ports: &[&Port],
    settings: &Settings,
) -> Result<Centerline> {
    let simplified = polygon.simplify(&settings.simplify_tolerance);
    let mut points = simplified.exterior().0.clone();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    if points.len() < 3 {
        return Err(PathError::DegenerateBoundary {
            region: 0,
            points: points.len(),
        });
    }

    let split = find_split(&points, ports, settings);
    let (mut outer, mut inner) = match split {
        SplitOutcome::Found {
            rotation,
            deviation,
        } => split_ring(&points, rotation, (points.len() as isize / 2 + deviation) as usize),
        SplitOutcome::Exhausted => {
            let names: Vec<&str> = ports.iter().map(|p| p.name.as_str()).collect();
            warn!(
                ports = ?names,
                vertices = points.len(),
                "could not validate the inner/outer boundary split, centerline is a best-effort guess"
            );
            split_ring(&points, 0, points.len() / 2)
        }
    };

    outer.sort_by(|a, b| a.x.total_cmp(&b.x));
    inner.sort_by(|a, b| a.x.total_cmp(&b.x));

    let outer = undersample(&outer, settings.under_sampling);
    let inner = undersample(&inner, settings.under_sampling);
    let (outer, inner) = equalize(&outer, &inner, &settings.resample)?;

    let points = outer
        .iter()
        .zip(inner.iter())
        .map(|(o, i)| (*o + *i) / 2.0)
        .collect();

    Ok(Centerline { points, split })
}
