//! Synthetic paths between ports of waveguides that only couple through a gap.
//!
//! For two ports on different direct paths, the stitched path follows the
//! first direct path from its port up to the point where the two paths come
//! closest, then jumps across and follows the second one to its port.

use geo_types::Coord;
use itertools::Itertools;
use ndarray::Array2;
use tracing::debug;

use crate::component::Port;
use crate::error::{PathError, Result};
use crate::filter::CurveFilter;
use crate::path::{PairEnd, Path, PathMap, PortPair};


/// Indices of the closest pair of points between two curves.
///
/// Ties on the distance go to the pair whose point on `a` lies closest to
/// `center`, then to the first pair in row order.
pub fn closest_approach(a: &[Coord<f64>], b: &[Coord<f64>], center: Coord<f64>) -> (usize, usize) {
    let distances = Array2::from_shape_fn((a.len(), b.len()), |(i, j)| {
        let d = a[i] - b[j];
        d.x.hypot(d.y)
    });
    let min = distances.iter().copied().fold(f64::INFINITY, f64::min);

    let to_center = |i: usize| {
        let d = a[i] - center;
        d.x.hypot(d.y)
    };
    let mut best: Option<(usize, usize)> = None;
    for ((i, j), d) in distances.indexed_iter() {
        if *d != min {
            continue;
        }
        best = match best {
            Some((bi, _)) if to_center(bi) <= to_center(i) => best,
            _ => Some((i, j)),
        };
    }
    best.unwrap_or((0, 0))
}

/// The part of a direct path between `port` and the split index, sorted by x.
fn port_side(path: &Path, port: &str, index: usize) -> Vec<Coord<f64>> {
    let mut part = match path.ports.end_of(port) {
        Some(PairEnd::First) => path.points[..=index].to_vec(),
        _ => path.points[index..].to_vec(),
    };
    part.sort_by(|a, b| a.x.total_cmp(&b.x));
    part
}

/// Concatenates two curves in the orientation with the shortest junction.
fn join_closest(mut a: Vec<Coord<f64>>, mut b: Vec<Coord<f64>>) -> Vec<Coord<f64>> {
    let (Some(a0), Some(a1), Some(b0), Some(b1)) =
        (a.first().copied(), a.last().copied(), b.first().copied(), b.last().copied())
    else {
        a.extend(b);
        return a;
    };
    let dist = |p: Coord<f64>, q: Coord<f64>| {
        let d = p - q;
        d.x * d.x + d.y * d.y
    };
    let junctions = [dist(a1, b0), dist(a1, b1), dist(a0, b1), dist(a0, b0)];
    match junctions.iter().position_min_by(|x, y| x.total_cmp(y)) {
        Some(0) => {}
        Some(1) => b.reverse(),
        Some(2) => {
            a.reverse();
            b.reverse();
        }
        _ => a.reverse(),
    }
    a.extend(b);
    a
}

/// Builds a path for every pair of assigned ports that no direct path joins.
///
/// `center` is the center of the layer geometry, used to break distance ties.
/// Every assigned port must belong to a direct path.
pub fn stitch(
    direct: &PathMap,
    ports: &[Port],
    center: Coord<f64>,
    filter: Option<&dyn CurveFilter>,
) -> Result<PathMap> {
    let mut stitched = PathMap::new();

    for port1 in ports {
        for port2 in ports {
            let (p1, p2) = (port1.name.as_str(), port2.name.as_str());
            if p1 == p2 || direct.connects(p1, p2) || stitched.connects(p1, p2) {
                continue;
            }
            let path1 = direct
                .path_with_port(p1)
                .ok_or_else(|| PathError::MissingDirectPath { port: p1.to_string() })?;
            let path2 = direct
                .path_with_port(p2)
                .ok_or_else(|| PathError::MissingDirectPath { port: p2.to_string() })?;
            if let Some(empty) = [path1, path2].into_iter().find(|p| p.is_empty()) {
                return Err(PathError::EmptyPath { key: empty.key() });
            }

            let (i, j) = closest_approach(&path1.points, &path2.points, center);
            let part1 = port_side(path1, p1, i);
            let part2 = port_side(path2, p2, j);
            let joined = join_closest(part1, part2);

            let points = match filter {
                Some(filter) => filter.apply(&joined),
                None => joined,
            };
            let mut path = Path::new(PortPair::new(p1, p2), points);
            path.degraded = path1.degraded || path2.degraded;
            debug!(key = %path.key(), from = i, to = j, "evanescent path stitched");
            stitched.insert(path);
        }
    }
    Ok(stitched)
}
