//! Centerline paths and their curvature/length analysis.
//!
//! A [`Path`] is an ordered point sequence running between a pair of ports.
//! Paths are keyed by [`PortPair::key`] (`"first;second"`, ports in discovery
//! order) inside a [`PathMap`]. Direct paths follow the layout topology while
//! evanescent paths bridge ports that are only coupled through the gap between
//! two waveguides.
//!
//! # Analysis
//!
//! - [`Path::curvature`]: signed discrete curvature against arc length
//! - [`Path::length`]: total arc length
//! - [`Path::min_radius`]: smallest absolute bend radius, ignoring undefined radii
//! - [`radius_profile`]: radius samples bounded by a maximum radius

use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fmt;

use geo_types::Coord;
use itertools::Itertools;
use ndarray::Array1;
use ndarray_stats::QuantileExt;
use serde::Serialize;

#[cfg(test)]
mod tests {

    use super::*;

    fn arc(radius: f64, n: usize) -> Vec<Coord<f64>> {
        (0..n)
            .map(|i| {
                let t = -PI / 2.0 + PI / 2.0 * i as f64 / (n - 1) as f64;
                Coord {
                    x: radius * t.cos(),
                    y: radius + radius * t.sin(),
                }
            })
            .collect()
    }

    #[test]
    fn straight_length_and_radius() {
        let points = (0..=10)
            .map(|i| Coord {
                x: i as f64,
                y: 0.0,
            })
            .collect();
        let path = Path::new(PortPair::new("o1", "o2"), points);
        assert!((path.length() - 10.0).abs() < 1e-12);
        assert!(path.min_radius().is_infinite());
        let (s, k) = path.curvature();
        assert_eq!(s.len(), 9);
        assert!(k.iter().all(|k| *k == 0.0));
    }

    #[test]
    fn circular_arc_radius() {
        let path = Path::new(PortPair::new("o1", "o2"), arc(10.0, 91));
        let radius = path.min_radius();
        assert!((radius - 10.0).abs() < 1e-3, "radius: {}", radius);
        let expected = PI / 2.0 * 10.0;
        assert!((path.length() - expected).abs() / expected < 1e-3);

        // turning left everywhere
        let (_, k) = path.curvature();
        assert!(k.iter().all(|k| *k > 0.0));
    }

    #[test]
    fn curvature_wraps_turning_angle() {
        // heading flips across the -x axis, where atan2 jumps by 2pi
        let points = vec![
            Coord { x: 1.0, y: 0.1 },
            Coord { x: 0.0, y: 0.0 },
            Coord { x: -1.0, y: 0.1 },
        ];
        let path = Path::new(PortPair::new("a", "b"), points);
        let (_, k) = path.curvature();
        assert_eq!(k.len(), 1);
        assert!(k[0].abs() < 1.0, "k: {}", k[0]);
    }

    #[test]
    fn duplicate_points_are_ignored_by_min_radius() {
        let mut points = arc(5.0, 31);
        points.insert(10, points[10]);
        let path = Path::new(PortPair::new("o1", "o2"), points);
        let (_, k) = path.curvature();
        assert!(k.iter().any(|k| k.is_nan()));
        assert!((path.min_radius() - 5.0).abs() < 1e-2);
    }

    #[test]
    fn radius_profile_filters() {
        let mut points = arc(5.0, 31);
        points.extend((1..10).map(|i| Coord {
            x: 5.0,
            y: 5.0 + i as f64,
        }));
        let path = Path::new(PortPair::new("o1", "o2"), points);
        let (s, r) = radius_profile(&path, 200.0);
        assert_eq!(s.len(), r.len());
        assert!(r.iter().all(|r| r.abs() < 200.0));
        assert!(!r.is_empty());
    }

    #[test]
    fn port_pair_keys() {
        let pair = PortPair::new("o2", "o1");
        assert_eq!(pair.key(), "o2;o1");
        assert_eq!(pair.end_of("o2"), Some(PairEnd::First));
        assert_eq!(pair.end_of("o1"), Some(PairEnd::Second));
        assert_eq!(pair.end_of("o10"), None);
        assert!(pair.contains("o1"));
        assert!(!pair.contains("o3"));
    }

    #[test]
    fn summarise_paths() {
        let mut paths = PathMap::new();
        paths.insert(Path::new(PortPair::new("o1", "o2"), arc(10.0, 91)));
        let summary = min_radius_and_length(&paths);
        let (radius, length) = summary["o1;o2"];
        assert!((radius - 10.0).abs() < 1e-3);
        assert!((length - 5.0 * PI).abs() < 1e-2);
    }
}

/// Which end of a [`PortPair`] a port sits at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairEnd {
    First,
    Second,
}

/// An ordered pair of port names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PortPair {
    pub first: String,
    pub second: String,
}

impl PortPair {
    pub fn new(first: &str, second: &str) -> Self {
        Self {
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    /// The mapping key, `"first;second"`.
    pub fn key(&self) -> String {
        format!("{};{}", self.first, self.second)
    }

    pub fn end_of(&self, port: &str) -> Option<PairEnd> {
        if self.first == port {
            Some(PairEnd::First)
        } else if self.second == port {
            Some(PairEnd::Second)
        } else {
            None
        }
    }

    pub fn contains(&self, port: &str) -> bool {
        self.end_of(port).is_some()
    }
}

impl fmt::Display for PortPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.first, self.second)
    }
}

/// A centerline between two ports.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub ports: PortPair,
    pub points: Vec<Coord<f64>>,
    /// Set when the inner/outer boundary split could not be validated and the
    /// centerline is a best-effort guess.
    pub degraded: bool,
}

impl Path {
    pub fn new(ports: PortPair, points: Vec<Coord<f64>>) -> Self {
        Self {
            ports,
            points,
            degraded: false,
        }
    }

    pub fn key(&self) -> String {
        self.ports.key()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&Coord<f64>> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Coord<f64>> {
        self.points.last()
    }

    /// Lengths of the consecutive segments.
    fn segment_lengths(&self) -> Array1<f64> {
        self.points
            .iter()
            .tuple_windows()
            .map(|(a, b)| {
                let d = *b - *a;
                d.x.hypot(d.y)
            })
            .collect()
    }

    /// Total arc length.
    pub fn length(&self) -> f64 {
        self.segment_lengths().sum()
    }

    /// Discrete curvature at every interior vertex.
    ///
    /// Returns the arc-length position of each interior vertex and the signed
    /// curvature there: the turning angle between the incoming and outgoing
    /// segments, wrapped to (-pi, pi], over the mean of their lengths.
    /// Positive values turn counter-clockwise. Zero-length segments yield NaN.
    pub fn curvature(&self) -> (Array1<f64>, Array1<f64>) {
        if self.points.len() < 3 {
            return (Array1::zeros(0), Array1::zeros(0));
        }
        let ds = self.segment_lengths();
        let headings: Vec<f64> = self
            .points
            .iter()
            .tuple_windows()
            .map(|(a, b)| (b.y - a.y).atan2(b.x - a.x))
            .collect();

        let n = ds.len() - 1;
        let mut s = Array1::<f64>::zeros(n);
        let mut k = Array1::<f64>::zeros(n);
        let mut travelled = 0.0;
        for i in 0..n {
            travelled += ds[i];
            s[i] = travelled;

            let mean_ds = 0.5 * (ds[i] + ds[i + 1]);
            k[i] = if ds[i] == 0.0 || ds[i + 1] == 0.0 {
                f64::NAN
            } else {
                wrap_angle(headings[i + 1] - headings[i]) / mean_ds
            };
        }
        (s, k)
    }

    /// Smallest absolute bend radius along the path.
    ///
    /// Undefined radii (from coincident points) are skipped. A path with no
    /// measurable bend reports `f64::INFINITY`.
    pub fn min_radius(&self) -> f64 {
        let (_, k) = self.curvature();
        let radius = k.mapv(|k| (1.0 / k).abs());
        let min = *radius.min_skipnan();
        if min.is_nan() {
            f64::INFINITY
        } else {
            min
        }
    }
}

/// Wraps an angle to (-pi, pi].
fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped == -PI {
        PI
    } else {
        wrapped
    }
}

/// Radius of curvature against arc length, keeping samples with |R| < `rmax`.
pub fn radius_profile(path: &Path, rmax: f64) -> (Vec<f64>, Vec<f64>) {
    let (s, k) = path.curvature();
    s.iter()
        .zip(k.iter())
        .map(|(s, k)| (*s, 1.0 / k))
        .filter(|(_, r)| *r > -rmax && *r < rmax)
        .unzip()
}

/// Paths keyed by `"first;second"`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathMap {
    paths: BTreeMap<String, Path>,
}

impl PathMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a path under its own key, replacing any path with that key.
    pub fn insert(&mut self, path: Path) -> Option<Path> {
        self.paths.insert(path.key(), path)
    }

    pub fn get(&self, key: &str) -> Option<&Path> {
        self.paths.get(key)
    }

    /// True if the two ports are joined in either order.
    pub fn connects(&self, a: &str, b: &str) -> bool {
        self.paths.contains_key(&PortPair::new(a, b).key())
            || self.paths.contains_key(&PortPair::new(b, a).key())
    }

    /// The first path (in key order) that ends at `port`.
    pub fn path_with_port(&self, port: &str) -> Option<&Path> {
        self.paths.values().find(|p| p.ports.contains(port))
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.paths.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Path> {
        self.paths.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Path)> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl std::ops::Index<&str> for PathMap {
    type Output = Path;

    fn index(&self, key: &str) -> &Path {
        &self.paths[key]
    }
}

/// Minimum bend radius and length of every path, by key.
pub fn min_radius_and_length(paths: &PathMap) -> BTreeMap<String, (f64, f64)> {
    paths
        .iter()
        .map(|(key, path)| (key.clone(), (path.min_radius(), path.length())))
        .collect()
}
