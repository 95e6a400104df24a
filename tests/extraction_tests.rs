use std::collections::BTreeSet;
use std::f64::consts::PI;

use geo_types::{Coord, LineString, Polygon};
use pathlen::{
    component::{Component, Layer, Port},
    error::PathError,
    extract::extract_paths,
    path::min_radius_and_length,
    resample::ResampleStrategy,
    settings::{self, Settings},
};

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
    Polygon::new(
        LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1)]),
        vec![],
    )
}

fn arc(radius: f64, n: usize) -> Vec<Coord<f64>> {
    (0..n)
        .map(|i| {
            let t = -PI / 2.0 + PI / 2.0 * i as f64 / (n - 1) as f64;
            Coord {
                x: radius * t.cos(),
                y: 10.0 + radius * t.sin(),
            }
        })
        .collect()
}

/// Quarter bend of radius 10 and width 0.5, from (0, 0) heading east to
/// (10, 10) heading north.
fn bend(n_outer: usize, n_inner: usize) -> Component {
    let mut ring = arc(10.25, n_outer);
    ring.extend(arc(9.75, n_inner).into_iter().rev());

    let mut component = Component::new("bend");
    component.add_port(Port::new("o1", (0.0, 0.0), 180.0, 0.5));
    component.add_port(Port::new("o2", (10.0, 10.0), 90.0, 0.5));
    component.add_polygon(Layer::new(1, 0), &Polygon::new(LineString(ring), vec![]));
    component
}

/// Two straight waveguides of different length, 1.5 apart. Their ends at
/// x = 10 and x = 8 are the closest approach.
fn parallel_pair() -> Component {
    let mut component = Component::new("parallel");
    component.add_port(Port::new("o1", (0.0, -1.0), 180.0, 0.5));
    component.add_port(Port::new("o2", (3.0, 1.0), 180.0, 0.5));
    component.add_port(Port::new("o3", (8.0, 1.0), 0.0, 0.5));
    component.add_port(Port::new("o4", (10.0, -1.0), 0.0, 0.5));
    component.add_polygon(Layer::new(1, 0), &rect(0.0, -1.25, 10.0, -0.75));
    component.add_polygon(Layer::new(1, 0), &rect(3.0, 0.75, 8.0, 1.25));
    component
}

fn unordered(key: &str) -> (String, String) {
    let (a, b) = key.split_once(';').unwrap();
    if a < b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

#[test]
fn straight_waveguide() {
    let mut component = Component::new("straight");
    component.add_port(Port::new("o1", (0.0, 0.0), 180.0, 1.0));
    component.add_port(Port::new("o2", (10.0, 0.0), 0.0, 1.0));
    // drawn as two touching pieces, fused by the over/under step
    component.add_polygon(Layer::new(1, 0), &rect(0.0, -0.5, 4.0, 0.5));
    component.add_polygon(Layer::new(1, 0), &rect(4.0, -0.5, 10.0, 0.5));

    let paths = extract_paths(&component, &Settings::default()).unwrap();
    assert_eq!(paths.direct.len(), 1);
    let path = &paths.direct["o1;o2"];
    assert!(!path.degraded);

    let ports = component.get_ports();
    let first = path.first().unwrap();
    let last = path.last().unwrap();
    assert!(ports[0].distance_sq(first) < 1.0, "{:?}", first);
    assert!(ports[1].distance_sq(last) < 1.0, "{:?}", last);
    assert!(path.points.iter().all(|c| c.y.abs() < 1e-9));
    assert!((path.length() - 10.0).abs() < 0.3, "length: {}", path.length());
    assert!(path.min_radius().is_infinite());
}

#[test]
fn circular_bend_radius() {
    let settings = Settings {
        over_under_distance: 0.0,
        ..Settings::default()
    };
    let paths = extract_paths(&bend(31, 31), &settings).unwrap();
    let summary = min_radius_and_length(&paths.direct);
    let (radius, length) = summary["o1;o2"];
    assert!((radius - 10.0).abs() < 0.05, "radius: {}", radius);
    let expected = 5.0 * PI;
    assert!((length - expected).abs() / expected < 0.01, "length: {}", length);
    assert!(!paths.direct["o1;o2"].degraded);
}

#[test]
fn no_ports_fails_immediately() {
    let mut component = bend(31, 31);
    component.ports.clear();
    let result = extract_paths(&component, &Settings::default());
    assert!(matches!(result, Err(PathError::Precondition { .. })));
}

#[test]
fn four_port_polygon_is_split() {
    let mut component = Component::new("mmi");
    component.add_port(Port::new("o1", (0.0, -0.75), 180.0, 0.5));
    component.add_port(Port::new("o2", (0.0, 0.75), 180.0, 0.5));
    component.add_port(Port::new("o3", (10.0, 0.75), 0.0, 0.5));
    component.add_port(Port::new("o4", (10.0, -0.75), 0.0, 0.5));
    component.add_polygon(Layer::new(1, 0), &rect(0.0, -1.5, 10.0, 1.5));

    let paths = extract_paths(&component, &Settings::default()).unwrap();
    let keys: Vec<&String> = paths.direct.keys().collect();
    assert_eq!(keys, vec!["o1;o4", "o2;o3"]);
    for path in paths.direct.values() {
        assert!((path.length() - 10.0).abs() < 1e-6);
    }
}

#[test]
fn evanescent_paths_complete_the_pairs() {
    let settings = Settings {
        evanescent_coupling: true,
        ..Settings::default()
    };
    let paths = extract_paths(&parallel_pair(), &settings).unwrap();
    let evanescent = paths.evanescent.as_ref().unwrap();
    assert_eq!(paths.direct.len(), 2);
    assert_eq!(evanescent.len(), 4);
    assert!(paths.direct.connects("o1", "o4"));
    assert!(paths.direct.connects("o2", "o3"));

    // no key in both maps, and each unordered pair exactly once
    for key in evanescent.keys() {
        assert!(paths.direct.get(key).is_none(), "{}", key);
    }
    let pairs: BTreeSet<(String, String)> = paths
        .direct
        .keys()
        .chain(evanescent.keys())
        .map(|k| unordered(k))
        .collect();
    assert_eq!(pairs.len(), 6);

    // every stitched path runs between its two ports
    let ports = parallel_pair().ports;
    let port = |name: &str| ports.iter().find(|p| p.name == name).unwrap().clone();
    for path in evanescent.values() {
        let (a, b) = (port(&path.ports.first), port(&path.ports.second));
        let (first, last) = (path.first().unwrap(), path.last().unwrap());
        let forward = a.distance_sq(first) < 1.0 && b.distance_sq(last) < 1.0;
        let backward = b.distance_sq(first) < 1.0 && a.distance_sq(last) < 1.0;
        assert!(forward || backward, "{}", path.key());
    }
}

#[test]
fn seeded_extraction_is_repeatable() {
    let settings = Settings {
        over_under_distance: 0.0,
        resample: ResampleStrategy::RandomPadding { seed: 3 },
        ..Settings::default()
    };
    let component = bend(31, 21);
    let first = extract_paths(&component, &settings).unwrap();
    let second = extract_paths(&component, &settings).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.direct["o1;o2"].len(), 31);
}

#[test]
fn default_config_matches_built_in_defaults() {
    let settings = settings::load_default_config().unwrap();
    assert_eq!(settings, Settings::default());
}
