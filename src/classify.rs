//! Assignment of ports to layer regions and dispatch to centerline extraction.
//!
//! Every region of the simplified layer must hold exactly two ports; its
//! centerline is keyed by the two port names in the order the component
//! declares them. A single region with more than two ports (an MMI, say) is
//! assumed symmetric about its horizontal midline and cut in two first.

use geo::{BoundingRect, Contains};
use geo_clipper::{Clipper, EndType, JoinType};
use geo_types::{coord, Point, Polygon, Rect};
use tracing::debug;

use crate::centerline::extract_centerline;
use crate::component::Port;
use crate::error::{PathError, Result};
use crate::filter::CurveFilter;
use crate::path::{Path, PathMap, PortPair};
use crate::settings::{Settings, CLIP_TOLERANCE, MITER_LIMIT};
use crate::simplify::Geometry;

#[cfg(test)]
mod tests {

    use super::*;
    use geo::polygon;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]
    }

    fn mmi_ports() -> Vec<Port> {
        vec![
            Port::new("o1", (0.0, -0.75), 180.0, 0.5),
            Port::new("o2", (0.0, 0.75), 180.0, 0.5),
            Port::new("o3", (10.0, 0.75), 0.0, 0.5),
            Port::new("o4", (10.0, -0.75), 0.0, 0.5),
        ]
    }

    #[test]
    fn ports_on_the_boundary_count() {
        let region = rect(0.0, -0.25, 10.0, 0.25);
        let ports = [
            Port::new("o1", (0.0, 0.0), 180.0, 0.5),
            Port::new("o2", (10.0, 0.0), 0.0, 0.5),
            Port::new("far", (20.0, 0.0), 0.0, 0.5),
        ];
        let inside = ports_in_region(&region, &ports, &Settings::default());
        let names: Vec<&str> = inside.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["o1", "o2"]);
    }

    #[test]
    fn symmetric_split_halves() {
        let geometry = split_symmetric(&rect(0.0, -1.5, 10.0, 1.5));
        assert!(matches!(geometry, Geometry::Collection(_)));
        assert_eq!(geometry.len(), 2);

        let ports = mmi_ports();
        for region in geometry.regions() {
            assert_eq!(ports_in_region(region, &ports, &Settings::default()).len(), 2);
        }
    }

    #[test]
    fn two_port_polygon_is_extracted_directly() {
        let ports = [
            Port::new("o1", (0.0, 0.0), 180.0, 1.0),
            Port::new("o2", (10.0, 0.0), 0.0, 1.0),
        ];
        let geometry = Geometry::Single(rect(0.0, -0.5, 10.0, 0.5));
        let (geometry, paths, assigned) =
            classify(geometry, &ports, &Settings::default(), None).unwrap();
        assert!(matches!(geometry, Geometry::Single(_)));
        assert_eq!(paths.keys().collect::<Vec<_>>(), vec!["o1;o2"]);
        assert_eq!(assigned.len(), 2);
        assert!(!paths["o1;o2"].degraded);
    }

    #[test]
    fn four_port_polygon_is_split() {
        let ports = mmi_ports();
        let geometry = Geometry::Single(rect(0.0, -1.5, 10.0, 1.5));
        let (geometry, paths, assigned) =
            classify(geometry, &ports, &Settings::default(), None).unwrap();
        assert_eq!(geometry.len(), 2);
        assert_eq!(assigned.len(), 4);
        assert_eq!(paths.len(), 2);
        assert!(paths.connects("o1", "o4"));
        assert!(paths.connects("o2", "o3"));

        let lower = &paths["o1;o4"];
        for c in &lower.points {
            assert!((c.y + 0.75).abs() < 1e-9, "{:?}", c);
        }
    }

    #[test]
    fn three_ports_in_one_region_is_a_topology_error() {
        let ports = [
            Port::new("o1", (0.0, 0.0), 180.0, 0.5),
            Port::new("o2", (10.0, 0.0), 0.0, 0.5),
            Port::new("o3", (5.0, 0.0), 90.0, 0.5),
            Port::new("o4", (0.0, 5.0), 180.0, 0.5),
            Port::new("o5", (10.0, 5.0), 0.0, 0.5),
        ];
        let geometry = Geometry::Multi(geo_types::MultiPolygon(vec![
            rect(0.0, -0.25, 10.0, 0.25),
            rect(0.0, 4.75, 10.0, 5.25),
        ]));
        let result = classify(geometry, &ports, &Settings::default(), None);
        assert!(matches!(
            result,
            Err(PathError::Topology {
                region: 0,
                ports: 3
            })
        ));
    }

    #[test]
    fn filter_is_applied() {
        let ports = [
            Port::new("o1", (0.0, 0.0), 180.0, 1.0),
            Port::new("o2", (10.0, 0.0), 0.0, 1.0),
        ];
        let shift = |points: &[geo_types::Coord<f64>]| -> Vec<geo_types::Coord<f64>> {
            points.iter().map(|c| coord! { x: c.x, y: c.y + 1.0 }).collect()
        };
        let geometry = Geometry::Single(rect(0.0, -0.5, 10.0, 0.5));
        let (_, paths, _) = classify(geometry, &ports, &Settings::default(), Some(&shift)).unwrap();
        assert!(paths["o1;o2"].points.iter().all(|c| c.y == 1.0));
    }
}

/// Ports whose center lies inside `region` grown by the port tolerance.
pub fn ports_in_region<'a>(
    region: &Polygon<f64>,
    ports: &'a [Port],
    settings: &Settings,
) -> Vec<&'a Port> {
    let dilated = region.offset(
        settings.port_tolerance,
        JoinType::Miter(MITER_LIMIT),
        EndType::ClosedPolygon,
        CLIP_TOLERANCE,
    );
    ports
        .iter()
        .filter(|port| dilated.contains(&Point::from(port.center)))
        .collect()
}

/// Cuts a polygon along the horizontal line through the middle of its
/// bounding box.
pub fn split_symmetric(polygon: &Polygon<f64>) -> Geometry {
    let Some(bounds) = polygon.bounding_rect() else {
        return Geometry::Collection(vec![]);
    };
    let (min, max) = (bounds.min(), bounds.max());
    let y_mid = 0.5 * (min.y + max.y);
    // halves overshoot the bounds so no boundary edge is clipped twice
    let margin = 1.0 + bounds.width().max(bounds.height());

    let lower = Rect::new(
        coord! { x: min.x - margin, y: min.y - margin },
        coord! { x: max.x + margin, y: y_mid },
    );
    let upper = Rect::new(
        coord! { x: min.x - margin, y: y_mid },
        coord! { x: max.x + margin, y: max.y + margin },
    );

    let pieces = [lower, upper]
        .iter()
        .flat_map(|half| polygon.intersection(&half.to_polygon(), CLIP_TOLERANCE).0)
        .collect();
    Geometry::Collection(pieces)
}

/// Extracts the centerline of every region.
///
/// Returns the geometry actually used (split for a single multi-port
/// polygon), the direct paths, and every port assigned to a region in
/// assignment order.
pub fn classify(
    geometry: Geometry,
    ports: &[Port],
    settings: &Settings,
    filter: Option<&dyn CurveFilter>,
) -> Result<(Geometry, PathMap, Vec<Port>)> {
    let mut paths = PathMap::new();

    let geometry = match geometry {
        Geometry::Single(polygon) if ports.len() == 2 => {
            let region: Vec<&Port> = ports.iter().collect();
            let path = region_path(&polygon, 0, &region, settings, filter)?;
            paths.insert(path);
            return Ok((Geometry::Single(polygon), paths, ports.to_vec()));
        }
        Geometry::Single(polygon) => {
            debug!(
                ports = ports.len(),
                "single polygon with more than two ports, splitting at the vertical midpoint"
            );
            split_symmetric(&polygon)
        }
        other => other,
    };

    let mut assigned = Vec::new();
    for (index, region) in geometry.regions().into_iter().enumerate() {
        let inside = ports_in_region(region, ports, settings);
        if inside.len() != 2 {
            return Err(PathError::Topology {
                region: index,
                ports: inside.len(),
            });
        }
        let path = region_path(region, index, &inside, settings, filter)?;
        debug!(region = index, key = %path.key(), points = path.len(), "region extracted");
        paths.insert(path);
        assigned.extend(inside.into_iter().cloned());
    }

    Ok((geometry, paths, assigned))
}

fn region_path(
    region: &Polygon<f64>,
    index: usize,
    ports: &[&Port],
    settings: &Settings,
    filter: Option<&dyn CurveFilter>,
) -> Result<Path> {
    let centerline = extract_centerline(region, ports, settings).map_err(|err| match err {
        PathError::DegenerateBoundary { points, .. } => PathError::DegenerateBoundary {
            region: index,
            points,
        },
        other => other,
    })?;

    let degraded = centerline.is_degraded();
    let points = match filter {
        Some(filter) => filter.apply(&centerline.points),
        None => centerline.points,
    };
    let mut path = Path::new(PortPair::new(&ports[0].name, &ports[1].name), points);
    path.degraded = degraded;
    Ok(path)
}
