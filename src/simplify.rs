//! Layer selection and morphological smoothing of layout polygons.
//!
//! Raw layout shapes of one waveguide are often drawn as several touching or
//! overlapping pieces (straights, bends, tapers). Growing every shape by a
//! small distance and shrinking the union back by the same amount fuses them
//! into one region per physically connected waveguide and removes slivers.

use geo::Centroid;
use geo_clipper::{Clipper, EndType, JoinType};
use geo_types::{Coord, MultiPolygon, Polygon};
use tracing::debug;

use crate::component::Component;
use crate::error::{PathError, Result};
use crate::settings::{Settings, CLIP_TOLERANCE, MITER_LIMIT};


/// Simplified layer geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// One connected region.
    Single(Polygon<f64>),
    /// Several disjoint regions.
    Multi(MultiPolygon<f64>),
    /// Regions produced by splitting a single polygon.
    Collection(Vec<Polygon<f64>>),
}

impl Geometry {
    /// `Single` for one region, `Multi` otherwise.
    pub fn from_regions(regions: MultiPolygon<f64>) -> Self {
        if regions.0.len() == 1 {
            let mut regions = regions;
            match regions.0.pop() {
                Some(poly) => Geometry::Single(poly),
                None => Geometry::Multi(regions),
            }
        } else {
            Geometry::Multi(regions)
        }
    }

    pub fn regions(&self) -> Vec<&Polygon<f64>> {
        match self {
            Geometry::Single(poly) => vec![poly],
            Geometry::Multi(multi) => multi.0.iter().collect(),
            Geometry::Collection(polys) => polys.iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.regions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Geometric center of all regions.
    ///
    /// The area-weighted centroid for a polygon or multi polygon; the plain
    /// mean of the region centroids for a collection.
    pub fn center(&self) -> Option<Coord<f64>> {
        match self {
            Geometry::Single(poly) => poly.centroid().map(|p| p.0),
            Geometry::Multi(multi) => multi.centroid().map(|p| p.0),
            Geometry::Collection(polys) => {
                let centroids: Vec<Coord<f64>> =
                    polys.iter().filter_map(|p| p.centroid()).map(|p| p.0).collect();
                if centroids.is_empty() {
                    return None;
                }
                let n = centroids.len() as f64;
                let sum = centroids
                    .into_iter()
                    .fold(Coord { x: 0.0, y: 0.0 }, |acc, c| acc + c);
                Some(sum / n)
            }
        }
    }
}

/// Grows every polygon by `distance` and shrinks the union back.
pub fn over_under(polygons: &MultiPolygon<f64>, distance: f64) -> MultiPolygon<f64> {
    if distance <= 0.0 {
        return polygons.union(&MultiPolygon::<f64>(vec![]), CLIP_TOLERANCE);
    }
    let grown = polygons.offset(
        distance,
        JoinType::Miter(MITER_LIMIT),
        EndType::ClosedPolygon,
        CLIP_TOLERANCE,
    );
    grown.offset(
        -distance,
        JoinType::Miter(MITER_LIMIT),
        EndType::ClosedPolygon,
        CLIP_TOLERANCE,
    )
}

/// Selects the configured layer of a component and smooths it into regions.
pub fn simplify_layer(component: &Component, settings: &Settings) -> Result<Geometry> {
    let raw = component.layer_polygons(settings.layer);
    if raw.0.is_empty() {
        return Err(PathError::EmptyLayer {
            layer: settings.layer.to_string(),
        });
    }
    let merged = over_under(&raw, settings.over_under_distance);
    debug!(
        component = %component.name,
        raw = raw.0.len(),
        regions = merged.0.len(),
        "simplified layer"
    );
    if merged.0.is_empty() {
        return Err(PathError::EmptyLayer {
            layer: settings.layer.to_string(),
        });
    }
    Ok(Geometry::from_regions(merged))
}
