//! Layout input model.
//!
//! A [`Component`] is the opaque handoff from the layout toolkit: its ports
//! (read-only here) and the raw polygons of every layer, all in the same
//! coordinate space. Components are usually produced by an external GDS
//! exporter as JSON and loaded with [`Component::from_file`].

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

use crate::error::Result;


/// A GDS layer and datatype pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(u16, u16)", into = "(u16, u16)")]
pub struct Layer {
    pub layer: u16,
    pub datatype: u16,
}

impl Layer {
    pub const fn new(layer: u16, datatype: u16) -> Self {
        Self { layer, datatype }
    }
}

impl Default for Layer {
    fn default() -> Self {
        Layer::new(1, 0)
    }
}

impl From<(u16, u16)> for Layer {
    fn from((layer, datatype): (u16, u16)) -> Self {
        Layer::new(layer, datatype)
    }
}

impl From<Layer> for (u16, u16) {
    fn from(layer: Layer) -> Self {
        (layer.layer, layer.datatype)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.layer, self.datatype)
    }
}

impl std::str::FromStr for Layer {
    type Err = String;

    /// Parses `layer/datatype` or `layer,datatype`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(|c: char| c == '/' || c == ',').collect();
        if parts.len() != 2 {
            return Err(format!(
                "Invalid layer format: '{}'. Expected 'layer/datatype'",
                s
            ));
        }
        let layer = parts[0]
            .trim()
            .parse::<u16>()
            .map_err(|_| format!("Failed to parse layer number: {}", parts[0]))?;
        let datatype = parts[1]
            .trim()
            .parse::<u16>()
            .map_err(|_| format!("Failed to parse datatype: {}", parts[1]))?;
        Ok(Layer::new(layer, datatype))
    }
}

/// An optical port of a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    #[serde(with = "coord_array")]
    pub center: Coord<f64>,
    /// Orientation in degrees.
    #[serde(default)]
    pub orientation: f64,
    #[serde(default)]
    pub width: f64,
}

impl Port {
    pub fn new(name: &str, center: (f64, f64), orientation: f64, width: f64) -> Self {
        Self {
            name: name.to_string(),
            center: Coord {
                x: center.0,
                y: center.1,
            },
            orientation,
            width,
        }
    }

    /// Squared distance from the port center to a point.
    pub fn distance_sq(&self, point: &Coord<f64>) -> f64 {
        let d = *point - self.center;
        d.x * d.x + d.y * d.y
    }
}

/// One polygon of a layer, stored as an open ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerPolygon {
    pub layer: Layer,
    pub points: Vec<[f64; 2]>,
}

impl LayerPolygon {
    pub fn new(layer: Layer, polygon: &Polygon<f64>) -> Self {
        let ring = &polygon.exterior().0;
        let open = if ring.len() > 1 && ring.first() == ring.last() {
            &ring[..ring.len() - 1]
        } else {
            &ring[..]
        };
        Self {
            layer,
            points: open.iter().map(|c| [c.x, c.y]).collect(),
        }
    }

    /// Returns the polygon, which closes the ring.
    pub fn to_polygon(&self) -> Polygon<f64> {
        let exterior: Vec<Coord<f64>> = self
            .points
            .iter()
            .map(|p| Coord { x: p[0], y: p[1] })
            .collect();
        Polygon::new(LineString(exterior), vec![])
    }
}

/// A layout component: ports plus layered polygons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub ports: Vec<Port>,
    #[serde(default)]
    pub polygons: Vec<LayerPolygon>,
}

impl Component {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ports: Vec::new(),
            polygons: Vec::new(),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn add_port(&mut self, port: Port) {
        self.ports.push(port);
    }

    pub fn add_polygon(&mut self, layer: Layer, polygon: &Polygon<f64>) {
        self.polygons.push(LayerPolygon::new(layer, polygon));
    }

    /// Ports in declaration order.
    pub fn get_ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn port_names(&self) -> Vec<&str> {
        self.ports.iter().map(|p| p.name.as_str()).collect()
    }

    /// Raw polygons drawn on `layer`.
    pub fn layer_polygons(&self, layer: Layer) -> MultiPolygon<f64> {
        MultiPolygon(
            self.polygons
                .iter()
                .filter(|p| p.layer == layer)
                .map(LayerPolygon::to_polygon)
                .collect(),
        )
    }
}

mod coord_array {
    use geo_types::Coord;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(coord: &Coord<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        [coord.x, coord.y].serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Coord<f64>, D::Error> {
        let [x, y] = <[f64; 2]>::deserialize(deserializer)?;
        Ok(Coord { x, y })
    }
}
