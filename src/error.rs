use thiserror::Error;

/// Failures surfaced by path extraction.
///
/// Recovery from a bad inner/outer split is local to the centerline
/// extractor and never shows up here; see [`crate::path::Path::degraded`].
#[derive(Error, Debug)]
pub enum PathError {
    #[error("component `{component}` has no ports, path length extraction will not work")]
    Precondition { component: String },

    #[error(
        "region {region} contains {ports} ports; the component looks like it can be \
         broken down into subcomponents and needs to be decomposed first"
    )]
    Topology { region: usize, ports: usize },

    #[error("layer {layer} holds no polygons")]
    EmptyLayer { layer: String },

    #[error("no direct path contains port `{port}`")]
    MissingDirectPath { port: String },

    #[error("direct path `{key}` has no points")]
    EmptyPath { key: String },

    #[error("polygon region {region} has a degenerate boundary with {points} points")]
    DegenerateBoundary { region: usize, points: usize },

    #[error("could not build interpolator: {0}")]
    InterpolationSetup(#[from] ndarray_interp::BuilderError),

    #[error("interpolation failed: {0}")]
    Interpolation(#[from] ndarray_interp::InterpolateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed component description: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PathError>;
