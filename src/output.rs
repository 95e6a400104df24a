use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path as FilePath;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::extract::Paths;
use crate::path::{Path, PathMap, PortPair};


/// Summary of one path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathReport {
    pub key: String,
    pub ports: PortPair,
    /// Smallest bend radius; absent for a path without a measurable bend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_radius: Option<f64>,
    pub length: f64,
    pub degraded: bool,
    pub points: Vec<[f64; 2]>,
}

impl PathReport {
    pub fn new(path: &Path) -> Self {
        let min_radius = path.min_radius();
        Self {
            key: path.key(),
            ports: path.ports.clone(),
            min_radius: min_radius.is_finite().then_some(min_radius),
            length: path.length(),
            degraded: path.degraded,
            points: path.points.iter().map(|c| [c.x, c.y]).collect(),
        }
    }
}

/// Everything written out for one component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub component: String,
    pub direct: Vec<PathReport>,
    pub evanescent: Vec<PathReport>,
}

impl Report {
    pub fn new(component: &str, paths: &Paths) -> Self {
        let entries = |map: &PathMap| map.values().map(PathReport::new).collect::<Vec<_>>();
        Self {
            component: component.to_string(),
            direct: entries(&paths.direct),
            evanescent: paths.evanescent.as_ref().map(entries).unwrap_or_default(),
        }
    }
}

/// Writes the report as JSON, or TOML for a `.toml` file. Without a file the
/// JSON goes to stdout.
pub fn write_report(report: &Report, output: Option<&FilePath>) -> Result<()> {
    let Some(output) = output else {
        let stdout = std::io::stdout();
        let mut writer = BufWriter::new(stdout.lock());
        serde_json::to_writer_pretty(&mut writer, report)?;
        writeln!(writer)?;
        return Ok(());
    };

    let file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let mut writer = BufWriter::new(file);
    if output.extension().is_some_and(|ext| ext == "toml") {
        let text = toml::to_string_pretty(report).context("Failed to serialize report")?;
        writer.write_all(text.as_bytes())?;
    } else {
        serde_json::to_writer_pretty(&mut writer, report)?;
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}
