use tracing::{debug, info};

use crate::classify::classify;
use crate::component::Component;
use crate::error::{PathError, Result};
use crate::evanescent::stitch;
use crate::filter::CurveFilter;
use crate::path::PathMap;
use crate::settings::Settings;
use crate::simplify::simplify_layer;


/// Direct and evanescent paths of a component.
#[derive(Debug, Clone, PartialEq)]
pub struct Paths {
    pub direct: PathMap,
    /// `None` unless evanescent coupling was requested; an empty map when it
    /// was but every port pair is already joined directly.
    pub evanescent: Option<PathMap>,
}

impl Paths {
    /// Number of degraded paths in both maps.
    pub fn degraded(&self) -> usize {
        self.direct
            .values()
            .chain(self.evanescent.iter().flat_map(|m| m.values()))
            .filter(|p| p.degraded)
            .count()
    }
}

/// Extracts the paths of a component, smoothing them with the filter from
/// the settings, if any.
pub fn extract_paths(component: &Component, settings: &Settings) -> Result<Paths> {
    let filter = settings
        .smoothing
        .as_ref()
        .map(|sg| sg as &dyn CurveFilter);
    extract_paths_with(component, settings, filter)
}

/// Extracts the paths of a component with a caller supplied filter.
pub fn extract_paths_with(
    component: &Component,
    settings: &Settings,
    filter: Option<&dyn CurveFilter>,
) -> Result<Paths> {
    let ports = component.get_ports();
    if ports.is_empty() {
        return Err(PathError::Precondition {
            component: component.name.clone(),
        });
    }

    let geometry = simplify_layer(component, settings)?;
    debug!(regions = geometry.len(), ports = ports.len(), "classifying regions");
    let (geometry, direct, assigned) = classify(geometry, ports, settings, filter)?;

    let evanescent = if settings.evanescent_coupling {
        let center = geometry.center().unwrap_or_default();
        Some(stitch(&direct, &assigned, center, filter)?)
    } else {
        None
    };

    info!(
        component = %component.name,
        direct = direct.len(),
        evanescent = evanescent.as_ref().map_or(0, |m| m.len()),
        "paths extracted"
    );
    Ok(Paths { direct, evanescent })
}
