use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pathlen::component::Component;
use pathlen::extract::extract_paths;
use pathlen::output::{write_report, Report};
use pathlen::settings::{self, CliArgs};

fn init_logger(verbose: bool) {
    let default = if verbose { "pathlen=debug,info" } else { "pathlen=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // logs go to stderr, the report may go to stdout
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logger(args.verbose);

    let settings = settings::load_config(&args)?;
    tracing::debug!("{}", settings);

    let component = Component::from_file(&args.input)
        .with_context(|| format!("Failed to load component from {}", args.input.display()))?;
    let paths = extract_paths(&component, &settings)?;

    let maps = std::iter::once(&paths.direct).chain(paths.evanescent.as_ref());
    for (key, path) in maps.flat_map(|m| m.iter()) {
        info!(
            path = %key,
            min_radius = path.min_radius(),
            length = path.length(),
            points = path.len(),
            "path"
        );
    }
    let degraded = paths.degraded();
    if degraded > 0 {
        warn!(degraded, "some centerlines could not be validated, check them before use");
    }

    let report = Report::new(&component.name, &paths);
    write_report(&report, args.output.as_deref())?;
    Ok(())
}
