//! Look up vessels by IMO number on the live AISStream feed.
//!
//! Usage:
//!   AISSTREAM_API_KEY=... ais_lookup 9412634 "IMO 9321483"
//!
//! Every IMO is resolved concurrently. Found vessels are printed to stdout as
//! a JSON array, newest first; logs go to stderr (and optionally a file).

use anyhow::{Context, Result, bail};
use futures_util::future::join_all;
use lib_ais::loggers::setup_logging;
use lib_ais::maritime::lineup_order;
use lib_ais::{NormalizedVessel, Resolution, ResolveError, VesselResolver};
use tokio::signal;
use tracing::{error, info, warn};

mod lookup_logic;
use lookup_logic::config;

#[tokio::main]
async fn main() -> Result<()> {
    // Explicitly install the default crypto provider for rustls
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = config::load_config()?;
    let _log_guard = setup_logging(&config.logging_options())?;

    let Some(api_key) = config.api_key().map(str::to_string) else {
        bail!("No API key: pass --api-key or set AISSTREAM_API_KEY");
    };
    if config.imo.is_empty() {
        bail!("No IMO numbers given");
    }

    let feed = config.feed_config();
    feed.validate().context("Invalid feed configuration")?;
    info!(queries = config.imo.len(), url = feed.wss_url(), "Starting lookups");

    let resolver = VesselResolver::new(feed);
    let total_budget = config.total_budget();

    let handles: Vec<_> = config
        .imo
        .iter()
        .cloned()
        .map(|imo| {
            let resolver = resolver.clone();
            let api_key = api_key.clone();
            tokio::spawn(async move {
                let result = resolver.resolve(&api_key, &imo, total_budget).await;
                (imo, result)
            })
        })
        .collect();

    let results = tokio::select! {
        results = join_all(handles) => results,
        _ = signal::ctrl_c() => {
            warn!("Ctrl-C received, abandoning lookups.");
            bail!("Interrupted");
        }
    };

    let mut vessels: Vec<NormalizedVessel> = Vec::new();
    let mut failures = 0usize;
    for joined in results {
        let (imo, result) = match joined {
            Ok(pair) => pair,
            Err(e) => {
                error!(error = %e, "Lookup task failed");
                failures += 1;
                continue;
            }
        };
        match result {
            Ok(Resolution::Complete(vessel)) => vessels.push(vessel),
            Ok(Resolution::Partial(vessel)) => {
                warn!(imo = %imo, "Navigational status not seen in time");
                vessels.push(vessel);
            }
            Err(e @ ResolveError::NotFound { .. }) => {
                warn!(imo = %imo, "{}", e);
                failures += 1;
            }
            Err(e) => {
                error!(imo = %imo, "{}", e);
                failures += 1;
            }
        }
    }

    vessels.sort_by(lineup_order);
    println!("{}", serde_json::to_string_pretty(&vessels)?);

    if failures > 0 {
        bail!("{} of {} lookups failed", failures, config.imo.len());
    }
    Ok(())
}
