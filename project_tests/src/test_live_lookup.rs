//! Live smoke test against the real AISStream feed.
//!
//! Usage:
//!   AISSTREAM_API_KEY=... cargo run -p project_tests --bin test_live_lookup -- 9412634
//!
//! A busy vessel usually resolves within the default budget; a quiet one may
//! legitimately come back empty.

use anyhow::{Result, bail};
use clap::Parser;
use lib_ais::loggers::{LoggingOptions, setup_logging};
use lib_ais::{FeedConfig, Resolution, VesselResolver};
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(about = "Resolve one IMO against the live feed and print the record")]
struct Args {
    #[clap(default_value = "9412634")]
    imo: String,

    #[clap(long, env = "AISSTREAM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[clap(long, default_value_t = 30)]
    budget_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Explicitly install the default crypto provider for rustls
    let _ = rustls::crypto::ring::default_provider().install_default();

    let args = Args::parse();
    let _guard = setup_logging(&LoggingOptions {
        app_name: "test_live_lookup".to_string(),
        level: "debug".to_string(),
        ..Default::default()
    })?;

    let Some(api_key) = args.api_key.filter(|k| !k.trim().is_empty()) else {
        bail!("Set AISSTREAM_API_KEY to run the live lookup");
    };

    let resolver = VesselResolver::new(FeedConfig::defaults());
    let budget = Some(Duration::from_secs(args.budget_secs));
    match resolver.resolve(&api_key, &args.imo, budget).await {
        Ok(resolution) => {
            let label = match &resolution {
                Resolution::Complete(_) => "complete",
                Resolution::Partial(_) => "partial",
            };
            println!("Resolution is {}:", label);
            println!("{}", serde_json::to_string_pretty(resolution.vessel())?);
            Ok(())
        }
        Err(e) => {
            println!("No vessel: {}", e);
            Ok(())
        }
    }
}
