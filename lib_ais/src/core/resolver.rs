//! # Two-Stage Resolver
//!
//! ```text
//! resolve(imo)
//!   phase 1: ShipStaticData where imo == query   (larger budget share)
//!     miss  -> NotFound
//!     hit without MMSI -> Complete, no phase 2
//!   phase 2: PositionReport where mmsi == phase-1 mmsi   (own budget)
//!     miss  -> Partial (navStatus = null)
//!     hit   -> Complete
//! ```
//!
//! Only the first matching identity report counts; later duplicates are
//! never looked at because the phase-1 listener is already gone.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::configs::FeedConfig;
use crate::ingestors::{ListenOutcome, StreamListener, SubscriptionFilter};
use crate::maritime::aisstream::{POSITION_REPORT, SHIP_STATIC_DATA};
use crate::maritime::{
    normalize_imo, parse_position_report, parse_static_identity, NormalizedVessel, StaticIdentity,
};
use crate::utils::current_datetime_rfc9557;

/// Why a resolution produced no vessel.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The query isn't an IMO number.
    #[error("Invalid IMO query '{0}' (expected digits, e.g. 9412634)")]
    InvalidQuery(String),

    /// Empty or blank API key.
    #[error("Missing feed credential")]
    MissingCredential,

    /// The IMO was never observed within the identity budget, or the feed was
    /// unreachable. Both look the same to the caller.
    #[error("No AIS identity report seen for IMO {imo}")]
    NotFound {
        /// The normalized query.
        imo: String,
    },
}

/// A successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Identity resolved, and status too when an MMSI was available.
    Complete(NormalizedVessel),
    /// Identity resolved; the status phase timed out or failed.
    Partial(NormalizedVessel),
}

impl Resolution {
    /// The record, complete or not.
    pub fn vessel(&self) -> &NormalizedVessel {
        match self {
            Resolution::Complete(v) | Resolution::Partial(v) => v,
        }
    }

    /// Unwraps the record.
    pub fn into_vessel(self) -> NormalizedVessel {
        match self {
            Resolution::Complete(v) | Resolution::Partial(v) => v,
        }
    }

    /// `false` when the status phase came up empty.
    pub fn is_complete(&self) -> bool {
        matches!(self, Resolution::Complete(_))
    }
}

/// Resolves vessels against one feed endpoint.
///
/// Holds configuration only. Every query opens its own connections, so one
/// resolver can serve any number of concurrent queries.
#[derive(Debug, Clone)]
pub struct VesselResolver {
    config: FeedConfig,
}

impl VesselResolver {
    /// A resolver for the endpoint and budgets in `config`.
    pub fn new(config: FeedConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Current identity and status for `imo`, or `None` if the vessel wasn't
    /// seen in time. A missing status still returns the record.
    pub async fn resolve_by_imo(
        &self,
        credential: &str,
        imo: &str,
        total_budget: Option<Duration>,
    ) -> Option<NormalizedVessel> {
        match self.resolve(credential, imo, total_budget).await {
            Ok(resolution) => Some(resolution.into_vessel()),
            Err(e) => {
                debug!(error = %e, "Resolution produced no vessel");
                None
            }
        }
    }

    /// Like [`resolve_by_imo`](Self::resolve_by_imo) but keeps the distinction
    /// between complete, partial and failed resolutions.
    pub async fn resolve(
        &self,
        credential: &str,
        imo: &str,
        total_budget: Option<Duration>,
    ) -> Result<Resolution, ResolveError> {
        if credential.trim().is_empty() {
            return Err(ResolveError::MissingCredential);
        }
        let query = normalize_imo(imo).ok_or_else(|| ResolveError::InvalidQuery(imo.to_string()))?;
        let budgets = self.config.budgets(total_budget);

        info!(imo = %query, identity_ms = budgets.identity.as_millis() as u64, "Resolving vessel identity");
        let mut identity = match self.find_identity(credential, &query, budgets.identity).await {
            ListenOutcome::Matched(identity) => identity,
            ListenOutcome::TimedOut => {
                info!(imo = %query, "Identity phase timed out");
                return Err(ResolveError::NotFound { imo: query });
            }
            ListenOutcome::ConnectionError(e) => {
                warn!(imo = %query, error = %e, "Identity phase lost the feed");
                return Err(ResolveError::NotFound { imo: query });
            }
        };
        identity.imo = Some(query.clone());

        let Some(mmsi) = identity.mmsi.clone() else {
            info!(imo = %query, "Identity has no MMSI; skipping status phase");
            let vessel = NormalizedVessel::from_identity(identity, None, current_datetime_rfc9557());
            return Ok(Resolution::Complete(vessel));
        };

        info!(imo = %query, mmsi = %mmsi, status_ms = budgets.status.as_millis() as u64, "Resolving vessel status");
        let status = match self.find_status(credential, &mmsi, budgets.status).await {
            ListenOutcome::Matched(status) => Some(status),
            ListenOutcome::TimedOut => {
                info!(mmsi = %mmsi, "Status phase timed out; returning partial record");
                None
            }
            ListenOutcome::ConnectionError(e) => {
                warn!(mmsi = %mmsi, error = %e, "Status phase lost the feed; returning partial record");
                None
            }
        };

        let complete = status.is_some();
        let vessel = NormalizedVessel::from_identity(identity, status, current_datetime_rfc9557());
        Ok(if complete {
            Resolution::Complete(vessel)
        } else {
            Resolution::Partial(vessel)
        })
    }

    fn listener(&self) -> StreamListener {
        StreamListener::new(self.config.wss_url()).with_close_grace(self.config.close_grace())
    }

    async fn find_identity(
        &self,
        credential: &str,
        query: &str,
        budget: Duration,
    ) -> ListenOutcome<StaticIdentity> {
        let filter = SubscriptionFilter::message_types(&[SHIP_STATIC_DATA]);
        self.listener()
            .listen(
                credential,
                &filter,
                |raw| {
                    let identity = parse_static_identity(raw)?;
                    let same_imo = identity.imo.as_deref() == Some(query);
                    same_imo.then_some(identity)
                },
                budget,
            )
            .await
    }

    async fn find_status(&self, credential: &str, mmsi: &str, budget: Duration) -> ListenOutcome<String> {
        let mut filter = SubscriptionFilter::message_types(&[POSITION_REPORT]);
        if self.config.server_side_mmsi_filter() {
            filter = filter.with_mmsi(mmsi);
        }
        // Feed-side MMSI filtering isn't guaranteed, so every report is re-checked.
        self.listener()
            .listen(
                credential,
                &filter,
                |raw| {
                    let report = parse_position_report(raw)?;
                    if report.mmsi.as_deref() != Some(mmsi) || report.nav_status.is_empty() {
                        return None;
                    }
                    Some(report.nav_status)
                },
                budget,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_bad_queries_before_connecting() {
        let resolver = VesselResolver::new(FeedConfig {
            wss_url: Some("ws://127.0.0.1:1".into()),
            ..FeedConfig::defaults()
        });
        assert!(matches!(
            resolver.resolve("key", "not-an-imo", None).await,
            Err(ResolveError::InvalidQuery(_))
        ));
        assert!(matches!(
            resolver.resolve("  ", "9412634", None).await,
            Err(ResolveError::MissingCredential)
        ));
    }

    #[tokio::test]
    async fn unreachable_feed_is_not_found() {
        // Bind then drop to get a port with nothing listening
        let port = {
            let sock = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            sock.local_addr().unwrap().port()
        };
        let resolver = VesselResolver::new(FeedConfig {
            wss_url: Some(format!("ws://127.0.0.1:{}", port)),
            ..FeedConfig::defaults()
        });
        let result = resolver.resolve("key", "IMO 9412634", Some(Duration::from_secs(5))).await;
        match result {
            Err(ResolveError::NotFound { imo }) => assert_eq!(imo, "9412634"),
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert_eq!(resolver.resolve_by_imo("key", "9412634", None).await, None);
    }
}
