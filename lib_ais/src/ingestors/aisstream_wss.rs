//! # AISStream WSS Listener
//!
//! Owns exactly one feed connection for the duration of one wait:
//!
//! ```text
//! CONNECTING -> OPEN -> (MATCHED | TIMED_OUT | CONNECTION_ERROR) -> CLOSED
//! ```
//!
//! The wall-clock budget covers connect, subscription and the wait itself.
//! Whatever ends the wait (a match, the deadline, or the socket going away),
//! the connection is closed once on the way out and never outlives `listen`.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::{sleep_until, timeout, timeout_at, Instant};
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message as WsMessage, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, trace, warn};
use url::Url;

use crate::maritime::RawMessage;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// The whole globe, as `[[[lat_min, lon_min], [lat_max, lon_max]]]`.
pub const WORLD_BOUNDING_BOX: [[[f64; 2]; 2]; 1] = [[[-90.0, -180.0], [90.0, 180.0]]];

const DEFAULT_CLOSE_GRACE: Duration = Duration::from_secs(2);
// Stand-in deadline for budgets too large to add to `Instant::now()`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Transport failures. These never escape [`StreamListener::listen`]; they ride
/// inside [`ListenOutcome::ConnectionError`] for diagnostics.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The URL didn't parse; nothing was dialled.
    #[error("Invalid feed URL '{url}': {reason}")]
    InvalidUrl {
        /// The URL as given.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// TCP, TLS or WebSocket handshake failure.
    #[error("Failed to connect to feed: {0}")]
    Connect(String),

    /// The subscription message couldn't be written.
    #[error("Failed to send subscription: {0}")]
    Send(String),

    /// Close frame or end of stream.
    #[error("Feed closed the connection before a match")]
    Closed,

    /// Read error on an open connection.
    #[error("Feed transport error: {0}")]
    Transport(String),
}

/// Terminal result of one wait.
#[derive(Debug)]
pub enum ListenOutcome<T> {
    /// The predicate accepted a message.
    Matched(T),
    /// The budget ran out first.
    TimedOut,
    /// The connection failed to open or dropped before a match.
    ConnectionError(StreamError),
}

impl<T> ListenOutcome<T> {
    /// The match, if any. Timeouts and transport errors both become `None`.
    pub fn into_match(self) -> Option<T> {
        match self {
            ListenOutcome::Matched(hit) => Some(hit),
            _ => None,
        }
    }

    /// Whether the predicate accepted a message.
    pub fn is_matched(&self) -> bool {
        matches!(self, ListenOutcome::Matched(_))
    }

    fn state(&self) -> ListenerState {
        match self {
            ListenOutcome::Matched(_) => ListenerState::Matched,
            ListenOutcome::TimedOut => ListenerState::TimedOut,
            ListenOutcome::ConnectionError(_) => ListenerState::ConnectionError,
        }
    }
}

/// Lifecycle of a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Dialling the feed.
    Connecting,
    /// Subscribed and waiting for messages.
    Open,
    /// The predicate accepted a message.
    Matched,
    /// The budget ran out.
    TimedOut,
    /// The connection failed or dropped.
    ConnectionError,
    /// Torn down. Terminal.
    Closed,
}

/// Filters sent with the subscription handshake.
///
/// Server-side filtering is only an optimization: predicates must still check
/// every field they care about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionFilter {
    /// `FilterMessageTypes`, e.g. `["PositionReport"]`.
    pub message_types: Vec<String>,
    /// `FiltersShipMMSI`.
    pub ship_mmsi: Vec<String>,
}

impl SubscriptionFilter {
    /// Restricts the feed to the given message types.
    pub fn message_types(types: &[&str]) -> Self {
        Self {
            message_types: types.iter().map(|t| t.to_string()).collect(),
            ship_mmsi: Vec::new(),
        }
    }

    /// Additionally restricts the feed to one vessel.
    pub fn with_mmsi(mut self, mmsi: impl Into<String>) -> Self {
        self.ship_mmsi.push(mmsi.into());
        self
    }
}

/// The subscription handshake as the feed expects it.
#[derive(Serialize)]
struct SubscriptionRequest<'a> {
    #[serde(rename = "APIKey")]
    api_key: &'a str,
    #[serde(rename = "BoundingBoxes")]
    bounding_boxes: [[[f64; 2]; 2]; 1],
    #[serde(rename = "FilterMessageTypes", skip_serializing_if = "Vec::is_empty")]
    filter_message_types: Vec<String>,
    #[serde(rename = "FiltersShipMMSI", skip_serializing_if = "Vec::is_empty")]
    filters_ship_mmsi: Vec<String>,
}

impl<'a> SubscriptionRequest<'a> {
    fn new(api_key: &'a str, filter: &SubscriptionFilter) -> Self {
        Self {
            api_key,
            bounding_boxes: WORLD_BOUNDING_BOX,
            filter_message_types: filter.message_types.clone(),
            filters_ship_mmsi: filter.ship_mmsi.clone(),
        }
    }
}

/// A single-use listener bound to one feed URL.
///
/// `listen` consumes the listener, so a finished listener can't be reused.
pub struct StreamListener {
    url: String,
    close_grace: Duration,
    state: ListenerState,
}

impl StreamListener {
    /// A listener for `url` in the `Connecting` state.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            close_grace: DEFAULT_CLOSE_GRACE,
            state: ListenerState::Connecting,
        }
    }

    /// Upper bound on the close handshake during teardown.
    pub fn with_close_grace(mut self, close_grace: Duration) -> Self {
        self.close_grace = close_grace;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ListenerState {
        self.state
    }

    /// Subscribes with `credential` and `filter`, then feeds every inbound
    /// message to `predicate` until it returns `Some`, the `budget` elapses,
    /// or the connection fails.
    ///
    /// Frames that don't decode as JSON are skipped. Messages are handled one
    /// at a time, so the predicate may keep mutable state without locking.
    pub async fn listen<T, F>(
        mut self,
        credential: &str,
        filter: &SubscriptionFilter,
        mut predicate: F,
        budget: Duration,
    ) -> ListenOutcome<T>
    where
        F: FnMut(&RawMessage) -> Option<T>,
    {
        let deadline = deadline_after(budget);

        if let Err(reason) = Url::parse(&self.url) {
            let err = StreamError::InvalidUrl {
                url: self.url.clone(),
                reason: reason.to_string(),
            };
            return self.finish_unopened(ListenOutcome::ConnectionError(err));
        }

        debug!(url = %self.url, budget_ms = budget.as_millis() as u64, "Connecting to AIS feed");
        let mut ws = match timeout_at(deadline, connect_async(self.url.as_str())).await {
            Ok(Ok((ws, _response))) => ws,
            Ok(Err(e)) => {
                warn!(url = %self.url, error = %e, "AIS feed connection failed");
                return self.finish_unopened(ListenOutcome::ConnectionError(StreamError::Connect(
                    e.to_string(),
                )));
            }
            Err(_) => return self.finish_unopened(ListenOutcome::TimedOut),
        };

        self.transition(ListenerState::Open);
        let outcome = Self::pump(&mut ws, credential, filter, &mut predicate, deadline).await;
        self.transition(outcome.state());
        if let ListenOutcome::ConnectionError(e) = &outcome {
            warn!(url = %self.url, error = %e, "AIS feed dropped before a match");
        }

        self.teardown(ws).await;
        outcome
    }

    /// Sends the subscription and runs the receive loop against the deadline.
    async fn pump<T, F>(
        ws: &mut WsStream,
        credential: &str,
        filter: &SubscriptionFilter,
        predicate: &mut F,
        deadline: Instant,
    ) -> ListenOutcome<T>
    where
        F: FnMut(&RawMessage) -> Option<T>,
    {
        let payload = match serde_json::to_string(&SubscriptionRequest::new(credential, filter)) {
            Ok(payload) => payload,
            Err(e) => return ListenOutcome::ConnectionError(StreamError::Transport(e.to_string())),
        };
        debug!(
            message_types = ?filter.message_types,
            ship_mmsi = ?filter.ship_mmsi,
            "Sending AIS subscription"
        );
        match timeout_at(deadline, ws.send(WsMessage::Text(payload.into()))).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return ListenOutcome::ConnectionError(StreamError::Send(e.to_string())),
            Err(_) => return ListenOutcome::TimedOut,
        }

        // The one timer for this wait; dropped with this frame on any exit.
        let timer = sleep_until(deadline);
        tokio::pin!(timer);

        loop {
            let decoded = tokio::select! {
                _ = &mut timer => return ListenOutcome::TimedOut,
                frame = ws.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => RawMessage::from_text(text.as_str()),
                    Some(Ok(WsMessage::Binary(bytes))) => RawMessage::from_slice(&bytes),
                    Some(Ok(WsMessage::Close(_))) | None => {
                        return ListenOutcome::ConnectionError(StreamError::Closed)
                    }
                    // Ping/Pong/raw frames are protocol traffic, not feed messages
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        return ListenOutcome::ConnectionError(StreamError::Transport(e.to_string()))
                    }
                },
            };

            match decoded {
                Ok(raw) => {
                    if let Some(hit) = predicate(&raw) {
                        return ListenOutcome::Matched(hit);
                    }
                }
                Err(e) => trace!(error = %e, "Skipping undecodable AIS frame"),
            }
        }
    }

    /// The single close path for an opened connection.
    async fn teardown(&mut self, mut ws: WsStream) {
        match timeout(self.close_grace, ws.close(None)).await {
            Ok(Ok(())) => trace!("AIS feed connection closed"),
            Ok(Err(e)) => trace!(error = %e, "AIS feed close after transport end"),
            Err(_) => debug!(
                grace_ms = self.close_grace.as_millis() as u64,
                "Close handshake timed out; dropping socket"
            ),
        }
        drop(ws);
        self.transition(ListenerState::Closed);
    }

    fn finish_unopened<T>(&mut self, outcome: ListenOutcome<T>) -> ListenOutcome<T> {
        self.transition(outcome.state());
        self.transition(ListenerState::Closed);
        outcome
    }

    fn transition(&mut self, next: ListenerState) {
        trace!(from = ?self.state, to = ?next, "Listener state change");
        self.state = next;
    }
}

fn deadline_after(budget: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(budget).unwrap_or_else(|| now + FAR_FUTURE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_omits_empty_filters() {
        let filter = SubscriptionFilter::default();
        let json = serde_json::to_value(SubscriptionRequest::new("key", &filter)).unwrap();
        assert_eq!(json["APIKey"], "key");
        assert_eq!(json["BoundingBoxes"], serde_json::json!([[[-90.0, -180.0], [90.0, 180.0]]]));
        assert!(json.get("FilterMessageTypes").is_none());
        assert!(json.get("FiltersShipMMSI").is_none());
    }

    #[test]
    fn subscription_carries_filters() {
        let filter = SubscriptionFilter::message_types(&["PositionReport"]).with_mmsi("247123456");
        let json = serde_json::to_value(SubscriptionRequest::new("key", &filter)).unwrap();
        assert_eq!(json["FilterMessageTypes"], serde_json::json!(["PositionReport"]));
        assert_eq!(json["FiltersShipMMSI"], serde_json::json!(["247123456"]));
    }

    #[test]
    fn oversized_budget_gets_a_far_deadline() {
        let before = Instant::now();
        assert!(deadline_after(Duration::MAX) >= before + FAR_FUTURE);
        let short = deadline_after(Duration::from_millis(10));
        assert!(short >= before + Duration::from_millis(10));
        assert!(short < before + Duration::from_secs(60));
    }

    #[test]
    fn outcome_into_match() {
        assert_eq!(ListenOutcome::Matched(3).into_match(), Some(3));
        assert_eq!(ListenOutcome::<i32>::TimedOut.into_match(), None);
        assert_eq!(ListenOutcome::<i32>::ConnectionError(StreamError::Closed).into_match(), None);
    }

    #[tokio::test]
    async fn invalid_url_is_a_connection_error() {
        let listener = StreamListener::new("not a url");
        assert_eq!(listener.state(), ListenerState::Connecting);
        let outcome = listener
            .listen("key", &SubscriptionFilter::default(), |_| Some(()), Duration::from_secs(1))
            .await;
        assert!(matches!(
            outcome,
            ListenOutcome::ConnectionError(StreamError::InvalidUrl { .. })
        ));
    }
}
