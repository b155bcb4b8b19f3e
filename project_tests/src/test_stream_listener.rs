use std::time::Duration;

use lib_ais::ingestors::StreamError;
use lib_ais::maritime::{parse_position_status, parse_static_identity};
use lib_ais::{ListenOutcome, StreamListener, SubscriptionFilter};
use project_tests::mock_feed::{Frame, MockFeed, Script, position_report, refused_url, static_report};
use serde_json::json;
use tokio::time::Instant;

const KEY: &str = "test-key";

#[tokio::test]
async fn match_closes_the_connection() {
    let feed = MockFeed::start(Script {
        static_frames: vec![static_report(9412634, Some(247123456), "COSTA DIADEMA", 60)],
        ..Default::default()
    })
    .await;

    let outcome = StreamListener::new(feed.url.clone())
        .listen(
            KEY,
            &SubscriptionFilter::message_types(&["ShipStaticData"]),
            |raw| parse_static_identity(raw),
            Duration::from_secs(3),
        )
        .await;

    let identity = outcome.into_match().expect("expected a match");
    assert_eq!(identity.imo.as_deref(), Some("9412634"));
    assert_eq!(feed.wait_for_client_closes(1, Duration::from_secs(2)).await, 1);

    let subs = feed.subscriptions();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0]["APIKey"], KEY);
    assert_eq!(subs[0]["BoundingBoxes"], json!([[[-90.0, -180.0], [90.0, 180.0]]]));
    assert_eq!(subs[0]["FilterMessageTypes"], json!(["ShipStaticData"]));
    assert!(subs[0].get("FiltersShipMMSI").is_none());
}

#[tokio::test]
async fn silence_times_out_within_the_budget() {
    let feed = MockFeed::start(Script::default()).await;
    let budget = Duration::from_millis(400);

    let started = Instant::now();
    let outcome = StreamListener::new(feed.url.clone())
        .listen(KEY, &SubscriptionFilter::default(), |_| Some(()), budget)
        .await;
    let elapsed = started.elapsed();

    assert!(matches!(outcome, ListenOutcome::TimedOut));
    assert!(elapsed >= budget);
    // Budget plus the close grace is the hard ceiling
    assert!(elapsed < budget + Duration::from_secs(2));
    assert_eq!(feed.wait_for_client_closes(1, Duration::from_secs(2)).await, 1);
}

#[tokio::test]
async fn server_close_is_a_connection_error() {
    let feed = MockFeed::start(Script {
        position_frames: vec![position_report(111111111, 0)],
        close_after_frames: true,
        ..Default::default()
    })
    .await;

    let budget = Duration::from_secs(5);
    let started = Instant::now();
    let outcome = StreamListener::new(feed.url.clone())
        .listen(
            KEY,
            &SubscriptionFilter::message_types(&["PositionReport"]),
            |_| None::<()>,
            budget,
        )
        .await;

    assert!(matches!(outcome, ListenOutcome::ConnectionError(StreamError::Closed)));
    assert!(started.elapsed() < budget);
}

#[tokio::test]
async fn refused_connection_is_a_connection_error() {
    let outcome = StreamListener::new(refused_url())
        .listen(KEY, &SubscriptionFilter::default(), |_| Some(()), Duration::from_secs(2))
        .await;
    assert!(matches!(outcome, ListenOutcome::ConnectionError(StreamError::Connect(_))));
}

#[tokio::test]
async fn malformed_frames_are_skipped() {
    let feed = MockFeed::start(Script {
        position_frames: vec![
            Frame::Text("not json at all".into()),
            Frame::Binary(vec![0xff, 0x00, 0x13]),
            Frame::Ping,
            Frame::Json(json!({"MessageType": "PositionReport"})),
            Frame::Json(json!([1, 2, 3])),
            Frame::Binary(
                serde_json::to_vec(&json!({
                    "MessageType": "PositionReport",
                    "MetaData": {"MMSI": 247123456},
                    "Message": {"PositionReport": {"NavigationalStatus": 5}}
                }))
                .unwrap(),
            ),
        ],
        ..Default::default()
    })
    .await;

    let outcome = StreamListener::new(feed.url.clone())
        .listen(
            KEY,
            &SubscriptionFilter::message_types(&["PositionReport"]),
            |raw| parse_position_status(raw),
            Duration::from_secs(3),
        )
        .await;

    assert_eq!(outcome.into_match().as_deref(), Some("Moored"));
}

#[tokio::test]
async fn predicate_sees_messages_in_arrival_order() {
    let feed = MockFeed::start(Script {
        position_frames: (0..5).map(|i| position_report(200000000 + i, 0)).collect(),
        ..Default::default()
    })
    .await;

    let mut seen = Vec::new();
    let outcome = StreamListener::new(feed.url.clone())
        .listen(
            KEY,
            &SubscriptionFilter::message_types(&["PositionReport"]),
            |raw| {
                let mmsi = raw.value()["MetaData"]["MMSI"].as_i64()?;
                seen.push(mmsi);
                (seen.len() == 3).then(|| seen.clone())
            },
            Duration::from_secs(3),
        )
        .await;

    assert_eq!(outcome.into_match(), Some(vec![200000000, 200000001, 200000002]));
}

#[tokio::test]
async fn unbounded_budget_still_listens() {
    let feed = MockFeed::start(Script {
        position_frames: vec![position_report(247123456, 1)],
        ..Default::default()
    })
    .await;

    let outcome = tokio::spawn({
        let url = feed.url.clone();
        async move {
            StreamListener::new(url)
                .listen(
                    KEY,
                    &SubscriptionFilter::message_types(&["PositionReport"]),
                    |raw| parse_position_status(raw),
                    Duration::MAX,
                )
                .await
        }
    })
    .await
    .expect("listener task must not panic");
    assert_eq!(outcome.into_match().as_deref(), Some("At anchor"));

    // Nothing to match and an early close: ends on the close, not the budget
    let closing = MockFeed::start(Script {
        position_frames: vec![position_report(111111111, 0)],
        close_after_frames: true,
        ..Default::default()
    })
    .await;
    let outcome = StreamListener::new(closing.url.clone())
        .listen(
            KEY,
            &SubscriptionFilter::message_types(&["PositionReport"]),
            |_| None::<()>,
            Duration::MAX,
        )
        .await;
    assert!(matches!(outcome, ListenOutcome::ConnectionError(StreamError::Closed)));
}
