use std::time::Duration;

use futures_util::future::join_all;
use lib_ais::{FeedConfig, NormalizedVessel, Resolution, ResolveError, VesselResolver};
use project_tests::mock_feed::{Frame, MockFeed, Script, position_report, refused_url, static_report};
use serde_json::json;
use tokio::time::Instant;

const KEY: &str = "test-key";
const TOTAL: Duration = Duration::from_millis(1600);

/// Short budgets so the timeout paths stay fast: 1000ms identity, 600ms status.
fn resolver_for(url: &str, server_side_mmsi_filter: bool) -> VesselResolver {
    VesselResolver::new(FeedConfig {
        wss_url: Some(url.to_string()),
        total_budget_ms: Some(TOTAL.as_millis() as u64),
        min_budget_ms: Some(200),
        close_grace_ms: Some(500),
        server_side_mmsi_filter: Some(server_side_mmsi_filter),
        ..FeedConfig::defaults()
    })
}

fn costa_diadema() -> Frame {
    static_report(9412634, Some(247123456), "COSTA DIADEMA", 60)
}

#[tokio::test]
async fn end_to_end_italian_vessel_at_anchor() {
    let feed = MockFeed::start(Script {
        static_frames: vec![costa_diadema()],
        position_frames: vec![position_report(247123456, 1)],
        honor_mmsi_filter: true,
        ..Default::default()
    })
    .await;
    let resolver = resolver_for(&feed.url, true);

    let resolution = resolver.resolve(KEY, "9412634", None).await.unwrap();
    assert!(resolution.is_complete());
    let vessel = resolution.into_vessel();

    assert_eq!(vessel.imo.as_deref(), Some("9412634"));
    assert_eq!(vessel.mmsi.as_deref(), Some("247123456"));
    assert_eq!(vessel.vessel_name.as_deref(), Some("COSTA DIADEMA"));
    assert_eq!(vessel.flag.as_deref(), Some("Italy"));
    assert_eq!(vessel.general_type.as_deref(), Some("Passenger"));
    assert_eq!(vessel.nav_status.as_deref(), Some("At anchor"));
    assert_eq!(vessel.arrival_at.as_deref(), Some("SAVONA"));
    assert!(vessel.reported_eta.as_deref().is_some_and(|eta| eta.ends_with("-05-03T14:30:00Z")));
    assert_eq!(vessel.departed_from, None);
    assert_eq!(vessel.atd, None);
    assert_eq!(vessel.ata, None);
    assert_eq!(vessel.source, "AISStream");
    assert!(!vessel.fetched_at.is_empty());

    let subs = feed.subscriptions();
    assert_eq!(subs.len(), 2);
    assert_eq!(subs[0]["FilterMessageTypes"], json!(["ShipStaticData"]));
    assert_eq!(subs[1]["FilterMessageTypes"], json!(["PositionReport"]));
    assert_eq!(subs[1]["FiltersShipMMSI"], json!(["247123456"]));
    assert!(subs.iter().all(|s| s["APIKey"] == KEY));
    assert_eq!(feed.wait_for_client_closes(2, Duration::from_secs(2)).await, 2);
}

#[tokio::test]
async fn query_is_normalized_and_echoed_exactly() {
    let feed = MockFeed::start(Script {
        static_frames: vec![costa_diadema()],
        position_frames: vec![position_report(247123456, 5)],
        ..Default::default()
    })
    .await;
    let resolver = resolver_for(&feed.url, true);

    let vessel = resolver
        .resolve_by_imo(KEY, "  IMO 9412634 ", None)
        .await
        .expect("vessel should resolve");
    assert_eq!(vessel.imo.as_deref(), Some("9412634"));
    assert_eq!(vessel.nav_status.as_deref(), Some("Moored"));
}

#[tokio::test]
async fn near_miss_imos_never_match() {
    let feed = MockFeed::start(Script {
        static_frames: vec![
            static_report(94126340, Some(247000001), "LONGER", 70),
            static_report(941263, Some(247000002), "SHORTER", 70),
            static_report(9412635, Some(247000003), "NEIGHBOUR", 70),
        ],
        position_frames: vec![position_report(247000001, 0)],
        ..Default::default()
    })
    .await;
    let resolver = resolver_for(&feed.url, true);

    let started = Instant::now();
    let result = resolver.resolve(KEY, "9412634", None).await;
    assert!(matches!(result, Err(ResolveError::NotFound { ref imo }) if imo == "9412634"));
    // Identity share of the total, not the whole total, was spent
    assert!(started.elapsed() < TOTAL + Duration::from_millis(500));

    // No identity, so no status subscription
    let subs = feed.subscriptions();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0]["FilterMessageTypes"], json!(["ShipStaticData"]));
}

#[tokio::test]
async fn identity_without_mmsi_skips_status_phase() {
    let feed = MockFeed::start(Script {
        static_frames: vec![static_report(9412634, None, "NO MMSI", 80)],
        position_frames: vec![position_report(247123456, 1)],
        ..Default::default()
    })
    .await;
    let resolver = resolver_for(&feed.url, true);

    let resolution = resolver.resolve(KEY, "9412634", None).await.unwrap();
    assert!(resolution.is_complete());
    let vessel = resolution.vessel();
    assert_eq!(vessel.mmsi, None);
    assert_eq!(vessel.flag, None);
    assert_eq!(vessel.nav_status, None);
    assert_eq!(vessel.general_type.as_deref(), Some("Tanker"));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(feed.connections(), 1);
    assert_eq!(feed.subscriptions().len(), 1);
}

#[tokio::test]
async fn status_timeout_returns_partial_record() {
    let feed = MockFeed::start(Script {
        static_frames: vec![costa_diadema()],
        // Another vessel only; the server ignores the MMSI filter
        position_frames: vec![position_report(538001234, 0)],
        ..Default::default()
    })
    .await;
    let resolver = resolver_for(&feed.url, true);

    let started = Instant::now();
    let resolution = resolver.resolve(KEY, "9412634", None).await.unwrap();
    let elapsed = started.elapsed();

    assert!(matches!(resolution, Resolution::Partial(_)));
    let vessel = resolution.into_vessel();
    assert_eq!(vessel.mmsi.as_deref(), Some("247123456"));
    assert_eq!(vessel.flag.as_deref(), Some("Italy"));
    assert_eq!(vessel.nav_status, None);
    // Identity matched at once; only the status slice was waited out
    assert!(elapsed >= Duration::from_millis(600));
    assert!(elapsed < TOTAL + Duration::from_millis(1000));

    // Same identity with a status: only navStatus differs
    let full_feed = MockFeed::start(Script {
        static_frames: vec![costa_diadema()],
        position_frames: vec![position_report(247123456, 1)],
        ..Default::default()
    })
    .await;
    let complete = resolver_for(&full_feed.url, true)
        .resolve_by_imo(KEY, "9412634", None)
        .await
        .unwrap();
    assert_eq!(complete.nav_status.as_deref(), Some("At anchor"));
    assert!(!vessel.same_vessel_state(&complete));
    let without_status = NormalizedVessel {
        nav_status: None,
        ..complete
    };
    assert!(vessel.same_vessel_state(&without_status));
}

#[tokio::test]
async fn status_timeout_matches_identity_only_record() {
    let silent_feed = MockFeed::start(Script {
        static_frames: vec![costa_diadema()],
        ..Default::default()
    })
    .await;
    let other_traffic_feed = MockFeed::start(Script {
        static_frames: vec![costa_diadema()],
        position_frames: vec![position_report(538001234, 0)],
        ..Default::default()
    })
    .await;

    let silent = resolver_for(&silent_feed.url, true)
        .resolve(KEY, "9412634", None)
        .await
        .unwrap();
    let other = resolver_for(&other_traffic_feed.url, true)
        .resolve(KEY, "9412634", None)
        .await
        .unwrap();

    assert!(matches!(silent, Resolution::Partial(_)));
    assert!(matches!(other, Resolution::Partial(_)));
    assert!(silent.vessel().same_vessel_state(other.vessel()));
    assert_eq!(silent.vessel().nav_status, None);
}

#[tokio::test]
async fn unbounded_total_budget_resolves() {
    let feed = MockFeed::start(Script {
        static_frames: vec![costa_diadema()],
        position_frames: vec![position_report(247123456, 1)],
        ..Default::default()
    })
    .await;
    let resolver = resolver_for(&feed.url, true);

    let handle = tokio::spawn(async move {
        resolver
            .resolve(KEY, "9412634", Some(Duration::from_secs(u64::MAX)))
            .await
    });
    let resolution = handle
        .await
        .expect("resolver task must not panic")
        .unwrap();
    assert!(resolution.is_complete());
    assert_eq!(resolution.vessel().nav_status.as_deref(), Some("At anchor"));
}

#[tokio::test]
async fn status_is_verified_client_side() {
    let feed = MockFeed::start(Script {
        static_frames: vec![costa_diadema()],
        position_frames: vec![
            position_report(538001234, 5),
            position_report(247123457, 7),
            position_report(247123456, 1),
        ],
        honor_mmsi_filter: false,
        ..Default::default()
    })
    .await;

    for server_side in [true, false] {
        let resolver = resolver_for(&feed.url, server_side);
        let vessel = resolver.resolve_by_imo(KEY, "9412634", None).await.unwrap();
        assert_eq!(vessel.nav_status.as_deref(), Some("At anchor"));
    }

    let subs = feed.subscriptions();
    assert_eq!(subs.len(), 4);
    assert_eq!(subs[1]["FiltersShipMMSI"], json!(["247123456"]));
    assert!(subs[3].get("FiltersShipMMSI").is_none());
}

#[tokio::test]
async fn first_identity_report_wins() {
    let feed = MockFeed::start(Script {
        static_frames: vec![
            static_report(9412634, Some(247123456), "FIRST NAME", 60),
            static_report(9412634, Some(247123456), "SECOND NAME", 60),
        ],
        position_frames: vec![position_report(247123456, 0)],
        ..Default::default()
    })
    .await;
    let resolver = resolver_for(&feed.url, true);

    let vessel = resolver.resolve_by_imo(KEY, "9412634", None).await.unwrap();
    assert_eq!(vessel.vessel_name.as_deref(), Some("FIRST NAME"));
    assert_eq!(vessel.nav_status.as_deref(), Some("Under way using engine"));
}

#[tokio::test]
async fn malformed_traffic_is_ignored() {
    let feed = MockFeed::start(Script {
        static_frames: vec![
            Frame::Text("{ truncated".into()),
            Frame::Json(json!({"MessageType": "ShipStaticData", "Message": "oops"})),
            Frame::Json(json!({"MessageType": "ShipStaticData", "Message": {"ShipStaticData": {"ImoNumber": "abc"}}})),
            Frame::Ping,
            costa_diadema(),
        ],
        position_frames: vec![
            Frame::Json(json!({"MessageType": "PositionReport", "MetaData": {"MMSI": 247123456}})),
            Frame::Binary(vec![1, 2, 3]),
            position_report(247123456, 1),
        ],
        ..Default::default()
    })
    .await;
    let resolver = resolver_for(&feed.url, true);

    let resolution = resolver.resolve(KEY, "9412634", None).await.unwrap();
    assert!(resolution.is_complete());
    assert_eq!(resolution.vessel().nav_status.as_deref(), Some("At anchor"));
}

#[tokio::test]
async fn repeated_resolution_is_stable_apart_from_fetch_time() {
    let feed = MockFeed::start(Script {
        static_frames: vec![costa_diadema()],
        position_frames: vec![position_report(247123456, 1)],
        ..Default::default()
    })
    .await;
    let resolver = resolver_for(&feed.url, true);

    let first = resolver.resolve_by_imo(KEY, "9412634", None).await.unwrap();
    let second = resolver.resolve_by_imo(KEY, "IMO9412634", None).await.unwrap();
    assert!(first.same_vessel_state(&second));
    assert_eq!(first.storage_key(), "vessel:9412634");
    assert_eq!(first.storage_key(), second.storage_key());
}

#[tokio::test]
async fn refused_connection_is_not_found() {
    let resolver = resolver_for(&refused_url(), true);
    let started = Instant::now();
    let result = resolver.resolve(KEY, "9412634", None).await;
    assert!(matches!(result, Err(ResolveError::NotFound { .. })));
    assert!(started.elapsed() < TOTAL);
}

#[tokio::test]
async fn early_server_close_is_not_found() {
    let feed = MockFeed::start(Script {
        static_frames: vec![static_report(9999999, Some(247000009), "OTHER", 60)],
        close_after_frames: true,
        ..Default::default()
    })
    .await;
    let resolver = resolver_for(&feed.url, true);

    let started = Instant::now();
    let result = resolver.resolve(KEY, "9412634", None).await;
    assert!(matches!(result, Err(ResolveError::NotFound { .. })));
    assert!(started.elapsed() < Duration::from_millis(1000));
}

#[tokio::test]
async fn concurrent_queries_are_independent() {
    let feed = MockFeed::start(Script {
        static_frames: vec![
            costa_diadema(),
            static_report(9321483, Some(538001234), "MAERSK TEST", 71),
        ],
        position_frames: vec![position_report(247123456, 1), position_report(538001234, 5)],
        honor_mmsi_filter: true,
        ..Default::default()
    })
    .await;
    let resolver = resolver_for(&feed.url, true);

    let queries = ["9412634", "9321483"];
    let results: Vec<Option<NormalizedVessel>> = join_all(
        queries.iter().map(|imo| resolver.resolve_by_imo(KEY, imo, None)),
    )
    .await;

    let costa = results[0].as_ref().expect("first query resolves");
    let maersk = results[1].as_ref().expect("second query resolves");
    assert_eq!(costa.flag.as_deref(), Some("Italy"));
    assert_eq!(costa.nav_status.as_deref(), Some("At anchor"));
    assert_eq!(maersk.mmsi.as_deref(), Some("538001234"));
    assert_eq!(maersk.flag.as_deref(), Some("Marshall Islands"));
    assert_eq!(maersk.nav_status.as_deref(), Some("Moored"));
    assert_eq!(maersk.general_type.as_deref(), Some("Cargo"));
    assert_eq!(feed.subscriptions().len(), 4);
}

#[tokio::test]
async fn rejected_queries_never_connect() {
    let feed = MockFeed::start(Script::default()).await;
    let resolver = resolver_for(&feed.url, true);

    assert!(matches!(
        resolver.resolve(KEY, "IMO", None).await,
        Err(ResolveError::InvalidQuery(_))
    ));
    assert!(matches!(
        resolver.resolve("", "9412634", None).await,
        Err(ResolveError::MissingCredential)
    ));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(feed.connections(), 0);
}
