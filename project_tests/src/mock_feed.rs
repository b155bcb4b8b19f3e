//! A scripted stand-in for the AISStream WebSocket feed.
//!
//! Each accepted connection waits for the subscription handshake, records it,
//! replays the frames scripted for the subscribed message types and then
//! either holds the connection open or closes it from the server side.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::protocol::Message;

/// One scripted server frame.
#[derive(Debug, Clone)]
pub enum Frame {
    Json(Value),
    Text(String),
    Binary(Vec<u8>),
    Ping,
}

/// What the feed sends for each subscribed message type.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub static_frames: Vec<Frame>,
    pub position_frames: Vec<Frame>,
    /// Drop position reports whose MMSI isn't in `FiltersShipMMSI`.
    pub honor_mmsi_filter: bool,
    /// Close from the server side once the frames are sent.
    pub close_after_frames: bool,
    /// Pause before each frame.
    pub frame_delay: Duration,
}

#[derive(Default)]
struct Recorder {
    subscriptions: Mutex<Vec<Value>>,
    connections: AtomicUsize,
    client_closes: AtomicUsize,
}

/// A running mock feed bound to an ephemeral local port.
pub struct MockFeed {
    pub url: String,
    recorder: Arc<Recorder>,
    handle: JoinHandle<()>,
}

impl MockFeed {
    pub async fn start(script: Script) -> MockFeed {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock feed");
        let port = listener.local_addr().expect("Mock feed has no address").port();
        let recorder = Arc::new(Recorder::default());
        let script = Arc::new(script);

        let accept_recorder = recorder.clone();
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let recorder = accept_recorder.clone();
                let script = script.clone();
                tokio::spawn(serve_connection(stream, script, recorder));
            }
        });

        MockFeed {
            url: format!("ws://127.0.0.1:{}", port),
            recorder,
            handle,
        }
    }

    /// Subscription handshakes received so far, in arrival order.
    pub fn subscriptions(&self) -> Vec<Value> {
        self.recorder
            .subscriptions
            .lock()
            .map(|subs| subs.clone())
            .unwrap_or_default()
    }

    pub fn connections(&self) -> usize {
        self.recorder.connections.load(Ordering::SeqCst)
    }

    /// Connections the client closed with a close frame.
    pub fn client_closes(&self) -> usize {
        self.recorder.client_closes.load(Ordering::SeqCst)
    }

    /// Polls until `expected` client closes were seen or `within` elapses.
    pub async fn wait_for_client_closes(&self, expected: usize, within: Duration) -> usize {
        let deadline = Instant::now() + within;
        while self.client_closes() < expected && Instant::now() < deadline {
            sleep(Duration::from_millis(10)).await;
        }
        self.client_closes()
    }
}

impl Drop for MockFeed {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve_connection(stream: TcpStream, script: Arc<Script>, recorder: Arc<Recorder>) {
    let Ok(mut ws) = accept_async(stream).await else {
        return;
    };
    recorder.connections.fetch_add(1, Ordering::SeqCst);

    let subscription = match ws.next().await {
        Some(Ok(Message::Text(text))) => match serde_json::from_str::<Value>(text.as_str()) {
            Ok(value) => value,
            Err(_) => return,
        },
        _ => return,
    };
    if let Ok(mut subs) = recorder.subscriptions.lock() {
        subs.push(subscription.clone());
    }

    for frame in frames_for(&script, &subscription) {
        if !script.frame_delay.is_zero() {
            sleep(script.frame_delay).await;
        }
        let message = match frame {
            Frame::Json(value) => Message::Text(value.to_string().into()),
            Frame::Text(text) => Message::Text(text.into()),
            Frame::Binary(bytes) => Message::Binary(bytes.into()),
            Frame::Ping => Message::Ping(Vec::<u8>::new().into()),
        };
        if ws.send(message).await.is_err() {
            return;
        }
    }

    if script.close_after_frames {
        let _ = ws.close(None).await;
        return;
    }

    // Hold the connection until the client goes away.
    while let Some(frame) = ws.next().await {
        match frame {
            Ok(Message::Close(_)) => {
                recorder.client_closes.fetch_add(1, Ordering::SeqCst);
            }
            Ok(_) => {}
            Err(_) => break,
        }
    }
}

fn string_list(subscription: &Value, key: &str) -> Vec<String> {
    subscription
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn frames_for(script: &Script, subscription: &Value) -> Vec<Frame> {
    let types = string_list(subscription, "FilterMessageTypes");
    let mmsi_filter = string_list(subscription, "FiltersShipMMSI");
    let wants = |kind: &str| types.is_empty() || types.iter().any(|t| t == kind);

    let mut frames = Vec::new();
    if wants("ShipStaticData") {
        frames.extend(script.static_frames.iter().cloned());
    }
    if wants("PositionReport") {
        frames.extend(script.position_frames.iter().filter(|frame| {
            if !script.honor_mmsi_filter || mmsi_filter.is_empty() {
                return true;
            }
            match frame {
                Frame::Json(value) => frame_mmsi(value).is_some_and(|m| mmsi_filter.contains(&m)),
                _ => true,
            }
        }).cloned());
    }
    frames
}

fn frame_mmsi(value: &Value) -> Option<String> {
    let mmsi = value.get("MetaData")?.get("MMSI")?;
    match mmsi {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// A `ShipStaticData` message the way the feed sends it.
pub fn static_report(imo: i64, mmsi: Option<i64>, name: &str, ship_type: i64) -> Frame {
    let mut meta = json!({ "ShipName": name });
    let mut body = json!({
        "ImoNumber": imo,
        "Name": name,
        "Type": ship_type,
        "Destination": "SAVONA",
        "Eta": { "Month": 5, "Day": 3, "Hour": 14, "Minute": 30 },
    });
    if let Some(mmsi) = mmsi {
        meta["MMSI"] = json!(mmsi);
        body["UserID"] = json!(mmsi);
    }
    Frame::Json(json!({
        "MessageType": "ShipStaticData",
        "MetaData": meta,
        "Message": { "ShipStaticData": body },
    }))
}

/// A `PositionReport` message with the given navigational status code.
pub fn position_report(mmsi: i64, nav_status: i64) -> Frame {
    Frame::Json(json!({
        "MessageType": "PositionReport",
        "MetaData": { "MMSI": mmsi },
        "Message": {
            "PositionReport": {
                "UserID": mmsi,
                "NavigationalStatus": nav_status,
                "Latitude": 44.3,
                "Longitude": 8.48,
            }
        },
    }))
}

/// A `ws://` URL on a local port with nothing listening.
pub fn refused_url() -> String {
    let port = {
        let sock = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind probe socket");
        sock.local_addr().expect("Probe socket has no address").port()
    };
    format!("ws://127.0.0.1:{}", port)
}
