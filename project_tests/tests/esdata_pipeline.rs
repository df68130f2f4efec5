//! # Relay Pipeline Tests
//!
//! Drives a `Relay` the way a host would (connection, events, timer ticks) and
//! checks the documents that arrive at a local collector over real HTTP.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use serde_json::{Value, json};
use tokio::runtime::Handle;

use lib_esdata::{
    AssignedData, ConnectionType, ControllerSnapshot, DispatchOutcome, FlightPlan, HostSession,
    Relay, RelayConfig, RelayError, RunwayActivity,
};

/// Collector on a random port answering every POST with `status`. Returns the
/// `host:port` and a channel of the received documents.
fn mock_collector(status: u16) -> (String, mpsc::Receiver<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to random port");
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line.trim().is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).unwrap();

            let response = format!(
                "HTTP/1.1 {} X\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                status
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            let _ = tx.send(serde_json::from_slice(&body).unwrap());
        }
    });

    (format!("127.0.0.1:{}", port), rx)
}

struct Host {
    connection: ConnectionType,
}

impl HostSession for Host {
    fn connection_type(&self) -> ConnectionType {
        self.connection
    }
    fn controller_myself(&self) -> Option<ControllerSnapshot> {
        None
    }
    fn runway_activity(&self) -> Vec<RunwayActivity> {
        Vec::new()
    }
}

const LIVE: Host = Host {
    connection: ConnectionType::Direct,
};

fn relay_for(collector: &str, tweak: impl FnOnce(&mut RelayConfig)) -> Relay {
    let mut config = RelayConfig {
        collector_host: collector.to_string(),
        use_tls: false,
        settle_delay_secs: 0,
        debounce_jitter_secs: 0,
        ..Default::default()
    };
    tweak(&mut config);
    Relay::with_http(config, Handle::current()).unwrap()
}

fn sas123() -> FlightPlan {
    FlightPlan {
        callsign: "SAS123".into(),
        valid: true,
        tracked_by_me: true,
        origin: "ESSA".into(),
        destination: "EKCH".into(),
        ..Default::default()
    }
}

/// Ticks once at `now` and waits for the dispatch it starts.
async fn tick_and_send(
    relay: &mut Relay,
    counter: u64,
    now: Instant,
) -> Result<DispatchOutcome, RelayError> {
    let handle = relay.on_timer_at(counter, &LIVE, now).expect("dispatch due");
    handle.await.expect("send task")
}

#[tokio::test]
async fn ground_state_scratch_pad_reaches_collector() {
    let (collector, rx) = mock_collector(200);
    let mut relay = relay_for(&collector, |_| {});
    let t0 = Instant::now();
    assert!(relay.on_timer_at(1, &LIVE, t0).is_none());

    relay.on_controller_assigned_data_update(&sas123(), &AssignedData::ScratchPad("ONFREQ".into()));
    tick_and_send(&mut relay, 2, t0).await.unwrap();

    let doc = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(doc, json!({"SAS123": {"groundstate": "ONFREQ"}}));
}

#[tokio::test]
async fn stand_is_decoded_from_scratch_pad() {
    let (collector, rx) = mock_collector(200);
    let mut relay = relay_for(&collector, |_| {});
    let t0 = Instant::now();
    relay.on_timer_at(1, &LIVE, t0);

    let stand = AssignedData::ScratchPad("GRP/S/A12".into());
    relay.on_controller_assigned_data_update(&sas123(), &stand);
    tick_and_send(&mut relay, 2, t0).await.unwrap();

    let doc = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(doc, json!({"SAS123": {"stand": "A12"}}));
}

#[tokio::test]
async fn direct_after_heading_zeroes_heading() {
    let (collector, rx) = mock_collector(200);
    let mut relay = relay_for(&collector, |_| {});
    let t0 = Instant::now();
    relay.on_timer_at(1, &LIVE, t0);

    relay.on_controller_assigned_data_update(&sas123(), &AssignedData::Heading(270));
    relay.on_controller_assigned_data_update(&sas123(), &AssignedData::DirectTo("ANVIK".into()));
    let outcome = tick_and_send(&mut relay, 2, t0).await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Sent { entities: 1, .. }));

    let doc = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(doc, json!({"SAS123": {"direct": "ANVIK", "ahdg": 0}}));
}

#[tokio::test]
async fn out_of_scope_traffic_is_never_posted() {
    let (collector, rx) = mock_collector(200);
    let mut relay = relay_for(&collector, |_| {});
    let t0 = Instant::now();
    relay.on_timer_at(1, &LIVE, t0);

    let foreign = FlightPlan {
        callsign: "DLH4AB".into(),
        valid: true,
        tracked_by_me: true,
        origin: "EDDF".into(),
        destination: "EKCH".into(),
        ..Default::default()
    };
    relay.on_controller_assigned_data_update(&foreign, &AssignedData::Squawk("2301".into()));
    relay.on_flight_plan_data_update(&foreign);
    assert!(relay.on_timer_at(2, &LIVE, t0).is_none());

    relay.on_controller_assigned_data_update(&sas123(), &AssignedData::Squawk("2302".into()));
    tick_and_send(&mut relay, 3, t0).await.unwrap();

    let doc = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(doc, json!({"SAS123": {"squawk": "2302"}}));
}

#[tokio::test]
async fn dispatches_are_debounced() {
    let (collector, rx) = mock_collector(200);
    let mut relay = relay_for(&collector, |_| {});
    let t0 = Instant::now();
    relay.on_timer_at(1, &LIVE, t0);

    relay.on_controller_assigned_data_update(&sas123(), &AssignedData::Rate(-1500));
    tick_and_send(&mut relay, 2, t0).await.unwrap();
    rx.recv_timeout(Duration::from_secs(5)).unwrap();

    relay.on_controller_assigned_data_update(&sas123(), &AssignedData::Rate(0));
    relay.on_controller_assigned_data_update(&sas123(), &AssignedData::Speed(250));
    assert!(relay.on_timer_at(3, &LIVE, t0 + Duration::from_secs(3)).is_none());
    assert_eq!(relay.pending_entities(), 1);

    tick_and_send(&mut relay, 4, t0 + Duration::from_secs(5)).await.unwrap();
    let doc = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(doc, json!({"SAS123": {"arate": 0, "aspd": 250}}));
}

#[tokio::test]
async fn rejected_post_is_dropped_and_reported() {
    let (collector, rx) = mock_collector(500);
    let mut relay = relay_for(&collector, |_| {});
    let t0 = Instant::now();
    relay.on_timer_at(1, &LIVE, t0);

    relay.on_controller_assigned_data_update(&sas123(), &AssignedData::ClearanceFlag(true));
    let err = tick_and_send(&mut relay, 2, t0).await.unwrap_err();
    assert!(matches!(err, RelayError::HttpStatus(500)));
    let doc = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(doc, json!({"SAS123": {"clearance": true}}));

    assert_eq!(relay.pending_entities(), 0);
    let status = relay.on_command(".esdata status", &LIVE).unwrap();
    assert!(status.contains("last error: collector responded with HTTP 500"), "{status}");
}

#[tokio::test]
async fn too_many_entities_discard_the_buffer() {
    let (collector, _rx) = mock_collector(200);
    let mut relay = relay_for(&collector, |c| c.max_entities = 1000);
    let t0 = Instant::now();
    relay.on_timer_at(1, &LIVE, t0);

    for i in 0..1000 {
        let fp = FlightPlan {
            callsign: format!("SAS{i}"),
            ..sas123()
        };
        relay.on_controller_assigned_data_update(&fp, &AssignedData::FinalAltitude(36000));
    }
    assert_eq!(relay.pending_entities(), 1000);

    let one_more = FlightPlan {
        callsign: "SAS1000".into(),
        ..sas123()
    };
    relay.on_controller_assigned_data_update(&one_more, &AssignedData::FinalAltitude(36000));
    assert_eq!(relay.pending_entities(), 0);
    assert!(relay.on_timer_at(2, &LIVE, t0).is_none());
}

#[tokio::test]
async fn update_all_command_widens_scope() {
    let (collector, rx) = mock_collector(200);
    let mut relay = relay_for(&collector, |_| {});
    let t0 = Instant::now();
    relay.on_timer_at(1, &LIVE, t0);

    let untracked = FlightPlan {
        tracked_by_me: false,
        ..sas123()
    };
    relay.on_controller_assigned_data_update(&untracked, &AssignedData::Squawk("1000".into()));
    assert_eq!(relay.pending_entities(), 0);

    assert_eq!(relay.on_command(".esdata updateall", &LIVE).as_deref(), Some("Update all mode ON"));
    relay.on_controller_assigned_data_update(&untracked, &AssignedData::Squawk("1000".into()));
    tick_and_send(&mut relay, 2, t0).await.unwrap();
    let doc = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(doc, json!({"SAS123": {"squawk": "1000"}}));
}
