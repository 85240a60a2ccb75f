use pilot_link::catalog::SymbolicTag;
use pilot_link::config::{StationConfig, Timeouts};
use pilot_link::model::{LineId, MachineState, OrderStartRequest, Quantity, WireValue};
use pilot_link::poller::FleetPoller;
use pilot_link::session::mock::FakeController;
use pilot_link::session::SessionFactory;
use pilot_link::station::PilotStation;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

fn sessions(fake: &FakeController) -> SessionFactory {
    SessionFactory::new(StationConfig::default(), Arc::new(fake.clone())).unwrap()
}

#[tokio::test]
async fn test_poll_all_isolates_failing_line() {
    let fake = FakeController::new();
    fake.line(LineId::Lgn01).state(1);
    fake.line(LineId::Lgn02).refuse_connect();
    fake.line(LineId::Lgn03).state(2);

    let snapshot = FleetPoller::new(sessions(&fake)).poll_all().await;

    assert_eq!(
        snapshot,
        BTreeMap::from([
            (LineId::Lgn01, MachineState::Running),
            (LineId::Lgn02, MachineState::Unreachable),
            (LineId::Lgn03, MachineState::Alarm),
        ])
    );
}

#[tokio::test]
async fn test_connect_timeout_reads_as_unreachable() {
    let fake = FakeController::new();
    fake.line(LineId::Lgn01).state(1);
    fake.line(LineId::Lgn02).state(1).connect_latency(Duration::from_millis(300));
    fake.line(LineId::Lgn03).state(0);
    let config = StationConfig {
        timeouts: Timeouts {
            connect: Duration::from_millis(30),
            io: Duration::from_millis(500),
        },
        ..StationConfig::default()
    };
    let sessions = SessionFactory::new(config, Arc::new(fake.clone())).unwrap();

    let snapshot = FleetPoller::new(sessions).poll_all().await;

    assert_eq!(
        snapshot,
        BTreeMap::from([
            (LineId::Lgn01, MachineState::Running),
            (LineId::Lgn02, MachineState::Unreachable),
            (LineId::Lgn03, MachineState::Stopped),
        ])
    );
    assert_eq!(fake.disconnects(LineId::Lgn02), 0);
}

#[tokio::test]
async fn test_raw_codes_map_to_states() {
    let fake = FakeController::new();
    let poller = FleetPoller::new(sessions(&fake));

    let mut seen = Vec::new();
    for code in [0, 1, 2, 5] {
        fake.line(LineId::Lgn03).state(code);
        seen.push(poller.poll_line(LineId::Lgn03).await.label());
    }
    assert_eq!(seen, ["STOP", "RUN", "ALARM", "5"]);
}

#[tokio::test]
async fn test_slow_line_does_not_hold_up_the_others() {
    let fake = FakeController::new();
    fake.line(LineId::Lgn01).state(0).latency(Duration::from_millis(50));
    fake.line(LineId::Lgn02).state(1).latency(Duration::from_millis(50));
    fake.line(LineId::Lgn03).state(1).latency(Duration::from_millis(50));

    let started = tokio::time::Instant::now();
    let snapshot = FleetPoller::new(sessions(&fake)).poll_all().await;

    assert_eq!(snapshot.len(), 3);
    assert!(snapshot.values().all(MachineState::is_reachable));
    assert!(started.elapsed() < Duration::from_millis(140));
}

#[tokio::test]
async fn test_snapshot_serializes_with_labels() {
    let fake = FakeController::new();
    fake.line(LineId::Lgn01).state(1);
    fake.line(LineId::Lgn02)
        .value(SymbolicTag::MachineState, WireValue::String("7".into()));
    fake.line(LineId::Lgn03).refuse_connect();

    let snapshot = FleetPoller::new(sessions(&fake)).poll_all().await;
    let json = serde_json::to_value(&snapshot).unwrap();

    assert_eq!(
        json,
        serde_json::json!({ "LGN01": "RUN", "LGN02": "7", "LGN03": "OFF" })
    );
}

#[tokio::test]
async fn test_station_serializes_per_line_and_runs_lines_in_parallel() {
    let fake = FakeController::new();
    for line in LineId::ALL {
        fake.line(line).state(1).latency(Duration::from_millis(10));
    }
    let station = PilotStation::start(sessions(&fake));

    let orders = LineId::ALL.into_iter().flat_map(|line| {
        (0..3).map(move |n| OrderStartRequest::new(line, format!("MO-{n}"), "ART", Quantity::new(1).unwrap()))
    });
    let results = futures::future::join_all(orders.map(|request| station.start_full(request))).await;

    assert!(results.into_iter().all(|sent| sent));
    for line in LineId::ALL {
        assert_eq!(fake.peak_sessions(line), 1);
        assert_eq!(fake.writes(line).len(), 12);
        assert_eq!(fake.connects(line), fake.disconnects(line));
    }

    let snapshot = station.poll_all().await;
    assert!(snapshot.values().all(|state| *state == MachineState::Running));
    station.shutdown().await.unwrap();
}
