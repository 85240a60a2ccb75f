use chrono::NaiveDate;
use pilot_link::catalog::{NodeAddress, SymbolicTag};
use pilot_link::config::StationConfig;
use pilot_link::dispatch::OrderDispatcher;
use pilot_link::model::{LineId, OrderStartRequest, Quantity, TagValue, WireValue};
use pilot_link::registry::EndpointRegistry;
use pilot_link::session::mock::{FakeController, FakeEvent};
use pilot_link::session::SessionFactory;
use pilot_link::LinkError;
use std::sync::Arc;

fn setup() -> (FakeController, SessionFactory) {
    let fake = FakeController::new();
    let sessions = SessionFactory::new(StationConfig::default(), Arc::new(fake.clone()))
        .expect("standard catalog is complete");
    (fake, sessions)
}

fn request(line: LineId, quantity: f64) -> OrderStartRequest {
    let timestamp = NaiveDate::from_ymd_opt(2024, 3, 5)
        .unwrap()
        .and_hms_opt(14, 7, 9)
        .unwrap();
    OrderStartRequest::new(line, "WH/MO/00012", "ART-7", Quantity::from_f64(quantity).unwrap())
        .with_timestamp(timestamp)
}

#[test]
fn test_every_line_resolves_and_others_fail() {
    let registry = EndpointRegistry::with_defaults();
    for line in LineId::ALL {
        assert!(!registry.resolve(line).unwrap().as_str().is_empty());
    }
    for key in ["LGN04", "", "lgn1", "opc.tcp://"] {
        assert!(matches!(registry.resolve_key(key), Err(LinkError::UnknownLine(_))));
    }
}

#[tokio::test]
async fn test_start_full_writes_in_fixed_order() {
    let (fake, sessions) = setup();
    let dispatcher = OrderDispatcher::new(sessions);

    assert!(dispatcher.start_full(request(LineId::Lgn02, 12.0)).await);

    let endpoint = sessions_endpoint(LineId::Lgn02);
    assert_eq!(
        fake.events(),
        vec![
            FakeEvent::Connect(endpoint.clone()),
            FakeEvent::Write(
                endpoint.clone(),
                NodeAddress::new(4, "StartOrder"),
                WireValue::String("WH/MO/00012".into())
            ),
            FakeEvent::Write(
                endpoint.clone(),
                NodeAddress::new(4, "OrderCode"),
                WireValue::String("ART-7".into())
            ),
            FakeEvent::Write(endpoint.clone(), NodeAddress::new(4, "OrderQuantity"), WireValue::Int32(12)),
            FakeEvent::Write(
                endpoint.clone(),
                NodeAddress::new(4, "OrderDate"),
                WireValue::String("2024-03-05T14:07:09".into())
            ),
            FakeEvent::Disconnect(endpoint),
        ]
    );
}

fn sessions_endpoint(line: LineId) -> pilot_link::registry::EndpointAddress {
    EndpointRegistry::with_defaults().resolve(line).unwrap().clone()
}

#[tokio::test]
async fn test_quantity_is_truncated_not_rounded() {
    let (fake, sessions) = setup();
    assert!(OrderDispatcher::new(sessions).start_full(request(LineId::Lgn01, 7.9)).await);
    assert_eq!(
        fake.value(LineId::Lgn01, SymbolicTag::OrderQuantity),
        Some(WireValue::Int32(7))
    );
}

#[tokio::test]
async fn test_failed_quantity_write_closes_once() {
    let (fake, sessions) = setup();
    fake.line(LineId::Lgn03).fail_write(SymbolicTag::OrderQuantity);
    let dispatcher = OrderDispatcher::new(sessions);

    let report = dispatcher.start_full_report(request(LineId::Lgn03, 3.0)).await;
    assert!(!report.is_success());
    assert!(report.is_partial());
    assert_eq!(report.applied, vec![SymbolicTag::StartOrder, SymbolicTag::OrderCode]);

    assert!(!dispatcher.start_full(request(LineId::Lgn03, 3.0)).await);
    assert_eq!(fake.connects(LineId::Lgn03), 2);
    assert_eq!(fake.disconnects(LineId::Lgn03), 2);
    assert_eq!(fake.value(LineId::Lgn03, SymbolicTag::OrderDate), None);
}

#[tokio::test]
async fn test_start_minimal_on_unreachable_line() {
    let (fake, sessions) = setup();
    fake.line(LineId::Lgn01).refuse_connect();

    assert!(!OrderDispatcher::new(sessions).start_minimal(LineId::Lgn01, "MO-1").await);
    assert!(fake.writes(LineId::Lgn01).is_empty());
    assert_eq!(fake.disconnects(LineId::Lgn01), 0);
}

#[tokio::test]
async fn test_unsupported_value_is_rejected_before_sending() {
    let (fake, sessions) = setup();
    let mut session = sessions.open(LineId::Lgn02).await.unwrap();

    let float = session.write(SymbolicTag::OrderQuantity, 2.5).await;
    let list = session
        .write(SymbolicTag::OrderCode, TagValue::List(vec![TagValue::from("a")]))
        .await;
    session.close().await;

    assert!(matches!(float, Err(LinkError::TypeMismatch { tag: SymbolicTag::OrderQuantity, .. })));
    assert!(matches!(list, Err(LinkError::TypeMismatch { tag: SymbolicTag::OrderCode, .. })));
    assert!(fake.writes(LineId::Lgn02).is_empty());
    assert_eq!(fake.disconnects(LineId::Lgn02), 1);
}

#[tokio::test]
async fn test_session_closed_once_when_write_fails() {
    let (fake, sessions) = setup();
    fake.line(LineId::Lgn01).fail_write(SymbolicTag::StartOrder);

    let mut session = sessions.open(LineId::Lgn01).await.unwrap();
    assert!(session.write(SymbolicTag::StartOrder, "MO-1").await.is_err());
    session.close().await;

    assert_eq!(fake.connects(LineId::Lgn01), 1);
    assert_eq!(fake.disconnects(LineId::Lgn01), 1);
}
