use flow_core::{
    AgentCommand, CommandPayload, Diagnostic, DiagnosticKind, ForceMode, NodeId, OutputPort,
    PipeEvent, PipeHandle, SeatIndex, SubjectId, SubjectNotification,
};
use serde_json::json;

#[test]
fn ids_serialize_as_bare_numbers() {
    assert_eq!(serde_json::to_value(SubjectId(7)).unwrap(), json!(7));
    assert_eq!(serde_json::to_value(PipeHandle(3)).unwrap(), json!(3));
    assert_eq!(SubjectId(7).to_string(), "subject#7");
    assert_eq!(PipeHandle(3).to_string(), "pipe#3");
    assert_eq!(NodeId(12).to_string(), "node#12");
}

#[test]
fn command_payload_is_tagged_by_kind() {
    let command = AgentCommand::new(
        "ACT_ENTERVEHICLE",
        NodeId(1),
        CommandPayload::EnterVehicle {
            vehicle: SubjectId(100),
            seat: SeatIndex::DRIVER,
            fast: true,
        },
    )
    .with_pipe(PipeHandle(4));

    assert_eq!(
        serde_json::to_value(&command).unwrap(),
        json!({
            "name": "ACT_ENTERVEHICLE",
            "sender": 1,
            "pipe": 4,
            "payload": {"kind": "enter_vehicle", "vehicle": 100, "seat": 1, "fast": true},
        })
    );
}

#[test]
fn notifications_carry_their_sender() {
    let value = serde_json::to_value(SubjectNotification::PathCancelled {
        sender: Some(NodeId(9)),
    })
    .unwrap();
    assert_eq!(value, json!({"kind": "path_cancelled", "sender": 9}));

    let parsed: SubjectNotification =
        serde_json::from_value(json!({"kind": "close_to_destination"})).unwrap();
    assert_eq!(parsed, SubjectNotification::CloseToDestination);
}

#[test]
fn ports_and_events_use_snake_case() {
    assert_eq!(serde_json::to_value(OutputPort::Success).unwrap(), json!("success"));
    assert_eq!(
        serde_json::to_value(PipeEvent::RefPointMoved).unwrap(),
        json!("ref_point_moved")
    );
    assert!(PipeEvent::Deselected.is_terminal());
    assert!(!PipeEvent::Suspended.is_terminal());
    assert!(!PipeEvent::RefPointMoved.is_terminal());
}

#[test]
fn force_codes() {
    assert_eq!(ForceMode::from_code(0), ForceMode::None);
    assert_eq!(ForceMode::from_code(-1), ForceMode::None);
    assert_eq!(ForceMode::from_code(1), ForceMode::IgnoreAlertness);
    assert_eq!(ForceMode::from_code(3), ForceMode::IgnoreAlertness);
    assert!(!ForceMode::default().is_forced());
}

#[test]
fn diagnostic_builder() {
    let diagnostic = Diagnostic::new(5, NodeId(2), DiagnosticKind::AlertnessVeto, "too alert")
        .with_subject(SubjectId(8))
        .with_value(2);
    assert_eq!(diagnostic.tick, 5);
    assert_eq!(diagnostic.subject, Some(SubjectId(8)));
    assert_eq!(diagnostic.value, 2);
    assert_eq!(diagnostic.message, "too alert");
}
