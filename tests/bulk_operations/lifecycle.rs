//! Status lifecycle and wire shapes

use crate::common::*;
use bulkops::{MutationIntent, OperationId, OperationStatus};

#[test]
fn accepted_response_is_in_progress_and_pollable() {
    let fx = Fixture::new(1000);
    let ids = fx.companies(3);
    let list = fx.collection("My List", &ids);

    let accepted = fx.ops.submit_delete(DeleteRequest::all(list)).unwrap();
    assert_eq!(accepted.status, OperationState::InProgress);
    assert_eq!(accepted.detail.as_deref(), Some("Bulk deletion has started."));
    assert!(accepted.operation_id.parse::<OperationId>().is_ok());

    // An immediate poll sees the accepted record or something later, never "not found"
    let polled = fx.ops.operation_status(&accepted.operation_id).unwrap();
    assert_eq!(polled.operation_id, accepted.operation_id);
}

#[test]
fn operation_ids_are_unique_per_submission() {
    let fx = Fixture::new(1000);
    let ids = fx.companies(2);
    let source = fx.collection("A", &ids);
    let target = fx.collection("B", &[]);

    let mut seen = std::collections::HashSet::new();
    for _ in 0..20 {
        let response = fx
            .ops
            .submit(MutationIntent::Transfer(TransferRequest::all(source, target)))
            .unwrap();
        assert!(seen.insert(response.operation_id));
    }
    fx.ops.drain();
}

#[test]
fn unknown_expired_and_malformed_ids_are_not_found() {
    let fx = Fixture::new(1000);
    for id in [OperationId::new().to_string(), "abc".to_string(), String::new()] {
        let err = fx.ops.operation_status(&id).unwrap_err();
        assert_eq!(err, Error::OperationNotFound { operation: id });
    }
}

#[test]
fn terminal_status_is_never_overwritten() {
    let fx = Fixture::new(2);
    let ids = fx.companies(6);
    let list = fx.collection("My List", &ids);

    let (accepted, handle) = fx
        .ops
        .submit_delete_tracked(DeleteRequest::all(list))
        .unwrap();
    handle.unwrap().wait();
    let done = fx.ops.operation_status(&accepted.operation_id).unwrap();
    fx.ops.drain();

    assert_eq!(done.status, OperationState::Completed);
    assert_eq!(fx.ops.operation_status(&accepted.operation_id).unwrap(), done);
}

#[test]
fn status_record_wire_format() {
    let fx = Fixture::new(1000);
    let ids = fx.companies(2);
    let list = fx.collection("My List", &ids);

    let (accepted, handle) = fx
        .ops
        .submit_delete_tracked(DeleteRequest::all(list))
        .unwrap();
    handle.unwrap().wait();

    let raw = bulkops::StatusStore::get(fx.status.as_ref(), &accepted.operation_id)
        .unwrap()
        .unwrap();
    assert_eq!(
        raw,
        r#"{"status":"completed","detail":"Deleted 2 of 2 companies from the collection."}"#
    );
    assert_eq!(
        OperationStatus::from_json(&raw).unwrap().state,
        OperationState::Completed
    );
}

#[test]
fn request_and_response_shapes() {
    let fx = Fixture::new(1000);
    let ids = fx.companies(4);
    let source = fx.collection("My List", &ids);
    let target = fx.collection("Liked Companies", &[]);

    let body = format!(
        r#"{{"source_collection_id":"{}","target_collection_id":"{}","company_ids":[{},{}]}}"#,
        source, target, ids[0], ids[1]
    );
    let request: TransferRequest = serde_json::from_str(&body).unwrap();
    let accepted = fx.ops.submit_transfer(request).unwrap();

    let json = serde_json::to_value(&accepted).unwrap();
    assert_eq!(json["status"], "in_progress");
    assert_eq!(json["operation_id"], accepted.operation_id.as_str());
    assert_eq!(json["detail"], "Transfer has started.");

    let done = fx.wait_terminal(&accepted.operation_id);
    assert_eq!(done.detail.as_deref(), Some("Transferred 2 companies."));
}
