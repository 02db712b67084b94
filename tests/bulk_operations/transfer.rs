//! Transfer semantics

use crate::common::*;

#[test]
fn transfer_skips_rows_already_in_target() {
    let fx = Fixture::new(1000);
    let ids = fx.companies(10);
    let source = fx.collection("My List", &ids);
    let target = fx.collection("Liked Companies", &ids[..3]);

    let accepted = fx
        .ops
        .submit_transfer(TransferRequest::all(source, target))
        .unwrap();
    assert_eq!(accepted.detail.as_deref(), Some("Transfer has started."));
    let done = fx.wait_terminal(&accepted.operation_id);

    assert_eq!(done.status, OperationState::Completed);
    assert_eq!(done.detail.as_deref(), Some("Transferred 7 companies."));
    assert_eq!(fx.store.commit_count(), 1);
    assert_eq!(fx.store.members(target), fx.store.members(source));
}

#[test]
fn transfer_twice_leaves_target_unchanged() {
    let fx = Fixture::new(4);
    let ids = fx.companies(20);
    let source = fx.collection("My List", &ids);
    let target = fx.collection("My List 2", &ids[15..]);
    let request = TransferRequest::all(source, target);

    let first = fx.ops.submit_transfer(request.clone()).unwrap();
    fx.wait_terminal(&first.operation_id);
    let after_first = fx.store.members(target);
    assert_eq!(after_first.len(), 20);

    let second = fx.ops.submit_transfer(request).unwrap();
    assert_eq!(second.status, OperationState::Completed);
    assert_eq!(second.detail.as_deref(), Some("No new rows to transfer"));
    assert_eq!(fx.store.members(target), after_first);
}

#[test]
fn transfer_explicit_ids_outside_source_are_copied() {
    let fx = Fixture::new(1000);
    let ids = fx.companies(6);
    let source = fx.collection("My List", &ids[..2]);
    let target = fx.collection("Liked Companies", &[]);

    // ids[4] is not in the source; EntityId(999) names no company
    let request = TransferRequest::only(source, target, [ids[0], ids[4], ids[4], EntityId(999)]);
    let accepted = fx.ops.submit_transfer(request).unwrap();
    let done = fx.wait_terminal(&accepted.operation_id);

    assert_eq!(done.detail.as_deref(), Some("Transferred 2 companies."));
    let members: Vec<_> = fx.store.members(target).into_iter().collect();
    assert_eq!(members, vec![ids[0], ids[4]]);
}

#[test]
fn transfer_with_missing_collection_is_not_found() {
    let fx = Fixture::new(1000);
    let ids = fx.companies(3);
    let source = fx.collection("My List", &ids);
    let missing = CollectionId::new();

    let err = fx
        .ops
        .submit_transfer(TransferRequest::all(source, missing))
        .unwrap_err();
    assert!(err.is_not_found());

    let err = fx
        .ops
        .submit_transfer(TransferRequest::all(missing, source))
        .unwrap_err();
    assert_eq!(err, Error::CollectionNotFound { collection: missing });
    assert!(fx.status.is_empty());
}

#[test]
fn transfer_progress_reports_each_batch() {
    let fx = Fixture::with_store(
        MemoryStore::new().with_commit_latency(std::time::Duration::from_millis(20)),
        3,
    );
    let ids = fx.companies(9);
    let source = fx.collection("My List", &ids);
    let target = fx.collection("Target", &[]);

    let (accepted, handle) = fx
        .ops
        .submit_transfer_tracked(TransferRequest::all(source, target))
        .unwrap();

    let mut details = Vec::new();
    let handle = handle.unwrap();
    while !handle.is_finished() {
        let status = fx.ops.operation_status(&accepted.operation_id).unwrap();
        if let Some(detail) = status.detail {
            if details.last() != Some(&detail) {
                details.push(detail);
            }
        }
        std::thread::sleep(std::time::Duration::from_millis(1));
    }
    let done = fx.ops.operation_status(&accepted.operation_id).unwrap();

    assert_eq!(done.detail.as_deref(), Some("Transferred 9 companies."));
    for detail in &details {
        assert!(
            detail == "Transfer has started." || detail.starts_with("Transferred "),
            "unexpected detail {}",
            detail
        );
    }
    assert!(details.iter().any(|d| d.ends_with(" of 9 companies.")));
}
