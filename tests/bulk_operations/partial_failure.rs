//! A batch fails mid-run

use crate::common::*;

#[test]
fn failure_in_batch_k_keeps_earlier_batches() {
    let fx = Fixture::new(10);
    let ids = fx.companies(50);
    let list = fx.collection("My List", &ids);
    // Batches 1 and 2 commit, batch 3 of 5 fails
    fx.store.fail_nth_commit(3, "could not serialize access");

    let accepted = fx.ops.submit_delete(DeleteRequest::all(list)).unwrap();
    let done = fx.wait_terminal(&accepted.operation_id);

    assert_eq!(done.status, OperationState::Failed);
    assert_eq!(
        done.detail.as_deref(),
        Some("storage error: could not serialize access")
    );
    let remaining: Vec<_> = fx.store.members(list).into_iter().collect();
    assert_eq!(remaining, ids[20..].to_vec());
    // Batches 4 and 5 were never attempted
    assert_eq!(fx.store.commit_count(), 3);
}

#[test]
fn failure_in_first_batch_changes_nothing() {
    let fx = Fixture::new(5);
    let ids = fx.companies(12);
    let source = fx.collection("My List", &ids);
    let target = fx.collection("Target", &[]);
    fx.store.fail_nth_commit(1, "connection reset by peer");

    let accepted = fx
        .ops
        .submit_transfer(TransferRequest::all(source, target))
        .unwrap();
    let done = fx.wait_terminal(&accepted.operation_id);

    assert_eq!(done.status, OperationState::Failed);
    assert!(done.detail.as_deref().unwrap().contains("connection reset by peer"));
    assert!(fx.store.members(target).is_empty());
}

#[test]
fn failed_transfer_can_be_resumed_by_resubmitting() {
    let fx = Fixture::new(4);
    let ids = fx.companies(10);
    let source = fx.collection("My List", &ids);
    let target = fx.collection("Target", &[]);
    fx.store.fail_nth_commit(2, "lock timeout");

    let first = fx
        .ops
        .submit_transfer(TransferRequest::all(source, target))
        .unwrap();
    assert_eq!(fx.wait_terminal(&first.operation_id).status, OperationState::Failed);
    assert_eq!(fx.store.members(target).len(), 4);

    // The resolver skips what the first run committed
    let second = fx
        .ops
        .submit_transfer(TransferRequest::all(source, target))
        .unwrap();
    let done = fx.wait_terminal(&second.operation_id);
    assert_eq!(done.detail.as_deref(), Some("Transferred 6 companies."));
    assert_eq!(fx.store.members(target), fx.store.members(source));
}

#[test]
fn collection_dropped_mid_run_fails_the_transfer() {
    let fx = Fixture::with_store(
        MemoryStore::new().with_commit_latency(std::time::Duration::from_millis(30)),
        2,
    );
    let ids = fx.companies(10);
    let source = fx.collection("My List", &ids);
    let target = fx.collection("Target", &[]);

    let (accepted, handle) = fx
        .ops
        .submit_transfer_tracked(TransferRequest::all(source, target))
        .unwrap();
    fx.store.drop_collection(target);
    handle.unwrap().wait();

    let done = fx.ops.operation_status(&accepted.operation_id).unwrap();
    assert_eq!(done.status, OperationState::Failed);
    assert!(done.detail.as_deref().unwrap().starts_with("constraint violation"));
}
