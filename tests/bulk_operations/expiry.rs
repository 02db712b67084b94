//! Status expiry and a degraded status store

use std::sync::Arc;
use std::time::Duration;

use crate::common::*;
use bulkops::ExpirySweeper;

fn short_ttl_fixture() -> Fixture {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let status = Arc::new(MemoryStatusStore::new());
    let config = BulkOpsConfig {
        status_ttl_secs: 1,
        ..BulkOpsConfig::default()
    };
    let ops = BulkOps::new(config, store.clone(), status.clone()).unwrap();
    Fixture { store, status, ops }
}

#[test]
fn status_expires_after_ttl() {
    let fx = short_ttl_fixture();
    let ids = fx.companies(3);
    let list = fx.collection("My List", &ids);

    let accepted = fx.ops.submit_delete(DeleteRequest::all(list)).unwrap();
    assert_eq!(fx.wait_terminal(&accepted.operation_id).status, OperationState::Completed);

    std::thread::sleep(Duration::from_millis(1100));
    let err = fx.ops.operation_status(&accepted.operation_id).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn sweeper_reclaims_expired_records() {
    let fx = short_ttl_fixture();
    let ids = fx.companies(3);
    let list = fx.collection("My List", &ids);

    let sweeper = ExpirySweeper::new(Arc::clone(&fx.status), Duration::from_millis(50));
    let handle = sweeper.start();

    let accepted = fx.ops.submit_delete(DeleteRequest::all(list)).unwrap();
    fx.wait_terminal(&accepted.operation_id);
    assert_eq!(fx.status.len(), 1);

    std::thread::sleep(Duration::from_millis(1300));
    sweeper.shutdown();
    handle.join().unwrap();

    assert!(fx.status.is_empty());
}

#[test]
fn unavailable_status_store_does_not_fail_the_mutation() {
    let fx = Fixture::new(2);
    let ids = fx.companies(8);
    let list = fx.collection("My List", &ids);
    fx.status.set_available(false);

    let (accepted, handle) = fx
        .ops
        .submit_delete_tracked(DeleteRequest::all(list))
        .unwrap();
    assert_eq!(accepted.status, OperationState::InProgress);
    handle.unwrap().wait();

    // The mutation ran to the end; only its visibility was lost
    assert!(fx.store.members(list).is_empty());
    assert_eq!(fx.store.commit_count(), 4);
    assert!(fx
        .ops
        .operation_status(&accepted.operation_id)
        .unwrap_err()
        .is_not_found());

    fx.status.set_available(true);
    assert!(fx.ops.operation_status(&accepted.operation_id).is_err());
}

#[test]
fn status_store_recovering_mid_run_shows_later_updates() {
    let fx = Fixture::with_store(
        MemoryStore::new().with_commit_latency(Duration::from_millis(40)),
        1,
    );
    let ids = fx.companies(4);
    let list = fx.collection("My List", &ids);
    fx.status.set_available(false);

    let (accepted, handle) = fx
        .ops
        .submit_delete_tracked(DeleteRequest::all(list))
        .unwrap();
    std::thread::sleep(Duration::from_millis(60));
    fx.status.set_available(true);
    handle.unwrap().wait();

    let done = fx.ops.operation_status(&accepted.operation_id).unwrap();
    assert_eq!(done.status, OperationState::Completed);
    assert_eq!(
        done.detail.as_deref(),
        Some("Deleted 4 of 4 companies from the collection.")
    );
}
