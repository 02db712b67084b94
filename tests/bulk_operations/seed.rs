//! The demo dataset driven through the service

use crate::common::*;
use bulkops::SeedPlan;

fn small_plan() -> SeedPlan {
    SeedPlan {
        companies: 5_000,
        my_list: 2_500,
        my_list_2: 1_000,
        liked: 10,
    }
}

#[test]
fn seeded_lists_transfer_and_delete() {
    let fx = Fixture::new(1000);
    let seeded = small_plan().apply(&fx.store).unwrap();

    // "My List 2" is a prefix of "My List": nothing new to copy
    let noop = fx
        .ops
        .submit_transfer(TransferRequest::all(seeded.my_list_2, seeded.my_list))
        .unwrap();
    assert_eq!(noop.detail.as_deref(), Some("No new rows to transfer"));

    // The other direction copies the 1500 the smaller list lacks
    let grow = fx
        .ops
        .submit_transfer(TransferRequest::all(seeded.my_list, seeded.my_list_2))
        .unwrap();
    let done = fx.wait_terminal(&grow.operation_id);
    assert_eq!(done.detail.as_deref(), Some("Transferred 1500 companies."));
    assert_eq!(fx.store.members(seeded.my_list_2).len(), 2_500);

    let wipe = fx.ops.submit_delete(DeleteRequest::all(seeded.my_list)).unwrap();
    let done = fx.wait_terminal(&wipe.operation_id);
    assert!(done.detail.as_deref().unwrap().contains("2500 of 2500"));
    assert!(fx.store.members(seeded.my_list).is_empty());
    assert_eq!(fx.store.members(seeded.liked).len(), 10);
}

#[test]
fn demo_plan_matches_documented_sizes() {
    let plan = SeedPlan::demo();
    assert_eq!(plan.companies, 100_000);
    assert_eq!(plan.my_list, 50_000);
    assert_eq!(plan.my_list_2, 1_000);
    assert_eq!(plan.liked, 10);
    assert_eq!(SeedPlan::default(), plan);
}
