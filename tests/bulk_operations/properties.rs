//! Property tests over row counts, batch sizes and id subsets

use std::collections::BTreeSet;

use proptest::prelude::*;

use crate::common::*;

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 24,
        ..ProptestConfig::default()
    }
}

proptest! {
    #![proptest_config(config())]

    /// N rows with batch size B commit in exactly ceil(N/B) transactions and
    /// the final detail reports N of N.
    #[test]
    fn prop_delete_batches_partition_rows(rows in 1usize..300, batch_size in 1usize..64) {
        let fx = Fixture::new(batch_size);
        let ids = fx.companies(rows);
        let list = fx.collection("list", &ids);

        let accepted = fx.ops.submit_delete(DeleteRequest::all(list)).unwrap();
        let done = fx.wait_terminal(&accepted.operation_id);

        prop_assert_eq!(done.status, OperationState::Completed);
        prop_assert_eq!(
            fx.store.commit_count() as usize,
            rows.div_ceil(batch_size)
        );
        let expected = format!("Deleted {} of {} companies from the collection.", rows, rows);
        prop_assert_eq!(done.detail.as_deref(), Some(expected.as_str()));
    }

    /// delete(C, E) removes exactly E ∩ members(C) and touches no other collection.
    #[test]
    fn prop_delete_subset_removes_intersection(
        members in proptest::collection::btree_set(0usize..60, 0..60),
        requested in proptest::collection::vec(0usize..80, 1..40),
    ) {
        let fx = Fixture::new(7);
        let ids = fx.companies(80);
        let member_ids: Vec<EntityId> = members.iter().map(|&i| ids[i]).collect();
        let list = fx.collection("list", &member_ids);
        let bystander = fx.collection("bystander", &ids);

        let requested_ids: Vec<EntityId> = requested.iter().map(|&i| ids[i]).collect();
        let accepted = fx
            .ops
            .submit_delete(DeleteRequest::only(list, requested_ids.clone()))
            .unwrap();
        fx.wait_terminal(&accepted.operation_id);

        let requested_set: BTreeSet<EntityId> = requested_ids.into_iter().collect();
        let expected: BTreeSet<EntityId> = member_ids
            .into_iter()
            .filter(|id| !requested_set.contains(id))
            .collect();
        prop_assert_eq!(fx.store.members(list), expected);
        prop_assert_eq!(fx.store.members(bystander).len(), 80);
    }

    /// transfer(S, T, E) never duplicates a pair, and a second run changes nothing.
    #[test]
    fn prop_transfer_is_idempotent(
        source_members in proptest::collection::btree_set(0usize..50, 0..50),
        target_members in proptest::collection::btree_set(0usize..50, 0..50),
        batch_size in 1usize..16,
    ) {
        let fx = Fixture::new(batch_size);
        let ids = fx.companies(50);
        let pick = |set: &BTreeSet<usize>| -> Vec<EntityId> { set.iter().map(|&i| ids[i]).collect() };
        let source = fx.collection("source", &pick(&source_members));
        let target = fx.collection("target", &pick(&target_members));
        let rows_before = fx.store.association_count();

        let first = fx.ops.submit_transfer(TransferRequest::all(source, target)).unwrap();
        fx.wait_terminal(&first.operation_id);
        let after_first = fx.store.members(target);

        let union: BTreeSet<usize> = source_members.union(&target_members).copied().collect();
        prop_assert_eq!(after_first.len(), union.len());
        prop_assert_eq!(
            fx.store.association_count(),
            rows_before + source_members.difference(&target_members).count()
        );

        let second = fx.ops.submit_transfer(TransferRequest::all(source, target)).unwrap();
        prop_assert_eq!(second.status, OperationState::Completed);
        prop_assert_eq!(second.detail.as_deref(), Some("No new rows to transfer"));
        prop_assert_eq!(fx.store.members(target), after_first);
    }
}
