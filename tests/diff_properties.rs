// ABOUTME: Property tests for the event-source diff.
// ABOUTME: Every binding lands in exactly one of create, update or delete.

use lambdeploy::desired::EventSourceBinding;
use lambdeploy::reconcile::{BindingOp, plan};
use lambdeploy::types::MappingId;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn arn_set() -> impl Strategy<Value = BTreeSet<u8>> {
    prop::collection::btree_set(0u8..16, 0..10)
}

fn desired_from(keys: &BTreeSet<u8>) -> Vec<EventSourceBinding> {
    keys.iter()
        .map(|k| EventSourceBinding::new(format!("arn:source:{k}")))
        .collect()
}

fn existing_from(keys: &BTreeSet<u8>) -> Vec<EventSourceBinding> {
    keys.iter()
        .map(|k| {
            EventSourceBinding::new(format!("arn:source:{k}"))
                .with_remote_id(MappingId::new(format!("id-{k}")))
        })
        .collect()
}

proptest! {
    #[test]
    fn diff_partitions_desired_and_existing(desired in arn_set(), existing in arn_set()) {
        let ops = plan(&desired_from(&desired), &existing_from(&existing));

        let creates: BTreeSet<String> = ops.iter().filter_map(|op| match op {
            BindingOp::Create(b) => Some(b.source_arn.clone()),
            _ => None,
        }).collect();
        let updates: BTreeSet<String> = ops.iter().filter_map(|op| match op {
            BindingOp::Update(b, _) => Some(b.source_arn.clone()),
            _ => None,
        }).collect();
        let deletes: BTreeSet<String> = ops.iter().filter_map(|op| match op {
            BindingOp::Delete(id) => Some(id.to_string()),
            _ => None,
        }).collect();

        let expect_creates: BTreeSet<String> =
            desired.difference(&existing).map(|k| format!("arn:source:{k}")).collect();
        let expect_updates: BTreeSet<String> =
            desired.intersection(&existing).map(|k| format!("arn:source:{k}")).collect();
        let expect_deletes: BTreeSet<String> =
            existing.difference(&desired).map(|k| format!("id-{k}")).collect();

        prop_assert_eq!(&creates, &expect_creates);
        prop_assert_eq!(&updates, &expect_updates);
        prop_assert_eq!(&deletes, &expect_deletes);
        prop_assert_eq!(
            ops.len(),
            expect_creates.len() + expect_updates.len() + expect_deletes.len()
        );
    }

    #[test]
    fn updates_carry_the_matching_remote_id(keys in arn_set()) {
        let ops = plan(&desired_from(&keys), &existing_from(&keys));

        for op in &ops {
            match op {
                BindingOp::Update(binding, id) => {
                    let key = binding.source_arn.trim_start_matches("arn:source:");
                    prop_assert_eq!(id.as_str(), format!("id-{key}"));
                }
                other => prop_assert!(false, "unexpected op {:?}", other),
            }
        }
    }

    #[test]
    fn replanning_after_convergence_has_no_creates_or_deletes(keys in arn_set()) {
        let converged = existing_from(&keys);
        let ops = plan(&desired_from(&keys), &converged);

        prop_assert!(ops.iter().all(|op| op.is_update()));
    }
}
