// ABOUTME: Diff of desired versus existing event-source bindings, keyed by source ARN.
// ABOUTME: Produces create, update and delete operations that can be applied in any order.

use crate::desired::EventSourceBinding;
use crate::types::MappingId;

/// One change to the function's event-source bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingOp {
    /// Desired binding with no remote counterpart.
    Create(EventSourceBinding),
    /// Desired binding matched to an existing remote mapping.
    Update(EventSourceBinding, MappingId),
    /// Remote mapping absent from the desired set.
    Delete(MappingId),
}

impl BindingOp {
    pub fn is_create(&self) -> bool {
        matches!(self, BindingOp::Create(_))
    }

    pub fn is_update(&self) -> bool {
        matches!(self, BindingOp::Update(..))
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, BindingOp::Delete(_))
    }
}

/// Plan the operations that converge `existing` to `desired`.
///
/// Creates and updates follow desired order, deletes follow existing order.
/// Existing bindings without a remote id cannot be addressed and are ignored.
pub fn plan(desired: &[EventSourceBinding], existing: &[EventSourceBinding]) -> Vec<BindingOp> {
    let mut unmatched: Vec<(&str, &MappingId)> = existing
        .iter()
        .filter_map(|b| b.remote_id.as_ref().map(|id| (b.source_arn.as_str(), id)))
        .collect();

    let mut ops = Vec::with_capacity(desired.len() + unmatched.len());

    for binding in desired {
        let matched = unmatched
            .iter()
            .position(|(arn, _)| *arn == binding.source_arn);

        match matched {
            Some(index) => {
                let (_, id) = unmatched.remove(index);
                ops.push(BindingOp::Update(binding.clone(), id.clone()));
            }
            None => ops.push(BindingOp::Create(binding.clone())),
        }
    }

    ops.extend(unmatched.into_iter().map(|(_, id)| BindingOp::Delete(id.clone())));
    ops
}
