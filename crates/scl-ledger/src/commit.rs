use tracing::trace;

use scl_tx::Node;
use scl_types::party::relation_union;
use scl_types::{ContractId, EventId, GlobalKey, PartyRelation, StepId};

use crate::data::{LedgerData, NodeInfo};
use crate::error::CommitError;
use crate::records::RichTransaction;

/// Fold a committed transaction into the node-info index.
///
/// Takes the prior index by value and returns the successor; on rejection
/// the caller's ledger value is untouched, so a failed commit retains no
/// partial state. Rejections are the expected [`CommitError`] cases; a
/// structurally impossible transaction (nodes missing from the tree,
/// references to contracts the index has never seen) crashes the ledger,
/// as those are defects in the transaction producer.
///
/// A fetch or non-consuming exercise of an already-consumed contract is
/// folded as-is: the producer guarantees activeness where it matters, and
/// the index only records the reference.
pub fn apply_transaction(
    step_id: StepId,
    rtx: &RichTransaction,
    mut data: LedgerData,
) -> Result<LedgerData, CommitError> {
    if !rtx.failed_authorizations.is_empty() {
        return Err(CommitError::FailedAuthorizations {
            failed: rtx.failed_authorizations.clone(),
        });
    }

    // Pre-order over roots then exercise children, threading the enclosing
    // exercise as parent.
    let mut stack: Vec<(EventId, Option<EventId>)> =
        rtx.roots.iter().rev().map(|eid| (eid.clone(), None)).collect();

    while let Some((event_id, parent)) = stack.pop() {
        let Some(node) = rtx.nodes.get(&event_id) else {
            panic!("ledger crash: node {event_id} missing during commit");
        };
        trace!(node = %event_id, "folding node into index");

        data.node_infos.insert(
            event_id.clone(),
            NodeInfo::new(node.clone(), step_id, rtx.effective_at, parent),
        );

        match node {
            Node::Create(create) => {
                data.active_contracts.insert(create.coid.clone());
                data.coid_to_event_id
                    .insert(create.coid.clone(), event_id.clone());
                if let Some(key) = &create.key {
                    let global_key = GlobalKey::new(create.template_id.clone(), key.key.clone());
                    if data.active_keys.contains_key(&global_key) {
                        return Err(CommitError::UniqueKeyViolation { key: global_key });
                    }
                    data.active_keys.insert(global_key, create.coid.clone());
                }
            }
            Node::Fetch(fetch) => {
                reference(&mut data, &fetch.coid, &event_id);
            }
            Node::Exercise(exercise) => {
                reference(&mut data, &exercise.target_coid, &event_id);
                if exercise.consuming {
                    consume(&mut data, &exercise.target_coid, &event_id);
                }
                for child in exercise.children.iter().rev() {
                    stack.push((child.clone(), Some(event_id.clone())));
                }
            }
            Node::LookupByKey(lookup) => {
                if let Some(coid) = &lookup.result {
                    reference(&mut data, coid, &event_id);
                }
            }
        }
    }

    record_observers(step_id, rtx, &mut data);
    Ok(data)
}

/// Union the disclosure relations into one event-id-keyed observer
/// relation (divulgence is rewritten through the contract index, which by
/// now contains this transaction's own creates) and record onsets. A party
/// that already observes a node keeps its earlier onset.
fn record_observers(step_id: StepId, rtx: &RichTransaction, data: &mut LedgerData) {
    let mut observers: PartyRelation<EventId> = PartyRelation::new();
    for (event_id, parties) in rtx
        .explicit_disclosure
        .iter()
        .chain(rtx.local_implicit_disclosure.iter())
    {
        relation_union(&mut observers, event_id.clone(), parties);
    }
    for (coid, parties) in &rtx.global_implicit_disclosure {
        let Some(event_id) = data.coid_to_event_id.get(coid) else {
            panic!("ledger crash: divulged contract {coid} is not indexed");
        };
        relation_union(&mut observers, event_id.clone(), parties);
    }

    for (event_id, parties) in observers {
        let Some(info) = data.node_infos.get_mut(&event_id) else {
            panic!("ledger crash: observed node {event_id} is not indexed");
        };
        for party in parties {
            info.observing_since.entry(party).or_insert(step_id);
        }
    }
}

fn reference(data: &mut LedgerData, coid: &ContractId, referer: &EventId) {
    let Some(create_event) = data.coid_to_event_id.get(coid).cloned() else {
        panic!("ledger crash: referenced contract {coid} is not indexed");
    };
    let Some(info) = data.node_infos.get_mut(&create_event) else {
        panic!("ledger crash: contract {coid} is indexed without node info");
    };
    info.referenced_by.insert(referer.clone());
}

fn consume(data: &mut LedgerData, coid: &ContractId, consumer: &EventId) {
    data.active_contracts.remove(coid);
    let Some(create_event) = data.coid_to_event_id.get(coid).cloned() else {
        panic!("ledger crash: consumed contract {coid} is not indexed");
    };
    let Some(info) = data.node_infos.get_mut(&create_event) else {
        panic!("ledger crash: contract {coid} is indexed without node info");
    };
    info.consumed_by = Some(consumer.clone());

    let Node::Create(create) = &info.node else {
        panic!("ledger crash: consumed contract {coid} does not refer to a create");
    };
    if let Some(key) = &create.key {
        let global_key = GlobalKey::new(create.template_id.clone(), key.key.clone());
        data.active_keys.remove(&global_key);
    }
}
