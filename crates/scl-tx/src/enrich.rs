use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use scl_types::party::relation_union;
use scl_types::{ContractId, NodeId, PartyRelation, PartySet};

use crate::auth::{
    check_create, check_exercise, check_fetch, check_lookup_by_key, AuthorizationMode,
    FailedAuthorizations,
};
use crate::node::{Node, Transaction};

// ---------------------------------------------------------------------------
// EnrichedTransaction
// ---------------------------------------------------------------------------

/// A transaction tree augmented with everything a commit needs: who may see
/// each node, which contracts were divulged to whom, and which nodes failed
/// authorization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedTransaction {
    pub roots: Vec<NodeId>,
    pub nodes: BTreeMap<NodeId, Node<NodeId>>,
    /// Parties entitled to see a node because they witnessed it.
    pub explicit_disclosure: PartyRelation<NodeId>,
    /// Divulgence to contracts created within this same transaction.
    /// The current enrichment rules route all divulgence through the
    /// global relation; this one participates in the observer fold so the
    /// commit processor treats all three relations uniformly.
    pub local_implicit_disclosure: PartyRelation<NodeId>,
    /// Divulgence keyed by contract id: parties that learned of a contract
    /// by witnessing a parent node that referenced it.
    pub global_implicit_disclosure: PartyRelation<ContractId>,
    pub failed_authorizations: FailedAuthorizations,
}

// ---------------------------------------------------------------------------
// Enrichment traversal
// ---------------------------------------------------------------------------

/// Traversal state for one pending node: the witnesses of the enclosing
/// exercise chain and the authorization mode in force at this depth.
struct Frame {
    node_id: NodeId,
    parent_witnesses: PartySet,
    mode: AuthorizationMode,
}

/// Enrich a transaction in a single pre-order traversal over the roots and
/// exercise children.
///
/// Witnesses propagate downwards: each node is disclosed to its own
/// informees joined with the witnesses of every enclosing exercise.
/// Fetches and exercises additionally divulge their target contract id to
/// enclosing witnesses that are not stakeholders, and a create divulges
/// every contract id reachable inside its instance argument to the same
/// leak set. Under
/// [`AuthorizationMode::Authorize`] each node is checked against the
/// authorizers in force, which an exercise replaces for its subtree by its
/// signatories joined with its acting parties.
///
/// The traversal is deterministic and pure: enriching the same tree with
/// the same mode twice yields identical relations and failures.
///
/// # Panics
///
/// Panics if a root or child id is missing from the node map; transaction
/// producers guarantee well-formed trees (see [`Transaction::validate`]).
pub fn enrich_transaction(mode: &AuthorizationMode, tx: &Transaction) -> EnrichedTransaction {
    let mut explicit_disclosure: PartyRelation<NodeId> = PartyRelation::new();
    let local_implicit_disclosure: PartyRelation<NodeId> = PartyRelation::new();
    let mut global_implicit_disclosure: PartyRelation<ContractId> = PartyRelation::new();
    let mut failed_authorizations = FailedAuthorizations::new();

    // Explicit work stack; children are pushed in reverse so they pop in
    // order. This keeps long exercise chains off the call stack.
    let mut stack: Vec<Frame> = Vec::with_capacity(tx.roots.len());
    for &root in tx.roots.iter().rev() {
        stack.push(Frame {
            node_id: root,
            parent_witnesses: mode.initial_witnesses(),
            mode: mode.clone(),
        });
    }

    while let Some(frame) = stack.pop() {
        let node_id = frame.node_id;
        let Some(node) = tx.node(node_id) else {
            panic!("ledger crash: node {node_id} missing during enrichment");
        };

        let witnesses: PartySet = frame
            .parent_witnesses
            .union(&node.informees())
            .cloned()
            .collect();

        match node {
            Node::Create(create) => {
                if let AuthorizationMode::Authorize { authorizers } = &frame.mode {
                    check_create(authorizers, node_id, create, &mut failed_authorizations);
                }
                relation_union(&mut explicit_disclosure, node_id, &witnesses);
                // Contract ids embedded in the instance argument leak to
                // every witness of the create that is not a stakeholder.
                for coid in create.instance.arg.contract_ids() {
                    divulge(
                        &mut global_implicit_disclosure,
                        &coid,
                        &witnesses,
                        &create.stakeholders,
                    );
                }
            }
            Node::Fetch(fetch) => {
                relation_union(&mut explicit_disclosure, node_id, &witnesses);
                divulge(
                    &mut global_implicit_disclosure,
                    &fetch.coid,
                    &frame.parent_witnesses,
                    &fetch.stakeholders,
                );
                if let AuthorizationMode::Authorize { authorizers } = &frame.mode {
                    check_fetch(authorizers, node_id, fetch, &mut failed_authorizations);
                }
            }
            Node::Exercise(exercise) => {
                if let AuthorizationMode::Authorize { authorizers } = &frame.mode {
                    check_exercise(authorizers, node_id, exercise, &mut failed_authorizations);
                }
                relation_union(&mut explicit_disclosure, node_id, &witnesses);
                divulge(
                    &mut global_implicit_disclosure,
                    &exercise.target_coid,
                    &frame.parent_witnesses,
                    &exercise.stakeholders,
                );

                // The exercise's authority replaces the inherited one for
                // its subtree; DontAuthorize propagates unchanged.
                let child_mode = match &frame.mode {
                    AuthorizationMode::DontAuthorize => AuthorizationMode::DontAuthorize,
                    AuthorizationMode::Authorize { .. } => AuthorizationMode::Authorize {
                        authorizers: exercise
                            .signatories
                            .union(&exercise.acting_parties)
                            .cloned()
                            .collect(),
                    },
                };
                for &child in exercise.children.iter().rev() {
                    stack.push(Frame {
                        node_id: child,
                        parent_witnesses: witnesses.clone(),
                        mode: child_mode.clone(),
                    });
                }
            }
            Node::LookupByKey(lookup) => {
                if let AuthorizationMode::Authorize { authorizers } = &frame.mode {
                    check_lookup_by_key(authorizers, node_id, lookup, &mut failed_authorizations);
                }
                relation_union(&mut explicit_disclosure, node_id, &witnesses);
            }
        }
    }

    EnrichedTransaction {
        roots: tx.roots.clone(),
        nodes: tx.nodes.clone(),
        explicit_disclosure,
        local_implicit_disclosure,
        global_implicit_disclosure,
        failed_authorizations,
    }
}

/// Divulge `coid` to the enclosing witnesses that are not already
/// stakeholders of it. Empty differences record nothing, so the relation
/// only ever carries real leaks.
fn divulge(
    global: &mut PartyRelation<ContractId>,
    coid: &ContractId,
    parent_witnesses: &PartySet,
    stakeholders: &PartySet,
) {
    let leaked: PartySet = parent_witnesses.difference(stakeholders).cloned().collect();
    if !leaked.is_empty() {
        relation_union(global, coid.clone(), &leaked);
    }
}
