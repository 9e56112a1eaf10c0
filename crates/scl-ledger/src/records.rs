use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use scl_tx::{EnrichedTransaction, FailedAuthorizations, Node};
use scl_types::{ContractId, EventId, Location, Party, PartyRelation, StepId, Timestamp};

// ---------------------------------------------------------------------------
// RichTransaction
// ---------------------------------------------------------------------------

/// A committed transaction: the enriched tree with every local node id
/// rewritten to its global event id, plus the commit metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichTransaction {
    pub committer: Party,
    pub effective_at: Timestamp,
    pub roots: Vec<EventId>,
    pub nodes: BTreeMap<EventId, Node<EventId>>,
    pub explicit_disclosure: PartyRelation<EventId>,
    pub local_implicit_disclosure: PartyRelation<EventId>,
    pub global_implicit_disclosure: PartyRelation<ContractId>,
    /// Keyed by local node id; empty on every transaction the ledger
    /// actually accepts.
    pub failed_authorizations: FailedAuthorizations,
}

impl RichTransaction {
    /// Rewrite an enriched transaction into its committed form under
    /// `step_id`: roots, node keys, exercise child lists, and the
    /// node-keyed disclosure relations all move to event ids.
    pub fn from_enriched(
        step_id: StepId,
        committer: Party,
        effective_at: Timestamp,
        enriched: EnrichedTransaction,
    ) -> Self {
        let event_id = |nid| EventId::new(step_id, nid);

        Self {
            committer,
            effective_at,
            roots: enriched.roots.into_iter().map(event_id).collect(),
            nodes: enriched
                .nodes
                .into_iter()
                .map(|(nid, node)| (event_id(nid), node.map_nid(event_id)))
                .collect(),
            explicit_disclosure: enriched
                .explicit_disclosure
                .into_iter()
                .map(|(nid, parties)| (event_id(nid), parties))
                .collect(),
            local_implicit_disclosure: enriched
                .local_implicit_disclosure
                .into_iter()
                .map(|(nid, parties)| (event_id(nid), parties))
                .collect(),
            global_implicit_disclosure: enriched.global_implicit_disclosure,
            failed_authorizations: enriched.failed_authorizations,
        }
    }
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// One entry of the scenario step log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    /// A committed transaction.
    Commit {
        step_id: StepId,
        transaction: RichTransaction,
        location: Option<Location>,
    },
    /// Time advanced by a signed microsecond delta.
    PassTime { delta_micros: i64 },
    /// A recorded expectation that a submission by `actor` fails.
    AssertMustFail {
        actor: Party,
        location: Option<Location>,
        time: Timestamp,
        step_id: StepId,
    },
}
