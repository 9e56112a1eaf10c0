use std::collections::{BTreeMap, BTreeSet};

use scl_tx::Node;
use scl_types::{ContractId, EventId, GlobalKey, Party, PartySet, StepId, Timestamp};

/// Everything the ledger remembers about one committed node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeInfo {
    /// The node itself, denormalized out of its transaction.
    pub node: Node<EventId>,
    /// The step that committed this node.
    pub step_id: StepId,
    /// Effective time of the owning transaction, denormalized for the
    /// lookup hot path.
    pub effective_at: Timestamp,
    /// For each observing party, the step at which observation began.
    /// Onsets never move later: the first disclosing step wins.
    pub observing_since: BTreeMap<Party, StepId>,
    /// Fetches, exercises, and positive key lookups pointing at this node's
    /// contract.
    pub referenced_by: BTreeSet<EventId>,
    /// The consuming exercise, if the contract created here was archived.
    pub consumed_by: Option<EventId>,
    /// The enclosing exercise, if any.
    pub parent: Option<EventId>,
}

impl NodeInfo {
    pub fn new(
        node: Node<EventId>,
        step_id: StepId,
        effective_at: Timestamp,
        parent: Option<EventId>,
    ) -> Self {
        Self {
            node,
            step_id,
            effective_at,
            observing_since: BTreeMap::new(),
            referenced_by: BTreeSet::new(),
            consumed_by: None,
            parent,
        }
    }

    /// All parties observing this node, regardless of onset.
    pub fn observers(&self) -> PartySet {
        self.observing_since.keys().cloned().collect()
    }

    pub fn observed_by(&self, party: &Party) -> bool {
        self.observing_since.contains_key(party)
    }
}

/// The persistent node-info index shared by all reads of a ledger value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerData {
    /// Contracts created and not yet consumed.
    pub active_contracts: BTreeSet<ContractId>,
    /// Keys of active contracts; at most one active contract per key.
    pub active_keys: BTreeMap<GlobalKey, ContractId>,
    /// Every created contract, mapped to its creating event.
    pub coid_to_event_id: BTreeMap<ContractId, EventId>,
    pub node_infos: BTreeMap<EventId, NodeInfo>,
}

impl LedgerData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_info(&self, event_id: &EventId) -> Option<&NodeInfo> {
        self.node_infos.get(event_id)
    }

    pub fn is_active(&self, coid: &ContractId) -> bool {
        self.active_contracts.contains(coid)
    }

    /// The active contract currently holding `key`, if any.
    pub fn lookup_key(&self, key: &GlobalKey) -> Option<&ContractId> {
        self.active_keys.get(key)
    }

    /// The event that created `coid`, if the contract is known at all.
    pub fn create_event(&self, coid: &ContractId) -> Option<&EventId> {
        self.coid_to_event_id.get(coid)
    }
}
