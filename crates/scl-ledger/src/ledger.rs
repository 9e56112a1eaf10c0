use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use scl_tx::{enrich_transaction, AuthorizationMode, ContractInstance, Node, Transaction};
use scl_types::{
    ContractId, EventId, Location, NodeId, Party, PartySet, StepId, TemplateId, Timestamp,
};

use crate::commit::apply_transaction;
use crate::data::LedgerData;
use crate::error::CommitError;
use crate::records::{RichTransaction, Step};

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// The read lens for contract lookups: the operator sees everything, a
/// participant only what has been disclosed or divulged to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    Operator,
    Participant(Party),
}

impl View {
    fn can_see(&self, info: &crate::data::NodeInfo) -> bool {
        match self {
            View::Operator => true,
            View::Participant(party) => info.observed_by(party),
        }
    }
}

// ---------------------------------------------------------------------------
// LookupResult
// ---------------------------------------------------------------------------

/// Classification of a visibility-scoped contract lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LookupResult {
    /// The contract id was never created on this ledger.
    NotFound,
    /// The contract exists but its transaction is not effective yet at the
    /// queried time.
    NotEffective {
        effective_at: Timestamp,
        template_id: TemplateId,
    },
    /// The contract was consumed by the given exercise.
    NotActive {
        template_id: TemplateId,
        consumed_by: EventId,
    },
    /// The contract is live but the view is not entitled to see it.
    NotVisible {
        template_id: TemplateId,
        observers: PartySet,
    },
    Ok {
        coid: ContractId,
        instance: ContractInstance,
        stakeholders: PartySet,
    },
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Result of a successful commit: the successor ledger, the step the
/// transaction was recorded under, and its committed form.
#[derive(Clone, Debug)]
pub struct CommitResult {
    pub ledger: Ledger,
    pub step_id: StepId,
    pub transaction: RichTransaction,
}

/// The scenario ledger value: current time, the step counter, the ordered
/// step log, and the node-info index.
///
/// A `Ledger` is immutable; every operation returns a new value and prior
/// values stay valid for reads. Failed commits return the error by value
/// and leave the input ledger as it was.
#[derive(Clone, Debug)]
pub struct Ledger {
    current_time: Timestamp,
    next_step_id: StepId,
    steps: BTreeMap<StepId, Step>,
    data: LedgerData,
}

impl Ledger {
    /// An empty ledger starting at the given time, before step 0.
    pub fn new(t0: Timestamp) -> Self {
        Self {
            current_time: t0,
            next_step_id: StepId::ZERO,
            steps: BTreeMap::new(),
            data: LedgerData::new(),
        }
    }

    pub fn current_time(&self) -> Timestamp {
        self.current_time
    }

    pub fn next_step_id(&self) -> StepId {
        self.next_step_id
    }

    pub fn data(&self) -> &LedgerData {
        &self.data
    }

    pub fn step(&self, step_id: StepId) -> Option<&Step> {
        self.steps.get(&step_id)
    }

    /// Steps in step order.
    pub fn steps(&self) -> impl Iterator<Item = (StepId, &Step)> {
        self.steps.iter().map(|(id, step)| (*id, step))
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// The event id a local node would get if the pending transaction were
    /// committed now. Used in messages about partial transactions that
    /// never reach the ledger.
    pub fn ptx_event_id(&self, node_id: NodeId) -> EventId {
        EventId::new(self.next_step_id, node_id)
    }

    /// Enrich `tx` under the committer's authority, validate it, and fold
    /// it into the index as the next step.
    pub fn commit_transaction(
        &self,
        committer: Party,
        effective_at: Timestamp,
        location: Option<Location>,
        tx: &Transaction,
    ) -> Result<CommitResult, CommitError> {
        let step_id = self.next_step_id;
        let mode = AuthorizationMode::authorize(PartySet::from([committer.clone()]));
        let enriched = enrich_transaction(&mode, tx);
        let rtx = RichTransaction::from_enriched(step_id, committer, effective_at, enriched);

        let data = match apply_transaction(step_id, &rtx, self.data.clone()) {
            Ok(data) => data,
            Err(err) => {
                debug!(step = %step_id, error = %err, "commit rejected");
                return Err(err);
            }
        };
        debug!(step = %step_id, nodes = rtx.nodes.len(), "transaction committed");

        let mut steps = self.steps.clone();
        steps.insert(
            step_id,
            Step::Commit {
                step_id,
                transaction: rtx.clone(),
                location,
            },
        );

        Ok(CommitResult {
            ledger: Ledger {
                current_time: self.current_time,
                next_step_id: step_id.next(),
                steps,
                data,
            },
            step_id,
            transaction: rtx,
        })
    }

    /// Advance current time by a signed microsecond delta. The index is
    /// unaffected; only the clock and the step log move.
    pub fn pass_time(&self, delta_micros: i64) -> Ledger {
        let step_id = self.next_step_id;
        debug!(step = %step_id, delta_micros, "passing time");

        let mut steps = self.steps.clone();
        steps.insert(step_id, Step::PassTime { delta_micros });

        Ledger {
            current_time: self.current_time.add_micros(delta_micros),
            next_step_id: step_id.next(),
            steps,
            data: self.data.clone(),
        }
    }

    /// Record the expectation that a submission by `actor` fails, at the
    /// current time, as its own step.
    pub fn insert_assert_must_fail(&self, actor: Party, location: Option<Location>) -> Ledger {
        let step_id = self.next_step_id;
        let mut steps = self.steps.clone();
        steps.insert(
            step_id,
            Step::AssertMustFail {
                actor,
                location,
                time: self.current_time,
                step_id,
            },
        );

        Ledger {
            current_time: self.current_time,
            next_step_id: step_id.next(),
            steps,
            data: self.data.clone(),
        }
    }

    /// Classify a contract lookup against a view and an effective time.
    /// The first matching rule wins: unknown or non-create ids are
    /// not-found, then effectiveness, then consumption, then visibility.
    pub fn lookup_global_contract(
        &self,
        view: &View,
        effective_at: Timestamp,
        coid: &ContractId,
    ) -> LookupResult {
        let Some(event_id) = self.data.coid_to_event_id.get(coid) else {
            return LookupResult::NotFound;
        };
        let Some(info) = self.data.node_infos.get(event_id) else {
            panic!("ledger crash: contract {coid} is indexed without node info");
        };

        match &info.node {
            Node::Create(create) => {
                if info.effective_at > effective_at {
                    LookupResult::NotEffective {
                        effective_at: info.effective_at,
                        template_id: create.template_id.clone(),
                    }
                } else if let Some(consumer) = &info.consumed_by {
                    LookupResult::NotActive {
                        template_id: create.template_id.clone(),
                        consumed_by: consumer.clone(),
                    }
                } else if !view.can_see(info) {
                    LookupResult::NotVisible {
                        template_id: create.template_id.clone(),
                        observers: info.observers(),
                    }
                } else {
                    LookupResult::Ok {
                        coid: create.coid.clone(),
                        instance: create.instance.clone(),
                        stakeholders: create.stakeholders.clone(),
                    }
                }
            }
            _ => LookupResult::NotFound,
        }
    }
}
