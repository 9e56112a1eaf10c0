use scl_tx::Node;
use scl_types::GlobalKey;

use crate::data::LedgerData;

/// Result of sweeping a ledger's index for its structural invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub node_count: u64,
    pub active_agreement: bool,
    pub key_agreement: bool,
    pub forest_consistent: bool,
    pub references_closed: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific invariant violation found in the index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    /// An active contract that is unindexed, consumed, or not a create.
    ActiveMismatch,
    /// A consumed contract still present in the active set.
    ConsumedStillActive,
    /// active-keys disagrees with the keyed active contracts.
    KeyMismatch,
    /// A parent/child pointer that does not match the transaction shape.
    BrokenParentLink,
    /// A referenced-by entry pointing at a node the index does not hold.
    DanglingReference,
}

/// Diagnostic sweep over a [`LedgerData`]. Commits never consult this;
/// it exists for tests and post-mortem inspection of scenario runs.
pub struct LedgerValidator;

impl LedgerValidator {
    pub fn validate(data: &LedgerData) -> ValidationReport {
        let mut violations = Vec::new();
        let mut active_agreement = true;
        let mut key_agreement = true;
        let mut forest_consistent = true;
        let mut references_closed = true;

        // Active contracts: indexed, created, unconsumed.
        for coid in &data.active_contracts {
            let info = data
                .coid_to_event_id
                .get(coid)
                .and_then(|eid| data.node_infos.get(eid));
            match info {
                None => {
                    active_agreement = false;
                    violations.push(Violation {
                        kind: ViolationKind::ActiveMismatch,
                        description: format!("active contract {coid} is not indexed"),
                    });
                }
                Some(info) => {
                    if !matches!(info.node, Node::Create(_)) {
                        active_agreement = false;
                        violations.push(Violation {
                            kind: ViolationKind::ActiveMismatch,
                            description: format!("active contract {coid} does not refer to a create"),
                        });
                    }
                    if let Some(consumer) = &info.consumed_by {
                        active_agreement = false;
                        violations.push(Violation {
                            kind: ViolationKind::ConsumedStillActive,
                            description: format!(
                                "active contract {coid} was consumed by {consumer}"
                            ),
                        });
                    }
                }
            }
        }

        // Keys: every entry names an active contract carrying that key, and
        // every keyed active create is registered.
        for coid in data.active_keys.values() {
            if !data.active_contracts.contains(coid) {
                key_agreement = false;
                violations.push(Violation {
                    kind: ViolationKind::KeyMismatch,
                    description: format!("active key maps to inactive contract {coid}"),
                });
            }
        }
        for coid in &data.active_contracts {
            let Some(info) = data
                .coid_to_event_id
                .get(coid)
                .and_then(|eid| data.node_infos.get(eid))
            else {
                continue; // already reported above
            };
            if let Node::Create(create) = &info.node {
                if let Some(key) = &create.key {
                    let global_key = GlobalKey::new(create.template_id.clone(), key.key.clone());
                    if data.active_keys.get(&global_key) != Some(coid) {
                        key_agreement = false;
                        violations.push(Violation {
                            kind: ViolationKind::KeyMismatch,
                            description: format!(
                                "keyed active contract {coid} is missing from active-keys"
                            ),
                        });
                    }
                }
            }
        }

        // The other direction of active agreement: every unconsumed create
        // must still be in the active set.
        for (event_id, info) in &data.node_infos {
            if let Node::Create(create) = &info.node {
                if info.consumed_by.is_none() && !data.active_contracts.contains(&create.coid) {
                    active_agreement = false;
                    violations.push(Violation {
                        kind: ViolationKind::ActiveMismatch,
                        description: format!(
                            "unconsumed create {event_id} is missing from the active set"
                        ),
                    });
                }
            }
        }

        // Forest: parent pointers match the exercises' child lists.
        for (event_id, info) in &data.node_infos {
            if let Some(parent) = &info.parent {
                let ok = match data.node_infos.get(parent) {
                    Some(parent_info) => match &parent_info.node {
                        Node::Exercise(exercise) => exercise.children.contains(event_id),
                        _ => false,
                    },
                    None => false,
                };
                if !ok {
                    forest_consistent = false;
                    violations.push(Violation {
                        kind: ViolationKind::BrokenParentLink,
                        description: format!("node {event_id} claims parent {parent}"),
                    });
                }
            }
            if let Node::Exercise(exercise) = &info.node {
                for child in &exercise.children {
                    let ok = data
                        .node_infos
                        .get(child)
                        .is_some_and(|child_info| child_info.parent.as_ref() == Some(event_id));
                    if !ok {
                        forest_consistent = false;
                        violations.push(Violation {
                            kind: ViolationKind::BrokenParentLink,
                            description: format!(
                                "exercise {event_id} lists child {child} without a back-pointer"
                            ),
                        });
                    }
                }
            }

            // Referenced-by and consumer entries must resolve in the index.
            for referer in &info.referenced_by {
                if !data.node_infos.contains_key(referer) {
                    references_closed = false;
                    violations.push(Violation {
                        kind: ViolationKind::DanglingReference,
                        description: format!("node {event_id} referenced by unknown {referer}"),
                    });
                }
            }
            if let Some(consumer) = &info.consumed_by {
                if !data.node_infos.contains_key(consumer) {
                    references_closed = false;
                    violations.push(Violation {
                        kind: ViolationKind::DanglingReference,
                        description: format!("node {event_id} consumed by unknown {consumer}"),
                    });
                }
            }
        }

        ValidationReport {
            node_count: data.node_infos.len() as u64,
            active_agreement,
            key_agreement,
            forest_consistent,
            references_closed,
            violations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scl_tx::{
        ContractInstance, CreateNode, ExerciseNode, KeyWithMaintainers, TransactionBuilder,
    };
    use scl_types::{
        ChoiceName, ContractId, EventId, NodeId, Party, PartySet, StepId, TemplateId, Timestamp,
        Value,
    };

    use crate::ledger::Ledger;

    fn parties(names: &[&str]) -> PartySet {
        names.iter().map(|n| Party::new(*n)).collect()
    }

    fn create_node(coid: &str, key: Option<&str>) -> CreateNode {
        CreateNode {
            coid: ContractId::new(coid),
            template_id: TemplateId::new("Main:Iou"),
            instance: ContractInstance::new(TemplateId::new("Main:Iou"), Value::Unit),
            signatories: parties(&["Alice"]),
            stakeholders: parties(&["Alice"]),
            key: key.map(|k| KeyWithMaintainers {
                key: Value::Text(k.into()),
                maintainers: parties(&["Alice"]),
            }),
            location: None,
        }
    }

    fn exercise_node(coid: &str, consuming: bool) -> ExerciseNode<NodeId> {
        ExerciseNode {
            target_coid: ContractId::new(coid),
            template_id: TemplateId::new("Main:Iou"),
            choice: ChoiceName::new("Transfer"),
            consuming,
            acting_parties: parties(&["Alice"]),
            signatories: parties(&["Alice"]),
            stakeholders: parties(&["Alice"]),
            controllers_differ_from_actors: false,
            children: Vec::new(),
            location: None,
        }
    }

    fn scenario_ledger() -> Ledger {
        let alice = Party::new("Alice");
        let t0 = Timestamp::EPOCH;

        let mut b = TransactionBuilder::new();
        b.create(create_node("c1", Some("k1")));
        b.create(create_node("c2", None));
        let tx = b.build();
        let ledger = Ledger::new(t0)
            .commit_transaction(alice.clone(), t0, None, &tx)
            .unwrap()
            .ledger;

        let mut b = TransactionBuilder::new();
        b.begin_exercise(exercise_node("c1", true));
        b.create(create_node("c3", Some("k1")));
        b.end_exercise();
        let tx = b.build();
        ledger
            .commit_transaction(alice, t0, None, &tx)
            .unwrap()
            .ledger
    }

    #[test]
    fn committed_ledgers_validate_cleanly() {
        let ledger = scenario_ledger();
        let report = LedgerValidator::validate(ledger.data());
        assert!(report.is_valid(), "violations: {:?}", report.violations);
        assert_eq!(report.node_count, 4);
        assert!(report.active_agreement);
        assert!(report.key_agreement);
        assert!(report.forest_consistent);
        assert!(report.references_closed);
    }

    #[test]
    fn empty_ledger_is_valid() {
        let report = LedgerValidator::validate(Ledger::new(Timestamp::EPOCH).data());
        assert!(report.is_valid());
        assert_eq!(report.node_count, 0);
    }

    #[test]
    fn detects_consumed_contract_left_active() {
        let ledger = scenario_ledger();
        let mut data = ledger.data().clone();
        data.active_contracts.insert(ContractId::new("c1"));

        let report = LedgerValidator::validate(&data);
        assert!(!report.is_valid());
        assert!(!report.active_agreement);
        assert!(report
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::ConsumedStillActive));
    }

    #[test]
    fn detects_key_pointing_at_inactive_contract() {
        let ledger = scenario_ledger();
        let mut data = ledger.data().clone();
        data.active_keys.insert(
            GlobalKey::new(TemplateId::new("Main:Iou"), Value::Text("stale".into())),
            ContractId::new("c1"),
        );

        let report = LedgerValidator::validate(&data);
        assert!(!report.key_agreement);
        assert!(report
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::KeyMismatch));
    }

    #[test]
    fn detects_broken_parent_link() {
        let ledger = scenario_ledger();
        let mut data = ledger.data().clone();
        let bogus_parent = EventId::new(StepId::new(9), NodeId::new(9));
        let some_eid = data.node_infos.keys().next().unwrap().clone();
        data.node_infos.get_mut(&some_eid).unwrap().parent = Some(bogus_parent);

        let report = LedgerValidator::validate(&data);
        assert!(!report.forest_consistent);
        assert!(report
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::BrokenParentLink));
    }

    #[test]
    fn detects_dangling_reference() {
        let ledger = scenario_ledger();
        let mut data = ledger.data().clone();
        let ghost = EventId::new(StepId::new(9), NodeId::new(0));
        let some_eid = data.node_infos.keys().next().unwrap().clone();
        data.node_infos
            .get_mut(&some_eid)
            .unwrap()
            .referenced_by
            .insert(ghost);

        let report = LedgerValidator::validate(&data);
        assert!(!report.references_closed);
        assert!(report
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::DanglingReference));
    }
}
