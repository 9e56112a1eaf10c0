use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use scl_types::{
    ChoiceName, ContractId, Location, NodeId, PartySet, TemplateId, Value,
};

use crate::error::TxError;

// ---------------------------------------------------------------------------
// Node payloads
// ---------------------------------------------------------------------------

/// The contract instance embedded in a create node.
///
/// The argument value may itself contain contract ids; the enricher walks
/// it when computing divulgence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractInstance {
    pub template_id: TemplateId,
    pub arg: Value,
}

impl ContractInstance {
    pub fn new(template_id: TemplateId, arg: Value) -> Self {
        Self { template_id, arg }
    }
}

/// A contract key together with the parties maintaining it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyWithMaintainers {
    pub key: Value,
    pub maintainers: PartySet,
}

/// Creation of a contract instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNode {
    pub coid: ContractId,
    pub template_id: TemplateId,
    pub instance: ContractInstance,
    pub signatories: PartySet,
    pub stakeholders: PartySet,
    pub key: Option<KeyWithMaintainers>,
    pub location: Option<Location>,
}

/// A read of an existing contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchNode {
    pub coid: ContractId,
    pub template_id: TemplateId,
    pub stakeholders: PartySet,
    pub location: Option<Location>,
}

/// Exercise of a choice on a target contract. Generic over the node-id
/// type of its children so the same shape serves local and committed trees.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseNode<Nid> {
    pub target_coid: ContractId,
    pub template_id: TemplateId,
    pub choice: ChoiceName,
    pub consuming: bool,
    pub acting_parties: PartySet,
    pub signatories: PartySet,
    pub stakeholders: PartySet,
    pub controllers_differ_from_actors: bool,
    pub children: Vec<Nid>,
    pub location: Option<Location>,
}

/// A key lookup; `result` is present iff the lookup was positive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupByKeyNode {
    pub template_id: TemplateId,
    pub key: KeyWithMaintainers,
    pub result: Option<ContractId>,
    pub location: Option<Location>,
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A transaction node, generic over the identifier its exercise children
/// are keyed by: [`NodeId`] before commit, `EventId` after.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node<Nid> {
    Create(CreateNode),
    Fetch(FetchNode),
    Exercise(ExerciseNode<Nid>),
    LookupByKey(LookupByKeyNode),
}

impl<Nid> Node<Nid> {
    pub fn template_id(&self) -> &TemplateId {
        match self {
            Node::Create(n) => &n.template_id,
            Node::Fetch(n) => &n.template_id,
            Node::Exercise(n) => &n.template_id,
            Node::LookupByKey(n) => &n.template_id,
        }
    }

    pub fn location(&self) -> Option<&Location> {
        match self {
            Node::Create(n) => n.location.as_ref(),
            Node::Fetch(n) => n.location.as_ref(),
            Node::Exercise(n) => n.location.as_ref(),
            Node::LookupByKey(n) => n.location.as_ref(),
        }
    }

    /// The parties that must be informed of this node's existence:
    /// stakeholders for creates and fetches, maintainers for key lookups,
    /// and for exercises the acting parties joined with the stakeholders
    /// (consuming) or signatories (non-consuming).
    pub fn informees(&self) -> PartySet {
        match self {
            Node::Create(n) => n.stakeholders.clone(),
            Node::Fetch(n) => n.stakeholders.clone(),
            Node::Exercise(n) => {
                let base = if n.consuming {
                    &n.stakeholders
                } else {
                    &n.signatories
                };
                n.acting_parties.union(base).cloned().collect()
            }
            Node::LookupByKey(n) => n.key.maintainers.clone(),
        }
    }

    /// Rewrite the node-id type, mapping every child reference.
    pub fn map_nid<M>(self, f: impl Fn(Nid) -> M) -> Node<M> {
        match self {
            Node::Create(n) => Node::Create(n),
            Node::Fetch(n) => Node::Fetch(n),
            Node::Exercise(n) => Node::Exercise(ExerciseNode {
                target_coid: n.target_coid,
                template_id: n.template_id,
                choice: n.choice,
                consuming: n.consuming,
                acting_parties: n.acting_parties,
                signatories: n.signatories,
                stakeholders: n.stakeholders,
                controllers_differ_from_actors: n.controllers_differ_from_actors,
                children: n.children.into_iter().map(f).collect(),
                location: n.location,
            }),
            Node::LookupByKey(n) => Node::LookupByKey(n),
        }
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A rooted forest of transaction nodes: ordered roots plus the node map.
///
/// Child ordering is significant; traversal is pre-order over roots then
/// exercise children.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub roots: Vec<NodeId>,
    pub nodes: BTreeMap<NodeId, Node<NodeId>>,
}

impl Transaction {
    pub fn new(roots: Vec<NodeId>, nodes: BTreeMap<NodeId, Node<NodeId>>) -> Self {
        Self { roots, nodes }
    }

    pub fn node(&self, node_id: NodeId) -> Option<&Node<NodeId>> {
        self.nodes.get(&node_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check that the tree is a well-formed forest: every referenced node
    /// exists, no node is reachable twice, and every node is reachable.
    pub fn validate(&self) -> Result<(), TxError> {
        let mut seen: BTreeSet<NodeId> = BTreeSet::new();
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();

        while let Some(node_id) = stack.pop() {
            if !seen.insert(node_id) {
                return Err(TxError::SharedNode(node_id));
            }
            let node = self.node(node_id).ok_or(TxError::MissingNode(node_id))?;
            if let Node::Exercise(exercise) = node {
                stack.extend(exercise.children.iter().rev().copied());
            }
        }

        if let Some(&orphan) = self.nodes.keys().find(|nid| !seen.contains(nid)) {
            return Err(TxError::UnreachableNode(orphan));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scl_types::Party;

    fn parties(names: &[&str]) -> PartySet {
        names.iter().map(|n| Party::new(*n)).collect()
    }

    fn create(coid: &str, signatories: &[&str]) -> Node<NodeId> {
        Node::Create(CreateNode {
            coid: ContractId::new(coid),
            template_id: TemplateId::new("Main:Iou"),
            instance: ContractInstance::new(TemplateId::new("Main:Iou"), Value::Unit),
            signatories: parties(signatories),
            stakeholders: parties(signatories),
            key: None,
            location: None,
        })
    }

    fn exercise(coid: &str, actors: &[&str], consuming: bool, children: &[u64]) -> Node<NodeId> {
        Node::Exercise(ExerciseNode {
            target_coid: ContractId::new(coid),
            template_id: TemplateId::new("Main:Iou"),
            choice: ChoiceName::new("Transfer"),
            consuming,
            acting_parties: parties(actors),
            signatories: parties(actors),
            stakeholders: parties(actors),
            controllers_differ_from_actors: false,
            children: children.iter().map(|&n| NodeId::new(n)).collect(),
            location: None,
        })
    }

    #[test]
    fn informees_of_create_are_stakeholders() {
        let node = create("c1", &["Alice", "Bob"]);
        assert_eq!(node.informees(), parties(&["Alice", "Bob"]));
    }

    #[test]
    fn informees_of_exercise_depend_on_consuming() {
        let mut ex = ExerciseNode {
            target_coid: ContractId::new("c1"),
            template_id: TemplateId::new("Main:Iou"),
            choice: ChoiceName::new("Transfer"),
            consuming: true,
            acting_parties: parties(&["Carol"]),
            signatories: parties(&["Alice"]),
            stakeholders: parties(&["Alice", "Bob"]),
            controllers_differ_from_actors: false,
            children: Vec::<NodeId>::new(),
            location: None,
        };
        assert_eq!(
            Node::Exercise(ex.clone()).informees(),
            parties(&["Alice", "Bob", "Carol"])
        );

        ex.consuming = false;
        assert_eq!(
            Node::Exercise(ex).informees(),
            parties(&["Alice", "Carol"])
        );
    }

    #[test]
    fn map_nid_rewrites_children_only() {
        let node = exercise("c1", &["Alice"], true, &[4, 5]);
        let mapped = node.map_nid(|nid| format!("mapped-{}", nid.index()));
        match mapped {
            Node::Exercise(ex) => {
                assert_eq!(ex.children, vec!["mapped-4".to_string(), "mapped-5".to_string()]);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn validate_accepts_well_formed_forest() {
        let mut nodes = BTreeMap::new();
        nodes.insert(NodeId::new(0), create("c1", &["Alice"]));
        nodes.insert(NodeId::new(1), exercise("c1", &["Alice"], true, &[2]));
        nodes.insert(NodeId::new(2), create("c2", &["Alice"]));
        let tx = Transaction::new(vec![NodeId::new(0), NodeId::new(1)], nodes);
        assert_eq!(tx.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_missing_child() {
        let mut nodes = BTreeMap::new();
        nodes.insert(NodeId::new(0), exercise("c1", &["Alice"], true, &[9]));
        let tx = Transaction::new(vec![NodeId::new(0)], nodes);
        assert_eq!(tx.validate(), Err(TxError::MissingNode(NodeId::new(9))));
    }

    #[test]
    fn validate_rejects_shared_node() {
        let mut nodes = BTreeMap::new();
        nodes.insert(NodeId::new(0), exercise("c1", &["Alice"], true, &[1]));
        nodes.insert(NodeId::new(1), create("c2", &["Alice"]));
        let tx = Transaction::new(vec![NodeId::new(0), NodeId::new(1)], nodes);
        assert_eq!(tx.validate(), Err(TxError::SharedNode(NodeId::new(1))));
    }

    #[test]
    fn validate_rejects_unreachable_node() {
        let mut nodes = BTreeMap::new();
        nodes.insert(NodeId::new(0), create("c1", &["Alice"]));
        nodes.insert(NodeId::new(7), create("c2", &["Alice"]));
        let tx = Transaction::new(vec![NodeId::new(0)], nodes);
        assert_eq!(tx.validate(), Err(TxError::UnreachableNode(NodeId::new(7))));
    }

    #[test]
    fn serde_roundtrip() {
        let mut nodes = BTreeMap::new();
        nodes.insert(NodeId::new(0), create("c1", &["Alice"]));
        let tx = Transaction::new(vec![NodeId::new(0)], nodes);
        let json = serde_json::to_string(&tx).unwrap();
        assert_eq!(tx, serde_json::from_str::<Transaction>(&json).unwrap());
    }
}
