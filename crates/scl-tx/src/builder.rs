use std::collections::BTreeMap;

use scl_types::NodeId;

use crate::node::{CreateNode, ExerciseNode, FetchNode, LookupByKeyNode, Node, Transaction};

/// Chainable construction of transaction trees.
///
/// Node ids are allocated sequentially from 0. Nodes attach to the
/// innermost open exercise, or become roots when none is open:
///
/// ```
/// use scl_tx::TransactionBuilder;
/// # use scl_tx::{ContractInstance, CreateNode};
/// # use scl_types::{ContractId, PartySet, TemplateId, Value};
/// # fn create(coid: &str) -> CreateNode {
/// #     CreateNode {
/// #         coid: ContractId::new(coid),
/// #         template_id: TemplateId::new("T"),
/// #         instance: ContractInstance::new(TemplateId::new("T"), Value::Unit),
/// #         signatories: PartySet::new(),
/// #         stakeholders: PartySet::new(),
/// #         key: None,
/// #         location: None,
/// #     }
/// # }
/// let mut b = TransactionBuilder::new();
/// b.create(create("c1"));
/// let tx = b.build();
/// assert_eq!(tx.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct TransactionBuilder {
    roots: Vec<NodeId>,
    nodes: BTreeMap<NodeId, Node<NodeId>>,
    open_exercises: Vec<NodeId>,
    next: u64,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, node: CreateNode) -> NodeId {
        self.insert(Node::Create(node))
    }

    pub fn fetch(&mut self, node: FetchNode) -> NodeId {
        self.insert(Node::Fetch(node))
    }

    pub fn lookup_by_key(&mut self, node: LookupByKeyNode) -> NodeId {
        self.insert(Node::LookupByKey(node))
    }

    /// Add an exercise and open its child scope: subsequent nodes attach
    /// to it until the matching [`Self::end_exercise`]. Any children
    /// already listed on the node are kept and extended.
    pub fn begin_exercise(&mut self, node: ExerciseNode<NodeId>) -> NodeId {
        let node_id = self.insert(Node::Exercise(node));
        self.open_exercises.push(node_id);
        node_id
    }

    /// Close the innermost open exercise.
    ///
    /// # Panics
    ///
    /// Panics if no exercise is open.
    pub fn end_exercise(&mut self) {
        if self.open_exercises.pop().is_none() {
            panic!("end_exercise without a matching begin_exercise");
        }
    }

    /// Finish the tree.
    ///
    /// # Panics
    ///
    /// Panics if an exercise is still open.
    pub fn build(self) -> Transaction {
        if let Some(open) = self.open_exercises.last() {
            panic!("transaction builder finished with exercise {open} still open");
        }
        Transaction::new(self.roots, self.nodes)
    }

    fn insert(&mut self, node: Node<NodeId>) -> NodeId {
        let node_id = NodeId::new(self.next);
        self.next += 1;
        self.nodes.insert(node_id, node);
        match self.open_exercises.last() {
            None => self.roots.push(node_id),
            Some(&parent) => match self.nodes.get_mut(&parent) {
                Some(Node::Exercise(exercise)) => exercise.children.push(node_id),
                _ => unreachable!("open scope always refers to an exercise"),
            },
        }
        node_id
    }
}
