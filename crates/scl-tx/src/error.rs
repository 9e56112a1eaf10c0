use scl_types::NodeId;
use thiserror::Error;

/// Structural defects in a transaction tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxError {
    #[error("node {0} is referenced but missing from the transaction")]
    MissingNode(NodeId),

    #[error("node {0} is reachable through more than one path")]
    SharedNode(NodeId),

    #[error("node {0} is not reachable from any root")]
    UnreachableNode(NodeId),
}
