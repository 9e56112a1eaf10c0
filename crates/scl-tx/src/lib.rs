//! Transaction model and enrichment for the Scenario Contract Ledger.
//!
//! This crate defines the four-variant transaction node sum, the
//! authorization checker, and the enricher: a single pre-order traversal
//! that computes per-node disclosure, contract divulgence, and
//! authorization failures for a whole transaction tree.
//!
//! # Key Types
//!
//! - [`Transaction`] / [`Node`] — A rooted forest of create / fetch /
//!   exercise / lookup-by-key nodes
//! - [`TransactionBuilder`] — Chainable construction of transaction trees
//! - [`AuthorizationMode`] — `DontAuthorize` or `Authorize` with a party set
//! - [`FailedAuthorization`] — Per-node-kind failure taxonomy with the
//!   literal diagnostic party sets
//! - [`enrich_transaction`] — Disclosure, divulgence, and authorization in
//!   one traversal

pub mod auth;
pub mod builder;
pub mod enrich;
pub mod error;
pub mod node;

pub use auth::{AuthorizationMode, FailedAuthorization, FailedAuthorizations};
pub use builder::TransactionBuilder;
pub use enrich::{enrich_transaction, EnrichedTransaction};
pub use error::TxError;
pub use node::{
    ContractInstance, CreateNode, ExerciseNode, FetchNode, KeyWithMaintainers, LookupByKeyNode,
    Node, Transaction,
};
