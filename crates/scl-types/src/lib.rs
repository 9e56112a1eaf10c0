//! Foundation types for the Scenario Contract Ledger (SCL).
//!
//! This crate provides the identity, temporal, and value types used
//! throughout the SCL system. Every other SCL crate depends on `scl-types`.
//!
//! # Key Types
//!
//! - [`Party`] — Opaque party identifier; [`PartySet`] for authority sets
//! - [`ContractId`] / [`TemplateId`] / [`ChoiceName`] — Caller-supplied identifiers
//! - [`StepId`] / [`NodeId`] / [`EventId`] — Scenario step counter, local node
//!   id, and the global `#step:node` event id with its textual wire format
//! - [`Timestamp`] — Ledger-effective time in microseconds since epoch
//! - [`Value`] — Contract argument values, with total contract-id collection

pub mod error;
pub mod event;
pub mod ids;
pub mod party;
pub mod time;
pub mod value;

pub use error::TypeError;
pub use event::{EventId, NodeId, StepId};
pub use ids::{ChoiceName, ContractId, Location, TemplateId};
pub use party::{Party, PartyRelation, PartySet};
pub use time::Timestamp;
pub use value::{GlobalKey, Value};
