use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque party identifier.
///
/// Parties are supplied by the scenario producer and never interpreted by
/// the ledger; two parties are the same iff their textual forms are equal.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Party(String);

impl Party {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Party({})", self.0)
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Party {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// An ordered set of parties (signatories, stakeholders, authorizers, ...).
pub type PartySet = BTreeSet<Party>;

/// A relation from some key to the parties entitled to it.
///
/// Used for disclosure (node → parties) and divulgence (contract → parties).
pub type PartyRelation<K> = BTreeMap<K, PartySet>;

/// Union `parties` into the relation entry for `key`.
///
/// Existing entries grow; they are never overwritten or shrunk.
pub fn relation_union<K: Ord>(relation: &mut PartyRelation<K>, key: K, parties: &PartySet) {
    relation.entry(key).or_default().extend(parties.iter().cloned());
}
