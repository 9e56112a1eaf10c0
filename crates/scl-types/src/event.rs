use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Maximum length of an event id's textual form, in bytes.
pub const MAX_EVENT_ID_LEN: usize = 255;

/// Maximum length of a step id's decimal form (`i32::MAX` has 10 digits).
pub const MAX_STEP_TEXT_LEN: usize = 11;

/// Scenario step counter: non-negative, starts at 0, advances by one per
/// step. Bounded by `i32::MAX`, so its decimal form never exceeds
/// [`MAX_STEP_TEXT_LEN`] characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StepId(i32);

impl StepId {
    /// The first step of every scenario.
    pub const ZERO: StepId = StepId(0);

    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    pub const fn index(&self) -> i32 {
        self.0
    }

    /// The step id that follows this one.
    pub fn next(&self) -> StepId {
        StepId(self.0 + 1)
    }

    /// The unpadded decimal form used inside event ids.
    pub fn text(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Debug for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StepId({})", self.0)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Node identifier local to a single transaction tree.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn index(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Global event identifier: a step id plus a node id local to that step's
/// transaction.
///
/// The canonical textual form is `#<step>:<node>`, ASCII, at most
/// [`MAX_EVENT_ID_LEN`] bytes. [`EventId::from_str`] is the exact inverse of
/// [`fmt::Display`]: every accepted string re-formats to itself, and
/// anything else fails with [`TypeError::ParseEventId`]. Serde uses the
/// textual form, so event ids can key JSON maps.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId {
    step_text: String,
    node_id: NodeId,
}

impl EventId {
    pub fn new(step_id: StepId, node_id: NodeId) -> Self {
        Self {
            step_text: step_id.text(),
            node_id,
        }
    }

    /// The decimal text of the owning step id.
    pub fn step_text(&self) -> &str {
        &self.step_text
    }

    /// The node id local to the owning transaction.
    pub const fn node_id(&self) -> NodeId {
        self.node_id
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.step_text, self.node_id)
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({self})")
    }
}

impl FromStr for EventId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = || TypeError::ParseEventId(s.to_string());

        if s.len() > MAX_EVENT_ID_LEN {
            return Err(fail());
        }
        let rest = s.strip_prefix('#').ok_or_else(fail)?;
        let (step, node) = rest.split_once(':').ok_or_else(fail)?;
        if step.len() > MAX_STEP_TEXT_LEN || !is_canonical_decimal(step) {
            return Err(fail());
        }
        if !is_canonical_decimal(node) {
            return Err(fail());
        }
        let node_id = node.parse::<u64>().map_err(|_| fail())?;

        Ok(EventId {
            step_text: step.to_string(),
            node_id: NodeId::new(node_id),
        })
    }
}

impl Serialize for EventId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// An unpadded non-negative decimal: non-empty, digits only, no leading
/// zeros except for `"0"` itself. Anything looser would break the
/// parse/format round trip.
fn is_canonical_decimal(s: &str) -> bool {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    s == "0" || !s.starts_with('0')
}
