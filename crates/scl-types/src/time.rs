use std::fmt;

use serde::{Deserialize, Serialize};

/// Ledger-effective time: microseconds since the UNIX epoch.
///
/// The ledger neither clamps nor orders by effective time; it is advisory
/// data supplied by the scenario driver. `pass_time` deltas may be negative.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    micros: i64,
}

impl Timestamp {
    /// The UNIX epoch itself.
    pub const EPOCH: Timestamp = Timestamp { micros: 0 };

    pub const fn from_micros(micros: i64) -> Self {
        Self { micros }
    }

    pub const fn micros(&self) -> i64 {
        self.micros
    }

    /// Shift this time by a signed microsecond delta, saturating at the
    /// representable range.
    pub fn add_micros(&self, delta: i64) -> Self {
        Self {
            micros: self.micros.saturating_add(delta),
        }
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}us)", self.micros)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}us", self.micros)
    }
}
