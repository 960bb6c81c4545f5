use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequential trade id, unique within one run.
///
/// Ids come from a per-run counter, so the same replay always assigns the same
/// ids to the same trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TradeId(pub u64);

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{:06}", self.0)
    }
}

/// Monotonic trade id generator.
#[derive(Debug, Clone, Default)]
pub struct TradeIdGen {
    next: u64,
}

impl TradeIdGen {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> TradeId {
        let id = TradeId(self.next.max(1));
        self.next = id.0 + 1;
        id
    }
}
