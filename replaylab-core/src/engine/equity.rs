//! Equity curve: one start-of-bar snapshot of total assets per processed bar.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub total_assets: Decimal,
}

/// Append-only sequence of equity snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EquityCurve {
    points: Vec<EquityPoint>,
}

impl EquityCurve {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, timestamp: NaiveDateTime, total_assets: Decimal) {
        self.points.push(EquityPoint {
            timestamp,
            total_assets,
        });
    }

    pub fn points(&self) -> &[EquityPoint] {
        &self.points
    }

    /// Total-asset values only, in order.
    pub fn values(&self) -> Vec<Decimal> {
        self.points.iter().map(|p| p.total_assets).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&EquityPoint> {
        self.points.last()
    }
}
