//! Position: the single open holding of the simulated account.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
    Flat,
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSide::Long => write!(f, "LONG"),
            PositionSide::Short => write!(f, "SHORT"),
            PositionSide::Flat => write!(f, "FLAT"),
        }
    }
}

/// An open holding, marked to market once per bar.
///
/// Long positions are worth `current_price × quantity`. Short positions hold
/// their entry notional as frozen collateral on the account, so their market
/// value is the unrealized P&L `(entry − current) × quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: PositionSide,
    pub quantity: Decimal,
    pub avg_entry_price: Decimal,
    pub current_price: Decimal,
    pub open_time: NaiveDateTime,
}

impl Position {
    pub fn open(
        symbol: impl Into<String>,
        side: PositionSide,
        quantity: Decimal,
        price: Decimal,
        open_time: NaiveDateTime,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
            avg_entry_price: price,
            current_price: price,
            open_time,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.side == PositionSide::Flat || self.quantity.is_zero()
    }

    pub fn is_long(&self) -> bool {
        !self.is_flat() && self.side == PositionSide::Long
    }

    pub fn is_short(&self) -> bool {
        !self.is_flat() && self.side == PositionSide::Short
    }

    /// Update the mark price.
    pub fn mark(&mut self, price: Decimal) {
        self.current_price = price;
    }

    /// Entry notional: `avg_entry_price × quantity`.
    pub fn cost_basis(&self) -> Decimal {
        self.avg_entry_price * self.quantity
    }

    pub fn unrealized_pnl(&self) -> Decimal {
        match self.side {
            _ if self.is_flat() => Decimal::ZERO,
            PositionSide::Long => (self.current_price - self.avg_entry_price) * self.quantity,
            PositionSide::Short => (self.avg_entry_price - self.current_price) * self.quantity,
            PositionSide::Flat => Decimal::ZERO,
        }
    }

    /// Contribution of this position to `Account::total_assets`.
    pub fn market_value(&self) -> Decimal {
        match self.side {
            _ if self.is_flat() => Decimal::ZERO,
            PositionSide::Long => self.current_price * self.quantity,
            PositionSide::Short => self.unrealized_pnl(),
            PositionSide::Flat => Decimal::ZERO,
        }
    }
}
