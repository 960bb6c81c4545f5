//! Trade records: an open trade while the position lives, a finalized
//! `TradeRecord` once it closes.

use super::ids::TradeId;
use super::position::PositionSide;
use crate::decimal::{DecimalExt, PRICE_SCALE};
use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Entry half of a round trip, held by the ledger until the position closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenTrade {
    pub id: TradeId,
    pub symbol: String,
    pub side: PositionSide,
    pub entry_time: NaiveDateTime,
    pub entry_price: Decimal,
    pub quantity: Decimal,
    /// Entry commission so far; the exit commission is added on close.
    pub commission: Decimal,
    pub entry_reason: String,
}

/// A completed round trip: entry → exit, with realized P&L.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Identification ──
    pub id: TradeId,
    pub symbol: String,
    pub side: PositionSide,

    // ── Entry ──
    pub entry_time: NaiveDateTime,
    pub entry_price: Decimal,
    pub entry_reason: String,

    // ── Exit ──
    pub exit_time: NaiveDateTime,
    pub exit_price: Decimal,
    pub exit_reason: String,

    // ── Size and costs ──
    pub quantity: Decimal,
    /// Entry + exit commission.
    pub commission: Decimal,

    // ── Outcome ──
    pub profit_loss: Decimal,
    /// `profit_loss / entry_cost × 100`.
    pub profit_loss_percent: Decimal,
    pub holding_duration_secs: i64,
}

impl OpenTrade {
    /// Entry notional: `entry_price × quantity`.
    pub fn entry_cost(&self) -> Decimal {
        self.entry_price * self.quantity
    }

    /// Close the round trip at `exit_price`, adding the exit commission.
    pub fn finalize(
        self,
        exit_time: NaiveDateTime,
        exit_price: Decimal,
        exit_commission: Decimal,
        exit_reason: impl Into<String>,
    ) -> TradeRecord {
        let commission = self.commission + exit_commission;
        let price_diff = match self.side {
            PositionSide::Short => self.entry_price - exit_price,
            _ => exit_price - self.entry_price,
        };
        let profit_loss = price_diff * self.quantity - commission;
        let profit_loss_percent = profit_loss
            .div_half_up(self.entry_cost(), PRICE_SCALE)
            .map(|ratio| ratio * Decimal::ONE_HUNDRED)
            .unwrap_or(Decimal::ZERO);
        let holding_duration_secs = (exit_time - self.entry_time).num_seconds();

        TradeRecord {
            id: self.id,
            symbol: self.symbol,
            side: self.side,
            entry_time: self.entry_time,
            entry_price: self.entry_price,
            entry_reason: self.entry_reason,
            exit_time,
            exit_price,
            exit_reason: exit_reason.into(),
            quantity: self.quantity,
            commission,
            profit_loss,
            profit_loss_percent,
            holding_duration_secs,
        }
    }
}

impl TradeRecord {
    pub fn holding_duration(&self) -> Duration {
        Duration::seconds(self.holding_duration_secs)
    }

    /// P&L before commission.
    pub fn gross_pnl(&self) -> Decimal {
        self.profit_loss + self.commission
    }

    pub fn is_winner(&self) -> bool {
        self.profit_loss > Decimal::ZERO
    }

    pub fn is_loser(&self) -> bool {
        self.profit_loss < Decimal::ZERO
    }
}
