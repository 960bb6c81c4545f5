//! Ledger: applies fills to the account and keeps the trade log.
//!
//! Two mutating operations, both total: `open` and `close`. Neither can leave
//! the account inconsistent; impossible requests (a second open, a close while
//! flat, a quantity that rounds to zero) come back as outcome variants instead
//! of errors.
//!
//! Long fills move cash only. Short opens also freeze the entry notional as
//! collateral; the matching close releases it together with the realized P&L.

use crate::decimal::DecimalExt;
use crate::domain::{
    Account, Bar, OpenTrade, Position, PositionSide, TradeId, TradeIdGen, TradeRecord,
    TradingSignal,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Cost and sizing parameters of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Fraction of notional charged on every fill.
    pub commission_rate: Decimal,
    /// Fraction of available balance committed per open.
    pub position_size_ratio: Decimal,
    /// Absolute price offset applied against every fill.
    pub slippage: Decimal,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            commission_rate: Decimal::new(1, 3),
            position_size_ratio: Decimal::ONE,
            slippage: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened {
        trade_id: TradeId,
        quantity: Decimal,
        price: Decimal,
        commission: Decimal,
    },
    /// Sized quantity was zero; nothing changed.
    InsufficientFunds {
        available: Decimal,
        price: Decimal,
    },
    /// A position is already open for the symbol; nothing changed.
    AlreadyOpen,
    /// `PositionSide::Flat` cannot be opened.
    InvalidSide,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed(TradeRecord),
    /// No open position; nothing changed.
    NoPosition,
}

#[derive(Debug, Clone)]
pub struct Ledger {
    account: Account,
    config: LedgerConfig,
    open_trade: Option<OpenTrade>,
    trades: Vec<TradeRecord>,
    ids: TradeIdGen,
}

impl Ledger {
    pub fn new(account: Account, config: LedgerConfig) -> Self {
        Self {
            account,
            config,
            open_trade: None,
            trades: Vec::new(),
            ids: TradeIdGen::new(),
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.account.position(symbol)
    }

    pub fn open_trade(&self) -> Option<&OpenTrade> {
        self.open_trade.as_ref()
    }

    /// Closed trades, in close order.
    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn total_assets(&self) -> Decimal {
        self.account.total_assets()
    }

    /// Update the mark price of the symbol's open position, if any.
    pub fn mark_to_market(&mut self, symbol: &str, price: Decimal) {
        if let Some(position) = self.account.position_mut(symbol) {
            position.mark(price);
        }
    }

    /// Fill price after slippage: buyers pay up, sellers receive less.
    pub fn fill_price(&self, reference: Decimal, buying: bool) -> Decimal {
        if buying {
            reference + self.config.slippage
        } else {
            (reference - self.config.slippage).max(Decimal::ZERO)
        }
    }

    /// Open a position at the bar's close.
    ///
    /// Quantity is `floor(available × position_size_ratio / price)`. Commission
    /// comes on top, so a full-ratio open can leave the balance slightly negative.
    pub fn open(&mut self, signal: &TradingSignal, bar: &Bar, side: PositionSide) -> OpenOutcome {
        if side == PositionSide::Flat {
            return OpenOutcome::InvalidSide;
        }
        if self.open_trade.is_some() || self.account.has_position(&bar.symbol) {
            return OpenOutcome::AlreadyOpen;
        }

        let price = self.fill_price(bar.close, side == PositionSide::Long);
        let available = self.account.available_balance;
        let quantity = self.size_quantity(available, price);
        if quantity <= Decimal::ZERO {
            warn!(
                symbol = %bar.symbol,
                timestamp = %bar.timestamp,
                %available,
                %price,
                "insufficient funds, open skipped"
            );
            return OpenOutcome::InsufficientFunds { available, price };
        }

        let cost = price * quantity;
        let commission = cost * self.config.commission_rate;
        self.account.available_balance -= cost + commission;
        if side == PositionSide::Short {
            self.account.frozen_balance += cost;
        }

        let trade_id = self.ids.next_id();
        self.account.positions.push(Position::open(
            bar.symbol.clone(),
            side,
            quantity,
            price,
            bar.timestamp,
        ));
        self.open_trade = Some(OpenTrade {
            id: trade_id,
            symbol: bar.symbol.clone(),
            side,
            entry_time: bar.timestamp,
            entry_price: price,
            quantity,
            commission,
            entry_reason: signal.reason.clone(),
        });

        info!(
            trade = %trade_id,
            %side,
            %quantity,
            %price,
            %commission,
            timestamp = %bar.timestamp,
            "position opened"
        );
        OpenOutcome::Opened {
            trade_id,
            quantity,
            price,
            commission,
        }
    }

    /// Close the open position at the bar's close and finalize its trade.
    pub fn close(&mut self, bar: &Bar, reason: &str) -> CloseOutcome {
        let Some(open) = self.open_trade.take() else {
            return CloseOutcome::NoPosition;
        };
        let Some(position) = self.account.take_position(&open.symbol) else {
            self.open_trade = Some(open);
            return CloseOutcome::NoPosition;
        };

        let quantity = position.quantity;
        let exit_price = self.fill_price(bar.close, position.side == PositionSide::Short);
        let proceeds = exit_price * quantity;
        let commission = proceeds * self.config.commission_rate;

        match position.side {
            PositionSide::Short => {
                let collateral = position.cost_basis();
                let realized = (position.avg_entry_price - exit_price) * quantity;
                self.account.frozen_balance -= collateral;
                self.account.available_balance += collateral + realized - commission;
            }
            _ => {
                self.account.available_balance += proceeds - commission;
            }
        }

        let record = open.finalize(bar.timestamp, exit_price, commission, reason);
        info!(
            trade = %record.id,
            side = %record.side,
            exit_price = %record.exit_price,
            profit_loss = %record.profit_loss,
            reason,
            "position closed"
        );
        self.trades.push(record.clone());
        CloseOutcome::Closed(record)
    }

    /// Consume the ledger, returning the final account and trade log.
    pub fn into_parts(self) -> (Account, Vec<TradeRecord>) {
        (self.account, self.trades)
    }

    fn size_quantity(&self, available: Decimal, price: Decimal) -> Decimal {
        if price <= Decimal::ZERO || available <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let budget = available * self.config.position_size_ratio;
        budget.checked_div(price).unwrap_or(Decimal::ZERO).floor_units()
    }
}
