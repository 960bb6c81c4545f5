//! Account: cash, frozen collateral and open positions of one simulation run.

use super::position::Position;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregate ledger state.
///
/// The accounting identity holds after every fill:
/// `total_assets == available_balance + frozen_balance + Σ position.market_value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub initial_capital: Decimal,
    pub available_balance: Decimal,
    pub frozen_balance: Decimal,
    pub currency: String,
    pub positions: Vec<Position>,
}

impl Account {
    pub fn new(id: impl Into<String>, initial_capital: Decimal, currency: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            initial_capital,
            available_balance: initial_capital,
            frozen_balance: Decimal::ZERO,
            currency: currency.into(),
            positions: Vec::new(),
        }
    }

    pub fn total_assets(&self) -> Decimal {
        let position_value: Decimal = self.positions.iter().map(Position::market_value).sum();
        self.available_balance + self.frozen_balance + position_value
    }

    /// Whether a symbol has a non-flat position.
    pub fn has_position(&self, symbol: &str) -> bool {
        self.position(symbol).is_some()
    }

    /// The non-flat position for a symbol, if any.
    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions
            .iter()
            .find(|p| p.symbol == symbol && !p.is_flat())
    }

    pub fn position_mut(&mut self, symbol: &str) -> Option<&mut Position> {
        self.positions
            .iter_mut()
            .find(|p| p.symbol == symbol && !p.is_flat())
    }

    /// Remove and return the position for a symbol.
    pub(crate) fn take_position(&mut self, symbol: &str) -> Option<Position> {
        let idx = self
            .positions
            .iter()
            .position(|p| p.symbol == symbol && !p.is_flat())?;
        Some(self.positions.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PositionSide;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn fresh_account_holds_only_cash() {
        let account = Account::new("acct", dec!(100000), "USD");
        assert_eq!(account.total_assets(), dec!(100000));
        assert_eq!(account.frozen_balance, Decimal::ZERO);
        assert!(!account.has_position("SPY"));
    }

    #[test]
    fn total_assets_includes_positions() {
        let mut account = Account::new("acct", dec!(1000), "USD");
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        account.available_balance = dec!(500);
        account
            .positions
            .push(Position::open("SPY", PositionSide::Long, dec!(5), dec!(100), ts));
        assert_eq!(account.total_assets(), dec!(1000));

        account.position_mut("SPY").unwrap().mark(dec!(110));
        assert_eq!(account.total_assets(), dec!(1050));

        let taken = account.take_position("SPY").unwrap();
        assert_eq!(taken.quantity, dec!(5));
        assert!(account.positions.is_empty());
    }
}
