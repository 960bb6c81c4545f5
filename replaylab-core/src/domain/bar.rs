//! Bar: the fundamental market data unit.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for a single symbol over one interval.
///
/// Bars are immutable once produced by a data source. Use [`Bar::new`] to get a
/// bar whose OHLC relationship has been checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// Reasons a bar fails validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BarError {
    #[error("{symbol} @ {timestamp}: high {high} is below max(open, close)")]
    HighBelowBody {
        symbol: String,
        timestamp: NaiveDateTime,
        high: Decimal,
    },

    #[error("{symbol} @ {timestamp}: low {low} is above min(open, close)")]
    LowAboveBody {
        symbol: String,
        timestamp: NaiveDateTime,
        low: Decimal,
    },

    #[error("{symbol} @ {timestamp}: negative price")]
    NegativePrice {
        symbol: String,
        timestamp: NaiveDateTime,
    },

    #[error("{symbol} @ {timestamp}: negative volume {volume}")]
    NegativeVolume {
        symbol: String,
        timestamp: NaiveDateTime,
        volume: Decimal,
    },
}

impl Bar {
    /// Build a bar, rejecting OHLC combinations that cannot occur.
    pub fn new(
        symbol: impl Into<String>,
        timestamp: NaiveDateTime,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Result<Self, BarError> {
        let bar = Self {
            symbol: symbol.into(),
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        };
        bar.validate()?;
        Ok(bar)
    }

    /// Check `high >= max(open, close)`, `low <= min(open, close)`, non-negative fields.
    pub fn validate(&self) -> Result<(), BarError> {
        if [self.open, self.high, self.low, self.close]
            .iter()
            .any(|p| p.is_sign_negative() && !p.is_zero())
        {
            return Err(BarError::NegativePrice {
                symbol: self.symbol.clone(),
                timestamp: self.timestamp,
            });
        }
        if self.volume.is_sign_negative() && !self.volume.is_zero() {
            return Err(BarError::NegativeVolume {
                symbol: self.symbol.clone(),
                timestamp: self.timestamp,
                volume: self.volume,
            });
        }
        if self.high < self.open.max(self.close) {
            return Err(BarError::HighBelowBody {
                symbol: self.symbol.clone(),
                timestamp: self.timestamp,
                high: self.high,
            });
        }
        if self.low > self.open.min(self.close) {
            return Err(BarError::LowAboveBody {
                symbol: self.symbol.clone(),
                timestamp: self.timestamp,
                low: self.low,
            });
        }
        Ok(())
    }

    pub fn is_sane(&self) -> bool {
        self.validate().is_ok()
    }

    /// True range against the previous close: `max(h-l, |h-pc|, |l-pc|)`.
    pub fn true_range(&self, prev_close: Decimal) -> Decimal {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn valid_bar_builds() {
        let bar = Bar::new("SPY", ts(), dec!(100), dec!(105), dec!(98), dec!(103), dec!(5000));
        assert!(bar.is_ok());
        assert!(bar.unwrap().is_sane());
    }

    #[test]
    fn high_below_close_rejected() {
        let err = Bar::new("SPY", ts(), dec!(100), dec!(102), dec!(98), dec!(103), dec!(1))
            .unwrap_err();
        assert!(matches!(err, BarError::HighBelowBody { .. }));
    }

    #[test]
    fn low_above_open_rejected() {
        let err = Bar::new("SPY", ts(), dec!(100), dec!(105), dec!(101), dec!(103), dec!(1))
            .unwrap_err();
        assert!(matches!(err, BarError::LowAboveBody { .. }));
    }

    #[test]
    fn negative_values_rejected() {
        let err = Bar::new("SPY", ts(), dec!(-1), dec!(1), dec!(-2), dec!(0), dec!(1)).unwrap_err();
        assert!(matches!(err, BarError::NegativePrice { .. }));
        let err = Bar::new("SPY", ts(), dec!(1), dec!(1), dec!(1), dec!(1), dec!(-5)).unwrap_err();
        assert!(matches!(err, BarError::NegativeVolume { .. }));
    }

    #[test]
    fn true_range_uses_gap() {
        let bar = Bar::new("SPY", ts(), dec!(110), dec!(112), dec!(109), dec!(111), dec!(1)).unwrap();
        // gap up from 100: |112 - 100| dominates h-l = 3
        assert_eq!(bar.true_range(dec!(100)), dec!(12));
        // no gap: h-l dominates
        assert_eq!(bar.true_range(dec!(110)), dec!(3));
    }
}
