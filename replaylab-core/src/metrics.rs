//! Performance metrics: pure functions over the trade log and equity curve.
//!
//! Percentages are computed as a ratio rounded to 4 places, then × 100.
//! Anything that has no meaningful value (win rate with zero trades, profit
//! factor with no losses) is `None` rather than a sentinel number.

use crate::decimal::{from_count, DecimalExt, PRICE_SCALE, RATIO_SCALE, REPORT_SCALE};
use crate::domain::TradeRecord;
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: u32 = 252;

/// Aggregate statistics for one backtest run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub initial_capital: Decimal,
    pub final_capital: Decimal,
    pub total_pnl: Decimal,
    /// Percent.
    pub total_return: Decimal,
    /// Percent; `None` when the elapsed period is empty or the account was wiped out.
    pub annualized_return: Option<Decimal>,
    /// Percent in `[0, 100]`.
    pub max_drawdown: Decimal,
    pub sharpe_ratio: Option<Decimal>,
    pub elapsed_days: i64,

    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: Option<Decimal>,
    pub avg_profit: Option<Decimal>,
    pub avg_loss: Option<Decimal>,
    pub profit_factor: Option<Decimal>,
    pub largest_win: Option<Decimal>,
    pub largest_loss: Option<Decimal>,
    pub total_commission: Decimal,
    pub avg_holding_secs: Option<i64>,
}

impl PerformanceMetrics {
    /// Compute every metric from the run's raw outputs.
    pub fn compute(
        initial_capital: Decimal,
        final_capital: Decimal,
        trades: &[TradeRecord],
        equity: &[Decimal],
        elapsed_days: i64,
    ) -> Self {
        let total_return = total_return(initial_capital, final_capital);
        let winners: Vec<Decimal> = trades
            .iter()
            .filter(|t| t.is_winner())
            .map(|t| t.profit_loss)
            .collect();
        let losers: Vec<Decimal> = trades
            .iter()
            .filter(|t| t.is_loser())
            .map(|t| t.profit_loss)
            .collect();
        let gross_profit: Decimal = winners.iter().copied().sum();
        let gross_loss: Decimal = losers.iter().map(|l| l.abs()).sum();

        Self {
            initial_capital,
            final_capital,
            total_pnl: final_capital - initial_capital,
            total_return,
            annualized_return: annualized_return(total_return, elapsed_days),
            max_drawdown: max_drawdown(equity),
            sharpe_ratio: sharpe_ratio(equity),
            elapsed_days,
            total_trades: trades.len(),
            winning_trades: winners.len(),
            losing_trades: losers.len(),
            win_rate: win_rate(winners.len(), trades.len()),
            avg_profit: gross_profit.div_half_up(from_count(winners.len()), REPORT_SCALE),
            avg_loss: gross_loss.div_half_up(from_count(losers.len()), REPORT_SCALE),
            profit_factor: gross_profit.div_half_up(gross_loss, REPORT_SCALE),
            largest_win: winners.iter().copied().max(),
            largest_loss: losers.iter().copied().min(),
            total_commission: trades.iter().map(|t| t.commission).sum(),
            avg_holding_secs: avg_holding_secs(trades),
        }
    }
}

/// `(final − initial) / initial × 100`; 0 when `initial` is 0.
pub fn total_return(initial: Decimal, final_capital: Decimal) -> Decimal {
    (final_capital - initial)
        .div_half_up(initial, PRICE_SCALE)
        .map_or(Decimal::ZERO, |ratio| ratio * Decimal::ONE_HUNDRED)
}

/// `((1 + total_return/100)^(252/days) − 1) × 100` at 2 places.
///
/// `None` when `days <= 0`, when the growth factor is not positive, or when
/// the compounded value overflows `Decimal`.
pub fn annualized_return(total_return: Decimal, elapsed_days: i64) -> Option<Decimal> {
    if elapsed_days <= 0 {
        return None;
    }
    let growth = Decimal::ONE + total_return / Decimal::ONE_HUNDRED;
    if growth <= Decimal::ZERO {
        return None;
    }
    let exponent =
        Decimal::from(TRADING_DAYS_PER_YEAR).div_half_up(Decimal::from(elapsed_days), RATIO_SCALE)?;
    let compounded = growth.checked_powd(exponent)?;
    let percent = (compounded - Decimal::ONE).checked_mul(Decimal::ONE_HUNDRED)?;
    Some(percent.round_half_up(REPORT_SCALE))
}

/// Largest peak-to-trough decline, in percent. Equity below zero counts as a
/// full 100% loss.
pub fn max_drawdown(equity: &[Decimal]) -> Decimal {
    let mut peak: Option<Decimal> = None;
    let mut worst = Decimal::ZERO;
    for &value in equity {
        let high = match peak {
            Some(p) if p >= value => p,
            _ => {
                peak = Some(value);
                value
            }
        };
        if high <= Decimal::ZERO {
            continue;
        }
        if let Some(dd) = (high - value).div_half_up(high, PRICE_SCALE) {
            worst = worst.max(dd.min(Decimal::ONE));
        }
    }
    worst * Decimal::ONE_HUNDRED
}

/// `wins / total × 100`; `None` with no trades.
pub fn win_rate(wins: usize, total: usize) -> Option<Decimal> {
    from_count(wins)
        .div_half_up(from_count(total), PRICE_SCALE)
        .map(|ratio| ratio * Decimal::ONE_HUNDRED)
}

/// Per-bar Sharpe ratio annualized by √252, zero risk-free rate.
///
/// `None` with fewer than two returns, a non-positive equity value, or zero
/// deviation.
pub fn sharpe_ratio(equity: &[Decimal]) -> Option<Decimal> {
    let returns = bar_returns(equity)?;
    if returns.len() < 2 {
        return None;
    }
    let n = from_count(returns.len());
    let mean = returns.iter().copied().sum::<Decimal>().div_half_up(n, RATIO_SCALE)?;
    let squares: Decimal = returns
        .iter()
        .map(|r| {
            let d = *r - mean;
            d * d
        })
        .sum();
    let variance = squares.div_half_up(n - Decimal::ONE, RATIO_SCALE)?;
    let std_dev = variance.sqrt_half_up(RATIO_SCALE)?;
    let annualizer = Decimal::from(TRADING_DAYS_PER_YEAR).sqrt_half_up(RATIO_SCALE)?;
    mean.div_half_up(std_dev, RATIO_SCALE)
        .map(|ratio| (ratio * annualizer).round_half_up(REPORT_SCALE))
}

fn bar_returns(equity: &[Decimal]) -> Option<Vec<Decimal>> {
    equity
        .windows(2)
        .map(|w| {
            if w[0] <= Decimal::ZERO {
                return None;
            }
            (w[1] - w[0]).div_half_up(w[0], RATIO_SCALE)
        })
        .collect()
}

fn avg_holding_secs(trades: &[TradeRecord]) -> Option<i64> {
    if trades.is_empty() {
        return None;
    }
    let total: i64 = trades.iter().map(|t| t.holding_duration_secs).sum();
    Some(total / trades.len() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PositionSide, TradeId};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn trade(pnl: Decimal, commission: Decimal, hold_days: i64) -> TradeRecord {
        let entry = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        TradeRecord {
            id: TradeId(1),
            symbol: "TEST".into(),
            side: PositionSide::Long,
            entry_time: entry,
            entry_price: dec!(100),
            entry_reason: String::new(),
            exit_time: entry + chrono::Duration::days(hold_days),
            exit_price: dec!(100),
            exit_reason: String::new(),
            quantity: dec!(10),
            commission,
            profit_loss: pnl,
            profit_loss_percent: Decimal::ZERO,
            holding_duration_secs: hold_days * 86_400,
        }
    }

    #[test]
    fn total_return_rounds_ratio_first() {
        assert_eq!(total_return(dec!(100000), dec!(96089.8)), dec!(-3.91));
        assert_eq!(total_return(dec!(100), dec!(110)), dec!(10));
        assert_eq!(total_return(Decimal::ZERO, dec!(5)), Decimal::ZERO);
    }

    #[test]
    fn drawdown_of_worked_curve() {
        let curve = [dec!(100000), dec!(98974.038), dec!(102698.038), dec!(96181.038)];
        assert_eq!(max_drawdown(&curve), dec!(6.35));
    }

    #[test]
    fn drawdown_zero_for_rising_or_empty() {
        assert_eq!(max_drawdown(&[]), Decimal::ZERO);
        assert_eq!(max_drawdown(&[dec!(1), dec!(2), dec!(2), dec!(3)]), Decimal::ZERO);
        assert_eq!(max_drawdown(&[dec!(100), dec!(0)]), dec!(100));
    }

    #[test]
    fn annualized_return_edge_cases() {
        assert_eq!(annualized_return(dec!(10), 0), None);
        assert_eq!(annualized_return(dec!(-100), 30), None);
        // one full trading year: annualized equals total
        assert_eq!(annualized_return(dec!(10), 252), Some(dec!(10)));
        assert_eq!(annualized_return(Decimal::ZERO, 10), Some(Decimal::ZERO));
        // 1.5^252 does not fit in a Decimal
        assert_eq!(annualized_return(dec!(50), 1), None);
    }

    #[test]
    fn annualized_return_compounds() {
        // 1.21^(252/504) = 1.1
        assert_eq!(annualized_return(dec!(21), 504), Some(dec!(10)));
    }

    #[test]
    fn trade_statistics() {
        let trades = vec![
            trade(dec!(300), dec!(1), 2),
            trade(dec!(-100), dec!(1), 4),
            trade(dec!(100), dec!(1), 6),
            trade(Decimal::ZERO, dec!(1), 0),
        ];
        let m = PerformanceMetrics::compute(dec!(1000), dec!(1300), &trades, &[], 10);
        assert_eq!(m.total_trades, 4);
        assert_eq!(m.winning_trades, 2);
        assert_eq!(m.losing_trades, 1);
        assert_eq!(m.win_rate, Some(dec!(50)));
        assert_eq!(m.avg_profit, Some(dec!(200)));
        assert_eq!(m.avg_loss, Some(dec!(100)));
        assert_eq!(m.profit_factor, Some(dec!(4)));
        assert_eq!(m.largest_win, Some(dec!(300)));
        assert_eq!(m.largest_loss, Some(dec!(-100)));
        assert_eq!(m.total_commission, dec!(4));
        assert_eq!(m.avg_holding_secs, Some(3 * 86_400));
        assert_eq!(m.total_pnl, dec!(300));
    }

    #[test]
    fn undefined_ratios_are_none() {
        let m = PerformanceMetrics::compute(dec!(1000), dec!(1000), &[], &[], 0);
        assert_eq!(m.win_rate, None);
        assert_eq!(m.avg_profit, None);
        assert_eq!(m.avg_loss, None);
        assert_eq!(m.profit_factor, None);
        assert_eq!(m.avg_holding_secs, None);
        assert_eq!(m.annualized_return, None);
        assert_eq!(m.sharpe_ratio, None);

        let winners_only = vec![trade(dec!(5), Decimal::ZERO, 1)];
        let m = PerformanceMetrics::compute(dec!(1000), dec!(1005), &winners_only, &[], 1);
        assert_eq!(m.profit_factor, None);
        assert_eq!(m.avg_loss, None);
        assert_eq!(m.win_rate, Some(dec!(100)));
    }

    #[test]
    fn sharpe_needs_dispersion() {
        // constant growth: zero deviation
        assert_eq!(sharpe_ratio(&[dec!(100), dec!(110), dec!(121)]), None);
        assert_eq!(sharpe_ratio(&[dec!(100), dec!(101)]), None);
        let s = sharpe_ratio(&[dec!(100), dec!(102), dec!(101), dec!(104), dec!(103)]).unwrap();
        assert!(s > Decimal::ZERO);
    }
}
