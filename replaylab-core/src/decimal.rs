//! Fixed-point arithmetic helpers over `rust_decimal::Decimal`.
//!
//! Every money, price and quantity value in the simulator is a `Decimal`.
//! The helpers here pin down the two things `Decimal` leaves open: the
//! rounding mode (half-up, i.e. midpoint away from zero) and what happens on a
//! zero denominator (`None`, never a panic).

use rust_decimal::prelude::*;
use rust_decimal::MathematicalOps;

/// Scale of published prices and price-like indicator values.
pub const PRICE_SCALE: u32 = 4;
/// Scale of internal smoothing state, multipliers and variance.
pub const RATIO_SCALE: u32 = 10;
/// Scale of published RSI values.
pub const RSI_SCALE: u32 = 2;
/// Scale of report-level averages and factors.
pub const REPORT_SCALE: u32 = 2;

/// Rounding and checked-division helpers used throughout the crate.
pub trait DecimalExt: Sized {
    /// Round to `scale` fractional digits, midpoint away from zero.
    fn round_half_up(self, scale: u32) -> Self;

    /// Divide and round half-up to `scale`. `None` when `divisor` is zero.
    fn div_half_up(self, divisor: Self, scale: u32) -> Option<Self>;

    /// Drop the fractional part (round toward zero).
    fn floor_units(self) -> Self;

    /// Square root rounded half-up to `scale`. `None` for negative input.
    fn sqrt_half_up(self, scale: u32) -> Option<Self>;

    /// Clamp into `[0, 1]`.
    fn clamp_unit(self) -> Self;
}

impl DecimalExt for Decimal {
    fn round_half_up(self, scale: u32) -> Self {
        self.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
    }

    fn div_half_up(self, divisor: Self, scale: u32) -> Option<Self> {
        if divisor.is_zero() {
            return None;
        }
        self.checked_div(divisor).map(|q| q.round_half_up(scale))
    }

    fn floor_units(self) -> Self {
        self.round_dp_with_strategy(0, RoundingStrategy::ToZero)
    }

    fn sqrt_half_up(self, scale: u32) -> Option<Self> {
        if self.is_sign_negative() && !self.is_zero() {
            return None;
        }
        self.sqrt().map(|root| root.round_half_up(scale))
    }

    fn clamp_unit(self) -> Self {
        self.max(Decimal::ZERO).min(Decimal::ONE)
    }
}

/// Convert a count into a `Decimal`.
pub fn from_count(n: usize) -> Decimal {
    Decimal::from(n as u64)
}

/// `2 / (period + 1)` at `RATIO_SCALE`: the EMA smoothing multiplier.
pub fn ema_multiplier(period: usize) -> Decimal {
    // period + 1 >= 2, so the division is always defined.
    Decimal::TWO
        .div_half_up(from_count(period + 1), RATIO_SCALE)
        .unwrap_or(Decimal::ZERO)
}

/// Mean of `values` rounded half-up to `scale`. `None` for an empty slice.
pub fn mean(values: &[Decimal], scale: u32) -> Option<Decimal> {
    let sum: Decimal = values.iter().copied().sum();
    sum.div_half_up(from_count(values.len()), scale)
}
