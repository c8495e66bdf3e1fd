//! Fixed-point arithmetic.
//!
//! Percentages are `u128` values scaled by [`PRECISION`], so `10^18` means
//! 100%. Token amounts and vote weights are plain `u128`. Products of two
//! `u128` values are carried in 256 bits before the final division, which
//! always truncates toward zero.

use primitive_types::U256;

/// Fixed-point scale: `PRECISION` == 100%.
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

/// Basis points in 100%.
pub const MAX_BPS: u128 = 10_000;

/// Compute `a * b / denominator` with a 256-bit intermediate.
///
/// Returns `None` if `denominator` is zero or the quotient does not fit in
/// a `u128`.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Option<u128> {
    if denominator == 0 {
        return None;
    }
    let quotient = U256::from(a) * U256::from(b) / U256::from(denominator);
    narrow(quotient)
}

/// Convert basis points to a fixed-point percentage.
pub fn from_bps(bps: u16) -> u128 {
    u128::from(bps) * (PRECISION / MAX_BPS)
}

/// Convert a whole percentage (0-100) to a fixed-point percentage.
pub fn from_percent(pct: u8) -> u128 {
    u128::from(pct) * (PRECISION / 100)
}

fn narrow(value: U256) -> Option<u128> {
    if value > U256::from(u128::MAX) {
        return None;
    }
    Some(value.low_u128())
}

/// Accumulates `Σ weight_i * pct_i` without overflow, then divides once.
#[derive(Clone, Copy, Debug, Default)]
pub struct WeightedSum(U256);

impl WeightedSum {
    /// An empty sum.
    pub fn zero() -> Self {
        Self(U256::zero())
    }

    /// Add `weight * pct` to the sum.
    pub fn add(&mut self, weight: u128, pct: u128) {
        self.0 = self.0.saturating_add(U256::from(weight) * U256::from(pct));
    }

    /// Divide the accumulated sum by `denominator`, truncating.
    pub fn div(self, denominator: u128) -> Option<u128> {
        if denominator == 0 {
            return None;
        }
        narrow(self.0 / U256::from(denominator))
    }
}
