//! Applying a split to a token amount.
//!
//! YBS and treasury shares are each `amount * pct / PRECISION`, truncated.
//! The remainder is computed by subtraction, so it absorbs the rounding
//! dust and the three amounts always add back up to the input.

use ysplit_types::{mul_div, Allocation, Split, PRECISION};

use crate::{Result, RevenueError};

/// Divide `amount` according to `split`.
///
/// # Errors
///
/// - [`RevenueError::ZeroAmount`] if the amount is zero
/// - [`RevenueError::Overflow`] if the split's shares exceed 100%
pub fn distribute(amount: u128, split: &Split) -> Result<Allocation> {
    if amount == 0 {
        return Err(RevenueError::ZeroAmount);
    }

    let ybs = mul_div(amount, split.ybs, PRECISION).ok_or(RevenueError::Overflow)?;
    let treasury = mul_div(amount, split.treasury, PRECISION).ok_or(RevenueError::Overflow)?;

    // Remainder absorbs rounding loss.
    let remainder = amount
        .checked_sub(ybs)
        .and_then(|rest| rest.checked_sub(treasury))
        .ok_or(RevenueError::Overflow)?;

    Ok(Allocation {
        ybs,
        treasury,
        remainder,
    })
}
