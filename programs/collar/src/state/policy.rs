use anchor_lang::prelude::*;

use crate::error::{CollarResult, ErrorCode};
use crate::math::constants::MAX_RATE_PER_SECOND;
use crate::state::traits::Size;
use crate::validate;

/// Monetary policy collaborator: publishes the per-second borrow rate the
/// controller compounds with. Only its authority may update it.
#[account]
#[derive(Default)]
pub struct RatePolicy {
    pub authority: Pubkey,
    pub rate_per_second: u128,
    pub last_update_ts: i64,
}

impl Size for RatePolicy {
    const SIZE: usize = 8 + 32 + 16 + 8;
}

impl RatePolicy {
    /// Rate consumed by interest accrual, clamped so a misconfigured policy
    /// cannot brick loans with an unpayable rate.
    pub fn rate(&self) -> CollarResult<u128> {
        validate!(
            self.rate_per_second <= MAX_RATE_PER_SECOND,
            ErrorCode::InvalidRate,
            "policy rate {} above max {}",
            self.rate_per_second,
            MAX_RATE_PER_SECOND
        )?;
        Ok(self.rate_per_second)
    }
}
