use anchor_lang::prelude::*;

use crate::error::{CollarResult, ErrorCode};
use crate::math::constants::MAX_TICKS_PER_LOAN;
use crate::math::helpers::get_proportion_u128;
use crate::math::safe_math::SafeMath;
use crate::state::traits::Size;

#[cfg(test)]
mod tests;

/// A user's position: debt bookkeeping owned by the controller plus a
/// reference into the AMM (band range and per-band shares). Reserve
/// accounting itself lives only in [`crate::state::market::Bands`].
///
/// A loan account with zero debt and no shares is treated as non-existent;
/// the PDA is reusable for the next loan of the same authority.
#[account(zero_copy)]
#[repr(C)]
pub struct Loan {
    pub authority: Pubkey,
    pub market: Pubkey,
    /// LP shares per band, indexed from n1
    pub ticks: [u128; MAX_TICKS_PER_LOAN as usize],
    /// wad principal, denominated at `rate_mul`
    pub debt: u128,
    /// market rate_mul snapshot at last debt write
    pub rate_mul: u128,
    pub loan_id: u64,
    pub last_update_ts: i64,
    /// highest-price band of the position
    pub n1: i32,
    /// lowest-price band of the position
    pub n2: i32,
    pub padding: [u8; 8],
}

impl Default for Loan {
    fn default() -> Self {
        Loan {
            authority: Pubkey::default(),
            market: Pubkey::default(),
            ticks: [0; MAX_TICKS_PER_LOAN as usize],
            debt: 0,
            rate_mul: 0,
            loan_id: 0,
            last_update_ts: 0,
            n1: 0,
            n2: 0,
            padding: [0; 8],
        }
    }
}

impl Size for Loan {
    const SIZE: usize = 8 + 64 + 16 * MAX_TICKS_PER_LOAN as usize + 32 + 16 + 8 + 8;
}

impl Loan {
    pub fn exists(&self) -> bool {
        self.debt > 0 || self.has_liquidity()
    }

    pub fn has_liquidity(&self) -> bool {
        self.ticks.iter().any(|s| *s > 0)
    }

    pub fn num_ticks(&self) -> CollarResult<u32> {
        let n = self.n2.safe_sub(self.n1)?.safe_add(1)?;
        if n < 1 || n as u32 > MAX_TICKS_PER_LOAN {
            return Err(ErrorCode::InvalidBandCount);
        }
        Ok(n as u32)
    }

    /// Debt compounded up to the current accumulator
    pub fn current_debt(&self, rate_mul_now: u128) -> CollarResult<u128> {
        if self.debt == 0 {
            return Ok(0);
        }
        get_proportion_u128(self.debt, rate_mul_now, self.rate_mul)
    }

    pub fn clear(&mut self) {
        self.debt = 0;
        self.n1 = 0;
        self.n2 = 0;
        self.ticks = [0; MAX_TICKS_PER_LOAN as usize];
    }
}
