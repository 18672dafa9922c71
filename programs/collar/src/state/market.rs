use std::mem::size_of;

use anchor_lang::prelude::*;
use static_assertions::const_assert_eq;

use crate::error::{CollarResult, ErrorCode};
use crate::math::constants::{
    MAX_ADMIN_FEE, MAX_AMPLIFICATION, MAX_BANDS, MAX_FEE, MAX_LIQUIDATION_DISCOUNT,
    MAX_LOAN_DISCOUNT, MIN_AMPLIFICATION, MIN_LIQUIDATION_DISCOUNT,
};
use crate::math::safe_math::SafeMath;
use crate::state::traits::Size;
use crate::validate;

#[cfg(test)]
mod tests;

/// Per-market configuration and global engine state. One market serves one
/// (collateral mint, borrowed mint) pair; both vaults are owned by the market
/// signer PDA and the borrowed vault is pre-funded with lendable supply.
#[account]
#[derive(Default)]
pub struct Market {
    pub admin: Pubkey,
    pub market_signer: Pubkey,
    pub collateral_mint: Pubkey,
    pub borrowed_mint: Pubkey,
    pub collateral_vault: Pubkey,
    pub borrowed_vault: Pubkey,
    pub price_feed: Pubkey,
    pub rate_policy: Pubkey,
    /// swap fee, wad fraction; the dynamic fee never goes below this
    pub fee: u128,
    /// share of the swap fee diverted to admin, wad fraction
    pub admin_fee: u128,
    /// borrowing headroom discount applied when placing a loan
    pub loan_discount: u128,
    /// discount embedded in health, the hard-liquidation trigger margin
    pub liquidation_discount: u128,
    /// wad cap on total_debt
    pub debt_ceiling: u128,
    /// upper price bound of band 0
    pub base_price: u128,
    /// smoothed oracle price as of last_oracle_ts
    pub oracle_price: u128,
    /// per-second borrow rate captured at last accrual
    pub rate: u128,
    /// monotone interest accumulator, wad, starts at 1e18
    pub rate_mul: u128,
    /// sum of all loan debts, wad, kept current by accrual
    pub total_debt: u128,
    /// admin fees accumulated in borrowed token, wad
    pub admin_fees_x: u128,
    /// admin fees accumulated in collateral, wad
    pub admin_fees_y: u128,
    pub amplification: u64,
    pub n_loans: u64,
    pub next_loan_id: u64,
    pub last_oracle_ts: i64,
    pub last_rate_ts: i64,
    /// band currently being traded through
    pub active_band: i32,
    /// grid origin: bands [min_band, min_band + MAX_BANDS) are representable
    pub min_band: i32,
    pub signer_nonce: u8,
    pub collateral_decimals: u8,
    pub borrowed_decimals: u8,
    /// reentrancy flag held across liquidation callbacks
    pub in_callback: bool,
    pub padding: [u8; 12],
}

impl Size for Market {
    const SIZE: usize = 8 + 256 + 192 + 24 + 16 + 8 + 16;
}

impl Market {
    /// Slot of band `n` in the grid arrays
    pub fn band_index(&self, n: i32) -> CollarResult<usize> {
        let offset = n.safe_sub(self.min_band)?;
        if offset < 0 || offset as usize >= MAX_BANDS {
            return Err(ErrorCode::PriceOutsideBands);
        }
        Ok(offset as usize)
    }

    pub fn band_in_range(&self, n: i32) -> bool {
        self.band_index(n).is_ok()
    }

    pub fn validate_config(&self) -> CollarResult {
        validate!(
            self.amplification >= MIN_AMPLIFICATION && self.amplification <= MAX_AMPLIFICATION,
            ErrorCode::InvalidMarketConfiguration,
            "amplification {} out of range",
            self.amplification
        )?;
        validate!(
            self.fee <= MAX_FEE,
            ErrorCode::InvalidFee,
            "fee {} above max",
            self.fee
        )?;
        validate!(
            self.admin_fee <= MAX_ADMIN_FEE,
            ErrorCode::InvalidFee,
            "admin fee {} above max",
            self.admin_fee
        )?;
        validate!(
            self.loan_discount <= MAX_LOAN_DISCOUNT,
            ErrorCode::InvalidMarketConfiguration,
            "loan discount {} above max",
            self.loan_discount
        )?;
        validate!(
            self.liquidation_discount >= MIN_LIQUIDATION_DISCOUNT
                && self.liquidation_discount <= MAX_LIQUIDATION_DISCOUNT,
            ErrorCode::InvalidMarketConfiguration,
            "liquidation discount {} out of range",
            self.liquidation_discount
        )?;
        validate!(
            self.liquidation_discount < self.loan_discount,
            ErrorCode::InvalidMarketConfiguration,
            "liquidation discount must be below loan discount"
        )?;
        validate!(
            self.base_price > 0,
            ErrorCode::InvalidMarketConfiguration,
            "base price is zero"
        )?;
        Ok(())
    }
}

/// The band ledger: per-band reserves and LP share supply, a bounded array
/// keyed by signed band index offset by `market.min_band`. Too large for a
/// CPI-funded `init`, so the account is pre-allocated and checked with the
/// `zero` constraint.
#[account(zero_copy)]
#[repr(C)]
pub struct Bands {
    pub market: Pubkey,
    /// borrowed-token reserve per band, wad
    pub x: [u128; MAX_BANDS],
    /// collateral reserve per band, wad
    pub y: [u128; MAX_BANDS],
    /// LP share supply per band (includes dead shares)
    pub total_shares: [u128; MAX_BANDS],
}

const_assert_eq!(size_of::<Bands>(), 32 + 3 * 16 * MAX_BANDS);

impl Default for Bands {
    fn default() -> Self {
        Bands {
            market: Pubkey::default(),
            x: [0; MAX_BANDS],
            y: [0; MAX_BANDS],
            total_shares: [0; MAX_BANDS],
        }
    }
}

impl Size for Bands {
    const SIZE: usize = 8 + 32 + 3 * 16 * MAX_BANDS;
}

impl Bands {
    /// Totals across the whole grid; the conservation invariant checks these
    /// against vault balances.
    pub fn totals(&self) -> CollarResult<(u128, u128)> {
        let mut sum_x = 0_u128;
        let mut sum_y = 0_u128;
        for i in 0..MAX_BANDS {
            sum_x = sum_x.safe_add(self.x[i])?;
            sum_y = sum_y.safe_add(self.y[i])?;
        }
        Ok((sum_x, sum_y))
    }
}
