use anchor_lang::prelude::Pubkey;

use crate::math::constants::{MAX_BANDS, PRICE_PRECISION};
use crate::state::loan::Loan;
use crate::state::market::{Bands, Market};
use crate::state::policy::RatePolicy;

pub fn wad(units: u128) -> u128 {
    units * PRICE_PRECISION
}

/// A 100-amplification market quoting collateral at 3000, active band just
/// above the whole grid region loans land in.
pub fn test_market() -> Market {
    Market {
        amplification: 100,
        base_price: wad(3_000),
        oracle_price: wad(3_000),
        fee: 6_000_000_000_000_000,                  // 0.6%
        admin_fee: 0,
        loan_discount: 90_000_000_000_000_000,       // 9%
        liquidation_discount: 60_000_000_000_000_000, // 6%
        debt_ceiling: wad(100_000_000),
        rate_mul: PRICE_PRECISION,
        active_band: -1,
        min_band: -(MAX_BANDS as i32 / 2),
        ..Market::default()
    }
}

pub fn test_loan() -> Loan {
    Loan {
        authority: Pubkey::new_unique(),
        ..Loan::default()
    }
}

pub fn test_bands() -> Bands {
    Bands::default()
}

pub fn test_policy(rate_per_second: u128) -> RatePolicy {
    RatePolicy {
        authority: Pubkey::new_unique(),
        rate_per_second,
        last_update_ts: 0,
    }
}
