use anchor_lang::prelude::*;

use crate::error::{CollarResult, ErrorCode};
use crate::math::constants::MAX_ORACLE_STALENESS_SECONDS;
use crate::state::traits::Size;
use crate::validate;

/// External price feed, specified only at its interface boundary: a wad price
/// plus a freshness timestamp, written by its own authority. The engine only
/// ever reads it.
#[account]
#[derive(Default)]
pub struct PriceFeed {
    pub authority: Pubkey,
    pub price: u128,
    pub last_update_ts: i64,
}

impl Size for PriceFeed {
    const SIZE: usize = 8 + 32 + 16 + 8;
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct OraclePriceData {
    pub price: u128,
    pub ts: i64,
}

pub fn get_oracle_price(feed: &PriceFeed, now: i64) -> CollarResult<OraclePriceData> {
    validate!(feed.price > 0, ErrorCode::InvalidOracle, "oracle price is zero")?;
    validate!(
        now.saturating_sub(feed.last_update_ts) <= MAX_ORACLE_STALENESS_SECONDS,
        ErrorCode::InvalidOracle,
        "oracle last updated {} now {}",
        feed.last_update_ts,
        now
    )?;

    Ok(OraclePriceData {
        price: feed.price,
        ts: feed.last_update_ts,
    })
}
