use crate::error::CollarResult;
use crate::math::constants::PERCENTAGE_PRECISION;
use crate::math::helpers::{get_proportion_u128, wad_mul};
use crate::math::safe_math::SafeMath;
use crate::state::market::Market;
use crate::state::policy::RatePolicy;

#[cfg(test)]
mod tests;

/// Advance the global interest accumulator with seconds-weighted compounding:
/// `rate_mul' = rate_mul * (1 + rate * dt)`. `total_debt` is scaled by the
/// same factor so the sum of per-loan debts stays consistent with it.
/// Monotone: the accumulator never decreases.
pub fn accrue_interest(market: &mut Market, policy: &RatePolicy, now: i64) -> CollarResult<u128> {
    if now <= market.last_rate_ts {
        return Ok(market.rate_mul);
    }

    let rate = policy.rate()?;
    let dt = now.safe_sub(market.last_rate_ts)? as u128;
    let multiplier = PERCENTAGE_PRECISION.safe_add(rate.safe_mul(dt)?)?;

    let old_rate_mul = market.rate_mul;
    let new_rate_mul = wad_mul(old_rate_mul, multiplier)?;

    market.total_debt = get_proportion_u128(market.total_debt, new_rate_mul, old_rate_mul)?;
    market.rate_mul = new_rate_mul;
    market.rate = rate;
    market.last_rate_ts = now;

    Ok(new_rate_mul)
}
