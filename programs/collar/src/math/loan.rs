use crate::error::{CollarResult, ErrorCode};
use crate::math::bands::{band_ratio, band_ratio_inv, p_oracle_up};
use crate::math::constants::{
    MAX_BANDS, MAX_TICKS_PER_LOAN, MIN_TICKS, PERCENTAGE_PRECISION, PRICE_PRECISION,
};
use crate::math::helpers::{wad_div, wad_div_ceil, wad_mul, wad_sqrt_product};
use crate::math::safe_math::SafeMath;
use crate::state::market::Market;
use crate::validate;
use solana_program::msg;

#[cfg(test)]
mod tests;

pub fn validate_band_count(n: u32) -> CollarResult {
    validate!(
        n >= MIN_TICKS && n <= MAX_TICKS_PER_LOAN,
        ErrorCode::InvalidBandCount,
        "band count {} outside [{}, {}]",
        n,
        MIN_TICKS,
        MAX_TICKS_PER_LOAN
    )?;
    Ok(())
}

/// Effective collateral backing a loan spread over `n` bands: each deeper
/// band's collateral is worth one band ratio less, and the whole position is
/// discounted by `loan_discount` plus half a band (the sqrt factor) because
/// liquidation may start anywhere inside the first band.
pub fn get_y_effective(
    collateral: u128,
    n: u32,
    loan_discount: u128,
    amplification: u64,
) -> CollarResult<u128> {
    validate!(n >= 1, ErrorCode::InvalidBandCount, "zero bands")?;

    let sqrt_band_ratio = wad_sqrt_product(band_ratio(amplification)?, PRICE_PRECISION)?;
    let ratio_inv = band_ratio_inv(amplification)?;

    let discounted = wad_mul(
        collateral,
        PERCENTAGE_PRECISION.safe_sub(loan_discount)?,
    )?;
    let mut d_y = wad_div(discounted.safe_div(n as u128)?, sqrt_band_ratio)?;
    let mut y_effective = d_y;
    for _ in 1..n {
        d_y = wad_mul(d_y, ratio_inv)?;
        y_effective = y_effective.safe_add(d_y)?;
    }
    Ok(y_effective)
}

/// Debt that a placement starting at band `n1` can back
pub fn max_debt_for_placement(
    market: &Market,
    y_effective: u128,
    n1: i32,
) -> CollarResult<u128> {
    let p_up = p_oracle_up(market.base_price, market.amplification, n1)?;
    wad_mul(y_effective, p_up)
}

/// Find the deepest (largest-index, furthest below price) starting band whose
/// effective collateral still covers `debt`. Deeper is safer for the
/// borrower, so the search maximizes n1 subject to coverage; no valid n1
/// means the requested debt is simply too high.
///
/// The coverage predicate is monotone in n1 (band prices decay
/// geometrically), so a binary search over the grid replaces the original
/// logarithm arithmetic; both pick the same band.
pub fn calculate_debt_n1(
    market: &Market,
    collateral: u128,
    debt: u128,
    n: u32,
) -> CollarResult<i32> {
    validate!(debt > 0, ErrorCode::AmountTooLow, "zero debt")?;
    let y_effective = get_y_effective(collateral, n, market.loan_discount, market.amplification)?;

    let lo = market.active_band.safe_add(1)?;
    // the whole range n1..=n1+n-1 must stay on the grid
    let hi = market
        .min_band
        .safe_add(MAX_BANDS as i32)?
        .safe_sub(n as i32)?;
    validate!(
        lo <= hi,
        ErrorCode::PriceOutsideBands,
        "no room on the grid above band {}",
        market.active_band
    )?;

    validate!(
        max_debt_for_placement(market, y_effective, lo)? >= debt,
        ErrorCode::DebtTooHigh,
        "Debt too high"
    )?;

    let mut lo = lo;
    let mut hi = hi;
    while lo < hi {
        let mid = lo.safe_add(hi.safe_sub(lo)?.safe_add(1)?.safe_div(2)?)?;
        if max_debt_for_placement(market, y_effective, mid)? >= debt {
            lo = mid;
        } else {
            hi = mid.safe_sub(1)?;
        }
    }
    Ok(lo)
}

/// Most debt a position of `collateral` over `n` bands can open right now,
/// i.e. with the shallowest allowed placement. Capped by debt-ceiling
/// headroom.
pub fn max_borrowable(market: &Market, collateral: u128, n: u32) -> CollarResult<u128> {
    let y_effective = get_y_effective(collateral, n, market.loan_discount, market.amplification)?;
    let max_debt =
        max_debt_for_placement(market, y_effective, market.active_band.safe_add(1)?)?;
    let headroom = market.debt_ceiling.saturating_sub(market.total_debt);
    Ok(max_debt.min(headroom))
}

/// Least collateral that keeps `debt` placeable over `n` bands
pub fn min_collateral(market: &Market, debt: u128, n: u32) -> CollarResult<u128> {
    let unit_y_effective =
        get_y_effective(PRICE_PRECISION, n, market.loan_discount, market.amplification)?;
    let n1 = market.active_band.safe_add(1)?;
    let p_up = p_oracle_up(market.base_price, market.amplification, n1)?;
    let y_effective_needed = wad_div_ceil(debt, p_up)?;
    let mut collateral = wad_div_ceil(y_effective_needed, unit_y_effective)?;

    // the unit extrapolation floors once per band, so the estimate can land a
    // few units short of the shallowest-placement predicate; walk it up
    for _ in 0..16 {
        let y_effective =
            get_y_effective(collateral, n, market.loan_discount, market.amplification)?;
        if max_debt_for_placement(market, y_effective, n1)? >= debt {
            return Ok(collateral);
        }
        collateral = collateral.safe_add(collateral.safe_div(1_000_000_000)?.max(1))?;
    }
    Err(ErrorCode::MathError)
}
