use anchor_lang::prelude::*;
use solana_program::msg;

use crate::error::{CollarResult, ErrorCode};
use crate::math::bands::{
    band_price, get_y0, invariant, p_oracle_down, p_oracle_up, virtual_balances, x_when_y_drained,
    y_when_x_drained,
};
use crate::math::bn::U256;
use crate::math::constants::{
    DEAD_SHARES, MAX_BAND_WALK, MAX_FEE, MAX_ORACLE_STEP_PER_SECOND, MAX_TICKS_PER_LOAN,
    MIN_TICK_LIQUIDITY, PERCENTAGE_PRECISION, PRICE_PRECISION,
};
use crate::math::helpers::{
    get_proportion_u128, wad_div, wad_div_ceil, wad_mul, wad_sqrt_product,
};
use crate::math::safe_math::{SafeDivCeil, SafeMath};
use crate::state::loan::Loan;
use crate::state::market::{Bands, Market};
use crate::state::oracle::OraclePriceData;
use crate::validate;

#[cfg(test)]
mod tests;

/// Hook notified on every per-band collateral balance change, so external
/// reward programs can track liquidity. Strictly best effort: a failing hook
/// is logged and ignored, it can never abort the core operation.
pub trait LiquidityMiningHook {
    fn on_collateral_change(&mut self, user: &Pubkey, band: i32, new_amount: u128)
        -> CollarResult;
}

pub struct NoOpHook;

impl LiquidityMiningHook for NoOpHook {
    fn on_collateral_change(&mut self, _user: &Pubkey, _band: i32, _new_amount: u128) -> CollarResult {
        Ok(())
    }
}

fn notify_hook<H: LiquidityMiningHook>(hook: &mut H, user: &Pubkey, band: i32, new_amount: u128) {
    if let Err(e) = hook.on_collateral_change(user, band, new_amount) {
        msg!("liquidity mining hook failed: {}, ignoring", e);
    }
}

/// Refresh the smoothed oracle price. Movement of the stored price is clamped
/// to a per-second relative step so a single interaction cannot teleport the
/// reference price, which is what makes sandwiching the lazy refresh
/// unprofitable.
pub fn update_oracle_price(
    market: &mut Market,
    oracle_price_data: &OraclePriceData,
    now: i64,
) -> CollarResult<u128> {
    let raw = oracle_price_data.price;
    if market.oracle_price == 0 {
        market.oracle_price = raw;
        market.last_oracle_ts = now;
        return Ok(raw);
    }

    let dt = now.safe_sub(market.last_oracle_ts)?.max(0) as u128;
    let max_step_frac = MAX_ORACLE_STEP_PER_SECOND
        .safe_mul(dt)?
        .min(PERCENTAGE_PRECISION);
    let max_delta = wad_mul(market.oracle_price, max_step_frac)?;

    let prev = market.oracle_price;
    let smoothed = if raw > prev {
        prev.safe_add(max_delta)?.min(raw)
    } else {
        prev.safe_sub(max_delta.min(prev))?.max(raw)
    };

    market.oracle_price = smoothed;
    market.last_oracle_ts = now;
    Ok(smoothed)
}

/// Deposit `amount` of collateral (wad), split evenly across bands n1..=n2,
/// minting per-band shares into the loan's ticks.
pub fn deposit_range<H: LiquidityMiningHook>(
    market: &Market,
    bands: &mut Bands,
    loan: &mut Loan,
    amount: u128,
    n1: i32,
    n2: i32,
    hook: &mut H,
) -> CollarResult {
    validate!(n1 <= n2, ErrorCode::InvalidBandCount, "n1 {} > n2 {}", n1, n2)?;
    let n_bands = n2.safe_sub(n1)?.safe_add(1)? as u32;
    validate!(
        n_bands <= MAX_TICKS_PER_LOAN,
        ErrorCode::InvalidBandCount,
        "too many bands: {}",
        n_bands
    )?;
    validate!(
        n1 > market.active_band,
        ErrorCode::BandsNotAboveActive,
        "deposit range starts at {} but active band is {}",
        n1,
        market.active_band
    )?;
    validate!(
        !loan.has_liquidity(),
        ErrorCode::LoanAlreadyCreated,
        "loan still holds shares"
    )?;

    let per_band = amount.safe_div(n_bands as u128)?;
    validate!(
        per_band >= MIN_TICK_LIQUIDITY,
        ErrorCode::AmountTooLow,
        "Amount too low"
    )?;
    // rounding remainder goes into the first (highest price) band
    let remainder = amount.safe_sub(per_band.safe_mul(n_bands as u128)?)?;

    for i in 0..n_bands {
        let n = n1.safe_add(i as i32)?;
        let idx = market.band_index(n)?;
        let deposit = if i == 0 {
            per_band.safe_add(remainder)?
        } else {
            per_band
        };

        let y_before = bands.y[idx];
        let total_before = bands.total_shares[idx];
        let shares = if total_before == 0 {
            // first depositor also mints dead shares to pin the share price
            bands.total_shares[idx] = deposit.safe_add(DEAD_SHARES)?;
            deposit
        } else if y_before == 0 {
            // shares outstanding but reserves traded away entirely; treat as fresh
            bands.total_shares[idx] = total_before.safe_add(deposit)?;
            deposit
        } else {
            let shares = get_proportion_u128(deposit, total_before, y_before)?;
            bands.total_shares[idx] = total_before.safe_add(shares)?;
            shares
        };

        bands.y[idx] = y_before.safe_add(deposit)?;
        loan.ticks[i as usize] = shares;
        notify_hook(hook, &loan.authority, n, bands.y[idx]);
    }

    loan.n1 = n1;
    loan.n2 = n2;
    Ok(())
}

pub struct WithdrawAmounts {
    pub borrowed: u128,
    pub collateral: u128,
}

/// Withdraw `frac` (wad fraction) of the loan's shares from every occupied
/// band. Reserve payouts are floored in favor of the pool.
pub fn withdraw<H: LiquidityMiningHook>(
    market: &Market,
    bands: &mut Bands,
    loan: &mut Loan,
    frac: u128,
    hook: &mut H,
) -> CollarResult<WithdrawAmounts> {
    validate!(
        frac > 0 && frac <= PERCENTAGE_PRECISION,
        ErrorCode::InvalidLiquidationFraction,
        "withdraw fraction {} out of range",
        frac
    )?;
    validate!(
        loan.has_liquidity(),
        ErrorCode::LoanDoesNotExist,
        "no shares to withdraw"
    )?;

    let n_bands = loan.num_ticks()?;
    let mut borrowed = 0_u128;
    let mut collateral = 0_u128;

    for i in 0..n_bands {
        let tick = loan.ticks[i as usize];
        if tick == 0 {
            continue;
        }
        let n = loan.n1.safe_add(i as i32)?;
        let idx = market.band_index(n)?;

        let burn = if frac == PERCENTAGE_PRECISION {
            tick
        } else {
            wad_mul(tick, frac)?
        };
        if burn == 0 {
            continue;
        }

        let total = bands.total_shares[idx];
        let dx = get_proportion_u128(bands.x[idx], burn, total)?;
        let dy = get_proportion_u128(bands.y[idx], burn, total)?;

        bands.x[idx] = bands.x[idx].safe_sub(dx)?;
        bands.y[idx] = bands.y[idx].safe_sub(dy)?;
        bands.total_shares[idx] = total.safe_sub(burn)?;
        loan.ticks[i as usize] = tick.safe_sub(burn)?;

        borrowed = borrowed.safe_add(dx)?;
        collateral = collateral.safe_add(dy)?;
        notify_hook(hook, &loan.authority, n, bands.y[idx]);
    }

    Ok(WithdrawAmounts {
        borrowed,
        collateral,
    })
}

/// Swap fee grows with the gap between the AMM price and the oracle price,
/// pricing away single-interaction oracle-lag arbitrage.
pub fn dynamic_fee(base_fee: u128, p_amm: u128, p_oracle: u128) -> CollarResult<u128> {
    if p_oracle == 0 {
        return Ok(base_fee);
    }
    let deviation = if p_amm > p_oracle {
        wad_div(p_amm.safe_sub(p_oracle)?, p_oracle)?
    } else {
        wad_div(p_oracle.safe_sub(p_amm)?, p_oracle)?
    };
    Ok(base_fee.max(deviation).min(MAX_FEE.safe_mul(5)?))
}

/// Marginal AMM price, derived from the active band's reserves
pub fn get_p(market: &Market, bands: &Bands, p_oracle: u128) -> CollarResult<u128> {
    let idx = market.band_index(market.active_band)?;
    let p_up = p_oracle_up(market.base_price, market.amplification, market.active_band)?;
    band_price(
        bands.x[idx],
        bands.y[idx],
        p_oracle,
        p_up,
        market.amplification,
    )
}

/// Staged result of a band walk. Band deltas are computed fully before any
/// commit so a failing precondition leaves no partial state.
#[derive(Default)]
pub struct SwapCalc {
    pub in_amount: u128,
    pub out_amount: u128,
    pub admin_fee_x: u128,
    pub admin_fee_y: u128,
    pub active_band: i32,
    pub ticks_crossed: u32,
    band_deltas: Vec<(usize, u128, u128)>,
}

impl SwapCalc {
    pub fn is_empty(&self) -> bool {
        self.out_amount == 0
    }
}

/// Walk bands in the pump direction (borrowed token in, collateral out,
/// price rising, band index rising) or the dump direction, consuming
/// `in_amount` (wad, fee inclusive).
pub fn calc_swap_out(
    market: &Market,
    bands: &Bands,
    pump: bool,
    in_amount: u128,
    p_oracle: u128,
) -> CollarResult<SwapCalc> {
    let fee = dynamic_fee(market.fee, get_p(market, bands, p_oracle)?, p_oracle)?;
    let one_minus_fee = PERCENTAGE_PRECISION.safe_sub(fee)?;

    let mut calc = SwapCalc {
        active_band: market.active_band,
        ..Default::default()
    };
    let mut remaining = in_amount;
    let mut n = market.active_band;

    for _ in 0..MAX_BAND_WALK {
        if remaining == 0 {
            break;
        }
        let idx = market.band_index(n)?;
        let (x, y) = (bands.x[idx], bands.y[idx]);
        let p_up = p_oracle_up(market.base_price, market.amplification, n)?;
        let y0 = get_y0(x, y, p_oracle, p_up, market.amplification)?;

        if y0 > 0 {
            let (f, g) = virtual_balances(y0, p_oracle, p_up, market.amplification)?;
            let inv = invariant(f, g, x, y)?;

            if pump && y > 0 {
                let x_dest = x_when_y_drained(inv, f, g)?;
                let dx = x_dest.saturating_sub(x);
                let dx_gross = wad_div_ceil(dx, one_minus_fee)?;
                if remaining <= dx_gross {
                    // partial fill inside this band
                    let net = wad_mul(remaining, one_minus_fee)?;
                    let fee_amount = remaining.safe_sub(net)?;
                    let admin_cut = wad_mul(fee_amount, market.admin_fee)?;
                    let x_plus_net = x.safe_add(net)?;
                    let y_new = inv
                        .safe_div_ceil(U256::from(f.safe_add(x_plus_net)?))?
                        .try_to_u128()?
                        .saturating_sub(g)
                        .min(y);
                    let x_new = x_plus_net.safe_add(fee_amount.safe_sub(admin_cut)?)?;

                    calc.out_amount = calc.out_amount.safe_add(y.safe_sub(y_new)?)?;
                    calc.in_amount = calc.in_amount.safe_add(remaining)?;
                    calc.admin_fee_x = calc.admin_fee_x.safe_add(admin_cut)?;
                    push_delta(&mut calc.band_deltas, idx, x_new, y_new);
                    remaining = 0;
                    calc.active_band = n;
                    break;
                }
                // drain the band and keep walking
                let fee_amount = dx_gross.safe_sub(dx)?;
                let admin_cut = wad_mul(fee_amount, market.admin_fee)?;
                calc.out_amount = calc.out_amount.safe_add(y)?;
                calc.in_amount = calc.in_amount.safe_add(dx_gross)?;
                calc.admin_fee_x = calc.admin_fee_x.safe_add(admin_cut)?;
                push_delta(
                    &mut calc.band_deltas,
                    idx,
                    x_dest.safe_add(fee_amount.safe_sub(admin_cut)?)?,
                    0,
                );
                remaining = remaining.safe_sub(dx_gross)?;
            } else if !pump && x > 0 {
                let y_dest = y_when_x_drained(inv, f, g)?;
                let dy = y_dest.saturating_sub(y);
                let dy_gross = wad_div_ceil(dy, one_minus_fee)?;
                if remaining <= dy_gross {
                    let net = wad_mul(remaining, one_minus_fee)?;
                    let fee_amount = remaining.safe_sub(net)?;
                    let admin_cut = wad_mul(fee_amount, market.admin_fee)?;
                    let y_plus_net = y.safe_add(net)?;
                    let x_new = inv
                        .safe_div_ceil(U256::from(g.safe_add(y_plus_net)?))?
                        .try_to_u128()?
                        .saturating_sub(f)
                        .min(x);
                    let y_new = y_plus_net.safe_add(fee_amount.safe_sub(admin_cut)?)?;

                    calc.out_amount = calc.out_amount.safe_add(x.safe_sub(x_new)?)?;
                    calc.in_amount = calc.in_amount.safe_add(remaining)?;
                    calc.admin_fee_y = calc.admin_fee_y.safe_add(admin_cut)?;
                    push_delta(&mut calc.band_deltas, idx, x_new, y_new);
                    remaining = 0;
                    calc.active_band = n;
                    break;
                }
                let fee_amount = dy_gross.safe_sub(dy)?;
                let admin_cut = wad_mul(fee_amount, market.admin_fee)?;
                calc.out_amount = calc.out_amount.safe_add(x)?;
                calc.in_amount = calc.in_amount.safe_add(dy_gross)?;
                calc.admin_fee_y = calc.admin_fee_y.safe_add(admin_cut)?;
                push_delta(
                    &mut calc.band_deltas,
                    idx,
                    0,
                    y_dest.safe_add(fee_amount.safe_sub(admin_cut)?)?,
                );
                remaining = remaining.safe_sub(dy_gross)?;
            }
        }

        n = if pump { n.safe_add(1)? } else { n.safe_sub(1)? };
        calc.active_band = n;
        calc.ticks_crossed = calc.ticks_crossed.safe_add(1)?;
        if !market.band_in_range(n) {
            // ran off the grid with input left over
            validate!(
                remaining == 0,
                ErrorCode::PriceOutsideBands,
                "swap would cross band {} outside the grid",
                n
            )?;
            calc.active_band = if pump { n.safe_sub(1)? } else { n.safe_add(1)? };
            break;
        }
    }

    validate!(
        remaining == 0,
        ErrorCode::PriceOutsideBands,
        "swap exceeded the maximum band walk"
    )?;

    Ok(calc)
}

/// Band walk for an exact output: computes the gross input required to take
/// `out_amount` out of the book.
pub fn calc_swap_in(
    market: &Market,
    bands: &Bands,
    pump: bool,
    out_amount: u128,
    p_oracle: u128,
) -> CollarResult<SwapCalc> {
    let fee = dynamic_fee(market.fee, get_p(market, bands, p_oracle)?, p_oracle)?;
    let one_minus_fee = PERCENTAGE_PRECISION.safe_sub(fee)?;

    let mut calc = SwapCalc {
        active_band: market.active_band,
        ..Default::default()
    };
    let mut wanted = out_amount;
    let mut n = market.active_band;

    for _ in 0..MAX_BAND_WALK {
        if wanted == 0 {
            break;
        }
        let idx = market.band_index(n)?;
        let (x, y) = (bands.x[idx], bands.y[idx]);
        let p_up = p_oracle_up(market.base_price, market.amplification, n)?;
        let y0 = get_y0(x, y, p_oracle, p_up, market.amplification)?;

        if y0 > 0 {
            let (f, g) = virtual_balances(y0, p_oracle, p_up, market.amplification)?;
            let inv = invariant(f, g, x, y)?;

            if pump && y > 0 {
                if wanted < y {
                    let y_new = y.safe_sub(wanted)?;
                    let x_net_new = inv
                        .safe_div_ceil(U256::from(g.safe_add(y_new)?))?
                        .try_to_u128()?
                        .safe_sub(f)?;
                    let dx = x_net_new.safe_sub(x)?;
                    let dx_gross = wad_div_ceil(dx, one_minus_fee)?;
                    let fee_amount = dx_gross.safe_sub(dx)?;
                    let admin_cut = wad_mul(fee_amount, market.admin_fee)?;

                    calc.out_amount = calc.out_amount.safe_add(wanted)?;
                    calc.in_amount = calc.in_amount.safe_add(dx_gross)?;
                    calc.admin_fee_x = calc.admin_fee_x.safe_add(admin_cut)?;
                    push_delta(
                        &mut calc.band_deltas,
                        idx,
                        x_net_new.safe_add(fee_amount.safe_sub(admin_cut)?)?,
                        y_new,
                    );
                    wanted = 0;
                    calc.active_band = n;
                    break;
                }
                let x_dest = x_when_y_drained(inv, f, g)?;
                let dx = x_dest.saturating_sub(x);
                let dx_gross = wad_div_ceil(dx, one_minus_fee)?;
                let fee_amount = dx_gross.safe_sub(dx)?;
                let admin_cut = wad_mul(fee_amount, market.admin_fee)?;

                calc.out_amount = calc.out_amount.safe_add(y)?;
                calc.in_amount = calc.in_amount.safe_add(dx_gross)?;
                calc.admin_fee_x = calc.admin_fee_x.safe_add(admin_cut)?;
                push_delta(
                    &mut calc.band_deltas,
                    idx,
                    x_dest.safe_add(fee_amount.safe_sub(admin_cut)?)?,
                    0,
                );
                wanted = wanted.safe_sub(y)?;
            } else if !pump && x > 0 {
                if wanted < x {
                    let x_new = x.safe_sub(wanted)?;
                    let y_net_new = inv
                        .safe_div_ceil(U256::from(f.safe_add(x_new)?))?
                        .try_to_u128()?
                        .safe_sub(g)?;
                    let dy = y_net_new.safe_sub(y)?;
                    let dy_gross = wad_div_ceil(dy, one_minus_fee)?;
                    let fee_amount = dy_gross.safe_sub(dy)?;
                    let admin_cut = wad_mul(fee_amount, market.admin_fee)?;

                    calc.out_amount = calc.out_amount.safe_add(wanted)?;
                    calc.in_amount = calc.in_amount.safe_add(dy_gross)?;
                    calc.admin_fee_y = calc.admin_fee_y.safe_add(admin_cut)?;
                    push_delta(
                        &mut calc.band_deltas,
                        idx,
                        x_new,
                        y_net_new.safe_add(fee_amount.safe_sub(admin_cut)?)?,
                    );
                    wanted = 0;
                    calc.active_band = n;
                    break;
                }
                let y_dest = y_when_x_drained(inv, f, g)?;
                let dy = y_dest.saturating_sub(y);
                let dy_gross = wad_div_ceil(dy, one_minus_fee)?;
                let fee_amount = dy_gross.safe_sub(dy)?;
                let admin_cut = wad_mul(fee_amount, market.admin_fee)?;

                calc.out_amount = calc.out_amount.safe_add(x)?;
                calc.in_amount = calc.in_amount.safe_add(dy_gross)?;
                calc.admin_fee_y = calc.admin_fee_y.safe_add(admin_cut)?;
                push_delta(
                    &mut calc.band_deltas,
                    idx,
                    0,
                    y_dest.safe_add(fee_amount.safe_sub(admin_cut)?)?,
                );
                wanted = wanted.safe_sub(x)?;
            }
        }

        n = if pump { n.safe_add(1)? } else { n.safe_sub(1)? };
        calc.active_band = n;
        calc.ticks_crossed = calc.ticks_crossed.safe_add(1)?;
        if !market.band_in_range(n) {
            validate!(
                wanted == 0,
                ErrorCode::PriceOutsideBands,
                "swap would cross band {} outside the grid",
                n
            )?;
            calc.active_band = if pump { n.safe_sub(1)? } else { n.safe_add(1)? };
            break;
        }
    }

    validate!(
        wanted == 0,
        ErrorCode::PriceOutsideBands,
        "swap exceeded the maximum band walk"
    )?;

    Ok(calc)
}

/// Apply a staged band walk to the ledger
pub fn commit_swap(market: &mut Market, bands: &mut Bands, calc: &SwapCalc) -> CollarResult {
    for (idx, x_new, y_new) in calc.band_deltas.iter() {
        bands.x[*idx] = *x_new;
        bands.y[*idx] = *y_new;
    }
    market.active_band = calc.active_band;
    market.admin_fees_x = market.admin_fees_x.safe_add(calc.admin_fee_x)?;
    market.admin_fees_y = market.admin_fees_y.safe_add(calc.admin_fee_y)?;
    Ok(())
}

fn push_delta(deltas: &mut Vec<(usize, u128, u128)>, idx: usize, x: u128, y: u128) {
    if let Some(entry) = deltas.iter_mut().find(|(i, _, _)| *i == idx) {
        entry.1 = x;
        entry.2 = y;
    } else {
        deltas.push((idx, x, y));
    }
}

/// Raw (x, y) totals across the loan's occupied bands, no price conversion
pub fn get_sum_xy(market: &Market, bands: &Bands, loan: &Loan) -> CollarResult<(u128, u128)> {
    let mut sum_x = 0_u128;
    let mut sum_y = 0_u128;
    if !loan.has_liquidity() {
        return Ok((0, 0));
    }
    for i in 0..loan.num_ticks()? {
        let tick = loan.ticks[i as usize];
        if tick == 0 {
            continue;
        }
        let idx = market.band_index(loan.n1.safe_add(i as i32)?)?;
        let total = bands.total_shares[idx];
        sum_x = sum_x.safe_add(get_proportion_u128(bands.x[idx], tick, total)?)?;
        sum_y = sum_y.safe_add(get_proportion_u128(bands.y[idx], tick, total)?)?;
    }
    Ok((sum_x, sum_y))
}

/// Value of the position if soft liquidation ran to completion downward
/// (all collateral converted to borrowed token), at oracle price `p_oracle`.
/// Non-decreasing under trades at a fixed oracle price: fees only ever grow
/// each band's invariant.
pub fn get_x_down(
    market: &Market,
    bands: &Bands,
    loan: &Loan,
    p_oracle: u128,
) -> CollarResult<u128> {
    get_xy_up(market, bands, loan, p_oracle, false)
}

/// Collateral the position would hold if fully de-liquidated upward
pub fn get_y_up(market: &Market, bands: &Bands, loan: &Loan, p_oracle: u128) -> CollarResult<u128> {
    get_xy_up(market, bands, loan, p_oracle, true)
}

fn get_xy_up(
    market: &Market,
    bands: &Bands,
    loan: &Loan,
    p_oracle: u128,
    use_y: bool,
) -> CollarResult<u128> {
    if !loan.has_liquidity() {
        return Ok(0);
    }

    let mut total = 0_u128;
    for i in 0..loan.num_ticks()? {
        let tick = loan.ticks[i as usize];
        if tick == 0 {
            continue;
        }
        let n = loan.n1.safe_add(i as i32)?;
        let idx = market.band_index(n)?;
        let share_total = bands.total_shares[idx];
        let x = get_proportion_u128(bands.x[idx], tick, share_total)?;
        let y = get_proportion_u128(bands.y[idx], tick, share_total)?;
        if x == 0 && y == 0 {
            continue;
        }

        let p_up = p_oracle_up(market.base_price, market.amplification, n)?;
        let p_down = p_oracle_down(market.base_price, market.amplification, n)?;

        if use_y && p_oracle >= p_up {
            // band entirely above in value terms; residual x converts around
            // the geometric mean of the band top and the oracle price
            let cp = wad_sqrt_product(p_up, p_oracle)?;
            total = total.safe_add(y)?.safe_add(wad_div(x, cp)?)?;
            continue;
        }
        if !use_y && p_oracle <= p_down {
            let cp = wad_sqrt_product(p_down, p_oracle)?;
            total = total.safe_add(x)?.safe_add(wad_mul(y, cp)?)?;
            continue;
        }

        // in-band (or on the far side): run the curve to the relevant edge
        let p_c = p_oracle.max(p_down).min(p_up);
        let y0 = get_y0(x, y, p_c, p_up, market.amplification)?;
        let (f, g) = virtual_balances(y0, p_c, p_up, market.amplification)?;
        let inv = invariant(f, g, x, y)?;
        if use_y {
            total = total.safe_add(y_when_x_drained(inv, f, g)?)?;
        } else {
            total = total.safe_add(x_when_y_drained(inv, f, g)?)?;
        }
    }

    Ok(total)
}

/// Gross input that moves the AMM price to `p_target`. Returns the input
/// amount and the direction (`true` = pump: borrowed token in). The primitive
/// arbitrageurs (and the test suite) use to re-peg the AMM to the oracle.
pub fn get_amount_for_price(
    market: &Market,
    bands: &Bands,
    p_target: u128,
    p_oracle: u128,
) -> CollarResult<(u128, bool)> {
    let p_now = get_p(market, bands, p_oracle)?;
    let pump = p_target >= p_now;
    let fee = dynamic_fee(market.fee, p_now, p_oracle)?;
    let one_minus_fee = PERCENTAGE_PRECISION.safe_sub(fee)?;

    let mut amount = 0_u128;
    let mut n = market.active_band;

    for _ in 0..MAX_BAND_WALK {
        if !market.band_in_range(n) {
            break;
        }
        let idx = market.band_index(n)?;
        let x = bands.x[idx];
        let y = bands.y[idx];
        let p_up = p_oracle_up(market.base_price, market.amplification, n)?;
        let y0 = get_y0(x, y, p_oracle, p_up, market.amplification)?;

        if y0 > 0 {
            let (f, g) = virtual_balances(y0, p_oracle, p_up, market.amplification)?;
            let inv = invariant(f, g, x, y)?;

            // within a band, p = (f+x)^2 / I, so the reserve hitting p_target
            // is f+x = sqrt(p_target * I)
            let f_plus_x_target = inv
                .safe_mul(U256::from(p_target))?
                .safe_div(U256::from(PRICE_PRECISION))?
                .integer_sqrt()
                .try_to_u128()?;

            if pump {
                // highest reserve this band can reach is where y is drained
                let x_dest = x_when_y_drained(inv, f, g)?;
                let x_target = f_plus_x_target.saturating_sub(f);
                if x_target <= x_dest {
                    if x_target > x {
                        amount = amount
                            .safe_add(wad_div_ceil(x_target.safe_sub(x)?, one_minus_fee)?)?;
                    }
                    break;
                }
                if x_dest > x {
                    amount =
                        amount.safe_add(wad_div_ceil(x_dest.safe_sub(x)?, one_minus_fee)?)?;
                }
                n = n.safe_add(1)?;
            } else if f_plus_x_target >= f {
                // target sits inside this band: walk f+x down to the target
                let x_target = f_plus_x_target.safe_sub(f)?;
                if x_target < x {
                    let y_target = inv
                        .safe_div_ceil(U256::from(f.safe_add(x_target)?))?
                        .try_to_u128()?
                        .saturating_sub(g);
                    amount =
                        amount.safe_add(wad_div_ceil(y_target.safe_sub(y)?, one_minus_fee)?)?;
                }
                break;
            } else {
                // target below this band's floor: buy out all remaining x
                let y_dest = y_when_x_drained(inv, f, g)?;
                if y_dest > y {
                    amount =
                        amount.safe_add(wad_div_ceil(y_dest.safe_sub(y)?, one_minus_fee)?)?;
                }
                n = n.safe_sub(1)?;
            }
        } else {
            n = if pump { n.safe_add(1)? } else { n.safe_sub(1)? };
        }
    }

    Ok((amount, pump))
}

/// Move accumulated admin fees out of the books; token transfer is the
/// caller's responsibility.
pub fn reset_admin_fees(market: &mut Market) -> (u128, u128) {
    let fees = (market.admin_fees_x, market.admin_fees_y);
    market.admin_fees_x = 0;
    market.admin_fees_y = 0;
    fees
}

/// Average execution price of a fill
pub fn wad_avg_price(in_amount: u128, out_amount: u128) -> CollarResult<u128> {
    if out_amount == 0 {
        return Ok(0);
    }
    wad_div(in_amount, out_amount)
}

pub fn price_in_band(market: &Market, n: i32, price: u128) -> CollarResult<bool> {
    let p_up = p_oracle_up(market.base_price, market.amplification, n)?;
    let p_down = p_oracle_down(market.base_price, market.amplification, n)?;
    Ok(price <= p_up && price >= p_down)
}
