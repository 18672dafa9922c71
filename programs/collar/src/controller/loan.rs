use anchor_lang::prelude::*;
use solana_program::msg;

use crate::controller::amm::{self, LiquidityMiningHook};
use crate::error::{CollarResult, ErrorCode};
use crate::math::bands::p_oracle_up;
use crate::math::casting::Cast;
use crate::math::constants::{MIN_LOAN_DEBT, PERCENTAGE_PRECISION, PRICE_PRECISION_I128};
use crate::math::helpers::{wad_div, wad_mul};
use crate::math::loan::{calculate_debt_n1, min_collateral, validate_band_count};
use crate::math::safe_math::SafeMath;
use crate::state::loan::Loan;
use crate::state::market::{Bands, Market};
use crate::validate;


/// Live view of a position, the `user_state` read
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct UserState {
    pub collateral: u128,
    pub borrowed: u128,
    pub debt: u128,
    pub n1: i32,
    pub n2: i32,
}

pub fn user_state(
    market: &Market,
    bands: &Bands,
    loan: &Loan,
) -> CollarResult<UserState> {
    let (borrowed, collateral) = amm::get_sum_xy(market, bands, loan)?;
    Ok(UserState {
        collateral,
        borrowed,
        debt: loan.current_debt(market.rate_mul)?,
        n1: loan.n1,
        n2: loan.n2,
    })
}

/// Solvency score as a signed wad: positive means the liquidation-adjusted
/// value of the position exceeds its debt. The liquidation discount is
/// already embedded, so hard liquidation triggers at zero.
///
/// `full` also credits collateral value sitting above the liquidation range
/// (worst case within the current band is what the non-full variant prices).
pub fn health(
    market: &Market,
    bands: &Bands,
    loan: &Loan,
    p_oracle: u128,
    full: bool,
) -> CollarResult<i128> {
    let debt = loan.current_debt(market.rate_mul)?;
    validate!(debt > 0, ErrorCode::ZeroDebtHealth, "health of a zero-debt loan")?;

    let x_down = amm::get_x_down(market, bands, loan, p_oracle)?;
    let discounted = wad_mul(
        x_down,
        PERCENTAGE_PRECISION.safe_sub(market.liquidation_discount)?,
    )?;
    let mut health = wad_div(discounted, debt)?
        .cast::<i128>()?
        .safe_sub(PRICE_PRECISION_I128)?;

    if full {
        let p_up_n1 = p_oracle_up(market.base_price, market.amplification, loan.n1)?;
        if p_oracle > p_up_n1 {
            // whole range is below the price: add the undiscounted premium
            let (_, collateral) = amm::get_sum_xy(market, bands, loan)?;
            let premium = wad_mul(p_oracle.safe_sub(p_up_n1)?, collateral)?;
            health = health.safe_add(wad_div(premium, debt)?.cast::<i128>()?)?;
        }
    }

    Ok(health)
}

/// Open a new position: place collateral into a freshly computed band range
/// and record the debt. Token movement is the caller's concern.
#[allow(clippy::too_many_arguments)]
pub fn create_loan<H: LiquidityMiningHook>(
    market: &mut Market,
    bands: &mut Bands,
    loan: &mut Loan,
    collateral: u128,
    debt: u128,
    n: u32,
    now: i64,
    hook: &mut H,
) -> CollarResult {
    validate!(
        !loan.exists(),
        ErrorCode::LoanAlreadyCreated,
        "Loan already created"
    )?;
    validate_band_count(n)?;
    validate!(
        debt >= MIN_LOAN_DEBT,
        ErrorCode::AmountTooLow,
        "Amount too low"
    )?;
    validate!(
        market.total_debt.safe_add(debt)? <= market.debt_ceiling,
        ErrorCode::DebtCeilingExceeded,
        "total debt {} + {} over ceiling {}",
        market.total_debt,
        debt,
        market.debt_ceiling
    )?;

    let n1 = calculate_debt_n1(market, collateral, debt, n)?;
    let n2 = n1.safe_add(n as i32)?.safe_sub(1)?;

    amm::deposit_range(market, bands, loan, collateral, n1, n2, hook)?;

    loan.debt = debt;
    loan.rate_mul = market.rate_mul;
    loan.last_update_ts = now;

    market.total_debt = market.total_debt.safe_add(debt)?;
    market.n_loans = market.n_loans.safe_add(1)?;
    Ok(())
}

/// Shared path for add_collateral / remove_collateral / borrow_more: all
/// re-place the whole position. Only permitted while the position has no
/// borrowed-token component (not under soft liquidation).
#[allow(clippy::too_many_arguments)]
pub fn adjust_loan<H: LiquidityMiningHook>(
    market: &mut Market,
    bands: &mut Bands,
    loan: &mut Loan,
    d_collateral: i128,
    d_debt: u128,
    now: i64,
    hook: &mut H,
) -> CollarResult {
    validate!(loan.exists(), ErrorCode::LoanDoesNotExist, "no open loan")?;
    let n = loan.num_ticks()?;
    let debt = loan.current_debt(market.rate_mul)?;

    let (x_amm, _) = amm::get_sum_xy(market, bands, loan)?;
    validate!(
        x_amm == 0,
        ErrorCode::UnderSoftLiquidation,
        "position holds borrowed token, adjustments are frozen"
    )?;

    let withdrawn = amm::withdraw(market, bands, loan, PERCENTAGE_PRECISION, hook)?;
    let collateral = if d_collateral >= 0 {
        withdrawn
            .collateral
            .safe_add(d_collateral.unsigned_abs())?
    } else {
        withdrawn
            .collateral
            .safe_sub(d_collateral.unsigned_abs())?
    };
    let new_debt = debt.safe_add(d_debt)?;

    if d_collateral < 0 {
        validate!(
            collateral >= min_collateral(market, new_debt, n)?,
            ErrorCode::CollateralBelowMinimum,
            "remaining collateral below minimum"
        )?;
    }
    if d_debt > 0 {
        validate!(
            market.total_debt.safe_add(d_debt)? <= market.debt_ceiling,
            ErrorCode::DebtCeilingExceeded,
            "debt ceiling exceeded"
        )?;
    }

    let n1 = calculate_debt_n1(market, collateral, new_debt, n)?;
    let n2 = n1.safe_add(n as i32)?.safe_sub(1)?;
    amm::deposit_range(market, bands, loan, collateral, n1, n2, hook)?;

    loan.debt = new_debt;
    loan.rate_mul = market.rate_mul;
    loan.last_update_ts = now;
    market.total_debt = market.total_debt.safe_add(d_debt)?;
    Ok(())
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RepayOutcome {
    /// debt extinguished, wad
    pub debt_repaid: u128,
    /// collateral leaving the AMM back to the user, wad
    pub collateral_returned: u128,
    /// borrowed token already held by the AMM that offsets repayment, wad
    pub borrowed_from_amm: u128,
    pub closed: bool,
}

/// Repay `amount` of debt. Full repayment withdraws the AMM position and
/// closes the loan. A partial repayment re-places the bands deeper when the
/// position is untouched by soft liquidation, and leaves the bands alone when
/// it is already straddling (moving them would realize losses).
pub fn repay<H: LiquidityMiningHook>(
    market: &mut Market,
    bands: &mut Bands,
    loan: &mut Loan,
    amount: u128,
    now: i64,
    hook: &mut H,
) -> CollarResult<RepayOutcome> {
    validate!(loan.exists(), ErrorCode::LoanDoesNotExist, "no open loan")?;
    validate!(amount > 0, ErrorCode::AmountTooLow, "Amount too low")?;

    let debt = loan.current_debt(market.rate_mul)?;

    if amount >= debt {
        let withdrawn = amm::withdraw(market, bands, loan, PERCENTAGE_PRECISION, hook)?;
        loan.clear();
        loan.rate_mul = market.rate_mul;
        loan.last_update_ts = now;
        market.total_debt = market.total_debt.saturating_sub(debt);
        market.n_loans = market.n_loans.safe_sub(1)?;
        return Ok(RepayOutcome {
            debt_repaid: debt,
            collateral_returned: withdrawn.collateral,
            borrowed_from_amm: withdrawn.borrowed,
            closed: true,
        });
    }

    let new_debt = debt.safe_sub(amount)?;
    let (x_amm, _) = amm::get_sum_xy(market, bands, loan)?;

    if x_amm == 0 {
        // healthy: move the smaller debt deeper under the price
        let n = loan.num_ticks()?;
        let withdrawn = amm::withdraw(market, bands, loan, PERCENTAGE_PRECISION, hook)?;
        let n1 = calculate_debt_n1(market, withdrawn.collateral, new_debt, n)?;
        let n2 = n1.safe_add(n as i32)?.safe_sub(1)?;
        amm::deposit_range(market, bands, loan, withdrawn.collateral, n1, n2, hook)?;
    }

    loan.debt = new_debt;
    loan.rate_mul = market.rate_mul;
    loan.last_update_ts = now;
    market.total_debt = market.total_debt.saturating_sub(amount);

    Ok(RepayOutcome {
        debt_repaid: amount,
        collateral_returned: 0,
        borrowed_from_amm: 0,
        closed: false,
    })
}
