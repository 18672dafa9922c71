use solana_program::msg;

use crate::controller::amm::{self, LiquidityMiningHook};
use crate::controller::loan::health;
use crate::error::{CollarResult, ErrorCode};
use crate::math::constants::PERCENTAGE_PRECISION;
use crate::math::helpers::get_proportion_u128;
use crate::math::safe_math::SafeMath;
use crate::state::loan::Loan;
use crate::state::market::{Bands, Market};
use crate::validate;


/// Counterparty that turns seized collateral into the borrowed token during
/// an extended liquidation. `on_liquidate` receives the collateral being
/// handed over and the shortfall it must cover; it reports how much borrowed
/// token it produced. The caller verifies the report against vault balances,
/// a lying callback fails the whole liquidation.
pub trait LiquidationCallback {
    fn on_liquidate(
        &mut self,
        collateral: u128,
        debt_needed: u128,
    ) -> CollarResult<u128>;
}

/// Plain liquidation: the liquidator funds the shortfall from their own
/// balance and no callback runs.
pub struct NoCallback;

impl LiquidationCallback for NoCallback {
    fn on_liquidate(&mut self, _collateral: u128, _debt_needed: u128) -> CollarResult<u128> {
        Ok(0)
    }
}

pub struct LiquidationOutcome {
    /// debt extinguished, wad
    pub debt_repaid: u128,
    /// borrowed token recovered from the position's own bands, wad
    pub borrowed_from_amm: u128,
    /// borrowed token the liquidator must supply on top, wad
    pub borrowed_needed: u128,
    /// collateral handed to the liquidator, wad
    pub collateral_seized: u128,
    pub closed: bool,
}

/// Liquidate `frac` (wad fraction) of a position. A third party may only act
/// on negative health; the owner may self-liquidate at any health. The
/// position's soft-liquidated borrowed token offsets the repayment, the rest
/// (`borrowed_needed`) comes from the liquidator, who receives all withdrawn
/// collateral in exchange.
#[allow(clippy::too_many_arguments)]
pub fn liquidate<H: LiquidityMiningHook, C: LiquidationCallback>(
    market: &mut Market,
    bands: &mut Bands,
    loan: &mut Loan,
    frac: u128,
    min_x: u128,
    is_self: bool,
    now: i64,
    hook: &mut H,
    callback: &mut C,
) -> CollarResult<LiquidationOutcome> {
    validate!(loan.exists(), ErrorCode::LoanDoesNotExist, "no open loan")?;
    validate!(
        frac > 0 && frac <= PERCENTAGE_PRECISION,
        ErrorCode::InvalidLiquidationFraction,
        "fraction {} outside (0, 1e18]",
        frac
    )?;

    if !is_self {
        let h = health(market, bands, loan, market.oracle_price, true)?;
        validate!(
            h < 0,
            ErrorCode::SufficientHealth,
            "health {} is not negative",
            h
        )?;
    }

    let debt = loan.current_debt(market.rate_mul)?;
    let debt_portion = get_proportion_u128(debt, frac, PERCENTAGE_PRECISION)?;

    let withdrawn = amm::withdraw(market, bands, loan, frac, hook)?;
    validate!(
        withdrawn.borrowed >= min_x,
        ErrorCode::SlippageOutsideLimit,
        "recovered {} below min_x {}",
        withdrawn.borrowed,
        min_x
    )?;

    let borrowed_needed = debt_portion.saturating_sub(withdrawn.borrowed);
    if borrowed_needed > 0 && withdrawn.collateral > 0 {
        validate!(
            !market.in_callback,
            ErrorCode::ReentrancyGuard,
            "nested liquidation callback"
        )?;
        // two-phase: collateral is released to the callback first, the
        // instruction layer verifies the produced amount against vaults
        market.in_callback = true;
        let produced = callback.on_liquidate(withdrawn.collateral, borrowed_needed)?;
        market.in_callback = false;
        validate!(
            produced == 0 || produced >= borrowed_needed,
            ErrorCode::CallbackShortfall,
            "callback produced {} of {} needed",
            produced,
            borrowed_needed
        )?;
    }

    let closed = frac == PERCENTAGE_PRECISION;
    if closed {
        loan.clear();
        loan.rate_mul = market.rate_mul;
        loan.last_update_ts = now;
        market.total_debt = market.total_debt.saturating_sub(debt);
        market.n_loans = market.n_loans.safe_sub(1)?;
    } else {
        loan.debt = debt.safe_sub(debt_portion)?;
        loan.rate_mul = market.rate_mul;
        loan.last_update_ts = now;
        market.total_debt = market.total_debt.saturating_sub(debt_portion);
    }

    Ok(LiquidationOutcome {
        debt_repaid: debt_portion,
        borrowed_from_amm: withdrawn.borrowed,
        borrowed_needed,
        collateral_seized: withdrawn.collateral,
        closed,
    })
}

/// Borrowed token a liquidator must bring to liquidate `frac` of the loan,
/// net of what soft liquidation already converted. The quote keepers use
/// before acting.
pub fn tokens_to_liquidate(
    market: &Market,
    bands: &Bands,
    loan: &Loan,
    frac: u128,
) -> CollarResult<u128> {
    let debt = loan.current_debt(market.rate_mul)?;
    let debt_portion = get_proportion_u128(debt, frac, PERCENTAGE_PRECISION)?;
    let (x_amm, _) = amm::get_sum_xy(market, bands, loan)?;
    let x_portion = get_proportion_u128(x_amm, frac, PERCENTAGE_PRECISION)?;
    Ok(debt_portion.saturating_sub(x_portion))
}
