use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::controller;
use crate::controller::amm::NoOpHook;
use crate::error::ErrorCode;
use crate::instructions::constraints::*;
use crate::math::casting::Cast;
use crate::math::safe_math::SafeMath;
use crate::math::helpers::{
    token_amount_to_wad, wad_to_token_amount, wad_to_token_amount_ceil,
};
use crate::state::events::{
    BorrowRecord, RemoveCollateralRecord, RepayRecord, TokenExchangeRecord, UserStateRecord,
};
use crate::state::loan::Loan;
use crate::state::market::{Bands, Market};
use crate::state::oracle::{get_oracle_price, PriceFeed};
use crate::state::policy::RatePolicy;
use crate::state::traits::Size;
use crate::{get_then_update_id, load_mut, validate};

/// Refresh the smoothed oracle and the interest accumulator. Every
/// state-changing instruction starts here so the engine always works
/// against current prices and debt.
pub fn sync_market(
    market: &mut Market,
    price_feed: &PriceFeed,
    rate_policy: &RatePolicy,
    now: i64,
) -> anchor_lang::Result<u128> {
    let oracle = get_oracle_price(price_feed, now)?;
    let price = controller::amm::update_oracle_price(market, &oracle, now)?;
    controller::interest::accrue_interest(market, rate_policy, now)?;
    Ok(price)
}

fn emit_user_state(
    market: &Market,
    bands: &Bands,
    loan: &Loan,
    now: i64,
) -> anchor_lang::Result<()> {
    let state = controller::loan::user_state(market, bands, loan)?;
    emit!(UserStateRecord {
        ts: now,
        market: loan.market,
        user: loan.authority,
        collateral: state.collateral,
        debt: state.debt,
        n1: state.n1,
        n2: state.n2,
        liquidation_discount: market.liquidation_discount,
    });
    Ok(())
}

pub fn handle_create_loan(
    ctx: Context<CreateLoan>,
    collateral_amount: u64,
    debt_amount: u64,
    n_bands: u32,
) -> Result<()> {
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;

    let market = &mut ctx.accounts.market;
    sync_market(market, &ctx.accounts.price_feed, &ctx.accounts.rate_policy, now)?;

    let mut bands = load_mut!(ctx.accounts.bands)?;
    // load_init on a fresh account, load_mut on a closed loan being reopened
    let mut loan = match ctx.accounts.loan.load_init() {
        Ok(loan) => loan,
        Err(_) => load_mut!(ctx.accounts.loan)?,
    };
    loan.authority = *ctx.accounts.authority.key;
    loan.market = market.key();
    loan.loan_id = get_then_update_id!(market, next_loan_id);

    let collateral = token_amount_to_wad(collateral_amount, market.collateral_decimals)?;
    let debt = token_amount_to_wad(debt_amount, market.borrowed_decimals)?;

    controller::loan::create_loan(
        market,
        &mut bands,
        &mut loan,
        collateral,
        debt,
        n_bands,
        now,
        &mut NoOpHook,
    )?;

    controller::token::receive(
        &ctx.accounts.token_program,
        &ctx.accounts.user_collateral,
        &ctx.accounts.collateral_vault,
        &ctx.accounts.authority,
        collateral_amount,
    )?;
    controller::token::send_from_program_vault(
        &ctx.accounts.token_program,
        &ctx.accounts.borrowed_vault,
        &ctx.accounts.user_borrowed,
        &ctx.accounts.market_signer,
        market.signer_nonce,
        debt_amount,
    )?;

    emit!(BorrowRecord {
        ts: now,
        market: market.key(),
        user: loan.authority,
        loan_id: loan.loan_id,
        collateral_increase: collateral,
        loan_increase: debt,
    });
    emit_user_state(market, &bands, &loan, now)?;

    Ok(())
}

pub fn handle_add_collateral(ctx: Context<UpdateLoan>, amount: u64) -> Result<()> {
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;

    let market = &mut ctx.accounts.market;
    sync_market(market, &ctx.accounts.price_feed, &ctx.accounts.rate_policy, now)?;

    let mut bands = load_mut!(ctx.accounts.bands)?;
    let mut loan = load_mut!(ctx.accounts.loan)?;

    let collateral = token_amount_to_wad(amount, market.collateral_decimals)?;
    validate!(collateral > 0, ErrorCode::AmountTooLow, "Amount too low")?;

    controller::loan::adjust_loan(
        market,
        &mut bands,
        &mut loan,
        collateral.cast::<i128>()?,
        0,
        now,
        &mut NoOpHook,
    )?;

    controller::token::receive(
        &ctx.accounts.token_program,
        &ctx.accounts.user_collateral,
        &ctx.accounts.collateral_vault,
        &ctx.accounts.authority,
        amount,
    )?;

    emit!(BorrowRecord {
        ts: now,
        market: market.key(),
        user: loan.authority,
        loan_id: loan.loan_id,
        collateral_increase: collateral,
        loan_increase: 0,
    });
    emit_user_state(market, &bands, &loan, now)?;

    Ok(())
}

pub fn handle_remove_collateral(ctx: Context<UpdateLoan>, amount: u64) -> Result<()> {
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;

    let market = &mut ctx.accounts.market;
    sync_market(market, &ctx.accounts.price_feed, &ctx.accounts.rate_policy, now)?;

    let mut bands = load_mut!(ctx.accounts.bands)?;
    let mut loan = load_mut!(ctx.accounts.loan)?;

    let collateral = token_amount_to_wad(amount, market.collateral_decimals)?;
    validate!(collateral > 0, ErrorCode::AmountTooLow, "Amount too low")?;

    controller::loan::adjust_loan(
        market,
        &mut bands,
        &mut loan,
        collateral.cast::<i128>()?.safe_mul(-1)?,
        0,
        now,
        &mut NoOpHook,
    )?;

    controller::token::send_from_program_vault(
        &ctx.accounts.token_program,
        &ctx.accounts.collateral_vault,
        &ctx.accounts.user_collateral,
        &ctx.accounts.market_signer,
        market.signer_nonce,
        amount,
    )?;

    emit!(RemoveCollateralRecord {
        ts: now,
        market: market.key(),
        user: loan.authority,
        collateral_decrease: collateral,
    });
    emit_user_state(market, &bands, &loan, now)?;

    Ok(())
}

pub fn handle_borrow_more(
    ctx: Context<UpdateLoan>,
    collateral_amount: u64,
    debt_amount: u64,
) -> Result<()> {
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;

    let market = &mut ctx.accounts.market;
    sync_market(market, &ctx.accounts.price_feed, &ctx.accounts.rate_policy, now)?;

    let mut bands = load_mut!(ctx.accounts.bands)?;
    let mut loan = load_mut!(ctx.accounts.loan)?;

    let collateral = token_amount_to_wad(collateral_amount, market.collateral_decimals)?;
    let debt = token_amount_to_wad(debt_amount, market.borrowed_decimals)?;
    validate!(debt > 0, ErrorCode::AmountTooLow, "Amount too low")?;

    controller::loan::adjust_loan(
        market,
        &mut bands,
        &mut loan,
        collateral.cast::<i128>()?,
        debt,
        now,
        &mut NoOpHook,
    )?;

    if collateral_amount > 0 {
        controller::token::receive(
            &ctx.accounts.token_program,
            &ctx.accounts.user_collateral,
            &ctx.accounts.collateral_vault,
            &ctx.accounts.authority,
            collateral_amount,
        )?;
    }
    controller::token::send_from_program_vault(
        &ctx.accounts.token_program,
        &ctx.accounts.borrowed_vault,
        &ctx.accounts.user_borrowed,
        &ctx.accounts.market_signer,
        market.signer_nonce,
        debt_amount,
    )?;

    emit!(BorrowRecord {
        ts: now,
        market: market.key(),
        user: loan.authority,
        loan_id: loan.loan_id,
        collateral_increase: collateral,
        loan_increase: debt,
    });
    emit_user_state(market, &bands, &loan, now)?;

    Ok(())
}

/// Anyone may pay a loan down; freed collateral and any surplus always go
/// back to the loan's owner, never the payer.
pub fn handle_repay(ctx: Context<Repay>, amount: u64) -> Result<()> {
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;

    let market = &mut ctx.accounts.market;
    sync_market(market, &ctx.accounts.price_feed, &ctx.accounts.rate_policy, now)?;

    let mut bands = load_mut!(ctx.accounts.bands)?;
    let mut loan = load_mut!(ctx.accounts.loan)?;

    let amount_wad = token_amount_to_wad(amount, market.borrowed_decimals)?;
    let outcome = controller::loan::repay(
        market,
        &mut bands,
        &mut loan,
        amount_wad,
        now,
        &mut NoOpHook,
    )?;

    // borrowed token already sitting in the AMM offsets what the user owes
    let user_pays = outcome.debt_repaid.saturating_sub(outcome.borrowed_from_amm);
    let surplus = outcome.borrowed_from_amm.saturating_sub(outcome.debt_repaid);

    if user_pays > 0 {
        controller::token::receive(
            &ctx.accounts.token_program,
            &ctx.accounts.payer_borrowed,
            &ctx.accounts.borrowed_vault,
            &ctx.accounts.payer,
            wad_to_token_amount_ceil(user_pays, market.borrowed_decimals)?,
        )?;
    }
    if surplus > 0 {
        controller::token::send_from_program_vault(
            &ctx.accounts.token_program,
            &ctx.accounts.borrowed_vault,
            &ctx.accounts.owner_borrowed,
            &ctx.accounts.market_signer,
            market.signer_nonce,
            wad_to_token_amount(surplus, market.borrowed_decimals)?,
        )?;
    }
    if outcome.collateral_returned > 0 {
        controller::token::send_from_program_vault(
            &ctx.accounts.token_program,
            &ctx.accounts.collateral_vault,
            &ctx.accounts.owner_collateral,
            &ctx.accounts.market_signer,
            market.signer_nonce,
            wad_to_token_amount(outcome.collateral_returned, market.collateral_decimals)?,
        )?;
    }

    emit!(RepayRecord {
        ts: now,
        market: market.key(),
        user: loan.authority,
        collateral_decrease: outcome.collateral_returned,
        loan_decrease: outcome.debt_repaid,
    });
    if !outcome.closed {
        emit_user_state(market, &bands, &loan, now)?;
    }

    Ok(())
}

pub fn handle_exchange(
    ctx: Context<Exchange>,
    in_index: u32,
    out_index: u32,
    in_amount: u64,
    min_out_amount: u64,
) -> Result<()> {
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;

    validate!(
        in_index != out_index && in_index < 2 && out_index < 2,
        ErrorCode::SameCoins,
        "bad token indices {} {}",
        in_index,
        out_index
    )?;

    let market = &mut ctx.accounts.market;
    let price = sync_market(market, &ctx.accounts.price_feed, &ctx.accounts.rate_policy, now)?;

    let mut bands = load_mut!(ctx.accounts.bands)?;

    // index 0 is the borrowed token: selling it pumps the AMM price upward
    let pump = in_index == 0;
    let (in_decimals, out_decimals) = if pump {
        (market.borrowed_decimals, market.collateral_decimals)
    } else {
        (market.collateral_decimals, market.borrowed_decimals)
    };

    let in_wad = token_amount_to_wad(in_amount, in_decimals)?;
    let calc = controller::amm::calc_swap_out(market, &bands, pump, in_wad, price)?;
    validate!(!calc.is_empty(), ErrorCode::NoLiquidity, "nothing to trade")?;

    let out_tokens = wad_to_token_amount(calc.out_amount, out_decimals)?;
    validate!(
        out_tokens >= min_out_amount,
        ErrorCode::SlippageOutsideLimit,
        "out {} below min {}",
        out_tokens,
        min_out_amount
    )?;

    let avg_price = controller::amm::wad_avg_price(calc.in_amount, calc.out_amount)?;
    let tokens_sold = calc.in_amount;
    let tokens_bought = calc.out_amount;
    controller::amm::commit_swap(market, &mut bands, &calc)?;

    let (from_user, to_user, in_vault, out_vault) = if pump {
        (
            &ctx.accounts.user_borrowed,
            &ctx.accounts.user_collateral,
            &ctx.accounts.borrowed_vault,
            &ctx.accounts.collateral_vault,
        )
    } else {
        (
            &ctx.accounts.user_collateral,
            &ctx.accounts.user_borrowed,
            &ctx.accounts.collateral_vault,
            &ctx.accounts.borrowed_vault,
        )
    };
    controller::token::receive(
        &ctx.accounts.token_program,
        from_user,
        in_vault,
        &ctx.accounts.authority,
        in_amount,
    )?;
    controller::token::send_from_program_vault(
        &ctx.accounts.token_program,
        out_vault,
        to_user,
        &ctx.accounts.market_signer,
        market.signer_nonce,
        out_tokens,
    )?;

    emit!(TokenExchangeRecord {
        ts: now,
        market: market.key(),
        buyer: *ctx.accounts.authority.key,
        sold_id: in_index,
        tokens_sold,
        bought_id: out_index,
        tokens_bought,
        avg_price,
        active_band_after: market.active_band,
    });

    Ok(())
}

pub fn handle_exchange_dy(
    ctx: Context<Exchange>,
    in_index: u32,
    out_index: u32,
    out_amount: u64,
    max_in_amount: u64,
) -> Result<()> {
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;

    validate!(
        in_index != out_index && in_index < 2 && out_index < 2,
        ErrorCode::SameCoins,
        "bad token indices {} {}",
        in_index,
        out_index
    )?;

    let market = &mut ctx.accounts.market;
    let price = sync_market(market, &ctx.accounts.price_feed, &ctx.accounts.rate_policy, now)?;

    let mut bands = load_mut!(ctx.accounts.bands)?;

    let pump = in_index == 0;
    let (in_decimals, out_decimals) = if pump {
        (market.borrowed_decimals, market.collateral_decimals)
    } else {
        (market.collateral_decimals, market.borrowed_decimals)
    };

    let out_wad = token_amount_to_wad(out_amount, out_decimals)?;
    let calc = controller::amm::calc_swap_in(market, &bands, pump, out_wad, price)?;
    validate!(!calc.is_empty(), ErrorCode::NoLiquidity, "nothing to trade")?;

    let in_tokens = wad_to_token_amount_ceil(calc.in_amount, in_decimals)?;
    validate!(
        in_tokens <= max_in_amount,
        ErrorCode::SlippageOutsideLimit,
        "in {} above max {}",
        in_tokens,
        max_in_amount
    )?;

    let avg_price = controller::amm::wad_avg_price(calc.in_amount, calc.out_amount)?;
    let tokens_sold = calc.in_amount;
    let tokens_bought = calc.out_amount;
    controller::amm::commit_swap(market, &mut bands, &calc)?;

    let (from_user, to_user, in_vault, out_vault) = if pump {
        (
            &ctx.accounts.user_borrowed,
            &ctx.accounts.user_collateral,
            &ctx.accounts.borrowed_vault,
            &ctx.accounts.collateral_vault,
        )
    } else {
        (
            &ctx.accounts.user_collateral,
            &ctx.accounts.user_borrowed,
            &ctx.accounts.collateral_vault,
            &ctx.accounts.borrowed_vault,
        )
    };
    controller::token::receive(
        &ctx.accounts.token_program,
        from_user,
        in_vault,
        &ctx.accounts.authority,
        in_tokens,
    )?;
    controller::token::send_from_program_vault(
        &ctx.accounts.token_program,
        out_vault,
        to_user,
        &ctx.accounts.market_signer,
        market.signer_nonce,
        out_amount,
    )?;

    emit!(TokenExchangeRecord {
        ts: now,
        market: market.key(),
        buyer: *ctx.accounts.authority.key,
        sold_id: in_index,
        tokens_sold,
        bought_id: out_index,
        tokens_bought,
        avg_price,
        active_band_after: market.active_band,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct CreateLoan<'info> {
    #[account(
        mut,
        has_one = price_feed,
        has_one = rate_policy,
        has_one = collateral_vault,
        has_one = borrowed_vault
    )]
    pub market: Box<Account<'info, Market>>,
    #[account(
        mut,
        constraint = is_bands_for_market(&bands, &market.key())?
    )]
    pub bands: AccountLoader<'info, Bands>,
    /// Survives full repayment and liquidation so the same authority can
    /// open a fresh loan without reallocating
    #[account(
        init_if_needed,
        seeds = [b"loan", market.key().as_ref(), authority.key().as_ref()],
        bump,
        payer = authority,
        space = Loan::SIZE
    )]
    pub loan: AccountLoader<'info, Loan>,
    pub price_feed: Box<Account<'info, PriceFeed>>,
    pub rate_policy: Box<Account<'info, RatePolicy>>,
    #[account(mut)]
    pub collateral_vault: Box<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub borrowed_vault: Box<Account<'info, TokenAccount>>,
    #[account(
        mut,
        token::mint = market.collateral_mint
    )]
    pub user_collateral: Box<Account<'info, TokenAccount>>,
    #[account(
        mut,
        token::mint = market.borrowed_mint
    )]
    pub user_borrowed: Box<Account<'info, TokenAccount>>,
    /// CHECK: vault authority PDA
    #[account(
        seeds = [b"collar_signer".as_ref()],
        bump = market.signer_nonce
    )]
    pub market_signer: AccountInfo<'info>,
    #[account(mut)]
    pub authority: Signer<'info>,
    pub rent: Sysvar<'info, Rent>,
    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct UpdateLoan<'info> {
    #[account(
        mut,
        has_one = price_feed,
        has_one = rate_policy,
        has_one = collateral_vault,
        has_one = borrowed_vault
    )]
    pub market: Box<Account<'info, Market>>,
    #[account(
        mut,
        constraint = is_bands_for_market(&bands, &market.key())?
    )]
    pub bands: AccountLoader<'info, Bands>,
    #[account(
        mut,
        constraint = is_loan_for_market(&loan, &market.key())?,
        constraint = can_sign_for_loan(&loan, &authority)?
    )]
    pub loan: AccountLoader<'info, Loan>,
    pub price_feed: Box<Account<'info, PriceFeed>>,
    pub rate_policy: Box<Account<'info, RatePolicy>>,
    #[account(mut)]
    pub collateral_vault: Box<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub borrowed_vault: Box<Account<'info, TokenAccount>>,
    #[account(
        mut,
        token::mint = market.collateral_mint
    )]
    pub user_collateral: Box<Account<'info, TokenAccount>>,
    #[account(
        mut,
        token::mint = market.borrowed_mint
    )]
    pub user_borrowed: Box<Account<'info, TokenAccount>>,
    /// CHECK: vault authority PDA
    #[account(
        seeds = [b"collar_signer".as_ref()],
        bump = market.signer_nonce
    )]
    pub market_signer: AccountInfo<'info>,
    pub authority: Signer<'info>,
    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct Repay<'info> {
    #[account(
        mut,
        has_one = price_feed,
        has_one = rate_policy,
        has_one = collateral_vault,
        has_one = borrowed_vault
    )]
    pub market: Box<Account<'info, Market>>,
    #[account(
        mut,
        constraint = is_bands_for_market(&bands, &market.key())?
    )]
    pub bands: AccountLoader<'info, Bands>,
    #[account(
        mut,
        seeds = [b"loan", market.key().as_ref(), loan_authority.key().as_ref()],
        bump,
        constraint = is_loan_for_market(&loan, &market.key())?,
        constraint = is_loan_for_authority(&loan, loan_authority.key)?
    )]
    pub loan: AccountLoader<'info, Loan>,
    /// CHECK: owner of the loan being repaid, pinned by the loan PDA seeds;
    /// receives freed collateral and any surplus
    pub loan_authority: AccountInfo<'info>,
    pub price_feed: Box<Account<'info, PriceFeed>>,
    pub rate_policy: Box<Account<'info, RatePolicy>>,
    #[account(mut)]
    pub collateral_vault: Box<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub borrowed_vault: Box<Account<'info, TokenAccount>>,
    #[account(
        mut,
        token::mint = market.collateral_mint,
        token::authority = loan_authority
    )]
    pub owner_collateral: Box<Account<'info, TokenAccount>>,
    #[account(
        mut,
        token::mint = market.borrowed_mint,
        token::authority = loan_authority
    )]
    pub owner_borrowed: Box<Account<'info, TokenAccount>>,
    #[account(
        mut,
        token::mint = market.borrowed_mint
    )]
    pub payer_borrowed: Box<Account<'info, TokenAccount>>,
    /// CHECK: vault authority PDA
    #[account(
        seeds = [b"collar_signer".as_ref()],
        bump = market.signer_nonce
    )]
    pub market_signer: AccountInfo<'info>,
    pub payer: Signer<'info>,
    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct Exchange<'info> {
    #[account(
        mut,
        has_one = price_feed,
        has_one = rate_policy,
        has_one = collateral_vault,
        has_one = borrowed_vault
    )]
    pub market: Box<Account<'info, Market>>,
    #[account(
        mut,
        constraint = is_bands_for_market(&bands, &market.key())?
    )]
    pub bands: AccountLoader<'info, Bands>,
    pub price_feed: Box<Account<'info, PriceFeed>>,
    pub rate_policy: Box<Account<'info, RatePolicy>>,
    #[account(mut)]
    pub collateral_vault: Box<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub borrowed_vault: Box<Account<'info, TokenAccount>>,
    #[account(
        mut,
        token::mint = market.collateral_mint
    )]
    pub user_collateral: Box<Account<'info, TokenAccount>>,
    #[account(
        mut,
        token::mint = market.borrowed_mint
    )]
    pub user_borrowed: Box<Account<'info, TokenAccount>>,
    /// CHECK: vault authority PDA
    #[account(
        seeds = [b"collar_signer".as_ref()],
        bump = market.signer_nonce
    )]
    pub market_signer: AccountInfo<'info>,
    pub authority: Signer<'info>,
    pub token_program: Program<'info, Token>,
}
