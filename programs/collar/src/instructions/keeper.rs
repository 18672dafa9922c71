use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};
use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::program::invoke;

use crate::controller;
use crate::controller::amm::NoOpHook;
use crate::controller::liquidation::{LiquidationCallback, NoCallback};
use crate::error::{CollarResult, ErrorCode};
use crate::instructions::constraints::*;
use crate::instructions::user::sync_market;
use crate::math::helpers::{
    token_amount_to_wad, wad_to_token_amount, wad_to_token_amount_ceil,
};
use crate::state::events::{InterestAccrualRecord, LiquidationKind, LiquidationRecord};
use crate::state::loan::Loan;
use crate::state::market::{Bands, Market};
use crate::state::oracle::PriceFeed;
use crate::state::policy::RatePolicy;
use crate::{load_mut, validate};

pub fn handle_liquidate(ctx: Context<Liquidate>, frac: u128, min_x: u64) -> Result<()> {
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;

    let market = &mut ctx.accounts.market;
    sync_market(market, &ctx.accounts.price_feed, &ctx.accounts.rate_policy, now)?;

    let mut bands = load_mut!(ctx.accounts.bands)?;
    let mut loan = load_mut!(ctx.accounts.loan)?;

    let is_self = loan.authority.eq(ctx.accounts.liquidator.key);
    let min_x_wad = token_amount_to_wad(min_x, market.borrowed_decimals)?;

    let outcome = controller::liquidation::liquidate(
        market,
        &mut bands,
        &mut loan,
        frac,
        min_x_wad,
        is_self,
        now,
        &mut NoOpHook,
        &mut NoCallback,
    )?;

    if outcome.borrowed_needed > 0 {
        controller::token::receive(
            &ctx.accounts.token_program,
            &ctx.accounts.liquidator_borrowed,
            &ctx.accounts.borrowed_vault,
            &ctx.accounts.liquidator,
            wad_to_token_amount_ceil(outcome.borrowed_needed, market.borrowed_decimals)?,
        )?;
    }
    if outcome.collateral_seized > 0 {
        controller::token::send_from_program_vault(
            &ctx.accounts.token_program,
            &ctx.accounts.collateral_vault,
            &ctx.accounts.liquidator_collateral,
            &ctx.accounts.market_signer,
            market.signer_nonce,
            wad_to_token_amount(outcome.collateral_seized, market.collateral_decimals)?,
        )?;
    }

    emit!(LiquidationRecord {
        ts: now,
        market: market.key(),
        user: loan.authority,
        liquidator: *ctx.accounts.liquidator.key,
        collateral_received: outcome.collateral_seized,
        stablecoin_received: outcome.borrowed_from_amm,
        debt: outcome.debt_repaid,
        kind: if is_self {
            LiquidationKind::SelfLiquidation
        } else {
            LiquidationKind::Hard
        },
    });

    Ok(())
}

pub fn handle_liquidate_with_callback<'c: 'info, 'info>(
    ctx: Context<'_, '_, 'c, 'info, LiquidateWithCallback<'info>>,
    frac: u128,
    min_x: u64,
    callback_data: Vec<u8>,
) -> Result<()> {
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;

    let market = &mut ctx.accounts.market;
    sync_market(market, &ctx.accounts.price_feed, &ctx.accounts.rate_policy, now)?;

    let mut bands = load_mut!(ctx.accounts.bands)?;
    let mut loan = load_mut!(ctx.accounts.loan)?;

    let is_self = loan.authority.eq(ctx.accounts.liquidator.key);
    let min_x_wad = token_amount_to_wad(min_x, market.borrowed_decimals)?;
    let signer_nonce = market.signer_nonce;
    let collateral_decimals = market.collateral_decimals;
    let borrowed_decimals = market.borrowed_decimals;

    let mut callback = CpiLiquidationCallback {
        token_program: &ctx.accounts.token_program,
        collateral_vault: &ctx.accounts.collateral_vault,
        callbacker_collateral: &ctx.accounts.callbacker_collateral,
        borrowed_vault: &mut ctx.accounts.borrowed_vault,
        market_signer: &ctx.accounts.market_signer,
        signer_nonce,
        collateral_decimals,
        borrowed_decimals,
        callback_program: &ctx.accounts.callback_program,
        callback_accounts: ctx.remaining_accounts,
        callback_data,
        produced: 0,
    };

    let outcome = controller::liquidation::liquidate(
        market,
        &mut bands,
        &mut loan,
        frac,
        min_x_wad,
        is_self,
        now,
        &mut NoOpHook,
        &mut callback,
    )?;
    let produced = callback.produced;

    if produced == 0 {
        // callback never ran; settle like a plain liquidation
        if outcome.borrowed_needed > 0 {
            controller::token::receive(
                &ctx.accounts.token_program,
                &ctx.accounts.liquidator_borrowed,
                &ctx.accounts.borrowed_vault,
                &ctx.accounts.liquidator,
                wad_to_token_amount_ceil(outcome.borrowed_needed, borrowed_decimals)?,
            )?;
        }
        if outcome.collateral_seized > 0 {
            controller::token::send_from_program_vault(
                &ctx.accounts.token_program,
                &ctx.accounts.collateral_vault,
                &ctx.accounts.liquidator_collateral,
                &ctx.accounts.market_signer,
                signer_nonce,
                wad_to_token_amount(outcome.collateral_seized, collateral_decimals)?,
            )?;
        }
    } else {
        // collateral already went to the callbacker; refund what it produced
        // beyond the shortfall
        let excess = produced.saturating_sub(outcome.borrowed_needed);
        if excess > 0 {
            controller::token::send_from_program_vault(
                &ctx.accounts.token_program,
                &ctx.accounts.borrowed_vault,
                &ctx.accounts.liquidator_borrowed,
                &ctx.accounts.market_signer,
                signer_nonce,
                wad_to_token_amount(excess, borrowed_decimals)?,
            )?;
        }
    }

    emit!(LiquidationRecord {
        ts: now,
        market: market.key(),
        user: loan.authority,
        liquidator: *ctx.accounts.liquidator.key,
        collateral_received: outcome.collateral_seized,
        stablecoin_received: outcome.borrowed_from_amm,
        debt: outcome.debt_repaid,
        kind: if is_self {
            LiquidationKind::SelfLiquidation
        } else {
            LiquidationKind::Hard
        },
    });

    Ok(())
}

pub fn handle_accrue_interest(ctx: Context<AccrueInterest>) -> Result<()> {
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;

    let market = &mut ctx.accounts.market;
    sync_market(market, &ctx.accounts.price_feed, &ctx.accounts.rate_policy, now)?;

    emit!(InterestAccrualRecord {
        ts: now,
        market: market.key(),
        rate: market.rate,
        rate_mul: market.rate_mul,
        total_debt: market.total_debt,
    });

    Ok(())
}

/// Liquidation counterparty driven over CPI. Collateral is pushed to the
/// callbacker first, then its program runs with the caller-supplied accounts,
/// and the borrowed vault's balance delta is what counts as produced, not
/// anything the callback claims.
struct CpiLiquidationCallback<'a, 'info> {
    token_program: &'a Program<'info, Token>,
    collateral_vault: &'a Account<'info, TokenAccount>,
    callbacker_collateral: &'a Account<'info, TokenAccount>,
    borrowed_vault: &'a mut Account<'info, TokenAccount>,
    market_signer: &'a AccountInfo<'info>,
    signer_nonce: u8,
    collateral_decimals: u8,
    borrowed_decimals: u8,
    callback_program: &'a AccountInfo<'info>,
    callback_accounts: &'a [AccountInfo<'info>],
    callback_data: Vec<u8>,
    produced: u128,
}

impl<'a, 'info> LiquidationCallback for CpiLiquidationCallback<'a, 'info> {
    fn on_liquidate(&mut self, collateral: u128, debt_needed: u128) -> CollarResult<u128> {
        controller::token::send_from_program_vault(
            self.token_program,
            self.collateral_vault,
            self.callbacker_collateral,
            self.market_signer,
            self.signer_nonce,
            wad_to_token_amount(collateral, self.collateral_decimals)?,
        )
        .map_err(|_| ErrorCode::TokenTransferFailed)?;

        let balance_before = self.borrowed_vault.amount;

        let metas: Vec<AccountMeta> = self
            .callback_accounts
            .iter()
            .map(|a| AccountMeta {
                pubkey: *a.key,
                is_signer: a.is_signer,
                is_writable: a.is_writable,
            })
            .collect();
        let instruction = Instruction {
            program_id: *self.callback_program.key,
            accounts: metas,
            data: self.callback_data.clone(),
        };
        invoke(&instruction, self.callback_accounts).map_err(|e| {
            msg!("liquidation callback failed: {:?}", e);
            ErrorCode::CallbackShortfall
        })?;

        self.borrowed_vault
            .reload()
            .map_err(|_| ErrorCode::UnableToLoadAccountLoader)?;
        let received = self.borrowed_vault.amount.saturating_sub(balance_before);
        self.produced = token_amount_to_wad(received, self.borrowed_decimals)?;

        validate!(
            self.produced >= debt_needed,
            ErrorCode::CallbackShortfall,
            "callback deposited {} of {} needed",
            self.produced,
            debt_needed
        )?;
        Ok(self.produced)
    }
}

#[derive(Accounts)]
pub struct Liquidate<'info> {
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
        constraint = is_loan_for_market(&loan, &market.key())?
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
    pub liquidator_collateral: Box<Account<'info, TokenAccount>>,
    #[account(
        mut,
        token::mint = market.borrowed_mint
    )]
    pub liquidator_borrowed: Box<Account<'info, TokenAccount>>,
    /// CHECK: vault authority PDA
    #[account(
        seeds = [b"collar_signer".as_ref()],
        bump = market.signer_nonce
    )]
    pub market_signer: AccountInfo<'info>,
    pub liquidator: Signer<'info>,
    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct LiquidateWithCallback<'info> {
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
        constraint = is_loan_for_market(&loan, &market.key())?
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
    pub liquidator_collateral: Box<Account<'info, TokenAccount>>,
    #[account(
        mut,
        token::mint = market.borrowed_mint
    )]
    pub liquidator_borrowed: Box<Account<'info, TokenAccount>>,
    #[account(
        mut,
        token::mint = market.collateral_mint
    )]
    pub callbacker_collateral: Box<Account<'info, TokenAccount>>,
    /// CHECK: arbitrary program chosen by the liquidator, invoked with the
    /// remaining accounts
    pub callback_program: AccountInfo<'info>,
    /// CHECK: vault authority PDA
    #[account(
        seeds = [b"collar_signer".as_ref()],
        bump = market.signer_nonce
    )]
    pub market_signer: AccountInfo<'info>,
    pub liquidator: Signer<'info>,
    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct AccrueInterest<'info> {
    #[account(
        mut,
        has_one = price_feed,
        has_one = rate_policy
    )]
    pub market: Box<Account<'info, Market>>,
    pub price_feed: Box<Account<'info, PriceFeed>>,
    pub rate_policy: Box<Account<'info, RatePolicy>>,
}
