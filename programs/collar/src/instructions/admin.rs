use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::controller;
use crate::error::ErrorCode;
use crate::instructions::constraints::*;
use crate::math::constants::{MAX_BANDS, PERCENTAGE_PRECISION};
use crate::math::helpers::wad_to_token_amount;
use crate::state::events::{CollectAdminFeesRecord, NewMarketRecord, SetRateRecord};
use crate::state::market::{Bands, Market};
use crate::state::oracle::PriceFeed;
use crate::state::policy::RatePolicy;
use crate::state::traits::Size;
use crate::validate;

#[allow(clippy::too_many_arguments)]
pub fn handle_initialize_market(
    ctx: Context<InitializeMarket>,
    amplification: u64,
    base_price: u128,
    fee: u128,
    admin_fee: u128,
    loan_discount: u128,
    liquidation_discount: u128,
    debt_ceiling: u128,
) -> Result<()> {
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;

    let (market_signer, signer_nonce) =
        Pubkey::find_program_address(&[b"collar_signer".as_ref()], ctx.program_id);

    let market_key = ctx.accounts.market.key();
    let market = &mut ctx.accounts.market;
    market.set_inner(Market {
        admin: *ctx.accounts.admin.key,
        market_signer,
        collateral_mint: ctx.accounts.collateral_mint.key(),
        borrowed_mint: ctx.accounts.borrowed_mint.key(),
        collateral_vault: ctx.accounts.collateral_vault.key(),
        borrowed_vault: ctx.accounts.borrowed_vault.key(),
        price_feed: ctx.accounts.price_feed.key(),
        rate_policy: ctx.accounts.rate_policy.key(),
        fee,
        admin_fee,
        loan_discount,
        liquidation_discount,
        debt_ceiling,
        base_price,
        oracle_price: 0,
        rate: 0,
        rate_mul: PERCENTAGE_PRECISION,
        total_debt: 0,
        admin_fees_x: 0,
        admin_fees_y: 0,
        amplification,
        n_loans: 0,
        next_loan_id: 1,
        last_oracle_ts: now,
        last_rate_ts: now,
        active_band: 0,
        // band 0 sits in the middle so the grid can extend both ways
        min_band: -(MAX_BANDS as i32 / 2),
        signer_nonce,
        collateral_decimals: ctx.accounts.collateral_mint.decimals,
        borrowed_decimals: ctx.accounts.borrowed_mint.decimals,
        in_callback: false,
        padding: [0; 12],
    });
    market.validate_config()?;

    let mut bands = ctx
        .accounts
        .bands
        .load_init()
        .or(Err(ErrorCode::UnableToLoadAccountLoader))?;
    *bands = Bands {
        market: market_key,
        ..Bands::default()
    };

    emit!(NewMarketRecord {
        ts: now,
        market: market_key,
        collateral_mint: market.collateral_mint,
        borrowed_mint: market.borrowed_mint,
        amplification,
        base_price,
        fee,
        loan_discount,
        liquidation_discount,
    });

    Ok(())
}

pub fn handle_initialize_price_feed(ctx: Context<InitializePriceFeed>, price: u128) -> Result<()> {
    let clock = Clock::get()?;
    let feed = &mut ctx.accounts.price_feed;
    feed.authority = *ctx.accounts.authority.key;
    feed.price = price;
    feed.last_update_ts = clock.unix_timestamp;
    Ok(())
}

pub fn handle_update_price_feed(ctx: Context<UpdatePriceFeed>, price: u128) -> Result<()> {
    let clock = Clock::get()?;
    validate!(price > 0, ErrorCode::InvalidOracle, "zero oracle price")?;
    let feed = &mut ctx.accounts.price_feed;
    feed.price = price;
    feed.last_update_ts = clock.unix_timestamp;
    Ok(())
}

pub fn handle_initialize_rate_policy(
    ctx: Context<InitializeRatePolicy>,
    rate_per_second: u128,
) -> Result<()> {
    let clock = Clock::get()?;
    let policy = &mut ctx.accounts.rate_policy;
    policy.authority = *ctx.accounts.authority.key;
    policy.rate_per_second = rate_per_second;
    policy.last_update_ts = clock.unix_timestamp;
    policy.rate()?;
    Ok(())
}

pub fn handle_set_rate(ctx: Context<SetRate>, rate_per_second: u128) -> Result<()> {
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;

    // settle interest at the old rate before the new one takes effect
    controller::interest::accrue_interest(
        &mut ctx.accounts.market,
        &ctx.accounts.rate_policy,
        now,
    )?;

    let policy = &mut ctx.accounts.rate_policy;
    policy.rate_per_second = rate_per_second;
    policy.last_update_ts = now;
    policy.rate()?;

    emit!(SetRateRecord {
        ts: now,
        market: ctx.accounts.market.key(),
        rate: rate_per_second,
    });
    Ok(())
}

pub fn handle_update_market_fees(
    ctx: Context<AdminUpdateMarket>,
    fee: u128,
    admin_fee: u128,
) -> Result<()> {
    let market = &mut ctx.accounts.market;
    market.fee = fee;
    market.admin_fee = admin_fee;
    market.validate_config()?;
    Ok(())
}

pub fn handle_update_debt_ceiling(
    ctx: Context<AdminUpdateMarket>,
    debt_ceiling: u128,
) -> Result<()> {
    ctx.accounts.market.debt_ceiling = debt_ceiling;
    Ok(())
}

pub fn handle_collect_admin_fees(ctx: Context<CollectAdminFees>) -> Result<()> {
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;

    let market = &mut ctx.accounts.market;
    let (fees_x, fees_y) = controller::amm::reset_admin_fees(market);
    let borrowed_decimals = market.borrowed_decimals;
    let collateral_decimals = market.collateral_decimals;
    let nonce = market.signer_nonce;
    let market_key = market.key();

    if fees_x > 0 {
        controller::token::send_from_program_vault(
            &ctx.accounts.token_program,
            &ctx.accounts.borrowed_vault,
            &ctx.accounts.admin_borrowed,
            &ctx.accounts.market_signer,
            nonce,
            wad_to_token_amount(fees_x, borrowed_decimals)?,
        )?;
    }
    if fees_y > 0 {
        controller::token::send_from_program_vault(
            &ctx.accounts.token_program,
            &ctx.accounts.collateral_vault,
            &ctx.accounts.admin_collateral,
            &ctx.accounts.market_signer,
            nonce,
            wad_to_token_amount(fees_y, collateral_decimals)?,
        )?;
    }

    emit!(CollectAdminFeesRecord {
        ts: now,
        market: market_key,
        admin_fees_x: fees_x,
        admin_fees_y: fees_y,
    });
    Ok(())
}

#[derive(Accounts)]
pub struct InitializeMarket<'info> {
    #[account(mut)]
    pub admin: Signer<'info>,
    #[account(
        init,
        seeds = [b"market", collateral_mint.key().as_ref(), borrowed_mint.key().as_ref()],
        bump,
        payer = admin,
        space = Market::SIZE
    )]
    pub market: Box<Account<'info, Market>>,
    /// Pre-allocated by the client; too large to create through CPI
    #[account(zero)]
    pub bands: AccountLoader<'info, Bands>,
    /// CHECK: program signer PDA, checked against the derived address
    #[account(
        seeds = [b"collar_signer".as_ref()],
        bump
    )]
    pub market_signer: AccountInfo<'info>,
    pub collateral_mint: Box<Account<'info, Mint>>,
    pub borrowed_mint: Box<Account<'info, Mint>>,
    #[account(
        init,
        seeds = [b"collateral_vault".as_ref(), market.key().as_ref()],
        bump,
        payer = admin,
        token::mint = collateral_mint,
        token::authority = market_signer
    )]
    pub collateral_vault: Box<Account<'info, TokenAccount>>,
    #[account(
        init,
        seeds = [b"borrowed_vault".as_ref(), market.key().as_ref()],
        bump,
        payer = admin,
        token::mint = borrowed_mint,
        token::authority = market_signer
    )]
    pub borrowed_vault: Box<Account<'info, TokenAccount>>,
    pub price_feed: Box<Account<'info, PriceFeed>>,
    pub rate_policy: Box<Account<'info, RatePolicy>>,
    pub rent: Sysvar<'info, Rent>,
    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct InitializePriceFeed<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,
    #[account(
        init,
        seeds = [b"price_feed", authority.key().as_ref()],
        bump,
        payer = authority,
        space = PriceFeed::SIZE
    )]
    pub price_feed: Box<Account<'info, PriceFeed>>,
    pub rent: Sysvar<'info, Rent>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct UpdatePriceFeed<'info> {
    pub authority: Signer<'info>,
    #[account(
        mut,
        has_one = authority
    )]
    pub price_feed: Box<Account<'info, PriceFeed>>,
}

#[derive(Accounts)]
pub struct InitializeRatePolicy<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,
    #[account(
        init,
        seeds = [b"rate_policy", authority.key().as_ref()],
        bump,
        payer = authority,
        space = RatePolicy::SIZE
    )]
    pub rate_policy: Box<Account<'info, RatePolicy>>,
    pub rent: Sysvar<'info, Rent>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct SetRate<'info> {
    pub authority: Signer<'info>,
    #[account(
        mut,
        has_one = rate_policy
    )]
    pub market: Box<Account<'info, Market>>,
    #[account(
        mut,
        has_one = authority
    )]
    pub rate_policy: Box<Account<'info, RatePolicy>>,
}

#[derive(Accounts)]
pub struct AdminUpdateMarket<'info> {
    #[account(
        mut,
        constraint = is_market_admin(&market, &admin)?
    )]
    pub market: Box<Account<'info, Market>>,
    pub admin: Signer<'info>,
}

#[derive(Accounts)]
pub struct CollectAdminFees<'info> {
    #[account(
        mut,
        constraint = is_market_admin(&market, &admin)?,
        has_one = collateral_vault,
        has_one = borrowed_vault
    )]
    pub market: Box<Account<'info, Market>>,
    pub admin: Signer<'info>,
    #[account(mut)]
    pub collateral_vault: Box<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub borrowed_vault: Box<Account<'info, TokenAccount>>,
    #[account(
        mut,
        token::mint = market.collateral_mint
    )]
    pub admin_collateral: Box<Account<'info, TokenAccount>>,
    #[account(
        mut,
        token::mint = market.borrowed_mint
    )]
    pub admin_borrowed: Box<Account<'info, TokenAccount>>,
    /// CHECK: vault authority PDA
    #[account(
        seeds = [b"collar_signer".as_ref()],
        bump = market.signer_nonce
    )]
    pub market_signer: AccountInfo<'info>,
    pub token_program: Program<'info, Token>,
}
