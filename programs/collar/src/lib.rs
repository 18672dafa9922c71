#![allow(clippy::too_many_arguments)]
#![allow(clippy::comparison_chain)]

use anchor_lang::prelude::*;

use instructions::*;

pub mod controller;
pub mod error;
pub mod instructions;
pub mod macros;
pub mod math;
mod signer;
pub mod state;
#[cfg(test)]
mod test_utils;

declare_id!("Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS");

#[program]
pub mod collar {
    use super::*;

    // Admin instructions

    pub fn initialize_market(
        ctx: Context<InitializeMarket>,
        amplification: u64,
        base_price: u128,
        fee: u128,
        admin_fee: u128,
        loan_discount: u128,
        liquidation_discount: u128,
        debt_ceiling: u128,
    ) -> Result<()> {
        handle_initialize_market(
            ctx,
            amplification,
            base_price,
            fee,
            admin_fee,
            loan_discount,
            liquidation_discount,
            debt_ceiling,
        )
    }

    pub fn initialize_price_feed(ctx: Context<InitializePriceFeed>, price: u128) -> Result<()> {
        handle_initialize_price_feed(ctx, price)
    }

    pub fn update_price_feed(ctx: Context<UpdatePriceFeed>, price: u128) -> Result<()> {
        handle_update_price_feed(ctx, price)
    }

    pub fn initialize_rate_policy(
        ctx: Context<InitializeRatePolicy>,
        rate_per_second: u128,
    ) -> Result<()> {
        handle_initialize_rate_policy(ctx, rate_per_second)
    }

    pub fn set_rate(ctx: Context<SetRate>, rate_per_second: u128) -> Result<()> {
        handle_set_rate(ctx, rate_per_second)
    }

    pub fn update_market_fees(
        ctx: Context<AdminUpdateMarket>,
        fee: u128,
        admin_fee: u128,
    ) -> Result<()> {
        handle_update_market_fees(ctx, fee, admin_fee)
    }

    pub fn update_debt_ceiling(ctx: Context<AdminUpdateMarket>, debt_ceiling: u128) -> Result<()> {
        handle_update_debt_ceiling(ctx, debt_ceiling)
    }

    pub fn collect_admin_fees(ctx: Context<CollectAdminFees>) -> Result<()> {
        handle_collect_admin_fees(ctx)
    }

    // User instructions

    pub fn create_loan(
        ctx: Context<CreateLoan>,
        collateral_amount: u64,
        debt_amount: u64,
        n_bands: u32,
    ) -> Result<()> {
        handle_create_loan(ctx, collateral_amount, debt_amount, n_bands)
    }

    pub fn add_collateral(ctx: Context<UpdateLoan>, amount: u64) -> Result<()> {
        handle_add_collateral(ctx, amount)
    }

    pub fn remove_collateral(ctx: Context<UpdateLoan>, amount: u64) -> Result<()> {
        handle_remove_collateral(ctx, amount)
    }

    pub fn borrow_more(
        ctx: Context<UpdateLoan>,
        collateral_amount: u64,
        debt_amount: u64,
    ) -> Result<()> {
        handle_borrow_more(ctx, collateral_amount, debt_amount)
    }

    pub fn repay(ctx: Context<Repay>, amount: u64) -> Result<()> {
        handle_repay(ctx, amount)
    }

    pub fn exchange(
        ctx: Context<Exchange>,
        in_index: u32,
        out_index: u32,
        in_amount: u64,
        min_out_amount: u64,
    ) -> Result<()> {
        handle_exchange(ctx, in_index, out_index, in_amount, min_out_amount)
    }

    pub fn exchange_dy(
        ctx: Context<Exchange>,
        in_index: u32,
        out_index: u32,
        out_amount: u64,
        max_in_amount: u64,
    ) -> Result<()> {
        handle_exchange_dy(ctx, in_index, out_index, out_amount, max_in_amount)
    }

    // Keeper instructions

    pub fn liquidate(ctx: Context<Liquidate>, frac: u128, min_x: u64) -> Result<()> {
        handle_liquidate(ctx, frac, min_x)
    }

    pub fn liquidate_with_callback<'c: 'info, 'info>(
        ctx: Context<'_, '_, 'c, 'info, LiquidateWithCallback<'info>>,
        frac: u128,
        min_x: u64,
        callback_data: Vec<u8>,
    ) -> Result<()> {
        handle_liquidate_with_callback(ctx, frac, min_x, callback_data)
    }

    pub fn accrue_interest(ctx: Context<AccrueInterest>) -> Result<()> {
        handle_accrue_interest(ctx)
    }
}
