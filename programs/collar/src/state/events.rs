use anchor_lang::prelude::*;
use borsh::{BorshDeserialize, BorshSerialize};

#[event]
pub struct NewMarketRecord {
    pub ts: i64,
    pub market: Pubkey,
    pub collateral_mint: Pubkey,
    pub borrowed_mint: Pubkey,
    pub amplification: u64,
    pub base_price: u128,
    pub fee: u128,
    pub loan_discount: u128,
    pub liquidation_discount: u128,
}

/// Emitted after every loan mutation; the durable record of a position's
/// shape. Mirrors what `user_state` reads live.
#[event]
pub struct UserStateRecord {
    pub ts: i64,
    pub market: Pubkey,
    pub user: Pubkey,
    pub collateral: u128,
    pub debt: u128,
    pub n1: i32,
    pub n2: i32,
    pub liquidation_discount: u128,
}

#[event]
pub struct BorrowRecord {
    pub ts: i64,
    pub market: Pubkey,
    pub user: Pubkey,
    pub loan_id: u64,
    pub collateral_increase: u128,
    pub loan_increase: u128,
}

#[event]
pub struct RepayRecord {
    pub ts: i64,
    pub market: Pubkey,
    pub user: Pubkey,
    pub collateral_decrease: u128,
    pub loan_decrease: u128,
}

#[event]
pub struct RemoveCollateralRecord {
    pub ts: i64,
    pub market: Pubkey,
    pub user: Pubkey,
    pub collateral_decrease: u128,
}

#[event]
pub struct LiquidationRecord {
    pub ts: i64,
    pub market: Pubkey,
    pub user: Pubkey,
    pub liquidator: Pubkey,
    pub collateral_received: u128,
    pub stablecoin_received: u128,
    pub debt: u128,
    pub kind: LiquidationKind,
}

#[derive(Clone, Copy, BorshSerialize, BorshDeserialize, PartialEq, Eq)]
pub enum LiquidationKind {
    Hard,
    SelfLiquidation,
}

impl Default for LiquidationKind {
    fn default() -> Self {
        LiquidationKind::Hard
    }
}

#[event]
pub struct TokenExchangeRecord {
    pub ts: i64,
    pub market: Pubkey,
    pub buyer: Pubkey,
    pub sold_id: u32,
    pub tokens_sold: u128,
    pub bought_id: u32,
    pub tokens_bought: u128,
    pub avg_price: u128,
    pub active_band_after: i32,
}

#[event]
pub struct InterestAccrualRecord {
    pub ts: i64,
    pub market: Pubkey,
    pub rate: u128,
    pub rate_mul: u128,
    pub total_debt: u128,
}

#[event]
pub struct SetRateRecord {
    pub ts: i64,
    pub market: Pubkey,
    pub rate: u128,
}

#[event]
pub struct CollectAdminFeesRecord {
    pub ts: i64,
    pub market: Pubkey,
    pub admin_fees_x: u128,
    pub admin_fees_y: u128,
}
