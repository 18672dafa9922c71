use anchor_lang::accounts::account::Account;
use anchor_lang::accounts::account_loader::AccountLoader;
use anchor_lang::accounts::signer::Signer;
use anchor_lang::prelude::Pubkey;

use crate::state::loan::Loan;
use crate::state::market::{Bands, Market};

pub fn is_market_admin(market: &Account<Market>, signer: &Signer) -> anchor_lang::Result<bool> {
    Ok(market.admin.eq(signer.key))
}

pub fn is_bands_for_market(
    bands: &AccountLoader<Bands>,
    market: &Pubkey,
) -> anchor_lang::Result<bool> {
    Ok(bands.load()?.market.eq(market))
}

pub fn is_loan_for_market(
    loan: &AccountLoader<Loan>,
    market: &Pubkey,
) -> anchor_lang::Result<bool> {
    Ok(loan.load()?.market.eq(market))
}

pub fn can_sign_for_loan(loan: &AccountLoader<Loan>, signer: &Signer) -> anchor_lang::Result<bool> {
    loan.load().map(|loan| loan.authority.eq(signer.key))
}

pub fn is_loan_for_authority(
    loan: &AccountLoader<Loan>,
    authority: &Pubkey,
) -> anchor_lang::Result<bool> {
    loan.load().map(|loan| loan.authority.eq(authority))
}
