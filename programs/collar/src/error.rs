use anchor_lang::prelude::*;

pub type CollarResult<T = ()> = std::result::Result<T, ErrorCode>;

#[error_code]
#[derive(PartialEq, Eq)]
pub enum ErrorCode {
    #[msg("Amount too low")]
    AmountTooLow,
    #[msg("Debt too high")]
    DebtTooHigh,
    #[msg("Loan already created")]
    LoanAlreadyCreated,
    #[msg("Loan does not exist")]
    LoanDoesNotExist,
    #[msg("Wrong number of bands")]
    InvalidBandCount,
    #[msg("Band range outside representable grid")]
    PriceOutsideBands,
    #[msg("Deposit band range not above active band")]
    BandsNotAboveActive,
    #[msg("Position is under soft liquidation")]
    UnderSoftLiquidation,
    #[msg("Position is not eligible for hard liquidation")]
    SufficientHealth,
    #[msg("Not enough collateral would remain")]
    CollateralBelowMinimum,
    #[msg("Debt ceiling exceeded")]
    DebtCeilingExceeded,
    #[msg("Slippage outside limit")]
    SlippageOutsideLimit,
    #[msg("Swap amounts must reference distinct tokens")]
    SameCoins,
    #[msg("Math Error")]
    MathError,
    #[msg("Conversion to u128/u64 failed with an overflow or underflow")]
    BnConversionError,
    #[msg("Casting Failure")]
    CastingFailure,
    #[msg("Oracle price is invalid or stale")]
    InvalidOracle,
    #[msg("Invalid monetary policy rate")]
    InvalidRate,
    #[msg("Invalid market configuration")]
    InvalidMarketConfiguration,
    #[msg("Invalid fee parameter")]
    InvalidFee,
    #[msg("Unable To Load AccountLoader")]
    UnableToLoadAccountLoader,
    #[msg("Reentrant call blocked")]
    ReentrancyGuard,
    #[msg("Liquidation callback did not return enough funds")]
    CallbackShortfall,
    #[msg("Liquidation fraction out of range")]
    InvalidLiquidationFraction,
    #[msg("Health calculation undefined for zero debt")]
    ZeroDebtHealth,
    #[msg("Exchange produced no output")]
    NoLiquidity,
    #[msg("Token transfer failed")]
    TokenTransferFailed,
}
