// All prices, fractions and internal balances are 18-decimal fixed point ("wad").
pub const PRICE_PRECISION: u128 = 1_000_000_000_000_000_000; // 1e18
pub const PRICE_PRECISION_I128: i128 = PRICE_PRECISION as i128;
pub const PERCENTAGE_PRECISION: u128 = 1_000_000_000_000_000_000; // 1e18

// Band grid
pub const MAX_BANDS: usize = 512;
pub const MAX_TICKS_PER_LOAN: u32 = 50;
pub const MIN_TICKS: u32 = 4;
// Bound on bands crossed by a single swap or placement search
pub const MAX_BAND_WALK: u32 = 255;

// Amplification bounds
pub const MIN_AMPLIFICATION: u64 = 2;
pub const MAX_AMPLIFICATION: u64 = 10_000;

// Fees (wad fractions)
pub const MAX_FEE: u128 = 100_000_000_000_000_000; // 10%
pub const MAX_ADMIN_FEE: u128 = PERCENTAGE_PRECISION; // 100% of the fee

// Share bookkeeping
pub const DEAD_SHARES: u128 = 1_000;
// Minimum wad collateral per band on deposit
pub const MIN_TICK_LIQUIDITY: u128 = 10_000;

// Loan sizing
pub const MIN_LOAN_DEBT: u128 = 10_000_000_000_000_000; // 0.01 borrowed token
pub const MAX_LOAN_DISCOUNT: u128 = 500_000_000_000_000_000;
pub const MIN_LIQUIDATION_DISCOUNT: u128 = 10_000_000_000_000_000;
pub const MAX_LIQUIDATION_DISCOUNT: u128 = 500_000_000_000_000_000;

// Interest
pub const ONE_YEAR: u128 = 31_536_000;
// ~400% APR expressed per second
pub const MAX_RATE_PER_SECOND: u128 = 126_839_167_935;

// Oracle guards
pub const MAX_ORACLE_STALENESS_SECONDS: i64 = 600;
// Smoothed oracle may move at most this wad fraction per second
pub const MAX_ORACLE_STEP_PER_SECOND: u128 = 5_000_000_000_000_000; // 0.5%
