use crate::error::CollarResult;
use crate::math::bn::{U192, U256};
use crate::math::casting::Cast;
use crate::math::constants::PRICE_PRECISION;
use crate::math::safe_math::{SafeDivCeil, SafeMath};

#[cfg(test)]
mod tests;

pub fn get_proportion_u128(value: u128, numerator: u128, denominator: u128) -> CollarResult<u128> {
    if numerator == denominator {
        return Ok(value);
    }

    U192::from(value)
        .safe_mul(U192::from(numerator))?
        .safe_div(U192::from(denominator))?
        .try_to_u128()
}

/// a * b / 1e18, floored
pub fn wad_mul(a: u128, b: u128) -> CollarResult<u128> {
    U256::from(a)
        .safe_mul(U256::from(b))?
        .safe_div(U256::from(PRICE_PRECISION))?
        .try_to_u128()
}

/// a * b / 1e18, rounded up
pub fn wad_mul_ceil(a: u128, b: u128) -> CollarResult<u128> {
    U256::from(a)
        .safe_mul(U256::from(b))?
        .safe_div_ceil(U256::from(PRICE_PRECISION))?
        .try_to_u128()
}

/// a * 1e18 / b, floored
pub fn wad_div(a: u128, b: u128) -> CollarResult<u128> {
    U256::from(a)
        .safe_mul(U256::from(PRICE_PRECISION))?
        .safe_div(U256::from(b))?
        .try_to_u128()
}

/// a * 1e18 / b, rounded up
pub fn wad_div_ceil(a: u128, b: u128) -> CollarResult<u128> {
    U256::from(a)
        .safe_mul(U256::from(PRICE_PRECISION))?
        .safe_div_ceil(U256::from(b))?
        .try_to_u128()
}

/// sqrt(a * b) for two wads. The product is a 1e36-scaled integer, so the
/// integer square root is itself a wad.
pub fn wad_sqrt_product(a: u128, b: u128) -> CollarResult<u128> {
    U256::from(a)
        .safe_mul(U256::from(b))?
        .integer_sqrt()
        .try_to_u128()
}

/// ratio^exp for a wad ratio, by squaring. Exponents are bounded by the band
/// grid so the loop is bounded.
pub fn wad_pow(ratio: u128, mut exp: u32) -> CollarResult<u128> {
    let mut result = PRICE_PRECISION;
    let mut base = ratio;
    while exp > 0 {
        if exp & 1 == 1 {
            result = wad_mul(result, base)?;
        }
        exp >>= 1;
        if exp > 0 {
            base = wad_mul(base, base)?;
        }
    }
    Ok(result)
}

fn wad_scale_factor(decimals: u8) -> CollarResult<u128> {
    let exp = 18_u32.safe_sub(decimals as u32)?;
    10_u128
        .checked_pow(exp)
        .ok_or(crate::error::ErrorCode::MathError)
}

/// Scale a raw token amount (with `decimals`) up to a wad
pub fn token_amount_to_wad(amount: u64, decimals: u8) -> CollarResult<u128> {
    amount.cast::<u128>()?.safe_mul(wad_scale_factor(decimals)?)
}

/// Scale a wad down to a raw token amount (with `decimals`), floored
pub fn wad_to_token_amount(wad: u128, decimals: u8) -> CollarResult<u64> {
    wad.safe_div(wad_scale_factor(decimals)?)?.cast::<u64>()
}

/// Scale a wad down to a raw token amount (with `decimals`), rounded up
pub fn wad_to_token_amount_ceil(wad: u128, decimals: u8) -> CollarResult<u64> {
    wad.safe_div_ceil(wad_scale_factor(decimals)?)?.cast::<u64>()
}
