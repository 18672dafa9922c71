use crate::error::{CollarResult, ErrorCode};
use crate::math::bn::U256;
use crate::math::constants::{MAX_BANDS, PRICE_PRECISION};
use crate::math::helpers::{wad_div, wad_mul, wad_pow};
use crate::math::safe_math::SafeMath;

#[cfg(test)]
mod tests;

/// Band `n` covers prices `[p_down(n), p_up(n)]` with
/// `p_up(n) = base_price * ((A-1)/A)^n` and `p_down(n) = p_up(n+1)`:
/// indices increase as price decreases.
///
/// Within a band the pool trades on a constant-product curve with
/// oracle-dependent virtual balances
/// `f = A*y0*p_o^2/p_up` and `g = (A-1)*y0*p_up/p_o`,
/// invariant `I = (f+x)(g+y)` and marginal price `p = (f+x)/(g+y)`.

/// A/(A-1) as a wad
pub fn band_ratio(amplification: u64) -> CollarResult<u128> {
    wad_div(
        (amplification as u128).safe_mul(PRICE_PRECISION)?,
        (amplification as u128)
            .safe_sub(1)?
            .safe_mul(PRICE_PRECISION)?,
    )
}

/// (A-1)/A as a wad
pub fn band_ratio_inv(amplification: u64) -> CollarResult<u128> {
    wad_div(
        (amplification as u128)
            .safe_sub(1)?
            .safe_mul(PRICE_PRECISION)?,
        (amplification as u128).safe_mul(PRICE_PRECISION)?,
    )
}

/// Upper price bound of band `n`
pub fn p_oracle_up(base_price: u128, amplification: u64, n: i32) -> CollarResult<u128> {
    if n.unsigned_abs() as usize > 2 * MAX_BANDS {
        return Err(ErrorCode::PriceOutsideBands);
    }
    if n >= 0 {
        wad_mul(
            base_price,
            wad_pow(band_ratio_inv(amplification)?, n as u32)?,
        )
    } else {
        wad_mul(
            base_price,
            wad_pow(band_ratio(amplification)?, n.unsigned_abs())?,
        )
    }
}

/// Lower price bound of band `n`
pub fn p_oracle_down(base_price: u128, amplification: u64, n: i32) -> CollarResult<u128> {
    p_oracle_up(base_price, amplification, n.safe_add(1)?)
}

/// Positive root of the band quadratic
/// `A*p_o*y0^2 - y0*((A-1)*p_up/p_o*x + A*p_o^2/p_up*y) - x*y = 0`,
/// the collateral the band would hold if fully de-liquidated at price `p_o`.
pub fn get_y0(x: u128, y: u128, p_o: u128, p_up: u128, amplification: u64) -> CollarResult<u128> {
    if x == 0 && y == 0 {
        return Ok(0);
    }

    let a = U256::from(amplification);
    let a_minus_1 = U256::from(amplification.safe_sub(1)?);
    let wad = U256::from(PRICE_PRECISION);
    let p_o = U256::from(p_o);
    let p_up = U256::from(p_up);

    let mut b = U256::from(0);
    if x != 0 {
        // (A-1) * p_up * x / p_o
        b = a_minus_1
            .safe_mul(p_up)?
            .safe_mul(U256::from(x))?
            .safe_div(p_o)?;
    }
    if y != 0 {
        // A * p_o^2 * y / (p_up * 1e18)
        b = b.safe_add(
            a.safe_mul(p_o)?
                .safe_mul(p_o)?
                .safe_mul(U256::from(y))?
                .safe_div(p_up)?
                .safe_div(wad)?,
        )?;
    }

    let two_a_p_o = a.safe_mul(U256::from(2u8))?.safe_mul(p_o)?;
    if x > 0 && y > 0 {
        // D = b^2 + 4*A*p_o*x*y / 1e18
        let d = b.safe_mul(b)?.safe_add(
            a.safe_mul(U256::from(4u8))?
                .safe_mul(p_o)?
                .safe_mul(U256::from(x))?
                .safe_div(wad)?
                .safe_mul(U256::from(y))?,
        )?;
        b.safe_add(d.integer_sqrt())?
            .safe_mul(wad)?
            .safe_div(two_a_p_o)?
            .try_to_u128()
    } else {
        // one-sided band: the quadratic degenerates to A*p_o*y0 = b
        b.safe_mul(wad)?
            .safe_div(a.safe_mul(p_o)?)?
            .try_to_u128()
    }
}

/// Virtual balances (f, g) for a band given its y0
pub fn virtual_balances(
    y0: u128,
    p_o: u128,
    p_up: u128,
    amplification: u64,
) -> CollarResult<(u128, u128)> {
    let wad = U256::from(PRICE_PRECISION);

    let f = U256::from(amplification)
        .safe_mul(U256::from(y0))?
        .safe_mul(U256::from(p_o))?
        .safe_div(U256::from(p_up))?
        .safe_mul(U256::from(p_o))?
        .safe_div(wad)?
        .try_to_u128()?;

    let g = U256::from(amplification.safe_sub(1)?)
        .safe_mul(U256::from(y0))?
        .safe_mul(U256::from(p_up))?
        .safe_div(U256::from(p_o))?
        .try_to_u128()?;

    Ok((f, g))
}

/// (f+x)*(g+y), kept wide: a 1e36-scaled product
pub fn invariant(f: u128, g: u128, x: u128, y: u128) -> CollarResult<U256> {
    U256::from(f.safe_add(x)?).safe_mul(U256::from(g.safe_add(y)?))
}

/// Marginal AMM price inside a band. An empty band quotes the virtual price
/// `A/(A-1) * p_o^3 / p_up^2`.
pub fn band_price(
    x: u128,
    y: u128,
    p_o: u128,
    p_up: u128,
    amplification: u64,
) -> CollarResult<u128> {
    let y0 = get_y0(x, y, p_o, p_up, amplification)?;
    if y0 == 0 {
        return U256::from(p_o)
            .safe_mul(U256::from(p_o))?
            .safe_div(U256::from(p_up))?
            .safe_mul(U256::from(p_o))?
            .safe_div(U256::from(p_up))?
            .safe_mul(U256::from(amplification))?
            .safe_div(U256::from(amplification.safe_sub(1)?))?
            .try_to_u128();
    }
    let (f, g) = virtual_balances(y0, p_o, p_up, amplification)?;
    wad_div(f.safe_add(x)?, g.safe_add(y)?)
}

/// Borrowed-token reserve once the band's collateral is fully drained:
/// `x_end = I/g - f`
pub fn x_when_y_drained(inv: U256, f: u128, g: u128) -> CollarResult<u128> {
    if g == 0 {
        return Err(ErrorCode::MathError);
    }
    inv.safe_div(U256::from(g))?
        .try_to_u128()?
        .safe_sub(f)
}

/// Collateral reserve once the band's borrowed token is fully drained:
/// `y_end = I/f - g`
pub fn y_when_x_drained(inv: U256, f: u128, g: u128) -> CollarResult<u128> {
    if f == 0 {
        return Err(ErrorCode::MathError);
    }
    inv.safe_div(U256::from(f))?
        .try_to_u128()?
        .safe_sub(g)
}
