use crate::math::constants::PRICE_PRECISION;
use crate::math::helpers::*;

const WAD: u128 = PRICE_PRECISION;

#[test]
fn proportion_basic() {
    assert_eq!(get_proportion_u128(100, 1, 3).unwrap(), 33);
    assert_eq!(get_proportion_u128(100, 3, 3).unwrap(), 100);
    assert_eq!(get_proportion_u128(0, 5, 7).unwrap(), 0);
}

#[test]
fn proportion_wide_intermediate() {
    // value * numerator overflows u128 but fits the wide intermediate
    let value = u128::MAX / 2;
    assert_eq!(get_proportion_u128(value, 2, 2).unwrap(), value);
    assert_eq!(get_proportion_u128(value, 1, 2).unwrap(), value / 2);
}

#[test]
fn wad_mul_div_roundtrip() {
    assert_eq!(wad_mul(2 * WAD, 3 * WAD).unwrap(), 6 * WAD);
    assert_eq!(wad_div(6 * WAD, 3 * WAD).unwrap(), 2 * WAD);
    assert_eq!(wad_mul(WAD, 7).unwrap(), 7);
    assert_eq!(wad_div(1, 3).unwrap(), WAD / 3);
}

#[test]
fn wad_rounding_directions() {
    // 1/3 floors, the ceil variant rounds the last digit up
    let floor = wad_div(1, 3).unwrap();
    let ceil = wad_div_ceil(1, 3).unwrap();
    assert_eq!(ceil, floor + 1);

    assert_eq!(wad_mul(1, 1).unwrap(), 0);
    assert_eq!(wad_mul_ceil(1, 1).unwrap(), 1);
}

#[test]
fn wad_div_by_zero_errors() {
    assert!(wad_div(WAD, 0).is_err());
}

#[test]
fn sqrt_product_exact_square() {
    assert_eq!(wad_sqrt_product(4 * WAD, 9 * WAD).unwrap(), 6 * WAD);
    assert_eq!(wad_sqrt_product(WAD, WAD).unwrap(), WAD);
    assert_eq!(wad_sqrt_product(0, WAD).unwrap(), 0);
}

#[test]
fn sqrt_product_between_factors() {
    let a = 2_970 * WAD;
    let b = 3_000 * WAD;
    let s = wad_sqrt_product(a, b).unwrap();
    assert!(s > a && s < b);
}

#[test]
fn pow_identities() {
    let ratio = 990_000_000_000_000_000; // 0.99
    assert_eq!(wad_pow(ratio, 0).unwrap(), WAD);
    assert_eq!(wad_pow(ratio, 1).unwrap(), ratio);
    assert_eq!(wad_pow(ratio, 2).unwrap(), 980_100_000_000_000_000);
    assert_eq!(wad_pow(WAD, 1_000).unwrap(), WAD);
}

#[test]
fn pow_monotone_decay() {
    let ratio = 990_000_000_000_000_000;
    let mut prev = WAD;
    for exp in 1..60 {
        let cur = wad_pow(ratio, exp).unwrap();
        assert!(cur < prev, "0.99^{} did not shrink", exp);
        prev = cur;
    }
    // squaring drift versus sequential multiplication stays tiny
    let mut sequential = WAD;
    for _ in 0..50 {
        sequential = wad_mul(sequential, ratio).unwrap();
    }
    let squared = wad_pow(ratio, 50).unwrap();
    let diff = squared.abs_diff(sequential);
    assert!(diff < 1_000, "drift {}", diff);
}

#[test]
fn token_amount_conversions() {
    assert_eq!(token_amount_to_wad(1_000_000, 6).unwrap(), WAD);
    assert_eq!(token_amount_to_wad(5, 18).unwrap(), 5);
    assert_eq!(wad_to_token_amount(WAD + WAD / 2, 6).unwrap(), 1_500_000);
    // floor versus ceil on a sub-unit remainder
    assert_eq!(wad_to_token_amount(WAD + 1, 6).unwrap(), 1_000_000);
    assert_eq!(wad_to_token_amount_ceil(WAD + 1, 6).unwrap(), 1_000_001);
}

#[test]
fn token_conversion_rejects_too_many_decimals() {
    assert!(token_amount_to_wad(1, 19).is_err());
}
