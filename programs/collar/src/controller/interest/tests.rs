use crate::controller::interest::accrue_interest;
use crate::math::constants::{MAX_RATE_PER_SECOND, ONE_YEAR, PERCENTAGE_PRECISION};
use crate::math::helpers::get_proportion_u128;
use crate::test_utils::{test_market, test_policy, wad};

// ~10% APR per second
const TEN_PCT_APR: u128 = PERCENTAGE_PRECISION / 10 / ONE_YEAR;

#[test]
fn accrual_compounds_rate_mul_and_debt() {
    let mut market = test_market();
    market.total_debt = wad(1_000);
    market.last_rate_ts = 0;
    let policy = test_policy(TEN_PCT_APR);

    let rate_mul = accrue_interest(&mut market, &policy, ONE_YEAR as i64).unwrap();

    // one year of simple per-second accumulation lands close to 10%
    let expected = PERCENTAGE_PRECISION + TEN_PCT_APR * ONE_YEAR;
    assert_eq!(rate_mul, expected);
    assert_eq!(market.rate_mul, expected);
    assert_eq!(market.rate, TEN_PCT_APR);
    assert_eq!(market.last_rate_ts, ONE_YEAR as i64);

    // total debt scales by exactly the same factor
    let scaled = get_proportion_u128(wad(1_000), expected, PERCENTAGE_PRECISION).unwrap();
    assert_eq!(market.total_debt, scaled);
}

#[test]
fn accrual_is_monotone_across_updates() {
    let mut market = test_market();
    market.total_debt = wad(500);
    market.last_rate_ts = 0;
    let policy = test_policy(TEN_PCT_APR);

    let mut prev = market.rate_mul;
    for step in 1..=5 {
        let cur = accrue_interest(&mut market, &policy, step * 86_400).unwrap();
        assert!(cur > prev);
        prev = cur;
    }
}

#[test]
fn stale_clock_is_a_no_op() {
    let mut market = test_market();
    market.last_rate_ts = 100;
    market.total_debt = wad(10);
    let policy = test_policy(TEN_PCT_APR);

    let before = market.rate_mul;
    assert_eq!(accrue_interest(&mut market, &policy, 100).unwrap(), before);
    assert_eq!(accrue_interest(&mut market, &policy, 50).unwrap(), before);
    assert_eq!(market.total_debt, wad(10));
}

#[test]
fn zero_rate_freezes_debt() {
    let mut market = test_market();
    market.total_debt = wad(10);
    market.last_rate_ts = 0;
    let policy = test_policy(0);

    accrue_interest(&mut market, &policy, 1_000_000).unwrap();
    assert_eq!(market.rate_mul, PERCENTAGE_PRECISION);
    assert_eq!(market.total_debt, wad(10));
}

#[test]
fn runaway_policy_rate_rejected() {
    let mut market = test_market();
    market.last_rate_ts = 0;
    let policy = test_policy(MAX_RATE_PER_SECOND + 1);
    assert!(accrue_interest(&mut market, &policy, 10).is_err());
}
