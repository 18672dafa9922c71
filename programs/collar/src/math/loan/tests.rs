use crate::error::ErrorCode;
use crate::math::bands::p_oracle_up;
use crate::math::loan::*;
use crate::test_utils::{test_market, wad};

#[test]
fn band_count_bounds() {
    assert!(validate_band_count(3).is_err());
    assert!(validate_band_count(4).is_ok());
    assert!(validate_band_count(50).is_ok());
    assert!(validate_band_count(51).is_err());
}

#[test]
fn y_effective_discounts_collateral() {
    let market = test_market();
    let collateral = wad(10);
    let y_eff = get_y_effective(collateral, 4, market.loan_discount, market.amplification).unwrap();
    // 9% loan discount plus the band spread, but never more than half gone
    assert!(y_eff < collateral);
    assert!(y_eff > collateral / 2);

    // spreading over more bands gives less effective collateral
    let wider = get_y_effective(collateral, 20, market.loan_discount, market.amplification).unwrap();
    assert!(wider < y_eff);
}

#[test]
fn y_effective_zero_bands_rejected() {
    let market = test_market();
    assert!(get_y_effective(wad(1), 0, market.loan_discount, market.amplification).is_err());
}

#[test]
fn n1_is_deepest_covering_band() {
    let market = test_market();
    let collateral = wad(1);
    let debt = wad(1_000);
    let n = 4;

    let n1 = calculate_debt_n1(&market, collateral, debt, n).unwrap();
    assert!(n1 > market.active_band);

    let y_eff = get_y_effective(collateral, n, market.loan_discount, market.amplification).unwrap();
    // covers at n1 but not one band deeper
    assert!(max_debt_for_placement(&market, y_eff, n1).unwrap() >= debt);
    assert!(max_debt_for_placement(&market, y_eff, n1 + 1).unwrap() < debt);
}

#[test]
fn small_debt_places_deep() {
    let market = test_market();
    let shallow = calculate_debt_n1(&market, wad(1), wad(2_500), 4).unwrap();
    let deep = calculate_debt_n1(&market, wad(1), wad(100), 4).unwrap();
    assert!(deep > shallow);
}

#[test]
fn excessive_debt_rejected() {
    let market = test_market();
    // one collateral unit at 3000 cannot back 3000 of debt after discounts
    assert_eq!(
        calculate_debt_n1(&market, wad(1), wad(3_000), 4),
        Err(ErrorCode::DebtTooHigh)
    );
}

#[test]
fn max_borrowable_is_placeable() {
    let market = test_market();
    let collateral = wad(5);
    let max = max_borrowable(&market, collateral, 4).unwrap();
    assert!(max > 0);
    assert!(calculate_debt_n1(&market, collateral, max, 4).is_ok());
}

#[test]
fn max_borrowable_capped_by_ceiling() {
    let mut market = test_market();
    market.debt_ceiling = wad(100);
    market.total_debt = wad(40);
    let max = max_borrowable(&market, wad(1_000), 4).unwrap();
    assert_eq!(max, wad(60));
}

#[test]
fn min_collateral_backs_the_debt() {
    let market = test_market();
    for n in [4, 10, 50] {
        for debt in [wad(1), wad(1_000), wad(2_500_000)] {
            let c_min = min_collateral(&market, debt, n).unwrap();
            assert!(c_min > 0);
            assert!(
                calculate_debt_n1(&market, c_min, debt, n).is_ok(),
                "min_collateral({}, {}) = {} does not place",
                debt,
                n,
                c_min
            );
            // noticeably less collateral no longer places
            assert!(calculate_debt_n1(&market, c_min * 99 / 100, debt, n).is_err());
        }
    }
}

#[test]
fn placement_price_tracks_band() {
    let market = test_market();
    let n1 = calculate_debt_n1(&market, wad(1), wad(2_500), 4).unwrap();
    let p_up = p_oracle_up(market.base_price, market.amplification, n1).unwrap();
    // heavy borrowing places the range close under the current price
    assert!(p_up > wad(2_500) && p_up < wad(3_000), "p_up(n1) = {}", p_up);
}
