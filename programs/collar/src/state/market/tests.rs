use crate::error::ErrorCode;
use crate::math::constants::MAX_BANDS;
use crate::state::market::Bands;
use crate::state::traits::Size;
use crate::test_utils::{test_market, wad};

#[test]
fn band_index_offsets_from_min_band() {
    let market = test_market(); // min_band = -256
    assert_eq!(market.band_index(-256).unwrap(), 0);
    assert_eq!(market.band_index(0).unwrap(), 256);
    assert_eq!(market.band_index(255).unwrap(), 511);
}

#[test]
fn band_index_rejects_off_grid() {
    let market = test_market();
    assert_eq!(market.band_index(-257), Err(ErrorCode::PriceOutsideBands));
    assert_eq!(market.band_index(256), Err(ErrorCode::PriceOutsideBands));
    assert!(market.band_in_range(100));
    assert!(!market.band_in_range(512));
}

#[test]
fn config_validation() {
    let market = test_market();
    assert!(market.validate_config().is_ok());

    let mut bad = test_market();
    bad.amplification = 1;
    assert!(bad.validate_config().is_err());

    let mut bad = test_market();
    bad.fee = wad(1); // 100% fee
    assert!(bad.validate_config().is_err());

    let mut bad = test_market();
    bad.liquidation_discount = bad.loan_discount;
    assert!(bad.validate_config().is_err());

    let mut bad = test_market();
    bad.base_price = 0;
    assert!(bad.validate_config().is_err());
}

#[test]
fn bands_totals() {
    let mut bands = Bands::default();
    bands.x[0] = wad(3);
    bands.x[MAX_BANDS - 1] = wad(4);
    bands.y[10] = wad(5);
    let (sum_x, sum_y) = bands.totals().unwrap();
    assert_eq!(sum_x, wad(7));
    assert_eq!(sum_y, wad(5));
}

#[test]
fn bands_account_size() {
    // 8 discriminator + 32 market key + three u128 grids
    assert_eq!(Bands::SIZE, 8 + 32 + 3 * 16 * MAX_BANDS);
}
