use crate::controller::amm::*;
use crate::error::ErrorCode;
use crate::math::constants::{MAX_FEE, PERCENTAGE_PRECISION, PRICE_PRECISION};
use crate::state::loan::Loan;
use crate::state::market::{Bands, Market};
use crate::state::oracle::OraclePriceData;
use crate::test_utils::{test_bands, test_loan, test_market, wad};

fn seeded_position(
    market: &Market,
    bands: &mut Bands,
    collateral: u128,
    n1: i32,
    n2: i32,
) -> Loan {
    let mut loan = test_loan();
    deposit_range(market, bands, &mut loan, collateral, n1, n2, &mut NoOpHook).unwrap();
    loan
}

#[test]
fn oracle_smoothing_clamps_per_second() {
    let mut market = test_market();
    market.last_oracle_ts = 1_000;

    // 20% crash arrives one second later: only 0.5% is admitted
    let data = OraclePriceData {
        price: wad(2_400),
        ts: 1_001,
    };
    let smoothed = update_oracle_price(&mut market, &data, 1_001).unwrap();
    assert_eq!(smoothed, wad(3_000) - wad(15));
    assert_eq!(market.oracle_price, smoothed);
    assert_eq!(market.last_oracle_ts, 1_001);

    // after enough elapsed time the full move is admitted
    let smoothed = update_oracle_price(&mut market, &data, 1_500).unwrap();
    assert_eq!(smoothed, wad(2_400));
}

#[test]
fn oracle_first_observation_is_taken_as_is() {
    let mut market = test_market();
    market.oracle_price = 0;
    let data = OraclePriceData {
        price: wad(2_000),
        ts: 50,
    };
    assert_eq!(update_oracle_price(&mut market, &data, 50).unwrap(), wad(2_000));
}

#[test]
fn oracle_upward_moves_also_clamped() {
    let mut market = test_market();
    market.last_oracle_ts = 0;
    let data = OraclePriceData {
        price: wad(4_000),
        ts: 2,
    };
    let smoothed = update_oracle_price(&mut market, &data, 2).unwrap();
    // two seconds of 0.5% steps
    assert_eq!(smoothed, wad(3_000) + wad(30));
}

#[test]
fn deposit_splits_evenly_and_mints_shares() {
    let market = test_market();
    let mut bands = test_bands();
    let loan = seeded_position(&market, &mut bands, wad(10), 0, 3);

    assert_eq!(loan.n1, 0);
    assert_eq!(loan.n2, 3);
    for i in 0..4 {
        let idx = market.band_index(i).unwrap();
        assert_eq!(bands.y[idx], wad(10) / 4);
        assert!(loan.ticks[i as usize] > 0);
        // dead shares pin the share price on a fresh band
        assert_eq!(
            bands.total_shares[idx],
            loan.ticks[i as usize] + 1_000
        );
    }
    let (sum_x, sum_y) = bands.totals().unwrap();
    assert_eq!(sum_x, 0);
    assert_eq!(sum_y, wad(10));
}

#[test]
fn deposit_remainder_lands_in_first_band() {
    let market = test_market();
    let mut bands = test_bands();
    let amount = wad(10) + 3; // not divisible by 4
    seeded_position(&market, &mut bands, amount, 0, 3);
    let first = market.band_index(0).unwrap();
    assert_eq!(bands.y[first], wad(10) / 4 + 3);
}

#[test]
fn dust_deposit_rejected() {
    let market = test_market();
    let mut bands = test_bands();
    let mut loan = test_loan();
    // 30_000 over 4 bands is 7_500 per band, under the tick minimum
    assert_eq!(
        deposit_range(&market, &mut bands, &mut loan, 30_000, 0, 3, &mut NoOpHook),
        Err(ErrorCode::AmountTooLow)
    );
}

#[test]
fn deposit_not_above_active_band_rejected() {
    let market = test_market(); // active_band = -1
    let mut bands = test_bands();
    let mut loan = test_loan();
    assert_eq!(
        deposit_range(&market, &mut bands, &mut loan, wad(10), -1, 2, &mut NoOpHook),
        Err(ErrorCode::BandsNotAboveActive)
    );
}

#[test]
fn double_deposit_rejected() {
    let market = test_market();
    let mut bands = test_bands();
    let mut loan = seeded_position(&market, &mut bands, wad(10), 0, 3);
    assert_eq!(
        deposit_range(&market, &mut bands, &mut loan, wad(10), 0, 3, &mut NoOpHook),
        Err(ErrorCode::LoanAlreadyCreated)
    );
}

#[test]
fn withdraw_roundtrip_loses_only_dead_share_dust() {
    let market = test_market();
    let mut bands = test_bands();
    let mut loan = seeded_position(&market, &mut bands, wad(10), 0, 3);

    let out = withdraw(&market, &mut bands, &mut loan, PERCENTAGE_PRECISION, &mut NoOpHook)
        .unwrap();
    assert_eq!(out.borrowed, 0);
    assert!(out.collateral <= wad(10));
    assert!(out.collateral >= wad(10) - 5_000, "returned {}", out.collateral);
    assert!(!loan.has_liquidity());
}

#[test]
fn partial_withdraw_halves_ticks() {
    let market = test_market();
    let mut bands = test_bands();
    let mut loan = seeded_position(&market, &mut bands, wad(10), 0, 3);
    let full_tick = loan.ticks[0];

    let out = withdraw(
        &market,
        &mut bands,
        &mut loan,
        PERCENTAGE_PRECISION / 2,
        &mut NoOpHook,
    )
    .unwrap();
    assert!(out.collateral >= wad(5) - 5_000 && out.collateral <= wad(5));
    assert_eq!(loan.ticks[0], full_tick - full_tick / 2);
    assert!(loan.has_liquidity());
}

#[test]
fn dynamic_fee_tracks_deviation() {
    let base = 6_000_000_000_000_000;
    assert_eq!(dynamic_fee(base, wad(3_000), wad(3_000)).unwrap(), base);
    // 2% gap dominates the base fee
    assert_eq!(
        dynamic_fee(base, wad(3_060), wad(3_000)).unwrap(),
        PERCENTAGE_PRECISION * 2 / 100
    );
    // absurd gap is capped
    assert_eq!(
        dynamic_fee(base, wad(6_000), wad(3_000)).unwrap(),
        MAX_FEE * 5
    );
    assert_eq!(dynamic_fee(base, wad(3_000), 0).unwrap(), base);
}

#[test]
fn pump_partial_fill_conserves_input() {
    let mut market = test_market();
    market.fee = 0;
    let mut bands = test_bands();
    seeded_position(&market, &mut bands, wad(10), 0, 3);

    let p_oracle = market.oracle_price;
    let calc = calc_swap_out(&market, &bands, true, wad(1_000), p_oracle).unwrap();
    assert_eq!(calc.in_amount, wad(1_000));
    assert!(calc.out_amount > 0);
    // execution near the oracle price of 3000
    let avg = wad_avg_price(calc.in_amount, calc.out_amount).unwrap();
    assert!(avg > wad(2_990) && avg < wad(3_100), "avg price {}", avg);

    commit_swap(&mut market, &mut bands, &calc).unwrap();
    assert_eq!(market.active_band, 0);
    let (sum_x, sum_y) = bands.totals().unwrap();
    // fee-inclusive input all lands in the bands when admin fee is zero
    assert_eq!(sum_x, wad(1_000));
    assert_eq!(sum_y, wad(10) - calc.out_amount);
}

#[test]
fn pump_then_dump_roundtrip_bounded_by_fees() {
    let mut market = test_market();
    market.fee = 0;
    let mut bands = test_bands();
    seeded_position(&market, &mut bands, wad(10), 0, 3);
    let p_oracle = market.oracle_price;

    let pump = calc_swap_out(&market, &bands, true, wad(1_000), p_oracle).unwrap();
    commit_swap(&mut market, &mut bands, &pump).unwrap();

    let dump = calc_swap_out(&market, &bands, false, pump.out_amount, p_oracle).unwrap();
    commit_swap(&mut market, &mut bands, &dump).unwrap();

    // the AMM never pays out more than came in, and with only the dynamic
    // oracle-deviation fee in play the loss stays small
    assert!(dump.out_amount <= wad(1_000));
    assert!(dump.out_amount >= wad(980), "round trip returned {}", dump.out_amount);
}

#[test]
fn exact_out_drains_every_band() {
    let mut market = test_market();
    let mut bands = test_bands();
    seeded_position(&market, &mut bands, wad(10), 0, 3);
    let p_oracle = market.oracle_price;

    let calc = calc_swap_in(&market, &bands, true, wad(10), p_oracle).unwrap();
    assert_eq!(calc.out_amount, wad(10));
    // roughly 10 collateral around 3000 plus fees
    assert!(calc.in_amount > wad(29_000) && calc.in_amount < wad(33_000));

    commit_swap(&mut market, &mut bands, &calc).unwrap();
    let (_, sum_y) = bands.totals().unwrap();
    assert_eq!(sum_y, 0);
    assert!(market.active_band > 3);
}

#[test]
fn swap_with_no_liquidity_runs_off_grid() {
    let market = test_market();
    let bands = test_bands();
    assert!(calc_swap_out(&market, &bands, true, wad(1), market.oracle_price).is_err());
}

#[test]
fn sum_xy_matches_deposit() {
    let market = test_market();
    let mut bands = test_bands();
    let loan = seeded_position(&market, &mut bands, wad(10), 0, 3);
    let (x, y) = get_sum_xy(&market, &bands, &loan).unwrap();
    assert_eq!(x, 0);
    // dead shares shave a rounding hair off the claim
    assert!(y <= wad(10) && y >= wad(10) - 5_000);
}

#[test]
fn x_down_values_collateral_at_band_prices() {
    let market = test_market();
    let mut bands = test_bands();
    let loan = seeded_position(&market, &mut bands, wad(10), 0, 3);

    let x_down = get_x_down(&market, &bands, &loan, wad(3_000)).unwrap();
    // full conversion across bands 0..=3 prices out near 2.5 * (3030+3000+2970+2940)
    assert!(x_down > wad(29_000) && x_down < wad(30_500), "x_down = {}", x_down);

    // with the oracle far below the range the payoff is already all-borrowed
    let x_down_low = get_x_down(&market, &bands, &loan, wad(2_000)).unwrap();
    assert!(x_down_low < x_down);
}

#[test]
fn x_down_and_y_up_grow_under_trading_at_fixed_oracle() {
    let mut market = test_market();
    let mut bands = test_bands();
    let loan = seeded_position(&market, &mut bands, wad(10), 0, 3);
    let p_oracle = market.oracle_price;

    let mut x_down = get_x_down(&market, &bands, &loan, p_oracle).unwrap();
    let mut y_up = get_y_up(&market, &bands, &loan, p_oracle).unwrap();

    // fees accrue to the bands, so both payoff bounds only ratchet upward
    // while the oracle stands still
    for _ in 0..4 {
        let pump = calc_swap_out(&market, &bands, true, wad(2_000), p_oracle).unwrap();
        commit_swap(&mut market, &mut bands, &pump).unwrap();
        let xd = get_x_down(&market, &bands, &loan, p_oracle).unwrap();
        let yu = get_y_up(&market, &bands, &loan, p_oracle).unwrap();
        assert!(xd >= x_down, "x_down fell {} -> {}", x_down, xd);
        assert!(yu >= y_up, "y_up fell {} -> {}", y_up, yu);
        x_down = xd;
        y_up = yu;

        let dump = calc_swap_out(&market, &bands, false, pump.out_amount, p_oracle).unwrap();
        commit_swap(&mut market, &mut bands, &dump).unwrap();
        let xd = get_x_down(&market, &bands, &loan, p_oracle).unwrap();
        let yu = get_y_up(&market, &bands, &loan, p_oracle).unwrap();
        assert!(xd >= x_down, "x_down fell {} -> {}", x_down, xd);
        assert!(yu >= y_up, "y_up fell {} -> {}", y_up, yu);
        x_down = xd;
        y_up = yu;
    }
}

#[test]
fn y_up_returns_collateral_when_price_above_range() {
    let market = test_market();
    let mut bands = test_bands();
    let loan = seeded_position(&market, &mut bands, wad(10), 0, 3);
    let y_up = get_y_up(&market, &bands, &loan, wad(3_000)).unwrap();
    // dead shares cost each band a rounding hair
    assert!(y_up <= wad(10) && y_up >= wad(10) - 5_000, "y_up = {}", y_up);
}

#[test]
fn xy_up_empty_loan_is_zero() {
    let market = test_market();
    let bands = test_bands();
    let loan = test_loan();
    assert_eq!(get_x_down(&market, &bands, &loan, wad(3_000)).unwrap(), 0);
    assert_eq!(get_y_up(&market, &bands, &loan, wad(3_000)).unwrap(), 0);
}

#[test]
fn amount_for_price_repegs_the_amm() {
    let mut market = test_market();
    market.fee = 0;
    let mut bands = test_bands();
    seeded_position(&market, &mut bands, wad(10), 0, 3);
    let p_oracle = market.oracle_price;
    market.active_band = 0;

    let target = wad(3_020);
    let (amount, pump) = get_amount_for_price(&market, &bands, target, p_oracle).unwrap();
    assert!(pump);
    assert!(amount > 0);

    let calc = calc_swap_out(&market, &bands, true, amount, p_oracle).unwrap();
    commit_swap(&mut market, &mut bands, &calc).unwrap();

    let p_after = get_p(&market, &bands, p_oracle).unwrap();
    let drift = p_after.abs_diff(target);
    assert!(
        drift < target / 100,
        "ended at {} aiming for {}",
        p_after,
        target
    );
}

#[test]
fn reset_admin_fees_zeroes_accumulators() {
    let mut market = test_market();
    market.admin_fees_x = wad(3);
    market.admin_fees_y = wad(1);
    assert_eq!(reset_admin_fees(&mut market), (wad(3), wad(1)));
    assert_eq!(market.admin_fees_x, 0);
    assert_eq!(market.admin_fees_y, 0);
}

#[test]
fn price_in_band_checks_bounds() {
    let market = test_market();
    assert!(price_in_band(&market, 0, wad(2_985)).unwrap());
    assert!(!price_in_band(&market, 0, wad(3_010)).unwrap());
    assert!(!price_in_band(&market, 0, wad(2_960)).unwrap());
}

#[test]
fn get_p_on_empty_active_band_quotes_virtual_price() {
    let market = test_market(); // active band -1 is empty
    let bands = test_bands();
    let p = get_p(&market, &bands, wad(3_000)).unwrap();
    assert!(p > wad(2_900) && p < wad(3_000), "virtual quote {}", p);
}
