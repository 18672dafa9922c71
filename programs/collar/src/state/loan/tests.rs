use crate::math::constants::PRICE_PRECISION;
use crate::state::loan::Loan;
use crate::test_utils::wad;

#[test]
fn fresh_loan_does_not_exist() {
    let loan = Loan::default();
    assert!(!loan.exists());
    assert!(!loan.has_liquidity());
}

#[test]
fn loan_with_shares_exists() {
    let mut loan = Loan::default();
    loan.ticks[3] = 1;
    assert!(loan.exists());
    assert!(loan.has_liquidity());
}

#[test]
fn num_ticks_from_range() {
    let mut loan = Loan::default();
    loan.n1 = 5;
    loan.n2 = 8;
    assert_eq!(loan.num_ticks().unwrap(), 4);

    loan.n2 = 4;
    assert!(loan.num_ticks().is_err());

    loan.n2 = 5 + 50;
    assert!(loan.num_ticks().is_err());
}

#[test]
fn debt_compounds_against_snapshot() {
    let mut loan = Loan::default();
    loan.debt = wad(100);
    loan.rate_mul = PRICE_PRECISION;

    // accumulator grew 10% since the snapshot
    let now_mul = PRICE_PRECISION + PRICE_PRECISION / 10;
    assert_eq!(loan.current_debt(now_mul).unwrap(), wad(110));
    assert_eq!(loan.current_debt(PRICE_PRECISION).unwrap(), wad(100));
}

#[test]
fn zero_debt_is_zero_at_any_accumulator() {
    let loan = Loan::default();
    assert_eq!(loan.current_debt(7 * PRICE_PRECISION).unwrap(), 0);
}

#[test]
fn clear_resets_position() {
    let mut loan = Loan::default();
    loan.debt = wad(5);
    loan.n1 = 2;
    loan.n2 = 5;
    loan.ticks[0] = 10;
    loan.clear();
    assert!(!loan.exists());
    assert_eq!(loan.n1, 0);
    assert_eq!(loan.n2, 0);
}
