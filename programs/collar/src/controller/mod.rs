pub mod amm;
pub mod interest;
pub mod liquidation;
pub mod loan;
pub mod token;
