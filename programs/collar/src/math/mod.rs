pub mod bands;
pub mod bn;
pub mod casting;
pub mod ceil_div;
pub mod constants;
pub mod helpers;
pub mod loan;
pub mod safe_math;
