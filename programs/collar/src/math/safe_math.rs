use crate::error::{CollarResult, ErrorCode};
use crate::math::bn::{U192, U256};
use crate::math::ceil_div::CheckedCeilDiv;
use solana_program::msg;
use std::panic::Location;

/// Checked arithmetic that reverts instead of wrapping. Every overflow is
/// logged with its call site.
pub trait SafeMath: Sized {
    fn safe_add(self, rhs: Self) -> CollarResult<Self>;
    fn safe_sub(self, rhs: Self) -> CollarResult<Self>;
    fn safe_mul(self, rhs: Self) -> CollarResult<Self>;
    fn safe_div(self, rhs: Self) -> CollarResult<Self>;
}

/// Ceiling division for the unsigned types reserve math runs on.
pub trait SafeDivCeil: Sized {
    fn safe_div_ceil(self, rhs: Self) -> CollarResult<Self>;
}

fn log_math_error(caller: &Location<'_>) -> ErrorCode {
    msg!("Math error thrown at {}:{}", caller.file(), caller.line());
    ErrorCode::MathError
}

macro_rules! safe_math_impl {
    ($t:ty) => {
        impl SafeMath for $t {
            #[track_caller]
            #[inline(always)]
            fn safe_add(self, v: $t) -> CollarResult<$t> {
                let caller = Location::caller();
                self.checked_add(v).ok_or_else(|| log_math_error(caller))
            }

            #[track_caller]
            #[inline(always)]
            fn safe_sub(self, v: $t) -> CollarResult<$t> {
                let caller = Location::caller();
                self.checked_sub(v).ok_or_else(|| log_math_error(caller))
            }

            #[track_caller]
            #[inline(always)]
            fn safe_mul(self, v: $t) -> CollarResult<$t> {
                let caller = Location::caller();
                self.checked_mul(v).ok_or_else(|| log_math_error(caller))
            }

            #[track_caller]
            #[inline(always)]
            fn safe_div(self, v: $t) -> CollarResult<$t> {
                let caller = Location::caller();
                self.checked_div(v).ok_or_else(|| log_math_error(caller))
            }
        }
    };
}

macro_rules! safe_div_ceil_impl {
    ($t:ty) => {
        impl SafeDivCeil for $t {
            #[track_caller]
            #[inline(always)]
            fn safe_div_ceil(self, v: $t) -> CollarResult<$t> {
                let caller = Location::caller();
                self.checked_ceil_div(v).ok_or_else(|| log_math_error(caller))
            }
        }
    };
}

safe_math_impl!(U256);
safe_math_impl!(U192);
safe_math_impl!(u128);
safe_math_impl!(u64);
safe_math_impl!(u32);
safe_math_impl!(i128);
safe_math_impl!(i64);
safe_math_impl!(i32);

safe_div_ceil_impl!(U256);
safe_div_ceil_impl!(U192);
safe_div_ceil_impl!(u128);
safe_div_ceil_impl!(u64);
