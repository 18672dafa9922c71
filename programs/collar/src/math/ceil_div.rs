use crate::math::bn::{U192, U256};
use num_traits::Zero;

/// Division rounding up, for amounts owed to the pool.
pub trait CheckedCeilDiv: Sized {
    fn checked_ceil_div(&self, rhs: Self) -> Option<Self>;
}

macro_rules! ceil_div_impl {
    ($t:ty) => {
        impl CheckedCeilDiv for $t {
            #[track_caller]
            #[inline]
            fn checked_ceil_div(&self, rhs: $t) -> Option<$t> {
                let quotient = self.checked_div(rhs)?;
                if self.checked_rem(rhs)?.is_zero() {
                    Some(quotient)
                } else {
                    quotient.checked_add(1u8.into())
                }
            }
        }
    };
}

ceil_div_impl!(U256);
ceil_div_impl!(U192);
ceil_div_impl!(u128);
ceil_div_impl!(u64);
