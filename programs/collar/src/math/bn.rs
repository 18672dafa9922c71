//! Big number types for overflow-free intermediate products

#![allow(clippy::assign_op_pattern)]
#![allow(clippy::ptr_offset_with_cast)]
#![allow(clippy::manual_range_contains)]

use std::convert::TryInto;

use uint::construct_uint;

use crate::error::CollarResult;
use crate::error::ErrorCode::BnConversionError;

construct_uint! {
    /// 256-bit unsigned integer.
    pub struct U256(4);
}

construct_uint! {
    /// 192-bit unsigned integer.
    pub struct U192(3);
}

impl U256 {
    pub fn try_to_u128(self) -> CollarResult<u128> {
        self.try_into().map_err(|_| BnConversionError)
    }
}

impl U192 {
    pub fn try_to_u128(self) -> CollarResult<u128> {
        self.try_into().map_err(|_| BnConversionError)
    }
}
