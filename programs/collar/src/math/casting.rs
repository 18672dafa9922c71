use crate::error::{CollarResult, ErrorCode};
use std::convert::TryInto;

/// Fallible narrowing between integer types, erroring instead of truncating.
pub trait Cast: Sized {
    fn cast<T: std::convert::TryFrom<Self>>(self) -> CollarResult<T> {
        self.try_into().map_err(|_| ErrorCode::CastingFailure)
    }
}

impl Cast for u128 {}
impl Cast for u64 {}
impl Cast for u32 {}
impl Cast for i128 {}
impl Cast for i64 {}
impl Cast for i32 {}
impl Cast for usize {}
