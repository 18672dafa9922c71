/// Implemented on accounts so instruction contexts can size their `init`
/// allocations (includes the 8 byte discriminator).
pub trait Size {
    const SIZE: usize;
}
