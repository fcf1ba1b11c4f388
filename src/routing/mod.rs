//! Key-to-position routing: ring positions, partitioners and the hash ring.

pub mod partitioner;
pub mod ring;

/// A position on the hash ring.
///
/// It is the result of hashing a routing key or a virtual node label with one
/// of the [`partitioner`]s. The position space is the full 32-bit unsigned
/// range; every value is valid and the ring wraps around after [`u32::MAX`].
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug)]
pub struct RingPosition {
    value: u32,
}

impl RingPosition {
    /// Creates a new position with the given value.
    pub fn new(value: u32) -> Self {
        RingPosition { value }
    }

    /// Retrieves the raw value of the position.
    pub fn value(&self) -> u32 {
        self.value
    }
}
