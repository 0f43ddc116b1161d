//! Sealed trait marker for Transport implementations.
//!
//! Prevents implementations of `Transport` outside this crate, so every
//! transport applies the same header and hygiene rules.

pub(crate) mod private {
    /// Sealed trait marker.
    pub trait Sealed {}
}
