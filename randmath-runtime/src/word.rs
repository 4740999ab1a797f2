//! Register word abstraction.
//!
//! Programs operate on either 32-bit or 64-bit register lanes. Both backends
//! are generic over the lane width through the [`Word`] trait so that the
//! arithmetic semantics are written exactly once. The trait is sealed: the
//! only lane widths with defined behavior are `u32` and `u64`.

use std::fmt::Debug;
use std::ops::BitXor;

mod private {
    pub trait Sealed {}
    impl Sealed for u32 {}
    impl Sealed for u64 {}
}

/// A register lane: an unsigned machine word with wrapping arithmetic.
///
/// All operations wrap modulo 2^W. Rotation counts are taken from a source
/// register value reduced modulo the lane width, so a count of zero leaves
/// the value unchanged.
pub trait Word:
    private::Sealed + Copy + Eq + Debug + Default + BitXor<Output = Self> + 'static
{
    /// Lane width in bits.
    const BITS: u32;

    fn wrapping_mul(self, rhs: Self) -> Self;
    fn wrapping_add(self, rhs: Self) -> Self;
    fn wrapping_sub(self, rhs: Self) -> Self;
    fn rotate_right(self, count: u32) -> Self;
    fn rotate_left(self, count: u32) -> Self;

    /// Widens a 32-bit immediate into a lane value.
    ///
    /// Immediates are unsigned: on 64-bit lanes the upper half is zero.
    fn from_imm(imm: u32) -> Self;

    /// Reduces this value to a rotation count modulo the lane width.
    fn rotate_count(self) -> u32;
}

impl Word for u32 {
    const BITS: u32 = 32;

    #[inline]
    fn wrapping_mul(self, rhs: Self) -> Self {
        u32::wrapping_mul(self, rhs)
    }

    #[inline]
    fn wrapping_add(self, rhs: Self) -> Self {
        u32::wrapping_add(self, rhs)
    }

    #[inline]
    fn wrapping_sub(self, rhs: Self) -> Self {
        u32::wrapping_sub(self, rhs)
    }

    #[inline]
    fn rotate_right(self, count: u32) -> Self {
        u32::rotate_right(self, count)
    }

    #[inline]
    fn rotate_left(self, count: u32) -> Self {
        u32::rotate_left(self, count)
    }

    #[inline]
    fn from_imm(imm: u32) -> Self {
        imm
    }

    #[inline]
    fn rotate_count(self) -> u32 {
        self % Self::BITS
    }
}

impl Word for u64 {
    const BITS: u32 = 64;

    #[inline]
    fn wrapping_mul(self, rhs: Self) -> Self {
        u64::wrapping_mul(self, rhs)
    }

    #[inline]
    fn wrapping_add(self, rhs: Self) -> Self {
        u64::wrapping_add(self, rhs)
    }

    #[inline]
    fn wrapping_sub(self, rhs: Self) -> Self {
        u64::wrapping_sub(self, rhs)
    }

    #[inline]
    fn rotate_right(self, count: u32) -> Self {
        u64::rotate_right(self, count)
    }

    #[inline]
    fn rotate_left(self, count: u32) -> Self {
        u64::rotate_left(self, count)
    }

    #[inline]
    fn from_imm(imm: u32) -> Self {
        imm as u64
    }

    #[inline]
    fn rotate_count(self) -> u32 {
        (self % u64::from(Self::BITS)) as u32
    }
}
