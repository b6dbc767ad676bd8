//! Block difficulty and chain weight.
//!
//! Difficulty is an arbitrary-precision (256-bit) non-negative integer. The
//! same type carries the derived weights used by fork choice: a block's local
//! weight (its difficulty plus its uncles') and a chain's cumulative weight.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Block difficulty, or a sum of difficulties.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Difficulty(U256);

impl Difficulty {
    pub const ZERO: Self = Self(U256([0, 0, 0, 0]));
    pub const ONE: Self = Self(U256([1, 0, 0, 0]));

    pub fn new(value: U256) -> Self {
        Self(value)
    }

    pub fn from_u64(value: u64) -> Self {
        Self(U256::from(value))
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Big-endian 32-byte encoding, used when hashing headers.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        self.0.to_big_endian(&mut out);
        out
    }
}

// Weights saturate rather than panic; 2^256 is unreachable in practice.
impl Add for Difficulty {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Difficulty {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Difficulty {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<u64> for Difficulty {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_of_difficulties() {
        let total: Difficulty = [1u64, 2, 3].into_iter().map(Difficulty::from).sum();
        assert_eq!(total, Difficulty::from_u64(6));
    }

    #[test]
    fn sum_of_nothing_is_zero() {
        let total: Difficulty = std::iter::empty().sum();
        assert!(total.is_zero());
    }

    #[test]
    fn addition_saturates_at_max() {
        let max = Difficulty::new(U256::MAX);
        assert_eq!(max + Difficulty::ONE, max);
    }

    #[test]
    fn ordering_follows_magnitude() {
        assert!(Difficulty::from_u64(5) > Difficulty::from_u64(4));
        assert!(Difficulty::ZERO < Difficulty::ONE);
    }
}
