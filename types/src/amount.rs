//! Coin amounts: transaction values and gas prices.
//!
//! Amounts are unsigned 256-bit integers counted in the smallest unit.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// A non-negative coin amount.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coin(U256);

impl Coin {
    pub const ZERO: Self = Self(U256([0, 0, 0, 0]));

    pub fn new(raw: U256) -> Self {
        Self(raw)
    }

    pub fn from_u64(raw: u64) -> Self {
        Self(U256::from(raw))
    }

    pub fn raw(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Big-endian 32-byte encoding, used when hashing.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        self.0.to_big_endian(&mut out);
        out
    }
}

impl Add for Coin {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl From<u64> for Coin {
    fn from(raw: u64) -> Self {
        Self::from_u64(raw)
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_endian_bytes_place_low_value_last() {
        let bytes = Coin::from_u64(0x0102).to_be_bytes();
        assert_eq!(bytes[30], 0x01);
        assert_eq!(bytes[31], 0x02);
        assert!(bytes[..30].iter().all(|b| *b == 0));
    }

    #[test]
    fn checked_sub_underflow_is_none() {
        assert!(Coin::from_u64(1).checked_sub(Coin::from_u64(2)).is_none());
        assert_eq!(
            Coin::from_u64(5).checked_sub(Coin::from_u64(2)),
            Some(Coin::from_u64(3))
        );
    }
}
