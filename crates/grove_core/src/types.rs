//! Core types for Grove
//!
//! Provides fundamental type aliases and validated wrapper types
//! used throughout the workspace.

use crate::error::{GroveError, GroveResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// Qubit identifier (0-indexed)
pub type QubitId = usize;

/// Classical bit identifier (0-indexed)
pub type ClbitId = usize;

/// Rotation angle in radians
pub type Angle = f64;

/// Measurement counts: bitstring -> count
///
/// Ordered so reports and histograms iterate deterministically.
pub type Counts = BTreeMap<String, u64>;

// ============================================================================
// Bitstring
// ============================================================================

/// A non-empty string of classical bits.
///
/// Character `i` addresses qubit `i`, so `"101"` marks qubits 0 and 2.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Bitstring {
    bits: Vec<bool>,
}

impl Bitstring {
    /// Create from a vector of bools
    pub fn new(bits: Vec<bool>) -> GroveResult<Self> {
        if bits.is_empty() {
            return Err(GroveError::EmptyBitstring);
        }
        Ok(Self { bits })
    }

    /// Create from string (e.g., "0110")
    pub fn parse(s: &str) -> GroveResult<Self> {
        if s.is_empty() {
            return Err(GroveError::EmptyBitstring);
        }
        let bits: Result<Vec<bool>, _> = s
            .chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                _ => Err(GroveError::InvalidBitstring(s.to_string())),
            })
            .collect();
        Ok(Self { bits: bits? })
    }

    /// All-ones bitstring of given length
    pub fn ones(n: usize) -> GroveResult<Self> {
        Self::new(vec![true; n])
    }

    /// All-zeros bitstring of given length
    pub fn zeros(n: usize) -> GroveResult<Self> {
        Self::new(vec![false; n])
    }

    /// Get the number of bits
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Always false: empty bitstrings are rejected at construction
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Count number of 1s (Hamming weight)
    pub fn popcount(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Get bit at index (index 0 is the leftmost character)
    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).copied()
    }

    /// Iterate over bits, qubit 0 first
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    /// Basis-state index whose binary digits read as this string
    pub fn to_usize(&self) -> usize {
        self.bits
            .iter()
            .rev()
            .enumerate()
            .filter(|(_, &b)| b)
            .map(|(i, _)| 1 << i)
            .sum()
    }

    /// Render a basis index as an `n`-character bitstring (inverse of `to_usize`)
    pub fn format_index(index: usize, n: usize) -> String {
        format!("{:0width$b}", index, width = n)
    }
}

impl fmt::Display for Bitstring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.bits {
            write!(f, "{}", if b { '1' } else { '0' })?;
        }
        Ok(())
    }
}

impl FromStr for Bitstring {
    type Err = GroveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Bitstring {
    type Error = GroveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Bitstring> for String {
    fn from(value: Bitstring) -> Self {
        value.to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitstring_parse() {
        let bs = Bitstring::parse("0110").unwrap();
        assert_eq!(bs.len(), 4);
        assert_eq!(bs.popcount(), 2);
        assert_eq!(bs.to_string(), "0110");
    }

    #[test]
    fn test_bitstring_rejects_invalid() {
        assert!(matches!(
            Bitstring::parse("10a1"),
            Err(GroveError::InvalidBitstring(_))
        ));
        assert_eq!(Bitstring::parse(""), Err(GroveError::EmptyBitstring));
        assert_eq!(Bitstring::ones(0), Err(GroveError::EmptyBitstring));
    }

    #[test]
    fn test_bitstring_index_convention() {
        // Leftmost character is the most significant digit of the index
        let bs = Bitstring::parse("101").unwrap();
        assert_eq!(bs.to_usize(), 5);
        assert_eq!(Bitstring::format_index(5, 3), "101");
        assert_eq!(Bitstring::format_index(1, 4), "0001");
        assert_eq!(bs.get(0), Some(true));
        assert_eq!(bs.get(1), Some(false));
        assert_eq!(bs.get(3), None);
    }

    #[test]
    fn test_bitstring_serde() {
        let bs = Bitstring::parse("1011").unwrap();
        let json = serde_json::to_string(&bs).unwrap();
        assert_eq!(json, "\"1011\"");

        let back: Bitstring = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bs);
        assert!(serde_json::from_str::<Bitstring>("\"12\"").is_err());
    }

    #[test]
    fn test_ones() {
        let bs = Bitstring::ones(4).unwrap();
        assert_eq!(bs.to_string(), "1111");
        assert_eq!(bs.to_usize(), 15);
    }
}
