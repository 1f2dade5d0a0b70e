//! Fixed-length vectors of trits `{0, 1, unknown}`, LSB-first.
//!
//! `BitVec` is the data structure the branch-and-prune engines walk one
//! position at a time. Index 0 is always the least significant bit;
//! `parse_msb_first`/`Display` handle the MSB-first convention callers use
//! at the boundary.
//!
//! Mutating operations (`set`, `pad_to`) return a new `BitVec` rather than
//! mutating in place — search nodes hold a `BitVec` each and siblings must
//! not see each other's writes. Values here are sparse and ternary, so a
//! `Vec<Trit>` is the right trade-off over a packed bitset (structural
//! sharing is a valid future optimization, not required for correctness).

use crate::error::BitVecError;
use rug::Integer;
use std::fmt;

/// A single bit position: known 0, known 1, or erased/unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trit {
    Zero,
    One,
    Unknown,
}

impl Trit {
    pub fn is_known(self) -> bool {
        !matches!(self, Trit::Unknown)
    }

    /// Parse a single input character: `'0'`, `'1'`, or `'?'` for unknown.
    fn from_char(c: char, position: usize) -> Result<Self, BitVecError> {
        match c {
            '0' => Ok(Trit::Zero),
            '1' => Ok(Trit::One),
            '?' => Ok(Trit::Unknown),
            char => Err(BitVecError::InvalidChar { char, position }),
        }
    }
}

impl fmt::Display for Trit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trit::Zero => write!(f, "0"),
            Trit::One => write!(f, "1"),
            Trit::Unknown => write!(f, "?"),
        }
    }
}

/// A length-`L` ternary vector, index 0 = least significant bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitVec {
    bits: Vec<Trit>,
}

impl BitVec {
    /// A length-`len` vector of all-zero bits.
    ///
    /// # Panics
    /// Panics if `len == 0` — a vector must have nonzero length.
    pub fn new_zeros(len: usize) -> Self {
        assert!(len > 0, "BitVec length must be nonzero");
        BitVec {
            bits: vec![Trit::Zero; len],
        }
    }

    /// A length-`len` vector with only bit 0 set to `lsb`, the rest zero.
    /// This is the root-node shape used by both search engines.
    pub fn with_lsb(lsb: Trit, len: usize) -> Self {
        let mut v = Self::new_zeros(len);
        v.bits[0] = lsb;
        v
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Get the trit at `index`.
    ///
    /// # Panics
    /// Panics if `index >= len()` — callers must not address outside the
    /// vector's fixed length.
    pub fn get(&self, index: usize) -> Trit {
        self.bits[index]
    }

    /// Return a new `BitVec` with `index` set to `value`. Overwriting an
    /// already-assigned position is permitted (the search engines only do
    /// this once consistency at that position has been verified).
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    pub fn set(&self, index: usize, value: Trit) -> Self {
        let mut v = self.clone();
        v.bits[index] = value;
        v
    }

    /// Convert to a nonnegative integer. Fails if any bit is `Unknown` —
    /// silently treating an unknown bit as 0 or 1 here would produce a
    /// value the caller didn't ask for.
    pub fn to_int(&self) -> Result<Integer, BitVecError> {
        let mut value = Integer::new();
        for (i, &t) in self.bits.iter().enumerate().rev() {
            let bit = match t {
                Trit::Zero => 0u32,
                Trit::One => 1u32,
                Trit::Unknown => return Err(BitVecError::UnknownBit { index: i }),
            };
            value <<= 1u32;
            value |= bit;
        }
        Ok(value)
    }

    /// Build a fully-known, length-`len` vector from `n`, LSB-first.
    ///
    /// # Panics
    /// Panics if `n` does not fit in `len` bits.
    pub fn from_int(n: &Integer, len: usize) -> Self {
        assert!(
            n.significant_bits() as usize <= len,
            "value needs more than {} bits",
            len
        );
        let mut bits = Vec::with_capacity(len);
        for i in 0..len {
            bits.push(if n.get_bit(i as u32) {
                Trit::One
            } else {
                Trit::Zero
            });
        }
        BitVec { bits }
    }

    /// Zero-extend at the MSB side to reach `len`. A no-op if already at
    /// (or past) that length — idempotent under repeated padding to the
    /// same target.
    pub fn pad_to(&self, len: usize) -> Self {
        if self.bits.len() >= len {
            return self.clone();
        }
        let mut bits = self.bits.clone();
        bits.resize(len, Trit::Zero);
        BitVec { bits }
    }

    /// Bits in MSB-first order, for display only.
    pub fn reverse_msb_first(&self) -> Vec<Trit> {
        self.bits.iter().rev().copied().collect()
    }

    /// Parse an MSB-first string of `0`/`1`/`?` into an LSB-first `BitVec`.
    /// This is the one place external MSB-first input crosses into the
    /// internal LSB-first representation.
    pub fn parse_msb_first(s: &str) -> Result<Self, BitVecError> {
        if s.is_empty() {
            return Err(BitVecError::ZeroLength);
        }
        let mut bits = Vec::with_capacity(s.len());
        for (position, c) in s.chars().rev().enumerate() {
            bits.push(Trit::from_char(c, position)?);
        }
        Ok(BitVec { bits })
    }
}

impl fmt::Display for BitVec {
    /// MSB-first, matching `parse_msb_first`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for t in self.reverse_msb_first() {
            write!(f, "{}", t)?;
        }
        Ok(())
    }
}

/// Zero-extend the shorter of two vectors at the MSB side to match the
/// longer.
pub fn pad_pair(a: &BitVec, b: &BitVec) -> (BitVec, BitVec) {
    let len = a.len().max(b.len());
    (a.pad_to(len), b.pad_to(len))
}
