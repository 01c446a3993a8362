//! Fixed-width perceptual hash bit strings.
//!
//! Bit `0` is the most significant bit, so a hash printed as hex reads the same way the
//! trie walks it. Shorter values are conceptually zero-padded on the left.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use bitvec::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::PHashError;

/// Backing storage for [`PHash`].
pub type HashBits = BitVec<u64, Msb0>;

/// A perceptual hash of fixed bit length.
///
/// Storage words beyond `len()` are always zero, which lets [`PHash::hamming_distance`]
/// work on whole `u64` words.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PHash {
    bits: HashBits,
}

impl PHash {
    /// Returns an all-zero hash of `bit_length` bits.
    pub fn zeros(bit_length: usize) -> Self {
        Self {
            bits: BitVec::repeat(false, bit_length),
        }
    }

    /// Builds a `bit_length`-bit hash holding `value` in its low bits.
    pub fn from_u64(value: u64, bit_length: usize) -> Result<Self, PHashError> {
        let significant = (u64::BITS - value.leading_zeros()) as usize;
        if significant > bit_length {
            return Err(PHashError::TooWide {
                bits: significant,
                bit_length,
            });
        }

        let mut hash = Self::zeros(bit_length);
        for shift in 0..significant {
            if (value >> shift) & 1 == 1 {
                hash.bits.set(bit_length - 1 - shift, true);
            }
        }
        Ok(hash)
    }

    /// Builds a hash from bits listed most significant first.
    pub fn from_bits(bits: &[bool]) -> Self {
        let mut hash = Self::zeros(bits.len());
        for (position, &bit) in bits.iter().enumerate() {
            if bit {
                hash.bits.set(position, true);
            }
        }
        hash
    }

    /// Parses a hex string (optional `0x` prefix) into a `bit_length`-bit hash.
    pub fn from_hex(input: &str, bit_length: usize) -> Result<Self, PHashError> {
        let nibbles = parse_nibbles(input)?;
        let total = nibbles.len() * 4;

        let leading_zeros = nibbles
            .iter()
            .position(|&n| n != 0)
            .map(|i| i * 4 + nibbles[i].leading_zeros() as usize - 4)
            .unwrap_or(total);
        let significant = total - leading_zeros;
        if significant > bit_length {
            return Err(PHashError::TooWide {
                bits: significant,
                bit_length,
            });
        }

        let mut hash = Self::zeros(bit_length);
        let offset = bit_length as isize - total as isize;
        for (index, nibble) in nibbles.iter().enumerate() {
            for j in 0..4 {
                if (nibble >> (3 - j)) & 1 == 1 {
                    // Only zero bits can land before the target window.
                    let target = offset + (index * 4 + j) as isize;
                    hash.bits.set(target as usize, true);
                }
            }
        }
        Ok(hash)
    }

    /// Parses a hex string using four bits per digit as the width.
    pub fn parse_hex(input: &str) -> Result<Self, PHashError> {
        let digits = parse_nibbles(input)?.len();
        Self::from_hex(input, digits * 4)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Returns the bit at `position` (0 = most significant).
    #[inline]
    pub fn bit(&self, position: usize) -> bool {
        self.bits[position]
    }

    #[inline]
    pub fn as_bits(&self) -> &BitSlice<u64, Msb0> {
        &self.bits
    }

    #[inline]
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    /// Number of bits needed to represent the value (no leading zeros).
    pub fn significant_bits(&self) -> usize {
        self.bits
            .first_one()
            .map(|first| self.len() - first)
            .unwrap_or(0)
    }

    /// Re-expresses the value at exactly `bit_length` bits.
    ///
    /// Narrower hashes are left-padded with zeros; wider hashes are accepted only when
    /// their extra leading bits are all zero.
    pub fn fit_to(&self, bit_length: usize) -> Result<Cow<'_, PHash>, PHashError> {
        if self.len() == bit_length {
            return Ok(Cow::Borrowed(self));
        }

        let significant = self.significant_bits();
        if significant > bit_length {
            return Err(PHashError::TooWide {
                bits: significant,
                bit_length,
            });
        }

        let mut fitted = Self::zeros(bit_length);
        let src_start = self.len() - significant;
        let dst_start = bit_length - significant;
        fitted.bits[dst_start..].copy_from_bitslice(&self.bits[src_start..]);
        Ok(Cow::Owned(fitted))
    }

    /// Counts differing bit positions.
    ///
    /// Hashes of different widths are compared as if the narrower one were left-padded.
    pub fn hamming_distance(&self, other: &PHash) -> u32 {
        if self.len() == other.len() {
            return xor_popcount(self.bits.as_raw_slice(), other.bits.as_raw_slice());
        }

        let width = self.len().max(other.len());
        match (self.fit_to(width), other.fit_to(width)) {
            (Ok(a), Ok(b)) => xor_popcount(a.bits.as_raw_slice(), b.bits.as_raw_slice()),
            // fit_to never fails when widening.
            _ => u32::MAX,
        }
    }

    /// Lower-case hex, left-padded to a whole number of digits.
    pub fn to_hex(&self) -> String {
        let width = self.len().div_ceil(4) * 4;
        let offset = width - self.len();
        let mut out = String::with_capacity(width / 4);
        for nibble_index in 0..width / 4 {
            let mut nibble = 0u32;
            for j in 0..4 {
                let position = nibble_index * 4 + j;
                nibble <<= 1;
                if position >= offset && self.bits[position - offset] {
                    nibble |= 1;
                }
            }
            out.push(char::from_digit(nibble, 16).unwrap_or('0'));
        }
        out
    }
}

/// Hamming distance between two equal-width hashes.
#[inline]
pub fn hamming_distance(a: &PHash, b: &PHash) -> u32 {
    a.hamming_distance(b)
}

#[inline]
fn xor_popcount(a: &[u64], b: &[u64]) -> u32 {
    a.iter().zip(b.iter()).map(|(&x, &y)| (x ^ y).count_ones()).sum()
}

fn parse_nibbles(input: &str) -> Result<Vec<u8>, PHashError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() {
        return Err(PHashError::Empty);
    }

    digits
        .chars()
        .enumerate()
        .map(|(position, found)| {
            found
                .to_digit(16)
                .map(|d| d as u8)
                .ok_or(PHashError::InvalidHex { found, position })
        })
        .collect()
}

impl FromStr for PHash {
    type Err = PHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl fmt::Display for PHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for PHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PHash({}b, 0x{})", self.len(), self.to_hex())
    }
}

impl Serialize for PHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
