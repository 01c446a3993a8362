//! Cross-cutting, shared constants.
//!
//! The catalog bit length `B` is fixed when the index is built. Every policy value that
//! depends on it (default tolerance, similarity) is derived here so the index, the session
//! cache and the gateway agree on the same numbers.

use std::time::Duration;

/// Bit lengths the reference catalogs are published in.
pub const SUPPORTED_BIT_LENGTHS: [usize; 3] = [64, 256, 1024];

pub const DEFAULT_BIT_LENGTH: usize = 256;

/// Fraction of `B` accepted as the default match tolerance.
pub const DEFAULT_TOLERANCE_RATIO: f64 = 0.375;

/// Cached candidates only help across consecutive frames of the same card.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_millis(750);

pub const DEFAULT_TOP_N: usize = 1;

/// Distinct recent queries remembered in front of the index.
pub const DEFAULT_QUERY_MEMO_CAPACITY: u64 = 1024;

/// Returns `floor(bit_length * 0.375)`.
///
/// Integer arithmetic (`3/8`) keeps the result exact for every bit length.
#[inline]
pub fn default_tolerance(bit_length: usize) -> u32 {
    (bit_length * 3 / 8) as u32
}

/// Normalized similarity `1 - distance / bit_length`, clamped to `[0, 1]`.
#[inline]
pub fn similarity(distance: u32, bit_length: usize) -> f32 {
    if bit_length == 0 {
        return 0.0;
    }
    (1.0 - distance as f32 / bit_length as f32).clamp(0.0, 1.0)
}

/// Returns `true` if `bit_length` is one of [`SUPPORTED_BIT_LENGTHS`].
///
/// Other positive lengths still work; this only drives a startup warning.
#[inline]
pub fn is_published_bit_length(bit_length: usize) -> bool {
    SUPPORTED_BIT_LENGTHS.contains(&bit_length)
}
