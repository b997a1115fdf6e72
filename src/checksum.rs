//! Structural validation for 8-digit institutional IDs.
//!
//! Digits are weighted 8 down to 1 from left to right; an ID is valid when
//! the weighted sum is divisible by 11. Anything whose decimal form is not
//! exactly eight digits long is rejected outright.

use std::ops::RangeInclusive;

pub const ID_DIGITS: usize = 8;

pub fn is_valid(candidate: u64) -> bool {
    let text = candidate.to_string();
    if text.len() != ID_DIGITS {
        return false;
    }

    let total: u32 = text
        .bytes()
        .enumerate()
        .map(|(i, b)| u32::from(b - b'0') * (ID_DIGITS - i) as u32)
        .sum();

    total % 11 == 0
}

/// Iterate the structurally valid IDs of an inclusive range, ascending.
pub fn valid_in(range: RangeInclusive<u64>) -> impl Iterator<Item = u64> {
    range.filter(|&id| is_valid(id))
}
