// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License
//
// Fixed width vectors of four-valued digits.

use num_bigint::BigUint;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("invalid digit for radix {radix} in `{input}`")]
    InvalidDigit { input: String, radix: u32 },
    #[error("bad radix: {0}")]
    UnsupportedRadix(u32),
    #[error("invalid bit value: {0}")]
    InvalidBitValue(u8),
}

/// One digit of a four-valued bit vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum LogicState {
    #[default]
    Zero = 0,
    One = 1,
    X = 2,
    Z = 3,
}

impl LogicState {
    /// Accepts `0`, `1` and both cases of `x` and `z`.
    #[inline]
    pub fn from_ascii(c: u8) -> Option<Self> {
        match c {
            b'0' => Some(LogicState::Zero),
            b'1' => Some(LogicState::One),
            b'x' | b'X' => Some(LogicState::X),
            b'z' | b'Z' => Some(LogicState::Z),
            _ => None,
        }
    }

    #[inline]
    pub fn to_char(self) -> char {
        FOUR_STATE_LOOKUP[self as usize]
    }

    #[inline]
    pub fn is_unknown(self) -> bool {
        matches!(self, LogicState::X | LogicState::Z)
    }
}

impl TryFrom<u8> for LogicState {
    type Error = FormatError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(LogicState::Zero),
            1 => Ok(LogicState::One),
            2 => Ok(LogicState::X),
            3 => Ok(LogicState::Z),
            other => Err(FormatError::InvalidBitValue(other)),
        }
    }
}

const FOUR_STATE_LOOKUP: [char; 4] = ['0', '1', 'x', 'z'];
const HEX_DIGITS: [char; 16] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F',
];

/// A vector of four-valued digits. Index 0 is the least significant digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct BitVector {
    digits: Vec<LogicState>,
}

impl BitVector {
    /// Creates a vector of `width` zero digits.
    pub fn new(width: u32) -> Self {
        Self {
            digits: vec![LogicState::Zero; width as usize],
        }
    }

    /// Creates a vector with every digit set to `state`.
    pub fn filled(width: u32, state: LogicState) -> Self {
        Self {
            digits: vec![state; width as usize],
        }
    }

    /// Resizes to `width` and sets every digit to `state`, reusing the allocation.
    pub(crate) fn reset(&mut self, width: u32, state: LogicState) {
        self.digits.clear();
        self.digits.resize(width as usize, state);
    }

    /// Parses `text` in radix 2, 10 or 16. The width of the result is derived from the text:
    /// one digit per binary character, four per hex character and as many as the magnitude
    /// needs for decimal values.
    pub fn parse(text: &str, radix: u32) -> Result<Self, FormatError> {
        let digits = match radix {
            2 => parse_binary(text)?,
            10 => parse_decimal(text)?,
            16 => parse_hex(text)?,
            other => return Err(FormatError::UnsupportedRadix(other)),
        };
        Ok(Self { digits })
    }

    /// Replaces width and contents with the parsed `text`. Leaves `self` untouched on error.
    pub fn set_from_str(&mut self, text: &str, radix: u32) -> Result<(), FormatError> {
        *self = Self::parse(text, radix)?;
        Ok(())
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.digits.len() as u32
    }

    /// Returns the digit at `index`. Panics if `index` is out of range.
    #[inline]
    pub fn digit(&self, index: u32) -> LogicState {
        self.digits[index as usize]
    }

    #[inline]
    pub fn set_digit(&mut self, index: u32, value: LogicState) {
        self.digits[index as usize] = value;
    }

    /// Sets a digit from its raw encoding (0, 1, 2 = X, 3 = Z).
    pub fn set_digit_value(&mut self, index: u32, value: u8) -> Result<(), FormatError> {
        self.set_digit(index, LogicState::try_from(value)?);
        Ok(())
    }

    /// Digits starting with the least significant one.
    pub fn digits(&self) -> impl DoubleEndedIterator<Item = LogicState> + ExactSizeIterator + '_ {
        self.digits.iter().copied()
    }

    pub fn is_all_z(&self) -> bool {
        self.digits.iter().all(|d| *d == LogicState::Z)
    }

    pub fn has_unknown(&self) -> bool {
        self.digits.iter().any(|d| d.is_unknown())
    }

    /// Copies width and digits from `other`. A zero-width source results in a single zero digit.
    pub fn assign(&mut self, other: &BitVector) {
        if other.digits.is_empty() {
            self.digits.clear();
            self.digits.push(LogicState::Zero);
        } else {
            self.digits.clone_from(&other.digits);
        }
    }

    /// Orders by unsigned magnitude. The narrower operand is zero extended, so vectors that
    /// only differ in leading zeros compare equal. X and Z digits count as zero.
    pub fn compare_magnitude(&self, other: &BitVector) -> Ordering {
        let width = std::cmp::max(self.digits.len(), other.digits.len());
        for ii in (0..width).rev() {
            let ours = self.digits.get(ii) == Some(&LogicState::One);
            let theirs = other.digits.get(ii) == Some(&LogicState::One);
            match ours.cmp(&theirs) {
                Ordering::Equal => {}
                other => return other,
            }
        }
        Ordering::Equal
    }

    /// Renders the vector in radix 2, 10 or 16.
    ///
    /// Hex output is grouped in nibbles starting from the least significant digit, the most
    /// significant group may be partial. A group that contains any Z digit prints as `Z`, even if
    /// other digits in that group are driven. Otherwise any X digit in a group prints as `X`.
    /// Hex digits as well as `X` and `Z` are upper case, while binary output is lower case.
    ///
    /// Decimal output of a vector with unknown digits is `z` if all digits are Z and `x` otherwise.
    pub fn format(&self, radix: u32) -> Result<String, FormatError> {
        match radix {
            2 => Ok(self.to_binary_string()),
            10 => Ok(self.to_decimal_string()),
            16 => Ok(self.to_hex_string()),
            other => Err(FormatError::UnsupportedRadix(other)),
        }
    }

    /// Returns the numeric value if it has no unknown digits and fits into 64 bits.
    pub fn to_u64(&self) -> Option<u64> {
        if self.has_unknown() {
            return None;
        }
        let mut value = 0u64;
        for (ii, d) in self.digits.iter().enumerate() {
            if *d == LogicState::One {
                if ii >= 64 {
                    return None;
                }
                value |= 1 << ii;
            }
        }
        Some(value)
    }

    fn to_binary_string(&self) -> String {
        self.digits.iter().rev().map(|d| d.to_char()).collect()
    }

    fn to_decimal_string(&self) -> String {
        if self.has_unknown() {
            return if self.is_all_z() { "z" } else { "x" }.to_string();
        }
        let mut bytes = vec![0u8; self.digits.len().div_ceil(8)];
        for (ii, d) in self.digits.iter().enumerate() {
            if *d == LogicState::One {
                bytes[ii / 8] |= 1 << (ii % 8);
            }
        }
        BigUint::from_bytes_le(&bytes).to_str_radix(10)
    }

    fn to_hex_string(&self) -> String {
        let width = self.digits.len();
        let mut out = String::with_capacity(width.div_ceil(4));
        // the most significant group might not contain a full nibble
        let partial = width % 4;
        let mut hi = width;
        if partial > 0 {
            out.push(nibble_to_hex(&self.digits[width - partial..]));
            hi -= partial;
        }
        while hi > 0 {
            out.push(nibble_to_hex(&self.digits[hi - 4..hi]));
            hi -= 4;
        }
        out
    }
}

/// `group` is least significant digit first.
#[inline]
fn nibble_to_hex(group: &[LogicState]) -> char {
    if group.contains(&LogicState::Z) {
        return 'Z';
    }
    if group.contains(&LogicState::X) {
        return 'X';
    }
    let value = group
        .iter()
        .rev()
        .fold(0usize, |acc, d| (acc << 1) | (*d == LogicState::One) as usize);
    HEX_DIGITS[value]
}

fn invalid_digit(text: &str, radix: u32) -> FormatError {
    FormatError::InvalidDigit {
        input: text.to_string(),
        radix,
    }
}

fn parse_binary(text: &str) -> Result<Vec<LogicState>, FormatError> {
    text.bytes()
        .rev()
        .map(|c| LogicState::from_ascii(c).ok_or_else(|| invalid_digit(text, 2)))
        .collect()
}

fn parse_hex(text: &str) -> Result<Vec<LogicState>, FormatError> {
    let mut digits = Vec::with_capacity(text.len() * 4);
    for c in text.bytes().rev() {
        let nibble = match c {
            b'x' | b'X' => [LogicState::X; 4],
            b'z' | b'Z' => [LogicState::Z; 4],
            other => {
                let value = (other as char)
                    .to_digit(16)
                    .ok_or_else(|| invalid_digit(text, 16))?;
                let mut nibble = [LogicState::Zero; 4];
                for (ii, d) in nibble.iter_mut().enumerate() {
                    if (value >> ii) & 1 == 1 {
                        *d = LogicState::One;
                    }
                }
                nibble
            }
        };
        digits.extend_from_slice(&nibble);
    }
    Ok(digits)
}

fn parse_decimal(text: &str) -> Result<Vec<LogicState>, FormatError> {
    // `parse_bytes` would also accept `_` separators, so we check the characters ourselves
    if text.is_empty() || !text.bytes().all(|c| c.is_ascii_digit()) {
        return Err(invalid_digit(text, 10));
    }
    let value = BigUint::parse_bytes(text.as_bytes(), 10).ok_or_else(|| invalid_digit(text, 10))?;
    let width = std::cmp::max(value.bits(), 1) as usize;
    let bytes = value.to_bytes_le();
    let digits = (0..width)
        .map(|ii| {
            if (bytes[ii / 8] >> (ii % 8)) & 1 == 1 {
                LogicState::One
            } else {
                LogicState::Zero
            }
        })
        .collect();
    Ok(digits)
}

impl Display for BitVector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_binary_string())
    }
}

impl FromStr for BitVector {
    type Err = FormatError;

    /// Parses a binary string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, 2)
    }
}
