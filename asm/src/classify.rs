//! Operand classification.
//!
//! Given an operand token, determines its kind: register reference,
//! immediate value (with signedness and width), or symbol reference.
//!
//! Decimal parsing follows C `strtoll`/`strtoull` semantics: overflow
//! saturates to the type's extreme instead of failing, and an extreme
//! parse result is indistinguishable from saturation. The consequences
//! are kept as-is: the literal 9223372036854775807 classifies as
//! LargeUnsigned (its saturated signed parse triggers the unsigned
//! re-parse) and 18446744073709551615 is Invalid.

use std::num::IntErrorKind;

use mvm64_isa::Register;

/// Prefix marking a symbol-reference token.
pub const SYM_PREFIX: char = '@';

/// The kind of an operand token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandKind {
    /// No token (the instruction has fewer than two operands).
    None,
    /// A register name from the 13-name table.
    Register,
    /// An unsigned value that fits in 1 byte.
    SmallUnsigned,
    /// A signed value in [-128, 127].
    SmallSigned,
    /// An unsigned value wider than 1 byte.
    LargeUnsigned,
    /// A signed value outside [-128, 127].
    LargeSigned,
    /// A `@name` symbol reference; encodes as an 8-byte placeholder.
    Symbol,
    /// Not a recognizable operand.
    Invalid,
}

impl OperandKind {
    /// True if the operand encodes as an immediate value field.
    pub fn is_value(self) -> bool {
        !matches!(self, OperandKind::None | OperandKind::Register)
    }

    /// True if the operand encodes as a 1-byte immediate.
    pub fn is_small(self) -> bool {
        matches!(self, OperandKind::SmallUnsigned | OperandKind::SmallSigned)
    }
}

/// Classifies an operand token.
pub fn classify(token: &str) -> OperandKind {
    if token.starts_with(SYM_PREFIX) {
        return OperandKind::Symbol;
    }

    if Register::from_name(token).is_some() {
        return OperandKind::Register;
    }

    if let Some(digits) = hex_digits(token) {
        return match parse_u64_radix_saturating(digits, 16) {
            Some(v) if v <= 0xFF => OperandKind::SmallUnsigned,
            Some(_) => OperandKind::LargeUnsigned,
            None => OperandKind::Invalid,
        };
    }

    if let Some(rest) = token.strip_prefix('-') {
        if !rest.starts_with(|c: char| c.is_ascii_digit()) {
            return OperandKind::Invalid;
        }
        return match parse_i64_saturating(token) {
            Some(v) if (-128..=127).contains(&v) => OperandKind::SmallSigned,
            Some(_) => OperandKind::LargeSigned,
            None => OperandKind::Invalid,
        };
    }

    if token.starts_with(|c: char| c.is_ascii_digit()) {
        let Some(value) = parse_i64_saturating(token) else {
            return OperandKind::Invalid;
        };
        if value == i64::MAX {
            // Saturated (or exactly the maximum; the parse cannot tell).
            // Re-parse unsigned; saturation there too is unrepresentable.
            return match parse_u64_radix_saturating(token, 10) {
                Some(u64::MAX) | None => OperandKind::Invalid,
                Some(_) => OperandKind::LargeUnsigned,
            };
        }
        if value == i64::MIN {
            // Cannot happen for a digit-leading token; kept to mirror the
            // shared parse path this rule set came from.
            return OperandKind::Invalid;
        }
        return if value > 127 {
            OperandKind::LargeSigned
        } else {
            OperandKind::SmallSigned
        };
    }

    OperandKind::Invalid
}

/// The digits of a hexadecimal literal, if the token has a `0x` prefix.
fn hex_digits(token: &str) -> Option<&str> {
    token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
}

/// Parses a signed decimal token, saturating on overflow.
pub(crate) fn parse_i64_saturating(token: &str) -> Option<i64> {
    match token.parse::<i64>() {
        Ok(v) => Some(v),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Some(i64::MAX),
            IntErrorKind::NegOverflow => Some(i64::MIN),
            _ => None,
        },
    }
}

/// Parses an unsigned token in the given radix, saturating on overflow.
pub(crate) fn parse_u64_radix_saturating(digits: &str, radix: u32) -> Option<u64> {
    match u64::from_str_radix(digits, radix) {
        Ok(v) => Some(v),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Some(u64::MAX),
            _ => None,
        },
    }
}

/// Parses the numeric value of an unsigned operand token (hexadecimal or
/// decimal), saturating on overflow.
pub(crate) fn unsigned_value(token: &str) -> Option<u64> {
    match hex_digits(token) {
        Some(digits) => parse_u64_radix_saturating(digits, 16),
        None => parse_u64_radix_saturating(token, 10),
    }
}

/// Parses the numeric value of a signed operand token, saturating on
/// overflow.
pub(crate) fn signed_value(token: &str) -> Option<i64> {
    parse_i64_saturating(token)
}
