use std::fmt;

/// Engine-level decode failure that terminates the run loop cleanly.
///
/// Distinct from an instruction's own runtime errors: stack overflow,
/// stack underflow, and division by zero are fatal and panic rather than
/// being reported as a value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Trap {
    InvalidInstruction(u8),
}

impl fmt::Display for Trap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trap::InvalidInstruction(op) => write!(f, "invalid instruction: 0x{op:02X}"),
        }
    }
}

impl std::error::Error for Trap {}
