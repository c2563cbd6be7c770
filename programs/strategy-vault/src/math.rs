use anchor_lang::prelude::*;

use crate::{constants::MAX_BPS, errors::VaultError};

/// Rounding direction for share/asset conversions. Conversions that pay the
/// caller round down, conversions that charge the caller round up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rounding {
    Down,
    Up,
}

/// `amount * numerator / denominator` in u128, converted back to u64
pub fn mul_div(amount: u64, numerator: u64, denominator: u64, rounding: Rounding) -> Result<u64> {
    require!(denominator != 0, VaultError::MathOverflow);
    let product = (amount as u128)
        .checked_mul(numerator as u128)
        .ok_or(error!(VaultError::MathOverflow))?;
    let denominator = denominator as u128;
    let mut quotient = product / denominator;
    if rounding == Rounding::Up && product % denominator != 0 {
        quotient += 1;
    }
    u64::try_from(quotient).map_err(|_| error!(VaultError::MathOverflow))
}

/// Apply basis points to an amount, rounding down
pub fn apply_bps(amount: u64, bps: u16) -> Result<u64> {
    mul_div(amount, bps as u64, MAX_BPS, Rounding::Down)
}

pub fn checked_add(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or(error!(VaultError::MathOverflow))
}

pub fn checked_sub(a: u64, b: u64) -> Result<u64> {
    a.checked_sub(b).ok_or(error!(VaultError::MathOverflow))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_rounding() {
        assert_eq!(mul_div(100, 333, 1000, Rounding::Down).unwrap(), 33);
        assert_eq!(mul_div(100, 333, 1000, Rounding::Up).unwrap(), 34);
        // Exact division never rounds up
        assert_eq!(mul_div(500, 1000, 2000, Rounding::Up).unwrap(), 250);
    }

    #[test]
    fn test_mul_div_large_values() {
        // u128 intermediate keeps this from overflowing
        assert_eq!(
            mul_div(u64::MAX, u64::MAX / 2, u64::MAX / 2, Rounding::Down).unwrap(),
            u64::MAX
        );
        assert!(mul_div(u64::MAX, 2, 1, Rounding::Down).is_err());
        assert!(mul_div(1, 1, 0, Rounding::Down).is_err());
    }

    #[test]
    fn test_apply_bps() {
        assert_eq!(apply_bps(100, 1_000).unwrap(), 10);
        assert_eq!(apply_bps(99, 1_000).unwrap(), 9);
        assert_eq!(apply_bps(100, 0).unwrap(), 0);
        assert_eq!(apply_bps(100, 10_000).unwrap(), 100);
    }
}
