// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Conversions between human-readable ether amounts and wei.
//!
//! # Example
//!
//! ```
//! use fundme_ledger::units::{format_ether, parse_ether};
//! use rust_decimal_macros::dec;
//!
//! let wei = parse_ether(dec!(0.025)).unwrap();
//! assert_eq!(wei, 25_000_000_000_000_000);
//! assert_eq!(format_ether(wei).unwrap(), dec!(0.025));
//! ```

use crate::error::UnitsError;
use rust_decimal::Decimal;

/// Decimal places of the native unit.
pub const ETHER_DECIMALS: u32 = 18;

/// Wei in one ether.
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Whole ether to wei.
pub const fn ether(n: u64) -> u128 {
    n as u128 * WEI_PER_ETHER
}

/// Converts an ether amount to wei exactly.
///
/// # Errors
///
/// - [`UnitsError::InvalidAmount`] - negative, or more than 18 fractional digits.
/// - [`UnitsError::Overflow`] - does not fit in `u128` wei.
pub fn parse_ether(amount: Decimal) -> Result<u128, UnitsError> {
    let amount = amount.normalize();
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(UnitsError::InvalidAmount(amount.to_string()));
    }
    let scale = amount.scale();
    if scale > ETHER_DECIMALS {
        return Err(UnitsError::InvalidAmount(amount.to_string()));
    }
    let mantissa = amount.mantissa().unsigned_abs();
    mantissa
        .checked_mul(10u128.pow(ETHER_DECIMALS - scale))
        .ok_or(UnitsError::Overflow)
}

/// Converts wei to ether, without trailing zeros.
///
/// # Errors
///
/// [`UnitsError::Overflow`] if the amount exceeds what [`Decimal`] can hold (~7.9e10 ether).
pub fn format_ether(wei: u128) -> Result<Decimal, UnitsError> {
    to_decimal(wei).map(|d| d.normalize())
}

/// Converts an 18-decimal USD value to dollars and cents.
pub fn format_usd(usd: u128) -> Result<Decimal, UnitsError> {
    to_decimal(usd).map(|d| d.round_dp(2))
}

fn to_decimal(value: u128) -> Result<Decimal, UnitsError> {
    let value = i128::try_from(value).map_err(|_| UnitsError::Overflow)?;
    Decimal::try_from_i128_with_scale(value, ETHER_DECIMALS).map_err(|_| UnitsError::Overflow)
}
