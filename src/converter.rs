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

//! Native-to-USD conversion.
//!
//! Stateless: every call reads the feed once. The result keeps the 18-decimal
//! precision of the native amount, so it compares directly against a USD
//! minimum expressed with 18 decimals.

use crate::error::FundMeError;
use crate::oracle::PriceOracle;

/// Largest feed precision whose scale factor fits in `u128`.
const MAX_FEED_DECIMALS: u32 = 38;

/// A validated feed reading: positive answer and its decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Price {
    pub answer: u128,
    pub decimals: u32,
}

/// Reads and validates the latest price.
///
/// # Errors
///
/// [`FundMeError::OracleUnavailable`] if the read fails, the answer is not
/// positive, or the feed reports an unusable precision.
pub fn get_price<O: PriceOracle + ?Sized>(oracle: &O) -> Result<Price, FundMeError> {
    let round = oracle.latest_round_data()?;
    if round.answer <= 0 {
        return Err(FundMeError::OracleUnavailable);
    }
    let decimals = u32::from(oracle.decimals());
    if decimals > MAX_FEED_DECIMALS {
        return Err(FundMeError::OracleUnavailable);
    }
    Ok(Price {
        answer: round.answer.unsigned_abs(),
        decimals,
    })
}

/// USD value of `amount` wei, with 18 decimals.
///
/// # Errors
///
/// - [`FundMeError::OracleUnavailable`] - see [`get_price`].
/// - [`FundMeError::AmountOverflow`] - the product does not fit in `u128`.
pub fn get_conversion_rate<O: PriceOracle + ?Sized>(
    amount: u128,
    oracle: &O,
) -> Result<u128, FundMeError> {
    let price = get_price(oracle)?;
    to_usd(amount, price)
}

/// `amount * answer / 10^decimals`, rounded down.
///
/// Split on the scale factor so the intermediate product stays small:
/// `amount = q * unit + r` gives `q * answer + r * answer / unit` exactly.
pub fn to_usd(amount: u128, price: Price) -> Result<u128, FundMeError> {
    let unit = 10u128.pow(price.decimals);
    let whole = (amount / unit)
        .checked_mul(price.answer)
        .ok_or(FundMeError::AmountOverflow)?;
    let fraction = (amount % unit)
        .checked_mul(price.answer)
        .ok_or(FundMeError::AmountOverflow)?
        / unit;
    whole.checked_add(fraction).ok_or(FundMeError::AmountOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::MockV3Aggregator;
    use crate::units::{WEI_PER_ETHER, ether};

    const ETH_USD_2000: i128 = 2000_0000_0000;

    #[test]
    fn one_ether_at_2000_is_2000_usd() {
        let feed = MockV3Aggregator::new(8, ETH_USD_2000);
        assert_eq!(get_conversion_rate(ether(1), &feed).unwrap(), 2000 * WEI_PER_ETHER);
    }

    #[test]
    fn fractional_ether_converts_exactly() {
        let feed = MockV3Aggregator::new(8, ETH_USD_2000);
        let amount = 25_000_000_000_000_000; // 0.025 ether
        assert_eq!(get_conversion_rate(amount, &feed).unwrap(), 50 * WEI_PER_ETHER);
    }

    #[test]
    fn sub_unit_remainders_round_down() {
        let feed = MockV3Aggregator::new(8, 3);
        // 1 wei * 0.00000003 USD = 0 after flooring
        assert_eq!(get_conversion_rate(1, &feed).unwrap(), 0);
        // 1e8 wei * 3 / 1e8 = 3
        assert_eq!(get_conversion_rate(100_000_000, &feed).unwrap(), 3);
    }

    #[test]
    fn precision_follows_the_feed() {
        let eighteen = MockV3Aggregator::new(18, 2000 * WEI_PER_ETHER as i128);
        let zero = MockV3Aggregator::new(0, 2000);
        assert_eq!(get_conversion_rate(ether(2), &eighteen).unwrap(), ether(4000));
        assert_eq!(get_conversion_rate(ether(2), &zero).unwrap(), ether(4000));
    }

    #[test]
    fn non_positive_answers_are_rejected() {
        let feed = MockV3Aggregator::new(8, 0);
        assert_eq!(
            get_conversion_rate(ether(1), &feed),
            Err(FundMeError::OracleUnavailable)
        );
        feed.update_answer(-5);
        assert_eq!(
            get_conversion_rate(ether(1), &feed),
            Err(FundMeError::OracleUnavailable)
        );
    }

    #[test]
    fn offline_feed_is_unavailable() {
        let feed = MockV3Aggregator::new(8, ETH_USD_2000);
        feed.set_offline(true);
        assert_eq!(get_price(&feed), Err(FundMeError::OracleUnavailable));
    }

    #[test]
    fn oversized_precision_is_unavailable() {
        let feed = MockV3Aggregator::new(39, ETH_USD_2000);
        assert_eq!(get_price(&feed), Err(FundMeError::OracleUnavailable));
    }

    #[test]
    fn huge_amounts_overflow_instead_of_wrapping() {
        let feed = MockV3Aggregator::new(8, ETH_USD_2000);
        assert_eq!(
            get_conversion_rate(u128::MAX, &feed),
            Err(FundMeError::AmountOverflow)
        );
    }

    #[test]
    fn each_call_reads_the_current_answer() {
        let feed = MockV3Aggregator::new(8, ETH_USD_2000);
        let before = get_conversion_rate(ether(1), &feed).unwrap();
        feed.update_answer(ETH_USD_2000 / 2);
        let after = get_conversion_rate(ether(1), &feed).unwrap();
        assert_eq!(before, after * 2);
    }
}
