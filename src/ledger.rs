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

//! Contributor bookkeeping.
//!
//! The ledger keeps a map of contributor to cumulative amount, an append-only
//! order list with one entry per accepted contribution, and the held balance.
//!
//! # Example
//!
//! ```
//! use fundme_ledger::{Address, ContributionLedger, MockV3Aggregator, MINIMUM_USD};
//! use fundme_ledger::units::ether;
//!
//! let feed = MockV3Aggregator::new(8, 2000_0000_0000);
//! let mut ledger = ContributionLedger::new(MINIMUM_USD);
//! let alice = Address::from_low_u64(1);
//!
//! ledger.record_contribution(alice, ether(1), &feed).unwrap();
//! assert_eq!(ledger.total_contribution_of(&alice), ether(1));
//! assert_eq!(ledger.contributor_at(0).unwrap(), alice);
//! ```

use crate::base::Address;
use crate::converter::get_conversion_rate;
use crate::error::FundMeError;
use crate::oracle::PriceOracle;
use crate::units::WEI_PER_ETHER;
use std::collections::HashMap;

/// Default floor per contribution: 50 USD with 18 decimals.
pub const MINIMUM_USD: u128 = 50 * WEI_PER_ETHER;

/// Contributor balances and contribution order.
///
/// # Invariants
///
/// - The sum of all contributor amounts equals [`held_balance`](Self::held_balance).
/// - Every accepted contribution appends exactly one order-list entry, repeat
///   contributors included.
/// - A rejected contribution changes nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionLedger {
    minimum_usd: u128,
    amounts: HashMap<Address, u128>,
    funders: Vec<Address>,
    held: u128,
}

impl ContributionLedger {
    pub fn new(minimum_usd: u128) -> Self {
        Self {
            minimum_usd,
            amounts: HashMap::new(),
            funders: Vec::new(),
            held: 0,
        }
    }

    fn assert_invariants(&self) {
        debug_assert_eq!(
            self.amounts.values().sum::<u128>(),
            self.held,
            "Invariant violated: contributor amounts do not add up to the held balance"
        );
        debug_assert!(
            self.funders.len() >= self.amounts.len(),
            "Invariant violated: contributor without an order-list entry"
        );
    }

    /// Accepts `amount` wei from `contributor` if it is worth at least the minimum.
    ///
    /// All checks run before any state changes.
    ///
    /// # Errors
    ///
    /// - [`FundMeError::InsufficientContribution`] - converts below the USD minimum.
    /// - [`FundMeError::OracleUnavailable`] - the price could not be read.
    /// - [`FundMeError::AmountOverflow`] - balances would overflow.
    pub fn record_contribution<O: PriceOracle + ?Sized>(
        &mut self,
        contributor: Address,
        amount: u128,
        oracle: &O,
    ) -> Result<(), FundMeError> {
        let usd = get_conversion_rate(amount, oracle)?;
        if usd < self.minimum_usd {
            return Err(FundMeError::InsufficientContribution {
                usd,
                minimum: self.minimum_usd,
            });
        }

        let total = self
            .total_contribution_of(&contributor)
            .checked_add(amount)
            .ok_or(FundMeError::AmountOverflow)?;
        let held = self
            .held
            .checked_add(amount)
            .ok_or(FundMeError::AmountOverflow)?;

        self.amounts.insert(contributor, total);
        self.funders.push(contributor);
        self.held = held;
        self.assert_invariants();
        Ok(())
    }

    /// Cumulative amount from `contributor`, zero if none.
    pub fn total_contribution_of(&self, contributor: &Address) -> u128 {
        self.amounts.get(contributor).copied().unwrap_or(0)
    }

    /// Contributor recorded at position `index` of the order list.
    pub fn contributor_at(&self, index: usize) -> Result<Address, FundMeError> {
        self.funders
            .get(index)
            .copied()
            .ok_or(FundMeError::IndexOutOfRange {
                index,
                len: self.funders.len(),
            })
    }

    /// Length of the order list (contribution events, not distinct contributors).
    pub fn contributor_count(&self) -> usize {
        self.funders.len()
    }

    /// Order list in contribution order.
    pub fn contributors(&self) -> impl Iterator<Item = &Address> {
        self.funders.iter()
    }

    /// Distinct contributors with their cumulative amounts, in no particular order.
    pub fn contributions(&self) -> impl Iterator<Item = (&Address, &u128)> {
        self.amounts.iter()
    }

    pub fn held_balance(&self) -> u128 {
        self.held
    }

    pub fn minimum_usd(&self) -> u128 {
        self.minimum_usd
    }

    /// Clears every contributor entry by walking the order list, then empties it.
    pub(crate) fn reset_all(&mut self) {
        for funder in &self.funders {
            self.amounts.remove(funder);
        }
        self.funders.clear();
        self.held = 0;
        debug_assert!(self.amounts.is_empty());
        self.assert_invariants();
    }
}

impl Default for ContributionLedger {
    fn default() -> Self {
        Self::new(MINIMUM_USD)
    }
}
