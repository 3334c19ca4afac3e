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

//! Funding service.
//!
//! [`FundMe`] composes the [`ContributionLedger`], the price conversion and the
//! owner guard into the two mutating entry points: [`FundMe::contribute`],
//! open to anyone, and [`FundMe::withdraw_all`], owner only.
//!
//! # Withdrawal
//!
//! ```text
//! Idle ──► GuardChecking ──not owner──► Rejected(NotOwner)
//!               │
//!               └──► Transferring ──rejected──► TransferFailed (state unchanged)
//!                         │
//!                         └──► Reset ──► Idle
//! ```
//!
//! The ledger is reset only after the payout has been accepted, so a failed
//! transfer leaves every balance and order-list entry in place.
//!
//! # Example
//!
//! ```
//! use fundme_ledger::{Address, FundMe, MockV3Aggregator, TransferRejected};
//! use fundme_ledger::units::ether;
//!
//! let owner = Address::from_low_u64(1);
//! let mut fund_me = FundMe::new(owner, MockV3Aggregator::new(8, 2000_0000_0000));
//! fund_me.contribute(Address::from_low_u64(2), ether(1)).unwrap();
//!
//! let mut received = 0;
//! let mut wallet = |_to: Address, amount: u128| -> Result<(), TransferRejected> {
//!     received += amount;
//!     Ok(())
//! };
//! fund_me.withdraw_all(owner, &mut wallet).unwrap();
//! assert_eq!(received, ether(1));
//! assert_eq!(fund_me.balance(), 0);
//! ```

use crate::base::Address;
use crate::error::{FundMeError, TransferRejected};
use crate::guard::require_owner;
use crate::ledger::{ContributionLedger, MINIMUM_USD};
use crate::oracle::PriceOracle;

/// Receives the payout of a withdrawal.
///
/// Implementations either accept the whole amount or reject it; a rejection
/// aborts the withdrawal.
pub trait ValueTransfer {
    fn send_value(&mut self, to: Address, amount: u128) -> Result<(), TransferRejected>;
}

impl<F> ValueTransfer for F
where
    F: FnMut(Address, u128) -> Result<(), TransferRejected>,
{
    fn send_value(&mut self, to: Address, amount: u128) -> Result<(), TransferRejected> {
        self(to, amount)
    }
}

/// Minimum-contribution crowdfunding ledger with a single fixed owner.
#[derive(Debug)]
pub struct FundMe<O> {
    owner: Address,
    price_feed: O,
    ledger: ContributionLedger,
}

impl<O: PriceOracle> FundMe<O> {
    /// Binds `owner` and `price_feed` with the default 50 USD minimum.
    pub fn new(owner: Address, price_feed: O) -> Self {
        Self::with_minimum(owner, price_feed, MINIMUM_USD)
    }

    /// Binds `owner` and `price_feed` with a custom minimum (USD, 18 decimals).
    pub fn with_minimum(owner: Address, price_feed: O, minimum_usd: u128) -> Self {
        Self {
            owner,
            price_feed,
            ledger: ContributionLedger::new(minimum_usd),
        }
    }

    /// Records `amount` wei sent by `caller`.
    ///
    /// The price feed is read once per call.
    ///
    /// # Errors
    ///
    /// - [`FundMeError::InsufficientContribution`] - worth less than the minimum.
    /// - [`FundMeError::OracleUnavailable`] - the price could not be read.
    /// - [`FundMeError::AmountOverflow`] - balances would overflow.
    pub fn contribute(&mut self, caller: Address, amount: u128) -> Result<(), FundMeError> {
        self.ledger
            .record_contribution(caller, amount, &self.price_feed)
    }

    /// Plain value transfer with no call data. Treated as a contribution.
    pub fn receive(&mut self, caller: Address, amount: u128) -> Result<(), FundMeError> {
        self.contribute(caller, amount)
    }

    /// Pays the whole held balance to the owner and resets all contributors.
    ///
    /// Returns the amount paid out.
    ///
    /// # Errors
    ///
    /// - [`FundMeError::NotOwner`] - `caller` is not the owner; nothing is sent.
    /// - [`FundMeError::TransferFailed`] - `payout` rejected the value; nothing is reset.
    pub fn withdraw_all<T>(&mut self, caller: Address, payout: &mut T) -> Result<u128, FundMeError>
    where
        T: ValueTransfer + ?Sized,
    {
        require_owner(&caller, &self.owner)?;

        let amount = self.ledger.held_balance();
        payout
            .send_value(self.owner, amount)
            .map_err(|_| FundMeError::TransferFailed)?;

        self.ledger.reset_all();
        Ok(amount)
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Address of the bound price feed.
    pub fn price_feed(&self) -> Address {
        self.price_feed.address()
    }

    /// Version reported by the bound price feed.
    pub fn version(&self) -> u64 {
        self.price_feed.version()
    }

    /// Cumulative amount sent by `funder` since the last withdrawal.
    pub fn amount_funded(&self, funder: &Address) -> u128 {
        self.ledger.total_contribution_of(funder)
    }

    /// Funder at `index` of the order list.
    pub fn funder(&self, index: usize) -> Result<Address, FundMeError> {
        self.ledger.contributor_at(index)
    }

    pub fn funder_count(&self) -> usize {
        self.ledger.contributor_count()
    }

    /// Held balance in wei.
    pub fn balance(&self) -> u128 {
        self.ledger.held_balance()
    }

    pub fn minimum_usd(&self) -> u128 {
        self.ledger.minimum_usd()
    }

    pub fn ledger(&self) -> &ContributionLedger {
        &self.ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::MockV3Aggregator;
    use crate::units::ether;

    fn owner() -> Address {
        Address::from_low_u64(1)
    }

    fn deployed() -> FundMe<MockV3Aggregator> {
        FundMe::new(owner(), MockV3Aggregator::new(8, 2000_0000_0000))
    }

    fn accept_all(_to: Address, _amount: u128) -> Result<(), TransferRejected> {
        Ok(())
    }

    fn reject_all(_to: Address, _amount: u128) -> Result<(), TransferRejected> {
        Err(TransferRejected)
    }

    #[test]
    fn getters_reflect_construction() {
        let fund_me = deployed();
        assert_eq!(fund_me.owner(), owner());
        assert_eq!(fund_me.price_feed(), crate::oracle::MOCK_FEED_ADDRESS);
        assert_eq!(fund_me.version(), 0);
        assert_eq!(fund_me.minimum_usd(), MINIMUM_USD);
        assert_eq!(fund_me.balance(), 0);
    }

    #[test]
    fn receive_counts_as_contribution() {
        let mut fund_me = deployed();
        let alice = Address::from_low_u64(2);
        fund_me.receive(alice, ether(1)).unwrap();
        assert_eq!(fund_me.amount_funded(&alice), ether(1));
        assert_eq!(fund_me.funder(0).unwrap(), alice);
    }

    #[test]
    fn payout_goes_to_owner() {
        let mut fund_me = deployed();
        fund_me.contribute(Address::from_low_u64(2), ether(1)).unwrap();

        let mut paid_to = None;
        let mut wallet = |to: Address, amount: u128| -> Result<(), TransferRejected> {
            paid_to = Some((to, amount));
            Ok(())
        };
        let amount = fund_me.withdraw_all(owner(), &mut wallet).unwrap();

        assert_eq!(amount, ether(1));
        assert_eq!(paid_to, Some((owner(), ether(1))));
    }

    #[test]
    fn non_owner_never_reaches_the_transfer() {
        let mut fund_me = deployed();
        fund_me.contribute(Address::from_low_u64(2), ether(1)).unwrap();

        let mut called = false;
        let mut wallet = |_: Address, _: u128| -> Result<(), TransferRejected> {
            called = true;
            Ok(())
        };
        let result = fund_me.withdraw_all(Address::from_low_u64(2), &mut wallet);

        assert_eq!(result, Err(FundMeError::NotOwner));
        assert!(!called);
        assert_eq!(fund_me.balance(), ether(1));
    }

    #[test]
    fn rejected_payout_keeps_contributors() {
        let mut fund_me = deployed();
        let alice = Address::from_low_u64(2);
        fund_me.contribute(alice, ether(1)).unwrap();
        let before = fund_me.ledger().clone();

        let result = fund_me.withdraw_all(owner(), &mut reject_all);

        assert_eq!(result, Err(FundMeError::TransferFailed));
        assert_eq!(fund_me.ledger(), &before);
        assert_eq!(fund_me.funder(0).unwrap(), alice);
    }

    #[test]
    fn withdrawing_an_empty_ledger_pays_zero() {
        let mut fund_me = deployed();
        assert_eq!(fund_me.withdraw_all(owner(), &mut accept_all), Ok(0));
    }
}
