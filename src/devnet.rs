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

//! In-process hosting environment.
//!
//! A [`Devnet`] plays the role of the chain a [`FundMe`] is deployed on: it
//! keeps wallet balances, moves value alongside each call, and runs every
//! contract call under one lock so calls never interleave.
//!
//! # Thread Safety
//!
//! Wallets live in a [`DashMap`]; the contract sits behind a
//! [`parking_lot::Mutex`]. Calls always take the contract lock before touching
//! a wallet entry, so concurrent callers cannot deadlock.

use crate::base::Address;
use crate::error::{DevnetError, TransferRejected};
use crate::fund_me::{FundMe, ValueTransfer};
use crate::oracle::PriceOracle;
use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;
use tracing::{debug, info};

/// Address the second contract deployed on a fresh local node ends up at.
pub const FUND_ME_ADDRESS: Address = Address([
    0xe7, 0xf1, 0x72, 0x5e, 0x77, 0x34, 0xce, 0x28, 0x8f, 0x83, 0x67, 0xe1, 0xbb, 0x14, 0x3e,
    0x90, 0xbb, 0x3f, 0x05, 0x12,
]);

/// Serialized host for a single [`FundMe`].
#[derive(Debug)]
pub struct Devnet<O> {
    contract_address: Address,
    wallets: DashMap<Address, u128>,
    rejecting: DashSet<Address>,
    contract: Mutex<FundMe<O>>,
}

impl<O: PriceOracle> Devnet<O> {
    pub fn new(fund_me: FundMe<O>) -> Self {
        Self::with_address(fund_me, FUND_ME_ADDRESS)
    }

    pub fn with_address(fund_me: FundMe<O>, contract_address: Address) -> Self {
        Self {
            contract_address,
            wallets: DashMap::new(),
            rejecting: DashSet::new(),
            contract: Mutex::new(fund_me),
        }
    }

    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    /// Sets a wallet balance. Meant for setup, not for use alongside calls.
    pub fn set_balance(&self, who: Address, amount: u128) {
        self.wallets.insert(who, amount);
    }

    /// Wallet balance, or the held balance for the contract address.
    pub fn balance_of(&self, who: &Address) -> u128 {
        if *who == self.contract_address {
            return self.contract_balance();
        }
        self.wallets.get(who).map(|b| *b).unwrap_or(0)
    }

    pub fn contract_balance(&self) -> u128 {
        self.contract.lock().balance()
    }

    /// Makes `who` refuse (or accept again) incoming value.
    pub fn reject_payments(&self, who: Address, reject: bool) {
        if reject {
            self.rejecting.insert(who);
        } else {
            self.rejecting.remove(&who);
        }
    }

    /// Wallets plus the contract's held balance.
    ///
    /// # Errors
    ///
    /// [`DevnetError::BalanceOverflow`] if the sum does not fit in `u128`.
    pub fn total_value(&self) -> Result<u128, DevnetError> {
        let contract = self.contract.lock();
        self.wallets
            .iter()
            .try_fold(contract.balance(), |total, w| total.checked_add(*w.value()))
            .ok_or(DevnetError::BalanceOverflow)
    }

    /// Sends `value` from `from` to the contract as a contribution.
    ///
    /// The wallet is debited only if the contract accepts the call.
    ///
    /// # Errors
    ///
    /// - [`DevnetError::InsufficientBalance`] - the wallet cannot cover `value`.
    /// - [`DevnetError::Contract`] - the contract rejected the call.
    pub fn fund(&self, from: Address, value: u128) -> Result<(), DevnetError> {
        let mut contract = self.contract.lock();
        let mut wallet = self.wallets.get_mut(&from);
        let available = wallet.as_ref().map_or(0, |w| **w);
        if available < value {
            return Err(DevnetError::InsufficientBalance {
                needed: value,
                available,
            });
        }

        contract.contribute(from, value)?;
        // No wallet means zero balance, so only a zero value gets here without one
        if let Some(wallet) = wallet.as_mut() {
            **wallet -= value;
        }
        debug!(%from, value, held = contract.balance(), "fund");
        Ok(())
    }

    /// Calls the owner-only withdrawal on behalf of `from`.
    ///
    /// Returns the amount credited to the owner's wallet.
    pub fn withdraw(&self, from: Address) -> Result<u128, DevnetError> {
        let mut contract = self.contract.lock();
        let mut credit = WalletCredit {
            wallets: &self.wallets,
            rejecting: &self.rejecting,
        };
        let amount = contract.withdraw_all(from, &mut credit)?;
        info!(owner = %from, amount, "withdraw");
        Ok(amount)
    }

    /// Runs a read against the contract.
    pub fn with_contract<R>(&self, f: impl FnOnce(&FundMe<O>) -> R) -> R {
        f(&self.contract.lock())
    }
}

/// Pays withdrawals into devnet wallets.
struct WalletCredit<'a> {
    wallets: &'a DashMap<Address, u128>,
    rejecting: &'a DashSet<Address>,
}

impl ValueTransfer for WalletCredit<'_> {
    fn send_value(&mut self, to: Address, amount: u128) -> Result<(), TransferRejected> {
        if self.rejecting.contains(&to) {
            return Err(TransferRejected);
        }
        let mut wallet = self.wallets.entry(to).or_insert(0);
        *wallet = wallet.checked_add(amount).ok_or(TransferRejected)?;
        Ok(())
    }
}
