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

//! # FundMe Ledger
//!
//! This library provides a minimum-contribution crowdfunding ledger: anyone may
//! contribute native value worth at least a USD floor, checked against a price
//! feed, and a single owner fixed at creation may withdraw the whole pool,
//! which resets every contributor.
//!
//! ## Core Components
//!
//! - [`FundMe`]: Funding service exposing `contribute` and `withdraw_all`
//! - [`ContributionLedger`]: Contributor balances and contribution order
//! - [`converter`]: Native-to-USD conversion through a [`PriceOracle`]
//! - [`guard`]: Owner check for privileged calls
//! - [`FundMeError`]: Error types for rejected calls
//!
//! ## Tooling
//!
//! - [`NetworkConfig`] and [`deploy`]: Per-network price feed wiring, with a
//!   [`MockV3Aggregator`] on development networks
//! - [`Devnet`]: In-process host that serializes calls and tracks wallets
//!
//! ## Example
//!
//! ```
//! use fundme_ledger::{Address, FundMe, FundMeError, MockV3Aggregator, TransferRejected};
//! use fundme_ledger::units::ether;
//!
//! let owner = Address::from_low_u64(1);
//! let alice = Address::from_low_u64(2);
//! let mut fund_me = FundMe::new(owner, MockV3Aggregator::new(8, 2000_0000_0000));
//!
//! // 0.01 ether is worth 20 USD at 2000 USD/ether: below the 50 USD floor
//! assert!(matches!(
//!     fund_me.contribute(alice, ether(1) / 100),
//!     Err(FundMeError::InsufficientContribution { .. })
//! ));
//!
//! fund_me.contribute(alice, ether(1)).unwrap();
//! assert_eq!(fund_me.amount_funded(&alice), ether(1));
//!
//! let mut accept = |_: Address, _: u128| -> Result<(), TransferRejected> { Ok(()) };
//! assert_eq!(fund_me.withdraw_all(alice, &mut accept), Err(FundMeError::NotOwner));
//! assert_eq!(fund_me.withdraw_all(owner, &mut accept), Ok(ether(1)));
//! assert_eq!(fund_me.amount_funded(&alice), 0);
//! ```
//!
//! ## Execution Model
//!
//! The core assumes its host runs one call at a time and holds no locks of its
//! own; mutating methods take `&mut self`. [`Devnet`] provides that
//! serialization when the ledger is shared between threads.

mod base;
pub mod config;
pub mod converter;
pub mod deploy;
mod devnet;
pub mod error;
mod fund_me;
pub mod guard;
mod ledger;
pub mod oracle;
pub mod units;

pub use base::{Address, ParseAddressError};
pub use config::{NetworkConfig, PriceFeedBinding};
pub use devnet::{Devnet, FUND_ME_ADDRESS};
pub use error::{DeployError, DevnetError, FundMeError, OracleError, TransferRejected, UnitsError};
pub use fund_me::{FundMe, ValueTransfer};
pub use ledger::{ContributionLedger, MINIMUM_USD};
pub use oracle::{MockV3Aggregator, PriceOracle, RoundData};
