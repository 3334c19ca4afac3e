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

//! Error types for the funding ledger and its tooling.

use crate::base::Address;
use thiserror::Error;

/// Failures of the funding service. Every failure leaves the ledger untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FundMeError {
    /// Contribution converts to less than the USD minimum
    #[error("contribution worth {usd} is below the minimum of {minimum} (USD, 18 decimals)")]
    InsufficientContribution { usd: u128, minimum: u128 },

    /// Privileged call from someone other than the owner
    #[error("caller is not the owner")]
    NotOwner,

    /// Payout to the owner was not accepted
    #[error("payout transfer to the owner failed")]
    TransferFailed,

    /// Price read failed or returned a non-positive answer
    #[error("price oracle unavailable")]
    OracleUnavailable,

    /// Read past the end of the contributor order list
    #[error("funder index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Arithmetic on amounts would overflow
    #[error("amount overflow")]
    AmountOverflow,
}

/// Returned by a payout recipient that refuses value.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("recipient rejected the transfer")]
pub struct TransferRejected;

/// Failures reported by a price feed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("price feed is offline")]
    Offline,

    #[error("price feed error: {0}")]
    Other(String),
}

impl From<OracleError> for FundMeError {
    fn from(_: OracleError) -> Self {
        FundMeError::OracleUnavailable
    }
}

/// Failures converting between ether and wei.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitsError {
    /// Negative, or finer than one wei
    #[error("invalid ether amount: {0}")]
    InvalidAmount(String),

    #[error("ether amount out of range")]
    Overflow,
}

/// Failures wiring a service to a network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    /// Live feeds need an RPC provider, which this crate does not ship
    #[error("live price feed {0} requires an external provider")]
    LiveFeedUnavailable(Address),

    #[error("invalid network config: {0}")]
    InvalidConfig(String),
}

/// Failures of calls hosted on a [`Devnet`](crate::Devnet).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DevnetError {
    /// Sender wallet cannot cover the attached value
    #[error("sender balance {available} cannot cover {needed}")]
    InsufficientBalance { needed: u128, available: u128 },

    /// Wallet balances add up to more than `u128` can hold
    #[error("balance overflow")]
    BalanceOverflow,

    #[error(transparent)]
    Contract(#[from] FundMeError),
}
