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

//! Price feed boundary.
//!
//! The ledger reads the native/USD exchange rate through [`PriceOracle`], an
//! aggregator-style interface returning an integer answer scaled by
//! [`PriceOracle::decimals`]. [`MockV3Aggregator`] stands in for a live feed
//! on development networks.

use crate::base::Address;
use crate::error::OracleError;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// One aggregator round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundData {
    pub round_id: u64,
    /// Price scaled by `10^decimals`. Signed, as aggregators report it.
    pub answer: i128,
    pub started_at: u64,
    pub updated_at: u64,
    pub answered_in_round: u64,
}

/// Read-only exchange-rate source.
pub trait PriceOracle {
    /// Where the feed lives.
    fn address(&self) -> Address;

    /// Decimal places of `answer`.
    fn decimals(&self) -> u8;

    fn version(&self) -> u64;

    fn latest_round_data(&self) -> Result<RoundData, OracleError>;
}

impl<T: PriceOracle + ?Sized> PriceOracle for &T {
    fn address(&self) -> Address {
        (**self).address()
    }

    fn decimals(&self) -> u8 {
        (**self).decimals()
    }

    fn version(&self) -> u64 {
        (**self).version()
    }

    fn latest_round_data(&self) -> Result<RoundData, OracleError> {
        (**self).latest_round_data()
    }
}

impl<T: PriceOracle + ?Sized> PriceOracle for Arc<T> {
    fn address(&self) -> Address {
        (**self).address()
    }

    fn decimals(&self) -> u8 {
        (**self).decimals()
    }

    fn version(&self) -> u64 {
        (**self).version()
    }

    fn latest_round_data(&self) -> Result<RoundData, OracleError> {
        (**self).latest_round_data()
    }
}

impl<T: PriceOracle + ?Sized> PriceOracle for Box<T> {
    fn address(&self) -> Address {
        (**self).address()
    }

    fn decimals(&self) -> u8 {
        (**self).decimals()
    }

    fn version(&self) -> u64 {
        (**self).version()
    }

    fn latest_round_data(&self) -> Result<RoundData, OracleError> {
        (**self).latest_round_data()
    }
}

/// Address the first contract deployed on a fresh local node ends up at.
pub const MOCK_FEED_ADDRESS: Address = Address([
    0x5f, 0xbd, 0xb2, 0x31, 0x56, 0x78, 0xaf, 0xec, 0xb3, 0x67, 0xf0, 0x32, 0xd9, 0x3f, 0x64,
    0x2f, 0x64, 0x18, 0x0a, 0xa3,
]);

#[derive(Debug)]
struct MockState {
    latest: RoundData,
    offline: bool,
}

/// In-process aggregator with a settable answer.
///
/// Shared between deployment tooling and the service through an [`Arc`];
/// updates take effect on the next read.
#[derive(Debug)]
pub struct MockV3Aggregator {
    address: Address,
    decimals: u8,
    state: RwLock<MockState>,
}

impl MockV3Aggregator {
    pub fn new(decimals: u8, initial_answer: i128) -> Self {
        let now = unix_now();
        Self {
            address: MOCK_FEED_ADDRESS,
            decimals,
            state: RwLock::new(MockState {
                latest: RoundData {
                    round_id: 1,
                    answer: initial_answer,
                    started_at: now,
                    updated_at: now,
                    answered_in_round: 1,
                },
                offline: false,
            }),
        }
    }

    /// Places the mock at a different address.
    pub fn at(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    /// Publishes a new answer as the next round.
    pub fn update_answer(&self, answer: i128) {
        let now = unix_now();
        let mut state = self.state.write();
        let round_id = state.latest.round_id + 1;
        state.latest = RoundData {
            round_id,
            answer,
            started_at: now,
            updated_at: now,
            answered_in_round: round_id,
        };
    }

    /// Makes subsequent reads fail until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.state.write().offline = offline;
    }

    pub fn latest_answer(&self) -> i128 {
        self.state.read().latest.answer
    }
}

impl PriceOracle for MockV3Aggregator {
    fn address(&self) -> Address {
        self.address
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn version(&self) -> u64 {
        0
    }

    fn latest_round_data(&self) -> Result<RoundData, OracleError> {
        let state = self.state.read();
        if state.offline {
            return Err(OracleError::Offline);
        }
        Ok(state.latest)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
