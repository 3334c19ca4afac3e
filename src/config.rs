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

//! Per-network deployment configuration.
//!
//! Development networks get a mock price feed with a fixed answer; live
//! networks bind an existing feed address.

use crate::base::Address;
use crate::error::DeployError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Networks that deploy mocks instead of binding a live feed.
pub const DEVELOPMENT_CHAINS: [&str; 2] = ["hardhat", "localhost"];

/// Decimal places of the mock feed.
pub const MOCK_DECIMALS: u8 = 8;

/// Mock ETH/USD answer: 2000.00000000.
pub const MOCK_INITIAL_ANSWER: i64 = 2000_0000_0000;

/// Sepolia ETH/USD aggregator.
pub const SEPOLIA_ETH_USD_FEED: Address = Address([
    0x69, 0x4a, 0xa1, 0x76, 0x93, 0x57, 0x21, 0x5d, 0xe4, 0xfa, 0xc0, 0x81, 0xbf, 0x1f, 0x30,
    0x9a, 0xdc, 0x32, 0x53, 0x06,
]);

/// How the service gets its price feed on a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PriceFeedBinding {
    Mock { decimals: u8, initial_answer: i64 },
    Live { address: Address },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: u64,
    pub price_feed: PriceFeedBinding,
    #[serde(default = "default_confirmations")]
    pub block_confirmations: u32,
}

fn default_confirmations() -> u32 {
    1
}

impl NetworkConfig {
    /// Built-in settings for `hardhat`, `localhost` and `sepolia`.
    pub fn builtin(name: &str) -> Result<Self, DeployError> {
        let mock = PriceFeedBinding::Mock {
            decimals: MOCK_DECIMALS,
            initial_answer: MOCK_INITIAL_ANSWER,
        };
        let (chain_id, price_feed, block_confirmations) = match name {
            "hardhat" | "localhost" => (31337, mock, 1),
            "sepolia" => (
                11155111,
                PriceFeedBinding::Live {
                    address: SEPOLIA_ETH_USD_FEED,
                },
                6,
            ),
            other => return Err(DeployError::UnknownNetwork(other.to_string())),
        };
        Ok(Self {
            name: name.to_string(),
            chain_id,
            price_feed,
            block_confirmations,
        })
    }

    /// Reads a config from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, DeployError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DeployError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, DeployError> {
        serde_json::from_str(raw).map_err(|e| DeployError::InvalidConfig(e.to_string()))
    }

    /// True for networks listed in [`DEVELOPMENT_CHAINS`].
    pub fn is_development(&self) -> bool {
        DEVELOPMENT_CHAINS.contains(&self.name.as_str())
    }
}
