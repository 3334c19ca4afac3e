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

//! Deployment tooling.
//!
//! Wires a [`FundMe`] to the price feed a network calls for. On development
//! networks a [`MockV3Aggregator`] is created first and the service is bound
//! to it.

use crate::base::Address;
use crate::config::{NetworkConfig, PriceFeedBinding};
use crate::error::DeployError;
use crate::fund_me::FundMe;
use crate::oracle::{MockV3Aggregator, PriceOracle};
use std::sync::Arc;
use tracing::{debug, info};

/// A service deployed against a mock feed, with a handle for driving the price.
#[derive(Debug)]
pub struct Deployment {
    pub network: NetworkConfig,
    pub feed: Arc<MockV3Aggregator>,
    pub fund_me: FundMe<Arc<MockV3Aggregator>>,
}

/// Creates the mock feed on development networks, `None` elsewhere.
pub fn deploy_mocks(network: &NetworkConfig) -> Option<Arc<MockV3Aggregator>> {
    if !network.is_development() {
        return None;
    }
    let PriceFeedBinding::Mock {
        decimals,
        initial_answer,
    } = network.price_feed
    else {
        return None;
    };

    info!(network = %network.name, "local network detected, deploying mocks");
    let mock = MockV3Aggregator::new(decimals, i128::from(initial_answer));
    info!(address = %mock.address(), decimals, initial_answer, "deployed MockV3Aggregator");
    Some(Arc::new(mock))
}

/// Deploys a service owned by `deployer` on `network`.
///
/// # Errors
///
/// - [`DeployError::LiveFeedUnavailable`] - the network binds a live feed.
/// - [`DeployError::InvalidConfig`] - a mock binding on a non-development network.
pub fn deploy_fund_me(network: &NetworkConfig, deployer: Address) -> Result<Deployment, DeployError> {
    let feed = match (&network.price_feed, deploy_mocks(network)) {
        (_, Some(mock)) => mock,
        (PriceFeedBinding::Live { address }, None) => {
            return Err(DeployError::LiveFeedUnavailable(*address));
        }
        (PriceFeedBinding::Mock { .. }, None) => {
            return Err(DeployError::InvalidConfig(format!(
                "mock price feed on non-development network {}",
                network.name
            )));
        }
    };

    let fund_me = deploy_with_feed(deployer, Arc::clone(&feed));
    Ok(Deployment {
        network: network.clone(),
        feed,
        fund_me,
    })
}

/// Deploys a service owned by `deployer` against any feed.
pub fn deploy_with_feed<O: PriceOracle>(deployer: Address, feed: O) -> FundMe<O> {
    debug!(owner = %deployer, price_feed = %feed.address(), "deploying FundMe");
    let fund_me = FundMe::new(deployer, feed);
    info!(owner = %fund_me.owner(), price_feed = %fund_me.price_feed(), "deployed FundMe");
    fund_me
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SEPOLIA_ETH_USD_FEED;
    use crate::oracle::MOCK_FEED_ADDRESS;

    #[test]
    fn mocks_only_on_development_chains() {
        let hardhat = NetworkConfig::builtin("hardhat").unwrap();
        let sepolia = NetworkConfig::builtin("sepolia").unwrap();
        assert!(deploy_mocks(&hardhat).is_some());
        assert!(deploy_mocks(&sepolia).is_none());
    }

    #[test]
    fn local_deployment_binds_the_mock() {
        let network = NetworkConfig::builtin("localhost").unwrap();
        let deployer = Address::from_low_u64(1);
        let deployment = deploy_fund_me(&network, deployer).unwrap();
        assert_eq!(deployment.fund_me.owner(), deployer);
        assert_eq!(deployment.fund_me.price_feed(), MOCK_FEED_ADDRESS);
        assert_eq!(deployment.feed.latest_answer(), 2000_0000_0000);
    }

    #[test]
    fn live_network_needs_a_provider() {
        let network = NetworkConfig::builtin("sepolia").unwrap();
        let result = deploy_fund_me(&network, Address::from_low_u64(1));
        assert!(matches!(
            result,
            Err(DeployError::LiveFeedUnavailable(address)) if address == SEPOLIA_ETH_USD_FEED
        ));
    }

    #[test]
    fn mock_on_a_live_network_is_rejected() {
        let mut network = NetworkConfig::builtin("hardhat").unwrap();
        network.name = "staging".into();
        assert!(matches!(
            deploy_fund_me(&network, Address::from_low_u64(1)),
            Err(DeployError::InvalidConfig(_))
        ));
    }
}
