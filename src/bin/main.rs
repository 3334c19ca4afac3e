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

use clap::Parser;
use csv::{Reader, ReaderBuilder, Trim, Writer};
use fundme_ledger::deploy::deploy_fund_me;
use fundme_ledger::units::{format_ether, parse_ether};
use fundme_ledger::{
    Address, DeployError, Devnet, MockV3Aggregator, NetworkConfig, PriceOracle, UnitsError,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// First account of a fresh local node.
const DEFAULT_OWNER: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

/// FundMe - Replay contribution scripts against a local devnet
///
/// Deploys a FundMe ledger on a development network, replays the calls in a
/// CSV script and writes the remaining contributor balances to stdout.
#[derive(Parser, Debug)]
#[command(name = "fundme")]
#[command(about = "Replays fund/withdraw calls against a FundMe ledger", long_about = None)]
struct Args {
    /// Path to CSV script
    ///
    /// Expected format: op,caller,amount
    /// Example: cargo run -- calls.csv > contributors.csv
    #[arg(value_name = "FILE")]
    script: PathBuf,

    /// Built-in network name
    #[arg(long, default_value = "hardhat", conflicts_with = "network_file")]
    network: String,

    /// JSON network config, instead of a built-in network
    #[arg(long, value_name = "PATH")]
    network_file: Option<PathBuf>,

    /// Deployer and owner of the ledger
    #[arg(long, default_value = DEFAULT_OWNER)]
    owner: Address,

    /// Starting wallet balance of every caller, in ether
    #[arg(long, default_value = "10000")]
    initial_balance: Decimal,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Units(#[from] UnitsError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        error!("{}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let network = match &args.network_file {
        Some(path) => NetworkConfig::from_json_file(path)?,
        None => NetworkConfig::builtin(&args.network)?,
    };
    let initial_balance = parse_ether(args.initial_balance)?;

    let file = File::open(&args.script)?;
    let devnet = process_script(BufReader::new(file), &network, args.owner, initial_balance)?;

    write_contributors(&devnet, std::io::stdout())?;

    let (held, funders) = devnet.with_contract(|c| (c.balance(), c.funder_count()));
    info!(
        network = %network.name,
        held_eth = %format_ether(held)?,
        funders,
        "script complete"
    );
    Ok(())
}

/// Raw CSV record matching the script format.
///
/// Fields: `op, caller, amount`
#[derive(Debug, Deserialize)]
struct ScriptRecord {
    op: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    caller: Option<Address>,
    #[serde(deserialize_with = "csv::invalid_option")]
    amount: Option<Decimal>,
}

/// A parsed script step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call {
    Fund { caller: Address, value: u128 },
    Withdraw { caller: Address },
    /// Publishes a new mock price, in USD per ether.
    SetPrice { usd: Decimal },
}

impl ScriptRecord {
    /// Converts a record to a call.
    ///
    /// Returns `None` for unknown operations or missing required fields.
    fn into_call(self) -> Option<Call> {
        match self.op.to_lowercase().as_str() {
            "fund" => {
                let caller = self.caller?;
                let value = parse_ether(self.amount?).ok()?;
                Some(Call::Fund { caller, value })
            }
            "withdraw" => Some(Call::Withdraw {
                caller: self.caller?,
            }),
            "price" => Some(Call::SetPrice { usd: self.amount? }),
            _ => None,
        }
    }
}

/// Deploys on `network` and replays a script of calls.
///
/// Every caller, and the owner, starts with `initial_balance` wei. Malformed
/// rows and failed calls are logged and skipped.
///
/// # CSV Format
///
/// Expected columns: `op, caller, amount`
/// - `op`: `fund`, `withdraw` or `price`
/// - `caller`: hex address (empty for `price`)
/// - `amount`: ether for `fund`, USD per ether for `price`, empty for `withdraw`
///
/// # Example
///
/// ```csv
/// op,caller,amount
/// fund,0x70997970c51812dc3a010c7d01b50e0d17dc79c8,1.0
/// price,,1500
/// withdraw,0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266,
/// ```
///
/// # Errors
///
/// Returns an error if the network cannot be deployed to.
fn process_script<R: Read>(
    reader: R,
    network: &NetworkConfig,
    owner: Address,
    initial_balance: u128,
) -> Result<Devnet<Arc<MockV3Aggregator>>, CliError> {
    let deployment = deploy_fund_me(network, owner)?;
    let feed = deployment.feed;
    let devnet = Devnet::new(deployment.fund_me);

    let mut funded = HashSet::new();
    let mut ensure_wallet = |who: Address| {
        if funded.insert(who) {
            devnet.set_balance(who, initial_balance);
        }
    };
    ensure_wallet(owner);

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    for (line, call) in script_calls(&mut rdr)? {
        let Some(call) = call else {
            warn!(line, "skipping malformed or invalid row");
            continue;
        };

        match call {
            Call::Fund { caller, value } => {
                ensure_wallet(caller);
                if let Err(e) = devnet.fund(caller, value) {
                    warn!(line, %caller, value, "fund rejected: {}", e);
                }
            }
            Call::Withdraw { caller } => {
                ensure_wallet(caller);
                if let Err(e) = devnet.withdraw(caller) {
                    warn!(line, %caller, "withdraw rejected: {}", e);
                }
            }
            Call::SetPrice { usd } => match scale_price(usd, feed.decimals()) {
                Some(answer) => {
                    feed.update_answer(answer);
                    info!(line, %usd, answer, "price updated");
                }
                None => warn!(line, %usd, "skipping unrepresentable price"),
            },
        }
    }

    Ok(devnet)
}

/// Streams the calls of a script, each tagged with the file line it starts on.
///
/// Rows that fail to parse, or name an unknown operation, yield `None`.
fn script_calls<R: Read>(
    rdr: &mut Reader<R>,
) -> Result<impl Iterator<Item = (u64, Option<Call>)> + '_, csv::Error> {
    let headers = rdr.headers()?.clone();
    Ok(rdr.records().map(move |result| match result {
        Ok(raw) => {
            let line = raw.position().map_or(0, |p| p.line());
            let call = raw
                .deserialize::<ScriptRecord>(Some(&headers))
                .ok()
                .and_then(ScriptRecord::into_call);
            (line, call)
        }
        Err(e) => (e.position().map_or(0, |p| p.line()), None),
    }))
}

/// `usd * 10^decimals`, truncated.
fn scale_price(usd: Decimal, decimals: u8) -> Option<i128> {
    let factor = Decimal::try_from_i128_with_scale(10i128.checked_pow(u32::from(decimals))?, 0).ok()?;
    usd.checked_mul(factor)?.trunc().to_i128()
}

/// Output row for a contributor with a non-zero balance.
#[derive(Debug, Serialize)]
struct ContributorRow {
    contributor: Address,
    amount_wei: String,
    amount_eth: Decimal,
}

/// Write contributor balances to a CSV writer, sorted by address.
///
/// # CSV Format
///
/// Columns: `contributor, amount_wei, amount_eth`
///
/// # Errors
///
/// Returns an error if writing fails or an amount cannot be formatted.
fn write_contributors<W: Write>(
    devnet: &Devnet<Arc<MockV3Aggregator>>,
    writer: W,
) -> Result<(), CliError> {
    let mut contributions = devnet.with_contract(|c| {
        c.ledger()
            .contributions()
            .map(|(who, amount)| (*who, *amount))
            .collect::<Vec<_>>()
    });
    contributions.sort();

    let mut wtr = Writer::from_writer(writer);
    for (contributor, amount) in contributions {
        wtr.serialize(ContributorRow {
            contributor,
            amount_wei: amount.to_string(),
            amount_eth: format_ether(amount)?,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundme_ledger::units::ether;
    use rust_decimal_macros::dec;
    use std::io::Cursor;

    const ALICE: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";
    const BOB: &str = "0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc";

    fn owner() -> Address {
        DEFAULT_OWNER.parse().unwrap()
    }

    fn run_script(csv: &str) -> Devnet<Arc<MockV3Aggregator>> {
        let network = NetworkConfig::builtin("hardhat").unwrap();
        process_script(Cursor::new(csv.to_string()), &network, owner(), ether(10_000)).unwrap()
    }

    #[test]
    fn parse_simple_fund() {
        let devnet = run_script(&format!("op,caller,amount\nfund,{ALICE},1.0\n"));
        let alice: Address = ALICE.parse().unwrap();

        assert_eq!(devnet.with_contract(|c| c.amount_funded(&alice)), ether(1));
        assert_eq!(devnet.balance_of(&alice), ether(9_999));
    }

    #[test]
    fn below_minimum_is_skipped() {
        let devnet = run_script(&format!("op,caller,amount\nfund,{ALICE},0.01\n"));
        assert_eq!(devnet.contract_balance(), 0);
    }

    #[test]
    fn owner_withdraw_resets() {
        let csv = format!(
            "op,caller,amount\n\
             fund,{ALICE},1\n\
             fund,{BOB},2\n\
             withdraw,{DEFAULT_OWNER},\n"
        );
        let devnet = run_script(&csv);

        assert_eq!(devnet.contract_balance(), 0);
        assert_eq!(devnet.with_contract(|c| c.funder_count()), 0);
        assert_eq!(devnet.balance_of(&owner()), ether(10_003));
    }

    #[test]
    fn non_owner_withdraw_is_skipped() {
        let csv = format!(
            "op,caller,amount\n\
             fund,{ALICE},1\n\
             withdraw,{ALICE},\n"
        );
        let devnet = run_script(&csv);
        assert_eq!(devnet.contract_balance(), ether(1));
    }

    #[test]
    fn price_update_changes_the_floor() {
        // 0.03 ether is 60 USD at 2000, 30 USD at 1000
        let csv = format!(
            "op,caller,amount\n\
             fund,{ALICE},0.03\n\
             price,,1000\n\
             fund,{BOB},0.03\n"
        );
        let devnet = run_script(&csv);
        let bob: Address = BOB.parse().unwrap();

        assert_eq!(devnet.contract_balance(), ether(3) / 100);
        assert_eq!(devnet.with_contract(|c| c.amount_funded(&bob)), 0);
    }

    #[test]
    fn skip_malformed_rows() {
        let csv = format!(
            "op,caller,amount\n\
             fund,{ALICE},1\n\
             fund,not-an-address,1\n\
             refund,{ALICE},1\n\
             fund,{BOB},1\n"
        );
        let devnet = run_script(&csv);
        assert_eq!(devnet.with_contract(|c| c.funder_count()), 2);
    }

    #[test]
    fn write_contributors_sorted_by_address() {
        let csv = format!(
            "op,caller,amount\n\
             fund,{ALICE},1.5\n\
             fund,{BOB},2\n\
             fund,{ALICE},0.5\n"
        );
        let devnet = run_script(&csv);

        let mut output = Vec::new();
        write_contributors(&devnet, &mut output).unwrap();
        let output = String::from_utf8(output).unwrap();

        assert_eq!(
            output,
            format!(
                "contributor,amount_wei,amount_eth\n\
                 {BOB},2000000000000000000,2\n\
                 {ALICE},2000000000000000000,2\n"
            )
        );
    }

    #[test]
    fn calls_report_file_lines() {
        let csv = format!(
            "op,caller,amount\n\
             fund,{ALICE},1\n\
             bogus\n\
             withdraw,{DEFAULT_OWNER},\n"
        );
        let mut rdr = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(Cursor::new(csv));

        let calls: Vec<_> = script_calls(&mut rdr).unwrap().collect();

        assert_eq!(
            calls,
            vec![
                (
                    2,
                    Some(Call::Fund {
                        caller: ALICE.parse().unwrap(),
                        value: ether(1)
                    })
                ),
                (3, None),
                (4, Some(Call::Withdraw { caller: owner() })),
            ]
        );
    }

    #[test]
    fn scale_price_uses_feed_decimals() {
        assert_eq!(scale_price(dec!(2000), 8), Some(2000_0000_0000));
        assert_eq!(scale_price(dec!(1999.123456789), 8), Some(1999_1234_5678));
        assert_eq!(scale_price(dec!(1), 40), None);
    }

    #[test]
    fn live_network_cannot_run_scripts() {
        let network = NetworkConfig::builtin("sepolia").unwrap();
        let result = process_script(Cursor::new(String::new()), &network, owner(), 0);
        assert!(matches!(result, Err(CliError::Deploy(DeployError::LiveFeedUnavailable(_)))));
    }
}
