// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use clap::Parser;
use cli::Cli;

mod aggregator;
mod cli;
mod client;
mod fetch_result;
pub mod helpers;

#[actix_web::main]
pub async fn main() {
    // Execute the cli
    if let Err(err) = Cli::parse().execute().await {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}
