// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod cli;
mod dispatch;

use clap::Parser;

fn main() {
    let cli = cli::Cli::parse();
    std::process::exit(dispatch::run(cli));
}
