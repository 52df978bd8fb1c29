// Copyright 2024 Nemos Contributors.
// This file is part of nemos.

// nemos is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// nemos is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with nemos.  If not, see <http://www.gnu.org/licenses/>.

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{BalancesCommand, Cli, Command, WalletCommand};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Balances { command } => match command {
            BalancesCommand::List { datadir } => commands::balances_list(&datadir)?,
        },
        Command::Wallet { command } => match command {
            WalletCommand::NewAccount { datadir } => commands::wallet_new_account(&datadir)?,
            WalletCommand::PkPrint { keystore } => commands::wallet_pk_print(&keystore)?,
        },
        Command::Run(args) => commands::run(args).await?,
        Command::Version => commands::print_version(),
    }

    Ok(())
}
