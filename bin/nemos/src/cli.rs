use clap::{Args, Parser, Subcommand};

use nem_node::{DEFAULT_BOOTSTRAP_ACCOUNT_HEX, DEFAULT_BOOTSTRAP_IP, DEFAULT_MINER_HEX, HTTPS_PORT};

#[derive(Parser)]
#[command(name = "nemos", about = "nemos cli tool", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Interacts with balances (list...).
    Balances {
        #[command(subcommand)]
        command: BalancesCommand,
    },
    /// Manages blockchain accounts and keys.
    Wallet {
        #[command(subcommand)]
        command: WalletCommand,
    },
    /// Launches the nemos node and its HTTP API.
    Run(RunArgs),
    /// Describes version.
    Version,
}

#[derive(Subcommand)]
pub enum BalancesCommand {
    /// Lists all balances.
    List {
        /// Absolute path to the node's data dir where the DB is stored.
        #[arg(long = "datadir")]
        datadir: String,
    },
}

#[derive(Subcommand)]
pub enum WalletCommand {
    /// Creates a new account with a new set of elliptic-curve keys.
    NewAccount {
        #[arg(long = "datadir")]
        datadir: String,
    },
    /// Unlocks a keystore file and prints the private and public keys.
    PkPrint {
        /// Absolute path to the encrypted keystore file.
        #[arg(long = "keystore")]
        keystore: String,
    },
}

#[derive(Args)]
pub struct RunArgs {
    #[arg(long = "datadir", env = "NEMOS_DATADIR")]
    pub datadir: String,

    /// Your node's miner account to receive the block rewards.
    #[arg(long, env = "NEMOS_MINER", default_value = DEFAULT_MINER_HEX)]
    pub miner: String,

    /// Your node's public IP for communication with other peers.
    #[arg(long, env = "NEMOS_IP", default_value = "127.0.0.1")]
    pub ip: String,

    /// Your node's public HTTP port (ignored unless --disable-ssl).
    #[arg(long, env = "NEMOS_PORT", default_value_t = HTTPS_PORT)]
    pub port: u64,

    /// Default bootstrap nemos server to interconnect peers.
    #[arg(long = "bootstrap-ip", env = "NEMOS_BOOTSTRAP_IP", default_value = DEFAULT_BOOTSTRAP_IP)]
    pub bootstrap_ip: String,

    /// Default bootstrap nemos server port to interconnect peers.
    #[arg(long = "bootstrap-port", env = "NEMOS_BOOTSTRAP_PORT", default_value_t = HTTPS_PORT)]
    pub bootstrap_port: u64,

    /// Default bootstrap genesis account holding the premine.
    #[arg(long = "bootstrap-account", env = "NEMOS_BOOTSTRAP_ACCOUNT", default_value = DEFAULT_BOOTSTRAP_ACCOUNT_HEX)]
    pub bootstrap_account: String,

    /// Disables the HTTP API's SSL certificate.
    #[arg(long = "disable-ssl", env = "NEMOS_DISABLE_SSL", default_value_t = false)]
    pub disable_ssl: bool,

    /// Email used for the HTTP API's SSL certificate.
    #[arg(long = "ssl-email", env = "NEMOS_SSL_EMAIL", default_value = "")]
    pub ssl_email: String,
}
