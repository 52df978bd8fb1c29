mod balances;
mod run;
mod version;
mod wallet;

pub use balances::balances_list;
pub use run::run;
pub use version::{print_version, version_string};
pub use wallet::{wallet_new_account, wallet_pk_print};
