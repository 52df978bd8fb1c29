use nem_node::DEFAULT_MINING_DIFFICULTY;
use nem_state::State;

pub fn balances_list(datadir: &str) -> eyre::Result<()> {
    let datadir = nem_utils::expand_path(datadir);
    let state = State::new_from_disk(&datadir, DEFAULT_MINING_DIFFICULTY)?;

    println!("Accounts balances at {}:", state.latest_block_hash());
    println!("________________________\n");
    for (account, balance) in state.ledger().balances() {
        println!("{account}: {balance}");
    }

    println!("\nAccount nonces:\n");
    println!("________________________\n");
    for (account, nonce) in state.ledger().account_nonces() {
        println!("{account}: {nonce}");
    }

    Ok(())
}
