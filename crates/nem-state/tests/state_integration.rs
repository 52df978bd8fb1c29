use std::collections::HashMap;

use nem_core::{Address, Block, Transaction, BLOCK_REWARD};
use nem_state::State;
use secp256k1::Secp256k1;

fn keypair() -> (secp256k1::SecretKey, Address) {
    let secp = Secp256k1::new();
    let mut rng = rand::thread_rng();
    let (secret, public) = secp.generate_keypair(&mut rng);
    (secret, Address::from_public_key(&public))
}

fn write_genesis(dir: &std::path::Path, balances: HashMap<Address, u64>) {
    std::fs::create_dir_all(dir.join("database")).unwrap();
    let balances: HashMap<String, u64> = balances.into_iter().map(|(a, b)| (a.to_hex(), b)).collect();
    let genesis = serde_json::json!({
        "genesis_time": "2024-01-21T00:00:00.000000000Z",
        "chain_id": "nemos-chain",
        "symbol": "NEM",
        "balances": balances,
    });
    std::fs::write(dir.join("database").join("genesis.json"), genesis.to_string()).unwrap();
}

/// Two real blocks, mined and persisted across a simulated process
/// restart, must replay to the same ledger a fresh `State` would
/// compute live.
#[test]
fn multi_block_chain_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let (alice_secret, alice) = keypair();
    let miner = Address::from_hex("0x0000000000000000000000000000000000000099").unwrap();
    write_genesis(dir.path(), HashMap::from([(alice, 1_000)]));

    let mut state = State::new_from_disk(dir.path(), 0).unwrap();

    let tx1 = Transaction::base(alice, miner, 100, 1, "", 1_700_000_000).sign(&alice_secret).unwrap();
    let block1 = Block::new(state.latest_block_hash(), state.next_block_number(), 0, 1_700_000_001, miner, vec![tx1]);
    let hash1 = state.add_block(block1).unwrap();

    let tx2 = Transaction::base(alice, miner, 50, 2, "", 1_700_000_002).sign(&alice_secret).unwrap();
    let block2 = Block::new(hash1, state.next_block_number(), 0, 1_700_000_003, miner, vec![tx2]);
    let hash2 = state.add_block(block2).unwrap();

    drop(state);
    let reloaded = State::new_from_disk(dir.path(), 0).unwrap();

    assert_eq!(reloaded.latest_block_hash(), hash2);
    assert_eq!(reloaded.next_block_number(), 2);
    assert_eq!(reloaded.ledger().balance(&alice), 1_000 - 102 - 52);
    assert_eq!(reloaded.ledger().balance(&miner), 150 + 2 * (BLOCK_REWARD + 2));
    assert_eq!(reloaded.ledger().next_account_nonce(&alice), 3);
}

/// A block whose parent doesn't match the current tip is rejected
/// before anything is persisted — the log stays exactly as it was.
#[test]
fn rejecting_a_bad_block_does_not_grow_the_log() {
    let dir = tempfile::tempdir().unwrap();
    let (_, alice) = keypair();
    let miner = Address::from_hex("0x0000000000000000000000000000000000000099").unwrap();
    write_genesis(dir.path(), HashMap::from([(alice, 1_000)]));

    let mut state = State::new_from_disk(dir.path(), 0).unwrap();
    let good = Block::new(state.latest_block_hash(), state.next_block_number(), 0, 1_700_000_001, miner, vec![]);
    state.add_block(good).unwrap();

    let wrong_parent = Block::new(nem_core::Hash::sha256(b"not the tip"), state.next_block_number(), 0, 1_700_000_002, miner, vec![]);
    assert!(state.add_block(wrong_parent).is_err());

    let reloaded = State::new_from_disk(dir.path(), 0).unwrap();
    assert_eq!(reloaded.next_block_number(), 1);
}
