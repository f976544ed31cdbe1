//! CLI commands for the ledger
//!
//! Each command wires wallets, a ledger and a chain together in memory;
//! nothing is persisted between runs.

use crate::config::LedgerConfig;
use crate::core::{Blockchain, LedgerState, Transaction};
use crate::crypto::KeyPair;
use crate::mining::Miner;
use crate::wallet::Wallet;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// In-memory state of a demo run
pub struct AppState {
    pub config: LedgerConfig,
    pub ledger: LedgerState,
    pub blockchain: Blockchain,
    pub miner: Miner,
}

impl AppState {
    /// Build a ledger whose genesis output of `config.genesis_value` belongs to `owner`
    pub fn bootstrap(config: LedgerConfig, owner: &Wallet) -> CliResult<Self> {
        let coinbase = KeyPair::generate();
        let genesis = Transaction::genesis(&coinbase, owner.public_key(), config.genesis_value)?;

        let mut ledger = config.ledger();
        let blockchain = Blockchain::new(config.difficulty, genesis, &mut ledger)?;

        println!("🧱 Genesis block: {}", blockchain.latest_hash());

        Ok(Self {
            config,
            ledger,
            blockchain,
            miner: Miner::new(),
        })
    }

    /// Send funds inside a fresh block, mine it and validate the chain
    pub fn transfer(
        &mut self,
        from: &mut Wallet,
        to: &Wallet,
        amount: f64,
    ) -> CliResult<()> {
        println!("\n💸 {} sends {} to {}", from.name(), amount, to.name());

        let mut block = self.blockchain.next_block();
        match from.send_funds(&self.ledger, &to.public_key(), amount) {
            Ok(tx) => {
                if let Err(e) = block.add_transaction(tx, &mut self.ledger) {
                    println!("   ⚠️  Transaction rejected: {}", e);
                }
            }
            Err(e) => println!("   ⚠️  {}", e),
        }

        let stats = self.miner.mine_block(&mut self.blockchain, block)?;
        println!("   ⛏️  Block {} mined: {}", self.blockchain.height(), stats.hash);
        println!(
            "   ├─ Attempts: {} in {}ms ({:.2} H/s)",
            stats.hash_attempts, stats.time_ms, stats.hash_rate
        );
        self.report_validation();
        Ok(())
    }

    pub fn report_validation(&self) {
        match self.blockchain.validate() {
            Ok(()) => println!("   └─ ✅ Chain is valid"),
            Err(e) => println!("   └─ ❌ Chain is invalid: {}", e),
        }
    }
}

fn print_balances(state: &AppState, wallets: &mut [&mut Wallet]) {
    for wallet in wallets.iter_mut() {
        println!("   💰 {}: {}", wallet.name(), wallet.balance(&state.ledger));
    }
}

/// Run the two-wallet transfer scenario
pub fn cmd_demo(config: LedgerConfig) -> CliResult<()> {
    let mut alice = Wallet::with_label("alice");
    let mut bob = Wallet::with_label("bob");

    println!("🔧 Difficulty: {}", config.difficulty);
    println!("🔧 Minimum transaction: {}", config.minimum_transaction);

    let mut state = AppState::bootstrap(config, &alice)?;
    print_balances(&state, &mut [&mut alice, &mut bob]);

    state.transfer(&mut alice, &bob, 40.0)?;
    print_balances(&state, &mut [&mut alice, &mut bob]);

    let too_much = state.config.genesis_value * 10.0;
    state.transfer(&mut alice, &bob, too_much)?;
    print_balances(&state, &mut [&mut alice, &mut bob]);

    state.transfer(&mut bob, &alice, 20.0)?;
    print_balances(&state, &mut [&mut alice, &mut bob]);

    let stats = state.blockchain.stats();
    println!("\n📊 Chain summary");
    println!("   ├─ Blocks: {}", stats.total_blocks);
    println!("   ├─ Transactions: {}", stats.total_transactions);
    println!("   ├─ Unspent outputs: {}", state.ledger.len());
    println!("   └─ Tip: {}", stats.latest_hash);

    Ok(())
}

/// Build a short chain, tamper with it and show validation catching it
pub fn cmd_tamper(config: LedgerConfig) -> CliResult<()> {
    let mut alice = Wallet::with_label("alice");
    let bob = Wallet::with_label("bob");

    let mut state = AppState::bootstrap(config, &alice)?;
    state.transfer(&mut alice, &bob, 25.0)?;

    println!("\n🛠️  Rewriting the amount of the first transfer...");
    if let Some(tx) = state
        .blockchain
        .blocks
        .get_mut(1)
        .and_then(|block| block.transactions.first_mut())
    {
        tx.value *= 2.0;
    }
    state.report_validation();

    println!("\n🛠️  Replacing the stored hash of block 1...");
    if let Some(block) = state.blockchain.blocks.get_mut(1) {
        block.hash = "0".repeat(64);
    }
    state.report_validation();

    Ok(())
}

/// Generate and print a key pair
pub fn cmd_keygen() -> CliResult<()> {
    let key_pair = KeyPair::generate();

    println!("🔑 New key pair");
    println!("   ├─ Address: {}", key_pair.address());
    println!("   ├─ Public key: {}", key_pair.public_key_hex());
    println!("   └─ Private key: {}", key_pair.private_key_hex());
    println!("\n   ⚠️  Keep the private key secret!");

    Ok(())
}
