//! Wallet module for key and spendable-output management

pub mod wallet;

pub use wallet::{Wallet, WalletError};
