//! Mining module for sealing blocks

pub mod miner;

pub use miner::{Miner, MiningStats};
