//! Ledger configuration
//!
//! Defaults match the constants used across the crate; a JSON file may
//! override any subset of them.

use crate::core::{LedgerState, DEFAULT_DIFFICULTY, MINIMUM_TRANSACTION};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Value minted by the genesis transaction unless configured otherwise
pub const DEFAULT_GENESIS_VALUE: f64 = 100.0;

/// Longest zero prefix a SHA-256 hex digest can carry
pub const MAX_DIFFICULTY: usize = 64;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Difficulty must be between 1 and 64, got {0}")]
    InvalidDifficulty(usize),
    #[error("Minimum transaction must be a non-negative number, got {0}")]
    InvalidMinimum(f64),
    #[error("Genesis value must be positive, got {0}")]
    InvalidGenesisValue(f64),
}

/// Tunable parameters of a ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Leading zero hex characters required of a block hash
    pub difficulty: usize,
    /// Smallest input total a transaction may spend
    pub minimum_transaction: f64,
    /// Value of the genesis output
    pub genesis_value: f64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            minimum_transaction: MINIMUM_TRANSACTION,
            genesis_value: DEFAULT_GENESIS_VALUE,
        }
    }
}

impl LedgerConfig {
    /// Load and validate a configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        log::debug!("Loaded ledger config from {:?}: {:?}", path, config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.difficulty == 0 || self.difficulty > MAX_DIFFICULTY {
            return Err(ConfigError::InvalidDifficulty(self.difficulty));
        }
        if !self.minimum_transaction.is_finite() || self.minimum_transaction < 0.0 {
            return Err(ConfigError::InvalidMinimum(self.minimum_transaction));
        }
        if !self.genesis_value.is_finite() || self.genesis_value <= 0.0 {
            return Err(ConfigError::InvalidGenesisValue(self.genesis_value));
        }
        Ok(())
    }

    /// Empty ledger state using this configuration's minimum
    pub fn ledger(&self) -> LedgerState {
        LedgerState::with_minimum(self.minimum_transaction)
    }
}
