//! Error types for the fund and its routing core

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FundError>;

#[derive(Error, Debug)]
pub enum FundError {
    #[error("Asset {0} is not accepted for this operation")]
    InvalidAsset(Pubkey),

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Invalid swap path: {0}")]
    InvalidPath(String),

    #[error("Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u64, available: u64 },

    #[error("Insufficient allowance: need {needed}, have {available}")]
    InsufficientAllowance { needed: u64, available: u64 },

    #[error("Venue {venue} cannot quote this path: {reason}")]
    QuoteUnavailable { venue: String, reason: String },

    #[error("No venue could quote the requested path")]
    NoRouteAvailable,

    #[error("Slippage exceeded: minimum {min_amount_out}, would receive {amount_out}")]
    SlippageExceeded { min_amount_out: u64, amount_out: u64 },

    #[error("Swap deadline {deadline} passed (now {now})")]
    Expired { deadline: u64, now: u64 },

    #[error("Math overflow in calculation")]
    MathOverflow,

    #[error("Invalid pool reserves")]
    InvalidReserves,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FundError {
    /// True for failures that only disqualify a single venue's quote
    pub fn is_quote_unavailable(&self) -> bool {
        matches!(self, FundError::QuoteUnavailable { .. })
    }
}
