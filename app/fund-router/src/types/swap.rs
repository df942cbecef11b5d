//! Quote, execution parameter and execution result types

use crate::types::path::{AccountId, SwapPath};
use serde::Serialize;
use std::fmt;

/// Slot of a venue inside the routing engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VenueId {
    A,
    B,
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VenueId::A => write!(f, "venue-a"),
            VenueId::B => write!(f, "venue-b"),
        }
    }
}

/// A read-only price estimate from one venue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueQuote {
    pub venue: VenueId,
    pub venue_name: String,
    pub amount_in: u64,
    pub amount_out: u64,
}

impl VenueQuote {
    /// Strict comparison; equal quotes are never "better"
    pub fn better_than(&self, other: &VenueQuote) -> bool {
        self.amount_out > other.amount_out
    }
}

/// Parameters handed to a venue's execute call
#[derive(Debug, Clone)]
pub struct SwapParams {
    /// Amount of `path.asset_in` to spend
    pub amount_in: u64,
    /// Minimum acceptable output (slippage protection)
    pub min_amount_out: u64,
    pub path: SwapPath,
    /// Account the input is pulled from; must have granted the venue router an allowance
    pub payer: AccountId,
    /// Account receiving the output
    pub recipient: AccountId,
    /// Unix timestamp (seconds) after which execution is refused
    pub deadline: u64,
}

/// Outcome of one routed leg
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub venue: VenueId,
    pub venue_name: String,
    pub amount_in: u64,
    pub quoted_out: u64,
    pub min_amount_out: u64,
    pub amount_out: u64,
}

impl ExecutionResult {
    /// Realized shortfall against the quote, in basis points
    pub fn slippage_bps(&self) -> u64 {
        if self.quoted_out == 0 || self.amount_out >= self.quoted_out {
            return 0;
        }
        ((self.quoted_out - self.amount_out) as u128 * 10_000 / self.quoted_out as u128) as u64
    }
}
