//! Minimum-output policy applied to the selected venue's quote

use crate::calculator::{BPS_DENOMINATOR, min_amount_out};
use crate::error::{FundError, Result};
use serde::{Deserialize, Serialize};

/// Default tolerance, 2%
pub const DEFAULT_SLIPPAGE_BPS: u16 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlippagePolicy {
    /// Accept any output down to zero. Leaves the swap fully exposed to
    /// front-running between quote and execution.
    Unbounded,
    /// Require at least `quote * (1 - bps / 10000)`, rounded down
    Tolerance { bps: u16 },
}

impl Default for SlippagePolicy {
    fn default() -> Self {
        SlippagePolicy::Tolerance {
            bps: DEFAULT_SLIPPAGE_BPS,
        }
    }
}

impl SlippagePolicy {
    pub fn validate(&self) -> Result<()> {
        match self {
            SlippagePolicy::Tolerance { bps } if *bps as u128 > BPS_DENOMINATOR => Err(
                FundError::ConfigError(format!("slippage of {} bps exceeds 100%", bps)),
            ),
            _ => Ok(()),
        }
    }

    /// Floor for the realized output of a trade quoted at `quote`
    pub fn min_amount_out(&self, quote: u64) -> Result<u64> {
        match self {
            SlippagePolicy::Unbounded => Ok(0),
            SlippagePolicy::Tolerance { bps } => min_amount_out(quote, *bps),
        }
    }
}
