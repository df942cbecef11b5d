//! Stablecoin Fund Router
//!
//! This library implements a custodial fund that swaps a deposited stable
//! asset into a 50/50 basket of two risk assets and back, routing every swap
//! through whichever of two venues quotes the better output.

pub mod calculator;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod fund;
pub mod ledger;
pub mod market;
pub mod router;
pub mod types;
pub mod venue;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{FundError, Result};
pub use events::{EventLog, EventSink, FundEvent};
pub use fund::{DepositOutcome, FundConfiguration, FundService, WithdrawOutcome};
pub use ledger::{InMemoryLedger, TokenLedger};
pub use market::SimulatedMarket;
pub use router::{RoutingEngine, SlippagePolicy};
pub use types::{ExecutionResult, SwapPath, VenueId};
pub use venue::VenueAdapter;
