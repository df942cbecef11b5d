pub mod path;
pub mod swap;

pub use path::{AccountId, Asset, PairKey, SwapPath};
pub use swap::{ExecutionResult, SwapParams, VenueId, VenueQuote};
