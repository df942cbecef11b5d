pub mod engine;
pub mod slippage;

pub use engine::{RouteSelection, RoutingEngine};
pub use slippage::SlippagePolicy;
