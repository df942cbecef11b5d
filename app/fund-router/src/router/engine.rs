//! Two-venue router - quotes both venues and executes through the better one

use crate::error::{FundError, Result};
use crate::router::slippage::SlippagePolicy;
use crate::types::{AccountId, ExecutionResult, SwapParams, SwapPath, VenueId, VenueQuote};
use crate::venue::VenueAdapter;
use log::{debug, info, warn};
use std::sync::Arc;

/// Outcome of comparing both venues for one trade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSelection {
    /// The winning quote
    pub chosen: VenueQuote,
    /// Venue A's quote, `None` if it could not price the path
    pub quote_a: Option<u64>,
    /// Venue B's quote, `None` if it could not price the path
    pub quote_b: Option<u64>,
}

/// Router over exactly two venues.
///
/// The venue with the strictly greater quote wins; equal quotes go to venue A.
/// A venue that reports `QuoteUnavailable` is skipped, and only the selected
/// venue is ever executed against.
pub struct RoutingEngine {
    venue_a: Arc<dyn VenueAdapter>,
    venue_b: Arc<dyn VenueAdapter>,
    slippage: SlippagePolicy,
}

impl RoutingEngine {
    pub fn new(
        venue_a: Arc<dyn VenueAdapter>,
        venue_b: Arc<dyn VenueAdapter>,
        slippage: SlippagePolicy,
    ) -> Result<Self> {
        slippage.validate()?;
        Ok(Self {
            venue_a,
            venue_b,
            slippage,
        })
    }

    pub fn slippage(&self) -> SlippagePolicy {
        self.slippage
    }

    pub fn venue(&self, id: VenueId) -> &dyn VenueAdapter {
        match id {
            VenueId::A => self.venue_a.as_ref(),
            VenueId::B => self.venue_b.as_ref(),
        }
    }

    /// Quote both venues and pick the better one without moving funds
    pub fn best_quote(&self, amount_in: u64, path: &SwapPath) -> Result<RouteSelection> {
        if amount_in == 0 {
            return Err(FundError::InvalidAmount);
        }

        let quote_a = self.quote_venue(VenueId::A, amount_in, path)?;
        let quote_b = self.quote_venue(VenueId::B, amount_in, path)?;

        let selection = RouteSelection {
            quote_a: quote_a.as_ref().map(|q| q.amount_out),
            quote_b: quote_b.as_ref().map(|q| q.amount_out),
            chosen: select(quote_a, quote_b).ok_or(FundError::NoRouteAvailable)?,
        };

        debug!(
            "{} for {}: {:?} vs {:?} -> {}",
            path, amount_in, selection.quote_a, selection.quote_b, selection.chosen.venue
        );
        Ok(selection)
    }

    /// Route one swap: quote both venues, execute the winner only.
    ///
    /// `payer` is the account the input is pulled from and must already allow
    /// the winning venue's router to spend `amount_in`; output goes to
    /// `recipient`. Execution failures are returned as-is, never retried on
    /// the other venue.
    pub fn route_swap(
        &self,
        amount_in: u64,
        path: &SwapPath,
        payer: &AccountId,
        recipient: &AccountId,
        deadline: u64,
    ) -> Result<ExecutionResult> {
        let selection = self.best_quote(amount_in, path)?;
        self.execute_selection(selection, path, payer, recipient, deadline)
    }

    /// Execute a previously selected quote on its venue
    pub fn execute_selection(
        &self,
        selection: RouteSelection,
        path: &SwapPath,
        payer: &AccountId,
        recipient: &AccountId,
        deadline: u64,
    ) -> Result<ExecutionResult> {
        let chosen = selection.chosen;
        let amount_in = chosen.amount_in;
        let min_amount_out = self.slippage.min_amount_out(chosen.amount_out)?;

        let params = SwapParams {
            amount_in,
            min_amount_out,
            path: *path,
            payer: *payer,
            recipient: *recipient,
            deadline,
        };

        let amount_out = self.venue(chosen.venue).execute(&params)?;

        info!(
            "Routed {} via {} ({}): quoted {}, min {}, received {}",
            amount_in,
            chosen.venue_name,
            chosen.venue,
            chosen.amount_out,
            min_amount_out,
            amount_out
        );

        Ok(ExecutionResult {
            venue: chosen.venue,
            venue_name: chosen.venue_name,
            amount_in,
            quoted_out: chosen.amount_out,
            min_amount_out,
            amount_out,
        })
    }

    /// `None` when the venue cannot price the path; any other quote error
    /// aborts the route
    fn quote_venue(
        &self,
        id: VenueId,
        amount_in: u64,
        path: &SwapPath,
    ) -> Result<Option<VenueQuote>> {
        let venue = self.venue(id);
        match venue.quote(amount_in, path) {
            Ok(amount_out) => Ok(Some(VenueQuote {
                venue: id,
                venue_name: venue.name().to_string(),
                amount_in,
                amount_out,
            })),
            Err(e) if e.is_quote_unavailable() => {
                warn!("{} ({}) quote skipped: {}", venue.name(), id, e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Pick the strictly better quote; venue A wins ties
fn select(quote_a: Option<VenueQuote>, quote_b: Option<VenueQuote>) -> Option<VenueQuote> {
    match (quote_a, quote_b) {
        (Some(a), Some(b)) => {
            if b.better_than(&a) {
                Some(b)
            } else {
                Some(a)
            }
        }
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}
