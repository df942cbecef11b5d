//! Domain events emitted by the fund after a call completes

use parking_lot::Mutex;
use serde::{Serialize, Serializer};
use solana_sdk::pubkey::Pubkey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event")]
pub enum FundEvent {
    Deposit {
        #[serde(serialize_with = "base58")]
        caller: Pubkey,
        #[serde(serialize_with = "base58")]
        stable_asset: Pubkey,
        amount: u64,
        risk_a_amount: u64,
        risk_b_amount: u64,
    },
    Withdraw {
        #[serde(serialize_with = "base58")]
        caller: Pubkey,
        #[serde(serialize_with = "base58")]
        risk_asset_in: Pubkey,
        #[serde(serialize_with = "base58")]
        stable_asset_out: Pubkey,
        amount: u64,
        amount_out: u64,
    },
}

fn base58<S: Serializer>(key: &Pubkey, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&key.to_string())
}

/// Destination for fund events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: FundEvent);
}

/// Append-only in-memory event log
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<FundEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<FundEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Remove and return everything logged so far
    pub fn drain(&self) -> Vec<FundEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: FundEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_collects_and_drains() {
        let log = EventLog::new();
        assert!(log.is_empty());

        log.emit(FundEvent::Withdraw {
            caller: Pubkey::new_unique(),
            risk_asset_in: Pubkey::new_unique(),
            stable_asset_out: Pubkey::new_unique(),
            amount: 10,
            amount_out: 9,
        });

        assert_eq!(log.len(), 1);
        assert_eq!(log.drain().len(), 1);
        assert!(log.is_empty());
    }

    #[test]
    fn test_event_json_shape() {
        let stable = Pubkey::new_unique();
        let event = FundEvent::Deposit {
            caller: Pubkey::new_unique(),
            stable_asset: stable,
            amount: 3,
            risk_a_amount: 1,
            risk_b_amount: 2,
        };

        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "Deposit");
        assert_eq!(json["stable_asset"], stable.to_string());
        assert_eq!(json["amount"], 3);
        assert_eq!(json["risk_b_amount"], 2);
    }
}
