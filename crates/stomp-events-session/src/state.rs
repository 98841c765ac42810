//! Session state guarded by the session lock.

use std::{collections::HashMap, fmt};

use crate::event_log::EventLog;

/// Connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No CONNECTED acknowledgement seen yet.
    Disconnected,
    /// Server acknowledged the login.
    Connected,
    /// Terminal: no further frames are sent.
    Terminated,
}

/// Action deferred until the server acknowledges a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptAction {
    Joined(String),
    Left(String),
    Disconnect,
}

impl fmt::Display for ReceiptAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Joined(channel) => write!(f, "Joined channel {channel}"),
            Self::Left(channel) => write!(f, "Exited channel {channel}"),
            Self::Disconnect => f.write_str("Disconnected properly."),
        }
    }
}

/// Mutable session data. Only reachable through the session lock.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub status: ConnectionStatus,
    pub current_user: String,
    pub subscriptions: HashMap<String, u64>,
    pub receipts: HashMap<u64, ReceiptAction>,
    pub events: EventLog,
    next_subscription_id: u64,
    next_receipt_id: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            current_user: String::new(),
            subscriptions: HashMap::new(),
            receipts: HashMap::new(),
            events: EventLog::new(),
            next_subscription_id: 0,
            next_receipt_id: 0,
        }
    }

    /// Record a subscription to `channel` under a fresh id.
    pub fn subscribe(&mut self, channel: &str) -> u64 {
        let id = self.next_subscription_id;
        self.next_subscription_id += 1;
        self.subscriptions.insert(channel.to_string(), id);
        id
    }

    /// Record `action` under a fresh receipt id.
    pub fn expect_receipt(&mut self, action: ReceiptAction) -> u64 {
        let id = self.next_receipt_id;
        self.next_receipt_id += 1;
        self.receipts.insert(id, action);
        id
    }

    /// Remove and return the action recorded for `receipt_id`.
    pub fn take_receipt(&mut self, receipt_id: u64) -> Option<ReceiptAction> {
        self.receipts.remove(&receipt_id)
    }
}
