//! Session state machine and file capabilities for the STOMP events client.
//!
//! Provides:
//! - `Session` - Connection status, subscriptions, receipts and event log
//! - `run_inbound` - Feeds transport frames into a session
//! - Batch/report stores (filesystem, memory)

pub mod event_log;
pub mod inbound;
pub mod session;
pub mod state;
pub mod storage;

pub use event_log::EventLog;
pub use inbound::run_inbound;
pub use session::{InboundOutcome, Session, SessionError};
pub use state::{ConnectionStatus, ReceiptAction};
