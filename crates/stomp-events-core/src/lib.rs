//! Protocol building blocks for the STOMP events client.
//!
//! This crate provides:
//! - `Frame` - Text frame codec and request builders
//! - `Event` - Game event record with its wire-body grammar
//! - `Batch` - Batch-file form of events
//! - `render_summary` - Per-user game summary report
//! - `Transport`, `BatchSource`, `ReportSink` - Capabilities the session drives

pub mod batch;
pub mod config;
pub mod event;
pub mod frame;
pub mod protocol;
pub mod report;
pub mod traits;

pub use batch::Batch;
pub use config::ClientConfig;
pub use event::{Event, Updates, WireBody};
pub use frame::Frame;
pub use protocol::{ClientCommand, ServerCommand};
pub use report::render_summary;
pub use traits::{BatchSource, ReportSink, Transport};
