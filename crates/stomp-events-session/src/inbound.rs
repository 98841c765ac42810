//! Inbound loop: transport frames into the session.

use stomp_events_core::{BatchSource, Frame, ReportSink, Transport};

use crate::session::{InboundOutcome, Session};

/// Receive frames until the session terminates or the transport closes.
///
/// Every outcome is passed to `report`, including the final one.
pub async fn run_inbound<T, S, F>(session: &Session<T, S>, mut report: F)
where
    T: Transport,
    S: BatchSource + ReportSink,
    F: FnMut(&InboundOutcome) + Send,
{
    while !session.is_terminated() {
        let bytes = match session.transport().receive().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::debug!("transport reached end of stream");
                if let Some(outcome) = session.on_transport_closed() {
                    report(&outcome);
                }
                break;
            }
            Err(e) => {
                tracing::error!("Receive failed: {e}");
                if let Some(outcome) = session.on_transport_closed() {
                    report(&outcome);
                }
                break;
            }
        };

        let outcome = session.on_inbound_frame(&Frame::parse(&bytes));
        report(&outcome);
        if outcome.is_terminal() {
            break;
        }
    }
}
