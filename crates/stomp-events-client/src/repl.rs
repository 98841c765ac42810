//! Command loop.

use std::io::BufRead;

use stomp_events_core::{BatchSource, ReportSink, Transport};
use tokio::sync::{mpsc, watch};

use crate::dispatcher::Dispatcher;

/// Execute lines until the input ends or the session terminates.
///
/// Status text is passed to `print`. Lines still queued when the session
/// terminates are dropped.
pub async fn run_commands<T, S, F>(
    dispatcher: &Dispatcher<T, S>,
    mut lines: mpsc::UnboundedReceiver<String>,
    mut print: F,
) where
    T: Transport,
    S: BatchSource + ReportSink,
    F: FnMut(&str),
{
    let shutdown = dispatcher.session().shutdown_signal();
    let terminated = wait_terminated(shutdown);
    tokio::pin!(terminated);

    loop {
        let line = tokio::select! {
            biased;
            () = &mut terminated => {
                tracing::debug!("session terminated, leaving command loop");
                break;
            }
            line = lines.recv() => line,
        };
        let Some(line) = line else {
            tracing::debug!("input closed");
            break;
        };

        if let Some(text) = dispatcher.execute(&line).await {
            print(&text);
        }
    }
}

async fn wait_terminated(mut shutdown: watch::Receiver<bool>) {
    // An error means the session is gone, which ends the loop as well.
    let _ = shutdown.wait_for(|terminated| *terminated).await;
}

/// Read standard input on a dedicated thread.
///
/// The thread ends at end of input or when the receiver is dropped.
#[must_use]
pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
