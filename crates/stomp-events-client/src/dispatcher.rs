//! Command dispatcher: command lines into session operations.

use std::sync::Arc;

use stomp_events_core::{BatchSource, ReportSink, Transport};
use stomp_events_session::{Session, SessionError};

use crate::command::{CommandError, UserCommand, Verb, tokenize};

/// Maps user command lines onto session operations.
///
/// Every verb except `login` requires a connected session.
pub struct Dispatcher<T, S>
where
    T: Transport,
    S: BatchSource + ReportSink,
{
    session: Arc<Session<T, S>>,
}

impl<T, S> Dispatcher<T, S>
where
    T: Transport,
    S: BatchSource + ReportSink,
{
    #[must_use]
    pub const fn new(session: Arc<Session<T, S>>) -> Self {
        Self { session }
    }

    #[must_use]
    pub const fn session(&self) -> &Arc<Session<T, S>> {
        &self.session
    }

    /// Execute one command line.
    ///
    /// Returns the status text to show, if any. Commands acknowledged by
    /// the server report through the inbound path instead.
    pub async fn execute(&self, line: &str) -> Option<String> {
        let tokens = tokenize(line);
        let (verb, args) = tokens.split_first()?;
        let Some(verb) = Verb::parse(verb) else {
            tracing::debug!(verb = %verb, "ignoring unknown command");
            return None;
        };

        match self.dispatch(verb, args).await {
            Ok(text) => text,
            Err(e) => Some(e.to_string()),
        }
    }

    async fn dispatch(&self, verb: Verb, args: &[String]) -> Result<Option<String>, CommandError> {
        self.check_connection(verb)?;

        match UserCommand::from_args(verb, args)? {
            UserCommand::Login {
                host_port,
                username,
                password,
            } => {
                self.session.login(&host_port, &username, &password).await?;
                Ok(None)
            }
            UserCommand::Join { channel } => {
                self.session.join(&channel).await?;
                Ok(None)
            }
            UserCommand::Exit { channel } => {
                self.session.leave(&channel).await?;
                Ok(None)
            }
            UserCommand::Logout => {
                self.session.request_logout().await?;
                Ok(None)
            }
            UserCommand::Report { path } => {
                let (channel, sent) = self.session.publish_batch(&path).await?;
                Ok(Some(format!("Reported {sent} events to {channel}")))
            }
            UserCommand::Summary {
                channel,
                user,
                path,
            } => {
                self.session.summarize(&channel, &user, &path).await?;
                Ok(Some(format!("Summary written to {path}")))
            }
        }
    }

    /// Connection gate, checked before argument count.
    fn check_connection(&self, verb: Verb) -> Result<(), SessionError> {
        let connected = self.session.is_connected();
        match verb {
            Verb::Login if connected => Err(SessionError::AlreadyConnected),
            Verb::Login => Ok(()),
            _ if connected => Ok(()),
            _ => Err(SessionError::NotConnected),
        }
    }
}
