//! User command parsing.

use stomp_events_session::SessionError;

/// Command dispatch error.
///
/// The display text is the status line shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Command verb, the first token of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Login,
    Join,
    Exit,
    Logout,
    Report,
    Summary,
}

impl Verb {
    /// Parse a verb; unknown verbs return `None`.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "login" => Some(Self::Login),
            "join" => Some(Self::Join),
            "exit" => Some(Self::Exit),
            "logout" => Some(Self::Logout),
            "report" => Some(Self::Report),
            "summary" => Some(Self::Summary),
            _ => None,
        }
    }

    /// Argument synopsis shown on a usage error.
    #[must_use]
    pub const fn usage(self) -> &'static str {
        match self {
            Self::Login => "login {host:port} {username} {password}",
            Self::Join => "join {game_name}",
            Self::Exit => "exit {game_name}",
            Self::Logout => "logout",
            Self::Report => "report {file_path}",
            Self::Summary => "summary {game_name} {user_name} {file_path}",
        }
    }
}

/// A fully parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Login {
        host_port: String,
        username: String,
        password: String,
    },
    Join {
        channel: String,
    },
    Exit {
        channel: String,
    },
    Logout,
    Report {
        path: String,
    },
    Summary {
        channel: String,
        user: String,
        path: String,
    },
}

impl UserCommand {
    /// Build the command for `verb` from the tokens that follow it.
    ///
    /// Extra trailing arguments are ignored.
    ///
    /// # Errors
    /// Returns a usage error if required arguments are missing.
    pub fn from_args(verb: Verb, args: &[String]) -> Result<Self, CommandError> {
        let usage = || CommandError::Usage(verb.usage());

        let command = match verb {
            Verb::Login => match args {
                [host_port, username, password, ..] => Self::Login {
                    host_port: host_port.clone(),
                    username: username.clone(),
                    password: password.clone(),
                },
                _ => return Err(usage()),
            },
            Verb::Join => Self::Join {
                channel: args.first().ok_or_else(usage)?.clone(),
            },
            Verb::Exit => Self::Exit {
                channel: args.first().ok_or_else(usage)?.clone(),
            },
            Verb::Logout => Self::Logout,
            Verb::Report => Self::Report {
                path: args.first().ok_or_else(usage)?.clone(),
            },
            Verb::Summary => match args {
                [channel, user, path, ..] => Self::Summary {
                    channel: channel.clone(),
                    user: user.clone(),
                    path: path.clone(),
                },
                _ => return Err(usage()),
            },
        };
        Ok(command)
    }
}

/// Split a line into tokens with shell-style quoting.
///
/// Unbalanced quotes fall back to plain whitespace splitting.
#[must_use]
pub fn tokenize(line: &str) -> Vec<String> {
    shlex::split(line).unwrap_or_else(|| line.split_whitespace().map(str::to_string).collect())
}
