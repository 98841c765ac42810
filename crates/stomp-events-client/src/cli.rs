//! Binary arguments.

use std::path::PathBuf;

use clap::Parser;
use stomp_events_core::{ClientConfig, config::ConfigError};

/// Terminal client for the game events server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Server host. Overrides the config file.
    pub host: Option<String>,

    /// Server port. Overrides the config file.
    pub port: Option<u16>,

    /// JSON config file with `host`, `port` and `accept_version`.
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Resolve the client config: defaults, then the file, then positionals.
    ///
    /// # Errors
    /// Returns error if the config file cannot be loaded.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let config = match &self.config {
            Some(path) => ClientConfig::load(path)?,
            None => ClientConfig::default(),
        };
        Ok(config.with_endpoint(self.host.clone(), self.port))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["stomp-events"]).unwrap();
        assert_eq!(cli.client_config().unwrap(), ClientConfig::default());
    }

    #[test]
    fn test_positionals_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let text = r#"{"host": "stomp.example", "port": 61613, "accept_version": "1.1"}"#;
        file.write_all(text.as_bytes()).unwrap();
        let path = file.path().to_str().unwrap();

        let cli = Cli::try_parse_from(["stomp-events", "--config", path]).unwrap();
        let config = cli.client_config().unwrap();
        assert_eq!(config.endpoint(), "stomp.example:61613");

        let cli = Cli::try_parse_from(["stomp-events", "localhost", "7777", "-c", path]).unwrap();
        let config = cli.client_config().unwrap();
        assert_eq!(config.endpoint(), "localhost:7777");
        assert_eq!(config.accept_version, "1.1");
    }

    #[test]
    fn test_bad_port() {
        assert!(Cli::try_parse_from(["stomp-events", "localhost", "http"]).is_err());
    }
}
