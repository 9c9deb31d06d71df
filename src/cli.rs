use crate::protocol::GuessRecord;
use clap::Parser;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 27993;
pub const DEFAULT_TLS_PORT: u16 = 27994;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Plays Wordle against a remote game server and prints the flag it awards.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TCP port the server listens on (default 27993, or 27994 with -s)
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Use a TLS encrypted connection
    #[arg(short = 's')]
    pub tls: bool,

    /// Validate the server's TLS certificate and hostname (off by default)
    #[arg(long = "verify-tls", requires = "tls")]
    pub verify_tls: bool,

    /// Path to a newline-delimited word list
    #[arg(short = 'w', long = "words")]
    pub wordbank_path: Option<PathBuf>,

    /// Connect/read/write timeout in seconds, 0 to wait forever
    #[arg(short = 't', long = "timeout", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print every guess and its marks to stderr once the game is won
    #[arg(long = "show-guesses")]
    pub show_guesses: bool,

    /// Server name (DNS name or IP address)
    pub hostname: String,

    /// Username sent in the hello message
    pub username: String,
}

#[must_use]
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// How much of the server's TLS identity is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsVerification {
    /// Any certificate for any hostname is trusted. The game server uses a
    /// self-signed certificate, so this is what `-s` means unless
    /// `--verify-tls` is given.
    AcceptAny,
    Verify,
}

impl fmt::Display for TlsVerification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AcceptAny => f.write_str("certificate not verified"),
            Self::Verify => f.write_str("certificate verified"),
        }
    }
}

/// Everything needed to reach the server and identify ourselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub tls: Option<TlsVerification>,
    pub username: String,
    pub timeout: Option<Duration>,
}

#[must_use]
pub fn resolve_port(tls: bool, port: Option<u16>) -> u16 {
    match (port, tls) {
        (Some(port), _) => port,
        (None, true) => DEFAULT_TLS_PORT,
        (None, false) => DEFAULT_PORT,
    }
}

impl Cli {
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        let tls = self.tls.then_some(if self.verify_tls {
            TlsVerification::Verify
        } else {
            TlsVerification::AcceptAny
        });
        ClientConfig {
            host: self.hostname.clone(),
            port: resolve_port(self.tls, self.port),
            tls,
            username: self.username.clone(),
            timeout: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
        }
    }
}

pub fn display_history(history: &[GuessRecord]) {
    eprintln!("Guesses ({}):", history.len());
    for (i, record) in history.iter().enumerate() {
        eprintln!("{}. {record}", i + 1);
    }
}
