//! Command Line Interface (CLI) arguments.

use std::path::PathBuf;

use clap::Parser;

/// Pandora series command line interface
#[derive(Clone, Debug, Parser)]
#[command(version, about)]
pub struct CommandLineArgs {
    /// The IP address on which the server should listen
    #[arg(long, default_value = "0.0.0.0", env = "PANDORA_HOST")]
    pub host: String,
    /// The port to which the server should bind
    #[arg(long, default_value_t = 8000, env = "PANDORA_PORT")]
    pub port: u16,
    /// Directory containing measurement logs named `{chemical}_{location}.csv`
    #[arg(long, default_value = ".", env = "PANDORA_DATA_DIR")]
    pub data_dir: PathBuf,
    /// Location used when a request does not name one
    #[arg(long, default_value = "Mcmillan", env = "PANDORA_DEFAULT_LOCATION")]
    pub default_location: String,
    /// Chemical used when a request does not name one
    #[arg(long, default_value = "HCHO", env = "PANDORA_DEFAULT_CHEMICAL")]
    pub default_chemical: String,
    /// Whether to allow cross-origin requests from any origin
    #[arg(
        long,
        default_value_t = true,
        action = clap::ArgAction::Set,
        env = "PANDORA_ALLOW_ANY_ORIGIN"
    )]
    pub allow_any_origin: bool,
    /// Log filter directives, overriding `RUST_LOG`
    #[arg(long, env = "PANDORA_LOG")]
    pub log_filter: Option<String>,
    /// Flag indicating whether HTTPS should be used
    #[arg(long, default_value_t = false, env = "PANDORA_HTTPS")]
    pub https: bool,
    /// Path to the certificate file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/pandora-series/certs/cert.pem",
        env = "PANDORA_CERT_FILE"
    )]
    pub cert_file: String,
    /// Path to the key file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/pandora-series/certs/key.pem",
        env = "PANDORA_KEY_FILE"
    )]
    pub key_file: String,
    /// Maximum time in seconds to wait for requests to complete upon receiving `ctrl+c` signal.
    #[arg(long, default_value_t = 60, env = "PANDORA_SHUTDOWN_TIMEOUT")]
    pub graceful_shutdown_timeout: u64,
}

/// Returns parsed command line arguments.
pub fn parse() -> CommandLineArgs {
    CommandLineArgs::parse()
}
