use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use liveswap_transport::DEFAULT_ADDR;

use crate::exit::{CliError, CliResult, INTERNAL, USAGE};
use crate::output::OutputFormat;

pub mod hostname;
pub mod listen;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Watch documents and push every save to connected consumers.
    Serve(ServeArgs),
    /// Connect as a consumer and print every frame received.
    Listen(ListenArgs),
    /// Ask a running producer for its host name.
    Hostname(HostnameArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Hostname(args) => hostname::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Directory to watch, or a single document to re-push on any change
    /// next to it.
    #[arg(default_value = ".")]
    pub path: PathBuf,
    /// Address to listen on.
    #[arg(long, env = "LIVESWAP_ADDR", default_value_t = DEFAULT_ADDR)]
    pub addr: SocketAddr,
    /// Only push files whose extension contains this marker.
    #[arg(long, conflicts_with = "any")]
    pub marker: Option<String>,
    /// Push every changed file.
    #[arg(long)]
    pub any: bool,
    /// Drop a consumer whose write blocks longer than this (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub write_timeout: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Producer address.
    #[arg(long, env = "LIVESWAP_ADDR", default_value_t = DEFAULT_ADDR)]
    pub addr: SocketAddr,
    /// Exit after receiving N frames.
    #[arg(long)]
    pub count: Option<usize>,
    /// Connection timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct HostnameArgs {
    /// Producer address.
    #[arg(long, env = "LIVESWAP_ADDR", default_value_t = DEFAULT_ADDR)]
    pub addr: SocketAddr,
    /// Give up after this long (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

/// Flag cleared on Ctrl-C.
pub(crate) fn stop_on_ctrlc() -> CliResult<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))?;
    Ok(running)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration(" 3 ").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
    }
}
