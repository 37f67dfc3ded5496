use std::time::Duration;

use clap::{Args, Subcommand};
use radiolink_client::{Client, ClientConfig, MessageKind};
use tracing::debug;

use crate::exit::{client_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod info;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the configuration handshake and print a session summary.
    Info(InfoArgs),
    /// Print messages the radio sends after the handshake.
    Listen(ListenArgs),
    /// Send a text message.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Info(args) => info::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Radio address (host or host:port, port 4403 by default), or a device
    /// path with --serial.
    pub target: String,
    /// Treat TARGET as a serial device.
    #[arg(long)]
    pub serial: bool,
    /// Serial baud rate.
    #[arg(long, default_value_t = 115_200)]
    pub baud: u32,
    /// Send the wake sequence before requesting the configuration.
    #[arg(long)]
    pub wake: bool,
    /// Handshake timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    /// Only print these kinds (comma-separated, e.g. packet,log-record).
    #[arg(long, value_delimiter = ',')]
    pub kinds: Option<Vec<MessageKind>>,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    /// Message text.
    #[arg(long)]
    pub text: String,
    /// Destination node (decimal, 0x-hex or !hex). Default: broadcast.
    #[arg(long)]
    pub to: Option<String>,
    /// Channel index.
    #[arg(long, default_value_t = 0)]
    pub channel: u32,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Open the target and run the handshake.
pub fn connect(target: &TargetArgs, config: ClientConfig) -> CliResult<Client> {
    let client = open(target, config)?;
    handshake(&client, target)?;
    Ok(client)
}

/// Run the handshake on a client from [`open`], bounded by `--timeout`.
pub fn handshake(client: &Client, target: &TargetArgs) -> CliResult<()> {
    let timeout = parse_duration(&target.timeout)?;
    client
        .start(timeout)
        .map_err(|err| client_error("handshake failed", err))?;
    debug!(target = %target.target, "handshake complete");
    Ok(())
}

/// Open the target without running the handshake.
pub fn open(target: &TargetArgs, config: ClientConfig) -> CliResult<Client> {
    let timeout = parse_duration(&target.timeout)?;
    let config = ClientConfig {
        wake_on_start: target.wake,
        baud_rate: target.baud,
        connect_timeout: timeout,
        ..config
    };
    if target.serial {
        radiolink_client::open_serial(&target.target, &config)
            .map_err(|err| client_error("open failed", err))
    } else {
        radiolink_client::connect_tcp(&target.target, &config)
            .map_err(|err| client_error("connect failed", err))
    }
}

/// Parse "5s", "500ms" or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "timeout must not be empty"));
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
        .map_err(|_| CliError::new(USAGE, format!("invalid timeout value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "timeout must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
