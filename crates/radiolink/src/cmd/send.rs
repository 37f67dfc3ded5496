use radiolink_client::ClientConfig;
use radiolink_proto::BROADCAST_ADDR;
use serde::Serialize;

use crate::cmd::{connect, SendArgs};
use crate::exit::{client_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{node_label, OutputFormat};

#[derive(Serialize)]
struct SendOutput<'a> {
    to: String,
    channel: u32,
    bytes: usize,
    text: &'a str,
}

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let to = match &args.to {
        Some(raw) => parse_node(raw)?,
        None => BROADCAST_ADDR,
    };

    let config = ClientConfig {
        error_on_no_handler: false,
        ..ClientConfig::default()
    };
    let client = connect(&args.target, config)?;
    client
        .send_text(to, args.channel, &args.text)
        .map_err(|err| client_error("send failed", err))?;

    let out = SendOutput {
        to: node_label(Some(to)),
        channel: args.channel,
        bytes: args.text.len(),
        text: &args.text,
    };
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Raw => {}
        OutputFormat::Table | OutputFormat::Pretty => println!(
            "sent {} bytes to {} on channel {}",
            out.bytes, out.to, out.channel
        ),
    }

    client
        .shutdown()
        .map_err(|err| client_error("shutdown failed", err))?;
    Ok(SUCCESS)
}

/// Parse a node number: decimal, `0x`-prefixed hex or `!`-prefixed hex.
fn parse_node(input: &str) -> CliResult<u32> {
    let input = input.trim();
    let parsed = if let Some(hex) = input.strip_prefix('!') {
        u32::from_str_radix(hex, 16)
    } else if let Some(hex) = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        u32::from_str_radix(hex, 16)
    } else {
        input.parse()
    };
    parsed.map_err(|_| CliError::new(USAGE, format!("invalid node number: {input}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_node_forms() {
        assert_eq!(parse_node("42").unwrap(), 42);
        assert_eq!(parse_node("0x2a").unwrap(), 42);
        assert_eq!(parse_node("!deadbeef").unwrap(), 0xDEAD_BEEF);
    }

    #[test]
    fn parse_node_rejects_garbage() {
        assert_eq!(parse_node("!xyz").unwrap_err().code, USAGE);
        assert!(parse_node("").is_err());
        assert!(parse_node("4294967296").is_err());
    }
}
