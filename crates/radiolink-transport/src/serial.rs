use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, StopBits};
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::stream::RadioStream;

/// Line speed radios use for the framed serial API.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Serial line settings.
#[derive(Debug, Clone)]
pub struct SerialSettings {
    /// Baud rate. Default: 115200.
    pub baud_rate: u32,
    /// Read timeout; a blocked reader wakes at least this often. Default: 500ms.
    pub read_timeout: Duration,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_millis(500),
        }
    }
}

/// Open a serial device at `path` as 8N1 without flow control.
pub fn open(path: &str, settings: &SerialSettings) -> Result<RadioStream> {
    let port = serialport::new(path, settings.baud_rate)
        .data_bits(DataBits::Eight)
        .stop_bits(StopBits::One)
        .parity(Parity::None)
        .flow_control(FlowControl::None)
        .timeout(settings.read_timeout)
        .open()
        .map_err(|source| TransportError::OpenSerial {
            path: path.to_string(),
            source,
        })?;

    debug!(path, baud = settings.baud_rate, "opened serial port");
    Ok(RadioStream::from_serial(port))
}
