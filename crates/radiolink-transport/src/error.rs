/// Errors that can occur in radio transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to connect to a network radio.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to open a serial device.
    #[cfg(feature = "serial")]
    #[error("failed to open serial port {path}: {source}")]
    OpenSerial {
        path: String,
        source: serialport::Error,
    },

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The address could not be resolved to any socket address.
    #[error("address {0} did not resolve")]
    Unresolved(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
