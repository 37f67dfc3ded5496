use std::time::Duration;

use radiolink_frame::FrameConfig;

use crate::dispatch::DispatchConfig;

/// Client configuration.
///
/// Struct-update syntax keeps call sites short:
///
/// ```
/// use std::time::Duration;
/// use radiolink_client::ClientConfig;
///
/// let config = ClientConfig {
///     wake_on_start: true,
///     connect_timeout: Duration::from_secs(2),
///     ..ClientConfig::default()
/// };
/// assert!(config.frame.read_timeout.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Framing options. The read timeout doubles as the decode loop's poll
    /// interval for noticing `shutdown`. Default: 250ms read timeout.
    pub frame: FrameConfig,
    /// Worker pool for post-handshake handlers.
    pub dispatch: DispatchConfig,
    /// Report messages with no registered handler as errors (logged by the
    /// decode loop). Default: true.
    pub error_on_no_handler: bool,
    /// Send the wake sequence before the configuration request. Default: false.
    pub wake_on_start: bool,
    /// Shut the connection down when `start` times out instead of leaving the
    /// decode loop running. Default: false.
    pub close_on_timeout: bool,
    /// Pause after an unexpected read error before reading again. Default: 100ms.
    pub error_backoff: Duration,
    /// TCP connect timeout. Default: 5s.
    pub connect_timeout: Duration,
    /// Serial line speed. Default: 115200.
    pub baud_rate: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig {
                read_timeout: Some(Duration::from_millis(250)),
                ..FrameConfig::default()
            },
            dispatch: DispatchConfig::default(),
            error_on_no_handler: true,
            wake_on_start: false,
            close_on_timeout: false,
            error_backoff: Duration::from_millis(100),
            connect_timeout: Duration::from_secs(5),
            baud_rate: 115_200,
        }
    }
}
