use radiolink_transport::tcp;
#[cfg(feature = "serial")]
use radiolink_transport::{serial, SerialSettings};
use tracing::info;

use crate::client::Client;
use crate::config::ClientConfig;
use crate::error::Result;

/// Connect to a radio's TCP API. The port defaults to 4403 when `addr` has none.
///
/// Does not run the handshake; call [`Client::start`].
pub fn connect_tcp(addr: &str, config: &ClientConfig) -> Result<Client> {
    let addr = tcp::with_default_port(addr);
    let stream = tcp::connect(&addr, Some(config.connect_timeout))?;
    info!(addr = %addr, "connected to radio");
    Client::new(stream, config.clone())
}

/// Open a radio on a serial device.
///
/// The frame read timeout becomes the port timeout, which bounds how long
/// `shutdown` waits for the decode loop.
#[cfg(feature = "serial")]
pub fn open_serial(path: &str, config: &ClientConfig) -> Result<Client> {
    let defaults = SerialSettings::default();
    let settings = SerialSettings {
        baud_rate: config.baud_rate,
        read_timeout: config.frame.read_timeout.unwrap_or(defaults.read_timeout),
    };
    let stream = serial::open(path, &settings)?;
    info!(path, baud = settings.baud_rate, "opened radio serial port");
    Client::new(stream, config.clone())
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    use prost::Message;
    use radiolink_frame::{FrameReader, FrameWriter};
    use radiolink_proto::{from_radio, to_radio, FromRadio, ToRadio};

    use super::*;
    use crate::client::ClientState;
    use crate::error::ClientError;

    #[test]
    fn tcp_handshake_end_to_end() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let radio = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = FrameReader::new(stream.try_clone().unwrap());
            let mut writer = FrameWriter::new(stream);

            let body = reader.read_frame().unwrap();
            let Some(to_radio::PayloadVariant::WantConfigId(id)) =
                ToRadio::decode(body.as_ref()).unwrap().payload_variant
            else {
                panic!("expected config request");
            };
            let done = FromRadio {
                id: 1,
                payload_variant: Some(from_radio::PayloadVariant::ConfigCompleteId(id)),
            };
            writer.send(&done.encode_to_vec()).unwrap();
            // Hold the connection open until the client hangs up.
            let _ = reader.read_frame();
        });

        let client = connect_tcp(&addr.to_string(), &ClientConfig::default()).unwrap();
        client.start(Duration::from_secs(5)).unwrap();
        assert_eq!(client.state(), ClientState::Complete);

        client.shutdown().unwrap();
        radio.join().unwrap();
    }

    #[test]
    fn tcp_connect_failure_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = connect_tcp(&addr.to_string(), &ClientConfig::default()).unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[cfg(feature = "serial")]
    #[test]
    fn missing_serial_device_is_transport_error() {
        let err = open_serial("/dev/radiolink-does-not-exist", &ClientConfig::default())
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[cfg(feature = "serial")]
    #[test]
    fn serial_client_can_cross_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<radiolink_transport::RadioStream>();
        assert_send_sync::<Client>();
    }
}
