#![cfg(all(unix, feature = "cli"))]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::Command;
use std::thread;
use std::time::Duration;

use prost::Message;
use radiolink::proto::{
    from_radio, text_message, to_radio, FromRadio, MyNodeInfo, ToRadio, BROADCAST_ADDR,
};

fn read_frame(stream: &mut TcpStream) -> Vec<u8> {
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).expect("header should arrive");
    assert_eq!(&header[..2], &[0x94, 0xC3]);
    let len = u16::from_be_bytes([header[2], header[3]]) as usize;
    let mut body = vec![0u8; len];
    stream.read_exact(&mut body).expect("body should arrive");
    body
}

fn write_frame(stream: &mut TcpStream, msg: &FromRadio) {
    let body = msg.encode_to_vec();
    let mut frame = vec![0x94, 0xC3];
    frame.extend_from_slice(&(body.len() as u16).to_be_bytes());
    frame.extend_from_slice(&body);
    stream.write_all(&frame).expect("frame should be written");
}

/// Answers one configuration request with a node record and the completion
/// marker, then sends `after` straight away.
fn spawn_fake_radio(listener: TcpListener, after: Vec<FromRadio>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("client should connect");
        let request = ToRadio::decode(read_frame(&mut stream).as_slice())
            .expect("request should decode");
        let Some(to_radio::PayloadVariant::WantConfigId(id)) = request.payload_variant else {
            panic!("expected a configuration request, got {request:?}");
        };

        write_frame(
            &mut stream,
            &FromRadio {
                id: 1,
                payload_variant: Some(from_radio::PayloadVariant::MyInfo(MyNodeInfo {
                    my_node_num: 0xA1B2_C3D4,
                    ..Default::default()
                })),
            },
        );
        write_frame(
            &mut stream,
            &FromRadio {
                id: 2,
                payload_variant: Some(from_radio::PayloadVariant::ConfigCompleteId(id)),
            },
        );
        for msg in &after {
            write_frame(&mut stream, msg);
        }

        // Hold the connection until the client hangs up.
        let mut sink = [0u8; 64];
        while matches!(stream.read(&mut sink), Ok(n) if n > 0) {}
    })
}

#[test]
fn version_prints_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_radiolink"))
        .arg("version")
        .output()
        .expect("version command should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("radiolink {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn info_reports_session_from_radio() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
    let addr = listener.local_addr().expect("local addr");
    let radio = spawn_fake_radio(listener, Vec::new());

    let output = Command::new(env!("CARGO_BIN_EXE_radiolink"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("json")
        .arg("info")
        .arg(addr.to_string())
        .arg("--timeout")
        .arg("5s")
        .output()
        .expect("info command should run");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be json");
    assert_eq!(json["transport"], "tcp");
    assert_eq!(json["complete"], true);
    assert_eq!(json["node_num"], 0xA1B2_C3D4u32);

    radio.join().expect("fake radio should finish");
}

fn text_from_radio(text: &str) -> FromRadio {
    let Some(to_radio::PayloadVariant::Packet(packet)) =
        text_message(BROADCAST_ADDR, 0, text).payload_variant
    else {
        unreachable!("text_message builds a packet");
    };
    FromRadio {
        id: 3,
        payload_variant: Some(from_radio::PayloadVariant::Packet(packet)),
    }
}

#[test]
fn listen_prints_packet_sent_right_after_handshake() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
    let addr = listener.local_addr().expect("local addr");
    let radio = spawn_fake_radio(listener, vec![text_from_radio("first words")]);

    let output = Command::new(env!("CARGO_BIN_EXE_radiolink"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("json")
        .arg("listen")
        .arg(addr.to_string())
        .arg("--count")
        .arg("1")
        .arg("--timeout")
        .arg("5s")
        .output()
        .expect("listen command should run");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be one json event");
    assert_eq!(json["kind"], "packet");
    assert!(json["summary"]
        .as_str()
        .expect("summary is a string")
        .contains("first words"));

    radio.join().expect("fake radio should finish");
}

#[test]
fn info_times_out_against_silent_radio() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
    let addr = listener.local_addr().expect("local addr");
    let silent = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("client should connect");
        thread::sleep(Duration::from_millis(500));
        drop(stream);
    });

    let output = Command::new(env!("CARGO_BIN_EXE_radiolink"))
        .arg("--log-level")
        .arg("error")
        .arg("info")
        .arg(addr.to_string())
        .arg("--timeout")
        .arg("200ms")
        .output()
        .expect("info command should run");

    assert_eq!(output.status.code(), Some(124));
    assert!(String::from_utf8_lossy(&output.stderr).contains("handshake failed"));

    silent.join().expect("silent radio should finish");
}

#[test]
fn send_rejects_bad_destination() {
    let output = Command::new(env!("CARGO_BIN_EXE_radiolink"))
        .arg("send")
        .arg("127.0.0.1:9")
        .arg("--text")
        .arg("hi")
        .arg("--to")
        .arg("!nothex")
        .output()
        .expect("send command should run");

    assert_eq!(output.status.code(), Some(64));
}
