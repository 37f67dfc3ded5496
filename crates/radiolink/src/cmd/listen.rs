use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use radiolink_client::{ClientConfig, Event};
use tracing::info;

use crate::cmd::{handshake, open, ListenArgs};
use crate::exit::{client_error, CliError, CliResult, SUCCESS};
use crate::output::{print_event, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let config = ClientConfig {
        error_on_no_handler: false,
        ..ClientConfig::default()
    };
    let client = open(&args.target, config)?;

    // Handlers go in before the handshake so nothing sent right after the
    // configuration completes is missed.
    let (tx, rx) = mpsc::channel::<Event>();
    match &args.kinds {
        Some(kinds) => {
            for &kind in kinds {
                let tx = tx.clone();
                client.subscribe(kind, move |event: &Event| {
                    let _ = tx.send(event.clone());
                });
            }
        }
        None => {
            let tx = tx.clone();
            client.subscribe_all(move |event: &Event| {
                let _ = tx.send(event.clone());
            });
        }
    }
    drop(tx);

    handshake(&client, &args.target)?;
    info!(transport = client.transport(), "listening");

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        let event = match rx.recv_timeout(POLL_INTERVAL) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        print_event(&event, format);
        printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if printed >= count {
                break;
            }
        }
    }

    client
        .shutdown()
        .map_err(|err| client_error("shutdown failed", err))?;
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
