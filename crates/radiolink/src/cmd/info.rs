use radiolink_client::ClientConfig;

use crate::cmd::{connect, InfoArgs};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_session, OutputFormat, SessionOutput};

pub fn run(args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let config = ClientConfig {
        error_on_no_handler: false,
        ..ClientConfig::default()
    };
    let client = connect(&args.target, config)?;

    let snapshot = client.session().snapshot();
    print_session(&SessionOutput::new(client.transport(), &snapshot), format);

    client
        .shutdown()
        .map_err(|err| client_error("shutdown failed", err))?;
    Ok(SUCCESS)
}
