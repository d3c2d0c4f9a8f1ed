//! cTrader spot client. Connects to the Open API JSON gateway, authenticates
//! the application and the first account reachable with the access token,
//! resolves an instrument name to its symbol id, subscribes to its spot prices
//! and logs every quote until the connection closes.
//!
//! Usage example (CLI):
//! ```bash
//! CTRADER_CLIENT_ID=... CTRADER_CLIENT_SECRET=... CTRADER_ACCESS_TOKEN=... \
//!     ctrader_client --env demo --symbol XAUUSD
//! ```
//!
//! Credentials may also live in a `.env` file in the working directory.
//! Set `RUST_LOG=debug` to see payload keys and ignored messages.
#![warn(missing_docs)]
mod args;
mod config;
mod dispatcher;
mod report;
mod session;
#[cfg(test)]
mod testing;
mod token;
mod transport;

use crate::args::Args;
use crate::config::SessionConfig;
use crate::report::{LogReporter, Reporter, SessionEvent};
use crate::session::Session;
use crate::transport::{Transport, WsTransport};
use clap::Parser;
use ctrader_common::Result;
use log::{debug, error, info, warn};
use std::process::ExitCode;

/// Connects, runs one session to completion and closes the connection.
fn run(config: SessionConfig, inspect_token: bool) -> Result<()> {
    let endpoint = config.environment.endpoint();
    let mut reporter = LogReporter::new(&config.symbol);
    reporter.report(SessionEvent::Connecting {
        endpoint: endpoint.clone(),
        environment: config.environment,
    });

    let transport = WsTransport::connect(&endpoint)?;
    if inspect_token {
        token::log_inspection(&token::inspect(&config.access_token));
    }

    let mut session = Session::new(config, transport, reporter);
    let outcome = session.run();
    debug!(
        "Session ended while {} (account {:?}, symbol {:?})",
        session.phase(),
        session.account_id(),
        session.symbol_id()
    );
    let (mut transport, _) = session.into_parts();
    if let Err(e) = transport.close() {
        debug!("Closing connection failed: {}", e);
    }
    outcome
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_logger();
    let args = Args::parse();

    let config = match SessionConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    debug!("Configuration: {:?}", config);

    if let Err(e) = ctrlc::set_handler(|| {
        info!("Disconnected.");
        std::process::exit(0);
    }) {
        warn!("Failed to install Ctrl+C handler: {}", e);
    }

    match run(config, !args.no_token_inspection) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report::report_failure(&e);
            ExitCode::FAILURE
        }
    }
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
