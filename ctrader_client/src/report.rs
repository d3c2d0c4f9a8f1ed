//! Structured session events and their log rendering.
//!
//! The session and the dispatcher never format text themselves: they emit
//! [`SessionEvent`] values to a [`Reporter`]. [`LogReporter`] turns them into
//! log lines.
use chrono::{DateTime, Utc};
use ctrader_common::codec;
use ctrader_common::model::QuoteEvent;
use ctrader_common::net::{Environment, JSON_PORT};
use ctrader_common::SessionError;
use log::{debug, error, info, warn};
use serde_json::{Map, Value};

/// Authentication guide linked from remediation tips.
pub const AUTH_GUIDE_URL: &str = "https://help.ctrader.com/open-api/account-authentication/";
/// Endpoint reference linked from remediation tips.
pub const ENDPOINTS_URL: &str = "https://help.ctrader.com/open-api/proxies-endpoints/";

/// Something that happened during a session and is worth telling the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// About to open the connection.
    Connecting {
        /// Gateway URL.
        endpoint: String,
        /// Selected environment.
        environment: Environment,
    },
    /// Application auth accepted.
    ApplicationAuthorized,
    /// Accounts lookup answered.
    AccountsReceived {
        /// Number of accounts listed.
        count: usize,
        /// Keys present in the response payload.
        payload_keys: Vec<String>,
    },
    /// Account chosen for the rest of the session.
    AccountSelected {
        /// Trading account id.
        account_id: i64,
    },
    /// Account auth accepted.
    AccountAuthorized,
    /// Symbols list answered.
    SymbolsReceived {
        /// Number of symbols listed.
        count: usize,
        /// Keys present in the response payload.
        payload_keys: Vec<String>,
    },
    /// Target symbol resolved.
    SymbolResolved {
        /// Canonical symbol name.
        name: String,
        /// Platform symbol id.
        symbol_id: i64,
    },
    /// Subscribe request sent; the session is now streaming.
    SubscribeSent {
        /// Platform symbol id.
        symbol_id: i64,
    },
    /// The counterpart confirmed the subscription.
    SubscriptionConfirmed {
        /// Platform symbol id.
        symbol_id: i64,
    },
    /// Spot price update.
    Quote(QuoteEvent),
    /// Error response received while streaming, verbatim.
    RemoteError(Map<String, Value>),
    /// An inbound message could not be decoded while streaming and was skipped.
    Malformed {
        /// Why decoding failed.
        reason: String,
    },
    /// The counterpart closed the connection.
    ConnectionClosed,
}

/// Receiver of session events.
pub trait Reporter {
    /// Handles one event.
    fn report(&mut self, event: SessionEvent);
}

/// Reporter writing every event to the log.
pub struct LogReporter {
    symbol: String,
}

impl LogReporter {
    /// Creates a reporter labelling quotes with `symbol` until the symbol is resolved.
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
        }
    }
}

impl Reporter for LogReporter {
    fn report(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Connecting { endpoint, environment } => {
                info!("Connecting to cTrader Open API (JSON, {}:{})...", environment, JSON_PORT);
                info!("Endpoint: {}", endpoint);
            }
            SessionEvent::ApplicationAuthorized => info!("Application auth OK."),
            SessionEvent::AccountsReceived { count, payload_keys } => {
                info!("Accounts response: count={}", count);
                debug!("Accounts payload keys={:?}", payload_keys);
            }
            SessionEvent::AccountSelected { account_id } => info!("Using account {}.", account_id),
            SessionEvent::AccountAuthorized => info!("Account auth OK."),
            SessionEvent::SymbolsReceived { count, payload_keys } => {
                info!("Symbols list received: count={}", count);
                debug!("Symbols list payload keys={:?}", payload_keys);
            }
            SessionEvent::SymbolResolved { name, symbol_id } => {
                info!("Found symbol {} with id {}.", name, symbol_id);
                self.symbol = name;
            }
            SessionEvent::SubscribeSent { symbol_id } => info!(
                "Subscribe request sent for {} (symbolId={}). Waiting for events...",
                self.symbol, symbol_id
            ),
            SessionEvent::SubscriptionConfirmed { symbol_id } => {
                info!("Subscribe confirmed for {} (symbolId={}).", self.symbol, symbol_id)
            }
            SessionEvent::Quote(quote) => info!(
                "Spot {}: bid={} ask={} ts={}",
                self.symbol,
                display_opt(quote.bid),
                display_opt(quote.ask),
                display_timestamp(quote.timestamp)
            ),
            SessionEvent::RemoteError(payload) => {
                let response = codec::error_response(&payload);
                warn!(
                    "Error event: code={} description={} payload={}",
                    display_opt(response.error_code),
                    display_opt(response.description),
                    Value::Object(payload)
                );
            }
            SessionEvent::Malformed { reason } => warn!("Skipping message: {}", reason),
            SessionEvent::ConnectionClosed => info!("Connection closed."),
        }
    }
}

/// Logs a fatal session error together with any remediation tips.
pub fn report_failure(err: &SessionError) {
    error!("{}", err);
    let hints = err.hints();
    if !hints.is_empty() {
        info!("Tips:");
        for hint in hints {
            info!("- {}.", hint);
        }
        info!("- Regenerate token via OAuth and re-test.");
        info!("  Auth guide: {}", AUTH_GUIDE_URL);
        info!("  Endpoints: {}", ENDPOINTS_URL);
    }
    if let SessionError::SymbolNotFound(_) = err {
        info!("Tip: ensure the symbol exists and is available for this account.");
    }
}

fn display_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Renders a millisecond timestamp as `<ms> (<RFC 3339 UTC>)`.
fn display_timestamp(timestamp: Option<i64>) -> String {
    match timestamp {
        Some(ms) => match DateTime::<Utc>::from_timestamp_millis(ms) {
            Some(at) => format!("{} ({})", ms, at.to_rfc3339()),
            None => ms.to_string(),
        },
        None => "-".to_string(),
    }
}
