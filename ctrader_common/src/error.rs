//! Error types shared by the codec, the handshake and the streaming loop.
//!
//! The `SessionError` enum unifies protocol failures (wrong response types,
//! remote errors, missing accounts or symbols), transport failures and
//! (de)serialization errors so that every step can propagate a single error
//! type with `?`.
use std::fmt;
use std::io;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::phase::Phase;

/// Unified error type for a client session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Inbound text is not a valid envelope (not JSON, not an object, or no discriminant).
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// The counterpart answered a handshake request with the wrong payload type.
    #[error("Unexpected response while {phase}: expected payload type {expected}, got {received}: {payload}")]
    UnexpectedResponse {
        /// Phase the session was in when the response arrived.
        phase: Phase,
        /// Payload type the phase waits for.
        expected: u32,
        /// Payload type actually received.
        received: u32,
        /// Received payload, rendered as JSON.
        payload: String,
    },

    /// The counterpart returned an explicit error response (2142) during the handshake.
    #[error("Remote error while {phase}: {}", render_payload(.payload))]
    RemoteError {
        /// Phase the session was in when the error arrived.
        phase: Phase,
        /// Error payload, verbatim.
        payload: Map<String, Value>,
    },

    /// The accounts lookup returned no account for the access token.
    #[error("No accounts returned for provided access token (payload keys: {payload_keys:?})")]
    NoAccountsForToken {
        /// Keys present in the accounts response payload.
        payload_keys: Vec<String>,
    },

    /// The first account entry has no id under any accepted field name.
    #[error("Unable to extract account ID from accounts payload: {0}")]
    MissingAccountId(String),

    /// The symbols list response carried no symbols.
    #[error("No symbols returned for account. Raw symbols payload: {0}")]
    NoSymbols(String),

    /// The target symbol is not in the symbols list.
    #[error("Symbol '{0}' not found in symbols list")]
    SymbolNotFound(String),

    /// The target symbol is listed but has no usable `symbolId`.
    #[error("Found symbol '{name}' but missing symbolId: {descriptor}")]
    SymbolMissingId {
        /// Target name that matched.
        name: String,
        /// Matching descriptor, rendered for diagnosis.
        descriptor: String,
    },

    /// The transport closed before the handshake completed.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Failure reported by the transport (connect, send or receive).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Missing or invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error originating from the standard library or sockets.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

fn render_payload(payload: &Map<String, Value>) -> String {
    serde_json::to_string(payload).unwrap_or_else(|_| format!("{payload:?}"))
}

impl SessionError {
    /// Remediation hints for the operator, if this error has any.
    pub fn hints(&self) -> &'static [NoAccountsHint] {
        match self {
            SessionError::NoAccountsForToken { .. } => NoAccountsHint::ALL,
            _ => &[],
        }
    }
}

/// Likely causes of an empty accounts list for an otherwise valid token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoAccountsHint {
    /// Demo and live tokens are separate; the token does not match the selected environment.
    EnvironmentMismatch,
    /// The OAuth grant lacks the `accounts` or `trading` scope.
    ScopeMismatch,
    /// The token belongs to a different cTID than the one owning the account.
    OwnershipMismatch,
    /// The broker does not enable Open API access.
    BrokerSupport,
}

impl NoAccountsHint {
    /// Every hint, in the order they should be presented.
    pub const ALL: &'static [NoAccountsHint] = &[
        NoAccountsHint::EnvironmentMismatch,
        NoAccountsHint::ScopeMismatch,
        NoAccountsHint::OwnershipMismatch,
        NoAccountsHint::BrokerSupport,
    ];
}

impl fmt::Display for NoAccountsHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            NoAccountsHint::EnvironmentMismatch => {
                "Ensure CTRADER_ENV matches your token (demo vs live are separate); demo tokens won't work on live"
            }
            NoAccountsHint::ScopeMismatch => {
                "Confirm your OAuth scopes include 'accounts' or 'trading'"
            }
            NoAccountsHint::OwnershipMismatch => {
                "Verify the token belongs to the cTID owning the target account"
            }
            NoAccountsHint::BrokerSupport => {
                "Some brokers may restrict Open API; confirm your broker enables it"
            }
        };
        f.write_str(text)
    }
}
