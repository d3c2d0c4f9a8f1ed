//! Canonical records extracted from inbound payloads.
//!
//! These are the values the rest of the client works with. Field-name aliases
//! seen on the wire are already folded into a single field by the codec.
use serde::Serialize;

/// One trading account reachable with the current access token.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDescriptor {
    /// Trading account id, if the entry carried one under any accepted name.
    pub account_id: Option<i64>,
    /// Whether the account is a live account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_live: Option<bool>,
    /// Broker-side login of the account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trader_login: Option<i64>,
}

/// One tradable instrument.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolDescriptor {
    /// Platform-internal id; required to subscribe.
    pub symbol_id: Option<i64>,
    /// Canonical ticker, e.g. `EURUSD`.
    pub name: Option<String>,
    /// Optional human label.
    pub display_name: Option<String>,
}

impl SymbolDescriptor {
    /// Creates a descriptor from its parts.
    pub fn new(symbol_id: Option<i64>, name: Option<&str>, display_name: Option<&str>) -> Self {
        SymbolDescriptor {
            symbol_id,
            name: name.map(String::from),
            display_name: display_name.map(String::from),
        }
    }
}

/// A spot price update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteEvent {
    /// Symbol the update belongs to.
    pub symbol_id: Option<i64>,
    /// Bid price, absent when unchanged.
    pub bid: Option<f64>,
    /// Ask price, absent when unchanged.
    pub ask: Option<f64>,
    /// Event time in milliseconds since the UNIX epoch.
    pub timestamp: Option<i64>,
}

/// Typed view over an error response (2142).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Machine-readable error code, e.g. `CH_CLIENT_AUTH_FAILURE`.
    pub error_code: Option<String>,
    /// Human-readable description.
    pub description: Option<String>,
}
