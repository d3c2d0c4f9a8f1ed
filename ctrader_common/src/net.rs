//! Endpoint selection for the Open API JSON gateway.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Port of the JSON-over-WebSocket gateway.
pub const JSON_PORT: u16 = 5036;
/// Host serving live accounts.
pub const LIVE_HOST: &str = "live.ctraderapi.com";
/// Host serving demo accounts.
pub const DEMO_HOST: &str = "demo.ctraderapi.com";

/// Trading environment a token and its accounts belong to.
///
/// Demo and live are fully separate: a demo token returns no accounts on the
/// live gateway and vice versa.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    Display,
    EnumString,
    Hash,
    Eq,
    PartialEq,
)]
#[clap(rename_all = "lower")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Environment {
    /// Demo (paper) accounts.
    Demo,
    /// Live accounts.
    #[default]
    Live,
}

impl Environment {
    /// Gateway host for this environment.
    pub fn host(&self) -> &'static str {
        match self {
            Environment::Live => LIVE_HOST,
            Environment::Demo => DEMO_HOST,
        }
    }

    /// Full WebSocket endpoint, e.g. `wss://live.ctraderapi.com:5036`.
    pub fn endpoint(&self) -> String {
        addr(self.host(), JSON_PORT)
    }
}

/// Helper to format a secure WebSocket URL like "wss://host:port".
pub fn addr(host: &str, port: u16) -> String {
    format!("wss://{}:{}", host, port)
}
