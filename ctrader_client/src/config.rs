//! Immutable session configuration.
//!
//! Built once from the parsed arguments and handed to the session; the
//! handshake never reads the environment itself.
use std::fmt;

use ctrader_common::net::Environment;
use ctrader_common::{Result, SessionError};

use crate::args::Args;

/// Everything a session needs to authenticate and subscribe.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// OAuth application client id.
    pub client_id: String,
    /// OAuth application client secret.
    pub client_secret: String,
    /// OAuth access token.
    pub access_token: String,
    /// Instrument name to resolve and stream.
    pub symbol: String,
    /// Selected environment.
    pub environment: Environment,
    /// Whether archived symbols are requested.
    pub include_archived: bool,
}

impl SessionConfig {
    /// Validates the arguments and builds the configuration.
    pub fn from_args(args: &Args) -> Result<Self> {
        let client_id = non_empty(args.client_id.as_deref());
        let client_secret = non_empty(args.client_secret.as_deref());
        let (Some(client_id), Some(client_secret)) = (client_id, client_secret) else {
            return Err(SessionError::Config(
                "Missing credentials: set CTRADER_CLIENT_ID and CTRADER_CLIENT_SECRET env vars".to_string(),
            ));
        };
        let Some(access_token) = non_empty(args.access_token.as_deref()) else {
            return Err(SessionError::Config(format!(
                "Missing access token: set CTRADER_ACCESS_TOKEN for {} environment",
                args.environment
            )));
        };
        let Some(symbol) = non_empty(Some(&args.symbol)) else {
            return Err(SessionError::Config("Symbol name must not be empty".to_string()));
        };

        Ok(SessionConfig {
            client_id,
            client_secret,
            access_token,
            symbol,
            environment: args.environment,
            include_archived: args.include_archived,
        })
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("symbol", &self.symbol)
            .field("environment", &self.environment)
            .field("include_archived", &self.include_archived)
            .finish()
    }
}

/// Trims the value and strips matching quotes; blank values count as missing.
fn non_empty(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
        .trim();
    (!unquoted.is_empty()).then(|| unquoted.to_string())
}
