//! Access token introspection.
//!
//! A diagnostic aid for "no accounts" style failures: when the access token is
//! a JWT, its header and a safe subset of its claims are logged so the operator
//! can check environment, scope and ownership. The token itself is never
//! logged, and nothing here affects the protocol.
use std::string::FromUtf8Error;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use log::info;
use serde_json::{Map, Value};
use thiserror::Error;

/// Claims worth showing; anything else in the token stays hidden.
const SAFE_CLAIMS: &[&str] = &[
    "aud", "iss", "scope", "ctid", "exp", "iat", "env", "brokerId", "accountIds",
];

/// Failures while decoding a JWT-shaped token.
#[derive(Error, Debug)]
pub enum TokenError {
    /// A segment is not valid base64url.
    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A segment does not decode to UTF-8 text.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] FromUtf8Error),

    /// A segment is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The claims segment is JSON but not an object.
    #[error("claims are not a JSON object")]
    ClaimsNotObject,
}

/// Outcome of inspecting an access token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenInspection {
    /// The token is a JWT.
    Jwt {
        /// Decoded header.
        header: Value,
        /// Safe subset of the claims.
        claims: Map<String, Value>,
    },
    /// The token is not a JWT.
    Opaque,
    /// The token looks like a JWT but could not be decoded.
    Failed(String),
}

/// Inspects `token` without validating it.
pub fn inspect(token: &str) -> TokenInspection {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return TokenInspection::Opaque;
    }
    match decode_jwt(parts[0], parts[1]) {
        Ok((header, claims)) => TokenInspection::Jwt { header, claims },
        Err(e) => TokenInspection::Failed(e.to_string()),
    }
}

/// Logs the inspection result.
pub fn log_inspection(inspection: &TokenInspection) {
    match inspection {
        TokenInspection::Jwt { header, claims } => {
            info!("Access token looks like JWT. Decoded claims:");
            info!("- header: {}", header);
            info!("- payload: {}", Value::Object(claims.clone()));
            for key in ["exp", "iat"] {
                let at = claims
                    .get(key)
                    .and_then(Value::as_i64)
                    .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
                if let Some(at) = at {
                    info!("- {}: {}", key, at.to_rfc3339());
                }
            }
        }
        TokenInspection::Opaque => {
            info!("Access token does not look like JWT; limited introspection available.")
        }
        TokenInspection::Failed(reason) => info!("Token inspection failed: {}", reason),
    }
}

fn decode_jwt(header: &str, claims: &str) -> Result<(Value, Map<String, Value>), TokenError> {
    let header: Value = serde_json::from_str(&segment_text(header)?)?;
    let claims = match serde_json::from_str::<Value>(&segment_text(claims)?)? {
        Value::Object(all) => all,
        _ => return Err(TokenError::ClaimsNotObject),
    };
    let safe = SAFE_CLAIMS
        .iter()
        .filter_map(|key| claims.get(*key).map(|v| (key.to_string(), v.clone())))
        .collect();
    Ok((header, safe))
}

/// Decodes one base64url segment, with or without padding.
fn segment_text(segment: &str) -> Result<String, TokenError> {
    let bytes = URL_SAFE_NO_PAD.decode(segment.trim_end_matches('='))?;
    Ok(String::from_utf8(bytes)?)
}
