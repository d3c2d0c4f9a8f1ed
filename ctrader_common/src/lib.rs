//!
//! Common types and protocol plumbing for the cTrader Open API spot client.
//!
//! This crate aggregates:
//! - `error`: unified error type `SessionError` used across the workspace.
//! - `result`: handy `Result<T, SessionError>` alias.
//! - `codec`: JSON envelope encoding/decoding and alias-normalizing payload views.
//! - `requests`: the five outbound request payloads and their builders.
//! - `symbols`: instrument-name to symbol-id resolution.
//! - `model`: canonical account, symbol and quote records.
//! - `phase`: the ordered handshake phases.
//! - `payload_type`: message discriminants.
//! - `net`: environments and gateway endpoints.
#![warn(missing_docs)]
pub mod codec;
pub mod error;
pub mod model;
pub mod net;
pub mod payload_type;
pub mod phase;
pub mod requests;
pub mod result;
pub mod symbols;

pub use codec::Envelope;
pub use error::{NoAccountsHint, SessionError};
pub use phase::Phase;
pub use result::Result;
