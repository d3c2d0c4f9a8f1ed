//! Result type alias shared across the workspace.
//!
//! This module defines a convenient alias that defaults the error type to the
//! common `SessionError`, so functions can simply return `Result<T>`.
use crate::error::SessionError;

/// Workspace-wide `Result` alias with `SessionError` as the default error.
pub type Result<T, E = SessionError> = std::result::Result<T, E>;
