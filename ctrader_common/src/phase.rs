//! Handshake phases of a session, in the only order they may be visited.

use strum_macros::Display;

/// Current phase of a session.
///
/// Phases are strictly linear: every phase is a precondition for the next and
/// a session only ever moves to [`Phase::next`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
pub enum Phase {
    /// Nothing sent yet.
    #[default]
    #[strum(to_string = "disconnected")]
    Disconnected,
    /// Application auth request (2100) sent, waiting for 2101.
    #[strum(to_string = "authorizing application")]
    ApplicationAuthSent,
    /// Accounts-by-token request (2149) sent, waiting for 2150.
    #[strum(to_string = "requesting accounts")]
    AccountsRequested,
    /// Accounts response received, selecting the account.
    #[strum(to_string = "selecting account")]
    AccountsReceived,
    /// Account auth request (2102) sent, waiting for 2103.
    #[strum(to_string = "authorizing account")]
    AccountAuthSent,
    /// Symbols list request (2114) sent, waiting for 2115.
    #[strum(to_string = "requesting symbols")]
    SymbolsRequested,
    /// Symbols list received, resolving the target symbol.
    #[strum(to_string = "resolving symbol")]
    SymbolsReceived,
    /// Subscribe request (2127) sent.
    #[strum(to_string = "subscribing")]
    SubscribeSent,
    /// Handshake complete; inbound events are dispatched.
    #[strum(to_string = "streaming")]
    Streaming,
}

impl Phase {
    /// The phase that follows this one. `Streaming` is terminal.
    pub fn next(self) -> Phase {
        match self {
            Phase::Disconnected => Phase::ApplicationAuthSent,
            Phase::ApplicationAuthSent => Phase::AccountsRequested,
            Phase::AccountsRequested => Phase::AccountsReceived,
            Phase::AccountsReceived => Phase::AccountAuthSent,
            Phase::AccountAuthSent => Phase::SymbolsRequested,
            Phase::SymbolsRequested => Phase::SymbolsReceived,
            Phase::SymbolsReceived => Phase::SubscribeSent,
            Phase::SubscribeSent | Phase::Streaming => Phase::Streaming,
        }
    }
}
