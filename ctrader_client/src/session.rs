//! Session establishment: the ordered handshake that takes a fresh connection
//! to an authenticated spot subscription.
//!
//! Each phase sends at most one request and blocks on exactly one response,
//! except `AccountsReceived` and `SymbolsReceived`, which only read the
//! response already in hand:
//!
//! 1. application auth (2100 → 2101)
//! 2. accounts by access token (2149 → 2150), first account is used
//! 3. account auth (2102 → 2103)
//! 4. symbols list (2114 → 2115, or 2142 on failure), target resolved by name
//! 5. subscribe to spots (2127), then streaming is handed to the dispatcher
//!
//! Any mismatch aborts the session. There is no retry and no partial resume.
use ctrader_common::codec::{self, Envelope};
use ctrader_common::payload_type::{
    ACCOUNT_AUTH_RES, APPLICATION_AUTH_RES, ERROR_RES, GET_ACCOUNTS_BY_TOKEN_RES, SYMBOLS_LIST_RES,
};
use ctrader_common::requests::{
    OutboundRequest, account_auth_req, application_auth_req, get_accounts_by_token_req,
    subscribe_spots_req, symbols_list_req,
};
use ctrader_common::symbols::{self, ResolvedSymbol};
use ctrader_common::{Phase, Result, SessionError};
use log::debug;

use crate::config::SessionConfig;
use crate::dispatcher::{EventDispatcher, Subscription};
use crate::report::{Reporter, SessionEvent};
use crate::transport::Transport;

/// One connection attempt, from the first request to the end of the stream.
pub struct Session<T: Transport, R: Reporter> {
    config: SessionConfig,
    transport: T,
    reporter: R,
    phase: Phase,
    account_id: Option<i64>,
    symbol_id: Option<i64>,
}

impl<T: Transport, R: Reporter> Session<T, R> {
    /// Creates a session over an already open transport.
    pub fn new(config: SessionConfig, transport: T, reporter: R) -> Self {
        Self {
            config,
            transport,
            reporter,
            phase: Phase::Disconnected,
            account_id: None,
            symbol_id: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Account selected for the session, once resolved.
    pub fn account_id(&self) -> Option<i64> {
        self.account_id
    }

    /// Symbol subscribed to, once resolved.
    pub fn symbol_id(&self) -> Option<i64> {
        self.symbol_id
    }

    /// Releases the transport and the reporter.
    pub fn into_parts(self) -> (T, R) {
        (self.transport, self.reporter)
    }

    /// Runs the handshake and then streams events until the connection closes.
    ///
    /// Closure while streaming is a normal end and returns `Ok(())`.
    pub fn run(&mut self) -> Result<()> {
        let subscription = self.handshake()?;
        EventDispatcher::new(subscription).run(&mut self.transport, &mut self.reporter)?;
        self.reporter.report(SessionEvent::ConnectionClosed);
        Ok(())
    }

    /// Drives every handshake phase in order and returns the live subscription.
    pub fn handshake(&mut self) -> Result<Subscription> {
        self.authorize_application()?;
        let accounts = self.request_accounts()?;
        let account_id = self.select_account(&accounts)?;
        self.authorize_account(account_id)?;
        let symbols = self.request_symbols(account_id)?;
        let symbol = self.select_symbol(&symbols)?;
        self.subscribe(account_id, &symbol)?;
        self.enter(Phase::Streaming);
        Ok(Subscription { account_id, symbol })
    }

    fn authorize_application(&mut self) -> Result<()> {
        self.enter(Phase::ApplicationAuthSent);
        let request = application_auth_req(&self.config.client_id, &self.config.client_secret);
        let response = self.exchange(&request)?;
        self.expect(&response, APPLICATION_AUTH_RES)?;
        self.reporter.report(SessionEvent::ApplicationAuthorized);
        Ok(())
    }

    fn request_accounts(&mut self) -> Result<Envelope> {
        self.enter(Phase::AccountsRequested);
        let request = get_accounts_by_token_req(&self.config.access_token);
        let response = self.exchange(&request)?;
        self.expect(&response, GET_ACCOUNTS_BY_TOKEN_RES)?;
        Ok(response)
    }

    fn select_account(&mut self, response: &Envelope) -> Result<i64> {
        self.enter(Phase::AccountsReceived);
        let accounts = response.accounts()?;
        let payload_keys = response.payload_keys();
        self.reporter.report(SessionEvent::AccountsReceived {
            count: accounts.len(),
            payload_keys: payload_keys.clone(),
        });

        let Some(first) = accounts.first() else {
            return Err(SessionError::NoAccountsForToken { payload_keys });
        };
        let Some(account_id) = first.account_id else {
            return Err(SessionError::MissingAccountId(serde_json::to_string(first)?));
        };
        self.account_id = Some(account_id);
        self.reporter.report(SessionEvent::AccountSelected { account_id });
        Ok(account_id)
    }

    fn authorize_account(&mut self, account_id: i64) -> Result<()> {
        self.enter(Phase::AccountAuthSent);
        let request = account_auth_req(account_id, &self.config.access_token);
        let response = self.exchange(&request)?;
        self.expect(&response, ACCOUNT_AUTH_RES)?;
        self.reporter.report(SessionEvent::AccountAuthorized);
        Ok(())
    }

    fn request_symbols(&mut self, account_id: i64) -> Result<Envelope> {
        self.enter(Phase::SymbolsRequested);
        let request = symbols_list_req(account_id, self.config.include_archived);
        let response = self.exchange(&request)?;
        if response.payload_type == ERROR_RES {
            return Err(SessionError::RemoteError {
                phase: self.phase,
                payload: response.payload,
            });
        }
        self.expect(&response, SYMBOLS_LIST_RES)?;
        Ok(response)
    }

    fn select_symbol(&mut self, response: &Envelope) -> Result<ResolvedSymbol> {
        self.enter(Phase::SymbolsReceived);
        let listed = response.symbols()?;
        self.reporter.report(SessionEvent::SymbolsReceived {
            count: listed.len(),
            payload_keys: response.payload_keys(),
        });
        if listed.is_empty() {
            return Err(SessionError::NoSymbols(response.payload_json()));
        }

        let symbol = symbols::resolve(&listed, &self.config.symbol)?;
        self.symbol_id = Some(symbol.symbol_id);
        self.reporter.report(SessionEvent::SymbolResolved {
            name: symbol.name.clone(),
            symbol_id: symbol.symbol_id,
        });
        Ok(symbol)
    }

    fn subscribe(&mut self, account_id: i64, symbol: &ResolvedSymbol) -> Result<()> {
        self.enter(Phase::SubscribeSent);
        self.send(&subscribe_spots_req(account_id, symbol.symbol_id))?;
        self.reporter.report(SessionEvent::SubscribeSent {
            symbol_id: symbol.symbol_id,
        });
        Ok(())
    }

    /// Moves to `phase`, which must directly follow the current one.
    fn enter(&mut self, phase: Phase) {
        debug_assert_eq!(self.phase.next(), phase, "phases must be visited in order");
        debug!("Session phase: {} -> {}", self.phase, phase);
        self.phase = phase;
    }

    fn send<Q: OutboundRequest>(&mut self, request: &Q) -> Result<()> {
        let text = codec::encode_request(request, None)?;
        self.transport.send(&text)
    }

    /// Sends `request` and blocks on the single response to it.
    fn exchange<Q: OutboundRequest>(&mut self, request: &Q) -> Result<Envelope> {
        self.send(request)?;
        match self.transport.receive()? {
            Some(text) => codec::decode(&text),
            None => Err(SessionError::ConnectionClosed),
        }
    }

    fn expect(&self, response: &Envelope, expected: u32) -> Result<()> {
        if response.payload_type == expected {
            return Ok(());
        }
        Err(SessionError::UnexpectedResponse {
            phase: self.phase,
            expected,
            received: response.payload_type,
            payload: response.payload_json(),
        })
    }
}
