//! Outbound request payloads.
//!
//! Each request is a plain serializable struct tied to its payload type via
//! [`OutboundRequest`]. The builder functions take only the identifying values
//! and never validate them: bad credentials are reported by the counterpart.
use serde::Serialize;

use crate::payload_type::{
    ACCOUNT_AUTH_REQ, APPLICATION_AUTH_REQ, GET_ACCOUNTS_BY_TOKEN_REQ, SUBSCRIBE_SPOTS_REQ,
    SYMBOLS_LIST_REQ,
};

/// A request payload with a fixed payload type.
pub trait OutboundRequest: Serialize {
    /// Discriminant sent in the envelope's `payloadType`.
    const PAYLOAD_TYPE: u32;
}

/// Application auth request (2100).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationAuthReq {
    /// OAuth application client id.
    pub client_id: String,
    /// OAuth application client secret.
    pub client_secret: String,
}

impl OutboundRequest for ApplicationAuthReq {
    const PAYLOAD_TYPE: u32 = APPLICATION_AUTH_REQ;
}

/// Accounts-by-access-token request (2149).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAccountsByTokenReq {
    /// OAuth access token.
    pub access_token: String,
}

impl OutboundRequest for GetAccountsByTokenReq {
    const PAYLOAD_TYPE: u32 = GET_ACCOUNTS_BY_TOKEN_REQ;
}

/// Account auth request (2102).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountAuthReq {
    /// Trading account id.
    pub ctid_trader_account_id: i64,
    /// OAuth access token.
    pub access_token: String,
}

impl OutboundRequest for AccountAuthReq {
    const PAYLOAD_TYPE: u32 = ACCOUNT_AUTH_REQ;
}

/// Symbols list request (2114).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolsListReq {
    /// Trading account id.
    pub ctid_trader_account_id: i64,
    /// Whether archived symbols are listed too.
    pub include_archived_symbols: bool,
}

impl OutboundRequest for SymbolsListReq {
    const PAYLOAD_TYPE: u32 = SYMBOLS_LIST_REQ;
}

/// Subscribe-to-spots request (2127).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeSpotsReq {
    /// Trading account id.
    pub ctid_trader_account_id: i64,
    /// Platform symbol id to stream.
    pub symbol_id: i64,
}

impl OutboundRequest for SubscribeSpotsReq {
    const PAYLOAD_TYPE: u32 = SUBSCRIBE_SPOTS_REQ;
}

/// Creates an application auth request.
pub fn application_auth_req(client_id: &str, client_secret: &str) -> ApplicationAuthReq {
    ApplicationAuthReq {
        client_id: String::from(client_id),
        client_secret: String::from(client_secret),
    }
}

/// Creates an accounts-by-token request.
pub fn get_accounts_by_token_req(access_token: &str) -> GetAccountsByTokenReq {
    GetAccountsByTokenReq {
        access_token: String::from(access_token),
    }
}

/// Creates an account auth request.
pub fn account_auth_req(account_id: i64, access_token: &str) -> AccountAuthReq {
    AccountAuthReq {
        ctid_trader_account_id: account_id,
        access_token: String::from(access_token),
    }
}

/// Creates a symbols list request.
pub fn symbols_list_req(account_id: i64, include_archived: bool) -> SymbolsListReq {
    SymbolsListReq {
        ctid_trader_account_id: account_id,
        include_archived_symbols: include_archived,
    }
}

/// Creates a subscribe-to-spots request.
pub fn subscribe_spots_req(account_id: i64, symbol_id: i64) -> SubscribeSpotsReq {
    SubscribeSpotsReq {
        ctid_trader_account_id: account_id,
        symbol_id,
    }
}
