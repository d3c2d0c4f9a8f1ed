//! Payload type discriminants of the Open API messages this client exchanges.

/// ProtoOAApplicationAuthReq.
pub const APPLICATION_AUTH_REQ: u32 = 2100;
/// ProtoOAApplicationAuthRes.
pub const APPLICATION_AUTH_RES: u32 = 2101;
/// ProtoOAAccountAuthReq.
pub const ACCOUNT_AUTH_REQ: u32 = 2102;
/// ProtoOAAccountAuthRes.
pub const ACCOUNT_AUTH_RES: u32 = 2103;
/// ProtoOASymbolsListReq.
pub const SYMBOLS_LIST_REQ: u32 = 2114;
/// ProtoOASymbolsListRes.
pub const SYMBOLS_LIST_RES: u32 = 2115;
/// ProtoOASubscribeSpotsReq.
pub const SUBSCRIBE_SPOTS_REQ: u32 = 2127;
/// ProtoOASubscribeSpotsRes.
pub const SUBSCRIBE_SPOTS_RES: u32 = 2128;
/// ProtoOASpotEvent.
pub const SPOT_EVENT: u32 = 2131;
/// ProtoOAErrorRes.
pub const ERROR_RES: u32 = 2142;
/// ProtoOAGetAccountListByAccessTokenReq.
pub const GET_ACCOUNTS_BY_TOKEN_REQ: u32 = 2149;
/// ProtoOAGetAccountListByAccessTokenRes.
pub const GET_ACCOUNTS_BY_TOKEN_RES: u32 = 2150;
