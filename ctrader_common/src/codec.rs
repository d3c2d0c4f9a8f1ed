//! JSON envelope codec.
//!
//! Every message on the wire is a JSON object with three fields:
//!
//! ```json
//! {"clientMsgId": "5f0c...", "payloadType": 2100, "payload": {"clientId": "...", "clientSecret": "..."}}
//! ```
//!
//! [`decode`] only checks that the text is an object with a numeric
//! `payloadType`; the payload is kept as an open mapping. The typed views on
//! [`Envelope`] (`accounts`, `symbols`, `spot`) and [`error_response`] read the
//! payload through records that list every alias the gateway is known to use,
//! and fold the aliases into one canonical field. A field of an unexpected type
//! reads as absent. No other module looks at payload field names.
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::SessionError;
use crate::model::{AccountDescriptor, ErrorResponse, QuoteEvent, SymbolDescriptor};
use crate::requests::OutboundRequest;
use crate::result::Result;

/// The unit of wire exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Correlation id chosen by the sender. The counterpart is not required to echo it.
    ///
    /// Opaque: a non-string id on the wire is kept as its JSON text.
    #[serde(default, deserialize_with = "correlation_id", skip_serializing_if = "Option::is_none")]
    pub client_msg_id: Option<String>,
    /// Discriminant identifying the semantic kind of the message.
    pub payload_type: u32,
    /// Open payload mapping; its shape depends on `payload_type`.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub payload: Map<String, Value>,
}

impl Envelope {
    /// Creates an envelope with a fresh correlation id.
    pub fn new(payload_type: u32, payload: Map<String, Value>) -> Self {
        Envelope {
            client_msg_id: Some(new_client_msg_id()),
            payload_type,
            payload,
        }
    }

    /// Keys present in the payload, in wire order.
    pub fn payload_keys(&self) -> Vec<String> {
        self.payload.keys().cloned().collect()
    }

    /// Payload rendered back to JSON text, for diagnostics.
    pub fn payload_json(&self) -> String {
        Value::Object(self.payload.clone()).to_string()
    }

    /// Accounts listed in an accounts-by-token response (2150).
    ///
    /// The list is read from `traderAccounts`, or from `ctidTraderAccount`
    /// when the former is absent. Either may hold a single object instead of a
    /// list. An absent list yields an empty vector.
    pub fn accounts(&self) -> Result<Vec<AccountDescriptor>> {
        let raw: AccountsPayload = self.view()?;
        let list = raw.trader_accounts.or(raw.ctid_trader_account);
        Ok(list
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
            .into_iter()
            .map(|item| item_view::<RawAccount>(item).normalize())
            .collect())
    }

    /// Symbols listed in a symbols list response (2115), from `symbols` or else `symbol`.
    ///
    /// Only the list itself must be well formed. An entry whose fields have
    /// unexpected types keeps the readable fields and leaves the rest unset.
    pub fn symbols(&self) -> Result<Vec<SymbolDescriptor>> {
        let raw: SymbolsPayload = self.view()?;
        Ok(raw
            .symbols
            .or(raw.symbol)
            .unwrap_or_default()
            .into_iter()
            .map(|item| item_view::<RawSymbol>(item).normalize())
            .collect())
    }

    /// Price update carried by a spot event (2131).
    pub fn spot(&self) -> Result<QuoteEvent> {
        let raw: SpotPayload = self.view()?;
        Ok(raw.normalize())
    }

    fn view<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.payload.clone())).map_err(|e| {
            SessionError::MalformedMessage(format!(
                "payload of type {} does not match its schema: {}",
                self.payload_type, e
            ))
        })
    }
}

/// Generates a fresh correlation id.
pub fn new_client_msg_id() -> String {
    Uuid::new_v4().to_string()
}

/// Encodes `payload` under `payload_type` into wire text.
///
/// A correlation id is generated when `client_msg_id` is `None`. The payload
/// must serialize to a JSON object.
pub fn encode<P: Serialize + ?Sized>(
    payload_type: u32,
    payload: &P,
    client_msg_id: Option<&str>,
) -> Result<String> {
    let payload = match serde_json::to_value(payload)? {
        Value::Object(map) => map,
        other => {
            return Err(SessionError::MalformedMessage(format!(
                "payload must be a JSON object, got {}",
                other
            )));
        }
    };
    let envelope = Envelope {
        client_msg_id: Some(
            client_msg_id
                .map(String::from)
                .unwrap_or_else(new_client_msg_id),
        ),
        payload_type,
        payload,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Encodes a request under its own payload type.
pub fn encode_request<R: OutboundRequest>(request: &R, client_msg_id: Option<&str>) -> Result<String> {
    encode(R::PAYLOAD_TYPE, request, client_msg_id)
}

/// Code and description of an error response (2142) payload.
///
/// Unreadable or absent fields are left unset.
pub fn error_response(payload: &Map<String, Value>) -> ErrorResponse {
    let raw: ErrorPayload = item_view(Value::Object(payload.clone()));
    ErrorResponse {
        error_code: raw.error_code,
        description: raw.description,
    }
}

/// Decodes wire text into an [`Envelope`].
pub fn decode(text: &str) -> Result<Envelope> {
    serde_json::from_str::<Envelope>(text).map_err(|e| {
        SessionError::MalformedMessage(format!("{}: {}", e, preview(text)))
    })
}

fn preview(text: &str) -> &str {
    let end = text
        .char_indices()
        .nth(120)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[..end]
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

fn correlation_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(id) => Some(id),
        other => Some(other.to_string()),
    })
}

/// Reads one list entry; anything that is not an object reads as an empty entry.
fn item_view<T: DeserializeOwned + Default>(item: Value) -> T {
    serde_json::from_value(item).unwrap_or_default()
}

/// Wire field that may be a single object or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

// Field readers. A field of an unexpected type reads as absent instead of
// failing the whole record; numbers may also arrive as decimal strings.

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|v| v.fract() == 0.0).map(|v| v as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_i64<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(integer(&Value::deserialize(deserializer)?))
}

fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(&Value::deserialize(deserializer)?))
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text(&Value::deserialize(deserializer)?))
}

fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_bool())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountsPayload {
    #[serde(default)]
    trader_accounts: Option<OneOrMany<Value>>,
    #[serde(default)]
    ctid_trader_account: Option<OneOrMany<Value>>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawAccount {
    #[serde(default, deserialize_with = "lenient_i64")]
    ctid_trader_account_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    account_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    is_live: Option<bool>,
    #[serde(default, deserialize_with = "lenient_i64")]
    trader_login: Option<i64>,
}

impl RawAccount {
    fn normalize(self) -> AccountDescriptor {
        AccountDescriptor {
            account_id: self.ctid_trader_account_id.or(self.account_id),
            is_live: self.is_live,
            trader_login: self.trader_login,
        }
    }
}

#[derive(Deserialize)]
struct SymbolsPayload {
    #[serde(default)]
    symbols: Option<Vec<Value>>,
    #[serde(default)]
    symbol: Option<Vec<Value>>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawSymbol {
    #[serde(default, deserialize_with = "lenient_i64")]
    symbol_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    symbol_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    display_name: Option<String>,
}

impl RawSymbol {
    fn normalize(self) -> SymbolDescriptor {
        // An empty symbolName counts as missing.
        let name = self
            .symbol_name
            .filter(|s| !s.is_empty())
            .or(self.name.filter(|s| !s.is_empty()));
        SymbolDescriptor {
            symbol_id: self.symbol_id,
            name,
            display_name: self.display_name.filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpotPayload {
    #[serde(default, deserialize_with = "lenient_i64")]
    symbol_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    bid: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    ask: Option<f64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    timestamp: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    time: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    timestamp_in_ms: Option<i64>,
}

impl SpotPayload {
    fn normalize(self) -> QuoteEvent {
        QuoteEvent {
            symbol_id: self.symbol_id,
            bid: self.bid,
            ask: self.ask,
            timestamp: self.timestamp.or(self.time).or(self.timestamp_in_ms),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ErrorPayload {
    #[serde(default, deserialize_with = "lenient_string")]
    error_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload_type::{GET_ACCOUNTS_BY_TOKEN_RES, SPOT_EVENT, SYMBOLS_LIST_RES};
    use crate::requests::application_auth_req;
    use serde_json::json;
    use test_case::test_case;

    fn envelope(payload_type: u32, payload: Value) -> Envelope {
        match payload {
            Value::Object(map) => Envelope::new(payload_type, map),
            _ => panic!("test payload must be an object"),
        }
    }

    #[test]
    fn encode_generates_correlation_id_when_missing() {
        let text = encode_request(&application_auth_req("id", "secret"), None).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["payloadType"], 2100);
        assert_eq!(value["payload"]["clientId"], "id");
        let id = value["clientMsgId"].as_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());

        let other = encode_request(&application_auth_req("id", "secret"), None).unwrap();
        assert_ne!(text, other);
    }

    #[test]
    fn encode_keeps_supplied_correlation_id() {
        let text = encode(2149, &json!({"accessToken": "t"}), Some("req-1")).unwrap();
        let decoded = decode(&text).unwrap();
        assert_eq!(decoded.client_msg_id.as_deref(), Some("req-1"));
        assert_eq!(decoded.payload_type, 2149);
    }

    #[test]
    fn encode_rejects_non_object_payload() {
        let err = encode(2100, &json!([1, 2]), None).unwrap_err();
        assert!(matches!(err, SessionError::MalformedMessage(_)));
    }

    #[test_case("not json" ; "not json")]
    #[test_case("[1,2,3]" ; "array")]
    #[test_case(r#"{"payload":{}}"# ; "missing discriminant")]
    #[test_case(r#"{"payloadType":"2101"}"# ; "string discriminant")]
    fn decode_rejects_malformed(text: &str) {
        assert!(matches!(decode(text), Err(SessionError::MalformedMessage(_))));
    }

    #[test]
    fn decode_tolerates_missing_or_null_payload() {
        let env = decode(r#"{"payloadType":2101}"#).unwrap();
        assert!(env.payload.is_empty());
        assert_eq!(env.client_msg_id, None);

        let env = decode(r#"{"payloadType":2101,"payload":null}"#).unwrap();
        assert!(env.payload.is_empty());
    }

    #[test_case(json!({"traderAccounts": [{"ctidTraderAccountId": 77}]}) ; "trader accounts list")]
    #[test_case(json!({"ctidTraderAccount": [{"ctidTraderAccountId": 77}]}) ; "ctid list")]
    #[test_case(json!({"ctidTraderAccount": {"ctidTraderAccountId": 77}}) ; "ctid single object")]
    #[test_case(json!({"ctidTraderAccount": [{"accountId": 77}]}) ; "account id alias")]
    #[test_case(json!({"ctidTraderAccount": [{"ctidTraderAccountId": "77"}]}) ; "string id")]
    fn account_aliases_yield_same_id(payload: Value) {
        let accounts = envelope(GET_ACCOUNTS_BY_TOKEN_RES, payload).accounts().unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].account_id, Some(77));
    }

    #[test]
    fn account_id_precedence_prefers_ctid_field() {
        let env = envelope(
            GET_ACCOUNTS_BY_TOKEN_RES,
            json!({"ctidTraderAccount": [{"accountId": 1, "ctidTraderAccountId": 2}]}),
        );
        assert_eq!(env.accounts().unwrap()[0].account_id, Some(2));
    }

    #[test]
    fn account_list_precedence_prefers_trader_accounts() {
        let env = envelope(
            GET_ACCOUNTS_BY_TOKEN_RES,
            json!({
                "ctidTraderAccount": [{"ctidTraderAccountId": 1}],
                "traderAccounts": [{"ctidTraderAccountId": 2}, {"ctidTraderAccountId": 3}]
            }),
        );
        let ids: Vec<_> = env.accounts().unwrap().iter().map(|a| a.account_id).collect();
        assert_eq!(ids, vec![Some(2), Some(3)]);
    }

    #[test]
    fn absent_account_list_is_empty() {
        let env = envelope(GET_ACCOUNTS_BY_TOKEN_RES, json!({"permissionScope": "SCOPE_VIEW"}));
        assert!(env.accounts().unwrap().is_empty());
        let env = envelope(GET_ACCOUNTS_BY_TOKEN_RES, json!({"ctidTraderAccount": null}));
        assert!(env.accounts().unwrap().is_empty());
    }

    #[test_case(json!({"symbols": [{"symbolId": 1, "symbolName": "EURUSD"}]}) ; "plural key")]
    #[test_case(json!({"symbol": [{"symbolId": 1, "symbolName": "EURUSD"}]}) ; "singular key")]
    #[test_case(json!({"symbol": [{"symbolId": "1", "name": "EURUSD"}]}) ; "name alias")]
    #[test_case(json!({"symbol": [{"symbolId": 1, "symbolName": "", "name": "EURUSD"}]}) ; "empty symbol name")]
    fn symbol_aliases_yield_same_descriptor(payload: Value) {
        let symbols = envelope(SYMBOLS_LIST_RES, payload).symbols().unwrap();
        assert_eq!(symbols, vec![SymbolDescriptor::new(Some(1), Some("EURUSD"), None)]);
    }

    #[test]
    fn symbol_list_precedence_prefers_plural_key() {
        let env = envelope(
            SYMBOLS_LIST_RES,
            json!({
                "symbol": [{"symbolId": 9, "symbolName": "XAUUSD"}],
                "symbols": [{"symbolId": 1, "symbolName": "EURUSD"}]
            }),
        );
        assert_eq!(env.symbols().unwrap()[0].symbol_id, Some(1));
    }

    #[test_case(json!({"bid": 1.1, "ask": 1.2, "timestamp": 100}) ; "timestamp")]
    #[test_case(json!({"bid": 1.1, "ask": 1.2, "time": 100}) ; "time")]
    #[test_case(json!({"bid": 1.1, "ask": 1.2, "timestampInMs": 100}) ; "timestamp in ms")]
    #[test_case(json!({"bid": "1.1", "ask": "1.2", "timestamp": "100"}) ; "string encoded")]
    fn timestamp_aliases_yield_same_quote(payload: Value) {
        let quote = envelope(SPOT_EVENT, payload).spot().unwrap();
        assert_eq!(quote.bid, Some(1.1));
        assert_eq!(quote.ask, Some(1.2));
        assert_eq!(quote.timestamp, Some(100));
    }

    #[test]
    fn timestamp_precedence_is_fixed() {
        let env = envelope(
            SPOT_EVENT,
            json!({"timestampInMs": 3, "time": 2, "timestamp": 1}),
        );
        assert_eq!(env.spot().unwrap().timestamp, Some(1));
        let env = envelope(SPOT_EVENT, json!({"timestampInMs": 3, "time": 2}));
        assert_eq!(env.spot().unwrap().timestamp, Some(2));
    }

    #[test]
    fn spot_without_prices_keeps_them_unset() {
        let quote = envelope(SPOT_EVENT, json!({"symbolId": 1})).spot().unwrap();
        assert_eq!(quote.symbol_id, Some(1));
        assert_eq!(quote.bid, None);
        assert_eq!(quote.timestamp, None);
    }

    #[test]
    fn unreadable_spot_fields_are_unset() {
        let env = envelope(
            SPOT_EVENT,
            json!({"symbolId": "n/a", "bid": "n/a", "ask": 1.2, "timestamp": {"ms": 1}}),
        );
        let quote = env.spot().unwrap();
        assert_eq!(quote.symbol_id, None);
        assert_eq!(quote.bid, None);
        assert_eq!(quote.ask, Some(1.2));
        assert_eq!(quote.timestamp, None);
    }

    #[test]
    fn odd_sibling_symbol_does_not_hide_the_rest() {
        let env = envelope(
            SYMBOLS_LIST_RES,
            json!({"symbols": [
                {"symbolId": 9, "symbolName": "XAUUSD", "displayName": 42},
                "junk",
                {"symbolId": 1, "symbolName": "EURUSD", "isTradingEnabled": "yes"}
            ]}),
        );
        let symbols = env.symbols().unwrap();
        assert_eq!(symbols.len(), 3);
        assert_eq!(symbols[0], SymbolDescriptor::new(Some(9), Some("XAUUSD"), Some("42")));
        assert_eq!(symbols[1], SymbolDescriptor::default());
        assert_eq!(symbols[2], SymbolDescriptor::new(Some(1), Some("EURUSD"), None));
    }

    #[test]
    fn odd_account_fields_are_unset() {
        let env = envelope(
            GET_ACCOUNTS_BY_TOKEN_RES,
            json!({"ctidTraderAccount": [{"ctidTraderAccountId": 77, "isLive": "no", "traderLogin": []}]}),
        );
        let accounts = env.accounts().unwrap();
        assert_eq!(accounts[0].account_id, Some(77));
        assert_eq!(accounts[0].is_live, None);
        assert_eq!(accounts[0].trader_login, None);
    }

    #[test]
    fn symbol_list_of_wrong_shape_is_malformed() {
        let env = envelope(SYMBOLS_LIST_RES, json!({"symbols": "EURUSD"}));
        assert!(matches!(env.symbols(), Err(SessionError::MalformedMessage(_))));
    }

    #[test_case(r#"{"clientMsgId":42,"payloadType":2101}"#, Some("42") ; "numeric id")]
    #[test_case(r#"{"clientMsgId":{"n":1},"payloadType":2101}"#, Some(r#"{"n":1}"#) ; "object id")]
    #[test_case(r#"{"clientMsgId":null,"payloadType":2101}"#, None ; "null id")]
    fn correlation_id_is_opaque(text: &str, expected: Option<&str>) {
        let env = decode(text).unwrap();
        assert_eq!(env.client_msg_id.as_deref(), expected);
        assert_eq!(env.payload_type, 2101);
    }

    #[test]
    fn error_response_reads_code_and_description() {
        let mut payload = Map::new();
        payload.insert("errorCode".to_string(), json!("CH_ACCESS_TOKEN_INVALID"));
        payload.insert("description".to_string(), json!("Invalid token"));
        let err = error_response(&payload);
        assert_eq!(err.error_code.as_deref(), Some("CH_ACCESS_TOKEN_INVALID"));
        assert_eq!(err.description.as_deref(), Some("Invalid token"));

        payload.insert("description".to_string(), json!(["not", "text"]));
        assert_eq!(error_response(&payload).description, None);
    }
}
