//! Streaming phase: classify every inbound message and react to it.
use ctrader_common::codec::{self, Envelope};
use ctrader_common::model::QuoteEvent;
use ctrader_common::payload_type::{ERROR_RES, SPOT_EVENT, SUBSCRIBE_SPOTS_RES};
use ctrader_common::symbols::ResolvedSymbol;
use ctrader_common::Result;
use log::debug;
use serde_json::{Map, Value};

use crate::report::{Reporter, SessionEvent};
use crate::transport::Transport;

/// The live subscription a completed handshake leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Account the subscription was made for.
    pub account_id: i64,
    /// Subscribed symbol.
    pub symbol: ResolvedSymbol,
}

/// What an inbound message means to the streaming loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Spot price update (2131).
    Quote(QuoteEvent),
    /// Subscription acknowledged (2128).
    SubscriptionConfirmed,
    /// Error response (2142); the stream goes on.
    RemoteError(Map<String, Value>),
    /// A message this client does not act on.
    Ignored(u32),
}

/// Classifies an envelope by its payload type.
pub fn classify(envelope: Envelope) -> Result<Dispatch> {
    Ok(match envelope.payload_type {
        SPOT_EVENT => Dispatch::Quote(envelope.spot()?),
        SUBSCRIBE_SPOTS_RES => Dispatch::SubscriptionConfirmed,
        ERROR_RES => Dispatch::RemoteError(envelope.payload),
        other => Dispatch::Ignored(other),
    })
}

/// Post-handshake event loop for one subscription.
pub struct EventDispatcher {
    subscription: Subscription,
}

impl EventDispatcher {
    /// Creates a dispatcher for `subscription`.
    pub fn new(subscription: Subscription) -> Self {
        Self { subscription }
    }

    /// Receives and dispatches messages until the transport reports closure.
    ///
    /// Closure returns `Ok(())` and a transport failure ends the loop with an
    /// error. A message that cannot be decoded is reported and skipped.
    pub fn run<T: Transport, R: Reporter>(&self, transport: &mut T, reporter: &mut R) -> Result<()> {
        debug!(
            "Streaming {} (symbolId={}) for account {}",
            self.subscription.symbol.name, self.subscription.symbol.symbol_id, self.subscription.account_id
        );
        while let Some(text) = transport.receive()? {
            match codec::decode(&text).and_then(classify) {
                Ok(dispatch) => self.dispatch(dispatch, reporter),
                Err(e) => reporter.report(SessionEvent::Malformed { reason: e.to_string() }),
            }
        }
        Ok(())
    }

    fn dispatch<R: Reporter>(&self, dispatch: Dispatch, reporter: &mut R) {
        match dispatch {
            Dispatch::Quote(quote) => reporter.report(SessionEvent::Quote(quote)),
            Dispatch::SubscriptionConfirmed => reporter.report(SessionEvent::SubscriptionConfirmed {
                symbol_id: self.subscription.symbol.symbol_id,
            }),
            Dispatch::RemoteError(payload) => reporter.report(SessionEvent::RemoteError(payload)),
            Dispatch::Ignored(payload_type) => debug!("Ignoring message of type {}", payload_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingReporter, ScriptedTransport, inbound};
    use ctrader_common::SessionError;
    use serde_json::json;

    fn dispatcher() -> EventDispatcher {
        EventDispatcher::new(Subscription {
            account_id: 77,
            symbol: ResolvedSymbol {
                symbol_id: 1,
                name: "EURUSD".to_string(),
            },
        })
    }

    #[test]
    fn unknown_types_produce_no_report_and_do_not_stop_the_loop() {
        let mut transport = ScriptedTransport::new(vec![
            inbound(2131, json!({"bid": 1.1, "ask": 1.2, "timestamp": 100})),
            inbound(9999, json!({})),
            inbound(2142, json!({"code": "X"})),
        ]);
        let mut reporter = RecordingReporter::default();

        dispatcher().run(&mut transport, &mut reporter).unwrap();

        let mut error_payload = Map::new();
        error_payload.insert("code".to_string(), Value::from("X"));
        assert_eq!(
            reporter.events,
            vec![
                SessionEvent::Quote(QuoteEvent {
                    symbol_id: None,
                    bid: Some(1.1),
                    ask: Some(1.2),
                    timestamp: Some(100),
                }),
                SessionEvent::RemoteError(error_payload),
            ]
        );
        assert!(transport.sent.is_empty());
    }

    #[test]
    fn confirmation_names_the_subscribed_symbol() {
        let mut transport = ScriptedTransport::new(vec![inbound(2128, json!({}))]);
        let mut reporter = RecordingReporter::default();

        dispatcher().run(&mut transport, &mut reporter).unwrap();

        assert_eq!(reporter.events, vec![SessionEvent::SubscriptionConfirmed { symbol_id: 1 }]);
    }

    #[test]
    fn quote_timestamp_aliases_are_normalized() {
        let mut transport = ScriptedTransport::new(vec![
            inbound(2131, json!({"bid": 1.0, "time": 5})),
            inbound(2131, json!({"ask": 2.0, "timestampInMs": 6})),
        ]);
        let mut reporter = RecordingReporter::default();

        dispatcher().run(&mut transport, &mut reporter).unwrap();

        let timestamps: Vec<_> = reporter
            .events
            .iter()
            .map(|e| match e {
                SessionEvent::Quote(q) => q.timestamp,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(timestamps, vec![Some(5), Some(6)]);
    }

    #[test]
    fn malformed_messages_are_skipped_and_streaming_goes_on() {
        let mut transport = ScriptedTransport::new(vec![
            inbound(2131, json!({"bid": 1.1, "ask": 1.2, "timestamp": 100, "symbolId": "n/a"})),
            "garbage".to_string(),
            inbound(2131, json!({"bid": 1.1, "ask": 1.2, "timestamp": 101})),
        ]);
        let mut reporter = RecordingReporter::default();

        dispatcher().run(&mut transport, &mut reporter).unwrap();

        assert_eq!(reporter.events.len(), 3);
        assert!(matches!(&reporter.events[0], SessionEvent::Quote(q) if q.timestamp == Some(100)));
        assert!(matches!(&reporter.events[1], SessionEvent::Malformed { reason } if reason.contains("garbage")));
        assert!(matches!(&reporter.events[2], SessionEvent::Quote(q) if q.timestamp == Some(101)));
    }

    #[test]
    fn transport_failure_is_propagated() {
        let mut transport = ScriptedTransport::new(Vec::new());
        transport.push_failure(SessionError::Transport("reset".to_string()));
        let mut reporter = RecordingReporter::default();

        let err = dispatcher().run(&mut transport, &mut reporter).unwrap_err();

        assert!(matches!(err, SessionError::Transport(_)));
    }

    #[test]
    fn classify_maps_each_discriminant() {
        let envelope = codec::decode(&inbound(2142, json!({"errorCode": "E"}))).unwrap();
        assert!(matches!(classify(envelope).unwrap(), Dispatch::RemoteError(p) if p["errorCode"] == "E"));
        let envelope = codec::decode(&inbound(2126, json!({}))).unwrap();
        assert_eq!(classify(envelope).unwrap(), Dispatch::Ignored(2126));
    }
}
