//! In-memory transport and reporter for session and dispatcher tests.
use std::collections::VecDeque;

use ctrader_common::codec::{self, Envelope};
use ctrader_common::{Result, SessionError};
use serde_json::{Value, json};

use crate::report::{Reporter, SessionEvent};
use crate::transport::Transport;

/// Replays scripted inbound messages and records everything sent.
///
/// Once the script is exhausted the connection reads as closed.
#[derive(Default)]
pub struct ScriptedTransport {
    inbound: VecDeque<Result<String>>,
    pub sent: Vec<Envelope>,
}

impl ScriptedTransport {
    pub fn new(inbound: impl IntoIterator<Item = String>) -> Self {
        Self {
            inbound: inbound.into_iter().map(Ok).collect(),
            ..Self::default()
        }
    }

    pub fn push_failure(&mut self, err: SessionError) {
        self.inbound.push_back(Err(err));
    }

    pub fn sent_types(&self) -> Vec<u32> {
        self.sent.iter().map(|e| e.payload_type).collect()
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, text: &str) -> Result<()> {
        self.sent.push(codec::decode(text)?);
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<String>> {
        match self.inbound.pop_front() {
            Some(Ok(text)) => Ok(Some(text)),
            Some(Err(err)) => Err(err),
            None => Ok(None),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.inbound.clear();
        Ok(())
    }
}

/// Collects every reported event.
#[derive(Default)]
pub struct RecordingReporter {
    pub events: Vec<SessionEvent>,
}

impl Reporter for RecordingReporter {
    fn report(&mut self, event: SessionEvent) {
        self.events.push(event);
    }
}

/// Wire text of an inbound message.
pub fn inbound(payload_type: u32, payload: Value) -> String {
    json!({"payloadType": payload_type, "payload": payload}).to_string()
}
