//! Shared fixtures: a scripted transport and reply builders.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use ws_session::clock::FixedClock;
use ws_session::config::FactoryConfig;
use ws_session::converter::OperationBody;
use ws_session::credentials::{Credentials, Password};
use ws_session::factory::{HandlerFactory, SessionHandlerParams};
use ws_session::transport::{Transport, TransportFailure, TransportRequest};
use ws_session::{Dialect, Handler};

pub const ENDPOINT: &str = "https://nodeD1.test.webservices.amadeus.com/1ASIWXXXXXX";

/// One scripted exchange outcome.
pub enum Step {
    /// Return these bytes.
    Reply(Vec<u8>),
    /// Fail the exchange.
    Fail(TransportFailure),
    /// Build the reply from the request's MessageID.
    Correlated(Box<dyn Fn(&str) -> String + Send>),
}

/// Transport that replays a script and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, xml: impl Into<String>) -> &Self {
        self.push(Step::Reply(xml.into().into_bytes()))
    }

    pub fn fail(&self, failure: TransportFailure) -> &Self {
        self.push(Step::Fail(failure))
    }

    pub fn correlated(&self, build: impl Fn(&str) -> String + Send + 'static) -> &Self {
        self.push(Step::Correlated(Box::new(build)))
    }

    fn push(&self, step: Step) -> &Self {
        self.script.lock().unwrap().push_back(step);
        self
    }

    /// Number of exchanges attempted so far.
    pub fn exchanges(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Envelope XML of the `index`-th request.
    pub fn request_xml(&self, index: usize) -> String {
        let requests = self.requests.lock().unwrap();
        String::from_utf8(requests[index].payload.clone()).unwrap()
    }

    /// SOAP action of the `index`-th request.
    pub fn request_action(&self, index: usize) -> String {
        self.requests.lock().unwrap()[index].action.clone()
    }
}

impl Transport for ScriptedTransport {
    fn exchange(&self, request: &TransportRequest) -> Result<Vec<u8>, TransportFailure> {
        self.requests.lock().unwrap().push(request.clone());
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(bytes)) => Ok(bytes),
            Some(Step::Fail(failure)) => Err(failure),
            Some(Step::Correlated(build)) => {
                let xml = String::from_utf8(request.payload.clone()).unwrap();
                Ok(build(&message_id(&xml)).into_bytes())
            }
            None => Err(TransportFailure::NotDelivered("script exhausted".into())),
        }
    }
}

// ── Reply builders ──────────────────────────────────────────────

pub fn session_reply(session_id: &str, seq: u32, token: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:awsse="http://xml.amadeus.com/2010/06/Session_v3">
  <soap:Header>
    <awsse:Session TransactionStatusCode="InSeries">
      <awsse:SessionId>{session_id}</awsse:SessionId>
      <awsse:SequenceNumber>{seq}</awsse:SequenceNumber>
      <awsse:SecurityToken>{token}</awsse:SecurityToken>
    </awsse:Session>
  </soap:Header>
  <soap:Body>{body}</soap:Body>
</soap:Envelope>"#
    )
}

pub fn ok_reply(seq: u32) -> String {
    session_reply("00F2C1ZB1Q", seq, "TOKEN", "<Reply/>")
}

pub fn fault_reply(session: Option<(&str, u32)>, fault_string: &str) -> String {
    let header = match session {
        Some((id, seq)) => format!(
            r#"<soap:Header><awsse:Session TransactionStatusCode="InSeries"><awsse:SessionId>{id}</awsse:SessionId><awsse:SequenceNumber>{seq}</awsse:SequenceNumber><awsse:SecurityToken>TOKEN</awsse:SecurityToken></awsse:Session></soap:Header>"#
        ),
        None => String::new(),
    };
    format!(
        r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:awsse="http://xml.amadeus.com/2010/06/Session_v3">{header}<soap:Body><soap:Fault><faultcode>soap:Server</faultcode><faultstring>{fault_string}</faultstring></soap:Fault></soap:Body></soap:Envelope>"#
    )
}

pub fn stateless_reply() -> String {
    r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><Reply/></soap:Body></soap:Envelope>"#.to_string()
}

// ── Request inspection ──────────────────────────────────────────

fn between(xml: &str, open: &str, close: &str) -> Option<String> {
    let start = xml.find(open)?;
    let content = start + xml[start..].find('>')? + 1;
    let end = content + xml[content..].find(close)?;
    Some(xml[content..end].to_string())
}

pub fn message_id(xml: &str) -> String {
    between(xml, "<add:MessageID", "</add:MessageID>").unwrap_or_default()
}

pub fn nonce(xml: &str) -> Option<String> {
    between(xml, "<oas:Nonce", "</oas:Nonce>")
}

pub fn sequence_number(xml: &str) -> Option<u32> {
    between(xml, "<awsse:SequenceNumber", "</awsse:SequenceNumber>").and_then(|s| s.parse().ok())
}

pub fn session_id(xml: &str) -> Option<String> {
    between(xml, "<awsse:SessionId", "</awsse:SessionId>")
}

// ── Handler construction ────────────────────────────────────────

pub fn credentials() -> Arc<Credentials> {
    Arc::new(Credentials::new(
        "BRUXX0000",
        "WSBENXXX",
        Password::clear("secret"),
    ))
}

pub fn factory() -> HandlerFactory {
    HandlerFactory::new(&FactoryConfig::ephemeral()).with_clock(Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2016, 1, 21, 9, 30, 0).unwrap(),
    )))
}

pub fn params(transport: &Arc<ScriptedTransport>) -> SessionHandlerParams {
    SessionHandlerParams::new(Dialect::V4, credentials(), ENDPOINT, transport.clone())
}

pub fn stateful(transport: &Arc<ScriptedTransport>) -> Handler {
    factory().create_handler(params(transport)).unwrap()
}

pub fn stateless(transport: &Arc<ScriptedTransport>) -> Handler {
    factory()
        .create_handler(params(transport).stateful(false))
        .unwrap()
}

pub fn body() -> OperationBody {
    OperationBody::new(
        "http://webservices.amadeus.com/PNRRET_11_3_1A",
        "<PNR_Retrieve/>",
    )
}
