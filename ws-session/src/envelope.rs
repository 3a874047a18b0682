//! SOAP envelope rendering and response parsing.
//!
//! ## Request layout (header 4)
//! ```text
//! soapenv:Envelope
//! ├── soapenv:Header
//! │   ├── add:MessageID / add:Action / add:To        (always)
//! │   ├── oas:Security/UsernameToken                 (authenticating calls)
//! │   ├── AMA_SecurityHostedUser/UserID              (authenticating calls)
//! │   └── awsse:Session                              (stateful calls)
//! └── soapenv:Body
//!     └── <operation body>
//! ```
//!
//! An authenticating call is one that carries credentials: the
//! session-establishing call of a stateful conversation, or any stateless
//! call. Calls inside an established session authenticate with the
//! session id and security token alone.

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::constants::{
    NONCE_ENCODING_TYPE, NS_ADDRESSING, NS_HOSTED_USER, NS_SESSION, NS_SOAP_ENV, NS_WSSE, NS_WSU,
    PASSWORD_DIGEST_TYPE, POS_TYPE,
};
use crate::errors::{Fault, SessionError};
use crate::security::AuthHeader;

/// `TransactionStatusCode` of the session header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Session-establishing call.
    Start,
    /// Call inside an established session.
    InSeries,
    /// Last call of the session.
    End,
}

impl TransactionStatus {
    /// Wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Start => "Start",
            TransactionStatus::InSeries => "InSeries",
            TransactionStatus::End => "End",
        }
    }
}

/// Outgoing session header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHeader {
    /// Transaction status.
    pub status: TransactionStatus,
    /// Session id; absent on the session-establishing call.
    pub session_id: Option<String>,
    /// Sequence number; absent on the session-establishing call.
    pub sequence_number: Option<u32>,
    /// Security token; absent on the session-establishing call.
    pub security_token: Option<String>,
}

impl SessionHeader {
    /// Header of a session-establishing call.
    pub fn start() -> Self {
        Self {
            status: TransactionStatus::Start,
            session_id: None,
            sequence_number: None,
            security_token: None,
        }
    }
}

/// A complete outgoing envelope.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    /// WS-Addressing MessageID.
    pub message_id: String,
    /// SOAP action.
    pub action: String,
    /// Endpoint (WS-Addressing To).
    pub endpoint: String,
    /// Credentials block, when the call authenticates.
    pub security: Option<AuthHeader>,
    /// Session block, when the call is stateful.
    pub session: Option<SessionHeader>,
    /// Operation body XML, inserted verbatim.
    pub body_xml: String,
}

impl RequestEnvelope {
    /// Render the envelope.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(2048 + self.body_xml.len());
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push_str(&format!(
            r#"<soapenv:Envelope xmlns:soapenv="{NS_SOAP_ENV}"><soapenv:Header>"#
        ));

        xml.push_str(&format!(
            r#"<add:MessageID xmlns:add="{NS_ADDRESSING}">{}</add:MessageID>"#,
            escape(self.message_id.as_str())
        ));
        xml.push_str(&format!(
            r#"<add:Action xmlns:add="{NS_ADDRESSING}">{}</add:Action>"#,
            escape(self.action.as_str())
        ));
        xml.push_str(&format!(
            r#"<add:To xmlns:add="{NS_ADDRESSING}">{}</add:To>"#,
            escape(self.endpoint.as_str())
        ));

        if let Some(auth) = &self.security {
            render_security(&mut xml, auth);
        }
        if let Some(session) = &self.session {
            render_session(&mut xml, session);
        }

        xml.push_str("</soapenv:Header><soapenv:Body>");
        xml.push_str(&self.body_xml);
        xml.push_str("</soapenv:Body></soapenv:Envelope>");
        xml
    }
}

fn render_security(xml: &mut String, auth: &AuthHeader) {
    xml.push_str(&format!(
        r#"<oas:Security xmlns:oas="{NS_WSSE}" xmlns:oas1="{NS_WSU}"><oas:UsernameToken oas1:Id="UsernameToken-1">"#
    ));
    xml.push_str(&format!(
        "<oas:Username>{}</oas:Username>",
        escape(auth.username.as_str())
    ));
    xml.push_str(&format!(
        r#"<oas:Nonce EncodingType="{NONCE_ENCODING_TYPE}">{}</oas:Nonce>"#,
        auth.nonce_base64()
    ));
    xml.push_str(&format!(
        r#"<oas:Password Type="{PASSWORD_DIGEST_TYPE}">{}</oas:Password>"#,
        auth.digest_base64()
    ));
    xml.push_str(&format!(
        "<oas1:Created>{}</oas1:Created>",
        escape(auth.created.as_str())
    ));
    xml.push_str("</oas:UsernameToken></oas:Security>");

    xml.push_str(&format!(
        r#"<AMA_SecurityHostedUser xmlns="{NS_HOSTED_USER}"><UserID AgentDutyCode="{}" RequestorType="{}" PseudoCityCode="{}" POS_Type="{POS_TYPE}""#,
        escape(auth.duty_code.as_str()),
        escape(auth.originator_id.as_str()),
        escape(auth.office_id.as_str()),
    ));
    match &auth.organization_id {
        Some(org) => xml.push_str(&format!(
            "><RequestorID><CompanyName>{}</CompanyName></RequestorID></UserID>",
            escape(org.as_str())
        )),
        None => xml.push_str("/>"),
    }
    xml.push_str("</AMA_SecurityHostedUser>");
}

fn render_session(xml: &mut String, session: &SessionHeader) {
    let open = format!(
        r#"<awsse:Session TransactionStatusCode="{}" xmlns:awsse="{NS_SESSION}""#,
        session.status.as_str()
    );
    xml.push_str(&open);
    if session.session_id.is_none()
        && session.sequence_number.is_none()
        && session.security_token.is_none()
    {
        xml.push_str("/>");
        return;
    }
    xml.push('>');
    if let Some(id) = &session.session_id {
        xml.push_str(&format!(
            "<awsse:SessionId>{}</awsse:SessionId>",
            escape(id.as_str())
        ));
    }
    if let Some(seq) = session.sequence_number {
        xml.push_str(&format!(
            "<awsse:SequenceNumber>{seq}</awsse:SequenceNumber>"
        ));
    }
    if let Some(token) = &session.security_token {
        xml.push_str(&format!(
            "<awsse:SecurityToken>{}</awsse:SecurityToken>",
            escape(token.as_str())
        ));
    }
    xml.push_str("</awsse:Session>");
}

// ── Response side ─────────────────────────────────────────────────────

/// Session header returned by the remote side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseSession {
    /// `TransactionStatusCode` attribute.
    pub status: Option<String>,
    /// Session id.
    pub session_id: Option<String>,
    /// Sequence number.
    pub sequence_number: Option<u32>,
    /// Security token.
    pub security_token: Option<String>,
}

/// A parsed response envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseEnvelope {
    /// Session header, if present.
    pub session: Option<ResponseSession>,
    /// WS-Addressing RelatesTo, if present.
    pub relates_to: Option<String>,
    /// SOAP fault, if the body holds one.
    pub fault: Option<Fault>,
    /// Raw inner XML of the Body.
    pub body_xml: String,
}

#[derive(Default)]
struct FaultParts {
    code: String,
    string: String,
}

impl ResponseEnvelope {
    /// Parse a response.
    ///
    /// # Errors
    /// Returns `SessionError::Encoding` on non-UTF-8 input, malformed XML,
    /// a root other than `Envelope`, a missing `Body`, or a non-numeric
    /// sequence number.
    pub fn parse(bytes: &[u8]) -> Result<Self, SessionError> {
        let xml = std::str::from_utf8(bytes)
            .map_err(|e| SessionError::Encoding(format!("response is not utf-8: {e}")))?;

        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut out = ResponseEnvelope::default();
        let mut path: Vec<String> = Vec::new();
        let mut body_start: Option<usize> = None;
        let mut body_range: Option<(usize, usize)> = None;
        let mut fault: Option<FaultParts> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = local_name(&e);
                    check_root(&path, &name)?;
                    on_element(&path, &name, &e, &mut out, &mut fault)?;
                    if is_body(&path, &name) {
                        body_start = Some(reader.buffer_position() as usize);
                    }
                    path.push(name);
                }
                Event::Empty(e) => {
                    let name = local_name(&e);
                    check_root(&path, &name)?;
                    on_element(&path, &name, &e, &mut out, &mut fault)?;
                    if is_body(&path, &name) {
                        body_range = Some((0, 0));
                    }
                }
                Event::End(_) => {
                    let closed = path.pop().unwrap_or_default();
                    if is_body(&path, &closed) {
                        let after = reader.buffer_position() as usize;
                        let end = xml[..after].rfind("</").unwrap_or(after);
                        body_range = body_start.map(|start| (start, end));
                    }
                }
                Event::Text(t) => {
                    let text = t.unescape()?.into_owned();
                    on_text(&path, text, &mut out, &mut fault)?;
                }
                Event::CData(c) => {
                    let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                    on_text(&path, text, &mut out, &mut fault)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !path.is_empty() {
            return Err(SessionError::Encoding(format!(
                "truncated response: unclosed <{}>",
                path.join("/")
            )));
        }
        let (start, end) = body_range
            .ok_or_else(|| SessionError::Encoding("response has no soap Body".into()))?;
        out.body_xml = xml.get(start..end).unwrap_or_default().trim().to_string();
        out.fault = fault.map(|parts| Fault::classify(&parts.code, &parts.string));
        Ok(out)
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn check_root(path: &[String], name: &str) -> Result<(), SessionError> {
    if path.is_empty() && name != "Envelope" {
        return Err(SessionError::Encoding(format!(
            "response root is <{name}>, expected <Envelope>"
        )));
    }
    Ok(())
}

fn is_body(parent: &[String], name: &str) -> bool {
    parent.len() == 1 && name == "Body"
}

fn on_element(
    parent: &[String],
    name: &str,
    e: &BytesStart<'_>,
    out: &mut ResponseEnvelope,
    fault: &mut Option<FaultParts>,
) -> Result<(), SessionError> {
    let parent: Vec<&str> = parent.iter().map(String::as_str).collect();
    match (parent.as_slice(), name) {
        (["Envelope", "Header"], "Session") => {
            let mut session = ResponseSession::default();
            for attr in e.attributes() {
                let attr = attr.map_err(quick_xml::Error::from)?;
                if attr.key.local_name().as_ref() == b"TransactionStatusCode" {
                    session.status = Some(attr.unescape_value()?.into_owned());
                }
            }
            out.session = Some(session);
        }
        (["Envelope", "Body"], "Fault") => {
            *fault = Some(FaultParts::default());
        }
        _ => {}
    }
    Ok(())
}

fn on_text(
    path: &[String],
    text: String,
    out: &mut ResponseEnvelope,
    fault: &mut Option<FaultParts>,
) -> Result<(), SessionError> {
    let path: Vec<&str> = path.iter().map(String::as_str).collect();
    match path.as_slice() {
        ["Envelope", "Header", "RelatesTo"] => out.relates_to = Some(text),
        ["Envelope", "Header", "Session", field] => {
            let Some(session) = out.session.as_mut() else {
                return Ok(());
            };
            match *field {
                "SessionId" => session.session_id = Some(text),
                "SecurityToken" => session.security_token = Some(text),
                "SequenceNumber" => {
                    let seq = text.trim().parse::<u32>().map_err(|e| {
                        SessionError::Encoding(format!("invalid SequenceNumber {text:?}: {e}"))
                    })?;
                    session.sequence_number = Some(seq);
                }
                _ => {}
            }
        }
        ["Envelope", "Body", "Fault", field] => {
            if let Some(parts) = fault.as_mut() {
                match *field {
                    "faultcode" => parts.code = text,
                    "faultstring" => parts.string = text,
                    _ => {}
                }
            }
        }
        _ => {}
    }
    Ok(())
}
