//! Conformance: WS-Security UsernameToken on the wire.
//!
//! PasswordDigest = Base64(SHA1(nonce || created || SHA1(password))), where
//! nonce is the raw 16 bytes behind the base64 `Nonce` element and
//! created is the exact `Created` string.

use std::sync::Arc;

use ws_session::credentials::{Credentials, Password};
use ws_session::encoding::{from_base64, to_base64};
use ws_session::hash::{sha1, sha1_concat};
use ws_session::Dialect;
use ws_session::factory::SessionHandlerParams;

use crate::support::*;

fn element(xml: &str, open: &str, close: &str) -> String {
    let start = xml.find(open).unwrap();
    let content = start + xml[start..].find('>').unwrap() + 1;
    let end = content + xml[content..].find(close).unwrap();
    xml[content..end].to_string()
}

fn recompute(xml: &str, password: &[u8]) -> String {
    let nonce = from_base64(&element(xml, "<oas:Nonce", "</oas:Nonce>")).unwrap();
    let created = element(xml, "<oas1:Created", "</oas1:Created>");
    let hashed = sha1(password);
    to_base64(&sha1_concat(&[&nonce[..], created.as_bytes(), &hashed[..]]))
}

#[test]
fn conformance_wire_digest_verifies() {
    let transport = ScriptedTransport::new();
    transport.reply(ok_reply(1));
    stateful(&transport).send("PNR_Retrieve", &body()).unwrap();

    let xml = transport.request_xml(0);
    assert_eq!(
        element(&xml, "<oas:Password", "</oas:Password>"),
        recompute(&xml, b"secret")
    );
    assert_eq!(from_base64(&nonce(&xml).unwrap()).unwrap().len(), 16);
    assert_eq!(
        element(&xml, "<oas1:Created", "</oas1:Created>"),
        "2016-01-21T09:30:00.000Z"
    );
}

#[test]
fn conformance_hashed_password_gives_same_wire_digest_shape() {
    let hash: [u8; 20] = sha1(b"secret");
    let creds = Arc::new(Credentials::new(
        "BRUXX0000",
        "WSBENXXX",
        Password::sha1_hash(hash),
    ));
    let transport = ScriptedTransport::new();
    transport.reply(ok_reply(1));
    factory()
        .create_handler(SessionHandlerParams::new(
            Dialect::V4,
            creds,
            ENDPOINT,
            transport.clone(),
        ))
        .unwrap()
        .send("PNR_Retrieve", &body())
        .unwrap();

    let xml = transport.request_xml(0);
    assert_eq!(
        element(&xml, "<oas:Password", "</oas:Password>"),
        recompute(&xml, b"secret")
    );
}

#[test]
fn conformance_nonce_fresh_per_call() {
    let transport = ScriptedTransport::new();
    for _ in 0..20 {
        transport.reply(stateless_reply());
    }
    let handler = stateless(&transport);
    let mut seen = std::collections::HashSet::new();
    for i in 0..20 {
        handler.send("PNR_Retrieve", &body()).unwrap();
        assert!(seen.insert(nonce(&transport.request_xml(i)).unwrap()));
    }
}

#[test]
fn conformance_hosted_user_rendered() {
    let creds = Arc::new(
        Credentials::new("BRUXX0000", "WSBENXXX", Password::clear("secret"))
            .with_organization("NMC-BENELU"),
    );
    let transport = ScriptedTransport::new();
    transport.reply(ok_reply(1));
    factory()
        .create_handler(SessionHandlerParams::new(
            Dialect::V4,
            creds,
            ENDPOINT,
            transport.clone(),
        ))
        .unwrap()
        .send("PNR_Retrieve", &body())
        .unwrap();

    let xml = transport.request_xml(0);
    assert!(xml.contains("<oas:Username>WSBENXXX</oas:Username>"));
    assert!(xml.contains(r#"AgentDutyCode="SU""#));
    assert!(xml.contains(r#"RequestorType="U""#));
    assert!(xml.contains(r#"PseudoCityCode="BRUXX0000""#));
    assert!(xml.contains(r#"POS_Type="1""#));
    assert!(xml.contains("<CompanyName>NMC-BENELU</CompanyName>"));
}

#[test]
fn conformance_body_and_addressing_carried_verbatim() {
    let transport = ScriptedTransport::new();
    transport.reply(ok_reply(1));
    stateful(&transport).send("PNR_Retrieve", &body()).unwrap();

    let xml = transport.request_xml(0);
    assert!(xml.contains("<soapenv:Body><PNR_Retrieve/></soapenv:Body>"));
    assert!(xml.contains("http://webservices.amadeus.com/PNRRET_11_3_1A</add:Action>"));
    assert!(xml.contains(&format!("{ENDPOINT}</add:To>")));
    assert!(message_id(&xml).starts_with("urn:uuid:"));
}
