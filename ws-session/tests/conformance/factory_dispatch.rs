//! Conformance: dialect dispatch and nonce-base resolution.

use std::sync::Arc;

use ws_session::config::FactoryConfig;
use ws_session::credentials::{Credentials, Password};
use ws_session::errors::SessionError;
use ws_session::factory::{HandlerFactory, SessionHandlerParams};
use ws_session::nonce::NonceBase;
use ws_session::Dialect;

use crate::support::*;

#[test]
fn conformance_every_dialect_has_a_defined_outcome() {
    let transport = ScriptedTransport::new();
    for dialect in Dialect::ALL {
        let params = SessionHandlerParams::new(dialect, credentials(), ENDPOINT, transport.clone());
        match factory().create_handler(params) {
            Ok(handler) => {
                assert!(dialect.is_implemented());
                assert_eq!(handler.dialect(), dialect);
            }
            Err(SessionError::UnsupportedDialect(rejected)) => {
                assert!(!dialect.is_implemented());
                assert_eq!(rejected, dialect);
            }
            Err(other) => panic!("unexpected error for {dialect}: {other}"),
        }
    }
}

#[test]
fn conformance_unsupported_dialect_checked_before_params() {
    let transport = ScriptedTransport::new();
    let params = SessionHandlerParams::new(
        Dialect::V1,
        Arc::new(Credentials::new("", "", Password::clear(""))),
        "",
        transport,
    );
    assert!(matches!(
        factory().create_handler(params),
        Err(SessionError::UnsupportedDialect(Dialect::V1))
    ));
}

#[test]
fn conformance_incomplete_credentials_rejected() {
    let transport = ScriptedTransport::new();
    let params = SessionHandlerParams::new(
        Dialect::V4,
        Arc::new(Credentials::new("BRUXX0000", "", Password::clear("secret"))),
        ENDPOINT,
        transport.clone(),
    );
    assert!(matches!(
        factory().create_handler(params),
        Err(SessionError::CredentialsInvalid(_))
    ));
    assert_eq!(transport.exchanges(), 0);
}

#[test]
fn conformance_ephemeral_bases_differ_between_factories() {
    let dir = tempfile::tempdir().unwrap();
    let config = FactoryConfig::with_nonce_base_path(dir.path().join("noncebase.txt"));

    let first = ScriptedTransport::new();
    first.reply(stateless_reply());
    let second = ScriptedTransport::new();
    second.reply(stateless_reply());

    for transport in [&first, &second] {
        HandlerFactory::new(&config)
            .create_handler(params(transport).stateful(false))
            .unwrap()
            .send("PNR_Retrieve", &body())
            .unwrap();
    }
    assert_ne!(
        nonce(&first.request_xml(0)),
        nonce(&second.request_xml(0))
    );
}

#[test]
fn conformance_one_factory_shares_its_base() {
    let factory = HandlerFactory::new(&FactoryConfig::ephemeral());
    let base = factory.nonce_base().clone();
    let again = factory.clone();
    assert_eq!(again.nonce_base(), &base);
}

#[test]
fn conformance_persisted_base_read_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noncebase.txt");
    std::fs::write(&path, "  qWeRtY1234567890AbCdEf \n").unwrap();
    let factory = HandlerFactory::new(&FactoryConfig::with_nonce_base_path(&path));
    assert_eq!(factory.nonce_base().as_str(), "qWeRtY1234567890AbCdEf");
}

#[test]
fn conformance_explicit_base_wins() {
    let transport = ScriptedTransport::new();
    transport.reply(stateless_reply());
    let factory = factory();
    let explicit = NonceBase::new("explicit");
    let handler = factory
        .create_handler(params(&transport).stateful(false).nonce_base(explicit.clone()))
        .unwrap();

    assert_eq!(handler.nonce_base(), &explicit);
    assert_ne!(handler.nonce_base(), factory.nonce_base());
    handler.send("PNR_Retrieve", &body()).unwrap();
    assert_eq!(handler.nonce_base(), &explicit);
}

#[test]
fn conformance_handlers_without_explicit_base_share_factory_base() {
    let transport = ScriptedTransport::new();
    let factory = factory();
    let a = factory.create_handler(params(&transport)).unwrap();
    let b = factory.create_handler(params(&transport)).unwrap();
    assert_eq!(a.nonce_base(), factory.nonce_base());
    assert_eq!(b.nonce_base(), factory.nonce_base());
}

#[test]
fn conformance_handlers_are_independent() {
    let a_transport = ScriptedTransport::new();
    a_transport.reply(ok_reply(1));
    let b_transport = ScriptedTransport::new();
    let factory = factory();
    let a = factory.create_handler(params(&a_transport)).unwrap();
    let b = factory.create_handler(params(&b_transport)).unwrap();

    a.send("PNR_Retrieve", &body()).unwrap();
    assert_eq!(a.current_state().sequence_number, 1);
    assert_eq!(b.current_state().sequence_number, 0);
    assert_eq!(b_transport.exchanges(), 0);
}

#[test]
fn conformance_handler_shared_across_threads() {
    let transport = ScriptedTransport::new();
    for seq in 1..=8 {
        transport.reply(ok_reply(seq));
    }
    let handler = Arc::new(stateful(&transport));
    // Establish first; concurrent Start calls would race for the session.
    handler.send("PNR_Retrieve", &body()).unwrap();

    let threads: Vec<_> = (0..7)
        .map(|_| {
            let handler = handler.clone();
            std::thread::spawn(move || handler.send("PNR_Retrieve", &body()).unwrap())
        })
        .collect();
    let mut seen: Vec<u32> = threads
        .into_iter()
        .map(|t| t.join().unwrap().sequence_number)
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, (2..=8).collect::<Vec<u32>>());
}
