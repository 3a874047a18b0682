//! Protocol constants — namespaces, defaults and fixed lengths.
//!
//! Values here are fixed by the SOAP header 4 dialect and the OASIS
//! WS-Security UsernameToken profile. Changing any of them breaks
//! interop with the remote side.

/// Raw nonce length in bytes (before base64 encoding).
pub const NONCE_LENGTH: usize = 16;

/// Length of a generated nonce base (characters).
pub const NONCE_BASE_LENGTH: usize = 22;

/// Nonce base alphabet (62 chars, ASCII alphanumerics).
pub const NONCE_BASE_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Default location of the persisted nonce base file.
pub const DEFAULT_NONCE_BASE_PATH: &str = "conf/noncebase.txt";

/// Default agent duty code for the hosted user block.
pub const DEFAULT_DUTY_CODE: &str = "SU";

/// Default requestor type (originator) for the hosted user block.
pub const DEFAULT_ORIGINATOR_ID: &str = "U";

/// Point-of-sale type sent with the hosted user block.
pub const POS_TYPE: &str = "1";

/// `strftime` format of the WS-Security `Created` timestamp (UTC, millis).
pub const CREATED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

// ── Namespaces ────────────────────────────────────────────────────────

/// SOAP 1.1 envelope namespace.
pub const NS_SOAP_ENV: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// WS-Addressing namespace.
pub const NS_ADDRESSING: &str = "http://www.w3.org/2005/08/addressing";

/// WS-Security extension namespace.
pub const NS_WSSE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";

/// WS-Security utility namespace.
pub const NS_WSU: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";

/// Encoding type URI for a base64 nonce.
pub const NONCE_ENCODING_TYPE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary";

/// Password type URI for a password digest.
pub const PASSWORD_DIGEST_TYPE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordDigest";

/// Hosted user security namespace.
pub const NS_HOSTED_USER: &str = "http://xml.amadeus.com/2010/06/Security_v1";

/// Session header namespace.
pub const NS_SESSION: &str = "http://xml.amadeus.com/2010/06/Session_v3";

// ── Sign-out ──────────────────────────────────────────────────────────

/// Operation that terminates a stateful session.
pub const SIGN_OUT_OPERATION: &str = "Security_SignOut";

/// SOAP action of the sign-out operation.
pub const SIGN_OUT_ACTION: &str = "http://webservices.amadeus.com/VLSSOQ_04_1_1A";

/// Body namespace of the sign-out operation.
pub const SIGN_OUT_NAMESPACE: &str = "http://xml.amadeus.com/VLSSOQ_04_1_1A";
