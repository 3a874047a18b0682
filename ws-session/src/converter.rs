//! Operation bodies and the request converter seam.
//!
//! Converters map caller option objects to body XML. They are pure and
//! stateless; concrete converters live with the message definitions, not
//! here.

use crate::session::Dialect;

/// The body of one operation, ready to be wrapped in an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationBody {
    /// SOAP action of the operation.
    pub action: String,
    /// Body XML (the single child element of `soapenv:Body`).
    pub xml: String,
}

impl OperationBody {
    /// Body from its action and XML.
    pub fn new(action: impl Into<String>, xml: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            xml: xml.into(),
        }
    }
}

/// Maps request options to an operation body for a dialect.
pub trait RequestConverter {
    /// Caller-facing options type.
    type Options;

    /// Convert options to a body.
    fn convert(&self, options: &Self::Options, dialect: Dialect) -> OperationBody;
}
