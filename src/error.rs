//! Error types for the PyMOL bridge.
//!
//! `RpcError` covers everything that can go wrong talking XML-RPC to PyMOL.
//! `BridgeError` is what the tool layer works with; the dispatcher turns every
//! variant into an in-band text result, so none of these ever reach a client
//! as a protocol-level failure.

use thiserror::Error;

/// Failure of a single XML-RPC round-trip.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Connection refused, reset, DNS failure, ...
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The listener answered with a non-2xx HTTP status.
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// The response body was not well-formed XML.
    #[error("invalid XML in response: {0}")]
    Xml(#[from] xml::reader::Error),

    /// Well-formed XML that is not a valid `methodResponse`.
    #[error("malformed XML-RPC response: {0}")]
    Malformed(String),

    /// The remote method raised.
    #[error("remote fault {code}: {message}")]
    Fault { code: i64, message: String },
}

impl RpcError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

/// Error raised while serving a tool invocation.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No candidate port answered the liveness probe at startup.
    #[error(
        "not connected to PyMOL. Make sure PyMOL is running with its XML-RPC server enabled (pymol -R)"
    )]
    NotConnected,

    /// A required argument was missing or had the wrong JSON type.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Remote(#[from] RpcError),

    /// The remote call succeeded but returned a value of the wrong shape.
    #[error("unexpected reply from {method}: {detail}")]
    UnexpectedReply { method: String, detail: String },
}

impl BridgeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unexpected_reply(method: &str, detail: impl Into<String>) -> Self {
        Self::UnexpectedReply {
            method: method.to_string(),
            detail: detail.into(),
        }
    }
}
