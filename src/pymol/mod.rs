//! Client side of PyMOL's XML-RPC interface.
//!
//! **Codec** (`xmlrpc`): value model plus `methodCall` / `methodResponse`
//! serialization.
//!
//! **Connection** (`connection`): probes the port window, adopts one handle
//! and forwards calls through it.

pub mod connection;
pub mod xmlrpc;

pub use connection::{Connector, HttpConnector, PymolConnection, RemoteEndpoint, XmlRpcEndpoint};
pub use xmlrpc::XmlValue;
