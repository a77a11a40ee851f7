// src/transport/mod.rs

//! Endpoint parsing and the transports sockets bind and connect over.
//! Only `inproc://` is implemented; `tcp://` and `ipc://` parse but are refused.

pub(crate) mod endpoint;
pub(crate) mod inproc;

use crate::error::ZmqError;
use crate::socket::ISocket;
use endpoint::{parse_endpoint, EndpointAddr};
use std::sync::Arc;

pub(crate) fn bind(endpoint: &str, socket: &Arc<dyn ISocket>) -> Result<(), ZmqError> {
  match parse_endpoint(endpoint)? {
    EndpointAddr::Inproc(name) => inproc::bind_inproc(name, socket),
    other => unsupported(endpoint, &other),
  }
}

pub(crate) fn connect(endpoint: &str, socket: &Arc<dyn ISocket>) -> Result<(), ZmqError> {
  match parse_endpoint(endpoint)? {
    EndpointAddr::Inproc(name) => inproc::connect_inproc(name, socket),
    other => unsupported(endpoint, &other),
  }
}

fn unsupported(endpoint: &str, addr: &EndpointAddr) -> Result<(), ZmqError> {
  tracing::warn!(endpoint, scheme = addr.scheme(), "Transport not available");
  Err(ZmqError::UnsupportedTransport(endpoint.to_string()))
}
