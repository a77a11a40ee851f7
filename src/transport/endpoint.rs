// src/transport/endpoint.rs

use crate::error::ZmqError;
use std::{net::SocketAddr, path::PathBuf};

/// Represents a parsed and validated endpoint address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum EndpointAddr {
  Tcp(SocketAddr),
  Ipc(PathBuf),
  Inproc(String),
}

impl EndpointAddr {
  pub fn scheme(&self) -> &'static str {
    match self {
      EndpointAddr::Tcp(_) => "tcp",
      EndpointAddr::Ipc(_) => "ipc",
      EndpointAddr::Inproc(_) => "inproc",
    }
  }
}

/// Parses an endpoint string into a structured `EndpointAddr`.
pub(crate) fn parse_endpoint(endpoint_str: &str) -> Result<EndpointAddr, ZmqError> {
  let invalid_endpoint_err = || ZmqError::InvalidEndpoint(endpoint_str.to_string());

  let Some((scheme, address_part)) = endpoint_str.split_once("://") else {
    return Err(invalid_endpoint_err());
  };

  match scheme {
    "tcp" => address_part.parse::<SocketAddr>().map(EndpointAddr::Tcp).map_err(|_| {
      tracing::debug!("Failed to parse TCP address: {}", address_part);
      invalid_endpoint_err()
    }),
    "ipc" | "inproc" if address_part.is_empty() || address_part.contains('\0') => Err(invalid_endpoint_err()),
    "ipc" => Ok(EndpointAddr::Ipc(PathBuf::from(address_part))),
    "inproc" => Ok(EndpointAddr::Inproc(address_part.to_string())),
    _ => Err(ZmqError::UnsupportedTransport(endpoint_str.to_string())),
  }
}
