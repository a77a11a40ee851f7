// src/error.rs

use thiserror::Error;

/// Errors raised by sockets, endpoints and the polling primitive.
#[derive(Error, Debug)]
#[non_exhaustive] // Allows adding more variants later without breaking change
pub enum ZmqError {
  #[error("Invalid argument provided: {0}")]
  InvalidArgument(String), // EINVAL for non-option errors

  // --- Timeouts ---
  #[error("Operation timed out")]
  Timeout, // ETIMEDOUT / EAGAIN after RCVTIMEO or SNDTIMEO

  // --- Connection/Binding Errors ---
  #[error("Address already in use: {0}")]
  AddrInUse(String), // EADDRINUSE
  #[error("Connection refused by peer: {0}")]
  ConnectionRefused(String), // ECONNREFUSED
  #[error("Host is unreachable: {0}")]
  HostUnreachable(String), // EHOSTUNREACH (ROUTER_MANDATORY)

  // --- Endpoint Errors ---
  #[error("Invalid endpoint format: {0}")]
  InvalidEndpoint(String),

  // --- Option Errors ---
  #[error("Invalid socket option ID: {0}")]
  InvalidOption(i32),
  #[error("Invalid value provided for option ID {0}")]
  InvalidOptionValue(i32),

  // --- State Errors ---
  #[error("Operation is invalid for the socket type ({0})")]
  InvalidSocketType(&'static str),
  #[error("Operation is invalid for the current socket state: {0}")]
  InvalidState(&'static str), // EFSM
  #[error("Invalid message format for operation: {0}")]
  InvalidMessage(String),
  #[error("Socket is closed")]
  SocketClosed, // ETERM / ENOTSOCK

  // --- Unsupported ---
  #[error("Transport scheme not supported or enabled: {0}")]
  UnsupportedTransport(String), // EPROTONOSUPPORT

  // --- Internal Errors ---
  #[error("Internal library error: {0}")]
  Internal(String),
}

/// The single fatal failure that ended a proxy session.
///
/// Each variant names where the failure happened and carries the endpoint
/// error unchanged as its source.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ProxyError {
  /// Receiving from or sending to the frontend failed.
  #[error("Frontend endpoint failed: {0}")]
  Frontend(#[source] ZmqError),
  /// Receiving from or sending to the backend failed.
  #[error("Backend endpoint failed: {0}")]
  Backend(#[source] ZmqError),
  /// The readiness-polling step itself failed.
  #[error("Polling failed: {0}")]
  Poll(#[source] ZmqError),
  /// Writing to the capture sink failed under `CapturePolicy::Escalate`.
  #[error("Capture sink failed: {0}")]
  Capture(#[source] ZmqError),
  /// Receiving a command from, or replying on, the control endpoint failed.
  #[error("Control endpoint failed: {0}")]
  Control(#[source] ZmqError),
}

impl ProxyError {
  /// The endpoint-level error that caused the failure.
  pub fn cause(&self) -> &ZmqError {
    match self {
      ProxyError::Frontend(e)
      | ProxyError::Backend(e)
      | ProxyError::Poll(e)
      | ProxyError::Capture(e)
      | ProxyError::Control(e) => e,
    }
  }

  /// Consumes the proxy error, returning the endpoint-level error.
  pub fn into_cause(self) -> ZmqError {
    match self {
      ProxyError::Frontend(e)
      | ProxyError::Backend(e)
      | ProxyError::Poll(e)
      | ProxyError::Capture(e)
      | ProxyError::Control(e) => e,
    }
  }
}
