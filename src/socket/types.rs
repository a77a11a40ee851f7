// src/socket/types.rs

use crate::error::ZmqError;
use crate::message::Msg;
use crate::proxy::Endpoint;
use crate::socket::ISocket;
use crate::transport;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Represents the type of a socket, defining its messaging pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketType {
  /// Exclusive bidirectional link to a single peer.
  Pair,
  /// Send requests and receive replies (Req-Rep pattern).
  Req,
  /// Receive requests and send replies (Req-Rep pattern).
  Rep,
  /// Asynchronous request-reply, load-balancing outgoing (Dealer-Router pattern).
  Dealer,
  /// Asynchronous request-reply, routing incoming (Dealer-Router pattern).
  Router,
  /// Collect messages from a pool of distributors (Push-Pull pattern).
  Pull,
  /// Distribute messages to a pool of workers (Push-Pull pattern).
  Push,
}

impl SocketType {
  /// The libzmq numeric socket type, as reported by the `TYPE` option.
  pub fn code(self) -> i32 {
    match self {
      SocketType::Pair => 0,
      SocketType::Req => 3,
      SocketType::Rep => 4,
      SocketType::Dealer => 5,
      SocketType::Router => 6,
      SocketType::Pull => 7,
      SocketType::Push => 8,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      SocketType::Pair => "PAIR",
      SocketType::Req => "REQ",
      SocketType::Rep => "REP",
      SocketType::Dealer => "DEALER",
      SocketType::Router => "ROUTER",
      SocketType::Pull => "PULL",
      SocketType::Push => "PUSH",
    }
  }

  /// Whether a socket of this type may be connected to a peer of `peer` type.
  pub fn is_compatible(self, peer: SocketType) -> bool {
    use SocketType::*;
    matches!(
      (self, peer),
      (Pair, Pair)
        | (Req, Rep)
        | (Req, Router)
        | (Rep, Req)
        | (Rep, Dealer)
        | (Dealer, Rep)
        | (Dealer, Dealer)
        | (Dealer, Router)
        | (Router, Req)
        | (Router, Dealer)
        | (Router, Router)
        | (Pull, Push)
        | (Push, Pull)
    )
  }

  /// Maximum number of simultaneously attached peers, if limited.
  pub fn max_peers(self) -> Option<usize> {
    match self {
      SocketType::Pair => Some(1),
      _ => None,
    }
  }
}

impl fmt::Display for SocketType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The public handle for interacting with a socket.
/// Handles are cloneable; every clone refers to the same socket.
#[derive(Clone)]
pub struct Socket {
  pub(crate) inner: Arc<dyn ISocket>,
}

impl Socket {
  /// Creates a new public Socket handle wrapping the internal implementation.
  /// This is typically called by `Context::socket`.
  pub(crate) fn new(socket_impl: Arc<dyn ISocket>) -> Self {
    Self { inner: socket_impl }
  }

  pub fn socket_type(&self) -> SocketType {
    self.inner.core().socket_type
  }

  /// Binds the socket to a local endpoint (e.g. `inproc://name`).
  pub async fn bind(&self, endpoint: &str) -> Result<(), ZmqError> {
    transport::bind(endpoint, &self.inner)
  }

  /// Connects the socket to a bound endpoint.
  pub async fn connect(&self, endpoint: &str) -> Result<(), ZmqError> {
    transport::connect(endpoint, &self.inner)
  }

  /// Sends one frame. Set `MsgFlags::MORE` on every frame but the last of a
  /// multipart message; peers receive the message only once it is complete.
  pub async fn send(&self, msg: Msg) -> Result<(), ZmqError> {
    self.inner.core().send_frame(self.inner.as_ref(), msg).await
  }

  /// Receives one frame. `Msg::is_more` reports whether further frames of the
  /// same message follow.
  pub async fn recv(&self) -> Result<Msg, ZmqError> {
    self.inner.core().recv_frame(self.inner.as_ref()).await
  }

  /// Sends a complete multipart message, setting the MORE flags itself.
  pub async fn send_multipart(&self, frames: Vec<Msg>) -> Result<(), ZmqError> {
    if frames.is_empty() {
      return Err(ZmqError::InvalidMessage("Cannot send a message with no frames".into()));
    }
    let last = frames.len() - 1;
    for (i, mut frame) in frames.into_iter().enumerate() {
      frame.set_more(i < last);
      self.send(frame).await?;
    }
    Ok(())
  }

  /// Receives every frame of the next message.
  pub async fn recv_multipart(&self) -> Result<Vec<Msg>, ZmqError> {
    let mut frames = Vec::new();
    loop {
      let frame = self.recv().await?;
      let more = frame.is_more();
      frames.push(frame);
      if !more {
        return Ok(frames);
      }
    }
  }

  /// Sets a socket option (see `socket::options` for ids).
  pub async fn set_option(&self, option: i32, value: &[u8]) -> Result<(), ZmqError> {
    self.inner.core().set_option(option, value)
  }

  /// Gets a socket option value.
  pub async fn get_option(&self, option: i32) -> Result<Vec<u8>, ZmqError> {
    self.inner.core().get_option(option)
  }

  /// Closes the socket. Operations pending on any clone fail with `SocketClosed`.
  pub async fn close(&self) -> Result<(), ZmqError> {
    self.inner.core().close();
    Ok(())
  }
}

#[async_trait]
impl Endpoint for Socket {
  fn id(&self) -> usize {
    self.inner.core().handle
  }

  fn has_frame(&self) -> bool {
    self.inner.core().try_fill(self.inner.as_ref())
  }

  async fn readable(&self) -> Result<(), ZmqError> {
    self.inner.core().poll_readable(self.inner.as_ref()).await
  }

  async fn send(&self, msg: Msg) -> Result<(), ZmqError> {
    Socket::send(self, msg).await
  }

  async fn recv(&self) -> Result<Msg, ZmqError> {
    Socket::recv(self).await
  }
}

impl fmt::Debug for Socket {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let core = self.inner.core();
    f.debug_struct("Socket")
      .field("handle", &core.handle)
      .field("socket_type", &core.socket_type)
      .finish_non_exhaustive()
  }
}
