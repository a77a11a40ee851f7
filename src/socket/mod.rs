// src/socket/mod.rs

//! Socket types, options and the per-pattern logic behind them.

pub(crate) mod core;
pub mod options;
pub(crate) mod patterns;
pub mod types;

pub(crate) mod dealer_socket;
pub(crate) mod pair_socket;
pub(crate) mod pull_socket;
pub(crate) mod push_socket;
pub(crate) mod rep_socket;
pub(crate) mod req_socket;
pub(crate) mod router_socket;

pub use types::{Socket, SocketType};

use crate::context::Context;
use crate::error::ZmqError;
use crate::message::{Blob, Msg};
use crate::runtime::InboundMsg;
use async_trait::async_trait;
use std::sync::Arc;

use self::core::SocketCore;
use dealer_socket::DealerSocket;
use pair_socket::PairSocket;
use pull_socket::PullSocket;
use push_socket::PushSocket;
use rep_socket::RepSocket;
use req_socket::ReqSocket;
use router_socket::RouterSocket;

/// Defines the pattern logic for a specific socket type.
/// Implementations embed `Arc<SocketCore>`, which handles everything shared.
#[async_trait]
pub(crate) trait ISocket: Send + Sync + 'static {
  fn core(&self) -> &Arc<SocketCore>;

  /// Rejects a receive the pattern does not allow in its current state.
  fn check_recv(&self) -> Result<(), ZmqError> {
    Ok(())
  }

  /// Rejects a send the pattern does not allow in its current state.
  fn check_send(&self) -> Result<(), ZmqError> {
    Ok(())
  }

  /// Filters and transforms a complete message arriving from a peer into the
  /// frames the application will receive. `None` discards the message.
  fn accept_incoming(&self, inbound: InboundMsg) -> Option<Vec<Msg>>;

  /// Dispatches a complete outgoing message according to the pattern.
  async fn send_message(&self, parts: Vec<Msg>) -> Result<(), ZmqError>;

  /// Called when a new pipe to a peer is attached.
  fn pipe_attached(&self, _pipe_id: usize, _peer_routing_id: Option<&Blob>) {}
}

/// Creates the pattern implementation for `socket_type` around a fresh core.
pub(crate) fn create_socket(handle: usize, ctx: Context, socket_type: SocketType) -> Arc<dyn ISocket> {
  let core = Arc::new(SocketCore::new(handle, socket_type, ctx));
  match socket_type {
    SocketType::Pair => Arc::new(PairSocket::new(core)),
    SocketType::Req => Arc::new(ReqSocket::new(core)),
    SocketType::Rep => Arc::new(RepSocket::new(core)),
    SocketType::Dealer => Arc::new(DealerSocket::new(core)),
    SocketType::Router => Arc::new(RouterSocket::new(core)),
    SocketType::Pull => Arc::new(PullSocket::new(core)),
    SocketType::Push => Arc::new(PushSocket::new(core)),
  }
}
