// src/socket/pair_socket.rs

use crate::error::ZmqError;
use crate::message::Msg;
use crate::runtime::InboundMsg;
use crate::socket::core::SocketCore;
use crate::socket::ISocket;

use async_trait::async_trait;
use std::sync::Arc;

/// PAIR: exclusive link to one peer. The single-peer limit is enforced at
/// connect time (`SocketType::max_peers`).
#[derive(Debug)]
pub(crate) struct PairSocket {
  core: Arc<SocketCore>,
}

impl PairSocket {
  pub fn new(core: Arc<SocketCore>) -> Self {
    Self { core }
  }
}

#[async_trait]
impl ISocket for PairSocket {
  fn core(&self) -> &Arc<SocketCore> {
    &self.core
  }

  fn accept_incoming(&self, inbound: InboundMsg) -> Option<Vec<Msg>> {
    Some(inbound.parts)
  }

  async fn send_message(&self, parts: Vec<Msg>) -> Result<(), ZmqError> {
    self.core.send_round_robin(parts).await.map(|_| ())
  }
}
