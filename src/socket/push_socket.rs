// src/socket/push_socket.rs

use crate::error::ZmqError;
use crate::message::Msg;
use crate::runtime::InboundMsg;
use crate::socket::core::SocketCore;
use crate::socket::ISocket;

use async_trait::async_trait;
use std::sync::Arc;

/// PUSH: distributes messages round-robin to connected PULL peers. Send-only.
#[derive(Debug)]
pub(crate) struct PushSocket {
  core: Arc<SocketCore>,
}

impl PushSocket {
  pub fn new(core: Arc<SocketCore>) -> Self {
    Self { core }
  }
}

#[async_trait]
impl ISocket for PushSocket {
  fn core(&self) -> &Arc<SocketCore> {
    &self.core
  }

  fn check_recv(&self) -> Result<(), ZmqError> {
    Err(ZmqError::InvalidSocketType("PUSH sockets cannot receive"))
  }

  fn accept_incoming(&self, inbound: InboundMsg) -> Option<Vec<Msg>> {
    tracing::warn!(handle = self.core.handle, pipe_id = inbound.pipe_id, "PUSH socket dropped inbound message");
    None
  }

  async fn send_message(&self, parts: Vec<Msg>) -> Result<(), ZmqError> {
    self.core.send_round_robin(parts).await.map(|_| ())
  }
}
