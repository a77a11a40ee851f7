// src/socket/pull_socket.rs

use crate::error::ZmqError;
use crate::message::Msg;
use crate::runtime::InboundMsg;
use crate::socket::core::SocketCore;
use crate::socket::ISocket;

use async_trait::async_trait;
use std::sync::Arc;

/// PULL: fair-queues messages from connected PUSH peers. Receive-only.
#[derive(Debug)]
pub(crate) struct PullSocket {
  core: Arc<SocketCore>,
}

impl PullSocket {
  pub fn new(core: Arc<SocketCore>) -> Self {
    Self { core }
  }
}

#[async_trait]
impl ISocket for PullSocket {
  fn core(&self) -> &Arc<SocketCore> {
    &self.core
  }

  fn check_send(&self) -> Result<(), ZmqError> {
    Err(ZmqError::InvalidSocketType("PULL sockets cannot send"))
  }

  fn accept_incoming(&self, inbound: InboundMsg) -> Option<Vec<Msg>> {
    Some(inbound.parts)
  }

  async fn send_message(&self, _parts: Vec<Msg>) -> Result<(), ZmqError> {
    Err(ZmqError::InvalidSocketType("PULL sockets cannot send"))
  }
}
