// src/socket/dealer_socket.rs

use crate::error::ZmqError;
use crate::message::Msg;
use crate::runtime::InboundMsg;
use crate::socket::core::SocketCore;
use crate::socket::ISocket;

use async_trait::async_trait;
use std::sync::Arc;

/// DEALER: round-robin outgoing, fair-queued incoming, no envelope handling.
#[derive(Debug)]
pub(crate) struct DealerSocket {
  core: Arc<SocketCore>,
}

impl DealerSocket {
  pub fn new(core: Arc<SocketCore>) -> Self {
    Self { core }
  }
}

#[async_trait]
impl ISocket for DealerSocket {
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
