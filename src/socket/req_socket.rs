// src/socket/req_socket.rs

use crate::error::ZmqError;
use crate::message::Msg;
use crate::runtime::InboundMsg;
use crate::socket::core::SocketCore;
use crate::socket::ISocket;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReqState {
  ReadyToSend,
  /// Request handed to this pipe; only its reply is accepted.
  AwaitingReply { pipe_id: usize },
}

/// REQ: strict send/receive alternation. Requests carry an empty delimiter
/// frame which is stripped from the reply.
#[derive(Debug)]
pub(crate) struct ReqSocket {
  core: Arc<SocketCore>,
  state: Mutex<ReqState>,
}

impl ReqSocket {
  pub fn new(core: Arc<SocketCore>) -> Self {
    Self {
      core,
      state: Mutex::new(ReqState::ReadyToSend),
    }
  }
}

#[async_trait]
impl ISocket for ReqSocket {
  fn core(&self) -> &Arc<SocketCore> {
    &self.core
  }

  fn check_send(&self) -> Result<(), ZmqError> {
    match *self.state.lock() {
      ReqState::ReadyToSend => Ok(()),
      ReqState::AwaitingReply { .. } => Err(ZmqError::InvalidState("REQ socket must receive a reply before sending")),
    }
  }

  fn check_recv(&self) -> Result<(), ZmqError> {
    match *self.state.lock() {
      ReqState::AwaitingReply { .. } => Ok(()),
      ReqState::ReadyToSend => Err(ZmqError::InvalidState("REQ socket must send a request before receiving")),
    }
  }

  fn accept_incoming(&self, inbound: InboundMsg) -> Option<Vec<Msg>> {
    let mut state = self.state.lock();
    let ReqState::AwaitingReply { pipe_id } = *state else {
      return None;
    };
    if inbound.pipe_id != pipe_id {
      tracing::trace!(handle = self.core.handle, pipe_id = inbound.pipe_id, "REQ dropped reply from unexpected peer");
      return None;
    }
    let mut parts = inbound.parts;
    if parts.len() < 2 || !parts[0].is_empty() {
      tracing::warn!(handle = self.core.handle, pipe_id, "REQ dropped malformed reply");
      return None;
    }
    parts.remove(0);
    *state = ReqState::ReadyToSend;
    Some(parts)
  }

  async fn send_message(&self, parts: Vec<Msg>) -> Result<(), ZmqError> {
    let mut request = Vec::with_capacity(parts.len() + 1);
    request.push(Msg::new());
    request.extend(parts);
    let pipe_id = self.core.send_round_robin(request).await?;
    *self.state.lock() = ReqState::AwaitingReply { pipe_id };
    Ok(())
  }
}
