// src/socket/rep_socket.rs

use crate::error::ZmqError;
use crate::message::Msg;
use crate::runtime::InboundMsg;
use crate::socket::core::{Delivery, SocketCore};
use crate::socket::ISocket;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// The routing envelope of the request currently being served.
#[derive(Debug)]
struct PendingRequest {
  pipe_id: usize,
  /// Identity frames up to and including the empty delimiter.
  envelope: Vec<Msg>,
}

/// REP: strict receive/send alternation. The request envelope is stripped on
/// receive and re-attached to the reply.
#[derive(Debug)]
pub(crate) struct RepSocket {
  core: Arc<SocketCore>,
  pending: Mutex<Option<PendingRequest>>,
}

impl RepSocket {
  pub fn new(core: Arc<SocketCore>) -> Self {
    Self {
      core,
      pending: Mutex::new(None),
    }
  }
}

#[async_trait]
impl ISocket for RepSocket {
  fn core(&self) -> &Arc<SocketCore> {
    &self.core
  }

  fn check_recv(&self) -> Result<(), ZmqError> {
    if self.pending.lock().is_some() {
      Err(ZmqError::InvalidState("REP socket must send a reply before receiving"))
    } else {
      Ok(())
    }
  }

  fn check_send(&self) -> Result<(), ZmqError> {
    if self.pending.lock().is_none() {
      Err(ZmqError::InvalidState("REP socket must receive a request before sending"))
    } else {
      Ok(())
    }
  }

  fn accept_incoming(&self, inbound: InboundMsg) -> Option<Vec<Msg>> {
    let mut parts = inbound.parts;
    let Some(delimiter) = parts.iter().position(Msg::is_empty) else {
      tracing::warn!(handle = self.core.handle, pipe_id = inbound.pipe_id, "REP dropped request without delimiter");
      return None;
    };
    let body = parts.split_off(delimiter + 1);
    if body.is_empty() {
      tracing::warn!(handle = self.core.handle, pipe_id = inbound.pipe_id, "REP dropped request without body");
      return None;
    }
    let mut pending = self.pending.lock();
    *pending = Some(PendingRequest {
      pipe_id: inbound.pipe_id,
      envelope: parts,
    });
    Some(body)
  }

  async fn send_message(&self, parts: Vec<Msg>) -> Result<(), ZmqError> {
    let Some(request) = self.pending.lock().take() else {
      return Err(ZmqError::InvalidState("REP socket must receive a request before sending"));
    };
    let mut reply = request.envelope;
    reply.extend(parts);
    match self.core.deliver(request.pipe_id, reply).await? {
      Delivery::Sent => {}
      Delivery::PeerGone(_) => {
        tracing::debug!(handle = self.core.handle, pipe_id = request.pipe_id, "REP requester gone, reply dropped");
      }
    }
    Ok(())
  }
}
