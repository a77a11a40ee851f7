// src/socket/router_socket.rs

use crate::error::ZmqError;
use crate::message::{Blob, Msg};
use crate::runtime::InboundMsg;
use crate::socket::core::{Delivery, SocketCore};
use crate::socket::patterns::RouterMap;
use crate::socket::ISocket;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// ROUTER: prefixes every received message with the sender's identity and
/// routes every sent message by its leading identity frame.
#[derive(Debug)]
pub(crate) struct RouterSocket {
  core: Arc<SocketCore>,
  router_map: Mutex<RouterMap>,
}

impl RouterSocket {
  pub fn new(core: Arc<SocketCore>) -> Self {
    Self {
      core,
      router_map: Mutex::new(RouterMap::new()),
    }
  }

  /// Identity for peers that did not set ROUTING_ID: a zero byte followed by
  /// four random bytes. The zero prefix cannot collide with user identities.
  fn generate_identity(map: &RouterMap) -> Blob {
    loop {
      let mut id = Vec::with_capacity(5);
      id.push(0u8);
      id.extend_from_slice(&rand::random::<u32>().to_be_bytes());
      let id = Blob::from(id);
      if !map.contains_identity(&id) {
        return id;
      }
    }
  }

  fn unroutable(&self, identity: &[u8]) -> Result<(), ZmqError> {
    let mandatory = self.core.options.read().router_mandatory;
    if mandatory {
      Err(ZmqError::HostUnreachable(format!("{:?}", Blob::from(identity.to_vec()))))
    } else {
      tracing::trace!(handle = self.core.handle, identity = ?Blob::from(identity.to_vec()), "Dropping message for unknown peer");
      Ok(())
    }
  }
}

#[async_trait]
impl ISocket for RouterSocket {
  fn core(&self) -> &Arc<SocketCore> {
    &self.core
  }

  fn pipe_attached(&self, pipe_id: usize, peer_routing_id: Option<&Blob>) {
    let mut map = self.router_map.lock();
    let identity = match peer_routing_id {
      Some(id) if !map.contains_identity(id) => id.clone(),
      Some(id) => {
        tracing::warn!(handle = self.core.handle, pipe_id, identity = ?id, "Duplicate routing id, generating one");
        Self::generate_identity(&map)
      }
      None => Self::generate_identity(&map),
    };
    map.add_peer(identity, pipe_id);
  }

  fn accept_incoming(&self, inbound: InboundMsg) -> Option<Vec<Msg>> {
    let identity = self.router_map.lock().identity_for(inbound.pipe_id)?.to_bytes();
    let mut parts = Vec::with_capacity(inbound.parts.len() + 1);
    parts.push(Msg::from_bytes(identity));
    parts.extend(inbound.parts);
    Some(parts)
  }

  async fn send_message(&self, mut parts: Vec<Msg>) -> Result<(), ZmqError> {
    if parts.len() < 2 {
      return Err(ZmqError::InvalidMessage(
        "ROUTER send expects an identity frame followed by a body".into(),
      ));
    }
    let identity = parts.remove(0);
    let identity = identity.data().unwrap_or(&[]);
    let pipe_id = self.router_map.lock().pipe_for(identity);
    let Some(pipe_id) = pipe_id else {
      return self.unroutable(identity);
    };
    match self.core.deliver(pipe_id, parts).await? {
      Delivery::Sent => Ok(()),
      Delivery::PeerGone(_) => {
        self.router_map.lock().remove_pipe(pipe_id);
        self.unroutable(identity)
      }
    }
  }
}
