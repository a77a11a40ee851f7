// src/socket/patterns/router.rs

use crate::message::Blob;
use std::collections::HashMap;

/// Maps peer identities to pipe ids (and back) for ROUTER sockets.
#[derive(Debug, Default)]
pub(crate) struct RouterMap {
  identity_to_pipe: HashMap<Blob, usize>,
  pipe_to_identity: HashMap<usize, Blob>,
}

impl RouterMap {
  pub fn new() -> Self {
    Self::default()
  }

  /// True if another live pipe already uses this identity.
  pub fn contains_identity(&self, identity: &Blob) -> bool {
    self.identity_to_pipe.contains_key(identity)
  }

  /// Adds the mapping for a newly attached peer.
  pub fn add_peer(&mut self, identity: Blob, pipe_id: usize) {
    tracing::trace!(?identity, pipe_id, "RouterMap added peer");
    self.pipe_to_identity.insert(pipe_id, identity.clone());
    self.identity_to_pipe.insert(identity, pipe_id);
  }

  /// Removes a peer mapping by pipe id.
  pub fn remove_pipe(&mut self, pipe_id: usize) -> Option<Blob> {
    let identity = self.pipe_to_identity.remove(&pipe_id)?;
    self.identity_to_pipe.remove(&identity);
    tracing::trace!(?identity, pipe_id, "RouterMap removed peer");
    Some(identity)
  }

  pub fn identity_for(&self, pipe_id: usize) -> Option<&Blob> {
    self.pipe_to_identity.get(&pipe_id)
  }

  pub fn pipe_for(&self, identity: &[u8]) -> Option<usize> {
    self.identity_to_pipe.get(identity).copied()
  }
}
