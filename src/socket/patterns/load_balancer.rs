// src/socket/patterns/load_balancer.rs

use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::Notify;

/// Distributes outgoing messages across attached pipes in a round-robin fashion.
#[derive(Debug, Default)]
pub(crate) struct LoadBalancer {
  /// Pipe ids available for sending, in rotation order.
  pipes: Mutex<VecDeque<usize>>,
  notify_waiters: Notify,
}

impl LoadBalancer {
  /// Creates a new, empty load balancer.
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a pipe to the rotation and wakes any sender waiting for a peer.
  pub fn add_pipe(&self, pipe_id: usize) {
    let mut pipes = self.pipes.lock();
    if !pipes.contains(&pipe_id) {
      pipes.push_back(pipe_id);
      tracing::trace!(pipe_id, "LoadBalancer added pipe");
    }
    drop(pipes);
    self.notify_waiters.notify_waiters();
  }

  /// Removes a pipe from the rotation.
  pub fn remove_pipe(&self, pipe_id: usize) {
    let mut pipes = self.pipes.lock();
    if let Some(pos) = pipes.iter().position(|id| *id == pipe_id) {
      pipes.remove(pos);
      tracing::trace!(pipe_id, "LoadBalancer removed pipe");
    }
  }

  /// Selects the next pipe using round-robin.
  /// Returns `None` if no pipes are available.
  pub fn next_pipe(&self) -> Option<usize> {
    let mut pipes = self.pipes.lock();
    let pipe_id = pipes.pop_front()?;
    pipes.push_back(pipe_id);
    Some(pipe_id)
  }

  /// Waits until at least one pipe is available, or until `wake_all` is called.
  /// Callers re-check their own state after returning.
  pub async fn wait_for_pipe(&self) {
    let notified = self.notify_waiters.notified();
    tokio::pin!(notified);
    // Register before checking so an add between the check and the await is not missed.
    notified.as_mut().enable();
    if self.has_pipes() {
      return;
    }
    notified.await;
  }

  /// Wakes every waiter without adding a pipe (used on socket close).
  pub fn wake_all(&self) {
    self.notify_waiters.notify_waiters();
  }

  /// Drops every pipe from the rotation.
  pub fn clear(&self) {
    self.pipes.lock().clear();
  }

  /// Checks if any pipes are currently registered.
  pub fn has_pipes(&self) -> bool {
    !self.pipes.lock().is_empty()
  }
}
