// src/socket/patterns/fair_queue.rs

use crate::error::ZmqError;
use async_channel::{Receiver, Sender, TryRecvError};

/// Buffers incoming items from multiple peers in a single queue, so that
/// consumption is fair across them (arrival order, no peer can monopolise it).
#[derive(Debug)]
pub(crate) struct FairQueue<T: Send + 'static> {
  receiver: Receiver<T>,
  sender: Sender<T>,
  hwm: usize,
}

impl<T: Send + 'static> FairQueue<T> {
  /// Creates a new fair queue with a specific capacity (HWM). 0 means unbounded.
  pub fn new(capacity: usize) -> Self {
    let (sender, receiver) = if capacity == 0 {
      async_channel::unbounded()
    } else {
      async_channel::bounded(capacity)
    };
    Self {
      receiver,
      sender,
      hwm: capacity,
    }
  }

  /// Returns a sender handed to a connected peer so it can push into this queue.
  pub fn sender(&self) -> Sender<T> {
    self.sender.clone()
  }

  /// Pops the next available item, waiting for one.
  /// Returns `None` once the queue has been closed and drained.
  pub async fn pop_item(&self) -> Option<T> {
    self.receiver.recv().await.ok()
  }

  /// Attempts to pop an item without blocking.
  pub fn try_pop_item(&self) -> Result<Option<T>, ZmqError> {
    match self.receiver.try_recv() {
      Ok(item) => Ok(Some(item)),
      Err(TryRecvError::Empty) => Ok(None),
      Err(TryRecvError::Closed) => Err(ZmqError::SocketClosed),
    }
  }

  /// Returns the capacity (HWM) of the queue. 0 means unbounded.
  pub fn capacity(&self) -> usize {
    self.hwm
  }

  /// Returns the current number of items in the queue.
  pub fn len(&self) -> usize {
    self.receiver.len()
  }

  /// Closes the queue for every holder of a sender. Pending and future pops
  /// observe the closure once the queue is drained.
  pub fn close(&self) {
    self.sender.close();
  }
}
