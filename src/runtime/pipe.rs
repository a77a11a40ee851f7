// src/runtime/pipe.rs

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::message::Msg;

/// A complete multipart message travelling over a pipe to a connected peer.
///
/// `pipe_id` identifies the connection on both of its ends, so the receiving
/// socket knows which peer the message came from.
#[derive(Debug)]
pub(crate) struct InboundMsg {
  pub pipe_id: usize,
  pub parts: Vec<Msg>,
  /// Send credit held while the message is in flight. Returned to the sender's
  /// SNDHWM budget when the receiver takes the message off its queue.
  credit: Option<OwnedSemaphorePermit>,
}

impl InboundMsg {
  pub fn new(pipe_id: usize, parts: Vec<Msg>) -> Self {
    Self {
      pipe_id,
      parts,
      credit: None,
    }
  }

  /// Total payload bytes across all frames.
  pub fn payload_size(&self) -> usize {
    self.parts.iter().map(Msg::size).sum()
  }
}

/// Sending half of a peer's inbound queue. Cloned into every socket connected
/// to that peer.
pub(crate) type PipeSender = async_channel::Sender<InboundMsg>;

/// In-flight message budget for one direction of a pipe, sized by the sending
/// socket's SNDHWM. `None` when SNDHWM is 0 (no limit).
pub(crate) type PipeCredit = Option<Arc<Semaphore>>;

pub(crate) fn pipe_credit(sndhwm: usize) -> PipeCredit {
  (sndhwm > 0).then(|| Arc::new(Semaphore::new(sndhwm.min(Semaphore::MAX_PERMITS))))
}

/// The writing end of a pipe: the peer's inbound queue plus this direction's
/// SNDHWM budget.
#[derive(Debug, Clone)]
pub(crate) struct PipeWriter {
  tx: PipeSender,
  credit: PipeCredit,
}

impl PipeWriter {
  pub fn new(tx: PipeSender, credit: PipeCredit) -> Self {
    Self { tx, credit }
  }

  /// Hands a message to the peer. Waits for send credit, then for room in the
  /// peer's inbound queue. Gives the message back if the peer has gone away.
  pub async fn send(&self, mut msg: InboundMsg) -> Result<(), InboundMsg> {
    if self.tx.is_closed() {
      return Err(msg);
    }
    if let Some(credit) = &self.credit {
      // The receiving socket closes the semaphore when it shuts down.
      match credit.clone().acquire_owned().await {
        Ok(permit) => msg.credit = Some(permit),
        Err(_) => return Err(msg),
      }
    }
    self.tx.send(msg).await.map_err(|async_channel::SendError(mut returned)| {
      returned.credit = None;
      returned
    })
  }
}
