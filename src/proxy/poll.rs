// src/proxy/poll.rs

use crate::error::ZmqError;
use crate::proxy::Endpoint;

use bitflags::bitflags;
use futures::future::{select_all, BoxFuture, FutureExt};
use std::fmt;
use std::time::Duration;

bitflags! {
  /// Readiness events requested from, and reported by, `poll`.
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
  pub struct PollEvents: u8 {
    /// At least one frame can be received without waiting.
    const POLLIN = 0b0000_0001;
    /// The endpoint failed while being waited on. Reported only.
    const POLLERR = 0b0000_0100;
  }
}

/// One endpoint in a poll set.
pub struct PollItem<'a> {
  endpoint: &'a dyn Endpoint,
  events: PollEvents,
  revents: PollEvents,
  error: Option<ZmqError>,
}

impl<'a> PollItem<'a> {
  pub fn new(endpoint: &'a dyn Endpoint, events: PollEvents) -> Self {
    Self {
      endpoint,
      events,
      revents: PollEvents::empty(),
      error: None,
    }
  }

  /// Shorthand for a `POLLIN` item.
  pub fn readable(endpoint: &'a dyn Endpoint) -> Self {
    Self::new(endpoint, PollEvents::POLLIN)
  }

  pub fn endpoint(&self) -> &'a dyn Endpoint {
    self.endpoint
  }

  /// Events reported by the last `poll`.
  pub fn revents(&self) -> PollEvents {
    self.revents
  }

  pub fn is_readable(&self) -> bool {
    self.revents.contains(PollEvents::POLLIN)
  }

  pub fn has_error(&self) -> bool {
    self.revents.contains(PollEvents::POLLERR)
  }

  /// Takes the error behind a `POLLERR` event.
  pub fn take_error(&mut self) -> Option<ZmqError> {
    self.error.take()
  }

  fn reset(&mut self) {
    self.revents = PollEvents::empty();
    self.error = None;
  }

  fn wants_input(&self) -> bool {
    self.events.contains(PollEvents::POLLIN)
  }

  fn scan(&mut self) -> bool {
    if self.wants_input() && !self.has_error() && self.endpoint.has_frame() {
      self.revents.insert(PollEvents::POLLIN);
    }
    !self.revents.is_empty()
  }
}

impl fmt::Debug for PollItem<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PollItem")
      .field("endpoint", &self.endpoint.id())
      .field("events", &self.events)
      .field("revents", &self.revents)
      .field("error", &self.error)
      .finish()
  }
}

/// Waits until at least one item has an event or `timeout` elapses.
///
/// Returns the number of items with events (0 on timeout). `None` waits
/// indefinitely and `Some(Duration::ZERO)` never waits. An endpoint whose
/// `readable` fails is reported with `POLLERR` and its error kept on the item.
pub async fn poll(items: &mut [PollItem<'_>], timeout: Option<Duration>) -> Result<usize, ZmqError> {
  if !items.iter().any(PollItem::wants_input) {
    return Err(ZmqError::InvalidArgument("poll requires at least one item with events".into()));
  }
  for item in items.iter_mut() {
    item.reset();
  }

  let ready = scan_all(items);
  if ready > 0 || timeout == Some(Duration::ZERO) {
    return Ok(ready);
  }

  let waiters: Vec<BoxFuture<'_, (usize, Result<(), ZmqError>)>> = items
    .iter()
    .enumerate()
    .filter(|(_, item)| item.wants_input())
    .map(|(idx, item)| {
      let endpoint = item.endpoint;
      async move { (idx, endpoint.readable().await) }.boxed()
    })
    .collect();

  let first = match timeout {
    None => Some(select_all(waiters).await.0),
    Some(limit) => tokio::time::timeout(limit, select_all(waiters)).await.ok().map(|(out, ..)| out),
  };
  let Some((idx, outcome)) = first else {
    return Ok(0);
  };

  if let Err(e) = outcome {
    tracing::debug!(endpoint = items[idx].endpoint.id(), error = %e, "Poll item failed");
    items[idx].revents.insert(PollEvents::POLLERR);
    items[idx].error = Some(e);
  }
  // The woken endpoint has staged its frame, so the scan reports it too.
  Ok(scan_all(items))
}

fn scan_all(items: &mut [PollItem<'_>]) -> usize {
  items.iter_mut().map(PollItem::scan).filter(|ready| *ready).count()
}
