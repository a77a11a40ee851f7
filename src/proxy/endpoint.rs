// src/proxy/endpoint.rs

use crate::error::ZmqError;
use crate::message::Msg;

use async_trait::async_trait;
use std::sync::Arc;

/// The capability set the proxy needs from anything it relays between.
///
/// `Socket` implements it; tests and embedders may provide their own.
#[async_trait]
pub trait Endpoint: Send + Sync {
  /// Stable identity of the endpoint, used to tell poll items apart.
  fn id(&self) -> usize;

  /// Non-blocking readiness check: true if `recv` would return a frame now.
  fn has_frame(&self) -> bool;

  /// Waits until a frame can be received. Must be cancel-safe: dropping the
  /// future before it completes loses no message. An error means the endpoint
  /// is permanently unusable.
  async fn readable(&self) -> Result<(), ZmqError>;

  /// Sends one frame. `MsgFlags::MORE` marks every frame but the last.
  async fn send(&self, msg: Msg) -> Result<(), ZmqError>;

  /// Receives one frame. `MsgFlags::MORE` reports that further frames follow.
  async fn recv(&self) -> Result<Msg, ZmqError>;
}

#[async_trait]
impl<T: Endpoint + ?Sized> Endpoint for Arc<T> {
  fn id(&self) -> usize {
    (**self).id()
  }

  fn has_frame(&self) -> bool {
    (**self).has_frame()
  }

  async fn readable(&self) -> Result<(), ZmqError> {
    (**self).readable().await
  }

  async fn send(&self, msg: Msg) -> Result<(), ZmqError> {
    (**self).send(msg).await
  }

  async fn recv(&self) -> Result<Msg, ZmqError> {
    (**self).recv().await
  }
}
