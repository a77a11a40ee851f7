// src/proxy/capture.rs

use std::time::Duration;

use crate::error::{ProxyError, ZmqError};
use crate::message::Msg;
use crate::proxy::stats::ProxyStats;
use crate::proxy::Endpoint;

/// What a proxy session does when writing to the capture sink fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CapturePolicy {
  /// Log at warn, count the failure in `ProxyStatistics::capture_errors` and
  /// keep relaying.
  #[default]
  LogAndContinue,
  /// End the session with `ProxyError::Capture`.
  Escalate,
}

/// Mirrors relayed frames into the optional capture endpoint.
pub(crate) struct CaptureSink<'a> {
  endpoint: Option<&'a dyn Endpoint>,
  policy: CapturePolicy,
  /// Longest a capture write may wait for the sink. Zero means the write must
  /// complete without waiting.
  timeout: Duration,
  stats: &'a ProxyStats,
  /// Set after a failed non-final frame; the rest of that message is not captured.
  skipping: bool,
}

impl<'a> CaptureSink<'a> {
  pub fn new(
    endpoint: Option<&'a dyn Endpoint>,
    policy: CapturePolicy,
    timeout: Duration,
    stats: &'a ProxyStats,
  ) -> Self {
    Self {
      endpoint,
      policy,
      timeout,
      stats,
      skipping: false,
    }
  }

  pub fn is_active(&self) -> bool {
    self.endpoint.is_some()
  }

  /// Writes a copy of one relayed frame, MORE flag included.
  ///
  /// A sink that cannot take the frame within the capture timeout (no
  /// consumer, or at its high water mark) counts as a failed write.
  pub async fn mirror(&mut self, frame: Msg) -> Result<(), ProxyError> {
    let Some(endpoint) = self.endpoint else {
      return Ok(());
    };
    let more = frame.is_more();
    if self.skipping {
      self.skipping = more;
      return Ok(());
    }
    // Unconstrained so a spent task budget is not mistaken for a full sink.
    let write = tokio::task::unconstrained(endpoint.send(frame));
    let outcome = tokio::time::timeout(self.timeout, write)
      .await
      .unwrap_or(Err(ZmqError::Timeout));
    match outcome {
      Ok(()) => Ok(()),
      Err(e) => match self.policy {
        CapturePolicy::Escalate => {
          tracing::error!(capture = endpoint.id(), error = %e, "Capture sink failed");
          Err(ProxyError::Capture(e))
        }
        CapturePolicy::LogAndContinue => {
          tracing::warn!(capture = endpoint.id(), error = %e, "Capture sink failed, continuing without this frame");
          self.stats.record_capture_error();
          self.skipping = more;
          Ok(())
        }
      },
    }
  }
}
