// src/proxy/mod.rs

//! The proxy engine: relays complete messages between a frontend and a
//! backend endpoint, optionally mirroring them into a capture sink and
//! obeying commands from a control endpoint.

pub mod capture;
pub mod control;
pub mod endpoint;
pub mod poll;
pub mod stats;

pub use capture::CapturePolicy;
pub use control::ControlCommand;
pub use endpoint::Endpoint;
pub use poll::{poll, PollEvents, PollItem};
pub use stats::{ProxyStatistics, ProxyStats, SideStatistics};

use crate::error::{ProxyError, ZmqError};
use crate::message::Msg;
use capture::CaptureSink;
use stats::Side;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default upper bound on a single readiness wait.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Session settings for a `Proxy`.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
  /// Longest single poll wait. `None` blocks until an endpoint is ready.
  pub poll_interval: Option<Duration>,
  pub capture_policy: CapturePolicy,
  /// Longest a capture write may wait for the sink before it counts as
  /// failed. The default of zero never lets capture hold up relaying.
  pub capture_timeout: Duration,
  /// When cancelled the session ends with `Ok(())`.
  pub cancel: Option<CancellationToken>,
}

impl Default for ProxyConfig {
  fn default() -> Self {
    Self {
      poll_interval: Some(DEFAULT_POLL_INTERVAL),
      capture_policy: CapturePolicy::default(),
      capture_timeout: Duration::ZERO,
      cancel: None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelayState {
  Active,
  Paused,
}

/// Builder and runner for one proxy session over borrowed endpoints.
pub struct Proxy<'a> {
  frontend: &'a dyn Endpoint,
  backend: &'a dyn Endpoint,
  capture: Option<&'a dyn Endpoint>,
  control: Option<&'a dyn Endpoint>,
  config: ProxyConfig,
  stats: Arc<ProxyStats>,
}

impl<'a> Proxy<'a> {
  pub fn new(frontend: &'a dyn Endpoint, backend: &'a dyn Endpoint) -> Self {
    Self {
      frontend,
      backend,
      capture: None,
      control: None,
      config: ProxyConfig::default(),
      stats: Arc::new(ProxyStats::new()),
    }
  }

  /// Mirrors every relayed frame into `sink`.
  pub fn capture(mut self, sink: &'a dyn Endpoint) -> Self {
    self.capture = Some(sink);
    self
  }

  /// Accepts PAUSE, RESUME, TERMINATE and STATISTICS commands on `control`.
  pub fn control(mut self, control: &'a dyn Endpoint) -> Self {
    self.control = Some(control);
    self
  }

  pub fn with_config(mut self, config: ProxyConfig) -> Self {
    self.config = config;
    self
  }

  pub fn capture_policy(mut self, policy: CapturePolicy) -> Self {
    self.config.capture_policy = policy;
    self
  }

  pub fn capture_timeout(mut self, timeout: Duration) -> Self {
    self.config.capture_timeout = timeout;
    self
  }

  pub fn poll_interval(mut self, interval: Option<Duration>) -> Self {
    self.config.poll_interval = interval;
    self
  }

  pub fn cancel_token(mut self, token: CancellationToken) -> Self {
    self.config.cancel = Some(token);
    self
  }

  /// Shared counters of this session, readable while it runs.
  pub fn stats(&self) -> Arc<ProxyStats> {
    self.stats.clone()
  }

  /// Relays until an endpoint fails, the session is cancelled or a
  /// TERMINATE command arrives.
  pub async fn run(self) -> Result<(), ProxyError> {
    let Proxy {
      frontend,
      backend,
      capture,
      control,
      config,
      stats,
    } = self;
    let cancel = config.cancel.unwrap_or_default();
    let mut capture = CaptureSink::new(capture, config.capture_policy, config.capture_timeout, &stats);
    let mut state = RelayState::Active;

    tracing::info!(
      frontend = frontend.id(),
      backend = backend.id(),
      capture = capture.is_active(),
      steerable = control.is_some(),
      "Proxy session started"
    );

    loop {
      if cancel.is_cancelled() {
        tracing::info!("Proxy session cancelled");
        return Ok(());
      }

      let mut items = Vec::with_capacity(3);
      let relay_slots = (state == RelayState::Active).then(|| {
        items.push(PollItem::readable(frontend));
        items.push(PollItem::readable(backend));
        (0, 1)
      });
      let control_slot = control.map(|c| {
        items.push(PollItem::readable(c));
        items.len() - 1
      });

      let ready = tokio::select! {
        _ = cancel.cancelled() => {
          tracing::info!("Proxy session cancelled");
          return Ok(());
        }
        res = poll(&mut items, config.poll_interval) => res.map_err(ProxyError::Poll)?,
      };
      if ready == 0 {
        continue;
      }

      if let (Some(slot), Some(control)) = (control_slot, control) {
        if let Some(e) = items[slot].take_error() {
          return Err(ProxyError::Control(e));
        }
        if items[slot].is_readable() {
          let Some(command) = unless_cancelled(&cancel, handle_control(control, &stats)).await else {
            return Ok(());
          };
          match command? {
            Some(ControlCommand::Terminate) => {
              tracing::info!("Proxy session terminated by control command");
              return Ok(());
            }
            Some(ControlCommand::Pause) => state = RelayState::Paused,
            Some(ControlCommand::Resume) => state = RelayState::Active,
            Some(ControlCommand::Statistics) | None => {}
          }
        }
      }

      let Some((front_slot, back_slot)) = relay_slots else {
        continue;
      };
      if let Some(e) = items[front_slot].take_error() {
        return Err(side_error(Side::Frontend, e));
      }
      if let Some(e) = items[back_slot].take_error() {
        return Err(side_error(Side::Backend, e));
      }
      if items[front_slot].is_readable() {
        let relay = forward_one(Side::Frontend, frontend, backend, &mut capture, &stats);
        let Some(res) = unless_cancelled(&cancel, relay).await else {
          return Ok(());
        };
        res?;
      }
      if items[back_slot].is_readable() {
        let relay = forward_one(Side::Backend, backend, frontend, &mut capture, &stats);
        let Some(res) = unless_cancelled(&cancel, relay).await else {
          return Ok(());
        };
        res?;
      }
    }
  }
}

/// Runs `work` unless the session is cancelled first. A message cut off
/// mid-relay by cancellation is lost.
async fn unless_cancelled<T>(cancel: &CancellationToken, work: impl Future<Output = T>) -> Option<T> {
  tokio::select! {
    _ = cancel.cancelled() => {
      tracing::info!("Proxy session cancelled");
      None
    }
    out = work => Some(out),
  }
}

fn side_error(side: Side, e: ZmqError) -> ProxyError {
  match side {
    Side::Frontend => ProxyError::Frontend(e),
    Side::Backend => ProxyError::Backend(e),
  }
}

/// Moves exactly one complete message from `from` to `to`, frame by frame,
/// mirroring each frame into capture after it reached the destination.
async fn forward_one(
  side: Side,
  from: &dyn Endpoint,
  to: &dyn Endpoint,
  capture: &mut CaptureSink<'_>,
  stats: &ProxyStats,
) -> Result<(), ProxyError> {
  let mut bytes = 0u64;
  let mut frames = 0usize;
  loop {
    let frame = from.recv().await.map_err(|e| side_error(side, e))?;
    let more = frame.is_more();
    bytes += frame.size() as u64;
    frames += 1;
    let copy = capture.is_active().then(|| frame.clone());
    to.send(frame).await.map_err(|e| side_error(side.opposite(), e))?;
    if let Some(copy) = copy {
      capture.mirror(copy).await?;
    }
    if !more {
      break;
    }
  }
  stats.record_relay(side, bytes);
  tracing::trace!(from = ?side, frames, bytes, "Relayed message");
  Ok(())
}

/// Reads one control message and acts on it. Returns the parsed command.
async fn handle_control(control: &dyn Endpoint, stats: &ProxyStats) -> Result<Option<ControlCommand>, ProxyError> {
  let mut first: Option<Msg> = None;
  loop {
    let frame = control.recv().await.map_err(ProxyError::Control)?;
    let more = frame.is_more();
    if first.is_none() {
      first = Some(frame);
    }
    if !more {
      break;
    }
  }
  let command = first.as_ref().and_then(|f| ControlCommand::parse(f.data().unwrap_or(&[])));
  match command {
    Some(ControlCommand::Statistics) => {
      for frame in stats.snapshot().to_frames() {
        control.send(frame).await.map_err(ProxyError::Control)?;
      }
      tracing::debug!("Sent proxy statistics");
    }
    Some(cmd) => tracing::debug!(command = ?cmd, "Proxy control command"),
    None => {
      let raw = first.as_ref().and_then(Msg::data).unwrap_or(&[]);
      tracing::warn!(command = %String::from_utf8_lossy(raw), "Ignoring unknown proxy control command");
    }
  }
  Ok(command)
}

/// Relays between `frontend` and `backend` until either fails, mirroring
/// traffic into `capture` when given. Uses the default `ProxyConfig`.
pub async fn proxy(
  frontend: &dyn Endpoint,
  backend: &dyn Endpoint,
  capture: Option<&dyn Endpoint>,
) -> Result<(), ProxyError> {
  let mut session = Proxy::new(frontend, backend);
  if let Some(sink) = capture {
    session = session.capture(sink);
  }
  session.run().await
}

/// Like `proxy`, additionally obeying commands received on `control`.
pub async fn proxy_steerable(
  frontend: &dyn Endpoint,
  backend: &dyn Endpoint,
  capture: Option<&dyn Endpoint>,
  control: &dyn Endpoint,
) -> Result<(), ProxyError> {
  let mut session = Proxy::new(frontend, backend).control(control);
  if let Some(sink) = capture {
    session = session.capture(sink);
  }
  session.run().await
}
