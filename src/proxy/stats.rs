// src/proxy/stats.rs

use crate::message::Msg;

use std::sync::atomic::{AtomicU64, Ordering};

/// Which side of the proxy a message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
  Frontend,
  Backend,
}

impl Side {
  pub fn opposite(self) -> Side {
    match self {
      Side::Frontend => Side::Backend,
      Side::Backend => Side::Frontend,
    }
  }
}

#[derive(Debug, Default)]
struct SideCounters {
  msgs_in: AtomicU64,
  bytes_in: AtomicU64,
  msgs_out: AtomicU64,
  bytes_out: AtomicU64,
}

impl SideCounters {
  fn snapshot(&self) -> SideStatistics {
    SideStatistics {
      msgs_in: self.msgs_in.load(Ordering::Relaxed),
      bytes_in: self.bytes_in.load(Ordering::Relaxed),
      msgs_out: self.msgs_out.load(Ordering::Relaxed),
      bytes_out: self.bytes_out.load(Ordering::Relaxed),
    }
  }
}

/// Live relay counters of one proxy session, shared with observers.
#[derive(Debug, Default)]
pub struct ProxyStats {
  frontend: SideCounters,
  backend: SideCounters,
  capture_errors: AtomicU64,
}

impl ProxyStats {
  pub fn new() -> Self {
    Self::default()
  }

  fn side(&self, side: Side) -> &SideCounters {
    match side {
      Side::Frontend => &self.frontend,
      Side::Backend => &self.backend,
    }
  }

  /// Records one message of `bytes` received from `from` and sent to the other side.
  pub(crate) fn record_relay(&self, from: Side, bytes: u64) {
    let src = self.side(from);
    src.msgs_in.fetch_add(1, Ordering::Relaxed);
    src.bytes_in.fetch_add(bytes, Ordering::Relaxed);
    let dst = self.side(from.opposite());
    dst.msgs_out.fetch_add(1, Ordering::Relaxed);
    dst.bytes_out.fetch_add(bytes, Ordering::Relaxed);
  }

  pub(crate) fn record_capture_error(&self) {
    self.capture_errors.fetch_add(1, Ordering::Relaxed);
  }

  /// A consistent-enough copy of the counters. Individual fields are read
  /// independently while the session may still be relaying.
  pub fn snapshot(&self) -> ProxyStatistics {
    ProxyStatistics {
      frontend: self.frontend.snapshot(),
      backend: self.backend.snapshot(),
      capture_errors: self.capture_errors.load(Ordering::Relaxed),
    }
  }
}

/// Counters for one side. "In" is traffic received from that side, "out" is
/// traffic sent to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SideStatistics {
  pub msgs_in: u64,
  pub bytes_in: u64,
  pub msgs_out: u64,
  pub bytes_out: u64,
}

/// Point-in-time copy of `ProxyStats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProxyStatistics {
  pub frontend: SideStatistics,
  pub backend: SideStatistics,
  /// Capture failures swallowed under `CapturePolicy::LogAndContinue`.
  pub capture_errors: u64,
}

impl ProxyStatistics {
  /// The eight-frame STATISTICS reply: frontend then backend, each as
  /// messages in, bytes in, messages out, bytes out, encoded as u64 little-endian.
  pub fn to_frames(&self) -> Vec<Msg> {
    let values = [
      self.frontend.msgs_in,
      self.frontend.bytes_in,
      self.frontend.msgs_out,
      self.frontend.bytes_out,
      self.backend.msgs_in,
      self.backend.bytes_in,
      self.backend.msgs_out,
      self.backend.bytes_out,
    ];
    let last = values.len() - 1;
    values
      .iter()
      .enumerate()
      .map(|(i, v)| {
        let mut frame = Msg::from_vec(v.to_le_bytes().to_vec());
        frame.set_more(i < last);
        frame
      })
      .collect()
  }

  /// Decodes a STATISTICS reply. `None` unless it has exactly eight 8-byte frames.
  pub fn from_frames(frames: &[Msg]) -> Option<Self> {
    if frames.len() != 8 {
      return None;
    }
    let mut values = [0u64; 8];
    for (slot, frame) in values.iter_mut().zip(frames) {
      let bytes: [u8; 8] = frame.data()?.try_into().ok()?;
      *slot = u64::from_le_bytes(bytes);
    }
    let side = |v: &[u64]| SideStatistics {
      msgs_in: v[0],
      bytes_in: v[1],
      msgs_out: v[2],
      bytes_out: v[3],
    };
    Some(Self {
      frontend: side(&values[..4]),
      backend: side(&values[4..]),
      capture_errors: 0,
    })
  }
}
