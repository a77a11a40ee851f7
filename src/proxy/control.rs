// src/proxy/control.rs

/// Commands accepted on a steerable proxy's control endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
  Pause,
  Resume,
  Terminate,
  Statistics,
}

impl ControlCommand {
  /// Parses the first frame of a control message. Matching is exact.
  pub fn parse(frame: &[u8]) -> Option<Self> {
    match frame {
      b"PAUSE" => Some(ControlCommand::Pause),
      b"RESUME" => Some(ControlCommand::Resume),
      b"TERMINATE" => Some(ControlCommand::Terminate),
      b"STATISTICS" => Some(ControlCommand::Statistics),
      _ => None,
    }
  }

  pub fn as_bytes(self) -> &'static [u8] {
    match self {
      ControlCommand::Pause => b"PAUSE",
      ControlCommand::Resume => b"RESUME",
      ControlCommand::Terminate => b"TERMINATE",
      ControlCommand::Statistics => b"STATISTICS",
    }
  }
}
