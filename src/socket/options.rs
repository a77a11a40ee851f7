// src/socket/options.rs

use std::time::Duration;

use crate::{Blob, ZmqError};

// Use values consistent with libzmq where possible
pub const ROUTING_ID: i32 = 5; // Often called ZMQ_IDENTITY
pub const RCVMORE: i32 = 13; // Read-only
pub const TYPE: i32 = 16; // Read-only
pub const LINGER: i32 = 17;
pub const SNDHWM: i32 = 23;
pub const RCVHWM: i32 = 24;
pub const RCVTIMEO: i32 = 27;
pub const SNDTIMEO: i32 = 28;
pub const ROUTER_MANDATORY: i32 = 33;

/// Default high water mark, matching libzmq.
pub const DEFAULT_HWM: usize = 1000;

/// Holds parsed and validated socket options.
#[derive(Debug, Clone)]
pub(crate) struct SocketOptions {
  // High Water Marks. RCVHWM sizes the inbound queue; 0 means unbounded.
  pub rcvhwm: usize,
  pub sndhwm: usize,
  // Timeouts: None = -1 (infinite), Some(ZERO) = 0 (immediate), Some(>0) = timeout
  pub rcvtimeo: Option<Duration>,
  pub sndtimeo: Option<Duration>,
  pub linger: Option<Duration>,
  /// Identity presented to ROUTER peers.
  pub routing_id: Option<Blob>,
  /// ROUTER behavior when routing ID is unknown.
  /// Default false (drop message). True = return EHOSTUNREACH.
  pub router_mandatory: bool,
}

impl Default for SocketOptions {
  fn default() -> Self {
    Self {
      rcvhwm: DEFAULT_HWM,
      sndhwm: DEFAULT_HWM,
      rcvtimeo: None,
      sndtimeo: None,
      linger: Some(Duration::ZERO),
      routing_id: None,
      router_mandatory: false,
    }
  }
}

// --- Helper functions for parsing option values ---

/// Parses a byte slice representing an integer option (like HWM, linger).
pub(crate) fn parse_i32_option(value: &[u8], option_id: i32) -> Result<i32, ZmqError> {
  let arr: [u8; 4] = value.try_into().map_err(|_| ZmqError::InvalidOptionValue(option_id))?;
  Ok(i32::from_ne_bytes(arr)) // Native endianness, as with the ZMQ C API
}

/// Parses a byte slice representing a boolean option (0 or 1).
pub(crate) fn parse_bool_option(value: &[u8], option_id: i32) -> Result<bool, ZmqError> {
  match parse_i32_option(value, option_id)? {
    0 => Ok(false),
    1 => Ok(true),
    _ => Err(ZmqError::InvalidOptionValue(option_id)),
  }
}

/// Parses a high water mark. 0 means "no limit".
pub(crate) fn parse_hwm_option(value: &[u8], option_id: i32) -> Result<usize, ZmqError> {
  let val = parse_i32_option(value, option_id)?;
  usize::try_from(val).map_err(|_| ZmqError::InvalidOptionValue(option_id))
}

/// Parses a timeout value in milliseconds.
/// Maps to Option<Duration>: None=-1, Some(ZERO)=0, Some(>0)=millis.
pub(crate) fn parse_timeout_option(value: &[u8], option_id: i32) -> Result<Option<Duration>, ZmqError> {
  match parse_i32_option(value, option_id)? {
    -1 => Ok(None),
    val @ 0.. => Ok(Some(Duration::from_millis(val as u64))),
    _ => Err(ZmqError::InvalidOptionValue(option_id)),
  }
}

/// Parses a byte slice into a Blob (for ROUTING_ID).
/// Identities are 1..=255 bytes; a leading zero byte is reserved for generated ids.
pub(crate) fn parse_blob_option(value: &[u8]) -> Result<Blob, ZmqError> {
  match value.first() {
    Some(0) | None => Err(ZmqError::InvalidOptionValue(ROUTING_ID)),
    Some(_) if value.len() > 255 => Err(ZmqError::InvalidOptionValue(ROUTING_ID)),
    Some(_) => Ok(Blob::from(value.to_vec())),
  }
}

/// Encodes an integer option value the way `get_option` returns it.
pub(crate) fn encode_i32_option(value: i32) -> Vec<u8> {
  value.to_ne_bytes().to_vec()
}

/// Encodes an optional timeout as milliseconds, -1 meaning infinite.
pub(crate) fn encode_timeout_option(value: Option<Duration>) -> Vec<u8> {
  let ms = value.map_or(-1, |d| i32::try_from(d.as_millis()).unwrap_or(i32::MAX));
  encode_i32_option(ms)
}

/// Encodes a high water mark, clamping values beyond `i32::MAX`.
pub(crate) fn encode_hwm_option(value: usize) -> Vec<u8> {
  encode_i32_option(i32::try_from(value).unwrap_or(i32::MAX))
}
