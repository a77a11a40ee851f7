// tests/common.rs
#![allow(dead_code)] // Not every test binary uses every helper

use rzmq_proxy::{Context, Msg, Socket, ZmqError};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;
use std::time::Duration;

use tokio::time::timeout;

static INPROC_ENDPOINT_COUNTER: AtomicUsize = AtomicUsize::new(0);

static TRACING_INIT: Once = Once::new();

// Can be overridden by RUST_LOG env variable
fn setup_tracing() {
  TRACING_INIT.call_once(|| {
    let default_filter = "rzmq_proxy=debug,warn";
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = FmtSubscriber::builder()
      .with_env_filter(env_filter)
      .with_target(true)
      .with_line_number(true)
      .with_test_writer()
      .finish();

    // Another test binary thread may have won the race; that is fine.
    let _ = tracing::subscriber::set_global_default(subscriber);
  });
}

pub fn test_context() -> Context {
  setup_tracing();
  Context::new().expect("Failed to create test context")
}

pub fn unique_inproc_endpoint() -> String {
  let pid = std::process::id();
  let count = INPROC_ENDPOINT_COUNTER.fetch_add(1, Ordering::Relaxed);
  format!("inproc://rzmq_proxy_test_{}_{}", pid, count)
}

pub async fn recv_timeout(socket: &Socket, duration: Duration) -> Result<Msg, ZmqError> {
  match timeout(duration, socket.recv()).await {
    Ok(res) => res,
    Err(_) => Err(ZmqError::Timeout),
  }
}

pub async fn recv_multipart_timeout(socket: &Socket, duration: Duration) -> Result<Vec<Msg>, ZmqError> {
  match timeout(duration, socket.recv_multipart()).await {
    Ok(res) => res,
    Err(_) => Err(ZmqError::Timeout),
  }
}

/// Payloads of a multipart message as owned byte vectors.
pub fn payloads(frames: &[Msg]) -> Vec<Vec<u8>> {
  frames.iter().map(|f| f.data().unwrap_or(&[]).to_vec()).collect()
}

pub fn frames(parts: &[&'static [u8]]) -> Vec<Msg> {
  parts.iter().map(|p| Msg::from_static(p)).collect()
}
