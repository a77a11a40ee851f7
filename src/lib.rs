//! rzmq_proxy - An asynchronous ZeroMQ-style message proxy on Tokio.
//!
//! Provides in-process sockets (`PAIR`, `REQ`, `REP`, `DEALER`, `ROUTER`,
//! `PUSH`, `PULL`), a readiness `poll` primitive and the proxy engine that
//! relays messages between a frontend and a backend, optionally mirroring
//! traffic into a capture sink and obeying a control endpoint.

pub mod context;
pub mod error;
pub mod message;
pub mod proxy;
pub(crate) mod runtime;
pub mod socket;
pub(crate) mod transport;

// Re-export core types for user convenience
pub use context::{context, Context};
pub use error::{ProxyError, ZmqError};
pub use message::{Blob, Msg, MsgFlags};
pub use proxy::{
  poll, proxy, proxy_steerable, CapturePolicy, ControlCommand, Endpoint, PollEvents, PollItem, Proxy, ProxyConfig,
  ProxyStatistics, ProxyStats, SideStatistics,
};
pub use socket::{Socket, SocketType};

// --- Top-Level Functions ---

const VERSION_MAJOR: i32 = 0;
const VERSION_MINOR: i32 = 1;
const VERSION_PATCH: i32 = 0;

/// Returns the library version as a tuple (major, minor, patch).
pub fn version() -> (i32, i32, i32) {
  (VERSION_MAJOR, VERSION_MINOR, VERSION_PATCH)
}

/// Returns the major version number of the library.
pub fn version_major() -> i32 {
  VERSION_MAJOR
}

/// Returns the minor version number of the library.
pub fn version_minor() -> i32 {
  VERSION_MINOR
}

/// Returns the patch version number of the library.
pub fn version_patch() -> i32 {
  VERSION_PATCH
}

static_assertions::assert_impl_all!(Socket: Send, Sync, Clone);
static_assertions::assert_impl_all!(Context: Send, Sync, Clone);
static_assertions::assert_impl_all!(ProxyStats: Send, Sync);
static_assertions::assert_obj_safe!(Endpoint);
