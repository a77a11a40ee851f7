// src/context.rs

use crate::error::ZmqError;
use crate::socket::{self, ISocket, Socket, SocketType};

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

/// Information stored in the inproc registry for a bound endpoint.
#[derive(Clone)]
pub(crate) struct InprocBinding {
  /// Handle of the socket that bound the name.
  pub(crate) handle: usize,
  pub(crate) socket: Weak<dyn ISocket>,
}

impl fmt::Debug for InprocBinding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("InprocBinding").field("handle", &self.handle).finish()
  }
}

/// Holds the internal state shared by multiple Context handles.
pub(crate) struct ContextInner {
  /// Next available unique handle ID for sockets and pipes.
  next_handle: AtomicUsize,
  /// Live sockets created by this context. Weak so that dropping every
  /// `Socket` handle frees the socket.
  sockets: RwLock<HashMap<usize, Weak<dyn ISocket>>>,
  /// Registry for in-process bindings. Key is the inproc address name.
  inproc_registry: RwLock<HashMap<String, InprocBinding>>,
  terminated: AtomicBool,
}

impl ContextInner {
  fn new() -> Self {
    Self {
      next_handle: AtomicUsize::new(1),
      sockets: RwLock::new(HashMap::new()),
      inproc_registry: RwLock::new(HashMap::new()),
      terminated: AtomicBool::new(false),
    }
  }

  /// Generates the next unique handle ID.
  pub(crate) fn next_handle(&self) -> usize {
    // Relaxed ordering is sufficient for a simple counter
    self.next_handle.fetch_add(1, Ordering::Relaxed)
  }

  pub(crate) fn is_terminated(&self) -> bool {
    self.terminated.load(Ordering::Acquire)
  }

  fn register_socket(&self, handle: usize, socket: &Arc<dyn ISocket>) {
    self.sockets.write().insert(handle, Arc::downgrade(socket));
    tracing::debug!(socket_handle = handle, "Socket registered");
  }

  /// Unregisters a socket, typically when it closes.
  pub(crate) fn unregister_socket(&self, handle: usize) {
    if self.sockets.write().remove(&handle).is_some() {
      tracing::debug!(socket_handle = handle, "Socket unregistered");
    }
  }

  pub(crate) fn register_inproc(&self, name: String, binding: InprocBinding) -> Result<(), ZmqError> {
    let mut registry = self.inproc_registry.write();
    // A binding whose socket was dropped without close() no longer holds the name.
    if let Some(existing) = registry.get(&name) {
      if existing.socket.strong_count() > 0 {
        return Err(ZmqError::AddrInUse(format!("inproc://{}", name)));
      }
    }
    tracing::debug!(inproc_name = %name, handle = binding.handle, "Registering inproc binding");
    registry.insert(name, binding);
    Ok(())
  }

  /// Removes a binding, but only if it still belongs to `handle`.
  pub(crate) fn unregister_inproc(&self, name: &str, handle: usize) {
    let mut registry = self.inproc_registry.write();
    if registry.get(name).is_some_and(|b| b.handle == handle) {
      registry.remove(name);
      tracing::debug!(inproc_name = %name, handle, "Unregistered inproc binding");
    }
  }

  /// The live socket bound to `name`, if any.
  pub(crate) fn lookup_inproc(&self, name: &str) -> Option<Arc<dyn ISocket>> {
    self.inproc_registry.read().get(name)?.socket.upgrade()
  }

  /// Closes every socket created by this context. Idempotent.
  fn shutdown(&self) {
    if self.terminated.swap(true, Ordering::AcqRel) {
      tracing::debug!("Context shutdown already initiated.");
      return;
    }
    let live: Vec<Arc<dyn ISocket>> = self.sockets.read().values().filter_map(Weak::upgrade).collect();
    tracing::info!(sockets = live.len(), "Context shutdown initiated.");
    for socket in live {
      socket.core().close();
    }
    self.sockets.write().clear();
    self.inproc_registry.write().clear();
  }
}

impl fmt::Debug for ContextInner {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ContextInner")
      .field("sockets", &self.sockets.read().len())
      .field("inproc_bindings", &self.inproc_registry.read().len())
      .field("terminated", &self.is_terminated())
      .finish()
  }
}

/// A handle to a context, which owns the inproc namespace shared by its sockets.
/// Contexts are cloneable and thread-safe.
#[derive(Clone)]
pub struct Context {
  inner: Arc<ContextInner>,
}

impl Context {
  /// Creates a new, independent context.
  pub fn new() -> Result<Self, ZmqError> {
    tracing::debug!("Creating new Context");
    Ok(Self {
      inner: Arc::new(ContextInner::new()),
    })
  }

  /// Creates a socket of the specified type associated with this context.
  pub fn socket(&self, socket_type: SocketType) -> Result<Socket, ZmqError> {
    if self.inner.is_terminated() {
      return Err(ZmqError::InvalidState("Context has been terminated"));
    }
    let handle = self.inner.next_handle();
    tracing::debug!(socket_type = ?socket_type, handle = handle, "Creating socket");
    let socket_impl = socket::create_socket(handle, self.clone(), socket_type);
    self.inner.register_socket(handle, &socket_impl);
    Ok(Socket::new(socket_impl))
  }

  /// Closes every socket created by this context. Operations pending on those
  /// sockets fail with `SocketClosed`; new sockets can no longer be created.
  pub async fn shutdown(&self) -> Result<(), ZmqError> {
    self.inner.shutdown();
    Ok(())
  }

  /// Shuts down all sockets. Consumes the Context handle.
  pub async fn term(self) -> Result<(), ZmqError> {
    self.inner.shutdown();
    tracing::info!("Context terminated.");
    Ok(())
  }

  pub(crate) fn inner(&self) -> &Arc<ContextInner> {
    &self.inner
  }
}

impl fmt::Debug for Context {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Context").finish_non_exhaustive()
  }
}

/// Creates a new library context.
pub fn context() -> Result<Context, ZmqError> {
  Context::new()
}
