// src/transport/inproc.rs

use std::sync::Arc;

use crate::context::InprocBinding;
use crate::error::ZmqError;
use crate::runtime::{pipe_credit, PipeWriter};
use crate::socket::ISocket;

/// Handles binding an inproc endpoint. Registers with the context.
pub(crate) fn bind_inproc(name: String, socket: &Arc<dyn ISocket>) -> Result<(), ZmqError> {
  let core = socket.core();
  core.ensure_open()?;
  let binding = InprocBinding {
    handle: core.handle,
    socket: Arc::downgrade(socket),
  };
  core.context.inner().register_inproc(name.clone(), binding)?;
  tracing::debug!(handle = core.handle, name = %name, "Bound inproc endpoint");
  core.register_bound_name(name);
  Ok(())
}

/// Handles connecting to an inproc endpoint: looks up the binder and attaches
/// a pipe on both sides, each carrying the other's routing id.
pub(crate) fn connect_inproc(name: String, socket: &Arc<dyn ISocket>) -> Result<(), ZmqError> {
  let connector = socket.core();
  connector.ensure_open()?;
  let uri = format!("inproc://{}", name);
  tracing::debug!(handle = connector.handle, name = %name, "Attempting inproc connect");

  let binder_socket = match connector.context.inner().lookup_inproc(&name) {
    Some(s) if !s.core().is_closed() => s,
    _ => {
      tracing::warn!(handle = connector.handle, name = %name, "Inproc lookup failed: Name not bound");
      return Err(ZmqError::ConnectionRefused(uri));
    }
  };
  let binder = binder_socket.core();

  if binder.handle == connector.handle {
    return Err(ZmqError::InvalidArgument(format!(
      "Socket cannot connect to its own endpoint {}",
      uri
    )));
  }
  if !connector.socket_type.is_compatible(binder.socket_type) {
    tracing::warn!(
      connector = %connector.socket_type,
      binder = %binder.socket_type,
      "Incompatible socket types"
    );
    return Err(ZmqError::InvalidSocketType("Peer socket type is incompatible"));
  }
  for side in [connector, binder] {
    if side.socket_type.max_peers().is_some_and(|max| side.peer_count() >= max) {
      return Err(ZmqError::ConnectionRefused(uri));
    }
  }

  let pipe_id = connector.context.inner().next_handle();
  let connector_id = connector.options.read().routing_id.clone();
  let binder_id = binder.options.read().routing_id.clone();

  // Each direction's in-flight budget is the writing side's SNDHWM.
  let to_binder = pipe_credit(connector.options.read().sndhwm);
  let to_connector = pipe_credit(binder.options.read().sndhwm);

  binder.attach_peer(
    binder_socket.as_ref(),
    pipe_id,
    PipeWriter::new(connector.inbound_sender(), to_connector.clone()),
    to_binder.clone(),
    connector_id.as_ref(),
  );
  connector.attach_peer(
    socket.as_ref(),
    pipe_id,
    PipeWriter::new(binder.inbound_sender(), to_binder),
    to_connector,
    binder_id.as_ref(),
  );

  tracing::debug!(
    connector = connector.handle,
    binder = binder.handle,
    pipe_id,
    name = %name,
    "Inproc pipe established"
  );
  Ok(())
}
