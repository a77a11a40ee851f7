// src/socket/core.rs

use crate::context::Context;
use crate::error::ZmqError;
use crate::message::{Blob, Msg};
use crate::runtime::{InboundMsg, PipeCredit, PipeSender, PipeWriter};
use crate::socket::options::{
  self, encode_hwm_option, encode_i32_option, encode_timeout_option, parse_blob_option, parse_bool_option,
  parse_hwm_option, parse_timeout_option, SocketOptions,
};
use crate::socket::patterns::{FairQueue, LoadBalancer};
use crate::socket::types::SocketType;
use crate::socket::ISocket;

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Outcome of handing a complete message to one specific peer.
#[derive(Debug)]
pub(crate) enum Delivery {
  Sent,
  /// The peer has gone away; the pipe was detached and the message handed back.
  PeerGone(Vec<Msg>),
}

/// State and plumbing shared by every socket pattern: options, attached pipes,
/// the inbound fair queue, frame staging for receive and frame buffering for send.
///
/// Pattern-specific behavior lives in the `ISocket` implementations, which
/// call back into the core.
#[derive(Debug)]
pub(crate) struct SocketCore {
  pub(crate) handle: usize,
  pub(crate) socket_type: SocketType,
  pub(crate) context: Context,
  pub(crate) options: RwLock<SocketOptions>,
  /// Created on first use so that RCVHWM set before bind/connect sizes it.
  inbound: OnceCell<FairQueue<InboundMsg>>,
  /// Pipe id -> writer into the peer's inbound queue.
  peers: Mutex<HashMap<usize, PipeWriter>>,
  /// SNDHWM budgets of the pipes writing into this socket. Closed on close
  /// so that peers waiting for credit see the pipe as gone.
  inbound_credits: Mutex<HashMap<usize, Arc<Semaphore>>>,
  pub(crate) load_balancer: LoadBalancer,
  /// Frames of the message currently being received, MORE flags already set.
  staged: Mutex<VecDeque<Msg>>,
  /// Frames sent with MORE, held until the final frame completes the message.
  outgoing: Mutex<Vec<Msg>>,
  rcvmore: AtomicBool,
  closed: AtomicBool,
  shutdown: CancellationToken,
  /// Aborts deliveries still in flight at close, once LINGER has run out.
  linger_expired: CancellationToken,
  bound_names: Mutex<Vec<String>>,
}

impl SocketCore {
  pub(crate) fn new(handle: usize, socket_type: SocketType, context: Context) -> Self {
    Self {
      handle,
      socket_type,
      context,
      options: RwLock::new(SocketOptions::default()),
      inbound: OnceCell::new(),
      peers: Mutex::new(HashMap::new()),
      inbound_credits: Mutex::new(HashMap::new()),
      load_balancer: LoadBalancer::new(),
      staged: Mutex::new(VecDeque::new()),
      outgoing: Mutex::new(Vec::new()),
      rcvmore: AtomicBool::new(false),
      closed: AtomicBool::new(false),
      shutdown: CancellationToken::new(),
      linger_expired: CancellationToken::new(),
      bound_names: Mutex::new(Vec::new()),
    }
  }

  fn inbound(&self) -> &FairQueue<InboundMsg> {
    self.inbound.get_or_init(|| {
      let queue = FairQueue::new(self.options.read().rcvhwm);
      tracing::trace!(handle = self.handle, hwm = queue.capacity(), "Inbound queue created");
      queue
    })
  }

  /// Sender a peer uses to push complete messages into this socket.
  pub(crate) fn inbound_sender(&self) -> PipeSender {
    self.inbound().sender()
  }

  pub(crate) fn is_closed(&self) -> bool {
    self.closed.load(Ordering::Acquire)
  }

  pub(crate) fn ensure_open(&self) -> Result<(), ZmqError> {
    if self.is_closed() {
      Err(ZmqError::SocketClosed)
    } else {
      Ok(())
    }
  }

  pub(crate) fn peer_count(&self) -> usize {
    self.peers.lock().len()
  }

  pub(crate) fn register_bound_name(&self, name: String) {
    self.bound_names.lock().push(name);
  }

  // --- Pipe management ---

  pub(crate) fn attach_peer(
    &self,
    logic: &dyn ISocket,
    pipe_id: usize,
    writer: PipeWriter,
    inbound_credit: PipeCredit,
    peer_routing_id: Option<&Blob>,
  ) {
    self.peers.lock().insert(pipe_id, writer);
    if let Some(credit) = inbound_credit {
      self.inbound_credits.lock().insert(pipe_id, credit);
    }
    logic.pipe_attached(pipe_id, peer_routing_id);
    self.load_balancer.add_pipe(pipe_id);
    tracing::debug!(handle = self.handle, pipe_id, socket_type = ?self.socket_type, "Pipe attached");
  }

  fn detach_peer(&self, pipe_id: usize) {
    if self.peers.lock().remove(&pipe_id).is_some() {
      tracing::debug!(handle = self.handle, pipe_id, "Pipe detached (peer gone)");
    }
    self.load_balancer.remove_pipe(pipe_id);
  }

  // --- Receive path ---

  /// Receives the next frame, honoring RCVTIMEO.
  pub(crate) async fn recv_frame(&self, logic: &dyn ISocket) -> Result<Msg, ZmqError> {
    let rcvtimeo = self.options.read().rcvtimeo;
    match rcvtimeo {
      None => self.wait_readable(logic).await?,
      Some(timeout) => tokio::time::timeout(timeout, self.wait_readable(logic))
        .await
        .map_err(|_| ZmqError::Timeout)??,
    }
    let frame = self
      .staged
      .lock()
      .pop_front()
      .ok_or_else(|| ZmqError::Internal("Readable socket had no staged frame".into()))?;
    self.rcvmore.store(frame.is_more(), Ordering::Release);
    Ok(frame)
  }

  /// Waits until a frame can be received without blocking.
  ///
  /// Pulls the next accepted message off the inbound queue and stages it.
  /// Cancel-safe: a message is either still queued or fully staged.
  pub(crate) async fn wait_readable(&self, logic: &dyn ISocket) -> Result<(), ZmqError> {
    loop {
      self.ensure_open()?;
      if !self.staged.lock().is_empty() {
        return Ok(());
      }
      logic.check_recv()?;
      let Some(inbound) = self.inbound().pop_item().await else {
        return Err(ZmqError::SocketClosed);
      };
      if self.accept(logic, inbound) {
        return Ok(());
      }
    }
  }

  /// Readiness wait used by `poll`. A socket that cannot receive in its
  /// current state is simply never readable; only closing it ends the wait.
  pub(crate) async fn poll_readable(&self, logic: &dyn ISocket) -> Result<(), ZmqError> {
    self.ensure_open()?;
    if logic.check_recv().is_err() {
      self.shutdown.cancelled().await;
      return Err(ZmqError::SocketClosed);
    }
    self.wait_readable(logic).await
  }

  /// Non-blocking readiness test. Stages a message if one is queued.
  pub(crate) fn try_fill(&self, logic: &dyn ISocket) -> bool {
    if self.is_closed() {
      return false;
    }
    if !self.staged.lock().is_empty() {
      return true;
    }
    if logic.check_recv().is_err() {
      return false;
    }
    while let Ok(Some(inbound)) = self.inbound().try_pop_item() {
      if self.accept(logic, inbound) {
        return true;
      }
    }
    false
  }

  fn accept(&self, logic: &dyn ISocket, inbound: InboundMsg) -> bool {
    let pipe_id = inbound.pipe_id;
    let size = inbound.payload_size();
    match logic.accept_incoming(inbound) {
      Some(parts) if !parts.is_empty() => {
        tracing::trace!(
          handle = self.handle,
          pipe_id,
          frames = parts.len(),
          size,
          queued = self.inbound().len(),
          "Message staged"
        );
        let last = parts.len() - 1;
        let mut staged = self.staged.lock();
        for (i, mut frame) in parts.into_iter().enumerate() {
          frame.set_more(i < last);
          staged.push_back(frame);
        }
        true
      }
      _ => {
        tracing::trace!(handle = self.handle, pipe_id, "Inbound message discarded by pattern");
        false
      }
    }
  }

  // --- Send path ---

  /// Sends one frame. Frames flagged MORE are buffered; the final frame hands
  /// the complete message to the pattern, honoring SNDTIMEO.
  pub(crate) async fn send_frame(&self, logic: &dyn ISocket, msg: Msg) -> Result<(), ZmqError> {
    self.ensure_open()?;
    logic.check_send()?;
    if msg.is_more() {
      self.outgoing.lock().push(msg);
      return Ok(());
    }
    let mut parts = std::mem::take(&mut *self.outgoing.lock());
    parts.push(msg);

    let sndtimeo = self.options.read().sndtimeo;
    match sndtimeo {
      None => logic.send_message(parts).await,
      Some(timeout) => tokio::time::timeout(timeout, logic.send_message(parts))
        .await
        .map_err(|_| ZmqError::Timeout)?,
    }
  }

  /// Hands a complete message to the next peer in round-robin order, waiting
  /// for a peer to attach if there is none. Returns the pipe it went to.
  pub(crate) async fn send_round_robin(&self, mut parts: Vec<Msg>) -> Result<usize, ZmqError> {
    loop {
      self.ensure_open()?;
      let Some(pipe_id) = self.load_balancer.next_pipe() else {
        tracing::trace!(handle = self.handle, "No peer attached, waiting to send");
        tokio::select! {
          _ = self.load_balancer.wait_for_pipe() => {}
          _ = self.shutdown.cancelled() => return Err(ZmqError::SocketClosed),
        }
        continue;
      };
      match self.deliver(pipe_id, parts).await? {
        Delivery::Sent => return Ok(pipe_id),
        Delivery::PeerGone(returned) => parts = returned,
      }
    }
  }

  /// Hands a complete message to a specific peer. Waits while the pipe is at
  /// SNDHWM or the peer's inbound queue is at its RCVHWM.
  ///
  /// A delivery already waiting when the socket closes keeps going until
  /// LINGER runs out.
  pub(crate) async fn deliver(&self, pipe_id: usize, parts: Vec<Msg>) -> Result<Delivery, ZmqError> {
    let writer = self.peers.lock().get(&pipe_id).cloned();
    let Some(writer) = writer else {
      self.load_balancer.remove_pipe(pipe_id);
      return Ok(Delivery::PeerGone(parts));
    };
    tokio::select! {
      res = writer.send(InboundMsg::new(pipe_id, parts)) => match res {
        Ok(()) => Ok(Delivery::Sent),
        Err(returned) => {
          self.detach_peer(pipe_id);
          Ok(Delivery::PeerGone(returned.parts))
        }
      },
      _ = self.linger_expired.cancelled() => Err(ZmqError::SocketClosed),
    }
  }

  // --- Options ---

  pub(crate) fn set_option(&self, option: i32, value: &[u8]) -> Result<(), ZmqError> {
    tracing::debug!(handle = self.handle, option, value_len = value.len(), "Setting option");
    let mut opts = self.options.write();
    match option {
      options::SNDHWM => opts.sndhwm = parse_hwm_option(value, option)?,
      options::RCVHWM => {
        opts.rcvhwm = parse_hwm_option(value, option)?;
        if self.inbound.get().is_some() {
          tracing::debug!(
            handle = self.handle,
            "RCVHWM changed after the inbound queue was created; existing queue keeps its capacity"
          );
        }
      }
      options::LINGER => opts.linger = parse_timeout_option(value, option)?,
      options::RCVTIMEO => opts.rcvtimeo = parse_timeout_option(value, option)?,
      options::SNDTIMEO => opts.sndtimeo = parse_timeout_option(value, option)?,
      options::ROUTING_ID => opts.routing_id = Some(parse_blob_option(value)?),
      options::ROUTER_MANDATORY if self.socket_type == SocketType::Router => {
        opts.router_mandatory = parse_bool_option(value, option)?
      }
      _ => {
        tracing::warn!(handle = self.handle, option, "Attempted to set unsupported option");
        return Err(ZmqError::InvalidOption(option));
      }
    }
    Ok(())
  }

  pub(crate) fn get_option(&self, option: i32) -> Result<Vec<u8>, ZmqError> {
    let opts = self.options.read();
    match option {
      options::SNDHWM => Ok(encode_hwm_option(opts.sndhwm)),
      options::RCVHWM => Ok(encode_hwm_option(opts.rcvhwm)),
      options::LINGER => Ok(encode_timeout_option(opts.linger)),
      options::RCVTIMEO => Ok(encode_timeout_option(opts.rcvtimeo)),
      options::SNDTIMEO => Ok(encode_timeout_option(opts.sndtimeo)),
      options::ROUTING_ID => Ok(opts.routing_id.as_ref().map(|id| id.to_vec()).unwrap_or_default()),
      options::ROUTER_MANDATORY if self.socket_type == SocketType::Router => {
        Ok(encode_i32_option(opts.router_mandatory as i32))
      }
      options::RCVMORE => Ok(encode_i32_option(self.rcvmore.load(Ordering::Acquire) as i32)),
      options::TYPE => Ok(encode_i32_option(self.socket_type.code())),
      _ => Err(ZmqError::InvalidOption(option)),
    }
  }

  // --- Lifecycle ---

  /// Closes the socket. Idempotent.
  ///
  /// Pending receives and sends fail with `SocketClosed`; peers see their
  /// next delivery to this socket fail and detach the pipe. A delivery that
  /// is already waiting on a peer gets up to LINGER to complete.
  pub(crate) fn close(&self) {
    if self.closed.swap(true, Ordering::AcqRel) {
      return;
    }
    let linger = self.options.read().linger;
    tracing::debug!(handle = self.handle, socket_type = ?self.socket_type, ?linger, "Closing socket");
    self.shutdown.cancel();
    self.start_linger(linger);
    self.inbound().close();
    for credit in self.inbound_credits.lock().drain().map(|(_, credit)| credit) {
      credit.close();
    }
    self.peers.lock().clear();
    self.load_balancer.clear();
    self.load_balancer.wake_all();
    self.staged.lock().clear();
    self.outgoing.lock().clear();

    let inner = self.context.inner();
    for name in self.bound_names.lock().drain(..) {
      inner.unregister_inproc(&name, self.handle);
    }
    inner.unregister_socket(self.handle);
  }

  fn start_linger(&self, linger: Option<Duration>) {
    match linger {
      // Infinite: in-flight deliveries finish whenever the peer makes room.
      None => {}
      Some(period) if period.is_zero() => self.linger_expired.cancel(),
      Some(period) => match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
          let expired = self.linger_expired.clone();
          runtime.spawn(async move {
            tokio::time::sleep(period).await;
            expired.cancel();
          });
        }
        Err(_) => self.linger_expired.cancel(),
      },
    }
  }
}

impl Drop for SocketCore {
  /// Covers sockets dropped without `close`: peers stop waiting on this
  /// socket's credit and the context forgets it.
  fn drop(&mut self) {
    for credit in self.inbound_credits.get_mut().values() {
      credit.close();
    }
    let inner = self.context.inner();
    for name in self.bound_names.get_mut().drain(..) {
      inner.unregister_inproc(&name, self.handle);
    }
    inner.unregister_socket(self.handle);
  }
}
