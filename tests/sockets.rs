// tests/sockets.rs

use rzmq_proxy::socket::options;
use rzmq_proxy::{Endpoint, Msg, SocketType, ZmqError};
use std::time::Duration;
mod common;

const SHORT_TIMEOUT: Duration = Duration::from_millis(150);
const LONG_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn test_push_pull_round_robin() -> Result<(), ZmqError> {
  let ctx = common::test_context();
  let push = ctx.socket(SocketType::Push)?;
  let endpoint = common::unique_inproc_endpoint();
  push.bind(&endpoint).await?;
  let pull_a = ctx.socket(SocketType::Pull)?;
  let pull_b = ctx.socket(SocketType::Pull)?;
  pull_a.connect(&endpoint).await?;
  pull_b.connect(&endpoint).await?;

  for i in 0..4u8 {
    push.send(Msg::from_vec(vec![i])).await?;
  }
  let a: Vec<u8> = vec![
    common::recv_timeout(&pull_a, LONG_TIMEOUT).await?.data().unwrap()[0],
    common::recv_timeout(&pull_a, LONG_TIMEOUT).await?.data().unwrap()[0],
  ];
  let b: Vec<u8> = vec![
    common::recv_timeout(&pull_b, LONG_TIMEOUT).await?.data().unwrap()[0],
    common::recv_timeout(&pull_b, LONG_TIMEOUT).await?.data().unwrap()[0],
  ];
  assert_eq!(a, vec![0, 2]);
  assert_eq!(b, vec![1, 3]);

  assert!(matches!(push.recv().await, Err(ZmqError::InvalidSocketType(_))));
  assert!(matches!(
    pull_a.send(Msg::new()).await,
    Err(ZmqError::InvalidSocketType(_))
  ));
  Ok(())
}

#[tokio::test]
async fn test_multipart_is_delivered_atomically() -> Result<(), ZmqError> {
  let ctx = common::test_context();
  let push = ctx.socket(SocketType::Push)?;
  let pull = ctx.socket(SocketType::Pull)?;
  let endpoint = common::unique_inproc_endpoint();
  pull.bind(&endpoint).await?;
  push.connect(&endpoint).await?;

  let mut first = Msg::from_static(b"head");
  first.set_more(true);
  push.send(first).await?;
  // Nothing is visible until the final frame is sent.
  assert!(!pull.has_frame());
  push.send(Msg::from_static(b"tail")).await?;

  let head = common::recv_timeout(&pull, LONG_TIMEOUT).await?;
  assert!(head.is_more());
  assert_eq!(pull.get_option(options::RCVMORE).await?, 1i32.to_ne_bytes().to_vec());
  let tail = common::recv_timeout(&pull, LONG_TIMEOUT).await?;
  assert!(!tail.is_more());
  assert_eq!(pull.get_option(options::RCVMORE).await?, 0i32.to_ne_bytes().to_vec());
  assert_eq!(tail.data().unwrap(), b"tail");
  Ok(())
}

#[tokio::test]
async fn test_req_rep_alternation_is_enforced() -> Result<(), ZmqError> {
  let ctx = common::test_context();
  let rep = ctx.socket(SocketType::Rep)?;
  let req = ctx.socket(SocketType::Req)?;
  let endpoint = common::unique_inproc_endpoint();
  rep.bind(&endpoint).await?;
  req.connect(&endpoint).await?;

  assert!(matches!(req.recv().await, Err(ZmqError::InvalidState(_))));
  assert!(matches!(rep.send(Msg::new()).await, Err(ZmqError::InvalidState(_))));

  req.send(Msg::from_static(b"ping")).await?;
  assert!(matches!(req.send(Msg::new()).await, Err(ZmqError::InvalidState(_))));

  let request = common::recv_timeout(&rep, LONG_TIMEOUT).await?;
  assert_eq!(request.data().unwrap(), b"ping");
  assert!(matches!(rep.recv().await, Err(ZmqError::InvalidState(_))));
  rep.send(Msg::from_static(b"pong")).await?;

  let reply = common::recv_timeout(&req, LONG_TIMEOUT).await?;
  assert_eq!(reply.data().unwrap(), b"pong");
  req.send(Msg::from_static(b"again")).await?;
  Ok(())
}

#[tokio::test]
async fn test_router_prefixes_identity_and_routes_by_it() -> Result<(), ZmqError> {
  let ctx = common::test_context();
  let router = ctx.socket(SocketType::Router)?;
  let endpoint = common::unique_inproc_endpoint();
  router.bind(&endpoint).await?;

  let named = ctx.socket(SocketType::Dealer)?;
  named.set_option(options::ROUTING_ID, b"worker-1").await?;
  named.connect(&endpoint).await?;
  let anonymous = ctx.socket(SocketType::Dealer)?;
  anonymous.connect(&endpoint).await?;

  named.send(Msg::from_static(b"hello")).await?;
  let frames = common::recv_multipart_timeout(&router, LONG_TIMEOUT).await?;
  assert_eq!(common::payloads(&frames), vec![b"worker-1".to_vec(), b"hello".to_vec()]);

  anonymous.send(Msg::from_static(b"hi")).await?;
  let frames = common::recv_multipart_timeout(&router, LONG_TIMEOUT).await?;
  let generated = frames[0].data().unwrap().to_vec();
  assert_eq!(generated.len(), 5);
  assert_eq!(generated[0], 0);

  router
    .send_multipart(vec![Msg::from_vec(generated), Msg::from_static(b"to-anon")])
    .await?;
  let reply = common::recv_timeout(&anonymous, LONG_TIMEOUT).await?;
  assert_eq!(reply.data().unwrap(), b"to-anon");
  assert!(matches!(
    common::recv_timeout(&named, SHORT_TIMEOUT).await,
    Err(ZmqError::Timeout)
  ));
  Ok(())
}

#[tokio::test]
async fn test_router_mandatory_reports_unknown_peer() -> Result<(), ZmqError> {
  let ctx = common::test_context();
  let router = ctx.socket(SocketType::Router)?;

  // Unknown identities are dropped silently by default.
  router.send_multipart(common::frames(&[b"nobody", b"lost"])).await?;

  router.set_option(options::ROUTER_MANDATORY, &1i32.to_ne_bytes()).await?;
  let err = router
    .send_multipart(common::frames(&[b"nobody", b"lost"]))
    .await
    .unwrap_err();
  assert!(matches!(err, ZmqError::HostUnreachable(_)));

  assert!(matches!(
    router.send(Msg::from_static(b"identity-only")).await,
    Err(ZmqError::InvalidMessage(_))
  ));

  let dealer = ctx.socket(SocketType::Dealer)?;
  assert!(matches!(
    dealer.set_option(options::ROUTER_MANDATORY, &1i32.to_ne_bytes()).await,
    Err(ZmqError::InvalidOption(options::ROUTER_MANDATORY))
  ));
  Ok(())
}

#[tokio::test]
async fn test_dealer_to_rep_uses_envelope() -> Result<(), ZmqError> {
  let ctx = common::test_context();
  let rep = ctx.socket(SocketType::Rep)?;
  let dealer = ctx.socket(SocketType::Dealer)?;
  let endpoint = common::unique_inproc_endpoint();
  rep.bind(&endpoint).await?;
  dealer.connect(&endpoint).await?;

  dealer
    .send_multipart(common::frames(&[b"route", b"", b"question"]))
    .await?;
  let request = common::recv_multipart_timeout(&rep, LONG_TIMEOUT).await?;
  assert_eq!(common::payloads(&request), vec![b"question".to_vec()]);
  rep.send(Msg::from_static(b"answer")).await?;

  let reply = common::recv_multipart_timeout(&dealer, LONG_TIMEOUT).await?;
  assert_eq!(
    common::payloads(&reply),
    vec![b"route".to_vec(), Vec::new(), b"answer".to_vec()]
  );
  Ok(())
}

#[tokio::test]
async fn test_pair_is_exclusive() -> Result<(), ZmqError> {
  let ctx = common::test_context();
  let server = ctx.socket(SocketType::Pair)?;
  let endpoint = common::unique_inproc_endpoint();
  server.bind(&endpoint).await?;
  let first = ctx.socket(SocketType::Pair)?;
  first.connect(&endpoint).await?;
  let second = ctx.socket(SocketType::Pair)?;
  assert!(matches!(
    second.connect(&endpoint).await,
    Err(ZmqError::ConnectionRefused(_))
  ));

  first.send(Msg::from_static(b"a")).await?;
  assert_eq!(common::recv_timeout(&server, LONG_TIMEOUT).await?.data().unwrap(), b"a");
  server.send(Msg::from_static(b"b")).await?;
  assert_eq!(common::recv_timeout(&first, LONG_TIMEOUT).await?.data().unwrap(), b"b");
  Ok(())
}

#[tokio::test]
async fn test_bind_and_connect_errors() -> Result<(), ZmqError> {
  let ctx = common::test_context();
  let endpoint = common::unique_inproc_endpoint();
  let pull = ctx.socket(SocketType::Pull)?;
  pull.bind(&endpoint).await?;

  let other = ctx.socket(SocketType::Pull)?;
  assert!(matches!(other.bind(&endpoint).await, Err(ZmqError::AddrInUse(_))));

  let push = ctx.socket(SocketType::Push)?;
  assert!(matches!(
    push.connect(&common::unique_inproc_endpoint()).await,
    Err(ZmqError::ConnectionRefused(_))
  ));
  assert!(matches!(push.bind("not-an-endpoint").await, Err(ZmqError::InvalidEndpoint(_))));
  assert!(matches!(
    push.bind("tcp://127.0.0.1:5555").await,
    Err(ZmqError::UnsupportedTransport(_))
  ));

  let dealer = ctx.socket(SocketType::Dealer)?;
  assert!(matches!(
    dealer.connect(&endpoint).await,
    Err(ZmqError::InvalidSocketType(_))
  ));
  assert!(matches!(pull.connect(&endpoint).await, Err(ZmqError::InvalidArgument(_))));

  // Closing the binder frees the name.
  pull.close().await?;
  other.bind(&endpoint).await?;
  Ok(())
}

#[tokio::test]
async fn test_options_round_trip_and_validation() -> Result<(), ZmqError> {
  let ctx = common::test_context();
  let socket = ctx.socket(SocketType::Dealer)?;

  assert_eq!(
    socket.get_option(options::SNDHWM).await?,
    (options::DEFAULT_HWM as i32).to_ne_bytes().to_vec()
  );
  socket.set_option(options::SNDHWM, &10i32.to_ne_bytes()).await?;
  assert_eq!(socket.get_option(options::SNDHWM).await?, 10i32.to_ne_bytes().to_vec());
  assert_eq!(socket.get_option(options::RCVTIMEO).await?, (-1i32).to_ne_bytes().to_vec());
  assert_eq!(socket.get_option(options::LINGER).await?, 0i32.to_ne_bytes().to_vec());
  socket.set_option(options::LINGER, &250i32.to_ne_bytes()).await?;
  assert_eq!(socket.get_option(options::LINGER).await?, 250i32.to_ne_bytes().to_vec());
  assert_eq!(socket.get_option(options::TYPE).await?, 5i32.to_ne_bytes().to_vec());

  assert!(matches!(
    socket.set_option(options::RCVHWM, &[1, 2]).await,
    Err(ZmqError::InvalidOptionValue(options::RCVHWM))
  ));
  assert!(matches!(
    socket.set_option(options::TYPE, &1i32.to_ne_bytes()).await,
    Err(ZmqError::InvalidOption(options::TYPE))
  ));
  assert!(matches!(socket.get_option(9999).await, Err(ZmqError::InvalidOption(9999))));
  Ok(())
}

#[tokio::test]
async fn test_receive_and_send_timeouts() -> Result<(), ZmqError> {
  let ctx = common::test_context();
  let pull = ctx.socket(SocketType::Pull)?;
  pull.set_option(options::RCVTIMEO, &50i32.to_ne_bytes()).await?;
  assert!(matches!(pull.recv().await, Err(ZmqError::Timeout)));

  // A PUSH with no peer waits for one; SNDTIMEO bounds the wait.
  let push = ctx.socket(SocketType::Push)?;
  push.set_option(options::SNDTIMEO, &50i32.to_ne_bytes()).await?;
  assert!(matches!(push.send(Msg::new()).await, Err(ZmqError::Timeout)));
  Ok(())
}

#[tokio::test]
async fn test_receive_high_water_mark_applies_backpressure() -> Result<(), ZmqError> {
  let ctx = common::test_context();
  let pull = ctx.socket(SocketType::Pull)?;
  pull.set_option(options::RCVHWM, &2i32.to_ne_bytes()).await?;
  let endpoint = common::unique_inproc_endpoint();
  pull.bind(&endpoint).await?;

  let push = ctx.socket(SocketType::Push)?;
  push.set_option(options::SNDTIMEO, &50i32.to_ne_bytes()).await?;
  push.connect(&endpoint).await?;

  push.send(Msg::from_static(b"1")).await?;
  push.send(Msg::from_static(b"2")).await?;
  assert!(matches!(push.send(Msg::from_static(b"3")).await, Err(ZmqError::Timeout)));

  assert_eq!(common::recv_timeout(&pull, LONG_TIMEOUT).await?.data().unwrap(), b"1");
  push.send(Msg::from_static(b"3")).await?;
  Ok(())
}

#[tokio::test]
async fn test_send_high_water_mark_limits_messages_in_flight() -> Result<(), ZmqError> {
  let ctx = common::test_context();
  let pull = ctx.socket(SocketType::Pull)?;
  pull.set_option(options::RCVHWM, &0i32.to_ne_bytes()).await?;
  let endpoint = common::unique_inproc_endpoint();
  pull.bind(&endpoint).await?;

  let push = ctx.socket(SocketType::Push)?;
  push.set_option(options::SNDHWM, &2i32.to_ne_bytes()).await?;
  push.set_option(options::SNDTIMEO, &50i32.to_ne_bytes()).await?;
  push.connect(&endpoint).await?;

  push.send(Msg::from_static(b"1")).await?;
  push.send(Msg::from_static(b"2")).await?;
  // The receiver has no limit of its own; the sender's SNDHWM is what blocks.
  assert!(matches!(push.send(Msg::from_static(b"3")).await, Err(ZmqError::Timeout)));

  assert_eq!(common::recv_timeout(&pull, LONG_TIMEOUT).await?.data().unwrap(), b"1");
  push.send(Msg::from_static(b"3")).await?;
  assert_eq!(common::recv_timeout(&pull, LONG_TIMEOUT).await?.data().unwrap(), b"2");
  assert_eq!(common::recv_timeout(&pull, LONG_TIMEOUT).await?.data().unwrap(), b"3");
  Ok(())
}

/// PULL with room for one message, and a PUSH whose second send is left
/// waiting for that room when the PUSH closes.
async fn close_with_send_in_flight(linger_ms: i32) -> Result<(rzmq_proxy::Socket, Result<(), ZmqError>), ZmqError> {
  let ctx = common::test_context();
  let pull = ctx.socket(SocketType::Pull)?;
  pull.set_option(options::RCVHWM, &1i32.to_ne_bytes()).await?;
  let endpoint = common::unique_inproc_endpoint();
  pull.bind(&endpoint).await?;

  let push = ctx.socket(SocketType::Push)?;
  push.set_option(options::LINGER, &linger_ms.to_ne_bytes()).await?;
  push.connect(&endpoint).await?;
  push.send(Msg::from_static(b"1")).await?;

  let sender = push.clone();
  let pending = tokio::spawn(async move { sender.send(Msg::from_static(b"2")).await });
  tokio::time::sleep(Duration::from_millis(30)).await;
  push.close().await?;

  assert_eq!(common::recv_timeout(&pull, LONG_TIMEOUT).await?.data().unwrap(), b"1");
  let outcome = tokio::time::timeout(LONG_TIMEOUT, pending).await.expect("send did not finish").unwrap();
  Ok((pull, outcome))
}

#[tokio::test]
async fn test_linger_lets_in_flight_send_finish_after_close() -> Result<(), ZmqError> {
  let (pull, outcome) = close_with_send_in_flight(1000).await?;
  assert!(outcome.is_ok());
  assert_eq!(common::recv_timeout(&pull, LONG_TIMEOUT).await?.data().unwrap(), b"2");
  Ok(())
}

#[tokio::test]
async fn test_zero_linger_drops_in_flight_send_on_close() -> Result<(), ZmqError> {
  let (pull, outcome) = close_with_send_in_flight(0).await?;
  assert!(matches!(outcome, Err(ZmqError::SocketClosed)));
  assert!(common::recv_timeout(&pull, SHORT_TIMEOUT).await.is_err());
  Ok(())
}

#[tokio::test]
async fn test_close_fails_pending_and_later_operations() -> Result<(), ZmqError> {
  let ctx = common::test_context();
  let pull = ctx.socket(SocketType::Pull)?;
  let waiter = pull.clone();
  let pending = tokio::spawn(async move { waiter.recv().await });
  tokio::time::sleep(Duration::from_millis(20)).await;

  pull.close().await?;
  let result = tokio::time::timeout(LONG_TIMEOUT, pending).await.expect("recv did not wake").unwrap();
  assert!(matches!(result, Err(ZmqError::SocketClosed)));
  assert!(matches!(pull.recv().await, Err(ZmqError::SocketClosed)));
  assert!(matches!(pull.readable().await, Err(ZmqError::SocketClosed)));
  pull.close().await?;
  Ok(())
}

#[tokio::test]
async fn test_context_term_closes_sockets() -> Result<(), ZmqError> {
  let ctx = common::test_context();
  let push = ctx.socket(SocketType::Push)?;
  let pull = ctx.socket(SocketType::Pull)?;
  let endpoint = common::unique_inproc_endpoint();
  pull.bind(&endpoint).await?;
  push.connect(&endpoint).await?;

  push.send(Msg::from_static(b"Before Term")).await?;
  let msg = common::recv_timeout(&pull, LONG_TIMEOUT).await?;
  assert_eq!(msg.data().unwrap(), b"Before Term");

  let handle = ctx.clone();
  ctx.term().await?;
  assert!(matches!(push.send(Msg::new()).await, Err(ZmqError::SocketClosed)));
  assert!(matches!(pull.recv().await, Err(ZmqError::SocketClosed)));
  assert!(matches!(handle.socket(SocketType::Pair), Err(ZmqError::InvalidState(_))));
  Ok(())
}
