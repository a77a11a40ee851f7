// benches/proxy_throughput.rs

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rzmq_proxy::{
  proxy,
  socket::options::{RCVHWM, SNDHWM},
  Context, Msg, Socket, SocketType, ZmqError,
};
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;

const NUM_MESSAGES: usize = 1000;
const BENCH_HWM: i32 = 100_000;

// PUSH -> [PULL frontend | proxy | PUSH backend] -> PULL, optionally with a PUSH capture.
async fn setup_pipeline(ctx: &Context, with_capture: bool) -> Result<(Socket, Socket, Vec<Socket>), ZmqError> {
  let frontend = ctx.socket(SocketType::Pull)?;
  let backend = ctx.socket(SocketType::Push)?;
  let producer = ctx.socket(SocketType::Push)?;
  let consumer = ctx.socket(SocketType::Pull)?;
  for socket in [&frontend, &backend, &producer, &consumer] {
    socket.set_option(SNDHWM, &BENCH_HWM.to_ne_bytes()).await?;
    socket.set_option(RCVHWM, &BENCH_HWM.to_ne_bytes()).await?;
  }
  frontend.bind("inproc://bench-front").await?;
  backend.bind("inproc://bench-back").await?;
  producer.connect("inproc://bench-front").await?;
  consumer.connect("inproc://bench-back").await?;

  let mut session = vec![frontend, backend];
  if with_capture {
    let capture = ctx.socket(SocketType::Push)?;
    let sink = ctx.socket(SocketType::Pull)?;
    sink.set_option(RCVHWM, &0i32.to_ne_bytes()).await?;
    capture.set_option(SNDHWM, &0i32.to_ne_bytes()).await?;
    capture.bind("inproc://bench-capture").await?;
    sink.connect("inproc://bench-capture").await?;
    session.push(capture);
    session.push(sink);
  }
  Ok((producer, consumer, session))
}

fn proxy_pipeline_throughput(c: &mut Criterion) {
  let rt = Runtime::new().expect("Failed to create Tokio runtime");
  let mut group = c.benchmark_group("Proxy_PUSH_PULL_Inproc");
  group
    .warm_up_time(Duration::from_secs(2))
    .measurement_time(Duration::from_secs(5))
    .sample_size(20);

  for with_capture in [false, true] {
    for size in [16usize, 1024, 16384] {
      group.throughput(Throughput::Bytes((NUM_MESSAGES * size) as u64));
      let label = if with_capture { "capture" } else { "plain" };
      let bench_id = BenchmarkId::new(label, format!("{}B", size));

      group.bench_with_input(bench_id, &size, |b, &msg_size| {
        b.to_async(&rt).iter_custom(|_iters| async move {
          let ctx = Context::new().expect("Bench context creation failed");
          let (producer, consumer, session_sockets) =
            setup_pipeline(&ctx, with_capture).await.expect("Bench setup failed");

          let frontend = session_sockets[0].clone();
          let backend = session_sockets[1].clone();
          let capture = session_sockets.get(2).cloned();
          let session = tokio::spawn(async move {
            let sink = capture.as_ref().map(|s| s as &dyn rzmq_proxy::Endpoint);
            proxy(&frontend, &backend, sink).await
          });

          let payload = vec![0u8; msg_size];
          let start = Instant::now();
          let sender = tokio::spawn(async move {
            for _ in 0..NUM_MESSAGES {
              producer.send(Msg::from_vec(black_box(payload.clone()))).await?;
            }
            Ok::<_, ZmqError>(())
          });
          for _ in 0..NUM_MESSAGES {
            let msg = consumer.recv().await.expect("Bench receive failed");
            black_box(msg.data());
          }
          let elapsed = start.elapsed();

          sender.await.expect("Sender task panicked").expect("Bench send failed");
          ctx.term().await.expect("Context termination failed");
          let _ = session.await;
          elapsed
        });
      });
    }
  }
  group.finish();
}

criterion_group!(benches, proxy_pipeline_throughput);
criterion_main!(benches);
