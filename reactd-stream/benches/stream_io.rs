//! Benchmarks for the stream hot paths.
//!
//! - ByteBuffer append / erase_prefix cycles
//! - Read delivery over a socket pair (fast path and coalescing path)
//! - Output flush over a socket pair
//!
//! Run with: cargo bench -p reactd-stream --bench stream_io

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use reactd_stream::{
    handler_fn, ByteBuffer, InterestHandle, Multiplexer, Readiness, ReadinessHandler, Stream,
    StreamEvent,
};
use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::os::fd::RawFd;
use std::os::unix::net::UnixStream;
use std::rc::Rc;

/// Single-registration multiplexer driven by hand.
#[derive(Default)]
struct ManualMux {
    handler: RefCell<Option<Rc<dyn ReadinessHandler>>>,
}

impl Multiplexer for ManualMux {
    fn register(
        &self,
        _fd: RawFd,
        _interest: InterestHandle,
        handler: Rc<dyn ReadinessHandler>,
    ) -> io::Result<()> {
        *self.handler.borrow_mut() = Some(handler);
        Ok(())
    }

    fn deregister(&self, _fd: RawFd) {
        self.handler.borrow_mut().take();
    }
}

impl ManualMux {
    fn fire(&self, readiness: Readiness) {
        let handler = self.handler.borrow().clone();
        if let Some(handler) = handler {
            handler.on_ready(readiness);
        }
    }
}

fn drain(peer: &mut UnixStream) {
    let mut sink = [0u8; 64 * 1024];
    loop {
        match peer.read(&mut sink) {
            Ok(0) => break,
            Ok(_) => continue,
            Err(_) => break,
        }
    }
}

fn bench_buffer_append_erase(c: &mut Criterion) {
    let mut group = c.benchmark_group("byte_buffer_append_erase");

    for size in [64usize, 1024, 16 * 1024] {
        let chunk = vec![0xA5u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &chunk, |b, chunk| {
            let mut buf = ByteBuffer::with_capacity(size * 2);
            b.iter(|| {
                buf.extend_from_slice(black_box(chunk));
                buf.erase_prefix(black_box(size / 2));
                buf.erase_prefix(buf.len());
            })
        });
    }

    group.finish();
}

fn bench_read_delivery(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream_read_delivery");

    // consume_all keeps every read on the fast path; consume(0) keeps the
    // coalescing path busy until the buffer is cleared.
    for (name, consume_all) in [("fast_path", true), ("coalescing", false)] {
        let payload = vec![0x5Au8; 4096];
        group.throughput(Throughput::Bytes(payload.len() as u64));
        group.bench_function(name, |b| {
            let (local, mut peer) = UnixStream::pair().expect("socketpair");
            let mux = Rc::new(ManualMux::default());
            let handler = handler_fn(move |stream: &Stream, event| {
                if let StreamEvent::Read(data) = event {
                    if consume_all || data.len() >= 64 * 1024 {
                        data.consume_all();
                    }
                    black_box(stream.buffered_input());
                }
            });
            let stream = Stream::open(mux.clone(), local, handler).expect("open");

            b.iter(|| {
                peer.write_all(&payload).expect("peer write");
                mux.fire(Readiness::READABLE);
            });

            stream.close();
        });
    }

    group.finish();
}

fn bench_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream_flush");

    for size in [256usize, 4096] {
        let payload = vec![0x3Cu8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            let (local, mut peer) = UnixStream::pair().expect("socketpair");
            peer.set_nonblocking(true).expect("peer nonblocking");
            let mux = Rc::new(ManualMux::default());
            let stream =
                Stream::open(mux.clone(), local, handler_fn(|_, _| {})).expect("open");

            b.iter(|| {
                stream.write(black_box(payload)).expect("write");
                stream.flush();
                drain(&mut peer);
            });

            stream.close();
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_buffer_append_erase,
    bench_read_delivery,
    bench_flush
);
criterion_main!(benches);
