//! Echo sessions: every byte read from a connection is written back.

use reactd_stream::{Stream, StreamEvent, StreamHandler};
use std::cell::RefCell;
use std::collections::HashMap;
use std::os::fd::RawFd;
use std::rc::Rc;
use tracing::{debug, trace};

/// Per-worker session counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub accepted: u64,
    pub refused: u64,
    pub closed: u64,
    pub bytes_echoed: u64,
    /// Flushes that stopped early because the peer was not reading.
    pub blocked: u64,
    pub hangups: u64,
    pub errors: u64,
}

impl WorkerStats {
    pub fn merge(&mut self, other: &WorkerStats) {
        self.accepted += other.accepted;
        self.refused += other.refused;
        self.closed += other.closed;
        self.bytes_echoed += other.bytes_echoed;
        self.blocked += other.blocked;
        self.hangups += other.hangups;
        self.errors += other.errors;
    }
}

/// Open sessions of one worker, keyed by descriptor.
pub struct SessionTable {
    sessions: RefCell<HashMap<RawFd, Stream>>,
    limit: usize,
}

impl SessionTable {
    pub fn new(limit: usize) -> Self {
        Self {
            sessions: RefCell::new(HashMap::new()),
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.borrow().is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.limit
    }

    pub fn insert(&self, fd: RawFd, stream: Stream) {
        self.sessions.borrow_mut().insert(fd, stream);
    }

    pub fn remove(&self, fd: RawFd) -> Option<Stream> {
        self.sessions.borrow_mut().remove(&fd)
    }

    /// Close every session. Sessions with pending output stay in the table
    /// until their output drains.
    pub fn close_all(&self) {
        let open: Vec<Stream> = self.sessions.borrow().values().cloned().collect();
        for stream in open {
            stream.close();
        }
    }
}

/// Stream handler of one echo session.
pub struct EchoSession {
    fd: RawFd,
    sessions: Rc<SessionTable>,
    stats: Rc<RefCell<WorkerStats>>,
}

impl EchoSession {
    pub fn new(fd: RawFd, sessions: Rc<SessionTable>, stats: Rc<RefCell<WorkerStats>>) -> Self {
        Self {
            fd,
            sessions,
            stats,
        }
    }
}

impl StreamHandler for EchoSession {
    fn on_event(&self, stream: &Stream, event: StreamEvent<'_, '_>) {
        match event {
            StreamEvent::Read(data) => {
                // Input stays buffered if the stream no longer accepts output.
                if stream.write(data.bytes()).is_ok() {
                    self.stats.borrow_mut().bytes_echoed += data.len() as u64;
                    data.consume_all();
                    stream.flush();
                }
            }
            StreamEvent::Write => trace!(fd = self.fd, "echo output drained"),
            StreamEvent::Blocked => self.stats.borrow_mut().blocked += 1,
            StreamEvent::Hangup => {
                debug!(fd = self.fd, "peer hung up");
                self.stats.borrow_mut().hangups += 1;
                stream.close();
            }
            StreamEvent::Error(kind) => {
                debug!(fd = self.fd, error = ?kind, "session failed");
                self.stats.borrow_mut().errors += 1;
                stream.close();
            }
            StreamEvent::Close => {
                drop(self.sessions.remove(self.fd));
                self.stats.borrow_mut().closed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactor::PollReactor;
    use reactd_stream::StreamState;
    use std::io::{Read, Write};
    use std::os::fd::AsRawFd;
    use std::os::unix::net::UnixStream;
    use std::time::Duration;

    const TICK: Duration = Duration::from_millis(500);

    struct Fixture {
        reactor: Rc<PollReactor>,
        sessions: Rc<SessionTable>,
        stats: Rc<RefCell<WorkerStats>>,
    }

    impl Fixture {
        fn new(limit: usize) -> Self {
            Self {
                reactor: Rc::new(PollReactor::new()),
                sessions: Rc::new(SessionTable::new(limit)),
                stats: Rc::default(),
            }
        }

        fn open(&self) -> (Stream, UnixStream) {
            let (local, peer) = UnixStream::pair().unwrap();
            let fd = local.as_raw_fd();
            let handler = Rc::new(EchoSession::new(
                fd,
                Rc::clone(&self.sessions),
                Rc::clone(&self.stats),
            ));
            let stream = Stream::open(self.reactor.clone(), local, handler).unwrap();
            self.sessions.insert(fd, stream.clone());
            (stream, peer)
        }
    }

    #[test]
    fn test_echoes_input() {
        let fx = Fixture::new(4);
        let (stream, mut peer) = fx.open();

        peer.write_all(b"hello").unwrap();
        fx.reactor.poll_once(Some(TICK)).unwrap();

        let mut buf = [0u8; 5];
        peer.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
        assert_eq!(stream.buffered_input(), 0);
        assert_eq!(fx.stats.borrow().bytes_echoed, 5);
    }

    #[test]
    fn test_hangup_closes_and_removes_session() {
        let fx = Fixture::new(4);
        let (stream, peer) = fx.open();
        assert_eq!(fx.sessions.len(), 1);

        drop(peer);
        fx.reactor.poll_once(Some(TICK)).unwrap();

        assert_eq!(stream.state(), StreamState::Closed);
        assert!(fx.sessions.is_empty());
        assert!(fx.reactor.is_empty());
        let stats = *fx.stats.borrow();
        assert_eq!(stats.hangups, 1);
        assert_eq!(stats.closed, 1);
    }

    #[test]
    fn test_close_all_empties_idle_table() {
        let fx = Fixture::new(4);
        let (_a, _pa) = fx.open();
        let (_b, _pb) = fx.open();
        assert!(!fx.sessions.is_full());

        fx.sessions.close_all();

        assert!(fx.sessions.is_empty());
        assert_eq!(fx.stats.borrow().closed, 2);
    }

    #[test]
    fn test_table_limit() {
        let fx = Fixture::new(1);
        let (_a, _pa) = fx.open();
        assert!(fx.sessions.is_full());
    }

    #[test]
    fn test_stats_merge() {
        let mut total = WorkerStats {
            accepted: 1,
            bytes_echoed: 10,
            ..WorkerStats::default()
        };
        total.merge(&WorkerStats {
            accepted: 2,
            refused: 1,
            bytes_echoed: 5,
            ..WorkerStats::default()
        });
        assert_eq!(total.accepted, 3);
        assert_eq!(total.refused, 1);
        assert_eq!(total.bytes_echoed, 15);
    }
}
