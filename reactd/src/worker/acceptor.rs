//! Listener readiness handler: accepts connections and opens echo sessions.

use super::echo::{EchoSession, SessionTable, WorkerStats};
use crate::netio::{configure_accepted, ReactorConfig};
use crate::reactor::PollReactor;
use reactd_stream::{Readiness, ReadinessHandler, Stream};
use std::cell::RefCell;
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::os::fd::AsRawFd;
use std::rc::{Rc, Weak};
use tracing::{debug, trace, warn};

pub(crate) struct Acceptor {
    pub(crate) listener: TcpListener,
    /// Weak: the reactor owns this handler through its registration.
    pub(crate) reactor: Weak<PollReactor>,
    pub(crate) sessions: Rc<SessionTable>,
    pub(crate) stats: Rc<RefCell<WorkerStats>>,
    pub(crate) config: ReactorConfig,
}

impl ReadinessHandler for Acceptor {
    fn on_ready(&self, readiness: Readiness) {
        if readiness.is_error() {
            warn!(?readiness, "listener reported an error condition");
            return;
        }

        loop {
            match self.listener.accept() {
                Ok((conn, peer)) => self.admit(conn, peer),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    // EMFILE and friends: retry on the next readiness.
                    warn!(error = %e, "accept failed");
                    break;
                }
            }
        }
    }
}

impl Acceptor {
    fn admit(&self, conn: TcpStream, peer: SocketAddr) {
        if self.sessions.is_full() {
            self.stats.borrow_mut().refused += 1;
            debug!(%peer, limit = self.config.max_sessions_per_worker, "session limit reached, refusing connection");
            return;
        }

        let Some(reactor) = self.reactor.upgrade() else {
            return;
        };

        if let Err(e) = configure_accepted(&conn, &self.config) {
            debug!(%peer, error = %e, "failed to tune accepted socket");
        }

        let fd = conn.as_raw_fd();
        let handler = Rc::new(EchoSession::new(
            fd,
            Rc::clone(&self.sessions),
            Rc::clone(&self.stats),
        ));

        match Stream::open(reactor, conn, handler) {
            Ok(stream) => {
                self.sessions.insert(fd, stream);
                self.stats.borrow_mut().accepted += 1;
                trace!(%peer, fd, sessions = self.sessions.len(), "session opened");
            }
            Err(e) => {
                self.stats.borrow_mut().errors += 1;
                warn!(%peer, error = %e, "failed to open session");
            }
        }
    }
}
