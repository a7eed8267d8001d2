//! The stream: lifecycle state machine and public operations.
//!
//! # Ownership
//!
//! A stream keeps itself alive. `open` creates the consumer's ownership
//! reference and parks it inside the stream; `close` releases it (at most
//! once). Every other reference is a transient [`Hold`] taken around a piece
//! of work that may call into consumer code. When the last reference goes
//! away the stream tears down: the descriptor is deregistered and closed, both
//! buffers are destroyed, the state becomes [`StreamState::Closed`] and the
//! `Close` event is dispatched, in that order and exactly once.
//!
//! [`Stream`] values are handles; clones refer to the same stream. Dropping a
//! handle has no effect on the stream's lifecycle.

mod guard;
mod io;
mod state;


pub use state::StreamState;

use crate::buffer::ByteBuffer;
use crate::descriptor::Descriptor;
use crate::error::{Result, StreamError};
use crate::event::{Dispatcher, StreamEvent, StreamHandler};
use crate::interest::{Interest, InterestHandle, Readiness};
use crate::mux::{Multiplexer, ReadinessHandler};
use guard::{Hold, LastReference};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::os::fd::RawFd;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

/// Buffered, event-driven byte stream over a multiplexed descriptor.
#[derive(Clone)]
pub struct Stream {
    inner: Rc<Inner>,
}

pub(crate) struct Inner {
    state: Cell<StreamState>,
    refs: Cell<usize>,
    /// Registration key; stays valid for logging after the descriptor is gone.
    fd: RawFd,
    descriptor: RefCell<Option<Box<dyn Descriptor>>>,
    input: RefCell<ByteBuffer>,
    output: RefCell<ByteBuffer>,
    interest: InterestHandle,
    mux: Rc<dyn Multiplexer>,
    dispatcher: Dispatcher,
    /// The consumer's ownership reference, released by `close`.
    owner: RefCell<Option<Hold>>,
}

impl Stream {
    /// Open a stream on an already-connected descriptor.
    ///
    /// The descriptor is switched to non-blocking mode and registered with
    /// `mux` for read readiness. `handler` receives every event of the
    /// stream until (and including) `Close`.
    ///
    /// On failure the descriptor is dropped (closed) and no event is dispatched.
    pub fn open<D>(
        mux: Rc<dyn Multiplexer>,
        mut descriptor: D,
        handler: Rc<dyn StreamHandler>,
    ) -> Result<Stream>
    where
        D: Descriptor + 'static,
    {
        descriptor
            .set_nonblocking()
            .map_err(StreamError::Nonblocking)?;
        let fd = descriptor.raw_fd();

        let inner = Rc::new(Inner {
            state: Cell::new(StreamState::Open),
            refs: Cell::new(0),
            fd,
            descriptor: RefCell::new(Some(Box::new(descriptor))),
            input: RefCell::new(ByteBuffer::new()),
            output: RefCell::new(ByteBuffer::new()),
            interest: InterestHandle::new(Interest::READABLE),
            mux: Rc::clone(&mux),
            dispatcher: Dispatcher::default(),
            owner: RefCell::new(None),
        });
        inner.dispatcher.bind(handler);

        let readiness: Rc<dyn ReadinessHandler> = Rc::new(StreamReadiness {
            inner: Rc::downgrade(&inner),
        });
        mux.register(fd, inner.interest.clone(), readiness)
            .map_err(StreamError::Register)?;

        let owner = Hold::new(&inner);
        *inner.owner.borrow_mut() = Some(owner);

        debug!(fd, "stream opened");
        Ok(Stream { inner })
    }

    /// Close the stream.
    ///
    /// Pending output is flushed first; the stream reaches `Closed` once the
    /// output has drained (or failed) and no callback for this stream is
    /// still running. Calling `close` on a closed stream does nothing, and
    /// calling it repeatedly is equivalent to calling it once.
    ///
    /// Only the first call flushes. While `Closing`, remaining output drains
    /// on write readiness.
    pub fn close(&self) {
        if self.is_closed() {
            return;
        }

        let _hold = self.hold();
        if self.state() == StreamState::Open {
            self.set_state(StreamState::Closing);
            self.inner.interest.disable(Interest::READABLE);
            if !self.inner.output.borrow().is_empty() {
                self.flush();
            }
        }

        match self.state() {
            StreamState::Closing if self.inner.output.borrow().is_empty() => self.release_owner(),
            StreamState::Error => self.release_owner(),
            _ => {}
        }
    }

    /// Queue `data` for writing and enable write readiness interest.
    ///
    /// Nothing is written until the descriptor reports writability or
    /// [`flush`](Self::flush) is called. Output is only accepted while the
    /// stream is `Open`.
    pub fn write(&self, data: &[u8]) -> Result<()> {
        match self.state() {
            StreamState::Open => {}
            StreamState::Closed => return Err(StreamError::Closed),
            state => return Err(StreamError::NotWritable(state)),
        }

        self.inner.output.borrow_mut().extend_from_slice(data);
        self.inner.interest.enable(Interest::WRITABLE);
        trace!(fd = self.inner.fd, bytes = data.len(), "output queued");
        Ok(())
    }

    /// Enable write readiness interest, so the next multiplexer cycle that
    /// finds the descriptor writable flushes the stream.
    ///
    /// Does nothing unless the stream is `Open` or `Closing`.
    pub fn notify_writable(&self) {
        if !self.state().is_active() {
            return;
        }
        self.inner.interest.enable(Interest::WRITABLE);
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> StreamState {
        self.inner.state.get()
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.state() == StreamState::Closed
    }

    /// Raw descriptor, or `None` once the stream is closed.
    pub fn raw_fd(&self) -> Option<RawFd> {
        self.inner
            .descriptor
            .borrow()
            .as_ref()
            .map(|descriptor| descriptor.raw_fd())
    }

    /// Number of queued output bytes not yet written.
    pub fn pending_output(&self) -> usize {
        self.inner.output.borrow().len()
    }

    /// Number of input bytes retained from earlier reads.
    pub fn buffered_input(&self) -> usize {
        self.inner.input.borrow().len()
    }

    /// Current interest mask of the registration.
    pub fn interest(&self) -> Interest {
        self.inner.interest.get()
    }

    #[cfg(test)]
    pub(crate) fn ref_count(&self) -> usize {
        self.inner.refs.get()
    }

    fn hold(&self) -> Hold {
        Hold::new(&self.inner)
    }

    fn set_state(&self, next: StreamState) {
        let current = self.inner.state.get();
        debug_assert!(
            current.can_transition_to(next),
            "illegal stream transition {:?} -> {:?}",
            current,
            next
        );
        if current != next {
            trace!(fd = self.inner.fd, from = ?current, to = ?next, "stream state change");
        }
        self.inner.state.set(next);
    }

    /// Release the consumer's ownership reference, if it is still held.
    fn release_owner(&self) {
        let owner = self.inner.owner.borrow_mut().take();
        drop(owner);
    }

    fn dispatch(&self, event: StreamEvent<'_, '_>) {
        trace!(fd = self.inner.fd, event = event.name(), "dispatch");
        self.inner.dispatcher.dispatch(self, event);
    }

    /// Terminal teardown. Runs once, when the last reference is released.
    fn teardown(&self, _last: LastReference) {
        let fd = self.inner.fd;

        self.inner.mux.deregister(fd);
        self.inner.interest.clear();
        drop(self.inner.descriptor.borrow_mut().take());

        self.inner.input.borrow_mut().release();
        self.inner.output.borrow_mut().release();

        self.set_state(StreamState::Closed);
        debug!(fd, "stream closed");

        self.dispatch(StreamEvent::Close);
        drop(self.inner.dispatcher.unbind());
    }

    /// Entry point for readiness reported by the multiplexer.
    fn on_readiness(&self, readiness: Readiness) {
        if !self.state().is_active() {
            return;
        }

        let _hold = self.hold();
        trace!(fd = self.inner.fd, ?readiness, "readiness");

        if readiness.is_error() {
            let kind = if readiness.is_invalid() {
                std::io::ErrorKind::InvalidInput
            } else {
                std::io::ErrorKind::Other
            };
            self.fail(&std::io::Error::new(kind, "error condition reported by multiplexer"));
            return;
        }

        if readiness.is_writable() {
            self.flush();
        }

        if !self.state().is_active() {
            return;
        }

        if readiness.is_hangup() && !readiness.is_readable() {
            self.dispatch(StreamEvent::Hangup);
        } else if readiness.is_readable() && self.state() == StreamState::Open {
            self.read_ready();
        }
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("fd", &self.inner.fd)
            .field("state", &self.state())
            .field("refs", &self.inner.refs.get())
            .field("input", &self.buffered_input())
            .field("output", &self.pending_output())
            .field("interest", &self.interest())
            .finish()
    }
}

/// Registration-side handle of a stream.
///
/// Weak, so that the registration never extends the stream's life; the
/// stream deregisters itself during teardown.
struct StreamReadiness {
    inner: Weak<Inner>,
}

impl ReadinessHandler for StreamReadiness {
    fn on_ready(&self, readiness: Readiness) {
        if let Some(inner) = self.inner.upgrade() {
            Stream { inner }.on_readiness(readiness);
        }
    }
}
