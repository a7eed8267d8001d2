//! Event notification adapter.
//!
//! Consumer code observes a stream through a bound [`StreamHandler`]. The
//! stream maps its internal conditions onto one [`StreamEvent`] per
//! notification and invokes the handler synchronously. The handler talks
//! back only by consuming bytes from a [`ReadData`] payload and by calling
//! the stream's own operations.

use crate::stream::Stream;
use std::cell::RefCell;
use std::fmt;
use std::io;
use std::rc::Rc;

/// View of readable bytes handed to the handler with [`StreamEvent::Read`].
///
/// The view is valid for the duration of one dispatch. Bytes that are not
/// consumed are retained by the stream and delivered again, followed by
/// newly arrived bytes, with the next `Read` event.
pub struct ReadData<'a> {
    view: &'a [u8],
    remaining: usize,
}

impl<'a> ReadData<'a> {
    pub(crate) fn new(view: &'a [u8]) -> Self {
        Self {
            view,
            remaining: view.len(),
        }
    }

    /// Bytes not yet consumed.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.view[self.view.len() - self.remaining..]
    }

    /// Number of bytes not yet consumed.
    #[inline]
    pub fn len(&self) -> usize {
        self.remaining
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    /// Mark the first `count` unconsumed bytes as consumed.
    ///
    /// Consuming more than is available consumes everything.
    #[inline]
    pub fn consume(&mut self, count: usize) {
        self.remaining -= count.min(self.remaining);
    }

    #[inline]
    pub fn consume_all(&mut self) {
        self.remaining = 0;
    }

    pub(crate) fn consumed(&self) -> usize {
        self.view.len() - self.remaining
    }

    pub(crate) fn unconsumed(&self) -> &'a [u8] {
        &self.view[self.view.len() - self.remaining..]
    }
}

impl fmt::Debug for ReadData<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadData")
            .field("view_len", &self.view.len())
            .field("remaining", &self.remaining)
            .finish()
    }
}

/// Consumer-visible stream event.
#[derive(Debug)]
pub enum StreamEvent<'a, 'b> {
    /// Bytes are available.
    Read(&'a mut ReadData<'b>),
    /// The output buffer drained completely.
    Write,
    /// A write would block; output stays queued until the descriptor is writable.
    Blocked,
    /// The peer closed its side.
    Hangup,
    /// A hard I/O failure. No further I/O is attempted; call `close`.
    Error(io::ErrorKind),
    /// Terminal event. Nothing is dispatched for the stream afterwards.
    Close,
}

impl StreamEvent<'_, '_> {
    /// Short tag used in log records.
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Read(_) => "read",
            StreamEvent::Write => "write",
            StreamEvent::Blocked => "blocked",
            StreamEvent::Hangup => "hangup",
            StreamEvent::Error(_) => "error",
            StreamEvent::Close => "close",
        }
    }
}

/// Consumer callback bound to a stream.
///
/// The handler value itself carries whatever state the consumer needs; use
/// interior mutability for state changed from inside `on_event`.
pub trait StreamHandler {
    fn on_event(&self, stream: &Stream, event: StreamEvent<'_, '_>);
}

/// [`StreamHandler`] backed by a closure. See [`handler_fn`].
pub struct FnHandler<F>(F);

impl<F> StreamHandler for FnHandler<F>
where
    F: Fn(&Stream, StreamEvent<'_, '_>),
{
    #[inline]
    fn on_event(&self, stream: &Stream, event: StreamEvent<'_, '_>) {
        (self.0)(stream, event)
    }
}

/// Wrap a closure as a bindable handler.
pub fn handler_fn<F>(f: F) -> Rc<dyn StreamHandler>
where
    F: Fn(&Stream, StreamEvent<'_, '_>) + 'static,
{
    Rc::new(FnHandler(f))
}

/// Callback binding of one stream.
#[derive(Default)]
pub(crate) struct Dispatcher {
    handler: RefCell<Option<Rc<dyn StreamHandler>>>,
}

impl Dispatcher {
    pub(crate) fn bind(&self, handler: Rc<dyn StreamHandler>) {
        *self.handler.borrow_mut() = Some(handler);
    }

    /// Invoke the bound handler, if any.
    ///
    /// The binding is cloned out first so the handler can trigger nested
    /// dispatches for the same stream.
    pub(crate) fn dispatch(&self, stream: &Stream, event: StreamEvent<'_, '_>) {
        let handler = self.handler.borrow().clone();
        if let Some(handler) = handler {
            handler.on_event(stream, event);
        }
    }

    pub(crate) fn unbind(&self) -> Option<Rc<dyn StreamHandler>> {
        self.handler.borrow_mut().take()
    }
}
