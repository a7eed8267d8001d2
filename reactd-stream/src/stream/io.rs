//! Non-blocking I/O engine: read coalescing and output flushing.

use super::{Stream, StreamState};
use crate::event::{ReadData, StreamEvent};
use crate::interest::Interest;
use crate::READ_BLOCK_SIZE;
use std::io;
use tracing::{trace, warn};

/// Result of one attempt to drain the output buffer.
enum FlushOutcome {
    Drained,
    WouldBlock,
    Failed(io::Error),
}

impl Stream {
    /// Write queued output until it drains, the descriptor would block, or a
    /// write fails.
    ///
    /// - drained while `Open`: write interest is disabled and `Write` is dispatched
    /// - drained while `Closing`: the close completes
    /// - would block: write interest is enabled and `Blocked` is dispatched
    /// - failure: the stream enters `Error`
    ///
    /// Does nothing unless the stream is `Open` or `Closing`.
    pub fn flush(&self) {
        if !self.state().is_active() {
            return;
        }

        let _hold = self.hold();
        match self.drain_output() {
            FlushOutcome::Drained => {
                if self.state() == StreamState::Open {
                    self.inner.interest.disable(Interest::WRITABLE);
                    self.dispatch(StreamEvent::Write);
                } else {
                    self.close();
                }
            }
            FlushOutcome::WouldBlock => {
                self.inner.interest.enable(Interest::WRITABLE);
                self.dispatch(StreamEvent::Blocked);
            }
            FlushOutcome::Failed(err) => self.fail(&err),
        }
    }

    /// Write from the front of the output buffer and erase exactly the
    /// written prefix.
    fn drain_output(&self) -> FlushOutcome {
        let mut output = self.inner.output.borrow_mut();
        let mut descriptor = self.inner.descriptor.borrow_mut();
        let Some(descriptor) = descriptor.as_mut() else {
            return FlushOutcome::Failed(io::Error::from(io::ErrorKind::NotConnected));
        };

        let mut written = 0;
        let outcome = loop {
            if written == output.len() {
                break FlushOutcome::Drained;
            }
            match descriptor.write(&output.as_slice()[written..]) {
                Ok(0) => break FlushOutcome::Failed(io::Error::from(io::ErrorKind::WriteZero)),
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break FlushOutcome::WouldBlock,
                Err(e) => break FlushOutcome::Failed(e),
            }
        };

        output.erase_prefix(written);
        trace!(
            fd = self.inner.fd,
            written,
            pending = output.len(),
            "flushed output"
        );
        outcome
    }

    /// Service read readiness with one read into a stack scratch buffer.
    pub(super) fn read_ready(&self) {
        let mut scratch = [0u8; READ_BLOCK_SIZE];
        let result = match self.inner.descriptor.borrow_mut().as_mut() {
            Some(descriptor) => descriptor.read(&mut scratch),
            None => return,
        };

        match result {
            Ok(0) => self.dispatch(StreamEvent::Hangup),
            Ok(n) => {
                trace!(fd = self.inner.fd, bytes = n, "read");
                self.deliver(&scratch[..n]);
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) => {}
            Err(e) => self.fail(&e),
        }
    }

    /// Hand freshly read bytes to the consumer.
    ///
    /// With no retained input the event views `chunk` directly and only the
    /// unconsumed suffix is copied afterwards. Otherwise `chunk` is appended
    /// to the retained input and the event views the whole input buffer.
    fn deliver(&self, chunk: &[u8]) {
        if self.inner.input.borrow().is_empty() {
            let mut data = ReadData::new(chunk);
            self.dispatch(StreamEvent::Read(&mut data));

            let rest = data.unconsumed();
            if !rest.is_empty() {
                self.inner.input.borrow_mut().extend_from_slice(rest);
            }
            return;
        }

        // The buffer is moved out for the dispatch so the consumer may call
        // back into the stream while the view is alive.
        let mut input = self.inner.input.take();
        input.extend_from_slice(chunk);

        let mut data = ReadData::new(input.as_slice());
        self.dispatch(StreamEvent::Read(&mut data));
        let consumed = data.consumed();

        input.erase_prefix(consumed);
        *self.inner.input.borrow_mut() = input;
    }

    /// Enter `Error` after a hard I/O failure.
    ///
    /// All interest is cleared and pending output is abandoned. The
    /// descriptor stays attached until the consumer closes the stream, except
    /// when the stream was already closing, in which case the close completes.
    pub(super) fn fail(&self, err: &io::Error) {
        let _hold = self.hold();
        let previous = self.state();

        self.inner.interest.clear();
        let abandoned = {
            let mut output = self.inner.output.borrow_mut();
            let len = output.len();
            output.clear();
            len
        };

        warn!(
            fd = self.inner.fd,
            error = %err,
            state = ?previous,
            abandoned,
            "stream I/O failure"
        );

        self.set_state(StreamState::Error);
        self.dispatch(StreamEvent::Error(err.kind()));

        if previous == StreamState::Closing {
            self.close();
        }
    }
}
