//! Reference-counted teardown guard.
//!
//! A [`Hold`] is one outstanding reference to a stream. Taking a hold
//! increments the count, dropping it decrements. The drop that brings the
//! count to zero is the only code path that can construct a
//! [`LastReference`], and teardown requires one, so teardown cannot run while
//! any hold is outstanding.

use super::{Inner, Stream, StreamState};
use std::rc::Rc;

/// One outstanding reference to a stream.
pub(crate) struct Hold {
    inner: Rc<Inner>,
}

impl Hold {
    pub(super) fn new(inner: &Rc<Inner>) -> Self {
        debug_assert!(
            inner.state.get() != StreamState::Closed,
            "hold taken on a closed stream"
        );
        inner.refs.set(inner.refs.get() + 1);
        Self {
            inner: Rc::clone(inner),
        }
    }
}

impl Drop for Hold {
    fn drop(&mut self) {
        let refs = self.inner.refs.get();
        debug_assert!(refs > 0, "stream reference count underflow");
        let refs = refs.saturating_sub(1);
        self.inner.refs.set(refs);

        if refs == 0 && self.inner.state.get() != StreamState::Closed {
            let stream = Stream {
                inner: Rc::clone(&self.inner),
            };
            stream.teardown(LastReference(()));
        }
    }
}

/// Proof that the last reference to a stream was just released.
pub(super) struct LastReference(());
