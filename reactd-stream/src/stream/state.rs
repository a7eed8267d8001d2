//! Stream lifecycle states.

/// Lifecycle phase of a stream.
///
/// ```text
/// Open ──close──▶ Closing ──drained──▶ Closed
///   │                │                   ▲
///   └──I/O failure──▶ Error ──close──────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamState {
    /// Readable and writable.
    Open,
    /// Half shut down: no new reads, pending output is draining.
    Closing,
    /// An I/O failure occurred. The descriptor stays attached until the
    /// consumer closes the stream.
    Error,
    /// Terminal. The descriptor has been released.
    Closed,
}

impl StreamState {
    /// True while the stream may still perform I/O.
    #[inline]
    pub const fn is_active(self) -> bool {
        matches!(self, StreamState::Open | StreamState::Closing)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// Staying in the same state is always allowed; `Open` is never re-entered.
    pub const fn can_transition_to(self, next: StreamState) -> bool {
        use StreamState::*;
        matches!(
            (self, next),
            (Open, Open)
                | (Open, Closing)
                | (Open, Error)
                | (Closing, Closing)
                | (Closing, Error)
                | (Closing, Closed)
                | (Error, Error)
                | (Error, Closed)
                | (Closed, Closed)
        )
    }
}
