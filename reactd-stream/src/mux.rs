//! Multiplexer seam.
//!
//! The stream does not own an event loop. It is registered with something
//! that implements [`Multiplexer`] (a `poll(2)` loop in the daemon, a test
//! double in unit tests) and is told about readiness through the
//! [`ReadinessHandler`] it hands over at registration time.

use crate::interest::{InterestHandle, Readiness};
use std::io;
use std::os::fd::RawFd;
use std::rc::Rc;

/// Receiver of readiness notifications for one registered descriptor.
pub trait ReadinessHandler {
    /// Called by the multiplexer when the descriptor is ready.
    ///
    /// The handler may register or deregister descriptors (including its own)
    /// before returning.
    fn on_ready(&self, readiness: Readiness);
}

/// Descriptor multiplexer.
///
/// Implementations must tolerate `deregister` being called from inside a
/// [`ReadinessHandler::on_ready`] invocation, and must not report readiness
/// for a descriptor after it has been deregistered.
pub trait Multiplexer {
    /// Begin monitoring `fd`.
    ///
    /// The multiplexer watches for whatever `interest` currently holds; the
    /// registrant may change the mask through its own clone of the handle at
    /// any time.
    fn register(
        &self,
        fd: RawFd,
        interest: InterestHandle,
        handler: Rc<dyn ReadinessHandler>,
    ) -> io::Result<()>;

    /// Stop monitoring `fd`. Unknown descriptors are ignored.
    fn deregister(&self, fd: RawFd);
}
