//! `poll(2)` backed [`Multiplexer`].

use reactd_stream::{Interest, InterestHandle, Multiplexer, Readiness, ReadinessHandler};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;
use std::os::fd::RawFd;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, trace};

struct Registration {
    /// Distinguishes a descriptor number reused by a later registration.
    token: u64,
    interest: InterestHandle,
    handler: Rc<dyn ReadinessHandler>,
}

/// Level-triggered multiplexer over `poll(2)`.
///
/// Handlers may register and deregister descriptors (including their own)
/// while being dispatched. A descriptor deregistered during a cycle receives
/// no further readiness from that cycle.
#[derive(Default)]
pub struct PollReactor {
    registrations: RefCell<HashMap<RawFd, Registration>>,
    next_token: Cell<u64>,
}

impl PollReactor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered descriptors.
    pub fn len(&self) -> usize {
        self.registrations.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.borrow().is_empty()
    }

    pub fn is_registered(&self, fd: RawFd) -> bool {
        self.registrations.borrow().contains_key(&fd)
    }

    /// Run one poll cycle and dispatch the readiness it reports.
    ///
    /// `None` blocks until a descriptor is ready. Registrations whose
    /// interest is empty are left out of the poll set. Returns the number of
    /// handlers dispatched; an interrupted poll counts as a cycle with no
    /// events.
    pub fn poll_once(&self, timeout: Option<Duration>) -> io::Result<usize> {
        let (mut pollfds, tokens) = self.poll_set();
        if pollfds.is_empty() {
            return Ok(0);
        }

        let rc = unsafe {
            // SAFETY: `pollfds` is a valid, exclusively borrowed array of
            // `pollfds.len()` entries for the duration of the call.
            libc::poll(
                pollfds.as_mut_ptr(),
                pollfds.len() as libc::nfds_t,
                timeout_millis(timeout),
            )
        };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                trace!("poll interrupted");
                return Ok(0);
            }
            return Err(err);
        }
        if rc == 0 {
            return Ok(0);
        }

        let mut dispatched = 0;
        for (pollfd, token) in pollfds.iter().zip(tokens) {
            if pollfd.revents == 0 {
                continue;
            }

            // The handler is cloned out so it can touch the registration table.
            let handler = match self.registrations.borrow().get(&pollfd.fd) {
                Some(registration) if registration.token == token => {
                    Rc::clone(&registration.handler)
                }
                _ => continue,
            };

            let readiness = readiness_from_revents(pollfd.revents);
            trace!(fd = pollfd.fd, ?readiness, "dispatch readiness");
            handler.on_ready(readiness);
            dispatched += 1;
        }

        Ok(dispatched)
    }

    /// Poll until `stop` is set or nothing is registered any more.
    pub fn run_until(&self, stop: &AtomicBool, timeout: Duration) -> io::Result<()> {
        while !stop.load(Ordering::Relaxed) && !self.is_empty() {
            self.poll_once(Some(timeout))?;
        }
        Ok(())
    }

    fn poll_set(&self) -> (Vec<libc::pollfd>, Vec<u64>) {
        let registrations = self.registrations.borrow();
        let mut pollfds = Vec::with_capacity(registrations.len());
        let mut tokens = Vec::with_capacity(registrations.len());

        for (&fd, registration) in registrations.iter() {
            let interest = registration.interest.get();
            if interest.is_empty() {
                continue;
            }
            pollfds.push(libc::pollfd {
                fd,
                events: poll_events(interest),
                revents: 0,
            });
            tokens.push(registration.token);
        }

        (pollfds, tokens)
    }
}

impl Multiplexer for PollReactor {
    fn register(
        &self,
        fd: RawFd,
        interest: InterestHandle,
        handler: Rc<dyn ReadinessHandler>,
    ) -> io::Result<()> {
        let mut registrations = self.registrations.borrow_mut();
        if registrations.contains_key(&fd) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("descriptor {} is already registered", fd),
            ));
        }

        let token = self.next_token.get();
        self.next_token.set(token.wrapping_add(1));
        registrations.insert(
            fd,
            Registration {
                token,
                interest,
                handler,
            },
        );

        debug!(fd, registered = registrations.len(), "descriptor registered");
        Ok(())
    }

    fn deregister(&self, fd: RawFd) {
        let removed = self.registrations.borrow_mut().remove(&fd);
        if removed.is_some() {
            debug!(fd, "descriptor deregistered");
        }
        // Dropped outside the borrow: the handler may own other registrations.
        drop(removed);
    }
}

fn poll_events(interest: Interest) -> libc::c_short {
    let mut events = 0;
    if interest.is_readable() {
        events |= libc::POLLIN;
    }
    if interest.is_writable() {
        events |= libc::POLLOUT;
    }
    events
}

pub(crate) fn readiness_from_revents(revents: libc::c_short) -> Readiness {
    let mut readiness = Readiness::EMPTY;
    if revents & (libc::POLLIN | libc::POLLPRI) != 0 {
        readiness |= Readiness::READABLE;
    }
    if revents & libc::POLLOUT != 0 {
        readiness |= Readiness::WRITABLE;
    }
    if revents & libc::POLLHUP != 0 {
        readiness |= Readiness::HANGUP;
    }
    if revents & libc::POLLERR != 0 {
        readiness |= Readiness::ERROR;
    }
    if revents & libc::POLLNVAL != 0 {
        readiness |= Readiness::INVALID;
    }
    readiness
}

fn timeout_millis(timeout: Option<Duration>) -> libc::c_int {
    match timeout {
        None => -1,
        Some(timeout) => timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int,
    }
}
