//! Descriptor seam.
//!
//! A [`Descriptor`] is an open, connected I/O channel that supports
//! non-blocking reads and writes. Dropping it closes the underlying handle.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;

/// Open I/O channel driven by a stream.
pub trait Descriptor {
    /// Raw OS handle, used as the multiplexer registration key.
    fn raw_fd(&self) -> RawFd;

    /// Read into `buf`. `Ok(0)` means the peer hung up.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write from `buf`, returning the number of bytes accepted.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Switch the descriptor to non-blocking mode.
    fn set_nonblocking(&mut self) -> io::Result<()> {
        set_nonblocking(self.raw_fd())
    }
}

macro_rules! impl_descriptor {
    ($($ty:ty),*) => {
        $(
            impl Descriptor for $ty {
                #[inline]
                fn raw_fd(&self) -> RawFd {
                    self.as_raw_fd()
                }

                #[inline]
                fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                    Read::read(self, buf)
                }

                #[inline]
                fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                    Write::write(self, buf)
                }
            }
        )*
    };
}

impl_descriptor!(TcpStream, UnixStream);

/// Set `O_NONBLOCK` on `fd`, preserving its other status flags.
pub fn set_nonblocking(fd: RawFd) -> io::Result<()> {
    // SAFETY: fcntl with F_GETFL/F_SETFL does not touch memory; an invalid fd
    // is reported through errno.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    if flags & libc::O_NONBLOCK != 0 {
        return Ok(());
    }
    // SAFETY: as above.
    let rc = unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_nonblocking_makes_empty_read_would_block() {
        let (mut a, _b) = UnixStream::pair().unwrap();
        Descriptor::set_nonblocking(&mut a).unwrap();

        let mut buf = [0u8; 8];
        let err = Descriptor::read(&mut a, &mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn test_set_nonblocking_is_idempotent() {
        let (a, _b) = UnixStream::pair().unwrap();
        set_nonblocking(a.as_raw_fd()).unwrap();
        set_nonblocking(a.as_raw_fd()).unwrap();
    }

    #[test]
    fn test_set_nonblocking_rejects_bad_fd() {
        let err = set_nonblocking(-1).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EBADF));
    }

    #[test]
    fn test_zero_read_after_peer_drop() {
        let (mut a, b) = UnixStream::pair().unwrap();
        drop(b);
        let mut buf = [0u8; 8];
        assert_eq!(Descriptor::read(&mut a, &mut buf).unwrap(), 0);
    }
}
