//! POSIX socket helpers for `WifiClient`.
//!
//! Thin wrappers over `libc` that translate return codes into
//! `io::Result`. Descriptors are passed as `BorrowedFd` so ownership (and
//! closing) stays with the client.

use std::io;
use std::mem::{self, ManuallyDrop};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::os::fd::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd};
use std::time::{Duration, Instant};

use crate::error::SocketError;

#[cfg(any(target_os = "linux", target_os = "android"))]
const SEND_FLAGS: libc::c_int = libc::MSG_NOSIGNAL;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const SEND_FLAGS: libc::c_int = 0;

/// First stream address for `host:port`. Accepts dotted quads and names.
pub(super) fn resolve(host: &str, port: u16) -> Result<SocketAddr, SocketError> {
    (host, port)
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| SocketError::Resolve(host.to_string()))
}

/// New TCP socket for `addr`'s family. Broken-pipe signals are suppressed
/// per socket where the platform only offers a socket option.
pub(super) fn stream_socket(addr: &SocketAddr) -> io::Result<OwnedFd> {
    let family = match addr {
        SocketAddr::V4(_) => libc::AF_INET,
        SocketAddr::V6(_) => libc::AF_INET6,
    };
    #[cfg(any(target_os = "linux", target_os = "android"))]
    let ty = libc::SOCK_STREAM | libc::SOCK_CLOEXEC;
    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    let ty = libc::SOCK_STREAM;

    // SAFETY: plain socket(2) call; the result is checked before use.
    let raw = unsafe { libc::socket(family, ty, 0) };
    if raw < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: `raw` is a freshly created descriptor owned by nobody else.
    let fd = unsafe { OwnedFd::from_raw_fd(raw) };

    #[cfg(target_vendor = "apple")]
    {
        let on: libc::c_int = 1;
        // SAFETY: `on` outlives the call and the length matches its type.
        let rc = unsafe {
            libc::setsockopt(
                fd.as_raw_fd(),
                libc::SOL_SOCKET,
                libc::SO_NOSIGPIPE,
                (&raw const on).cast(),
                mem::size_of::<libc::c_int>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
    }

    Ok(fd)
}

pub(super) fn set_nonblocking(fd: BorrowedFd<'_>, on: bool) -> io::Result<()> {
    // SAFETY: F_GETFL/F_SETFL on a valid descriptor.
    let flags = unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    let flags = if on {
        flags | libc::O_NONBLOCK
    } else {
        flags & !libc::O_NONBLOCK
    };
    // SAFETY: as above.
    if unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_SETFL, flags) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn sockaddr(addr: &SocketAddr) -> (libc::sockaddr_storage, libc::socklen_t) {
    // SAFETY: all-zero bytes are a valid `sockaddr_storage`.
    let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
    let len = match addr {
        SocketAddr::V4(a) => {
            // SAFETY: sockaddr_storage is large and aligned enough for sockaddr_in.
            let sin = unsafe { &mut *(&raw mut storage).cast::<libc::sockaddr_in>() };
            sin.sin_family = libc::AF_INET as libc::sa_family_t;
            sin.sin_port = a.port().to_be();
            sin.sin_addr = libc::in_addr {
                s_addr: u32::from_ne_bytes(a.ip().octets()),
            };
            mem::size_of::<libc::sockaddr_in>()
        }
        SocketAddr::V6(a) => {
            // SAFETY: sockaddr_storage is large and aligned enough for sockaddr_in6.
            let sin6 = unsafe { &mut *(&raw mut storage).cast::<libc::sockaddr_in6>() };
            sin6.sin6_family = libc::AF_INET6 as libc::sa_family_t;
            sin6.sin6_port = a.port().to_be();
            sin6.sin6_flowinfo = a.flowinfo();
            sin6.sin6_addr = libc::in6_addr {
                s6_addr: a.ip().octets(),
            };
            sin6.sin6_scope_id = a.scope_id();
            mem::size_of::<libc::sockaddr_in6>()
        }
    };
    (storage, len as libc::socklen_t)
}

/// Issue `connect(2)`. `Ok(true)` when connected at once, `Ok(false)` when
/// the connection is in progress.
pub(super) fn start_connect(fd: BorrowedFd<'_>, addr: &SocketAddr) -> io::Result<bool> {
    let (storage, len) = sockaddr(addr);
    // SAFETY: `storage` holds a sockaddr of `len` bytes for the whole call.
    let rc = unsafe { libc::connect(fd.as_raw_fd(), (&raw const storage).cast(), len) };
    if rc == 0 {
        return Ok(true);
    }
    let e = io::Error::last_os_error();
    match e.raw_os_error() {
        Some(libc::EINPROGRESS | libc::EINTR) => Ok(false),
        _ => Err(e),
    }
}

/// Wait up to `timeout_ms` for `events`. Returns the ready `revents`, or 0
/// on timeout. Interrupted waits resume with the remaining time.
pub(super) fn poll(fd: BorrowedFd<'_>, events: libc::c_short, timeout_ms: u64) -> io::Result<libc::c_short> {
    let timeout = Duration::from_millis(timeout_ms.min(i32::MAX as u64));
    let deadline = Instant::now() + timeout;
    loop {
        let mut pfd = libc::pollfd {
            fd: fd.as_raw_fd(),
            events,
            revents: 0,
        };
        let remaining = deadline.saturating_duration_since(Instant::now());
        let ms = remaining.as_millis() as libc::c_int;
        // SAFETY: `pfd` is a valid one-element pollfd array for the call.
        let rc = unsafe { libc::poll(&raw mut pfd, 1, ms) };
        if rc < 0 {
            let e = io::Error::last_os_error();
            if e.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(e);
        }
        return Ok(if rc == 0 { 0 } else { pfd.revents });
    }
}

/// `SO_ERROR` of `fd`; 0 when no error is pending.
pub(super) fn pending_error(fd: BorrowedFd<'_>) -> io::Result<i32> {
    let mut err: libc::c_int = 0;
    let mut len = mem::size_of::<libc::c_int>() as libc::socklen_t;
    // SAFETY: `err` and `len` are valid for writes of the advertised size.
    let rc = unsafe {
        libc::getsockopt(
            fd.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_ERROR,
            (&raw mut err).cast(),
            &raw mut len,
        )
    };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(err)
}

/// `send(2)` without raising SIGPIPE on a dead peer.
pub(super) fn send(fd: BorrowedFd<'_>, buf: &[u8]) -> io::Result<usize> {
    // SAFETY: `buf` is valid for reads of `buf.len()` bytes.
    let rc = unsafe { libc::send(fd.as_raw_fd(), buf.as_ptr().cast(), buf.len(), SEND_FLAGS) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(rc as usize)
}

pub(super) fn recv(fd: BorrowedFd<'_>, buf: &mut [u8]) -> io::Result<usize> {
    // SAFETY: `buf` is valid for writes of `buf.len()` bytes.
    let rc = unsafe { libc::recv(fd.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len(), 0) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(rc as usize)
}

/// Orderly shutdown of both directions; errors (e.g. `ENOTCONN`) are moot
/// because the descriptor is closed right after.
pub(super) fn shutdown(fd: BorrowedFd<'_>) {
    // SAFETY: shutdown(2) on a valid descriptor.
    unsafe {
        libc::shutdown(fd.as_raw_fd(), libc::SHUT_RDWR);
    }
}

pub(super) fn peer_addr(fd: BorrowedFd<'_>) -> Option<SocketAddr> {
    // SAFETY: the stream is never dropped, so the borrowed descriptor is not
    // closed; it is only used for getpeername(2).
    let stream = ManuallyDrop::new(unsafe { TcpStream::from_raw_fd(fd.as_raw_fd()) });
    stream.peer_addr().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::fd::AsFd;
    use std::os::unix::net::UnixStream;

    #[test]
    fn resolves_dotted_quad() {
        let addr = resolve("203.0.113.1", 9).unwrap();
        assert_eq!(addr, "203.0.113.1:9".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn empty_host_does_not_resolve() {
        assert!(matches!(resolve("", 80), Err(SocketError::Resolve(_))));
    }

    #[test]
    fn sockaddr_v4_encoding() {
        let (storage, len) = sockaddr(&"10.1.2.3:7300".parse().unwrap());
        assert_eq!(len as usize, mem::size_of::<libc::sockaddr_in>());
        // SAFETY: storage was filled as a sockaddr_in above.
        let sin = unsafe { &*(&raw const storage).cast::<libc::sockaddr_in>() };
        assert_eq!(u16::from_be(sin.sin_port), 7300);
        assert_eq!(sin.sin_addr.s_addr.to_ne_bytes(), [10, 1, 2, 3]);
    }

    #[test]
    fn nonblocking_toggles() {
        let (a, _b) = UnixStream::pair().unwrap();
        set_nonblocking(a.as_fd(), true).unwrap();
        let mut buf = [0u8; 4];
        let err = recv(a.as_fd(), &mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
        set_nonblocking(a.as_fd(), false).unwrap();
    }

    #[test]
    fn poll_times_out_then_sees_data() {
        let (a, b) = UnixStream::pair().unwrap();
        assert_eq!(poll(a.as_fd(), libc::POLLIN, 20).unwrap(), 0);
        send(b.as_fd(), b"x").unwrap();
        assert_ne!(poll(a.as_fd(), libc::POLLIN, 1000).unwrap() & libc::POLLIN, 0);
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    #[test]
    fn send_to_closed_peer_is_an_error_not_a_signal() {
        let (a, b) = UnixStream::pair().unwrap();
        drop(b);
        assert!(send(a.as_fd(), b"hello").is_err());
    }
}
