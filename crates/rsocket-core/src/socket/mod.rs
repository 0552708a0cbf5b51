//! Socket argument validators.
//!
//! The typed call helpers in the ABI crate check arguments here before
//! handing them to the transport library. Only families the RDMA transport
//! can carry are accepted.

// ---------------------------------------------------------------------------
// Address families (AF_*)
// ---------------------------------------------------------------------------

/// IPv4 Internet protocols.
pub const AF_INET: i32 = 2;
/// IPv6 Internet protocols.
pub const AF_INET6: i32 = 10;
/// InfiniBand native addressing.
pub const AF_IB: i32 = 27;

// ---------------------------------------------------------------------------
// Socket types (SOCK_*)
// ---------------------------------------------------------------------------

/// Byte-stream socket.
pub const SOCK_STREAM: i32 = 1;
/// Datagram socket.
pub const SOCK_DGRAM: i32 = 2;

/// Set O_NONBLOCK on the new socket.
pub const SOCK_NONBLOCK: i32 = 0x800;
/// Set FD_CLOEXEC on the new socket.
pub const SOCK_CLOEXEC: i32 = 0x80000;

/// Mask covering all known socket-type flags.
const SOCK_TYPE_FLAG_MASK: i32 = SOCK_NONBLOCK | SOCK_CLOEXEC;

// ---------------------------------------------------------------------------
// Shutdown modes
// ---------------------------------------------------------------------------

/// Shut down the reading side.
pub const SHUT_RD: i32 = 0;
/// Shut down the writing side.
pub const SHUT_WR: i32 = 1;
/// Shut down both reading and writing.
pub const SHUT_RDWR: i32 = 2;

/// Default cap on the pending-connection queue for `listen()`, used when the
/// host's `net.core.somaxconn` cannot be read.
pub const SOMAXCONN: i32 = 4096;

/// Where Linux publishes the host's `listen()` backlog cap.
pub const SOMAXCONN_PATH: &str = "/proc/sys/net/core/somaxconn";

// ---------------------------------------------------------------------------
// Validators
// ---------------------------------------------------------------------------

/// Returns `true` if `af` is a family the RDMA transport can open.
#[inline]
pub fn valid_address_family(af: i32) -> bool {
    matches!(af, AF_INET | AF_INET6 | AF_IB)
}

/// Returns `true` if `stype` encodes a stream or datagram socket, after
/// masking off the `SOCK_NONBLOCK` and `SOCK_CLOEXEC` modifier flags.
#[inline]
pub fn valid_socket_type(stype: i32) -> bool {
    let base = stype & !SOCK_TYPE_FLAG_MASK;
    matches!(base, SOCK_STREAM | SOCK_DGRAM)
}

/// Returns `true` if `how` is a valid shutdown mode.
#[inline]
pub fn valid_shutdown_how(how: i32) -> bool {
    matches!(how, SHUT_RD | SHUT_WR | SHUT_RDWR)
}

/// Clamps `backlog` to the host cap `max`.
///
/// A negative backlog asks for the system maximum, as with `listen(2)`.
#[inline]
pub fn clamp_backlog(backlog: i32, max: i32) -> i32 {
    if backlog < 0 { max } else { backlog.min(max) }
}

/// Parses the contents of [`SOMAXCONN_PATH`]. Non-positive values are
/// rejected.
pub fn parse_somaxconn(text: &str) -> Option<i32> {
    text.trim().parse::<i32>().ok().filter(|max| *max > 0)
}
