//! The bound function table.
//!
//! One typed slot per catalogue symbol. The signatures are those of
//! `<rdma/rsocket.h>`, each matching its POSIX counterpart.

use std::ffi::{c_int, c_void};
use std::ptr::NonNull;

use libc::{iovec, nfds_t, pollfd, size_t, sockaddr, socklen_t, ssize_t};
use rsocket_core::{RsocketSymbol, SYMBOL_COUNT};

pub type RsocketFn = unsafe extern "C" fn(c_int, c_int, c_int) -> c_int;
pub type RfcntlFn = unsafe extern "C" fn(c_int, c_int, ...) -> c_int;
pub type RlistenFn = unsafe extern "C" fn(c_int, c_int) -> c_int;
pub type RbindFn = unsafe extern "C" fn(c_int, *const sockaddr, socklen_t) -> c_int;
pub type RconnectFn = unsafe extern "C" fn(c_int, *const sockaddr, socklen_t) -> c_int;
pub type RgetsocknameFn = unsafe extern "C" fn(c_int, *mut sockaddr, *mut socklen_t) -> c_int;
pub type RgetsockoptFn =
    unsafe extern "C" fn(c_int, c_int, c_int, *mut c_void, *mut socklen_t) -> c_int;
pub type RsetsockoptFn =
    unsafe extern "C" fn(c_int, c_int, c_int, *const c_void, socklen_t) -> c_int;
pub type RshutdownFn = unsafe extern "C" fn(c_int, c_int) -> c_int;
pub type RpollFn = unsafe extern "C" fn(*mut pollfd, nfds_t, c_int) -> c_int;
pub type RsendFn = unsafe extern "C" fn(c_int, *const c_void, size_t, c_int) -> ssize_t;
pub type RacceptFn = unsafe extern "C" fn(c_int, *mut sockaddr, *mut socklen_t) -> c_int;
pub type RcloseFn = unsafe extern "C" fn(c_int) -> c_int;
pub type RreadFn = unsafe extern "C" fn(c_int, *mut c_void, size_t) -> ssize_t;
pub type RreadvFn = unsafe extern "C" fn(c_int, *const iovec, c_int) -> ssize_t;
pub type RwriteFn = unsafe extern "C" fn(c_int, *const c_void, size_t) -> ssize_t;
pub type RwritevFn = unsafe extern "C" fn(c_int, *const iovec, c_int) -> ssize_t;
pub type RrecvFn = unsafe extern "C" fn(c_int, *mut c_void, size_t, c_int) -> ssize_t;
pub type RrecvfromFn = unsafe extern "C" fn(
    c_int,
    *mut c_void,
    size_t,
    c_int,
    *mut sockaddr,
    *mut socklen_t,
) -> ssize_t;
pub type RsendtoFn = unsafe extern "C" fn(
    c_int,
    *const c_void,
    size_t,
    c_int,
    *const sockaddr,
    socklen_t,
) -> ssize_t;

rsocket_table! {
    /// Entry points of the RDMA sockets transport.
    ///
    /// Only the registry builds one, and only after every symbol resolved.
    pub struct RsocketTable {
        socket: Socket => RsocketFn,
        fcntl: Fcntl => RfcntlFn,
        listen: Listen => RlistenFn,
        bind: Bind => RbindFn,
        connect: Connect => RconnectFn,
        getsockname: GetSockName => RgetsocknameFn,
        getsockopt: GetSockOpt => RgetsockoptFn,
        setsockopt: SetSockOpt => RsetsockoptFn,
        shutdown: Shutdown => RshutdownFn,
        poll: Poll => RpollFn,
        send: Send => RsendFn,
        accept: Accept => RacceptFn,
        close: Close => RcloseFn,
        read: Read => RreadFn,
        readv: Readv => RreadvFn,
        write: Write => RwriteFn,
        writev: Writev => RwritevFn,
        recv: Recv => RrecvFn,
        recvfrom: RecvFrom => RrecvfromFn,
        sendto: SendTo => RsendtoFn,
    }
}

impl RsocketTable {
    /// Every bound address, in resolution order.
    #[must_use]
    pub fn addresses(&self) -> [*const c_void; SYMBOL_COUNT] {
        RsocketSymbol::ALL.map(|sym| self.address(sym))
    }
}

impl PartialEq for RsocketTable {
    fn eq(&self, other: &Self) -> bool {
        self.addresses() == other.addresses()
    }
}

impl Eq for RsocketTable {}

impl std::fmt::Debug for RsocketTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for sym in RsocketSymbol::ALL {
            map.entry(&sym.name(), &self.address(sym));
        }
        map.finish()
    }
}
