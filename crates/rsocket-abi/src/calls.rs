//! Typed calls through the bound table.
//!
//! Each helper forwards to its slot and turns the C `-1` convention into
//! `io::Error::last_os_error()`. Arguments the transport could never accept
//! are rejected here, via `rsocket_core::socket`, without crossing into the
//! library. Helpers that take raw pointers stay `unsafe` and carry the POSIX
//! contract of the call they wrap.

use std::ffi::{c_int, c_void};
use std::io;
use std::os::fd::RawFd;
use std::sync::OnceLock;

use libc::{iovec, nfds_t, pollfd, sockaddr, socklen_t};
use rsocket_core::socket as socket_core;

use crate::table::RsocketTable;

#[inline]
fn cvt(ret: c_int) -> io::Result<c_int> {
    if ret < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(ret)
    }
}

#[inline]
fn cvt_size(ret: libc::ssize_t) -> io::Result<usize> {
    if ret < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(ret as usize)
    }
}

#[inline]
fn iov_count(len: usize) -> io::Result<c_int> {
    c_int::try_from(len).map_err(|_| io::Error::from_raw_os_error(libc::EINVAL))
}

/// The host's `listen()` backlog cap, read once from procfs.
pub fn host_backlog_cap() -> c_int {
    static CAP: OnceLock<c_int> = OnceLock::new();
    *CAP.get_or_init(|| {
        std::fs::read_to_string(socket_core::SOMAXCONN_PATH)
            .ok()
            .and_then(|text| socket_core::parse_somaxconn(&text))
            .unwrap_or(socket_core::SOMAXCONN)
    })
}

impl RsocketTable {
    /// `rsocket(domain, type, protocol)`.
    pub fn open_socket(
        &self,
        domain: c_int,
        sock_type: c_int,
        protocol: c_int,
    ) -> io::Result<RawFd> {
        if !socket_core::valid_address_family(domain) {
            return Err(io::Error::from_raw_os_error(libc::EAFNOSUPPORT));
        }
        if !socket_core::valid_socket_type(sock_type) {
            return Err(io::Error::from_raw_os_error(libc::EINVAL));
        }
        cvt(unsafe { (self.socket)(domain, sock_type, protocol) })
    }

    pub unsafe fn bind_raw(
        &self,
        fd: RawFd,
        addr: *const sockaddr,
        len: socklen_t,
    ) -> io::Result<()> {
        cvt(unsafe { (self.bind)(fd, addr, len) }).map(drop)
    }

    /// `rlisten`, with the backlog capped at [`host_backlog_cap`]. A negative
    /// backlog asks for the cap itself.
    pub fn listen_on(&self, fd: RawFd, backlog: c_int) -> io::Result<()> {
        let backlog = socket_core::clamp_backlog(backlog, host_backlog_cap());
        cvt(unsafe { (self.listen)(fd, backlog) }).map(drop)
    }

    pub unsafe fn connect_raw(
        &self,
        fd: RawFd,
        addr: *const sockaddr,
        len: socklen_t,
    ) -> io::Result<()> {
        cvt(unsafe { (self.connect)(fd, addr, len) }).map(drop)
    }

    pub unsafe fn accept_raw(
        &self,
        fd: RawFd,
        addr: *mut sockaddr,
        len: *mut socklen_t,
    ) -> io::Result<RawFd> {
        cvt(unsafe { (self.accept)(fd, addr, len) })
    }

    pub unsafe fn getsockname_raw(
        &self,
        fd: RawFd,
        addr: *mut sockaddr,
        len: *mut socklen_t,
    ) -> io::Result<()> {
        cvt(unsafe { (self.getsockname)(fd, addr, len) }).map(drop)
    }

    pub unsafe fn getsockopt_raw(
        &self,
        fd: RawFd,
        level: c_int,
        name: c_int,
        value: *mut c_void,
        len: *mut socklen_t,
    ) -> io::Result<()> {
        cvt(unsafe { (self.getsockopt)(fd, level, name, value, len) }).map(drop)
    }

    pub unsafe fn setsockopt_raw(
        &self,
        fd: RawFd,
        level: c_int,
        name: c_int,
        value: *const c_void,
        len: socklen_t,
    ) -> io::Result<()> {
        cvt(unsafe { (self.setsockopt)(fd, level, name, value, len) }).map(drop)
    }

    /// `rsetsockopt` for an `int`-valued option.
    pub fn set_int_option(
        &self,
        fd: RawFd,
        level: c_int,
        name: c_int,
        value: c_int,
    ) -> io::Result<()> {
        let len = std::mem::size_of::<c_int>() as socklen_t;
        unsafe { self.setsockopt_raw(fd, level, name, (&value as *const c_int).cast(), len) }
    }

    /// `rgetsockopt` for an `int`-valued option.
    pub fn int_option(&self, fd: RawFd, level: c_int, name: c_int) -> io::Result<c_int> {
        let mut value: c_int = 0;
        let mut len = std::mem::size_of::<c_int>() as socklen_t;
        unsafe {
            self.getsockopt_raw(fd, level, name, (&mut value as *mut c_int).cast(), &mut len)?;
        }
        Ok(value)
    }

    /// `rshutdown`; an unknown `how` fails with `EINVAL`.
    pub fn shutdown_socket(&self, fd: RawFd, how: c_int) -> io::Result<()> {
        if !socket_core::valid_shutdown_how(how) {
            return Err(io::Error::from_raw_os_error(libc::EINVAL));
        }
        cvt(unsafe { (self.shutdown)(fd, how) }).map(drop)
    }

    pub fn close_socket(&self, fd: RawFd) -> io::Result<()> {
        cvt(unsafe { (self.close)(fd) }).map(drop)
    }

    /// `rpoll` over `fds`; returns the number of ready descriptors.
    pub fn poll_fds(&self, fds: &mut [pollfd], timeout_ms: c_int) -> io::Result<usize> {
        let nfds = fds.len() as nfds_t;
        let ready = cvt(unsafe { (self.poll)(fds.as_mut_ptr(), nfds, timeout_ms) })?;
        Ok(ready as usize)
    }

    /// `rfcntl(fd, cmd, arg)`.
    pub fn fcntl_int(&self, fd: RawFd, cmd: c_int, arg: c_int) -> io::Result<c_int> {
        cvt(unsafe { (self.fcntl)(fd, cmd, arg) })
    }

    /// Toggle `O_NONBLOCK` through `rfcntl`.
    pub fn set_nonblocking(&self, fd: RawFd, nonblocking: bool) -> io::Result<()> {
        let flags = self.fcntl_int(fd, libc::F_GETFL, 0)?;
        let wanted = if nonblocking {
            flags | libc::O_NONBLOCK
        } else {
            flags & !libc::O_NONBLOCK
        };
        if wanted != flags {
            self.fcntl_int(fd, libc::F_SETFL, wanted)?;
        }
        Ok(())
    }

    pub fn read_into(&self, fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
        cvt_size(unsafe { (self.read)(fd, buf.as_mut_ptr().cast(), buf.len()) })
    }

    pub fn write_from(&self, fd: RawFd, buf: &[u8]) -> io::Result<usize> {
        cvt_size(unsafe { (self.write)(fd, buf.as_ptr().cast(), buf.len()) })
    }

    pub fn readv_into(&self, fd: RawFd, bufs: &mut [io::IoSliceMut<'_>]) -> io::Result<usize> {
        let count = iov_count(bufs.len())?;
        // IoSliceMut is ABI-compatible with iovec on unix.
        cvt_size(unsafe { (self.readv)(fd, bufs.as_ptr().cast::<iovec>(), count) })
    }

    pub fn writev_from(&self, fd: RawFd, bufs: &[io::IoSlice<'_>]) -> io::Result<usize> {
        let count = iov_count(bufs.len())?;
        // IoSlice is ABI-compatible with iovec on unix.
        cvt_size(unsafe { (self.writev)(fd, bufs.as_ptr().cast::<iovec>(), count) })
    }

    pub fn send_from(&self, fd: RawFd, buf: &[u8], flags: c_int) -> io::Result<usize> {
        cvt_size(unsafe { (self.send)(fd, buf.as_ptr().cast(), buf.len(), flags) })
    }

    pub fn recv_into(&self, fd: RawFd, buf: &mut [u8], flags: c_int) -> io::Result<usize> {
        cvt_size(unsafe { (self.recv)(fd, buf.as_mut_ptr().cast(), buf.len(), flags) })
    }

    pub unsafe fn sendto_raw(
        &self,
        fd: RawFd,
        buf: &[u8],
        flags: c_int,
        addr: *const sockaddr,
        len: socklen_t,
    ) -> io::Result<usize> {
        cvt_size(unsafe { (self.sendto)(fd, buf.as_ptr().cast(), buf.len(), flags, addr, len) })
    }

    pub unsafe fn recvfrom_raw(
        &self,
        fd: RawFd,
        buf: &mut [u8],
        flags: c_int,
        addr: *mut sockaddr,
        len: *mut socklen_t,
    ) -> io::Result<usize> {
        cvt_size(unsafe {
            (self.recvfrom)(fd, buf.as_mut_ptr().cast(), buf.len(), flags, addr, len)
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use libc::{sockaddr_in, sockaddr_storage};
    use parking_lot::Mutex;
    use rsocket_core::{RsocketSymbol, SYMBOL_COUNT};
    use std::io::{IoSlice, IoSliceMut};
    use std::mem::size_of;
    use std::ptr::NonNull;
    use std::sync::atomic::{AtomicI32, Ordering};

    static LAST_HOW: AtomicI32 = AtomicI32::new(-1);
    static LAST_BACKLOGS: Mutex<Vec<c_int>> = parking_lot::const_mutex(Vec::new());
    static FCNTL_CALLS: Mutex<Vec<(c_int, c_int, c_int)>> = parking_lot::const_mutex(Vec::new());
    static WRITEV_SEEN: Mutex<Vec<Vec<u8>>> = parking_lot::const_mutex(Vec::new());
    static LAST_SETOPT: Mutex<Option<(c_int, c_int, c_int, socklen_t)>> =
        parking_lot::const_mutex(None);
    static LAST_SENDTO_FAMILY: AtomicI32 = AtomicI32::new(-1);

    /// Descriptor the fake `rfcntl` fails on.
    const BAD_FD: c_int = 99;
    const RECV_PORT: u16 = 7471;

    unsafe extern "C" fn fake_socket(_domain: c_int, _ty: c_int, _proto: c_int) -> c_int {
        42
    }

    unsafe extern "C" fn fake_shutdown(_fd: c_int, how: c_int) -> c_int {
        LAST_HOW.store(how, Ordering::SeqCst);
        0
    }

    unsafe extern "C" fn fake_listen(_fd: c_int, backlog: c_int) -> c_int {
        LAST_BACKLOGS.lock().push(backlog);
        0
    }

    unsafe extern "C" fn fake_write(
        _fd: c_int,
        _buf: *const c_void,
        len: libc::size_t,
    ) -> libc::ssize_t {
        len as libc::ssize_t
    }

    unsafe extern "C" fn fake_close(_fd: c_int) -> c_int {
        -1
    }

    // Installed in the variadic rfcntl slot. On the x86_64 and aarch64 Linux
    // ABIs the trailing int arrives in the same register either way.
    #[cfg(all(target_os = "linux", any(target_arch = "x86_64", target_arch = "aarch64")))]
    unsafe extern "C" fn fake_fcntl(fd: c_int, cmd: c_int, arg: c_int) -> c_int {
        FCNTL_CALLS.lock().push((fd, cmd, arg));
        match cmd {
            _ if fd == BAD_FD => -1,
            // Even descriptors start out non-blocking.
            libc::F_GETFL if fd % 2 == 0 => libc::O_RDWR | libc::O_NONBLOCK,
            libc::F_GETFL => libc::O_RDWR,
            _ => 0,
        }
    }

    unsafe extern "C" fn fake_writev(_fd: c_int, iov: *const iovec, count: c_int) -> libc::ssize_t {
        let iov = unsafe { std::slice::from_raw_parts(iov, count as usize) };
        let mut seen = WRITEV_SEEN.lock();
        let mut total = 0;
        for v in iov {
            let bytes = unsafe { std::slice::from_raw_parts(v.iov_base as *const u8, v.iov_len) };
            seen.push(bytes.to_vec());
            total += v.iov_len;
        }
        total as libc::ssize_t
    }

    /// Fills buffer `i` with the byte `i + 1`.
    unsafe extern "C" fn fake_readv(_fd: c_int, iov: *const iovec, count: c_int) -> libc::ssize_t {
        let iov = unsafe { std::slice::from_raw_parts(iov, count as usize) };
        let mut total = 0;
        for (i, v) in iov.iter().enumerate() {
            unsafe { std::ptr::write_bytes(v.iov_base.cast::<u8>(), i as u8 + 1, v.iov_len) };
            total += v.iov_len;
        }
        total as libc::ssize_t
    }

    /// Answers `level * 100 + name` into an int-sized buffer.
    unsafe extern "C" fn fake_getsockopt(
        _fd: c_int,
        level: c_int,
        name: c_int,
        value: *mut c_void,
        len: *mut socklen_t,
    ) -> c_int {
        if value.is_null() || len.is_null() {
            return -1;
        }
        unsafe {
            if (*len as usize) < size_of::<c_int>() {
                return -1;
            }
            value.cast::<c_int>().write_unaligned(level * 100 + name);
            *len = size_of::<c_int>() as socklen_t;
        }
        0
    }

    unsafe extern "C" fn fake_setsockopt(
        _fd: c_int,
        level: c_int,
        name: c_int,
        value: *const c_void,
        len: socklen_t,
    ) -> c_int {
        if value.is_null() || len as usize != size_of::<c_int>() {
            return -1;
        }
        let value = unsafe { value.cast::<c_int>().read_unaligned() };
        *LAST_SETOPT.lock() = Some((level, name, value, len));
        0
    }

    /// Reports `POLLIN` on every non-negative descriptor that asked for it.
    unsafe extern "C" fn fake_poll(fds: *mut pollfd, nfds: libc::nfds_t, _timeout: c_int) -> c_int {
        let fds = unsafe { std::slice::from_raw_parts_mut(fds, nfds as usize) };
        let mut ready = 0;
        for fd in fds {
            fd.revents = if fd.fd >= 0 { fd.events & libc::POLLIN } else { 0 };
            if fd.revents != 0 {
                ready += 1;
            }
        }
        ready
    }

    unsafe extern "C" fn fake_sendto(
        _fd: c_int,
        _buf: *const c_void,
        len: libc::size_t,
        _flags: c_int,
        addr: *const sockaddr,
        addr_len: socklen_t,
    ) -> libc::ssize_t {
        if addr.is_null() || addr_len == 0 {
            return -1;
        }
        LAST_SENDTO_FAMILY.store(c_int::from(unsafe { (*addr).sa_family }), Ordering::SeqCst);
        len as libc::ssize_t
    }

    /// Delivers `b"rdma"` from 127.0.0.1:`RECV_PORT`.
    unsafe extern "C" fn fake_recvfrom(
        _fd: c_int,
        buf: *mut c_void,
        len: libc::size_t,
        _flags: c_int,
        addr: *mut sockaddr,
        addr_len: *mut socklen_t,
    ) -> libc::ssize_t {
        let payload = b"rdma";
        let n = payload.len().min(len);
        unsafe {
            std::ptr::copy_nonoverlapping(payload.as_ptr(), buf.cast::<u8>(), n);
            if !addr.is_null()
                && !addr_len.is_null()
                && *addr_len as usize >= size_of::<sockaddr_in>()
            {
                let sin = addr.cast::<sockaddr_in>();
                (*sin).sin_family = libc::AF_INET as libc::sa_family_t;
                (*sin).sin_port = RECV_PORT.to_be();
                (*sin).sin_addr.s_addr = u32::from_be_bytes([127, 0, 0, 1]).to_be();
                *addr_len = size_of::<sockaddr_in>() as socklen_t;
            }
        }
        n as libc::ssize_t
    }

    unsafe extern "C" fn unused() {}

    fn table() -> RsocketTable {
        let mut slots: [NonNull<c_void>; SYMBOL_COUNT] =
            [NonNull::new(unused as *const () as *mut c_void).unwrap(); SYMBOL_COUNT];
        let mut put = |sym: RsocketSymbol, addr: *const ()| {
            slots[sym.index()] = NonNull::new(addr as *mut c_void).unwrap();
        };
        put(RsocketSymbol::Socket, fake_socket as *const ());
        put(RsocketSymbol::Shutdown, fake_shutdown as *const ());
        put(RsocketSymbol::Listen, fake_listen as *const ());
        put(RsocketSymbol::Write, fake_write as *const ());
        put(RsocketSymbol::Close, fake_close as *const ());
        #[cfg(all(target_os = "linux", any(target_arch = "x86_64", target_arch = "aarch64")))]
        put(RsocketSymbol::Fcntl, fake_fcntl as *const ());
        put(RsocketSymbol::Writev, fake_writev as *const ());
        put(RsocketSymbol::Readv, fake_readv as *const ());
        put(RsocketSymbol::GetSockOpt, fake_getsockopt as *const ());
        put(RsocketSymbol::SetSockOpt, fake_setsockopt as *const ());
        put(RsocketSymbol::Poll, fake_poll as *const ());
        put(RsocketSymbol::SendTo, fake_sendto as *const ());
        put(RsocketSymbol::RecvFrom, fake_recvfrom as *const ());
        unsafe { RsocketTable::from_resolved(&slots) }
    }

    fn fcntl_calls(fd: c_int) -> Vec<(c_int, c_int)> {
        FCNTL_CALLS
            .lock()
            .iter()
            .filter(|(seen, _, _)| *seen == fd)
            .map(|&(_, cmd, arg)| (cmd, arg))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Validation before the call
    // -----------------------------------------------------------------------

    #[test]
    fn socket_forwards_valid_arguments() {
        let fd = table()
            .open_socket(socket_core::AF_INET, socket_core::SOCK_STREAM, 0)
            .unwrap();
        assert_eq!(fd, 42);
    }

    #[test]
    fn socket_rejects_foreign_family_locally() {
        let err = table()
            .open_socket(1, socket_core::SOCK_STREAM, 0)
            .unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EAFNOSUPPORT));
        let err = table()
            .open_socket(socket_core::AF_INET6, 3, 0)
            .unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EINVAL));
    }

    #[test]
    fn shutdown_validates_how() {
        let t = table();
        t.shutdown_socket(3, socket_core::SHUT_WR).unwrap();
        assert_eq!(LAST_HOW.load(Ordering::SeqCst), socket_core::SHUT_WR);
        let err = t.shutdown_socket(3, 7).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EINVAL));
        assert_eq!(LAST_HOW.load(Ordering::SeqCst), socket_core::SHUT_WR);
    }

    #[test]
    fn listen_caps_backlog_at_host_limit() {
        let cap = host_backlog_cap();
        assert!(cap > 0);
        let t = table();
        t.listen_on(3, i32::MAX).unwrap();
        t.listen_on(3, -1).unwrap();
        t.listen_on(3, 16).unwrap();
        assert_eq!(*LAST_BACKLOGS.lock(), vec![cap, cap, 16.min(cap)]);
    }

    // -----------------------------------------------------------------------
    // Result mapping
    // -----------------------------------------------------------------------

    #[test]
    fn write_reports_byte_count() {
        assert_eq!(table().write_from(3, b"hello").unwrap(), 5);
    }

    #[test]
    fn negative_return_becomes_error() {
        assert!(table().close_socket(3).is_err());
    }

    // -----------------------------------------------------------------------
    // rfcntl
    // -----------------------------------------------------------------------

    #[cfg(all(target_os = "linux", any(target_arch = "x86_64", target_arch = "aarch64")))]
    #[test]
    fn set_nonblocking_writes_only_changed_flags() {
        let t = table();
        t.set_nonblocking(11, true).unwrap();
        t.set_nonblocking(10, true).unwrap();
        t.set_nonblocking(12, false).unwrap();
        t.set_nonblocking(13, false).unwrap();

        assert_eq!(
            fcntl_calls(11),
            vec![(libc::F_GETFL, 0), (libc::F_SETFL, libc::O_RDWR | libc::O_NONBLOCK)]
        );
        assert_eq!(fcntl_calls(10), vec![(libc::F_GETFL, 0)]);
        assert_eq!(
            fcntl_calls(12),
            vec![(libc::F_GETFL, 0), (libc::F_SETFL, libc::O_RDWR)]
        );
        assert_eq!(fcntl_calls(13), vec![(libc::F_GETFL, 0)]);
    }

    #[cfg(all(target_os = "linux", any(target_arch = "x86_64", target_arch = "aarch64")))]
    #[test]
    fn set_nonblocking_stops_when_getfl_fails() {
        assert!(table().set_nonblocking(BAD_FD, true).is_err());
        assert_eq!(fcntl_calls(BAD_FD), vec![(libc::F_GETFL, 0)]);
    }

    // -----------------------------------------------------------------------
    // Scatter/gather
    // -----------------------------------------------------------------------

    #[test]
    fn writev_passes_every_slice_intact() {
        let bufs = [IoSlice::new(b"rd"), IoSlice::new(b""), IoSlice::new(b"ma!")];
        assert_eq!(table().writev_from(3, &bufs).unwrap(), 5);
        let seen = WRITEV_SEEN.lock();
        assert_eq!(*seen, vec![b"rd".to_vec(), Vec::new(), b"ma!".to_vec()]);
    }

    #[test]
    fn readv_fills_each_buffer() {
        let mut a = [0u8; 3];
        let mut b = [0u8; 2];
        let n = {
            let mut bufs = [IoSliceMut::new(&mut a), IoSliceMut::new(&mut b)];
            table().readv_into(3, &mut bufs).unwrap()
        };
        assert_eq!(n, 5);
        assert_eq!(a, [1, 1, 1]);
        assert_eq!(b, [2, 2]);
    }

    #[test]
    fn iovec_count_overflow_is_einval() {
        assert_eq!(iov_count(0).unwrap(), 0);
        assert_eq!(iov_count(c_int::MAX as usize).unwrap(), c_int::MAX);
        let err = iov_count(c_int::MAX as usize + 1).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EINVAL));
        assert!(iov_count(usize::MAX).is_err());
    }

    // -----------------------------------------------------------------------
    // Socket options
    // -----------------------------------------------------------------------

    #[test]
    fn int_option_passes_int_sized_buffer() {
        assert_eq!(table().int_option(3, libc::SOL_SOCKET, 7).unwrap(), libc::SOL_SOCKET * 100 + 7);
    }

    #[test]
    fn getsockopt_raw_reports_written_length() {
        let t = table();
        let mut wide = [0u8; 8];
        let mut len = wide.len() as socklen_t;
        unsafe { t.getsockopt_raw(3, 6, 1, wide.as_mut_ptr().cast(), &mut len) }.unwrap();
        assert_eq!(len as usize, size_of::<c_int>());
        assert_eq!(c_int::from_ne_bytes([wide[0], wide[1], wide[2], wide[3]]), 601);

        let mut short = [0u8; 2];
        let mut len = short.len() as socklen_t;
        let res = unsafe { t.getsockopt_raw(3, 6, 1, short.as_mut_ptr().cast(), &mut len) };
        assert!(res.is_err());
        assert_eq!(len, 2);
    }

    #[test]
    fn set_int_option_sends_value_and_length() {
        table().set_int_option(3, libc::SOL_SOCKET, 9, 1234).unwrap();
        assert_eq!(
            *LAST_SETOPT.lock(),
            Some((libc::SOL_SOCKET, 9, 1234, size_of::<c_int>() as socklen_t))
        );
    }

    // -----------------------------------------------------------------------
    // rpoll
    // -----------------------------------------------------------------------

    #[test]
    fn poll_counts_ready_and_writes_revents() {
        let mut fds = [
            pollfd { fd: 3, events: libc::POLLIN, revents: 0 },
            pollfd { fd: -1, events: libc::POLLIN, revents: 0 },
            pollfd { fd: 4, events: libc::POLLOUT, revents: 0 },
        ];
        assert_eq!(table().poll_fds(&mut fds, 0).unwrap(), 1);
        assert_eq!(fds.map(|fd| fd.revents), [libc::POLLIN, 0, 0]);
        assert_eq!(table().poll_fds(&mut [], 0).unwrap(), 0);
    }

    // -----------------------------------------------------------------------
    // Addressed datagrams
    // -----------------------------------------------------------------------

    #[test]
    fn sendto_forwards_address() {
        let t = table();
        let mut dest: sockaddr_in = unsafe { std::mem::zeroed() };
        dest.sin_family = libc::AF_INET as libc::sa_family_t;
        let addr = (&dest as *const sockaddr_in).cast::<sockaddr>();
        let len = size_of::<sockaddr_in>() as socklen_t;
        assert_eq!(unsafe { t.sendto_raw(3, b"abc", 0, addr, len) }.unwrap(), 3);
        assert_eq!(LAST_SENDTO_FAMILY.load(Ordering::SeqCst), libc::AF_INET);

        assert!(unsafe { t.sendto_raw(3, b"abc", 0, std::ptr::null(), 0) }.is_err());
    }

    #[test]
    fn recvfrom_fills_payload_and_source() {
        let t = table();
        let mut buf = [0u8; 16];
        let mut from: sockaddr_storage = unsafe { std::mem::zeroed() };
        let mut len = size_of::<sockaddr_storage>() as socklen_t;
        let addr = (&mut from as *mut sockaddr_storage).cast::<sockaddr>();
        let n = unsafe { t.recvfrom_raw(3, &mut buf, 0, addr, &mut len) }.unwrap();
        assert_eq!(&buf[..n], b"rdma");
        assert_eq!(len as usize, size_of::<sockaddr_in>());
        let sin = unsafe { &*(&from as *const sockaddr_storage).cast::<sockaddr_in>() };
        assert_eq!(c_int::from(sin.sin_family), libc::AF_INET);
        assert_eq!(u16::from_be(sin.sin_port), RECV_PORT);

        let mut small = [0u8; 2];
        let n = unsafe {
            t.recvfrom_raw(3, &mut small, 0, std::ptr::null_mut(), std::ptr::null_mut())
        }
        .unwrap();
        assert_eq!(&small[..n], b"rd");
    }
}
