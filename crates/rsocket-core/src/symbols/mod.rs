//! Catalogue of the rsocket entry points.
//!
//! Every symbol the loader binds is listed here once, in resolution order.
//! The loader walks [`RsocketSymbol::ALL`] front to back and stops at the
//! first symbol it cannot resolve.

/// Number of entry points bound from the transport library.
pub const SYMBOL_COUNT: usize = 20;

/// An `r`-prefixed entry point exported by the transport library.
///
/// Each one is signature-compatible with the POSIX function of the same name
/// minus the leading `r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(usize)]
pub enum RsocketSymbol {
    Socket,
    Fcntl,
    Listen,
    Bind,
    Connect,
    GetSockName,
    GetSockOpt,
    SetSockOpt,
    Shutdown,
    Poll,
    Send,
    Accept,
    Close,
    Read,
    Readv,
    Write,
    Writev,
    Recv,
    RecvFrom,
    SendTo,
}

impl RsocketSymbol {
    /// All symbols in the order the loader resolves them.
    pub const ALL: [RsocketSymbol; SYMBOL_COUNT] = [
        Self::Socket,
        Self::Fcntl,
        Self::Listen,
        Self::Bind,
        Self::Connect,
        Self::GetSockName,
        Self::GetSockOpt,
        Self::SetSockOpt,
        Self::Shutdown,
        Self::Poll,
        Self::Send,
        Self::Accept,
        Self::Close,
        Self::Read,
        Self::Readv,
        Self::Write,
        Self::Writev,
        Self::Recv,
        Self::RecvFrom,
        Self::SendTo,
    ];

    /// Exported symbol name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Socket => "rsocket",
            Self::Fcntl => "rfcntl",
            Self::Listen => "rlisten",
            Self::Bind => "rbind",
            Self::Connect => "rconnect",
            Self::GetSockName => "rgetsockname",
            Self::GetSockOpt => "rgetsockopt",
            Self::SetSockOpt => "rsetsockopt",
            Self::Shutdown => "rshutdown",
            Self::Poll => "rpoll",
            Self::Send => "rsend",
            Self::Accept => "raccept",
            Self::Close => "rclose",
            Self::Read => "rread",
            Self::Readv => "rreadv",
            Self::Write => "rwrite",
            Self::Writev => "rwritev",
            Self::Recv => "rrecv",
            Self::RecvFrom => "rrecvfrom",
            Self::SendTo => "rsendto",
        }
    }

    /// NUL-terminated symbol name, ready for `dlsym`.
    #[must_use]
    pub const fn c_name(self) -> &'static [u8] {
        match self {
            Self::Socket => b"rsocket\0",
            Self::Fcntl => b"rfcntl\0",
            Self::Listen => b"rlisten\0",
            Self::Bind => b"rbind\0",
            Self::Connect => b"rconnect\0",
            Self::GetSockName => b"rgetsockname\0",
            Self::GetSockOpt => b"rgetsockopt\0",
            Self::SetSockOpt => b"rsetsockopt\0",
            Self::Shutdown => b"rshutdown\0",
            Self::Poll => b"rpoll\0",
            Self::Send => b"rsend\0",
            Self::Accept => b"raccept\0",
            Self::Close => b"rclose\0",
            Self::Read => b"rread\0",
            Self::Readv => b"rreadv\0",
            Self::Write => b"rwrite\0",
            Self::Writev => b"rwritev\0",
            Self::Recv => b"rrecv\0",
            Self::RecvFrom => b"rrecvfrom\0",
            Self::SendTo => b"rsendto\0",
        }
    }

    /// The POSIX function this entry point stands in for.
    #[must_use]
    pub fn posix_name(self) -> &'static str {
        &self.name()[1..]
    }

    /// Position in the resolution order.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look a symbol up by its exported name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|sym| sym.name() == name)
    }
}

impl std::fmt::Display for RsocketSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
