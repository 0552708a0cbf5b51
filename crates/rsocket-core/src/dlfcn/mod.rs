//! Dynamic linking: constants and validators for loading the transport.
//!
//! The loader opens the transport library with [`LOAD_FLAGS`] so that its
//! symbols join the global lookup scope, then resolves each entry point
//! through the `RTLD_DEFAULT` pseudo-handle.

/// dlopen mode flags.
pub const RTLD_LAZY: i32 = 0x00001;
pub const RTLD_NOW: i32 = 0x00002;
pub const RTLD_GLOBAL: i32 = 0x00100;
pub const RTLD_LOCAL: i32 = 0x00000;
pub const RTLD_NOLOAD: i32 = 0x00004;
pub const RTLD_NODELETE: i32 = 0x01000;

/// Soname of the RDMA connection manager library that exports `rsocket` et al.
pub const DEFAULT_LIBRARY: &str = "librdmacm.so.1";

/// Mode used to open the transport library.
pub const LOAD_FLAGS: i32 = RTLD_GLOBAL | RTLD_LAZY;

/// Valid binding mode bits (exactly one of LAZY or NOW must be set).
const BINDING_MASK: i32 = RTLD_LAZY | RTLD_NOW;

/// Valid modifier bits.
const MODIFIER_MASK: i32 = RTLD_GLOBAL | RTLD_LOCAL | RTLD_NOLOAD | RTLD_NODELETE;

/// Returns `true` if `flags` represent a valid dlopen mode.
///
/// POSIX requires exactly one of RTLD_LAZY or RTLD_NOW to be set.
#[inline]
pub fn valid_flags(flags: i32) -> bool {
    let binding = flags & BINDING_MASK;
    let modifiers = flags & !BINDING_MASK;
    (binding == RTLD_LAZY || binding == RTLD_NOW) && (modifiers & !MODIFIER_MASK) == 0
}

/// Returns `true` if `flags` publish the library's symbols to the global scope,
/// which is what a lookup through `RTLD_DEFAULT` needs.
#[inline]
pub fn exports_globally(flags: i32) -> bool {
    valid_flags(flags) && flags & RTLD_GLOBAL != 0
}

/// Returns `true` if `name` is usable as a dlopen filename.
///
/// Empty names would open the main program, and interior NULs cannot be
/// passed through a C string.
#[inline]
pub fn valid_library_name(name: &str) -> bool {
    !name.is_empty() && !name.as_bytes().contains(&0)
}

/// Fallback diagnostics when the dynamic loader fails without a message.
pub const ERR_NOT_FOUND: &str = "shared object not found";
pub const ERR_SYMBOL_NOT_FOUND: &str = "undefined symbol";
pub const ERR_INVALID_NAME: &str = "invalid library name";

/// Reported when the configured mode would keep the library's symbols out of
/// the global scope.
pub const ERR_LOCAL_SCOPE: &str =
    "dlopen mode must include RTLD_GLOBAL and one of RTLD_LAZY or RTLD_NOW";
