//! Symbol lookup capability.
//!
//! The registry never calls `dlopen`/`dlsym` directly. It asks a
//! [`SymbolResolver`] to open a library and to find symbols by name, so the
//! loading primitive can be swapped (tests use in-process doubles).

use std::ffi::{CStr, c_int, c_void};
use std::ptr::NonNull;

use rsocket_core::dlfcn as dlfcn_core;

/// Opens a library and finds entry points in it.
///
/// Errors are the loader's diagnostic text.
///
/// # Safety
///
/// A pointer returned by [`lookup`](Self::lookup) for an `r`-prefixed name
/// is turned into a callable function pointer. Implementors must only return
/// addresses of functions whose C signature matches the POSIX function of the
/// same name without the `r`, and those functions must stay mapped for the
/// rest of the process.
pub unsafe trait SymbolResolver {
    /// Open `library` with dlopen `flags`.
    fn open(&mut self, library: &CStr, flags: c_int) -> Result<(), String>;

    /// Find `symbol` in the global lookup scope.
    fn lookup(&mut self, symbol: &CStr) -> Result<NonNull<c_void>, String>;

    /// Give back the handle taken by the last [`open`](Self::open).
    ///
    /// Only called after a failed load attempt under the close-on-failure
    /// policy, never once a table has been published.
    fn release(&mut self) {}
}

/// [`SymbolResolver`] backed by the platform dynamic loader.
#[derive(Debug, Default)]
pub struct DlResolver {
    handle: Option<NonNull<c_void>>,
}

// SAFETY: the handle is an opaque token owned by the dynamic loader, which is
// thread-safe. It is only touched under the registry mutex.
unsafe impl Send for DlResolver {}

impl DlResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while this resolver holds an open handle.
    #[must_use]
    pub fn holds_handle(&self) -> bool {
        self.handle.is_some()
    }
}

/// Read and clear the calling thread's dlerror state.
fn take_dlerror(fallback: &str) -> String {
    // SAFETY: dlerror returns null or a NUL-terminated string that stays valid
    // until the next dl* call on this thread; it is copied out immediately.
    let msg = unsafe { libc::dlerror() };
    if msg.is_null() {
        return fallback.to_string();
    }
    unsafe { CStr::from_ptr(msg) }
        .to_string_lossy()
        .into_owned()
}

// SAFETY: lookups go through RTLD_DEFAULT by the exported name, so the
// returned address is whatever the transport library exports under that name.
// The ABI of those exports is the library's published contract.
unsafe impl SymbolResolver for DlResolver {
    fn open(&mut self, library: &CStr, flags: c_int) -> Result<(), String> {
        if !dlfcn_core::valid_flags(flags) {
            return Err(format!("{}: invalid mode for dlopen", library.to_string_lossy()));
        }
        let _ = take_dlerror("");
        // SAFETY: `library` is a valid C string and `flags` was validated.
        let handle = unsafe { libc::dlopen(library.as_ptr(), flags) };
        match NonNull::new(handle) {
            Some(handle) => {
                // Re-opening bumps the loader's reference count; the previous
                // handle, if any, refers to the same object and stays resident.
                self.handle = Some(handle);
                Ok(())
            }
            None => Err(take_dlerror(dlfcn_core::ERR_NOT_FOUND)),
        }
    }

    fn lookup(&mut self, symbol: &CStr) -> Result<NonNull<c_void>, String> {
        let _ = take_dlerror("");
        // SAFETY: RTLD_DEFAULT is a valid pseudo-handle and `symbol` a valid
        // C string.
        let addr = unsafe { libc::dlsym(libc::RTLD_DEFAULT, symbol.as_ptr()) };
        NonNull::new(addr).ok_or_else(|| {
            take_dlerror(&format!(
                "{}: {}",
                dlfcn_core::ERR_SYMBOL_NOT_FOUND,
                symbol.to_string_lossy()
            ))
        })
    }

    fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            // SAFETY: `handle` came from a successful dlopen and is released
            // exactly once. Nothing resolved through it has been published.
            unsafe { libc::dlclose(handle.as_ptr()) };
        }
    }
}
