//! C entry points for native callers.
//!
//! `rsocket_shim_load` is the C-visible form of [`ensure_loaded`]. Its
//! diagnostic is kept per thread and handed out by `rsocket_shim_error` with
//! `dlerror` semantics: reading clears it, and the returned string stays
//! valid until the next `rsocket_shim_error` call on the same thread.
//!
//! `rsocket_shim_table` hands out the bound [`RsocketTable`]. Its C layout is
//! one function pointer per entry in resolution order:
//!
//! ```text
//! struct rsocket_table {
//!     int (*socket)(int, int, int);
//!     int (*fcntl)(int, int, ...);
//!     int (*listen)(int, int);
//!     ...
//!     ssize_t (*sendto)(int, const void *, size_t, int,
//!                       const struct sockaddr *, socklen_t);
//! };
//! ```

use std::cell::RefCell;
use std::ffi::{CString, c_char, c_int};

use crate::registry::{ensure_loaded, is_loaded, rsocket_table};
use crate::table::RsocketTable;

// ---------------------------------------------------------------------------
// Thread-local error state
// ---------------------------------------------------------------------------

std::thread_local! {
    static PENDING_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
    static REPORTED_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_error(msg: &str) {
    // CString rejects interior NULs.
    let msg = CString::new(msg.replace('\0', "")).unwrap_or_default();
    PENDING_ERROR.with(|cell| *cell.borrow_mut() = Some(msg));
}

fn clear_error() {
    PENDING_ERROR.with(|cell| *cell.borrow_mut() = None);
}

// ---------------------------------------------------------------------------
// rsocket_shim_load
// ---------------------------------------------------------------------------

/// Bind the rsocket entry points. Returns 1 on success and 0 on failure, in
/// which case `rsocket_shim_error` describes why.
#[unsafe(no_mangle)]
pub extern "C" fn rsocket_shim_load() -> c_int {
    match ensure_loaded() {
        Ok(_) => {
            clear_error();
            1
        }
        Err(err) => {
            set_error(err.reason());
            0
        }
    }
}

// ---------------------------------------------------------------------------
// rsocket_shim_error
// ---------------------------------------------------------------------------

/// Diagnostic of the last failed `rsocket_shim_load` on this thread, or null.
#[unsafe(no_mangle)]
pub extern "C" fn rsocket_shim_error() -> *const c_char {
    let pending = PENDING_ERROR.with(|cell| cell.borrow_mut().take());
    REPORTED_ERROR.with(|cell| {
        let mut reported = cell.borrow_mut();
        *reported = pending;
        reported
            .as_ref()
            .map_or(std::ptr::null(), |msg| msg.as_ptr())
    })
}

// ---------------------------------------------------------------------------
// rsocket_shim_is_loaded
// ---------------------------------------------------------------------------

/// 1 once the entry points are bound, otherwise 0. Never attempts a load.
#[unsafe(no_mangle)]
pub extern "C" fn rsocket_shim_is_loaded() -> c_int {
    c_int::from(is_loaded())
}

// ---------------------------------------------------------------------------
// rsocket_shim_table
// ---------------------------------------------------------------------------

/// The bound table, or null until `rsocket_shim_load` has succeeded. Once
/// non-null the pointer stays valid for the life of the process.
#[unsafe(no_mangle)]
pub extern "C" fn rsocket_shim_table() -> *const RsocketTable {
    rsocket_table().map_or(std::ptr::null(), std::ptr::from_ref)
}
