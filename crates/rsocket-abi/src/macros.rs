//! Helper macros for binding-table generation.
//!
//! Provides the `rsocket_table!` macro that declares one typed field per
//! catalogue symbol together with the conversions that walk the catalogue.

/// Declare the binding table.
///
/// # Usage
///
/// ```ignore
/// rsocket_table! {
///     /// Doc comment for the table.
///     pub struct RsocketTable {
///         socket: Socket => RsocketFn,
///     }
/// }
/// ```
///
/// The struct is `#[repr(C)]`, so C callers see one function pointer per
/// entry, in declaration order.
///
/// Every `RsocketSymbol` variant must appear. The generated `address` match
/// is exhaustive, so a missing entry fails to compile.
macro_rules! rsocket_table {
    (
        $(#[$meta:meta])*
        pub struct $table:ident {
            $( $field:ident : $sym:ident => $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(C)]
        #[derive(Clone, Copy)]
        pub struct $table {
            $( pub $field: $ty, )*
        }

        impl $table {
            /// Build the table from fully resolved addresses, indexed by
            /// [`RsocketSymbol::index`].
            ///
            /// # Safety
            ///
            /// Each address must be a function with the signature of its slot
            /// that stays mapped for the life of the process.
            pub(crate) unsafe fn from_resolved(
                slots: &[NonNull<c_void>; SYMBOL_COUNT],
            ) -> Self {
                Self {
                    $(
                        $field: unsafe {
                            std::mem::transmute::<*mut c_void, $ty>(
                                slots[RsocketSymbol::$sym.index()].as_ptr(),
                            )
                        },
                    )*
                }
            }

            /// Address bound to `symbol`.
            #[must_use]
            pub fn address(&self, symbol: RsocketSymbol) -> *const c_void {
                match symbol {
                    $( RsocketSymbol::$sym => self.$field as *const c_void, )*
                }
            }
        }
    };
}
