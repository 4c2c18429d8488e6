//! Keyed sections keep insertion order with `preserve_order`, key order otherwise.

cfg_if::cfg_if! {
    if #[cfg(feature = "preserve_order")] {
        pub use indexmap::IndexMap as Map;
    } else {
        pub use std::collections::BTreeMap as Map;
    }
}
