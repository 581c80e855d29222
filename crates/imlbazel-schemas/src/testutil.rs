//! Shared proptest strategies for schema tests.

use camino::Utf8PathBuf;
use proptest::prelude::*;

/// Strategy for generating arbitrary module or library names.
pub fn arb_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_.-]{0,15}"
}

/// Strategy for generating arbitrary absolute paths inside `/ws`.
pub fn arb_path() -> impl Strategy<Value = Utf8PathBuf> {
    proptest::collection::vec("[a-z][a-z0-9_]{0,7}", 1..4)
        .prop_map(|segments| Utf8PathBuf::from(format!("/ws/{}", segments.join("/"))))
}
