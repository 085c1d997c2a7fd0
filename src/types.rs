//! Record identifiers.
//!
//! Every table gets its own id newtype so a page id can never be passed where
//! an element id is expected. Ids are allocated by the store and are never 0.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Identifier of a [`crate::language::Language`].
    LanguageId
);
record_id!(
    /// Identifier of a [`crate::page::Page`].
    PageId
);
record_id!(
    /// Identifier of a [`crate::composition::Cell`].
    CellId
);
record_id!(
    /// Identifier of a [`crate::composition::Element`].
    ElementId
);
record_id!(
    /// Identifier of a [`crate::composition::Content`].
    ContentId
);
record_id!(
    /// Identifier of an essence record, unique only together with its kind.
    EssenceId
);

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
