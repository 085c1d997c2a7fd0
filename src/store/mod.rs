//! Record Store
//!
//! All tables live in one sled keyspace. Records are keyed by table prefix and a
//! zero-padded id so prefix scans come back in id order. Unique constraints are
//! `uniq:` keys claimed inside the same transaction that writes the record, and
//! reverse lookups are `idx:` keys holding no value.

pub mod persistence;

pub use persistence::{abort, Store, Tx, TxResult};

use serde::de::DeserializeOwned;
use serde::Serialize;

const ID_PAD: usize = 20;

/// Unique index: language code -> language id.
pub const UNIQ_LANGUAGE_CODE: &str = "language_code";
/// Unique index: the single default language.
pub const UNIQ_DEFAULT_LANGUAGE: &str = "default_language";
/// Unique index: language id -> its language-root page.
pub const UNIQ_LANGUAGE_ROOT: &str = "language_root";
/// Unique index: the single global root page.
pub const UNIQ_GLOBAL_ROOT: &str = "global_root";
/// Unique index: (essence_type, essence_id) -> owning content id.
pub const UNIQ_ESSENCE_OWNER: &str = "essence_owner";

/// Reverse index: picture id -> picture essences.
pub const IDX_PICTURE: &str = "picture";
/// Reverse index: attachment id -> file essences.
pub const IDX_ATTACHMENT: &str = "attachment";

/// A stored table row.
pub trait Record: Serialize + DeserializeOwned {
    /// Key prefix of the table.
    const TABLE: &'static str;

    fn record_id(&self) -> u64;

    fn key_for(id: u64) -> String {
        record_key(Self::TABLE, id)
    }
}

pub fn record_key(table: &str, id: u64) -> String {
    format!("{table}:{id:0ID_PAD$}")
}

pub fn table_prefix(table: &str) -> String {
    format!("{table}:")
}

pub fn unique_key(index: &str, key: &str) -> String {
    format!("uniq:{index}:{key}")
}

pub fn index_key(index: &str, target: u64, member: u64) -> String {
    format!("idx:{index}:{target:0ID_PAD$}:{member:0ID_PAD$}")
}

pub fn index_prefix(index: &str, target: u64) -> String {
    format!("idx:{index}:{target:0ID_PAD$}:")
}

pub fn index_prefix_all(index: &str) -> String {
    format!("idx:{index}:")
}

/// Parse the trailing member id of an `idx:` key.
pub fn index_member(key: &str) -> Option<u64> {
    key.rsplit(':').next().and_then(|s| s.parse().ok())
}

/// Keys of the `uniq:` namespace for one index.
pub fn unique_prefix(index: &str) -> String {
    format!("uniq:{index}:")
}

pub fn meta_key(name: &str) -> String {
    format!("meta:{name}")
}
