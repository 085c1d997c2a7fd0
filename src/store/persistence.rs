//! Sled persistence for the record store

use crate::error::{CmsError, StorageError};
use crate::store::{record_key, table_prefix, unique_key, Record};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionError, TransactionalTree};
use sled::{Db, Tree};
use std::io;
use std::path::Path;

const TREE_RECORDS: &str = "cms_records";

pub type TxResult<T> = Result<T, ConflictableTransactionError<CmsError>>;

/// Abort the running transaction with a domain error.
pub fn abort<E: Into<CmsError>>(err: E) -> ConflictableTransactionError<CmsError> {
    ConflictableTransactionError::Abort(err.into())
}

/// Sled-backed record store
#[derive(Clone)]
pub struct Store {
    db: Db,
    records: Tree,
}

impl Store {
    /// Open (or create) a store at the given directory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| {
            StorageError::IoError(io::Error::new(
                io::ErrorKind::Other,
                format!("Failed to open sled database: {}", e),
            ))
        })?;
        Self::from_db(db)
    }

    /// In-memory store removed on drop.
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(to_storage_io)?;
        Self::from_db(db)
    }

    pub fn from_db(db: Db) -> Result<Self, StorageError> {
        let records = db.open_tree(TREE_RECORDS).map_err(to_storage_io)?;
        Ok(Self { db, records })
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    /// Allocate a fresh, non-zero record id.
    pub fn next_id(&self) -> Result<u64, StorageError> {
        Ok(self.db.generate_id().map_err(to_storage_io)? + 1)
    }

    pub fn get<T: Record>(&self, id: u64) -> Result<Option<T>, StorageError> {
        self.get_key(&T::key_for(id))
    }

    pub fn require<T: Record>(&self, id: u64) -> Result<T, StorageError> {
        self.get(id)?
            .ok_or_else(|| StorageError::not_found(T::TABLE, id))
    }

    /// Non-transactional single-row write.
    pub fn put<T: Record>(&self, record: &T) -> Result<(), StorageError> {
        self.put_key(&T::key_for(record.record_id()), record)
    }

    /// All rows of a table in id order.
    pub fn scan<T: Record>(&self) -> Result<Vec<T>, StorageError> {
        self.scan_values(&table_prefix(T::TABLE))
    }

    pub fn get_key<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.records.get(key.as_bytes()).map_err(to_storage_io)? else {
            return Ok(None);
        };
        decode(key, &raw).map(Some)
    }

    pub fn put_key<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let bytes = encode(key, value)?;
        self.records
            .insert(key.as_bytes(), bytes)
            .map_err(to_storage_io)?;
        Ok(())
    }

    pub fn contains_key(&self, key: &str) -> Result<bool, StorageError> {
        self.records
            .contains_key(key.as_bytes())
            .map_err(to_storage_io)
    }

    pub fn scan_values<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>, StorageError> {
        let mut out = Vec::new();
        for item in self.records.scan_prefix(prefix.as_bytes()) {
            let (key, value) = item.map_err(to_storage_io)?;
            let key = String::from_utf8_lossy(&key);
            out.push(decode(&key, &value)?);
        }
        Ok(out)
    }

    pub fn scan_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut out = Vec::new();
        for item in self.records.scan_prefix(prefix.as_bytes()) {
            let (key, _) = item.map_err(to_storage_io)?;
            out.push(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(out)
    }

    /// Owner id currently holding a unique key.
    pub fn unique_owner(&self, index: &str, key: &str) -> Result<Option<u64>, StorageError> {
        self.get_key(&unique_key(index, key))
    }

    /// Run `f` as one atomic unit. Sled may call `f` several times on conflict,
    /// so it must not have side effects outside the transaction.
    pub fn transact<R, F>(&self, f: F) -> Result<R, CmsError>
    where
        F: Fn(&Tx<'_>) -> TxResult<R>,
    {
        self.records
            .transaction(|tree| f(&Tx { tree }))
            .map_err(|err| match err {
                TransactionError::Abort(e) => e,
                TransactionError::Storage(e) => CmsError::Storage(to_storage_io(e)),
            })
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush().map_err(to_storage_io)?;
        Ok(())
    }
}

/// Transactional view of the record keyspace.
pub struct Tx<'a> {
    tree: &'a TransactionalTree,
}

impl Tx<'_> {
    pub fn get<T: Record>(&self, id: u64) -> TxResult<Option<T>> {
        self.get_key(&T::key_for(id))
    }

    pub fn require<T: Record>(&self, id: u64) -> TxResult<T> {
        self.get(id)?
            .ok_or_else(|| abort(StorageError::not_found(T::TABLE, id)))
    }

    pub fn put<T: Record>(&self, record: &T) -> TxResult<()> {
        self.put_key(&T::key_for(record.record_id()), record)
    }

    pub fn delete<T: Record>(&self, id: u64) -> TxResult<()> {
        self.remove_key(&record_key(T::TABLE, id))
    }

    pub fn get_key<T: DeserializeOwned>(&self, key: &str) -> TxResult<Option<T>> {
        match self.tree.get(key.as_bytes())? {
            Some(raw) => decode(key, &raw).map(Some).map_err(abort),
            None => Ok(None),
        }
    }

    pub fn put_key<T: Serialize>(&self, key: &str, value: &T) -> TxResult<()> {
        let bytes = encode(key, value).map_err(abort)?;
        self.tree.insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    pub fn remove_key(&self, key: &str) -> TxResult<()> {
        self.tree.remove(key.as_bytes())?;
        Ok(())
    }

    pub fn unique_owner(&self, index: &str, key: &str) -> TxResult<Option<u64>> {
        self.get_key(&unique_key(index, key))
    }

    /// Claim a unique key for `owner`. Re-claiming by the same owner is a no-op.
    pub fn claim_unique(&self, index: &'static str, key: &str, owner: u64) -> TxResult<()> {
        match self.unique_owner(index, key)? {
            Some(existing) if existing != owner => Err(abort(StorageError::UniqueViolation {
                index,
                key: key.to_string(),
            })),
            Some(_) => Ok(()),
            None => self.put_key(&unique_key(index, key), &owner),
        }
    }

    /// Release a unique key, but only if `owner` holds it.
    pub fn release_unique(&self, index: &str, key: &str, owner: u64) -> TxResult<()> {
        if self.unique_owner(index, key)? == Some(owner) {
            self.remove_key(&unique_key(index, key))?;
        }
        Ok(())
    }
}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<Vec<u8>, StorageError> {
    bincode::serialize(value).map_err(|e| StorageError::Corrupt {
        key: key.to_string(),
        reason: format!("Failed to serialize record: {}", e),
    })
}

fn decode<T: DeserializeOwned>(key: &str, raw: &[u8]) -> Result<T, StorageError> {
    bincode::deserialize(raw).map_err(|e| StorageError::Corrupt {
        key: key.to_string(),
        reason: format!("Failed to deserialize record: {}", e),
    })
}

pub(crate) fn to_storage_io(err: sled::Error) -> StorageError {
    StorageError::IoError(io::Error::new(io::ErrorKind::Other, err.to_string()))
}
