//! Contents and the essences they own.
//!
//! Every content holds one essence reference. The `(essence_type, essence_id)`
//! pair is claimed in the `essence_owner` unique index in the same transaction
//! that writes the content, so an essence can never be owned twice.

use crate::composition::{Content, Element};
use crate::error::{CmsError, EssenceError, StorageError, ValidationError};
use crate::essence::{CompositionLookup, Essence, EssenceKind, EssenceRecord, EssenceRef, EssenceValue};
use crate::page::Page;
use crate::store::{
    abort, index_key, index_member, index_prefix, Store, Tx, TxResult, IDX_ATTACHMENT,
    IDX_PICTURE, UNIQ_ESSENCE_OWNER,
};
use crate::types::{now_millis, ContentId, ElementId, EssenceId, PageId};
use tracing::{debug, info, warn};

impl Store {
    pub fn content(&self, id: ContentId) -> Result<Option<Content>, StorageError> {
        self.get(id.get())
    }

    /// Contents of an element in position order.
    pub fn contents_of(&self, element: ElementId) -> Result<Vec<Content>, StorageError> {
        self.require_element(element)?
            .contents
            .iter()
            .map(|id| self.require(id.get()))
            .collect()
    }

    pub fn essence(&self, essence: EssenceRef) -> Result<Option<EssenceRecord>, StorageError> {
        let record: Option<EssenceRecord> = self.get_key(&essence.storage_key())?;
        Ok(record.filter(|r| r.value.kind() == essence.kind))
    }

    /// The content owning `essence`, if it is attached.
    pub fn content_for_essence(&self, essence: EssenceRef) -> Result<Option<Content>, StorageError> {
        match self.unique_owner(UNIQ_ESSENCE_OWNER, &essence.owner_key())? {
            Some(id) => self.get(id),
            None => Ok(None),
        }
    }

    /// Store an essence that no content owns yet.
    pub fn create_essence(&self, value: EssenceValue) -> Result<EssenceRecord, CmsError> {
        value.validate()?;
        let record = new_essence_record(EssenceId(self.next_id()?), value);
        self.transact(|tx| write_essence(tx, &record, None))?;
        debug!(essence = %record.essence_ref(), "Created essence");
        Ok(record)
    }

    /// Append a content backed by a new essence to `element`.
    pub fn create_content(
        &self,
        element: ElementId,
        name: &str,
        value: EssenceValue,
    ) -> Result<(Content, EssenceRecord), CmsError> {
        if name.trim().is_empty() {
            return Err(ValidationError::single("Name can't be blank").into());
        }
        value.validate()?;
        let content_id = ContentId(self.next_id()?);
        let essence = new_essence_record(EssenceId(self.next_id()?), value);
        let essence_ref = essence.essence_ref();

        let content = self.transact(|tx| {
            write_essence(tx, &essence, None)?;
            push_content(tx, element, content_id, name, essence_ref)
        })?;

        info!(content_id = %content_id, essence = %essence_ref, "Created content");
        Ok((content, essence))
    }

    /// Append a content to `element` that takes over an existing, unowned
    /// essence. Fails with a unique violation when another content owns it.
    pub fn attach_existing_essence(
        &self,
        element: ElementId,
        name: &str,
        essence: EssenceRef,
    ) -> Result<Content, CmsError> {
        if name.trim().is_empty() {
            return Err(ValidationError::single("Name can't be blank").into());
        }
        let content_id = ContentId(self.next_id()?);
        let content = self.transact(|tx| {
            let stored: Option<EssenceRecord> = tx.get_key(&essence.storage_key())?;
            if stored.filter(|r| r.value.kind() == essence.kind).is_none() {
                return Err(abort(StorageError::not_found("essence", essence.id.get())));
            }
            push_content(tx, element, content_id, name, essence)
        })?;
        info!(content_id = %content_id, essence = %essence, "Attached essence");
        Ok(content)
    }

    /// Delete a content together with its essence and close the gap among the
    /// element's remaining contents.
    pub fn delete_content(&self, id: ContentId) -> Result<(), CmsError> {
        self.transact(|tx| {
            let content: Content = tx.require(id.get())?;
            let mut element: Element = tx.require(content.element_id.get())?;
            element.contents.retain(|c| *c != id);
            element.updated_at = now_millis();
            tx.put(&element)?;
            for (index, remaining) in element.contents.iter().enumerate() {
                let mut sibling: Content = tx.require(remaining.get())?;
                let position = index as u32 + 1;
                if sibling.position != position {
                    sibling.position = position;
                    tx.put(&sibling)?;
                }
            }
            delete_content_rows(tx, id)
        })?;
        info!(content_id = %id, "Deleted content");
        Ok(())
    }

    /// Change an essence in place. `change` may run more than once when the
    /// transaction is retried, and must leave the essence type unchanged.
    pub fn update_essence<F>(&self, essence: EssenceRef, change: F) -> Result<EssenceRecord, CmsError>
    where
        F: Fn(&mut EssenceValue) -> Result<(), EssenceError>,
    {
        let record = self.transact(|tx| {
            let Some(previous) = tx.get_key::<EssenceRecord>(&essence.storage_key())? else {
                return Err(abort(StorageError::not_found("essence", essence.id.get())));
            };
            let mut updated = previous.clone();
            change(&mut updated.value).map_err(abort)?;
            if updated.value.kind() != essence.kind {
                return Err(abort(EssenceError::InvalidValue {
                    key: "essence_type".to_string(),
                    reason: format!("cannot change {} into {}", essence.kind, updated.value.kind()),
                }));
            }
            updated.value.validate().map_err(abort)?;
            updated.updated_at = now_millis();
            write_essence(tx, &updated, Some(&previous))?;
            Ok(updated)
        })?;
        debug!(essence = %essence, "Updated essence");
        Ok(record)
    }

    /// Picture essences referencing `picture_id`.
    pub fn essences_for_picture(&self, picture_id: u64) -> Result<Vec<EssenceRecord>, StorageError> {
        self.indexed_essences(IDX_PICTURE, picture_id, EssenceKind::Picture)
    }

    /// File essences referencing `attachment_id`.
    pub fn essences_for_attachment(
        &self,
        attachment_id: u64,
    ) -> Result<Vec<EssenceRecord>, StorageError> {
        self.indexed_essences(IDX_ATTACHMENT, attachment_id, EssenceKind::File)
    }

    fn indexed_essences(
        &self,
        index: &str,
        target: u64,
        kind: EssenceKind,
    ) -> Result<Vec<EssenceRecord>, StorageError> {
        let mut out = Vec::new();
        for key in self.scan_keys(&index_prefix(index, target))? {
            let Some(id) = index_member(&key) else {
                warn!(key = %key, "Skipping malformed index key");
                continue;
            };
            if let Some(record) = self.essence(EssenceRef::new(EssenceId(id), kind))? {
                out.push(record);
            }
        }
        Ok(out)
    }
}

impl CompositionLookup for Store {
    fn lookup_owning_content(&self, essence: EssenceRef) -> Result<Option<Content>, StorageError> {
        self.content_for_essence(essence)
    }

    fn lookup_element(&self, id: ElementId) -> Result<Option<Element>, StorageError> {
        self.element(id)
    }

    fn lookup_page(&self, id: PageId) -> Result<Option<Page>, StorageError> {
        self.page(id)
    }
}

fn new_essence_record(id: EssenceId, value: EssenceValue) -> EssenceRecord {
    let now = now_millis();
    EssenceRecord {
        id,
        value,
        created_at: now,
        updated_at: now,
    }
}

/// Write an essence and move its reverse index entries from `previous`.
fn write_essence(tx: &Tx<'_>, record: &EssenceRecord, previous: Option<&EssenceRecord>) -> TxResult<()> {
    if let Some(previous) = previous {
        remove_reverse_index(tx, previous)?;
    }
    tx.put_key(&record.essence_ref().storage_key(), record)?;
    let id = record.id.get();
    if let Some(picture) = record.value.picture_id() {
        tx.put_key(&index_key(IDX_PICTURE, picture, id), &())?;
    }
    if let Some(attachment) = record.value.attachment_id() {
        tx.put_key(&index_key(IDX_ATTACHMENT, attachment, id), &())?;
    }
    Ok(())
}

fn remove_reverse_index(tx: &Tx<'_>, record: &EssenceRecord) -> TxResult<()> {
    let id = record.id.get();
    if let Some(picture) = record.value.picture_id() {
        tx.remove_key(&index_key(IDX_PICTURE, picture, id))?;
    }
    if let Some(attachment) = record.value.attachment_id() {
        tx.remove_key(&index_key(IDX_ATTACHMENT, attachment, id))?;
    }
    Ok(())
}

/// Claim `essence` for a new content and append that content to `element`.
fn push_content(
    tx: &Tx<'_>,
    element: ElementId,
    content_id: ContentId,
    name: &str,
    essence: EssenceRef,
) -> TxResult<Content> {
    let mut owner: Element = tx.require(element.get())?;
    tx.claim_unique(UNIQ_ESSENCE_OWNER, &essence.owner_key(), content_id.get())?;
    owner.contents.push(content_id);
    owner.updated_at = now_millis();
    let content = Content {
        id: content_id,
        element_id: element,
        name: name.to_string(),
        position: owner.contents.len() as u32,
        essence,
    };
    tx.put(&content)?;
    tx.put(&owner)?;
    Ok(content)
}

/// Remove a content row, its essence and every index entry pointing at them.
/// The owning element's list is left to the caller.
pub(crate) fn delete_content_rows(tx: &Tx<'_>, id: ContentId) -> TxResult<()> {
    let content: Content = tx.require(id.get())?;
    let essence = content.essence;
    tx.release_unique(UNIQ_ESSENCE_OWNER, &essence.owner_key(), id.get())?;
    if let Some(record) = tx.get_key::<EssenceRecord>(&essence.storage_key())? {
        remove_reverse_index(tx, &record)?;
        tx.remove_key(&essence.storage_key())?;
    }
    tx.delete::<Content>(id.get())
}
