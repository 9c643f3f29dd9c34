use std::collections::BTreeSet;

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::error::{Result, StoreError};
use super::ids::IdGenerator;
use super::kv::KeyValueStore;
use crate::models::photo::encode_data_url;
use crate::models::{Note, Photo, ShopRecord};

/// How many times a mutation is re-applied when the value changed between
/// read and write.
const MAX_WRITE_ATTEMPTS: usize = 3;

pub fn notes_key(shop_id: i64) -> String {
    format!("shop_{}_notes", shop_id)
}

pub fn photos_key(shop_id: i64) -> String {
    format!("shop_{}_photos", shop_id)
}

/// Parse `shop_<id>_notes` / `shop_<id>_photos` back into the shop id.
fn shop_id_from_key(key: &str) -> Option<i64> {
    let rest = key.strip_prefix("shop_")?;
    let id = rest
        .strip_suffix("_notes")
        .or_else(|| rest.strip_suffix("_photos"))?;
    id.parse().ok()
}

/// Notes and photos for every shop, on top of a key/value backend.
pub struct ShopStore<S> {
    kv: S,
    ids: IdGenerator,
}

impl<S: KeyValueStore> ShopStore<S> {
    pub fn new(kv: S) -> Self {
        Self {
            kv,
            ids: IdGenerator::new(),
        }
    }

    pub fn backend(&self) -> &S {
        &self.kv
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<(Option<String>, Vec<T>)> {
        let raw = self.kv.get(key)?;
        let items = match raw.as_deref() {
            None => Vec::new(),
            Some(json) => serde_json::from_str(json).map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            })?,
        };
        Ok((raw, items))
    }

    /// Read-modify-write of one key. `change` returns `None` when it made no
    /// change, in which case nothing is written.
    fn mutate<T, R>(
        &self,
        key: &str,
        mut change: impl FnMut(&mut Vec<T>) -> Result<Option<R>>,
    ) -> Result<(Vec<T>, Option<R>)>
    where
        T: Serialize + DeserializeOwned,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let (raw, mut items) = self.read::<T>(key)?;
            let outcome = match change(&mut items)? {
                Some(outcome) => outcome,
                None => return Ok((items, None)),
            };

            let json = serde_json::to_string(&items)?;
            if self.kv.compare_and_set(key, raw.as_deref(), &json)? {
                debug!(key, entries = items.len(), "Saved collection");
                return Ok((items, Some(outcome)));
            }
            warn!(key, attempt, "Collection changed during write, retrying");
        }
        Err(StoreError::Conflict {
            key: key.to_string(),
        })
    }

    fn next_id(&self, key: &str, max_existing: Option<i64>) -> Result<i64> {
        self.ids
            .next_after(max_existing)
            .ok_or_else(|| StoreError::IdsExhausted {
                key: key.to_string(),
            })
    }

    // ===== Notes =====

    pub fn notes(&self, shop_id: i64) -> Result<Vec<Note>> {
        Ok(self.read(&notes_key(shop_id))?.1)
    }

    /// Append a note; the text is stored trimmed. Returns the full collection.
    pub fn add_note(&self, shop_id: i64, text: &str) -> Result<Vec<Note>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::EmptyNote);
        }

        let key = notes_key(shop_id);
        let (notes, _) = self.mutate(&key, |notes: &mut Vec<Note>| {
            let id = self.next_id(&key, notes.iter().map(|n| n.id).max())?;
            notes.push(Note::new(id, text, Utc::now()));
            Ok(Some(id))
        })?;
        info!(shop_id, "Note added");
        Ok(notes)
    }

    pub fn edit_note(&self, shop_id: i64, note_id: i64, text: &str) -> Result<Vec<Note>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::EmptyNote);
        }

        let key = notes_key(shop_id);
        let (notes, _) = self.mutate(&key, |notes: &mut Vec<Note>| {
            let note = notes
                .iter_mut()
                .find(|n| n.id == note_id)
                .ok_or_else(|| StoreError::NotFound {
                    key: key.clone(),
                    id: note_id,
                })?;
            note.edit(text, Utc::now());
            Ok(Some(()))
        })?;
        info!(shop_id, note_id, "Note updated");
        Ok(notes)
    }

    /// Remove the note with `note_id`. Returns the collection and whether a
    /// note was removed.
    pub fn delete_note(&self, shop_id: i64, note_id: i64) -> Result<(Vec<Note>, bool)> {
        let (notes, removed) = self.mutate(&notes_key(shop_id), |notes: &mut Vec<Note>| {
            Ok(remove_first(notes, |n| n.id == note_id))
        })?;
        if removed.is_some() {
            info!(shop_id, note_id, "Note deleted");
        }
        Ok((notes, removed.is_some()))
    }

    // ===== Photos =====

    pub fn photos(&self, shop_id: i64) -> Result<Vec<Photo>> {
        Ok(self.read(&photos_key(shop_id))?.1)
    }

    pub fn add_photo(&self, shop_id: i64, image: &[u8], mime: &str) -> Result<Vec<Photo>> {
        let data_url = encode_data_url(image, mime);
        let key = photos_key(shop_id);
        let (photos, _) = self.mutate(&key, |photos: &mut Vec<Photo>| {
            let id = self.next_id(&key, photos.iter().map(|p| p.id).max())?;
            photos.push(Photo::new(id, data_url.clone(), Utc::now()));
            Ok(Some(id))
        })?;
        info!(shop_id, bytes = image.len(), "Photo added");
        Ok(photos)
    }

    /// Replace a photo's image with a new capture.
    pub fn edit_photo(&self, shop_id: i64, photo_id: i64, image: &[u8], mime: &str) -> Result<Vec<Photo>> {
        let data_url = encode_data_url(image, mime);
        let key = photos_key(shop_id);
        let (photos, _) = self.mutate(&key, |photos: &mut Vec<Photo>| {
            let photo = photos
                .iter_mut()
                .find(|p| p.id == photo_id)
                .ok_or_else(|| StoreError::NotFound {
                    key: key.clone(),
                    id: photo_id,
                })?;
            photo.retake(data_url.clone(), Utc::now());
            Ok(Some(()))
        })?;
        info!(shop_id, photo_id, "Photo updated");
        Ok(photos)
    }

    pub fn delete_photo(&self, shop_id: i64, photo_id: i64) -> Result<(Vec<Photo>, bool)> {
        let (photos, removed) = self.mutate(&photos_key(shop_id), |photos: &mut Vec<Photo>| {
            Ok(remove_first(photos, |p| p.id == photo_id))
        })?;
        if removed.is_some() {
            info!(shop_id, photo_id, "Photo deleted");
        }
        Ok((photos, removed.is_some()))
    }

    // ===== Shops =====

    /// Fill in a fetched shop's notes and photos from storage.
    pub fn attach(&self, shop: &mut ShopRecord) -> Result<()> {
        shop.notes = self.notes(shop.id)?;
        shop.photos = self.photos(shop.id)?;
        Ok(())
    }

    /// Every shop id with stored notes or photos, in or out of range.
    pub fn stored_shop_ids(&self) -> Result<BTreeSet<i64>> {
        Ok(self
            .kv
            .keys()?
            .iter()
            .filter_map(|k| shop_id_from_key(k))
            .collect())
    }

    /// Drop everything stored for a shop. Returns true if anything existed.
    pub fn purge_shop(&self, shop_id: i64) -> Result<bool> {
        let notes = self.kv.remove(&notes_key(shop_id))?;
        let photos = self.kv.remove(&photos_key(shop_id))?;
        if notes || photos {
            info!(shop_id, "Purged stored shop data");
        }
        Ok(notes || photos)
    }
}

/// Remove the first element matching `pred`, keeping the order of the rest.
fn remove_first<T>(items: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> Option<()> {
    let index = items.iter().position(pred)?;
    items.remove(index);
    Some(())
}
