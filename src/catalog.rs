//! Saved food analyses, most recent first, with their photos.
//!
//! Entries live as one JSON array in the key-value store; photos are stored
//! in the blob store and referenced by id.

use std::collections::HashSet;

use crate::error::{PersistenceError, StoreError};
use crate::nutrition::{AnalysisResult, FoodType, ImageRefs};
use crate::profile::CatProfile;
use crate::store::{get_json, set_json, try_get_json, BlobStore, KeyValueStore};

/// Store key of the catalog array.
pub const CATALOG_KEY: &str = "foodCatalog";

/// A saved analysis with its photo ids filled in.
pub type CatalogEntry = AnalysisResult;

/// Photos to store alongside an analysis, already compressed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Photos<'a> {
    pub front: Option<&'a [u8]>,
    pub label: Option<&'a [u8]>,
}

pub struct Catalog<'a> {
    kv: &'a dyn KeyValueStore,
    blobs: &'a dyn BlobStore,
}

impl<'a> Catalog<'a> {
    pub fn new(kv: &'a dyn KeyValueStore, blobs: &'a dyn BlobStore) -> Self {
        Self { kv, blobs }
    }

    /// All entries, most recent first. Missing or unreadable data gives an
    /// empty catalog.
    pub fn entries(&self) -> Vec<CatalogEntry> {
        get_json(self.kv, CATALOG_KEY).unwrap_or_default()
    }

    /// Entries for a read-modify-write. Unlike [`Catalog::entries`], a failed
    /// read is an error so the stored catalog is never overwritten blindly.
    fn load_entries(&self) -> Result<Vec<CatalogEntry>, PersistenceError> {
        try_get_json(self.kv, CATALOG_KEY)
            .map(Option::unwrap_or_default)
            .map_err(|e| {
                crate::log(&format!("Catalog read failed: {}", e));
                PersistenceError::Catalog(e)
            })
    }

    /// Stores the photos and inserts the analysis at the front.
    ///
    /// On failure the catalog is left unchanged and any photo stored by this
    /// call is deleted again.
    pub fn save(
        &self,
        result: &AnalysisResult,
        photos: Photos<'_>,
    ) -> Result<CatalogEntry, PersistenceError> {
        let mut entries = self.load_entries()?;
        let mut refs = ImageRefs::default();

        if let Some(bytes) = photos.front {
            refs.front_image_id = Some(self.blobs.put(bytes).map_err(PersistenceError::Image)?);
        }
        if let Some(bytes) = photos.label {
            match self.blobs.put(bytes) {
                Ok(id) => refs.label_image_id = Some(id),
                Err(e) => {
                    self.release_images(&refs);
                    return Err(PersistenceError::Image(e));
                }
            }
        }

        let entry = result.with_images(refs);
        entries.insert(0, entry.clone());

        if let Err(e) = set_json(self.kv, CATALOG_KEY, &entries) {
            crate::log(&format!("Catalog write failed: {}", e));
            self.release_images(&entry.image_refs);
            return Err(PersistenceError::Catalog(e));
        }

        crate::log(&format!(
            "Saved '{}' to catalog ({} entries)",
            entry.name,
            entries.len()
        ));
        Ok(entry)
    }

    /// Removes the entry at `index`, then deletes its photos. A photo that
    /// cannot be deleted is logged and left behind as an orphan.
    pub fn delete(&self, index: usize) -> Result<CatalogEntry, PersistenceError> {
        let mut entries = self.load_entries()?;
        if index >= entries.len() {
            return Err(PersistenceError::NoSuchEntry(index));
        }

        let removed = entries.remove(index);
        set_json(self.kv, CATALOG_KEY, &entries).map_err(PersistenceError::Catalog)?;

        self.release_images(&removed.image_refs);
        crate::log(&format!("Deleted '{}' from catalog", removed.name));
        Ok(removed)
    }

    /// Photo bytes for a stored id.
    pub fn image(&self, id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.blobs.get(id)
    }

    /// Stored photos that no catalog entry refers to.
    pub fn orphan_images(&self) -> Result<Vec<String>, StoreError> {
        let entries: Vec<CatalogEntry> =
            try_get_json(self.kv, CATALOG_KEY)?.unwrap_or_default();
        let used: HashSet<&str> = entries.iter().flat_map(|e| e.image_refs.ids()).collect();

        Ok(self
            .blobs
            .list_ids()?
            .into_iter()
            .filter(|id| !used.contains(id.as_str()))
            .collect())
    }

    /// Deletes the given photos; returns how many were removed.
    pub fn remove_images(&self, ids: &[String]) -> usize {
        let mut removed = 0;
        for id in ids {
            match self.blobs.delete(id) {
                Ok(()) => removed += 1,
                Err(e) => crate::log(&format!("Failed to delete image {}: {}", id, e)),
            }
        }
        crate::log(&format!("Removed {} of {} images", removed, ids.len()));
        removed
    }

    fn release_images(&self, refs: &ImageRefs) {
        for id in refs.ids() {
            if let Err(e) = self.blobs.delete(id) {
                crate::log(&format!("Failed to delete image {}: {}", id, e));
            }
        }
    }
}

/// Plain-text summary for sharing an entry.
pub fn share_summary(entry: &CatalogEntry, profile: Option<&CatProfile>) -> String {
    let mut text = format!(
        "{} ({})\n{} - {}",
        entry.name,
        match entry.food_type {
            FoodType::Dry => "dry",
            FoodType::Wet => "wet",
        },
        entry.overall_score.title(),
        entry.overall_score.summary()
    );

    if let Some(profile) = profile {
        text.push_str(&format!(
            "\nPortion for {}: {:.0} g/day",
            profile.name,
            profile.daily_portion(entry.kcal_per_100g)
        ));
    }

    text.push_str(&format!(
        "\n\nCarbohydrates: {:.1} g/100 kcal\nProtein: {:.1} g/100 kcal",
        entry.carbs_per_100kcal, entry.protein_per_100kcal
    ));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::{analyze, FoodComposition};
    use crate::profile::{Goal, NeuterStatus};
    use crate::store::{FileBlobStore, JsonFileStore};
    use std::cell::Cell;
    use std::fs;
    use std::io;
    use tempfile::tempdir;

    /// Key-value store whose reads fail while `failing` is set.
    struct UnreadableStore {
        inner: JsonFileStore,
        failing: Cell<bool>,
    }

    impl KeyValueStore for UnreadableStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            if self.failing.get() {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied").into());
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key)
        }
    }

    /// Blob store that accepts `accept` puts and fails every later one.
    struct FullAfter {
        inner: FileBlobStore,
        accept: Cell<usize>,
    }

    impl BlobStore for FullAfter {
        fn put(&self, bytes: &[u8]) -> Result<String, StoreError> {
            match self.accept.get() {
                0 => Err(io::Error::new(io::ErrorKind::StorageFull, "disk full").into()),
                n => {
                    self.accept.set(n - 1);
                    self.inner.put(bytes)
                }
            }
        }

        fn get(&self, id: &str) -> Result<Option<Vec<u8>>, StoreError> {
            self.inner.get(id)
        }

        fn delete(&self, id: &str) -> Result<(), StoreError> {
            self.inner.delete(id)
        }

        fn list_ids(&self) -> Result<Vec<String>, StoreError> {
            self.inner.list_ids()
        }
    }

    fn both_photos() -> Photos<'static> {
        Photos {
            front: Some(&b"front"[..]),
            label: Some(&b"label"[..]),
        }
    }

    fn names(catalog: &Catalog<'_>) -> Vec<String> {
        catalog.entries().into_iter().map(|e| e.name).collect()
    }

    fn result(name: &str) -> AnalysisResult {
        analyze(&FoodComposition {
            name: name.to_string(),
            food_type: FoodType::Wet,
            protein: 10.0,
            fat: 5.0,
            fiber: 1.0,
            moisture: 78.0,
            ash: Some(2.0),
            kcal_per_100g: Some(90.0),
        })
        .unwrap()
    }

    #[test]
    fn test_save_inserts_most_recent_first() {
        let dir = tempdir().unwrap();
        let kv = JsonFileStore::new(dir.path().join("store"));
        let blobs = FileBlobStore::new(dir.path().join("images"));
        let catalog = Catalog::new(&kv, &blobs);

        assert!(catalog.entries().is_empty());

        catalog.save(&result("First"), Photos::default()).unwrap();
        let saved = catalog
            .save(
                &result("Second"),
                Photos {
                    front: Some(&b"front"[..]),
                    label: Some(&b"label"[..]),
                },
            )
            .unwrap();

        let entries = catalog.entries();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Second", "First"]);
        assert_eq!(entries[0].image_refs, saved.image_refs);

        let front_id = saved.image_refs.front_image_id.unwrap();
        assert_eq!(catalog.image(&front_id).unwrap().as_deref(), Some(&b"front"[..]));
    }

    #[test]
    fn test_failed_write_leaves_catalog_and_no_images() {
        let dir = tempdir().unwrap();
        let store_dir = dir.path().join("store");
        let blobs = FileBlobStore::new(dir.path().join("images"));

        let unlimited = JsonFileStore::new(&store_dir);
        Catalog::new(&unlimited, &blobs)
            .save(&result("Existing"), Photos::default())
            .unwrap();
        let used = fs::metadata(store_dir.join("foodCatalog.json")).unwrap().len();

        let limited = JsonFileStore::with_quota(&store_dir, used + 10);
        let catalog = Catalog::new(&limited, &blobs);
        let err = catalog
            .save(
                &result("Too much"),
                Photos {
                    front: Some(&b"front"[..]),
                    label: Some(&b"label"[..]),
                },
            )
            .unwrap_err();

        assert!(err.is_quota());
        let names: Vec<_> = catalog.entries().into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["Existing"]);
        assert!(blobs.list_ids().unwrap().is_empty());
    }

    #[test]
    fn test_delete_releases_images() {
        let dir = tempdir().unwrap();
        let kv = JsonFileStore::new(dir.path().join("store"));
        let blobs = FileBlobStore::new(dir.path().join("images"));
        let catalog = Catalog::new(&kv, &blobs);

        catalog
            .save(
                &result("Keep"),
                Photos {
                    front: Some(&b"keep"[..]),
                    label: None,
                },
            )
            .unwrap();
        catalog
            .save(
                &result("Drop"),
                Photos {
                    front: Some(&b"drop front"[..]),
                    label: Some(&b"drop label"[..]),
                },
            )
            .unwrap();
        assert_eq!(blobs.list_ids().unwrap().len(), 3);

        let removed = catalog.delete(0).unwrap();
        assert_eq!(removed.name, "Drop");
        assert_eq!(catalog.entries().len(), 1);
        assert_eq!(blobs.list_ids().unwrap().len(), 1);

        assert!(matches!(
            catalog.delete(5),
            Err(PersistenceError::NoSuchEntry(5))
        ));
    }

    #[test]
    fn test_orphan_images() {
        let dir = tempdir().unwrap();
        let kv = JsonFileStore::new(dir.path().join("store"));
        let blobs = FileBlobStore::new(dir.path().join("images"));
        let catalog = Catalog::new(&kv, &blobs);

        let saved = catalog
            .save(
                &result("Food"),
                Photos {
                    front: Some(&b"front"[..]),
                    label: None,
                },
            )
            .unwrap();
        let stray = blobs.put(b"stray").unwrap();

        let orphans = catalog.orphan_images().unwrap();
        assert_eq!(orphans, vec![stray]);

        assert_eq!(catalog.remove_images(&orphans), 1);
        assert!(catalog.orphan_images().unwrap().is_empty());
        assert_eq!(
            blobs.list_ids().unwrap(),
            vec![saved.image_refs.front_image_id.unwrap()]
        );
    }

    #[test]
    fn test_malformed_catalog_reads_empty() {
        let dir = tempdir().unwrap();
        let kv = JsonFileStore::new(dir.path());
        let blobs = FileBlobStore::new(dir.path().join("images"));
        kv.set(CATALOG_KEY, "not json").unwrap();

        assert!(Catalog::new(&kv, &blobs).entries().is_empty());
    }

    #[test]
    fn test_share_summary() {
        let entry = result("Tuna Mousse");
        let text = share_summary(&entry, None);
        assert!(text.starts_with("Tuna Mousse (wet)\nACCEPTABLE"));
        assert!(text.contains("Carbohydrates: 4.4 g/100 kcal"));
        assert!(text.contains("Protein: 11.1 g/100 kcal"));
        assert!(!text.contains("Portion"));

        let profile =
            CatProfile::new("Micio", 5.0, None, NeuterStatus::Neutered, Goal::Maintenance, false)
                .unwrap();
        let text = share_summary(&entry, Some(&profile));
        // 281 kcal / 90 kcal per 100 g
        assert!(text.contains("Portion for Micio: 312 g/day"));
    }

    #[test]
    fn test_read_error_keeps_existing_entries() {
        let dir = tempdir().unwrap();
        let kv = UnreadableStore {
            inner: JsonFileStore::new(dir.path().join("store")),
            failing: Cell::new(false),
        };
        let blobs = FileBlobStore::new(dir.path().join("images"));
        let catalog = Catalog::new(&kv, &blobs);

        catalog.save(&result("A"), Photos::default()).unwrap();
        catalog.save(&result("B"), Photos::default()).unwrap();

        kv.failing.set(true);
        let err = catalog.save(&result("C"), both_photos()).unwrap_err();
        assert!(matches!(err, PersistenceError::Catalog(StoreError::Io(_))));
        assert!(matches!(catalog.delete(0), Err(PersistenceError::Catalog(_))));
        assert!(catalog.orphan_images().is_err());
        kv.failing.set(false);

        assert_eq!(names(&catalog), ["B", "A"]);
        assert!(blobs.list_ids().unwrap().is_empty());
    }

    #[test]
    fn test_failed_label_photo_releases_front_photo() {
        let dir = tempdir().unwrap();
        let kv = JsonFileStore::new(dir.path().join("store"));
        let blobs = FullAfter {
            inner: FileBlobStore::new(dir.path().join("images")),
            accept: Cell::new(1),
        };
        let catalog = Catalog::new(&kv, &blobs);

        let err = catalog.save(&result("Food"), both_photos()).unwrap_err();
        assert!(matches!(err, PersistenceError::Image(StoreError::Io(_))));
        assert_eq!(blobs.accept.get(), 0);
        assert!(blobs.list_ids().unwrap().is_empty());
        assert!(names(&catalog).is_empty());
    }
}
