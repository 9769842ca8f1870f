//! Tasting lifecycle: create, finalize, update, delete and read.
//!
//! A tasting is created `in_progress` with phase-1 fields, then finalized
//! with phase-2 fields. The generic update path can still rewrite any field,
//! including `status`, in either direction.

use std::collections::HashMap;

use chrono::{Local, NaiveDate};

use crate::entity::{Tasting, TastingStatus, TastingView};
use crate::error::{HumidorError, Result};
use crate::input::{FinalizeTasting, NewTasting, PhotoUpload, TastingPatch};
use crate::photos::PhotoStore;
use crate::storage::{InventoryStore, TastingRepository};

pub struct TastingEngine<'a> {
    inventory: &'a dyn InventoryStore,
    tastings: &'a dyn TastingRepository,
    photos: &'a dyn PhotoStore,
}

impl<'a> TastingEngine<'a> {
    pub fn new<S>(store: &'a S, photos: &'a dyn PhotoStore) -> Self
    where
        S: InventoryStore + TastingRepository,
    {
        Self {
            inventory: store,
            tastings: store,
            photos,
        }
    }

    /// Start a tasting (phase 1).
    pub fn create(&self, input: NewTasting, photo: Option<PhotoUpload>) -> Result<Tasting> {
        let cigar_id = input
            .cigar_id
            .ok_or_else(|| HumidorError::validation("cigar required"))?;
        if self.inventory.get_cigar_by_id(cigar_id)?.is_none() {
            return Err(HumidorError::CigarNotFound(cigar_id));
        }
        if let Some(photo) = photo {
            tracing::warn!(
                name = %photo.original_name,
                "band photo is recorded on finalize, ignoring upload at creation"
            );
        }

        let mut tasting = Tasting::new(cigar_id, input.tasting_date.unwrap_or_else(today));
        tasting.moment = input.moment;
        tasting.cut = input.cut;
        tasting.draw = input.draw;
        tasting.band_leaf = input.band_leaf;

        let tasting = self.tastings.insert(&tasting)?;
        tracing::info!(tasting_id = tasting.id, cigar_id, "tasting started");
        Ok(tasting)
    }

    /// Record phase-2 fields and mark the tasting finalized.
    ///
    /// All nine flavour flags are replaced by `input.flavors`. Finalizing an
    /// already finalized tasting simply applies the input again.
    pub fn finalize(
        &self,
        id: i64,
        input: FinalizeTasting,
        photo: Option<PhotoUpload>,
    ) -> Result<Tasting> {
        let mut tasting = self.load(id)?;

        if let Some(duration) = input.duration_minutes {
            tasting.duration_minutes = duration;
        }
        if let Some(rating) = input.rating {
            tasting.rating = rating;
        }
        if let Some(burn) = input.burn {
            tasting.burn = burn;
        }
        if let Some(would_buy_again) = input.would_buy_again {
            tasting.would_buy_again = would_buy_again;
        }
        tasting.flavors = input.flavors;
        if let Some(notes) = input.notes {
            tasting.notes = notes;
        }
        if let Some(band_note) = input.band_note {
            tasting.band_note = band_note;
        }

        let saved = self.save_photo(photo)?;
        if let Some(reference) = &saved {
            tasting.band_photo = Some(reference.clone());
        }
        tasting.status = TastingStatus::Finalized;

        self.persist(&tasting, saved.as_deref())?;
        tracing::info!(
            tasting_id = id,
            rating = ?tasting.rating,
            flavors = tasting.flavors.active().count(),
            "tasting finalized"
        );
        Ok(tasting)
    }

    /// Apply only the fields present in `patch`. A new photo replaces the
    /// previous one, which is removed once the record is written. If that
    /// removal fails the previous record is written back, the new photo is
    /// discarded and the error is returned.
    pub fn update(&self, id: i64, patch: TastingPatch, photo: Option<PhotoUpload>) -> Result<Tasting> {
        let original = self.load(id)?;
        let mut tasting = original.clone();

        if let Some(date) = patch.tasting_date {
            tasting.tasting_date = date;
        }
        if let Some(moment) = patch.moment {
            tasting.moment = moment;
        }
        if let Some(cut) = patch.cut {
            tasting.cut = cut;
        }
        if let Some(draw) = patch.draw {
            tasting.draw = draw;
        }
        if let Some(band_leaf) = patch.band_leaf {
            tasting.band_leaf = band_leaf;
        }
        if let Some(duration) = patch.duration_minutes {
            tasting.duration_minutes = duration;
        }
        if let Some(rating) = patch.rating {
            tasting.rating = rating;
        }
        if let Some(burn) = patch.burn {
            tasting.burn = burn;
        }
        if let Some(would_buy_again) = patch.would_buy_again {
            tasting.would_buy_again = would_buy_again;
        }
        patch.flavors.apply_to(&mut tasting.flavors);
        if let Some(notes) = patch.notes {
            tasting.notes = notes;
        }
        if let Some(band_note) = patch.band_note {
            tasting.band_note = band_note;
        }
        if let Some(status) = patch.status {
            if status != tasting.status {
                tracing::info!(tasting_id = id, from = %tasting.status, to = %status, "status overwritten");
            }
            tasting.status = status;
        }

        let saved = self.save_photo(photo)?;
        if let Some(reference) = &saved {
            tasting.band_photo = Some(reference.clone());
        }

        self.persist(&tasting, saved.as_deref())?;

        if let (Some(new), Some(old)) = (&saved, &original.band_photo) {
            if let Err(e) = self.photos.delete(old) {
                tracing::warn!(tasting_id = id, reference = %old, error = %e, "failed to remove replaced photo, rolling back");
                if let Err(restore) = self.tastings.update(&original) {
                    tracing::warn!(tasting_id = id, error = %restore, "failed to restore tasting");
                }
                self.discard_photo(new);
                return Err(e);
            }
        }

        tracing::info!(tasting_id = id, "tasting updated");
        Ok(tasting)
    }

    /// Remove the tasting and its band photo.
    pub fn delete(&self, id: i64) -> Result<()> {
        let tasting = self.load(id)?;
        if let Some(reference) = &tasting.band_photo {
            self.photos.delete(reference)?;
        }
        self.tastings.delete(id)?;
        tracing::info!(tasting_id = id, "tasting deleted");
        Ok(())
    }

    /// A single tasting joined with its cigar.
    pub fn get(&self, id: i64) -> Result<TastingView> {
        let tasting = self.load(id)?;
        let cigar = self.inventory.get_cigar_by_id(tasting.cigar_id)?;
        Ok(TastingView { tasting, cigar })
    }

    /// All tastings, or those with the given status, joined with their cigars.
    pub fn list(&self, status: Option<TastingStatus>) -> Result<Vec<TastingView>> {
        let tastings = match status {
            Some(status) => self.tastings.find_by_status(status)?,
            None => self.tastings.find_all()?,
        };
        let cigars: HashMap<i64, _> = self
            .inventory
            .get_all_cigars()?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        Ok(tastings
            .into_iter()
            .map(|tasting| {
                let cigar = cigars.get(&tasting.cigar_id).cloned();
                TastingView { tasting, cigar }
            })
            .collect())
    }

    fn load(&self, id: i64) -> Result<Tasting> {
        self.tastings
            .find_by_id(id)?
            .ok_or(HumidorError::TastingNotFound(id))
    }

    fn save_photo(&self, photo: Option<PhotoUpload>) -> Result<Option<String>> {
        photo
            .map(|p| self.photos.save(&p.bytes, &p.original_name))
            .transpose()
    }

    /// Write the record. If that fails, a photo saved for this write is removed
    /// again so the failed operation leaves nothing behind.
    fn persist(&self, tasting: &Tasting, saved_photo: Option<&str>) -> Result<()> {
        if let Err(e) = self.tastings.update(tasting) {
            if let Some(reference) = saved_photo {
                self.discard_photo(reference);
            }
            return Err(e);
        }
        Ok(())
    }

    fn discard_photo(&self, reference: &str) {
        if let Err(cleanup) = self.photos.delete(reference) {
            tracing::warn!(reference = %reference, error = %cleanup, "failed to discard photo");
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::{json, Value};

    use super::*;
    use crate::entity::{Cigar, Flavor, NewCigar};
    use crate::input::FieldBag;
    use crate::storage::SqliteStore;

    /// Records every call instead of touching the filesystem.
    #[derive(Default)]
    struct RecordingPhotos {
        saved: RefCell<Vec<String>>,
        deleted: RefCell<Vec<String>>,
        fail_deletes: bool,
    }

    impl PhotoStore for RecordingPhotos {
        fn save(&self, _bytes: &[u8], original_name: &str) -> Result<String> {
            let reference = format!("{}-{}", self.saved.borrow().len() + 1, original_name);
            self.saved.borrow_mut().push(reference.clone());
            Ok(reference)
        }

        fn delete(&self, reference: &str) -> Result<()> {
            self.deleted.borrow_mut().push(reference.to_string());
            if self.fail_deletes {
                return Err(std::io::Error::from(std::io::ErrorKind::PermissionDenied).into());
            }
            Ok(())
        }
    }

    /// Delegates to a real store but refuses every update.
    struct RejectingUpdates(SqliteStore);

    impl InventoryStore for RejectingUpdates {
        fn get_cigar_by_id(&self, id: i64) -> Result<Option<Cigar>> {
            self.0.get_cigar_by_id(id)
        }
        fn get_all_cigars(&self) -> Result<Vec<Cigar>> {
            self.0.get_all_cigars()
        }
        fn sum_stock(&self) -> Result<i64> {
            self.0.sum_stock()
        }
    }

    impl TastingRepository for RejectingUpdates {
        fn insert(&self, tasting: &Tasting) -> Result<Tasting> {
            self.0.insert(tasting)
        }
        fn find_by_id(&self, id: i64) -> Result<Option<Tasting>> {
            self.0.find_by_id(id)
        }
        fn find_all(&self) -> Result<Vec<Tasting>> {
            self.0.find_all()
        }
        fn find_by_status(&self, status: TastingStatus) -> Result<Vec<Tasting>> {
            self.0.find_by_status(status)
        }
        fn update(&self, _tasting: &Tasting) -> Result<()> {
            Err(HumidorError::Storage("disk I/O error".to_string()))
        }
        fn delete(&self, id: i64) -> Result<()> {
            self.0.delete(id)
        }
    }

    fn bag(value: Value) -> FieldBag {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn photo(name: &str) -> Option<PhotoUpload> {
        Some(PhotoUpload {
            original_name: name.to_string(),
            bytes: vec![1, 2, 3],
        })
    }

    fn start(engine: &TastingEngine<'_>, cigar_id: i64) -> Tasting {
        let input = NewTasting {
            cigar_id: Some(cigar_id),
            ..NewTasting::default()
        };
        engine.create(input, None).unwrap()
    }

    fn finalize_with(engine: &TastingEngine<'_>, id: i64, fields: Value) -> Tasting {
        let input = FinalizeTasting::from_fields(&bag(fields)).unwrap();
        engine.finalize(id, input, None).unwrap()
    }

    #[test]
    fn test_create_starts_in_progress() {
        let store = SqliteStore::in_memory().unwrap();
        let photos = RecordingPhotos::default();
        let engine = TastingEngine::new(&store, &photos);
        let cigar = store.insert_cigar(&NewCigar::new("Hoyo de Monterrey", 2)).unwrap();

        let input = NewTasting::from_fields(&bag(json!({
            "charuto_id": cigar.id.to_string(),
            "momento": "sozinho",
            "fluxo": "solto"
        })))
        .unwrap();
        let tasting = engine.create(input, None).unwrap();

        assert_eq!(tasting.status, TastingStatus::InProgress);
        assert_eq!(tasting.cigar_id, cigar.id);
        assert_eq!(tasting.tasting_date, today());
        assert_eq!(tasting.draw.as_deref(), Some("solto"));
        assert!(tasting.duration_minutes.is_none());
        assert!(tasting.rating.is_none());
        assert_eq!(tasting.flavors.active().count(), 0);
    }

    #[test]
    fn test_create_requires_cigar() {
        let store = SqliteStore::in_memory().unwrap();
        let photos = RecordingPhotos::default();
        let engine = TastingEngine::new(&store, &photos);

        let err = engine.create(NewTasting::default(), None).unwrap_err();
        assert!(matches!(err, HumidorError::Validation(ref m) if m == "cigar required"));

        let input = NewTasting {
            cigar_id: Some(77),
            ..NewTasting::default()
        };
        assert!(matches!(
            engine.create(input, None),
            Err(HumidorError::CigarNotFound(77))
        ));
    }

    #[test]
    fn test_create_ignores_photo() {
        let store = SqliteStore::in_memory().unwrap();
        let photos = RecordingPhotos::default();
        let engine = TastingEngine::new(&store, &photos);
        let cigar = store.insert_cigar(&NewCigar::new("A", 1)).unwrap();

        let input = NewTasting {
            cigar_id: Some(cigar.id),
            ..NewTasting::default()
        };
        let tasting = engine.create(input, photo("band.png")).unwrap();
        assert!(tasting.band_photo.is_none());
        assert!(photos.saved.borrow().is_empty());
    }

    #[test]
    fn test_finalize_always_sets_finalized() {
        let store = SqliteStore::in_memory().unwrap();
        let photos = RecordingPhotos::default();
        let engine = TastingEngine::new(&store, &photos);
        let cigar = store.insert_cigar(&NewCigar::new("A", 1)).unwrap();
        let tasting = start(&engine, cigar.id);

        let finalized = finalize_with(&engine, tasting.id, json!({}));
        assert_eq!(finalized.status, TastingStatus::Finalized);

        let stored = store.find_by_id(tasting.id).unwrap().unwrap();
        assert_eq!(stored.status, TastingStatus::Finalized);
        assert_eq!(stored.created_at, tasting.created_at);
    }

    #[test]
    fn test_finalize_overwrites_all_flavors() {
        let store = SqliteStore::in_memory().unwrap();
        let photos = RecordingPhotos::default();
        let engine = TastingEngine::new(&store, &photos);
        let cigar = store.insert_cigar(&NewCigar::new("A", 1)).unwrap();
        let tasting = start(&engine, cigar.id);

        let first = finalize_with(
            &engine,
            tasting.id,
            json!({ "sabor_cafe": true, "sabor_frutas": "true" }),
        );
        assert!(first.flavors.coffee && first.flavors.fruit);
        assert_eq!(first.flavors.active().count(), 2);

        let second = finalize_with(&engine, tasting.id, json!({ "sabor_madeira": "true" }));
        assert_eq!(second.flavors.active().collect::<Vec<_>>(), vec![Flavor::Wood]);
        assert_eq!(second.status, TastingStatus::Finalized);
    }

    #[test]
    fn test_finalize_coerces_numbers() {
        let store = SqliteStore::in_memory().unwrap();
        let photos = RecordingPhotos::default();
        let engine = TastingEngine::new(&store, &photos);
        let cigar = store.insert_cigar(&NewCigar::new("A", 1)).unwrap();
        let tasting = start(&engine, cigar.id);

        let finalized = finalize_with(
            &engine,
            tasting.id,
            json!({ "nota": "9", "duracao_minutos": "", "compraria_novamente": "sim" }),
        );
        assert_eq!(finalized.rating, Some(9));
        assert_eq!(finalized.duration_minutes, None);
        assert_eq!(finalized.would_buy_again.as_deref(), Some("sim"));

        // Absent keys leave prior values alone
        let again = finalize_with(&engine, tasting.id, json!({}));
        assert_eq!(again.rating, Some(9));
    }

    #[test]
    fn test_finalize_blank_notes_do_not_erase() {
        let store = SqliteStore::in_memory().unwrap();
        let photos = RecordingPhotos::default();
        let engine = TastingEngine::new(&store, &photos);
        let cigar = store.insert_cigar(&NewCigar::new("A", 1)).unwrap();
        let tasting = start(&engine, cigar.id);
        finalize_with(&engine, tasting.id, json!({ "observacoes": "cedar, then cocoa" }));

        let again = finalize_with(
            &engine,
            tasting.id,
            json!({ "observacoes": "", "compraria_novamente": "" }),
        );
        assert_eq!(again.notes.as_deref(), Some("cedar, then cocoa"));
        assert!(again.would_buy_again.is_none());
    }

    #[test]
    fn test_finalize_missing_tasting() {
        let store = SqliteStore::in_memory().unwrap();
        let photos = RecordingPhotos::default();
        let engine = TastingEngine::new(&store, &photos);
        let err = engine
            .finalize(5, FinalizeTasting::default(), None)
            .unwrap_err();
        assert!(matches!(err, HumidorError::TastingNotFound(5)));
    }

    #[test]
    fn test_finalize_saves_photo_without_deleting() {
        let store = SqliteStore::in_memory().unwrap();
        let photos = RecordingPhotos::default();
        let engine = TastingEngine::new(&store, &photos);
        let cigar = store.insert_cigar(&NewCigar::new("A", 1)).unwrap();
        let tasting = start(&engine, cigar.id);

        let finalized = engine
            .finalize(tasting.id, FinalizeTasting::default(), photo("anilha.jpg"))
            .unwrap();
        assert_eq!(finalized.band_photo.as_deref(), Some("1-anilha.jpg"));
        assert!(photos.deleted.borrow().is_empty());
    }

    #[test]
    fn test_update_is_partial() {
        let store = SqliteStore::in_memory().unwrap();
        let photos = RecordingPhotos::default();
        let engine = TastingEngine::new(&store, &photos);
        let cigar = store.insert_cigar(&NewCigar::new("A", 1)).unwrap();
        let tasting = start(&engine, cigar.id);
        finalize_with(
            &engine,
            tasting.id,
            json!({ "sabor_cafe": true, "sabor_tabaco": true, "nota": 7 }),
        );

        let patch = TastingPatch::from_fields(&bag(json!({
            "sabor_tabaco": "false",
            "observacoes": "long finish"
        })))
        .unwrap();
        let updated = engine.update(tasting.id, patch, None).unwrap();

        assert!(updated.flavors.coffee);
        assert!(!updated.flavors.tobacco);
        assert_eq!(updated.rating, Some(7));
        assert_eq!(updated.notes.as_deref(), Some("long finish"));
        assert_eq!(updated.status, TastingStatus::Finalized);
    }

    #[test]
    fn test_update_can_revert_status() {
        let store = SqliteStore::in_memory().unwrap();
        let photos = RecordingPhotos::default();
        let engine = TastingEngine::new(&store, &photos);
        let cigar = store.insert_cigar(&NewCigar::new("A", 1)).unwrap();
        let tasting = start(&engine, cigar.id);
        finalize_with(&engine, tasting.id, json!({}));

        let patch = TastingPatch {
            status: Some(TastingStatus::InProgress),
            ..TastingPatch::default()
        };
        engine.update(tasting.id, patch, None).unwrap();

        let stored = store.find_by_id(tasting.id).unwrap().unwrap();
        assert_eq!(stored.status, TastingStatus::InProgress);
    }

    #[test]
    fn test_update_replaces_photo() {
        let store = SqliteStore::in_memory().unwrap();
        let photos = RecordingPhotos::default();
        let engine = TastingEngine::new(&store, &photos);
        let cigar = store.insert_cigar(&NewCigar::new("A", 1)).unwrap();
        let tasting = start(&engine, cigar.id);
        engine
            .finalize(tasting.id, FinalizeTasting::default(), photo("old.png"))
            .unwrap();

        let updated = engine
            .update(tasting.id, TastingPatch::default(), photo("new.png"))
            .unwrap();

        assert_eq!(updated.band_photo.as_deref(), Some("2-new.png"));
        assert_eq!(*photos.deleted.borrow(), vec!["1-old.png".to_string()]);
    }

    #[test]
    fn test_update_rolls_back_when_old_photo_cannot_be_removed() {
        let store = SqliteStore::in_memory().unwrap();
        let photos = RecordingPhotos {
            fail_deletes: true,
            ..RecordingPhotos::default()
        };
        let engine = TastingEngine::new(&store, &photos);
        let cigar = store.insert_cigar(&NewCigar::new("A", 1)).unwrap();
        let tasting = start(&engine, cigar.id);
        engine
            .finalize(tasting.id, FinalizeTasting::default(), photo("old.png"))
            .unwrap();

        let patch = TastingPatch::from_fields(&bag(json!({ "nota": 4 }))).unwrap();
        let err = engine
            .update(tasting.id, patch, photo("new.png"))
            .unwrap_err();
        assert!(matches!(err, HumidorError::Io(_)));

        let stored = store.find_by_id(tasting.id).unwrap().unwrap();
        assert_eq!(stored.band_photo.as_deref(), Some("1-old.png"));
        assert_eq!(stored.rating, None);
        assert_eq!(
            *photos.deleted.borrow(),
            vec!["1-old.png".to_string(), "2-new.png".to_string()]
        );
    }

    #[test]
    fn test_failed_write_discards_new_photo() {
        let inner = SqliteStore::in_memory().unwrap();
        let cigar = inner.insert_cigar(&NewCigar::new("A", 1)).unwrap();
        let store = RejectingUpdates(inner);
        let photos = RecordingPhotos::default();
        let engine = TastingEngine::new(&store, &photos);
        let tasting = start(&engine, cigar.id);

        let err = engine
            .finalize(tasting.id, FinalizeTasting::default(), photo("band.gif"))
            .unwrap_err();
        assert!(matches!(err, HumidorError::Storage(_)));
        assert_eq!(*photos.deleted.borrow(), vec!["1-band.gif".to_string()]);

        let stored = store.find_by_id(tasting.id).unwrap().unwrap();
        assert_eq!(stored.status, TastingStatus::InProgress);
        assert!(stored.band_photo.is_none());
    }

    #[test]
    fn test_delete_removes_photo_once() {
        let store = SqliteStore::in_memory().unwrap();
        let photos = RecordingPhotos::default();
        let engine = TastingEngine::new(&store, &photos);
        let cigar = store.insert_cigar(&NewCigar::new("A", 1)).unwrap();
        let tasting = start(&engine, cigar.id);
        engine
            .finalize(tasting.id, FinalizeTasting::default(), photo("band.png"))
            .unwrap();

        engine.delete(tasting.id).unwrap();

        assert_eq!(photos.deleted.borrow().len(), 1);
        assert!(store.find_by_id(tasting.id).unwrap().is_none());
        assert!(matches!(
            engine.delete(tasting.id),
            Err(HumidorError::TastingNotFound(_))
        ));
    }

    #[test]
    fn test_delete_without_photo() {
        let store = SqliteStore::in_memory().unwrap();
        let photos = RecordingPhotos::default();
        let engine = TastingEngine::new(&store, &photos);
        let cigar = store.insert_cigar(&NewCigar::new("A", 1)).unwrap();
        let tasting = start(&engine, cigar.id);

        engine.delete(tasting.id).unwrap();
        assert!(photos.deleted.borrow().is_empty());
    }

    #[test]
    fn test_list_and_get_join_cigar() {
        let store = SqliteStore::in_memory().unwrap();
        let photos = RecordingPhotos::default();
        let engine = TastingEngine::new(&store, &photos);
        let a = store.insert_cigar(&NewCigar::new("A", 1)).unwrap();
        let b = store.insert_cigar(&NewCigar::new("B", 1)).unwrap();
        let first = start(&engine, a.id);
        start(&engine, b.id);
        finalize_with(&engine, first.id, json!({}));

        let all = engine.list(None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].cigar.as_ref().map(|c| c.name.as_str()), Some("B"));

        let finalized = engine.list(Some(TastingStatus::Finalized)).unwrap();
        assert_eq!(finalized.len(), 1);
        assert_eq!(finalized[0].tasting.id, first.id);

        let view = engine.get(first.id).unwrap();
        assert_eq!(view.cigar.unwrap().id, a.id);
        assert!(matches!(engine.get(999), Err(HumidorError::TastingNotFound(999))));
    }
}
