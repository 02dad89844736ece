//! crates/tutor_board_core/src/roster.rs
//!
//! The request-side operations on tutors. Every mutation is a full
//! load → locate by id → mutate → save cycle against the `RecordStore`,
//! serialized by a single write lock so two requests (or a request and the
//! expiry sweep) cannot interleave and lose each other's update.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info};

use crate::domain::{NewTutor, TutorEdit, TutorRecord};
use crate::ports::{PortError, PortResult, RecordStore};
use crate::presence::PresenceTracker;

pub struct TutorRoster {
    store: Arc<dyn RecordStore>,
    presence: Arc<PresenceTracker>,
    write_lock: Mutex<()>,
}

impl TutorRoster {
    pub fn new(store: Arc<dyn RecordStore>, presence: Arc<PresenceTracker>) -> Self {
        Self {
            store,
            presence,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn presence(&self) -> &Arc<PresenceTracker> {
        &self.presence
    }

    /// Held for the duration of any load → save sequence.
    pub(crate) async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    //=====================================================================================
    // Reads
    //=====================================================================================

    /// All tutors. A missing or unreadable store reads as empty.
    pub async fn list(&self) -> Vec<TutorRecord> {
        let records = self.store.load().await.into_records();
        debug!(count = records.len(), "Listed tutors");
        records
    }

    //=====================================================================================
    // Presence
    //=====================================================================================

    /// Marks the tutor available and starts tracking their presence.
    pub async fn login(&self, id: &str, now: DateTime<Utc>) -> PortResult<TutorRecord> {
        // Touch before releasing the lock so a sweep cannot see the tutor
        // available with no presence entry.
        let _guard = self.lock_writes().await;
        let tutor = self
            .update_locked(id, |tutor| tutor.available = true)
            .await?;
        self.presence.touch(id, now).await;
        info!(tutor_id = %id, "Tutor logged in");
        Ok(tutor)
    }

    /// Marks the tutor unavailable and forgets their presence entry.
    pub async fn logout(&self, id: &str) -> PortResult<TutorRecord> {
        let _guard = self.lock_writes().await;
        let tutor = self
            .update_locked(id, |tutor| tutor.available = false)
            .await?;
        self.presence.clear(id).await;
        info!(tutor_id = %id, "Tutor logged out");
        Ok(tutor)
    }

    /// Refreshes presence for `id`. Absent or empty ids are ignored. Ids unknown
    /// to the store are recorded and dropped by the next sweep.
    pub async fn heartbeat(&self, id: Option<&str>, now: DateTime<Utc>) {
        if let Some(id) = id {
            self.presence.touch(id, now).await;
        }
    }

    //=====================================================================================
    // Administration
    //=====================================================================================

    pub async fn toggle_availability(&self, id: &str) -> PortResult<TutorRecord> {
        let tutor = self
            .update_one(id, |tutor| tutor.available = !tutor.available)
            .await?;
        info!(tutor_id = %id, available = tutor.available, "Availability toggled");
        Ok(tutor)
    }

    pub async fn delete(&self, id: &str) -> PortResult<()> {
        let _guard = self.lock_writes().await;
        let mut tutors = self.store.load().await.for_update()?;

        let index = find_index(&tutors, id)?;
        tutors.remove(index);
        self.persist(&tutors).await?;
        info!(tutor_id = %id, "Tutor deleted");
        Ok(())
    }

    pub async fn add(&self, new: NewTutor) -> PortResult<TutorRecord> {
        let name = required(new.name, "name")?;
        let id = required(new.id, "id")?;
        let photo = required(new.photo, "photo")?;

        let _guard = self.lock_writes().await;
        let mut tutors = self.store.load().await.for_update()?;

        if tutors.iter().any(|t| t.id == id) {
            return Err(PortError::Conflict(format!(
                "Tutor with ID {} already exists",
                id
            )));
        }

        let tutor = TutorRecord {
            id,
            name,
            grade: new.grade.map(|g| g.trim().to_string()).unwrap_or_default(),
            subjects: new.subjects.unwrap_or_default(),
            photo,
            available: false,
        };
        tutors.push(tutor.clone());
        self.persist(&tutors).await?;
        info!(tutor_id = %tutor.id, "Tutor added");
        Ok(tutor)
    }

    /// Applies a partial update. The target is found by `original_id`, or failing
    /// that by a case-insensitive match on `name`. A logged-in tutor whose id
    /// changes keeps their presence under the new id.
    pub async fn edit(&self, edit: TutorEdit) -> PortResult<TutorRecord> {
        let edit = TutorEdit {
            original_id: edit.original_id.map(|id| id.trim().to_string()),
            id: edit.id.map(|id| id.trim().to_string()),
            name: edit.name.map(|name| name.trim().to_string()),
            grade: edit.grade.map(|grade| grade.trim().to_string()),
            photo: edit.photo.map(|photo| photo.trim().to_string()),
            ..edit
        };

        let _guard = self.lock_writes().await;
        let mut tutors = self.store.load().await.for_update()?;

        let index = locate_for_edit(&tutors, &edit)?;
        let previous_id = tutors[index].id.clone();

        if let Some(new_id) = &edit.id {
            if new_id.is_empty() {
                return Err(PortError::Validation("id must not be empty".to_string()));
            }
            if *new_id != previous_id && tutors.iter().any(|t| t.id == *new_id) {
                return Err(PortError::Conflict(format!(
                    "Tutor with ID {} already exists",
                    new_id
                )));
            }
        }
        if matches!(&edit.name, Some(name) if name.is_empty()) {
            return Err(PortError::Validation("name must not be empty".to_string()));
        }

        let tutor = &mut tutors[index];
        if let Some(id) = edit.id {
            tutor.id = id;
        }
        if let Some(name) = edit.name {
            tutor.name = name;
        }
        if let Some(grade) = edit.grade {
            tutor.grade = grade;
        }
        if let Some(subjects) = edit.subjects {
            tutor.subjects = subjects;
        }
        if let Some(photo) = edit.photo {
            tutor.photo = photo;
        }
        let updated = tutor.clone();

        self.persist(&tutors).await?;
        if updated.id != previous_id {
            self.presence.rename(&previous_id, &updated.id).await;
        }
        info!(tutor_id = %updated.id, "Tutor updated");
        Ok(updated)
    }

    //=====================================================================================
    // Helpers
    //=====================================================================================

    async fn update_one<F>(&self, id: &str, mutate: F) -> PortResult<TutorRecord>
    where
        F: FnOnce(&mut TutorRecord),
    {
        let _guard = self.lock_writes().await;
        self.update_locked(id, mutate).await
    }

    /// Load, mutate one record, save. The caller must hold the write lock.
    async fn update_locked<F>(&self, id: &str, mutate: F) -> PortResult<TutorRecord>
    where
        F: FnOnce(&mut TutorRecord),
    {
        let mut tutors = self.store.load().await.for_update()?;

        let index = find_index(&tutors, id)?;
        mutate(&mut tutors[index]);
        let tutor = tutors[index].clone();

        self.persist(&tutors).await?;
        Ok(tutor)
    }

    async fn persist(&self, tutors: &[TutorRecord]) -> PortResult<()> {
        self.store.save(tutors).await.map_err(|e| {
            error!("Failed to save tutors: {}", e);
            e
        })
    }
}

fn find_index(tutors: &[TutorRecord], id: &str) -> PortResult<usize> {
    tutors
        .iter()
        .position(|t| t.id == id)
        .ok_or_else(|| PortError::NotFound(format!("Tutor {}", id)))
}

fn locate_for_edit(tutors: &[TutorRecord], edit: &TutorEdit) -> PortResult<usize> {
    if let Some(original_id) = &edit.original_id {
        if let Some(index) = tutors.iter().position(|t| t.id == *original_id) {
            return Ok(index);
        }
    }

    let name = edit
        .name
        .as_deref()
        .map(str::to_lowercase)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| PortError::NotFound("Tutor".to_string()))?;

    let mut matches = tutors
        .iter()
        .enumerate()
        .filter(|(_, t)| t.name.trim().to_lowercase() == name)
        .map(|(index, _)| index);

    match (matches.next(), matches.next()) {
        (Some(index), None) => Ok(index),
        (Some(_), Some(_)) => Err(PortError::Conflict(format!(
            "More than one tutor is named {}",
            name
        ))),
        (None, _) => Err(PortError::NotFound(format!("Tutor named {}", name))),
    }
}

/// The trimmed value, or a validation error when it is absent or blank.
fn required(value: Option<String>, field: &str) -> PortResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| PortError::Validation(format!("Missing field: {}", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::ports::RecordStore;

    fn tutor(id: &str, name: &str) -> TutorRecord {
        TutorRecord {
            id: id.into(),
            name: name.into(),
            grade: "11".into(),
            subjects: vec!["Algebra".into()],
            photo: TutorRecord::default_photo(name),
            available: false,
        }
    }

    fn roster_with(records: Vec<TutorRecord>) -> (TutorRoster, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_records(records));
        let roster = TutorRoster::new(store.clone(), Arc::new(PresenceTracker::new()));
        (roster, store)
    }

    #[tokio::test]
    async fn test_login_then_list_shows_available() {
        let (roster, _) = roster_with(vec![tutor("1001", "Jane Doe"), tutor("1002", "Sam Lee")]);
        let now = Utc::now();

        let tutor = roster.login("1001", now).await.unwrap();
        assert!(tutor.available);
        assert_eq!(roster.presence().last_seen("1001").await, Some(now));

        let listed = roster.list().await;
        assert!(listed.iter().find(|t| t.id == "1001").unwrap().available);
        assert!(!listed.iter().find(|t| t.id == "1002").unwrap().available);
    }

    #[tokio::test]
    async fn test_login_unknown_id_is_not_found() {
        let (roster, store) = roster_with(vec![tutor("1001", "Jane Doe")]);
        let result = roster.login("9999", Utc::now()).await;
        assert!(matches!(result, Err(PortError::NotFound(_))));
        assert_eq!(store.save_count(), 0);
        assert!(roster.presence().is_empty().await);
    }

    #[tokio::test]
    async fn test_logout_clears_presence() {
        let (roster, _) = roster_with(vec![tutor("1001", "Jane Doe")]);
        roster.login("1001", Utc::now()).await.unwrap();

        let tutor = roster.logout("1001").await.unwrap();
        assert!(!tutor.available);
        assert!(roster.presence().last_seen("1001").await.is_none());
    }

    #[tokio::test]
    async fn test_heartbeat_ignores_missing_id() {
        let (roster, store) = roster_with(vec![tutor("1001", "Jane Doe")]);
        roster.heartbeat(None, Utc::now()).await;
        roster.heartbeat(Some(""), Utc::now()).await;
        assert!(roster.presence().is_empty().await);

        roster.heartbeat(Some("1001"), Utc::now()).await;
        assert_eq!(roster.presence().len().await, 1);
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_toggle_flips_availability() {
        let (roster, _) = roster_with(vec![tutor("1001", "Jane Doe")]);
        assert!(roster.toggle_availability("1001").await.unwrap().available);
        assert!(!roster.toggle_availability("1001").await.unwrap().available);
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let (roster, _) = roster_with(vec![tutor("1001", "Jane Doe"), tutor("1002", "Sam Lee")]);
        roster.delete("1001").await.unwrap();

        let ids: Vec<String> = roster.list().await.into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["1002"]);
        assert!(matches!(roster.delete("1001").await, Err(PortError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_add_duplicate_id_conflicts_without_writing() {
        let (roster, store) = roster_with(vec![tutor("1001", "Jane Doe")]);
        let result = roster
            .add(NewTutor {
                name: Some("Someone Else".into()),
                id: Some("1001".into()),
                photo: Some("someone.jpg".into()),
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(PortError::Conflict(_))));
        assert_eq!(store.save_count(), 0);
        assert_eq!(store.records().await, vec![tutor("1001", "Jane Doe")]);
    }

    #[tokio::test]
    async fn test_add_requires_name_id_and_photo() {
        let (roster, store) = roster_with(vec![]);
        let result = roster
            .add(NewTutor {
                name: Some("Jane Doe".into()),
                id: Some("1001".into()),
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(PortError::Validation(_))));
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_add_into_missing_store_creates_it() {
        let store = Arc::new(MemoryStore::new());
        let roster = TutorRoster::new(store.clone(), Arc::new(PresenceTracker::new()));

        let added = roster
            .add(NewTutor {
                name: Some("Jane Doe".into()),
                id: Some("1001".into()),
                photo: Some("jane.png".into()),
                grade: Some("12".into()),
                subjects: Some(vec!["Physics".into()]),
            })
            .await
            .unwrap();

        assert!(!added.available);
        assert_eq!(store.records().await, vec![added]);
    }

    #[tokio::test]
    async fn test_edit_falls_back_to_case_insensitive_name() {
        let (roster, _) = roster_with(vec![tutor("1001", "Jane Doe"), tutor("1002", "Sam Lee")]);
        let updated = roster
            .edit(TutorEdit {
                original_id: Some("no-such-id".into()),
                name: Some("  jane DOE ".into()),
                grade: Some("12".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.id, "1001");
        assert_eq!(updated.grade, "12");
        assert_eq!(updated.name, "jane DOE");
    }

    #[tokio::test]
    async fn test_padded_id_is_a_duplicate() {
        let (roster, store) = roster_with(vec![tutor("1001", "Jane Doe")]);
        let result = roster
            .add(NewTutor {
                name: Some(" Sam Lee ".into()),
                id: Some(" 1001".into()),
                photo: Some("sam.jpg".into()),
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(PortError::Conflict(_))));

        let added = roster
            .add(NewTutor {
                name: Some(" Sam Lee ".into()),
                id: Some("1002 ".into()),
                photo: Some("sam.jpg".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!((added.id.as_str(), added.name.as_str()), ("1002", "Sam Lee"));

        let result = roster
            .edit(TutorEdit {
                original_id: Some(" 1002 ".into()),
                id: Some("1001 ".into()),
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(PortError::Conflict(_))));
        assert_eq!(store.records().await.len(), 2);
    }

    #[tokio::test]
    async fn test_edit_changing_id_moves_presence() {
        let (roster, _) = roster_with(vec![tutor("1001", "Jane Doe")]);
        let now = Utc::now();
        roster.login("1001", now).await.unwrap();

        roster
            .edit(TutorEdit {
                original_id: Some("1001".into()),
                id: Some("2001".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(roster.presence().last_seen("1001").await.is_none());
        assert_eq!(roster.presence().last_seen("2001").await, Some(now));
    }

    #[tokio::test]
    async fn test_edit_renaming_onto_existing_id_conflicts() {
        let (roster, store) = roster_with(vec![tutor("1001", "Jane Doe"), tutor("1002", "Sam Lee")]);
        let result = roster
            .edit(TutorEdit {
                original_id: Some("1001".into()),
                id: Some("1002".into()),
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(PortError::Conflict(_))));
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_edit_can_change_id() {
        let (roster, _) = roster_with(vec![tutor("1001", "Jane Doe")]);
        let updated = roster
            .edit(TutorEdit {
                original_id: Some("1001".into()),
                id: Some("2001".into()),
                subjects: Some(vec!["Biology".into(), "Latin".into()]),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.id, "2001");
        assert_eq!(updated.subjects, vec!["Biology", "Latin"]);
        assert_eq!(roster.list().await, vec![updated]);
    }

    #[tokio::test]
    async fn test_edit_ambiguous_name_conflicts() {
        let (roster, _) = roster_with(vec![tutor("1001", "Jane Doe"), tutor("1002", "jane doe")]);
        let result = roster
            .edit(TutorEdit {
                name: Some("Jane Doe".into()),
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(PortError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_edit_without_locator_is_not_found() {
        let (roster, _) = roster_with(vec![tutor("1001", "Jane Doe")]);
        let result = roster
            .edit(TutorEdit {
                grade: Some("9".into()),
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(PortError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unreadable_store_refuses_mutations() {
        let (roster, store) = roster_with(vec![tutor("1001", "Jane Doe")]);
        store.break_with("corrupt workbook").await;

        assert!(roster.list().await.is_empty());
        let result = roster
            .add(NewTutor {
                name: Some("Sam Lee".into()),
                id: Some("1002".into()),
                photo: Some("sam.jpg".into()),
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(PortError::StoreUnavailable(_))));
        assert_eq!(store.save_count(), 0);
    }

    /// Yields between reading and writing so unserialized updates would interleave.
    struct YieldingStore(MemoryStore);

    #[async_trait::async_trait]
    impl RecordStore for YieldingStore {
        async fn load(&self) -> crate::ports::Loaded {
            let loaded = self.0.load().await;
            tokio::task::yield_now().await;
            loaded
        }

        async fn save(&self, records: &[TutorRecord]) -> PortResult<()> {
            tokio::task::yield_now().await;
            self.0.save(records).await
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_are_all_kept() {
        let store = Arc::new(YieldingStore(MemoryStore::new()));
        let roster = Arc::new(TutorRoster::new(
            store.clone(),
            Arc::new(PresenceTracker::new()),
        ));

        let handles: Vec<_> = (0..20)
            .map(|n| {
                let roster = roster.clone();
                tokio::spawn(async move {
                    roster
                        .add(NewTutor {
                            name: Some(format!("Tutor {}", n)),
                            id: Some(format!("{}", 1000 + n)),
                            photo: Some(format!("tutor{}.jpg", n)),
                            ..Default::default()
                        })
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let mut ids: Vec<String> = roster.list().await.into_iter().map(|t| t.id).collect();
        ids.sort();
        let expected: Vec<String> = (0..20).map(|n| format!("{}", 1000 + n)).collect();
        assert_eq!(ids, expected);
        assert_eq!(store.0.save_count(), 20);
    }

    #[tokio::test]
    async fn test_failed_save_is_reported() {
        let (roster, store) = roster_with(vec![tutor("1001", "Jane Doe")]);
        store.fail_saves(true).await;

        let result = roster.toggle_availability("1001").await;
        assert!(matches!(result, Err(PortError::StoreUnavailable(_))));
        assert!(matches!(
            store.load().await,
            crate::ports::Loaded::Records(records) if !records[0].available
        ));
    }
}
