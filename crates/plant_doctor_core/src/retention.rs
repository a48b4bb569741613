//! crates/plant_doctor_core/src/retention.rs
//!
//! The Retention Store: owns the bounded scan History and the user-curated
//! Collection, and mirrors each of them to its own key in a `KeyValueStore`.
//!
//! Both lists are most-recent-first and ordered purely by insertion. Every
//! mutation rewrites the whole list under its key.

use tracing::{debug, error, info};

use crate::domain::AnalysisRecord;
use crate::ports::{KeyValueStore, PortError, PortResult};

pub const HISTORY_KEY: &str = "plant_history";
pub const COLLECTION_KEY: &str = "plant_collection";

/// Maximum number of records kept in History.
pub const HISTORY_LIMIT: usize = 20;

pub const CLEAR_HISTORY_PROMPT: &str = "Are you sure you want to clear your scan history?";

pub struct RetentionStore {
    storage: Box<dyn KeyValueStore>,
    history: Vec<AnalysisRecord>,
    collection: Vec<AnalysisRecord>,
}

impl RetentionStore {
    /// Restores both lists from storage. A list whose blob cannot be read or
    /// parsed starts empty; the other list is unaffected.
    pub fn load(storage: Box<dyn KeyValueStore>) -> Self {
        let history = load_list(storage.as_ref(), HISTORY_KEY);
        let collection = load_list(storage.as_ref(), COLLECTION_KEY);
        info!(
            history = history.len(),
            collection = collection.len(),
            "Retention store loaded"
        );
        Self {
            storage,
            history,
            collection,
        }
    }

    pub fn history(&self) -> &[AnalysisRecord] {
        &self.history
    }

    pub fn collection(&self) -> &[AnalysisRecord] {
        &self.collection
    }

    /// Whether a record with this id has been saved to the Collection.
    pub fn is_saved(&self, id: &str) -> bool {
        self.collection.iter().any(|r| r.id.as_str() == id)
    }

    /// Looks a record up in History first, then in the Collection.
    pub fn find(&self, id: &str) -> Option<&AnalysisRecord> {
        self.history
            .iter()
            .chain(self.collection.iter())
            .find(|r| r.id.as_str() == id)
    }

    /// Prepends `record`, dropping the oldest entries beyond `HISTORY_LIMIT`.
    pub fn add_to_history(&mut self, record: AnalysisRecord) -> PortResult<&[AnalysisRecord]> {
        self.history.insert(0, record);
        if self.history.len() > HISTORY_LIMIT {
            let evicted = self.history.len() - HISTORY_LIMIT;
            self.history.truncate(HISTORY_LIMIT);
            debug!(evicted, "History cap reached, oldest entries dropped");
        }
        self.persist(HISTORY_KEY, &self.history)?;
        Ok(&self.history)
    }

    /// Prepends `record` unless its id is already saved, in which case nothing changes.
    pub fn add_to_collection(&mut self, record: AnalysisRecord) -> PortResult<&[AnalysisRecord]> {
        if self.is_saved(record.id.as_str()) {
            debug!(record_id = %record.id, "Record already in collection");
            return Ok(&self.collection);
        }
        self.collection.insert(0, record);
        self.persist(COLLECTION_KEY, &self.collection)?;
        Ok(&self.collection)
    }

    /// Removes the entry with `id`. An absent id is not an error.
    pub fn remove_from_collection(&mut self, id: &str) -> PortResult<&[AnalysisRecord]> {
        self.collection.retain(|r| r.id.as_str() != id);
        self.persist(COLLECTION_KEY, &self.collection)?;
        Ok(&self.collection)
    }

    /// Empties History once `confirm` approves `CLEAR_HISTORY_PROMPT`, and
    /// drops the storage key. A declined confirmation changes nothing.
    pub fn clear_history<F>(&mut self, confirm: F) -> PortResult<&[AnalysisRecord]>
    where
        F: FnOnce(&str) -> bool,
    {
        if !confirm(CLEAR_HISTORY_PROMPT) {
            debug!("Clear history declined");
            return Ok(&self.history);
        }
        self.history.clear();
        self.storage.remove(HISTORY_KEY)?;
        info!("History cleared");
        Ok(&self.history)
    }

    fn persist(&self, key: &str, records: &[AnalysisRecord]) -> PortResult<()> {
        let blob = serde_json::to_vec(records)
            .map_err(|e| PortError::Unexpected(format!("failed to serialize {}: {}", key, e)))?;
        self.storage.set(key, &blob).map_err(|e| {
            error!("Failed to persist {}: {}", key, e);
            e
        })
    }
}

fn load_list(storage: &dyn KeyValueStore, key: &str) -> Vec<AnalysisRecord> {
    match storage.get(key) {
        Ok(Some(blob)) => match serde_json::from_slice(&blob) {
            Ok(records) => records,
            Err(e) => {
                error!("Failed to parse {}: {}", key, e);
                Vec::new()
            }
        },
        Ok(None) => Vec::new(),
        Err(e) => {
            error!("Failed to read {}: {}", key, e);
            Vec::new()
        }
    }
}
