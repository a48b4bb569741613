//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use plant_doctor_core::{
    ports::{KeyValueStore, VisionAnalysisService},
    DiagnosisRequester, RetentionStore, ViewController,
};
use std::sync::Arc;
use tokio::sync::Mutex;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// The controller lock is only ever held for synchronous store/state updates,
/// never across the call to the vision provider.
#[derive(Clone)]
pub struct AppState {
    pub requester: DiagnosisRequester,
    pub controller: Arc<Mutex<ViewController>>,
}

impl AppState {
    /// Restores History and Collection from `storage` and wires the vision adapter.
    pub fn new(vision: Arc<dyn VisionAnalysisService>, storage: Box<dyn KeyValueStore>) -> Self {
        let store = RetentionStore::load(storage);
        Self {
            requester: DiagnosisRequester::new(vision),
            controller: Arc::new(Mutex::new(ViewController::new(store))),
        }
    }
}
