//! crates/plant_doctor_core/src/controller.rs
//!
//! The View-State Controller. Tracks the active screen, the record on
//! display and the in-flight scan flag, and is the only path by which user
//! actions reach the `RetentionStore`.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::diagnosis::AnalysisError;
use crate::domain::AnalysisRecord;
use crate::ports::PortResult;
use crate::retention::RetentionStore;

/// The mutually exclusive screens of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Scanner,
    Library,
    Collection,
}

/// A snapshot of the application state. Not persisted across restarts.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub view: View,
    /// Only meaningful while `view` is `Scanner`.
    pub current_record: Option<AnalysisRecord>,
    pub is_processing: bool,
    /// Set when the last scan failed, cleared on the next submission.
    pub error: Option<String>,
}

/// Why a scan submission was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanRejected {
    #[error("A scan is already in progress")]
    Busy,
}

pub struct ViewController {
    store: RetentionStore,
    state: ViewState,
}

impl ViewController {
    pub fn new(store: RetentionStore) -> Self {
        Self {
            store,
            state: ViewState::default(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn store(&self) -> &RetentionStore {
        &self.store
    }

    /// Whether the record on display is already in the Collection.
    pub fn is_current_saved(&self) -> bool {
        self.state
            .current_record
            .as_ref()
            .is_some_and(|r| self.store.is_saved(r.id.as_str()))
    }

    //=====================================================================================
    // Navigation
    //=====================================================================================

    pub fn navigate_to(&mut self, view: View) -> &ViewState {
        self.state.view = view;
        if view != View::Scanner {
            self.state.current_record = None;
        }
        debug!(?view, "Navigated");
        &self.state
    }

    /// Shows a previous diagnosis without issuing a new scan.
    pub fn select_record(&mut self, record: AnalysisRecord) -> &ViewState {
        debug!(record_id = %record.id, "Record selected");
        self.state.current_record = Some(record);
        self.state.view = View::Scanner;
        &self.state
    }

    /// Looks `id` up in History or Collection and selects it.
    pub fn select_record_by_id(&mut self, id: &str) -> Option<&ViewState> {
        let record = self.store.find(id)?.clone();
        Some(self.select_record(record))
    }

    /// Returns the scanner to its ready state.
    pub fn reset_current(&mut self) -> &ViewState {
        self.state.current_record = None;
        &self.state
    }

    //=====================================================================================
    // Scan Lifecycle
    //=====================================================================================

    /// Opens the single scan slot. Refused while another scan is in flight.
    pub fn begin_scan(&mut self) -> Result<(), ScanRejected> {
        if self.state.is_processing {
            return Err(ScanRejected::Busy);
        }
        self.state.is_processing = true;
        self.state.error = None;
        Ok(())
    }

    pub fn scan_completed(&mut self, record: AnalysisRecord) -> PortResult<&ViewState> {
        self.state.is_processing = false;
        self.state.current_record = Some(record.clone());
        self.store.add_to_history(record)?;
        Ok(&self.state)
    }

    /// Closes the scan slot after a failed diagnosis. History is untouched.
    pub fn scan_failed(&mut self, err: &AnalysisError) -> &ViewState {
        warn!("Scan failed: {}", err.detail());
        self.state.is_processing = false;
        self.state.error = Some(err.to_string());
        &self.state
    }

    //=====================================================================================
    // Store Operations
    //=====================================================================================

    pub fn add_to_collection(&mut self, record: AnalysisRecord) -> PortResult<&[AnalysisRecord]> {
        self.store.add_to_collection(record)
    }

    pub fn remove_from_collection(&mut self, id: &str) -> PortResult<&[AnalysisRecord]> {
        self.store.remove_from_collection(id)
    }

    pub fn clear_history<F>(&mut self, confirm: F) -> PortResult<&[AnalysisRecord]>
    where
        F: FnOnce(&str) -> bool,
    {
        self.store.clear_history(confirm)
    }
}
