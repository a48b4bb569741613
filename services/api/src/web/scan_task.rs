//! services/api/src/web/scan_task.rs
//!
//! This module contains the asynchronous "worker" function responsible for
//! a single scan: gating the submission, calling the Diagnosis Requester and
//! recording the outcome.

use crate::{error::ApiError, web::state::AppState};
use plant_doctor_core::{AnalysisError, EncodedImage, ViewState};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Runs one scan to completion and returns the resulting view state.
///
/// The diagnosis runs in its own task, so a client that disconnects mid-scan
/// does not leave the processing flag stuck.
pub async fn scan_process(app_state: Arc<AppState>, image: EncodedImage) -> Result<ViewState, ApiError> {
    // Claim the single scan slot. The guard is dropped before the provider call.
    app_state.controller.lock().await.begin_scan()?;

    let start_time = Instant::now();
    info!(mime_type = image.mime_type(), bytes = image.bytes().len(), "Scan started.");

    let worker_state = app_state.clone();
    let worker = tokio::spawn(async move {
        let outcome = worker_state.requester.analyze(&image).await;
        let mut controller = worker_state.controller.lock().await;
        match outcome {
            Ok(record) => controller
                .scan_completed(record)
                .map(|state| state.clone())
                .map_err(ApiError::from),
            Err(e) => {
                controller.scan_failed(&e);
                Err(ApiError::Analysis(e))
            }
        }
    });

    match worker.await {
        Ok(result) => {
            info!(
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                ok = result.is_ok(),
                "Scan finished."
            );
            result
        }
        Err(join_error) => {
            error!("Scan worker did not finish: {}", join_error);
            let err = AnalysisError::new(join_error.to_string());
            app_state.controller.lock().await.scan_failed(&err);
            Err(ApiError::Analysis(err))
        }
    }
}
