//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::{
    error::ApiError,
    web::{scan_task::scan_process, state::AppState},
};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use plant_doctor_core::{
    library, AnalysisRecord, CareLevel, EncodedImage, HealthStatus, LibraryPlant, RecordId,
    Severity, View, ViewState,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        scan_handler,
        get_state_handler,
        navigate_handler,
        reset_handler,
        select_record_handler,
        list_history_handler,
        clear_history_handler,
        list_collection_handler,
        add_to_collection_handler,
        remove_from_collection_handler,
        list_library_handler,
        get_library_plant_handler,
    ),
    components(
        schemas(
            AnalysisRecord, RecordId, HealthStatus, Severity, View, ViewState, LibraryPlant, CareLevel,
            StateResponse, NavigateRequest, SaveRecordRequest
        )
    ),
    tags(
        (name = "Plant Doctor API", description = "Diagnose plant photos and manage scan history and the saved collection.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The current view state plus whether the record on display is saved.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StateResponse {
    pub state: ViewState,
    pub is_current_saved: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NavigateRequest {
    pub view: View,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SaveRecordRequest {
    /// Id of a record currently in History or Collection.
    pub id: RecordId,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClearHistoryParams {
    /// Answer to the "clear your scan history?" confirmation.
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LibraryParams {
    /// Only plants in this category (case-insensitive).
    pub category: Option<String>,
}

async fn state_response(app_state: &AppState) -> StateResponse {
    let controller = app_state.controller.lock().await;
    StateResponse {
        state: controller.state().clone(),
        is_current_saved: controller.is_current_saved(),
    }
}

//=========================================================================================
// Scan
//=========================================================================================

/// Diagnose a plant photo.
///
/// Accepts multipart/form-data with either an `image` file part or a `dataUri`
/// text part holding a `data:<mime>;base64,...` URI.
#[utoipa::path(
    post,
    path = "/scan",
    request_body(content_type = "multipart/form-data", description = "The plant photo to diagnose."),
    responses(
        (status = 200, description = "Diagnosis recorded in history", body = StateResponse),
        (status = 400, description = "No usable image in the request"),
        (status = 409, description = "A scan is already in progress"),
        (status = 502, description = "The image could not be analyzed")
    )
)]
pub async fn scan_handler(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut image = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart data: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let mime_type = field.content_type().unwrap_or("image/jpeg").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read image bytes: {}", e)))?;
                image = Some(EncodedImage::new(data.to_vec(), mime_type));
            }
            Some("dataUri") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read data URI: {}", e)))?;
                let parsed = EncodedImage::from_data_uri(&text)
                    .map_err(|e| ApiError::BadRequest(e.detail().to_string()))?;
                image = Some(parsed);
            }
            _ => {}
        }
    }

    let image = image.ok_or_else(|| {
        ApiError::BadRequest("Multipart form must include an image or dataUri part".to_string())
    })?;
    if image.is_empty() {
        return Err(ApiError::BadRequest("Uploaded image is empty".to_string()));
    }

    scan_process(app_state.clone(), image).await?;
    Ok(Json(state_response(&app_state).await))
}

//=========================================================================================
// View State
//=========================================================================================

#[utoipa::path(
    get,
    path = "/state",
    responses((status = 200, description = "Current view state", body = StateResponse))
)]
pub async fn get_state_handler(State(app_state): State<Arc<AppState>>) -> Json<StateResponse> {
    Json(state_response(&app_state).await)
}

/// Switch the active screen. Leaving the scanner clears the current record.
#[utoipa::path(
    post,
    path = "/view",
    request_body = NavigateRequest,
    responses((status = 200, description = "Navigated", body = StateResponse))
)]
pub async fn navigate_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<NavigateRequest>,
) -> Json<StateResponse> {
    app_state.controller.lock().await.navigate_to(req.view);
    Json(state_response(&app_state).await)
}

/// Dismiss the current result and return the scanner to its ready state.
#[utoipa::path(
    post,
    path = "/view/reset",
    responses((status = 200, description = "Scanner reset", body = StateResponse))
)]
pub async fn reset_handler(State(app_state): State<Arc<AppState>>) -> Json<StateResponse> {
    app_state.controller.lock().await.reset_current();
    Json(state_response(&app_state).await)
}

/// Show a previous diagnosis from History or Collection without rescanning.
#[utoipa::path(
    post,
    path = "/records/{id}/select",
    params(("id" = String, Path, description = "Record id")),
    responses(
        (status = 200, description = "Record selected", body = StateResponse),
        (status = 404, description = "No such record in History or Collection")
    )
)]
pub async fn select_record_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StateResponse>, ApiError> {
    app_state
        .controller
        .lock()
        .await
        .select_record_by_id(&id)
        .ok_or_else(|| ApiError::NotFound(format!("record {}", id)))?;
    Ok(Json(state_response(&app_state).await))
}

//=========================================================================================
// History
//=========================================================================================

#[utoipa::path(
    get,
    path = "/history",
    responses((status = 200, description = "Most recent scans first", body = Vec<AnalysisRecord>))
)]
pub async fn list_history_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<Vec<AnalysisRecord>> {
    Json(app_state.controller.lock().await.store().history().to_vec())
}

/// Clear the scan history. Nothing happens unless `confirm=true`.
#[utoipa::path(
    delete,
    path = "/history",
    params(ClearHistoryParams),
    responses((status = 200, description = "History after the request", body = Vec<AnalysisRecord>))
)]
pub async fn clear_history_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<ClearHistoryParams>,
) -> Result<Json<Vec<AnalysisRecord>>, ApiError> {
    let mut controller = app_state.controller.lock().await;
    let history = controller.clear_history(|_| params.confirm)?.to_vec();
    Ok(Json(history))
}

//=========================================================================================
// Collection
//=========================================================================================

#[utoipa::path(
    get,
    path = "/collection",
    responses((status = 200, description = "Saved records, most recent first", body = Vec<AnalysisRecord>))
)]
pub async fn list_collection_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<Vec<AnalysisRecord>> {
    Json(app_state.controller.lock().await.store().collection().to_vec())
}

/// Save a known record to the collection. Saving it twice is a no-op and
/// answers 200 instead of 201.
#[utoipa::path(
    post,
    path = "/collection",
    request_body = SaveRecordRequest,
    responses(
        (status = 201, description = "Record saved; the collection after the save", body = Vec<AnalysisRecord>),
        (status = 200, description = "Record was already saved; the collection is unchanged", body = Vec<AnalysisRecord>),
        (status = 404, description = "No such record in History or Collection")
    )
)]
pub async fn add_to_collection_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<SaveRecordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut controller = app_state.controller.lock().await;
    if controller.store().is_saved(req.id.as_str()) {
        return Ok((StatusCode::OK, Json(controller.store().collection().to_vec())));
    }
    let record = controller
        .store()
        .find(req.id.as_str())
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("record {}", req.id)))?;
    let collection = controller.add_to_collection(record)?.to_vec();
    info!(record_id = %req.id, size = collection.len(), "Saved to collection");
    Ok((StatusCode::CREATED, Json(collection)))
}

/// Remove a record from the collection. Unknown ids are ignored.
#[utoipa::path(
    delete,
    path = "/collection/{id}",
    params(("id" = String, Path, description = "Record id")),
    responses((status = 200, description = "Collection after the removal", body = Vec<AnalysisRecord>))
)]
pub async fn remove_from_collection_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AnalysisRecord>>, ApiError> {
    let mut controller = app_state.controller.lock().await;
    Ok(Json(controller.remove_from_collection(&id)?.to_vec()))
}

//=========================================================================================
// Plant Library
//=========================================================================================

#[utoipa::path(
    get,
    path = "/library",
    params(LibraryParams),
    responses((status = 200, description = "Encyclopedia entries", body = Vec<LibraryPlant>))
)]
pub async fn list_library_handler(Query(params): Query<LibraryParams>) -> Json<Vec<LibraryPlant>> {
    let plants: Vec<LibraryPlant> = match params.category.as_deref() {
        Some(category) => library::by_category(category).into_iter().cloned().collect(),
        None => library::all().to_vec(),
    };
    Json(plants)
}

#[utoipa::path(
    get,
    path = "/library/{id}",
    params(("id" = String, Path, description = "Library plant id")),
    responses(
        (status = 200, description = "Encyclopedia entry", body = LibraryPlant),
        (status = 404, description = "Unknown plant")
    )
)]
pub async fn get_library_plant_handler(Path(id): Path<String>) -> Result<Json<LibraryPlant>, ApiError> {
    library::find(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("library plant {}", id)))
}
