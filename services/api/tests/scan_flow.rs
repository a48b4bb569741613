//! Integration tests for the scan → history → collection flow through the
//! service layer, with a scripted vision provider and an on-disk store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use api_lib::{
    adapters::FileStore,
    error::ApiError,
    web::{
        rest::{ClearHistoryParams, LibraryParams, NavigateRequest, SaveRecordRequest},
        scan_task::scan_process,
        state::AppState,
        add_to_collection_handler, clear_history_handler, get_library_plant_handler,
        list_collection_handler, list_history_handler, list_library_handler, navigate_handler,
        remove_from_collection_handler, select_record_handler,
    },
};
use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use plant_doctor_core::{
    diagnosis::ANALYSIS_FAILED_MESSAGE,
    ports::{KeyValueStore, PortError, PortResult, VisionAnalysisService},
    EncodedImage, RecordId, View,
};
use tokio::sync::Notify;

const POTHOS: &str = r#"{
    "plantName": "Pothos",
    "healthStatus": "Healthy",
    "confidence": 0.92,
    "description": "Glossy, evenly coloured leaves.",
    "treatmentSteps": [],
    "preventiveTips": ["Water weekly"],
    "severity": "None"
}"#;

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Replies with a fixed body, optionally waiting for a signal first.
struct ScriptedVision {
    reply: Result<String, String>,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
}

impl ScriptedVision {
    fn replying(body: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(body.to_string()),
            gate: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            gate: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn gated(body: &str, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(body.to_string()),
            gate: Some(gate),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl VisionAnalysisService for ScriptedVision {
    async fn analyze_image(&self, _image: &EncodedImage, _instruction: &str) -> PortResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.reply.clone().map_err(PortError::Unexpected)
    }
}

fn app_over(dir: &std::path::Path, vision: Arc<ScriptedVision>) -> Arc<AppState> {
    let storage = FileStore::open(dir).unwrap();
    Arc::new(AppState::new(vision, Box::new(storage)))
}

/// Reads find nothing and every write fails.
struct FullDisk;

impl KeyValueStore for FullDisk {
    fn get(&self, _key: &str) -> PortResult<Option<Vec<u8>>> {
        Ok(None)
    }

    fn set(&self, key: &str, _value: &[u8]) -> PortResult<()> {
        Err(PortError::Unexpected(format!("no space left writing {}", key)))
    }

    fn remove(&self, key: &str) -> PortResult<()> {
        Err(PortError::Unexpected(format!("no space left removing {}", key)))
    }
}

fn leaf_photo() -> EncodedImage {
    EncodedImage::jpeg(vec![0xFF, 0xD8, 0xFF, 0xE0])
}

// ── Scan ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn scan_records_history_and_can_be_saved() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_over(dir.path(), ScriptedVision::replying(POTHOS));

    let state = scan_process(app.clone(), leaf_photo()).await.unwrap();
    let record = state.current_record.clone().unwrap();
    assert!(!state.is_processing);
    assert_eq!(record.plant_name, "Pothos");
    assert_eq!(record.image_url, "data:image/jpeg;base64,/9j/4A==");

    let Json(history) = list_history_handler(State(app.clone())).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, record.id);
    assert!(dir.path().join("plant_history.json").exists());

    add_to_collection_handler(State(app.clone()), Json(SaveRecordRequest { id: record.id.clone() }))
        .await
        .unwrap();
    let Json(collection) = list_collection_handler(State(app.clone())).await;
    assert_eq!(collection.len(), 1);
    assert_eq!(collection[0].id, record.id);
}

#[tokio::test]
async fn provider_failure_sets_error_and_keeps_history_empty() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_over(dir.path(), ScriptedVision::failing("upstream 500"));

    let err = scan_process(app.clone(), leaf_photo()).await.unwrap_err();
    assert!(matches!(err, ApiError::Analysis(_)));
    assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(err.to_string(), ANALYSIS_FAILED_MESSAGE);

    let controller = app.controller.lock().await;
    assert!(!controller.state().is_processing);
    assert_eq!(controller.state().error.as_deref(), Some(ANALYSIS_FAILED_MESSAGE));
    assert!(controller.store().history().is_empty());
}

#[tokio::test]
async fn invalid_provider_json_is_a_failed_scan() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_over(dir.path(), ScriptedVision::replying(r#"{"plantName": "Pothos"}"#));

    assert!(scan_process(app.clone(), leaf_photo()).await.is_err());
    assert!(app.controller.lock().await.store().history().is_empty());
}

#[tokio::test]
async fn second_scan_is_rejected_while_one_is_in_flight() {
    let dir = tempfile::tempdir().unwrap();
    let gate = Arc::new(Notify::new());
    let vision = ScriptedVision::gated(POTHOS, gate.clone());
    let app = app_over(dir.path(), vision.clone());

    let first = tokio::spawn(scan_process(app.clone(), leaf_photo()));
    while vision.calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    assert!(app.controller.lock().await.state().is_processing);

    let err = scan_process(app.clone(), leaf_photo()).await.unwrap_err();
    assert!(matches!(err, ApiError::ScanRejected(_)));
    assert_eq!(err.status_code(), StatusCode::CONFLICT);

    gate.notify_one();
    first.await.unwrap().unwrap();
    assert_eq!(vision.calls.load(Ordering::SeqCst), 1);
    assert_eq!(app.controller.lock().await.store().history().len(), 1);
}

#[tokio::test]
async fn history_write_failure_is_a_server_error_and_frees_the_scanner() {
    let app = Arc::new(AppState::new(ScriptedVision::replying(POTHOS), Box::new(FullDisk)));

    let err = scan_process(app.clone(), leaf_photo()).await.unwrap_err();
    assert!(matches!(err, ApiError::Port(PortError::Unexpected(_))));
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

    let controller = app.controller.lock().await;
    assert!(!controller.state().is_processing);
    assert!(controller.state().error.is_none());
    let shown = controller.state().current_record.clone().unwrap();
    assert_eq!(controller.store().history(), std::slice::from_ref(&shown));
}

// ── Persistence ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn history_and_collection_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_over(dir.path(), ScriptedVision::replying(POTHOS));
    let first = scan_process(app.clone(), leaf_photo()).await.unwrap();
    scan_process(app.clone(), leaf_photo()).await.unwrap();
    let saved = first.current_record.unwrap();
    add_to_collection_handler(State(app.clone()), Json(SaveRecordRequest { id: saved.id.clone() }))
        .await
        .unwrap();

    let restarted = app_over(dir.path(), ScriptedVision::replying(POTHOS));
    let Json(before) = list_history_handler(State(app.clone())).await;
    let Json(after) = list_history_handler(State(restarted.clone())).await;
    assert_eq!(before, after);

    let Json(collection) = list_collection_handler(State(restarted.clone())).await;
    assert_eq!(collection, vec![saved]);

    // View state is not persisted.
    assert!(restarted.controller.lock().await.state().current_record.is_none());
}

#[tokio::test]
async fn corrupt_history_file_starts_empty_without_losing_collection() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_over(dir.path(), ScriptedVision::replying(POTHOS));
    let record = scan_process(app.clone(), leaf_photo())
        .await
        .unwrap()
        .current_record
        .unwrap();
    add_to_collection_handler(State(app.clone()), Json(SaveRecordRequest { id: record.id.clone() }))
        .await
        .unwrap();

    std::fs::write(dir.path().join("plant_history.json"), b"[{broken").unwrap();

    let restarted = app_over(dir.path(), ScriptedVision::replying(POTHOS));
    let Json(history) = list_history_handler(State(restarted.clone())).await;
    let Json(collection) = list_collection_handler(State(restarted.clone())).await;
    assert!(history.is_empty());
    assert_eq!(collection.len(), 1);
}

// ── History and Collection Handlers ───────────────────────────────────────────

#[tokio::test]
async fn clear_history_requires_confirmation() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_over(dir.path(), ScriptedVision::replying(POTHOS));
    scan_process(app.clone(), leaf_photo()).await.unwrap();

    let Json(kept) = clear_history_handler(State(app.clone()), Query(ClearHistoryParams::default()))
        .await
        .unwrap();
    assert_eq!(kept.len(), 1);

    let Json(cleared) =
        clear_history_handler(State(app.clone()), Query(ClearHistoryParams { confirm: true }))
            .await
            .unwrap();
    assert!(cleared.is_empty());
    assert!(!dir.path().join("plant_history.json").exists());

    let Json(again) =
        clear_history_handler(State(app.clone()), Query(ClearHistoryParams { confirm: true }))
            .await
            .unwrap();
    assert!(again.is_empty());
}

#[tokio::test]
async fn saving_an_unknown_record_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_over(dir.path(), ScriptedVision::replying(POTHOS));

    let result = add_to_collection_handler(
        State(app.clone()),
        Json(SaveRecordRequest { id: RecordId::from("never-scanned") }),
    )
    .await;
    match result {
        Err(err) => assert_eq!(err.status_code(), StatusCode::NOT_FOUND),
        Ok(_) => panic!("saving an unknown record must fail"),
    }
}

#[tokio::test]
async fn removing_from_collection_leaves_history_intact() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_over(dir.path(), ScriptedVision::replying(POTHOS));
    let record = scan_process(app.clone(), leaf_photo())
        .await
        .unwrap()
        .current_record
        .unwrap();
    add_to_collection_handler(State(app.clone()), Json(SaveRecordRequest { id: record.id.clone() }))
        .await
        .unwrap();

    let Json(collection) = remove_from_collection_handler(State(app.clone()), Path(record.id.to_string()))
        .await
        .unwrap();
    assert!(collection.is_empty());

    let Json(unchanged) = remove_from_collection_handler(State(app.clone()), Path(record.id.to_string()))
        .await
        .unwrap();
    assert!(unchanged.is_empty());

    let Json(history) = list_history_handler(State(app.clone())).await;
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn saving_twice_answers_ok_without_duplicating() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_over(dir.path(), ScriptedVision::replying(POTHOS));
    let record = scan_process(app.clone(), leaf_photo())
        .await
        .unwrap()
        .current_record
        .unwrap();

    let first = add_to_collection_handler(State(app.clone()), Json(SaveRecordRequest { id: record.id.clone() }))
        .await
        .unwrap()
        .into_response();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = add_to_collection_handler(State(app.clone()), Json(SaveRecordRequest { id: record.id.clone() }))
        .await
        .unwrap()
        .into_response();
    assert_eq!(second.status(), StatusCode::OK);

    let Json(collection) = list_collection_handler(State(app.clone())).await;
    assert_eq!(collection.len(), 1);
}

#[tokio::test]
async fn records_with_non_uuid_ids_can_be_selected_and_removed() {
    let dir = tempfile::tempdir().unwrap();
    let legacy = r#"[{
        "id": "1717171717171-abc",
        "timestamp": 1717171717171,
        "imageUrl": "data:image/jpeg;base64,AA==",
        "plantName": "Fern",
        "healthStatus": "Healthy",
        "description": "Fine.",
        "treatmentSteps": [],
        "preventiveTips": [],
        "severity": "None"
    }]"#;
    std::fs::write(dir.path().join("plant_collection.json"), legacy).unwrap();
    let app = app_over(dir.path(), ScriptedVision::replying(POTHOS));

    let Json(selected) = select_record_handler(State(app.clone()), Path("1717171717171-abc".to_string()))
        .await
        .unwrap();
    assert!(selected.is_current_saved);

    let Json(collection) =
        remove_from_collection_handler(State(app.clone()), Path("1717171717171-abc".to_string()))
            .await
            .unwrap();
    assert!(collection.is_empty());
}

// ── View State Handlers ───────────────────────────────────────────────────────

#[tokio::test]
async fn selecting_a_saved_record_returns_to_the_scanner() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_over(dir.path(), ScriptedVision::replying(POTHOS));
    let record = scan_process(app.clone(), leaf_photo())
        .await
        .unwrap()
        .current_record
        .unwrap();
    add_to_collection_handler(State(app.clone()), Json(SaveRecordRequest { id: record.id.clone() }))
        .await
        .unwrap();

    let Json(nav) = navigate_handler(
        State(app.clone()),
        Json(NavigateRequest {
            view: View::Collection,
        }),
    )
    .await;
    assert_eq!(nav.state.view, View::Collection);
    assert!(nav.state.current_record.is_none());

    let Json(selected) = select_record_handler(State(app.clone()), Path(record.id.to_string()))
        .await
        .unwrap();
    assert_eq!(selected.state.view, View::Scanner);
    assert_eq!(selected.state.current_record.map(|r| r.id), Some(record.id.clone()));
    assert!(selected.is_current_saved);

    let missing = select_record_handler(State(app.clone()), Path("never-scanned".to_string())).await;
    assert!(matches!(missing, Err(ApiError::NotFound(_))));
}

// ── Library Handlers ──────────────────────────────────────────────────────────

#[tokio::test]
async fn library_lists_filters_and_finds() {
    let Json(all) = list_library_handler(Query(LibraryParams::default())).await;
    assert_eq!(all.len(), 6);

    let Json(easy) = list_library_handler(Query(LibraryParams {
        category: Some("SUCCULENT".to_string()),
    }))
    .await;
    assert_eq!(easy.len(), 2);

    let Json(fig) = get_library_plant_handler(Path("3".to_string())).await.unwrap();
    assert_eq!(fig.name, "Fiddle Leaf Fig");
    assert!(get_library_plant_handler(Path("42".to_string())).await.is_err());
}
