pub mod controller;
pub mod diagnosis;
pub mod domain;
pub mod library;
pub mod ports;
pub mod retention;

pub use controller::{ScanRejected, View, ViewController, ViewState};
pub use diagnosis::{AnalysisError, DiagnosisRequester, EncodedImage, ProviderDiagnosis};
pub use domain::{AnalysisRecord, CareLevel, HealthStatus, LibraryPlant, RecordId, Severity};
pub use ports::{KeyValueStore, MemoryStore, PortError, PortResult, VisionAnalysisService};
pub use retention::RetentionStore;
