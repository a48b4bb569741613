pub mod file_store;
pub mod vision_llm;

pub use file_store::FileStore;
pub use vision_llm::OpenAiVisionAdapter;
