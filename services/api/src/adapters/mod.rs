pub mod db;
pub mod description_llm;
pub mod file_storage;
pub mod toast;

pub use db::PgRecordBackend;
pub use description_llm::OpenAiDescriptionAdapter;
pub use file_storage::FileStorage;
pub use toast::ToastLog;
