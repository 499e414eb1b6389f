pub mod controller;
pub mod domain;
pub mod local;
pub mod ports;
pub mod schema;
pub mod store;
pub mod validation;
pub mod views;

pub use controller::{
    ControllerError, ControllerResult, DashboardController, DashboardData, DashboardState,
    DescriptionGenerator, EditorState,
};
pub use domain::{
    Category, CategoryPatch, Deal, DealPatch, NewCategory, NewDeal, Notification,
    NotificationLevel, RecordId,
};
pub use local::{LocalRecordBackend, MemoryStorage};
pub use ports::{
    BackendError, DescriptionGenerationService, KeyValueStorage, Notifier, PortError, PortResult,
    RecordBackend, WireRecord,
};
pub use store::{CategoryStore, DealStore, EntityStore, StoreError, StoreResult};
pub use validation::{CategoryForm, DealForm, FieldError, FieldErrorKind, ValidationErrors};
pub use views::{DealFilter, DealStats, StatusFilter};
