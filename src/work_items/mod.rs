// Work item model: tracker export types, status history replay and
// two-tier classification

pub mod classifier;
pub mod history;
pub mod loader;
pub mod types;

pub use classifier::{classify, WorkClassifier};
pub use history::{status_at, time_in_statuses, Reconstruction, StatusHistory};
pub use loader::{load_work_items, parse_work_items, LoadError};
pub use types::*;
