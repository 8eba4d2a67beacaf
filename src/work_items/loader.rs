use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tokio::fs;

use super::types::WorkItem;

/// Errors that can occur while reading a tracker export
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid work item export: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Exports may be a bare array or wrapped as `{ "items": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ExportDocument {
    Bare(Vec<WorkItem>),
    Wrapped { items: Vec<WorkItem> },
}

/// Parse a JSON export of work items with embedded status logs.
pub fn parse_work_items(content: &str) -> Result<Vec<WorkItem>, LoadError> {
    let items = match serde_json::from_str::<ExportDocument>(content)? {
        ExportDocument::Bare(items) => items,
        ExportDocument::Wrapped { items } => items,
    };

    let without_log = items.iter().filter(|item| item.transitions.is_empty()).count();
    tracing::debug!(
        items = items.len(),
        without_changelog = without_log,
        "Parsed work item export"
    );

    Ok(items)
}

/// Read and parse a JSON export from disk.
pub async fn load_work_items(path: &Path) -> Result<Vec<WorkItem>, LoadError> {
    let content = fs::read_to_string(path).await.map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_work_items(&content)
}
