use std::path::Path;

use anyhow::Context;

use crate::wire::{self, Normalized, StudentsPayload};

/// Reads a saved `GET /students` payload from disk.
pub fn load(path: &Path) -> anyhow::Result<Normalized> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    let payload: StudentsPayload = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a student list", path.display()))?;
    let normalized = wire::normalize_all(payload.into_raw());
    tracing::info!(
        path = %path.display(),
        count = normalized.records.len(),
        rejected = normalized.rejected,
        "loaded snapshot"
    );
    Ok(normalized)
}
