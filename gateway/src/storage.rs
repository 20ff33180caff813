//! Saved calculations
//!
//! Each saved budget is one pretty-printed JSON file in the storage directory,
//! named `<sanitized name>_<YYYYmmdd_HHMMSS>.json`. The file stem is the record id.
//! Outputs are always recomputed from the submitted inputs before saving.

use chrono::{DateTime, Utc};
use link_budget::{compute_from_params, EngineError, LinkBudgetOutput, LinkBudgetParams};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_NOTES_LEN: usize = 500;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Calculation not found: {0}")]
    NotFound(String),
    #[error("Invalid calculation id: {0}")]
    InvalidId(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Deserialize)]
pub struct SaveRequest {
    pub calculation_name: String,
    pub inputs: LinkBudgetParams,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedCalculation {
    pub id: String,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub inputs: LinkBudgetParams,
    pub results: LinkBudgetOutput,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalculationSummary {
    pub id: String,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub notes: Option<String>,
}

impl From<&SavedCalculation> for CalculationSummary {
    fn from(saved: &SavedCalculation) -> Self {
        Self {
            id: saved.id.clone(),
            name: saved.name.clone(),
            timestamp: saved.timestamp,
            notes: saved.notes.clone(),
        }
    }
}

/// Keep alphanumerics, dash and underscore; spaces become underscores
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .filter(|c| c.is_alphanumeric() || " -_".contains(*c))
        .take(MAX_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim().replace(' ', "_");
    if cleaned.is_empty() {
        "calculation".to_string()
    } else {
        cleaned
    }
}

fn validate_id(id: &str) -> Result<()> {
    let ok = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}

/// File-backed store shared across request handlers
#[derive(Clone)]
pub struct CalculationStore {
    dir: Arc<PathBuf>,
    lock: Arc<RwLock<()>>,
}

impl CalculationStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir: Arc::new(dir),
            lock: Arc::new(RwLock::new(())),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    pub async fn save(&self, request: SaveRequest) -> Result<SavedCalculation> {
        self.save_at(request, Utc::now()).await
    }

    pub async fn save_at(&self, request: SaveRequest, now: DateTime<Utc>) -> Result<SavedCalculation> {
        let name_len = request.calculation_name.chars().count();
        if name_len == 0 || name_len > MAX_NAME_LEN {
            return Err(StoreError::InvalidRequest(format!(
                "calculation_name must be 1-{} characters",
                MAX_NAME_LEN
            )));
        }
        if let Some(notes) = &request.notes {
            if notes.chars().count() > MAX_NOTES_LEN {
                return Err(StoreError::InvalidRequest(format!(
                    "notes must be at most {} characters",
                    MAX_NOTES_LEN
                )));
            }
        }

        let results = compute_from_params(&request.inputs)?;

        let _guard = self.lock.write().await;

        let base = format!(
            "{}_{}",
            sanitize_name(&request.calculation_name),
            now.format("%Y%m%d_%H%M%S")
        );
        let mut id = base.clone();
        let mut n = 2;
        while tokio::fs::try_exists(self.path_for(&id)).await? {
            id = format!("{}_{}", base, n);
            n += 1;
        }

        let saved = SavedCalculation {
            id,
            name: request.calculation_name,
            timestamp: now,
            inputs: request.inputs,
            results,
            notes: request.notes,
        };

        let json = serde_json::to_vec_pretty(&saved)?;
        tokio::fs::write(self.path_for(&saved.id), json).await?;
        tracing::info!("Saved calculation {} to {:?}", saved.id, self.dir);

        Ok(saved)
    }

    /// Newest first; unreadable files are skipped
    pub async fn list(&self) -> Result<Vec<CalculationSummary>> {
        let _guard = self.lock.read().await;

        let mut summaries = Vec::new();
        let mut entries = tokio::fs::read_dir(self.dir.as_path()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_record(&path).await {
                Ok(saved) => summaries.push(CalculationSummary::from(&saved)),
                Err(e) => tracing::warn!("Skipping unreadable calculation {:?}: {}", path, e),
            }
        }

        summaries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(summaries)
    }

    pub async fn load(&self, id: &str) -> Result<SavedCalculation> {
        validate_id(id)?;
        let _guard = self.lock.read().await;

        let path = self.path_for(id);
        if !tokio::fs::try_exists(&path).await? {
            return Err(StoreError::NotFound(id.to_string()));
        }
        read_record(&path).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        validate_id(id)?;
        let _guard = self.lock.write().await;

        let path = self.path_for(id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!("Deleted calculation {}", id);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

async fn read_record(path: &Path) -> Result<SavedCalculation> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn request(name: &str) -> SaveRequest {
        SaveRequest {
            calculation_name: name.to_string(),
            inputs: LinkBudgetParams::reference(),
            notes: Some("clear sky".to_string()),
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_760_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("LEO to OGS (night)"), "LEO_to_OGS_night");
        assert_eq!(sanitize_name("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_name("!!!"), "calculation");
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("LEO_20260101_120000").is_ok());
        assert!(validate_id("../secret").is_err());
        assert!(validate_id("a/b").is_err());
        assert!(validate_id("").is_err());
    }

    #[tokio::test]
    async fn test_save_load_delete() {
        let dir = TempDir::new().unwrap();
        let store = CalculationStore::open(dir.path()).unwrap();

        let saved = store.save_at(request("Test Link"), at(0)).await.unwrap();
        assert!(saved.id.starts_with("Test_Link_"));
        assert!(dir.path().join(format!("{}.json", saved.id)).exists());

        let loaded = store.load(&saved.id).await.unwrap();
        assert_eq!(loaded.name, "Test Link");
        assert_eq!(loaded.notes.as_deref(), Some("clear sky"));
        assert_eq!(loaded.results.margin_status, saved.results.margin_status);

        store.delete(&saved.id).await.unwrap();
        assert!(matches!(
            store.load(&saved.id).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete(&saved.id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = CalculationStore::open(dir.path()).unwrap();

        store.save_at(request("older"), at(0)).await.unwrap();
        store.save_at(request("newer"), at(60)).await.unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let list = store.list().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "newer");
        assert_eq!(list[1].name, "older");
    }

    #[tokio::test]
    async fn test_same_second_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let store = CalculationStore::open(dir.path()).unwrap();

        let a = store.save_at(request("dup"), at(0)).await.unwrap();
        let b = store.save_at(request("dup"), at(0)).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_save_rejects_invalid_inputs() {
        let dir = TempDir::new().unwrap();
        let store = CalculationStore::open(dir.path()).unwrap();

        let mut req = request("bad");
        req.inputs.distance = Some(0.0);
        assert!(matches!(
            store.save_at(req, at(0)).await,
            Err(StoreError::Engine(EngineError::InvalidGeometry { .. }))
        ));

        assert!(matches!(
            store.save_at(request(""), at(0)).await,
            Err(StoreError::InvalidRequest(_))
        ));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let store = CalculationStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.load("../Cargo").await,
            Err(StoreError::InvalidId(_))
        ));
    }
}
