//! JSON-file plan and outstanding-state store.
//!
//! Layout under the data directory:
//!
//! ```text
//! plans/<learner>.json        StoredPlan
//! outstanding/<learner>.json  OutstandingState
//! locks/<learner>.lock        advisory lock file
//! ```
//!
//! Every write goes to a temporary file in the target directory which is
//! then renamed over the old record, so readers see either the previous
//! record or the new one, never a partial file.
//!
//! Several processes may share one data directory (a `watch` daemon next to
//! CLI invocations). A learner's plan rewrite and status updates hold an
//! exclusive `flock` on that learner's lock file, which the OS releases if
//! the holder dies.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use studyplan_core::model::{ItemId, ItemStatus, LearnerId, OutstandingState, StoredPlan};
use studyplan_core::traits::{LearnerLease, OutstandingSource, PlanStore};

use crate::error::StoreError;

const PLANS_DIR: &str = "plans";
const OUTSTANDING_DIR: &str = "outstanding";
const LOCKS_DIR: &str = "locks";
const LOCK_RETRY: Duration = Duration::from_millis(25);

/// An exclusive lock on one learner's lock file. Released on drop.
#[derive(Debug)]
pub struct LearnerFileLock {
    file: File,
    path: PathBuf,
}

impl LearnerFileLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LearnerFileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), "failed to release learner lock: {e}");
        }
    }
}

/// File-backed store for plans and per-learner item statuses.
#[derive(Debug)]
pub struct JsonFileStore {
    root: PathBuf,
    /// Serializes read-modify-write updates of outstanding records.
    status_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            status_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, dir: &str, learner: &LearnerId) -> Result<PathBuf, StoreError> {
        validate_learner_id(learner)?;
        Ok(self.root.join(dir).join(format!("{learner}.json")))
    }

    /// Wait for the learner's cross-process lock.
    ///
    /// Polls a non-blocking `flock` so the wait can be cancelled by dropping
    /// the future.
    pub async fn learner_lock(&self, learner: &LearnerId) -> Result<LearnerFileLock, StoreError> {
        validate_learner_id(learner)?;
        let path = self.root.join(LOCKS_DIR).join(format!("{learner}.lock"));
        let file = open_lock_file(path.clone()).await?;

        let mut waited = false;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(LearnerFileLock { file, path }),
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    if !waited {
                        tracing::debug!(learner = %learner, "waiting for learner lock");
                        waited = true;
                    }
                    tokio::time::sleep(LOCK_RETRY).await;
                }
                Err(e) => return Err(StoreError::io(path, e)),
            }
        }
    }

    /// Replace the learner's outstanding record.
    pub async fn save_outstanding(
        &self,
        learner: &LearnerId,
        state: &OutstandingState,
    ) -> Result<(), StoreError> {
        let path = self.record_path(OUTSTANDING_DIR, learner)?;
        write_json_atomic(path, state).await
    }

    /// Record `status` for one item, creating the learner's record if needed.
    pub async fn set_status(
        &self,
        learner: &LearnerId,
        item: ItemId,
        status: ItemStatus,
    ) -> Result<OutstandingState, StoreError> {
        let _guard = self.status_lock.lock().await;
        let _lock = self.learner_lock(learner).await?;
        let path = self.record_path(OUTSTANDING_DIR, learner)?;
        let mut state: OutstandingState = read_json(&path).await?.unwrap_or_default();
        state.set(item, status);
        write_json_atomic(path, &state).await?;
        Ok(state)
    }

    /// Create an empty outstanding record unless one exists.
    ///
    /// Returns whether a record was created.
    pub async fn ensure_outstanding(&self, learner: &LearnerId) -> Result<bool, StoreError> {
        let _guard = self.status_lock.lock().await;
        let _lock = self.learner_lock(learner).await?;
        let path = self.record_path(OUTSTANDING_DIR, learner)?;
        if read_json::<OutstandingState>(&path).await?.is_some() {
            return Ok(false);
        }
        write_json_atomic(path, &OutstandingState::new()).await?;
        Ok(true)
    }

    pub async fn read_outstanding(
        &self,
        learner: &LearnerId,
    ) -> Result<Option<OutstandingState>, StoreError> {
        let path = self.record_path(OUTSTANDING_DIR, learner)?;
        read_json(&path).await
    }

    pub async fn read_plan(&self, learner: &LearnerId) -> Result<Option<StoredPlan>, StoreError> {
        let path = self.record_path(PLANS_DIR, learner)?;
        read_json(&path).await
    }

    pub async fn write_plan(&self, plan: &StoredPlan) -> Result<(), StoreError> {
        let path = self.record_path(PLANS_DIR, &plan.learner_id)?;
        write_json_atomic(path, plan).await
    }

    /// Learners with a plan file, sorted.
    pub async fn list_learners(&self) -> Result<Vec<LearnerId>, StoreError> {
        let dir = self.root.join(PLANS_DIR);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(dir, e)),
        };

        let mut learners = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&dir, e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    learners.push(LearnerId::new(stem));
                }
            }
        }
        learners.sort();
        Ok(learners)
    }
}

#[async_trait]
impl OutstandingSource for JsonFileStore {
    async fn outstanding(&self, learner: &LearnerId) -> anyhow::Result<Option<OutstandingState>> {
        Ok(self.read_outstanding(learner).await?)
    }
}

#[async_trait]
impl PlanStore for JsonFileStore {
    async fn learners(&self) -> anyhow::Result<Vec<LearnerId>> {
        Ok(self.list_learners().await?)
    }

    async fn load_plan(&self, learner: &LearnerId) -> anyhow::Result<Option<StoredPlan>> {
        Ok(self.read_plan(learner).await?)
    }

    async fn save_plan(&self, plan: &StoredPlan) -> anyhow::Result<()> {
        self.write_plan(plan).await?;
        tracing::debug!(learner = %plan.learner_id, root = %self.root.display(), "plan saved");
        Ok(())
    }

    async fn lock_learner(&self, learner: &LearnerId) -> anyhow::Result<Option<LearnerLease>> {
        let lock = self.learner_lock(learner).await?;
        Ok(Some(Box::new(lock)))
    }
}

/// Learner ids become file names, so keep them to a safe alphabet.
fn validate_learner_id(learner: &LearnerId) -> Result<(), StoreError> {
    let id = learner.as_str();
    let ok = !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidLearnerId(id.to_string()))
    }
}

async fn open_lock_file(path: PathBuf) -> Result<File, StoreError> {
    tokio::task::spawn_blocking(move || {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        }
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))
    })
    .await
    .map_err(|e| StoreError::Task(e.to_string()))?
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path, e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StoreError::Malformed {
            path: path.to_path_buf(),
            source,
        })
}

async fn write_json_atomic<T: Serialize>(path: PathBuf, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Malformed {
        path: path.clone(),
        source,
    })?;

    tokio::task::spawn_blocking(move || {
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| StoreError::io(&dir, e))?;
        tmp.write_all(&json).map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| StoreError::io(&path, e.error))?;
        Ok(())
    })
    .await
    .map_err(|e| StoreError::Task(e.to_string()))?
}
