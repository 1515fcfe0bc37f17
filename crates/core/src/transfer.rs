//! Batch transfer engine
//!
//! Uploads a local tree or deletes a set of remote keys through a bounded
//! pool of workers. Every task ends in its own outcome; one failing task
//! never aborts the batch.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::lister::{ListRequest, Lister};
use crate::metadata::{MetadataResolver, MetadataSpec};
use crate::traits::{Metadata, ObjectStore};
use crate::walker::get_filelist;

/// Worker pool settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    /// Number of concurrent workers
    pub workers: usize,
}

impl TransferConfig {
    /// Pool sized to the available hardware concurrency
    pub fn new() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self { workers }
    }

    /// Set the number of workers (at least one)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// What a task does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferAction {
    /// Upload a local file
    Upload { local_path: PathBuf },
    /// Delete the remote key
    Delete,
}

/// One unit of work, owned by exactly one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTask {
    /// Submission order within the batch
    pub index: usize,
    pub bucket: String,
    pub key: String,
    pub action: TransferAction,
}

impl TransferTask {
    /// Human-readable line for the intended action
    pub fn describe(&self) -> String {
        match &self.action {
            TransferAction::Upload { local_path } => format!(
                "would upload {} to {}/{}",
                local_path.display(),
                self.bucket,
                self.key
            ),
            TransferAction::Delete => format!("would delete {}/{}", self.bucket, self.key),
        }
    }
}

/// Terminal state of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum TaskOutcome {
    Succeeded,
    Failed(String),
    Skipped,
}

/// Outcome of one task
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub index: usize,
    pub bucket: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    /// The intended action, as printed in dry-run mode
    pub action: String,
    pub outcome: TaskOutcome,
}

impl TaskReport {
    fn new(task: &TransferTask, outcome: TaskOutcome) -> Self {
        let local_path = match &task.action {
            TransferAction::Upload { local_path } => Some(local_path.clone()),
            TransferAction::Delete => None,
        };
        Self {
            index: task.index,
            bucket: task.bucket.clone(),
            key: task.key.clone(),
            local_path,
            action: task.describe(),
            outcome,
        }
    }
}

/// Per-task outcomes of a batch, in submission order
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    pub dry_run: bool,
    pub reports: Vec<TaskReport>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, TaskOutcome::Succeeded))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, TaskOutcome::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, TaskOutcome::Skipped))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Intended-action lines of the tasks skipped by a dry run
    pub fn simulated_actions(&self) -> Vec<&str> {
        self.reports
            .iter()
            .filter(|r| r.outcome == TaskOutcome::Skipped)
            .map(|r| r.action.as_str())
            .collect()
    }

    fn count(&self, pred: impl Fn(&TaskOutcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Parameters of a tree upload
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub bucket: String,
    pub local_dir: PathBuf,
    /// Prepended verbatim to each local path to form the key
    pub key_prefix: String,
    pub recursive: bool,
    /// Substrings; a file whose path contains any of them is skipped
    pub ignore: Vec<String>,
    pub metadata: Option<MetadataSpec>,
    pub dry_run: bool,
}

/// Runs batches of transfer tasks against a shared store
pub struct TransferEngine<'a> {
    store: &'a dyn ObjectStore,
    config: TransferConfig,
}

impl<'a> TransferEngine<'a> {
    pub fn new(store: &'a dyn ObjectStore, config: TransferConfig) -> Self {
        Self { store, config }
    }

    /// Upload the files of a local tree.
    ///
    /// Walking the directory and resolving the metadata spec happen before
    /// dispatch; their failures are returned as errors. Everything after
    /// that is reported per task.
    pub async fn upload_tree(&self, request: &UploadRequest) -> Result<BatchResult> {
        let files = get_filelist(&request.local_dir, request.recursive, &request.ignore)?;
        let resolver = request.metadata.clone().map(MetadataSpec::resolve).transpose()?;

        let tasks = files
            .into_iter()
            .enumerate()
            .map(|(index, local_path)| TransferTask {
                index,
                bucket: request.bucket.clone(),
                key: format!("{}{}", request.key_prefix, local_path.to_string_lossy()),
                action: TransferAction::Upload { local_path },
            })
            .collect();

        Ok(self.run(tasks, resolver.as_ref(), request.dry_run).await)
    }

    /// Delete every key matched by `request`.
    ///
    /// A listing failure is returned as an error; delete failures are
    /// reported per task.
    pub async fn delete_matching(
        &self,
        bucket: &str,
        request: &ListRequest,
        dry_run: bool,
    ) -> Result<BatchResult> {
        let keys = Lister::new(self.store).list_keys(bucket, request).await?;
        let tasks = keys
            .into_iter()
            .enumerate()
            .map(|(index, key)| TransferTask {
                index,
                bucket: bucket.to_string(),
                key,
                action: TransferAction::Delete,
            })
            .collect();

        Ok(self.run(tasks, None, dry_run).await)
    }

    /// Execute prepared tasks. Never fails as a whole.
    pub async fn run(
        &self,
        tasks: Vec<TransferTask>,
        metadata: Option<&MetadataResolver>,
        dry_run: bool,
    ) -> BatchResult {
        let reports = if dry_run {
            tasks
                .iter()
                .map(|task| {
                    tracing::info!("(dry run) {}", task.describe());
                    TaskReport::new(task, TaskOutcome::Skipped)
                })
                .collect()
        } else {
            self.dispatch(tasks, metadata).await
        };

        BatchResult { dry_run, reports }
    }

    async fn dispatch(
        &self,
        tasks: Vec<TransferTask>,
        metadata: Option<&MetadataResolver>,
    ) -> Vec<TaskReport> {
        if tasks.is_empty() {
            return Vec::new();
        }
        let workers = self.config.workers.clamp(1, tasks.len());
        tracing::debug!(tasks = tasks.len(), workers, "dispatching batch");

        let (task_tx, task_rx) = async_channel::bounded::<TransferTask>(workers);
        let (report_tx, report_rx) = async_channel::unbounded::<TaskReport>();

        let producer = async move {
            for task in tasks {
                if task_tx.send(task).await.is_err() {
                    break;
                }
            }
        };

        let pool: Vec<_> = (0..workers)
            .map(|worker| {
                let task_rx = task_rx.clone();
                let report_tx = report_tx.clone();
                async move {
                    while let Ok(task) = task_rx.recv().await {
                        let report = self.execute(task, metadata).await;
                        if report_tx.send(report).await.is_err() {
                            break;
                        }
                    }
                    tracing::trace!(worker, "worker drained");
                }
            })
            .collect();
        drop(report_tx);

        futures::join!(producer, futures::future::join_all(pool));

        let mut reports = Vec::new();
        while let Ok(report) = report_rx.try_recv() {
            reports.push(report);
        }
        reports.sort_by_key(|r| r.index);
        reports
    }

    async fn execute(&self, task: TransferTask, metadata: Option<&MetadataResolver>) -> TaskReport {
        let result = match &task.action {
            TransferAction::Upload { local_path } => {
                self.upload_one(&task, local_path, metadata).await
            }
            TransferAction::Delete => self.store.delete(&task.bucket, &task.key).await,
        };

        let outcome = match result {
            Ok(()) => {
                tracing::debug!(bucket = %task.bucket, key = %task.key, "task succeeded");
                TaskOutcome::Succeeded
            }
            Err(e) => {
                tracing::warn!(bucket = %task.bucket, key = %task.key, error = %e, "task failed");
                TaskOutcome::Failed(e.to_string())
            }
        };
        TaskReport::new(&task, outcome)
    }

    async fn upload_one(
        &self,
        task: &TransferTask,
        local_path: &Path,
        metadata: Option<&MetadataResolver>,
    ) -> Result<()> {
        tokio::fs::metadata(local_path).await?;
        let metadata = match metadata {
            Some(resolver) => {
                resolver
                    .metadata_for(&local_path.to_string_lossy())
                    .await?
            }
            None => Metadata::new(),
        };
        self.store
            .upload(&task.bucket, &task.key, local_path, &metadata)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::lister::KeyPattern;
    use crate::test_utils::{MemoryStore, meta};
    use crate::traits::MockObjectStore;
    use std::fs;
    use tempfile::TempDir;

    fn tree(names: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in names {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, name.as_bytes()).unwrap();
        }
        dir
    }

    fn upload_request(dir: &TempDir) -> UploadRequest {
        UploadRequest {
            bucket: "bucket".into(),
            local_dir: dir.path().to_path_buf(),
            key_prefix: "ds/".into(),
            recursive: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_dry_run_makes_no_store_calls() {
        let dir = tree(&["a.txt", "b.txt", "sub/c.txt"]);
        // A mock without expectations panics on any call
        let store = MockObjectStore::new();
        let engine = TransferEngine::new(&store, TransferConfig::new().with_workers(2));

        let request = UploadRequest {
            dry_run: true,
            metadata: Some(MetadataSpec::parse(r#"{"a":"1"}"#).unwrap()),
            ..upload_request(&dir)
        };
        let result = engine.upload_tree(&request).await.unwrap();

        assert!(result.dry_run);
        assert_eq!(result.len(), 3);
        assert_eq!(result.skipped(), 3);
        let lines = result.simulated_actions();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.starts_with("would upload ")));
        assert!(lines[0].ends_with(&format!("to bucket/ds/{}", dir.path().join("a.txt").display())));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dry_run_never_runs_metadata_script() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tree(&["a.txt", "b.txt"]);
        let scripts = TempDir::new().unwrap();
        let marker = scripts.path().join("ran");
        let script = scripts.path().join("meta.sh");
        fs::write(
            &script,
            format!("#!/bin/sh
touch '{}'
exit 1
", marker.display()),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let store = MockObjectStore::new();
        let engine = TransferEngine::new(&store, TransferConfig::new().with_workers(2));
        let request = UploadRequest {
            dry_run: true,
            metadata: Some(MetadataSpec::Script(script)),
            ..upload_request(&dir)
        };
        let result = engine.upload_tree(&request).await.unwrap();

        assert_eq!(result.skipped(), 2);
        assert!(!result.has_failures());
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_key_is_prefix_plus_local_path() {
        let dir = tree(&["x.bin"]);
        let store = MemoryStore::new();
        let engine = TransferEngine::new(&store, TransferConfig::new());

        let result = engine.upload_tree(&upload_request(&dir)).await.unwrap();
        assert_eq!(result.succeeded(), 1);

        let expected = format!("ds/{}", dir.path().join("x.bin").to_string_lossy());
        assert_eq!(store.keys("bucket"), vec![expected.clone()]);
        assert_eq!(result.reports[0].key, expected);
    }

    #[tokio::test]
    async fn test_one_failure_is_isolated() {
        let dir = tree(&["f1", "f2", "f3", "f4", "f5"]);
        let failing = format!("ds/{}", dir.path().join("f3").to_string_lossy());
        let store = MemoryStore::new().failing_on(&failing);
        let engine = TransferEngine::new(&store, TransferConfig::new().with_workers(3));

        let result = engine.upload_tree(&upload_request(&dir)).await.unwrap();

        assert_eq!(result.len(), 5);
        assert_eq!(result.succeeded(), 4);
        assert_eq!(result.failed(), 1);
        assert!(matches!(result.reports[2].outcome, TaskOutcome::Failed(_)));
        assert_eq!(result.reports[2].key, failing);
        let indices: Vec<usize> = result.reports.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_inline_metadata_applies_to_every_file() {
        let dir = tree(&["a", "b", "c"]);
        let store = MemoryStore::new();
        let engine = TransferEngine::new(&store, TransferConfig::new());

        let request = UploadRequest {
            metadata: Some(MetadataSpec::parse(r#"{"a":"1"}"#).unwrap()),
            ..upload_request(&dir)
        };
        let result = engine.upload_tree(&request).await.unwrap();
        assert_eq!(result.succeeded(), 3);

        for key in store.keys("bucket") {
            assert_eq!(store.get_metadata("bucket", &key).await.unwrap(), meta(&[("a", "1")]));
        }
    }

    #[tokio::test]
    async fn test_metadata_failure_is_per_task() {
        let dir = tree(&["good", "bad"]);
        let store = MemoryStore::new();
        let engine = TransferEngine::new(&store, TransferConfig::new());

        let spec = MetadataSpec::computed(|name| {
            if name.ends_with("bad") {
                Err(Error::MetadataScriptFailure("no metadata".into()))
            } else {
                Ok(meta(&[("file", name)]))
            }
        });
        let request = UploadRequest {
            metadata: Some(spec),
            ..upload_request(&dir)
        };
        let result = engine.upload_tree(&request).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result.succeeded(), 1);
        assert_eq!(result.failed(), 1);
        assert_eq!(store.keys("bucket").len(), 1);
    }

    #[tokio::test]
    async fn test_missing_local_file_fails_task() {
        let store = MemoryStore::new();
        let engine = TransferEngine::new(&store, TransferConfig::new());
        let tasks = vec![TransferTask {
            index: 0,
            bucket: "bucket".into(),
            key: "gone".into(),
            action: TransferAction::Upload {
                local_path: PathBuf::from("/definitely/not/here"),
            },
        }];

        let result = engine.run(tasks, None, false).await;
        assert_eq!(result.failed(), 1);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_ignore_and_single_level() {
        let dir = tree(&["keep.txt", "skip.tmp", "sub/deep.txt"]);
        let store = MemoryStore::new();
        let engine = TransferEngine::new(&store, TransferConfig::new());

        let request = UploadRequest {
            recursive: false,
            ignore: vec![".tmp".into()],
            ..upload_request(&dir)
        };
        let result = engine.upload_tree(&request).await.unwrap();
        assert_eq!(result.len(), 1);
        assert!(result.reports[0].key.ends_with("keep.txt"));
    }

    #[tokio::test]
    async fn test_missing_directory_is_error() {
        let store = MemoryStore::new();
        let engine = TransferEngine::new(&store, TransferConfig::new());
        let request = UploadRequest {
            local_dir: PathBuf::from("/no/such/dir"),
            ..Default::default()
        };
        assert!(engine.upload_tree(&request).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_matching() {
        let store = MemoryStore::new().with_page_size(2);
        for key in ["logs/a", "logs/b", "logs/c", "data/a"] {
            store.insert("bucket", key, b"x", Metadata::new());
        }
        let engine = TransferEngine::new(&store, TransferConfig::new().with_workers(2));

        let request = ListRequest::new("").with_pattern(Some(KeyPattern::new("logs/").unwrap()));
        let result = engine.delete_matching("bucket", &request, false).await.unwrap();

        assert_eq!(result.succeeded(), 3);
        assert_eq!(store.keys("bucket"), vec!["data/a"]);
    }

    #[tokio::test]
    async fn test_delete_matching_dry_run() {
        let store = MemoryStore::new();
        store.insert("bucket", "logs/a", b"x", Metadata::new());
        let engine = TransferEngine::new(&store, TransferConfig::new());

        let result = engine
            .delete_matching("bucket", &ListRequest::new("logs/"), true)
            .await
            .unwrap();
        assert_eq!(result.simulated_actions(), vec!["would delete bucket/logs/a"]);
        assert_eq!(store.keys("bucket"), vec!["logs/a"]);
    }

    #[tokio::test]
    async fn test_delete_listing_failure_propagates() {
        let mut store = MockObjectStore::new();
        store
            .expect_list_objects()
            .returning(|_, _| Err(Error::StoreUnavailable("timeout".into())));
        store.expect_delete().never();
        let engine = TransferEngine::new(&store, TransferConfig::new());

        let err = engine
            .delete_matching("bucket", &ListRequest::new(""), false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }

    /// Store whose deletes only complete once `parties` of them are in flight.
    struct RendezvousStore {
        barrier: tokio::sync::Barrier,
    }

    #[async_trait::async_trait]
    impl ObjectStore for RendezvousStore {
        async fn list_buckets(&self) -> Result<Vec<crate::traits::ObjectRecord>> {
            unimplemented!()
        }

        async fn list_objects(
            &self,
            _bucket: &str,
            _options: crate::traits::ListOptions,
        ) -> Result<crate::traits::ListingPage> {
            unimplemented!()
        }

        async fn upload(
            &self,
            _bucket: &str,
            _key: &str,
            _local_path: &Path,
            _metadata: &Metadata,
        ) -> Result<()> {
            unimplemented!()
        }

        async fn delete(&self, _bucket: &str, _key: &str) -> Result<()> {
            tokio::time::timeout(std::time::Duration::from_secs(5), self.barrier.wait())
                .await
                .map(|_| ())
                .map_err(|_| Error::StoreUnavailable("deletes did not overlap".into()))
        }

        async fn get_metadata(&self, _bucket: &str, _key: &str) -> Result<Metadata> {
            unimplemented!()
        }

        async fn download(&self, _bucket: &str, _key: &str, _local_path: &Path) -> Result<()> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn test_workers_run_concurrently() {
        let store = RendezvousStore {
            barrier: tokio::sync::Barrier::new(3),
        };
        let engine = TransferEngine::new(&store, TransferConfig::new().with_workers(3));
        let tasks = (0..3)
            .map(|index| TransferTask {
                index,
                bucket: "b".into(),
                key: format!("k{index}"),
                action: TransferAction::Delete,
            })
            .collect();

        let result = engine.run(tasks, None, false).await;
        assert_eq!(result.succeeded(), 3);
    }

    #[test]
    fn test_batch_result_json() {
        let result = BatchResult {
            dry_run: false,
            reports: vec![TaskReport::new(
                &TransferTask {
                    index: 0,
                    bucket: "b".into(),
                    key: "k".into(),
                    action: TransferAction::Delete,
                },
                TaskOutcome::Failed("boom".into()),
            )],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["reports"][0]["outcome"]["status"], "failed");
        assert_eq!(json["reports"][0]["outcome"]["reason"], "boom");
        assert!(json["reports"][0].get("local_path").is_none());
    }
}
