//! Migration job and per-file transfer state machines.

use crate::error::{EngineError, EngineResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use stratus_core::Provider;
use stratus_providers::{AdapterError, AdapterErrorKind};
use uuid::Uuid;

/// Job identifier (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| EngineError::InvalidArgument(format!("malformed job id: {}", s)))
    }
}

/// Scheduling priority. High drains before normal drains before low; FIFO
/// within a priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPriority {
    Low,
    Normal,
    High,
}

impl Default for JobPriority {
    fn default() -> Self {
        JobPriority::Normal
    }
}

/// Job lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    PartiallyFailed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed
                | JobStatus::PartiallyFailed
                | JobStatus::Failed
                | JobStatus::Cancelled
        )
    }

    /// Validates a state transition.
    pub fn can_transition_to(&self, next: &JobStatus) -> bool {
        match (self, next) {
            (JobStatus::Pending, JobStatus::Running) => true,
            (JobStatus::Pending, JobStatus::Cancelled) => true,
            (JobStatus::Running, JobStatus::Completed) => true,
            (JobStatus::Running, JobStatus::PartiallyFailed) => true,
            (JobStatus::Running, JobStatus::Failed) => true,
            (JobStatus::Running, JobStatus::Cancelled) => true,
            _ => false,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::PartiallyFailed => "PARTIALLY_FAILED",
            JobStatus::Failed => "FAILED",
            JobStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// Per-file transfer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    Queued,
    InFlight,
    Copied,
    Verified,
    Failed,
    Skipped,
}

impl FileState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FileState::Verified | FileState::Failed | FileState::Skipped)
    }
}

/// Structured reason a transfer failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferError {
    pub kind: AdapterErrorKind,
    pub message: String,
}

impl From<&AdapterError> for TransferError {
    fn from(err: &AdapterError) -> Self {
        Self {
            kind: err.kind,
            message: err.message.clone(),
        }
    }
}

/// One file's subtask within a migration job. Never outlives its job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTransfer {
    pub source_key: String,

    /// Defaults to the source key.
    pub dest_key: String,

    pub state: FileState,

    pub bytes_transferred: u64,

    pub attempts: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<TransferError>,

    /// Destination etag observed at verification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_etag: Option<String>,
}

impl FileTransfer {
    pub fn new(source_key: impl Into<String>) -> Self {
        let source_key = source_key.into();
        Self {
            dest_key: source_key.clone(),
            source_key,
            state: FileState::Queued,
            bytes_transferred: 0,
            attempts: 0,
            last_error: None,
            dest_etag: None,
        }
    }

    /// Start an attempt: `QUEUED -> IN_FLIGHT`.
    pub fn begin_attempt(&mut self) {
        self.state = FileState::InFlight;
        self.attempts += 1;
    }

    /// `IN_FLIGHT -> COPIED`, recording bytes moved.
    pub fn mark_copied(&mut self, bytes: u64) {
        self.state = FileState::Copied;
        self.bytes_transferred = bytes;
    }

    /// `COPIED -> VERIFIED`; the only path to success.
    pub fn mark_verified(&mut self, dest_etag: Option<String>) {
        self.state = FileState::Verified;
        self.dest_etag = dest_etag;
        self.last_error = None;
    }

    /// Any in-flight state -> `FAILED` with a structured reason.
    pub fn mark_failed(&mut self, error: TransferError) {
        self.state = FileState::Failed;
        self.last_error = Some(error);
    }

    /// `FAILED -> QUEUED` when retry policy allows another attempt.
    pub fn requeue(&mut self) {
        self.state = FileState::Queued;
    }

    /// `QUEUED -> SKIPPED` when the job is cancelled before this file starts.
    pub fn skip(&mut self) {
        self.state = FileState::Skipped;
    }
}

/// Counts of files by state. At all times the states partition the file
/// list: the counts sum to the total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCounts {
    pub queued: usize,
    pub in_flight: usize,
    pub copied: usize,
    pub verified: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl FileCounts {
    pub fn total(&self) -> usize {
        self.queued + self.in_flight + self.copied + self.verified + self.failed + self.skipped
    }

    /// Files in a terminal state; what progress counts.
    pub fn terminal(&self) -> usize {
        self.verified + self.failed + self.skipped
    }
}

/// A durable migration job and its exclusively owned file transfers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationJob {
    pub id: JobId,

    /// Principal that created the job.
    pub owner: String,

    pub source_provider: Provider,
    pub source_container: String,
    pub dest_provider: Provider,
    pub dest_container: String,

    pub priority: JobPriority,

    /// Whether verified source objects are deleted after the copy lands.
    pub delete_source: bool,

    pub status: JobStatus,

    pub files: Vec<FileTransfer>,

    /// Monotonically non-decreasing until a terminal state.
    pub progress_percentage: u8,

    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl MigrationJob {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        owner: impl Into<String>,
        source_provider: Provider,
        source_container: impl Into<String>,
        dest_provider: Provider,
        dest_container: impl Into<String>,
        file_list: &[String],
        priority: JobPriority,
        delete_source: bool,
    ) -> Self {
        Self {
            id: JobId::new(),
            owner: owner.into(),
            source_provider,
            source_container: source_container.into(),
            dest_provider,
            dest_container: dest_container.into(),
            priority,
            delete_source,
            status: JobStatus::Pending,
            files: file_list.iter().map(FileTransfer::new).collect(),
            progress_percentage: 0,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Counts of files by state.
    pub fn counts(&self) -> FileCounts {
        let mut counts = FileCounts::default();
        for file in &self.files {
            match file.state {
                FileState::Queued => counts.queued += 1,
                FileState::InFlight => counts.in_flight += 1,
                FileState::Copied => counts.copied += 1,
                FileState::Verified => counts.verified += 1,
                FileState::Failed => counts.failed += 1,
                FileState::Skipped => counts.skipped += 1,
            }
        }
        counts
    }

    /// Recompute `progress_percentage` from file states. Terminal file
    /// states never revert, so progress is monotone until the job ends.
    pub fn recompute_progress(&mut self) {
        let counts = self.counts();
        if counts.total() == 0 {
            return;
        }
        self.progress_percentage = (100 * counts.terminal() / counts.total()) as u8;
    }

    /// Apply a validated state transition; `Conflict` otherwise.
    pub fn transition(&mut self, next: JobStatus) -> EngineResult<()> {
        if !self.status.can_transition_to(&next) {
            return Err(EngineError::Conflict(format!(
                "job {} cannot transition {} -> {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        match next {
            JobStatus::Running if self.started_at.is_none() => {
                self.started_at = Some(Utc::now());
            }
            s if s.is_terminal() => {
                self.completed_at = Some(Utc::now());
            }
            _ => {}
        }
        Ok(())
    }

    /// The terminal status the current file states imply.
    pub fn terminal_status(&self, cancelled: bool) -> JobStatus {
        if cancelled {
            return JobStatus::Cancelled;
        }
        let counts = self.counts();
        if counts.failed == 0 {
            JobStatus::Completed
        } else if counts.verified == 0 {
            JobStatus::Failed
        } else {
            JobStatus::PartiallyFailed
        }
    }

    /// Reset an interrupted job for resumption after restart: files caught
    /// mid-transfer go back to the queue, and a formerly running job waits
    /// for a worker again.
    pub fn reset_for_resume(&mut self) {
        for file in &mut self.files {
            if matches!(file.state, FileState::InFlight | FileState::Copied) {
                file.state = FileState::Queued;
            }
        }
        if self.status == JobStatus::Running {
            self.status = JobStatus::Pending;
        }
        self.recompute_progress();
    }
}
