//! Task model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::models::patch::{FieldUpdate, NullableUpdate, TaskPatch};

/// Identifier of a task. Assigned by the remote authority (or the seed set),
/// so it is an opaque string rather than a generated UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string representation of this ID
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TaskId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("task id cannot be empty".into()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Where the work happens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

/// Business lifecycle of a task, driven by the field worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BusinessStatus {
    #[default]
    Available,
    InProgress,
    Done,
    Cancelled,
}

impl BusinessStatus {
    pub const ALL: [Self; 4] = [Self::Available, Self::InProgress, Self::Done, Self::Cancelled];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BusinessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BusinessStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("unknown business status: {s}")))
    }
}

/// Where a task stands relative to the remote authority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    PendingSync,
    Syncing,
    Synced,
    Error,
    Conflict,
}

impl SyncStatus {
    pub const ALL: [Self; 5] = [
        Self::PendingSync,
        Self::Syncing,
        Self::Synced,
        Self::Error,
        Self::Conflict,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingSync => "pending_sync",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Error => "error",
            Self::Conflict => "conflict",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("unknown sync status: {s}")))
    }
}

/// A unit of field work, the primary synchronized entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub price: f64,
    pub business_status: BusinessStatus,
    pub sync_status: SyncStatus,
    pub location: TaskLocation,
    /// Reference to a captured photo, if any
    pub image_ref: Option<String>,
    /// Expiry timestamp (Unix ms)
    pub expires_at: i64,
    pub notes: String,
    /// Monotonic counter owned by the remote authority
    pub server_version: i64,
    /// Local last-write timestamp (Unix ms)
    pub updated_at: i64,
    /// Set only on confirmed remote acceptance (Unix ms)
    pub last_synced_at: Option<i64>,
}

impl Task {
    /// Apply the present fields of `patch`. Absent fields are left alone.
    pub fn apply_patch(&mut self, patch: &TaskPatch) {
        if let FieldUpdate::Set(status) = patch.business_status {
            self.business_status = status;
        }
        if let FieldUpdate::Set(notes) = &patch.notes {
            self.notes.clone_from(notes);
        }
        match &patch.image_ref {
            NullableUpdate::Unchanged => {}
            NullableUpdate::Set(image_ref) => self.image_ref = Some(image_ref.clone()),
            NullableUpdate::Clear => self.image_ref = None,
        }
    }

    /// Serialize this task into the immutable snapshot format used by queue
    /// items and conflicts.
    pub fn to_payload(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a snapshot previously produced by [`Task::to_payload`].
    ///
    /// `item` names the queue item or conflict the payload belongs to.
    pub fn from_payload(item: &str, payload: &str) -> crate::Result<Self> {
        serde_json::from_str(payload).map_err(|error| crate::Error::malformed(item, error))
    }
}

#[cfg(test)]
pub(crate) fn sample_task(id: &str) -> Task {
    Task {
        id: TaskId::new(id),
        title: "Audit Snacks Aisle".to_string(),
        price: 45.0,
        business_status: BusinessStatus::Available,
        sync_status: SyncStatus::Synced,
        location: TaskLocation {
            latitude: 19.4326,
            longitude: -99.1332,
            address: "Walmart Reforma".to_string(),
        },
        image_ref: None,
        expires_at: 1_900_000_000_000,
        notes: String::new(),
        server_version: 1,
        updated_at: 1_700_000_000_000,
        last_synced_at: Some(1_700_000_000_000),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_strings_roundtrip() {
        for status in SyncStatus::ALL {
            assert_eq!(status.as_str().parse::<SyncStatus>().unwrap(), status);
        }
        for status in BusinessStatus::ALL {
            assert_eq!(status.as_str().parse::<BusinessStatus>().unwrap(), status);
        }
        assert!("finished".parse::<BusinessStatus>().is_err());
    }

    #[test]
    fn test_payload_uses_snake_case_statuses() {
        let mut task = sample_task("t1");
        task.business_status = BusinessStatus::InProgress;
        task.sync_status = SyncStatus::PendingSync;

        let payload = task.to_payload().unwrap();
        assert!(payload.contains("\"business_status\":\"in_progress\""));
        assert!(payload.contains("\"sync_status\":\"pending_sync\""));
        assert_eq!(Task::from_payload("q1", &payload).unwrap(), task);
    }

    #[test]
    fn test_from_payload_reports_malformed() {
        let error = Task::from_payload("queue-1", "{not json").unwrap_err();
        assert!(matches!(
            error,
            crate::Error::MalformedPayload { ref item, .. } if item == "queue-1"
        ));
    }

    #[test]
    fn test_apply_patch_only_touches_present_fields() {
        let mut task = sample_task("t1");
        task.notes = "keep me".to_string();
        task.image_ref = Some("file:///photo.jpg".to_string());

        task.apply_patch(&TaskPatch::new().with_status(BusinessStatus::Done));

        assert_eq!(task.business_status, BusinessStatus::Done);
        assert_eq!(task.notes, "keep me");
        assert_eq!(task.image_ref.as_deref(), Some("file:///photo.jpg"));
    }

    #[test]
    fn test_apply_patch_clears_image() {
        let mut task = sample_task("t1");
        task.image_ref = Some("file:///photo.jpg".to_string());

        task.apply_patch(&TaskPatch::new().with_notes("shelf restocked").clear_image());

        assert_eq!(task.image_ref, None);
        assert_eq!(task.notes, "shelf restocked");
    }

    #[test]
    fn test_task_id_rejects_blank() {
        assert!("  ".parse::<TaskId>().is_err());
        assert_eq!(" t-9 ".parse::<TaskId>().unwrap().as_str(), "t-9");
    }
}
