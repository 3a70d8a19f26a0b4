//! Resource Actions
//!
//! The state-changing actions gcpops can apply to a resource, with the
//! wording used in confirmations and progress output.

use serde_json::{json, Value};

/// A lifecycle action and its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceAction {
    Start,
    Stop,
    Restart,
    Delete,
    Reimage,
    Upgrade { version: Option<String> },
    ApplyTag { key: String, value: String },
    RemoveTag { key: String },
    CreateSnapshot { name_prefix: Option<String> },
    ApplyLock,
    RemoveLock,
    Backup { description: Option<String> },
}

impl ResourceAction {
    /// Key matching `actions[].key` in the resource registry
    pub fn key(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Delete => "delete",
            Self::Reimage => "reimage",
            Self::Upgrade { .. } => "upgrade",
            Self::ApplyTag { .. } => "apply-tag",
            Self::RemoveTag { .. } => "remove-tag",
            Self::CreateSnapshot { .. } => "create-snapshot",
            Self::ApplyLock => "apply-lock",
            Self::RemoveLock => "remove-lock",
            Self::Backup { .. } => "backup",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Stop => "Stop",
            Self::Restart => "Restart",
            Self::Delete => "Delete",
            Self::Reimage => "Reimage",
            Self::Upgrade { .. } => "Upgrade",
            Self::ApplyTag { .. } => "Tag",
            Self::RemoveTag { .. } => "Untag",
            Self::CreateSnapshot { .. } => "Snapshot",
            Self::ApplyLock => "Lock",
            Self::RemoveLock => "Unlock",
            Self::Backup { .. } => "Backup",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Start => "Started",
            Self::Stop => "Stopped",
            Self::Restart => "Restarted",
            Self::Delete => "Deleted",
            Self::Reimage => "Reimaged",
            Self::Upgrade { .. } => "Upgraded",
            Self::ApplyTag { .. } => "Tagged",
            Self::RemoveTag { .. } => "Untagged",
            Self::CreateSnapshot { .. } => "Snapshotted",
            Self::ApplyLock => "Locked",
            Self::RemoveLock => "Unlocked",
            Self::Backup { .. } => "Backed up",
        }
    }

    pub fn present_participle(&self) -> &'static str {
        match self {
            Self::Start => "Starting",
            Self::Stop => "Stopping",
            Self::Restart => "Restarting",
            Self::Delete => "Deleting",
            Self::Reimage => "Reimaging",
            Self::Upgrade { .. } => "Upgrading",
            Self::ApplyTag { .. } => "Tagging",
            Self::RemoveTag { .. } => "Untagging",
            Self::CreateSnapshot { .. } => "Snapshotting",
            Self::ApplyLock => "Locking",
            Self::RemoveLock => "Unlocking",
            Self::Backup { .. } => "Backing up",
        }
    }

    /// Confirmation sentence shown after a successful call
    pub fn success_message(&self, resource_name: &str) -> String {
        match self {
            Self::ApplyTag { key, value } => {
                format!("Tagged {} with {}={}", resource_name, key, value)
            },
            Self::RemoveTag { key } => format!("Removed tag {} from {}", key, resource_name),
            Self::Upgrade {
                version: Some(version),
            } => format!("Upgraded {} to {}", resource_name, version),
            _ => format!("{} {}", self.past_tense(), resource_name),
        }
    }

    /// Action parameters in the shape `sdk_dispatch` expects
    pub fn params(&self) -> Value {
        match self {
            Self::Upgrade { version } => json!({ "version": version }),
            Self::ApplyTag { key, value } => json!({ "key": key, "value": value }),
            Self::RemoveTag { key } => json!({ "key": key }),
            Self::CreateSnapshot { name_prefix } => json!({ "namePrefix": name_prefix }),
            Self::Backup { description } => json!({ "description": description }),
            _ => Value::Object(serde_json::Map::new()),
        }
    }
}
