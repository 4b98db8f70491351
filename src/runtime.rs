//! External runtime mirror.
//!
//! A cached snapshot of the container runtime's live containers and built
//! images, keyed by primary container name and image repository. Each
//! refresh shells out to the runtime's list command in JSON-lines format and
//! replaces the snapshot wholesale; lines that fail to parse are skipped.
//! When the control socket is absent the refresh is a no-op and the snapshot
//! stays empty, so lookups degrade to "not found" rather than erroring.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::sync::RwLock;

/// One live container as reported by the runtime's list command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerRecord {
    #[serde(rename = "ID")]
    pub id: String,
    /// Primary container name; link aliases are stripped at parse time.
    #[serde(rename = "Names")]
    pub name: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "RunningFor")]
    pub running_for: String,
}

/// One built image as reported by the runtime's list command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "CreatedAt")]
    pub created_at: String,
    #[serde(rename = "CreatedSince")]
    pub created_since: String,
    #[serde(rename = "Repository")]
    pub repository: String,
    #[serde(rename = "Size")]
    pub size: String,
}

/// Snapshot cache of runtime state, refreshed on demand.
#[derive(Debug)]
pub struct RuntimeMirror {
    socket: PathBuf,
    containers: RwLock<HashMap<String, ContainerRecord>>,
    images: RwLock<HashMap<String, ImageRecord>>,
}

impl RuntimeMirror {
    /// Create a mirror watching the given control socket.
    pub fn new(socket: PathBuf) -> Self {
        Self {
            socket,
            containers: RwLock::new(HashMap::new()),
            images: RwLock::new(HashMap::new()),
        }
    }

    /// Whether the runtime's control socket is present.
    pub fn is_connected(&self) -> bool {
        self.socket.exists()
    }

    /// Replace the container snapshot from `docker ps`.
    ///
    /// No-op when the runtime is disconnected or the list command fails;
    /// the snapshot is left empty in both cases.
    pub async fn refresh_containers(&self) {
        let mut snapshot = HashMap::new();
        if self.is_connected() {
            if let Some(stdout) = list_command_output(&["ps", "--format", "{{json .}}"]).await {
                snapshot = parse_containers(&stdout);
            }
        }
        *self.containers.write().await = snapshot;
    }

    /// Replace the image snapshot from `docker images`.
    pub async fn refresh_images(&self) {
        let mut snapshot = HashMap::new();
        if self.is_connected() {
            if let Some(stdout) = list_command_output(&["images", "--format", "{{json .}}"]).await {
                snapshot = parse_images(&stdout);
            }
        }
        *self.images.write().await = snapshot;
    }

    /// Look up a live container by its primary name.
    pub async fn container(&self, name: &str) -> Option<ContainerRecord> {
        self.containers.read().await.get(name).cloned()
    }

    /// Look up a built image by repository.
    pub async fn image(&self, repository: &str) -> Option<ImageRecord> {
        self.images.read().await.get(repository).cloned()
    }
}

/// Run a runtime list command, returning its stdout on success.
async fn list_command_output(args: &[&str]) -> Option<String> {
    let output = match Command::new("docker").args(args).output().await {
        Ok(output) => output,
        Err(err) => {
            tracing::debug!(%err, "runtime list command failed to spawn");
            return None;
        }
    };
    if !output.status.success() {
        tracing::debug!(status = ?output.status.code(), "runtime list command failed");
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse container JSON lines into a name-keyed map, skipping bad lines.
fn parse_containers(stdout: &str) -> HashMap<String, ContainerRecord> {
    let mut containers = HashMap::new();
    for line in stdout.lines() {
        let Ok(mut record) = serde_json::from_str::<ContainerRecord>(line) else {
            continue;
        };
        // The runtime may report comma-joined link aliases; keep the
        // primary name only.
        if let Some((primary, _)) = record.name.split_once(',') {
            record.name = primary.to_string();
        }
        containers.insert(record.name.clone(), record);
    }
    containers
}

/// Parse image JSON lines into a repository-keyed map, skipping bad lines.
fn parse_images(stdout: &str) -> HashMap<String, ImageRecord> {
    let mut images = HashMap::new();
    for line in stdout.lines() {
        let Ok(record) = serde_json::from_str::<ImageRecord>(line) else {
            continue;
        };
        images.insert(record.repository.clone(), record);
    }
    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn container_line(name: &str) -> String {
        serde_json::json!({
            "ID": "abc123",
            "Names": name,
            "State": "running",
            "Status": "Up 2 hours",
            "RunningFor": "2 hours ago",
        })
        .to_string()
    }

    fn image_line(repository: &str) -> String {
        serde_json::json!({
            "ID": "def456",
            "CreatedAt": "2026-08-01 10:00:00 +0000 UTC",
            "CreatedSince": "6 days ago",
            "Repository": repository,
            "Size": "12MB",
        })
        .to_string()
    }

    #[test]
    fn parse_containers_keys_by_name() {
        let stdout = format!("{}\n{}\n", container_line("svc1"), container_line("svc2"));
        let containers = parse_containers(&stdout);
        assert_eq!(containers.len(), 2);
        assert_eq!(containers["svc1"].state, "running");
    }

    #[test]
    fn parse_containers_strips_link_aliases() {
        let stdout = container_line("svc1,net_svc1_1");
        let containers = parse_containers(&stdout);
        assert_eq!(containers.len(), 1);
        assert_eq!(containers["svc1"].name, "svc1");
    }

    #[test]
    fn parse_containers_skips_malformed_lines() {
        let stdout = format!("not json\n{}\n{{\"ID\": 42}}\n", container_line("svc1"));
        let containers = parse_containers(&stdout);
        assert_eq!(containers.len(), 1);
        assert!(containers.contains_key("svc1"));
    }

    #[test]
    fn parse_images_keys_by_repository() {
        let stdout = format!("{}\n{}\n", image_line("svc1"), image_line("base/tools"));
        let images = parse_images(&stdout);
        assert_eq!(images.len(), 2);
        assert_eq!(images["base/tools"].created_since, "6 days ago");
    }

    #[test]
    fn parse_images_skips_malformed_lines() {
        let stdout = format!("\n{}\ngarbage\n", image_line("svc1"));
        let images = parse_images(&stdout);
        assert_eq!(images.len(), 1);
    }

    #[tokio::test]
    async fn lookups_against_empty_snapshot_return_none() {
        let dir = tempdir().unwrap();
        let mirror = RuntimeMirror::new(dir.path().join("absent.sock"));
        assert!(mirror.container("svc1").await.is_none());
        assert!(mirror.image("svc1").await.is_none());
    }

    #[tokio::test]
    async fn refresh_disconnected_is_a_noop() {
        let dir = tempdir().unwrap();
        let mirror = RuntimeMirror::new(dir.path().join("absent.sock"));
        assert!(!mirror.is_connected());
        mirror.refresh_containers().await;
        mirror.refresh_images().await;
        assert!(mirror.container("svc1").await.is_none());
        assert!(mirror.image("svc1").await.is_none());
    }
}
