//! Runtime configuration for the drydock service.
//!
//! Everything here is fixed at startup from CLI arguments; there is no
//! config file for the service itself (per-project settings live next to
//! each project, see [`crate::settings`]).

use std::path::PathBuf;
use std::time::Duration;

/// Default root under which projects are discovered.
pub const DEFAULT_PROJECTS_DIR: &str = "/opt/dev";

/// Name of the per-project settings file that marks a directory as a project.
pub const SETTINGS_FILE_NAME: &str = "project.settings";

/// Orchestration descriptor that gates the up/down actions.
pub const COMPOSE_FILE_NAME: &str = "docker-compose.yml";

/// Image build descriptor that triggers the second build step.
pub const IMAGE_FILE_NAME: &str = "Dockerfile";

/// Default container runtime control socket.
pub const DEFAULT_RUNTIME_SOCKET: &str = "/var/run/docker.sock";

/// Service configuration, fixed at startup.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// Root directory scanned for projects.
    pub projects_dir: PathBuf,
    /// Container runtime control socket; its absence means "disconnected".
    pub runtime_socket: PathBuf,
    /// Scheduler poll interval.
    pub poll_interval: Duration,
    /// HTTP listen port.
    pub port: u16,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            projects_dir: PathBuf::from(DEFAULT_PROJECTS_DIR),
            runtime_socket: PathBuf::from(DEFAULT_RUNTIME_SOCKET),
            poll_interval: Duration::from_secs(1),
            port: 8080,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_paths() {
        let config = FleetConfig::default();
        assert_eq!(config.projects_dir, PathBuf::from(DEFAULT_PROJECTS_DIR));
        assert_eq!(config.runtime_socket, PathBuf::from(DEFAULT_RUNTIME_SOCKET));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.port, 8080);
    }
}
