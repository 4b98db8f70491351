//! Status projection: the derived per-project view the boundary serves.
//!
//! Combines a project's state-machine status with an on-demand refresh of
//! the runtime mirror into a single record: last-build timestamps, latest
//! captured output, and the three action-availability flags.

use serde::Serialize;

use crate::fleet_config::COMPOSE_FILE_NAME;
use crate::lifecycle::{ProjectSet, ProjectStatus};
use crate::runtime::RuntimeMirror;

/// Whether an action can currently be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionAvailability {
    Enabled,
    Running,
    Disabled,
}

/// The three per-action availability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionFlags {
    pub build: ActionAvailability,
    pub up: ActionAvailability,
    pub down: ActionAvailability,
}

/// Derived view of one project.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    pub id: String,
    pub status: ProjectStatus,
    /// Output of the most recently completed action.
    pub output: Vec<String>,
    /// Build artifact modification time (RFC 2822), absent if never built.
    pub last_build: Option<String>,
    /// Image build recency as reported by the runtime, absent without an
    /// orchestration descriptor or a built image.
    pub last_image_build: Option<String>,
    #[serde(flatten)]
    pub actions: ActionFlags,
}

/// Compute the availability flags from status and external facts.
///
/// Without an orchestration descriptor, `up`/`down` are always disabled and
/// only `build` varies with status. With one, a live container for the image
/// name flips the `up`/`down` pair; a running action marks itself running
/// and disables the other two; a pending action disables only its own flag
/// so it cannot be re-requested while queued.
pub fn availability(
    status: ProjectStatus,
    has_compose: bool,
    container_live: bool,
) -> ActionFlags {
    use ActionAvailability::{Disabled, Enabled, Running};

    let build = match status {
        ProjectStatus::BuildPending => Disabled,
        ProjectStatus::BuildRunning => Running,
        ProjectStatus::UpRunning | ProjectStatus::DownRunning => Disabled,
        ProjectStatus::Idle | ProjectStatus::UpPending | ProjectStatus::DownPending => Enabled,
    };

    let (up, down) = if !has_compose {
        (Disabled, Disabled)
    } else {
        let (up, down) = if container_live {
            (Disabled, Enabled)
        } else {
            (Enabled, Disabled)
        };
        match status {
            ProjectStatus::Idle | ProjectStatus::BuildPending => (up, down),
            ProjectStatus::BuildRunning => (Disabled, Disabled),
            ProjectStatus::UpPending => (Disabled, down),
            ProjectStatus::UpRunning => (Running, Disabled),
            ProjectStatus::DownPending => (up, Disabled),
            ProjectStatus::DownRunning => (Disabled, Running),
        }
    };

    ActionFlags { build, up, down }
}

/// Assemble the view for one project, refreshing the mirror on demand.
///
/// Returns `None` for an unknown id. With the runtime disconnected the
/// mirror refresh leaves the snapshot empty, so an orchestration-descriptor
/// project degrades to the conservative "assume not running" flags.
pub async fn project_view(
    projects: &ProjectSet,
    mirror: &RuntimeMirror,
    id: &str,
) -> Option<ProjectView> {
    let (project, status, output) = projects.view_state(id).await?;

    let last_build = std::fs::metadata(project.dir.join(&project.id))
        .and_then(|m| m.modified())
        .ok()
        .map(|mtime| chrono::DateTime::<chrono::Utc>::from(mtime).to_rfc2822());

    let has_compose = project.dir.join(COMPOSE_FILE_NAME).is_file();
    let mut container_live = false;
    let mut last_image_build = None;
    if has_compose {
        mirror.refresh_containers().await;
        mirror.refresh_images().await;
        container_live = mirror.container(&project.image_name).await.is_some();
        last_image_build = mirror
            .image(&project.image_name)
            .await
            .map(|image| image.created_since);
    }

    Some(ProjectView {
        id: project.id,
        status,
        output,
        last_build,
        last_image_build,
        actions: availability(status, has_compose, container_live),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ActionAvailability::{Disabled, Enabled, Running};
    use ProjectStatus::*;

    #[test]
    fn without_descriptor_up_down_always_disabled() {
        for status in [
            Idle,
            BuildPending,
            BuildRunning,
            UpPending,
            UpRunning,
            DownPending,
            DownRunning,
        ] {
            let flags = availability(status, false, false);
            assert_eq!(flags.up, Disabled, "{:?}", status);
            assert_eq!(flags.down, Disabled, "{:?}", status);
        }
    }

    #[test]
    fn without_descriptor_build_varies_with_status() {
        assert_eq!(availability(Idle, false, false).build, Enabled);
        assert_eq!(availability(BuildPending, false, false).build, Disabled);
        assert_eq!(availability(BuildRunning, false, false).build, Running);
    }

    #[test]
    fn live_container_enables_down_and_disables_up() {
        let flags = availability(Idle, true, true);
        assert_eq!(flags.up, Disabled);
        assert_eq!(flags.down, Enabled);
        assert_eq!(flags.build, Enabled);
    }

    #[test]
    fn no_container_enables_up_and_disables_down() {
        let flags = availability(Idle, true, false);
        assert_eq!(flags.up, Enabled);
        assert_eq!(flags.down, Disabled);
    }

    #[test]
    fn build_running_disables_both_compose_actions() {
        let flags = availability(BuildRunning, true, true);
        assert_eq!(flags.build, Running);
        assert_eq!(flags.up, Disabled);
        assert_eq!(flags.down, Disabled);
    }

    #[test]
    fn up_running_marks_up_and_disables_the_rest() {
        let flags = availability(UpRunning, true, false);
        assert_eq!(flags.build, Disabled);
        assert_eq!(flags.up, Running);
        assert_eq!(flags.down, Disabled);
    }

    #[test]
    fn down_running_marks_down_and_disables_the_rest() {
        let flags = availability(DownRunning, true, true);
        assert_eq!(flags.build, Disabled);
        assert_eq!(flags.up, Disabled);
        assert_eq!(flags.down, Running);
    }

    #[test]
    fn pending_disables_only_its_own_flag() {
        let flags = availability(UpPending, true, false);
        assert_eq!(flags.build, Enabled);
        assert_eq!(flags.up, Disabled);
        assert_eq!(flags.down, Disabled);

        let flags = availability(DownPending, true, true);
        assert_eq!(flags.build, Enabled);
        assert_eq!(flags.up, Disabled);
        assert_eq!(flags.down, Disabled);

        let flags = availability(BuildPending, true, true);
        assert_eq!(flags.build, Disabled);
        assert_eq!(flags.up, Disabled);
        assert_eq!(flags.down, Enabled);
    }

    mod assembly {
        use super::*;
        use crate::fleet_config::SETTINGS_FILE_NAME;
        use crate::lifecycle::Action;
        use crate::registry;
        use tempfile::tempdir;

        fn fixture(compose: bool) -> (tempfile::TempDir, ProjectSet, RuntimeMirror) {
            let root = tempdir().unwrap();
            let dir = root.path().join("svc1");
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join(SETTINGS_FILE_NAME), "").unwrap();
            if compose {
                std::fs::write(dir.join(COMPOSE_FILE_NAME), "services: {}\n").unwrap();
            }
            let set = ProjectSet::new(registry::load(root.path()));
            let mirror = RuntimeMirror::new(root.path().join("absent.sock"));
            (root, set, mirror)
        }

        #[tokio::test]
        async fn unknown_project_is_none() {
            let (_root, set, mirror) = fixture(false);
            assert!(project_view(&set, &mirror, "ghost").await.is_none());
        }

        #[tokio::test]
        async fn plain_project_has_disabled_compose_actions() {
            let (_root, set, mirror) = fixture(false);
            let view = project_view(&set, &mirror, "svc1").await.unwrap();
            assert_eq!(view.status, Idle);
            assert_eq!(view.actions.build, Enabled);
            assert_eq!(view.actions.up, Disabled);
            assert_eq!(view.actions.down, Disabled);
            assert!(view.last_build.is_none());
            assert!(view.last_image_build.is_none());
        }

        #[tokio::test]
        async fn disconnected_runtime_assumes_not_running() {
            let (_root, set, mirror) = fixture(true);
            let view = project_view(&set, &mirror, "svc1").await.unwrap();
            assert_eq!(view.actions.up, Enabled);
            assert_eq!(view.actions.down, Disabled);
        }

        #[tokio::test]
        async fn last_build_reflects_artifact_mtime() {
            let (root, set, mirror) = fixture(false);
            std::fs::write(root.path().join("svc1/svc1"), "binary").unwrap();
            let view = project_view(&set, &mirror, "svc1").await.unwrap();
            assert!(view.last_build.is_some());
        }

        #[tokio::test]
        async fn view_carries_status_and_output() {
            let (_root, set, mirror) = fixture(false);
            set.request("svc1", Action::Build).await;
            let view = project_view(&set, &mirror, "svc1").await.unwrap();
            assert_eq!(view.status, BuildPending);

            set.claim_pending("svc1").await.unwrap();
            set.complete("svc1", vec!["Build OK for svc1".to_string()])
                .await;
            let view = project_view(&set, &mirror, "svc1").await.unwrap();
            assert_eq!(view.output, vec!["Build OK for svc1"]);
        }
    }
}
