//! Project lifecycle state machine.
//!
//! [`ProjectSet`] is the single source of truth for each project's lifecycle
//! status and last captured output. It is shared between the periodic
//! scheduler and the HTTP boundary, so every read or write goes through an
//! atomic operation on the set; neither side ever holds raw mutable state.
//! The boundary may only *request* a transition; status itself is written
//! exclusively here and by the scheduler's claim/complete calls.
//!
//! Status transitions form the only reachable edges:
//! `idle → *-pending → *-running → idle`. There is no failed state; a failed
//! action is visible through the stored output, not through status.

mod actions;
mod scheduler;

pub use scheduler::Scheduler;

use std::collections::BTreeMap;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::registry::Project;

/// Lifecycle status of a project. Closed set; every match is exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    Idle,
    BuildPending,
    BuildRunning,
    UpPending,
    UpRunning,
    DownPending,
    DownRunning,
}

impl ProjectStatus {
    pub fn is_idle(self) -> bool {
        matches!(self, ProjectStatus::Idle)
    }

    /// The action this status is waiting on, if pending.
    pub fn pending_action(self) -> Option<Action> {
        match self {
            ProjectStatus::BuildPending => Some(Action::Build),
            ProjectStatus::UpPending => Some(Action::Up),
            ProjectStatus::DownPending => Some(Action::Down),
            ProjectStatus::Idle
            | ProjectStatus::BuildRunning
            | ProjectStatus::UpRunning
            | ProjectStatus::DownRunning => None,
        }
    }

    /// The action currently executing, if running.
    pub fn running_action(self) -> Option<Action> {
        match self {
            ProjectStatus::BuildRunning => Some(Action::Build),
            ProjectStatus::UpRunning => Some(Action::Up),
            ProjectStatus::DownRunning => Some(Action::Down),
            ProjectStatus::Idle
            | ProjectStatus::BuildPending
            | ProjectStatus::UpPending
            | ProjectStatus::DownPending => None,
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            ProjectStatus::Idle => "idle",
            ProjectStatus::BuildPending => "build-pending",
            ProjectStatus::BuildRunning => "build-running",
            ProjectStatus::UpPending => "up-pending",
            ProjectStatus::UpRunning => "up-running",
            ProjectStatus::DownPending => "down-pending",
            ProjectStatus::DownRunning => "down-running",
        };
        write!(f, "{}", tag)
    }
}

/// A lifecycle action a project can be asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Build,
    Up,
    Down,
}

impl Action {
    pub fn pending_status(self) -> ProjectStatus {
        match self {
            Action::Build => ProjectStatus::BuildPending,
            Action::Up => ProjectStatus::UpPending,
            Action::Down => ProjectStatus::DownPending,
        }
    }

    pub fn running_status(self) -> ProjectStatus {
        match self {
            Action::Build => ProjectStatus::BuildRunning,
            Action::Up => ProjectStatus::UpRunning,
            Action::Down => ProjectStatus::DownRunning,
        }
    }
}

impl std::str::FromStr for Action {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "build" => Ok(Action::Build),
            "up" => Ok(Action::Up),
            "down" => Ok(Action::Down),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Build => write!(f, "build"),
            Action::Up => write!(f, "up"),
            Action::Down => write!(f, "down"),
        }
    }
}

/// How a transition request was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The pending intent was recorded, possibly overwriting a previous
    /// pending intent (last write wins, there is no queue).
    Accepted,
    /// The project is mid-action; the request was ignored so the running
    /// marker is never clobbered.
    InFlight,
    /// No project with that id.
    UnknownProject,
}

#[derive(Debug)]
struct Slot {
    project: Project,
    status: ProjectStatus,
    output: Vec<String>,
}

impl Slot {
    fn new(project: Project) -> Self {
        Self {
            project,
            status: ProjectStatus::Idle,
            output: Vec::new(),
        }
    }
}

/// The shared, synchronized project set.
#[derive(Debug, Default)]
pub struct ProjectSet {
    inner: RwLock<BTreeMap<String, Slot>>,
}

impl ProjectSet {
    pub fn new(projects: Vec<Project>) -> Self {
        let inner = projects
            .into_iter()
            .map(|p| (p.id.clone(), Slot::new(p)))
            .collect();
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Project ids in sorted order (the scheduler's pass order and the
    /// boundary's display order).
    pub async fn ids(&self) -> Vec<String> {
        self.inner.read().await.keys().cloned().collect()
    }

    /// Immutable configuration of one project.
    pub async fn get(&self, id: &str) -> Option<Project> {
        self.inner.read().await.get(id).map(|s| s.project.clone())
    }

    /// Immutable configuration of every project, in sorted id order.
    pub async fn all(&self) -> Vec<Project> {
        self.inner
            .read()
            .await
            .values()
            .map(|s| s.project.clone())
            .collect()
    }

    pub async fn status(&self, id: &str) -> Option<ProjectStatus> {
        self.inner.read().await.get(id).map(|s| s.status)
    }

    /// Output of the most recently completed action.
    pub async fn output(&self, id: &str) -> Option<Vec<String>> {
        self.inner.read().await.get(id).map(|s| s.output.clone())
    }

    /// One-lock read of everything the status projection needs.
    pub async fn view_state(&self, id: &str) -> Option<(Project, ProjectStatus, Vec<String>)> {
        self.inner
            .read()
            .await
            .get(id)
            .map(|s| (s.project.clone(), s.status, s.output.clone()))
    }

    /// Record a transition request from the boundary layer.
    pub async fn request(&self, id: &str, action: Action) -> RequestOutcome {
        let mut inner = self.inner.write().await;
        let Some(slot) = inner.get_mut(id) else {
            return RequestOutcome::UnknownProject;
        };
        if slot.status.running_action().is_some() {
            return RequestOutcome::InFlight;
        }
        slot.status = action.pending_status();
        RequestOutcome::Accepted
    }

    /// Atomically advance a pending project to its running state.
    ///
    /// Returns the project's configuration and the claimed action, or `None`
    /// when the project is not pending. A project already running is never
    /// claimed again, which upholds the one-running-action invariant.
    pub async fn claim_pending(&self, id: &str) -> Option<(Project, Action)> {
        let mut inner = self.inner.write().await;
        let slot = inner.get_mut(id)?;
        let action = slot.status.pending_action()?;
        slot.status = action.running_status();
        Some((slot.project.clone(), action))
    }

    /// Store an action's output and return the project to idle.
    ///
    /// Terminal for every flow, success or failure; failure is carried in
    /// the output lines, not in status.
    pub async fn complete(&self, id: &str, output: Vec<String>) {
        let mut inner = self.inner.write().await;
        if let Some(slot) = inner.get_mut(id) {
            slot.output = output;
            slot.status = ProjectStatus::Idle;
        }
    }

    /// Merge a freshly loaded registry into the set.
    ///
    /// Idle entries are replaced by their on-disk configuration and new ids
    /// are inserted; a non-idle entry keeps its configuration, status, and
    /// output untouched so an in-flight result is never lost. Ids no longer
    /// on disk are removed only once idle.
    pub async fn reload(&self, projects: Vec<Project>) {
        let mut inner = self.inner.write().await;
        let mut fresh: BTreeMap<String, Project> =
            projects.into_iter().map(|p| (p.id.clone(), p)).collect();

        inner.retain(|id, slot| fresh.contains_key(id) || !slot.status.is_idle());
        for (id, slot) in inner.iter_mut() {
            if slot.status.is_idle() {
                if let Some(project) = fresh.remove(id) {
                    slot.project = project;
                }
            } else {
                fresh.remove(id);
            }
        }
        for (id, project) in fresh {
            inner.insert(id, Slot::new(project));
        }
    }
}
